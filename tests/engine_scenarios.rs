// engine_scenarios.rs - The seven canonical matching scenarios, plus the
// cross-cutting properties they're meant to exercise.

use backtrack_regex::prelude::*;

#[test]
fn named_backreference_repeats_captured_text() {
    let re = Regex::new(r"(?<name>123)\g<name>").unwrap();
    let caps = re.captures("123123").unwrap();
    assert_eq!(caps.get(0).unwrap().as_str(), "123123");
    assert_eq!(caps.name("name").unwrap().as_str(), "123");
}

#[test]
fn greedy_interval_takes_longest_match() {
    let re = Regex::new(r"a{2,4}").unwrap();
    let m = re.find("aaaaaa").unwrap();
    assert_eq!(m.as_str(), "aaaa");
}

#[test]
fn lazy_interval_takes_shortest_match() {
    let re = Regex::new(r"a{2,4}?").unwrap();
    let m = re.find("aaaaaa").unwrap();
    assert_eq!(m.as_str(), "aa");
}

#[test]
fn alternation_under_plus_keeps_last_capture() {
    let re = Regex::new(r"(a|b)+").unwrap();
    let caps = re.captures("abab").unwrap();
    assert_eq!(caps.get(0).unwrap().as_str(), "abab");
    assert_eq!(caps.get(1).unwrap().as_str(), "b");
}

#[test]
fn atomic_group_refuses_to_give_back_input() {
    let re = Regex::new(r"(?>a+)a").unwrap();
    assert!(!re.is_match("aaaa"));
}

#[test]
fn word_boundary_scan_advances_word_by_word() {
    let re = Regex::new(r"\b\w+\b").unwrap();
    let mut sc = re.scanner("hello world");
    assert_eq!(sc.next().unwrap().as_str(), "hello");
    assert_eq!(sc.next().unwrap().as_str(), "world");
    assert!(sc.next().is_none());
}

#[test]
fn recursive_subroutine_matches_balanced_parens() {
    let re = Regex::new(r"\((?:[^()]|(?R))*\)").unwrap();
    let m = re.find("(a(b)c)").unwrap();
    assert_eq!(m.as_str(), "(a(b)c)");
}

// === Cross-cutting properties (spec §8 "Properties") ===

#[test]
fn entire_match_implies_search_at_offset_zero() {
    let re = Regex::new(r"\d+").unwrap();
    assert!(re.is_full_match("123"));
    let m = re.find("123").unwrap();
    assert_eq!(m.start(), 0);
}

#[test]
fn successive_scans_strictly_increase_offset() {
    let re = Regex::new(r"\w+").unwrap();
    let mut sc = re.scanner("one two three");
    let mut last = None;
    while let Some(m) = sc.next() {
        if let Some(prev) = last {
            assert!(m.start() > prev);
        }
        last = Some(m.start());
    }
    assert!(last.is_some());
}

#[test]
fn greedy_match_is_at_least_as_long_as_lazy() {
    let greedy = Regex::new(r"a{1,5}").unwrap();
    let lazy = Regex::new(r"a{1,5}?").unwrap();
    let input = "aaaaa";
    let g = greedy.find(input).unwrap();
    let l = lazy.find(input).unwrap();
    assert!(g.len() >= l.len());
}

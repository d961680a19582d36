// core_matcher.rs - Walks an Atom/Branch/Core graph against input bytes.
//
// Backtracking here is continuation-passing: each atom is given "what
// to do if the rest of the match succeeds" as a closure, and tries its
// own alternatives (branch order, repetition count, greedy-vs-lazy
// extension order) until one of them makes that continuation return
// `true`. The Rust call stack itself is the backtrack stack — a choice
// point that still has alternatives left is just a frame that hasn't
// returned yet — so no heap-allocated frame stack is needed (see
// DESIGN.md for why the earlier `Frame`/`Stack` scaffold in stack.rs
// was dropped in favor of this).
//
// Capture groups are rolled back on failed attempts: a `Group` atom
// snapshots the slot it is about to write, and restores it if the
// continuation it called ultimately returns `false`.

use std::cell::Cell;

use crate::atom::{Atom, AtomKind, Branch, Core};
use crate::capture::CaptureTable;
use crate::codec;
use crate::parser::word_class;

type Cont<'c> = dyn FnMut(usize, &mut CaptureTable) -> bool + 'c;

/// Recursion cap for `(?R)`/subroutine calls. Nothing in the token
/// grammar rules out unconditional left recursion (e.g. a bare
/// `(?R)`), which would otherwise recurse until the process stack
/// overflows; past this depth a subroutine call simply fails to match,
/// the same outcome a caller sees for any other exhausted branch.
const MAX_SUBROUTINE_DEPTH: usize = 4096;

thread_local! {
    static SUBROUTINE_DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// The result of a successful `find_at`/`search` call.
#[derive(Debug, Clone)]
pub struct MatchResult {
    pub start: usize,
    pub end: usize,
    pub captures: CaptureTable,
}

/// Try to match `root` starting exactly at `pos`. Returns the first
/// successful path found, trying branches left-to-right and greedy
/// quantifiers longest-first — the usual backtracking-engine contract,
/// not leftmost-longest.
pub fn find_at(root: &Core, input: &[u8], pos: usize, max_group: usize) -> Option<MatchResult> {
    let mut caps = CaptureTable::new(max_group);
    let mut end = None;
    core_match(root, root, input, pos, &mut caps, &mut |p, _c| {
        end = Some(p);
        true
    });
    end.map(|e| {
        caps.set(0, pos, e);
        MatchResult {
            start: pos,
            end: e,
            captures: caps,
        }
    })
}

/// Scan forward from `from`, trying each codepoint boundary in turn,
/// until `find_at` succeeds or the input is exhausted. When the pattern
/// starts with a single deterministic byte, `memchr` skips straight to
/// the next candidate instead of probing `find_at` one codepoint at a
/// time.
pub fn search(root: &Core, input: &[u8], from: usize, max_group: usize) -> Option<MatchResult> {
    let lead = leading_byte(root);
    let mut pos = from;
    loop {
        if let Some(byte) = lead {
            match memchr::memchr(byte, &input[pos.min(input.len())..]) {
                Some(off) => pos += off,
                None => return None,
            }
        }
        if let Some(m) = find_at(root, input, pos, max_group) {
            return Some(m);
        }
        if pos >= input.len() {
            return None;
        }
        let (_, len) = codec::decode(input, pos);
        pos += len.max(1);
    }
}

/// If every branch of `root`'s first atom must start with the same
/// single ASCII byte, return it. Used to fast-forward `search` with
/// `memchr` instead of re-running `find_at` at every offset.
fn leading_byte(root: &Core) -> Option<u8> {
    let mut candidate = None;
    for branch in &root.branches {
        let atom = branch.atoms.first()?;
        if atom.lo == 0 {
            return None;
        }
        let byte = match &atom.kind {
            AtomKind::Str(bytes) => *bytes.first()?,
            AtomKind::Class(class, false) => {
                let cp = class.single_codepoint()?;
                if cp > 0x7f {
                    return None;
                }
                cp as u8
            }
            _ => return None,
        };
        match candidate {
            None => candidate = Some(byte),
            Some(b) if b == byte => {}
            Some(_) => return None,
        }
    }
    candidate
}

/// Match `root` against the whole of `input`, requiring the match to
/// consume every byte. Unlike `find_at`, this backtracks through every
/// alternative in search of one that reaches the end, rather than
/// committing to the first successful path.
pub fn entire(root: &Core, input: &[u8], max_group: usize) -> Option<CaptureTable> {
    let mut caps = CaptureTable::new(max_group);
    let mut success = false;
    core_match(root, root, input, 0, &mut caps, &mut |p, _c| {
        if p == input.len() {
            success = true;
            true
        } else {
            false
        }
    });
    if success {
        caps.set(0, 0, input.len());
        Some(caps)
    } else {
        None
    }
}

fn core_match(
    core: &Core,
    root: &Core,
    input: &[u8],
    pos: usize,
    caps: &mut CaptureTable,
    cont: &mut Cont,
) -> bool {
    for branch in &core.branches {
        if branch_match(&branch.atoms, root, input, pos, caps, cont) {
            return true;
        }
    }
    false
}

fn branch_match(
    atoms: &[Atom],
    root: &Core,
    input: &[u8],
    pos: usize,
    caps: &mut CaptureTable,
    cont: &mut Cont,
) -> bool {
    match atoms.split_first() {
        None => cont(pos, caps),
        Some((atom, rest)) => {
            if atom.is_single_rep() {
                atom_match(atom, root, input, pos, caps, &mut |p2, c2| {
                    branch_match(rest, root, input, p2, c2, cont)
                })
            } else {
                match_repetition(atom, rest, root, input, pos, caps, cont, 0)
            }
        }
    }
}

/// Repeat `atom` between `atom.lo` and `atom.hi` times, trying longer
/// counts before shorter ones when greedy and the reverse when lazy.
/// Stops extending once an iteration makes no forward progress, so a
/// nullable atom (e.g. a group that can match empty) cannot loop
/// forever.
fn match_repetition(
    atom: &Atom,
    rest: &[Atom],
    root: &Core,
    input: &[u8],
    pos: usize,
    caps: &mut CaptureTable,
    cont: &mut Cont,
    count: u32,
) -> bool {
    if atom.greedy {
        if count < atom.hi {
            let extended = atom_match(atom, root, input, pos, caps, &mut |p2, c2| {
                if p2 == pos {
                    branch_match(rest, root, input, p2, c2, cont)
                } else {
                    match_repetition(atom, rest, root, input, p2, c2, cont, count + 1)
                }
            });
            if extended {
                return true;
            }
        }
        if count >= atom.lo {
            branch_match(rest, root, input, pos, caps, cont)
        } else {
            false
        }
    } else {
        if count >= atom.lo && branch_match(rest, root, input, pos, caps, cont) {
            return true;
        }
        if count < atom.hi {
            atom_match(atom, root, input, pos, caps, &mut |p2, c2| {
                if p2 == pos {
                    false // no progress; already tried continuing above
                } else {
                    match_repetition(atom, rest, root, input, p2, c2, cont, count + 1)
                }
            })
        } else {
            false
        }
    }
}

fn atom_match(
    atom: &Atom,
    root: &Core,
    input: &[u8],
    pos: usize,
    caps: &mut CaptureTable,
    cont: &mut Cont,
) -> bool {
    match &atom.kind {
        AtomKind::Class(class, invert) => {
            if pos >= input.len() {
                return false;
            }
            let (cp, len) = codec::decode(input, pos);
            if class.contains(cp) != *invert {
                cont(pos + len, caps)
            } else {
                false
            }
        }
        AtomKind::Str(bytes) => {
            if input[pos..].starts_with(bytes.as_slice()) {
                cont(pos + bytes.len(), caps)
            } else {
                false
            }
        }
        AtomKind::Group(core) => match_group(atom, core, root, input, pos, caps, cont),
        AtomKind::Atomic(core) => {
            let mut result = None;
            core_match(core, root, input, pos, caps, &mut |p2, _c2| {
                result = Some(p2);
                true
            });
            match result {
                Some(p2) => cont(p2, caps),
                None => false,
            }
        }
        AtomKind::Lookahead(core, invert) => {
            let mut matched = false;
            let mut scratch = caps.clone();
            core_match(core, root, input, pos, &mut scratch, &mut |_p2, _c2| {
                matched = true;
                true
            });
            if matched != *invert {
                cont(pos, caps)
            } else {
                false
            }
        }
        AtomKind::Backreference(n) => match caps.get(*n as usize) {
            None => false,
            Some((s, e)) => {
                let needed = &input[s..e];
                if input[pos..].starts_with(needed) {
                    cont(pos + needed.len(), caps)
                } else {
                    false
                }
            }
        },
        AtomKind::Subroutine(n) => {
            let depth = SUBROUTINE_DEPTH.with(|d| d.get());
            if depth >= MAX_SUBROUTINE_DEPTH {
                return false;
            }
            let target = root
                .find_by_group(*n)
                .expect("name resolution guarantees the subroutine target exists");
            let mut scratch = caps.clone();
            SUBROUTINE_DEPTH.with(|d| d.set(depth + 1));
            let matched = core_match(target, root, input, pos, &mut scratch, &mut |p2, _c2| {
                cont(p2, caps)
            });
            SUBROUTINE_DEPTH.with(|d| d.set(depth));
            matched
        }
        AtomKind::WordAnchor(invert) => {
            if at_word_boundary(input, pos) != *invert {
                cont(pos, caps)
            } else {
                false
            }
        }
        AtomKind::EdgeAnchor { start } => {
            let at_edge = if *start { pos == 0 } else { pos == input.len() };
            if at_edge {
                cont(pos, caps)
            } else {
                false
            }
        }
    }
}

fn match_group(
    atom: &Atom,
    core: &Core,
    root: &Core,
    input: &[u8],
    pos: usize,
    caps: &mut CaptureTable,
    cont: &mut Cont,
) -> bool {
    match atom.group {
        None => core_match(core, root, input, pos, caps, cont),
        Some(g) => {
            let g = g as usize;
            core_match(core, root, input, pos, caps, &mut |p2, c2| {
                let saved = c2.get(g);
                c2.set(g, pos, p2);
                if cont(p2, c2) {
                    true
                } else {
                    match saved {
                        Some((s, e)) => c2.set(g, s, e),
                        None => c2.clear(g),
                    }
                    false
                }
            })
        }
    }
}

fn at_word_boundary(input: &[u8], pos: usize) -> bool {
    let before = codec::prev_codepoint(input, pos)
        .map(|cp| word_class().contains(cp))
        .unwrap_or(false);
    let after = if pos < input.len() {
        let (cp, _) = codec::decode(input, pos);
        word_class().contains(cp)
    } else {
        false
    };
    before != after
}

#[cfg(test)]
fn leaf_branch(atoms: Vec<Atom>) -> Core {
    Core {
        group: 0,
        branches: vec![Branch {
            atoms: atoms.into(),
        }],
    }
}

// factory.rs - Token tree -> match graph (`Core`/`Branch`/`Atom`).
//
// By the time a token tree reaches here, `weedeat` has already fused
// literals into `Str` runs, lifted NUL out of classes, rewritten
// possessive quantifiers into atomic groups, and resolved every name to
// a group number. The factory's only job is structural: split each
// branch on `Alternator`, and attach each trailing `Range`/`Lazy` to
// the atom it quantifies.

use smallvec::SmallVec;

use crate::atom::{Atom, AtomKind, Branch, Core};
use crate::token::{GroupKind, Token};

/// Build the match graph for a top-level token tree (the pattern root,
/// group number `0`).
pub fn build(tokens: &[Token]) -> Core {
    build_core(tokens, 0)
}

fn build_core(tokens: &[Token], group: i32) -> Core {
    let mut branches = Vec::new();
    let mut current: SmallVec<[Atom; 4]> = SmallVec::new();
    for tok in tokens {
        if let Token::Alternator = tok {
            branches.push(Branch {
                atoms: std::mem::take(&mut current),
            });
            continue;
        }
        push_token(&mut current, tok);
    }
    branches.push(Branch { atoms: current });
    Core { group, branches }
}

fn push_token(atoms: &mut SmallVec<[Atom; 4]>, tok: &Token) {
    match tok {
        Token::Str(bytes) => atoms.push(Atom::single(AtomKind::Str(bytes.clone()))),
        Token::Class(class, invert) => {
            atoms.push(Atom::single(AtomKind::Class(class.clone(), *invert)))
        }
        Token::Group(body, kind, group_no) => {
            let atom = match kind {
                GroupKind::Capturing => {
                    let n = group_no.expect("capturing group always carries a number");
                    let mut a = Atom::single(AtomKind::Group(Box::new(build_core(body, n))));
                    a.group = Some(n);
                    a
                }
                GroupKind::NonCapturing => {
                    Atom::single(AtomKind::Group(Box::new(build_core(body, -1))))
                }
                GroupKind::Atomic => {
                    Atom::single(AtomKind::Atomic(Box::new(build_core(body, -1))))
                }
                GroupKind::Lookahead { invert } => Atom::single(AtomKind::Lookahead(
                    Box::new(build_core(body, -1)),
                    *invert,
                )),
            };
            atoms.push(atom);
        }
        Token::Range(lo, hi) => {
            let last = atoms
                .last_mut()
                .expect("weedeat guarantees Range follows a repeatable atom");
            last.lo = *lo;
            last.hi = *hi;
        }
        Token::Lazy => {
            let last = atoms
                .last_mut()
                .expect("weedeat guarantees Lazy follows a Range");
            last.greedy = false;
        }
        Token::Reference(n) => atoms.push(Atom::single(AtomKind::Backreference(*n))),
        Token::Subroutine(n) => atoms.push(Atom::single(AtomKind::Subroutine(*n))),
        Token::WordAnchor(invert) => atoms.push(Atom::single(AtomKind::WordAnchor(*invert))),
        Token::StartAnchor => atoms.push(Atom::single(AtomKind::EdgeAnchor { start: true })),
        Token::EndAnchor => atoms.push(Atom::single(AtomKind::EdgeAnchor { start: false })),
        Token::Empty => {}
        Token::Alternator => unreachable!("handled by caller"),
        Token::Literal(_) | Token::Name(_, _) | Token::Possessive => {
            unreachable!("eliminated by weedeat before the factory runs")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::Class;

    #[test]
    fn alternation_splits_into_branches() {
        let tokens = vec![
            Token::Str(b"a".to_vec()),
            Token::Alternator,
            Token::Str(b"b".to_vec()),
        ];
        let core = build(&tokens);
        assert_eq!(core.branches.len(), 2);
    }

    #[test]
    fn range_attaches_to_preceding_atom() {
        let tokens = vec![
            Token::Class(Class::single('a' as u32), false),
            Token::Range(2, 4),
            Token::Lazy,
        ];
        let core = build(&tokens);
        let atom = &core.branches[0].atoms[0];
        assert_eq!((atom.lo, atom.hi, atom.greedy), (2, 4, false));
    }

    #[test]
    fn capturing_group_carries_its_number() {
        let tokens = vec![Token::Group(
            vec![Token::Str(b"x".to_vec())],
            GroupKind::Capturing,
            Some(3),
        )];
        let core = build(&tokens);
        let atom = &core.branches[0].atoms[0];
        assert_eq!(atom.group, Some(3));
        match &atom.kind {
            AtomKind::Group(inner) => assert_eq!(inner.group, 3),
            _ => panic!("expected Group atom"),
        }
    }
}

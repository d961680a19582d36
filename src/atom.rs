// atom.rs - The compiled match graph built from a token tree.
//
// `Core` is a sequence of alternative `Branch`es; a `Branch` is a flat
// sequence of `Atom`s. This is the factory's output and the matcher's
// input: every repetition, group, and assertion in the token tree
// becomes exactly one `Atom` here, with nested `Core`s boxed in for
// groups, atomic groups, and lookaheads.

use smallvec::SmallVec;

use crate::class::Class;

/// What a single atom matches or does.
#[derive(Debug)]
pub enum AtomKind {
    /// A single-codepoint class test (`invert` applies class polarity).
    Class(Class, bool),
    /// A fused run of literal bytes, matched verbatim.
    Str(Vec<u8>),
    /// `(...)`, `(?:...)` — ordinary or non-capturing group.
    Group(Box<Core>),
    /// `(?>...)` — atomic group: commits to its first successful match.
    Atomic(Box<Core>),
    /// `(?=...)` / `(?!...)` — zero-width lookahead.
    Lookahead(Box<Core>, bool),
    /// `\N`, `\g<N>`, `\k<N>` — numbered backreference.
    Backreference(i32),
    /// `(?N)`, `(?R)`/`(?0)`, `(?&name)` — subroutine call by group number.
    Subroutine(i32),
    /// `\b` (false) / `\B` (true).
    WordAnchor(bool),
    /// `^`/`$`/denullified NUL. `start` selects which edge.
    EdgeAnchor { start: bool },
}

/// One atom in a branch: what it matches, whether it repeats, and how.
#[derive(Debug)]
pub struct Atom {
    pub kind: AtomKind,
    pub lo: u32,
    pub hi: u32,
    pub greedy: bool,
    /// The capturing group number this atom closes, if it is a
    /// capturing `Group`. `None` for non-capturing atoms.
    pub group: Option<i32>,
}

impl Atom {
    pub fn single(kind: AtomKind) -> Self {
        Atom {
            kind,
            lo: 1,
            hi: 1,
            greedy: true,
            group: None,
        }
    }

    pub fn is_single_rep(&self) -> bool {
        self.lo == 1 && self.hi == 1
    }
}

/// A flat sequence of atoms, one alternative of an enclosing `Core`.
/// Most branches hold only a handful of atoms, so a small inline
/// buffer avoids a heap allocation for them.
#[derive(Debug, Default)]
pub struct Branch {
    pub atoms: SmallVec<[Atom; 4]>,
}

/// A set of alternative branches, the unit a group/subroutine call
/// resolves to. `group` is the capturing group number for the root
/// core of a capturing group (`0` for the pattern's own root), or `-1`
/// for non-capturing constructs.
#[derive(Debug)]
pub struct Core {
    pub group: i32,
    pub branches: Vec<Branch>,
}

impl Core {
    /// Depth-first, pre-order search for the core belonging to capture
    /// group `group_no`. Group `0` always means the overall pattern
    /// root, matching the subroutine-call convention for `(?R)`/`(?0)`.
    pub fn find_by_group<'a>(&'a self, group_no: i32) -> Option<&'a Core> {
        if group_no == 0 {
            return Some(self.root());
        }
        self.find_by_group_inner(group_no)
    }

    fn root(&self) -> &Core {
        self
    }

    fn find_by_group_inner<'a>(&'a self, group_no: i32) -> Option<&'a Core> {
        if self.group == group_no {
            return Some(self);
        }
        for branch in &self.branches {
            for atom in &branch.atoms {
                let nested = match &atom.kind {
                    AtomKind::Group(core) | AtomKind::Atomic(core) => Some(core),
                    AtomKind::Lookahead(core, _) => Some(core),
                    _ => None,
                };
                if let Some(core) = nested {
                    if let Some(found) = core.find_by_group_inner(group_no) {
                        return Some(found);
                    }
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(group: i32) -> Core {
        Core {
            group,
            branches: vec![Branch {
                atoms: SmallVec::new(),
            }],
        }
    }

    #[test]
    fn find_by_group_zero_is_root() {
        let core = leaf(0);
        assert!(std::ptr::eq(core.find_by_group(0).unwrap(), &core));
    }

    #[test]
    fn find_by_group_descends_into_nested_groups() {
        let inner = leaf(2);
        let middle = Core {
            group: -1,
            branches: vec![Branch {
                atoms: SmallVec::from_vec(vec![Atom::single(AtomKind::Group(Box::new(inner)))]),
            }],
        };
        let root = Core {
            group: 0,
            branches: vec![Branch {
                atoms: SmallVec::from_vec(vec![Atom::single(AtomKind::Group(Box::new(middle)))]),
            }],
        };
        let found = root.find_by_group(2).expect("group 2 present");
        assert_eq!(found.group, 2);
    }

    #[test]
    fn find_by_group_missing_returns_none() {
        let root = leaf(0);
        assert!(root.find_by_group(5).is_none());
    }
}

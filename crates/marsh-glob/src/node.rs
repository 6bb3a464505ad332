//! Compiled pattern representation.
//!
//! One path segment compiles to a [`Pattern`]: a sequence of tagged
//! [`PatNode`]s whose order is the successor chain the matcher follows.
//! The whole word compiles to a root-to-leaf chain of [`ChainSeg`]s, one
//! per path level, where recursive-descent forms carry a [`Closure`] tag.
//! Everything here is built once per call and read-only afterwards.

/// One member of a `[...]` character class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassItem {
    Single(char),
    /// Inclusive range, as written.
    Range(char, char),
}

/// Repetition tag for groups and atom closures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repeat {
    /// `#` — zero or more.
    ZeroOrMore,
    /// `##` — one or more.
    OneOrMore,
}

/// One node of a compiled segment pattern.
#[derive(Debug, Clone, PartialEq)]
pub enum PatNode {
    /// A literal character, matched exactly.
    Lit(char),
    /// `?` — exactly one character.
    AnyChar,
    /// `*` — zero or more characters.
    AnySeq,
    /// `[...]` — one character in (or, negated, not in) the class.
    Class { negated: bool, items: Vec<ClassItem> },
    /// `<m-n>` — a digit run whose value lies in the range; either bound
    /// may be open.
    NumRange { lo: Option<u64>, hi: Option<u64> },
    /// `(body)`, optionally repeated. Atom closures (`x#`) compile to a
    /// one-node group.
    Group { body: Pattern, repeat: Option<Repeat> },
    /// Binary alternation branch; `a|b|c` nests to the right.
    Alt { left: Pattern, right: Pattern },
    /// `body~excl` (or `^excl` with a `*` body): the candidate must match
    /// `body` and must not match `excl`. With `full_path` set the
    /// exclusion re-test runs against the accumulated path instead of the
    /// bare candidate.
    Exclude {
        body: Pattern,
        excl: Pattern,
        full_path: bool,
    },
}

/// A compiled sequence of pattern nodes for one path segment.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Pattern {
    pub(crate) nodes: Vec<PatNode>,
}

impl Pattern {
    pub(crate) fn new(nodes: Vec<PatNode>) -> Self {
        Self { nodes }
    }

    /// The single unrestricted wildcard, used as the embedded pattern of
    /// `**`-style closures.
    pub(crate) fn any() -> Self {
        Self {
            nodes: vec![PatNode::AnySeq],
        }
    }

    /// If the pattern is a pure literal run, return it as a string.
    /// Such segments never need directory enumeration.
    pub(crate) fn literal(&self) -> Option<String> {
        let mut s = String::new();
        for node in &self.nodes {
            match node {
                PatNode::Lit(c) => s.push(*c),
                _ => return None,
            }
        }
        Some(s)
    }

    /// True if any exclusion in the tree re-tests against the full
    /// accumulated path.
    pub(crate) fn needs_full_path(&self) -> bool {
        self.nodes.iter().any(|n| match n {
            PatNode::Exclude {
                body,
                excl,
                full_path,
            } => *full_path || body.needs_full_path() || excl.needs_full_path(),
            PatNode::Group { body, .. } => body.needs_full_path(),
            PatNode::Alt { left, right } => {
                left.needs_full_path() || right.needs_full_path()
            }
            _ => false,
        })
    }

    /// True if any literal `/` appears in the tree. Used to flag
    /// full-path exclusions at compile time.
    pub(crate) fn contains_slash(&self) -> bool {
        self.nodes.iter().any(|n| match n {
            PatNode::Lit(c) => *c == '/',
            PatNode::Group { body, .. } => body.contains_slash(),
            PatNode::Alt { left, right } => left.contains_slash() || right.contains_slash(),
            PatNode::Exclude { body, excl, .. } => {
                body.contains_slash() || excl.contains_slash()
            }
            _ => false,
        })
    }
}

/// Closure tag on a path-chain segment (recursive directory descent).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Closure {
    /// An ordinary segment: matched against exactly one path level.
    None,
    /// `**/` and `(pat/)#` — zero or more directory levels.
    ZeroOrMoreDirs,
    /// `(pat/)##` — one or more directory levels.
    OneOrMoreDirs,
}

/// One path segment of the compiled chain.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainSeg {
    pub(crate) pattern: Pattern,
    pub(crate) closure: Closure,
    /// On closure segments: descend through symlinked directories
    /// (`***/`), deciding directory-ness with `stat` instead of `lstat`.
    pub(crate) follow_links: bool,
}

impl ChainSeg {
    pub(crate) fn plain(pattern: Pattern) -> Self {
        Self {
            pattern,
            closure: Closure::None,
            follow_links: false,
        }
    }

    pub(crate) fn closure(pattern: Pattern, closure: Closure, follow_links: bool) -> Self {
        Self {
            pattern,
            closure,
            follow_links,
        }
    }

    pub(crate) fn is_closure(&self) -> bool {
        self.closure != Closure::None
    }
}

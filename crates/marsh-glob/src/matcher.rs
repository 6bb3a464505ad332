//! Backtracking segment matcher.
//!
//! Matches one compiled [`Pattern`] against one path-segment string. The
//! matcher is cursor-based: simple consuming nodes advance iteratively,
//! and a stack-allocated continuation chain carries the "what follows"
//! state for groups, alternations and closures, so matching allocates
//! nothing. Both total work and recursion depth are bounded; a
//! pathological pattern fails the match instead of burning CPU or native
//! stack.

use std::cell::Cell;

use crate::node::{ClassItem, PatNode, Pattern, Repeat};

/// Maximum total work for one match. Protects against adversarial
/// patterns like `*a*a*a*...*a` that cause O(n^k) backtracking. Counted
/// as loop steps, not stack depth, to bound actual CPU cost.
const MAX_MATCH_CALLS: usize = 100_000;

/// Maximum recursion depth. Closure repetitions and group nesting recurse
/// once per level; a pattern that legitimately needs more than this many
/// levels cannot arise from a real path segment.
const MAX_MATCH_DEPTH: usize = 4096;

/// Match a compiled segment pattern against a candidate name.
///
/// `full` is the accumulated path (used only by full-path exclusions).
/// With `protect_dot` set, a leading `.` in the candidate must be matched
/// by a literal dot in the pattern; nothing else may consume it.
pub(crate) fn segment_matches(
    pattern: &Pattern,
    name: &[char],
    full: &[char],
    protect_dot: bool,
    collate: bool,
) -> bool {
    let steps = Cell::new(0usize);
    let cx = Ctx {
        name,
        full,
        protect: protect_dot && name.first() == Some(&'.'),
        collate,
        steps: &steps,
    };
    let root = Cont {
        nodes: &pattern.nodes,
        ni: 0,
        min_done: false,
        next: None,
    };
    matches_from(Some(&root), 0, 0, &cx)
}

/// Per-match context: the candidate, the accumulated path, and the shared
/// work counter.
struct Ctx<'a> {
    name: &'a [char],
    full: &'a [char],
    protect: bool,
    collate: bool,
    steps: &'a Cell<usize>,
}

/// One frame of the continuation chain: a node sequence, a position in
/// it, and what follows once the sequence is exhausted. `min_done` marks a
/// re-entered closure whose minimum repetition count is already satisfied.
#[derive(Clone, Copy)]
struct Cont<'p, 'c> {
    nodes: &'p [PatNode],
    ni: usize,
    min_done: bool,
    next: Option<&'c Cont<'p, 'c>>,
}

fn matches_from(cont: Option<&Cont<'_, '_>>, ci: usize, depth: usize, cx: &Ctx<'_>) -> bool {
    if depth > MAX_MATCH_DEPTH {
        return false;
    }
    let Some(k) = cont else {
        return ci >= cx.name.len();
    };

    // Walk consuming nodes iteratively; recurse only where the pattern
    // branches.
    let mut cur = *k;
    let mut ci = ci;
    loop {
        let steps = cx.steps.get() + 1;
        cx.steps.set(steps);
        if steps > MAX_MATCH_CALLS {
            return false;
        }

        if cur.ni >= cur.nodes.len() {
            match cur.next {
                Some(next) => {
                    cur = *next;
                    continue;
                }
                // Pattern exhausted: success iff the candidate is too.
                None => return ci >= cx.name.len(),
            }
        }

        // Hidden-dot rule: only a literal dot may consume the candidate's
        // protected leading dot.
        let dot_guard = cx.protect && ci == 0;

        match &cur.nodes[cur.ni] {
            PatNode::Lit(c) => {
                if ci < cx.name.len() && cx.name[ci] == *c {
                    cur.ni += 1;
                    ci += 1;
                    continue;
                }
                return false;
            }

            PatNode::AnyChar => {
                if dot_guard || ci >= cx.name.len() {
                    return false;
                }
                cur.ni += 1;
                ci += 1;
            }

            PatNode::AnySeq => {
                // Collapse consecutive stars.
                let mut frame = cur;
                frame.ni += 1;
                frame.min_done = false;
                while matches!(frame.nodes.get(frame.ni), Some(PatNode::AnySeq)) {
                    frame.ni += 1;
                }

                // A trailing star is authoritative: it consumes the
                // remainder and is never backtracked into.
                if frame.ni >= frame.nodes.len() && frame.next.is_none() && !dot_guard {
                    return true;
                }

                let max_skip = if dot_guard { 0 } else { cx.name.len() - ci };
                for skip in 0..=max_skip {
                    if matches_from(Some(&frame), ci + skip, depth + 1, cx) {
                        return true;
                    }
                }
                return false;
            }

            PatNode::Class { negated, items } => {
                if dot_guard
                    || ci >= cx.name.len()
                    || !class_matches(cx.name[ci], *negated, items, cx.collate)
                {
                    return false;
                }
                cur.ni += 1;
                ci += 1;
            }

            PatNode::NumRange { lo, hi } => {
                // Longest digit run first.
                let mut end = ci;
                while end < cx.name.len() && cx.name[end].is_ascii_digit() {
                    end += 1;
                }
                if end == ci {
                    return false;
                }
                // Shrink one digit at a time while the value overruns the
                // upper bound; a value below the lower bound fails
                // outright.
                loop {
                    let value = digit_value(&cx.name[ci..end]);
                    if let Some(h) = *hi
                        && value > h
                    {
                        if end - ci == 1 {
                            return false;
                        }
                        end -= 1;
                        continue;
                    }
                    if let Some(l) = *lo
                        && value < l
                    {
                        return false;
                    }
                    break;
                }
                cur.ni += 1;
                ci = end;
            }

            PatNode::Group { body, repeat } => {
                let rest = Cont {
                    nodes: cur.nodes,
                    ni: cur.ni + 1,
                    min_done: false,
                    next: cur.next,
                };
                match repeat {
                    None => {
                        let inner = Cont {
                            nodes: &body.nodes,
                            ni: 0,
                            min_done: false,
                            next: Some(&rest),
                        };
                        return matches_from(Some(&inner), ci, depth + 1, cx);
                    }
                    Some(r) => {
                        // Greedy exit: prefer leaving the closure over
                        // repeating it. One-or-more may only exit once a
                        // repetition is done.
                        let may_exit = *r == Repeat::ZeroOrMore || cur.min_done;
                        if may_exit && matches_from(Some(&rest), ci, depth + 1, cx) {
                            return true;
                        }
                        let again = Cont {
                            nodes: cur.nodes,
                            ni: cur.ni,
                            min_done: true,
                            next: cur.next,
                        };
                        let inner = Cont {
                            nodes: &body.nodes,
                            ni: 0,
                            min_done: false,
                            next: Some(&again),
                        };
                        return matches_from(Some(&inner), ci, depth + 1, cx);
                    }
                }
            }

            PatNode::Alt { left, right } => {
                let rest = Cont {
                    nodes: cur.nodes,
                    ni: cur.ni + 1,
                    min_done: false,
                    next: cur.next,
                };
                let l = Cont {
                    nodes: &left.nodes,
                    ni: 0,
                    min_done: false,
                    next: Some(&rest),
                };
                if matches_from(Some(&l), ci, depth + 1, cx) {
                    return true;
                }
                let r = Cont {
                    nodes: &right.nodes,
                    ni: 0,
                    min_done: false,
                    next: Some(&rest),
                };
                return matches_from(Some(&r), ci, depth + 1, cx);
            }

            PatNode::Exclude {
                body,
                excl,
                full_path,
            } => {
                let rest = Cont {
                    nodes: cur.nodes,
                    ni: cur.ni + 1,
                    min_done: false,
                    next: cur.next,
                };
                let inner = Cont {
                    nodes: &body.nodes,
                    ni: 0,
                    min_done: false,
                    next: Some(&rest),
                };
                if !matches_from(Some(&inner), ci, depth + 1, cx) {
                    return false;
                }
                // The candidate survives only if the exclusion does not
                // also match. The re-test runs unprotected, against the
                // remainder the body consumed or the full accumulated
                // path.
                let subject: &[char] = if *full_path { cx.full } else { &cx.name[ci..] };
                let sub = Ctx {
                    name: subject,
                    full: cx.full,
                    protect: false,
                    collate: cx.collate,
                    steps: cx.steps,
                };
                let root = Cont {
                    nodes: &excl.nodes,
                    ni: 0,
                    min_done: false,
                    next: None,
                };
                return !matches_from(Some(&root), 0, depth + 1, &sub);
            }
        }
    }
}

fn class_matches(c: char, negated: bool, items: &[ClassItem], collate: bool) -> bool {
    let mut hit = false;
    for item in items {
        match *item {
            ClassItem::Single(s) => {
                if s == c {
                    hit = true;
                }
            }
            ClassItem::Range(lo, hi) => {
                if in_range(c, lo, hi, collate) {
                    hit = true;
                }
            }
        }
    }
    hit != negated
}

fn in_range(c: char, lo: char, hi: char, collate: bool) -> bool {
    if lo <= c && c <= hi {
        return true;
    }
    // Collation-aware fallback: compare case-folded when the locale says
    // ordering ignores case first.
    collate && {
        let (c, lo, hi) = (fold(c), fold(lo), fold(hi));
        lo <= c && c <= hi
    }
}

fn fold(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

/// Value of a digit run, saturating so absurdly long runs still compare
/// as "too large" instead of wrapping.
fn digit_value(digits: &[char]) -> u64 {
    digits.iter().fold(0u64, |acc, c| {
        acc.saturating_mul(10)
            .saturating_add(c.to_digit(10).unwrap_or(0) as u64)
    })
}

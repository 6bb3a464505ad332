//! Result collection and final ordering.
//!
//! The scanner hands every literal candidate to [`Collector::insert`],
//! which applies the qualifier clause, appends a type suffix when
//! mark-dirs or list-types is active, and grows the match list. Ordering
//! is imposed once at the end, never by insertion order.

use std::cmp::Ordering;
use std::path::Path;

use crate::fs::GlobFs;
use crate::qual::{self, QualClause};

/// Accumulates qualifying matches for one expansion call.
pub(crate) struct Collector<'a, F: GlobFs> {
    fs: &'a F,
    quals: &'a QualClause,
    mark_dirs: bool,
    list_types: bool,
    now: i64,
    results: Vec<String>,
}

impl<'a, F: GlobFs> Collector<'a, F> {
    pub fn new(
        fs: &'a F,
        quals: &'a QualClause,
        mark_dirs: bool,
        list_types: bool,
        now: i64,
    ) -> Self {
        Self {
            fs,
            quals,
            mark_dirs,
            list_types,
            now,
            results: Vec::new(),
        }
    }

    /// Filter one candidate and append it on pass. Candidates ending in
    /// `/` came from a directory-only pattern and were verified by the
    /// scanner.
    pub fn insert(&mut self, mut path: String) {
        let is_dir_form = path.ends_with('/');
        let bare = path.trim_end_matches('/');
        if !qual::clause_passes(self.fs, Path::new(bare), self.quals, self.now) {
            return;
        }

        if !is_dir_form
            && (self.list_types || self.mark_dirs)
            && let Ok(meta) = self.fs.lstat(Path::new(&path))
        {
            if self.list_types {
                let suffix = meta.type_suffix();
                if suffix != ' ' {
                    path.push(suffix);
                }
            } else if meta.is_dir() {
                path.push('/');
            }
        }

        self.results.push(path);
    }

    pub fn into_results(self) -> Vec<String> {
        self.results
    }
}

/// Sort matches in place: byte order, optionally collation-aware, with
/// embedded digit runs compared numerically when `numeric` is set.
pub(crate) fn sort_results(results: &mut [String], numeric: bool, collate: bool) {
    if !numeric && !collate {
        results.sort();
        return;
    }
    results.sort_by(|a, b| path_compare(a, b, numeric, collate));
}

/// The ordering used for final results. With `numeric`, maximal ASCII
/// digit runs compare by value (leading zeros ignored); everything else
/// compares per character, case-folded first under `collate`. Full ties
/// fall back to plain byte order.
pub(crate) fn path_compare(a: &str, b: &str, numeric: bool, collate: bool) -> Ordering {
    let mut ai = a.chars().peekable();
    let mut bi = b.chars().peekable();
    loop {
        match (ai.peek().copied(), bi.peek().copied()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(ca), Some(cb)) => {
                if numeric && ca.is_ascii_digit() && cb.is_ascii_digit() {
                    let ra = take_digit_run(&mut ai);
                    let rb = take_digit_run(&mut bi);
                    let ord = compare_digit_runs(&ra, &rb);
                    if ord != Ordering::Equal {
                        return ord;
                    }
                } else {
                    let ord = if collate {
                        fold(ca).cmp(&fold(cb))
                    } else {
                        ca.cmp(&cb)
                    };
                    if ord != Ordering::Equal {
                        return ord;
                    }
                    ai.next();
                    bi.next();
                }
            }
        }
    }
}

fn take_digit_run(it: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Vec<char> {
    let mut run = Vec::new();
    while let Some(&c) = it.peek() {
        if !c.is_ascii_digit() {
            break;
        }
        run.push(c);
        it.next();
    }
    run
}

/// Compare two digit runs by numeric value without parsing: strip
/// leading zeros, then shorter means smaller, then lexical.
fn compare_digit_runs(a: &[char], b: &[char]) -> Ordering {
    let a = strip_zeros(a);
    let b = strip_zeros(b);
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn strip_zeros(run: &[char]) -> &[char] {
    let start = run
        .iter()
        .position(|&c| c != '0')
        .unwrap_or(run.len().saturating_sub(1));
    &run[start..]
}

fn fold(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

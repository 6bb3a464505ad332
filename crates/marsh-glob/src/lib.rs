//! marsh-glob: filename generation for the marsh shell.
//!
//! Provides:
//! - **Word**: the tokenized wildcard word handed over by the shell's
//!   lexer, metacharacters already distinguished from literal bytes
//! - **compile**: the pattern compiler — path chain, pattern trees and
//!   the trailing qualifier clause
//! - **expand**: the whole engine — compile, walk the filesystem, apply
//!   qualifiers, sort, and resolve the no-match policy
//! - **GlobFs**: a minimal read-only filesystem trait so the scanner
//!   runs against anything that can list and stat; [`LocalFs`] is the
//!   real one
//! - **Interrupt**: a poll-based cancellation hook checked on every
//!   directory entry and recursion step
//!
//! Pattern syntax: `*`, `?`, `[a-c]`/`[^a-c]`, `<m-n>` numeric ranges,
//! `(pat)` groups with `#`/`##` repetition, `pat1|pat2` alternation,
//! `pat~excl` exclusion and `^pat` negation (extended globbing), `**/`
//! and `***/` recursive descent, `(dir/)#` explicit descent, and a
//! trailing `(...)` qualifier clause filtering by file type, permission
//! bits, ownership, size, link count and timestamps.
//!
//! One call runs to completion on the calling thread; nothing is shared
//! across concurrent invocations.
//!
//! ```no_run
//! use marsh_glob::{expand, GlobOptions, LocalFs, Never, Word};
//!
//! let word = Word::parse("src/**/*.rs");
//! let opts = GlobOptions::default();
//! let matches = expand(&LocalFs::new(), &word, &opts, &Never)?;
//! for path in matches {
//!     println!("{path}");
//! }
//! # Ok::<(), marsh_glob::GlobError>(())
//! ```

mod collect;
mod compile;
mod fs;
mod matcher;
mod node;
mod options;
mod qual;
mod scan;
mod word;

pub use compile::{CompileError, CompiledGlob, compile};
pub use fs::{FileKind, FileMeta, GlobFs, LocalFs};
pub use node::{ChainSeg, ClassItem, Closure, PatNode, Pattern, Repeat};
pub use options::{GlobOptions, NoMatchBehavior};
pub use word::{META_CHARS, Tok, Word};

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;

/// The distinguishable outcomes at the call boundary. Scan I/O errors
/// never appear here; they collapse to empty branches during traversal.
#[derive(Debug, Error)]
pub enum GlobError {
    /// Malformed pattern, reported before any filesystem access.
    #[error("bad pattern: {0}")]
    BadPattern(#[from] CompileError),
    /// The pattern matched nothing and the options demand an error.
    #[error("no matches found: {0}")]
    NoMatch(String),
    /// The external interrupt flag was raised mid-scan.
    #[error("interrupted")]
    Interrupted,
}

/// Poll-based cancellation. Checked at each directory entry and each
/// recursive scan step; when it fires, traversal unwinds and the call
/// returns [`GlobError::Interrupted`] with no results.
pub trait Interrupt {
    fn interrupted(&self) -> bool;
}

/// A no-op interrupt source for callers that never cancel.
pub struct Never;

impl Interrupt for Never {
    fn interrupted(&self) -> bool {
        false
    }
}

impl<I: Interrupt + ?Sized> Interrupt for &I {
    fn interrupted(&self) -> bool {
        (*self).interrupted()
    }
}

/// Shells typically flip an atomic from a signal handler.
impl Interrupt for AtomicBool {
    fn interrupted(&self) -> bool {
        self.load(Ordering::Relaxed)
    }
}

/// Expand one word against the filesystem.
///
/// Returns the sorted matches, spliced by the caller into the argument
/// list at the word's position. A word without metacharacters passes
/// through untouched. A pattern that matches nothing resolves, per the
/// option snapshot and any `(N)` qualifier, to the original word, an
/// empty list, or [`GlobError::NoMatch`]. A malformed pattern resolves
/// to the original word unless `bad_pattern` is set.
pub fn expand<F: GlobFs, I: Interrupt>(
    fs: &F,
    word: &Word,
    opts: &GlobOptions,
    interrupt: &I,
) -> Result<Vec<String>, GlobError> {
    if !word.has_meta() {
        return Ok(vec![word.text().to_string()]);
    }

    let compiled = match compile::compile(word, opts) {
        Ok(compiled) => compiled,
        Err(err) if opts.bad_pattern => return Err(GlobError::BadPattern(err)),
        Err(_) => return Ok(vec![word.text().to_string()]),
    };

    let mut results = run_scan(fs, &compiled, opts, interrupt)?;
    if results.is_empty() {
        return match opts.no_match_behavior(compiled.mods.null_glob) {
            NoMatchBehavior::KeepWord => Ok(vec![word.text().to_string()]),
            NoMatchBehavior::Drop => Ok(Vec::new()),
            NoMatchBehavior::Error => Err(GlobError::NoMatch(word.text().to_string())),
        };
    }

    collect::sort_results(&mut results, opts.numeric_sort, opts.collation);
    Ok(results)
}

fn run_scan<F: GlobFs, I: Interrupt>(
    fs: &F,
    compiled: &CompiledGlob,
    opts: &GlobOptions,
    interrupt: &I,
) -> Result<Vec<String>, GlobError> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0);

    let mut collector = collect::Collector::new(
        fs,
        &compiled.quals,
        opts.mark_dirs || compiled.mods.mark_dirs,
        compiled.mods.list_types,
        now,
    );
    let cx = scan::ScanCx {
        fs,
        interrupt,
        glob_dots: opts.glob_dots || compiled.mods.glob_dots,
        collate: opts.collation,
    };
    let mut state = scan::ScanState {
        prefix: if compiled.rooted {
            "/".to_string()
        } else {
            String::new()
        },
        visited: HashSet::new(),
    };
    scan::scan(&cx, &compiled.chain, 0, false, &mut state, &mut collector)?;
    Ok(collector.into_results())
}

//! Filesystem scanner: drives directory traversal from the compiled
//! path chain.
//!
//! One segment is processed per recursion level. Closure segments try
//! zero repetitions (the rest of the chain in place) and one more
//! repetition per matching subdirectory, with a `(dev, ino)` visited set
//! bounding symlink-cycle descent. Wildcard-free segments never
//! enumerate a directory; they probe. Directory-open failures yield zero
//! matches from that branch, silently unless the error is unexpected.

use std::collections::HashSet;
use std::io;
use std::path::Path;

use crate::GlobError;
use crate::Interrupt;
use crate::collect::Collector;
use crate::fs::GlobFs;
use crate::matcher::segment_matches;
use crate::node::{ChainSeg, Closure};

/// Read-only context shared by every recursion level of one scan.
pub(crate) struct ScanCx<'a, F: GlobFs, I: Interrupt> {
    pub fs: &'a F,
    pub interrupt: &'a I,
    /// Wildcards may match a leading dot.
    pub glob_dots: bool,
    pub collate: bool,
}

/// Mutable per-call state: the accumulated path prefix (always empty or
/// `/`-terminated) and the closure-descent cycle memo.
pub(crate) struct ScanState {
    pub prefix: String,
    pub visited: HashSet<(u64, u64)>,
}

/// Scan the chain from segment `idx` under the accumulated prefix.
/// `min_met` records that the closure at `idx`, if any, has already done
/// one repetition on this path.
pub(crate) fn scan<F: GlobFs, I: Interrupt>(
    cx: &ScanCx<'_, F, I>,
    chain: &[ChainSeg],
    idx: usize,
    min_met: bool,
    state: &mut ScanState,
    out: &mut Collector<'_, F>,
) -> Result<(), GlobError> {
    if cx.interrupt.interrupted() {
        return Err(GlobError::Interrupted);
    }

    let Some(seg) = chain.get(idx) else {
        // Past the end: a trailing closure or a directory-only pattern
        // landed here, and the accumulated prefix is the candidate —
        // provided it names a real directory.
        if !state.prefix.is_empty()
            && cx
                .fs
                .stat(Path::new(&state.prefix))
                .is_ok_and(|meta| meta.is_dir())
        {
            out.insert(state.prefix.clone());
        }
        return Ok(());
    };

    if seg.is_closure() {
        // Zero further repetitions: the rest of the chain applies right
        // here.
        if seg.closure == Closure::ZeroOrMoreDirs || min_met {
            scan(cx, chain, idx + 1, false, state, out)?;
        }

        // One more repetition per matching subdirectory.
        let Some(entries) = list_dir(cx.fs, &state.prefix) else {
            return Ok(());
        };
        let needs_full = seg.pattern.needs_full_path();
        for name in entries {
            if cx.interrupt.interrupted() {
                return Err(GlobError::Interrupted);
            }
            if name == "." || name == ".." {
                continue;
            }
            if !matches_entry(cx, seg, &name, &state.prefix, needs_full) {
                continue;
            }
            let child = format!("{}{}", state.prefix, name);
            let meta = if seg.follow_links {
                cx.fs.stat(Path::new(&child))
            } else {
                cx.fs.lstat(Path::new(&child))
            };
            let Ok(meta) = meta else { continue };
            if !meta.is_dir() {
                continue;
            }
            // Skip directories this traversal has already descended, so
            // link cycles terminate.
            if !state.visited.insert((meta.dev, meta.ino)) {
                continue;
            }
            let saved = state.prefix.len();
            state.prefix.push_str(&name);
            state.prefix.push('/');
            scan(cx, chain, idx, true, state, out)?;
            state.prefix.truncate(saved);
        }
        return Ok(());
    }

    let is_last = idx + 1 == chain.len();

    // A wildcard-free segment needs no enumeration: probe the one path it
    // can name.
    if let Some(text) = seg.pattern.literal() {
        let path = format!("{}{}", state.prefix, text);
        if is_last {
            if cx.fs.lstat(Path::new(&path)).is_ok() {
                out.insert(path);
            }
        } else {
            let saved = state.prefix.len();
            state.prefix.push_str(&text);
            state.prefix.push('/');
            scan(cx, chain, idx + 1, false, state, out)?;
            state.prefix.truncate(saved);
        }
        return Ok(());
    }

    let Some(entries) = list_dir(cx.fs, &state.prefix) else {
        return Ok(());
    };
    let needs_full = seg.pattern.needs_full_path();
    for name in entries {
        if cx.interrupt.interrupted() {
            return Err(GlobError::Interrupted);
        }
        if name == "." || name == ".." {
            continue;
        }
        if !matches_entry(cx, seg, &name, &state.prefix, needs_full) {
            continue;
        }
        if is_last {
            out.insert(format!("{}{}", state.prefix, name));
        } else {
            let saved = state.prefix.len();
            state.prefix.push_str(&name);
            state.prefix.push('/');
            scan(cx, chain, idx + 1, false, state, out)?;
            state.prefix.truncate(saved);
        }
    }
    Ok(())
}

fn matches_entry<F: GlobFs, I: Interrupt>(
    cx: &ScanCx<'_, F, I>,
    seg: &ChainSeg,
    name: &str,
    prefix: &str,
    needs_full: bool,
) -> bool {
    let chars: Vec<char> = name.chars().collect();
    let full: Vec<char> = if needs_full {
        prefix.chars().chain(name.chars()).collect()
    } else {
        Vec::new()
    };
    segment_matches(&seg.pattern, &chars, &full, !cx.glob_dots, cx.collate)
}

/// Enumerate the directory named by the prefix (the working directory
/// when empty). Failures yield `None`; only unexpected errors are
/// reported, and traversal continues elsewhere either way.
fn list_dir<F: GlobFs>(fs: &F, prefix: &str) -> Option<Vec<String>> {
    let dir = if prefix.is_empty() {
        Path::new(".")
    } else {
        Path::new(prefix)
    };
    match fs.read_dir(dir) {
        Ok(entries) => Some(entries),
        Err(err) => {
            match err.kind() {
                io::ErrorKind::NotFound
                | io::ErrorKind::NotADirectory
                | io::ErrorKind::Interrupted => {}
                _ => tracing::warn!("cannot read directory {}: {}", dir.display(), err),
            }
            None
        }
    }
}

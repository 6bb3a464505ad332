//! Option-flag snapshot for one expansion call.

/// A snapshot of the shell options that influence filename generation.
///
/// The shell captures these once per word; the engine never reads global
/// state. All flags default to off.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobOptions {
    /// Enable `~` exclusion, `^` negation and `#`/`##` repetition.
    pub extended_glob: bool,
    /// Let wildcards match names with a leading dot.
    pub glob_dots: bool,
    /// A pattern with no matches expands to nothing instead of itself.
    pub null_glob: bool,
    /// csh-style soft null glob: the word is dropped on no match, and the
    /// caller decides whether losing every word of the list is an error.
    pub csh_null_glob: bool,
    /// A pattern with no matches raises a hard error.
    pub no_match_error: bool,
    /// Append `/` to directory matches.
    pub mark_dirs: bool,
    /// Sort embedded digit runs numerically instead of byte-wise.
    pub numeric_sort: bool,
    /// Malformed patterns are a hard error instead of expanding to
    /// themselves.
    pub bad_pattern: bool,
    /// Locale collation is available: class ranges and the final sort use
    /// a case-insensitive-first comparison with a byte-order tiebreak.
    pub collation: bool,
}

/// What to do when a pattern matches nothing, resolved from the option
/// snapshot and any per-pattern qualifier modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoMatchBehavior {
    /// Expand to the original word, unchanged.
    KeepWord,
    /// Expand to nothing.
    Drop,
    /// Raise a hard "no matches" error.
    Error,
}

impl GlobOptions {
    /// Resolve the no-match policy. `pattern_null_glob` is the per-pattern
    /// `(N)` qualifier override.
    pub(crate) fn no_match_behavior(&self, pattern_null_glob: bool) -> NoMatchBehavior {
        if pattern_null_glob || self.null_glob || self.csh_null_glob {
            NoMatchBehavior::Drop
        } else if self.no_match_error {
            NoMatchBehavior::Error
        } else {
            NoMatchBehavior::KeepWord
        }
    }
}

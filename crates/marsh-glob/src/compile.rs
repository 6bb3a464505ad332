//! Pattern compiler: tokenized word → path chain + qualifier clause.
//!
//! The compiler recognizes a trailing qualifier clause first, splits the
//! remainder into path segments on unparenthesized slashes, and parses
//! each segment into a [`Pattern`]. Recursive-descent forms (`**/`,
//! `***/`, `(dir/)#`) become chain segments with a closure tag. A
//! malformed word yields a single [`CompileError`]; no partial tree is
//! ever used.

use thiserror::Error;

use crate::node::{ChainSeg, ClassItem, Closure, PatNode, Pattern, Repeat};
use crate::options::GlobOptions;
use crate::qual::{self, QualClause, ScanMods};
use crate::word::{Tok, Word};

/// A malformed pattern. Reported before any filesystem access.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error("empty pattern")]
    Empty,
    #[error("unbalanced `[` at position {0}")]
    UnbalancedBracket(usize),
    #[error("unbalanced parenthesis at position {0}")]
    UnbalancedParen(usize),
    #[error("malformed numeric range at position {0}")]
    BadNumRange(usize),
    #[error("repetition has nothing to repeat at position {0}")]
    DanglingRepeat(usize),
    #[error("recursive group may span only one path level")]
    BadClosureGroup,
    #[error("unknown glob qualifier `{0}`")]
    UnknownQualifier(char),
    #[error("malformed glob qualifier `{0}`")]
    BadQualifier(char),
    #[error("unknown user name `{0}`")]
    UnknownUser(String),
    #[error("unknown group name `{0}`")]
    UnknownGroup(String),
}

/// A fully compiled word: the path chain, the qualifier clause, and the
/// per-pattern scan-policy overrides. Read-only once built.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledGlob {
    /// Pattern began with `/`: the chain is anchored at the filesystem
    /// root instead of the working directory.
    pub(crate) rooted: bool,
    /// Pattern ended with `/`: only directories may match.
    pub(crate) require_dir: bool,
    pub(crate) chain: Vec<ChainSeg>,
    pub(crate) quals: QualClause,
    pub(crate) mods: ScanMods,
}

impl CompiledGlob {
    /// True when the pattern began with `/`.
    pub fn rooted(&self) -> bool {
        self.rooted
    }

    /// True when the pattern ended with `/`, restricting matches to
    /// directories.
    pub fn requires_directory(&self) -> bool {
        self.require_dir
    }

    /// The compiled root-to-leaf path chain.
    pub fn chain(&self) -> &[ChainSeg] {
        &self.chain
    }
}

/// Compile a tokenized word under the given option snapshot.
pub fn compile(word: &Word, opts: &GlobOptions) -> Result<CompiledGlob, CompileError> {
    let mut toks = word.toks();
    if toks.is_empty() {
        return Err(CompileError::Empty);
    }

    // A trailing parenthesized group is a qualifier clause only when it
    // is not pattern syntax (alternation, exclusion, repetition, or a
    // nested group).
    let mut quals = QualClause::default();
    let mut mods = ScanMods::default();
    if let Some(open) = trailing_group_start(toks)? {
        let content = &toks[open + 1..toks.len() - 1];
        // A group attached to a `~` exclusion or `^` negation is pattern
        // syntax no matter what it contains.
        let excluded = open > 0 && matches!(toks[open - 1], Tok::Meta('~') | Tok::Meta('^'));
        if !excluded && is_qualifier_content(content) {
            let (q, m) = qual::parse_clause(content)?;
            quals = q;
            mods = m;
            toks = &toks[..open];
            if toks.is_empty() {
                return Err(CompileError::Empty);
            }
        }
    }

    let require_dir = toks.last().is_some_and(|t| t.is_lit('/'));

    // A leading slash anchors the chain at the filesystem root.
    let mut rooted = false;
    while toks.first().is_some_and(|t| t.is_lit('/')) {
        rooted = true;
        toks = &toks[1..];
    }

    let segments = split_segments(toks)?;
    if segments.is_empty() {
        return Err(CompileError::Empty);
    }

    let mut chain = Vec::new();
    // With a trailing slash no segment is final: `**/` stays recursive
    // and the chain ends on the directory the prefix names.
    let last_idx = segments.len() - 1;
    for (i, (base, seg)) in segments.iter().enumerate() {
        let is_last = i == last_idx && !require_dir;
        compile_segment(seg, *base, is_last, opts, &mut chain)?;
    }
    if chain.is_empty() {
        return Err(CompileError::Empty);
    }

    Ok(CompiledGlob {
        rooted,
        require_dir,
        chain,
        quals,
        mods,
    })
}

/// If the word ends in `)`, locate its matching `(` by scanning backward.
fn trailing_group_start(toks: &[Tok]) -> Result<Option<usize>, CompileError> {
    if !toks.last().is_some_and(|t| t.is_meta(')')) {
        return Ok(None);
    }
    let mut depth = 0usize;
    for (i, tok) in toks.iter().enumerate().rev() {
        if tok.is_meta(')') {
            depth += 1;
        } else if tok.is_meta('(') {
            depth -= 1;
            if depth == 0 {
                return Ok(Some(i));
            }
        }
    }
    Err(CompileError::UnbalancedParen(toks.len() - 1))
}

/// A trailing group is a qualifier clause unless its body carries
/// pattern-only syntax at the top level.
fn is_qualifier_content(content: &[Tok]) -> bool {
    let mut depth = 0usize;
    for tok in content {
        match tok {
            Tok::Meta('(') => depth += 1,
            Tok::Meta(')') => depth = depth.saturating_sub(1),
            Tok::Meta('|') | Tok::Meta('~') | Tok::Meta('#') if depth == 0 => return false,
            _ => {}
        }
    }
    // A nested group is grouping syntax, never a qualifier.
    !content.iter().any(|t| t.is_meta('('))
}

/// Split on unparenthesized literal slashes; empty segments (doubled or
/// trailing slashes) are dropped. Returns `(offset, tokens)` pairs.
fn split_segments(toks: &[Tok]) -> Result<Vec<(usize, &[Tok])>, CompileError> {
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, tok) in toks.iter().enumerate() {
        match tok {
            Tok::Meta('(') => depth += 1,
            Tok::Meta(')') => {
                if depth == 0 {
                    return Err(CompileError::UnbalancedParen(i));
                }
                depth -= 1;
            }
            Tok::Lit('/') if depth == 0 => {
                if i > start {
                    segments.push((start, &toks[start..i]));
                }
                start = i + 1;
            }
            _ => {}
        }
    }
    if start < toks.len() {
        segments.push((start, &toks[start..]));
    }
    Ok(segments)
}

/// Compile one slash-delimited segment, appending one or more chain
/// segments (closure-group forms expand to several).
fn compile_segment(
    seg: &[Tok],
    base: usize,
    is_last: bool,
    opts: &GlobOptions,
    chain: &mut Vec<ChainSeg>,
) -> Result<(), CompileError> {
    // `**` and `***` before a slash are recursive descent; in final
    // position the stars collapse to a plain `*`.
    let stars = seg.iter().take_while(|t| t.is_meta('*')).count();
    if stars == seg.len() && (stars == 2 || stars == 3) {
        if is_last {
            chain.push(ChainSeg::plain(Pattern::any()));
        } else {
            let follow = stars == 3;
            // Consecutive recursive segments collapse to one.
            let dup = chain.last().is_some_and(|last| {
                last.closure == Closure::ZeroOrMoreDirs
                    && last.follow_links == follow
                    && last.pattern == Pattern::any()
            });
            if !dup {
                chain.push(ChainSeg::closure(
                    Pattern::any(),
                    Closure::ZeroOrMoreDirs,
                    follow,
                ));
            }
        }
        return Ok(());
    }

    // `(dir/)#` and `(dir/)##`: explicit recursive-descent groups, one or
    // more of which may prefix the segment's final pattern.
    let mut rest = seg;
    let mut rest_base = base;
    while opts.extended_glob
        && let Some((inner, repeat, consumed)) = closure_group(rest, rest_base)?
    {
        let mut parser = Parser::new(inner, rest_base + 1, opts.extended_glob);
        let pattern = parser.parse_alt()?;
        let tag = match repeat {
            Repeat::ZeroOrMore => Closure::ZeroOrMoreDirs,
            Repeat::OneOrMore => Closure::OneOrMoreDirs,
        };
        chain.push(ChainSeg::closure(pattern, tag, false));
        rest = &rest[consumed..];
        rest_base += consumed;
    }

    // A segment that was entirely closure groups contributes nothing
    // further; the closures themselves terminate the chain.
    if !rest.is_empty() {
        let mut parser = Parser::new(rest, rest_base, opts.extended_glob);
        chain.push(ChainSeg::plain(parser.parse_alt()?));
    }
    Ok(())
}

/// Detect a leading `(pat/)#` form. Returns the inner tokens (without the
/// trailing slash), the repeat tag, and how many tokens were consumed.
fn closure_group(
    seg: &[Tok],
    base: usize,
) -> Result<Option<(&[Tok], Repeat, usize)>, CompileError> {
    if !seg.first().is_some_and(|t| t.is_meta('(')) {
        return Ok(None);
    }
    let close = matching_paren(seg, base)?;
    // The body must end with `/` and a `#` must follow the group.
    if close == 1
        || !seg[close - 1].is_lit('/')
        || !seg.get(close + 1).is_some_and(|t| t.is_meta('#'))
    {
        return Ok(None);
    }
    let mut inner = &seg[1..close - 1];
    while inner.last().is_some_and(|t| t.is_lit('/')) {
        inner = &inner[..inner.len() - 1];
    }
    // The embedded pattern matches one directory level at a time.
    let mut depth = 0usize;
    for tok in inner {
        match tok {
            Tok::Meta('(') => depth += 1,
            Tok::Meta(')') => depth = depth.saturating_sub(1),
            Tok::Lit('/') if depth == 0 => return Err(CompileError::BadClosureGroup),
            _ => {}
        }
    }
    let (repeat, consumed) = if seg.get(close + 2).is_some_and(|t| t.is_meta('#')) {
        (Repeat::OneOrMore, close + 3)
    } else {
        (Repeat::ZeroOrMore, close + 2)
    };
    Ok(Some((inner, repeat, consumed)))
}

/// Index of the `)` matching the `(` at position 0.
fn matching_paren(toks: &[Tok], base: usize) -> Result<usize, CompileError> {
    let mut depth = 0usize;
    for (i, tok) in toks.iter().enumerate() {
        if tok.is_meta('(') {
            depth += 1;
        } else if tok.is_meta(')') {
            depth -= 1;
            if depth == 0 {
                return Ok(i);
            }
        }
    }
    Err(CompileError::UnbalancedParen(base))
}

/// Recursive-descent parser over one segment's tokens.
struct Parser<'a> {
    toks: &'a [Tok],
    pos: usize,
    base: usize,
    ext: bool,
}

impl<'a> Parser<'a> {
    fn new(toks: &'a [Tok], base: usize, ext: bool) -> Self {
        Self {
            toks,
            pos: 0,
            base,
            ext,
        }
    }

    fn peek(&self) -> Option<Tok> {
        self.toks.get(self.pos).copied()
    }

    fn at(&self, c: char) -> bool {
        self.peek().is_some_and(|t| t.is_meta(c))
    }

    fn err_pos(&self) -> usize {
        self.base + self.pos
    }

    /// `branch ('|' alt)?` — alternation nests to the right.
    fn parse_alt(&mut self) -> Result<Pattern, CompileError> {
        let left = self.parse_branch()?;
        if self.at('|') {
            self.pos += 1;
            let right = self.parse_alt()?;
            return Ok(Pattern::new(vec![PatNode::Alt { left, right }]));
        }
        Ok(left)
    }

    /// `seq ('~' seq)*` — each exclusion attaches to everything on its
    /// left, so `x~y~z` reads `(x~y)~z`.
    fn parse_branch(&mut self) -> Result<Pattern, CompileError> {
        let mut result = self.parse_seq()?;
        while self.ext && self.at('~') {
            self.pos += 1;
            let excl = self.parse_seq()?;
            let full_path = excl.contains_slash();
            result = Pattern::new(vec![PatNode::Exclude {
                body: result,
                excl,
                full_path,
            }]);
        }
        Ok(result)
    }

    /// A run of atoms, ending at `|`, `~` (extended) or the end of the
    /// token slice.
    fn parse_seq(&mut self) -> Result<Pattern, CompileError> {
        let mut nodes = Vec::new();
        while let Some(tok) = self.peek() {
            match tok {
                Tok::Meta('|') => break,
                Tok::Meta('~') if self.ext => break,
                Tok::Meta('*') => {
                    nodes.push(PatNode::AnySeq);
                    self.pos += 1;
                }
                Tok::Meta('?') => {
                    nodes.push(PatNode::AnyChar);
                    self.pos += 1;
                }
                Tok::Meta('[') => nodes.push(self.parse_class()?),
                Tok::Meta('<') => nodes.push(self.parse_num_range()?),
                Tok::Meta('(') => {
                    let start = self.pos;
                    let close = start + matching_paren(&self.toks[start..], self.err_pos())?;
                    let inner = &self.toks[start + 1..close];
                    let mut sub = Parser::new(inner, self.base + start + 1, self.ext);
                    let body = sub.parse_alt()?;
                    self.pos = close + 1;
                    let repeat = self.take_repeat();
                    nodes.push(PatNode::Group { body, repeat });
                }
                Tok::Meta('#') if self.ext => {
                    // Repetition of the preceding atom.
                    let Some(prev) = nodes.pop() else {
                        return Err(CompileError::DanglingRepeat(self.err_pos()));
                    };
                    let repeat = self.take_repeat().unwrap_or(Repeat::ZeroOrMore);
                    nodes.push(match prev {
                        PatNode::Group { body, repeat: None } => PatNode::Group {
                            body,
                            repeat: Some(repeat),
                        },
                        prev => PatNode::Group {
                            body: Pattern::new(vec![prev]),
                            repeat: Some(repeat),
                        },
                    });
                }
                Tok::Meta('^') if self.ext => {
                    // `^pat`: anything the rest of the branch does not
                    // match.
                    self.pos += 1;
                    let excl = self.parse_seq()?;
                    let full_path = excl.contains_slash();
                    nodes.push(PatNode::Exclude {
                        body: Pattern::any(),
                        excl,
                        full_path,
                    });
                }
                // Everything else — escaped metacharacters, stray `]`,
                // `{`/`}` left over from upstream expansion, and `~`,
                // `^`, `#` outside extended globbing — is literal.
                tok => {
                    nodes.push(PatNode::Lit(tok.ch()));
                    self.pos += 1;
                }
            }
        }
        Ok(Pattern::new(nodes))
    }

    /// Consume `#` or `##` after an atom; only meaningful with extended
    /// globbing.
    fn take_repeat(&mut self) -> Option<Repeat> {
        if !self.ext || !self.at('#') {
            return None;
        }
        self.pos += 1;
        if self.at('#') {
            self.pos += 1;
            Some(Repeat::OneOrMore)
        } else {
            Some(Repeat::ZeroOrMore)
        }
    }

    fn parse_class(&mut self) -> Result<PatNode, CompileError> {
        let start = self.err_pos();
        self.pos += 1;

        let mut negated = false;
        if self
            .peek()
            .is_some_and(|t| t.is_meta('^') || t.is_lit('!'))
        {
            negated = true;
            self.pos += 1;
        }

        let mut items = Vec::new();
        let mut first = true;
        loop {
            let Some(tok) = self.peek() else {
                return Err(CompileError::UnbalancedBracket(start));
            };
            // `]` in first position is a member, not the closer.
            if tok.is_meta(']') && !first {
                self.pos += 1;
                break;
            }
            first = false;
            let c = tok.ch();
            // `a-z` is a range unless the `-` is last before the closer.
            let dashed = self.toks.get(self.pos + 1).is_some_and(|t| t.ch() == '-')
                && self
                    .toks
                    .get(self.pos + 2)
                    .is_some_and(|t| !t.is_meta(']'));
            if dashed {
                let hi = self.toks[self.pos + 2].ch();
                items.push(ClassItem::Range(c, hi));
                self.pos += 3;
            } else {
                items.push(ClassItem::Single(c));
                self.pos += 1;
            }
        }
        Ok(PatNode::Class { negated, items })
    }

    fn parse_num_range(&mut self) -> Result<PatNode, CompileError> {
        let start = self.err_pos();
        self.pos += 1;

        let lo = self.take_digits();
        if !self.peek().is_some_and(|t| t.is_lit('-')) {
            return Err(CompileError::BadNumRange(start));
        }
        self.pos += 1;
        let hi = self.take_digits();
        if !self.at('>') {
            return Err(CompileError::BadNumRange(start));
        }
        self.pos += 1;
        Ok(PatNode::NumRange { lo, hi })
    }

    /// A run of literal digits, saturating on overflow; `None` when no
    /// digit is present (an open bound).
    fn take_digits(&mut self) -> Option<u64> {
        let mut value: Option<u64> = None;
        while let Some(tok) = self.peek()
            && let Tok::Lit(c) = tok
            && c.is_ascii_digit()
        {
            let d = c.to_digit(10).unwrap_or(0) as u64;
            value = Some(
                value
                    .unwrap_or(0)
                    .saturating_mul(10)
                    .saturating_add(d),
            );
            self.pos += 1;
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile_ext(s: &str) -> Result<CompiledGlob, CompileError> {
        let opts = GlobOptions {
            extended_glob: true,
            ..Default::default()
        };
        compile(&Word::parse(s), &opts)
    }

    #[test]
    fn splits_on_slashes() {
        let c = compile_ext("src/*/main.rs").unwrap();
        assert_eq!(c.chain.len(), 3);
        assert!(!c.rooted);
        assert_eq!(c.chain[0].pattern.literal(), Some("src".into()));
        assert_eq!(c.chain[1].pattern.nodes, vec![PatNode::AnySeq]);
        assert!(c.chain[2].pattern.literal().is_none());
    }

    #[test]
    fn leading_slash_roots_the_chain() {
        let c = compile_ext("/usr/*").unwrap();
        assert!(c.rooted);
        assert_eq!(c.chain.len(), 2);
    }

    #[test]
    fn trailing_slash_requires_directories() {
        let c = compile_ext("sub*/").unwrap();
        assert!(c.require_dir);
        assert_eq!(c.chain.len(), 1);
    }

    #[test]
    fn doubled_slashes_collapse() {
        let c = compile_ext("a//b").unwrap();
        assert_eq!(c.chain.len(), 2);
    }

    #[test]
    fn globstar_becomes_closure_segment() {
        let c = compile_ext("**/*.c").unwrap();
        assert_eq!(c.chain.len(), 2);
        assert_eq!(c.chain[0].closure, Closure::ZeroOrMoreDirs);
        assert!(!c.chain[0].follow_links);
        assert_eq!(c.chain[1].closure, Closure::None);
    }

    #[test]
    fn triple_star_follows_links() {
        let c = compile_ext("***/x").unwrap();
        assert!(c.chain[0].follow_links);
        assert_eq!(c.chain[0].closure, Closure::ZeroOrMoreDirs);
    }

    #[test]
    fn final_globstar_is_a_plain_star() {
        let c = compile_ext("src/**").unwrap();
        assert_eq!(c.chain.len(), 2);
        assert_eq!(c.chain[1].closure, Closure::None);
        assert_eq!(c.chain[1].pattern.nodes, vec![PatNode::AnySeq]);
    }

    #[test]
    fn explicit_closure_group() {
        let c = compile_ext("(node_modules/)#pkg.json").unwrap();
        assert_eq!(c.chain.len(), 2);
        assert_eq!(c.chain[0].closure, Closure::ZeroOrMoreDirs);
        assert_eq!(
            c.chain[0].pattern.literal(),
            Some("node_modules".to_string())
        );
        assert_eq!(c.chain[1].pattern.literal(), Some("pkg.json".into()));

        let c = compile_ext("(a/)##z").unwrap();
        assert_eq!(c.chain[0].closure, Closure::OneOrMoreDirs);
    }

    #[test]
    fn multi_level_closure_group_is_rejected() {
        assert_eq!(
            compile_ext("(a/b/)#z"),
            Err(CompileError::BadClosureGroup)
        );
    }

    #[test]
    fn trailing_qualifier_clause_is_stripped() {
        let c = compile_ext("*.c(.)").unwrap();
        assert_eq!(c.chain.len(), 1);
        assert!(!c.quals.is_empty());
    }

    #[test]
    fn trailing_alternation_group_is_pattern_syntax() {
        let c = compile_ext("foo(a|b)").unwrap();
        assert!(c.quals.is_empty());
        assert_eq!(c.chain.len(), 1);
    }

    #[test]
    fn trailing_exclusion_group_is_pattern_syntax() {
        let c = compile_ext("(a*~*.bak)").unwrap();
        assert!(c.quals.is_empty());
        assert!(matches!(
            c.chain[0].pattern.nodes[0],
            PatNode::Group { .. }
        ));
    }

    #[test]
    fn unbalanced_bracket_is_an_error() {
        assert_eq!(
            compile_ext("[abc"),
            Err(CompileError::UnbalancedBracket(0))
        );
    }

    #[test]
    fn unbalanced_paren_is_an_error() {
        assert!(matches!(
            compile_ext("(ab"),
            Err(CompileError::UnbalancedParen(_))
        ));
        assert!(matches!(
            compile_ext("ab)"),
            Err(CompileError::UnbalancedParen(_))
        ));
    }

    #[test]
    fn malformed_numeric_range_is_an_error() {
        assert!(matches!(
            compile_ext("<2-"),
            Err(CompileError::BadNumRange(_))
        ));
        assert!(matches!(
            compile_ext("<abc>"),
            Err(CompileError::BadNumRange(_))
        ));
        assert!(compile_ext("<2-5>").is_ok());
        assert!(compile_ext("<->").is_ok());
    }

    #[test]
    fn dangling_repeat_is_an_error() {
        assert!(matches!(
            compile_ext("#ab"),
            Err(CompileError::DanglingRepeat(_))
        ));
    }

    #[test]
    fn unknown_qualifier_letter_is_an_error() {
        assert_eq!(
            compile_ext("*(q)"),
            Err(CompileError::UnknownQualifier('q'))
        );
    }

    #[test]
    fn extended_operators_are_literal_without_the_option() {
        let c = compile(&Word::parse("a~b"), &GlobOptions::default()).unwrap();
        assert_eq!(c.chain[0].pattern.literal(), Some("a~b".into()));

        let c = compile(&Word::parse("a#"), &GlobOptions::default()).unwrap();
        assert_eq!(c.chain[0].pattern.literal(), Some("a#".into()));
    }

    #[test]
    fn escaped_metacharacters_stay_literal() {
        let c = compile_ext("a\\*b").unwrap();
        assert_eq!(c.chain[0].pattern.literal(), Some("a*b".into()));
    }

    #[test]
    fn empty_word_is_an_error() {
        assert_eq!(compile_ext(""), Err(CompileError::Empty));
        assert_eq!(compile_ext("(.)"), Err(CompileError::Empty));
    }
}

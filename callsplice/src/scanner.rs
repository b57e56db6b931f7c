//! Depth-tracking scanner for loop-scoped construction calls.
//!
//! The scanner understands just enough of the target language to find
//!
//! ```text
//! <loop_keyword> ( <iterable> as [<key> =>] <$var> ) {
//!     <call_target>( [ <args> ] );
//! ```
//!
//! where the call is the first statement in the loop body. Nesting of `()`,
//! `[]` and `{}` is tracked explicitly and string literals, heredocs and
//! comments are skipped, so a `]);` inside a string never ends a match.
//!
//! All structural characters are ASCII, so every offset the scanner
//! produces falls on a UTF-8 character boundary.

use regex::Regex;
use std::ops::Range;
use std::sync::OnceLock;

/// One occurrence of the target construct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructMatch {
    /// Loop header up to and including the body's opening brace and the
    /// whitespace that follows it.
    pub header: Range<usize>,
    /// Per-iteration variable, including the `$` sigil.
    pub loop_var: String,
    /// The construction call statement, from the call target through `;`.
    pub call: Range<usize>,
    /// Contents of the bracketed argument list, without the brackets.
    pub args: Range<usize>,
}

impl ConstructMatch {
    /// Text of the loop header.
    #[must_use]
    pub fn header_text<'s>(&self, source: &'s str) -> &'s str {
        &source[self.header.clone()]
    }

    /// Text of the construction call statement.
    #[must_use]
    pub fn call_text<'s>(&self, source: &'s str) -> &'s str {
        &source[self.call.clone()]
    }

    /// Text of the call's argument body.
    #[must_use]
    pub fn args_text<'s>(&self, source: &'s str) -> &'s str {
        &source[self.args.clone()]
    }
}

fn loop_var_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::expect_used)]
    RE.get_or_init(|| {
        Regex::new(r"(?s)\bas\s+(?:&?\$\w+\s*=>\s*)?&?(\$\w+)\s*$")
            .expect("Invalid loop variable regex pattern")
    })
}

const fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b >= 0x80
}

/// Scanner over a single source text.
#[derive(Debug, Clone, Copy)]
pub struct Scanner<'a> {
    source: &'a str,
    bytes: &'a [u8],
}

impl<'a> Scanner<'a> {
    /// Create a scanner for `source`.
    #[must_use]
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
        }
    }

    /// Find every construct, left to right and non-overlapping.
    ///
    /// A loop whose body does not open with `call_target` is skipped, but
    /// scanning continues inside it so nested loops are still found.
    #[must_use]
    pub fn constructs(&self, loop_keyword: &str, call_target: &str) -> Vec<ConstructMatch> {
        let mut found = Vec::new();
        if loop_keyword.is_empty() || call_target.is_empty() {
            return found;
        }

        let mut pos = 0;
        while pos < self.bytes.len() {
            if let Some(next) = self.skip_trivia_at(pos) {
                pos = next;
                continue;
            }

            if self.keyword_at(pos, loop_keyword) {
                if let Some(m) = self.construct_at(pos, loop_keyword, call_target) {
                    pos = m.call.end;
                    found.push(m);
                } else {
                    pos += loop_keyword.len();
                }
                continue;
            }

            pos += 1;
        }

        found
    }

    /// If a string literal, heredoc or comment starts at `pos`, return the
    /// offset just past it.
    fn skip_trivia_at(&self, pos: usize) -> Option<usize> {
        match self.bytes[pos] {
            b'\'' | b'"' | b'`' => Some(self.skip_string(pos)),
            b'/' if self.bytes.get(pos + 1) == Some(&b'/') => Some(self.skip_line(pos)),
            b'/' if self.bytes.get(pos + 1) == Some(&b'*') => Some(self.skip_block_comment(pos)),
            // `#[` opens an attribute, not a comment
            b'#' if self.bytes.get(pos + 1) != Some(&b'[') => Some(self.skip_line(pos)),
            b'<' if self.bytes[pos..].starts_with(b"<<<") => self.skip_heredoc(pos),
            _ => None,
        }
    }

    fn skip_string(&self, pos: usize) -> usize {
        let quote = self.bytes[pos];
        let mut i = pos + 1;
        while i < self.bytes.len() {
            match self.bytes[i] {
                b'\\' => i += 2,
                b if b == quote => return i + 1,
                _ => i += 1,
            }
        }
        self.bytes.len()
    }

    fn skip_line(&self, pos: usize) -> usize {
        self.source[pos..]
            .find('\n')
            .map_or(self.bytes.len(), |n| pos + n)
    }

    fn skip_block_comment(&self, pos: usize) -> usize {
        self.source[pos + 2..]
            .find("*/")
            .map_or(self.bytes.len(), |n| pos + 2 + n + 2)
    }

    /// Skip `<<<ID ... ID` and `<<<'ID' ... ID`. Returns `None` when the
    /// opener is not a well-formed heredoc so `<<<` is scanned as code.
    fn skip_heredoc(&self, pos: usize) -> Option<usize> {
        let mut i = self.skip_spaces(pos + 3);
        let quoted = matches!(self.bytes.get(i), Some(b'\'' | b'"'));
        if quoted {
            i += 1;
        }
        let id_start = i;
        while i < self.bytes.len() && is_ident_byte(self.bytes[i]) {
            i += 1;
        }
        if i == id_start {
            return None;
        }
        let ident = &self.source[id_start..i];
        if quoted {
            // The identifier must be closed by the same quote.
            if self.bytes.get(i) != self.bytes.get(id_start - 1) {
                return None;
            }
            i += 1;
        }

        let mut line = self.source.get(i..)?.find('\n').map(|n| i + n + 1)?;
        while line < self.bytes.len() {
            let content = self.skip_spaces(line);
            let end = content + ident.len();
            if self.source[content..].starts_with(ident)
                && self.bytes.get(end).is_none_or(|b| !is_ident_byte(*b))
            {
                return Some(end);
            }
            line = self.source[line..]
                .find('\n')
                .map_or(self.bytes.len(), |n| line + n + 1);
        }
        Some(self.bytes.len())
    }

    fn skip_spaces(&self, mut pos: usize) -> usize {
        while pos < self.bytes.len() && matches!(self.bytes[pos], b' ' | b'\t') {
            pos += 1;
        }
        pos
    }

    fn skip_whitespace(&self, mut pos: usize) -> usize {
        while pos < self.bytes.len() && self.bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        pos
    }

    /// Skip whitespace and comments between tokens of a loop header.
    fn skip_gap(&self, mut pos: usize) -> usize {
        loop {
            pos = self.skip_whitespace(pos);
            if pos >= self.bytes.len() {
                return pos;
            }
            let next = match (self.bytes[pos], self.bytes.get(pos + 1)) {
                (b'/', Some(b'/')) => self.skip_line(pos),
                (b'/', Some(b'*')) => self.skip_block_comment(pos),
                (b'#', next) if next != Some(&b'[') => self.skip_line(pos),
                _ => return pos,
            };
            pos = next;
        }
    }

    fn keyword_at(&self, pos: usize, keyword: &str) -> bool {
        // Byte comparison: `pos` may sit inside a multi-byte character.
        if !self.bytes[pos..].starts_with(keyword.as_bytes()) {
            return false;
        }
        let before_ok = pos == 0 || {
            let b = self.bytes[pos - 1];
            !is_ident_byte(b) && b != b'$' && b != b'>' && b != b':'
        };
        let after_ok = self
            .bytes
            .get(pos + keyword.len())
            .is_none_or(|b| !is_ident_byte(*b));
        before_ok && after_ok
    }

    /// Offset of the closer matching the opener at `open`, tracking all
    /// three bracket kinds. `None` if unbalanced or unterminated.
    fn matching_close(&self, open: usize) -> Option<usize> {
        let mut stack = Vec::new();
        let mut pos = open;
        while pos < self.bytes.len() {
            if let Some(next) = self.skip_trivia_at(pos) {
                pos = next;
                continue;
            }
            match self.bytes[pos] {
                b'(' => stack.push(b')'),
                b'[' => stack.push(b']'),
                b'{' => stack.push(b'}'),
                closer @ (b')' | b']' | b'}') => {
                    if stack.pop() != Some(closer) {
                        return None;
                    }
                    if stack.is_empty() {
                        return Some(pos);
                    }
                }
                _ => {}
            }
            pos += 1;
        }
        None
    }

    fn expect(&self, pos: usize, byte: u8) -> Option<usize> {
        (self.bytes.get(pos) == Some(&byte)).then_some(pos)
    }

    fn construct_at(
        &self,
        start: usize,
        loop_keyword: &str,
        call_target: &str,
    ) -> Option<ConstructMatch> {
        let open_paren = self.expect(self.skip_gap(start + loop_keyword.len()), b'(')?;
        let close_paren = self.matching_close(open_paren)?;
        let loop_var = loop_var_re()
            .captures(&self.source[open_paren + 1..close_paren])?
            .get(1)?
            .as_str()
            .to_owned();

        let open_brace = self.expect(self.skip_gap(close_paren + 1), b'{')?;
        // The call must be the very first token of the body.
        let body = self.skip_whitespace(open_brace + 1);
        if !self.source[body..].starts_with(call_target) {
            return None;
        }

        let call_paren = self.expect(self.skip_whitespace(body + call_target.len()), b'(')?;
        let open_bracket = self.expect(self.skip_whitespace(call_paren + 1), b'[')?;
        let close_bracket = self.matching_close(open_bracket)?;
        let close_call = self.expect(self.skip_whitespace(close_bracket + 1), b')')?;
        let semicolon = self.expect(self.skip_whitespace(close_call + 1), b';')?;

        Some(ConstructMatch {
            header: start..body,
            loop_var,
            call: body..semicolon + 1,
            args: open_bracket + 1..close_bracket,
        })
    }

    /// Split `range` on commas that sit outside any brackets or strings.
    /// Entries are trimmed; empty entries (trailing commas) are dropped.
    #[must_use]
    pub fn split_top_level(&self, range: Range<usize>) -> Vec<&'a str> {
        let mut entries = Vec::new();
        let mut depth = 0usize;
        let mut entry_start = range.start;
        let mut pos = range.start;
        while pos < range.end {
            if let Some(next) = self.skip_trivia_at(pos) {
                pos = next;
                continue;
            }
            match self.bytes[pos] {
                b'(' | b'[' | b'{' => depth += 1,
                b')' | b']' | b'}' => depth = depth.saturating_sub(1),
                b',' if depth == 0 => {
                    entries.push(&self.source[entry_start..pos]);
                    entry_start = pos + 1;
                }
                _ => {}
            }
            pos += 1;
        }
        entries.push(&self.source[entry_start..range.end.max(entry_start)]);

        entries
            .into_iter()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .collect()
    }
}

/// Find every construct in `source`. See [`Scanner::constructs`].
#[must_use]
pub fn scan_constructs(source: &str, loop_keyword: &str, call_target: &str) -> Vec<ConstructMatch> {
    Scanner::new(source).constructs(loop_keyword, call_target)
}

/// Split an array body on its top-level commas.
#[must_use]
pub fn split_top_level(args: &str) -> Vec<&str> {
    Scanner::new(args).split_top_level(0..args.len())
}

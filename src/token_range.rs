//! Non‑owning views over a [`TokenBuffer`]'s token sequence.
//!
//! A [`TokenRange`] is just a buffer reference plus a `start..end` pair of
//! token indices, so the parser creates and drops them freely.  All positions
//! taken and returned by its methods are *relative* to the range start.

use crate::error::{Result, ScriptError};
use crate::token::Token;
use crate::token_buffer::TokenBuffer;

use std::fmt;

fn is_opening(text: &str) -> bool {
    matches!(text, "(" | "[" | "{")
}

fn is_closing(text: &str) -> bool {
    matches!(text, ")" | "]" | "}")
}

fn matching_closer(opening: &str) -> Option<&'static str> {
    match opening {
        "(" => Some(")"),
        "[" => Some("]"),
        "{" => Some("}"),
        _ => None,
    }
}

fn matching_opener(closing: &str) -> Option<&'static str> {
    match closing {
        ")" => Some("("),
        "]" => Some("["),
        "}" => Some("{"),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TokenRange<'a> {
    buffer: &'a TokenBuffer,
    start: usize,
    end: usize,
}

impl<'a> TokenRange<'a> {
    /// A range over every finalised token of `buffer`.
    pub fn new(buffer: &'a TokenBuffer) -> Self {
        Self {
            buffer,
            start: 0,
            end: buffer.len(),
        }
    }

    /// A range over the absolute token indices `start..end` (clamped).
    pub fn with_bounds(buffer: &'a TokenBuffer, start: usize, end: usize) -> Self {
        let end: usize = end.min(buffer.len());

        Self {
            buffer,
            start: start.min(end),
            end,
        }
    }

    /// Absolute index of the first token.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Absolute index one past the last token.
    pub fn end(&self) -> usize {
        self.end
    }

    pub fn size(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// # Panics
    /// If `pos` is not inside the range.
    pub fn token(&self, pos: usize) -> &'a Token {
        assert!(pos < self.size(), "token position {pos} outside range");

        &self.buffer.tokens()[self.start + pos]
    }

    /// Text of the token at `pos`, or `""` past the end.
    pub fn text(&self, pos: usize) -> &'a str {
        if pos >= self.size() {
            return "";
        }

        self.buffer.str(self.token(pos))
    }

    pub fn first_text(&self) -> &'a str {
        self.text(0)
    }

    pub fn equals(&self, pos: usize, text: &str) -> bool {
        pos < self.size() && self.text(pos) == text
    }

    pub fn begins_with(&self, text: &str) -> bool {
        self.equals(0, text)
    }

    /// The range consists of exactly the one token `text`.
    pub fn is_single(&self, text: &str) -> bool {
        self.size() == 1 && self.equals(0, text)
    }

    /// Sub‑range `from..to` (relative, clamped to this range).
    pub fn between(&self, from: usize, to: usize) -> TokenRange<'a> {
        let to: usize = to.min(self.size());
        let from: usize = from.min(to);

        TokenRange {
            buffer: self.buffer,
            start: self.start + from,
            end: self.start + to,
        }
    }

    pub fn starting_from(&self, pos: usize) -> TokenRange<'a> {
        self.between(pos, self.size())
    }

    pub fn ending_to(&self, pos: usize) -> TokenRange<'a> {
        self.between(0, pos)
    }

    /// Drop `n` tokens from both ends.
    pub fn shrink(&self, n: usize) -> TokenRange<'a> {
        self.between(n, self.size().saturating_sub(n))
    }

    /// First position whose token is `text` and which is not inside any
    /// `()`, `[]` or `{}` group of this range.
    pub fn find_bracketless(&self, text: &str) -> Option<usize> {
        self.find_bracketless_from(0, text)
    }

    pub fn has_bracketless(&self, text: &str) -> bool {
        self.find_bracketless(text).is_some()
    }

    fn find_bracketless_from(&self, from: usize, text: &str) -> Option<usize> {
        let mut depth: usize = 0;

        for pos in from..self.size() {
            let token: &str = self.text(pos);

            if depth == 0 && token == text {
                return Some(pos);
            }

            if is_opening(token) {
                depth += 1;
            } else if is_closing(token) {
                depth = depth.saturating_sub(1);
            }
        }

        None
    }

    /// Position of the bracket closing the one at `pos`.
    pub fn closing_bracket(&self, pos: usize) -> Result<usize> {
        let opening: &str = self.text(pos);
        let Some(closing) = matching_closer(opening) else {
            return Err(ScriptError::syntax(
                "TokenRange::closing_bracket",
                self.line_at(pos),
                format!("{} is not an opening bracket", self.describe(pos)),
            ));
        };

        let mut level: usize = 0;

        for i in pos..self.size() {
            let token: &str = self.text(i);

            if token == opening {
                level += 1;
            } else if token == closing {
                level -= 1;

                if level == 0 {
                    return Ok(i);
                }
            }
        }

        Err(ScriptError::missing_token(
            "TokenRange::closing_bracket",
            self.line_at(pos),
            format!("Could not find closing bracket for {}", self.describe(pos)),
        ))
    }

    /// Position of the bracket opening the one at `pos`.
    pub fn opening_bracket(&self, pos: usize) -> Result<usize> {
        let closing: &str = self.text(pos);
        let Some(opening) = matching_opener(closing) else {
            return Err(ScriptError::syntax(
                "TokenRange::opening_bracket",
                self.line_at(pos),
                format!("{} is not a closing bracket", self.describe(pos)),
            ));
        };

        let mut level: usize = 0;

        for i in (0..=pos).rev() {
            let token: &str = self.text(i);

            if token == closing {
                level += 1;
            } else if token == opening {
                level -= 1;

                if level == 0 {
                    return Ok(i);
                }
            }
        }

        Err(ScriptError::missing_token(
            "TokenRange::opening_bracket",
            self.line_at(pos),
            format!("Could not find opening bracket for {}", self.describe(pos)),
        ))
    }

    /// Split at every bracket‑free `separator`.
    ///
    /// An empty range yields nothing.  Otherwise every separator ends one
    /// segment and starts another, so `a,,b` gives an empty middle segment and
    /// a trailing separator gives an empty final segment.
    pub fn split_delimited<'s>(&self, separator: &'s str) -> Delimited<'a, 's> {
        Delimited {
            range: *self,
            separator,
            next: if self.is_empty() { None } else { Some(0) },
        }
    }

    /// Line of the token at `pos`; falls back to the nearest known token.
    pub fn line_at(&self, pos: usize) -> usize {
        if pos < self.size() {
            return self.token(pos).line();
        }

        if !self.is_empty() {
            return self.token(self.size() - 1).line();
        }

        let tokens: &[Token] = self.buffer.tokens();

        tokens
            .get(self.start)
            .or_else(|| self.start.checked_sub(1).and_then(|i| tokens.get(i)))
            .or_else(|| tokens.last())
            .map_or(0, Token::line)
    }

    pub fn line(&self) -> usize {
        self.line_at(0)
    }

    /// `KIND 'text' (on line N)` for the token at `pos`.
    pub fn describe(&self, pos: usize) -> String {
        if pos >= self.size() {
            return format!("end of statement (on line {})", self.line_at(pos));
        }

        let token: &Token = self.token(pos);

        format!(
            "{} '{}' (on line {})",
            token.token_type(),
            self.text(pos),
            token.line()
        )
    }

    /// Token texts joined by single spaces.
    pub fn as_text(&self) -> String {
        let mut text = String::new();

        for pos in 0..self.size() {
            if pos > 0 {
                text.push(' ');
            }

            text.push_str(self.text(pos));
        }

        text
    }
}

impl fmt::Display for TokenRange<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

/// Iterator returned by [`TokenRange::split_delimited`].
#[derive(Debug, Clone)]
pub struct Delimited<'a, 's> {
    range: TokenRange<'a>,
    separator: &'s str,
    next: Option<usize>,
}

impl<'a> Iterator for Delimited<'a, '_> {
    type Item = TokenRange<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let start: usize = self.next?;

        match self.range.find_bracketless_from(start, self.separator) {
            Some(pos) => {
                self.next = Some(pos + 1);

                Some(self.range.between(start, pos))
            }
            None => {
                self.next = None;

                Some(self.range.starting_from(start))
            }
        }
    }
}

//! Module `scanner` implements the statement lexer for Haw scripts.
//!
//! Unlike a token‑at‑a‑time lexer, [`Scanner::get_statement`] lexes exactly
//! **one statement** per call into a [`TokenBuffer`], which it clears first.
//! The parser works on one statement's tokens at a time, so the buffer's pools
//! are rewound and reused for every line.
//!
//! # Statement boundaries
//!
//! - A newline or `;` ends a statement, unless a `(`, `[` or `{` is still
//!   open, or the line ends in a `\` continuation.
//! - Blank lines and comment‑only lines produce no statement.
//! - `#` starts a comment that runs to the end of the line.
//!
//! # Token recognition
//!
//! - Keywords vs identifiers: `[A-Za-z_][A-Za-z0-9_]*`, resolved via a
//!   perfect‑hash `KEYWORDS` set.
//! - Numbers: `123`, `3.14`, `0xff`.
//! - Strings: `'…'`, `"…"`, and long `'''…'''` / `"""…"""` which may span
//!   lines.  The token text keeps its quotes.
//! - Operators: one‑ and two‑character operators, brackets and punctuation.
//!
//! Comment skipping uses `memchr` to jump straight to the next newline.

use crate::error::{Result, ScriptError};
use crate::token::TokenType;
use crate::token_buffer::TokenBuffer;

use log::{debug, info};
use memchr::memchr;
use phf::phf_set;

// ─────────────────────────────────────────────────────────────────────────────
// Static keyword set (compile‑time perfect hash)
// ─────────────────────────────────────────────────────────────────────────────

static KEYWORDS: phf::Set<&'static str> = phf_set! {
    "and",
    "break",
    "continue",
    "def",
    "elif",
    "else",
    "end",
    "for",
    "if",
    "in",
    "not",
    "or",
    "print",
    "return",
    "while",
    "True",
    "False",
    "None",
};

const TWO_CHAR_OPERATORS: [&str; 10] = ["==", "!=", "<=", ">=", "+=", "-=", "*=", "/=", "%=", ":="];

pub fn is_keyword(text: &str) -> bool {
    KEYWORDS.contains(text)
}

/// Statement lexer over an owned copy of the source text.
#[derive(Debug, Clone, Default)]
pub struct Scanner {
    src: String, // whole script
    pos: usize,  // byte offset of the next unread character
    line: usize, // 1‑based line counter (\n increments)
}

impl Scanner {
    /// Create a new lexer over `src`.
    pub fn new(src: &str) -> Self {
        info!("Scanner created over {} bytes", src.len());

        Self {
            src: src.to_owned(),
            pos: 0,
            line: 1,
        }
    }

    /// Create a lexer over raw file contents, which must be UTF‑8.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let src: String = String::from_utf8(bytes)?;

        Ok(Self::new(&src))
    }

    /// Current 1‑based line.
    pub fn line(&self) -> usize {
        self.line
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    // ───────────────────────────── primitive helpers ────────────────────────

    #[inline]
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    /// Character `n` places after [`peek`](Self::peek).
    #[inline]
    fn peek_at(&self, n: usize) -> Option<char> {
        self.src[self.pos..].chars().nth(n)
    }

    #[inline]
    fn advance(&mut self) -> Option<char> {
        let c: char = self.peek()?;

        self.pos += c.len_utf8();

        if c == '\n' {
            self.line += 1;
        }

        Some(c)
    }

    /// Consume one character into the forming token.
    #[inline]
    fn take(&mut self, tokens: &mut TokenBuffer) -> Option<char> {
        let c: char = self.advance()?;

        tokens.append_char(c);

        Some(c)
    }

    fn skip_comment(&mut self) {
        match memchr(b'\n', &self.src.as_bytes()[self.pos..]) {
            Some(offset) => self.pos += offset,
            None => self.pos = self.src.len(),
        }
    }

    // ───────────────────────────── core lexing ─────────────────────────────

    /// Lex the next statement into `tokens`, returning its token count.
    ///
    /// Returns `0` once the input is exhausted.
    pub fn get_statement(&mut self, tokens: &mut TokenBuffer) -> Result<usize> {
        tokens.clear();

        let mut brackets: Vec<(char, usize)> = Vec::new();

        while let Some(c) = self.peek() {
            match c {
                ' ' | '\t' | '\r' => {
                    self.advance();
                }

                '#' => self.skip_comment(),

                '\n' | ';' => {
                    self.advance();

                    if brackets.is_empty() && !tokens.is_empty() {
                        break;
                    }
                }

                '\\' => {
                    self.advance();

                    if self.peek() == Some('\r') {
                        self.advance();
                    }

                    if self.advance() != Some('\n') {
                        return Err(ScriptError::lex(
                            "Scanner::get_statement",
                            self.line,
                            "Expected a line break after '\\'",
                        ));
                    }
                }

                '"' | '\'' => self.parse_string(tokens, c)?,

                '0'..='9' => self.parse_number(tokens),

                c if c.is_alphabetic() || c == '_' => self.parse_identifier(tokens),

                _ => self.parse_operator(tokens, c, &mut brackets)?,
            }
        }

        if let Some((open, line)) = brackets.last() {
            return Err(ScriptError::lex(
                "Scanner::get_statement",
                *line,
                format!("Unclosed '{}' at end of input", open),
            ));
        }

        debug!(
            "Lexed statement of {} token(s) ending on line {}",
            tokens.len(),
            self.line
        );

        Ok(tokens.len())
    }

    /// Quoted string literal; the opening quote is at `self.pos`.
    fn parse_string(&mut self, tokens: &mut TokenBuffer, quote: char) -> Result<()> {
        let start_line: usize = self.line;
        let long: bool = self.peek_at(1) == Some(quote) && self.peek_at(2) == Some(quote);

        tokens.new_token(start_line);

        if long {
            for _ in 0..3 {
                self.take(tokens);
            }
        } else {
            self.take(tokens);
        }

        loop {
            let Some(c) = self.peek() else {
                return Err(ScriptError::lex(
                    "Scanner::parse_string",
                    start_line,
                    "Unterminated string",
                ));
            };

            if c == '\n' && !long {
                return Err(ScriptError::lex(
                    "Scanner::parse_string",
                    start_line,
                    "Unterminated string",
                ));
            }

            // Escapes are resolved later; only make sure `\"` does not end
            // the literal.
            if c == '\\' {
                self.take(tokens);
                self.take(tokens);
                continue;
            }

            if c == quote {
                if !long {
                    self.take(tokens);
                    break;
                }

                if self.peek_at(1) == Some(quote) && self.peek_at(2) == Some(quote) {
                    for _ in 0..3 {
                        self.take(tokens);
                    }
                    break;
                }
            }

            self.take(tokens);
        }

        tokens.set_type(match (long, quote) {
            (true, _) => TokenType::LITERAL_STRING_LONG,
            (false, '"') => TokenType::LITERAL_STRING_QUOTED,
            (false, _) => TokenType::LITERAL_STRING_APOSTROPHE,
        });
        tokens.end_token();

        Ok(())
    }

    /// `123`, `3.14` or `0x1f`.
    fn parse_number(&mut self, tokens: &mut TokenBuffer) {
        tokens.new_token(self.line);

        let hex: bool =
            self.peek() == Some('0') && matches!(self.peek_at(1), Some('x') | Some('X'));

        if hex {
            self.take(tokens);
            self.take(tokens);

            while self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                self.take(tokens);
            }
        } else {
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.take(tokens);
            }

            // Optional fractional part.
            if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
                self.take(tokens);

                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.take(tokens);
                }
            }
        }

        tokens.set_type(TokenType::LITERAL_NUMBER);
        tokens.end_token();
    }

    /// Identifier or keyword.
    fn parse_identifier(&mut self, tokens: &mut TokenBuffer) {
        tokens.new_token(self.line);

        while self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            self.take(tokens);
        }

        let keyword: bool = tokens
            .forming()
            .is_some_and(|token| is_keyword(tokens.str(token)));

        tokens.set_type(if keyword {
            TokenType::KEYWORD
        } else {
            TokenType::IDENTIFIER
        });
        tokens.end_token();
    }

    fn parse_operator(
        &mut self,
        tokens: &mut TokenBuffer,
        c: char,
        brackets: &mut Vec<(char, usize)>,
    ) -> Result<()> {
        let rest: &str = &self.src[self.pos..];
        let two_char: bool = TWO_CHAR_OPERATORS.iter().any(|op| rest.starts_with(op));

        if !two_char {
            match c {
                '(' | '[' | '{' => brackets.push((c, self.line)),
                ')' | ']' | '}' => {
                    let expected: char = match c {
                        ')' => '(',
                        ']' => '[',
                        _ => '{',
                    };

                    if brackets.pop().map(|(open, _)| open) != Some(expected) {
                        return Err(ScriptError::lex(
                            "Scanner::parse_operator",
                            self.line,
                            format!("Unbalanced '{}'", c),
                        ));
                    }
                }
                '+' | '-' | '*' | '/' | '%' | '=' | '<' | '>' | '.' | ',' | ':' => {}
                _ => {
                    return Err(ScriptError::lex(
                        "Scanner::parse_operator",
                        self.line,
                        format!("Unexpected character: {}", c),
                    ));
                }
            }
        }

        tokens.new_token(self.line);
        self.take(tokens);

        if two_char {
            self.take(tokens);
        }

        tokens.set_type(TokenType::OPERATOR);
        tokens.end_token();

        Ok(())
    }
}

use log::{debug, trace};
use std::fmt;

/// The lexical classes a [`Token`] can belong to.
///
/// Brackets and punctuation are all `OPERATOR`s; the parser tells them apart
/// by their text.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TokenType {
    /// Not yet classified (a freshly formed token).
    #[default]
    UNKNOWN,

    /// A reserved word: `if`, `while`, `True`, `not`, …
    KEYWORD,

    /// Operators, brackets and punctuation.
    OPERATOR,

    /// `'text'`
    LITERAL_STRING_APOSTROPHE,

    /// `"text"`
    LITERAL_STRING_QUOTED,

    /// `'''text'''` or `"""text"""`, may span several lines.
    LITERAL_STRING_LONG,

    /// Decimal, fractional or `0x` hexadecimal number.
    LITERAL_NUMBER,

    /// A user‑defined identifier.
    IDENTIFIER,
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name: &'static str = match self {
            TokenType::UNKNOWN => "UNKNOWN",
            TokenType::KEYWORD => "KEYWORD",
            TokenType::OPERATOR => "OPERATOR",
            TokenType::LITERAL_STRING_APOSTROPHE => "LITERAL_STRING_APOSTROPHE",
            TokenType::LITERAL_STRING_QUOTED => "LITERAL_STRING_QUOTED",
            TokenType::LITERAL_STRING_LONG => "LITERAL_STRING_LONG",
            TokenType::LITERAL_NUMBER => "LITERAL_NUMBER",
            TokenType::IDENTIFIER => "IDENTIFIER",
        };

        f.write_str(name)
    }
}

/// A classified, positioned span of source text.
///
/// The characters live in one of the owning
/// [`TokenBuffer`](crate::token_buffer::TokenBuffer)'s pools; a token only
/// records which pool and the byte range inside it.  Use
/// [`TokenBuffer::str`](crate::token_buffer::TokenBuffer::str) to read the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pool: usize,
    begin: usize,
    end: usize,
    token_type: TokenType,
    line: usize,
}

impl Token {
    /// An empty ("forming") token starting at `begin` inside `pool`.
    pub(crate) fn new(pool: usize, begin: usize, line: usize) -> Self {
        trace!("Creating token: pool={}, begin={}, line={}", pool, begin, line);

        Self {
            pool,
            begin,
            end: begin,
            token_type: TokenType::UNKNOWN,
            line,
        }
    }

    pub fn pool(&self) -> usize {
        self.pool
    }

    pub fn begin(&self) -> usize {
        self.begin
    }

    pub fn end(&self) -> usize {
        self.end
    }

    /// Length of the token text in bytes.
    pub fn len(&self) -> usize {
        self.end - self.begin
    }

    pub fn is_empty(&self) -> bool {
        self.begin == self.end
    }

    pub fn token_type(&self) -> TokenType {
        self.token_type
    }

    /// 1‑based source line.
    pub fn line(&self) -> usize {
        self.line
    }

    pub(crate) fn set_type(&mut self, token_type: TokenType) {
        self.token_type = token_type;
    }

    pub(crate) fn grow(&mut self, bytes: usize) {
        self.end += bytes;
    }

    /// Rebind the span, keeping type and line.
    pub(crate) fn relocate(&mut self, pool: usize, begin: usize) {
        let len: usize = self.len();

        self.pool = pool;
        self.begin = begin;
        self.end = begin + len;
    }

    /// Discard the text, keeping the start address.
    pub(crate) fn reset(&mut self, line: usize) {
        self.end = self.begin;
        self.token_type = TokenType::UNKNOWN;
        self.line = line;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Literal materialisation
// ─────────────────────────────────────────────────────────────────────────────

/// Strip the quotes from a string literal token and resolve its escapes.
///
/// Recognised escapes: `\\ \' \" \a \b \f \n \r \t \v` and `\xNN`.  Anything
/// else (including `\x` not followed by two hex digits) is kept literally as
/// backslash + character.
pub fn unescape_string_literal(token_type: TokenType, text: &str) -> String {
    let quote_len: usize = if token_type == TokenType::LITERAL_STRING_LONG {
        3
    } else {
        1
    };

    let body: &str = if text.len() >= 2 * quote_len {
        &text[quote_len..text.len() - quote_len]
    } else {
        ""
    };

    let unescaped: String = unescape(body);

    debug!("Unescaped {} literal of {} bytes", token_type, unescaped.len());

    unescaped
}

/// Resolve the escape sequences of a string literal body.
pub fn unescape(body: &str) -> String {
    let mut result = String::with_capacity(body.len());
    let mut chars = body.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }

        let Some(esc) = chars.next() else {
            result.push('\\');
            break;
        };

        let resolved: Option<char> = match esc {
            '\\' => Some('\\'),
            '\'' => Some('\''),
            '"' => Some('"'),
            'a' => Some('\u{07}'),
            'b' => Some('\u{08}'),
            'f' => Some('\u{0c}'),
            'n' => Some('\n'),
            'r' => Some('\r'),
            't' => Some('\t'),
            'v' => Some('\u{0b}'),
            'x' => {
                let rest: &str = chars.as_str();
                let code: Option<char> = rest
                    .get(..2)
                    .filter(|digits| digits.chars().all(|d| d.is_ascii_hexdigit()))
                    .and_then(|digits| u32::from_str_radix(digits, 16).ok())
                    .and_then(char::from_u32);

                if code.is_some() {
                    chars.nth(1);
                }

                code
            }
            _ => None,
        };

        match resolved {
            Some(r) => result.push(r),
            None => {
                result.push('\\');
                result.push(esc);
            }
        }
    }

    result
}

/// Convert the text of a `LITERAL_NUMBER` token.
///
/// `0x`/`0X` literals are always base-16 integers; otherwise a literal with a
/// `.` is a float and everything else a base-10 integer.  Returns `None` when
/// the text is not a number at all.
pub fn parse_number(text: &str) -> Option<f64> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        let digits: usize = hex
            .bytes()
            .take_while(|b| b.is_ascii_hexdigit())
            .count();

        if digits == 0 {
            return None;
        }

        return i64::from_str_radix(&hex[..digits], 16)
            .ok()
            .map(|n| n as f64);
    }

    if text.contains('.') {
        return text.parse::<f64>().ok();
    }

    match text.parse::<i64>() {
        Ok(n) => Some(n as f64),
        // Too long for i64; still a valid decimal integer.
        Err(_) if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) => {
            text.parse::<f64>().ok()
        }
        Err(_) => None,
    }
}

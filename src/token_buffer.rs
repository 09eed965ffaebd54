//! Module `token_buffer` stores lexed tokens and the characters they refer to.
//!
//! Characters are kept in a list of fixed‑capacity **pools**.  Each token is a
//! `(pool, begin, end)` span into one of them, so finalised tokens never own
//! or move their text.  Tokens are built one character at a time by the
//! scanner:
//!
//! ```text
//! new_token(line) → append_char(c)* → set_type(t) → end_token()
//! ```
//!
//! # Pools
//!
//! | Field   | Meaning                                                   |
//! |---------|-----------------------------------------------------------|
//! | `size`  | capacity in bytes of UTF‑8 text                           |
//! | `rover` | high‑water mark; bytes below it belong to finalised tokens |
//!
//! A forming token always starts at its pool's rover.  When it outgrows the
//! pool its text is copied into the next pool with enough room (the only case
//! in which token text moves).  [`TokenBuffer::clear`] rewinds every rover to
//! zero but keeps the allocations, so repeated parses reuse the same memory.

use crate::error::{Result, ScriptError};
use crate::token::{Token, TokenType};

use log::{debug, trace};

/// Default capacity of one allocation pool, in bytes.
pub const POOL_SIZE: usize = 1024;

/// Room past `size` so that the final multi‑byte character of an overflowing
/// token never forces the backing `String` to reallocate.
const MAX_CHAR_BYTES: usize = 4;

#[derive(Debug)]
struct Pool {
    chars: String,
    size: usize,
    rover: usize,
}

impl Pool {
    fn with_size(size: usize) -> Self {
        Self {
            chars: String::with_capacity(size + MAX_CHAR_BYTES),
            size,
            rover: 0,
        }
    }

    fn free(&self) -> usize {
        self.size - self.rover
    }

    /// Grow an empty pool in place.
    fn resize(&mut self, size: usize) {
        self.chars.clear();
        self.chars.reserve_exact(size + MAX_CHAR_BYTES);
        self.size = size;
    }
}

fn pool_size_for(minimum: usize) -> usize {
    (POOL_SIZE + minimum).max(2 * minimum)
}

/// Owner of all token text and of the ordered token sequence.
#[derive(Debug, Default)]
pub struct TokenBuffer {
    pools: Vec<Pool>,
    tokens: Vec<Token>,
    forming: Option<usize>,
    form_pool: usize,
}

impl TokenBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget all tokens.  Pool memory is retained for reuse.
    pub fn clear(&mut self) {
        self.tokens.clear();

        for pool in &mut self.pools {
            pool.rover = 0;
            pool.chars.clear();
        }

        self.forming = None;
        self.form_pool = 0;
    }

    /// Begin forming a new token on `line`.
    ///
    /// If a token is already forming, its text is discarded and it restarts
    /// at the same address instead of being appended.
    pub fn new_token(&mut self, line: usize) {
        if let Some(index) = self.forming {
            let token: &mut Token = &mut self.tokens[index];

            trace!("Restarting forming token #{} on line {}", index, line);

            self.pools[token.pool()].chars.truncate(token.begin());
            token.reset(line);

            return;
        }

        let pool: usize = self.advance_to_pool_with_space(0);
        let begin: usize = self.pools[pool].rover;

        self.tokens.push(Token::new(pool, begin, line));
        self.forming = Some(self.tokens.len() - 1);
    }

    /// Append one character to the forming token.
    pub fn append_char(&mut self, c: char) {
        let Some(index) = self.forming else {
            debug_assert!(false, "append_char() without a forming token");
            return;
        };

        let token: &mut Token = &mut self.tokens[index];
        let pool: &mut Pool = &mut self.pools[token.pool()];

        pool.chars.push(c);
        token.grow(c.len_utf8());

        if token.end() < pool.size {
            return;
        }

        // The pool is full: move the token to a pool with room for it.
        let text: String = pool.chars[token.begin()..token.end()].to_owned();
        pool.chars.truncate(token.begin());

        let target: usize = self.advance_to_pool_with_space(text.len());
        let target_pool: &mut Pool = &mut self.pools[target];
        let begin: usize = target_pool.rover;

        target_pool.chars.push_str(&text);
        self.tokens[index].relocate(target, begin);

        debug!(
            "Relocated forming token ({} bytes) to pool {} at {}",
            text.len(),
            target,
            begin
        );
    }

    /// Tag the forming token.
    pub fn set_type(&mut self, token_type: TokenType) {
        match self.forming {
            Some(index) => self.tokens[index].set_type(token_type),
            None => debug_assert!(false, "set_type() without a forming token"),
        }
    }

    /// Finalise the forming token.  No‑op when nothing is forming.
    pub fn end_token(&mut self) {
        if let Some(index) = self.forming.take() {
            let token: Token = self.tokens[index];

            self.pools[token.pool()].rover += token.len();

            trace!("Finalised token #{}: '{}'", index, self.str(&token));
        }
    }

    /// Number of finalised tokens.
    pub fn len(&self) -> usize {
        self.tokens.len() - usize::from(self.forming.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_forming(&self) -> bool {
        self.forming.is_some()
    }

    /// The token currently being formed, if any.
    pub fn forming(&self) -> Option<&Token> {
        self.forming.map(|index| &self.tokens[index])
    }

    pub fn pool_count(&self) -> usize {
        self.pools.len()
    }

    /// The `i`‑th finalised token.
    pub fn at(&self, i: usize) -> Result<&Token> {
        if i >= self.len() {
            return Err(ScriptError::out_of_range("TokenBuffer::at", i, self.len()));
        }

        Ok(&self.tokens[i])
    }

    /// The most recently finalised token.
    pub fn latest(&self) -> Option<&Token> {
        self.tokens[..self.len()].last()
    }

    /// All finalised tokens, in order.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens[..self.len()]
    }

    /// Text of a token owned by this buffer.
    pub fn str(&self, token: &Token) -> &str {
        self.pools
            .get(token.pool())
            .and_then(|pool| pool.chars.get(token.begin()..token.end()))
            .unwrap_or("")
    }

    /// Find a pool, starting from the current one, with more than `minimum`
    /// free bytes.  An empty pool that is too small is enlarged in place;
    /// otherwise a new pool is appended.
    fn advance_to_pool_with_space(&mut self, minimum: usize) -> usize {
        loop {
            if self.form_pool == self.pools.len() {
                let size: usize = pool_size_for(minimum);

                debug!("Allocating pool {} of {} bytes", self.form_pool, size);

                self.pools.push(Pool::with_size(size));

                return self.form_pool;
            }

            let pool: &mut Pool = &mut self.pools[self.form_pool];

            if pool.free() > minimum {
                return self.form_pool;
            }

            if pool.rover == 0 {
                let size: usize = pool_size_for(minimum);

                debug!(
                    "Resizing empty pool {} from {} to {} bytes",
                    self.form_pool, pool.size, size
                );

                pool.resize(size);

                return self.form_pool;
            }

            self.form_pool += 1;
        }
    }
}

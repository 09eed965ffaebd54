//! Centralised error hierarchy for the **Haw script** front end.
//!
//! The scanner, the token buffer and the parser all report failures through
//! [`ScriptError`].  Source-level variants carry the name of the operation
//! that raised them (`context`), a human-readable message that names the
//! offending token, and the 1-based source line.
//!
//! None of these errors is recoverable for the current parse attempt: the
//! parser never catches them, it only lets them propagate out of
//! [`Parser::parse`](crate::parser::Parser::parse).
//!
//! The module **does not** print diagnostics itself.

use std::io;
use thiserror::Error;

use log::info;

/// Canonical error type used throughout the crate.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ScriptError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] {context}: {message}")]
    Lex {
        context: &'static str,
        message: String,
        line: usize,
    },

    /// An expected token (`in`, `:`, a matching bracket, `end`, …) is absent.
    #[error("[line {line}] {context}: {message}")]
    MissingToken {
        /// Operation that raised the error.
        context: &'static str,

        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,
    },

    /// Extra or trailing tokens where none are allowed.
    #[error("[line {line}] {context}: {message}")]
    UnexpectedToken {
        context: &'static str,
        message: String,
        line: usize,
    },

    /// Structurally malformed construct.
    #[error("[line {line}] {context}: {message}")]
    Syntax {
        context: &'static str,
        message: String,
        line: usize,
    },

    /// `TokenBuffer::at` called with an invalid index.  A programming error,
    /// not a source-syntax error, so there is no line.
    #[error("{context}: index {index} is out of range (size {size})")]
    OutOfRange {
        context: &'static str,
        index: usize,
        size: usize,
    },

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// UTF‑8 decoding failure when ingesting external text.
    #[error(transparent)]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl ScriptError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(context: &'static str, line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: {} line={}, msg={}", context, line, message);

        ScriptError::Lex {
            context,
            message,
            line,
        }
    }

    pub fn missing_token<S: Into<String>>(context: &'static str, line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!(
            "Creating MissingToken error: {} line={}, msg={}",
            context, line, message
        );

        ScriptError::MissingToken {
            context,
            message,
            line,
        }
    }

    pub fn unexpected_token<S: Into<String>>(context: &'static str, line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!(
            "Creating UnexpectedToken error: {} line={}, msg={}",
            context, line, message
        );

        ScriptError::UnexpectedToken {
            context,
            message,
            line,
        }
    }

    pub fn syntax<S: Into<String>>(context: &'static str, line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Syntax error: {} line={}, msg={}", context, line, message);

        ScriptError::Syntax {
            context,
            message,
            line,
        }
    }

    pub fn out_of_range(context: &'static str, index: usize, size: usize) -> Self {
        info!(
            "Creating OutOfRange error: {} index={}, size={}",
            context, index, size
        );

        ScriptError::OutOfRange {
            context,
            index,
            size,
        }
    }

    /// Source line of the error, when it has one.
    pub fn line(&self) -> Option<usize> {
        match self {
            ScriptError::Lex { line, .. }
            | ScriptError::MissingToken { line, .. }
            | ScriptError::UnexpectedToken { line, .. }
            | ScriptError::Syntax { line, .. } => Some(*line),
            _ => None,
        }
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, ScriptError>;

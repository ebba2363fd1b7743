//! Error types produced by the three pipeline stages.
//!
//! Mirrors the three failure categories called out in the language design:
//! lexing, parsing, and evaluation. All three are fatal - there is no
//! per-statement recovery - so a single [`InterpError`] is threaded with `?`
//! all the way out to the caller instead of being split into per-stage
//! `Result` types that would need converting into one another at every call
//! site.

use thiserror::Error;

/// A single failure from any pipeline stage.
///
/// Only a line number (lexing) or token index (parsing) is ever known - the
/// language does not track full source spans - so that is all these
/// variants carry.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InterpError {
    #[error("unknown symbol '{symbol}' at line {line}")]
    UnknownSymbol { symbol: char, line: usize },

    #[error("unterminated string literal starting at line {line}")]
    UnterminatedString { line: usize },

    #[error("unexpected token at position {token_index}: expected {expected}")]
    UnexpectedToken {
        token_index: usize,
        expected: &'static str,
    },

    #[error("{0}")]
    Runtime(String),
}

impl InterpError {
    pub fn runtime(message: impl Into<String>) -> Self {
        Self::Runtime(message.into())
    }
}

pub type Result<T> = std::result::Result<T, InterpError>;

//! One variant per failure condition, named after the condition rather
//! than the layer that detected it, built with `thiserror` for concise
//! `Display` impls.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub message: String,
    pub offset: usize,
    pub snippet: String,
}

impl std::fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} at byte {} (near `{}`)",
            self.message, self.offset, self.snippet
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreewidthError {
    pub message: String,
}

impl std::fmt::Display for TreewidthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("syntax error: {0}")]
    Syntax(SyntaxError),

    #[error("unbound variable `{0}`")]
    UnboundVariable(String),

    #[error("arity mismatch: {reason}")]
    ArityMismatch { reason: String },

    #[error("alphabet mismatch: {reason}")]
    AlphabetMismatch { reason: String },

    #[error("resource exceeded: {limit} limit is {limit_value}, requested {requested}")]
    ResourceExceeded {
        limit: &'static str,
        limit_value: usize,
        requested: usize,
    },

    #[error("card_eq is not MSO-definable and is not supported")]
    CardinalityNotSupported,

    #[error("treewidth error: {0}")]
    Treewidth(TreewidthError),
}

pub type Result<T> = std::result::Result<T, Error>;

//! Error types for document parsing and table writing

use thiserror::Error;

/// Failure to build an element tree from XML input
#[derive(Debug, Error)]
pub enum ParseError {
    /// The underlying XML reader rejected the input
    #[error("malformed XML at byte {position}: {message}")]
    Malformed { position: u64, message: String },

    #[error("document has no root element")]
    NoRoot,

    /// A second top-level element appeared after the root was closed
    #[error("unexpected element <{tag}> after the root element at byte {position}")]
    MultipleRoots { tag: String, position: u64 },

    #[error("text outside the root element at byte {position}")]
    TextOutsideRoot { position: u64 },

    #[error("element <{tag}> is never closed")]
    Unclosed { tag: String },

    #[error("undefined entity &{name}; at byte {position}")]
    UndefinedEntity { name: String, position: u64 },

    /// A numeric reference to a character XML does not allow
    #[error("invalid character reference at byte {position}: {message}")]
    InvalidCharRef { position: u64, message: String },

    #[error("input is not valid UTF-8 (first invalid byte at {position})")]
    NotUtf8 { position: u64 },
}

/// Failure to serialize a flattened table
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("invalid delimiter {delimiter:?}: {reason}")]
    InvalidDelimiter {
        delimiter: String,
        reason: &'static str,
    },

    /// A row carries a key the header does not list
    #[error("row {row} has column `{column}` which is missing from the header")]
    UnknownColumn { row: usize, column: String },

    #[error("failed to serialize row {row}")]
    Serialize {
        row: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

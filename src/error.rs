//! Error taxonomy for the I/O and parsing boundary (C9, `spec.md` §7).
//!
//! Precondition violations (bad coordinates, illegal dimensions, reading a
//! barrier's contents, and the like) stay as panics throughout the rest of the
//! crate (the source treats them as programmer bugs, not recoverable values, and
//! this crate preserves that policy). `EngineError` exists only for genuinely
//! recoverable I/O and parse failures at the dictionary/puzzle boundary.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("malformed dictionary line {line}: {text:?}")]
    DictionaryParse { line: usize, text: String },

    #[error("malformed puzzle file: {reason}")]
    PuzzleParse { reason: String },

    #[error("invalid grid dimensions: {height}x{width}")]
    InvalidDimensions { height: usize, width: usize },
}

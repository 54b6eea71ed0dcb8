//! Error types for PLY parsing.

use thiserror::Error;

/// Errors that can occur while parsing a PLY file.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The header is malformed: bad magic line, unknown format literal,
    /// unknown scalar type name, or a garbled element/property line.
    #[error("invalid PLY header: {0}")]
    InvalidHeader(String),

    /// A binary payload ended before the declared rows were read.
    #[error("truncated PLY payload: needed {needed} more bytes, {available} remaining")]
    Truncated {
        /// Bytes required to finish the current field.
        needed: usize,
        /// Bytes actually left in the buffer.
        available: usize,
    },

    /// An ASCII payload token failed to parse as a number, or a row ran
    /// out of tokens before its declared properties were filled.
    #[error("unexpected token in ASCII payload: {0:?}")]
    UnexpectedToken(String),
}

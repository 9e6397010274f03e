//! Error types for chunkdelta operations.

use std::io;
use thiserror::Error;

/// Result type for chunkdelta operations.
pub type Result<T> = std::result::Result<T, DeltaError>;

/// Errors that can occur while chunking streams or matching chunk sequences.
#[derive(Debug, Error)]
pub enum DeltaError {
    /// Reading one of the input streams failed.
    #[error("Read failed: {0}")]
    Read(#[from] io::Error),

    /// The configured chunk size is not a positive integer.
    #[error("Invalid chunk size: {0} (must be at least 1 byte)")]
    InvalidChunkSize(usize),

    /// The two sequences were chunked with different sizes.
    #[error("Chunk size mismatch: original chunked at {original} bytes, updated at {updated} bytes")]
    ChunkSizeMismatch {
        /// Chunk size of the original sequence
        original: usize,
        /// Chunk size of the updated sequence
        updated: usize,
    },
}

impl DeltaError {
    /// Returns true if this error came from the underlying stream.
    pub fn is_read(&self) -> bool {
        matches!(self, DeltaError::Read(_))
    }
}

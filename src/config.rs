//! Chunking and matching configuration.

use crate::error::{DeltaError, Result};
use crate::matcher::MatchMode;
use std::fmt;
use std::num::NonZeroUsize;

/// Chunk size used when none is configured.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Maximum number of bytes per chunk. Always at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkSize(NonZeroUsize);

impl ChunkSize {
    /// Validates `size` as a chunk size.
    ///
    /// # Errors
    ///
    /// Returns [`DeltaError::InvalidChunkSize`] when `size` is zero.
    pub fn new(size: usize) -> Result<Self> {
        NonZeroUsize::new(size)
            .map(Self)
            .ok_or(DeltaError::InvalidChunkSize(size))
    }

    /// Returns the size in bytes.
    #[inline]
    pub fn get(self) -> usize {
        self.0.get()
    }
}

impl Default for ChunkSize {
    fn default() -> Self {
        const DEFAULT: NonZeroUsize = NonZeroUsize::new(DEFAULT_CHUNK_SIZE).unwrap();
        Self(DEFAULT)
    }
}

impl TryFrom<usize> for ChunkSize {
    type Error = DeltaError;

    fn try_from(size: usize) -> Result<Self> {
        Self::new(size)
    }
}

impl From<NonZeroUsize> for ChunkSize {
    fn from(size: NonZeroUsize) -> Self {
        Self(size)
    }
}

impl fmt::Display for ChunkSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Options for a single delta computation.
///
/// ```
/// use chunkdelta::{DeltaOptions, MatchMode};
///
/// let options = DeltaOptions::new(4096)
///     .unwrap()
///     .with_mode(MatchMode::Indexed);
/// assert_eq!(options.chunk_size().get(), 4096);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeltaOptions {
    chunk_size: ChunkSize,
    mode: MatchMode,
}

impl DeltaOptions {
    /// Creates options with the given chunk size and positional matching.
    ///
    /// # Errors
    ///
    /// Returns [`DeltaError::InvalidChunkSize`] when `chunk_size` is zero.
    pub fn new(chunk_size: usize) -> Result<Self> {
        Ok(Self {
            chunk_size: ChunkSize::new(chunk_size)?,
            mode: MatchMode::default(),
        })
    }

    /// Sets the chunk size.
    pub fn with_chunk_size(mut self, chunk_size: ChunkSize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Sets the match mode.
    pub fn with_mode(mut self, mode: MatchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Returns the configured chunk size.
    #[inline]
    pub fn chunk_size(&self) -> ChunkSize {
        self.chunk_size
    }

    /// Returns the configured match mode.
    #[inline]
    pub fn mode(&self) -> MatchMode {
        self.mode
    }
}

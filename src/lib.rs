//! # chunkdelta
//!
//! Fixed-size chunk fingerprinting and positional delta extraction.
//!
//! `chunkdelta` splits an original and an updated byte stream into fixed-size
//! chunks, fingerprints every chunk with SHA-256, and returns the bytes of the
//! updated stream that could not be lined up with the original.
//!
//! ## Quick Start
//!
//! ```
//! use chunkdelta::compute_delta;
//!
//! let original = b"aaaabbbbcccc";
//! let updated = b"aaaabbbbccccdddd";
//!
//! let delta = compute_delta(&original[..], &updated[..], 4).unwrap();
//! assert_eq!(delta, b"dddd");
//! ```
//!
//! ## Algorithm Details
//!
//! The computation works by:
//! 1. Cutting both streams every `chunk_size` bytes (the last chunk may be shorter)
//! 2. Computing a SHA-256 digest for each chunk
//! 3. Walking both chunk lists with one cursor each, skipping chunks whose
//!    digests agree and copying the rest of the updated chunks into the delta
//!
//! The delta is a flat byte payload. It carries no offsets, so it cannot be
//! applied back onto the original on its own.
//!
//! ## Limitations
//!
//! Boundaries are fixed byte offsets. A single byte inserted near the start of
//! the updated stream shifts every later boundary, and every later chunk then
//! ends up in the delta. [`MatchMode::Indexed`] recovers chunk-aligned moves
//! but cannot help with shifted boundaries.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

mod chunk;
mod chunker;
mod config;
mod digest;
mod error;
mod matcher;

pub use chunk::{Chunk, ChunkSequence};
pub use chunker::{ChunkSource, FixedChunker, FixedChunks};
pub use config::{ChunkSize, DEFAULT_CHUNK_SIZE, DeltaOptions};
pub use digest::{DIGEST_SIZE, Digest};
pub use error::{DeltaError, Result};
pub use matcher::{DeltaMatcher, MatchMode, MatchOutcome, MatchStats};

use std::io::Read;

/// Computes the delta between an original and an updated stream.
///
/// Both streams are read to the end and cut into chunks of `chunk_size`
/// bytes. The returned bytes are the updated chunks that did not line up with
/// the original, concatenated in stream order.
///
/// # Arguments
///
/// * `original` - The reference version
/// * `updated` - The version to describe
/// * `chunk_size` - Maximum bytes per chunk, applied to both streams
///
/// # Errors
///
/// Returns [`DeltaError::InvalidChunkSize`] for a chunk size of zero and
/// [`DeltaError::Read`] if either stream fails. No partial delta is returned.
///
/// # Examples
///
/// ```
/// use chunkdelta::compute_delta;
///
/// let original = b"Hello, world!";
/// let updated = b"Hello, world! How are you?";
///
/// // One chunk on each side, and the digests differ
/// let delta = compute_delta(&original[..], &updated[..], 1024).unwrap();
/// assert_eq!(delta, updated);
/// ```
pub fn compute_delta<O: Read, U: Read>(
    original: O,
    updated: U,
    chunk_size: usize,
) -> Result<Vec<u8>> {
    let options = DeltaOptions::new(chunk_size)?;
    run(original, updated, &options).map(|outcome| outcome.delta)
}

/// Computes the delta with explicit options and returns match statistics.
///
/// # Errors
///
/// Returns [`DeltaError::Read`] if either stream fails.
///
/// # Examples
///
/// ```
/// use chunkdelta::{compute_delta_with, DeltaOptions, MatchMode};
///
/// let options = DeltaOptions::new(4).unwrap().with_mode(MatchMode::Indexed);
/// let outcome = compute_delta_with(&b"aaaabbbb"[..], &b"bbbb"[..], &options).unwrap();
///
/// assert!(outcome.delta.is_empty());
/// assert_eq!(outcome.stats.matched_chunks, 1);
/// ```
pub fn compute_delta_with<O: Read, U: Read>(
    original: O,
    updated: U,
    options: &DeltaOptions,
) -> Result<MatchOutcome> {
    run(original, updated, options)
}

/// Like [`compute_delta_with`], but chunks both streams concurrently on the
/// rayon pool.
///
/// The outcome is identical to the sequential call.
///
/// # Errors
///
/// Returns [`DeltaError::Read`] if either stream fails.
///
/// # Examples
///
/// ```
/// use chunkdelta::{compute_delta_par, DeltaOptions};
///
/// let options = DeltaOptions::new(4).unwrap();
/// let outcome = compute_delta_par(&b"aaaabbbb"[..], &b"aaaabbbbcccc"[..], &options).unwrap();
///
/// assert_eq!(outcome.delta, b"cccc");
/// ```
#[cfg(feature = "parallel")]
pub fn compute_delta_par<O: Read + Send, U: Read + Send>(
    original: O,
    updated: U,
    options: &DeltaOptions,
) -> Result<MatchOutcome> {
    let chunker = FixedChunker::new(options.chunk_size());
    let (original, updated) = rayon::join(
        || chunker.sequence(original),
        || chunker.sequence(updated),
    );
    DeltaMatcher::new(options.mode()).run(&original?, &updated?)
}

fn run<O: Read, U: Read>(original: O, updated: U, options: &DeltaOptions) -> Result<MatchOutcome> {
    let chunker = FixedChunker::new(options.chunk_size());
    let original = chunker.sequence(original)?;
    let updated = chunker.sequence(updated)?;
    DeltaMatcher::new(options.mode()).run(&original, &updated)
}

//! Aligning two chunk sequences and extracting the unmatched bytes.
//!
//! The default [`MatchMode::Positional`] walk keeps one cursor per sequence.
//! When the chunks under both cursors carry the same digest they are treated as
//! reused and both cursors advance; otherwise the updated chunk is copied into
//! the delta and only the updated cursor advances. It never searches ahead, so
//! content that moved, or whose boundaries shifted by a non-multiple of the
//! chunk size, lands in the delta in full.

use crate::chunk::{Chunk, ChunkSequence};
use crate::digest::Digest;
use crate::error::{DeltaError, Result};
use std::collections::HashMap;

/// How updated chunks are aligned against the original sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum MatchMode {
    /// Compare only the chunk under the original cursor.
    #[default]
    Positional,
    /// Search forward from the original cursor for the nearest chunk with an
    /// equal digest.
    Indexed,
}

/// Counters collected while matching.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchStats {
    /// Updated chunks found in the original
    pub matched_chunks: usize,
    /// Updated chunks copied into the delta
    pub new_chunks: usize,
    /// Bytes covered by matched chunks
    pub matched_bytes: usize,
    /// Bytes written to the delta
    pub delta_bytes: usize,
}

impl MatchStats {
    /// Fraction of updated bytes that were matched, in `0.0..=1.0`.
    pub fn reuse_ratio(&self) -> f64 {
        let total = self.matched_bytes + self.delta_bytes;
        if total == 0 {
            1.0
        } else {
            self.matched_bytes as f64 / total as f64
        }
    }
}

/// The result of a match: the delta payload plus counters describing it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchOutcome {
    /// Updated bytes that could not be matched, in stream order
    pub delta: Vec<u8>,
    /// Counters for this run
    pub stats: MatchStats,
}

/// Computes deltas between chunk sequences.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeltaMatcher {
    mode: MatchMode,
}

impl DeltaMatcher {
    /// Creates a matcher using `mode`.
    pub fn new(mode: MatchMode) -> Self {
        Self { mode }
    }

    /// Returns the configured mode.
    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    /// Matches `updated` against `original` and returns the unmatched bytes.
    ///
    /// # Errors
    ///
    /// Returns [`DeltaError::ChunkSizeMismatch`] if the two sequences were
    /// produced with different chunk sizes.
    pub fn run(&self, original: &ChunkSequence, updated: &ChunkSequence) -> Result<MatchOutcome> {
        if original.chunk_size() != updated.chunk_size() {
            return Err(DeltaError::ChunkSizeMismatch {
                original: original.chunk_size().get(),
                updated: updated.chunk_size().get(),
            });
        }

        let outcome = match self.mode {
            MatchMode::Positional => match_positional(original.chunks(), updated.chunks()),
            MatchMode::Indexed => match_indexed(original.chunks(), updated.chunks()),
        };

        log::debug!(
            "{:?} match: {} reused, {} new, {} delta bytes",
            self.mode,
            outcome.stats.matched_chunks,
            outcome.stats.new_chunks,
            outcome.stats.delta_bytes
        );
        Ok(outcome)
    }
}

/// Accumulates delta bytes and stats as the updated cursor advances.
struct DeltaWriter {
    delta: Vec<u8>,
    stats: MatchStats,
}

impl DeltaWriter {
    fn new() -> Self {
        Self {
            delta: Vec::new(),
            stats: MatchStats::default(),
        }
    }

    #[inline]
    fn reuse(&mut self, chunk: &Chunk) {
        self.stats.matched_chunks += 1;
        self.stats.matched_bytes += chunk.len();
    }

    #[inline]
    fn emit(&mut self, chunk: &Chunk) {
        self.delta.extend_from_slice(chunk.bytes());
        self.stats.new_chunks += 1;
        self.stats.delta_bytes += chunk.len();
    }

    fn finish(self) -> MatchOutcome {
        MatchOutcome {
            delta: self.delta,
            stats: self.stats,
        }
    }
}

fn match_positional(original: &[Chunk], updated: &[Chunk]) -> MatchOutcome {
    let mut out = DeltaWriter::new();
    let mut original_pos = 0;
    let mut updated_pos = 0;

    while updated_pos < updated.len() {
        let chunk = &updated[updated_pos];

        if original_pos < original.len() && original[original_pos].digest() == chunk.digest() {
            log::trace!("chunk {} reuses original chunk {}", updated_pos, original_pos);
            out.reuse(chunk);
            original_pos += 1;
            updated_pos += 1;
            continue;
        }

        log::trace!("chunk {} is new ({} bytes)", updated_pos, chunk.len());
        out.emit(chunk);
        updated_pos += 1;
    }

    out.finish()
}

fn match_indexed(original: &[Chunk], updated: &[Chunk]) -> MatchOutcome {
    let index = build_index(original);
    let mut out = DeltaWriter::new();
    let mut original_pos = 0;

    for (updated_pos, chunk) in updated.iter().enumerate() {
        match find_at_or_after(&index, chunk.digest(), original_pos) {
            Some(pos) => {
                log::trace!("chunk {} reuses original chunk {}", updated_pos, pos);
                out.reuse(chunk);
                original_pos = pos + 1;
            }
            None => {
                log::trace!("chunk {} is new ({} bytes)", updated_pos, chunk.len());
                out.emit(chunk);
            }
        }
    }

    out.finish()
}

/// Maps each digest to the ascending positions where it occurs.
fn build_index(chunks: &[Chunk]) -> HashMap<Digest, Vec<usize>> {
    let mut index: HashMap<Digest, Vec<usize>> = HashMap::with_capacity(chunks.len());
    for (pos, chunk) in chunks.iter().enumerate() {
        index.entry(*chunk.digest()).or_default().push(pos);
    }
    index
}

fn find_at_or_after(
    index: &HashMap<Digest, Vec<usize>>,
    digest: &Digest,
    cursor: usize,
) -> Option<usize> {
    let positions = index.get(digest)?;
    let i = positions.partition_point(|&p| p < cursor);
    positions.get(i).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunker::{ChunkSource, FixedChunker};
    use crate::config::ChunkSize;

    fn sequence(data: &[u8], size: usize) -> ChunkSequence {
        FixedChunker::new(ChunkSize::new(size).unwrap())
            .sequence(data)
            .unwrap()
    }

    fn positional(original: &[u8], updated: &[u8], size: usize) -> MatchOutcome {
        DeltaMatcher::default()
            .run(&sequence(original, size), &sequence(updated, size))
            .unwrap()
    }

    fn indexed(original: &[u8], updated: &[u8], size: usize) -> MatchOutcome {
        DeltaMatcher::new(MatchMode::Indexed)
            .run(&sequence(original, size), &sequence(updated, size))
            .unwrap()
    }

    #[test]
    fn test_identical_sequences() {
        let outcome = positional(b"aaaabbbbcccc", b"aaaabbbbcccc", 4);
        assert!(outcome.delta.is_empty());
        assert_eq!(outcome.stats.matched_chunks, 3);
        assert_eq!(outcome.stats.new_chunks, 0);
        assert_eq!(outcome.stats.reuse_ratio(), 1.0);
    }

    #[test]
    fn test_changed_middle_chunk() {
        let outcome = positional(b"aaaabbbbcccc", b"aaaaXbbbcccc", 4);
        // original cursor stays on "bbbb", so "cccc" no longer lines up
        assert_eq!(outcome.delta, b"Xbbbcccc");
        assert_eq!(outcome.stats.matched_chunks, 1);
        assert_eq!(outcome.stats.new_chunks, 2);
    }

    #[test]
    fn test_original_cursor_waits_for_match() {
        // "XXXX" is new; the original cursor stays on "bbbb" which then matches
        let outcome = positional(b"aaaabbbb", b"aaaaXXXXbbbb", 4);
        assert_eq!(outcome.delta, b"XXXX");
        assert_eq!(outcome.stats.matched_chunks, 2);
    }

    #[test]
    fn test_moved_chunk_is_new_in_positional_mode() {
        // "bbbb" exists in the original, but not under the original cursor
        let outcome = positional(b"aaaabbbb", b"bbbbaaaa", 4);
        assert_eq!(outcome.delta, b"bbbb");
        assert_eq!(outcome.stats.matched_chunks, 1);
    }

    #[test]
    fn test_indexed_mode_skips_ahead() {
        // positional compares "cccc" against "aaaa" forever
        let outcome = indexed(b"aaaabbbbcccc", b"cccc", 4);
        assert!(outcome.delta.is_empty());

        let outcome = positional(b"aaaabbbbcccc", b"cccc", 4);
        assert_eq!(outcome.delta, b"cccc");
    }

    #[test]
    fn test_indexed_mode_never_moves_backwards() {
        let outcome = indexed(b"aaaabbbb", b"bbbbaaaa", 4);
        // after matching "bbbb" at position 1 the cursor is past "aaaa"
        assert_eq!(outcome.delta, b"aaaa");
    }

    #[test]
    fn test_indexed_mode_uses_nearest_duplicate() {
        let outcome = indexed(b"aaaaaaaaaaaa", b"aaaaaaaaaaaaaaaa", 4);
        assert_eq!(outcome.delta, b"aaaa");
        assert_eq!(outcome.stats.matched_chunks, 3);
    }

    #[test]
    fn test_empty_sides() {
        assert!(positional(b"", b"", 4).delta.is_empty());
        assert_eq!(positional(b"", b"abcdef", 4).delta, b"abcdef");
        assert!(positional(b"abcdef", b"", 4).delta.is_empty());
        assert_eq!(MatchStats::default().reuse_ratio(), 1.0);
    }

    #[test]
    fn test_chunk_size_mismatch() {
        let err = DeltaMatcher::default()
            .run(&sequence(b"abcdef", 2), &sequence(b"abcdef", 3))
            .unwrap_err();

        assert!(matches!(
            err,
            DeltaError::ChunkSizeMismatch {
                original: 2,
                updated: 3
            }
        ));
    }

    #[test]
    fn test_stats_account_for_every_updated_byte() {
        let updated = b"The quick brown cat jumps over the lazy dog";
        let outcome = positional(b"The quick brown fox jumps over the lazy dog", updated, 5);

        assert_eq!(
            outcome.stats.matched_bytes + outcome.stats.delta_bytes,
            updated.len()
        );
        assert_eq!(outcome.stats.delta_bytes, outcome.delta.len());
    }
}

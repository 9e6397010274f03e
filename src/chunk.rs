//! Chunks and chunk sequences.

use crate::config::ChunkSize;
use crate::digest::Digest;

/// A fingerprinted window of a byte stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    digest: Digest,
    bytes: Vec<u8>,
}

impl Chunk {
    /// Fingerprints `bytes` and wraps them as a chunk.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            digest: Digest::of(&bytes),
            bytes,
        }
    }

    /// Returns the digest of this chunk's bytes.
    #[inline]
    pub fn digest(&self) -> &Digest {
        &self.digest
    }

    /// Returns the raw payload.
    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the payload length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true if the payload is empty. Chunkers never produce these.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Consumes the chunk and returns its payload.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// The ordered chunks of one stream, tagged with the chunk size that produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkSequence {
    chunk_size: ChunkSize,
    chunks: Vec<Chunk>,
}

impl ChunkSequence {
    /// Creates an empty sequence for the given chunk size.
    pub fn new(chunk_size: ChunkSize) -> Self {
        Self {
            chunk_size,
            chunks: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, chunk: Chunk) {
        debug_assert!(!chunk.is_empty());
        debug_assert!(chunk.len() <= self.chunk_size.get());
        self.chunks.push(chunk);
    }

    /// Returns the chunk size this sequence was produced with.
    #[inline]
    pub fn chunk_size(&self) -> ChunkSize {
        self.chunk_size
    }

    /// Returns the chunks in stream order.
    #[inline]
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Returns the chunk at `index`, if any.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&Chunk> {
        self.chunks.get(index)
    }

    /// Returns the number of chunks.
    #[inline]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Returns true if the source stream was empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Iterates over the chunks in stream order.
    pub fn iter(&self) -> std::slice::Iter<'_, Chunk> {
        self.chunks.iter()
    }

    /// Total number of source bytes covered by this sequence.
    pub fn byte_len(&self) -> usize {
        self.chunks.iter().map(Chunk::len).sum()
    }

    /// Concatenates every chunk payload, reproducing the source stream.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.byte_len());
        for chunk in &self.chunks {
            out.extend_from_slice(chunk.bytes());
        }
        out
    }
}

impl<'a> IntoIterator for &'a ChunkSequence {
    type Item = &'a Chunk;
    type IntoIter = std::slice::Iter<'a, Chunk>;

    fn into_iter(self) -> Self::IntoIter {
        self.chunks.iter()
    }
}

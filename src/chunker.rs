//! Splitting byte streams into fingerprinted chunks.

use crate::chunk::{Chunk, ChunkSequence};
use crate::config::ChunkSize;
use crate::error::Result;
use std::io::{self, Read};

/// Anything that can turn a byte source into a lazy, finite sequence of chunks.
///
/// Every call to [`chunks`](ChunkSource::chunks) starts a fresh pass over the
/// reader it is given.
pub trait ChunkSource {
    /// Iterator returned by [`chunks`](ChunkSource::chunks).
    type Chunks<R: Read>: Iterator<Item = io::Result<Chunk>>;

    /// Creates an iterator that yields chunks read from `reader`.
    fn chunks<R: Read>(&self, reader: R) -> Self::Chunks<R>;

    /// Upper bound on the length of any chunk this source yields.
    fn chunk_size(&self) -> ChunkSize;

    /// Reads `reader` to the end and collects every chunk.
    ///
    /// # Errors
    ///
    /// Returns [`DeltaError::Read`](crate::DeltaError::Read) on the first read
    /// failure. Nothing collected so far is returned.
    fn sequence<R: Read>(&self, reader: R) -> Result<ChunkSequence> {
        let mut sequence = ChunkSequence::new(self.chunk_size());
        for chunk in self.chunks(reader) {
            sequence.push(chunk?);
        }
        log::debug!(
            "chunked {} bytes into {} chunks (chunk size {})",
            sequence.byte_len(),
            sequence.len(),
            sequence.chunk_size()
        );
        Ok(sequence)
    }
}

/// Upper bound on the buffer reserved before a window is read.
const INITIAL_WINDOW_CAPACITY: usize = 64 * 1024;

/// Cuts streams at fixed byte offsets, every `chunk_size` bytes.
///
/// Boundaries never depend on content: inserting a single byte shifts every
/// later boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixedChunker {
    chunk_size: ChunkSize,
}

impl FixedChunker {
    /// Creates a chunker that emits chunks of `chunk_size` bytes.
    pub fn new(chunk_size: ChunkSize) -> Self {
        Self { chunk_size }
    }
}

impl ChunkSource for FixedChunker {
    type Chunks<R: Read> = FixedChunks<R>;

    fn chunks<R: Read>(&self, reader: R) -> FixedChunks<R> {
        FixedChunks {
            reader,
            chunk_size: self.chunk_size.get(),
            done: false,
        }
    }

    fn chunk_size(&self) -> ChunkSize {
        self.chunk_size
    }
}

/// Iterator over the fixed-size chunks of a reader.
///
/// Yields at most one error, after which it is exhausted.
#[derive(Debug)]
pub struct FixedChunks<R: Read> {
    reader: R,
    chunk_size: usize,
    done: bool,
}

impl<R: Read> Iterator for FixedChunks<R> {
    type Item = io::Result<Chunk>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        // read_to_end retries short and interrupted reads until the window is
        // full or the stream ends
        let mut buf = Vec::with_capacity(self.chunk_size.min(INITIAL_WINDOW_CAPACITY));
        let mut window = (&mut self.reader).take(self.chunk_size as u64);
        match window.read_to_end(&mut buf) {
            Ok(0) => {
                self.done = true;
                None
            }
            Ok(n) => {
                if n < self.chunk_size {
                    self.done = true;
                }
                buf.shrink_to_fit();
                Some(Ok(Chunk::new(buf)))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl<R: Read> std::iter::FusedIterator for FixedChunks<R> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::Digest;
    use std::io::Cursor;

    fn chunker(size: usize) -> FixedChunker {
        FixedChunker::new(ChunkSize::new(size).unwrap())
    }

    /// Hands out at most `step` bytes per read call.
    struct TrickleReader<'a> {
        data: &'a [u8],
        step: usize,
    }

    impl Read for TrickleReader<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.step.min(buf.len()).min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    /// Serves `good` bytes, then fails every read.
    struct FailingReader {
        good: Vec<u8>,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.good.is_empty() {
                return Err(io::Error::other("simulated read error"));
            }
            let n = buf.len().min(self.good.len());
            buf[..n].copy_from_slice(&self.good[..n]);
            self.good.drain(..n);
            Ok(n)
        }
    }

    /// Fails with `Interrupted` on every other call.
    struct InterruptingReader<'a> {
        data: &'a [u8],
        interrupt: bool,
    }

    impl Read for InterruptingReader<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.interrupt = !self.interrupt;
            if self.interrupt {
                return Err(io::Error::from(io::ErrorKind::Interrupted));
            }
            let n = buf.len().min(self.data.len()).min(2);
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    #[test]
    fn test_empty_input() {
        let seq = chunker(4).sequence(Cursor::new(Vec::new())).unwrap();
        assert!(seq.is_empty());
        assert_eq!(seq.to_bytes(), b"");
    }

    #[test]
    fn test_fixed_boundaries() {
        let seq = chunker(4).sequence(&b"abcdefghij"[..]).unwrap();
        let payloads: Vec<&[u8]> = seq.iter().map(Chunk::bytes).collect();

        assert_eq!(payloads, vec![&b"abcd"[..], b"efgh", b"ij"]);
        assert_eq!(seq.get(0).unwrap().digest(), &Digest::of(b"abcd"));
    }

    #[test]
    fn test_exact_multiple_has_no_trailing_chunk() {
        let seq = chunker(5).sequence(&b"0123456789"[..]).unwrap();
        assert_eq!(seq.len(), 2);
        assert!(seq.iter().all(|c| c.len() == 5));
    }

    #[test]
    fn test_short_reads_do_not_move_boundaries() {
        let data = b"The quick brown fox jumps over the lazy dog";
        let expected = chunker(8).sequence(&data[..]).unwrap();
        let trickled = chunker(8)
            .sequence(TrickleReader {
                data: &data[..],
                step: 3,
            })
            .unwrap();

        assert_eq!(trickled, expected);
    }

    #[test]
    fn test_interrupted_reads_are_retried() {
        let data = b"interrupted but complete";
        let seq = chunker(6)
            .sequence(InterruptingReader {
                data: &data[..],
                interrupt: false,
            })
            .unwrap();

        assert_eq!(seq.to_bytes(), data);
        assert_eq!(seq.len(), 4);
    }

    #[test]
    fn test_reader_error_propagates() {
        let reader = FailingReader {
            good: b"abcdef".to_vec(),
        };
        let mut iter = chunker(4).chunks(reader);

        assert_eq!(iter.next().unwrap().unwrap().bytes(), b"abcd");
        // "ef" was read before the failure but never forms a chunk
        assert!(iter.next().unwrap().is_err());
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_sequence_discards_partial_result_on_error() {
        let reader = FailingReader {
            good: b"abcdefgh".to_vec(),
        };
        let err = chunker(4).sequence(reader).unwrap_err();
        assert!(err.is_read());
    }

    #[test]
    fn test_huge_chunk_size_on_small_input() {
        let seq = chunker(usize::MAX).sequence(&b"abc"[..]).unwrap();
        assert_eq!(seq.len(), 1);
        assert_eq!(seq.to_bytes(), b"abc");

        let seq = chunker(usize::MAX / 2).sequence(&b"abc"[..]).unwrap();
        assert_eq!(seq.len(), 1);
    }

    #[test]
    fn test_short_last_chunk_does_not_pin_window() {
        let mut iter = chunker(4096).chunks(&b"tail"[..]);
        let chunk = iter.next().unwrap().unwrap().into_bytes();

        assert_eq!(chunk, b"tail");
        assert!(chunk.capacity() < 4096);
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_chunk_size_one() {
        let seq = chunker(1).sequence(&b"xyz"[..]).unwrap();
        assert_eq!(seq.len(), 3);
        assert_eq!(seq.to_bytes(), b"xyz");
    }
}

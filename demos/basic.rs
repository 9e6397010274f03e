//! Basic usage example for chunkdelta.

use chunkdelta::{DeltaOptions, MatchMode, compute_delta, compute_delta_with};

fn main() {
    // Example 1: The whole file fits in one chunk
    println!("=== Example 1: Single Chunk ===");
    let original = b"Hello, world!";
    let updated = b"Hello, world! How are you?";

    match compute_delta(&original[..], &updated[..], 1024) {
        Ok(delta) => {
            println!("Original: {:?}", String::from_utf8_lossy(original));
            println!("Updated:  {:?}", String::from_utf8_lossy(updated));
            println!("Delta:    {:?}", String::from_utf8_lossy(&delta));
        }
        Err(e) => eprintln!("Delta error: {}", e),
    }

    println!();

    // Example 2: Appending to a chunk-aligned file
    println!("=== Example 2: Aligned Append ===");
    let original: Vec<u8> = (0..4096).map(|i| (i % 251) as u8).collect();
    let mut updated = original.clone();
    updated.extend_from_slice(b"new log line\n");

    match compute_delta(&original[..], &updated[..], 1024) {
        Ok(delta) => {
            println!("Original size: {} bytes", original.len());
            println!("Updated size:  {} bytes", updated.len());
            println!("Delta size:    {} bytes", delta.len());
            assert_eq!(delta, b"new log line\n");
            println!("✓ Only the appended bytes were emitted");
        }
        Err(e) => eprintln!("Delta error: {}", e),
    }

    println!();

    // Example 3: One byte inserted at the front shifts every boundary
    println!("=== Example 3: Shifted Boundaries ===");
    let mut shifted = vec![b'#'];
    shifted.extend_from_slice(&original);

    match compute_delta(&original[..], &shifted[..], 1024) {
        Ok(delta) => {
            println!("Updated size: {} bytes", shifted.len());
            println!("Delta size:   {} bytes", delta.len());
            println!("Every chunk after the insertion point lands in the delta");
        }
        Err(e) => eprintln!("Delta error: {}", e),
    }

    println!();

    // Example 4: Removed chunks, positional vs indexed
    println!("=== Example 4: Match Modes ===");
    let mut trimmed = original[..1024].to_vec();
    trimmed.extend_from_slice(&original[3072..]);

    for mode in [MatchMode::Positional, MatchMode::Indexed] {
        let options = match DeltaOptions::new(1024) {
            Ok(options) => options.with_mode(mode),
            Err(e) => {
                eprintln!("Config error: {}", e);
                return;
            }
        };

        match compute_delta_with(&original[..], &trimmed[..], &options) {
            Ok(outcome) => println!(
                "{:?}: {} bytes of delta, {} chunks reused",
                mode,
                outcome.delta.len(),
                outcome.stats.matched_chunks
            ),
            Err(e) => eprintln!("Delta error: {}", e),
        }
    }

    println!();
    println!("=== All Examples Completed ===");
}

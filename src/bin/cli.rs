//! chunkdelta CLI - fixed-size chunk delta extraction
//!
//! Usage:
//!   chunkdelta diff [original] [updated] [-c <size>] [-o <output>] [OPTIONS]
//!   chunkdelta chunks <file> [-c <size>]

use anyhow::{Context, Result, bail};
use chunkdelta::{
    ChunkSize, ChunkSource, DEFAULT_CHUNK_SIZE, DeltaOptions, FixedChunker, MatchMode, MatchStats,
};
use clap::{Parser, Subcommand, ValueEnum};
use owo_colors::OwoColorize;
use std::fs::{self, File};
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;
use sysinfo::System;
use thiserror::Error;

/// Fixed-size chunk delta tool
#[derive(Parser)]
#[command(name = "chunkdelta")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the bytes of the updated file that do not line up with the original
    Diff {
        /// Original file
        #[arg(default_value = "test/original.txt")]
        original: PathBuf,

        /// Updated file
        #[arg(default_value = "test/updated.txt")]
        updated: PathBuf,

        /// Maximum bytes per chunk
        #[arg(short, long, default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,

        /// Chunk alignment strategy
        #[arg(short, long, value_enum, default_value = "positional")]
        mode: Mode,

        /// Write the delta to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print match statistics to stderr
        #[arg(long)]
        stats: bool,

        /// Skip memory warning prompt
        #[arg(short = 'y', long)]
        yes: bool,

        /// Overwrite output file if it exists
        #[arg(short, long)]
        force: bool,

        /// Suppress output except errors
        #[arg(short, long)]
        quiet: bool,
    },
    /// List the chunks and digests of a single file
    Chunks {
        /// File to chunk
        file: PathBuf,

        /// Maximum bytes per chunk
        #[arg(short, long, default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum Mode {
    /// Compare only chunks at the current cursor positions
    Positional,
    /// Search ahead in the original for a matching chunk
    Indexed,
}

impl From<Mode> for MatchMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Positional => MatchMode::Positional,
            Mode::Indexed => MatchMode::Indexed,
        }
    }
}

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_DELTA_FAILED: i32 = 2;
const EXIT_OUT_OF_MEMORY: i32 = 4;
const EXIT_USER_CANCELLED: i32 = 5;

/// Failures that map to their own exit code.
#[derive(Debug, Error)]
enum CliError {
    #[error(
        "Insufficient memory: ~{} required, {} total RAM",
        format_bytes(*required),
        format_bytes(*total)
    )]
    InsufficientMemory { required: u64, total: u64 },

    #[error("Cancelled by user")]
    Cancelled,
}

fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<CliError>() {
        Some(CliError::InsufficientMemory { .. }) => EXIT_OUT_OF_MEMORY,
        Some(CliError::Cancelled) => EXIT_USER_CANCELLED,
        None if err.downcast_ref::<chunkdelta::DeltaError>().is_some() => EXIT_DELTA_FAILED,
        None => EXIT_ERROR,
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Diff {
            original,
            updated,
            chunk_size,
            mode,
            output,
            stats,
            yes,
            force,
            quiet,
        } => {
            let opts = DiffOpts {
                output,
                stats,
                yes,
                force,
                quiet,
            };
            handle_diff(&original, &updated, chunk_size, mode, &opts)
        }
        Commands::Chunks { file, chunk_size } => handle_chunks(&file, chunk_size),
    };

    match result {
        Ok(()) => process::exit(EXIT_SUCCESS),
        Err(e) => {
            eprintln!("{} {:#}", "Error:".bright_red().bold(), e);
            process::exit(exit_code(&e));
        }
    }
}

struct DiffOpts {
    output: Option<PathBuf>,
    stats: bool,
    yes: bool,
    force: bool,
    quiet: bool,
}

fn handle_diff(
    original_path: &Path,
    updated_path: &Path,
    chunk_size: usize,
    mode: Mode,
    opts: &DiffOpts,
) -> Result<()> {
    let options = DeltaOptions::new(chunk_size)?.with_mode(mode.into());

    if let Some(output_path) = &opts.output {
        if output_path.exists() && !opts.force {
            bail!(
                "Output file already exists: {}\n   Use --force to overwrite",
                output_path.display()
            );
        }
    }

    let original_size = fs::metadata(original_path)
        .with_context(|| format!("File not found: {}", original_path.display()))?
        .len();
    let updated_size = fs::metadata(updated_path)
        .with_context(|| format!("File not found: {}", updated_path.display()))?
        .len();

    // stdout carries the delta itself unless --output is given
    let chatty = !opts.quiet && opts.output.is_some();

    if chatty {
        println!(
            "{} Original: {}, Updated: {}",
            "File sizes:".bright_cyan(),
            format_bytes(original_size),
            format_bytes(updated_size)
        );
    }

    let required = estimate_diff_memory(original_size, updated_size);
    check_memory(required, opts.yes)?;

    let original = File::open(original_path)
        .with_context(|| format!("Failed to open original file: {}", original_path.display()))?;
    let updated = File::open(updated_path)
        .with_context(|| format!("Failed to open updated file: {}", updated_path.display()))?;

    if chatty {
        println!(
            "{} Chunking and matching ({} byte chunks, {:?})...",
            "Step 1/2:".bright_cyan(),
            options.chunk_size(),
            options.mode()
        );
    }

    let start = Instant::now();
    let outcome = chunkdelta::compute_delta_with(
        BufReader::new(original),
        BufReader::new(updated),
        &options,
    )?;
    let elapsed = start.elapsed();
    log::info!("delta computed in {:.2?}", elapsed);

    match &opts.output {
        Some(output_path) => {
            if chatty {
                println!("{} Writing output...", "Step 2/2:".bright_cyan());
            }
            fs::write(output_path, &outcome.delta).with_context(|| {
                format!("Failed to write output file: {}", output_path.display())
            })?;

            if chatty {
                println!();
                println!(
                    "{} Created {} ({}, {:.1}% of updated file)",
                    "Success:".bright_green().bold(),
                    output_path.display(),
                    format_bytes(outcome.delta.len() as u64),
                    percent(outcome.delta.len() as u64, updated_size)
                );
                println!("   Matching took {:.2?}", elapsed);
            }
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(&outcome.delta)
                .context("Failed to write delta to stdout")?;
            stdout.write_all(b"\n")?;
            stdout.flush()?;
        }
    }

    if opts.stats {
        print_stats(&outcome.stats);
    }

    Ok(())
}

fn handle_chunks(path: &Path, chunk_size: usize) -> Result<()> {
    let chunker = FixedChunker::new(ChunkSize::new(chunk_size)?);
    let file =
        File::open(path).with_context(|| format!("Failed to open file: {}", path.display()))?;

    let mut stdout = io::stdout().lock();
    let mut offset = 0u64;
    for (index, chunk) in chunker.chunks(BufReader::new(file)).enumerate() {
        let chunk = chunk.with_context(|| format!("Failed to read {}", path.display()))?;
        writeln!(
            stdout,
            "{:>6} {:>12} {:>8} {}",
            index,
            offset,
            chunk.len(),
            chunk.digest()
        )?;
        offset += chunk.len() as u64;
    }

    Ok(())
}

fn print_stats(stats: &MatchStats) {
    eprintln!(
        "{} {} reused ({}), {} new ({}), {:.1}% reused",
        "Chunks:".bright_cyan(),
        stats.matched_chunks,
        format_bytes(stats.matched_bytes as u64),
        stats.new_chunks,
        format_bytes(stats.delta_bytes as u64),
        stats.reuse_ratio() * 100.0
    );
}

// ============================================================================
// Memory Management
// ============================================================================

fn estimate_diff_memory(original_size: u64, updated_size: u64) -> u64 {
    // both chunk sequences + delta (worst case = updated) + 20% overhead
    original_size + updated_size + updated_size + (original_size + updated_size) / 5
}

fn check_memory(required: u64, skip_prompt: bool) -> Result<()> {
    let mut sys = System::new();
    sys.refresh_memory();

    let available = sys.available_memory();
    let total = sys.total_memory();

    if required > total {
        return Err(CliError::InsufficientMemory { required, total }.into());
    }

    let usage_pct = percent(required, available);
    if usage_pct < 80.0 {
        return Ok(());
    }

    eprintln!(
        "{} ~{} required, {} available ({:.0}%)",
        "Memory warning:".bright_yellow().bold(),
        format_bytes(required),
        format_bytes(available),
        usage_pct
    );

    if !skip_prompt {
        eprint!("Continue? [y/N]: ");
        io::stderr().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;

        if !input.trim().eq_ignore_ascii_case("y") {
            return Err(CliError::Cancelled.into());
        }
    }

    Ok(())
}

// ============================================================================
// Utilities
// ============================================================================

fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        (part as f64 / whole as f64) * 100.0
    }
}

fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

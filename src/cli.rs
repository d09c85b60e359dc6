//! Command-line interface for spellbee.

use clap::Parser;
use std::path::PathBuf;

/// Spellbee - event-driven spelling-puzzle engine
#[derive(Parser, Debug)]
#[command(name = "spellbee")]
#[command(about = "Play words against a spelling puzzle session", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Words to submit, in order
    #[arg(required = true)]
    pub words: Vec<String>,

    /// Path to a word-list file (one word per line)
    #[arg(short, long)]
    pub word_list: PathBuf,

    /// Path to a TOML puzzle catalog; the bundled catalog is used if omitted
    #[arg(short, long)]
    pub puzzles: Option<PathBuf>,

    /// Advance to the next puzzle after the listed words
    #[arg(long)]
    pub advance: bool,
}

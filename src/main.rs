//! Spellbee - developer harness CLI
//!
//! Feeds words to a puzzle session and reports each outcome. Not a game UI;
//! this exists to exercise the engine end to end from a shell.

#![warn(missing_docs)]

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use spellbee::{
    Event, PuzzleCatalog, Session, ValidationPort, WordListDictionary,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let catalog = match &cli.puzzles {
        Some(path) => PuzzleCatalog::from_file(path)?,
        None => PuzzleCatalog::builtin(),
    };
    let dictionary = WordListDictionary::from_file(&cli.word_list)?;

    let handle = Session::spawn(
        Arc::new(catalog),
        ValidationPort::standard(Arc::new(dictionary)),
    );

    let snapshot = handle.snapshot();
    info!(
        letters = %snapshot.context().letters().iter().collect::<String>(),
        required = %snapshot.context().required(),
        "Session ready"
    );

    for word in &cli.words {
        let snapshot = handle
            .submit_and_settle(Event::SubmitWord { word: word.clone() })
            .await?;
        info!(
            word = %word,
            kind = %snapshot.context().feedback().kind(),
            feedback = %snapshot.context().feedback().text(),
            tally = snapshot.context().tally(),
            "Word resolved"
        );
    }

    if cli.advance {
        let snapshot = handle.submit_and_settle(Event::AdvancePuzzle).await?;
        info!(
            puzzle_index = snapshot.context().puzzle_index(),
            letters = %snapshot.context().letters().iter().collect::<String>(),
            "Advanced to next puzzle"
        );
    }

    let snapshot = handle.snapshot();
    info!(
        tally = snapshot.context().tally(),
        accepted = ?snapshot.context().accepted_words(),
        "Session summary"
    );

    Ok(())
}

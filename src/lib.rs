//! Spellbee - event-driven spelling-puzzle engine
//!
//! This library is the authoritative state machine for a single-player
//! spelling puzzle: compose a word from a fixed letter set, always use the
//! required letter, score points for every word the dictionary accepts.
//! An interactive UI and an autonomous agent drive the same session, each
//! acting only by submitting events and reading a published snapshot.
//!
//! # Architecture
//!
//! - **Engine**: pure transition function over `(phase, context, event)`
//! - **Session**: serialized event dispatch with snapshot publication
//! - **Validation**: host-supplied rules, async dictionary, and scoring,
//!   run single-flight (at most one outstanding validation per session)
//! - **Puzzle**: deterministic catalog of letter sets
//!
//! # Example
//!
//! ```no_run
//! use spellbee::{Event, PuzzleCatalog, Session, ValidationPort, WordListDictionary};
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let catalog = Arc::new(PuzzleCatalog::builtin());
//! let dictionary = Arc::new(WordListDictionary::from_words(["rack", "racking"]));
//! let handle = Session::spawn(catalog, ValidationPort::standard(dictionary));
//!
//! handle.submit(Event::SubmitWord { word: "rack".to_string() })?;
//! let snapshot = handle.settled().await?;
//! println!("tally: {}", snapshot.context().tally());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod context;
mod engine;
mod event;
mod puzzle;
mod session;
mod slot;
mod validate;

// Crate-level exports - Context model
pub use context::{Context, Feedback, FeedbackKind};

// Crate-level exports - Transition engine
pub use engine::{Engine, Phase, Step, ValidationRequest};

// Crate-level exports - Event surface
pub use event::Event;

// Crate-level exports - Puzzles
pub use puzzle::{CatalogError, Puzzle, PuzzleCatalog, PuzzleSource};

// Crate-level exports - Session and snapshot
pub use session::{Session, SessionClosed, SessionHandle, Snapshot};

// Crate-level exports - Validation port
pub use validate::{
    Dictionary, RuleChecker, RuleVerdict, Scorer, StandardRules, StandardScorer,
    ValidationError, ValidationOutcome, ValidationPort, WordListDictionary,
};

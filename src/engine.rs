//! The pure transition engine.
//!
//! [`Engine::apply`] is a pure function from `(phase, context, event)` to a
//! [`Step`]: the next phase, the next context (the old one is consumed and
//! replaced wholesale), and at most one validation request. It never blocks
//! and never talks to the validation port; submitting a word only *requests*
//! validation, and the session folds the eventual result back in through
//! [`Engine::resolve`].

use crate::context::{Context, Feedback, FeedbackKind};
use crate::event::Event;
use crate::puzzle::PuzzleSource;
use crate::validate::{ValidationError, ValidationOutcome};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Engine phase.
///
/// The engine accepts input composition in [`Phase::Accepting`] and is
/// deliberately unavailable for it in [`Phase::Resolving`], while exactly one
/// validation is outstanding. There is no terminal phase.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Phase {
    /// Composing input; all events apply.
    Accepting,
    /// A validation is outstanding; only puzzle advance applies.
    Resolving,
}

/// A request to validate one submitted word.
///
/// Carries everything the validation port needs plus the puzzle instance id
/// it belongs to, so a completion that arrives after the puzzle has advanced
/// can be recognized as stale and discarded.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct ValidationRequest {
    /// Id of the puzzle instance this request belongs to.
    instance: u64,
    /// The submitted word, already normalized.
    word: String,
    /// The puzzle's letter set.
    letters: BTreeSet<char>,
    /// The puzzle's required letter.
    required: char,
    /// Words already accepted this instance.
    accepted: Vec<String>,
}

/// Result of applying one event.
#[derive(Debug, Clone)]
pub struct Step {
    /// The next phase.
    pub phase: Phase,
    /// The next context.
    pub context: Context,
    /// Validation to start, if the event was a qualifying submission.
    pub request: Option<ValidationRequest>,
}

impl Step {
    fn stay(phase: Phase, context: Context) -> Self {
        Self {
            phase,
            context,
            request: None,
        }
    }
}

/// The pure transition engine for one puzzle session.
#[derive(Clone)]
pub struct Engine {
    source: Arc<dyn PuzzleSource>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine").finish_non_exhaustive()
    }
}

impl Engine {
    /// Creates an engine drawing puzzles from the given source.
    pub fn new(source: Arc<dyn PuzzleSource>) -> Self {
        Self { source }
    }

    /// Creates the context for the first puzzle in the sequence.
    pub fn initial_context(&self) -> Context {
        Context::fresh(0, &self.source.puzzle(0))
    }

    /// Applies one event.
    ///
    /// Permissive by design: an event that does not apply in the current
    /// phase, or whose payload is unusable, is absorbed without effect. The
    /// caller always gets a valid [`Step`] back.
    #[instrument(skip(self, context))]
    pub fn apply(&self, phase: Phase, context: Context, event: &Event, instance: u64) -> Step {
        match (phase, event) {
            (_, Event::AdvancePuzzle) => self.advance(context),
            (Phase::Resolving, _) => {
                // Single-flight guard: composition is closed while a
                // validation is outstanding.
                debug!(?event, "Dropping event while resolving");
                Step::stay(phase, context)
            }
            (Phase::Accepting, Event::AddSymbol { symbol }) => {
                Step::stay(phase, add_symbol(context, *symbol))
            }
            (Phase::Accepting, Event::DeleteSymbol) => {
                Step::stay(phase, delete_symbol(context))
            }
            (Phase::Accepting, Event::ClearInput) => {
                Step::stay(phase, clear_input(context))
            }
            (Phase::Accepting, Event::Submit) => self.submit(context, instance),
            (Phase::Accepting, Event::SubmitWord { word }) => {
                // One shared path with Submit: set the filtered word as the
                // pending input, then submit it. Equivalent to appending each
                // filtered letter and submitting.
                let mut context = context;
                context.pending_input = filter_to_letters(word, &context.letters);
                self.submit(context, instance)
            }
        }
    }

    /// Folds a validation result back into the context.
    ///
    /// The phase returns to [`Phase::Accepting`] unconditionally; the
    /// context alone records whether the word was accepted, rejected, or the
    /// validation itself failed.
    #[instrument(skip(self, context, result))]
    pub fn resolve(
        &self,
        mut context: Context,
        result: Result<ValidationOutcome, ValidationError>,
    ) -> Context {
        context.pending_input.clear();
        match result {
            Ok(ValidationOutcome::Accepted {
                word,
                points,
                bonus,
                message,
            }) => {
                info!(%word, points, bonus, "Word accepted");
                context.record_accepted(word, points);
                let kind = if bonus {
                    FeedbackKind::Bonus
                } else {
                    FeedbackKind::Success
                };
                context.feedback = Feedback::new(message, kind);
            }
            Ok(ValidationOutcome::Rejected { reason }) => {
                debug!(%reason, "Word rejected");
                context.feedback = Feedback::new(reason, FeedbackKind::Error);
            }
            Err(error) => {
                // Infrastructure failure, not a semantic rejection.
                warn!(%error, "Validation port failed");
                context.feedback = Feedback::new("validation failed", FeedbackKind::Error);
            }
        }
        context
    }

    fn submit(&self, mut context: Context, instance: u64) -> Step {
        if context.pending_input.chars().count() < 4 {
            context.feedback =
                Feedback::new("word must be at least 4 letters", FeedbackKind::Error);
            return Step::stay(Phase::Accepting, context);
        }

        let request = ValidationRequest {
            instance,
            word: context.pending_input.clone(),
            letters: context.letters.clone(),
            required: context.required,
            accepted: context.accepted_words.clone(),
        };
        debug!(word = %request.word, "Entering resolving phase");
        Step {
            phase: Phase::Resolving,
            context,
            request: Some(request),
        }
    }

    fn advance(&self, context: Context) -> Step {
        let index = (context.puzzle_index + 1) % self.source.count();
        info!(index, "Advancing puzzle");
        let fresh = Context::fresh(index, &self.source.puzzle(index));
        Step::stay(Phase::Accepting, fresh)
    }
}

fn add_symbol(mut context: Context, symbol: char) -> Context {
    let symbol = symbol.to_ascii_lowercase();
    if context.letters.contains(&symbol) {
        context.pending_input.push(symbol);
        context.feedback = Feedback::default();
    } else {
        // Permissive: foreign letters are absorbed, never rejected.
        debug!(%symbol, "Ignoring letter outside the puzzle");
    }
    context
}

fn delete_symbol(mut context: Context) -> Context {
    if context.pending_input.pop().is_some() {
        context.feedback = Feedback::default();
    }
    context
}

fn clear_input(mut context: Context) -> Context {
    context.pending_input.clear();
    context.feedback = Feedback::default();
    context
}

fn filter_to_letters(word: &str, letters: &BTreeSet<char>) -> String {
    word.chars()
        .map(|c| c.to_ascii_lowercase())
        .filter(|c| letters.contains(c))
        .collect()
}

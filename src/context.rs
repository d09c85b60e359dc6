//! The game context: the single source of truth for one puzzle instance.

use crate::puzzle::Puzzle;
use derive_getters::Getters;
use derive_new::new;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Classification of a feedback line.
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
pub enum FeedbackKind {
    /// Neutral status text.
    Info,
    /// A word was accepted.
    Success,
    /// Input was rejected.
    Error,
    /// A bonus word (one using every letter) was accepted.
    Bonus,
}

/// One line of feedback shown to the player.
///
/// Overwritten on every transition, never accumulated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, new)]
pub struct Feedback {
    /// Feedback text.
    #[new(into)]
    text: String,
    /// Feedback classification.
    kind: FeedbackKind,
}

impl Default for Feedback {
    fn default() -> Self {
        Self::new("", FeedbackKind::Info)
    }
}

/// Mutable game state for one puzzle instance.
///
/// Owned exclusively by the transition engine; callers observe it only
/// through cloned snapshots. Replaced wholesale on every transition and on
/// puzzle advance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct Context {
    /// Allowed input letters for this puzzle (immutable per instance).
    pub(crate) letters: BTreeSet<char>,
    /// The letter every accepted word must contain.
    pub(crate) required: char,
    /// Letters composed so far by the current actor.
    pub(crate) pending_input: String,
    /// Words accepted this instance, kept sorted for display.
    pub(crate) accepted_words: Vec<String>,
    /// Total points this instance. Never decreases until puzzle advance.
    pub(crate) tally: u32,
    /// Feedback from the most recent transition.
    pub(crate) feedback: Feedback,
    /// Sequence index of the current puzzle.
    pub(crate) puzzle_index: usize,
}

impl Context {
    /// Creates a fresh context for the given puzzle.
    pub fn fresh(puzzle_index: usize, puzzle: &Puzzle) -> Self {
        Self {
            letters: puzzle.letters().clone(),
            required: puzzle.required(),
            pending_input: String::new(),
            accepted_words: Vec::new(),
            tally: 0,
            feedback: Feedback::default(),
            puzzle_index,
        }
    }

    /// Checks whether the word has already been accepted this instance.
    pub fn has_accepted(&self, word: &str) -> bool {
        self
            .accepted_words
            .binary_search_by(|w| w.as_str().cmp(word))
            .is_ok()
    }

    /// Records an accepted word, keeping the list sorted.
    pub(crate) fn record_accepted(&mut self, word: String, points: u32) {
        if let Err(pos) = self.accepted_words.binary_search(&word) {
            self.accepted_words.insert(pos, word);
            self.tally += points;
        }
    }
}

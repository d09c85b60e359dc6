//! The inbound event surface.

use serde::{Deserialize, Serialize};

/// An event submitted by a caller.
///
/// This union is closed: it is the entire inbound surface of the engine.
/// The first four variants are the granular vocabulary an interactive UI
/// speaks; [`Event::SubmitWord`] is the consolidated form an agent uses to
/// replace an append/append/../submit sequence with a single event. The two
/// forms share one submission path inside the engine, so their effects are
/// identical.
///
/// Malformed or currently-inapplicable events are absorbed, never rejected:
/// appending a letter outside the puzzle set is a silent no-op, and any
/// event other than [`Event::AdvancePuzzle`] is dropped while a validation
/// is outstanding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Append one letter to the pending input.
    AddSymbol {
        /// The letter to append (case-insensitive).
        symbol: char,
    },
    /// Remove the last letter of the pending input.
    DeleteSymbol,
    /// Empty the pending input.
    ClearInput,
    /// Submit the pending input for validation.
    Submit,
    /// Set the pending input to the given word (filtered to puzzle letters)
    /// and submit it in one step.
    SubmitWord {
        /// The word to submit (case-insensitive; foreign letters dropped).
        word: String,
    },
    /// Abandon the current puzzle and start the next one in the catalog.
    AdvancePuzzle,
}

//! The validation port: rule checking, dictionary lookup, and scoring.
//!
//! The engine never judges a word itself. It hands each submission to a
//! [`ValidationPort`], which runs the three injected collaborators in a
//! fixed order: synchronous rule checks first, then the asynchronous
//! dictionary lookup, then scoring. Scoring only runs once both checks
//! pass. A dictionary *failure* (the lookup itself erroring) is distinct
//! from the dictionary answering no.

use crate::engine::ValidationRequest;
use derive_more::{Display, Error};
use derive_new::new;
use std::collections::{BTreeSet, HashSet};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Validation infrastructure error with location tracking.
///
/// Raised when the dictionary lookup itself fails, as opposed to the word
/// being rejected.
#[derive(Debug, Clone, Display, Error)]
#[display("Validation error: {} at {}:{}", message, file, line)]
pub struct ValidationError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ValidationError {
    /// Creates a new validation error with caller location tracking.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

impl From<std::io::Error> for ValidationError {
    #[track_caller]
    fn from(err: std::io::Error) -> Self {
        Self::new(format!("IO error: {}", err))
    }
}

/// Verdict of the synchronous rule check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleVerdict {
    /// The word passes all local rules.
    Pass,
    /// The word breaks a local rule.
    Fail {
        /// Player-facing reason.
        reason: String,
    },
}

/// Synchronous, pure rule check over a candidate word.
pub trait RuleChecker: Send + Sync {
    /// Checks the word against the puzzle's local rules.
    fn check(
        &self,
        word: &str,
        letters: &BTreeSet<char>,
        required: char,
        accepted: &[String],
    ) -> RuleVerdict;
}

/// Asynchronous dictionary membership test.
///
/// `Ok(false)` means the word is not in the dictionary; `Err` means the
/// lookup itself failed. The two are never conflated.
#[async_trait::async_trait]
pub trait Dictionary: Send + Sync {
    /// Checks whether the word is in the dictionary.
    async fn contains(&self, word: &str) -> Result<bool, ValidationError>;
}

/// Pure scoring over an accepted word.
pub trait Scorer: Send + Sync {
    /// Returns the point value of the word.
    fn score(&self, word: &str, letters: &BTreeSet<char>) -> u32;

    /// Checks whether the word uses every puzzle letter at least once.
    fn is_bonus(&self, word: &str, letters: &BTreeSet<char>) -> bool;
}

/// Outcome of one validation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// The word was accepted.
    Accepted {
        /// The normalized (lowercased) word.
        word: String,
        /// Points awarded.
        points: u32,
        /// Whether the word uses every puzzle letter.
        bonus: bool,
        /// Player-facing message.
        message: String,
    },
    /// The word was rejected by rules or dictionary.
    Rejected {
        /// Player-facing reason.
        reason: String,
    },
}

/// The capability set the host supplies for word validation.
#[derive(Clone, new)]
pub struct ValidationPort {
    rules: Arc<dyn RuleChecker>,
    dictionary: Arc<dyn Dictionary>,
    scorer: Arc<dyn Scorer>,
}

impl std::fmt::Debug for ValidationPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationPort").finish_non_exhaustive()
    }
}

impl ValidationPort {
    /// Creates a port with the standard rules and scorer around the given
    /// dictionary.
    pub fn standard(dictionary: Arc<dyn Dictionary>) -> Self {
        Self::new(
            Arc::new(StandardRules),
            dictionary,
            Arc::new(StandardScorer),
        )
    }

    /// Runs the full validation pipeline for one request.
    ///
    /// Rules run first; on failure the dictionary is never consulted. The
    /// scorer runs only after both checks pass.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if the dictionary lookup itself fails.
    #[instrument(skip(self, request), fields(word = %request.word()))]
    pub async fn validate(
        &self,
        request: &ValidationRequest,
    ) -> Result<ValidationOutcome, ValidationError> {
        let word = request.word();
        let letters = request.letters();

        if let RuleVerdict::Fail { reason } =
            self.rules
                .check(word, letters, *request.required(), request.accepted())
        {
            debug!(%reason, "Rule check rejected word");
            return Ok(ValidationOutcome::Rejected { reason });
        }

        if !self.dictionary.contains(word).await? {
            debug!("Dictionary rejected word");
            return Ok(ValidationOutcome::Rejected {
                reason: format!("\"{}\" is not in the word list", word),
            });
        }

        let points = self.scorer.score(word, letters);
        let bonus = self.scorer.is_bonus(word, letters);
        let message = if bonus {
            format!("Bonus word! +{}", points)
        } else {
            format!("Nice! +{}", points)
        };

        debug!(points, bonus, "Word accepted");
        Ok(ValidationOutcome::Accepted {
            word: word.to_string(),
            points,
            bonus,
            message,
        })
    }
}

/// Standard local rules: minimum length, puzzle letters only, required
/// letter present, not already found.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardRules;

impl RuleChecker for StandardRules {
    fn check(
        &self,
        word: &str,
        letters: &BTreeSet<char>,
        required: char,
        accepted: &[String],
    ) -> RuleVerdict {
        if word.chars().count() < 4 {
            return RuleVerdict::Fail {
                reason: "word must be at least 4 letters".to_string(),
            };
        }
        if !word.chars().all(|c| letters.contains(&c)) {
            return RuleVerdict::Fail {
                reason: "uses letters outside the puzzle".to_string(),
            };
        }
        if !word.contains(required) {
            return RuleVerdict::Fail {
                reason: format!("missing the required letter '{}'", required),
            };
        }
        if accepted.binary_search_by(|w| w.as_str().cmp(word)).is_ok() {
            return RuleVerdict::Fail {
                reason: "already found".to_string(),
            };
        }
        RuleVerdict::Pass
    }
}

/// Standard scoring: four-letter words score one point, longer words score
/// their length, and a bonus word adds seven.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardScorer;

impl Scorer for StandardScorer {
    fn score(&self, word: &str, letters: &BTreeSet<char>) -> u32 {
        let length = word.chars().count() as u32;
        let base = if length == 4 { 1 } else { length };
        if self.is_bonus(word, letters) {
            base + 7
        } else {
            base
        }
    }

    fn is_bonus(&self, word: &str, letters: &BTreeSet<char>) -> bool {
        letters.iter().all(|c| word.contains(*c))
    }
}

/// Set-backed dictionary for hosts that ship a word list.
#[derive(Debug, Clone, Default)]
pub struct WordListDictionary {
    words: HashSet<String>,
}

impl WordListDictionary {
    /// Creates a dictionary from a word collection, lowercasing each entry.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            words: words
                .into_iter()
                .map(|w| w.as_ref().trim().to_ascii_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
        }
    }

    /// Loads a dictionary from a file with one word per line.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if the file cannot be read.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ValidationError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let dictionary = Self::from_words(content.lines());
        debug!(count = dictionary.words.len(), "Word list loaded");
        Ok(dictionary)
    }
}

#[async_trait::async_trait]
impl Dictionary for WordListDictionary {
    async fn contains(&self, word: &str) -> Result<bool, ValidationError> {
        Ok(self.words.contains(word))
    }
}

//! Puzzle descriptors and the catalog that supplies them.

use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Catalog error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Catalog error: {} at {}:{}", message, file, line)]
pub struct CatalogError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl CatalogError {
    /// Creates a new catalog error with caller location tracking.
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

impl From<std::io::Error> for CatalogError {
    #[track_caller]
    fn from(err: std::io::Error) -> Self {
        Self::new(format!("IO error: {}", err))
    }
}

impl From<toml::de::Error> for CatalogError {
    #[track_caller]
    fn from(err: toml::de::Error) -> Self {
        Self::new(format!("TOML error: {}", err))
    }
}

/// One puzzle: a fixed letter set and the distinguished required letter.
///
/// Letters are lowercased on construction. The required letter is always a
/// member of the letter set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Puzzle {
    letters: BTreeSet<char>,
    required: char,
}

impl Puzzle {
    /// Creates a puzzle from a letter collection and a required letter.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if the letter set is empty or the required
    /// letter is not a member of it.
    pub fn new(
        letters: impl IntoIterator<Item = char>,
        required: char,
    ) -> Result<Self, CatalogError> {
        let letters: BTreeSet<char> = letters
            .into_iter()
            .map(|c| c.to_ascii_lowercase())
            .collect();
        let required = required.to_ascii_lowercase();

        if letters.is_empty() {
            return Err(CatalogError::new("Puzzle has no letters"));
        }
        if !letters.contains(&required) {
            return Err(CatalogError::new(format!(
                "Required letter '{}' is not in the letter set",
                required
            )));
        }

        Ok(Self { letters, required })
    }

    /// Returns the letter set.
    pub fn letters(&self) -> &BTreeSet<char> {
        &self.letters
    }

    /// Returns the required letter.
    pub fn required(&self) -> char {
        self.required
    }
}

/// Deterministic supplier of puzzles by sequence index.
pub trait PuzzleSource: Send + Sync {
    /// Returns the puzzle for the given sequence index.
    ///
    /// Implementations wrap the index, so any index is valid.
    fn puzzle(&self, index: usize) -> Puzzle;

    /// Returns the number of distinct puzzles before the sequence repeats.
    fn count(&self) -> usize;
}

impl<T: PuzzleSource + ?Sized> PuzzleSource for Arc<T> {
    fn puzzle(&self, index: usize) -> Puzzle {
        (**self).puzzle(index)
    }

    fn count(&self) -> usize {
        (**self).count()
    }
}

/// In-memory puzzle catalog.
///
/// Indexes wrap modulo the catalog size, so advancing past the last puzzle
/// starts the sequence over.
#[derive(Debug, Clone)]
pub struct PuzzleCatalog {
    puzzles: Vec<Puzzle>,
}

/// On-disk catalog format (TOML).
#[derive(Debug, Deserialize)]
struct CatalogFile {
    puzzles: Vec<CatalogEntry>,
}

/// One `[[puzzles]]` table in a catalog file.
#[derive(Debug, Deserialize)]
struct CatalogEntry {
    letters: String,
    required: char,
}

impl PuzzleCatalog {
    /// Creates a catalog from a non-empty puzzle list.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if the list is empty.
    pub fn new(puzzles: Vec<Puzzle>) -> Result<Self, CatalogError> {
        if puzzles.is_empty() {
            return Err(CatalogError::new("Catalog has no puzzles"));
        }
        Ok(Self { puzzles })
    }

    /// Returns the bundled default catalog.
    pub fn builtin() -> Self {
        let puzzles = [("racking", 'k'), ("lofting", 't'), ("hexagon", 'x'), ("doublet", 'b')]
            .into_iter()
            .map(|(letters, required)| {
                Puzzle::new(letters.chars(), required).expect("builtin puzzle is well-formed")
            })
            .collect();
        Self { puzzles }
    }

    /// Loads a catalog from a TOML file.
    ///
    /// The format is a list of `[[puzzles]]` tables, each with a `letters`
    /// string and a `required` letter.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if the file cannot be read or parsed, or if
    /// any puzzle is malformed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        debug!("Loading puzzle catalog");
        let content = std::fs::read_to_string(path.as_ref())?;
        let file: CatalogFile = toml::from_str(&content)?;

        let puzzles = file
            .puzzles
            .into_iter()
            .map(|entry| Puzzle::new(entry.letters.chars(), entry.required))
            .collect::<Result<Vec<_>, _>>()?;

        let catalog = Self::new(puzzles)?;
        info!(count = catalog.count(), "Catalog loaded");
        Ok(catalog)
    }
}

impl PuzzleSource for PuzzleCatalog {
    fn puzzle(&self, index: usize) -> Puzzle {
        self.puzzles[index % self.puzzles.len()].clone()
    }

    fn count(&self) -> usize {
        self.puzzles.len()
    }
}

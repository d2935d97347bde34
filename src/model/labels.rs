//! Class index to label lookup.

use crate::util::{TileDetError, TileDetResult};
use std::path::Path;

/// Label used when the model has a single, unnamed class.
pub const PLACEHOLDER_LABEL: &str = "1";

/// Maps class indices to display labels.
///
/// Indices past the end of the table resolve to the fallback label.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabelMap {
    names: Vec<String>,
    fallback: String,
}

impl Default for LabelMap {
    fn default() -> Self {
        Self::placeholder()
    }
}

impl LabelMap {
    /// Single-class map that labels every detection with [`PLACEHOLDER_LABEL`].
    pub fn placeholder() -> Self {
        Self {
            names: Vec::new(),
            fallback: PLACEHOLDER_LABEL.to_string(),
        }
    }

    /// Creates a map from an ordered list of names.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            fallback: PLACEHOLDER_LABEL.to_string(),
        }
    }

    /// Parses a `labels.txt` body: one label per line, blank lines skipped.
    pub fn from_lines(text: &str) -> Self {
        Self::new(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty()),
        )
    }

    /// Replaces the label returned for unknown indices.
    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = fallback.into();
        self
    }

    /// Returns the label for `class_index`.
    pub fn resolve(&self, class_index: usize) -> &str {
        self.names
            .get(class_index)
            .map(String::as_str)
            .unwrap_or(&self.fallback)
    }

    /// Number of named classes.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true if only the fallback label is available.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Reads a label file from disk.
pub fn load_labels<P: AsRef<Path>>(path: P) -> TileDetResult<LabelMap> {
    let text = std::fs::read_to_string(path).map_err(|err| TileDetError::LabelIo {
        reason: err.to_string(),
    })?;
    Ok(LabelMap::from_lines(&text))
}

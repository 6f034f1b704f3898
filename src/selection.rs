//! # Multi-Value Selection
//!
//! [`Selection`] is the typed boundary for the comma-delimited request
//! parameter that carries a multi-value facet selection
//! (`?size=5` → one value, `?size=5,6` → two values, OR logic).
//!
//! ## Normalization
//!
//! Parsing splits on [`DELIMITER`], trims each token, drops empty tokens and
//! deduplicates while preserving first-seen order. Encoding joins the tokens
//! back with the delimiter, so `encode(parse(s))` equals the normalized form
//! of `s`.
//!
//! ## Absent, not empty
//!
//! An empty selection encodes as `None`: removing the last value clears the
//! request parameter entirely rather than leaving `?size=`.

use std::fmt;

/// Delimiter between tokens in the request parameter.
pub const DELIMITER: char = ',';

/// An ordered, duplicate-free set of selected option values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    values: Vec<String>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a raw request parameter into a normalized selection.
    ///
    /// Malformed tokens (empty, whitespace-only) are silently dropped.
    pub fn parse(raw: &str) -> Self {
        let mut selection = Selection::new();
        for token in raw.split(DELIMITER) {
            let token = token.trim();
            if !token.is_empty() {
                selection.push(token);
            }
        }
        selection
    }

    pub fn from_values<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let mut selection = Selection::new();
        for value in values {
            let value: String = value.into();
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                selection.push(trimmed);
            }
        }
        selection
    }

    fn push(&mut self, value: &str) {
        if !self.contains(value) {
            self.values.push(value.to_string());
        }
    }

    /// Encode back into request-parameter form.
    ///
    /// Returns `None` when the selection is empty so callers drop the
    /// parameter instead of sending an empty string.
    pub fn encode(&self) -> Option<String> {
        if self.values.is_empty() {
            None
        } else {
            Some(self.values.join(&DELIMITER.to_string()))
        }
    }

    /// Toggle one value: remove it if present, append it otherwise.
    ///
    /// This is the navigation-link operation — each facet option links to the
    /// selection that results from toggling that option.
    pub fn toggle(&self, value: &str) -> Selection {
        if self.contains(value) {
            self.without(value)
        } else {
            let mut next = self.clone();
            next.push(value.trim());
            next
        }
    }

    /// Remove exactly one value, used by per-value removal links.
    pub fn without(&self, value: &str) -> Selection {
        Selection {
            values: self
                .values
                .iter()
                .filter(|v| v.as_str() != value)
                .cloned()
                .collect(),
        }
    }

    pub fn contains(&self, value: &str) -> bool {
        self.values.iter().any(|v| v == value)
    }

    /// Whether every given option is part of this selection (selected ⊇ options).
    pub fn covers<'a, I>(&self, options: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        options.into_iter().all(|option| self.contains(option))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.values.join(&DELIMITER.to_string()))
    }
}

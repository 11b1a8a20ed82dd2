//! Pattern Tables
//!
//! Compiles regex tables kept as plain data. A pattern that fails to compile
//! is logged and skipped; the rest of the table stays usable.

use regex::{Regex, RegexBuilder};

use crate::core::search::error::SearchError;

/// One compiled table entry
#[derive(Debug, Clone)]
pub struct CompiledPattern<T> {
    pub label: T,
    pub regex: Regex,
}

/// A compiled, case-insensitive pattern table
#[derive(Debug)]
pub struct PatternTable<T> {
    name: &'static str,
    patterns: Vec<CompiledPattern<T>>,
    errors: Vec<SearchError>,
}

impl<T: Copy> PatternTable<T> {
    /// Compile every `(label, pattern)` entry of a table
    pub fn compile<'a, I>(name: &'static str, entries: I) -> Self
    where
        I: IntoIterator<Item = (T, &'a str)>,
    {
        let mut patterns = Vec::new();
        let mut errors = Vec::new();

        for (label, pattern) in entries {
            match RegexBuilder::new(pattern).case_insensitive(true).build() {
                Ok(regex) => patterns.push(CompiledPattern { label, regex }),
                Err(e) => {
                    log::warn!("Skipping invalid pattern in {} table '{}': {}", name, pattern, e);
                    errors.push(SearchError::InvalidPattern {
                        table: name,
                        pattern: pattern.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        Self {
            name,
            patterns,
            errors,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompiledPattern<T>> {
        self.patterns.iter()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Patterns that failed to compile
    pub fn errors(&self) -> &[SearchError] {
        &self.errors
    }

    /// Label of the first pattern matching `text`
    pub fn first_match(&self, text: &str) -> Option<T> {
        self.patterns
            .iter()
            .find(|p| p.regex.is_match(text))
            .map(|p| p.label)
    }
}

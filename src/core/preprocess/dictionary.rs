//! Corpus Vocabulary
//!
//! Term frequencies gathered from indexed rulebook content. Drives spelling
//! correction and query completion.

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::core::search::models::Document;
use crate::core::ttrpg_search::is_stop_word;

static TERM_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[a-zA-Z]{2,}\b").expect("term pattern is valid"));

/// Extract lowercase alphabetic terms of two or more letters, minus stop words
pub fn extract_terms(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TERM_PATTERN
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|term| !is_stop_word(term))
        .map(str::to_string)
        .collect()
}

/// Known terms with their corpus frequencies.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    frequencies: HashMap<String, u64>,
}

impl Vocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a vocabulary from documents (body and title)
    pub fn from_documents<'a, I>(documents: I) -> Self
    where
        I: IntoIterator<Item = &'a Document>,
    {
        let mut vocabulary = Self::new();
        vocabulary.add_documents(documents);
        vocabulary
    }

    /// Count every term in `text`
    pub fn add_text(&mut self, text: &str) {
        for term in extract_terms(text) {
            *self.frequencies.entry(term).or_insert(0) += 1;
        }
    }

    pub fn add_document(&mut self, document: &Document) {
        self.add_text(&document.text);
        if let Some(title) = document.metadata.title.as_deref() {
            self.add_text(title);
        }
    }

    pub fn add_documents<'a, I>(&mut self, documents: I)
    where
        I: IntoIterator<Item = &'a Document>,
    {
        for document in documents {
            self.add_document(document);
        }
    }

    pub fn clear(&mut self) {
        self.frequencies.clear();
    }

    pub fn contains(&self, term: &str) -> bool {
        self.frequencies.contains_key(term)
    }

    pub fn frequency(&self, term: &str) -> u64 {
        self.frequencies.get(term).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// Iterate over `(term, frequency)` pairs in arbitrary order
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.frequencies.iter().map(|(term, freq)| (term.as_str(), *freq))
    }

    /// Terms starting with `prefix`, most frequent first (ties alphabetical)
    pub fn terms_with_prefix(&self, prefix: &str, limit: usize) -> Vec<String> {
        let mut matches: Vec<(&str, u64)> = self
            .iter()
            .filter(|(term, _)| term.starts_with(prefix))
            .collect();

        matches.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        matches
            .into_iter()
            .take(limit)
            .map(|(term, _)| term.to_string())
            .collect()
    }
}

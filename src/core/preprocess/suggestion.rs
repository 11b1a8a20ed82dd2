//! Query Suggestions
//!
//! Alternative queries produced while processing a search, with a fixed
//! confidence per kind so callers can rank or filter them.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Why a suggestion was made
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    Spelling,
    Abbreviation,
    Context,
    Completion,
    Intent,
    Broadening,
    Related,
}

impl SuggestionKind {
    /// Fixed confidence for this kind.
    ///
    /// Vocabulary-based spelling suggestions override it with their similarity.
    pub fn default_confidence(&self) -> f32 {
        match self {
            SuggestionKind::Abbreviation => 0.9,
            SuggestionKind::Spelling => 0.8,
            SuggestionKind::Context => 0.6,
            SuggestionKind::Intent => 0.6,
            SuggestionKind::Completion => 0.5,
            SuggestionKind::Broadening => 0.5,
            SuggestionKind::Related => 0.4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestionKind::Spelling => "spelling",
            SuggestionKind::Abbreviation => "abbreviation",
            SuggestionKind::Context => "context",
            SuggestionKind::Completion => "completion",
            SuggestionKind::Intent => "intent",
            SuggestionKind::Broadening => "broadening",
            SuggestionKind::Related => "related",
        }
    }
}

impl fmt::Display for SuggestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A suggested alternative query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuerySuggestion {
    pub original_query: String,
    pub suggested_query: String,
    /// Confidence in [0, 1]
    pub confidence: f32,
    pub kind: SuggestionKind,
    pub explanation: String,
}

impl QuerySuggestion {
    pub fn new(
        kind: SuggestionKind,
        original_query: impl Into<String>,
        suggested_query: impl Into<String>,
        explanation: impl Into<String>,
    ) -> Self {
        Self {
            original_query: original_query.into(),
            suggested_query: suggested_query.into(),
            confidence: kind.default_confidence(),
            kind,
            explanation: explanation.into(),
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }
}

/// Drop suggestions whose suggested query was already seen. First one wins.
pub fn dedup_suggestions(suggestions: Vec<QuerySuggestion>) -> Vec<QuerySuggestion> {
    let mut seen = HashSet::new();
    suggestions
        .into_iter()
        .filter(|s| seen.insert(s.suggested_query.clone()))
        .collect()
}

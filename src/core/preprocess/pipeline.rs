//! Query Pipeline
//!
//! Orchestrates the full query preprocessing flow:
//! 1. Expand domain abbreviations (whole words only)
//! 2. Correct spelling against the corpus vocabulary
//! 3. Suggest context-aware refinements
//! 4. Suggest alternative phrasings from the detected intent
//!
//! Each stage feeds the next and may emit suggestions whether or not it
//! rewrites the query.

use indexmap::IndexSet;
use regex::NoExpand;
use std::collections::HashSet;

use super::dictionary::{extract_terms, Vocabulary};
use super::intent::IntentDetector;
use super::suggestion::{QuerySuggestion, SuggestionKind};
use super::typo::{CorrectionSource, SpellCorrector};
use crate::core::search::error::SearchError;
use crate::core::search::models::{SearchContext, SearchResult};
use crate::core::ttrpg_search::{contains_term, PatternTable, ABBREVIATIONS, VAGUE_TERMS};

/// Results mined for related topics
const RELATED_RESULT_WINDOW: usize = 5;
/// Related-topic suggestions per search
const MAX_RELATED_SUGGESTIONS: usize = 3;
/// Queries this short (in words) get an "examples" completion for vague terms
const VAGUE_QUERY_MAX_WORDS: usize = 3;

/// Result of preprocessing a raw query.
#[derive(Debug, Clone)]
pub struct ProcessedQuery {
    /// Original user input
    pub original: String,
    /// Lowercased, expanded and corrected query
    pub processed: String,
    /// Suggestions in stage order
    pub suggestions: Vec<QuerySuggestion>,
}

/// Complete query preprocessing pipeline.
///
/// Stateless apart from its compiled tables; the vocabulary is owned by the
/// caller and passed in per query.
#[derive(Debug)]
pub struct QueryProcessor {
    /// Whole-word abbreviation patterns, labelled with their table index
    abbreviations: PatternTable<usize>,
    spell_corrector: SpellCorrector,
    intents: IntentDetector,
}

impl Default for QueryProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryProcessor {
    pub fn new() -> Self {
        let patterns: Vec<(usize, String)> = ABBREVIATIONS
            .iter()
            .enumerate()
            .map(|(i, (abbrev, _))| (i, format!(r"\b{}\b", regex::escape(abbrev))))
            .collect();

        Self {
            abbreviations: PatternTable::compile(
                "abbreviation",
                patterns.iter().map(|(i, p)| (*i, p.as_str())),
            ),
            spell_corrector: SpellCorrector::new(),
            intents: IntentDetector::new(),
        }
    }

    /// Patterns that failed to compile while building the processor
    pub fn pattern_errors(&self) -> Vec<&SearchError> {
        self.abbreviations
            .errors()
            .iter()
            .chain(self.intents.errors())
            .collect()
    }

    /// Run the full pipeline over a raw query.
    pub fn process(
        &self,
        raw_query: &str,
        context: Option<&SearchContext>,
        vocabulary: &Vocabulary,
    ) -> ProcessedQuery {
        let mut suggestions = Vec::new();

        // 1. Abbreviations
        let (expanded, abbreviation_suggestions) = self.expand_abbreviations(raw_query.trim());
        suggestions.extend(abbreviation_suggestions);

        // 2. Spelling
        let (corrected, spelling_suggestions) = self.correct_spelling(&expanded, vocabulary);
        suggestions.extend(spelling_suggestions);

        // 3. Context
        suggestions.extend(self.enhance(&corrected, context));

        // 4. Intent
        suggestions.extend(self.suggest_from_intent(&corrected));

        log::debug!(
            "Processed query: '{}' -> '{}' with {} suggestions",
            raw_query,
            corrected,
            suggestions.len()
        );

        ProcessedQuery {
            original: raw_query.to_string(),
            processed: corrected,
            suggestions,
        }
    }

    /// Lowercase the query and expand every abbreviation found as a whole word
    pub fn expand_abbreviations(&self, query: &str) -> (String, Vec<QuerySuggestion>) {
        let mut expanded = query.to_lowercase();
        let mut suggestions = Vec::new();

        for pattern in self.abbreviations.iter() {
            let (abbrev, expansion) = ABBREVIATIONS[pattern.label];
            if !pattern.regex.is_match(&expanded) {
                continue;
            }

            let rewritten = pattern
                .regex
                .replace_all(&expanded, NoExpand(expansion))
                .into_owned();
            if rewritten == expanded {
                continue;
            }

            suggestions.push(QuerySuggestion::new(
                SuggestionKind::Abbreviation,
                query,
                rewritten.clone(),
                format!("Expanded '{}' to '{}'", abbrev, expansion),
            ));
            expanded = rewritten;
        }

        (expanded, suggestions)
    }

    /// Correct misspelled words longer than three characters
    pub fn correct_spelling(
        &self,
        query: &str,
        vocabulary: &Vocabulary,
    ) -> (String, Vec<QuerySuggestion>) {
        let mut words: Vec<String> = query.split_whitespace().map(str::to_string).collect();
        let mut suggestions = Vec::new();

        for i in 0..words.len() {
            let clean: String = words[i]
                .to_lowercase()
                .chars()
                .filter(|c| c.is_alphanumeric() || *c == '_')
                .collect();

            let Some(correction) = self.spell_corrector.correct_word(&clean, vocabulary) else {
                continue;
            };

            words[i] = if words[i].contains(&clean) {
                words[i].replacen(&clean, &correction.corrected, 1)
            } else {
                correction.corrected.clone()
            };

            let explanation = match correction.source {
                CorrectionSource::KnownMisspelling => {
                    format!("Corrected '{}' to '{}'", correction.original, correction.corrected)
                }
                CorrectionSource::Vocabulary => format!(
                    "Did you mean '{}' instead of '{}'?",
                    correction.corrected, correction.original
                ),
            };

            suggestions.push(
                QuerySuggestion::new(SuggestionKind::Spelling, query, words.join(" "), explanation)
                    .with_confidence(correction.confidence),
            );
        }

        if suggestions.is_empty() {
            (query.to_string(), suggestions)
        } else {
            (words.join(" "), suggestions)
        }
    }

    /// Context and completion suggestions. Never rewrites the query.
    pub fn enhance(&self, query: &str, context: Option<&SearchContext>) -> Vec<QuerySuggestion> {
        let mut suggestions = Vec::new();
        if query.is_empty() {
            return suggestions;
        }

        let lowered = query.to_lowercase();
        if let Some(system) = context.and_then(|c| c.current_system.as_deref()) {
            if !system.is_empty() && !lowered.contains(&system.to_lowercase()) {
                suggestions.push(QuerySuggestion::new(
                    SuggestionKind::Context,
                    query,
                    format!("{} in {}", query, system),
                    format!("Added current system context: {}", system),
                ));
            }
        }

        let words: Vec<&str> = lowered.split_whitespace().collect();
        if words.len() <= VAGUE_QUERY_MAX_WORDS
            && VAGUE_TERMS.iter().any(|term| contains_term(&words, term))
        {
            suggestions.push(QuerySuggestion::new(
                SuggestionKind::Completion,
                query,
                format!("{} examples", query),
                "Consider adding 'examples' for more specific results",
            ));
        }

        suggestions
    }

    /// Alternative phrasings for every intent family the query matches
    pub fn suggest_from_intent(&self, query: &str) -> Vec<QuerySuggestion> {
        self.intents
            .detect(query)
            .into_iter()
            .flat_map(|intent| {
                intent
                    .kind
                    .phrasings(&intent.topic)
                    .into_iter()
                    .map(move |(phrasing, explanation)| {
                        QuerySuggestion::new(SuggestionKind::Intent, query, phrasing, explanation)
                    })
            })
            .collect()
    }

    /// Suggestions derived from what a search returned.
    ///
    /// With no results, each word is dropped in turn to broaden the query.
    /// Otherwise terms from the top results' titles and metadata that are
    /// not already in the query are offered as additions.
    pub fn suggest_related(
        &self,
        original_query: &str,
        results: &[SearchResult],
    ) -> Vec<QuerySuggestion> {
        if results.is_empty() {
            return Self::broaden(original_query);
        }

        let mut topics: IndexSet<String> = IndexSet::new();
        for result in results.iter().take(RELATED_RESULT_WINDOW) {
            let metadata = &result.document.metadata;
            if let Some(title) = metadata.title.as_deref() {
                topics.extend(extract_terms(title));
            }
            for value in metadata.text_values() {
                topics.extend(extract_terms(value));
            }
        }

        let query_terms: HashSet<String> = extract_terms(original_query).into_iter().collect();

        topics
            .into_iter()
            .filter(|topic| !query_terms.contains(topic) && topic.len() > 2)
            .take(MAX_RELATED_SUGGESTIONS)
            .map(|topic| {
                QuerySuggestion::new(
                    SuggestionKind::Related,
                    original_query,
                    format!("{} {}", original_query, topic),
                    format!("Also search for related topic: {}", topic),
                )
            })
            .collect()
    }

    fn broaden(original_query: &str) -> Vec<QuerySuggestion> {
        let words: Vec<&str> = original_query.split_whitespace().collect();
        if words.len() < 2 {
            return Vec::new();
        }

        (0..words.len())
            .map(|skip| {
                let broader: Vec<&str> = words
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != skip)
                    .map(|(_, w)| *w)
                    .collect();
                QuerySuggestion::new(
                    SuggestionKind::Broadening,
                    original_query,
                    broader.join(" "),
                    "Try a broader search",
                )
            })
            .collect()
    }

    /// Abbreviation table entries, in application order
    pub fn abbreviations(&self) -> &'static [(&'static str, &'static str)] {
        ABBREVIATIONS
    }
}

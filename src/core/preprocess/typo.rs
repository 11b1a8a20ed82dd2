//! Spelling Correction
//!
//! Corrects query words against a table of known TTRPG misspellings and the
//! vocabulary mined from indexed content.

use std::collections::HashMap;

use super::dictionary::Vocabulary;
use crate::core::ttrpg_search::{is_stop_word, MISSPELLINGS};

/// Minimum similarity for a vocabulary correction to be accepted
pub const SIMILARITY_THRESHOLD: f64 = 0.7;

/// Below this, substring candidates are not good enough and similar-length
/// candidates are considered too
const SUBSTRING_SCORE_FLOOR: f64 = 0.6;

/// Closest-match results at or below this are discarded
const CANDIDATE_FLOOR: f64 = 0.5;

/// Max length difference for similar-length candidates
const MAX_LENGTH_DELTA: usize = 2;

/// Words this short are never corrected
const MIN_CORRECTABLE_LEN: usize = 4;

/// Confidence for corrections from the misspelling table
pub const KNOWN_MISSPELLING_CONFIDENCE: f32 = 0.8;

/// Where a correction came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrectionSource {
    KnownMisspelling,
    Vocabulary,
}

/// A correction made to a word in the query
#[derive(Clone, Debug, PartialEq)]
pub struct Correction {
    /// Original word from the query
    pub original: String,
    /// Corrected word
    pub corrected: String,
    pub confidence: f32,
    pub source: CorrectionSource,
}

/// Similarity between two words in [0, 1]
pub fn similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_damerau_levenshtein(a, b)
}

/// (term, frequency, similarity)
type Candidate<'a> = (&'a str, u64, f64);

/// Higher similarity wins, then higher frequency, then alphabetical order
fn keep_better<'a>(best: &mut Option<Candidate<'a>>, candidate: Candidate<'a>) {
    let (term, freq, score) = candidate;
    let better = match *best {
        None => true,
        Some((best_term, best_freq, best_score)) => {
            score > best_score
                || (score == best_score
                    && (freq > best_freq || (freq == best_freq && term < best_term)))
        }
    };
    if better {
        *best = Some(candidate);
    }
}

/// Spelling corrector backed by a misspelling table and the corpus vocabulary.
#[derive(Debug, Clone)]
pub struct SpellCorrector {
    known_typos: HashMap<&'static str, &'static str>,
}

impl Default for SpellCorrector {
    fn default() -> Self {
        Self::new()
    }
}

impl SpellCorrector {
    pub fn new() -> Self {
        Self {
            known_typos: MISSPELLINGS.iter().copied().collect(),
        }
    }

    /// Correct one lowercase, punctuation-free word.
    ///
    /// Returns `None` for short words, stop words, known vocabulary and words
    /// with no sufficiently close match.
    pub fn correct_word(&self, word: &str, vocabulary: &Vocabulary) -> Option<Correction> {
        if word.chars().count() < MIN_CORRECTABLE_LEN
            || is_stop_word(word)
            || vocabulary.contains(word)
        {
            return None;
        }

        if let Some(fixed) = self.known_typos.get(word) {
            return Some(Correction {
                original: word.to_string(),
                corrected: fixed.to_string(),
                confidence: KNOWN_MISSPELLING_CONFIDENCE,
                source: CorrectionSource::KnownMisspelling,
            });
        }

        let (best, score) = Self::closest_match(word, vocabulary)?;
        if score <= SIMILARITY_THRESHOLD {
            return None;
        }

        Some(Correction {
            original: word.to_string(),
            corrected: best,
            confidence: score as f32,
            source: CorrectionSource::Vocabulary,
        })
    }

    /// Closest vocabulary term.
    ///
    /// Substring candidates are scored first; similar-length terms are only
    /// considered when no substring candidate scores well.
    pub fn closest_match(word: &str, vocabulary: &Vocabulary) -> Option<(String, f64)> {
        if vocabulary.is_empty() {
            return None;
        }

        let mut best: Option<Candidate<'_>> = None;

        for (term, freq) in vocabulary.iter() {
            if term.contains(word) || word.contains(term) {
                keep_better(&mut best, (term, freq, similarity(word, term)));
            }
        }

        let substring_score = best.map_or(0.0, |(_, _, score)| score);
        if substring_score < SUBSTRING_SCORE_FLOOR {
            let word_len = word.chars().count();
            for (term, freq) in vocabulary.iter() {
                if term.chars().count().abs_diff(word_len) <= MAX_LENGTH_DELTA {
                    keep_better(&mut best, (term, freq, similarity(word, term)));
                }
            }
        }

        best.filter(|(_, _, score)| *score > CANDIDATE_FLOOR)
            .map(|(term, _, score)| (term.to_string(), score))
    }
}

//! TTRPG Search Tables
//!
//! Domain vocabulary kept as data: abbreviations, synonyms, misspellings,
//! stop words and query-shape terms, plus regex table compilation.

pub mod patterns;
pub mod query_expansion;

pub use patterns::{CompiledPattern, PatternTable};
pub use query_expansion::{
    contains_term, is_stop_word, ExpandedTerms, QueryExpander, ABBREVIATIONS, CONCEPTUAL_WORDS,
    MISSPELLINGS, RELEVANT_CONTENT_TYPES, SPECIFIC_TERMS, STAT_KEYWORDS, STOP_WORDS, SYNONYMS,
    VAGUE_TERMS,
};

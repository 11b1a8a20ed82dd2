//! Query Preprocessing
//!
//! Turns a raw user query into the query that is actually searched, plus
//! suggestions the caller can offer the user.
//!
//! # Components
//!
//! - [`dictionary`]: corpus vocabulary with term frequencies
//! - [`typo`]: spelling correction against the vocabulary
//! - [`intent`]: intent templates and alternative phrasings
//! - [`suggestion`]: suggestion types
//! - [`pipeline`]: the ordered processing pipeline

pub mod dictionary;
pub mod intent;
pub mod pipeline;
pub mod suggestion;
pub mod typo;

pub use dictionary::{extract_terms, Vocabulary};
pub use intent::{IntentDetector, IntentKind, IntentMatch};
pub use pipeline::{ProcessedQuery, QueryProcessor};
pub use suggestion::{dedup_suggestions, QuerySuggestion, SuggestionKind};
pub use typo::{Correction, CorrectionSource, SpellCorrector};

//! Property-based tests for the search core
//!
//! Property tests verify invariants that should hold for all inputs, rather
//! than testing specific cases.
//!
//! ## Running Property Tests
//!
//! ```sh
//! cargo test property --release
//! ```
//!
//! ## Test Modules
//!
//! - `tokenizer_props`: tokenization of game text
//!   - Normalising then tokenizing equals tokenizing
//!   - Tokenization never panics and yields lowercase tokens
//!   - Compact and spaced dice notation share their number tokens
//!
//! - `bm25_props`: keyword scoring
//!   - More occurrences at a fixed length never lower the score
//!   - Scores are finite and non-negative
//!   - Normalised scores stay within [0, 1]
//!
//! - `fusion_props`: hybrid fusion and boosting
//!   - Fused and boosted scores stay within [0, 1]
//!   - A document missing from the keyword side scores exactly
//!     `semantic_weight * semantic`
//!   - Ranked output is sorted and respects the threshold
//!
//! By default, proptest runs 256 cases per property. This can be configured
//! via the `PROPTEST_CASES` environment variable.

mod bm25_props;
mod fusion_props;
mod tokenizer_props;

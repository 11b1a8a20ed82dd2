//! Crate-internal test suites
//!
//! - `mocks`: mockall doubles for the vector store and embedding provider,
//!   used to drive retrieval failure paths
//! - `property`: proptest invariants for tokenization, BM25 and fusion

mod mocks;
mod property;

//! Search Module
//!
//! Hybrid rulebook search: BM25 keyword retrieval and vector similarity
//! retrieval fused into one ranked list.
//!
//! # Components
//!
//! - [`models`]: documents, metadata filters and results
//! - [`tokenizer`]: game-notation aware tokenization
//! - [`keyword`]: BM25 index and per-collection index registry
//! - [`embeddings`] / [`vector_store`]: collaborator traits and in-memory
//!   implementations
//! - [`hybrid`]: query expansion, fusion and boosting
//! - [`service`]: orchestration entry point

pub mod embeddings;
pub mod error;
pub mod hybrid;
pub mod keyword;
pub mod models;
pub mod service;
pub mod tokenizer;
pub mod vector_store;

pub use embeddings::{cosine_similarity, EmbeddingError, EmbeddingProvider, HashEmbedder};
pub use error::{Result, RetrievalPath, SearchError};
pub use hybrid::{
    determine_search_config, HybridSearchEngine, QueryAnalysis, QueryIntent, SearchConfig,
};
pub use keyword::{Bm25Params, KeywordIndex, KeywordIndexStore};
pub use models::{
    Document, DocumentMetadata, MatchKind, MetadataFilter, ScoredDocument, SearchContext,
    SearchResult, SourceType,
};
pub use service::{
    SearchExplanation, SearchOptions, SearchResponse, SearchService, SearchStatistics,
    DEFAULT_COLLECTION,
};
pub use vector_store::{InMemoryVectorStore, VectorStore, VectorStoreError};

//! Vector Store Module
//!
//! The two vector-store operations the search core consumes, and an
//! in-memory implementation backed by cosine similarity.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

use super::embeddings::{cosine_similarity, EmbeddingError, EmbeddingProvider};
use super::models::{Document, MetadataFilter, ScoredDocument};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Error, Debug)]
pub enum VectorStoreError {
    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),
}

pub type Result<T> = std::result::Result<T, VectorStoreError>;

// ============================================================================
// Vector Store Trait
// ============================================================================

/// Nearest-neighbour store holding the embedded rulebook chunks
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Return up to `k` documents closest to `query_embedding`, best first.
    ///
    /// Scores are similarities in [0, 1]. An empty filter matches everything.
    async fn vector_search(
        &self,
        collection: &str,
        query_embedding: &[f32],
        k: usize,
        filter: &MetadataFilter,
    ) -> Result<Vec<ScoredDocument>>;

    /// Every document stored in a collection, in storage order
    async fn get_all_documents(&self, collection: &str) -> Result<Vec<Document>>;
}

// ============================================================================
// In-Memory Implementation
// ============================================================================

#[derive(Clone)]
struct StoredDocument {
    document: Document,
    embedding: Vec<f32>,
}

/// Process-local vector store.
///
/// Documents are embedded on upsert with the supplied provider.
pub struct InMemoryVectorStore {
    embedder: Arc<dyn EmbeddingProvider>,
    collections: RwLock<HashMap<String, Vec<StoredDocument>>>,
}

impl InMemoryVectorStore {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            embedder,
            collections: RwLock::new(HashMap::new()),
        }
    }

    /// Insert or replace documents by id. Replaced documents keep their position.
    pub async fn upsert(&self, collection: &str, documents: Vec<Document>) -> Result<usize> {
        let mut prepared = Vec::with_capacity(documents.len());
        for mut document in documents {
            document.collection = collection.to_string();
            let embedding = self.embedder.embed(&document.searchable_text()).await?;
            prepared.push(StoredDocument { document, embedding });
        }

        let count = prepared.len();
        let mut collections = self.collections.write().await;
        let stored = collections.entry(collection.to_string()).or_default();

        for item in prepared {
            match stored.iter_mut().find(|s| s.document.id == item.document.id) {
                Some(existing) => *existing = item,
                None => stored.push(item),
            }
        }

        log::debug!("Upserted {} documents into '{}'", count, collection);
        Ok(count)
    }

    /// Remove a whole collection. Returns true if it existed.
    pub async fn drop_collection(&self, collection: &str) -> bool {
        self.collections.write().await.remove(collection).is_some()
    }

    pub async fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, Vec::len)
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn vector_search(
        &self,
        collection: &str,
        query_embedding: &[f32],
        k: usize,
        filter: &MetadataFilter,
    ) -> Result<Vec<ScoredDocument>> {
        let collections = self.collections.read().await;
        let stored = collections
            .get(collection)
            .ok_or_else(|| VectorStoreError::CollectionNotFound(collection.to_string()))?;

        if let Some(mismatched) = stored
            .iter()
            .find(|s| s.embedding.len() != query_embedding.len())
        {
            return Err(EmbeddingError::DimensionMismatch {
                expected: mismatched.embedding.len(),
                actual: query_embedding.len(),
            }
            .into());
        }

        let mut scored: Vec<ScoredDocument> = stored
            .iter()
            .filter(|s| filter.matches(&s.document))
            .map(|s| ScoredDocument {
                document: s.document.clone(),
                score: cosine_similarity(query_embedding, &s.embedding).clamp(0.0, 1.0),
            })
            .collect();

        // Stable sort keeps storage order for equal similarities
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(k);
        Ok(scored)
    }

    async fn get_all_documents(&self, collection: &str) -> Result<Vec<Document>> {
        let collections = self.collections.read().await;
        collections
            .get(collection)
            .map(|stored| stored.iter().map(|s| s.document.clone()).collect())
            .ok_or_else(|| VectorStoreError::CollectionNotFound(collection.to_string()))
    }
}

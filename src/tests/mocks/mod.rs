//! Mock implementations for testing
//!
//! mockall doubles for the search collaborators, plus a deliberately slow
//! vector store for timeout tests. Used to check that one failing retrieval
//! path degrades to the other and that initialization fetches each
//! collection once.

use async_trait::async_trait;
use mockall::mock;
use std::sync::Arc;
use std::time::Duration;

use crate::config::SearchSettings;
use crate::core::search::embeddings::{self, EmbeddingError, EmbeddingProvider, HashEmbedder};
use crate::core::search::hybrid::{HybridSearchEngine, SearchConfig};
use crate::core::search::keyword::KeywordIndexStore;
use crate::core::search::models::{Document, MatchKind, MetadataFilter, ScoredDocument};
use crate::core::search::service::{SearchOptions, SearchService};
use crate::core::search::vector_store::{self, VectorStore, VectorStoreError};
use crate::core::search::{RetrievalPath, SearchError};

// ============================================================================
// Collaborator Mocks
// ============================================================================

mock! {
    pub VectorStoreClient {}

    #[async_trait]
    impl VectorStore for VectorStoreClient {
        async fn vector_search(
            &self,
            collection: &str,
            query_embedding: &[f32],
            k: usize,
            filter: &MetadataFilter,
        ) -> vector_store::Result<Vec<ScoredDocument>>;

        async fn get_all_documents(&self, collection: &str) -> vector_store::Result<Vec<Document>>;
    }
}

mock! {
    pub Embedder {}

    #[async_trait]
    impl EmbeddingProvider for Embedder {
        async fn embed(&self, text: &str) -> embeddings::Result<Vec<f32>>;
        fn dimensions(&self) -> usize;
        fn name(&self) -> &str;
    }
}

/// Vector store whose similarity search never finishes in time
struct SlowVectorStore {
    documents: Vec<Document>,
    delay: Duration,
}

#[async_trait]
impl VectorStore for SlowVectorStore {
    async fn vector_search(
        &self,
        _collection: &str,
        _query_embedding: &[f32],
        _k: usize,
        _filter: &MetadataFilter,
    ) -> vector_store::Result<Vec<ScoredDocument>> {
        tokio::time::sleep(self.delay).await;
        Ok(Vec::new())
    }

    async fn get_all_documents(&self, _collection: &str) -> vector_store::Result<Vec<Document>> {
        Ok(self.documents.clone())
    }
}

// ============================================================================
// Fixtures
// ============================================================================

fn rulebook() -> Vec<Document> {
    vec![
        Document::new("combat", "Armor class determines how hard it is to hit you")
            .with_title("Combat Rules")
            .with_page(1),
        Document::new("spells", "Casting a spell expends a spell slot")
            .with_title("Spellcasting")
            .with_page(201),
    ]
}

fn engine(
    store: impl VectorStore + 'static,
    embedder: impl EmbeddingProvider + 'static,
) -> HybridSearchEngine {
    HybridSearchEngine::new(
        Arc::new(store),
        Arc::new(embedder),
        Arc::new(KeywordIndexStore::default()),
    )
}

/// Keeps keyword-only hits, which carry at most `keyword_weight` of the score
fn permissive() -> SearchConfig {
    SearchConfig {
        min_score_threshold: 0.0,
        ..Default::default()
    }
}

fn failing_embedder() -> MockEmbedder {
    let mut embedder = MockEmbedder::new();
    embedder.expect_embed().returning(|_| {
        Err(EmbeddingError::ProviderError("connection refused".to_string()))
    });
    embedder
}

// ============================================================================
// Degraded Retrieval
// ============================================================================

#[tokio::test]
async fn test_embedding_failure_falls_back_to_keyword() {
    let mut store = MockVectorStoreClient::new();
    store.expect_vector_search().never();
    store
        .expect_get_all_documents()
        .times(1)
        .returning(|_| Ok(rulebook()));

    let engine = engine(store, failing_embedder());
    let results = engine
        .search(
            "rulebook_index",
            "armor class",
            &permissive(),
            &MetadataFilter::default(),
        )
        .await
        .unwrap();

    assert_eq!(results[0].document.id, "combat");
    assert!(results.iter().all(|r| r.match_kind == MatchKind::Keyword));
}

#[tokio::test]
async fn test_vector_store_failure_on_keyword_path_keeps_semantic() {
    let mut store = MockVectorStoreClient::new();
    store.expect_vector_search().returning(|_, _, _, _| {
        Ok(vec![ScoredDocument {
            document: rulebook().remove(1),
            score: 0.9,
        }])
    });
    store
        .expect_get_all_documents()
        .returning(|collection| Err(VectorStoreError::Backend(format!("{collection} is offline"))));

    let engine = engine(store, HashEmbedder::new(64));
    let results = engine
        .search(
            "rulebook_index",
            "spell slot",
            &SearchConfig::default(),
            &MetadataFilter::default(),
        )
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].document.id, "spells");
    assert_eq!(results[0].match_kind, MatchKind::Semantic);
}

#[tokio::test]
async fn test_both_paths_failing_is_aggregate_error() {
    let mut store = MockVectorStoreClient::new();
    store
        .expect_get_all_documents()
        .returning(|_| Err(VectorStoreError::Backend("disk full".to_string())));

    let engine = engine(store, failing_embedder());
    let err = engine
        .search(
            "rulebook_index",
            "grapple",
            &SearchConfig::default(),
            &MetadataFilter::default(),
        )
        .await
        .unwrap_err();

    match err {
        SearchError::AllRetrievalFailed { semantic, keyword } => {
            assert!(matches!(*semantic, SearchError::EmbeddingUnavailable(_)));
            assert!(matches!(*keyword, SearchError::VectorStoreUnavailable(_)));
        }
        other => panic!("expected aggregate failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_slow_semantic_path_times_out() {
    let store = SlowVectorStore {
        documents: rulebook(),
        delay: Duration::from_secs(5),
    };
    let engine = engine(store, HashEmbedder::new(64))
        .with_retrieval_timeout(Duration::from_millis(50));

    let results = engine
        .search(
            "rulebook_index",
            "armor class",
            &permissive(),
            &MetadataFilter::default(),
        )
        .await
        .unwrap();

    assert_eq!(results[0].document.id, "combat");
    assert_eq!(results[0].match_kind, MatchKind::Keyword);
}

#[tokio::test]
async fn test_slow_semantic_only_search_times_out() {
    let store = SlowVectorStore {
        documents: rulebook(),
        delay: Duration::from_secs(5),
    };
    let settings = SearchSettings {
        retrieval_timeout_ms: 50,
        ..Default::default()
    };
    let service =
        SearchService::new(Arc::new(store), Arc::new(HashEmbedder::new(64)), settings).unwrap();

    let started = std::time::Instant::now();
    let err = service
        .search("armor class", SearchOptions::default().semantic_only())
        .await
        .unwrap_err();

    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(matches!(
        err,
        SearchError::Timeout {
            path: RetrievalPath::Semantic,
            timeout_ms: 50,
        }
    ));
}

#[tokio::test]
async fn test_embedding_with_wrong_dimensions_is_rejected() {
    let mut store = MockVectorStoreClient::new();
    store.expect_vector_search().never();

    let mut embedder = MockEmbedder::new();
    embedder.expect_dimensions().return_const(128usize);
    embedder.expect_embed().returning(|_| Ok(vec![0.5; 64]));

    let engine = engine(store, embedder);
    let err = engine
        .semantic_search("rulebook_index", "grapple", 5, &MetadataFilter::default())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SearchError::EmbeddingUnavailable(EmbeddingError::DimensionMismatch {
            expected: 128,
            actual: 64,
        })
    ));
}

#[test]
fn test_timeout_error_names_path() {
    let err = SearchError::Timeout {
        path: RetrievalPath::Semantic,
        timeout_ms: 50,
    };
    assert_eq!(err.to_string(), "semantic retrieval timed out after 50ms");
    assert!(err.is_retrieval_unavailable());
}

#[tokio::test]
async fn test_invalid_weights_rejected_before_retrieval() {
    let mut store = MockVectorStoreClient::new();
    store.expect_vector_search().never();
    store.expect_get_all_documents().never();

    let mut embedder = MockEmbedder::new();
    embedder.expect_embed().never();

    let engine = engine(store, embedder);
    let err = engine
        .search(
            "rulebook_index",
            "grapple",
            &SearchConfig::with_weights(-1.0, 0.5),
            &MetadataFilter::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, SearchError::ConfigError(_)));
}

// ============================================================================
// Service Initialization
// ============================================================================

#[tokio::test]
async fn test_concurrent_initialize_fetches_once() {
    let mut store = MockVectorStoreClient::new();
    store
        .expect_get_all_documents()
        .times(1)
        .returning(|_| Ok(rulebook()));
    store.expect_vector_search().returning(|_, _, _, _| Ok(Vec::new()));

    let service = SearchService::new(
        Arc::new(store),
        Arc::new(HashEmbedder::new(64)),
        SearchSettings::default(),
    )
    .unwrap();

    tokio::join!(service.initialize(None), service.initialize(None));
    assert!(service.is_initialized());

    // Keyword index is already built, so searching does not refetch
    let response = service
        .search("armor class", SearchOptions::default())
        .await
        .unwrap();
    assert_eq!(response.results[0].document.id, "combat");

    let stats = service.get_statistics().await;
    assert_eq!(stats.total_documents_indexed, 2);
}

#[tokio::test]
async fn test_service_surfaces_aggregate_failure() {
    let mut store = MockVectorStoreClient::new();
    store
        .expect_get_all_documents()
        .returning(|_| Err(VectorStoreError::CollectionNotFound("rulebook_index".to_string())));

    let service = SearchService::new(
        Arc::new(store),
        Arc::new(failing_embedder()),
        SearchSettings::default(),
    )
    .unwrap();

    let err = service
        .search("fireball", SearchOptions::default())
        .await
        .unwrap_err();
    assert!(err.is_retrieval_unavailable());

    // Initialization itself tolerated the missing collection
    assert!(service.is_initialized());
}

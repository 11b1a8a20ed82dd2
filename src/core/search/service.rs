//! Search Orchestration Service
//!
//! Top-level entry point for rulebook search. Owns the corpus vocabulary and
//! the keyword indexes, routes queries through the query processor and the
//! hybrid engine, and offers quick search, completions, result explanations
//! and statistics.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use super::embeddings::EmbeddingProvider;
use super::error::{Result, RetrievalPath, SearchError};
use super::hybrid::{determine_search_config, HybridSearchEngine};
use super::keyword::KeywordIndexStore;
use super::models::{
    MatchKind, MetadataFilter, SearchContext, SearchResult, SourceType,
};
use super::vector_store::VectorStore;
use crate::config::SearchSettings;
use crate::core::preprocess::{
    dedup_suggestions, extract_terms, QueryProcessor, QuerySuggestion, Vocabulary,
};
use crate::core::ttrpg_search::RELEVANT_CONTENT_TYPES;

/// Collection searched when neither the caller nor the settings name one
pub const DEFAULT_COLLECTION: &str = "rulebook_index";

/// Minimum partial-query length for completions
const MIN_COMPLETION_LEN: usize = 2;
/// Results analysed individually by `explain_search_results`
const EXPLAINED_RESULTS: usize = 3;
const HIGH_SCORE: f32 = 0.7;
const MEDIUM_SCORE: f32 = 0.4;

// ============================================================================
// Request / Response Types
// ============================================================================

/// Optional parameters for [`SearchService::search`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    /// Collection to search; defaults to the first configured collection
    pub collection: Option<String>,
    pub rulebook: Option<String>,
    pub source_type: Option<SourceType>,
    pub content_type: Option<String>,
    /// Defaults to `SearchSettings::default_max_results`
    pub max_results: Option<usize>,
    pub context: Option<SearchContext>,
    /// Semantic-only search when false
    pub use_hybrid: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            collection: None,
            rulebook: None,
            source_type: None,
            content_type: None,
            max_results: None,
            context: None,
            use_hybrid: true,
        }
    }
}

impl SearchOptions {
    pub fn in_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    pub fn with_rulebook(mut self, rulebook: impl Into<String>) -> Self {
        self.rulebook = Some(rulebook.into());
        self
    }

    pub fn with_source_type(mut self, source_type: SourceType) -> Self {
        self.source_type = Some(source_type);
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = Some(max_results);
        self
    }

    pub fn with_context(mut self, context: SearchContext) -> Self {
        self.context = Some(context);
        self
    }

    pub fn semantic_only(mut self) -> Self {
        self.use_hybrid = false;
        self
    }

    /// Exact-match filter built from the optional metadata fields
    pub fn filter(&self) -> MetadataFilter {
        MetadataFilter {
            rulebook: self.rulebook.clone(),
            system: None,
            source_type: self.source_type,
            content_type: self.content_type.clone(),
        }
    }
}

/// Results plus suggestions for one query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
    pub suggestions: Vec<QuerySuggestion>,
}

/// Why one result ranked where it did
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultAnalysis {
    pub rank: usize,
    pub title: String,
    pub score: f32,
    pub match_kind: MatchKind,
    pub relevance_factors: Vec<String>,
}

/// Count of results per score bucket
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreDistribution {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

/// Human-readable account of a result set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchExplanation {
    pub original_query: String,
    pub processed_query: String,
    pub search_strategy: String,
    pub total_results: usize,
    pub results_analysis: Vec<ResultAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_score: Option<f32>,
    pub score_distribution: ScoreDistribution,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStatistics {
    pub initialized: bool,
    pub vocabulary_size: usize,
    pub indexed_collections: Vec<String>,
    pub total_documents_indexed: usize,
}

// ============================================================================
// Search Service
// ============================================================================

/// Search orchestration over one vector store.
///
/// Vocabulary and keyword indexes are built once by [`initialize`] (or on the
/// first search) and are read-mostly afterwards.
///
/// [`initialize`]: SearchService::initialize
pub struct SearchService {
    engine: HybridSearchEngine,
    processor: QueryProcessor,
    vocabulary: RwLock<Vocabulary>,
    keyword_indexes: Arc<KeywordIndexStore>,
    vector_store: Arc<dyn VectorStore>,
    settings: SearchSettings,
    initialized: AtomicBool,
    init_lock: Mutex<()>,
}

impl SearchService {
    pub fn new(
        vector_store: Arc<dyn VectorStore>,
        embedding_provider: Arc<dyn EmbeddingProvider>,
        settings: SearchSettings,
    ) -> Result<Self> {
        settings.validate()?;

        let keyword_indexes = Arc::new(KeywordIndexStore::new(settings.bm25_params()));
        let engine = HybridSearchEngine::new(
            Arc::clone(&vector_store),
            embedding_provider,
            Arc::clone(&keyword_indexes),
        )
        .with_retrieval_timeout(settings.retrieval_timeout())
        .with_keyword_score_cap(settings.keyword_score_cap);

        let service = Self {
            engine,
            processor: QueryProcessor::new(),
            vocabulary: RwLock::new(Vocabulary::new()),
            keyword_indexes,
            vector_store,
            settings,
            initialized: AtomicBool::new(false),
            init_lock: Mutex::new(()),
        };

        let pattern_errors = service.pattern_errors();
        if !pattern_errors.is_empty() {
            log::warn!(
                "Search service started with {} invalid patterns skipped",
                pattern_errors.len()
            );
        }

        Ok(service)
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Every pattern that failed to compile across all tables
    pub fn pattern_errors(&self) -> Vec<&SearchError> {
        let mut errors = self.processor.pattern_errors();
        errors.extend(self.engine.pattern_errors());
        errors
    }

    /// Build the vocabulary and keyword indexes for the given collections
    /// (or the configured defaults). Runs once; later calls are no-ops.
    ///
    /// A collection that cannot be fetched is logged and skipped; its
    /// keyword index will be built lazily on first search.
    pub async fn initialize(&self, collections: Option<&[String]>) {
        if self.is_initialized() {
            return;
        }

        let _guard = self.init_lock.lock().await;
        if self.is_initialized() {
            return;
        }

        let names: Vec<String> = match collections {
            Some(names) => names.to_vec(),
            None => self.settings.default_collections.clone(),
        };

        let mut vocabulary = Vocabulary::new();
        for name in &names {
            match self.vector_store.get_all_documents(name).await {
                Ok(documents) => {
                    vocabulary.add_documents(&documents);
                    self.keyword_indexes.build(name, documents).await;
                }
                Err(e) => {
                    log::warn!("Skipping collection '{}' during initialization: {}", name, e);
                }
            }
        }

        let vocabulary_size = vocabulary.len();
        *self.vocabulary.write().await = vocabulary;
        self.initialized.store(true, Ordering::Release);

        log::info!(
            "Search service initialized: {} collections, vocabulary of {} terms",
            names.len(),
            vocabulary_size
        );
    }

    /// Rebuild one collection's keyword index and add its terms to the vocabulary
    pub async fn index_collection(&self, collection: &str) -> Result<usize> {
        let documents = self.vector_store.get_all_documents(collection).await?;
        let count = documents.len();

        self.vocabulary.write().await.add_documents(&documents);
        self.keyword_indexes.build(collection, documents).await;
        Ok(count)
    }

    /// Drop a collection's keyword index; the next search rebuilds it
    pub async fn invalidate(&self, collection: &str) -> bool {
        self.keyword_indexes.invalidate(collection).await
    }

    fn collection_for<'a>(&'a self, requested: Option<&'a str>) -> &'a str {
        requested
            .or_else(|| self.settings.default_collections.first().map(String::as_str))
            .unwrap_or(DEFAULT_COLLECTION)
    }

    /// Process, search and suggest
    pub async fn search(&self, query: &str, options: SearchOptions) -> Result<SearchResponse> {
        self.initialize(None).await;

        let processed = {
            let vocabulary = self.vocabulary.read().await;
            self.processor
                .process(query, options.context.as_ref(), &vocabulary)
        };

        let collection = self.collection_for(options.collection.as_deref());
        let filter = options.filter();
        let max_results = options
            .max_results
            .unwrap_or(self.settings.default_max_results);

        let mut results = if options.use_hybrid {
            let config = determine_search_config(&processed.processed, options.context.as_ref());
            self.engine
                .search(collection, &processed.processed, &config, &filter)
                .await?
        } else {
            self.semantic_only(collection, &processed.processed, max_results, &filter)
                .await?
        };
        results.truncate(max_results);

        let mut suggestions = processed.suggestions;
        suggestions.extend(self.processor.suggest_related(query, &results));
        let suggestions = dedup_suggestions(suggestions);

        log::info!(
            "Search for '{}' returned {} results with {} suggestions",
            query,
            results.len(),
            suggestions.len()
        );

        Ok(SearchResponse {
            results,
            suggestions,
        })
    }

    async fn semantic_only(
        &self,
        collection: &str,
        query: &str,
        k: usize,
        filter: &MetadataFilter,
    ) -> Result<Vec<SearchResult>> {
        let hits = self
            .engine
            .bounded(
                RetrievalPath::Semantic,
                self.engine.semantic_search(collection, query, k, filter),
            )
            .await?;
        Ok(hits
            .into_iter()
            .map(|hit| {
                SearchResult::new(hit.document, hit.score.clamp(0.0, 1.0), MatchKind::Semantic)
            })
            .collect())
    }

    /// Hybrid search with an auto-tuned config and no query processing
    pub async fn quick_search(
        &self,
        query: &str,
        max_results: Option<usize>,
    ) -> Result<Vec<SearchResult>> {
        self.initialize(None).await;

        let collection = self.collection_for(None);
        let mut results = self
            .engine
            .smart_search(collection, query, None, &MetadataFilter::default())
            .await?;
        results.truncate(max_results.unwrap_or(self.settings.quick_search_max_results));
        Ok(results)
    }

    /// Vocabulary terms and abbreviations that complete a partial query
    pub async fn suggest_completions(&self, partial_query: &str, limit: usize) -> Vec<String> {
        let partial = partial_query.trim().to_lowercase();
        if partial.chars().count() < MIN_COMPLETION_LEN || limit == 0 {
            return Vec::new();
        }

        self.initialize(None).await;

        let mut completions = self.vocabulary.read().await.terms_with_prefix(&partial, limit);

        for (abbrev, expansion) in self.processor.abbreviations() {
            let candidate = if abbrev.starts_with(&partial) {
                *expansion
            } else if expansion.starts_with(&partial) {
                *abbrev
            } else {
                continue;
            };
            if !completions.iter().any(|c| c == candidate) {
                completions.push(candidate.to_string());
            }
        }

        completions.truncate(limit);
        completions
    }

    /// Explain how a result set relates to its query
    pub async fn explain_search_results(
        &self,
        query: &str,
        results: &[SearchResult],
    ) -> SearchExplanation {
        let processed = {
            let vocabulary = self.vocabulary.read().await;
            self.processor.process(query, None, &vocabulary)
        };
        let config = determine_search_config(&processed.processed, None);
        let search_strategy = format!(
            "hybrid (semantic {:.1}, keyword {:.1})",
            config.semantic_weight, config.keyword_weight
        );

        if results.is_empty() {
            return SearchExplanation {
                original_query: query.to_string(),
                processed_query: processed.processed,
                search_strategy,
                total_results: 0,
                results_analysis: Vec::new(),
                average_score: None,
                score_distribution: ScoreDistribution::default(),
                message: Some(
                    "No results found. Try a broader search or different terms.".to_string(),
                ),
            };
        }

        let query_terms = extract_terms(&processed.processed);
        let results_analysis = results
            .iter()
            .take(EXPLAINED_RESULTS)
            .enumerate()
            .map(|(i, result)| ResultAnalysis {
                rank: i + 1,
                title: result.title().to_string(),
                score: result.relevance_score,
                match_kind: result.match_kind,
                relevance_factors: relevance_factors(&query_terms, result),
            })
            .collect();

        let mut score_distribution = ScoreDistribution::default();
        for result in results {
            if result.relevance_score >= HIGH_SCORE {
                score_distribution.high += 1;
            } else if result.relevance_score >= MEDIUM_SCORE {
                score_distribution.medium += 1;
            } else {
                score_distribution.low += 1;
            }
        }

        let total: f32 = results.iter().map(|r| r.relevance_score).sum();

        SearchExplanation {
            original_query: query.to_string(),
            processed_query: processed.processed,
            search_strategy,
            total_results: results.len(),
            results_analysis,
            average_score: Some(total / results.len() as f32),
            score_distribution,
            message: None,
        }
    }

    pub async fn get_statistics(&self) -> SearchStatistics {
        SearchStatistics {
            initialized: self.is_initialized(),
            vocabulary_size: self.vocabulary.read().await.len(),
            indexed_collections: self.keyword_indexes.collections().await,
            total_documents_indexed: self.keyword_indexes.total_documents().await,
        }
    }
}

fn relevance_factors(query_terms: &[String], result: &SearchResult) -> Vec<String> {
    let mut factors = Vec::new();
    let metadata = &result.document.metadata;

    let title = metadata.title_or_empty().to_lowercase();
    let mut in_title: Vec<&str> = Vec::new();
    for term in query_terms {
        if title.contains(term.as_str()) && !in_title.contains(&term.as_str()) {
            in_title.push(term);
        }
    }
    if !in_title.is_empty() {
        factors.push(format!("Title contains: {}", in_title.join(", ")));
    }

    let content_type = metadata.content_type_or_empty();
    if RELEVANT_CONTENT_TYPES.contains(&content_type) {
        factors.push(format!("Relevant content type: {}", content_type));
    }

    match (metadata.rulebook.as_deref(), metadata.system.as_deref()) {
        (Some(rulebook), Some(system)) => factors.push(format!("From {} ({})", rulebook, system)),
        (Some(rulebook), None) => factors.push(format!("From {}", rulebook)),
        (None, Some(system)) => factors.push(format!("From {}", system)),
        (None, None) => {}
    }

    factors
}

// ============================================================================
// Tests
// ============================================================================

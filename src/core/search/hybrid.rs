//! Hybrid Search Engine
//!
//! Combines BM25 keyword search and vector similarity search with a weighted
//! score fusion followed by intent and context boosts.
//!
//! # Pipeline
//!
//! 1. **Query expansion**: detect a coarse intent and append domain synonyms
//!    to the keyword token stream (the semantic query text is left alone)
//! 2. **Parallel retrieval**: semantic and keyword passes run concurrently,
//!    each bounded by a timeout
//! 3. **Fusion**: candidates are unioned by document id and scored as
//!    `semantic_weight * semantic + keyword_weight * keyword`
//! 4. **Boosting**: intent, title and page boosts, capped at 1.0
//! 5. **Ranking**: threshold, stable sort, truncate
//!
//! A failing retrieval path degrades to the other one; only when both fail
//! does the search fail.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use super::embeddings::{EmbeddingError, EmbeddingProvider};
use super::error::{Result, RetrievalPath, SearchError};
use super::keyword::{normalize_score, KeywordIndexStore, DEFAULT_SCORE_CAP};
use super::models::{
    Document, MatchKind, MetadataFilter, ScoredDocument, SearchContext, SearchResult,
};
use super::tokenizer;
use super::vector_store::VectorStore;
use crate::core::ttrpg_search::{
    contains_term, PatternTable, QueryExpander, CONCEPTUAL_WORDS, SPECIFIC_TERMS, STAT_KEYWORDS,
};

/// Default per-path retrieval timeout
pub const DEFAULT_RETRIEVAL_TIMEOUT: Duration = Duration::from_secs(10);

// ============================================================================
// Configuration
// ============================================================================

/// Per-query fusion configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Weight for semantic scores
    #[serde(default = "default_semantic_weight")]
    pub semantic_weight: f32,

    /// Weight for normalised keyword scores
    #[serde(default = "default_keyword_weight")]
    pub keyword_weight: f32,

    /// Results scoring below this are dropped
    #[serde(default = "default_min_score")]
    pub min_score_threshold: f32,

    /// Candidates fetched per path, and results returned
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Apply intent/title/page boosts after fusion
    #[serde(default = "default_true")]
    pub enable_reranking: bool,
}

fn default_semantic_weight() -> f32 {
    0.7
}

fn default_keyword_weight() -> f32 {
    0.3
}

fn default_min_score() -> f32 {
    0.1
}

fn default_max_results() -> usize {
    50
}

fn default_true() -> bool {
    true
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            semantic_weight: default_semantic_weight(),
            keyword_weight: default_keyword_weight(),
            min_score_threshold: default_min_score(),
            max_results: default_max_results(),
            enable_reranking: true,
        }
    }
}

impl SearchConfig {
    /// Config with the given (semantic, keyword) weights and default limits
    pub fn with_weights(semantic_weight: f32, keyword_weight: f32) -> Self {
        Self {
            semantic_weight,
            keyword_weight,
            ..Default::default()
        }
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    /// Weights must be finite and non-negative
    pub fn validate(&self) -> Result<()> {
        for (name, weight) in [
            ("semantic_weight", self.semantic_weight),
            ("keyword_weight", self.keyword_weight),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(SearchError::ConfigError(format!(
                    "{} must be a non-negative number, got {}",
                    name, weight
                )));
            }
        }
        Ok(())
    }
}

/// Pick fusion weights from the shape of the query.
///
/// Rules are checked in order and the first that applies wins:
/// short queries lean on keywords, notation terms split evenly, conceptual
/// questions lean on semantics, everything else uses the defaults.
pub fn determine_search_config(query: &str, context: Option<&SearchContext>) -> SearchConfig {
    let lowered = query.to_lowercase();
    let words: Vec<&str> = lowered
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|w| !w.is_empty())
        .collect();

    let (semantic_weight, keyword_weight) = if words.len() <= 3 {
        (0.4, 0.6)
    } else if SPECIFIC_TERMS.iter().any(|term| contains_term(&words, term)) {
        (0.5, 0.5)
    } else if CONCEPTUAL_WORDS.iter().any(|word| contains_term(&words, word)) {
        (0.8, 0.2)
    } else {
        (default_semantic_weight(), default_keyword_weight())
    };

    let mut config = SearchConfig::with_weights(semantic_weight, keyword_weight);
    if context.is_some_and(|c| c.current_rulebook.is_some()) {
        // Focused on one book: fewer, tighter results
        config.max_results = 20;
    }
    config
}

// ============================================================================
// Query Analysis
// ============================================================================

/// Coarse intent used for boosting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryIntent {
    General,
    Instruction,
    Definition,
    Rules,
    Stats,
    List,
    DiceMechanics,
}

impl QueryIntent {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryIntent::General => "general",
            QueryIntent::Instruction => "instruction",
            QueryIntent::Definition => "definition",
            QueryIntent::Rules => "rules",
            QueryIntent::Stats => "stats",
            QueryIntent::List => "list",
            QueryIntent::DiceMechanics => "dice_mechanics",
        }
    }
}

impl fmt::Display for QueryIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Intent patterns, checked in order
const QUERY_INTENT_PATTERNS: &[(QueryIntent, &str)] = &[
    (QueryIntent::Instruction, r"how\s+(?:do|does|can)\s+i\s+(\w+)"),
    (QueryIntent::Definition, r"what\s+(?:is|are)\s+(?:the\s+)?(\w+)"),
    (QueryIntent::Rules, r"(\w+)\s+(?:rules?|mechanics?)"),
    (QueryIntent::Stats, r"(\w+)\s+(?:stats?|statistics?)"),
    (QueryIntent::List, r"list\s+(?:of\s+)?(\w+)"),
    (QueryIntent::DiceMechanics, r"(\d+d\d+|\d+\+\d+)"),
];

/// What query expansion learned about the query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryAnalysis {
    pub intent: QueryIntent,
    /// Query words that carry synonyms; boosted when found in titles
    pub focus_terms: Vec<String>,
}

impl Default for QueryAnalysis {
    fn default() -> Self {
        Self {
            intent: QueryIntent::General,
            focus_terms: Vec::new(),
        }
    }
}

/// Keyword tokens plus analysis
#[derive(Debug, Clone)]
pub struct ExpandedQuery {
    /// Tokenized query followed by synonyms
    pub tokens: Vec<String>,
    pub analysis: QueryAnalysis,
}

// ============================================================================
// Fusion and Boosting
// ============================================================================

struct Candidate {
    document: Document,
    semantic: Option<f32>,
    keyword: Option<f32>,
}

/// Union both candidate lists by id and compute weighted, optionally boosted
/// scores. Order is first-seen, semantic results first.
pub fn fuse(
    semantic: Vec<ScoredDocument>,
    keyword: Vec<ScoredDocument>,
    config: &SearchConfig,
    analysis: &QueryAnalysis,
) -> Vec<SearchResult> {
    let mut candidates: IndexMap<String, Candidate> = IndexMap::new();

    for hit in semantic {
        candidates
            .entry(hit.document.id.clone())
            .or_insert(Candidate {
                document: hit.document,
                semantic: Some(hit.score),
                keyword: None,
            });
    }

    for hit in keyword {
        match candidates.get_mut(&hit.document.id) {
            Some(candidate) => {
                if candidate.keyword.is_none() {
                    candidate.keyword = Some(hit.score);
                }
            }
            None => {
                candidates.insert(
                    hit.document.id.clone(),
                    Candidate {
                        document: hit.document,
                        semantic: None,
                        keyword: Some(hit.score),
                    },
                );
            }
        }
    }

    candidates
        .into_values()
        .map(|candidate| {
            let combined = config.semantic_weight * candidate.semantic.unwrap_or(0.0)
                + config.keyword_weight * candidate.keyword.unwrap_or(0.0);
            let score = if config.enable_reranking {
                apply_boosts(combined, &candidate.document, analysis)
            } else {
                combined
            };

            let match_kind = match (candidate.semantic, candidate.keyword) {
                (Some(_), Some(_)) => MatchKind::Hybrid,
                (None, Some(_)) => MatchKind::Keyword,
                _ => MatchKind::Semantic,
            };

            SearchResult::new(candidate.document, score.clamp(0.0, 1.0), match_kind)
        })
        .collect()
}

/// Multiply a fused score by intent, title and page boosts; capped at 1.0
pub fn apply_boosts(score: f32, document: &Document, analysis: &QueryAnalysis) -> f32 {
    let title = document.metadata.title_or_empty().to_lowercase();
    let mut boosted = score;

    match analysis.intent {
        QueryIntent::Rules if title.contains("rule") => boosted *= 1.2,
        QueryIntent::Stats if has_stat_keyword(&document.text) => boosted *= 1.2,
        QueryIntent::Definition if document.metadata.content_type_or_empty() == "definition" => {
            boosted *= 1.3
        }
        _ => {}
    }

    for term in &analysis.focus_terms {
        if title.contains(term.as_str()) {
            boosted *= 1.1;
        }
    }

    // Early pages usually hold the core rules
    if matches!(document.metadata.page_number, Some(page) if page <= 50) {
        boosted *= 1.05;
    }

    boosted.min(1.0)
}

fn has_stat_keyword(text: &str) -> bool {
    tokenizer::unigrams(text)
        .iter()
        .any(|word| STAT_KEYWORDS.contains(&word.as_str()))
}

/// Drop results under the threshold, sort best first (stable) and truncate
pub fn rank(mut results: Vec<SearchResult>, config: &SearchConfig) -> Vec<SearchResult> {
    results.retain(|r| r.relevance_score >= config.min_score_threshold);
    results.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));
    results.truncate(config.max_results);
    results
}

// ============================================================================
// Hybrid Search Engine
// ============================================================================

/// Hybrid search engine combining keyword and semantic search
pub struct HybridSearchEngine {
    vector_store: Arc<dyn VectorStore>,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    keyword_indexes: Arc<KeywordIndexStore>,
    query_expander: QueryExpander,
    intent_patterns: PatternTable<QueryIntent>,
    retrieval_timeout: Duration,
    keyword_score_cap: f32,
}

impl HybridSearchEngine {
    /// Create a new hybrid search engine
    pub fn new(
        vector_store: Arc<dyn VectorStore>,
        embedding_provider: Arc<dyn EmbeddingProvider>,
        keyword_indexes: Arc<KeywordIndexStore>,
    ) -> Self {
        Self {
            vector_store,
            embedding_provider,
            keyword_indexes,
            query_expander: QueryExpander::new(),
            intent_patterns: PatternTable::compile(
                "query intent",
                QUERY_INTENT_PATTERNS.iter().copied(),
            ),
            retrieval_timeout: DEFAULT_RETRIEVAL_TIMEOUT,
            keyword_score_cap: DEFAULT_SCORE_CAP,
        }
    }

    pub fn with_retrieval_timeout(mut self, timeout: Duration) -> Self {
        self.retrieval_timeout = timeout;
        self
    }

    pub fn with_keyword_score_cap(mut self, cap: f32) -> Self {
        self.keyword_score_cap = cap;
        self
    }

    /// Intent patterns that failed to compile
    pub fn pattern_errors(&self) -> &[SearchError] {
        self.intent_patterns.errors()
    }

    /// Detect intent and build the keyword token stream with synonyms
    pub fn expand_query(&self, query: &str) -> ExpandedQuery {
        let intent = self
            .intent_patterns
            .first_match(query)
            .unwrap_or(QueryIntent::General);

        let mut tokens = tokenizer::tokenize(query);
        let expansion = self.query_expander.expand_words(&tokenizer::unigrams(query));
        tokens.extend(expansion.synonyms);

        log::debug!(
            "Expanded query '{}' to {} tokens (intent: {}, focus: {:?})",
            query,
            tokens.len(),
            intent,
            expansion.focus_terms
        );

        ExpandedQuery {
            tokens,
            analysis: QueryAnalysis {
                intent,
                focus_terms: expansion.focus_terms,
            },
        }
    }

    /// Perform hybrid search with weighted fusion
    pub async fn search(
        &self,
        collection: &str,
        query: &str,
        config: &SearchConfig,
        filter: &MetadataFilter,
    ) -> Result<Vec<SearchResult>> {
        config.validate()?;
        let expanded = self.expand_query(query);
        let k = config.max_results;

        let (semantic, keyword) = tokio::join!(
            self.bounded(
                RetrievalPath::Semantic,
                self.semantic_search(collection, query, k, filter)
            ),
            self.bounded(
                RetrievalPath::Keyword,
                self.keyword_search(collection, &expanded.tokens, k, filter)
            ),
        );

        let (semantic, keyword) = match (semantic, keyword) {
            (Ok(semantic), Ok(keyword)) => (semantic, keyword),
            (Ok(semantic), Err(e)) => {
                log::warn!("Keyword retrieval failed for '{}', using semantic only: {}", query, e);
                (semantic, Vec::new())
            }
            (Err(e), Ok(keyword)) => {
                log::warn!("Semantic retrieval failed for '{}', using keyword only: {}", query, e);
                (Vec::new(), keyword)
            }
            (Err(semantic), Err(keyword)) => {
                return Err(SearchError::AllRetrievalFailed {
                    semantic: Box::new(semantic),
                    keyword: Box::new(keyword),
                });
            }
        };

        let results = rank(fuse(semantic, keyword, config, &expanded.analysis), config);
        log::info!("Hybrid search for '{}' returned {} results", query, results.len());
        Ok(results)
    }

    /// Hybrid search with a configuration chosen from the query itself
    pub async fn smart_search(
        &self,
        collection: &str,
        query: &str,
        context: Option<&SearchContext>,
        filter: &MetadataFilter,
    ) -> Result<Vec<SearchResult>> {
        let config = determine_search_config(query, context);
        self.search(collection, query, &config, filter).await
    }

    /// Embed the query and ask the vector store for its nearest neighbours
    pub async fn semantic_search(
        &self,
        collection: &str,
        query: &str,
        k: usize,
        filter: &MetadataFilter,
    ) -> Result<Vec<ScoredDocument>> {
        let embedding = self.embedding_provider.embed(query).await?;
        let expected = self.embedding_provider.dimensions();
        if embedding.len() != expected {
            return Err(EmbeddingError::DimensionMismatch {
                expected,
                actual: embedding.len(),
            }
            .into());
        }
        let hits = self
            .vector_store
            .vector_search(collection, &embedding, k, filter)
            .await?;
        Ok(hits)
    }

    /// BM25 search over expanded tokens, scores normalised into [0, 1]
    pub async fn keyword_search(
        &self,
        collection: &str,
        tokens: &[String],
        k: usize,
        filter: &MetadataFilter,
    ) -> Result<Vec<ScoredDocument>> {
        let hits = self
            .keyword_indexes
            .search(collection, tokens, k, filter, self.vector_store.as_ref())
            .await?;

        Ok(hits
            .into_iter()
            .map(|hit| ScoredDocument {
                document: hit.document,
                score: normalize_score(hit.score, self.keyword_score_cap),
            })
            .collect())
    }

    /// Run a retrieval future under the per-path timeout
    pub(crate) async fn bounded<T, F>(&self, path: RetrievalPath, future: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.retrieval_timeout, future).await {
            Ok(result) => result,
            Err(_) => Err(SearchError::Timeout {
                path,
                timeout_ms: self.retrieval_timeout.as_millis() as u64,
            }),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Keyword Search (BM25)
//!
//! Per-collection lexical index over tokenized `title + body` text.
//!
//! Scoring is Okapi BM25 with the non-negative IDF variant
//! `ln(1 + (N - df + 0.5) / (df + 0.5))`, so a term shared by every document
//! still contributes a small positive weight and single-document collections
//! remain searchable.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use super::models::{Document, MetadataFilter};
use super::tokenizer;
use super::vector_store::{VectorStore, VectorStoreError};

/// Default term-frequency saturation
pub const DEFAULT_K1: f32 = 1.5;
/// Default document-length normalisation strength
pub const DEFAULT_B: f32 = 0.75;
/// Raw BM25 score that maps to a normalised score of 1.0
pub const DEFAULT_SCORE_CAP: f32 = 10.0;

/// BM25 tuning parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25Params {
    pub k1: f32,
    pub b: f32,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self {
            k1: DEFAULT_K1,
            b: DEFAULT_B,
        }
    }
}

/// Map an unbounded BM25 score into [0, 1]. Monotonic, and 0 maps to 0.
pub fn normalize_score(raw: f32, cap: f32) -> f32 {
    if raw <= 0.0 || cap <= 0.0 {
        return 0.0;
    }
    (raw / cap).min(1.0)
}

#[derive(Debug, Clone, Copy)]
struct Posting {
    doc: u32,
    tf: u32,
}

// ============================================================================
// Keyword Index
// ============================================================================

/// Immutable BM25 index for one collection
#[derive(Debug)]
pub struct KeywordIndex {
    documents: Vec<Document>,
    postings: HashMap<String, Vec<Posting>>,
    doc_lengths: Vec<u32>,
    avg_doc_length: f32,
    params: Bm25Params,
}

impl KeywordIndex {
    /// Tokenize every document's searchable text and build the index
    pub fn build(documents: Vec<Document>, params: Bm25Params) -> Self {
        let token_lists: Vec<Vec<String>> = documents
            .iter()
            .map(|doc| tokenizer::tokenize(&doc.searchable_text()))
            .collect();
        Self::from_tokens(documents, token_lists, params)
    }

    fn from_tokens(
        documents: Vec<Document>,
        token_lists: Vec<Vec<String>>,
        params: Bm25Params,
    ) -> Self {
        let mut postings: HashMap<String, Vec<Posting>> = HashMap::new();
        let mut doc_lengths = Vec::with_capacity(token_lists.len());

        for (doc_idx, tokens) in token_lists.iter().enumerate() {
            doc_lengths.push(tokens.len() as u32);

            let mut frequencies: HashMap<&str, u32> = HashMap::new();
            for token in tokens {
                *frequencies.entry(token.as_str()).or_insert(0) += 1;
            }
            for (term, tf) in frequencies {
                postings.entry(term.to_string()).or_default().push(Posting {
                    doc: doc_idx as u32,
                    tf,
                });
            }
        }

        let total_length: u64 = doc_lengths.iter().map(|&l| u64::from(l)).sum();
        let avg_doc_length = if doc_lengths.is_empty() {
            0.0
        } else {
            total_length as f32 / doc_lengths.len() as f32
        };

        Self {
            documents,
            postings,
            doc_lengths,
            avg_doc_length,
            params,
        }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn document(&self, index: usize) -> Option<&Document> {
        self.documents.get(index)
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn avg_doc_length(&self) -> f32 {
        self.avg_doc_length
    }

    /// Number of distinct terms
    pub fn term_count(&self) -> usize {
        self.postings.len()
    }

    fn idf(&self, doc_freq: usize) -> f32 {
        let n = self.documents.len() as f32;
        let df = doc_freq as f32;
        (1.0 + (n - df + 0.5) / (df + 0.5)).ln()
    }

    /// Score every document against the query terms.
    ///
    /// Repeated query terms are counted once.
    pub fn scores(&self, query_tokens: &[String]) -> Vec<f32> {
        let mut scores = vec![0.0f32; self.documents.len()];
        let Bm25Params { k1, b } = self.params;
        let mut seen = HashSet::new();

        for term in query_tokens {
            if !seen.insert(term.as_str()) {
                continue;
            }
            let Some(postings) = self.postings.get(term) else {
                continue;
            };

            let idf = self.idf(postings.len());
            for posting in postings {
                let doc = posting.doc as usize;
                let tf = posting.tf as f32;
                let length_ratio = if self.avg_doc_length > 0.0 {
                    self.doc_lengths[doc] as f32 / self.avg_doc_length
                } else {
                    1.0
                };
                let denominator = tf + k1 * (1.0 - b + b * length_ratio);
                scores[doc] += idf * tf * (k1 + 1.0) / denominator;
            }
        }

        scores
    }

    /// Top-`k` documents by descending raw BM25 score.
    ///
    /// Documents matching no query term are excluded; ties keep index order.
    pub fn search(&self, query_tokens: &[String], k: usize) -> Vec<(usize, f32)> {
        self.search_where(query_tokens, k, |_| true)
    }

    /// Like [`search`](Self::search), restricted to documents accepted by `keep`
    pub fn search_where<F>(&self, query_tokens: &[String], k: usize, keep: F) -> Vec<(usize, f32)>
    where
        F: Fn(&Document) -> bool,
    {
        let mut ranked: Vec<(usize, f32)> = self
            .scores(query_tokens)
            .into_iter()
            .enumerate()
            .filter(|(idx, score)| *score > 0.0 && keep(&self.documents[*idx]))
            .collect();

        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(k);
        ranked
    }
}

// ============================================================================
// Keyword Index Store
// ============================================================================

/// A keyword hit resolved back to its document
#[derive(Debug, Clone)]
pub struct KeywordHit {
    pub document: Document,
    /// Raw, unnormalised BM25 score
    pub score: f32,
}

/// Registry of per-collection keyword indexes.
///
/// Indexes are built once and then shared read-only through `Arc`. Builds are
/// serialized per collection, so a lazily requested collection is fetched at
/// most once without holding up builds of other collections.
pub struct KeywordIndexStore {
    indexes: RwLock<HashMap<String, Arc<KeywordIndex>>>,
    build_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    params: Bm25Params,
}

impl Default for KeywordIndexStore {
    fn default() -> Self {
        Self::new(Bm25Params::default())
    }
}

impl KeywordIndexStore {
    pub fn new(params: Bm25Params) -> Self {
        Self {
            indexes: RwLock::new(HashMap::new()),
            build_locks: Mutex::new(HashMap::new()),
            params,
        }
    }

    /// Build (or fully replace) a collection's index from documents
    pub async fn build(&self, collection: &str, documents: Vec<Document>) -> Arc<KeywordIndex> {
        let lock = self.build_lock(collection).await;
        let _guard = lock.lock().await;
        self.build_locked(collection, documents).await
    }

    async fn build_lock(&self, collection: &str) -> Arc<Mutex<()>> {
        let mut locks = self.build_locks.lock().await;
        Arc::clone(locks.entry(collection.to_string()).or_default())
    }

    async fn build_locked(&self, collection: &str, documents: Vec<Document>) -> Arc<KeywordIndex> {
        let count = documents.len();
        let index = Arc::new(KeywordIndex::build(documents, self.params));
        self.indexes
            .write()
            .await
            .insert(collection.to_string(), Arc::clone(&index));

        log::info!(
            "Built BM25 index for collection '{}' with {} documents ({} terms)",
            collection,
            count,
            index.term_count()
        );
        index
    }

    pub async fn get(&self, collection: &str) -> Option<Arc<KeywordIndex>> {
        self.indexes.read().await.get(collection).cloned()
    }

    /// Return the collection's index, fetching and building it on first use
    pub async fn get_or_build(
        &self,
        collection: &str,
        store: &dyn VectorStore,
    ) -> Result<Arc<KeywordIndex>, VectorStoreError> {
        if let Some(index) = self.get(collection).await {
            return Ok(index);
        }

        let lock = self.build_lock(collection).await;
        let _guard = lock.lock().await;
        // Another caller may have finished the build while we waited
        if let Some(index) = self.get(collection).await {
            return Ok(index);
        }

        log::warn!(
            "No BM25 index for collection '{}'. Building now...",
            collection
        );
        let documents = store.get_all_documents(collection).await?;
        Ok(self.build_locked(collection, documents).await)
    }

    /// Search a collection, building its index lazily if needed
    pub async fn search(
        &self,
        collection: &str,
        query_tokens: &[String],
        k: usize,
        filter: &MetadataFilter,
        store: &dyn VectorStore,
    ) -> Result<Vec<KeywordHit>, VectorStoreError> {
        let index = self.get_or_build(collection, store).await?;
        Ok(index
            .search_where(query_tokens, k, |doc| filter.matches(doc))
            .into_iter()
            .filter_map(|(doc_idx, score)| {
                index.document(doc_idx).map(|document| KeywordHit {
                    document: document.clone(),
                    score,
                })
            })
            .collect())
    }

    /// Drop a collection's index so the next search rebuilds it
    pub async fn invalidate(&self, collection: &str) -> bool {
        self.indexes.write().await.remove(collection).is_some()
    }

    /// Names of indexed collections, sorted
    pub async fn collections(&self) -> Vec<String> {
        let mut names: Vec<String> = self.indexes.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    pub async fn total_documents(&self) -> usize {
        self.indexes.read().await.values().map(|index| index.len()).sum()
    }
}

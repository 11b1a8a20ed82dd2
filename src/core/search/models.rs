//! Search Document Models
//!
//! Data structures for rulebook documents, metadata filters and ranked results.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// Source Type
// ============================================================================

/// Where a chunk of content came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// Rules text from a published rulebook
    Rulebook,
    /// Setting lore and flavor text
    Flavor,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Rulebook => "rulebook",
            SourceType::Flavor => "flavor",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Document Metadata
// ============================================================================

/// Metadata the search core reads from an indexed chunk.
///
/// Every field is optional; a chunk straight out of the PDF pipeline may not
/// know its page or section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Rulebook name (e.g. "Player's Handbook")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rulebook: Option<String>,

    /// Game system (e.g. "D&D 5e", "Pathfinder 2e")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<SourceType>,

    /// Content classification: rule, spell, monster, definition, stat_block...
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    /// Section or chunk title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Page number in the source PDF
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,

    /// Section hierarchy, e.g. ["Chapter 9", "Combat", "Attack Rolls"]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub section_path: Vec<String>,

    /// Any other scalar metadata carried by the vector store
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl DocumentMetadata {
    /// Title or empty string
    pub fn title_or_empty(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }

    pub fn content_type_or_empty(&self) -> &str {
        self.content_type.as_deref().unwrap_or("")
    }

    /// All free-text metadata values, in a stable order.
    ///
    /// Used when mining related topics from results.
    pub fn text_values(&self) -> Vec<&str> {
        let mut values: Vec<&str> = Vec::new();
        values.extend(self.rulebook.as_deref());
        values.extend(self.system.as_deref());
        values.extend(self.content_type.as_deref());
        values.extend(self.section_path.iter().map(String::as_str));
        values.extend(self.extra.values().map(String::as_str));
        values
    }
}

// ============================================================================
// Document
// ============================================================================

/// An indexed chunk of rulebook text.
///
/// Immutable once indexed; re-indexing a collection replaces documents by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub collection: String,
    #[serde(default)]
    pub metadata: DocumentMetadata,
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            collection: String::new(),
            metadata: DocumentMetadata::default(),
        }
    }

    pub fn in_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.metadata.title = Some(title.into());
        self
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.metadata.page_number = Some(page);
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.metadata.content_type = Some(content_type.into());
        self
    }

    pub fn with_rulebook(mut self, rulebook: impl Into<String>) -> Self {
        self.metadata.rulebook = Some(rulebook.into());
        self
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.metadata.system = Some(system.into());
        self
    }

    pub fn with_source_type(mut self, source_type: SourceType) -> Self {
        self.metadata.source_type = Some(source_type);
        self
    }

    pub fn with_metadata(mut self, metadata: DocumentMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Text used for lexical indexing: title followed by body
    pub fn searchable_text(&self) -> String {
        match self.metadata.title.as_deref() {
            Some(title) if !title.is_empty() => format!("{} {}", title, self.text),
            _ => self.text.clone(),
        }
    }
}

/// A document returned by the vector store together with its similarity
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredDocument {
    pub document: Document,
    pub score: f32,
}

// ============================================================================
// Metadata Filter
// ============================================================================

/// Exact-match filter over document metadata. Unset fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rulebook: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<SourceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl MetadataFilter {
    pub fn is_empty(&self) -> bool {
        self.rulebook.is_none()
            && self.system.is_none()
            && self.source_type.is_none()
            && self.content_type.is_none()
    }

    /// Check whether a document satisfies every set condition
    pub fn matches(&self, document: &Document) -> bool {
        let meta = &document.metadata;

        fn field_matches(expected: &Option<String>, actual: &Option<String>) -> bool {
            match expected {
                None => true,
                Some(value) => actual.as_deref() == Some(value.as_str()),
            }
        }

        field_matches(&self.rulebook, &meta.rulebook)
            && field_matches(&self.system, &meta.system)
            && field_matches(&self.content_type, &meta.content_type)
            && self
                .source_type
                .map_or(true, |expected| meta.source_type == Some(expected))
    }
}

// ============================================================================
// Search Context
// ============================================================================

/// What the caller is currently playing, used to tailor suggestions and limits
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchContext {
    /// Game system in use (e.g. "D&D 5e")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_system: Option<String>,

    /// Rulebook the caller is focused on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_rulebook: Option<String>,
}

impl SearchContext {
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.current_system = Some(system.into());
        self
    }

    pub fn with_rulebook(mut self, rulebook: impl Into<String>) -> Self {
        self.current_rulebook = Some(rulebook.into());
        self
    }
}

// ============================================================================
// Search Results
// ============================================================================

/// Which retrieval method produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    Semantic,
    Keyword,
    Hybrid,
}

impl MatchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchKind::Semantic => "semantic",
            MatchKind::Keyword => "keyword",
            MatchKind::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A ranked search hit. Produced per query, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub document: Document,
    /// Relevance in [0, 1]
    pub relevance_score: f32,
    pub match_kind: MatchKind,
}

impl SearchResult {
    pub fn new(document: Document, relevance_score: f32, match_kind: MatchKind) -> Self {
        Self {
            document,
            relevance_score,
            match_kind,
        }
    }

    pub fn title(&self) -> &str {
        self.document.metadata.title_or_empty()
    }
}

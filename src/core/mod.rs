pub mod logging;

// Hybrid search: BM25 + vector retrieval, fusion, orchestration service
pub mod search;

// TTRPG domain tables (abbreviations, synonyms, misspellings) and pattern compilation
pub mod ttrpg_search;

// Query preprocessing: abbreviation expansion, typo correction, suggestions
pub mod preprocess;

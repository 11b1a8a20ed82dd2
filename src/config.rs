use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::search::error::SearchError;
use crate::core::search::keyword::Bm25Params;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub search: SearchSettings,
    pub logging: LoggingConfig,
}

/// Search service configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Collections indexed by `initialize` when none are named.
    pub default_collections: Vec<String>,
    /// Results returned by `search` when the caller does not say.
    pub default_max_results: usize,
    /// Results returned by `quick_search` when the caller does not say.
    pub quick_search_max_results: usize,
    /// Per-path retrieval timeout in milliseconds.
    pub retrieval_timeout_ms: u64,
    /// Raw BM25 score that maps to a normalised keyword score of 1.0.
    pub keyword_score_cap: f32,
    pub bm25_k1: f32,
    pub bm25_b: f32,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence.
    pub level: String,
    /// Directory for the JSON log file. Defaults to the data directory.
    pub log_dir: Option<PathBuf>,
    /// Also write JSON logs to a daily rolling file.
    pub json_file: bool,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_collections: vec!["rulebook_index".to_string()],
            default_max_results: 5,
            quick_search_max_results: 3,
            retrieval_timeout_ms: 10_000,
            keyword_score_cap: 10.0,
            bm25_k1: 1.5,
            bm25_b: 0.75,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: None,
            json_file: false,
        }
    }
}

impl SearchSettings {
    pub fn retrieval_timeout(&self) -> Duration {
        Duration::from_millis(self.retrieval_timeout_ms)
    }

    pub fn bm25_params(&self) -> Bm25Params {
        Bm25Params {
            k1: self.bm25_k1,
            b: self.bm25_b,
        }
    }

    /// Reject settings that would make scoring meaningless
    pub fn validate(&self) -> Result<(), SearchError> {
        if !(self.keyword_score_cap.is_finite() && self.keyword_score_cap > 0.0) {
            return Err(SearchError::ConfigError(format!(
                "keyword_score_cap must be positive, got {}",
                self.keyword_score_cap
            )));
        }
        if !(self.bm25_k1.is_finite() && self.bm25_k1 >= 0.0) {
            return Err(SearchError::ConfigError(format!(
                "bm25_k1 must be non-negative, got {}",
                self.bm25_k1
            )));
        }
        if !(0.0..=1.0).contains(&self.bm25_b) {
            return Err(SearchError::ConfigError(format!(
                "bm25_b must be within [0, 1], got {}",
                self.bm25_b
            )));
        }
        if self.retrieval_timeout_ms == 0 {
            return Err(SearchError::ConfigError(
                "retrieval_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl LoggingConfig {
    /// Resolved log directory (override or data-dir default).
    pub fn log_dir(&self) -> PathBuf {
        self.log_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|d| d.join("ttrpg-search").join("logs"))
                .unwrap_or_else(|| PathBuf::from("logs"))
        })
    }
}

impl AppConfig {
    /// Load configuration from `~/.config/ttrpg-search/config.toml`.
    /// Returns `Default` if the file is missing or unparseable.
    pub fn load() -> Self {
        let config_path = Self::config_path();
        match std::fs::read_to_string(&config_path) {
            Ok(contents) => match Self::from_toml_str(&contents) {
                Ok(config) => {
                    log::info!("Loaded config from {}", config_path.display());
                    config
                }
                Err(e) => {
                    log::warn!(
                        "Failed to parse config at {}: {e}, using defaults",
                        config_path.display()
                    );
                    Self::default()
                }
            },
            Err(_) => {
                log::debug!(
                    "No config file at {}, using defaults",
                    config_path.display()
                );
                Self::default()
            }
        }
    }

    /// Parse configuration from TOML text. Missing keys take defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("ttrpg-search").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.search.default_collections, vec!["rulebook_index"]);
        assert_eq!(config.search.default_max_results, 5);
        assert_eq!(config.search.quick_search_max_results, 3);
        assert_eq!(config.search.retrieval_timeout(), Duration::from_secs(10));
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json_file);
        assert!(config.search.validate().is_ok());
    }

    #[test]
    fn test_config_load_missing_file() {
        // Should return defaults without panicking
        let config = AppConfig::load();
        assert!(config.search.default_max_results > 0);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [search]
            default_collections = ["phb", "dmg"]
            bm25_k1 = 1.2

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.search.default_collections, vec!["phb", "dmg"]);
        assert_eq!(config.search.bm25_params().k1, 1.2);
        assert_eq!(config.search.bm25_params().b, 0.75);
        assert_eq!(config.search.default_max_results, 5);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_invalid_toml_is_error() {
        assert!(AppConfig::from_toml_str("[search\nbroken").is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut settings = SearchSettings::default();
        settings.bm25_b = 1.5;
        assert!(matches!(settings.validate(), Err(SearchError::ConfigError(_))));

        let mut settings = SearchSettings::default();
        settings.keyword_score_cap = 0.0;
        assert!(settings.validate().is_err());

        let mut settings = SearchSettings::default();
        settings.retrieval_timeout_ms = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_log_dir_override() {
        let config = LoggingConfig {
            log_dir: Some(PathBuf::from("/tmp/custom")),
            ..Default::default()
        };
        assert_eq!(config.log_dir(), PathBuf::from("/tmp/custom"));
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = AppConfig::default();
        let serialized = toml::to_string(&config).unwrap();
        let deserialized = AppConfig::from_toml_str(&serialized).unwrap();
        assert_eq!(deserialized.search, config.search);
    }
}

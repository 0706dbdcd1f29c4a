//! Configuration management for regassist
//!
//! TOML-based configuration with defaults and validation.
//! Location: ~/.regassist/config.toml

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::embedding::openai::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::embedding::{local::DEFAULT_LOCAL_MODEL, DEFAULT_MAX_CACHE_SIZE};
use crate::errors::{RagError, Result};
use crate::rag::reranking::{DEFAULT_BATCH_SIZE, DEFAULT_RERANK_MODEL};
use crate::rag::{RAGConfig, ReRankConfig, SearchParams};

/// Complete configuration for regassist
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub corpus: CorpusConfig,
    pub embedding: EmbeddingConfig,
    pub retrieval: RetrievalConfig,
    pub rerank: RerankConfig,
    pub telemetry: TelemetryConfig,
}

/// Corpus source locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    pub regulation_path: String,
    /// Optional; a missing file degrades to a regulation-only corpus
    pub qa_path: Option<String>,
}

/// Which embedding backend to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// OpenAI-compatible HTTP API
    OpenAi,
    /// Candle BERT model from the Hugging Face hub
    Local,
}

/// Embedding backend and cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProvider,
    pub model: String,
    pub base_url: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    pub local_model: String,
    pub timeout_secs: u64,
    pub max_cache_size: usize,
    pub warm_on_start: bool,
}

/// Stage 1 configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
}

/// Stage 2 configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RerankConfig {
    pub model: String,
    pub batch_size: usize,
    pub final_k: usize,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub default_verbosity: String,
    pub show_progress_bars: bool,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            regulation_path: "rule.json".to_string(),
            qa_path: Some("qa_dataset.json".to_string()),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::OpenAi,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            local_model: DEFAULT_LOCAL_MODEL.to_string(),
            timeout_secs: 30,
            max_cache_size: DEFAULT_MAX_CACHE_SIZE,
            warm_on_start: false,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 10 }
    }
}

impl Default for RerankConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_RERANK_MODEL.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            final_k: 3,
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            default_verbosity: "normal".to_string(),
            show_progress_bars: true,
        }
    }
}

impl Config {
    /// Load configuration from file or use defaults
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        if let Some(config_path) = path {
            Self::load_from_file(&config_path)
        } else {
            Self::load_default()
        }
    }

    /// The file `load` reads for this argument, or `None` when it falls
    /// back to built-in defaults
    pub fn source_path(explicit: Option<&Path>) -> Option<PathBuf> {
        match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Self::default_path().filter(|path| path.exists()),
        }
    }

    /// Load configuration from specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| RagError::Config(format!("Failed to read config: {}", e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| RagError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load from the standard location, falling back to built-in defaults
    pub fn load_default() -> Result<Self> {
        match Self::source_path(None) {
            Some(path) => Self::load_from_file(&path),
            None => Ok(Config::default()),
        }
    }

    /// `~/.regassist/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".regassist").join("config.toml"))
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.corpus.regulation_path.trim().is_empty() {
            return Err(RagError::Config("regulation_path must not be empty".to_string()));
        }

        if self.retrieval.top_k == 0 {
            return Err(RagError::Config("top_k must be greater than 0".to_string()));
        }

        if self.rerank.final_k == 0 {
            return Err(RagError::Config("final_k must be greater than 0".to_string()));
        }

        if self.rerank.final_k > self.retrieval.top_k {
            return Err(RagError::Config(
                "final_k must not exceed top_k".to_string()
            ));
        }

        if self.rerank.batch_size == 0 {
            return Err(RagError::Config("batch_size must be greater than 0".to_string()));
        }

        if self.embedding.max_cache_size == 0 {
            return Err(RagError::Config("max_cache_size must be greater than 0".to_string()));
        }

        let embedding_model = match self.embedding.provider {
            EmbeddingProvider::OpenAi => &self.embedding.model,
            EmbeddingProvider::Local => &self.embedding.local_model,
        };
        if embedding_model.trim().is_empty() || self.rerank.model.trim().is_empty() {
            return Err(RagError::Config("model names must not be empty".to_string()));
        }

        match self.telemetry.default_verbosity.as_str() {
            "quiet" | "normal" | "verbose" | "very_verbose" => {}
            _ => return Err(RagError::Config(
                format!("Invalid verbosity level: {}", self.telemetry.default_verbosity)
            )),
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| RagError::Config(format!("Failed to serialize config: {}", e)))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| RagError::Config(format!("Failed to create config dir: {}", e)))?;
        }

        std::fs::write(path, contents)
            .map_err(|e| RagError::Config(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Pipeline parameters derived from the retrieval and rerank sections
    pub fn rag_config(&self) -> RAGConfig {
        RAGConfig {
            search: SearchParams {
                top_k: self.retrieval.top_k,
            },
            rerank: ReRankConfig {
                batch_size: self.rerank.batch_size,
                final_k: self.rerank.final_k,
            },
        }
    }

    /// API key read from the configured environment variable
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.embedding.api_key_env)
            .ok()
            .filter(|k| !k.is_empty())
    }

    pub fn embedding_timeout(&self) -> Duration {
        Duration::from_secs(self.embedding.timeout_secs)
    }

    pub fn regulation_path(&self) -> PathBuf {
        Self::expand_path(&self.corpus.regulation_path)
    }

    pub fn qa_path(&self) -> Option<PathBuf> {
        self.corpus.qa_path.as_deref().map(Self::expand_path)
    }

    /// Expand tilde in paths
    pub fn expand_path(path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }
        PathBuf::from(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.retrieval.top_k, 10);
        assert_eq!(config.rerank.final_k, 3);
        assert_eq!(config.rerank.batch_size, 32);
        assert_eq!(config.embedding.max_cache_size, 10_000);
        assert_eq!(config.embedding.provider, EmbeddingProvider::OpenAi);
        assert_eq!(config.rerank.model, "cross-encoder/ms-marco-MiniLM-L-6-v2");
    }

    #[test]
    fn test_config_validation_success() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_config_validation_zero_values() {
        let mut config = Config::default();
        config.retrieval.top_k = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.rerank.batch_size = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.embedding.max_cache_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_final_k_exceeds_top_k() {
        let mut config = Config::default();
        config.rerank.final_k = 11;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_verbosity() {
        let mut config = Config::default();
        config.telemetry.default_verbosity = "invalid".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [embedding]
            provider = "local"

            [rerank]
            final_k = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.embedding.provider, EmbeddingProvider::Local);
        assert_eq!(config.rerank.final_k, 5);
        assert_eq!(config.rerank.batch_size, 32);
        assert_eq!(config.corpus.regulation_path, "rule.json");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let parsed: std::result::Result<Config, _> = toml::from_str(
            r#"
            [embedding]
            provider = "cohere"
            "#,
        );
        assert!(parsed.is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.retrieval.top_k = 20;
        config.save(&path).unwrap();

        let loaded = Config::load(Some(path)).unwrap();
        assert_eq!(loaded.retrieval.top_k, 20);
    }

    #[test]
    fn test_source_path_prefers_explicit_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        Config::default().save(&path).unwrap();

        assert_eq!(Config::source_path(Some(path.as_path())), Some(path.clone()));
        assert_ne!(Config::source_path(Some(path.as_path())), Config::default_path());
    }

    #[test]
    fn test_source_path_without_explicit_only_reports_existing_default() {
        match Config::source_path(None) {
            Some(path) => {
                assert!(path.exists());
                assert_eq!(Some(path), Config::default_path());
            }
            None => assert!(Config::default_path().map_or(true, |p| !p.exists())),
        }
    }

    #[test]
    fn test_rag_config_mapping() {
        let mut config = Config::default();
        config.retrieval.top_k = 7;
        config.rerank.batch_size = 8;

        let rag = config.rag_config();
        assert_eq!(rag.search.top_k, 7);
        assert_eq!(rag.rerank.batch_size, 8);
        assert_eq!(rag.rerank.final_k, 3);
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let expanded = Config::expand_path("~/.regassist");
        assert!(!expanded.to_string_lossy().contains('~'));
    }

    #[test]
    fn test_expand_path_without_tilde() {
        let expanded = Config::expand_path("/absolute/path");
        assert_eq!(expanded.to_string_lossy(), "/absolute/path");
    }
}

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Configuration for the whole question-answering pipeline.
///
/// Every section falls back to its defaults when omitted from the YAML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub rag: RagConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Configuration for the generative model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub model: String,
    pub base_url: String,
    pub temperature: f64,
    /// Upper bound for a single backend request, in seconds.
    pub timeout_secs: u64,
}

/// Distance used to rank passages against a query vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// `1 - cosine similarity`
    #[default]
    Cosine,
    /// Euclidean distance
    L2,
}

/// Configuration for RAG processing.
///
/// This covers embedding settings, chunking and retrieval depth.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    pub embedding_model: String,
    /// Maximum passage length, in characters
    pub chunk_size: usize,
    /// Characters shared by neighbouring passages
    pub chunk_overlap: usize,
    /// Number of passages retrieved per question
    pub top_k: usize,
    /// Texts sent per embedding request
    pub batch_size: usize,
    pub metric: DistanceMetric,
}

/// Where the vector index lives on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub index_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`
    pub level: String,
    /// Append logs to this file instead of stderr
    pub file: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "llama3".to_string(),
            base_url: "http://localhost:11434".to_string(),
            temperature: 0.0,
            timeout_secs: 120,
        }
    }
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            // Ollama build of sentence-transformers/all-MiniLM-L6-v2
            embedding_model: "all-minilm".to_string(),
            chunk_size: 500,
            chunk_overlap: 50,
            top_k: 3,
            batch_size: 32,
            metric: DistanceMetric::Cosine,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            index_path: "./vectorstore/db_index".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file and validate it.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the numeric settings that the pipeline cannot work without.
    pub fn validate(&self) -> Result<()> {
        if self.rag.chunk_size == 0 {
            return Err(ConfigError::Invalid("rag.chunk_size must be greater than 0".into()));
        }
        if self.rag.chunk_overlap >= self.rag.chunk_size {
            return Err(ConfigError::Invalid(format!(
                "rag.chunk_overlap ({}) must be smaller than rag.chunk_size ({})",
                self.rag.chunk_overlap, self.rag.chunk_size
            )));
        }
        if self.rag.top_k == 0 {
            return Err(ConfigError::Invalid("rag.top_k must be at least 1".into()));
        }
        if self.rag.batch_size == 0 {
            return Err(ConfigError::Invalid("rag.batch_size must be at least 1".into()));
        }
        if self.llm.timeout_secs == 0 {
            return Err(ConfigError::Invalid("llm.timeout_secs must be at least 1".into()));
        }
        Ok(())
    }
}

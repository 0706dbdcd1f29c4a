//! Error types for regassist
//!
//! Each pipeline stage owns its error enum; `RagError` is what `search`
//! hands back to the calling layer.

use thiserror::Error;

/// Failures while reading or chunking the corpus sources (fatal at startup)
#[derive(Error, Debug)]
pub enum LoadError {
    /// Source file could not be read
    #[error("Failed to read corpus source {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Source file is not valid JSON or has the wrong shape
    #[error("Failed to parse corpus source {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// Chunk content could not be rendered
    #[error("Failed to serialize chunk content: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Regulation document root must be an object
    #[error("Regulation document root must be an object, found {found}")]
    InvalidRoot { found: String },

    /// Two chunks resolved to the same id
    #[error("Duplicate chunk id: {0}")]
    DuplicateId(String),
}

/// Failures talking to the embedding backend
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// Transport-level failure
    #[error("Embedding request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status
    #[error("Embedding service returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Response arrived but did not carry a usable vector
    #[error("Malformed embedding response: {0}")]
    MalformedResponse(String),

    /// Local model failed to load or run
    #[error("Embedding model error: {0}")]
    Model(String),

    /// Query and chunk vectors disagree on dimension
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Failures talking to the cross-encoder scoring backend
#[derive(Error, Debug)]
pub enum RerankError {
    /// Model failed to load or run
    #[error("Reranker model error: {0}")]
    Model(String),

    /// Backend returned a different number of scores than pairs sent
    #[error("Reranker returned {actual} scores for {expected} pairs")]
    LengthMismatch { expected: usize, actual: usize },

    /// Blocking inference task panicked or was cancelled
    #[error("Reranker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Main error type for the retrieval pipeline
#[derive(Error, Debug)]
pub enum RagError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Rerank(#[from] RerankError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, RagError>;

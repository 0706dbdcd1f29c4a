//! regassist - retrieval core for a regulations assistant
//!
//! Selects the passages a language model should see for a question about a
//! fixed body of regulations and past Q&A.
//!
//! # Architecture
//!
//! - **corpus**: regulation tree + Q&A dataset flattened into chunks, once at startup
//! - **embedding**: backend seam and the bounded text -> vector cache
//! - **rag**: cosine retrieval (top 10) -> cross-encoder rerank (top 3) -> partition

pub mod errors;

pub use errors::{RagError, Result};

pub mod corpus;
pub mod embedding;
pub mod hub;
pub mod rag;

// Ambient: CLI, configuration, logging, startup
pub mod bootstrap;
pub mod cli;
pub mod config;
pub mod logging;

pub use corpus::{Chunk, ChunkType, CorpusChunkSet, CorpusLoader};
pub use embedding::{EmbeddingBackend, EmbeddingCache};
pub use rag::{RAGPipeline, ScoringBackend, SearchResult};

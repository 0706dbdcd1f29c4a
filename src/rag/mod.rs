// Two-stage retrieval pipeline
//
// Components:
// - Retrieval Engine: cosine similarity over cached embeddings, top_k candidates
// - Re-ranking: cross-encoder scoring of the candidates, final_k survivors
// - Pipeline: corpus + cache + both stages behind a single `search`

pub mod pipeline;
pub mod reranking;
pub mod retrieval;

// Re-export key types
pub use pipeline::{RAGConfig, RAGPipeline, SearchOutcome, SearchResult};
pub use reranking::{CrossEncoder, ReRankConfig, ReRanker, ScoringBackend};
pub use retrieval::{cosine_similarity, RetrievalEngine, ScoredChunk, SearchParams};

pub mod engine;
pub mod similarity;

pub use engine::{RetrievalEngine, ScoredChunk, SearchParams};
pub use similarity::cosine_similarity;

pub mod cross_encoder;
pub mod scorer;

pub use cross_encoder::{CrossEncoder, DEFAULT_RERANK_MODEL};
pub use scorer::{ReRankConfig, ReRanker, ScoringBackend, DEFAULT_BATCH_SIZE};

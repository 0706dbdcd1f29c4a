// Stage 2: cross-encoder reranking of retrieved candidates
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::errors::RerankError;
use crate::rag::retrieval::engine::{sort_by_score, ScoredChunk};

/// Pairs scored per model invocation
pub const DEFAULT_BATCH_SIZE: usize = 32;

/// Relevance model that jointly scores (query, passage) pairs.
///
/// Output must have the same length and order as the input.
#[async_trait]
pub trait ScoringBackend: Send + Sync {
    async fn score_batch(&self, pairs: &[(String, String)]) -> Result<Vec<f32>, RerankError>;

    /// Short identifier for logs
    fn name(&self) -> &str;
}

#[async_trait]
impl<T: ScoringBackend + ?Sized> ScoringBackend for Box<T> {
    async fn score_batch(&self, pairs: &[(String, String)]) -> Result<Vec<f32>, RerankError> {
        (**self).score_batch(pairs).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[async_trait]
impl<T: ScoringBackend + ?Sized> ScoringBackend for Arc<T> {
    async fn score_batch(&self, pairs: &[(String, String)]) -> Result<Vec<f32>, RerankError> {
        (**self).score_batch(pairs).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Re-ranking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReRankConfig {
    /// Pairs per model call; bounds per-call memory and latency
    pub batch_size: usize,
    /// Chunks kept after reranking
    pub final_k: usize,
}

impl Default for ReRankConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            final_k: 3,
        }
    }
}

/// Re-ranker for sharpening retrieval results
pub struct ReRanker<S> {
    backend: S,
    config: ReRankConfig,
}

impl<S: ScoringBackend> ReRanker<S> {
    /// Create new re-ranker with default config
    pub fn new(backend: S) -> Self {
        Self::with_config(backend, ReRankConfig::default())
    }

    /// Create with custom configuration
    pub fn with_config(backend: S, config: ReRankConfig) -> Self {
        Self { backend, config }
    }

    /// Rerank with the configured `final_k`
    pub async fn rerank(
        &self,
        query: &str,
        candidates: Vec<ScoredChunk>,
    ) -> Result<Vec<ScoredChunk>, RerankError> {
        self.rerank_top(query, candidates, self.config.final_k).await
    }

    /// Score every candidate against the query and keep the best `final_k`.
    ///
    /// Pairs go to the model in batches of `batch_size`, in input order.
    /// Returned chunks carry the cross-encoder score.
    pub async fn rerank_top(
        &self,
        query: &str,
        candidates: Vec<ScoredChunk>,
        final_k: usize,
    ) -> Result<Vec<ScoredChunk>, RerankError> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let pairs: Vec<(String, String)> = candidates
            .iter()
            .map(|c| (query.to_string(), c.chunk.content.clone()))
            .collect();

        let scores = self.score_pairs(&pairs).await?;

        let mut ranked: Vec<ScoredChunk> = candidates
            .into_iter()
            .zip(scores)
            .map(|(candidate, score)| ScoredChunk {
                chunk: candidate.chunk,
                score,
            })
            .collect();

        sort_by_score(&mut ranked);
        ranked.truncate(final_k);

        debug!(
            kept = ranked.len(),
            scored = pairs.len(),
            model = self.backend.name(),
            "Rerank complete"
        );
        Ok(ranked)
    }

    /// Scores for all pairs, concatenated in pair order across batches
    async fn score_pairs(&self, pairs: &[(String, String)]) -> Result<Vec<f32>, RerankError> {
        let mut scores = Vec::with_capacity(pairs.len());

        for batch in pairs.chunks(self.config.batch_size.max(1)) {
            let batch_scores = self.backend.score_batch(batch).await?;
            if batch_scores.len() != batch.len() {
                return Err(RerankError::LengthMismatch {
                    expected: batch.len(),
                    actual: batch_scores.len(),
                });
            }
            scores.extend(batch_scores);
        }

        Ok(scores)
    }

    /// Get current configuration
    pub fn config(&self) -> &ReRankConfig {
        &self.config
    }

    /// Update configuration
    pub fn set_config(&mut self, config: ReRankConfig) {
        self.config = config;
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }
}

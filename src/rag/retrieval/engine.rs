// Stage 1: embedding similarity retrieval over the whole corpus
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::corpus::{Chunk, CorpusChunkSet};
use crate::embedding::{EmbeddingBackend, EmbeddingCache};
use crate::errors::EmbeddingError;
use crate::rag::retrieval::similarity::cosine_similarity;

/// Search parameters for retrieval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchParams {
    /// Maximum number of candidates handed to the reranker
    pub top_k: usize,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self { top_k: 10 }
    }
}

/// Chunk paired with a relevance score (cosine in stage 1, cross-encoder in stage 2)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// Sort descending by score; the sort is stable so ties keep input order
pub(crate) fn sort_by_score(scored: &mut [ScoredChunk]) {
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
}

/// Retrieval engine for semantic search
pub struct RetrievalEngine<E> {
    cache: Arc<EmbeddingCache<E>>,
    default_params: SearchParams,
}

impl<E: EmbeddingBackend> RetrievalEngine<E> {
    /// Create new retrieval engine
    pub fn new(cache: Arc<EmbeddingCache<E>>) -> Self {
        Self {
            cache,
            default_params: SearchParams::default(),
        }
    }

    /// Create with custom default parameters
    pub fn with_params(cache: Arc<EmbeddingCache<E>>, params: SearchParams) -> Self {
        Self {
            cache,
            default_params: params,
        }
    }

    /// Retrieve with the default parameters
    pub async fn retrieve(
        &self,
        query: &str,
        corpus: &CorpusChunkSet,
    ) -> Result<Vec<ScoredChunk>, EmbeddingError> {
        self.retrieve_top_k(query, corpus, self.default_params.top_k).await
    }

    /// Retrieve with custom parameters
    pub async fn retrieve_with_params(
        &self,
        query: &str,
        corpus: &CorpusChunkSet,
        params: &SearchParams,
    ) -> Result<Vec<ScoredChunk>, EmbeddingError> {
        self.retrieve_top_k(query, corpus, params.top_k).await
    }

    /// Score every chunk against the query and keep the best `top_k`.
    ///
    /// Returns `min(top_k, corpus.len())` chunks in non-increasing score order.
    pub async fn retrieve_top_k(
        &self,
        query: &str,
        corpus: &CorpusChunkSet,
        top_k: usize,
    ) -> Result<Vec<ScoredChunk>, EmbeddingError> {
        if corpus.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }

        let query_embedding = self.cache.embed(query).await?;

        let mut scored = Vec::with_capacity(corpus.len());
        for chunk in corpus {
            let chunk_embedding = self.cache.embed(&chunk.content).await?;
            if chunk_embedding.len() != query_embedding.len() {
                return Err(EmbeddingError::DimensionMismatch {
                    expected: query_embedding.len(),
                    actual: chunk_embedding.len(),
                });
            }

            scored.push(ScoredChunk {
                chunk: chunk.clone(),
                score: cosine_similarity(&query_embedding, &chunk_embedding),
            });
        }

        sort_by_score(&mut scored);
        scored.truncate(top_k);

        debug!(
            candidates = scored.len(),
            corpus = corpus.len(),
            best = scored.first().map(|s| s.score),
            "Similarity retrieval complete"
        );
        Ok(scored)
    }

    /// Get default search parameters
    pub fn default_params(&self) -> &SearchParams {
        &self.default_params
    }

    /// Update default search parameters
    pub fn set_default_params(&mut self, params: SearchParams) {
        self.default_params = params;
    }

    pub fn cache(&self) -> &Arc<EmbeddingCache<E>> {
        &self.cache
    }
}

// End-to-end retrieve -> rerank pipeline
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::corpus::{Chunk, ChunkType, CorpusChunkSet};
use crate::embedding::{CacheStats, EmbeddingBackend, EmbeddingCache};
use crate::errors::Result;
use crate::rag::reranking::{ReRankConfig, ReRanker, ScoringBackend};
use crate::rag::retrieval::{RetrievalEngine, ScoredChunk, SearchParams};

/// RAG pipeline configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RAGConfig {
    /// Stage 1 parameters
    pub search: SearchParams,
    /// Stage 2 parameters
    pub rerank: ReRankConfig,
}

/// Final chunks split by source feed, each in rank order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub regulation: Vec<Chunk>,
    pub qa: Vec<Chunk>,
}

impl SearchResult {
    /// Partition ranked chunks by type, keeping rank order within each side
    pub fn partition<'a, I>(chunks: I) -> Self
    where
        I: IntoIterator<Item = &'a Chunk>,
    {
        let mut result = Self::default();
        for chunk in chunks {
            match chunk.chunk_type {
                ChunkType::Regulation => result.regulation.push(chunk.clone()),
                ChunkType::Qa => result.qa.push(chunk.clone()),
            }
        }
        result
    }

    pub fn len(&self) -> usize {
        self.regulation.len() + self.qa.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regulation.is_empty() && self.qa.is_empty()
    }
}

/// Full search output with scores and stage counts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub query: String,
    /// Reranked chunks carrying their cross-encoder score
    pub ranked: Vec<ScoredChunk>,
    /// Candidates surfaced by similarity retrieval
    pub documents_retrieved: usize,
    pub elapsed: Duration,
}

impl SearchOutcome {
    pub fn partitioned(&self) -> SearchResult {
        SearchResult::partition(self.ranked.iter().map(|s| &s.chunk))
    }
}

/// Retrieve-then-rerank pipeline over a fixed corpus.
///
/// Owns the corpus and the embedding cache; callers only see `search`.
pub struct RAGPipeline<E, S> {
    corpus: Arc<CorpusChunkSet>,
    cache: Arc<EmbeddingCache<E>>,
    retrieval_engine: RetrievalEngine<E>,
    reranker: ReRanker<S>,
    config: RAGConfig,
}

impl<E: EmbeddingBackend, S: ScoringBackend> RAGPipeline<E, S> {
    /// Create new RAG pipeline with default parameters
    pub fn new(corpus: Arc<CorpusChunkSet>, cache: EmbeddingCache<E>, scorer: S) -> Self {
        Self::with_config(corpus, cache, scorer, RAGConfig::default())
    }

    /// Create with custom configuration
    pub fn with_config(
        corpus: Arc<CorpusChunkSet>,
        cache: EmbeddingCache<E>,
        scorer: S,
        config: RAGConfig,
    ) -> Self {
        let cache = Arc::new(cache);

        Self {
            retrieval_engine: RetrievalEngine::with_params(cache.clone(), config.search.clone()),
            reranker: ReRanker::with_config(scorer, config.rerank.clone()),
            corpus,
            cache,
            config,
        }
    }

    /// Top chunks for `query`, split into regulation and QA
    pub async fn search(&self, query: &str) -> Result<SearchResult> {
        Ok(self.search_ranked(query).await?.partitioned())
    }

    /// Run both stages and keep scores and counts.
    ///
    /// Any stage failure fails the whole search; partial results are never
    /// returned.
    pub async fn search_ranked(&self, query: &str) -> Result<SearchOutcome> {
        self.search_with(query, &self.config).await
    }

    /// Like `search_ranked` with per-call parameters
    pub async fn search_with(&self, query: &str, config: &RAGConfig) -> Result<SearchOutcome> {
        let start = Instant::now();

        // Step 1: Cheap, coarse narrowing over the whole corpus
        let candidates = self
            .retrieval_engine
            .retrieve_with_params(query, &self.corpus, &config.search)
            .await?;
        let documents_retrieved = candidates.len();

        // Step 2: Sharper joint scoring over the shortlist
        let ranked = self
            .reranker
            .rerank_top(query, candidates, config.rerank.final_k)
            .await?;

        let elapsed = start.elapsed();
        debug!(
            retrieved = documents_retrieved,
            kept = ranked.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Search complete"
        );

        Ok(SearchOutcome {
            query: query.to_string(),
            ranked,
            documents_retrieved,
            elapsed,
        })
    }

    /// Stage 1 only, with the configured `top_k`
    pub async fn retrieve(&self, query: &str) -> Result<Vec<ScoredChunk>> {
        Ok(self
            .retrieval_engine
            .retrieve_with_params(query, &self.corpus, &self.config.search)
            .await?)
    }

    /// Embed every corpus chunk so the first query pays no embedding cost
    pub async fn warm_cache(&self) -> Result<usize> {
        Ok(self
            .cache
            .warm(self.corpus.iter().map(|c| c.content.as_str()))
            .await?)
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }

    pub fn corpus(&self) -> &Arc<CorpusChunkSet> {
        &self.corpus
    }

    /// Get current configuration
    pub fn config(&self) -> &RAGConfig {
        &self.config
    }

    /// Update configuration
    pub fn set_config(&mut self, config: RAGConfig) {
        self.retrieval_engine.set_default_params(config.search.clone());
        self.reranker.set_config(config.rerank.clone());
        self.config = config;
    }
}

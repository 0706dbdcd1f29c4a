//! Startup wiring for regassist
//!
//! Loads the corpus once, builds the configured embedding backend and the
//! cross-encoder, and assembles them into a pipeline.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::{Config, EmbeddingProvider};
use crate::corpus::{ChunkType, CorpusChunkSet, CorpusLoader};
use crate::embedding::{EmbeddingBackend, EmbeddingCache, LocalEmbeddings, OpenAiEmbeddings};
use crate::rag::{CrossEncoder, RAGPipeline};

/// Embedding backend chosen at runtime from config
pub type DynEmbeddings = Box<dyn EmbeddingBackend>;

/// Pipeline as assembled for the CLI
pub type Pipeline = RAGPipeline<DynEmbeddings, CrossEncoder>;

/// Read both corpus sources; a broken regulation document is fatal
pub fn load_corpus(config: &Config) -> crate::errors::Result<CorpusChunkSet> {
    let loader = CorpusLoader::new(config.regulation_path(), config.qa_path());
    let corpus = loader.load()?;

    info!(
        chunks = corpus.len(),
        regulation = corpus.count_by_type(ChunkType::Regulation),
        qa = corpus.count_by_type(ChunkType::Qa),
        "Corpus ready"
    );
    Ok(corpus)
}

/// Construct the configured embedding backend
pub async fn embedding_backend(config: &Config) -> Result<DynEmbeddings> {
    match config.embedding.provider {
        EmbeddingProvider::OpenAi => {
            let api_key = config.api_key();
            if api_key.is_none() {
                debug!(
                    var = config.embedding.api_key_env.as_str(),
                    "No API key set, sending unauthenticated embedding requests"
                );
            }
            let client = OpenAiEmbeddings::new(
                config.embedding.base_url.clone(),
                config.embedding.model.clone(),
                api_key,
                config.embedding_timeout(),
            )
            .context("Failed to build embedding client")?;
            Ok(Box::new(client))
        }
        EmbeddingProvider::Local => {
            let model_id = config.embedding.local_model.clone();
            let engine = tokio::task::spawn_blocking(move || LocalEmbeddings::new(&model_id))
                .await
                .context("Embedding model loader panicked")?
                .context("Failed to load local embedding model")?;
            Ok(Box::new(engine))
        }
    }
}

/// Load the cross-encoder off the async runtime
pub async fn cross_encoder(config: &Config) -> Result<CrossEncoder> {
    let model_id = config.rerank.model.clone();
    tokio::task::spawn_blocking(move || CrossEncoder::new(&model_id))
        .await
        .context("Reranker loader panicked")?
        .context("Failed to load cross-encoder model")
}

/// Full startup sequence: corpus, backends, pipeline, optional cache warm-up
pub async fn build_pipeline(config: &Config) -> Result<Pipeline> {
    let corpus = Arc::new(load_corpus(config).context("Failed to load corpus")?);

    let embeddings = embedding_backend(config).await?;
    let cache = EmbeddingCache::with_max_size(embeddings, config.embedding.max_cache_size);
    let scorer = cross_encoder(config).await?;

    let pipeline = RAGPipeline::with_config(corpus, cache, scorer, config.rag_config());

    if config.embedding.warm_on_start {
        let warmed = pipeline
            .warm_cache()
            .await
            .context("Failed to warm embedding cache")?;
        info!(warmed, "Embedding cache warmed");
    }

    Ok(pipeline)
}

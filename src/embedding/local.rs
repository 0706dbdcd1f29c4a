// Local sentence embeddings via a BERT checkpoint and Candle
use anyhow::Result;
use async_trait::async_trait;
use candle_core::{Device, Tensor};
use candle_transformers::models::bert::BertModel;
use std::sync::Arc;
use tokenizers::Tokenizer;

use crate::embedding::EmbeddingBackend;
use crate::errors::EmbeddingError;
use crate::hub::{pad_rows, BertArtifacts};

pub const DEFAULT_LOCAL_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";

struct Inner {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    dimension: usize,
}

/// Embedding backend that runs a sentence-transformers BERT model on CPU
pub struct LocalEmbeddings {
    inner: Arc<Inner>,
    model_id: String,
}

impl LocalEmbeddings {
    /// Load model (downloads on first use)
    pub fn new(model_id: &str) -> Result<Self> {
        let device = Device::Cpu;
        let artifacts = BertArtifacts::fetch(model_id)?;
        let vb = artifacts.var_builder(&device)?;
        let model = BertModel::load(vb, &artifacts.config)?;

        Ok(Self {
            inner: Arc::new(Inner {
                model,
                dimension: artifacts.config.hidden_size,
                tokenizer: artifacts.tokenizer,
                device,
            }),
            model_id: model_id.to_string(),
        })
    }

    /// Embedding dimension (model hidden size)
    pub fn dimension(&self) -> usize {
        self.inner.dimension
    }

    /// Embed several texts in one forward pass
    pub fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        self.inner.embed_batch(texts)
    }
}

impl Inner {
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let encodings = self.tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))?;

        let ids: Vec<Vec<u32>> = encodings.iter().map(|e| e.get_ids().to_vec()).collect();
        let masks: Vec<Vec<u32>> = encodings
            .iter()
            .map(|e| e.get_attention_mask().to_vec())
            .collect();

        let batch_size = texts.len();
        let (flat_ids, max_len) = pad_rows(&ids);
        let (flat_mask, _) = pad_rows(&masks);

        let token_ids = Tensor::from_vec(flat_ids, (batch_size, max_len), &self.device)?;
        let attention_mask = Tensor::from_vec(flat_mask, (batch_size, max_len), &self.device)?;
        let token_type_ids = token_ids.zeros_like()?;

        let hidden = self
            .model
            .forward(&token_ids, &token_type_ids, Some(&attention_mask))?;
        let pooled = mean_pool(&hidden, &attention_mask)?;

        Ok(pooled.to_vec2::<f32>()?)
    }
}

/// Mean pooling with attention mask
fn mean_pool(embeddings: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    let mask_expanded = attention_mask
        .unsqueeze(2)?
        .expand(embeddings.shape())?
        .to_dtype(embeddings.dtype())?;

    let sum_embeddings = (embeddings * &mask_expanded)?.sum(1)?;
    let sum_mask = mask_expanded.sum(1)?.clamp(1e-9, f64::MAX)?;

    Ok(sum_embeddings.broadcast_div(&sum_mask)?)
}

#[async_trait]
impl EmbeddingBackend for LocalEmbeddings {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let inner = Arc::clone(&self.inner);
        let text = text.to_string();

        let mut vectors = tokio::task::spawn_blocking(move || inner.embed_batch(&[text.as_str()]))
            .await
            .map_err(|e| EmbeddingError::Model(e.to_string()))?
            .map_err(|e| EmbeddingError::Model(format!("{:#}", e)))?;

        vectors
            .pop()
            .ok_or_else(|| EmbeddingError::Model("model returned no embedding".to_string()))
    }

    fn name(&self) -> &str {
        &self.model_id
    }
}

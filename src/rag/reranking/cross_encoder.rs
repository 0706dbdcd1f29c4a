//! Cross-encoder relevance model
//!
//! Runs a BERT sequence classifier (encoder, pooler, one-logit head) over
//! `[CLS] query [SEP] passage [SEP]` and returns a sigmoid relevance score
//! per pair, the same activation sentence-transformers applies to
//! single-label cross-encoders.

use anyhow::Result;
use async_trait::async_trait;
use candle_core::{Device, IndexOp, Tensor};
use candle_nn::{linear, Linear, Module};
use candle_transformers::models::bert::BertModel;
use std::sync::Arc;
use tokenizers::Tokenizer;

use crate::errors::RerankError;
use crate::hub::{pad_rows, BertArtifacts};
use crate::rag::reranking::scorer::ScoringBackend;

pub const DEFAULT_RERANK_MODEL: &str = "cross-encoder/ms-marco-MiniLM-L-6-v2";

struct Classifier {
    bert: BertModel,
    pooler: Linear,
    head: Linear,
    tokenizer: Tokenizer,
    device: Device,
}

/// Local cross-encoder scoring backend
pub struct CrossEncoder {
    inner: Arc<Classifier>,
    model_id: String,
}

impl CrossEncoder {
    /// Load model (downloads on first use)
    pub fn new(model_id: &str) -> Result<Self> {
        let device = Device::Cpu;
        let artifacts = BertArtifacts::fetch(model_id)?;
        let vb = artifacts.var_builder(&device)?;

        let hidden = artifacts.config.hidden_size;
        let bert = BertModel::load(vb.clone(), &artifacts.config)?;
        let pooler = linear(hidden, hidden, vb.pp("bert.pooler.dense"))?;
        let head = linear(hidden, 1, vb.pp("classifier"))?;

        Ok(Self {
            inner: Arc::new(Classifier {
                bert,
                pooler,
                head,
                tokenizer: artifacts.tokenizer,
                device,
            }),
            model_id: model_id.to_string(),
        })
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }
}

impl Classifier {
    fn score(&self, pairs: &[(String, String)]) -> Result<Vec<f32>> {
        if pairs.is_empty() {
            return Ok(Vec::new());
        }

        let inputs: Vec<(&str, &str)> = pairs
            .iter()
            .map(|(q, p)| (q.as_str(), p.as_str()))
            .collect();
        let encodings = self.tokenizer
            .encode_batch(inputs, true)
            .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))?;

        let ids: Vec<Vec<u32>> = encodings.iter().map(|e| e.get_ids().to_vec()).collect();
        let type_ids: Vec<Vec<u32>> = encodings.iter().map(|e| e.get_type_ids().to_vec()).collect();
        let masks: Vec<Vec<u32>> = encodings
            .iter()
            .map(|e| e.get_attention_mask().to_vec())
            .collect();

        let batch_size = pairs.len();
        let (flat_ids, max_len) = pad_rows(&ids);
        let (flat_types, _) = pad_rows(&type_ids);
        let (flat_mask, _) = pad_rows(&masks);

        let token_ids = Tensor::from_vec(flat_ids, (batch_size, max_len), &self.device)?;
        let token_type_ids = Tensor::from_vec(flat_types, (batch_size, max_len), &self.device)?;
        let attention_mask = Tensor::from_vec(flat_mask, (batch_size, max_len), &self.device)?;

        let hidden = self
            .bert
            .forward(&token_ids, &token_type_ids, Some(&attention_mask))?;
        let cls = hidden.i((.., 0))?;
        let pooled = self.pooler.forward(&cls)?.tanh()?;
        let logits = self.head.forward(&pooled)?.squeeze(1)?;
        let scores = candle_nn::ops::sigmoid(&logits)?;

        Ok(scores.to_vec1::<f32>()?)
    }
}

#[async_trait]
impl ScoringBackend for CrossEncoder {
    async fn score_batch(&self, pairs: &[(String, String)]) -> Result<Vec<f32>, RerankError> {
        let inner = Arc::clone(&self.inner);
        let pairs = pairs.to_vec();

        tokio::task::spawn_blocking(move || inner.score(&pairs))
            .await?
            .map_err(|e| RerankError::Model(format!("{:#}", e)))
    }

    fn name(&self) -> &str {
        &self.model_id
    }
}

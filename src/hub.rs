// Hugging Face hub download + BERT loading shared by the local models
use anyhow::{Context, Result};
use candle_core::{DType, Device};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::Config;
use hf_hub::{api::sync::Api, Repo, RepoType};
use std::path::PathBuf;
use tokenizers::{Tokenizer, TruncationParams};
use tracing::info;

/// Longest sequence BERT-family models accept
pub const MAX_SEQUENCE_LENGTH: usize = 512;

/// Files needed to build a BERT model with candle
pub struct BertArtifacts {
    pub config: Config,
    pub tokenizer: Tokenizer,
    weights: Weights,
}

enum Weights {
    SafeTensors(PathBuf),
    Pytorch(PathBuf),
}

impl BertArtifacts {
    /// Download (or reuse the hub cache for) config, tokenizer and weights
    pub fn fetch(model_id: &str) -> Result<Self> {
        info!(model = model_id, "Loading model from Hugging Face hub");

        let api = Api::new().context("Failed to create HuggingFace API client")?;
        let repo = api.repo(Repo::new(model_id.to_string(), RepoType::Model));

        let config_path = repo.get("config.json")
            .context("Failed to download model config")?;
        let tokenizer_path = repo.get("tokenizer.json")
            .context("Failed to download tokenizer")?;
        // Older checkpoints only ship PyTorch weights
        let weights = match repo.get("model.safetensors") {
            Ok(path) => Weights::SafeTensors(path),
            Err(_) => Weights::Pytorch(
                repo.get("pytorch_model.bin")
                    .context("Failed to download model weights")?,
            ),
        };

        let config_contents = std::fs::read_to_string(config_path)
            .context("Failed to read config file")?;
        let config: Config = serde_json::from_str(&config_contents)
            .context("Failed to parse model config")?;

        let mut tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_SEQUENCE_LENGTH,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("Failed to configure truncation: {}", e))?;

        Ok(Self {
            config,
            tokenizer,
            weights,
        })
    }

    /// Variable builder over the downloaded weights
    pub fn var_builder(&self, device: &Device) -> Result<VarBuilder<'static>> {
        let vb = match &self.weights {
            Weights::SafeTensors(path) => unsafe {
                VarBuilder::from_mmaped_safetensors(&[path], DType::F32, device)
                    .context("Failed to load model weights")?
            },
            Weights::Pytorch(path) => VarBuilder::from_pth(path, DType::F32, device)
                .context("Failed to load model weights")?,
        };
        Ok(vb)
    }
}

/// Right-pad token rows to a common length, returning `(flat, max_len)`
pub fn pad_rows(rows: &[Vec<u32>]) -> (Vec<u32>, usize) {
    let max_len = rows.iter().map(|r| r.len()).max().unwrap_or(0);
    let mut flat = Vec::with_capacity(rows.len() * max_len);
    for row in rows {
        flat.extend_from_slice(row);
        flat.extend(std::iter::repeat(0).take(max_len - row.len()));
    }
    (flat, max_len)
}

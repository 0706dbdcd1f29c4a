//! OpenAI-compatible embeddings client
//!
//! Calls `POST {base_url}/embeddings` with a single input string and reads
//! back `data[0].embedding`.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::embedding::EmbeddingBackend;
use crate::errors::EmbeddingError;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "text-embedding-ada-002";

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// HTTP embedding backend
pub struct OpenAiEmbeddings {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAiEmbeddings {
    /// Create a new client
    ///
    /// # Arguments
    /// * `base_url` - API root, e.g. `https://api.openai.com/v1`
    /// * `model` - Embedding model name
    /// * `api_key` - Bearer token; omitted for local OpenAI-compatible servers
    /// * `timeout` - Per-request timeout
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, EmbeddingError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

/// Pull the first vector out of a response body
fn parse_embedding(body: &str) -> Result<Vec<f32>, EmbeddingError> {
    let response: EmbeddingResponse = serde_json::from_str(body)
        .map_err(|e| EmbeddingError::MalformedResponse(e.to_string()))?;

    let vector = response
        .data
        .into_iter()
        .next()
        .map(|d| d.embedding)
        .ok_or_else(|| EmbeddingError::MalformedResponse("response has no data".to_string()))?;

    if vector.is_empty() {
        return Err(EmbeddingError::MalformedResponse(
            "embedding vector is empty".to_string(),
        ));
    }

    Ok(vector)
}

#[async_trait]
impl EmbeddingBackend for OpenAiEmbeddings {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let url = format!("{}/embeddings", self.base_url);

        let mut request = self
            .client
            .post(&url)
            .json(&json!({ "model": self.model, "input": text }));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(EmbeddingError::Status {
                status: status.as_u16(),
                body,
            });
        }

        parse_embedding(&body)
    }

    fn name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> OpenAiEmbeddings {
        OpenAiEmbeddings::new(DEFAULT_BASE_URL, DEFAULT_MODEL, None, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_client_creation() {
        let client = client();
        assert_eq!(client.base_url(), "https://api.openai.com/v1");
        assert_eq!(client.model(), "text-embedding-ada-002");
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let client = OpenAiEmbeddings::new(
            "http://localhost:8080/v1/",
            "m",
            None,
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080/v1");
    }

    #[test]
    fn test_parse_first_embedding() {
        let body = r#"{"object":"list","data":[{"object":"embedding","index":0,"embedding":[0.1,-0.2,0.3]}],"model":"m"}"#;
        assert_eq!(parse_embedding(body).unwrap(), vec![0.1, -0.2, 0.3]);
    }

    #[test]
    fn test_parse_rejects_malformed_payloads() {
        for body in [
            "not json",
            r#"{"data": []}"#,
            r#"{"data": [{"embedding": []}]}"#,
            r#"{"error": {"message": "bad"}}"#,
        ] {
            let err = parse_embedding(body).unwrap_err();
            assert!(
                matches!(err, EmbeddingError::MalformedResponse(_)),
                "expected malformed for {}",
                body
            );
        }
    }

    #[tokio::test]
    #[ignore] // Requires network access and OPENAI_API_KEY
    async fn test_embed_integration() {
        let key = std::env::var("OPENAI_API_KEY").ok();
        let client =
            OpenAiEmbeddings::new(DEFAULT_BASE_URL, DEFAULT_MODEL, key, Duration::from_secs(30))
                .unwrap();
        let vector = client.embed("hello").await.unwrap();
        assert_eq!(vector.len(), 1536);
    }
}

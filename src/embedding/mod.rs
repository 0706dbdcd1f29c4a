// Text embedding: the backend seam, its implementations, and the bounded
// cache that sits in front of them.

pub mod cache;
pub mod local;
pub mod openai;

use async_trait::async_trait;
use std::sync::Arc;

use crate::errors::EmbeddingError;

pub use cache::{CacheStats, EmbeddingCache, DEFAULT_MAX_CACHE_SIZE};
pub use local::LocalEmbeddings;
pub use openai::OpenAiEmbeddings;

/// External embedding service: text in, fixed-dimension vector out.
///
/// Implementations must be deterministic per exact input string; the cache
/// keys on the raw text and relies on re-embedding reproducing the vector.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Short identifier for logs
    fn name(&self) -> &str;
}

#[async_trait]
impl<T: EmbeddingBackend + ?Sized> EmbeddingBackend for Box<T> {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        (**self).embed(text).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[async_trait]
impl<T: EmbeddingBackend + ?Sized> EmbeddingBackend for Arc<T> {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        (**self).embed(text).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

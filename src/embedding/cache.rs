// Bounded text -> vector memo in front of an embedding backend
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::embedding::EmbeddingBackend;
use crate::errors::EmbeddingError;

/// Default entry ceiling before a full flush
pub const DEFAULT_MAX_CACHE_SIZE: usize = 10_000;

/// Counters describing cache behaviour since construction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub clears: u64,
    pub entries: usize,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<String, Vec<f32>>,
    hits: u64,
    misses: u64,
    clears: u64,
}

/// Embedding cache with full-clear eviction.
///
/// Entries are never evicted one at a time: once the map holds `max_size`
/// entries, the next miss empties it before inserting. The size check, the
/// clear and the insert happen under one lock, so the map never holds more
/// than `max_size` entries. The backend call itself runs outside the lock.
pub struct EmbeddingCache<B> {
    backend: B,
    state: Mutex<CacheState>,
    max_size: usize,
}

impl<B: EmbeddingBackend> EmbeddingCache<B> {
    /// Create cache with the default ceiling
    pub fn new(backend: B) -> Self {
        Self::with_max_size(backend, DEFAULT_MAX_CACHE_SIZE)
    }

    /// Create cache with a custom ceiling (at least 1)
    pub fn with_max_size(backend: B, max_size: usize) -> Self {
        Self {
            backend,
            state: Mutex::new(CacheState::default()),
            max_size: max_size.max(1),
        }
    }

    /// Embed `text`, consulting the cache first
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        {
            let mut state = self.state.lock().await;
            let cached = state.entries.get(text).cloned();
            if let Some(vector) = cached {
                state.hits += 1;
                return Ok(vector);
            }
            state.misses += 1;
        }

        let vector = self.backend.embed(text).await?;

        let mut state = self.state.lock().await;
        // A concurrent caller may have stored the same text meanwhile
        if !state.entries.contains_key(text) {
            if state.entries.len() >= self.max_size {
                info!(size = state.entries.len(), "Clearing embedding cache");
                state.entries.clear();
                state.clears += 1;
            }
            state.entries.insert(text.to_string(), vector.clone());
        }

        Ok(vector)
    }

    /// Pre-embed a batch of texts (e.g. the whole corpus at startup)
    pub async fn warm<'a, I>(&self, texts: I) -> Result<usize, EmbeddingError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut count = 0;
        for text in texts {
            self.embed(text).await?;
            count += 1;
        }
        debug!(count, backend = self.backend.name(), "Embedding cache warmed");
        Ok(count)
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.entries.is_empty()
    }

    pub async fn contains(&self, text: &str) -> bool {
        self.state.lock().await.entries.contains_key(text)
    }

    /// Drop every entry; counters are kept
    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        state.entries.clear();
        state.clears += 1;
    }

    pub async fn stats(&self) -> CacheStats {
        let state = self.state.lock().await;
        CacheStats {
            hits: state.hits,
            misses: state.misses,
            clears: state.clears,
            entries: state.entries.len(),
        }
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

// Retrievable corpus units
use serde::{Deserialize, Serialize};
use std::fmt;

/// Source feed a chunk came from; drives prompt partitioning downstream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkType {
    Regulation,
    Qa,
}

impl ChunkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Regulation => "regulation",
            Self::Qa => "qa",
        }
    }
}

impl fmt::Display for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A retrievable unit of text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique within the corpus
    pub id: String,
    /// Exact text embedded, reranked and injected into the prompt
    pub content: String,
    /// Human-readable topical label
    pub section: String,
    #[serde(rename = "type")]
    pub chunk_type: ChunkType,
}

/// Full ordered corpus: regulation chunks first, then QA chunks.
///
/// Immutable once built; share it behind an `Arc`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorpusChunkSet {
    chunks: Vec<Chunk>,
}

impl CorpusChunkSet {
    pub fn new(chunks: Vec<Chunk>) -> Self {
        Self { chunks }
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Chunk> {
        self.chunks.iter()
    }

    pub fn as_slice(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Look up a chunk by id
    pub fn get(&self, id: &str) -> Option<&Chunk> {
        self.chunks.iter().find(|c| c.id == id)
    }

    /// Number of chunks of the given type
    pub fn count_by_type(&self, chunk_type: ChunkType) -> usize {
        self.chunks
            .iter()
            .filter(|c| c.chunk_type == chunk_type)
            .count()
    }
}

impl<'a> IntoIterator for &'a CorpusChunkSet {
    type Item = &'a Chunk;
    type IntoIter = std::slice::Iter<'a, Chunk>;

    fn into_iter(self) -> Self::IntoIter {
        self.chunks.iter()
    }
}

// Corpus loading: turns the regulation document and the Q&A dataset into
// one flat, ordered set of retrievable chunks.

pub mod chunk;
pub mod loader;

pub use chunk::{Chunk, ChunkType, CorpusChunkSet};
pub use loader::{chunk_qa, chunk_regulations, CorpusLoader, QaDataset};

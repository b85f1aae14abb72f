// LanceDB vector database module
// Stores one record per rulebook chunk, keyed by a deterministic id string


pub mod vector_store;

use serde::{Deserialize, Serialize};

pub use vector_store::{SearchResult, StoredChunk, VectorStore};

/// A chunk record as written to LanceDB.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorRecord {
    /// Deterministic id: `{game_name}_{section_with_underscores}_{chunk_index}`.
    pub id: String,
    pub vector: Vec<f32>,
    pub metadata: ChunkMetadata,
}

/// Metadata stored alongside each chunk embedding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChunkMetadata {
    pub game_id: u32,
    pub game_name: String,
    /// Canonical section title this chunk belongs to.
    pub section_name: String,
    /// Full text of the parent section, repeated on every chunk so a single
    /// record is enough to reconstruct the section.
    pub section_text: String,
    /// The chunk substring that was embedded.
    pub chunk_text: String,
    /// 0-based position of this chunk within its section.
    pub chunk_index: u32,
    /// RFC 3339 timestamp of when the record was written.
    pub created_at: String,
}

/// Build the deterministic record id for a chunk. Section spaces become
/// underscores; the game name is used verbatim, which makes `"{game_name}_"`
/// the retrieval scan prefix.
#[inline]
pub fn vector_record_id(game_name: &str, section_name: &str, chunk_index: usize) -> String {
    format!(
        "{}_{}_{}",
        game_name,
        section_name.replace(' ', "_"),
        chunk_index
    )
}

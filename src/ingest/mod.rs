#[cfg(test)]
mod tests;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::config::{ChunkingConfig, Config};
use crate::database::lancedb::{ChunkMetadata, VectorRecord, VectorStore, vector_record_id};
use crate::database::registry::{GameRecord, GameRegistry};
use crate::embeddings::{Embedder, split_text};
use crate::segmenter::Segmenter;
use crate::{RagError, Result};

/// Write-side pipeline: registry lookup, segmentation, chunking, embedding,
/// vector store upsert, registry commit.
///
/// The whole context is constructed once and injected, so tests can swap the
/// embedding backend for a deterministic stub. Re-ingesting the same document
/// is idempotent: chunk ids are deterministic and the store overwrites by id.
pub struct Ingestor<E: Embedder> {
    registry: GameRegistry,
    segmenter: Segmenter,
    chunking: ChunkingConfig,
    embedder: E,
    store: VectorStore,
}

/// Outcome of one ingestion call, including partial-failure counts so the
/// caller can decide whether to retry the whole document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub game_id: u32,
    pub game_name: String,
    /// Canonical sections recognized in the document, in order of appearance.
    pub sections: Vec<String>,
    pub chunks_written: usize,
    /// Chunks whose embedding failed; their records were skipped.
    pub chunks_failed: usize,
    /// Whether this ingestion added the game to the registry.
    pub registry_updated: bool,
}

impl<E: Embedder> Ingestor<E> {
    #[inline]
    pub async fn new(config: &Config, embedder: E) -> Result<Self> {
        let registry = GameRegistry::new(config.registry_path());
        let segmenter = Segmenter::new(&config.section_titles())?;
        let store = VectorStore::new(config).await?;

        Ok(Self {
            registry,
            segmenter,
            chunking: config.chunking,
            embedder,
            store,
        })
    }

    /// Ingest one rulebook. `text` is a single blob, either extracted from an
    /// uploaded document or generated prose; the pipeline does not care which.
    ///
    /// The registry is only committed after the chunks are stored, so a
    /// failure anywhere earlier leaves the mapping untouched. The vector
    /// store may hold partial writes after a mid-ingestion crash; a retry
    /// overwrites them because ids are deterministic.
    #[inline]
    pub async fn ingest(&self, game_name: &str, text: &str) -> Result<IngestReport> {
        info!("Starting ingestion for game '{}'", game_name);

        let (game_id, _snapshot) = self.registry.get_or_create_id(game_name)?;
        debug!("Resolved game id {} for '{}'", game_id, game_name);

        let sections = self.segmenter.segment(text);
        if sections.is_empty() {
            return Err(RagError::EmptyDocument(format!(
                "no canonical sections recognized in document for '{}'",
                game_name
            )));
        }

        // One planned record per chunk, preserving section and index.
        let mut planned: Vec<(String, String, usize, String)> = Vec::new();
        for (section_name, section_text) in &sections {
            let chunks = split_text(section_text, &self.chunking);
            debug!("Section '{}' split into {} chunks", section_name, chunks.len());
            for (index, chunk) in chunks.into_iter().enumerate() {
                planned.push((section_name.clone(), section_text.clone(), index, chunk));
            }
        }
        if planned.is_empty() {
            return Err(RagError::EmptyDocument(format!(
                "recognized sections of '{}' contained no text to chunk",
                game_name
            )));
        }

        let created_at = Utc::now().to_rfc3339();
        let mut records = Vec::with_capacity(planned.len());
        let mut chunks_failed = 0;

        for (section_name, section_text, index, chunk) in planned {
            let id = vector_record_id(game_name, &section_name, index);
            match self.embedder.embed(&chunk) {
                Ok(vector) => {
                    records.push(VectorRecord {
                        id,
                        vector,
                        metadata: ChunkMetadata {
                            game_id,
                            game_name: game_name.to_string(),
                            section_name,
                            section_text,
                            chunk_text: chunk,
                            chunk_index: index as u32,
                            created_at: created_at.clone(),
                        },
                    });
                }
                Err(e) => {
                    warn!("Skipping chunk '{}': embedding failed: {}", id, e);
                    chunks_failed += 1;
                }
            }
        }

        if records.is_empty() {
            return Err(RagError::Embedding(format!(
                "all {} chunk embeddings failed for '{}'",
                chunks_failed, game_name
            )));
        }

        let chunks_written = records.len();
        self.store.upsert_batch(records).await?;

        // Commit only now, and against a fresh read of the mapping: the
        // provisional id window stays open until the chunks are durably
        // stored.
        let latest = self.registry.load()?;
        let registry_updated = if latest.iter().any(|r| r.name == game_name) {
            false
        } else {
            let mut updated = latest;
            updated.push(GameRecord {
                id: game_id,
                name: game_name.to_string(),
            });
            self.registry.commit(&updated)?;
            info!("Game '{}' added to registry with id {}", game_name, game_id);
            true
        };

        info!(
            "Ingested '{}': {} chunks written, {} failed, across {} sections",
            game_name,
            chunks_written,
            chunks_failed,
            sections.len()
        );

        Ok(IngestReport {
            game_id,
            game_name: game_name.to_string(),
            sections: sections.into_iter().map(|(name, _)| name).collect(),
            chunks_written,
            chunks_failed,
            registry_updated,
        })
    }

    /// The underlying store, for callers that follow ingestion with reads.
    #[inline]
    pub fn store(&self) -> &VectorStore {
        &self.store
    }
}


use tracing::{debug, info, warn};

use crate::config::Config;
use crate::database::lancedb::{SearchResult, VectorStore};
use crate::database::registry::GameRegistry;
use crate::embeddings::Embedder;
use crate::{RagError, Result};

/// Read-side pipeline: registry lookup, full store scan, per-section
/// reconstruction.
///
/// Retrieval is keyed by the deterministic id prefix `"{game_name}_"` rather
/// than any native store filter, matching the write-side id convention. The
/// scan is O(total corpus) per call, which is acceptable at per-game
/// document scale.
pub struct Retriever {
    registry: GameRegistry,
    store: VectorStore,
    section_titles: Vec<String>,
}

/// Everything retrieval knows about one game, one entry per canonical
/// section in config order. Sections that were never ingested are present
/// with empty `text` and `chunk_text`, which is distinct from the game not
/// existing at all (`None` from the fetch methods).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameMetadata {
    pub id: u32,
    pub game_name: String,
    pub sections: Vec<SectionMetadata>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionMetadata {
    pub name: String,
    /// Full section text, taken from the first chunk record seen for the
    /// section.
    pub text: String,
    /// Chunk texts in chunk-index order.
    pub chunk_text: Vec<String>,
}

impl GameMetadata {
    #[inline]
    pub fn section(&self, name: &str) -> Option<&SectionMetadata> {
        self.sections.iter().find(|s| s.name == name)
    }
}

impl Retriever {
    #[inline]
    pub async fn new(config: &Config) -> Result<Self> {
        let registry = GameRegistry::new(config.registry_path());
        let store = VectorStore::new(config).await?;

        Ok(Self {
            registry,
            store,
            section_titles: config.section_titles(),
        })
    }

    /// Fetch the per-section structure for a game id. `None` means the id is
    /// not registered, a normal outcome the caller must distinguish from a
    /// registered game with empty sections.
    #[inline]
    pub async fn fetch_metadata(&self, game_id: u32) -> Result<Option<GameMetadata>> {
        let Some(game_name) = self.registry.find_name_by_id(game_id)? else {
            info!("No game registered with id {}", game_id);
            return Ok(None);
        };
        debug!("Resolved game id {} to '{}'", game_id, game_name);

        let mut sections: Vec<SectionMetadata> = self
            .section_titles
            .iter()
            .map(|name| SectionMetadata {
                name: name.clone(),
                text: String::new(),
                chunk_text: Vec::new(),
            })
            .collect();

        let prefix = format!("{}_", game_name);
        let mut matched = 0usize;
        let mut ordered: Vec<Vec<(u32, String)>> = vec![Vec::new(); sections.len()];
        for chunk in self.store.get_all().await? {
            if !chunk.id.starts_with(&prefix) {
                continue;
            }
            matched += 1;

            let section_name = &chunk.metadata.section_name;
            let Some(position) = sections.iter().position(|s| &s.name == section_name) else {
                warn!("Record '{}' has non-canonical section '{}'", chunk.id, section_name);
                continue;
            };

            // The full section text rides on every chunk; keep the first.
            if sections[position].text.is_empty() {
                sections[position].text = chunk.metadata.section_text;
            }
            ordered[position].push((chunk.metadata.chunk_index, chunk.metadata.chunk_text));
        }

        // Store scan order is not guaranteed, so chunks are re-ordered by
        // their index within the section.
        for (section, mut chunks) in sections.iter_mut().zip(ordered) {
            chunks.sort_by_key(|(index, _)| *index);
            section.chunk_text = chunks.into_iter().map(|(_, text)| text).collect();
        }

        debug!("Matched {} records for '{}'", matched, game_name);

        Ok(Some(GameMetadata {
            id: game_id,
            game_name,
            sections,
        }))
    }

    /// Resolve a game name to its id, then fetch its per-section structure.
    #[inline]
    pub async fn fetch_metadata_by_name(&self, game_name: &str) -> Result<Option<GameMetadata>> {
        let Some(game_id) = self.registry.find_id_by_name(game_name)? else {
            info!("No game registered with name '{}'", game_name);
            return Ok(None);
        };
        self.fetch_metadata(game_id).await
    }

    /// Rank stored chunks by similarity to a free-text query. This is the
    /// loose lookup path; canonical retrieval goes through
    /// [`Self::fetch_metadata`].
    #[inline]
    pub async fn search<E: Embedder>(
        &self,
        embedder: &E,
        query: &str,
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        let query_vector = embedder.embed(query)?;
        self.store.search_similar(&query_vector, limit).await
    }

    /// All registered games, for listings.
    #[inline]
    pub fn list_games(&self) -> Result<Vec<crate::database::registry::GameRecord>> {
        self.registry.list()
    }

    /// Render a not-found error for the CLI boundary.
    #[inline]
    pub fn not_found(game: &str) -> RagError {
        RagError::GameNotFound(format!(
            "'{}' is not in the registry; ingest its rules first",
            game
        ))
    }
}

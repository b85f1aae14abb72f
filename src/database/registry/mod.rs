
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{RagError, Result};

/// One entry in the collection mapping file. The on-disk field names are the
/// wire format consumed by external tooling and must not change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameRecord {
    #[serde(rename = "ID")]
    pub id: u32,
    #[serde(rename = "Game Name")]
    pub name: String,
}

/// Persisted mapping from game name to its stable integer identifier.
///
/// The mapping is the source of truth for "does this game already exist". Ids
/// are assigned as `len + 1` and never reused; commits replace the whole file
/// atomically and are serialized through an internal lock so two concurrent
/// first-time ingestions cannot interleave their appends.
#[derive(Debug)]
pub struct GameRegistry {
    path: PathBuf,
    commit_lock: Mutex<()>,
}

impl GameRegistry {
    #[inline]
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            commit_lock: Mutex::new(()),
        }
    }

    /// Read the full mapping. A missing file is the bootstrap case and yields
    /// an empty mapping; a file that exists but does not parse is fatal.
    #[inline]
    pub fn load(&self) -> Result<Vec<GameRecord>> {
        if !self.path.exists() {
            warn!("Registry mapping not found at {:?}, starting empty", self.path);
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path)?;
        let records: Vec<GameRecord> = serde_json::from_str(&content).map_err(|e| {
            RagError::Config(format!(
                "Malformed registry mapping at {}: {}",
                self.path.display(),
                e
            ))
        })?;

        debug!("Loaded {} registry entries from {:?}", records.len(), self.path);
        Ok(records)
    }

    /// Look up `name` and return its id plus the mapping snapshot the lookup
    /// ran against. Unknown names get a provisional id of `len + 1`; nothing
    /// is persisted until [`Self::commit`].
    #[inline]
    pub fn get_or_create_id(&self, name: &str) -> Result<(u32, Vec<GameRecord>)> {
        let mapping = self.load()?;

        if let Some(record) = mapping.iter().find(|r| r.name == name) {
            debug!("Found existing game id {} for '{}'", record.id, name);
            return Ok((record.id, mapping));
        }

        let new_id = mapping.len() as u32 + 1;
        debug!("Assigned provisional game id {} for '{}'", new_id, name);
        Ok((new_id, mapping))
    }

    /// Replace the persisted mapping with `records`, atomically. Callers
    /// append the new record themselves after a successful ingestion.
    #[inline]
    pub fn commit(&self, records: &[GameRecord]) -> Result<()> {
        let _guard = self
            .commit_lock
            .lock()
            .map_err(|_| RagError::Registry("Registry commit lock poisoned".to_string()))?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(records)
            .map_err(|e| RagError::Registry(format!("Failed to serialize mapping: {}", e)))?;

        // Write-then-rename so readers never observe a half-written file.
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, content)?;
        fs::rename(&tmp_path, &self.path)?;

        info!("Committed {} registry entries to {:?}", records.len(), self.path);
        Ok(())
    }

    /// Resolve a game id to its name, if registered.
    #[inline]
    pub fn find_name_by_id(&self, id: u32) -> Result<Option<String>> {
        let mapping = self.load()?;
        Ok(mapping.into_iter().find(|r| r.id == id).map(|r| r.name))
    }

    /// Resolve a game name to its id, if registered. Exact, case-sensitive.
    #[inline]
    pub fn find_id_by_name(&self, name: &str) -> Result<Option<u32>> {
        let mapping = self.load()?;
        Ok(mapping.into_iter().find(|r| r.name == name).map(|r| r.id))
    }

    /// All registered games in file order.
    #[inline]
    pub fn list(&self) -> Result<Vec<GameRecord>> {
        self.load()
    }
}

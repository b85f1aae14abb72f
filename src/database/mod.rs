// Database module
// Dual persistence: a JSON mapping file for game identity (registry) and
// LanceDB for chunk embeddings (lancedb)

pub mod lancedb;
pub mod registry;

pub use registry::{GameRecord, GameRegistry};

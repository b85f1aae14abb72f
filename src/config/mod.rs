// Configuration management module
// Handles TOML configuration for the pipeline: embedding backend, chunking
// budgets, and the canonical rulebook section list

pub mod settings;

pub use settings::{ChunkingConfig, Config, ConfigError, OllamaConfig, SectionSpec};

/// Get the default base directory for application data
#[inline]
pub fn default_base_dir() -> Result<std::path::PathBuf, ConfigError> {
    Config::default_base_dir()
}

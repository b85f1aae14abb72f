use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::Config;
use crate::embeddings::{Embedder, OllamaClient};
use crate::ingest::Ingestor;
use crate::prompts;
use crate::retrieve::Retriever;

/// Embedder wrapper that ticks a progress bar once per embedded chunk.
struct ProgressEmbedder<E: Embedder> {
    inner: E,
    bar: ProgressBar,
}

impl<E: Embedder> Embedder for ProgressEmbedder<E> {
    fn embed(&self, text: &str) -> crate::Result<Vec<f32>> {
        let result = self.inner.embed(text);
        self.bar.inc(1);
        result
    }
}

fn embedding_progress_bar() -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner} embedding chunks: {pos}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

/// Ingest a rulebook text file. The game name defaults to the file stem.
#[inline]
pub async fn ingest_document(config: &Config, file: &Path, name: Option<String>) -> Result<()> {
    let game_name = match name {
        Some(name) => name,
        None => file
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .context("Cannot derive a game name from the file path; pass --name")?,
    };

    info!("Ingesting '{}' from {}", game_name, file.display());
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read document: {}", file.display()))?;

    let client = OllamaClient::new(&config.ollama)?;
    let bar = embedding_progress_bar();
    let ingestor = Ingestor::new(
        config,
        ProgressEmbedder {
            inner: client,
            bar: bar.clone(),
        },
    )
    .await?;

    let report = ingestor.ingest(&game_name, &text).await?;
    bar.finish_and_clear();

    println!("Ingested '{}' (ID: {})", report.game_name, report.game_id);
    println!("  Sections: {}", report.sections.join(", "));
    println!("  Chunks written: {}", report.chunks_written);
    if report.chunks_failed > 0 {
        println!(
            "  Chunks failed: {} (re-run to retry; ingestion overwrites in place)",
            report.chunks_failed
        );
    }
    if report.registry_updated {
        println!("  Added to registry");
    }

    Ok(())
}

/// Print the per-section metadata for a game, looked up by id or name.
#[inline]
pub async fn retrieve_game(config: &Config, game: &str) -> Result<()> {
    let retriever = Retriever::new(config).await?;

    let metadata = match game.parse::<u32>() {
        Ok(id) => retriever.fetch_metadata(id).await?,
        Err(_) => retriever.fetch_metadata_by_name(game).await?,
    };

    let Some(metadata) = metadata else {
        return Err(Retriever::not_found(game).into());
    };

    println!("{} (ID: {})", metadata.game_name, metadata.id);
    for section in &metadata.sections {
        println!();
        println!("## {}", section.name);
        if section.text.is_empty() {
            println!("Not available");
        } else {
            println!("{}", section.text);
            println!("  ({} chunks stored)", section.chunk_text.len());
        }
    }

    Ok(())
}

/// Print the code-generation prompt for an already-ingested game.
#[inline]
pub async fn prompt_for_game(config: &Config, game: &str) -> Result<()> {
    let retriever = Retriever::new(config).await?;

    let metadata = match game.parse::<u32>() {
        Ok(id) => retriever.fetch_metadata(id).await?,
        Err(_) => retriever.fetch_metadata_by_name(game).await?,
    };

    let Some(metadata) = metadata else {
        return Err(Retriever::not_found(game).into());
    };

    println!("{}", prompts::code_prompt(&metadata, &config.sections));
    Ok(())
}

/// Print the rules-generation prompt for a game that does not exist yet.
#[inline]
pub fn design_prompt(config: &Config, game_name: &str) {
    println!("{}", prompts::rules_prompt(game_name, &config.sections));
}

/// Rank stored chunks by similarity to a free-text query.
#[inline]
pub async fn search_chunks(config: &Config, query: &str, limit: usize) -> Result<()> {
    let retriever = Retriever::new(config).await?;
    let client = OllamaClient::new(&config.ollama)?;

    let results = retriever.search(&client, query, limit).await?;
    if results.is_empty() {
        println!("No matching chunks found.");
        return Ok(());
    }

    for result in results {
        println!(
            "[{:.3}] {} / {} (chunk {})",
            result.similarity_score,
            result.metadata.game_name,
            result.metadata.section_name,
            result.metadata.chunk_index
        );
        println!("    {}", result.metadata.chunk_text);
    }

    Ok(())
}

/// List all registered games.
#[inline]
pub async fn list_games(config: &Config) -> Result<()> {
    let retriever = Retriever::new(config).await?;
    let games = retriever.list_games()?;

    if games.is_empty() {
        println!("No games have been ingested yet.");
        println!("Use 'rulerag ingest <file>' to add one.");
        return Ok(());
    }

    println!("Registered games ({} total):", games.len());
    for game in games {
        println!("  {:>4}  {}", game.id, game.name);
    }

    Ok(())
}

/// Print the active configuration.
#[inline]
pub fn show_config(config: &Config) -> Result<()> {
    println!("Base directory: {}", config.base_dir.display());
    println!("Collection: {}", config.collection);
    println!(
        "Ollama: {}://{}:{} ({})",
        config.ollama.protocol, config.ollama.host, config.ollama.port, config.ollama.model
    );
    println!(
        "Chunking: {} chars, {} overlap",
        config.chunking.chunk_size, config.chunking.chunk_overlap
    );
    println!("Sections:");
    for section in &config.sections {
        println!("  {}: {}", section.title, section.description);
    }
    Ok(())
}

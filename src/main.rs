use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use rulerag::commands::{
    design_prompt, ingest_document, list_games, prompt_for_game, retrieve_game, search_chunks,
    show_config,
};
use rulerag::config::{Config, default_base_dir};

#[derive(Parser)]
#[command(name = "rulerag")]
#[command(about = "A retrieval pipeline for game rulebooks backed by LanceDB and Ollama")]
#[command(version)]
struct Cli {
    /// Override the data directory (registry, vector store, config file)
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the active configuration
    Config,
    /// Segment, chunk, embed, and store a rulebook text file
    Ingest {
        /// Path to the rulebook text file
        file: PathBuf,
        /// Game name; defaults to the file stem
        #[arg(long)]
        name: Option<String>,
    },
    /// Print the stored sections for a game
    Retrieve {
        /// Game ID or name
        game: String,
    },
    /// Print the code-generation prompt for an ingested game
    Prompt {
        /// Game ID or name
        game: String,
    },
    /// Print the rules-generation prompt for a game that does not exist yet
    Design {
        /// Name of the new game
        name: String,
    },
    /// Rank stored chunks by similarity to a query
    Search {
        /// Free-text query
        query: String,
        /// Maximum number of results
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// List all registered games
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let base_dir = match cli.base_dir {
        Some(dir) => dir,
        None => default_base_dir()?,
    };
    let config = Config::load(&base_dir)?;

    match cli.command {
        Commands::Config => {
            show_config(&config)?;
        }
        Commands::Ingest { file, name } => {
            ingest_document(&config, &file, name).await?;
        }
        Commands::Retrieve { game } => {
            retrieve_game(&config, &game).await?;
        }
        Commands::Prompt { game } => {
            prompt_for_game(&config, &game).await?;
        }
        Commands::Design { name } => {
            design_prompt(&config, &name);
        }
        Commands::Search { query, limit } => {
            search_chunks(&config, &query, limit).await?;
        }
        Commands::List => {
            list_games(&config).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parsing() {
        let cli = Cli::try_parse_from(["rulerag", "list"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            matches!(parsed.command, Commands::List);
        }
    }

    #[test]
    fn ingest_command_with_file() {
        let cli = Cli::try_parse_from(["rulerag", "ingest", "rules/chess.txt"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Ingest { file, name } = parsed.command {
                assert_eq!(file, PathBuf::from("rules/chess.txt"));
                assert_eq!(name, None);
            }
        }
    }

    #[test]
    fn ingest_command_with_name() {
        let cli = Cli::try_parse_from(["rulerag", "ingest", "rules/chess.txt", "--name", "Chess"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Ingest { name, .. } = parsed.command {
                assert_eq!(name, Some("Chess".to_string()));
            }
        }
    }

    #[test]
    fn search_command_default_limit() {
        let cli = Cli::try_parse_from(["rulerag", "search", "how do I win"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Search { query, limit } = parsed.command {
                assert_eq!(query, "how do I win");
                assert_eq!(limit, 10);
            }
        }
    }

    #[test]
    fn global_base_dir_flag() {
        let cli = Cli::try_parse_from(["rulerag", "--base-dir", "/tmp/rag", "list"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            assert_eq!(parsed.base_dir, Some(PathBuf::from("/tmp/rag")));
        }
    }

    #[test]
    fn retrieve_requires_game() {
        let cli = Cli::try_parse_from(["rulerag", "retrieve"]);
        assert!(cli.is_err());
    }
}

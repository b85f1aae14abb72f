use super::*;
use tempfile::TempDir;

#[test]
fn default_config() {
    let config = Config::default();
    assert_eq!(config.ollama.protocol, "http");
    assert_eq!(config.ollama.host, "localhost");
    assert_eq!(config.ollama.port, 11434);
    assert_eq!(config.ollama.model, "nomic-embed-text:latest");
    assert_eq!(config.chunking.chunk_size, 300);
    assert_eq!(config.chunking.chunk_overlap, 50);
    assert_eq!(config.collection, "game_rules");
    assert_eq!(config.sections.len(), 6);
    assert_eq!(config.sections[0].title, "Overview");
    assert_eq!(config.sections[5].title, "End of Game");
}

#[test]
fn config_validation() {
    let config = Config::default();
    assert!(config.validate().is_ok());

    let mut invalid_config = config.clone();
    invalid_config.ollama.protocol = "ftp".to_string();
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.ollama.port = 0;
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.ollama.model = String::new();
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.collection = "  ".to_string();
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.sections.clear();
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config;
    invalid_config.sections.push(SectionSpec {
        title: "overview".to_string(),
        description: "duplicate, differing only in case".to_string(),
    });
    assert!(invalid_config.validate().is_err());
}

#[test]
fn chunking_validation() {
    let valid = ChunkingConfig {
        chunk_size: 300,
        chunk_overlap: 50,
    };
    assert!(valid.validate().is_ok());

    let too_small = ChunkingConfig {
        chunk_size: 10,
        chunk_overlap: 5,
    };
    assert!(too_small.validate().is_err());

    let overlap_too_large = ChunkingConfig {
        chunk_size: 300,
        chunk_overlap: 300,
    };
    assert!(overlap_too_large.validate().is_err());
}

#[test]
fn ollama_url_generation() {
    let config = Config::default();
    let url = config
        .ollama
        .ollama_url()
        .expect("should generate ollama_url successfully");
    assert_eq!(url.as_str(), "http://localhost:11434/");
}

#[test]
fn toml_round_trip() {
    let config = Config::default();
    let toml_str = toml::to_string(&config).expect("should serialize toml correctly");
    let parsed_config: Config = toml::from_str(&toml_str).expect("should parse toml correctly");
    assert_eq!(config, parsed_config);
}

#[test]
fn load_missing_config_yields_defaults() {
    let temp_dir = TempDir::new().expect("should create temp dir");

    let config = Config::load(temp_dir.path()).expect("missing config file should not error");
    assert_eq!(config.base_dir, temp_dir.path());
    assert_eq!(config.collection, "game_rules");
    assert!(config.validate().is_ok());
}

#[test]
fn load_malformed_config_is_fatal() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    std::fs::write(temp_dir.path().join("config.toml"), "collection = [not toml")
        .expect("should write file");

    assert!(Config::load(temp_dir.path()).is_err());
}

#[test]
fn save_and_reload() {
    let temp_dir = TempDir::new().expect("should create temp dir");

    let mut config = Config {
        base_dir: temp_dir.path().to_path_buf(),
        ..Config::default()
    };
    config.collection = "test_rules".to_string();
    config.chunking.chunk_size = 400;
    config.save().expect("should save config");

    let reloaded = Config::load(temp_dir.path()).expect("should reload config");
    assert_eq!(reloaded.collection, "test_rules");
    assert_eq!(reloaded.chunking.chunk_size, 400);
}

#[test]
fn registry_path_follows_collection_name() {
    let config = Config {
        base_dir: PathBuf::from("/tmp/app"),
        ..Config::default()
    };
    assert_eq!(
        config.registry_path(),
        PathBuf::from("/tmp/app/vectors/game_rules.json")
    );
}

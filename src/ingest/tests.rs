use super::*;
use tempfile::TempDir;

/// Deterministic embedding stub: same text always maps to the same vector.
struct StubEmbedder {
    dimension: usize,
}

impl Embedder for StubEmbedder {
    fn embed(&self, text: &str) -> crate::Result<Vec<f32>> {
        let seed: u32 = text.bytes().map(u32::from).sum();
        Ok((0..self.dimension)
            .map(|i| ((seed.wrapping_add(i as u32)) % 97) as f32 / 97.0)
            .collect())
    }
}

/// Fails for any chunk containing the marker, succeeds otherwise.
struct FlakyEmbedder {
    inner: StubEmbedder,
    fail_marker: &'static str,
}

impl Embedder for FlakyEmbedder {
    fn embed(&self, text: &str) -> crate::Result<Vec<f32>> {
        if text.contains(self.fail_marker) {
            return Err(crate::RagError::Embedding("backend unavailable".to_string()));
        }
        self.inner.embed(text)
    }
}

fn test_config() -> (Config, TempDir) {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let mut config = Config {
        base_dir: temp_dir.path().to_path_buf(),
        ..Config::default()
    };
    config.ollama.embedding_dimension = 8;
    (config, temp_dir)
}

async fn test_ingestor(config: &Config) -> Ingestor<StubEmbedder> {
    Ingestor::new(config, StubEmbedder { dimension: 8 })
        .await
        .expect("should build ingestor")
}

const TIC_TAC_TOE: &str = "Overview\nPlayers take turns marking squares on a three by three grid.\nHow to Play\nPlace X or O on an empty square each turn.";

#[tokio::test]
async fn successful_ingestion() {
    let (config, _temp_dir) = test_config();
    let ingestor = test_ingestor(&config).await;

    let report = ingestor
        .ingest("Tic Tac Toe", TIC_TAC_TOE)
        .await
        .expect("ingestion should succeed");

    assert_eq!(report.game_id, 1);
    assert_eq!(report.game_name, "Tic Tac Toe");
    assert_eq!(report.sections, vec!["Overview", "How to Play"]);
    assert_eq!(report.chunks_written, 2);
    assert_eq!(report.chunks_failed, 0);
    assert!(report.registry_updated);

    let count = ingestor
        .store()
        .count_records()
        .await
        .expect("should count records");
    assert_eq!(count, 2);

    let registry = GameRegistry::new(config.registry_path());
    let mapping = registry.load().expect("should load registry");
    assert_eq!(mapping.len(), 1);
    assert_eq!(mapping[0].name, "Tic Tac Toe");
}

#[tokio::test]
async fn reingestion_is_idempotent() {
    let (config, _temp_dir) = test_config();
    let ingestor = test_ingestor(&config).await;

    let first = ingestor
        .ingest("Tic Tac Toe", TIC_TAC_TOE)
        .await
        .expect("first ingestion should succeed");
    let second = ingestor
        .ingest("Tic Tac Toe", TIC_TAC_TOE)
        .await
        .expect("second ingestion should succeed");

    assert_eq!(first.game_id, second.game_id);
    assert!(first.registry_updated);
    assert!(!second.registry_updated, "registry gains nothing on re-ingest");

    // Overwrite, not append: the record count is unchanged.
    let count = ingestor
        .store()
        .count_records()
        .await
        .expect("should count records");
    assert_eq!(count, first.chunks_written as u64);

    let registry = GameRegistry::new(config.registry_path());
    assert_eq!(registry.load().expect("should load").len(), 1);
}

#[tokio::test]
async fn document_without_sections_fails_and_leaves_registry_untouched() {
    let (config, _temp_dir) = test_config();
    let ingestor = test_ingestor(&config).await;

    let result = ingestor
        .ingest("Mystery Game", "Prose with no recognizable headings whatsoever.")
        .await;

    assert!(matches!(result, Err(RagError::EmptyDocument(_))));

    let registry = GameRegistry::new(config.registry_path());
    assert!(registry.load().expect("should load").is_empty());
}

#[tokio::test]
async fn distinct_games_get_distinct_ids() {
    let (config, _temp_dir) = test_config();
    let ingestor = test_ingestor(&config).await;

    let first = ingestor
        .ingest("Tic Tac Toe", TIC_TAC_TOE)
        .await
        .expect("should ingest");
    let second = ingestor
        .ingest(
            "Chess",
            "Overview\nTwo players battle across a checkered board.",
        )
        .await
        .expect("should ingest");

    assert_eq!(first.game_id, 1);
    assert_eq!(second.game_id, 2);
}

#[tokio::test]
async fn all_embedding_failures_abort_ingestion() {
    let (config, _temp_dir) = test_config();
    let ingestor = Ingestor::new(
        &config,
        FlakyEmbedder {
            inner: StubEmbedder { dimension: 8 },
            fail_marker: "",
        },
    )
    .await
    .expect("should build ingestor");

    let result = ingestor.ingest("Tic Tac Toe", TIC_TAC_TOE).await;
    assert!(matches!(result, Err(RagError::Embedding(_))));

    let registry = GameRegistry::new(config.registry_path());
    assert!(registry.load().expect("should load").is_empty());
}

#[tokio::test]
async fn partial_embedding_failure_is_reported_not_fatal() {
    let (config, _temp_dir) = test_config();
    let ingestor = Ingestor::new(
        &config,
        FlakyEmbedder {
            inner: StubEmbedder { dimension: 8 },
            fail_marker: "empty square",
        },
    )
    .await
    .expect("should build ingestor");

    let report = ingestor
        .ingest("Tic Tac Toe", TIC_TAC_TOE)
        .await
        .expect("partial failure should still succeed");

    assert_eq!(report.chunks_written, 1);
    assert_eq!(report.chunks_failed, 1);
    assert!(report.registry_updated, "registry commit still happens");
}

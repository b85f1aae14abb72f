use super::*;

#[test]
fn client_configuration() {
    let config = OllamaConfig {
        protocol: "http".to_string(),
        host: "test-host".to_string(),
        port: 1234,
        model: "test-model".to_string(),
        max_input_chars: 512,
        embedding_dimension: 768,
    };
    let client = OllamaClient::new(&config).expect("Failed to create client");

    assert_eq!(client.model, "test-model");
    assert_eq!(client.max_input_chars, 512);
    assert_eq!(client.base_url.host_str(), Some("test-host"));
    assert_eq!(client.base_url.port(), Some(1234));
    assert_eq!(client.retry_attempts, DEFAULT_RETRY_ATTEMPTS);
}

#[test]
fn client_builder_methods() {
    let config = OllamaConfig::default();
    let client = OllamaClient::new(&config)
        .expect("Failed to create client")
        .with_timeout(Duration::from_secs(60))
        .with_retry_attempts(5);

    assert_eq!(client.retry_attempts, 5);
}

#[test]
fn embedding_endpoint_matches_request_shape() {
    let config = OllamaConfig::default();
    let client = OllamaClient::new(&config).expect("Failed to create client");

    // The single-prompt request/response types pair with /api/embeddings,
    // not the batched /api/embed endpoint.
    let url = client.embed_url().expect("should build embedding URL");
    assert_eq!(url.path(), "/api/embeddings");
}

#[test]
fn long_input_is_truncated_silently() {
    let config = OllamaConfig {
        max_input_chars: 64,
        ..OllamaConfig::default()
    };
    let client = OllamaClient::new(&config).expect("Failed to create client");

    let long_input = "word ".repeat(100);
    let truncated = client.truncate_input(&long_input);
    assert_eq!(truncated.chars().count(), 64);
    assert!(long_input.starts_with(&truncated));
}

#[test]
fn short_input_is_untouched() {
    let config = OllamaConfig::default();
    let client = OllamaClient::new(&config).expect("Failed to create client");

    assert_eq!(client.truncate_input("short text"), "short text");
    assert_eq!(client.truncate_input(""), "");
}

#[test]
fn truncation_respects_char_boundaries() {
    let config = OllamaConfig {
        max_input_chars: 70,
        ..OllamaConfig::default()
    };
    let client = OllamaClient::new(&config).expect("Failed to create client");

    let input = "Würfel ".repeat(20);
    let truncated = client.truncate_input(&input);
    assert_eq!(truncated.chars().count(), 70);
}

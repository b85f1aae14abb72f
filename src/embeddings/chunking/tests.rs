use super::*;

fn config(chunk_size: usize, chunk_overlap: usize) -> ChunkingConfig {
    ChunkingConfig {
        chunk_size,
        chunk_overlap,
    }
}

/// Prose of roughly `target` characters built from short sentences.
fn prose(target: usize) -> String {
    let sentence = "Players take turns and move their pieces around the board. ";
    let mut text = String::new();
    while text.chars().count() < target {
        text.push_str(sentence);
    }
    text.truncate(target);
    text.trim_end().to_string()
}

#[test]
fn empty_input_yields_no_chunks() {
    assert!(split_text("", &config(300, 50)).is_empty());
}

#[test]
fn short_input_is_a_single_chunk() {
    let text = prose(200);
    let chunks = split_text(&text, &config(300, 50));
    assert_eq!(chunks, vec![text]);
}

#[test]
fn chunks_respect_size_budget() {
    let text = prose(2000);
    let chunks = split_text(&text, &config(300, 50));

    assert!(chunks.len() > 1);
    for chunk in &chunks {
        assert!(
            chunk.chars().count() <= 300,
            "chunk of {} chars exceeds budget",
            chunk.chars().count()
        );
    }
}

#[test]
fn overlap_trimming_reconstructs_input() {
    let text = prose(1234);
    let chunks = split_text(&text, &config(300, 50));

    assert_eq!(reconstruct(&chunks, 50), text);
}

#[test]
fn splitting_is_deterministic() {
    let text = prose(900);
    let first = split_text(&text, &config(300, 50));
    let second = split_text(&text, &config(300, 50));
    assert_eq!(first, second);
}

#[test]
fn chunks_break_on_sentence_boundaries() {
    let text = prose(650);
    let chunks = split_text(&text, &config(300, 50));

    assert_eq!(chunks.len(), 3);
    // All but the last chunk should end right after a sentence, not mid-word.
    for chunk in &chunks[..chunks.len() - 1] {
        assert!(
            chunk.ends_with(". "),
            "chunk does not end at a sentence boundary: {:?}",
            &chunk[chunk.len().saturating_sub(20)..]
        );
    }
}

#[test]
fn paragraph_breaks_take_priority() {
    let first_paragraph = prose(200);
    let text = format!("{}\n\n{}", first_paragraph, prose(200));
    let chunks = split_text(&text, &config(300, 50));

    assert!(chunks[0].ends_with("\n\n"));
    assert_eq!(reconstruct(&chunks, 50), text);
}

#[test]
fn unbroken_run_falls_back_to_hard_cut() {
    let text = "x".repeat(700);
    let chunks = split_text(&text, &config(300, 50));

    for chunk in &chunks {
        assert!(chunk.chars().count() <= 300);
    }
    assert_eq!(reconstruct(&chunks, 50), text);
}

#[test]
fn multibyte_text_splits_on_char_boundaries() {
    let text = "Ein Würfelspiel für zwei Spieler. ".repeat(30);
    let text = text.trim_end();
    let chunks = split_text(text, &config(300, 50));

    assert!(chunks.len() > 1);
    assert_eq!(reconstruct(&chunks, 50), text);
}

#[cfg(test)]
mod tests;

use tracing::debug;

use crate::config::ChunkingConfig;

/// Split section text into overlapping, character-bounded chunks.
///
/// Each chunk is at most `chunk_size` characters. The window end snaps back
/// to the best natural boundary inside the window (paragraph break, then
/// sentence end, then word gap) before falling back to a hard cut. The next
/// chunk starts exactly `chunk_overlap` characters before the previous end,
/// so dropping each subsequent chunk's first `chunk_overlap` characters
/// reconstructs the input text. Deterministic: same input and parameters
/// always yield the same sequence.
#[inline]
pub fn split_text(text: &str, config: &ChunkingConfig) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let total = chars.len();

    if total == 0 {
        return Vec::new();
    }
    if total <= config.chunk_size {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut start = 0;

    loop {
        if total - start <= config.chunk_size {
            chunks.push(chars[start..].iter().collect());
            break;
        }

        let hard_end = start + config.chunk_size;
        let mut end = find_boundary(&chars[start..hard_end]).map_or(hard_end, |rel| start + rel);

        // A boundary too close to the window start would stall the walk once
        // the overlap is subtracted; fall back to the hard cut.
        if end <= start + config.chunk_overlap {
            end = hard_end;
        }

        chunks.push(chars[start..end].iter().collect());
        start = end - config.chunk_overlap;
    }

    debug!(
        "Split {} characters into {} chunks (size {}, overlap {})",
        total,
        chunks.len(),
        config.chunk_size,
        config.chunk_overlap
    );
    chunks
}

/// Best split point within the window, as an exclusive end offset: after the
/// last paragraph break, else after the last sentence end, else after the
/// last whitespace gap. `None` means the window is one unbroken run.
fn find_boundary(window: &[char]) -> Option<usize> {
    let len = window.len();

    for i in (1..len).rev() {
        if window[i - 1] == '\n' && window[i] == '\n' {
            return Some(i + 1);
        }
    }

    for i in (0..len.saturating_sub(1)).rev() {
        if matches!(window[i], '.' | '!' | '?') && window[i + 1].is_whitespace() {
            return Some(i + 2);
        }
    }

    for i in (0..len).rev() {
        if window[i].is_whitespace() {
            return Some(i + 1);
        }
    }

    None
}

/// Reassemble the original text from a chunk sequence produced by
/// [`split_text`], trimming the overlap duplication.
#[inline]
pub fn reconstruct(chunks: &[String], overlap: usize) -> String {
    let mut text = String::new();
    for (i, chunk) in chunks.iter().enumerate() {
        if i == 0 {
            text.push_str(chunk);
        } else {
            text.extend(chunk.chars().skip(overlap));
        }
    }
    text
}

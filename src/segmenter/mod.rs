
use anyhow::Context;
use fancy_regex::Regex;
use tracing::{debug, warn};

use crate::Result;

/// Splits a raw rulebook text blob into canonical sections.
///
/// The input is either text extracted from an uploaded document or prose
/// generated by an LLM, so headings arrive in inconsistent shapes: markdown
/// markers, numbered lists, trailing colons. Lines are cleaned first, then
/// matched against the configured canonical titles; everything between one
/// recognized heading and the next accumulates into that section.
pub struct Segmenter {
    sections: Vec<(String, Regex)>,
}

impl Segmenter {
    /// Compile one case-insensitive word-boundary pattern per canonical
    /// title. Title order is recognition priority: when a line could match
    /// several titles, the first configured one wins.
    #[inline]
    pub fn new(titles: &[String]) -> Result<Self> {
        let mut sections = Vec::with_capacity(titles.len());
        for title in titles {
            let pattern = format!(r"(?i)\b{}\b", fancy_regex::escape(title));
            let regex = Regex::new(&pattern)
                .with_context(|| format!("Invalid section title pattern for '{}'", title))?;
            sections.push((title.clone(), regex));
        }
        Ok(Self { sections })
    }

    /// Segment `text` into `(canonical_title, full_text)` pairs, in order of
    /// first appearance. Only titles actually found are present; callers must
    /// treat absence as "not available". A document with no recognized
    /// headings yields an empty list.
    #[inline]
    pub fn segment(&self, text: &str) -> Vec<(String, String)> {
        let mut sections: Vec<(String, Vec<String>)> = Vec::new();
        let mut current: Option<usize> = None;

        for raw_line in text.lines() {
            let line = clean_line(raw_line);
            if line.is_empty() {
                continue;
            }

            if let Some(title) = self.match_title(&line) {
                current = Some(match sections.iter().position(|(name, _)| name == title) {
                    Some(idx) => idx,
                    None => {
                        sections.push((title.to_string(), Vec::new()));
                        sections.len() - 1
                    }
                });
            } else if let Some(idx) = current {
                sections[idx].1.push(line);
            }
            // Lines before the first recognized heading are dropped.
        }

        if sections.is_empty() {
            warn!("No canonical section headings recognized in input");
        } else {
            debug!(
                "Segmented input into sections: {:?}",
                sections.iter().map(|(name, _)| name).collect::<Vec<_>>()
            );
        }

        sections
            .into_iter()
            .map(|(name, lines)| (name, lines.join(" ")))
            .collect()
    }

    /// First configured title that matches the cleaned line, if any.
    fn match_title(&self, line: &str) -> Option<&str> {
        for (title, regex) in &self.sections {
            if regex.is_match(line).unwrap_or(false) {
                return Some(title);
            }
        }
        None
    }
}

/// Strip formatting artifacts so heading detection sees plain words: markdown
/// heading/emphasis markers, leading numeric list markers, trailing colons.
fn clean_line(line: &str) -> String {
    let mut cleaned = line.trim();

    cleaned = cleaned.trim_start_matches('#').trim_start();

    // Leading numeric list markers like "1." or "3)".
    let digits = cleaned.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 {
        let rest = &cleaned[digits..];
        if let Some(stripped) = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
            cleaned = stripped.trim_start();
        }
    }

    cleaned
        .replace(['*', '`'], "")
        .trim_matches('_')
        .trim_end_matches(':')
        .trim()
        .to_string()
}

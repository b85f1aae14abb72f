
use std::collections::HashSet;
use std::fmt::Write;

use tracing::debug;

use crate::config::SectionSpec;
use crate::retrieve::GameMetadata;

/// Build the code-generation prompt from retrieved game metadata.
///
/// One line per configured canonical section, filled with the retrieved full
/// section text or `"Not available"` when the section was never ingested.
/// Sections whose titles differ only in case are emitted once.
#[inline]
pub fn code_prompt(metadata: &GameMetadata, sections: &[SectionSpec]) -> String {
    debug!("Generating code prompt for '{}'", metadata.game_name);

    let mut prompt = String::from(
        "You are a Python expert and you are tasked with generating the code for a game. \
         Here are the components of the game:\n",
    );

    let mut added: HashSet<String> = HashSet::new();
    for section in sections {
        if !added.insert(section.title.to_lowercase()) {
            continue;
        }

        let text = metadata
            .section(&section.title)
            .filter(|s| !s.text.is_empty())
            .map_or("Not available", |s| s.text.as_str());
        let _ = writeln!(prompt, "\n{}: {}", section.title, text);
    }

    prompt.push_str(
        "\nBased on the above information, generate the Python code for this game. \
         Make sure the game is functional and can be played in a terminal or web interface.\n",
    );

    prompt
}

/// Build the rules-generation prompt for a game that does not exist yet.
///
/// The numbered section list with descriptions tells the model exactly which
/// canonical sections to produce, so its output segments cleanly on the way
/// back into the pipeline.
#[inline]
pub fn rules_prompt(game_name: &str, sections: &[SectionSpec]) -> String {
    debug!("Generating rules prompt for '{}'", game_name);

    let mut prompt = format!(
        "You are a creative game designer and Python programmer. You need to design a new \
         game called \"{}\".\n\nPlease create detailed game rules for this new game. Include \
         the following sections:\n",
        game_name
    );

    for (idx, section) in sections.iter().enumerate() {
        let _ = writeln!(prompt, "\n{}. {}: {}", idx + 1, section.title, section.description);
    }

    prompt.push_str(
        "\nOnce the rules are established, ensure the rules can be used to generate Python \
         code to play this game. Do not generate Python code, only the rules based on the \
         above sections. Be creative and come up with a fun, interactive game idea.\n",
    );

    prompt
}

//! Context curation.
//!
//! Turns filtered passages into a single labelled context block for the
//! prompt. Strips boilerplate navigation lines, collapses whitespace,
//! and caps how many passages may reach a prompt.

use docent_core::config::RetrievalConfig;
use docent_core::types::Passage;
use tracing::debug;

use crate::filter::QualityFilter;

/// Emitted verbatim when curation leaves no usable passages.
pub const NO_CONTEXT_SENTINEL: &str = "No relevant documentation found in the knowledge base.";

/// Lines dropped during cleaning when they match exactly after trimming.
const BOILERPLATE_LINES: [&str; 5] = ["Docs", "Search", "Home", "API Reference", "Tutorials"];

/// Builds the labelled context block handed to the prompt assembler.
#[derive(Debug, Clone)]
pub struct ContextCurator {
    filter: QualityFilter,
    /// Passages allowed into a single context block.
    max_passages: usize,
    /// Minimum cleaned length for a passage to be included.
    min_curated_chars: usize,
}

impl ContextCurator {
    pub fn new(filter: QualityFilter, max_passages: usize, min_curated_chars: usize) -> Self {
        Self {
            filter,
            max_passages,
            min_curated_chars,
        }
    }

    pub fn from_config(config: &RetrievalConfig) -> Self {
        Self::new(
            QualityFilter::from_config(config),
            config.max_passages,
            config.min_curated_chars,
        )
    }

    /// Curate retrieved passages into one context block.
    ///
    /// Returns [`NO_CONTEXT_SENTINEL`] when nothing survives filtering
    /// and cleaning.
    pub fn curate(&self, passages: &[Passage]) -> String {
        let mut sections = Vec::new();

        for passage in passages {
            if sections.len() >= self.max_passages {
                break;
            }
            if !self.filter.classify(passage).is_keep() {
                continue;
            }
            let cleaned = clean_content(&passage.content);
            if cleaned.chars().count() < self.min_curated_chars {
                continue;
            }
            let label = passage.source_label.to_uppercase();
            sections.push(format!(
                "[Document {} - {}]\n{}\n",
                sections.len() + 1,
                label,
                cleaned
            ));
        }

        debug!(
            retrieved = passages.len(),
            curated = sections.len(),
            "curated context"
        );

        if sections.is_empty() {
            NO_CONTEXT_SENTINEL.to_string()
        } else {
            sections.join("\n---\n")
        }
    }
}

impl Default for ContextCurator {
    fn default() -> Self {
        Self::from_config(&RetrievalConfig::default())
    }
}

/// Drop boilerplate lines and collapse the rest onto a single line.
fn clean_content(content: &str) -> String {
    let kept: Vec<&str> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| !BOILERPLATE_LINES.contains(line))
        .collect();
    kept.join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

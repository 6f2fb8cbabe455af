//! Knowledge log parser
//!
//! Turns the raw text of a knowledge log into [`Entry`] values plus
//! aggregate metadata. Logs are edited by hand and by agents, so parsing
//! is tolerant: a block that does not match the grammar is skipped, never
//! reported as an error.
//!
//! # Grammar (version 1)
//!
//! ```text
//! ---                      <- optional frontmatter (created:/updated:/type:)
//! created: ...
//! type: knowledge
//! ---
//!
//! # Knowledge              <- optional bare title block
//!
//! ---                      <- entry separator: a line that is exactly ---
//!
//! ## 2026-01-14 - Title    <- ## [YYYY-MM-DD][ - ]Title
//! **Type:** decision       <- metadata lines, any order
//! **Topics:** auth, api
//!
//! Body...
//! ```

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use super::entry::{Entry, EntryType};
use super::tokens::estimate_tokens;

/// Bumped whenever any pattern below changes meaning
pub const GRAMMAR_VERSION: u32 = 1;

/// Entry separator line
pub const ENTRY_SEPARATOR: &str = "---";

/// Title line written at the top of new logs
pub const LOG_TITLE: &str = "# Knowledge";

/// Metadata line prefixes
pub const TYPE_PREFIX: &str = "**Type:**";
pub const TOPICS_PREFIX: &str = "**Topics:**";

/// Entry heading: `## [YYYY-MM-DD][ - ]Title`
pub const HEADING_PATTERN: &str = r"^##\s+(?:(\d{4}-\d{2}-\d{2})\s*-?\s*)?(.+)$";
const TYPE_PATTERN: &str = r"^\*\*Type:\*\*\s*(\w+)";
const TOPICS_PATTERN: &str = r"^\*\*Topics:\*\*\s*(.+)$";
const FRONTMATTER_KEY_PATTERN: &str = r"(?m)^(created|type):";

static HEADING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(HEADING_PATTERN).expect("heading pattern is valid"));
static TYPE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(TYPE_PATTERN).expect("type pattern is valid"));
static TOPICS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(TOPICS_PATTERN).expect("topics pattern is valid"));
static FRONTMATTER_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(FRONTMATTER_KEY_PATTERN).expect("frontmatter pattern is valid"));

/// Result of parsing one knowledge log
#[derive(Debug, Clone, Default, Serialize)]
pub struct ParsedLog {
    /// Entries in source order
    pub entries: Vec<Entry>,

    /// Estimate over the whole raw text, frontmatter included
    pub token_count: usize,

    /// Sorted, deduplicated union of entry topics
    pub topics: Vec<String>,

    pub oldest_date: Option<String>,
    pub newest_date: Option<String>,

    /// The raw text that was parsed
    #[serde(skip)]
    pub source: String,
}

impl ParsedLog {
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Entries matching `topic` (see [`Entry::matches_topic`])
    pub fn filter_by_topic(&self, topic: &str) -> Vec<&Entry> {
        self.entries.iter().filter(|e| e.matches_topic(topic)).collect()
    }

    pub fn entries_of_type(&self, entry_type: EntryType) -> Vec<&Entry> {
        self.entries
            .iter()
            .filter(|e| e.entry_type() == entry_type)
            .collect()
    }
}

/// Parse a knowledge log
pub fn parse_log(raw: &str) -> ParsedLog {
    let blocks = split_blocks(raw);
    let opens_with_frontmatter = raw
        .split('\n')
        .next()
        .is_some_and(is_separator_line);

    let mut entries = Vec::new();
    for (index, block) in blocks.iter().enumerate() {
        if block.trim().is_empty() {
            continue;
        }
        // blocks[0] is the empty text before the opening delimiter
        if opens_with_frontmatter && index == 1 && is_frontmatter_block(block) {
            continue;
        }
        if is_title_block(block) {
            continue;
        }
        if let Some(entry) = parse_entry(block) {
            entries.push(entry);
        }
    }

    let topics: BTreeSet<String> = entries
        .iter()
        .flat_map(|e| e.topics.iter().cloned())
        .collect();

    let dates = entries.iter().filter(|e| e.has_date()).map(|e| &e.date);
    let oldest_date = dates.clone().min().cloned();
    let newest_date = dates.max().cloned();

    ParsedLog {
        entries,
        token_count: estimate_tokens(raw),
        topics: topics.into_iter().collect(),
        oldest_date,
        newest_date,
        source: raw.to_string(),
    }
}

/// Render entries back to markdown from their raw blocks
pub fn render_entries<'a>(entries: impl IntoIterator<Item = &'a Entry>) -> String {
    entries
        .into_iter()
        .map(|e| e.raw_block.as_str())
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

fn is_separator_line(line: &str) -> bool {
    line.trim_end() == ENTRY_SEPARATOR
}

/// Split on separator lines; text between separators is kept verbatim
fn split_blocks(raw: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in raw.split('\n') {
        if is_separator_line(line) {
            blocks.push(current.join("\n"));
            current.clear();
        } else {
            current.push(line);
        }
    }
    blocks.push(current.join("\n"));

    blocks
}

fn is_frontmatter_block(block: &str) -> bool {
    let keys: BTreeSet<&str> = FRONTMATTER_KEY_RE
        .captures_iter(block)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect();
    keys.contains("created") && keys.contains("type")
}

fn is_title_block(block: &str) -> bool {
    let trimmed = block.trim();
    trimmed.starts_with(LOG_TITLE) && trimmed.lines().count() <= 2
}

fn parse_entry(block: &str) -> Option<Entry> {
    let lines: Vec<&str> = block.split('\n').collect();
    let first = lines.iter().position(|l| !l.trim().is_empty())?;
    let last = lines.iter().rposition(|l| !l.trim().is_empty())?;
    let span = &lines[first..=last];

    // A heading with nothing under it is not an entry
    if span.len() < 2 {
        return None;
    }

    let heading = HEADING_RE.captures(span[0].trim())?;
    let date = heading
        .get(1)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();
    let title = heading.get(2)?.as_str().trim().to_string();

    let mut type_label = EntryType::Context.as_str().to_string();
    let mut topics = Vec::new();
    let mut body_start = span.len();

    for (i, line) in span.iter().enumerate().skip(1) {
        if line.starts_with(TYPE_PREFIX) {
            if let Some(caps) = TYPE_RE.captures(line) {
                type_label = caps[1].to_lowercase();
            }
        } else if line.starts_with(TOPICS_PREFIX) {
            if let Some(caps) = TOPICS_RE.captures(line.trim_end()) {
                topics = caps[1]
                    .split(',')
                    .map(|t| t.trim().to_lowercase())
                    .collect();
            }
        } else if !line.trim().is_empty() {
            body_start = i;
            break;
        }
    }

    let body = span[body_start..].join("\n").trim().to_string();

    Some(Entry {
        date,
        title,
        type_label,
        topics,
        body,
        raw_block: span.join("\n"),
    })
}

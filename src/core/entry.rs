//! Entry - one unit of recorded knowledge
//!
//! Entries live in a scope's knowledge log as markdown blocks:
//!
//! ```text
//! ## 2026-01-14 - Use JWT for auth
//! **Type:** decision
//! **Topics:** auth, security
//!
//! We chose JWT because...
//! ```
//!
//! # Key Properties
//! - **date**: `YYYY-MM-DD`, empty when the heading carries none
//! - **type_label**: lower-cased label exactly as written
//! - **topics**: lower-cased tags in source order, duplicates kept
//! - **raw_block**: verbatim source span, used for re-rendering

use serde::{Deserialize, Serialize};

use super::error::MemoryError;

/// Entry type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    /// Architectural choice and its reasoning
    Decision,
    /// How things are done here
    Pattern,
    /// Trap to avoid
    Gotcha,
    /// Background information
    #[default]
    Context,
}

impl EntryType {
    pub const ALL: [EntryType; 4] = [
        EntryType::Decision,
        EntryType::Pattern,
        EntryType::Gotcha,
        EntryType::Context,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Decision => "decision",
            EntryType::Pattern => "pattern",
            EntryType::Gotcha => "gotcha",
            EntryType::Context => "context",
        }
    }

    /// Lenient mapping used for logs: anything unknown is context
    pub fn from_label(label: &str) -> Self {
        label.parse().unwrap_or_default()
    }
}

impl std::fmt::Display for EntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EntryType {
    type Err = MemoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "decision" => Ok(EntryType::Decision),
            "pattern" => Ok(EntryType::Pattern),
            "gotcha" => Ok(EntryType::Gotcha),
            "context" => Ok(EntryType::Context),
            _ => Err(MemoryError::invalid(
                "type",
                format!(
                    "\"{}\" is not a valid entry type. Must be one of: decision, pattern, gotcha, context",
                    s
                ),
            )),
        }
    }
}

/// A parsed knowledge entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// ISO date from the heading (may be empty)
    pub date: String,

    /// Heading text after the date
    pub title: String,

    /// Lower-cased `**Type:**` value as written (`context` when absent)
    pub type_label: String,

    /// Lower-cased, trimmed topics
    pub topics: Vec<String>,

    /// Trimmed markdown body
    pub body: String,

    /// Original text of the entry, heading line through last non-blank line
    pub raw_block: String,
}

impl Entry {
    /// Typed view of the label; unknown labels count as context
    pub fn entry_type(&self) -> EntryType {
        EntryType::from_label(&self.type_label)
    }

    pub fn has_date(&self) -> bool {
        !self.date.is_empty()
    }

    /// Case-insensitive match against topics (substring), title and body
    pub fn matches_topic(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.topics.iter().any(|t| t.contains(&needle))
            || self.title.to_lowercase().contains(&needle)
            || self.body.to_lowercase().contains(&needle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(type_label: &str) -> Entry {
        Entry {
            date: "2026-01-01".to_string(),
            title: "Use X".to_string(),
            type_label: type_label.to_string(),
            topics: vec!["infra".to_string(), "deploy".to_string()],
            body: "Because Y".to_string(),
            raw_block: String::new(),
        }
    }

    #[test]
    fn test_parse_entry_type() {
        assert_eq!("decision".parse::<EntryType>().unwrap(), EntryType::Decision);
        assert_eq!(" Gotcha ".parse::<EntryType>().unwrap(), EntryType::Gotcha);
    }

    #[test]
    fn test_parse_entry_type_rejects_unknown() {
        let err = "urgent".parse::<EntryType>().unwrap_err();
        assert!(err.to_string().starts_with("Invalid input (type):"));
        assert!(err.to_string().contains("urgent"));
    }

    #[test]
    fn test_unknown_label_defaults_to_context() {
        assert_eq!(entry("urgent").entry_type(), EntryType::Context);
        assert_eq!(entry("pattern").entry_type(), EntryType::Pattern);
    }

    #[test]
    fn test_matches_topic_substring() {
        let e = entry("decision");
        assert!(e.matches_topic("inf"));
        assert!(e.matches_topic("USE"));
        assert!(e.matches_topic("because"));
        assert!(!e.matches_topic("nope"));
    }

    #[test]
    fn test_display_roundtrip() {
        for t in EntryType::ALL {
            assert_eq!(t.to_string().parse::<EntryType>().unwrap(), t);
        }
    }
}

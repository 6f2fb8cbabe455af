//! Knowledge views - size-gated retrieval
//!
//! Decides how much of a knowledge log a caller gets:
//!
//! | Condition                      | Mode      | Content                  |
//! |--------------------------------|-----------|--------------------------|
//! | topic filter given             | `full`    | matching raw blocks      |
//! | tokens <= full threshold       | `full`    | raw file                 |
//! | tokens <= summary threshold    | `summary` | generated digest         |
//! | otherwise                      | `blocked` | maintenance instructions |
//!
//! `blocked` withholds the content. Callers must not try to read the log
//! in full after receiving it.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use super::entry::{Entry, EntryType};
use super::parser::{render_entries, ParsedLog};
use super::tokens::estimate_tokens;

/// Decision entries listed in a summary
pub const SUMMARY_DECISION_CAP: usize = 10;
/// Pattern entries listed in a summary
pub const SUMMARY_PATTERN_CAP: usize = 5;
/// Dated entries in the recent activity section
pub const SUMMARY_RECENT_CAP: usize = 5;

/// View mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    Full,
    Summary,
    Blocked,
}

impl std::fmt::Display for ViewMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViewMode::Full => write!(f, "full"),
            ViewMode::Summary => write!(f, "summary"),
            ViewMode::Blocked => write!(f, "blocked"),
        }
    }
}

/// Token budget for views
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewBudget {
    /// Load in full at or below this
    pub full_threshold: usize,
    /// Summarize at or below this, block above
    pub summary_threshold: usize,
}

impl Default for ViewBudget {
    fn default() -> Self {
        Self {
            full_threshold: 8000,
            summary_threshold: 16000,
        }
    }
}

/// A size-gated view of one knowledge log
#[derive(Debug, Clone, Serialize)]
pub struct KnowledgeView {
    pub content: String,
    pub mode: ViewMode,
    pub token_count: usize,
    pub entry_count: usize,
    pub topics: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl KnowledgeView {
    pub fn is_blocked(&self) -> bool {
        self.mode == ViewMode::Blocked
    }
}

/// Build the view for a parsed log
pub fn build_view(parsed: &ParsedLog, budget: &ViewBudget, topic: Option<&str>) -> KnowledgeView {
    let tokens = parsed.token_count;
    let entries = parsed.entry_count();
    let topics = parsed.topics.clone();

    if let Some(topic) = topic.map(str::trim).filter(|t| !t.is_empty()) {
        let matched = parsed.filter_by_topic(topic);
        let rendered = render_entries(matched.iter().copied());
        let content = if matched.is_empty() {
            format!("No entries found for topic: \"{}\"", topic)
        } else {
            rendered.clone()
        };

        return KnowledgeView {
            content,
            mode: ViewMode::Full,
            token_count: estimate_tokens(&rendered),
            entry_count: matched.len(),
            topics,
            warning: None,
        };
    }

    if tokens <= budget.full_threshold {
        return KnowledgeView {
            content: parsed.source.clone(),
            mode: ViewMode::Full,
            token_count: tokens,
            entry_count: entries,
            topics,
            warning: None,
        };
    }

    if tokens <= budget.summary_threshold {
        return KnowledgeView {
            content: generate_summary(parsed),
            mode: ViewMode::Summary,
            token_count: tokens,
            entry_count: entries,
            topics,
            warning: Some(format!(
                "Knowledge is {} tokens. Showing summary. Use a topic filter to load specific entries.",
                tokens
            )),
        };
    }

    KnowledgeView {
        content: format!(
            "BLOCKED: Knowledge is bloated ({} tokens, {} entries).\n\n\
             Run `megg maintain` to consolidate before continuing.\n\n\
             Topics available: {}",
            tokens,
            entries,
            topics.join(", ")
        ),
        mode: ViewMode::Blocked,
        token_count: tokens,
        entry_count: entries,
        topics,
        warning: Some(format!(
            "Knowledge exceeds {} tokens. Maintenance required.",
            budget.summary_threshold
        )),
    }
}

/// Generate the digest used in summary mode
///
/// Groups in fixed order: decisions (first 10), patterns (first 5),
/// gotchas (all, never truncated), then the 5 most recent dated entries.
pub fn generate_summary(parsed: &ParsedLog) -> String {
    let mut out = String::from("# Knowledge Summary\n\n");
    let _ = writeln!(
        out,
        "**Status:** {} tokens, {} entries",
        parsed.token_count,
        parsed.entry_count()
    );
    let _ = writeln!(out, "**Topics:** {}\n", parsed.topics.join(", "));

    let decisions = parsed.entries_of_type(EntryType::Decision);
    push_group(&mut out, "Key Decisions", &decisions, Some(SUMMARY_DECISION_CAP), |e| {
        format!("**{}** ({})", e.title, date_or_placeholder(e))
    });

    let patterns = parsed.entries_of_type(EntryType::Pattern);
    push_group(&mut out, "Patterns", &patterns, Some(SUMMARY_PATTERN_CAP), |e| {
        format!("{} ({})", e.title, date_or_placeholder(e))
    });

    let gotchas = parsed.entries_of_type(EntryType::Gotcha);
    push_group(&mut out, "Gotchas", &gotchas, None, |e| {
        format!("⚠️ {} ({})", e.title, date_or_placeholder(e))
    });

    let mut recent: Vec<&Entry> = parsed.entries.iter().filter(|e| e.has_date()).collect();
    // Stable sort keeps source order among equal dates
    recent.sort_by(|a, b| b.date.cmp(&a.date));
    recent.truncate(SUMMARY_RECENT_CAP);

    if !recent.is_empty() {
        out.push_str("## Recent Activity\n");
        for e in recent {
            let _ = writeln!(out, "- [{}] {} ({})", e.date, e.title, e.type_label);
        }
        out.push('\n');
    }

    out.push_str("\n*Use a topic filter (`megg context --topic <topic>`) to load specific entries.*");
    out
}

fn push_group(
    out: &mut String,
    heading: &str,
    entries: &[&Entry],
    cap: Option<usize>,
    line: impl Fn(&Entry) -> String,
) {
    if entries.is_empty() {
        return;
    }

    let _ = writeln!(out, "## {} ({})", heading, entries.len());
    let shown = cap.unwrap_or(entries.len()).min(entries.len());
    for e in &entries[..shown] {
        let _ = writeln!(out, "- {}", line(e));
    }
    if entries.len() > shown {
        let _ = writeln!(out, "- ... and {} more", entries.len() - shown);
    }
    out.push('\n');
}

fn date_or_placeholder(entry: &Entry) -> &str {
    if entry.has_date() {
        &entry.date
    } else {
        "no date"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::parser::parse_log;

    fn entry_block(date: &str, title: &str, kind: &str) -> String {
        format!("## {} - {}\n**Type:** {}\n**Topics:** misc\n\nbody", date, title, kind)
    }

    fn log_of(blocks: &[String]) -> String {
        blocks.join("\n\n---\n\n")
    }

    /// A log whose raw length is exactly `tokens * 4` characters
    fn padded_log(tokens: usize) -> String {
        let base = entry_block("2026-01-01", "Pad", "context");
        let target = tokens * 4;
        assert!(target > base.len());
        format!("{}{}", base, "x".repeat(target - base.len()))
    }

    #[test]
    fn test_full_at_threshold() {
        let parsed = parse_log(&padded_log(8000));
        assert_eq!(parsed.token_count, 8000);
        let view = build_view(&parsed, &ViewBudget::default(), None);
        assert_eq!(view.mode, ViewMode::Full);
        assert_eq!(view.content, parsed.source);
        assert!(view.warning.is_none());
    }

    #[test]
    fn test_summary_above_full_threshold() {
        let parsed = parse_log(&padded_log(8001));
        let view = build_view(&parsed, &ViewBudget::default(), None);
        assert_eq!(view.mode, ViewMode::Summary);
        assert!(view.warning.as_deref().unwrap().contains("8001"));
        assert!(view.content.starts_with("# Knowledge Summary"));
    }

    #[test]
    fn test_summary_at_summary_threshold() {
        let parsed = parse_log(&padded_log(16000));
        let view = build_view(&parsed, &ViewBudget::default(), None);
        assert_eq!(view.mode, ViewMode::Summary);
    }

    #[test]
    fn test_blocked_above_summary_threshold() {
        let parsed = parse_log(&padded_log(16001));
        let view = build_view(&parsed, &ViewBudget::default(), None);
        assert_eq!(view.mode, ViewMode::Blocked);
        assert!(view.is_blocked());
        assert!(view.content.starts_with("BLOCKED:"));
        assert!(view.content.contains("16001 tokens, 1 entries"));
        assert!(view.content.contains("Topics available: misc"));
    }

    #[test]
    fn test_topic_filter_overrides_size_gate() {
        let raw = format!(
            "{}\n\n---\n\n{}",
            entry_block("2026-01-02", "Cache rule", "gotcha").replace("misc", "cache"),
            padded_log(20000)
        );
        let parsed = parse_log(&raw);
        assert!(parsed.token_count > 16000);

        let view = build_view(&parsed, &ViewBudget::default(), Some("cache"));
        assert_eq!(view.mode, ViewMode::Full);
        assert_eq!(view.entry_count, 1);
        assert!(view.content.starts_with("## 2026-01-02 - Cache rule"));
    }

    #[test]
    fn test_topic_filter_no_match() {
        let parsed = parse_log(&entry_block("2026-01-01", "A", "decision"));
        let view = build_view(&parsed, &ViewBudget::default(), Some("nope"));
        assert_eq!(view.mode, ViewMode::Full);
        assert_eq!(view.content, "No entries found for topic: \"nope\"");
        assert_eq!(view.entry_count, 0);
    }

    #[test]
    fn test_blank_topic_is_no_filter() {
        let parsed = parse_log(&entry_block("2026-01-01", "A", "decision"));
        let view = build_view(&parsed, &ViewBudget::default(), Some("  "));
        assert_eq!(view.content, parsed.source);
    }

    #[test]
    fn test_summary_caps_decisions() {
        let blocks: Vec<String> = (1..=12)
            .map(|i| entry_block(&format!("2026-01-{:02}", i), &format!("Decision {}", i), "decision"))
            .collect();
        let summary = generate_summary(&parse_log(&log_of(&blocks)));

        assert!(summary.contains("## Key Decisions (12)"));
        assert!(summary.contains("- **Decision 10** (2026-01-10)"));
        assert!(!summary.contains("**Decision 11**"));
        assert!(summary.contains("- ... and 2 more"));
    }

    #[test]
    fn test_summary_caps_patterns() {
        let blocks: Vec<String> = (1..=7)
            .map(|i| entry_block("2026-01-01", &format!("Pattern {}", i), "pattern"))
            .collect();
        let summary = generate_summary(&parse_log(&log_of(&blocks)));

        assert!(summary.contains("## Patterns (7)"));
        assert!(summary.contains("- Pattern 5 (2026-01-01)"));
        assert!(!summary.contains("- Pattern 6 "));
        assert!(summary.contains("- ... and 2 more"));
    }

    #[test]
    fn test_summary_never_truncates_gotchas() {
        let blocks: Vec<String> = (1..=25)
            .map(|i| entry_block("2026-01-01", &format!("Gotcha {}", i), "gotcha"))
            .collect();
        let summary = generate_summary(&parse_log(&log_of(&blocks)));

        assert!(summary.contains("## Gotchas (25)"));
        for i in 1..=25 {
            assert!(summary.contains(&format!("⚠️ Gotcha {} (", i)));
        }
        assert!(!summary.contains("more"));
    }

    #[test]
    fn test_summary_group_order() {
        let blocks = vec![
            entry_block("2026-01-01", "G", "gotcha"),
            entry_block("2026-01-02", "P", "pattern"),
            entry_block("2026-01-03", "D", "decision"),
        ];
        let summary = generate_summary(&parse_log(&log_of(&blocks)));

        let d = summary.find("## Key Decisions").unwrap();
        let p = summary.find("## Patterns").unwrap();
        let g = summary.find("## Gotchas").unwrap();
        let r = summary.find("## Recent Activity").unwrap();
        assert!(d < p && p < g && g < r);
    }

    #[test]
    fn test_recent_activity_descending_and_dated_only() {
        let mut blocks: Vec<String> = (1..=7)
            .map(|i| entry_block(&format!("2026-03-{:02}", i), &format!("E{}", i), "context"))
            .collect();
        blocks.push("## Undated\n**Type:** context\n\nbody".to_string());
        let summary = generate_summary(&parse_log(&log_of(&blocks)));

        let recent = &summary[summary.find("## Recent Activity").unwrap()..];
        let lines: Vec<&str> = recent.lines().skip(1).take_while(|l| l.starts_with("- ")).collect();
        assert_eq!(
            lines,
            vec![
                "- [2026-03-07] E7 (context)",
                "- [2026-03-06] E6 (context)",
                "- [2026-03-05] E5 (context)",
                "- [2026-03-04] E4 (context)",
                "- [2026-03-03] E3 (context)",
            ]
        );
        assert!(!recent.contains("Undated"));
    }
}

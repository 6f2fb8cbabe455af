//! Maintenance analyzer
//!
//! Scans every scope under a root and proposes cleanup. Nothing here
//! writes: the report is advice for a human or an agent to act on.
//!
//! Checks per knowledge log:
//! - **bloated**: whole-file tokens above the bloat threshold
//! - **stale**: dated entries older than the staleness window
//! - **duplicates**: many entries piling up on the same topics

use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use super::entry::Entry;
use super::error::{MemoryError, Result};
use super::parser::parse_log;
use super::scope::MemoryScope;
use super::tokens::format_token_count;
use crate::config::Config;

/// Entries sharing a topic before it counts as a duplicate group
pub const DUPLICATE_GROUP_MIN: usize = 3;
/// Consolidate actions emitted per bloated log
pub const CONSOLIDATE_GROUP_CAP: usize = 3;
/// Total entries across duplicate groups before a `duplicates` issue
pub const DUPLICATE_ENTRY_TRIGGER: usize = 5;
/// Entries listed per action in the rendered report
const REPORT_ENTRY_PREVIEW: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Problem {
    Bloated,
    Stale,
    Duplicates,
}

impl std::fmt::Display for Problem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Problem::Bloated => write!(f, "bloated"),
            Problem::Stale => write!(f, "stale"),
            Problem::Duplicates => write!(f, "duplicates"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Consolidate,
    Archive,
    Summarize,
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionKind::Consolidate => write!(f, "consolidate"),
            ActionKind::Archive => write!(f, "archive"),
            ActionKind::Summarize => write!(f, "summarize"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MaintenanceIssue {
    /// Scope directory
    pub path: PathBuf,
    pub problem: Problem,
    pub details: String,
    pub suggested_action: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MaintenanceAction {
    pub kind: ActionKind,
    /// Knowledge log the action applies to
    pub target: PathBuf,
    pub preview: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub entries: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MaintenanceReport {
    pub scanned: usize,
    pub total_tokens: usize,
    pub total_entries: usize,
    pub issues: Vec<MaintenanceIssue>,
    pub actions: Vec<MaintenanceAction>,
}

impl MaintenanceReport {
    pub fn is_healthy(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Entries sharing one topic
#[derive(Debug, Clone)]
pub struct TopicGroup<'a> {
    pub topic: String,
    pub entries: Vec<&'a Entry>,
}

/// Topics carried by at least three entries, largest group first
///
/// An entry repeating a topic counts once for it. Equal-sized groups keep
/// the order in which their topic first appears.
pub fn find_duplicate_topics(entries: &[Entry]) -> Vec<TopicGroup<'_>> {
    let mut groups: Vec<TopicGroup<'_>> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for entry in entries {
        let mut seen: Vec<&str> = Vec::new();
        for topic in &entry.topics {
            if seen.contains(&topic.as_str()) {
                continue;
            }
            seen.push(topic);

            let slot = *index.entry(topic.as_str()).or_insert_with(|| {
                groups.push(TopicGroup {
                    topic: topic.clone(),
                    entries: Vec::new(),
                });
                groups.len() - 1
            });
            groups[slot].entries.push(entry);
        }
    }

    groups.retain(|g| g.entries.len() >= DUPLICATE_GROUP_MIN);
    groups.sort_by(|a, b| b.entries.len().cmp(&a.entries.len()));
    groups
}

/// Entries dated more than `staleness_days` whole days before `today`
///
/// Undated entries and dates that do not parse are never stale.
pub fn find_stale_entries_at(entries: &[Entry], staleness_days: i64, today: NaiveDate) -> Vec<&Entry> {
    entries
        .iter()
        .filter(|e| {
            NaiveDate::parse_from_str(&e.date, "%Y-%m-%d")
                .map(|date| (today - date).num_days() > staleness_days)
                .unwrap_or(false)
        })
        .collect()
}

/// Analyze every scope under `root`
pub fn analyze(root: &Path, config: &Config) -> MaintenanceReport {
    analyze_at(root, config, Utc::now().date_naive())
}

/// [`analyze`] against a fixed `today`
pub fn analyze_at(root: &Path, config: &Config, today: NaiveDate) -> MaintenanceReport {
    let scopes = config.locator().find_all_scopes(root);
    let mut report = MaintenanceReport {
        scanned: scopes.len(),
        ..Default::default()
    };

    for scope in &scopes {
        if !scope.has_knowledge() {
            continue;
        }
        if let Err(e) = analyze_scope(scope, config, today, &mut report) {
            warn!(scope = %scope.dir.display(), error = %e, "Skipping scope in maintenance");
        }
    }

    debug!(
        scanned = report.scanned,
        issues = report.issues.len(),
        actions = report.actions.len(),
        "Maintenance analysis complete"
    );
    report
}

fn analyze_scope(
    scope: &MemoryScope,
    config: &Config,
    today: NaiveDate,
    report: &mut MaintenanceReport,
) -> Result<()> {
    let path = scope.knowledge_path();
    let content = fs::read_to_string(&path).map_err(MemoryError::io(&path))?;
    let parsed = parse_log(&content);
    let tokens = parsed.token_count;
    let settings = &config.maintenance;

    report.total_tokens += tokens;
    report.total_entries += parsed.entry_count();

    let duplicates = find_duplicate_topics(&parsed.entries);
    let bloated = tokens > settings.bloat_threshold;

    if bloated {
        report.issues.push(MaintenanceIssue {
            path: scope.dir.clone(),
            problem: Problem::Bloated,
            details: format!(
                "{} tokens, {} entries",
                format_token_count(tokens),
                parsed.entry_count()
            ),
            suggested_action: "Consolidate similar entries or archive old ones".to_string(),
        });

        for group in duplicates.iter().take(CONSOLIDATE_GROUP_CAP) {
            report.actions.push(MaintenanceAction {
                kind: ActionKind::Consolidate,
                target: path.clone(),
                preview: format!(
                    "Merge {} entries about \"{}\"",
                    group.entries.len(),
                    group.topic
                ),
                entries: group.entries.iter().map(|e| e.title.clone()).collect(),
            });
        }

        if tokens > settings.block_threshold {
            report.actions.push(MaintenanceAction {
                kind: ActionKind::Summarize,
                target: path.clone(),
                preview: format!(
                    "Summarize from {} to ~{} tokens",
                    format_token_count(tokens),
                    format_token_count(config.knowledge.target_tokens)
                ),
                entries: Vec::new(),
            });
        }
    }

    let stale = find_stale_entries_at(&parsed.entries, settings.staleness_days, today);
    if !stale.is_empty() {
        report.issues.push(MaintenanceIssue {
            path: scope.dir.clone(),
            problem: Problem::Stale,
            details: format!(
                "{} entries older than {} days",
                stale.len(),
                settings.staleness_days
            ),
            suggested_action: "Review and archive if no longer relevant".to_string(),
        });
        report.actions.push(MaintenanceAction {
            kind: ActionKind::Archive,
            target: path.clone(),
            preview: format!("Archive {} old entries", stale.len()),
            entries: stale
                .iter()
                .map(|e| format!("{} - {}", e.date, e.title))
                .collect(),
        });
    }

    if !bloated && !duplicates.is_empty() {
        let grouped: usize = duplicates.iter().map(|g| g.entries.len()).sum();
        if grouped > DUPLICATE_ENTRY_TRIGGER {
            report.issues.push(MaintenanceIssue {
                path: scope.dir.clone(),
                problem: Problem::Duplicates,
                details: format!(
                    "{} topics with {}+ entries each",
                    duplicates.len(),
                    DUPLICATE_GROUP_MIN
                ),
                suggested_action: "Consider consolidating related entries".to_string(),
            });
        }
    }

    Ok(())
}

fn display_name(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "root".to_string())
}

/// Render a report as markdown
pub fn format_maintenance_report(report: &MaintenanceReport) -> String {
    let mut out = String::from("# Maintenance Report\n\n## Overview\n\n");
    let _ = writeln!(out, "- **Scanned:** {} scopes", report.scanned);
    let _ = writeln!(out, "- **Total tokens:** {}", format_token_count(report.total_tokens));
    let _ = writeln!(out, "- **Total entries:** {}\n", report.total_entries);

    if report.is_healthy() {
        out.push_str("✅ **All knowledge files are healthy!**\n");
        return out;
    }

    out.push_str("## Issues Found\n\n");
    for issue in &report.issues {
        let marker = match issue.problem {
            Problem::Bloated => "🔴",
            Problem::Stale => "🟡",
            Problem::Duplicates => "🟠",
        };
        let _ = writeln!(out, "### {} {}\n", marker, display_name(&issue.path));
        let _ = writeln!(out, "**Problem:** {}", issue.problem);
        let _ = writeln!(out, "**Details:** {}", issue.details);
        let _ = writeln!(out, "**Suggested:** {}\n", issue.suggested_action);
    }

    if !report.actions.is_empty() {
        out.push_str("## Suggested Actions\n\n");
        for (i, action) in report.actions.iter().enumerate() {
            // target is <scope>/<marker>/<log>
            let scope_dir = action
                .target
                .parent()
                .and_then(Path::parent)
                .unwrap_or(&action.target);
            let _ = writeln!(out, "{}. **{}** in {}", i + 1, action.kind, display_name(scope_dir));
            let _ = writeln!(out, "   {}", action.preview);
            for entry in action.entries.iter().take(REPORT_ENTRY_PREVIEW) {
                let _ = writeln!(out, "   - {}", entry);
            }
            if action.entries.len() > REPORT_ENTRY_PREVIEW {
                let _ = writeln!(
                    out,
                    "   - ... and {} more",
                    action.entries.len() - REPORT_ENTRY_PREVIEW
                );
            }
            out.push('\n');
        }
    }

    out.push_str("---\n\n*Review issues and apply changes manually or with agent assistance.*\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::parser::parse_log;
    use tempfile::tempdir;

    fn entry(date: &str, title: &str, topics: &[&str]) -> String {
        format!(
            "## {date} - {title}\n**Type:** context\n**Topics:** {}\n\nbody of {title}",
            topics.join(", ")
        )
    }

    fn log(entries: &[String]) -> String {
        format!("# Knowledge\n\n---\n\n{}\n", entries.join("\n\n---\n\n"))
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 4, 1).unwrap()
    }

    fn write_scope(dir: &Path, knowledge: &str) {
        let marker = dir.join(".megg");
        fs::create_dir_all(&marker).unwrap();
        fs::write(marker.join("info.md"), "# Scope\n").unwrap();
        fs::write(marker.join("knowledge.md"), knowledge).unwrap();
    }

    #[test]
    fn test_staleness_boundary() {
        let stale_day = today() - chrono::Duration::days(91);
        let fresh_day = today() - chrono::Duration::days(89);
        let edge_day = today() - chrono::Duration::days(90);
        let text = log(&[
            entry(&stale_day.to_string(), "Old", &["a"]),
            entry(&fresh_day.to_string(), "New", &["a"]),
            entry(&edge_day.to_string(), "Edge", &["a"]),
            entry("2026-13-45", "Garbage", &["a"]),
        ]);
        let parsed = parse_log(&text);

        let stale = find_stale_entries_at(&parsed.entries, 90, today());
        let titles: Vec<&str> = stale.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Old"]);
    }

    #[test]
    fn test_duplicate_group_needs_three() {
        let text = log(&[
            entry("2026-03-01", "A", &["api", "db"]),
            entry("2026-03-02", "B", &["api", "db"]),
            entry("2026-03-03", "C", &["api"]),
        ]);
        let parsed = parse_log(&text);
        let groups = find_duplicate_topics(&parsed.entries);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].topic, "api");
        assert_eq!(groups[0].entries.len(), 3);
    }

    #[test]
    fn test_duplicate_groups_sorted_by_size() {
        let mut entries = Vec::new();
        for i in 0..3 {
            entries.push(entry("2026-03-01", &format!("S{i}"), &["small"]));
        }
        for i in 0..4 {
            entries.push(entry("2026-03-01", &format!("B{i}"), &["big"]));
        }
        let parsed = parse_log(&log(&entries));
        let groups = find_duplicate_topics(&parsed.entries);
        assert_eq!(groups[0].topic, "big");
        assert_eq!(groups[1].topic, "small");
    }

    #[test]
    fn test_healthy_tree() {
        let dir = tempdir().unwrap();
        write_scope(dir.path(), &log(&[entry("2026-03-20", "Fine", &["x"])]));

        let report = analyze_at(dir.path(), &Config::default(), today());
        assert_eq!(report.scanned, 1);
        assert_eq!(report.total_entries, 1);
        assert!(report.is_healthy());
        assert!(format_maintenance_report(&report).contains("All knowledge files are healthy"));
    }

    #[test]
    fn test_bloat_consolidate_and_summarize() {
        let dir = tempdir().unwrap();
        let mut entries = Vec::new();
        for i in 0..4 {
            entries.push(entry("2026-03-20", &format!("Auth {i}"), &["auth"]));
        }
        write_scope(dir.path(), &log(&entries));

        let mut config = Config::default();
        config.maintenance.bloat_threshold = 10;
        config.maintenance.block_threshold = 20;

        let report = analyze_at(dir.path(), &config, today());
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].problem, Problem::Bloated);

        let kinds: Vec<ActionKind> = report.actions.iter().map(|a| a.kind).collect();
        assert_eq!(kinds, vec![ActionKind::Consolidate, ActionKind::Summarize]);
        assert_eq!(report.actions[0].preview, "Merge 4 entries about \"auth\"");
        assert_eq!(
            report.actions[1].preview,
            format!("Summarize from {} to ~8.0k tokens", format_token_count(report.total_tokens))
        );
    }

    #[test]
    fn test_duplicates_issue_without_bloat() {
        let dir = tempdir().unwrap();
        let mut entries = Vec::new();
        for i in 0..3 {
            entries.push(entry("2026-03-20", &format!("A{i}"), &["alpha"]));
            entries.push(entry("2026-03-20", &format!("B{i}"), &["beta"]));
        }
        write_scope(dir.path(), &log(&entries));

        let report = analyze_at(dir.path(), &Config::default(), today());
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].problem, Problem::Duplicates);
        assert_eq!(report.issues[0].details, "2 topics with 3+ entries each");
        assert!(report.actions.is_empty());
    }

    #[test]
    fn test_stale_archive_action_and_report() {
        let dir = tempdir().unwrap();
        let entries: Vec<String> = (1..=5)
            .map(|i| entry(&format!("2025-0{i}-01"), &format!("Old {i}"), &[format!("t{i}").as_str()]))
            .collect();
        write_scope(dir.path(), &log(&entries));

        let report = analyze_at(dir.path(), &Config::default(), today());
        assert_eq!(report.issues[0].problem, Problem::Stale);
        assert_eq!(report.issues[0].details, "5 entries older than 90 days");

        let archive = &report.actions[0];
        assert_eq!(archive.kind, ActionKind::Archive);
        assert_eq!(archive.entries[0], "2025-01-01 - Old 1");

        let text = format_maintenance_report(&report);
        assert!(text.contains("## Issues Found"));
        assert!(text.contains("1. **archive**"));
        assert!(text.contains("   - 2025-03-01 - Old 3\n"));
        assert!(!text.contains("Old 4"));
        assert!(text.contains("   - ... and 2 more"));
    }

    #[test]
    fn test_scope_without_log_is_counted_not_parsed() {
        let dir = tempdir().unwrap();
        write_scope(&dir.path().join("good"), &log(&[entry("2026-03-20", "Ok", &["x"])]));
        // a knowledge path that is a directory holds no log
        let bad = dir.path().join("bad/.megg");
        fs::create_dir_all(bad.join("knowledge.md")).unwrap();

        let report = analyze_at(dir.path(), &Config::default(), today());
        assert_eq!(report.scanned, 2);
        assert_eq!(report.total_entries, 1);
    }

    #[test]
    fn test_unreadable_log_skipped_not_fatal() {
        let dir = tempdir().unwrap();
        let good = log(&[entry("2026-03-20", "Ok", &["x"])]);
        write_scope(&dir.path().join("good"), &good);
        write_scope(&dir.path().join("bad"), "");
        // invalid UTF-8, large enough to count as bloated if it were read lossily
        fs::write(dir.path().join("bad/.megg/knowledge.md"), vec![0xff_u8; 40_000]).unwrap();

        let report = analyze_at(dir.path(), &Config::default(), today());
        assert_eq!(report.scanned, 2);
        assert_eq!(report.total_entries, 1);
        assert_eq!(report.total_tokens, parse_log(&good).token_count);
        let bad = dir.path().join("bad");
        assert!(report.issues.iter().all(|i| !i.path.starts_with(&bad)));
        assert!(report.actions.iter().all(|a| !a.target.starts_with(&bad)));
    }
}

//! Ephemeral session state
//!
//! Unlike the knowledge log, state is overwritten on every write, capped
//! at a token limit and expires after a fixed age or once marked `done`.
//!
//! ```text
//! ---
//! updated: 2026-01-14T09:30:00.000Z
//! status: active
//! ---
//!
//! Working on the auth refactor, next step is...
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::error::{MemoryError, Result};
use super::frontmatter::timestamp;
use super::hierarchy::resolve_target;
use super::scope::MemoryScope;
use super::tokens::{estimate_tokens, CHARS_PER_TOKEN};
use crate::config::Config;

/// Fraction of the cut a word boundary must lie beyond to be used
const BOUNDARY_FRACTION: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StateStatus {
    #[default]
    Active,
    Done,
}

impl std::fmt::Display for StateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StateStatus::Active => write!(f, "active"),
            StateStatus::Done => write!(f, "done"),
        }
    }
}

/// Header and body of a state file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedState {
    pub status: StateStatus,
    /// Raw `updated` value, empty when missing
    pub updated: String,
    pub body: String,
}

/// State as returned to callers
#[derive(Debug, Clone, Serialize)]
pub struct SessionState {
    pub content: String,
    pub status: StateStatus,
    pub updated: String,
    pub tokens: usize,
    pub expired: bool,
    pub path: PathBuf,
}

/// Result of a state write or clear
#[derive(Debug, Clone, Serialize)]
pub struct StateOutcome {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<SessionState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Parse a state file. `None` when the header is missing or unterminated.
pub fn parse_state(text: &str) -> Option<ParsedState> {
    let rest = text.strip_prefix("---\n")?;
    let end = rest.find("\n---\n")?;
    let header = &rest[..end];
    let body = rest[end + "\n---\n".len()..].trim().to_string();

    let mut status = StateStatus::Active;
    let mut updated = String::new();

    for line in header.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key {
            "status" if value == "done" => status = StateStatus::Done,
            "status" => status = StateStatus::Active,
            "updated" => updated = value.to_string(),
            _ => {}
        }
    }

    Some(ParsedState {
        status,
        updated,
        body,
    })
}

/// `done`, undated, unparseable or older than `staleness_hours`
pub fn is_expired_at(state: &ParsedState, now: DateTime<Utc>, staleness_hours: i64) -> bool {
    if state.status == StateStatus::Done {
        return true;
    }

    match DateTime::parse_from_rfc3339(&state.updated) {
        Ok(updated) => {
            let age = now.signed_duration_since(updated.with_timezone(&Utc));
            age.num_seconds() > staleness_hours * 3600
        }
        Err(_) => true,
    }
}

/// Cut `text` to roughly `limit` tokens. Returns the text and whether it
/// was cut.
///
/// Lengths are UTF-16 code units, as in [`estimate_tokens`]. The cut backs
/// off to the last newline or space when that boundary lies within the
/// final fifth of the allowance.
pub fn truncate_to_limit(text: &str, limit: usize) -> (String, bool) {
    if estimate_tokens(text) <= limit {
        return (text.to_string(), false);
    }

    let unit_limit = limit * CHARS_PER_TOKEN;
    let mut units = 0;
    let mut end = text.len();
    for (i, c) in text.char_indices() {
        units += c.len_utf16();
        if units > unit_limit {
            end = i;
            break;
        }
    }
    let cut = &text[..end];

    let min_boundary = unit_limit as f64 * BOUNDARY_FRACTION;
    let truncated = match cut.rfind(['\n', ' ']) {
        Some(idx) if cut[..idx].encode_utf16().count() as f64 > min_boundary => &cut[..idx],
        _ => cut,
    };

    (truncated.to_string(), true)
}

fn render_state(body: &str, status: StateStatus, now: DateTime<Utc>) -> String {
    format!(
        "---\nupdated: {}\nstatus: {}\n---\n\n{}",
        timestamp(now),
        status,
        body
    )
}

fn nearest_scope(target: &Path, config: &Config) -> Result<MemoryScope> {
    config
        .locator()
        .find_nearest_scope(target)
        .ok_or_else(|| MemoryError::not_initialized(&resolve_target(target), &config.scope.marker_dir))
}

fn parse_state_file(path: &Path) -> Result<ParsedState> {
    let text = fs::read_to_string(path).map_err(MemoryError::io(path))?;
    parse_state(&text).ok_or_else(|| MemoryError::MalformedContent {
        path: path.to_path_buf(),
        reason: "expected a header between `---` lines".to_string(),
    })
}

/// Check the state file of the scope nearest `target`
///
/// `Ok(None)` when there is no state file. A file readers would ignore
/// comes back as [`MemoryError::MalformedContent`].
pub fn validate_state(target: &Path, config: &Config) -> Result<Option<ParsedState>> {
    let scope = nearest_scope(target, config)?;
    let path = scope.state_path();
    if !path.exists() {
        return Ok(None);
    }
    parse_state_file(&path).map(Some)
}

/// Read the state file of a scope, expired or not
pub fn load_scope_state(
    scope: &MemoryScope,
    config: &Config,
    now: DateTime<Utc>,
) -> Result<Option<SessionState>> {
    let path = scope.state_path();
    if !path.exists() {
        return Ok(None);
    }

    let parsed = match parse_state_file(&path) {
        Ok(parsed) => parsed,
        Err(MemoryError::MalformedContent { reason, .. }) => {
            debug!(path = %path.display(), reason = %reason, "Ignoring malformed state file");
            return Ok(None);
        }
        Err(e) => return Err(e),
    };

    let expired = is_expired_at(&parsed, now, config.state.staleness_hours);
    Ok(Some(SessionState {
        tokens: estimate_tokens(&parsed.body),
        content: parsed.body,
        status: parsed.status,
        updated: parsed.updated,
        expired,
        path,
    }))
}

/// Current state for `target`; `None` when absent, malformed or expired
pub fn read_state(target: &Path, config: &Config) -> Result<Option<SessionState>> {
    read_state_at(target, config, Utc::now())
}

pub fn read_state_at(
    target: &Path,
    config: &Config,
    now: DateTime<Utc>,
) -> Result<Option<SessionState>> {
    let scope = nearest_scope(target, config)?;
    Ok(load_scope_state(&scope, config, now)?.filter(|s| !s.expired))
}

/// Overwrite the state of the scope nearest `target`
pub fn write_state(target: &Path, body: &str, config: &Config) -> Result<StateOutcome> {
    write_state_at(target, body, config, Utc::now())
}

pub fn write_state_at(
    target: &Path,
    body: &str,
    config: &Config,
    now: DateTime<Utc>,
) -> Result<StateOutcome> {
    if body.trim().is_empty() {
        return Err(MemoryError::invalid("content", "State content must not be empty"));
    }

    let scope = nearest_scope(target, config)?;
    let limit = config.state.token_limit;
    let (content, truncated) = truncate_to_limit(body, limit);

    let path = scope.state_path();
    fs::write(&path, render_state(&content, StateStatus::Active, now))
        .map_err(MemoryError::io(&path))?;

    let warning = truncated.then(|| {
        warn!(path = %path.display(), limit, "State truncated");
        format!("Content truncated to fit {} token limit.", limit)
    });
    info!(path = %path.display(), "State written");

    Ok(StateOutcome {
        state: Some(SessionState {
            tokens: estimate_tokens(&content),
            content,
            status: StateStatus::Active,
            updated: timestamp(now),
            expired: false,
            path,
        }),
        warning,
    })
}

/// Remove the state file of the scope nearest `target`
pub fn clear_state(target: &Path, config: &Config) -> Result<StateOutcome> {
    let scope = nearest_scope(target, config)?;
    let path = scope.state_path();

    if !path.exists() {
        return Ok(StateOutcome {
            state: None,
            warning: Some("No state file to clear.".to_string()),
        });
    }

    fs::remove_file(&path).map_err(MemoryError::io(&path))?;
    info!(path = %path.display(), "State cleared");

    Ok(StateOutcome {
        state: None,
        warning: None,
    })
}

/// Markdown block for a state, used by context rendering and the CLI
pub fn format_state_for_display(state: Option<&SessionState>) -> String {
    match state {
        None => "No active state.".to_string(),
        Some(s) if s.expired => "State expired (stale or marked done).".to_string(),
        Some(s) => format!(
            "## Session State\n*Updated: {} ({} tokens)*\n\n{}",
            s.updated, s.tokens, s.content
        ),
    }
}

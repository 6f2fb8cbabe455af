//! Entry writer - the only code path that mutates memory files
//!
//! Input is validated before the filesystem is touched, so a rejected
//! entry leaves no trace. The append itself is an unlocked
//! read-modify-write; a concurrent external writer can interleave with it
//! and lose an update or the `updated` stamp.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::entry::EntryType;
use super::error::{MemoryError, Result};
use super::frontmatter::{new_document, touch_updated};
use super::hierarchy::resolve_target;
use super::parser::{ENTRY_SEPARATOR, LOG_TITLE, TOPICS_PREFIX, TYPE_PREFIX};
use super::tokens::estimate_tokens;
use crate::config::Config;

/// An entry as supplied by a caller, before validation
#[derive(Debug, Clone, Default)]
pub struct NewEntry {
    pub title: String,
    pub entry_type: String,
    pub topics: Vec<String>,
    pub body: String,
}

impl NewEntry {
    pub fn new(
        title: impl Into<String>,
        entry_type: impl Into<String>,
        topics: impl IntoIterator<Item = impl Into<String>>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            entry_type: entry_type.into(),
            topics: topics.into_iter().map(Into::into).collect(),
            body: body.into(),
        }
    }

    /// Check every field; nothing is written unless this succeeds
    fn validate(&self) -> Result<ValidEntry> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(MemoryError::invalid("title", "Title must not be empty"));
        }
        if title.contains('\n') {
            return Err(MemoryError::invalid("title", "Title must be a single line"));
        }

        let entry_type: EntryType = self.entry_type.parse()?;

        let topics: Vec<String> = self
            .topics
            .iter()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        if topics.is_empty() {
            return Err(MemoryError::invalid("topics", "At least one topic is required"));
        }

        Ok(ValidEntry {
            title: title.to_string(),
            entry_type,
            topics,
            body: self.body.trim().to_string(),
        })
    }
}

struct ValidEntry {
    title: String,
    entry_type: EntryType,
    topics: Vec<String>,
    body: String,
}

impl ValidEntry {
    fn render(&self, date: &str) -> String {
        format!(
            "\n{ENTRY_SEPARATOR}\n\n## {date} - {}\n{TYPE_PREFIX} {}\n{TOPICS_PREFIX} {}\n\n{}\n",
            self.title,
            self.entry_type,
            self.topics.join(", "),
            self.body
        )
    }
}

/// Result of a successful append
#[derive(Debug, Clone, Serialize)]
pub struct AppendOutcome {
    /// Knowledge log that received the entry
    pub path: PathBuf,

    /// Whole-file estimate after the append
    pub token_count: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Append an entry to the knowledge log of the scope nearest `target`
pub fn append_entry(target: &Path, entry: &NewEntry, config: &Config) -> Result<AppendOutcome> {
    append_entry_at(target, entry, config, Utc::now())
}

/// [`append_entry`] with an explicit clock
pub fn append_entry_at(
    target: &Path,
    entry: &NewEntry,
    config: &Config,
    now: DateTime<Utc>,
) -> Result<AppendOutcome> {
    let valid = entry.validate()?;

    let scope = config
        .locator()
        .find_nearest_scope(target)
        .ok_or_else(|| MemoryError::not_initialized(&resolve_target(target), &config.scope.marker_dir))?;
    let path = scope.knowledge_path();

    let existing = if path.exists() {
        fs::read_to_string(&path).map_err(MemoryError::io(&path))?
    } else {
        info!(path = %path.display(), "Creating knowledge log");
        new_document("knowledge", &format!("{LOG_TITLE}\n\n"), now)
    };

    let date = now.format("%Y-%m-%d").to_string();
    let mut content = touch_updated(&existing, now);
    content.push_str(&valid.render(&date));
    fs::write(&path, &content).map_err(MemoryError::io(&path))?;

    let token_count = estimate_tokens(&content);
    info!(
        path = %path.display(),
        title = %valid.title,
        entry_type = %valid.entry_type,
        tokens = token_count,
        "Appended knowledge entry"
    );

    let warning = (token_count > config.knowledge.warning_threshold).then(|| {
        warn!(path = %path.display(), tokens = token_count, "Knowledge log is growing large");
        format!(
            "Knowledge is {} tokens. Consider running 'megg maintain' soon.",
            token_count
        )
    });

    Ok(AppendOutcome {
        path,
        token_count,
        warning,
    })
}

/// Create a scope at `root`: identity file, plus a knowledge log when
/// `knowledge` has content. Returns the marker directory.
///
/// An existing identity file is replaced.
pub fn init_scope(
    root: &Path,
    identity: &str,
    knowledge: Option<&str>,
    config: &Config,
) -> Result<PathBuf> {
    init_scope_at(root, identity, knowledge, config, Utc::now())
}

pub fn init_scope_at(
    root: &Path,
    identity: &str,
    knowledge: Option<&str>,
    config: &Config,
    now: DateTime<Utc>,
) -> Result<PathBuf> {
    if identity.trim().is_empty() {
        return Err(MemoryError::invalid("identity", "Identity content must not be empty"));
    }

    let root = resolve_target(root);
    let marker = config.scope.marker_path(&root);
    fs::create_dir_all(&marker).map_err(MemoryError::io(&marker))?;

    let identity_path = marker.join(&config.scope.identity_file);
    if identity_path.exists() {
        warn!(path = %identity_path.display(), "Replacing existing identity file");
    }
    let identity_doc = new_document("context", &format!("{}\n", identity.trim_end()), now);
    fs::write(&identity_path, identity_doc).map_err(MemoryError::io(&identity_path))?;

    if let Some(knowledge) = knowledge.map(str::trim).filter(|k| !k.is_empty()) {
        let knowledge_path = marker.join(&config.scope.knowledge_file);
        let doc = new_document("knowledge", &format!("{LOG_TITLE}\n\n{knowledge}\n"), now);
        fs::write(&knowledge_path, doc).map_err(MemoryError::io(&knowledge_path))?;
    }

    info!(path = %marker.display(), "Initialized memory scope");
    Ok(marker)
}

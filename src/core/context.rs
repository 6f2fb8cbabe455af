//! Context assembly - the retrieval entry point
//!
//! Gathers everything an agent needs when it starts working somewhere:
//! the identity chain from the outermost scope down, the size-gated
//! knowledge of the deepest scope, live session state, and where the
//! neighbouring scopes are.
//!
//! Orientation (root identity plus a map of every scope) is expensive and
//! only wanted once per session. Whether to include it is decided by the
//! caller through [`ContextRequest::orientation`].

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use tracing::debug;

use super::error::{MemoryError, Result};
use super::hierarchy::resolve_target;
use super::parser::parse_log;
use super::state::{format_state_for_display, load_scope_state, SessionState};
use super::view::{build_view, KnowledgeView};
use crate::config::Config;

/// What to load
#[derive(Debug, Clone, Default)]
pub struct ContextRequest {
    pub target: PathBuf,
    pub topic: Option<String>,
    /// Include root identity and the scope map
    pub orientation: bool,
}

impl ContextRequest {
    pub fn new(target: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
            ..Default::default()
        }
    }

    pub fn with_topic(mut self, topic: Option<String>) -> Self {
        self.topic = topic;
        self
    }

    pub fn with_orientation(mut self, orientation: bool) -> Self {
        self.orientation = orientation;
        self
    }
}

/// One scope of the identity chain
#[derive(Debug, Clone, Serialize)]
pub struct ChainItem {
    pub name: String,
    pub dir: PathBuf,
    pub identity: String,
}

impl ChainItem {
    /// First markdown heading of the identity, hashes stripped
    pub fn display_title(&self) -> String {
        self.identity
            .lines()
            .find(|l| l.starts_with('#'))
            .map(|l| l.trim_start_matches('#').trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| self.name.clone())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ContextResult {
    pub target: PathBuf,
    pub chain: Vec<ChainItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub knowledge: Option<KnowledgeView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<SessionState>,
    pub memory_files: Vec<String>,
    pub siblings: Vec<String>,
    pub children: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orientation: Option<String>,
}

/// Assemble context for `request.target`
pub fn load_context(request: &ContextRequest, config: &Config) -> Result<ContextResult> {
    load_context_at(request, config, Utc::now())
}

/// [`load_context`] with an explicit clock for state expiry
pub fn load_context_at(
    request: &ContextRequest,
    config: &Config,
    now: DateTime<Utc>,
) -> Result<ContextResult> {
    let locator = config.locator();
    let target = resolve_target(&request.target);
    let scopes = locator.find_ancestor_chain(&target);

    let chain: Vec<ChainItem> = scopes
        .iter()
        .filter_map(|scope| {
            let path = scope.identity_path();
            match fs::read_to_string(&path) {
                Ok(identity) => Some(ChainItem {
                    name: scope.name(),
                    dir: scope.dir.clone(),
                    identity,
                }),
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "skipping unreadable identity");
                    None
                }
            }
        })
        .collect();

    let deepest = scopes.last();

    let knowledge = match deepest {
        Some(scope) if scope.has_knowledge() => {
            let path = scope.knowledge_path();
            let raw = fs::read_to_string(&path).map_err(MemoryError::io(&path))?;
            let parsed = parse_log(&raw);
            Some(build_view(&parsed, &config.view_budget(), request.topic.as_deref()))
        }
        _ => None,
    };

    let memory_files = deepest
        .map(|scope| {
            scope
                .memory_files(locator.layout())
                .iter()
                .map(|role| locator.layout().file_name(role).to_string())
                .collect()
        })
        .unwrap_or_default();

    let state = match locator.find_nearest_scope(&target) {
        Some(scope) => load_scope_state(&scope, config, now)?.filter(|s| !s.expired),
        None => None,
    };

    let orientation = if request.orientation {
        let root = scopes
            .first()
            .map(|scope| scope.dir.clone())
            .unwrap_or_else(|| target.clone());
        Some(orient(&root, config))
    } else {
        None
    };

    Ok(ContextResult {
        siblings: locator.find_sibling_scopes(&target),
        children: locator.find_child_scopes(&target),
        target,
        chain,
        knowledge,
        state,
        memory_files,
        orientation,
    })
}

/// Markdown rendering of a context result
pub fn format_context_for_display(result: &ContextResult) -> String {
    let mut out = String::new();

    if let Some(orientation) = &result.orientation {
        let _ = writeln!(out, "{}\n", orientation.trim_end());
    }

    if !result.chain.is_empty() {
        out.push_str("## Domain Chain\n\n");
        for item in &result.chain {
            let _ = writeln!(out, "- **{}**: {}", item.name, item.display_title());
        }
        out.push('\n');
    }

    if let Some(deepest) = result.chain.last() {
        let _ = writeln!(out, "## Current Context: {}\n", deepest.name);
        let _ = writeln!(out, "{}\n", deepest.identity.trim_end());
    }

    if let Some(knowledge) = &result.knowledge {
        let _ = writeln!(out, "## Knowledge ({})\n", knowledge.mode);
        if let Some(warning) = &knowledge.warning {
            let _ = writeln!(out, "> ⚠️ Warning: {}\n", warning);
        }
        let _ = writeln!(out, "{}\n", knowledge.content.trim_end());
    }

    if result.state.is_some() {
        let _ = writeln!(out, "{}\n", format_state_for_display(result.state.as_ref()));
    }

    let sections = [
        ("Memory Files", &result.memory_files),
        ("Other Domains", &result.siblings),
        ("Subdomains", &result.children),
    ];
    for (heading, names) in sections {
        if names.is_empty() {
            continue;
        }
        let _ = writeln!(out, "## {}\n", heading);
        for name in names.iter() {
            let _ = writeln!(out, "- {}", name);
        }
        out.push('\n');
    }

    out.trim().to_string()
}

/// Payload for an agent's session-start hook
pub fn session_start_payload(result: &ContextResult) -> serde_json::Value {
    json!({
        "hookSpecificOutput": {
            "hookEventName": "SessionStart",
            "additionalContext": format_context_for_display(result),
        }
    })
}

/// Markdown list of every scope under `root`, indented by depth
pub fn memory_map(root: &Path, config: &Config) -> String {
    let root = resolve_target(root);
    let marker = &config.scope.marker_dir;

    let mut rel_dirs: Vec<PathBuf> = config
        .locator()
        .find_all_scopes(&root)
        .into_iter()
        .filter_map(|scope| scope.dir.strip_prefix(&root).ok().map(Path::to_path_buf))
        .collect();
    rel_dirs.sort();

    if rel_dirs.is_empty() {
        return format!("No {} found.", marker);
    }

    let mut out = String::from("## Memory Map\n\n");
    for rel in rel_dirs {
        let depth = rel.components().count();
        let shown = if depth == 0 {
            format!("{}/", marker)
        } else {
            format!("{}/{}/", rel.to_string_lossy(), marker)
        };
        let _ = writeln!(out, "{}- `{}`", "  ".repeat(depth), shown);
    }
    out
}

/// Root identity plus memory map
pub fn orient(root: &Path, config: &Config) -> String {
    let root = resolve_target(root);
    let identity_path = config.scope.marker_path(&root).join(&config.scope.identity_file);
    let identity = fs::read_to_string(&identity_path).unwrap_or_else(|_| {
        format!(
            "(No root {} found. Project may not be initialized.)",
            config.scope.identity_file
        )
    });

    format!(
        "# megg - Project Memory\n\n## Identity\n\n{}\n\n{}",
        identity.trim_end(),
        memory_map(&root, config).trim_end()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::write_state_at;
    use crate::core::view::ViewMode;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 14, 12, 0, 0).unwrap()
    }

    fn make_scope(dir: &Path, identity: &str, knowledge: Option<&str>) {
        let marker = dir.join(".megg");
        fs::create_dir_all(&marker).unwrap();
        fs::write(marker.join("info.md"), identity).unwrap();
        if let Some(k) = knowledge {
            fs::write(marker.join("knowledge.md"), k).unwrap();
        }
    }

    fn tree() -> (tempfile::TempDir, PathBuf) {
        let dir = tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        make_scope(&root, "---\ntype: context\n---\n\n# Acme\n\nCompany", None);
        make_scope(
            &root.join("api"),
            "# Api service",
            Some("## 2026-01-01 - Use X\n**Type:** decision\n**Topics:** infra\n\nbecause Y\n"),
        );
        make_scope(&root.join("web"), "# Web", None);
        make_scope(&root.join("api/auth"), "# Auth", None);
        fs::write(root.join("api/.megg/workflow.md"), "steps").unwrap();
        (dir, root)
    }

    #[test]
    fn test_chain_and_knowledge() {
        let (_guard, root) = tree();
        let result = load_context_at(&ContextRequest::new(root.join("api")), &Config::default(), now())
            .unwrap();

        let names: Vec<&str> = result.chain.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names.last(), Some(&"api"));
        assert_eq!(result.chain[result.chain.len() - 2].dir, root);

        let knowledge = result.knowledge.as_ref().unwrap();
        assert_eq!(knowledge.mode, ViewMode::Full);
        assert!(knowledge.content.contains("because Y"));

        assert_eq!(result.siblings, vec!["web"]);
        assert_eq!(result.children, vec!["auth"]);
        assert_eq!(result.memory_files, vec!["workflow.md"]);
        assert!(result.orientation.is_none());
    }

    #[test]
    fn test_display_sections() {
        let (_guard, root) = tree();
        let result = load_context_at(&ContextRequest::new(root.join("api")), &Config::default(), now())
            .unwrap();
        let text = format_context_for_display(&result);

        let name = root.file_name().unwrap().to_string_lossy().into_owned();
        assert!(text.contains(&format!("- **{}**: Acme", name)));
        assert!(text.contains("- **api**: Api service"));
        assert!(text.contains("## Current Context: api"));
        assert!(text.contains("## Knowledge (full)"));
        assert!(text.contains("## Memory Files\n\n- workflow.md"));
        assert!(text.contains("## Other Domains\n\n- web"));
        assert!(text.contains("## Subdomains\n\n- auth"));
    }

    #[test]
    fn test_topic_filter_miss() {
        let (_guard, root) = tree();
        let request = ContextRequest::new(root.join("api")).with_topic(Some("nope".into()));
        let result = load_context_at(&request, &Config::default(), now()).unwrap();
        assert_eq!(
            result.knowledge.unwrap().content,
            "No entries found for topic: \"nope\""
        );
    }

    #[test]
    fn test_state_included_when_fresh() {
        let (_guard, root) = tree();
        let config = Config::default();
        write_state_at(&root.join("api"), "mid refactor", &config, now()).unwrap();

        let result = load_context_at(&ContextRequest::new(root.join("api")), &config, now()).unwrap();
        assert_eq!(result.state.as_ref().unwrap().content, "mid refactor");
        assert!(format_context_for_display(&result).contains("## Session State"));

        let later = now() + chrono::Duration::hours(72);
        let result = load_context_at(&ContextRequest::new(root.join("api")), &config, later).unwrap();
        assert!(result.state.is_none());
    }

    #[test]
    fn test_orientation_on_request() {
        let (_guard, root) = tree();
        let request = ContextRequest::new(root.join("api/auth")).with_orientation(true);
        let result = load_context_at(&request, &Config::default(), now()).unwrap();

        let orientation = result.orientation.unwrap();
        assert!(orientation.starts_with("# megg - Project Memory"));
        assert!(orientation.contains("# Acme"));
        assert!(orientation.contains("- `.megg/`\n"));
        assert!(orientation.contains("  - `api/.megg/`\n"));
        assert!(orientation.contains("    - `api/auth/.megg/`"));
    }

    #[test]
    fn test_session_start_payload() {
        let (_guard, root) = tree();
        let result = load_context_at(&ContextRequest::new(root.join("web")), &Config::default(), now())
            .unwrap();
        let payload = session_start_payload(&result);
        assert_eq!(payload["hookSpecificOutput"]["hookEventName"], "SessionStart");
        assert!(payload["hookSpecificOutput"]["additionalContext"]
            .as_str()
            .unwrap()
            .contains("## Current Context: web"));
    }

    #[test]
    fn test_memory_map_empty() {
        let dir = tempdir().unwrap();
        assert_eq!(memory_map(dir.path(), &Config::default()), "No .megg found.");
    }
}

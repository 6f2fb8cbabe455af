//! Project analysis for scope initialization
//!
//! Looks at a directory before a scope is created there and tells the
//! caller what it inherits, what kind of project it is and which
//! questions to ask. File creation itself lives in
//! [`crate::core::writer::init_scope`].

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use super::hierarchy::{resolve_target, SkipList};
use crate::config::Config;

/// Files worth pointing out when present at the project root
pub const KEY_FILES: [&str; 12] = [
    "README.md",
    "readme.md",
    "package.json",
    "Cargo.toml",
    "pyproject.toml",
    "setup.py",
    "go.mod",
    "tsconfig.json",
    "Dockerfile",
    "docker-compose.yml",
    "Makefile",
    ".env.example",
];

/// Manifests that mark a directory as a codebase
const CODE_MANIFESTS: [&str; 4] = ["package.json", "Cargo.toml", "go.mod", "pyproject.toml"];

/// Depth of the structure tree shown to the caller
const TREE_DEPTH: usize = 3;

const DOMAIN_QUESTIONS: [&str; 3] = [
    "What is this domain/area about?",
    "Any rules I should always follow here?",
    "Key stakeholders or contacts?",
];

const CODEBASE_QUESTIONS: [&str; 3] = [
    "What is this project and what problem does it solve?",
    "Any coding conventions or rules to follow?",
    "Key technical decisions already made?",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectKind {
    Domain,
    Codebase,
}

impl std::fmt::Display for ProjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProjectKind::Domain => write!(f, "domain"),
            ProjectKind::Codebase => write!(f, "codebase"),
        }
    }
}

/// A parent scope the new one will inherit from
#[derive(Debug, Clone, Serialize)]
pub struct InheritedScope {
    pub name: String,
    pub dir: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InitAnalysis {
    AlreadyInitialized {
        marker: PathBuf,
    },
    NeedsInput {
        root: PathBuf,
        parent_chain: Vec<InheritedScope>,
        tree: String,
        key_files: Vec<String>,
        suggested_kind: ProjectKind,
        questions: Vec<String>,
    },
}

/// Inspect `root` ahead of initialization
pub fn analyze_project(root: &Path, config: &Config) -> InitAnalysis {
    let root = resolve_target(root);
    let locator = config.locator();
    let layout = locator.layout();

    let identity = layout.marker_path(&root).join(&layout.identity_file);
    if identity.is_file() {
        return InitAnalysis::AlreadyInitialized {
            marker: layout.marker_path(&root),
        };
    }

    let parent_chain = match root.parent() {
        Some(parent) => locator
            .find_ancestor_chain(parent)
            .into_iter()
            .map(|scope| InheritedScope {
                name: scope.name(),
                dir: scope.dir,
            })
            .collect(),
        None => Vec::new(),
    };

    let key_files: Vec<String> = KEY_FILES
        .iter()
        .filter(|name| root.join(name).exists())
        .map(|name| name.to_string())
        .collect();

    let suggested_kind = if key_files.iter().any(|f| CODE_MANIFESTS.contains(&f.as_str())) {
        ProjectKind::Codebase
    } else {
        ProjectKind::Domain
    };

    let questions = match suggested_kind {
        ProjectKind::Domain => DOMAIN_QUESTIONS,
        ProjectKind::Codebase => CODEBASE_QUESTIONS,
    };

    let skip = SkipList::new(config.scan.skip_dirs.iter().cloned());
    let mut tree = Vec::new();
    build_tree(&root, 0, &skip, &layout.marker_dir, &mut tree);

    InitAnalysis::NeedsInput {
        root,
        parent_chain,
        tree: tree.join("\n"),
        key_files,
        suggested_kind,
        questions: questions.iter().map(|q| q.to_string()).collect(),
    }
}

/// Indented listing, directories before files, hidden entries skipped
/// except the marker directory
fn build_tree(dir: &Path, depth: usize, skip: &SkipList, marker: &str, lines: &mut Vec<String>) {
    if depth >= TREE_DEPTH {
        return;
    }

    let read_dir = match fs::read_dir(dir) {
        Ok(read_dir) => read_dir,
        Err(e) => {
            debug!(dir = %dir.display(), error = %e, "skipping unreadable directory");
            return;
        }
    };

    let mut children: Vec<(bool, String)> = read_dir
        .filter_map(|entry| entry.ok())
        .map(|entry| {
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            (is_dir, entry.file_name().to_string_lossy().into_owned())
        })
        .filter(|(is_dir, name)| {
            if name == marker {
                return true;
            }
            if *is_dir {
                !skip.is_skipped(name)
            } else {
                !name.starts_with('.')
            }
        })
        .collect();
    // directories first, then by name
    children.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));

    let indent = "  ".repeat(depth);
    for (is_dir, name) in children {
        let icon = if is_dir { "📁" } else { "📄" };
        lines.push(format!("{indent}{icon} {name}"));
        if is_dir {
            build_tree(&dir.join(&name), depth + 1, skip, marker, lines);
        }
    }
}

/// Render an analysis as markdown
pub fn format_init_analysis(analysis: &InitAnalysis) -> String {
    match analysis {
        InitAnalysis::AlreadyInitialized { marker } => format!(
            "megg already initialized at {}. Use context to load it.",
            marker.display()
        ),
        InitAnalysis::NeedsInput {
            parent_chain,
            tree,
            key_files,
            suggested_kind,
            questions,
            ..
        } => {
            let mut out = String::from("# megg Init Analysis\n\n");

            if !parent_chain.is_empty() {
                out.push_str("## Parent Context\n\nThis location inherits from:\n");
                for parent in parent_chain {
                    let _ = writeln!(out, "- {}", parent.name);
                }
                out.push('\n');
            }

            out.push_str("## Project Structure\n\n");
            let _ = writeln!(out, "```\n{}\n```\n", tree);
            if !key_files.is_empty() {
                let _ = writeln!(out, "**Key files found:** {}\n", key_files.join(", "));
            }
            let _ = writeln!(out, "**Detected type:** {}\n", suggested_kind);

            out.push_str("## Questions to Answer\n\n");
            for question in questions {
                let _ = writeln!(out, "- {}", question);
            }

            out.push_str(
                "\n---\n\nProvide answers and run init again with identity (and optional knowledge) content to complete.",
            );
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_codebase_detection() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("Cargo.toml"), "[package]").unwrap();
        fs::write(dir.path().join("README.md"), "# x").unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/main.rs"), "").unwrap();
        fs::create_dir_all(dir.path().join("target/debug")).unwrap();

        match analyze_project(dir.path(), &Config::default()) {
            InitAnalysis::NeedsInput {
                key_files,
                suggested_kind,
                questions,
                tree,
                ..
            } => {
                assert_eq!(key_files, vec!["README.md", "Cargo.toml"]);
                assert_eq!(suggested_kind, ProjectKind::Codebase);
                assert_eq!(questions[0], CODEBASE_QUESTIONS[0]);
                assert_eq!(tree, "📁 src\n  📄 main.rs\n📄 Cargo.toml\n📄 README.md");
            }
            other => panic!("unexpected analysis: {:?}", other),
        }
    }

    #[test]
    fn test_domain_by_default() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();

        let analysis = analyze_project(dir.path(), &Config::default());
        let text = format_init_analysis(&analysis);
        assert!(text.contains("**Detected type:** domain"));
        assert!(text.contains(DOMAIN_QUESTIONS[2]));
    }

    #[test]
    fn test_already_initialized() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".megg")).unwrap();
        fs::write(dir.path().join(".megg/info.md"), "# X").unwrap();

        assert!(matches!(
            analyze_project(dir.path(), &Config::default()),
            InitAnalysis::AlreadyInitialized { .. }
        ));
    }

    #[test]
    fn test_parent_chain_is_inherited() {
        let dir = tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        fs::create_dir_all(root.join(".megg")).unwrap();
        fs::write(root.join(".megg/info.md"), "# Parent").unwrap();
        fs::create_dir_all(root.join("child")).unwrap();

        match analyze_project(&root.join("child"), &Config::default()) {
            InitAnalysis::NeedsInput { parent_chain, .. } => {
                let last = parent_chain.last().unwrap();
                assert_eq!(last.dir, root);
            }
            other => panic!("unexpected analysis: {:?}", other),
        }
    }
}

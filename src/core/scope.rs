//! Memory scopes
//!
//! A scope is a directory that owns memory files inside a marker
//! directory (`.megg` by default). Which file plays which role is decided
//! by a [`ScopeLayout`], so the single-log layout and the multi-file
//! layout are configurations of the same type.
//!
//! ```text
//! project/
//! ├── .megg/
//! │   ├── info.md        <- Identity (required for the ancestor chain)
//! │   ├── knowledge.md   <- Knowledge
//! │   ├── state.md       <- State
//! │   └── workflow.md    <- Custom("workflow.md")
//! └── api/
//!     └── .megg/ ...
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Role a file plays inside a scope
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileRole {
    Identity,
    Knowledge,
    State,
    Custom(String),
}

impl fmt::Display for FileRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileRole::Identity => write!(f, "identity"),
            FileRole::Knowledge => write!(f, "knowledge"),
            FileRole::State => write!(f, "state"),
            FileRole::Custom(name) => write!(f, "custom:{}", name),
        }
    }
}

/// Marker directory name and file name per role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeLayout {
    #[serde(default = "default_marker_dir")]
    pub marker_dir: String,

    #[serde(default = "default_identity_file")]
    pub identity_file: String,

    #[serde(default = "default_knowledge_file")]
    pub knowledge_file: String,

    #[serde(default = "default_state_file")]
    pub state_file: String,
}

impl Default for ScopeLayout {
    fn default() -> Self {
        Self {
            marker_dir: default_marker_dir(),
            identity_file: default_identity_file(),
            knowledge_file: default_knowledge_file(),
            state_file: default_state_file(),
        }
    }
}

fn default_marker_dir() -> String {
    ".megg".to_string()
}

fn default_identity_file() -> String {
    "info.md".to_string()
}

fn default_knowledge_file() -> String {
    "knowledge.md".to_string()
}

fn default_state_file() -> String {
    "state.md".to_string()
}

impl ScopeLayout {
    /// File name for a role
    pub fn file_name<'a>(&'a self, role: &'a FileRole) -> &'a str {
        match role {
            FileRole::Identity => &self.identity_file,
            FileRole::Knowledge => &self.knowledge_file,
            FileRole::State => &self.state_file,
            FileRole::Custom(name) => name,
        }
    }

    /// Marker directory for `dir`
    pub fn marker_path(&self, dir: &Path) -> PathBuf {
        dir.join(&self.marker_dir)
    }

    /// Does `dir` carry a marker directory?
    pub fn is_scope_dir(&self, dir: &Path) -> bool {
        self.marker_path(dir).is_dir()
    }

    fn is_reserved(&self, file_name: &str) -> bool {
        file_name == self.identity_file
            || file_name == self.knowledge_file
            || file_name == self.state_file
    }
}

/// A directory owning memory files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryScope {
    /// Directory that owns the scope
    pub dir: PathBuf,

    /// The marker directory inside `dir`
    pub marker: PathBuf,

    files: BTreeMap<FileRole, PathBuf>,
}

impl MemoryScope {
    /// Describe the scope owned by `dir`. Does not touch the filesystem.
    pub fn open(dir: &Path, layout: &ScopeLayout) -> Self {
        let marker = layout.marker_path(dir);
        let files = [FileRole::Identity, FileRole::Knowledge, FileRole::State]
            .into_iter()
            .map(|role| {
                let path = marker.join(layout.file_name(&role));
                (role, path)
            })
            .collect();

        Self {
            dir: dir.to_path_buf(),
            marker,
            files,
        }
    }

    /// Path for a role (custom roles resolve inside the marker directory)
    pub fn path(&self, role: &FileRole) -> PathBuf {
        match self.files.get(role) {
            Some(path) => path.clone(),
            None => match role {
                FileRole::Custom(name) => self.marker.join(name),
                // open() registers every built-in role
                _ => self.marker.clone(),
            },
        }
    }

    pub fn identity_path(&self) -> PathBuf {
        self.path(&FileRole::Identity)
    }

    pub fn knowledge_path(&self) -> PathBuf {
        self.path(&FileRole::Knowledge)
    }

    pub fn state_path(&self) -> PathBuf {
        self.path(&FileRole::State)
    }

    pub fn exists(&self) -> bool {
        self.marker.is_dir()
    }

    pub fn has_identity(&self) -> bool {
        self.identity_path().is_file()
    }

    pub fn has_knowledge(&self) -> bool {
        self.knowledge_path().is_file()
    }

    /// Human name: the directory's basename, `root` for `/`
    pub fn name(&self) -> String {
        self.dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "root".to_string())
    }

    /// Markdown files in the marker directory that have no built-in role
    pub fn memory_files(&self, layout: &ScopeLayout) -> Vec<FileRole> {
        let Ok(read_dir) = std::fs::read_dir(&self.marker) else {
            return Vec::new();
        };

        let mut names: Vec<String> = read_dir
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .filter(|name| name.ends_with(".md") && !name.starts_with('.'))
            .filter(|name| !layout.is_reserved(name))
            .collect();
        names.sort();

        names.into_iter().map(FileRole::Custom).collect()
    }
}

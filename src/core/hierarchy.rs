//! Hierarchy locator - discovers memory scopes around a path
//!
//! Upward discovery (ancestor chain, nearest scope) walks the target's
//! ancestors. Downward discovery (siblings, children, full scan) goes
//! through [`walk_dirs`], the one traversal that applies the skip list.
//!
//! Discovery is best effort: unreadable or vanished directories are
//! logged at debug level and treated as "no scope here".

use std::path::{Path, PathBuf};

use tracing::debug;

use super::scope::{MemoryScope, ScopeLayout};

/// Build and dependency directories never scanned
pub const DEFAULT_SKIP_DIRS: [&str; 13] = [
    "node_modules",
    ".git",
    "dist",
    "build",
    "__pycache__",
    ".venv",
    "venv",
    ".next",
    ".nuxt",
    "target",
    ".cargo",
    "vendor",
    "coverage",
];

/// Depth limit for full scans
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Directory names excluded from downward traversal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipList {
    names: Vec<String>,
}

impl Default for SkipList {
    fn default() -> Self {
        Self::new(DEFAULT_SKIP_DIRS.iter().map(|s| s.to_string()))
    }
}

impl SkipList {
    pub fn new(names: impl IntoIterator<Item = String>) -> Self {
        Self {
            names: names.into_iter().collect(),
        }
    }

    /// Hidden directories are always skipped
    pub fn is_skipped(&self, name: &str) -> bool {
        name.starts_with('.') || self.names.iter().any(|n| n == name)
    }
}

/// Depth-first walk over directories below `root`
///
/// `visit` is called with each directory and its depth; `root` is depth 0.
/// Children are visited in sorted order so results are deterministic.
/// Symlinks are not followed.
pub fn walk_dirs(root: &Path, max_depth: usize, skip: &SkipList, visit: &mut dyn FnMut(&Path, usize)) {
    visit(root, 0);
    descend(root, 1, max_depth, skip, visit);
}

fn descend(
    dir: &Path,
    depth: usize,
    max_depth: usize,
    skip: &SkipList,
    visit: &mut dyn FnMut(&Path, usize),
) {
    if depth > max_depth {
        return;
    }

    let read_dir = match std::fs::read_dir(dir) {
        Ok(read_dir) => read_dir,
        Err(e) => {
            debug!(dir = %dir.display(), error = %e, "skipping unreadable directory");
            return;
        }
    };

    let mut children: Vec<PathBuf> = read_dir
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .filter(|entry| !skip.is_skipped(&entry.file_name().to_string_lossy()))
        .map(|entry| entry.path())
        .collect();
    children.sort();

    for child in children {
        visit(&child, depth);
        descend(&child, depth + 1, max_depth, skip, visit);
    }
}

/// Absolute directory for a target path
///
/// Relative paths resolve against the working directory. Existing paths
/// are canonicalized; a file resolves to its parent directory.
pub fn resolve_target(target: &Path) -> PathBuf {
    let absolute = if target.is_absolute() {
        target.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(target))
            .unwrap_or_else(|_| target.to_path_buf())
    };
    let absolute = absolute.canonicalize().unwrap_or(absolute);

    if absolute.is_file() {
        absolute
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or(absolute)
    } else {
        absolute
    }
}

/// Scope discovery
#[derive(Debug, Clone)]
pub struct ScopeLocator {
    layout: ScopeLayout,
    skip: SkipList,
    max_depth: usize,
}

impl Default for ScopeLocator {
    fn default() -> Self {
        Self::new(ScopeLayout::default(), SkipList::default(), DEFAULT_MAX_DEPTH)
    }
}

impl ScopeLocator {
    pub fn new(layout: ScopeLayout, skip: SkipList, max_depth: usize) -> Self {
        Self {
            layout,
            skip,
            max_depth,
        }
    }

    pub fn layout(&self) -> &ScopeLayout {
        &self.layout
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Scopes with a readable identity file from the filesystem root down
    /// to `target`
    pub fn find_ancestor_chain(&self, target: &Path) -> Vec<MemoryScope> {
        let start = resolve_target(target);
        let mut chain: Vec<MemoryScope> = start
            .ancestors()
            .map(|dir| MemoryScope::open(dir, &self.layout))
            .filter(|scope| is_readable_file(&scope.identity_path()))
            .collect();
        chain.reverse();
        chain
    }

    /// First directory at or above `target` with a marker directory
    ///
    /// The identity file is not required here.
    pub fn find_nearest_scope(&self, target: &Path) -> Option<MemoryScope> {
        let start = resolve_target(target);
        start
            .ancestors()
            .find(|dir| self.layout.is_scope_dir(dir))
            .map(|dir| MemoryScope::open(dir, &self.layout))
    }

    /// Names of sibling directories of `target` that are scopes, sorted
    pub fn find_sibling_scopes(&self, target: &Path) -> Vec<String> {
        let start = resolve_target(target);
        match start.parent() {
            Some(parent) => self.scope_names_below(parent, Some(&start)),
            None => Vec::new(),
        }
    }

    /// Names of immediate child directories of `target` that are scopes, sorted
    pub fn find_child_scopes(&self, target: &Path) -> Vec<String> {
        let start = resolve_target(target);
        self.scope_names_below(&start, None)
    }

    /// Every scope below `root`, `root` included, within the depth limit
    pub fn find_all_scopes(&self, root: &Path) -> Vec<MemoryScope> {
        let root = resolve_target(root);
        let mut found = Vec::new();
        walk_dirs(&root, self.max_depth, &self.skip, &mut |dir, _depth| {
            if self.layout.is_scope_dir(dir) {
                found.push(MemoryScope::open(dir, &self.layout));
            }
        });
        found
    }

    fn scope_names_below(&self, dir: &Path, exclude: Option<&Path>) -> Vec<String> {
        let mut names = Vec::new();
        // Only hidden directories are excluded here, not the deny-list
        let hidden_only = SkipList::new(std::iter::empty::<String>());
        walk_dirs(dir, 1, &hidden_only, &mut |child, depth| {
            if depth == 0 || Some(child) == exclude {
                return;
            }
            if self.layout.is_scope_dir(child) {
                if let Some(name) = child.file_name() {
                    names.push(name.to_string_lossy().into_owned());
                }
            }
        });
        names.sort();
        names
    }
}

fn is_readable_file(path: &Path) -> bool {
    path.is_file() && std::fs::File::open(path).is_ok()
}

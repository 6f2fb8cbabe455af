//! Configuration module
//!
//! Thresholds, scan limits and scope layout, loaded from TOML.
//!
//! ```toml
//! [knowledge]
//! full_threshold = 8000
//! summary_threshold = 16000
//!
//! [maintenance]
//! staleness_days = 90
//!
//! [scope]
//! marker_dir = ".megg"
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::hierarchy::{ScopeLocator, SkipList, DEFAULT_MAX_DEPTH, DEFAULT_SKIP_DIRS};
use crate::core::scope::ScopeLayout;
use crate::core::view::ViewBudget;

/// Name of the config file inside a marker directory
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub knowledge: KnowledgeConfig,

    #[serde(default)]
    pub maintenance: MaintenanceConfig,

    #[serde(default)]
    pub state: StateConfig,

    #[serde(default)]
    pub scan: ScanConfig,

    #[serde(default)]
    pub scope: ScopeLayout,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// Load the whole log at or below this many tokens
    #[serde(default = "default_full_threshold")]
    pub full_threshold: usize,

    /// Show a summary at or below this, block above
    #[serde(default = "default_summary_threshold")]
    pub summary_threshold: usize,

    /// Writer warns once a log passes this
    #[serde(default = "default_warning_threshold")]
    pub warning_threshold: usize,

    /// Size proposed by `summarize` actions
    #[serde(default = "default_target_tokens")]
    pub target_tokens: usize,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            full_threshold: default_full_threshold(),
            summary_threshold: default_summary_threshold(),
            warning_threshold: default_warning_threshold(),
            target_tokens: default_target_tokens(),
        }
    }
}

fn default_full_threshold() -> usize {
    8000
}

fn default_summary_threshold() -> usize {
    16000
}

fn default_warning_threshold() -> usize {
    12000
}

fn default_target_tokens() -> usize {
    8000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceConfig {
    #[serde(default = "default_bloat_threshold")]
    pub bloat_threshold: usize,

    #[serde(default = "default_block_threshold")]
    pub block_threshold: usize,

    #[serde(default = "default_staleness_days")]
    pub staleness_days: i64,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            bloat_threshold: default_bloat_threshold(),
            block_threshold: default_block_threshold(),
            staleness_days: default_staleness_days(),
        }
    }
}

fn default_bloat_threshold() -> usize {
    8000
}

fn default_block_threshold() -> usize {
    16000
}

fn default_staleness_days() -> i64 {
    90
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateConfig {
    #[serde(default = "default_state_token_limit")]
    pub token_limit: usize,

    #[serde(default = "default_state_staleness_hours")]
    pub staleness_hours: i64,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            token_limit: default_state_token_limit(),
            staleness_hours: default_state_staleness_hours(),
        }
    }
}

fn default_state_token_limit() -> usize {
    2000
}

fn default_state_staleness_hours() -> i64 {
    48
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    #[serde(default = "default_skip_dirs")]
    pub skip_dirs: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            skip_dirs: default_skip_dirs(),
        }
    }
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

fn default_skip_dirs() -> Vec<String> {
    DEFAULT_SKIP_DIRS.iter().map(|s| s.to_string()).collect()
}

/// Where the effective configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Explicit(PathBuf),
    Local(PathBuf),
    Global(PathBuf),
    Defaults,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::Explicit(p) => write!(f, "{} (explicit)", p.display()),
            ConfigSource::Local(p) => write!(f, "{} (local)", p.display()),
            ConfigSource::Global(p) => write!(f, "{} (global)", p.display()),
            ConfigSource::Defaults => write!(f, "built-in defaults"),
        }
    }
}

impl Config {
    /// Load config from default locations
    pub fn load() -> Result<Self> {
        Self::load_with_source(None).map(|(config, _)| config)
    }

    /// Load config, preferring an explicit file
    ///
    /// Order: explicit path, nearest `.megg/config.toml` above the working
    /// directory, the per-user config file, defaults.
    pub fn load_with_source(explicit: Option<&Path>) -> Result<(Self, ConfigSource)> {
        if let Some(path) = explicit {
            let config = Self::load_from(path)?;
            return Ok((config, ConfigSource::Explicit(path.to_path_buf())));
        }

        if let Some(local) = Self::find_local_config() {
            let config = Self::load_from(&local)?;
            return Ok((config, ConfigSource::Local(local)));
        }

        if let Some(global) = Self::global_config_path() {
            if global.exists() {
                let config = Self::load_from(&global)?;
                return Ok((config, ConfigSource::Global(global)));
            }
        }

        Ok((Self::default(), ConfigSource::Defaults))
    }

    /// Load config from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject threshold combinations the engine cannot honour
    pub fn validate(&self) -> Result<()> {
        if self.knowledge.full_threshold > self.knowledge.summary_threshold {
            bail!(
                "knowledge.full_threshold ({}) must not exceed knowledge.summary_threshold ({})",
                self.knowledge.full_threshold,
                self.knowledge.summary_threshold
            );
        }
        if self.maintenance.bloat_threshold > self.maintenance.block_threshold {
            bail!(
                "maintenance.bloat_threshold ({}) must not exceed maintenance.block_threshold ({})",
                self.maintenance.bloat_threshold,
                self.maintenance.block_threshold
            );
        }
        if self.scan.max_depth == 0 {
            bail!("scan.max_depth must be at least 1");
        }
        if self.state.token_limit == 0 {
            bail!("state.token_limit must be at least 1");
        }
        if self.scope.marker_dir.trim().is_empty() {
            bail!("scope.marker_dir must not be empty");
        }
        Ok(())
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Find local .megg/config.toml walking up directories
    pub fn find_local_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;

        loop {
            let config_path = current
                .join(ScopeLayout::default().marker_dir)
                .join(CONFIG_FILE_NAME);
            if config_path.exists() {
                return Some(config_path);
            }

            if !current.pop() {
                break;
            }
        }

        None
    }

    /// Per-user config file, e.g. `~/.config/megg/config.toml` on Linux
    ///
    /// Never inside a marker directory, so it cannot turn `$HOME` into a scope.
    pub fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "megg")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    pub fn view_budget(&self) -> ViewBudget {
        ViewBudget {
            full_threshold: self.knowledge.full_threshold,
            summary_threshold: self.knowledge.summary_threshold,
        }
    }

    pub fn locator(&self) -> ScopeLocator {
        ScopeLocator::new(
            self.scope.clone(),
            SkipList::new(self.scan.skip_dirs.iter().cloned()),
            self.scan.max_depth,
        )
    }
}

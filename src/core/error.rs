//! Error taxonomy for the memory engine
//!
//! Every variant renders with its own prefix. The main consumer is an
//! autonomous agent that branches on the response text, so the prefixes
//! are part of the contract:
//!
//! - `Not initialized:` - no scope owns the requested path
//! - `Invalid input (<field>):` - rejected before any I/O
//! - `Malformed content at <path>:` - a file readers would ignore, from
//!   explicit validation such as [`crate::core::state::validate_state`]
//! - `I/O error at <path>:` - filesystem failure, propagated as-is
//!
//! Oversized knowledge is not an error. See [`crate::core::view::ViewMode::Blocked`].

use std::path::{Path, PathBuf};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, MemoryError>;

#[derive(Error, Debug)]
pub enum MemoryError {
    #[error("Not initialized: no {marker} directory found at or above {}. Run 'megg init' first.", path.display())]
    NotInitialized { path: PathBuf, marker: String },

    #[error("Invalid input ({field}): {message}")]
    InvalidInput { field: &'static str, message: String },

    #[error("Malformed content at {}: {reason}", path.display())]
    MalformedContent { path: PathBuf, reason: String },

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl MemoryError {
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            message: message.into(),
        }
    }

    pub fn not_initialized(path: &Path, marker: &str) -> Self {
        Self::NotInitialized {
            path: path.to_path_buf(),
            marker: marker.to_string(),
        }
    }

    /// Adapter for `map_err` on `std::fs` calls
    pub fn io(path: &Path) -> impl FnOnce(std::io::Error) -> Self + '_ {
        move |source| Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

//! megg - hierarchical memory for AI agents
//!
//! Knowledge lives in `.megg/` directories next to the code it describes.
//! Loading context for a path walks upward and collects every identity on
//! the way, so an agent working deep in a repo sees the whole chain.
//!
//! ## Key Concepts
//!
//! - **Scope**: a directory with a `.megg/` marker (`info.md`, `knowledge.md`, `state.md`)
//! - **Knowledge log**: append-only Markdown entries typed decision/pattern/gotcha/context
//! - **Token budget**: large logs are summarized, then blocked, instead of flooding the prompt
//! - **Session state**: short-lived handoff notes that expire after 48 hours

pub mod cli;
pub mod config;
pub mod core;
pub mod mcp;

pub use crate::config::Config;
pub use crate::core::context::{load_context, ContextRequest, ContextResult};
pub use crate::core::error::{MemoryError, Result};
pub use crate::core::maintenance::{analyze, MaintenanceReport};
pub use crate::core::writer::{append_entry, init_scope, NewEntry};
pub use crate::mcp::run_mcp_server;

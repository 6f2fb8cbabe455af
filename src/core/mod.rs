//! Core module - the memory engine
//!
//! Discovery, parsing, size-gated views, maintenance analysis and the
//! single write path. Every operation re-reads the filesystem; nothing is
//! cached between calls.

pub mod context;
pub mod entry;
pub mod error;
pub mod frontmatter;
pub mod hierarchy;
pub mod init;
pub mod maintenance;
pub mod parser;
pub mod scope;
pub mod state;
pub mod tokens;
pub mod view;
pub mod writer;

//! Fenchurch - one instructions file for every AI coding assistant
//!
//! Distributes a single canonical instructions document to the locations
//! each assistant expects (CLAUDE.MD, .cursor/rules, AGENTS.MD, ...) using
//! hard links, falling back to copies where links are not possible.

pub mod config;
pub mod gitignore;
pub mod linker;
pub mod report;
pub mod target;

pub use config::{PlatformConfig, PlatformDescriptor};
pub use linker::{Linker, OutcomeStatus, SyncError, SyncOptions, SyncOutcome, SyncReport};
pub use target::resolve_target;

//! Crate entry point for **grm** (git repo mirror).
//!
//! This library provides the internal implementation for the `grm` CLI.
//! Each submodule encapsulates one responsibility (config parsing, git operations, sync logic, etc.).
//! The `pub use` re-exports make selected commands and the sync helper itself accessible
//! directly from the crate root, so the git operations can also be used as a library.
//!
//! This file is primarily intended for developers hacking on `grm`.

mod config;
mod events;
mod git;
mod paths;
mod sync;

/// Re-export commonly used types and commands so they can be accessed from `grm::*`.
pub use config::{Config, Mirror, cmd_list, load_config};
pub use events::{NullObserver, SyncEvent, SyncObserver, SyncOptions, SyncStep};
pub use git::{
    ensure_cloned, ensure_cloned_with, ensure_updated, ensure_updated_with, is_cloned, remote_url,
};
pub use paths::grm_home;
pub use sync::cmd_sync;

//! Git integration layer.
//!
//! This module wraps the actual backend implementation (`git2_backend`)
//! and re-exports only the stable public API: the clone/update helpers
//! plus the two read-only queries (`is_cloned`, `remote_url`).
//!
//! The idea is to hide internal implementation details (currently based
//! on the `git2` crate) so that future backends or alternative
//! implementations could be swapped in without affecting the rest of
//! the codebase.

mod git2_backend;

pub use git2_backend::{
    ensure_cloned, ensure_cloned_with, ensure_updated, ensure_updated_with, is_cloned, remote_url,
};

//! Structured events emitted by the sync helper.
//!
//! The core git operations never write to the console. They report
//! progress through a [`SyncObserver`] injected via [`SyncOptions`],
//! and the caller decides how (and whether) to render it. The CLI
//! wires these events to per-job spinners; library users that want
//! silence pass [`NullObserver`], which is also the default.

use std::fmt;
use std::path::Path;
use std::sync::atomic::AtomicBool;

/// One step of the sync sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStep {
    Clone,
    Fetch,
    Reset,
    Clean,
}

impl fmt::Display for SyncStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SyncStep::Clone => "clone",
            SyncStep::Fetch => "fetch",
            SyncStep::Reset => "reset",
            SyncStep::Clean => "clean",
        };
        f.write_str(s)
    }
}

/// Lifecycle notification for a single step.
#[derive(Debug)]
pub enum SyncEvent<'a> {
    /// The step is about to run. `uri` is only present for clones.
    Started {
        step: SyncStep,
        uri: Option<&'a str>,
        dest: &'a Path,
    },
    /// The step completed.
    Succeeded { step: SyncStep, dest: &'a Path },
    /// The step failed. The same error is also returned to the caller;
    /// this event exists so renderers can mark the line without
    /// waiting for the error to bubble up.
    Failed {
        step: SyncStep,
        dest: &'a Path,
        message: String,
    },
}

/// Receiver for [`SyncEvent`]s.
///
/// Implementations must be `Sync` so an observer can be shared across
/// parallel jobs.
pub trait SyncObserver: Sync {
    fn on_event(&self, event: SyncEvent<'_>);
}

/// Observer that ignores every event.
pub struct NullObserver;

impl SyncObserver for NullObserver {
    fn on_event(&self, _event: SyncEvent<'_>) {}
}

/// Knobs shared by the `*_with` entry points of the git module.
///
/// `cancel` is checked from the transfer-progress callback during
/// clone/fetch; flipping it to `true` aborts the transfer, which
/// surfaces as an error from the running operation. The default is no
/// flag: operations block until the underlying transfer completes.
pub struct SyncOptions<'a> {
    pub observer: &'a dyn SyncObserver,
    pub cancel: Option<&'a AtomicBool>,
}

impl Default for SyncOptions<'_> {
    fn default() -> Self {
        Self {
            observer: &NullObserver,
            cancel: None,
        }
    }
}

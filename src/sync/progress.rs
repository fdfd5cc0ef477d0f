use indicatif::{ProgressBar, ProgressStyle};

use crate::events::{SyncEvent, SyncObserver};

/// Spinner style used during ongoing operations.
/// - Yellow spinner with animated braille-style frames.
/// - Displays the current message (`{wide_msg}`) next to the spinner.
pub fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("\x1b[33m{spinner}\x1b[0m {wide_msg}")
        .unwrap()
        .tick_strings(&["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"])
}

/// Style used when an operation finishes successfully.
/// - Green check mark followed by the final message.
pub fn ok_style() -> ProgressStyle {
    ProgressStyle::with_template("\x1b[32m✔\x1b[0m {wide_msg}").unwrap()
}

/// Style used when an operation fails with an error.
/// - Red cross followed by the error message.
pub fn err_style() -> ProgressStyle {
    ProgressStyle::with_template("\x1b[31m✘\x1b[0m {wide_msg}").unwrap()
}

/// Renders the sync helper's structured events onto one job's spinner.
///
/// The core git module performs no console writes of its own; this is
/// the CLI-side renderer injected per job. Step transitions update the
/// spinner message (`syncing <name>: fetch`, ...); final success and
/// failure styling is applied by the caller once the whole job ends,
/// so `Succeeded`/`Failed` need no handling here.
pub struct BarObserver<'a> {
    bar: &'a ProgressBar,
    display: &'a str,
}

impl<'a> BarObserver<'a> {
    pub fn new(bar: &'a ProgressBar, display: &'a str) -> Self {
        Self { bar, display }
    }
}

impl SyncObserver for BarObserver<'_> {
    fn on_event(&self, event: SyncEvent<'_>) {
        if let SyncEvent::Started { step, .. } = event {
            self.bar
                .set_message(format!("syncing {}: {}", self.display, step));
        }
    }
}

use anyhow::Result;
use indicatif::{MultiProgress, ProgressBar};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::Duration;

use super::progress::{err_style, ok_style, spinner_style};

/// Remove mirror directories that no manifest entry references.
///
/// Every directory under `mirrors_dir` whose name is **not in
/// `expect`** is deleted recursively. Mirror contents are disposable
/// by contract (sync hard-resets and cleans them), so removal needs no
/// further checks.
///
/// A spinner line is shown for each removal. Individual removal
/// failures are rendered on their line but do not abort the rest.
///
/// # Errors
/// Returns `Err` only if listing `mirrors_dir` fails for a reason
/// other than the directory not existing yet.
pub fn cleanup_stale_mirrors(
    mp: &MultiProgress,
    mirrors_dir: &Path,
    expect: &HashSet<String>,
) -> Result<()> {
    let rd = match fs::read_dir(mirrors_dir) {
        Ok(rd) => rd,
        Err(_) => return Ok(()),
    };

    for ent in rd.flatten() {
        let name = ent.file_name().to_string_lossy().to_string();
        if expect.contains(&name) {
            continue;
        }

        let pb = mp.add(ProgressBar::new_spinner());
        pb.set_style(spinner_style());
        pb.set_message(format!("removing stale mirror: {}", name));
        pb.enable_steady_tick(Duration::from_millis(80));

        match fs::remove_dir_all(ent.path()) {
            Ok(_) => {
                pb.set_style(ok_style());
                pb.finish_with_message(format!("removed mirror: {}", name));
            }
            Err(e) => {
                pb.set_style(err_style());
                pb.finish_with_message(format!("remove mirror {} (error: {})", name, e));
            }
        }
    }
    Ok(())
}

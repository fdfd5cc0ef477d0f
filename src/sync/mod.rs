mod cleanup;
pub(crate) mod jobs;
mod progress;

use anyhow::Result;
use indicatif::{MultiProgress, ProgressBar};
use rayon::prelude::*;
use std::fs;
use std::time::Duration;

use crate::config::load_config;
use crate::events::SyncOptions;
use crate::git::ensure_updated_with;
use crate::paths::paths;
use crate::sync::cleanup::cleanup_stale_mirrors;

use progress::{BarObserver, err_style, ok_style, spinner_style};

/// Synchronize the mirrors defined in `config.toml`.
///
/// High-level flow:
/// 1. Ensure the directory layout under `~/.grm` (`mirrors/` and the parent of `config.toml`).
/// 2. Load configuration and build the list of jobs to run (see [`jobs::build_jobs`]).
/// 3. Run clone/update **in parallel across distinct destinations** with progress spinners.
///    Each job itself is one blocking sequence: clone if absent, then fetch, hard reset to
///    the upstream ref, and removal of untracked files.
/// 4. Clean up mirror directories that are no longer referenced (see [`cleanup`]).
///
/// Progress reporting uses `indicatif::MultiProgress`; each job gets its own spinner, fed
/// by the structured events the git layer emits.
/// Errors in individual jobs are captured and shown on the job's line; processing continues
/// for the rest.
pub fn cmd_sync() -> Result<()> {
    let p = paths()?;
    fs::create_dir_all(&p.mirrors)?;
    if let Some(parent) = p.config.parent() {
        fs::create_dir_all(parent)?;
    }

    let cfg = load_config()?;
    if cfg.mirrors.is_empty() {
        eprintln!("no mirrors in {}", p.config.display());
        return Ok(());
    }

    let (jobs, expect_dirs) = jobs::build_jobs(&cfg, &p);

    let mp = MultiProgress::new();
    let run_style = spinner_style();
    let done_style = ok_style();
    let fail_style = err_style();

    let mut bars: Vec<ProgressBar> = Vec::with_capacity(jobs.len());
    for j in &jobs {
        let pb = mp.add(ProgressBar::new_spinner());
        pb.set_style(run_style.clone());
        pb.set_message(format!("syncing {}", j.display));
        pb.enable_steady_tick(Duration::from_millis(80));
        bars.push(pb);
    }

    jobs.par_iter().enumerate().for_each(|(idx, job)| {
        let pb = &bars[idx];
        let observer = BarObserver::new(pb, &job.display);
        let opts = SyncOptions {
            observer: &observer,
            cancel: None,
        };

        match ensure_updated_with(&job.uri, &job.dest, &opts) {
            Ok(_) => {
                pb.set_style(done_style.clone());
                pb.finish_with_message(format!("synced {}", job.display));
            }
            Err(e) => {
                pb.set_style(fail_style.clone());
                pb.finish_with_message(format!("syncing {} (error: {:#})", job.display, e));
            }
        }
    });

    cleanup_stale_mirrors(&mp, &p.mirrors, &expect_dirs)?;

    Ok(())
}

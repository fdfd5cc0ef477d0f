use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;

use crate::config::Config;
use crate::paths::Paths;

/// Represents a single mirror synchronization job.
///
/// Each job corresponds to one entry in `config.toml` and carries
/// everything needed to clone or update the repository: the remote uri
/// and the destination directory under `mirrors/`.
#[derive(Clone)]
pub struct SyncJob {
    pub display: String,
    pub uri: String,
    pub dest: PathBuf,
}

/// Build synchronization jobs from the parsed configuration.
///
/// Converts `Config.mirrors` into a list of [`SyncJob`]s and the set of
/// directory names a sync is expected to leave under `mirrors/`. The
/// set is later used to prune mirrors that are no longer configured.
///
/// Entries with an empty uri are skipped. So are entries whose
/// destination directory was already claimed by an earlier entry:
/// duplicate destinations would race in the parallel sync, so the
/// first entry wins.
pub fn build_jobs(cfg: &Config, p: &Paths) -> (Vec<SyncJob>, HashSet<String>) {
    let mut expect_dirs = HashSet::new();
    let mut jobs: Vec<SyncJob> = Vec::new();

    for m in &cfg.mirrors {
        if m.uri.trim().is_empty() {
            continue;
        }
        let dir = m.name.clone().unwrap_or_else(|| slug_for_uri(&m.uri));
        if !expect_dirs.insert(dir.clone()) {
            continue;
        }

        jobs.push(SyncJob {
            display: m.name.clone().unwrap_or_else(|| m.uri.clone()),
            uri: m.uri.clone(),
            dest: p.mirrors.join(&dir),
        });
    }

    (jobs, expect_dirs)
}

/// Derive a directory name from a remote uri.
///
/// `https://github.com/owner/repo.git` and `git@github.com:owner/repo.git`
/// both become `owner__repo` (deeper paths keep every segment, joined
/// with `__`). Anything that is neither a URL nor an scp-like spec —
/// typically a local path — falls back to its last path segment, with
/// a trailing `.git` stripped in all cases.
pub fn slug_for_uri(uri: &str) -> String {
    static SCP_LIKE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^[^@/]+@[^:/]+:(.+)$").unwrap());

    let repo_path = if let Some(caps) = SCP_LIKE.captures(uri) {
        Some(caps[1].to_string())
    } else if let Some((_scheme, tail)) = uri.split_once("://") {
        tail.split_once('/').map(|(_host, path)| path.to_string())
    } else {
        None
    };

    match repo_path {
        Some(path) => path
            .trim_matches('/')
            .trim_end_matches(".git")
            .split('/')
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("__"),
        None => uri
            .trim_end_matches('/')
            .trim_end_matches(".git")
            .rsplit('/')
            .find(|s| !s.is_empty())
            .unwrap_or("mirror")
            .to_string(),
    }
}

use anyhow::{Context, Result, anyhow};
use git2::{
    BranchType, Cred, FetchOptions, RemoteCallbacks, Repository, ResetType, Status, StatusOptions,
    SubmoduleUpdateOptions, build::RepoBuilder,
};
use std::fs;
use std::io;
use std::path::Path;
use std::sync::atomic::Ordering;

use crate::events::{SyncEvent, SyncOptions, SyncStep};

/// Build a `FetchOptions` with SSH-agent credentials enabled.
///
/// This allows Git operations to authenticate using the user's SSH
/// agent. If no SSH key is found, it falls back to default credentials.
/// When `opts` carry a cancel flag, the transfer-progress callback
/// checks it and aborts the transfer once the flag is set.
fn fetch_opts<'a>(opts: &SyncOptions<'a>) -> FetchOptions<'a> {
    let mut cb = RemoteCallbacks::new();
    cb.credentials(|_url, username_from_url, _allowed| {
        Cred::ssh_key_from_agent(username_from_url.unwrap_or("git")).or_else(|_| Cred::default())
    });
    if let Some(flag) = opts.cancel {
        cb.transfer_progress(move |_progress| !flag.load(Ordering::Relaxed));
    }

    let mut fo = FetchOptions::new();
    fo.remote_callbacks(cb);
    fo
}

/// Run one step of the sync sequence, reporting its lifecycle to the
/// observer and wrapping a failure with the step name and destination.
fn run_step<F>(
    step: SyncStep,
    uri: Option<&str>,
    dest: &Path,
    opts: &SyncOptions<'_>,
    f: F,
) -> Result<()>
where
    F: FnOnce() -> Result<()>,
{
    opts.observer.on_event(SyncEvent::Started { step, uri, dest });
    match f() {
        Ok(()) => {
            opts.observer.on_event(SyncEvent::Succeeded { step, dest });
            Ok(())
        }
        Err(e) => {
            opts.observer.on_event(SyncEvent::Failed {
                step,
                dest,
                message: format!("{e:#}"),
            });
            Err(e.context(format!("{} at {} failed", step, dest.display())))
        }
    }
}

/// Test whether `path` already holds a working copy.
///
/// True iff `path/.git` exists and is itself a directory. A missing
/// path or missing `.git` entry is `Ok(false)`; so is a `.git` regular
/// file (linked worktrees and submodules use those, and this helper
/// only manages full clones). Any other filesystem error, such as
/// permission denied, propagates.
pub fn is_cloned(path: &Path) -> Result<bool> {
    let git_dir = path.join(".git");
    match fs::metadata(&git_dir) {
        Ok(meta) => Ok(meta.is_dir()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e).with_context(|| format!("failed to stat {}", git_dir.display())),
    }
}

/// Ensure that a working copy of `uri` exists at `dest`.
///
/// If `dest` is already a working copy this is a no-op; it is **not**
/// verified that the existing clone points at `uri` (callers that care
/// can compare against [`remote_url`]). Otherwise the repository is
/// cloned with submodule recursion, checked out at the remote's
/// default branch.
///
/// # Errors
/// Returns an error if the existence check or the clone fails. No
/// partial-state cleanup is attempted; retry or removal policy belongs
/// to the caller.
pub fn ensure_cloned(uri: &str, dest: &Path) -> Result<()> {
    ensure_cloned_with(uri, dest, &SyncOptions::default())
}

/// [`ensure_cloned`] with explicit [`SyncOptions`] (observer, cancel flag).
pub fn ensure_cloned_with(uri: &str, dest: &Path, opts: &SyncOptions<'_>) -> Result<()> {
    if is_cloned(dest)? {
        return Ok(());
    }

    run_step(SyncStep::Clone, Some(uri), dest, opts, || {
        let mut builder = RepoBuilder::new();
        builder.fetch_options(fetch_opts(opts));

        let repo = builder
            .clone(uri, dest)
            .with_context(|| format!("git clone {} {}", uri, dest.display()))?;
        update_submodules(&repo)
    })
}

/// Ensure that `dest` is a working copy of `uri` and matches the
/// upstream tip, with no untracked files left behind.
///
/// Runs [`ensure_cloned`] first, then fetch → hard reset to the
/// tracked branch's upstream → removal of untracked and ignored
/// content. Destructive by design: local commits, modifications and
/// untracked files under `dest` are discarded, so the destination must
/// be treated as disposable.
pub fn ensure_updated(uri: &str, dest: &Path) -> Result<()> {
    ensure_updated_with(uri, dest, &SyncOptions::default())
}

/// [`ensure_updated`] with explicit [`SyncOptions`] (observer, cancel flag).
pub fn ensure_updated_with(uri: &str, dest: &Path, opts: &SyncOptions<'_>) -> Result<()> {
    ensure_cloned_with(uri, dest, opts)?;
    update_and_clean_untracked(dest, opts)
}

/// Fetch origin, hard-reset to the upstream ref, and remove untracked
/// content, in that order. The first failing step aborts the sequence;
/// later steps are never attempted.
fn update_and_clean_untracked(dest: &Path, opts: &SyncOptions<'_>) -> Result<()> {
    let repo = Repository::open(dest)
        .with_context(|| format!("failed to open repository at {}", dest.display()))?;

    run_step(SyncStep::Fetch, None, dest, opts, || {
        fetch_origin(&repo, opts)
    })?;
    run_step(SyncStep::Reset, None, dest, opts, || {
        reset_to_upstream(&repo)
    })?;
    run_step(SyncStep::Clean, None, dest, opts, || clean_untracked(&repo))
}

/// Perform `git fetch origin` to update remote refs.
///
/// This fetches both branches and tags from `origin` into the local
/// repository.
fn fetch_origin(repo: &Repository, opts: &SyncOptions<'_>) -> Result<()> {
    let mut fo = fetch_opts(opts);

    let mut remote = repo.find_remote("origin").context("no origin remote")?;
    remote.fetch(
        &[
            "refs/heads/*:refs/remotes/origin/*",
            "refs/tags/*:refs/tags/*",
        ],
        Some(&mut fo),
        None,
    )?;
    Ok(())
}

/// Hard-reset the working tree to the current branch's upstream.
///
/// The upstream is resolved through the branch's configured tracking
/// ref rather than a revspec, so a detached HEAD or a branch without
/// an upstream produces a named error instead of a parse failure.
fn reset_to_upstream(repo: &Repository) -> Result<()> {
    let head = repo.head().context("failed to resolve HEAD")?;
    if !head.is_branch() {
        return Err(anyhow!("HEAD is not on a local branch"));
    }
    let name = head
        .shorthand()
        .ok_or_else(|| anyhow!("invalid branch name"))?;

    let branch = repo.find_branch(name, BranchType::Local)?;
    let upstream = branch
        .upstream()
        .with_context(|| format!("branch {} has no upstream", name))?;
    let target = upstream.get().peel_to_commit()?;

    repo.reset(target.as_object(), ResetType::Hard, None)?;
    Ok(())
}

/// Remove untracked files and directories, including ignored ones
/// (the `git clean -xfd` equivalent).
///
/// libgit2 has no clean primitive, so this walks the status list with
/// untracked and ignored entries included. Directory recursion is off:
/// an untracked directory shows up as a single `dir/` entry and is
/// removed whole.
fn clean_untracked(repo: &Repository) -> Result<()> {
    let workdir = repo
        .workdir()
        .ok_or_else(|| anyhow!("repository has no working tree"))?;

    let mut so = StatusOptions::new();
    so.include_untracked(true)
        .include_ignored(true)
        .recurse_untracked_dirs(false);
    let statuses = repo.statuses(Some(&mut so))?;

    for entry in statuses.iter() {
        if !entry.status().intersects(Status::WT_NEW | Status::IGNORED) {
            continue;
        }
        let Some(rel) = entry.path() else { continue };
        let target = workdir.join(rel);
        if target.is_dir() {
            fs::remove_dir_all(&target)
                .with_context(|| format!("failed to remove {}", target.display()))?;
        } else {
            fs::remove_file(&target)
                .with_context(|| format!("failed to remove {}", target.display()))?;
        }
    }
    Ok(())
}

/// Initialize and update all submodules for the given repository.
///
/// This ensures that nested repositories are cloned and checked out at
/// the recorded revision.
fn update_submodules(repo: &Repository) -> Result<()> {
    let mut subs = repo.submodules()?;
    for sm in subs.iter_mut() {
        sm.init(true)?;
        let mut opt = SubmoduleUpdateOptions::new();
        sm.update(true, Some(&mut opt))?;
    }
    Ok(())
}

/// Return the URL configured for the `origin` remote of the working
/// copy at `path`.
///
/// # Errors
/// - `path` is not a working copy.
/// - No `origin` remote is configured.
/// - `origin` exists but has no URL set.
pub fn remote_url(path: &Path) -> Result<String> {
    let repo = Repository::open(path)
        .with_context(|| format!("failed to open repository at {}", path.display()))?;
    let remote = repo
        .find_remote("origin")
        .with_context(|| format!("no origin remote in {}", path.display()))?;
    let url = remote
        .url()
        .ok_or_else(|| anyhow!("origin remote in {} has no url", path.display()))?;
    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::SyncObserver;
    use git2::Signature;
    use std::sync::Mutex;
    use tempfile::tempdir;

    fn commit_all(repo: &Repository, message: &str) -> git2::Oid {
        let sig = Signature::now("grm-test", "grm-test@example.com").unwrap();
        let mut index = repo.index().unwrap();
        index
            .add_all(["*"], git2::IndexAddOption::DEFAULT, None)
            .unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .unwrap()
    }

    /// An origin repo with one commit: README.md plus a .gitignore
    /// covering `*.log`.
    fn origin_with_one_commit(dir: &Path) -> Repository {
        let repo = Repository::init(dir).unwrap();
        fs::write(dir.join("README.md"), "# origin\n").unwrap();
        fs::write(dir.join(".gitignore"), "*.log\n").unwrap();
        commit_all(&repo, "initial commit");
        repo
    }

    #[test]
    fn is_cloned_is_false_for_missing_and_plain_dirs() {
        let td = tempdir().unwrap();
        assert!(!is_cloned(&td.path().join("missing")).unwrap());

        let plain = td.path().join("plain");
        fs::create_dir_all(&plain).unwrap();
        assert!(!is_cloned(&plain).unwrap());
    }

    #[test]
    fn is_cloned_is_false_when_git_is_a_file() {
        let td = tempdir().unwrap();
        let dir = td.path().join("worktree-like");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(".git"), "gitdir: /somewhere/else\n").unwrap();
        assert!(!is_cloned(&dir).unwrap());
    }

    #[test]
    fn ensure_cloned_populates_and_is_idempotent() {
        let td = tempdir().unwrap();
        let origin_dir = td.path().join("origin");
        origin_with_one_commit(&origin_dir);

        let dest = td.path().join("mirror");
        let uri = origin_dir.to_str().unwrap();
        ensure_cloned(uri, &dest).unwrap();
        assert!(is_cloned(&dest).unwrap());
        assert!(dest.join("README.md").is_file());

        // second call must be a no-op, not a re-clone
        ensure_cloned(uri, &dest).unwrap();
    }

    #[test]
    fn ensure_cloned_fails_on_bogus_uri() {
        let td = tempdir().unwrap();
        let bogus = td.path().join("no-such-origin");
        let dest = td.path().join("mirror");
        let err = ensure_cloned(bogus.to_str().unwrap(), &dest).unwrap_err();
        assert!(err.to_string().contains("clone"));
    }

    #[test]
    fn ensure_updated_clones_when_missing() {
        let td = tempdir().unwrap();
        let origin_dir = td.path().join("origin");
        origin_with_one_commit(&origin_dir);

        let dest = td.path().join("mirror");
        ensure_updated(origin_dir.to_str().unwrap(), &dest).unwrap();
        assert!(is_cloned(&dest).unwrap());
    }

    #[test]
    fn ensure_updated_tracks_upstream_and_removes_untracked() {
        let td = tempdir().unwrap();
        let origin_dir = td.path().join("origin");
        let origin = origin_with_one_commit(&origin_dir);

        let dest = td.path().join("mirror");
        let uri = origin_dir.to_str().unwrap();
        ensure_cloned(uri, &dest).unwrap();

        // upstream moves on
        fs::write(origin_dir.join("new-file.txt"), "fresh\n").unwrap();
        let tip = commit_all(&origin, "add new file");

        // local noise: a modified tracked file, untracked file,
        // untracked directory and an ignored file
        fs::write(dest.join("README.md"), "scribbled over\n").unwrap();
        fs::write(dest.join("scratch.txt"), "untracked\n").unwrap();
        fs::create_dir_all(dest.join("scratch-dir")).unwrap();
        fs::write(dest.join("scratch-dir").join("inner.txt"), "untracked\n").unwrap();
        fs::write(dest.join("build.log"), "ignored\n").unwrap();

        ensure_updated(uri, &dest).unwrap();

        let mirror = Repository::open(&dest).unwrap();
        assert_eq!(mirror.head().unwrap().target().unwrap(), tip);
        assert_eq!(
            fs::read_to_string(dest.join("README.md")).unwrap(),
            "# origin\n"
        );
        assert!(dest.join("new-file.txt").is_file());
        assert!(!dest.join("scratch.txt").exists());
        assert!(!dest.join("scratch-dir").exists());
        assert!(!dest.join("build.log").exists());
    }

    #[test]
    fn ensure_updated_fails_without_upstream() {
        let td = tempdir().unwrap();
        let origin_dir = td.path().join("origin");
        origin_with_one_commit(&origin_dir);

        let dest = td.path().join("mirror");
        let uri = origin_dir.to_str().unwrap();
        ensure_cloned(uri, &dest).unwrap();

        let repo = Repository::open(&dest).unwrap();
        let name = repo.head().unwrap().shorthand().unwrap().to_string();
        let mut branch = repo.find_branch(&name, BranchType::Local).unwrap();
        branch.set_upstream(None).unwrap();

        let err = ensure_updated(uri, &dest).unwrap_err();
        assert!(format!("{err:#}").contains("upstream"));
    }

    #[test]
    fn observer_sees_steps_in_order() {
        struct Recorder(Mutex<Vec<String>>);
        impl SyncObserver for Recorder {
            fn on_event(&self, event: SyncEvent<'_>) {
                if let SyncEvent::Started { step, .. } = event {
                    self.0.lock().unwrap().push(step.to_string());
                }
            }
        }

        let td = tempdir().unwrap();
        let origin_dir = td.path().join("origin");
        origin_with_one_commit(&origin_dir);

        let dest = td.path().join("mirror");
        let recorder = Recorder(Mutex::new(Vec::new()));
        let opts = SyncOptions {
            observer: &recorder,
            cancel: None,
        };
        ensure_updated_with(origin_dir.to_str().unwrap(), &dest, &opts).unwrap();

        assert_eq!(
            *recorder.0.lock().unwrap(),
            ["clone", "fetch", "reset", "clean"]
        );
    }

    #[test]
    fn remote_url_returns_configured_origin() {
        let td = tempdir().unwrap();
        let origin_dir = td.path().join("origin");
        origin_with_one_commit(&origin_dir);

        let dest = td.path().join("mirror");
        let uri = origin_dir.to_str().unwrap();
        ensure_cloned(uri, &dest).unwrap();

        assert_eq!(remote_url(&dest).unwrap(), uri);
    }

    #[test]
    fn remote_url_errors_without_origin() {
        let td = tempdir().unwrap();
        let dir = td.path().join("lone");
        Repository::init(&dir).unwrap();

        let err = remote_url(&dir).unwrap_err();
        assert!(err.to_string().contains("origin"));
    }

    #[test]
    fn remote_url_errors_outside_a_repository() {
        let td = tempdir().unwrap();
        assert!(remote_url(td.path()).is_err());
    }
}

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;

use crate::git::{is_cloned, remote_url};
use crate::paths::paths;
use crate::sync::jobs::build_jobs;

/// Top-level configuration structure loaded from `config.toml`.
///
/// The file defines which repositories grm keeps mirrored. Currently,
/// only the `mirrors` section is supported.
///
/// Example TOML:
/// ```toml
/// [[mirrors]]
/// uri  = "https://github.com/zsh-users/zsh-autosuggestions.git"
///
/// [[mirrors]]
/// uri  = "git@example.com:team/tools.git"
/// name = "tools"
/// ```
#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub mirrors: Vec<Mirror>,
}

/// Representation of a single `[[mirrors]]` entry in `config.toml`.
///
/// `uri` is passed to git untouched (https, ssh spec, or plain path —
/// validation is git's business). `name` optionally overrides the
/// directory name the mirror is cloned into.
#[derive(Debug, Deserialize, Clone)]
pub struct Mirror {
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Load and parse `config.toml` into a [`Config`] structure.
///
/// # Errors
/// - Returns an error if `config.toml` cannot be read.
/// - Returns an error if parsing the TOML fails.
///
/// # Notes
/// - This always resolves the path using [`paths()`].
/// - If the file is missing, the error message includes the resolved path.
pub fn load_config() -> Result<Config> {
    let p = paths()?;
    let txt = fs::read_to_string(&p.config)
        .with_context(|| format!("config not found: {}", p.config.display()))?;
    let cfg: Config = toml::from_str(&txt).context("failed to parse config.toml")?;
    Ok(cfg)
}

/// CLI command: print each configured mirror with its on-disk state.
///
/// Each line shows the manifest uri, the destination directory, and
/// either the origin URL stored in the clone or `not cloned`. A stored
/// URL that differs from the manifest uri is how remote drift becomes
/// visible: sync never re-points an existing clone.
///
/// Example output:
/// ```text
/// - https://github.com/zsh-users/zsh-autosuggestions.git -> zsh-users__zsh-autosuggestions [https://github.com/zsh-users/zsh-autosuggestions.git]
/// - git@example.com:team/tools.git -> tools [not cloned]
/// ```
///
/// # Errors
/// Returns an error if the config cannot be loaded, or if a mirror
/// directory exists but its origin URL cannot be read.
pub fn cmd_list() -> Result<()> {
    let cfg = load_config()?;
    let p = paths()?;
    let (jobs, _) = build_jobs(&cfg, &p);

    for job in &jobs {
        let state = if is_cloned(&job.dest)? {
            remote_url(&job.dest)?
        } else {
            "not cloned".to_string()
        };
        let dir = job
            .dest
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| job.dest.display().to_string());
        println!("- {} -> {} [{}]", job.uri, dir, state);
    }
    Ok(())
}

use anyhow::Result;
use std::{env, path::PathBuf};

#[derive(Clone)]
pub struct Paths {
    pub mirrors: PathBuf,
    pub config: PathBuf,
}

/// Root directory for grm state: `$XDG_CONFIG_HOME/.grm`, falling back
/// to `$HOME/.config/.grm`.
pub fn grm_home() -> Result<PathBuf> {
    let xdg = env::var_os("XDG_CONFIG_HOME");
    let base = xdg
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(env::var_os("HOME").unwrap_or_default()).join(".config"));
    Ok(base.join(".grm"))
}

pub fn paths() -> Result<Paths> {
    let home = grm_home()?;
    Ok(Paths {
        mirrors: home.join("mirrors"),
        config: home.join("config.toml"),
    })
}

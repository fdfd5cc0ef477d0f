//! # grm
//!
//! **grm** keeps local clones in sync with their remotes.
//!
//! Features:
//! - Manage mirrors defined in `$(grm home)/config.toml`
//! - `grm sync` clones or updates every configured mirror
//! - `grm list` shows configured mirrors with their clone state
//! - `grm url` prints the origin URL of a working copy
//! - `grm home` prints the grm home directory
//!
//! This CLI is built with [clap](https://docs.rs/clap).

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use grm::{cmd_list, cmd_sync, grm_home, remote_url};

/// Command-line interface definition.
///
/// Parsed using `clap` derive macros.
#[derive(Parser, Debug)]
#[command(
    name = "grm",
    version,
    about = "grm - keep local clones in sync with their remotes",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    cmd: Option<Cmd>,
}

/// Available subcommands.
///
/// Each variant corresponds to a subcommand of `grm`.
#[derive(Subcommand, Debug)]
enum Cmd {
    /// Clone/update mirrors defined in config.toml
    Sync,
    /// List configured mirrors with their clone state
    List,
    /// Print the origin URL of a working copy
    Url {
        /// Path to an existing working copy
        path: PathBuf,
    },
    /// Print the grm home directory
    Home,
}

/// CLI entry point.
///
/// Parses arguments with `clap` and executes the selected subcommand.
fn main() -> Result<()> {
    let cli = Cli::parse();
    let cmd = cli.cmd.unwrap();

    match cmd {
        Cmd::Sync => cmd_sync(),
        Cmd::List => cmd_list(),
        Cmd::Url { path } => {
            println!("{}", remote_url(&path)?);
            Ok(())
        }
        Cmd::Home => {
            println!("{}", grm_home()?.display());
            Ok(())
        }
    }
}

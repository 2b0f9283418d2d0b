//! Implementation of deckhand subcommands.
//!
//! `mod.rs` serves as a thin dispatcher and re-export hub; command logic
//! lives in dedicated modules (`phases`, `report`, `run`).

use std::path::{Path, PathBuf};

use crate::cli::{Cli, Commands};
use crate::config::ScanConfig;
use crate::error::{DeckError, Result};
use crate::logging::Logger;

pub(crate) mod phases;
pub(crate) mod report;
pub(crate) mod run;

pub use phases::{clear, link, resolve, scan};
pub use report::{StoreReport, report};
pub use run::{Run, RunBuilder, RunSummary};


/// Execute commands based on the parsed CLI arguments.
pub fn execute(cli: &Cli) -> Result<()> {
    execute_with_dir(cli, None)
}

/// Execute commands with an explicit working directory.
///
/// Relative `--root` and `--store-path` values are resolved against
/// `working_dir` (the process's current directory when `None`).
pub fn execute_with_dir(cli: &Cli, working_dir: Option<&Path>) -> Result<()> {
    let opts = cli.global_opts();
    let log = Logger::new(opts.verbose(), opts.quiet());

    let current_dir = if let Some(dir) = working_dir {
        dir.to_path_buf()
    } else {
        std::env::current_dir().map_err(|source| DeckError::Io {
            path: PathBuf::from("."),
            source,
        })?
    };

    let store_path = opts.store_path().map(|p| current_dir.join(p));
    let config = ScanConfig::from_root(current_dir.join(opts.root()), store_path.as_deref())?;

    match cli.command() {
        Commands::Scan => scan(&config, &log).map(drop),
        Commands::Resolve => resolve(&config, &log).map(drop),
        Commands::Link { dry_run } => link(&config, &log, *dry_run).map(drop),
        Commands::Run { dry_run } => Run::builder()
            .config(&config)
            .log(&log)
            .dry_run(*dry_run)
            .build()?
            .run()
            .map(drop),
        Commands::Report => report(&config, &log).map(drop),
        Commands::Clear => clear(&config, &log),
    }
}

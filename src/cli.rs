//! Command-line interface definitions for deckhand.
//!
//! This module defines the CLI structure using clap, including all subcommands
//! and their arguments. The main entry point is the [`Cli`] struct.
//!
//! # Example
//!
//! ```no_run
//! use clap::Parser;
//! use deckhand::cli::{Cli, Commands};
//!
//! let cli = Cli::parse();
//!
//! match cli.command() {
//!     Commands::Run { dry_run } => println!("Full pipeline, dry run: {dry_run}"),
//!     _ => {}
//! }
//! ```

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::config::ScanConfig;
use crate::error::{DeckError, Result};


/// Main command-line interface for deckhand.
///
/// Global options select the content tree and the store; the subcommand
/// selects which phase (or all of them) to run.
#[derive(Parser)]
#[command(
    name = "deckhand",
    bin_name = "deckhand",
    author,
    version,
    about = "Replace duplicate files in a content tree with relative symlinks to one canonical copy",
    long_about = None,
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    global_opts: GlobalOpts,

    #[command(subcommand)]
    command: Commands,
}

/// Global options that apply to all deckhand commands.
#[derive(Parser)]
pub struct GlobalOpts {
    /// Root of the content tree (defaults to the current directory)
    #[arg(long, global = true, default_value = ".", env = "DECKHAND_ROOT")]
    root: PathBuf,

    /// Path to the store file (defaults to `<root>/.deckhand.store`)
    #[arg(long, global = true, env = "DECKHAND_STORE_PATH")]
    store_path: Option<PathBuf>,

    /// Enable verbose output (use multiple times for more verbosity)
    #[arg(short, long, global = true, action = clap::ArgAction::Count, env = "DECKHAND_VERBOSE")]
    verbose: u8,

    /// Silence all output except for errors
    #[arg(
        short,
        long,
        global = true,
        conflicts_with = "verbose",
        env = "DECKHAND_QUIET"
    )]
    quiet: bool,
}

impl GlobalOpts {
    /// Create a new builder for constructing `GlobalOpts` programmatically.
    pub fn builder() -> GlobalOptsBuilder {
        GlobalOptsBuilder::default()
    }

    /// Build the per-run configuration from these options.
    pub fn scan_config(&self) -> Result<ScanConfig> {
        ScanConfig::from_root(&self.root, self.store_path.as_deref())
    }

    /// Get the content tree root as given
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the store path option
    pub fn store_path(&self) -> Option<&Path> {
        self.store_path.as_deref()
    }

    /// Get the verbose level
    pub fn verbose(&self) -> u8 {
        self.verbose
    }

    /// Check if quiet mode is enabled
    pub fn quiet(&self) -> bool {
        self.quiet
    }
}

/// Builder for constructing `GlobalOpts` programmatically.
#[derive(Default)]
pub struct GlobalOptsBuilder {
    root: Option<PathBuf>,
    store_path: Option<PathBuf>,
    verbose: u8,
    quiet: bool,
}

impl GlobalOptsBuilder {
    /// Set the content tree root.
    pub fn root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.root = Some(dir.into());
        self
    }

    /// Set the store file path.
    pub fn store_path(mut self, path: Option<impl Into<PathBuf>>) -> Self {
        self.store_path = path.map(|p| p.into());
        self
    }

    /// Set the verbosity level (0 = normal, 1+ = verbose).
    pub fn verbose(mut self, level: u8) -> Self {
        self.verbose = level;
        self
    }

    /// Enable or disable quiet mode.
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Build the `GlobalOpts` instance with the configured values.
    pub fn build(self) -> GlobalOpts {
        GlobalOpts {
            root: self.root.unwrap_or_else(|| PathBuf::from(".")),
            store_path: self.store_path,
            verbose: self.verbose,
            quiet: self.quiet,
        }
    }
}

impl Cli {
    /// Get the global options
    pub fn global_opts(&self) -> &GlobalOpts {
        &self.global_opts
    }

    /// Get the command
    pub fn command(&self) -> &Commands {
        &self.command
    }

    /// Create a builder for programmatic construction
    pub fn builder() -> CliBuilder {
        CliBuilder::default()
    }
}

/// Builder for [`Cli`]
#[derive(Debug, Default)]
pub struct CliBuilder {
    root: Option<PathBuf>,
    store_path: Option<PathBuf>,
    verbose: u8,
    quiet: bool,
    command: Option<Commands>,
}

impl CliBuilder {
    /// Set the content tree root
    pub fn root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.root = Some(dir.into());
        self
    }

    /// Set the store path
    pub fn store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_path = Some(path.into());
        self
    }

    /// Set the verbose level
    pub fn verbose(mut self, level: u8) -> Self {
        self.verbose = level;
        self
    }

    /// Enable quiet mode
    pub fn quiet(mut self, enabled: bool) -> Self {
        self.quiet = enabled;
        self
    }

    /// Set the command
    pub fn command(mut self, command: Commands) -> Self {
        self.command = Some(command);
        self
    }

    /// Build the Cli instance
    pub fn build(self) -> Result<Cli> {
        let command = self.command.ok_or(DeckError::Config {
            message: "Command is required".to_string(),
        })?;

        Ok(Cli {
            global_opts: GlobalOpts::builder()
                .root(self.root.unwrap_or_else(|| PathBuf::from(".")))
                .store_path(self.store_path)
                .verbose(self.verbose)
                .quiet(self.quiet)
                .build(),
            command,
        })
    }
}

/// Available deckhand subcommands.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Commands {
    /// Scan the tree and rebuild the store
    ///
    /// Clears the store, walks the root, hashes every regular file with
    /// SHA-256 and records it. Symbolic links are skipped, so scanning an
    /// already deduplicated tree only records the canonical copies.
    Scan,

    /// Pick one canonical record per content
    ///
    /// Groups the stored records by content hash and points every member of
    /// a group at the member with the lowest id. Safe to repeat.
    Resolve,

    /// Replace duplicates with relative symlinks
    ///
    /// Every record that is not its own canonical is deleted from disk and
    /// replaced by a symlink whose target is relative to the link's directory.
    Link {
        /// Show what would be linked without touching the tree
        #[arg(long, env = "DECKHAND_DRY_RUN")]
        dry_run: bool,
    },

    /// Scan, resolve and link in one go
    Run {
        /// Scan and resolve, but only show what would be linked
        #[arg(long, env = "DECKHAND_DRY_RUN")]
        dry_run: bool,
    },

    /// Check the store and print totals
    ///
    /// Verifies that every content has exactly one canonical record and
    /// prints record, duplicate and byte counts to stdout.
    Report,

    /// Delete the store file
    Clear,
}

//! # deckhand
//!
//! Reclaims disk space in a content tree by replacing duplicate files with
//! relative symbolic links to a single canonical copy.
//!
//! ## Overview
//!
//! deckhand runs in three strictly sequential phases over a persistent
//! record store:
//!
//! 1. **Scan**: walk the tree, hash every regular file with SHA-256 and store
//!    one record per file
//! 2. **Resolve**: group records by content hash and point every member of a
//!    group at one canonical ("mother") record
//! 3. **Link**: delete every non-canonical file and put a relative symlink to
//!    its canonical copy in its place
//!
//! Links are relative to the directory that holds them, so the whole tree can
//! be moved or mounted elsewhere without breaking them.
//!
//! ## Architecture
//!
//! - [`cli`]: Command-line interface definitions using clap
//! - [`commands`]: Implementation of all deckhand subcommands
//! - [`config`]: Per-run configuration (root, root marker, store location)
//! - [`error`]: Error types and handling with thiserror + miette
//! - [`hashing`]: Streaming SHA-256 content digests
//! - [`record`]: The per-file record and its identifier
//! - [`store`]: The record store trait, an in-memory store and the on-disk
//!   rkyv snapshot store
//! - [`scanner`], [`resolver`], [`linker`]: The three phases
//! - [`paths`]: Relative link path computation
//!
//! ## Library Usage
//!
//! ```no_run
//! use deckhand::cli::{Cli, Commands};
//! use deckhand::commands;
//!
//! let cli = Cli::builder()
//!     .root("/srv/media/library")
//!     .verbose(1)
//!     .command(Commands::Run { dry_run: false })
//!     .build()?;
//!
//! commands::execute(&cli)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! The phases can also be driven directly against any [`store::MetadataStore`]:
//!
//! ```no_run
//! use deckhand::config::ScanConfig;
//! use deckhand::linker::LinkReplacer;
//! use deckhand::logging::Logger;
//! use deckhand::resolver::DuplicateResolver;
//! use deckhand::scanner::Scanner;
//! use deckhand::store::MemoryStore;
//!
//! let config = ScanConfig::from_root("/srv/media/library", None)?;
//! let log = Logger::new(1, false);
//! let mut store = MemoryStore::new();
//!
//! Scanner::new(&config, &log).scan(&mut store)?;
//! DuplicateResolver::new(&log).resolve(&mut store)?;
//! LinkReplacer::new(config.marker(), &log).replace(&store)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Error Handling
//!
//! The crate uses a combination of:
//! - `thiserror` for strongly-typed errors
//! - `miette` for rich diagnostic output in CLI
//!
//! All public functions return `Result` types with descriptive error variants.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod hashing;
pub mod linker;
pub mod logging;
pub mod paths;
pub mod record;
pub mod resolver;
pub mod scanner;
pub mod store;

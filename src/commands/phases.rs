//! Scan, resolve, link and clear command implementations.
//!
//! Each command opens the store itself so it can run on its own; [`Run`]
//! chains the `*_store` variants over a single open store instead.
//!
//! [`Run`]: crate::commands::Run

use crate::config::ScanConfig;
use crate::error::Result;
use crate::linker::{LinkReplacer, LinkSummary};
use crate::logging::Logger;
use crate::resolver::{DuplicateResolver, ResolveSummary};
use crate::scanner::{ScanSummary, Scanner};
use crate::store::{FileStore, MetadataStore};

/// Executes the scan command.
///
/// Rebuilds the store from the tree. A store file that cannot be decoded is
/// discarded, since the scan replaces its contents anyway.
pub fn scan(config: &ScanConfig, log: &Logger) -> Result<ScanSummary> {
    let mut store = FileStore::open_or_reset(config.store_path(), log)?;
    scan_store(&mut store, config, log)
}

/// Executes the resolve command.
pub fn resolve(config: &ScanConfig, log: &Logger) -> Result<ResolveSummary> {
    let mut store = FileStore::open(config.store_path())?;
    if store.is_empty() {
        log.info("Store is empty, nothing to resolve");
        return Ok(ResolveSummary::default());
    }
    resolve_store(&mut store, log)
}

/// Executes the link command.
///
/// With `dry_run` the tree is left untouched and every link that would be
/// made is printed instead.
pub fn link(config: &ScanConfig, log: &Logger, dry_run: bool) -> Result<LinkSummary> {
    let store = FileStore::open(config.store_path())?;
    if store.is_empty() {
        log.info("Store is empty, nothing to link");
        return Ok(LinkSummary::default());
    }
    link_store(&store, config, log, dry_run)
}

/// Executes the clear command, deleting the store file.
pub fn clear(config: &ScanConfig, log: &Logger) -> Result<()> {
    FileStore::destroy(config.store_path())?;
    log.info(format!(
        "🧽 Cleared store at {}",
        config.store_path().display()
    ));
    Ok(())
}

pub(crate) fn scan_store<S: MetadataStore>(
    store: &mut S,
    config: &ScanConfig,
    log: &Logger,
) -> Result<ScanSummary> {
    log.info(format!("🔍 Scanning {} ...", config.root().display()));

    let summary = Scanner::new(config, log).scan(store)?;
    store.flush()?;

    if summary.symlinks_skipped > 0 {
        log.verbose(
            1,
            format!(
                "Skipped {} symbolic link{}",
                summary.symlinks_skipped,
                if summary.symlinks_skipped == 1 { "" } else { "s" }
            ),
        );
    }
    log.info(format!(
        "Recorded {} file(s), {} bytes",
        summary.files, summary.bytes
    ));
    Ok(summary)
}

pub(crate) fn resolve_store<S: MetadataStore>(
    store: &mut S,
    log: &Logger,
) -> Result<ResolveSummary> {
    let summary = DuplicateResolver::new(log).resolve(store)?;
    store.flush()?;

    log.info(format!(
        "Found {} duplicate(s) across {} content group(s)",
        summary.duplicates, summary.duplicate_groups
    ));
    Ok(summary)
}

pub(crate) fn link_store<S: MetadataStore>(
    store: &S,
    config: &ScanConfig,
    log: &Logger,
    dry_run: bool,
) -> Result<LinkSummary> {
    let summary = LinkReplacer::new(config.marker(), log)
        .dry_run(dry_run)
        .replace(store)?;

    if dry_run {
        log.info(format!(
            "Dry run: {} file(s) would be linked, {} bytes would be reclaimed",
            summary.linked, summary.bytes_reclaimed
        ));
    } else {
        log.info(format!(
            "🔗 Linked {} file(s), reclaimed {} bytes",
            summary.linked, summary.bytes_reclaimed
        ));
    }
    Ok(summary)
}

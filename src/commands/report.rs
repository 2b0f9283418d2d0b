//! Report command: verify the store and print totals.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::config::ScanConfig;
use crate::error::{DeckError, Result};
use crate::logging::Logger;
use crate::resolver::verify;
use crate::store::{FileStore, MetadataStore};

/// Totals over the stored records, with sizes read from the live tree.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StoreReport {
    pub records: usize,
    pub unique_contents: usize,
    pub duplicates: usize,
    /// Apparent size of every recorded path, links followed.
    pub total_bytes: u64,
    /// Bytes still held by duplicates that are regular files.
    pub reclaimable_bytes: u64,
}

/// Executes the report command.
///
/// # Errors
///
/// Fails with [`DeckError::Invariant`] if the stored canonical assignments
/// are inconsistent, e.g. when the store was scanned but never resolved.
pub fn report(config: &ScanConfig, log: &Logger) -> Result<StoreReport> {
    let store = FileStore::open(config.store_path())?;
    verify(&store)?;

    let mut report = StoreReport::default();
    for record in store.find_all()? {
        let (apparent, regular) = live_size(&record.file_path)?;
        report.records += 1;
        report.total_bytes += apparent;
        if record.is_canonical() {
            report.unique_contents += 1;
        } else {
            report.duplicates += 1;
            if let Some(len) = regular {
                report.reclaimable_bytes += len;
            }
        }
    }

    if !log.quiet() {
        println!("Store:              {}", config.store_path().display());
        println!("Records:            {}", report.records);
        println!("Unique contents:    {}", report.unique_contents);
        println!("Duplicates:         {}", report.duplicates);
        println!("Total bytes:        {}", report.total_bytes);
        println!("Reclaimable bytes:  {}", report.reclaimable_bytes);
    }

    Ok(report)
}

/// Apparent size of `path` and, if it is a regular file, its own size.
///
/// A missing path counts as empty.
fn live_size(path: &Path) -> Result<(u64, Option<u64>)> {
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok((0, None)),
        Err(e) => return Err(DeckError::io(path, e)),
    };
    if meta.is_file() {
        return Ok((meta.len(), Some(meta.len())));
    }
    match fs::metadata(path) {
        Ok(target) if target.is_file() => Ok((target.len(), None)),
        Ok(_) => Ok((0, None)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok((0, None)),
        Err(e) => Err(DeckError::io(path, e)),
    }
}

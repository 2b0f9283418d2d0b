//! Build phase: walk the tree, hash every regular file, persist a record.

use walkdir::WalkDir;

use crate::config::ScanConfig;
use crate::error::{DeckError, Result};
use crate::hashing::hash_file;
use crate::logging::Logger;
use crate::record::NewRecord;
use crate::store::MetadataStore;

/// Counters reported at the end of a scan.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanSummary {
    /// Regular files hashed and recorded.
    pub files: usize,
    /// Total bytes of the recorded files.
    pub bytes: u64,
    /// Symbolic links skipped.
    pub symlinks_skipped: usize,
    /// Fifos, sockets, devices and other non-regular entries skipped.
    pub others_skipped: usize,
}

/// Walks a content tree and records every regular file.
pub struct Scanner<'a> {
    config: &'a ScanConfig,
    log: &'a Logger,
}

impl<'a> Scanner<'a> {
    pub fn new(config: &'a ScanConfig, log: &'a Logger) -> Self {
        Self { config, log }
    }

    /// Rebuilds `store` from the tree.
    ///
    /// The store is cleared first. Entries are visited in file-name order so
    /// ids, and with them the canonical picks, are stable across runs. Links
    /// are never followed and never recorded, which also keeps a second scan
    /// of an already deduplicated tree from touching the links the first run
    /// created. Each file is hashed and stored before the next one is opened.
    ///
    /// # Errors
    ///
    /// Any traversal, read or store error aborts the scan.
    pub fn scan<S: MetadataStore>(&self, store: &mut S) -> Result<ScanSummary> {
        let root = self.config.root();
        self.log
            .verbose(1, format!("Scanning {} ...", root.display()));

        store.clear()?;

        let mut summary = ScanSummary::default();
        let walker = WalkDir::new(root).follow_links(false).sort_by_file_name();
        for entry in walker {
            let entry = entry.map_err(|source| DeckError::Walk {
                path: source
                    .path()
                    .map(|p| p.to_path_buf())
                    .unwrap_or_else(|| root.to_path_buf()),
                source,
            })?;

            let file_type = entry.file_type();
            let path = entry.path();

            if file_type.is_dir() {
                continue;
            }
            if file_type.is_symlink() {
                self.log.verbose(2, format!("  skip link {}", path.display()));
                summary.symlinks_skipped += 1;
                continue;
            }
            if !file_type.is_file() {
                self.log.verbose(2, format!("  skip special {}", path.display()));
                summary.others_skipped += 1;
                continue;
            }
            if self.config.is_store_file(path) {
                continue;
            }

            let size = entry
                .metadata()
                .map_err(|source| DeckError::Walk {
                    path: path.to_path_buf(),
                    source,
                })?
                .len();
            let content_hash = hash_file(path)?;
            let record = store.create(NewRecord {
                file_path: path.to_path_buf(),
                content_hash,
            })?;

            self.log.verbose(
                2,
                format!("  {} {} ({} bytes)", record.id, path.display(), size),
            );
            summary.files += 1;
            summary.bytes += size;
        }

        self.log.verbose(
            1,
            format!(
                "Scanned {} file(s), {} bytes; skipped {} link(s)",
                summary.files, summary.bytes, summary.symlinks_skipped
            ),
        );

        Ok(summary)
    }
}

//! Link phase: replace every duplicate file with a relative symlink to its
//! canonical copy.

use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::{DeckError, Result};
use crate::hashing::hash_file;
use crate::logging::Logger;
use crate::paths::RootMarker;
use crate::record::{FileRecord, RecordId};
use crate::store::MetadataStore;

/// Counters reported at the end of a link pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LinkSummary {
    /// Canonical records left in place.
    pub canonicals: usize,
    /// Duplicates replaced (or, in a dry run, that would be replaced).
    pub linked: usize,
    /// Bytes held by the regular files that were replaced.
    pub bytes_reclaimed: u64,
}

/// Rewrites duplicate files as links, reading finalized records.
pub struct LinkReplacer<'a> {
    marker: &'a RootMarker,
    log: &'a Logger,
    dry_run: bool,
}

/// What sits at a duplicate's path right before it is replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Existing {
    Missing,
    Link,
    File(u64),
}

impl<'a> LinkReplacer<'a> {
    pub fn new(marker: &'a RootMarker, log: &'a Logger) -> Self {
        Self {
            marker,
            log,
            dry_run: false,
        }
    }

    /// Only report what would be linked.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Replaces every record whose `mother_id` is another record.
    ///
    /// Canonical records are never touched. The store is only read. Before a
    /// duplicate is removed, its canonical copy must still be a regular file
    /// with the recorded content, and the duplicate itself must still hold
    /// the recorded content. Dry runs perform the same checks.
    ///
    /// # Errors
    ///
    /// Fails on the first record whose canonical cannot be found, whose
    /// content changed since the scan, whose link path cannot be computed, or
    /// whose file cannot be replaced.
    pub fn replace<S: MetadataStore>(&self, store: &S) -> Result<LinkSummary> {
        let mut summary = LinkSummary::default();
        let mut confirmed: HashSet<RecordId> = HashSet::new();

        for record in store.find_all()? {
            if record.is_canonical() {
                summary.canonicals += 1;
                continue;
            }

            let mother = store
                .find_by_id(record.mother_id)?
                .ok_or(DeckError::RecordNotFound {
                    id: record.mother_id,
                })?;
            if !mother.is_canonical() {
                return Err(DeckError::Invariant {
                    id: record.id,
                    message: format!(
                        "mother {} points at {}; run resolve first",
                        mother.id, mother.mother_id
                    ),
                });
            }

            let relative = self
                .marker
                .relative_link(&record.file_path, &mother.file_path)?;

            if !confirmed.contains(&mother.id) {
                confirm_canonical(&mother)?;
                confirmed.insert(mother.id);
            }
            let existing = inspect_duplicate(&record)?;

            if self.dry_run {
                self.log.info(format!(
                    "Would link {} -> {}",
                    record.file_path.display(),
                    relative.display()
                ));
            } else {
                replace_with_link(&record.file_path, &relative, existing)?;
                self.log.verbose(
                    2,
                    format!(
                        "  linked {} -> {}",
                        record.file_path.display(),
                        relative.display()
                    ),
                );
            }
            if let Existing::File(len) = existing {
                summary.bytes_reclaimed += len;
            }
            summary.linked += 1;
        }

        self.log.verbose(
            1,
            format!(
                "{} {} duplicate(s), {} bytes",
                if self.dry_run { "Would link" } else { "Linked" },
                summary.linked,
                summary.bytes_reclaimed
            ),
        );

        Ok(summary)
    }
}

/// Checks that the canonical copy is still a regular file with the recorded
/// content.
fn confirm_canonical(mother: &FileRecord) -> Result<()> {
    let path = &mother.file_path;
    let changed = |message: &str| DeckError::ContentChanged {
        path: path.clone(),
        message: message.to_string(),
    };

    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_file() => {}
        Ok(_) => return Err(changed("the canonical copy is no longer a regular file")),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(changed("the canonical copy is missing"));
        }
        Err(e) => return Err(DeckError::io(path, e)),
    }

    if hash_file(path)? != mother.content_hash {
        return Err(changed("the canonical copy now has different content"));
    }
    Ok(())
}

/// Looks at the duplicate's path, verifying a regular file's content.
fn inspect_duplicate(record: &FileRecord) -> Result<Existing> {
    let path = &record.file_path;
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Existing::Missing),
        Err(e) => return Err(DeckError::io(path, e)),
    };

    if meta.file_type().is_symlink() {
        return Ok(Existing::Link);
    }
    if !meta.is_file() {
        return Err(DeckError::InvalidFileType {
            path: path.clone(),
            message: "no longer a regular file where a duplicate was scanned".to_string(),
        });
    }
    if hash_file(path)? != record.content_hash {
        return Err(DeckError::ContentChanged {
            path: path.clone(),
            message: "the duplicate was modified and is left in place".to_string(),
        });
    }
    Ok(Existing::File(meta.len()))
}

/// Removes whatever sits at `path` and puts a symlink to `relative` there.
fn replace_with_link(path: &Path, relative: &Path, existing: Existing) -> Result<()> {
    if existing != Existing::Missing {
        match fs::remove_file(path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(DeckError::io(path, e)),
        }
    }
    create_symlink(relative, path).map_err(|e| DeckError::io(path, e))
}

#[cfg(unix)]
fn create_symlink(original: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(original, link)
}

#[cfg(windows)]
fn create_symlink(original: &Path, link: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_file(original, link)
}

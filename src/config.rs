//! Per-run configuration.
//!
//! A [`ScanConfig`] is built once from the scan root and handed to each phase
//! explicitly, so several independent trees can be processed in one process.

use std::path::{Component, Path, PathBuf};

use crate::error::{DeckError, Result};
use crate::paths::RootMarker;
use crate::store::temp_path;

/// File name of the store when no explicit store path is given.
pub const DEFAULT_STORE_FILE: &str = ".deckhand.store";

/// Everything a scan needs to know about its tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    root: PathBuf,
    marker: RootMarker,
    store_path: PathBuf,
}

impl ScanConfig {
    /// Builds the configuration for the tree at `root`.
    ///
    /// `root` is made absolute and cleaned of `.`/`..` segments without
    /// touching the filesystem. When `store_path` is `None` the store lives at
    /// `<root>/.deckhand.store`.
    ///
    /// # Errors
    ///
    /// Returns [`DeckError::Config`] if the root has no final name (e.g. `/`).
    pub fn from_root(root: impl AsRef<Path>, store_path: Option<&Path>) -> Result<Self> {
        let root = normalize_path(root);
        if root.file_name().is_none() {
            return Err(DeckError::Config {
                message: format!(
                    "Scan root '{}' has no directory name to anchor links on",
                    root.display()
                ),
            });
        }

        let marker = RootMarker::from_root(&root)?;
        let store_path = store_path
            .map(normalize_path)
            .unwrap_or_else(|| root.join(DEFAULT_STORE_FILE));

        Ok(Self {
            root,
            marker,
            store_path,
        })
    }

    /// Absolute scan root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Root marker used for link paths.
    pub fn marker(&self) -> &RootMarker {
        &self.marker
    }

    /// Location of the store file.
    pub fn store_path(&self) -> &Path {
        &self.store_path
    }

    /// Returns `true` for the store file and its temporary sibling, which the
    /// scanner must never record.
    pub fn is_store_file(&self, path: &Path) -> bool {
        path == self.store_path || path == temp_path(&self.store_path)
    }
}

/// Normalize a path to be absolute and clean, without requiring it to exist.
///
/// This function:
/// - Converts relative paths to absolute using the current directory
/// - Removes `.` and `..` components where possible
/// - Does NOT resolve symlinks
/// - Does NOT require the path to exist
pub(crate) fn normalize_path(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();

    let absolute = if path.is_relative() {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    } else {
        path.to_path_buf()
    };

    let mut components = Vec::new();
    for component in absolute.components() {
        match component {
            Component::ParentDir => {
                if let Some(last) = components.last()
                    && matches!(last, Component::Normal(_))
                {
                    components.pop();
                    continue;
                }
                // `..` at the root stays at the root.
                if matches!(components.last(), Some(Component::RootDir)) {
                    continue;
                }
                components.push(component);
            }
            Component::CurDir => continue,
            _ => components.push(component),
        }
    }

    components.into_iter().collect()
}

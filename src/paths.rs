//! Relative link paths between files of one content tree.
//!
//! Every path handled here is absolute and lies under the scan root. The
//! root is located by its [`RootMarker`]: the root directory's name *and* its
//! segment index. Matching by name alone would let a deeper directory that
//! happens to share the root's name cut a path short.

use std::ffi::{OsStr, OsString};
use std::path::{Component, Path, PathBuf};

use crate::error::{DeckError, Result};

/// Name and depth of the scan root within absolute paths.
///
/// `depth` counts only normal segments, so for the root `/a/ROOT` the marker
/// is `ROOT` at depth 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootMarker {
    name: OsString,
    depth: usize,
}

impl RootMarker {
    /// Derives the marker from an absolute, normalized root directory path.
    pub fn from_root(root: &Path) -> Result<Self> {
        let segs = segments(root)?;
        let name = segs.last().ok_or_else(|| DeckError::RootMarker {
            path: root.to_path_buf(),
            message: "the filesystem root cannot be a scan root".to_string(),
        })?;
        Ok(Self {
            name: name.to_os_string(),
            depth: segs.len() - 1,
        })
    }

    /// The root directory's base name.
    pub fn name(&self) -> &OsStr {
        &self.name
    }

    /// Index of the root's name among the normal segments of a path.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Computes the shortest path from `link_path`'s directory to
    /// `target_path`.
    ///
    /// The result consists of `..` segments followed by directory names and
    /// ends with the target's file name. It is never absolute and does not
    /// depend on where the tree is mounted.
    ///
    /// # Errors
    ///
    /// Returns [`DeckError::RootMarker`] if either path does not carry the
    /// root marker at the expected depth, if the two paths disagree above the
    /// root, or if either path does not name a file below the root.
    pub fn relative_link(&self, link_path: &Path, target_path: &Path) -> Result<PathBuf> {
        let (link_dirs, target_dirs, file_name) = self.split_pair(link_path, target_path)?;

        let shared = link_dirs
            .iter()
            .zip(target_dirs.iter())
            .take_while(|(a, b)| a == b)
            .count();

        Ok(build(link_dirs.len() - shared, &target_dirs[shared..], file_name))
    }

    /// Computes the path from `link_path`'s directory to `target_path` that
    /// always climbs to the root before descending.
    ///
    /// Resolves to the same file as [`RootMarker::relative_link`]; it only
    /// differs when the two files share directories below the root.
    pub fn relative_link_from_root(&self, link_path: &Path, target_path: &Path) -> Result<PathBuf> {
        let (link_dirs, target_dirs, file_name) = self.split_pair(link_path, target_path)?;
        Ok(build(link_dirs.len(), &target_dirs, file_name))
    }

    /// Returns the directories below the root for both paths plus the
    /// target's file name.
    fn split_pair<'a>(
        &self,
        link_path: &'a Path,
        target_path: &'a Path,
    ) -> Result<(Vec<&'a OsStr>, Vec<&'a OsStr>, &'a OsStr)> {
        let link = segments(link_path)?;
        let target = segments(target_path)?;
        self.check(link_path, &link)?;
        self.check(target_path, &target)?;

        if link[..self.depth] != target[..self.depth] {
            return Err(DeckError::RootMarker {
                path: target_path.to_path_buf(),
                message: format!(
                    "not under the same root as '{}'",
                    link_path.display()
                ),
            });
        }

        let link_dirs = link[self.depth + 1..link.len() - 1].to_vec();
        let target_dirs = target[self.depth + 1..target.len() - 1].to_vec();
        let file_name = target[target.len() - 1];

        Ok((link_dirs, target_dirs, file_name))
    }

    fn check(&self, path: &Path, segs: &[&OsStr]) -> Result<()> {
        match segs.get(self.depth) {
            Some(seg) if *seg == self.name.as_os_str() => {}
            _ => {
                return Err(DeckError::RootMarker {
                    path: path.to_path_buf(),
                    message: format!(
                        "expected '{}' at segment {}",
                        self.name.to_string_lossy(),
                        self.depth
                    ),
                });
            }
        }

        if segs.len() <= self.depth + 1 {
            return Err(DeckError::RootMarker {
                path: path.to_path_buf(),
                message: "does not name a file below the root".to_string(),
            });
        }

        Ok(())
    }
}

fn build(up: usize, down: &[&OsStr], file_name: &OsStr) -> PathBuf {
    let mut rel = PathBuf::new();
    for _ in 0..up {
        rel.push("..");
    }
    for dir in down {
        rel.push(dir);
    }
    rel.push(file_name);
    rel
}

/// Splits an absolute path into its normal segments.
///
/// Root and prefix components are dropped. `.` and `..` are rejected: paths
/// reaching this point have already been normalized.
fn segments(path: &Path) -> Result<Vec<&OsStr>> {
    if !path.is_absolute() {
        return Err(DeckError::RootMarker {
            path: path.to_path_buf(),
            message: "path is not absolute".to_string(),
        });
    }

    let mut segs = Vec::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => {}
            Component::Normal(seg) => segs.push(seg),
            Component::CurDir | Component::ParentDir => {
                return Err(DeckError::RootMarker {
                    path: path.to_path_buf(),
                    message: "path is not normalized".to_string(),
                });
            }
        }
    }
    Ok(segs)
}

use std::fs;
use std::path::{Path, PathBuf};

use assert_fs::TempDir;
use assert_fs::fixture::ChildPath;
use assert_fs::prelude::*;
use deckhand::cli::{Cli, Commands};
use deckhand::commands::execute_with_dir;
use deckhand::error::Result;

/// Name of the scan root inside every test workspace.
pub const ROOT: &str = "ROOT";

/// A temporary directory holding a content tree at `ROOT/`.
pub struct ContentTree {
    dir: TempDir,
}

impl ContentTree {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        dir.child(ROOT).create_dir_all().unwrap();
        Self { dir }
    }

    /// Builds a tree from `(relative path, content)` pairs.
    pub fn with_files(files: &[(&str, &str)]) -> Self {
        let tree = Self::new();
        for (rel, content) in files {
            tree.write(rel, content);
        }
        tree
    }

    pub fn write(&self, rel: &str, content: &str) {
        self.file(rel).write_str(content).unwrap();
    }

    /// Path under the scan root.
    pub fn file(&self, rel: &str) -> ChildPath {
        self.dir.child(ROOT).child(rel)
    }

    /// Directory containing the scan root.
    pub fn workspace(&self) -> &Path {
        self.dir.path()
    }

    pub fn root(&self) -> PathBuf {
        self.dir.path().join(ROOT)
    }

    pub fn default_store(&self) -> PathBuf {
        self.root().join(".deckhand.store")
    }
}

/// Runs `command` against the tree with the default store.
pub fn execute(tree: &ContentTree, command: Commands) -> Result<()> {
    execute_with_store(tree, command, None)
}

/// Runs `command` against the tree; `store` is relative to the workspace.
pub fn execute_with_store(tree: &ContentTree, command: Commands, store: Option<&str>) -> Result<()> {
    let mut builder = Cli::builder().root(ROOT).quiet(true).command(command);
    if let Some(store) = store {
        builder = builder.store_path(store);
    }
    let cli = builder.build()?;
    execute_with_dir(&cli, Some(tree.workspace()))
}

pub fn is_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false)
}

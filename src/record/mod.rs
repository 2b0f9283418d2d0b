use std::fmt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use rkyv::{Archive, Deserialize, Serialize};

use crate::error::{DeckError, Result};


/// Opaque identifier of a stored [`FileRecord`].
///
/// Ids are handed out by the store when a record is created and are never
/// reused within one store file.
#[derive(
    Archive, Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub struct RecordId(pub u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What the scanner hands to the store; the store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecord {
    /// Absolute path of the scanned file.
    pub file_path: PathBuf,
    /// Hex-encoded SHA-256 digest of the file's contents.
    pub content_hash: String,
}

/// One scanned regular file.
///
/// Size and modification time are not stored: they are read from the
/// filesystem each time they are asked for.
#[derive(Debug, Clone, PartialEq)]
pub struct FileRecord {
    /// Store-assigned identifier.
    pub id: RecordId,

    /// Absolute path of the file at scan time. Need not be UTF-8.
    pub file_path: PathBuf,

    /// Base name of the file, lossily converted for display.
    pub title: String,

    /// Hex-encoded SHA-256 digest of the file's contents, computed once when
    /// the record was created.
    pub content_hash: String,

    /// Id of the canonical record of this content. Equal to `id` when this
    /// record is itself the canonical copy.
    pub mother_id: RecordId,
}

impl FileRecord {
    /// Builds the stored form of `new` under `id`.
    ///
    /// A fresh record is its own canonical until a resolution pass says
    /// otherwise.
    pub fn from_new(id: RecordId, new: NewRecord) -> Result<Self> {
        let title = new
            .file_path
            .file_name()
            .ok_or_else(|| DeckError::Config {
                message: format!(
                    "'{}' has no file name and cannot be stored",
                    new.file_path.display()
                ),
            })?
            .to_string_lossy()
            .into_owned();

        Ok(Self {
            id,
            file_path: new.file_path,
            title,
            content_hash: new.content_hash,
            mother_id: id,
        })
    }

    /// Returns `true` when this record is the canonical copy of its content.
    pub fn is_canonical(&self) -> bool {
        self.id == self.mother_id
    }

    /// Path of the file this record describes.
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Current size of the file, following links.
    pub fn size(&self) -> Result<u64> {
        std::fs::metadata(&self.file_path)
            .map(|m| m.len())
            .map_err(|e| DeckError::io(&self.file_path, e))
    }

    /// Current modification time of the file, following links.
    pub fn last_modified(&self) -> Result<SystemTime> {
        std::fs::metadata(&self.file_path)
            .and_then(|m| m.modified())
            .map_err(|e| DeckError::io(&self.file_path, e))
    }
}

use std::ffi::{OsStr, OsString};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use memmap2::Mmap;
use rkyv::{Archive, Deserialize, Serialize};

use super::{MemoryStore, MetadataStore};
use crate::error::{DeckError, Result};
use crate::logging::Logger;
use crate::record::{FileRecord, NewRecord, RecordId};

/// Current version of the store file format.
///
/// The store refuses to load a file written with a higher version.
pub const STORE_VERSION: u32 = 1;

/// On-disk layout of the store.
#[derive(Archive, Deserialize, Serialize, Debug, Clone)]
pub struct StoreSnapshot {
    /// Format version for forward compatibility.
    pub version: u32,
    /// Next id the store will hand out.
    pub next_id: u64,
    /// Every stored record, in creation order.
    pub records: Vec<StoredRecord>,
}

/// On-disk form of a [`FileRecord`].
///
/// The path is kept as raw OS bytes so file names that are not UTF-8
/// survive a round trip.
#[derive(Archive, Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub id: RecordId,
    pub path: Vec<u8>,
    pub title: String,
    pub content_hash: String,
    pub mother_id: RecordId,
}

impl From<&FileRecord> for StoredRecord {
    fn from(record: &FileRecord) -> Self {
        Self {
            id: record.id,
            path: os_to_bytes(record.file_path.as_os_str()),
            title: record.title.clone(),
            content_hash: record.content_hash.clone(),
            mother_id: record.mother_id,
        }
    }
}

impl From<StoredRecord> for FileRecord {
    fn from(stored: StoredRecord) -> Self {
        Self {
            id: stored.id,
            file_path: PathBuf::from(os_from_bytes(stored.path)),
            title: stored.title,
            content_hash: stored.content_hash,
            mother_id: stored.mother_id,
        }
    }
}

#[cfg(unix)]
fn os_to_bytes(s: &OsStr) -> Vec<u8> {
    use std::os::unix::ffi::OsStrExt;
    s.as_bytes().to_vec()
}

#[cfg(unix)]
fn os_from_bytes(bytes: Vec<u8>) -> OsString {
    use std::os::unix::ffi::OsStringExt;
    OsString::from_vec(bytes)
}

// UTF-16 code units, little endian.
#[cfg(windows)]
fn os_to_bytes(s: &OsStr) -> Vec<u8> {
    use std::os::windows::ffi::OsStrExt;
    s.encode_wide().flat_map(u16::to_le_bytes).collect()
}

#[cfg(windows)]
fn os_from_bytes(bytes: Vec<u8>) -> OsString {
    use std::os::windows::ffi::OsStringExt;
    let wide: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    OsString::from_wide(&wide)
}

/// Record store backed by a single snapshot file.
///
/// Mutations are applied in memory and written out by
/// [`MetadataStore::flush`], which replaces the file atomically so a crash
/// never leaves a half-written store behind.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    records: MemoryStore,
    dirty: bool,
}

impl FileStore {
    /// Opens the store at `path`.
    ///
    /// A missing or empty file is an empty store.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file exists but cannot be read
    /// - The file is not a valid store snapshot
    /// - The file was written by a newer store version
    pub fn open(path: &Path) -> Result<Self> {
        let snapshot = load_snapshot(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            records: MemoryStore::from_parts(
                snapshot.next_id,
                snapshot.records.into_iter().map(FileRecord::from).collect(),
            ),
            dirty: false,
        })
    }

    /// Opens the store at `path`, discarding it if it cannot be decoded.
    ///
    /// Used by the scan phase, which clears the store anyway.
    pub fn open_or_reset(path: &Path, log: &Logger) -> Result<Self> {
        match Self::open(path) {
            Ok(store) => Ok(store),
            Err(DeckError::Deserialization { .. }) => {
                log.warn(format!(
                    "Store at {} is unreadable, starting from an empty store",
                    path.display()
                ));
                if let Err(remove_err) = fs::remove_file(path) {
                    log.warn(format!("Could not remove old store file: {remove_err}"));
                }
                Ok(Self {
                    path: path.to_path_buf(),
                    records: MemoryStore::new(),
                    dirty: true,
                })
            }
            Err(other) => Err(other),
        }
    }

    /// Location of the store file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` when no records are stored.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Removes the store file. Succeeds if it does not exist.
    pub fn destroy(path: &Path) -> Result<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DeckError::io(path, e)),
        }
    }
}

impl MetadataStore for FileStore {
    fn clear(&mut self) -> Result<()> {
        self.dirty = true;
        self.records.clear()
    }

    fn create(&mut self, record: NewRecord) -> Result<FileRecord> {
        let created = self.records.create(record)?;
        self.dirty = true;
        Ok(created)
    }

    fn find_all(&self) -> Result<Vec<FileRecord>> {
        self.records.find_all()
    }

    fn find_by_id(&self, id: RecordId) -> Result<Option<FileRecord>> {
        self.records.find_by_id(id)
    }

    fn find_by_hash(&self, hash: &str) -> Result<Vec<FileRecord>> {
        self.records.find_by_hash(hash)
    }

    fn update_mother(&mut self, id: RecordId, mother_id: RecordId) -> Result<()> {
        self.records.update_mother(id, mother_id)?;
        self.dirty = true;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if !self.dirty && self.path.exists() {
            return Ok(());
        }
        let (next_id, records) = self.records.to_parts();
        let snapshot = StoreSnapshot {
            version: STORE_VERSION,
            next_id,
            records: records.iter().map(StoredRecord::from).collect(),
        };
        save_snapshot(&snapshot, &self.path)?;
        self.dirty = false;
        Ok(())
    }
}

/// Loads a snapshot through a memory map.
fn load_snapshot(path: &Path) -> Result<StoreSnapshot> {
    let empty = StoreSnapshot {
        version: STORE_VERSION,
        next_id: 1,
        records: Vec::new(),
    };

    if !path.exists() {
        return Ok(empty);
    }

    let file = File::open(path).map_err(|e| DeckError::io(path, e))?;
    let len = file.metadata().map_err(|e| DeckError::io(path, e))?.len();
    if len == 0 {
        return Ok(empty);
    }

    // SAFETY: the map is read-only and dropped before this function returns;
    // deckhand never writes the store file in place.
    let mmap = unsafe { Mmap::map(&file) }.map_err(|e| DeckError::io(path, e))?;

    let snapshot = rkyv::from_bytes::<StoreSnapshot, rkyv::rancor::BoxedError>(&mmap[..])
        .map_err(|source| DeckError::Deserialization {
            path: path.to_path_buf(),
            source,
        })?;

    if snapshot.version > STORE_VERSION {
        return Err(DeckError::Config {
            message: format!(
                "Store version {} is newer than supported version {}. Please update deckhand.",
                snapshot.version, STORE_VERSION
            ),
        });
    }

    Ok(snapshot)
}

/// Sibling of `path` used while writing: the full file name plus `.tmp`.
pub(crate) fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsStr::to_os_string).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Writes a snapshot to `<path>.tmp`, syncs it, then renames it over `path`.
fn save_snapshot(snapshot: &StoreSnapshot, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| DeckError::CreateStoreDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let bytes = rkyv::to_bytes::<rkyv::rancor::BoxedError>(snapshot)
        .map_err(|e| DeckError::Serialization(Box::new(e)))?;

    let temp_path = temp_path(path);
    let mut temp_file = File::create(&temp_path).map_err(|e| DeckError::io(&temp_path, e))?;
    temp_file
        .write_all(&bytes)
        .map_err(|e| DeckError::io(&temp_path, e))?;
    temp_file
        .sync_all()
        .map_err(|e| DeckError::io(&temp_path, e))?;

    fs::rename(&temp_path, path).map_err(|e| DeckError::io(path, e))?;

    Ok(())
}

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use crate::error::DeckError;
use crate::logging::Logger;
use crate::record::{NewRecord, RecordId};
use crate::store::{FileStore, MemoryStore, MetadataStore, STORE_VERSION, StoreSnapshot};

fn digest(c: char) -> String {
    c.to_string().repeat(64)
}

fn new_record(path: &str, hash: &str) -> NewRecord {
    NewRecord {
        file_path: PathBuf::from(path),
        content_hash: hash.to_string(),
    }
}

#[test]
fn test_create_assigns_fresh_ids() {
    let mut store = MemoryStore::new();
    let a = store.create(new_record("/r/a", &digest('a'))).unwrap();
    let b = store.create(new_record("/r/b", &digest('a'))).unwrap();

    assert_ne!(a.id, b.id);
    assert!(a.is_canonical());
    assert!(b.is_canonical());
    assert_eq!(store.len(), 2);
}

#[test]
fn test_create_rejects_malformed_hash() {
    let mut store = MemoryStore::new();
    let result = store.create(new_record("/r/a", "not-a-digest"));
    assert!(matches!(result, Err(DeckError::Hash { .. })));
    assert!(store.is_empty());
}

#[test]
fn test_find_by_hash_and_id() {
    let mut store = MemoryStore::new();
    let a = store.create(new_record("/r/a", &digest('a'))).unwrap();
    store.create(new_record("/r/b", &digest('b'))).unwrap();
    let c = store.create(new_record("/r/c", &digest('a'))).unwrap();

    let mut group: Vec<RecordId> = store
        .find_by_hash(&digest('a'))
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    group.sort();
    assert_eq!(group, vec![a.id, c.id]);

    assert!(store.find_by_hash(&digest('f')).unwrap().is_empty());
    assert_eq!(store.find_by_id(c.id).unwrap().unwrap().file_path, PathBuf::from("/r/c"));
    assert!(store.find_by_id(RecordId(999)).unwrap().is_none());
}

#[test]
fn test_update_mother_requires_both_records() {
    let mut store = MemoryStore::new();
    let a = store.create(new_record("/r/a", &digest('a'))).unwrap();
    let b = store.create(new_record("/r/b", &digest('a'))).unwrap();

    store.update_mother(b.id, a.id).unwrap();
    assert_eq!(store.find_by_id(b.id).unwrap().unwrap().mother_id, a.id);

    assert!(matches!(
        store.update_mother(RecordId(999), a.id),
        Err(DeckError::RecordNotFound { id }) if id == RecordId(999)
    ));
    assert!(matches!(
        store.update_mother(a.id, RecordId(998)),
        Err(DeckError::RecordNotFound { id }) if id == RecordId(998)
    ));
}

#[test]
fn test_clear_never_reuses_ids() {
    let mut store = MemoryStore::new();
    let first = store.create(new_record("/r/a", &digest('a'))).unwrap();
    store.clear().unwrap();
    assert!(store.find_all().unwrap().is_empty());
    assert!(store.find_by_hash(&digest('a')).unwrap().is_empty());

    let second = store.create(new_record("/r/a", &digest('a'))).unwrap();
    assert!(second.id > first.id);
}

#[test]
fn test_file_store_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let store_path = temp_dir.path().join("nested/deck.store");

    let mut store = FileStore::open(&store_path).unwrap();
    assert!(store.is_empty());
    let a = store.create(new_record("/r/a", &digest('a'))).unwrap();
    let b = store.create(new_record("/r/b", &digest('a'))).unwrap();
    store.update_mother(b.id, a.id).unwrap();
    store.flush().unwrap();

    assert!(store_path.exists());
    assert!(!temp_dir.path().join("nested/deck.store.tmp").exists());

    let reopened = FileStore::open(&store_path).unwrap();
    assert_eq!(reopened.len(), 2);
    assert_eq!(reopened.find_by_id(b.id).unwrap().unwrap().mother_id, a.id);
    assert_eq!(reopened.find_by_hash(&digest('a')).unwrap().len(), 2);
}

#[test]
fn test_file_store_ids_survive_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let store_path = temp_dir.path().join("deck.store");

    let mut store = FileStore::open(&store_path).unwrap();
    let a = store.create(new_record("/r/a", &digest('a'))).unwrap();
    store.clear().unwrap();
    store.flush().unwrap();

    let mut reopened = FileStore::open(&store_path).unwrap();
    assert!(reopened.is_empty());
    let b = reopened.create(new_record("/r/b", &digest('b'))).unwrap();
    assert!(b.id > a.id);
}

#[test]
fn test_file_store_empty_file_is_empty_store() {
    let temp_dir = TempDir::new().unwrap();
    let store_path = temp_dir.path().join("deck.store");
    fs::write(&store_path, b"").unwrap();

    let store = FileStore::open(&store_path).unwrap();
    assert!(store.is_empty());
}

#[test]
fn test_file_store_corrupt_file() {
    let temp_dir = TempDir::new().unwrap();
    let store_path = temp_dir.path().join("deck.store");
    fs::write(&store_path, [0xFFu8; 7]).unwrap();

    let result = FileStore::open(&store_path);
    assert!(matches!(result, Err(DeckError::Deserialization { .. })));

    let reset = FileStore::open_or_reset(&store_path, &Logger::silent()).unwrap();
    assert!(reset.is_empty());
    assert!(!store_path.exists());
}

#[test]
fn test_file_store_rejects_newer_version() {
    let temp_dir = TempDir::new().unwrap();
    let store_path = temp_dir.path().join("deck.store");

    let snapshot = StoreSnapshot {
        version: STORE_VERSION + 1,
        next_id: 1,
        records: Vec::new(),
    };
    let bytes = rkyv::to_bytes::<rkyv::rancor::BoxedError>(&snapshot).unwrap();
    fs::write(&store_path, bytes).unwrap();

    match FileStore::open(&store_path) {
        Err(DeckError::Config { message }) => {
            assert!(message.contains("newer than supported"));
        }
        other => panic!("Expected Config error, got: {other:?}"),
    }
}

#[test]
fn test_destroy_is_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    let store_path = temp_dir.path().join("deck.store");

    let mut store = FileStore::open(&store_path).unwrap();
    store.flush().unwrap();
    assert!(store_path.exists());

    FileStore::destroy(&store_path).unwrap();
    assert!(!store_path.exists());
    FileStore::destroy(&store_path).unwrap();
}

#[test]
#[cfg(unix)]
fn test_file_store_keeps_non_utf8_paths() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let temp_dir = TempDir::new().unwrap();
    let store_path = temp_dir.path().join("deck.store");
    let odd = PathBuf::from("/r").join(OsStr::from_bytes(b"caf\xe9.txt"));

    let mut store = FileStore::open(&store_path).unwrap();
    let created = store
        .create(NewRecord {
            file_path: odd.clone(),
            content_hash: digest('a'),
        })
        .unwrap();
    store.flush().unwrap();

    let reopened = FileStore::open(&store_path).unwrap();
    let record = reopened.find_by_id(created.id).unwrap().unwrap();
    assert_eq!(record.file_path, odd);
    assert_eq!(record, created);
}

#[test]
fn test_temp_path_appends_suffix() {
    let path = PathBuf::from("state").join("deck.store");
    assert_eq!(
        crate::store::temp_path(&path),
        PathBuf::from("state").join("deck.store.tmp")
    );
}

use super::*;
use crate::test_helpers::ScratchDir;

// =============================================================================
// MemoryStorage
// =============================================================================

#[test]
fn memory_get_missing_returns_none() {
    let storage = MemoryStorage::new();
    assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);
}

#[test]
fn memory_set_then_get() {
    let storage = MemoryStorage::new();
    storage.set(TOKEN_KEY, "abc").unwrap();
    assert_eq!(storage.get(TOKEN_KEY).unwrap().as_deref(), Some("abc"));
}

#[test]
fn memory_set_overwrites() {
    let storage = MemoryStorage::new();
    storage.set(TOKEN_KEY, "one").unwrap();
    storage.set(TOKEN_KEY, "two").unwrap();
    assert_eq!(storage.get(TOKEN_KEY).unwrap().as_deref(), Some("two"));
}

#[test]
fn memory_slots_are_independent() {
    let storage = MemoryStorage::new();
    storage.set(TOKEN_KEY, "tok").unwrap();
    storage.set(USER_KEY, "{}").unwrap();
    storage.remove(TOKEN_KEY).unwrap();
    assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);
    assert_eq!(storage.get(USER_KEY).unwrap().as_deref(), Some("{}"));
}

#[test]
fn memory_remove_missing_is_ok() {
    let storage = MemoryStorage::new();
    assert!(storage.remove(USER_KEY).is_ok());
}

// =============================================================================
// FileStorage
// =============================================================================

#[test]
fn file_get_before_directory_exists_returns_none() {
    let dir = ScratchDir::new("file-get-missing");
    let storage = FileStorage::new(dir.path().join("not-yet-created"));
    assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);
}

#[test]
fn file_set_creates_directory_and_persists() {
    let dir = ScratchDir::new("file-set");
    let root = dir.path().join("nested");
    let storage = FileStorage::new(&root);
    assert_eq!(storage.root(), root.as_path());
    storage.set(TOKEN_KEY, "persisted").unwrap();

    assert!(storage.root().join(TOKEN_KEY).is_file());
    assert_eq!(storage.get(TOKEN_KEY).unwrap().as_deref(), Some("persisted"));
}

#[test]
fn file_values_survive_a_new_instance() {
    let dir = ScratchDir::new("file-restart");
    FileStorage::new(dir.path()).set(USER_KEY, "{\"id\":\"1\"}").unwrap();

    let reopened = FileStorage::new(dir.path());
    assert_eq!(reopened.get(USER_KEY).unwrap().as_deref(), Some("{\"id\":\"1\"}"));
}

#[test]
fn file_set_leaves_no_temp_file() {
    let dir = ScratchDir::new("file-no-tmp");
    let storage = FileStorage::new(dir.path());
    storage.set(TOKEN_KEY, "x").unwrap();

    let names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec![TOKEN_KEY.to_owned()]);
}

#[test]
fn file_remove_deletes_and_is_idempotent() {
    let dir = ScratchDir::new("file-remove");
    let storage = FileStorage::new(dir.path());
    storage.set(TOKEN_KEY, "x").unwrap();
    storage.remove(TOKEN_KEY).unwrap();
    storage.remove(TOKEN_KEY).unwrap();
    assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);
}

#[test]
fn file_rejects_path_like_keys() {
    let dir = ScratchDir::new("file-bad-key");
    let storage = FileStorage::new(dir.path());
    assert!(matches!(storage.set("../escape", "x"), Err(StorageError::InvalidKey(_))));
    assert!(matches!(storage.get("a/b"), Err(StorageError::InvalidKey(_))));
}

// =============================================================================
// is_valid_key
// =============================================================================

#[test]
fn valid_keys() {
    assert!(is_valid_key(TOKEN_KEY));
    assert!(is_valid_key(USER_KEY));
    assert!(is_valid_key("a_b-c.d"));
}

#[test]
fn invalid_keys() {
    assert!(!is_valid_key(""));
    assert!(!is_valid_key(".hidden"));
    assert!(!is_valid_key("a/b"));
    assert!(!is_valid_key("a b"));
}

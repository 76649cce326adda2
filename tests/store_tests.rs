use issue_pilot::store::ProcessedStore;
use tempfile::tempdir;

#[test]
fn test_store_starts_empty() {
    let work_dir = tempdir().unwrap();
    let store = ProcessedStore::load(work_dir.path()).unwrap();

    assert!(store.is_empty());
    assert!(!store.contains(42));
}

#[test]
fn test_mark_persists_across_reload() {
    let work_dir = tempdir().unwrap();

    let mut store = ProcessedStore::load(work_dir.path()).unwrap();
    store.mark(42).unwrap();
    store.mark(7).unwrap();

    let reloaded = ProcessedStore::load(work_dir.path()).unwrap();
    assert_eq!(reloaded.len(), 2);
    assert!(reloaded.contains(42));
    assert!(reloaded.contains(7));
    assert!(!reloaded.contains(99));
}

#[test]
fn test_mark_is_idempotent() {
    let work_dir = tempdir().unwrap();

    let mut store = ProcessedStore::load(work_dir.path()).unwrap();
    store.mark(42).unwrap();
    store.mark(42).unwrap();

    assert_eq!(store.len(), 1);
}

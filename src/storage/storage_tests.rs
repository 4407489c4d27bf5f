use super::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Sample {
    name: String,
    count: u32,
}

#[test]
fn memory_store_set_get_remove() {
    let store = MemoryStore::new();
    assert!(store.get_item("k").is_none());
    store.set_item("k", "v1").unwrap();
    store.set_item("k", "v2").unwrap();
    assert_eq!(store.get_item("k").as_deref(), Some("v2"));
    assert_eq!(store.len(), 1);
    store.remove_item("k").unwrap();
    assert!(!store.contains("k"));
    // removing again is a no-op
    store.remove_item("k").unwrap();
    assert!(store.is_empty());
}

#[test]
fn json_helpers_roundtrip_and_detect_corruption() {
    let store = MemoryStore::new();
    let v = vec![Sample { name: "a".into(), count: 1 }, Sample { name: "b".into(), count: 2 }];
    write_json(&store, "samples", &v).unwrap();
    let back: Option<Vec<Sample>> = read_json(&store, "samples").unwrap();
    assert_eq!(back, Some(v));

    let missing: Option<Vec<Sample>> = read_json(&store, "nope").unwrap();
    assert!(missing.is_none());

    store.set_item("broken", "{not json").unwrap();
    let err = read_json::<Vec<Sample>>(&store, "broken").unwrap_err();
    match err {
        StoreError::Corrupt { key, .. } => assert_eq!(key, "broken"),
        other => panic!("expected Corrupt, got {other:?}"),
    }
}

#[test]
fn file_store_persists_across_reopen() {
    let tmp = tempfile::tempdir().unwrap();
    {
        let store = FileStore::open(tmp.path()).unwrap();
        store.set_item(USERS_KEY, "[]").unwrap();
        store.set_item(CURRENT_USER_KEY, "{\"id\":\"1\"}").unwrap();
        store.remove_item(CURRENT_USER_KEY).unwrap();
        assert!(store.snapshot_path().exists());
    }
    let reopened = FileStore::open(tmp.path()).unwrap();
    assert_eq!(reopened.get_item(USERS_KEY).as_deref(), Some("[]"));
    assert!(reopened.get_item(CURRENT_USER_KEY).is_none());
    // no temp file left behind
    assert!(!reopened.snapshot_path().with_extension("json.tmp").exists());
}

#[test]
fn file_store_rejects_corrupt_snapshot() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join("store.json"), b"garbage").unwrap();
    match FileStore::open(tmp.path()) {
        Err(StoreError::Corrupt { .. }) => {}
        Err(other) => panic!("expected Corrupt, got {other:?}"),
        Ok(_) => panic!("expected open to fail"),
    }
}

#[test]
fn file_store_honours_custom_settings() {
    let tmp = tempfile::tempdir().unwrap();
    let settings = StoreSettings { snapshot_file: "local_storage.json".into(), pretty: false };
    let store = FileStore::open_with(tmp.path(), settings.clone()).unwrap();
    store.set_item("k", "v").unwrap();
    let raw = std::fs::read_to_string(tmp.path().join("local_storage.json")).unwrap();
    assert!(!raw.contains('\n'));
    let reopened = FileStore::open_with(tmp.path(), settings).unwrap();
    assert_eq!(reopened.get_item("k").as_deref(), Some("v"));
}

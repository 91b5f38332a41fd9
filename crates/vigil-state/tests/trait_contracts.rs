//! Trait contract tests for StateStore.
//!
//! Every backend must satisfy the same behavior: whole-document replacement,
//! exact byte round-trips, and `NotFound` for documents never written.

use std::path::Path;

use serde::{Deserialize, Serialize};
use vigil_state::fakes::MemoryStateStore;
use vigil_state::{read_json, read_or_default, write_json, JsonFileStore, StateError, StateStore};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Record {
    arquivo: String,
    hash: String,
}

async fn contract_round_trip(store: &dyn StateStore) {
    let path = Path::new("state/records.json");
    let records = vec![
        Record {
            arquivo: "src/a.ts".into(),
            hash: "aa".into(),
        },
        Record {
            arquivo: "src/b.ts".into(),
            hash: "bb".into(),
        },
    ];
    write_json(store, path, &records).await.unwrap();
    let back: Vec<Record> = read_json(store, path).await.unwrap();
    assert_eq!(back, records);
}

async fn contract_replace(store: &dyn StateStore) {
    let path = Path::new("state/replace.json");
    write_json(store, path, &vec!["one", "two", "three"]).await.unwrap();
    write_json(store, path, &vec!["four"]).await.unwrap();
    let back: Vec<String> = read_json(store, path).await.unwrap();
    assert_eq!(back, vec!["four".to_string()]);
}

async fn contract_not_found(store: &dyn StateStore) {
    let err = store.read(Path::new("never/written.json")).await.unwrap_err();
    assert!(matches!(err, StateError::NotFound { .. }));
    assert!(!store.exists(Path::new("never/written.json")).await.unwrap());
}

async fn contract_forgiving_read(store: &dyn StateStore) {
    let path = Path::new("state/garbage.json");
    store.write(path, b"\x00\x01 definitely not json").await.unwrap();
    let v: Vec<Record> = read_or_default(store, path).await;
    assert!(v.is_empty());
}

#[tokio::test]
async fn memory_store_satisfies_contract() {
    let store = MemoryStateStore::new();
    contract_round_trip(&store).await;
    contract_replace(&store).await;
    contract_not_found(&store).await;
    contract_forgiving_read(&store).await;
}

#[tokio::test]
async fn file_store_satisfies_contract() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path());
    contract_round_trip(&store).await;
    contract_replace(&store).await;
    contract_not_found(&store).await;
    contract_forgiving_read(&store).await;
}

#[tokio::test]
async fn file_store_writes_pretty_json() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path());
    write_json(&store, Path::new("p.json"), &vec!["x"]).await.unwrap();
    let raw = std::fs::read_to_string(dir.path().join("p.json")).unwrap();
    assert!(raw.contains('\n'));
}

#[tokio::test]
async fn memory_store_counts_writes() {
    let store = MemoryStateStore::new();
    assert_eq!(store.write_count(), 0);
    store.write(Path::new("a"), b"1").await.unwrap();
    store.write(Path::new("a"), b"2").await.unwrap();
    assert_eq!(store.write_count(), 2);
    assert_eq!(store.snapshot().len(), 1);
}

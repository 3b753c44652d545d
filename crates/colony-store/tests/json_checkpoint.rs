//! Integration tests for the JSON checkpoint store.
//!
//! Each test works in its own file under the system temp directory.

// Integration tests use expect/unwrap extensively for clarity -- panicking
// on failure is the correct behavior in test code.
#![allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]

use std::collections::BTreeSet;
use std::path::PathBuf;

use colony_store::{JsonFileStore, RecordMap, RecordStore, StoreError};
use colony_types::{
    AgentId, AgentRecord, Lease, LeaseKind, ObjectId, Phase, TaskKind, TaskStatus,
};

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir()
        .join(format!("colony-store-{}", uuid::Uuid::now_v7()))
        .join(name)
}

fn hauler_record() -> AgentRecord {
    AgentRecord {
        task: Some(TaskKind::Store),
        target: Some(ObjectId::from_u128(31)),
        phase: Some(Phase::Acquire),
        status: TaskStatus::Executing,
        cooldown_expiry: 160,
        lease: Some(Lease {
            target: ObjectId::from_u128(31),
            kind: LeaseKind::Acquire,
            expires_at: 120,
        }),
    }
}

#[tokio::test]
async fn missing_file_loads_empty() {
    let store = JsonFileStore::new(temp_path("absent.json"));
    let records = store.load().await.expect("missing file is not an error");
    assert!(records.is_empty());
    assert!(store.load_checkpoint().await.unwrap().is_none());
}

#[tokio::test]
async fn records_survive_a_reopen() {
    let path = temp_path("records.json");
    let mut records = RecordMap::new();
    records.insert(AgentId::from_u128(1), hauler_record());
    records.insert(AgentId::from_u128(2), AgentRecord::default());

    JsonFileStore::new(&path).save(110, &records).await.unwrap();

    let reopened = JsonFileStore::new(&path);
    assert_eq!(reopened.load().await.unwrap(), records);
    let checkpoint = reopened.load_checkpoint().await.unwrap().unwrap();
    assert_eq!(checkpoint.cycle, 110);

    // No temp file is left behind.
    let mut tmp = path.clone().into_os_string();
    tmp.push(".tmp");
    assert!(!PathBuf::from(tmp).exists());
}

#[tokio::test]
async fn checkpoint_is_plain_json() {
    let path = temp_path("layout.json");
    let mut records = RecordMap::new();
    records.insert(AgentId::from_u128(1), hauler_record());
    JsonFileStore::new(&path).save(7, &records).await.unwrap();

    let raw = std::fs::read_to_string(&path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let key = AgentId::from_u128(1).to_string();
    let record = &value["records"][key.as_str()];
    assert_eq!(value["cycle"], 7);
    assert_eq!(record["task"], "store");
    assert_eq!(record["status"], "executing");
    assert_eq!(record["lease"]["kind"], "acquire");
    assert_eq!(record["lease"]["expires_at"], 120);
}

#[tokio::test]
async fn prune_rewrites_only_when_needed() {
    let path = temp_path("prune.json");
    let store = JsonFileStore::new(&path);
    let mut records = RecordMap::new();
    for id in 1..=3 {
        records.insert(AgentId::from_u128(id), hauler_record());
    }
    store.save(50, &records).await.unwrap();

    let alive: BTreeSet<AgentId> = [1, 3].into_iter().map(AgentId::from_u128).collect();
    assert_eq!(store.prune(&alive).await.unwrap(), 1);
    assert_eq!(store.prune(&alive).await.unwrap(), 0);

    let left = store.load().await.unwrap();
    assert_eq!(left.len(), 2);
    assert!(!left.contains_key(&AgentId::from_u128(2)));
    // Pruning keeps the cycle the records belong to.
    assert_eq!(store.load_checkpoint().await.unwrap().unwrap().cycle, 50);
}

#[tokio::test]
async fn corrupt_file_is_reported() {
    let path = temp_path("corrupt.json");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, b"{ not json").unwrap();

    let err = JsonFileStore::new(&path).load().await;
    assert!(matches!(err, Err(StoreError::Serialization(_))));
}

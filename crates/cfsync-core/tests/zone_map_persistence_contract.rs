//! Contract Test: Zone-Map Persistence
//!
//! Constraints verified:
//! - save(load(save(entries))) == save(entries)
//! - The file is rewritten, never appended to
//! - Torn and malformed lines are dropped on load without losing the rest
//! - The one-shot operations keep the zone map consistent with the provider
//!
//! If this test fails, the cache can grow stale lines or lose entries on restart.

mod common;

use cfsync_core::error::Error;
use cfsync_core::traits::{Method, ZoneMapStore};
use cfsync_core::zonemap::{UpsertOutcome, ZoneMapEntry};
use cfsync_core::{FileZoneMapStore, MemoryZoneMapStore};
use common::*;
use tokio_test::{assert_err, assert_ok};

fn sample_entries() -> Vec<ZoneMapEntry> {
    vec![
        ZoneMapEntry::zone("example.com", "023e105f4ecef8ad9ca31a8372d0c353"),
        ZoneMapEntry::record(
            "www.example.com",
            "023e105f4ecef8ad9ca31a8372d0c353",
            "372e67954025e0ba6aaa6d586b9e0b59",
            true,
            "203.0.113.10",
        ),
        ZoneMapEntry::record(
            "mail.example.org",
            "9a7806061c88ada191ed06f989cc3dac",
            "699d98642c564d2e855e9661899b7252",
            false,
            "",
        ),
    ]
}

#[tokio::test]
async fn save_load_save_is_stable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("zone_map.txt");

    let store = FileZoneMapStore::open(&path).await.unwrap();
    for entry in sample_entries() {
        assert_ok!(store.upsert(entry).await);
    }
    assert_ok!(store.save().await);
    let first = std::fs::read_to_string(&path).unwrap();

    let reopened = FileZoneMapStore::open(&path).await.unwrap();
    assert_eq!(reopened.len().await, 3);
    assert_ok!(reopened.save().await);
    let second = std::fs::read_to_string(&path).unwrap();

    assert_eq!(first, second);
    assert_eq!(
        reopened.find("mail.example.org").await.unwrap(),
        Some(sample_entries()[2].clone())
    );
}

#[tokio::test]
async fn repeated_updates_leave_one_line_per_domain() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("zone_map.txt");
    let store = FileZoneMapStore::open(&path).await.unwrap();

    for (i, content) in ["192.0.2.1", "192.0.2.2", "192.0.2.3"].into_iter().enumerate() {
        let entry = ZoneMapEntry::record("www.example.com", "zoneA", format!("rec{i}"), false, content);
        assert_ok!(store.upsert(entry).await);
    }
    let unchanged = ZoneMapEntry::record("www.example.com", "zoneA", "rec2", false, "192.0.2.3");
    assert_eq!(store.upsert(unchanged).await.unwrap(), UpsertOutcome::Unchanged);

    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text, "www.example.com zoneA rec2 false 192.0.2.3\n");
}

#[tokio::test]
async fn damaged_file_keeps_every_intact_line() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("zone_map.txt");
    std::fs::write(
        &path,
        "a.example.com zoneA\nbroken-line\nb.example.com zoneA recB false 192.0.2.2\nc.example.com zoneA recC tr",
    )
    .unwrap();

    let store = FileZoneMapStore::open(&path).await.unwrap();

    assert_eq!(store.len().await, 2);
    assert!(store.find("a.example.com").await.unwrap().is_some());
    assert!(store.find("b.example.com").await.unwrap().is_some());
    assert!(store.find("c.example.com").await.unwrap().is_none());
}

#[tokio::test]
async fn values_with_delimiter_are_rejected() {
    let store = MemoryZoneMapStore::new();
    let err = assert_err!(
        store
            .upsert(ZoneMapEntry::record("example.com", "zoneA", "rec1", false, "v=spf1 -all"))
            .await
    );
    assert!(matches!(err, Error::InvalidInput(_)));
    assert_eq!(store.len().await, 0);
}

#[tokio::test]
async fn list_zones_caches_zones_and_keeps_record_metadata() {
    let fake = FakeCloudflare::new()
        .with_zone("zoneA", "example.com")
        .with_zone("zoneB", "example.org");
    let apex = ZoneMapEntry::record("example.com", "zoneA", "recApex", true, "192.0.2.1");
    let store = MemoryZoneMapStore::with_entries([apex.clone()]).unwrap();
    let engine = engine_with(&fake, store.clone(), false);

    let zones = assert_ok!(engine.list_zones().await);

    assert_eq!(zones.len(), 2);
    assert_eq!(store.find("example.com").await.unwrap(), Some(apex));
    assert_eq!(
        store.find("example.org").await.unwrap(),
        Some(ZoneMapEntry::zone("example.org", "zoneB"))
    );
}

#[tokio::test]
async fn delete_record_drops_matching_cache_entry() {
    let fake = FakeCloudflare::new().with_record(
        "zoneA",
        "rec1",
        "A",
        "www.example.com",
        "192.0.2.1",
        false,
    );
    let store = MemoryZoneMapStore::with_entries([
        ZoneMapEntry::record("www.example.com", "zoneA", "rec1", false, "192.0.2.1"),
        ZoneMapEntry::zone("example.com", "zoneA"),
    ])
    .unwrap();
    let engine = engine_with(&fake, store.clone(), false);

    let dropped = assert_ok!(engine.delete_record("zoneA", "rec1").await);

    assert_eq!(dropped.map(|e| e.domain), Some("www.example.com".to_string()));
    assert!(fake.records("zoneA").is_empty());
    assert_eq!(store.render().await, "example.com zoneA\n");
}

#[tokio::test]
async fn delete_of_unknown_record_is_not_found() {
    let fake = FakeCloudflare::new();
    let engine = engine_with(&fake, MemoryZoneMapStore::new(), false);

    let err = assert_err!(engine.delete_record("zoneA", "missing").await);
    assert!(matches!(err, Error::NotFound(_)), "got {err:?}");
}

#[tokio::test]
async fn purge_cache_posts_purge_request() {
    let fake = FakeCloudflare::new();
    let engine = engine_with(&fake, MemoryZoneMapStore::new(), false);

    assert_ok!(engine.purge_cache("zoneA").await);

    let calls = fake.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].method, Method::Post);
    assert_eq!(calls[0].path, "/zones/zoneA/purge_cache");
}

#[tokio::test]
async fn dry_run_one_shot_operations_send_nothing() {
    let fake = FakeCloudflare::new()
        .with_zone("zoneA", "example.com")
        .with_record("zoneA", "rec1", "A", "www.example.com", "192.0.2.1", false);
    let store = MemoryZoneMapStore::new();
    let engine = engine_with(&fake, store.clone(), true);

    assert_ok!(engine.list_zones().await);
    assert_ok!(engine.delete_record("zoneA", "rec1").await);
    assert_ok!(engine.purge_cache("zoneA").await);

    assert_eq!(fake.mutation_count(), 0);
    assert_eq!(fake.records("zoneA").len(), 1);
    assert_eq!(store.len().await, 0);
}

#[tokio::test]
async fn display_reads_local_cache_only() {
    let fake = FakeCloudflare::new();
    let store = MemoryZoneMapStore::with_entries([ZoneMapEntry::zone("example.com", "zoneA")])
        .unwrap();
    let engine = engine_with(&fake, store, false);

    let found = assert_ok!(engine.display("example.com").await);
    assert_eq!(found.map(|e| e.zone_id), Some("zoneA".to_string()));
    assert_eq!(assert_ok!(engine.display("nope.example.com").await), None);
    assert!(fake.calls().is_empty());
}

//! Integration tests for `PgEventStore`.
//!
//! Run with `DATABASE_URL` pointing at a disposable database and
//! `cargo test -- --ignored`.

use std::collections::HashMap;
use std::sync::Arc;

use sqlx::PgPool;
use tenantdb_core::clock::Clock;
use tenantdb_core::error::DomainError;
use tenantdb_core::event::{
    AppendEventsRequest, EventDto, LoadEventsRequest, SaveSnapshotRequest, StreamKey,
};
use tenantdb_core::repository::EventStore;
use tenantdb_event_store::PgEventStore;
use tenantdb_test_support::FixedClock;

fn store(pool: PgPool) -> PgEventStore {
    PgEventStore::with_clock(pool, Arc::new(FixedClock::default_instant()))
}

fn stream(tenant_id: &str) -> StreamKey {
    StreamKey::new(tenant_id, "order", "o-1")
}

fn event(event_type: &str, n: i64) -> EventDto {
    EventDto::new(event_type, serde_json::json!({"n": n}))
}

fn append(tenant_id: &str, events: Vec<EventDto>) -> AppendEventsRequest {
    AppendEventsRequest {
        stream: stream(tenant_id),
        events,
    }
}

fn load(tenant_id: &str) -> LoadEventsRequest {
    LoadEventsRequest {
        stream: stream(tenant_id),
    }
}

// --- load_events ---

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_load_events_of_unknown_stream_is_empty(pool: PgPool) {
    let store = store(pool);

    let loaded = store.load_events(load("t1")).await.unwrap();

    assert!(loaded.is_empty());
    assert_eq!(loaded.last_sequence_number(), 0);
}

// --- append_events + load_events round-trip ---

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_append_and_load_single_event(pool: PgPool) {
    let store = store(pool);
    let mut created = event("order.created", 1);
    created.event_version = "1".to_owned();
    created
        .metadata
        .insert("source".to_owned(), "checkout".to_owned());
    let expected_id = created.event_id.clone();

    let appended = store.append_events(append("t1", vec![created])).await.unwrap();

    assert_eq!(appended.sequence_numbers, vec![1]);
    let loaded = store.load_events(load("t1")).await.unwrap();
    assert_eq!(loaded.events.len(), 1);
    let stored = &loaded.events[0];
    assert_eq!(stored.event_id, expected_id);
    assert_eq!(stored.event_type, "order.created");
    assert_eq!(stored.event_version, "1");
    assert_eq!(stored.event_data, serde_json::json!({"n": 1}));
    assert_eq!(stored.sequence_number, 1);
    assert_eq!(stored.occurred_at, FixedClock::default_instant().now());
}

// --- ordering ---

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_sequence_numbers_continue_across_appends(pool: PgPool) {
    let store = store(pool);

    store
        .append_events(append("t1", vec![event("a", 1), event("b", 2)]))
        .await
        .unwrap();
    let second = store
        .append_events(append("t1", vec![event("c", 3)]))
        .await
        .unwrap();

    assert_eq!(second.sequence_numbers, vec![3]);
    let loaded = store.load_events(load("t1")).await.unwrap();
    let types: Vec<&str> = loaded.events.iter().map(|e| e.event_type.as_str()).collect();
    assert_eq!(types, vec!["a", "b", "c"]);
    assert_eq!(loaded.last_sequence_number(), 3);
}

// --- tenant isolation ---

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_streams_are_isolated_by_tenant(pool: PgPool) {
    let store = store(pool);

    store
        .append_events(append("t1", vec![event("a", 1)]))
        .await
        .unwrap();
    let other = store
        .append_events(append("t2", vec![event("b", 1)]))
        .await
        .unwrap();

    assert_eq!(other.sequence_numbers, vec![1]);
    let loaded = store.load_events(load("t1")).await.unwrap();
    assert_eq!(loaded.events.len(), 1);
    assert_eq!(loaded.events[0].event_type, "a");
}

// --- failures ---

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_reused_event_id_is_concurrency_conflict(pool: PgPool) {
    let store = store(pool);
    let first = event("a", 1);
    let replay = first.clone();
    store.append_events(append("t1", vec![first])).await.unwrap();

    let result = store.append_events(append("t1", vec![replay])).await;

    assert!(matches!(
        result,
        Err(DomainError::ConcurrencyConflict {
            sequence_number: 2,
            ..
        })
    ));
    let loaded = store.load_events(load("t1")).await.unwrap();
    assert_eq!(loaded.events.len(), 1);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_empty_tenant_is_precondition_failure(pool: PgPool) {
    let store = store(pool);

    let result = store.append_events(append("", vec![event("a", 1)])).await;

    assert!(matches!(result, Err(DomainError::PreconditionFailed(_))));
}

// --- snapshots ---

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_load_returns_latest_snapshot_and_later_events(pool: PgPool) {
    let store = store(pool);
    store
        .append_events(append("t1", vec![event("a", 1), event("b", 2)]))
        .await
        .unwrap();
    store
        .save_snapshot(SaveSnapshotRequest {
            stream: stream("t1"),
            aggregate_data: serde_json::json!({"total": 2}),
            aggregate_version: "3".to_owned(),
            metadata: HashMap::from([("by".to_owned(), "test".to_owned())]),
            sequence_number: 2,
        })
        .await
        .unwrap();
    store
        .append_events(append("t1", vec![event("c", 3)]))
        .await
        .unwrap();

    let loaded = store.load_events(load("t1")).await.unwrap();

    let snapshot = loaded.snapshot.as_ref().unwrap();
    assert_eq!(snapshot.sequence_number, 2);
    assert_eq!(snapshot.aggregate_data, serde_json::json!({"total": 2}));
    assert_eq!(snapshot.aggregate_revision, "3");
    assert_eq!(snapshot.metadata.get("by").map(String::as_str), Some("test"));
    assert_eq!(loaded.events.len(), 1);
    assert_eq!(loaded.events[0].sequence_number, 3);
}

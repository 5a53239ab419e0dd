//! Test event stores — mock `EventStore` implementations for tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tenantdb_core::clock::Clock;
use tenantdb_core::error::DomainError;
use tenantdb_core::event::{
    AppendEventsRequest, AppendEventsResponse, EventRecord, LoadEventsRequest, LoadEventsResponse,
    SaveSnapshotRequest, SaveSnapshotResponse, Snapshot, StreamKey,
};
use tenantdb_core::repository::EventStore;

#[derive(Debug, Default)]
struct Stream {
    events: Vec<EventRecord>,
    snapshots: Vec<Snapshot>,
}

/// An event store holding every stream in memory.
///
/// Assigns sequence numbers the same way the `PostgreSQL` store does and
/// stamps events with the injected clock.
pub struct InMemoryEventStore {
    clock: Arc<dyn Clock>,
    streams: Mutex<HashMap<StreamKey, Stream>>,
}

impl InMemoryEventStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            streams: Mutex::new(HashMap::new()),
        }
    }

    /// Returns every event stored for `stream`, ignoring snapshots.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn events(&self, stream: &StreamKey) -> Vec<EventRecord> {
        self.streams
            .lock()
            .unwrap()
            .get(stream)
            .map(|s| s.events.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append_events(
        &self,
        request: AppendEventsRequest,
    ) -> Result<AppendEventsResponse, DomainError> {
        request.stream.validate()?;
        let occurred_at = self.clock.now();
        let mut streams = self.streams.lock().unwrap();
        let stream = streams.entry(request.stream).or_default();
        let mut next = stream.events.last().map_or(0, |e| e.sequence_number) + 1;
        let mut sequence_numbers = Vec::with_capacity(request.events.len());
        for event in request.events {
            stream.events.push(EventRecord {
                event_id: event.event_id,
                event_data: event.event_data,
                event_type: event.event_type,
                event_version: event.event_version,
                sequence_number: next,
                occurred_at,
            });
            sequence_numbers.push(next);
            next += 1;
        }
        Ok(AppendEventsResponse { sequence_numbers })
    }

    async fn load_events(
        &self,
        request: LoadEventsRequest,
    ) -> Result<LoadEventsResponse, DomainError> {
        request.stream.validate()?;
        let streams = self.streams.lock().unwrap();
        let (snapshot, events) = match streams.get(&request.stream) {
            Some(stream) => {
                let snapshot = stream
                    .snapshots
                    .iter()
                    .max_by_key(|s| s.sequence_number)
                    .cloned();
                let after = snapshot.as_ref().map_or(0, |s| s.sequence_number);
                let events = stream
                    .events
                    .iter()
                    .filter(|e| e.sequence_number > after)
                    .cloned()
                    .collect();
                (snapshot, events)
            }
            None => (None, Vec::new()),
        };
        Ok(LoadEventsResponse {
            stream: request.stream,
            snapshot,
            events,
        })
    }

    async fn save_snapshot(
        &self,
        request: SaveSnapshotRequest,
    ) -> Result<SaveSnapshotResponse, DomainError> {
        request.stream.validate()?;
        let mut streams = self.streams.lock().unwrap();
        streams
            .entry(request.stream)
            .or_default()
            .snapshots
            .push(Snapshot {
                aggregate_data: request.aggregate_data,
                aggregate_revision: request.aggregate_version,
                sequence_number: request.sequence_number,
                metadata: request.metadata,
            });
        Ok(SaveSnapshotResponse {})
    }
}

/// An event store that loads nothing and silently accepts writes. Useful
/// for testing "aggregate not found" scenarios.
#[derive(Debug)]
pub struct EmptyEventStore;

#[async_trait]
impl EventStore for EmptyEventStore {
    async fn append_events(
        &self,
        request: AppendEventsRequest,
    ) -> Result<AppendEventsResponse, DomainError> {
        Ok(AppendEventsResponse {
            sequence_numbers: (1..=request.events.len() as u64).collect(),
        })
    }

    async fn load_events(
        &self,
        request: LoadEventsRequest,
    ) -> Result<LoadEventsResponse, DomainError> {
        Ok(LoadEventsResponse {
            stream: request.stream,
            snapshot: None,
            events: Vec::new(),
        })
    }

    async fn save_snapshot(
        &self,
        _request: SaveSnapshotRequest,
    ) -> Result<SaveSnapshotResponse, DomainError> {
        Ok(SaveSnapshotResponse {})
    }
}

/// An event store that always returns an infrastructure error. Useful for
/// testing error-handling paths.
#[derive(Debug)]
pub struct FailingEventStore;

#[async_trait]
impl EventStore for FailingEventStore {
    async fn append_events(
        &self,
        _request: AppendEventsRequest,
    ) -> Result<AppendEventsResponse, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn load_events(
        &self,
        _request: LoadEventsRequest,
    ) -> Result<LoadEventsResponse, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn save_snapshot(
        &self,
        _request: SaveSnapshotRequest,
    ) -> Result<SaveSnapshotResponse, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }
}

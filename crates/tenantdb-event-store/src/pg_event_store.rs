//! `PostgreSQL` implementation of the `EventStore` trait.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use tracing::{debug, instrument};

use tenantdb_core::clock::{Clock, SystemClock};
use tenantdb_core::error::DomainError;
use tenantdb_core::event::{
    AppendEventsRequest, AppendEventsResponse, EventRecord, LoadEventsRequest, LoadEventsResponse,
    SaveSnapshotRequest, SaveSnapshotResponse, Snapshot, StreamKey,
};
use tenantdb_core::repository::EventStore;

use crate::schema::{
    INSERT_EVENT, SELECT_EVENTS_AFTER, SELECT_LAST_SEQUENCE, SELECT_LATEST_SNAPSHOT,
    UPSERT_SNAPSHOT,
};

/// PostgreSQL-backed event store.
///
/// Sequence numbers are assigned inside the append transaction as the
/// stream's current maximum plus one. Two writers racing on one stream
/// collide on the primary key and the loser gets
/// `DomainError::ConcurrencyConflict`.
#[derive(Clone)]
pub struct PgEventStore {
    pool: PgPool,
    clock: Arc<dyn Clock>,
}

impl PgEventStore {
    /// Creates a store stamping events with the system time.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self::with_clock(pool, Arc::new(SystemClock))
    }

    /// Creates a store stamping events with `clock`.
    #[must_use]
    pub fn with_clock(pool: PgPool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }
}

fn to_i64(sequence_number: u64) -> Result<i64, DomainError> {
    i64::try_from(sequence_number).map_err(|_| {
        DomainError::Validation(format!("sequence number {sequence_number} is out of range"))
    })
}

fn to_u64(sequence_number: i64) -> Result<u64, DomainError> {
    u64::try_from(sequence_number).map_err(|_| {
        DomainError::Infrastructure(format!("stored sequence number {sequence_number} is negative"))
    })
}

fn append_error(err: sqlx::Error, stream: &StreamKey, sequence_number: u64) -> DomainError {
    let duplicate = matches!(&err, sqlx::Error::Database(db) if db.is_unique_violation());
    if duplicate {
        DomainError::ConcurrencyConflict {
            tenant_id: stream.tenant_id.clone(),
            aggregate_id: stream.aggregate_id.clone(),
            sequence_number,
        }
    } else {
        DomainError::backend(err)
    }
}

fn event_from_row(row: &PgRow) -> Result<EventRecord, DomainError> {
    Ok(EventRecord {
        event_id: row.try_get("event_id").map_err(DomainError::backend)?,
        event_data: row.try_get("event_data").map_err(DomainError::backend)?,
        event_type: row.try_get("event_type").map_err(DomainError::backend)?,
        event_version: row.try_get("event_version").map_err(DomainError::backend)?,
        sequence_number: to_u64(row.try_get("sequence_number").map_err(DomainError::backend)?)?,
        occurred_at: row.try_get("occurred_at").map_err(DomainError::backend)?,
    })
}

fn snapshot_from_row(row: &PgRow) -> Result<Snapshot, DomainError> {
    let Json(metadata): Json<HashMap<String, String>> =
        row.try_get("metadata").map_err(DomainError::backend)?;
    Ok(Snapshot {
        aggregate_data: row.try_get("aggregate_data").map_err(DomainError::backend)?,
        aggregate_revision: row
            .try_get("aggregate_revision")
            .map_err(DomainError::backend)?,
        sequence_number: to_u64(row.try_get("sequence_number").map_err(DomainError::backend)?)?,
        metadata,
    })
}

#[async_trait]
impl EventStore for PgEventStore {
    #[instrument(
        skip(self, request),
        fields(
            tenant_id = %request.stream.tenant_id,
            aggregate_type = %request.stream.aggregate_type,
            aggregate_id = %request.stream.aggregate_id,
            count = request.events.len()
        )
    )]
    async fn append_events(
        &self,
        request: AppendEventsRequest,
    ) -> Result<AppendEventsResponse, DomainError> {
        let AppendEventsRequest { stream, events } = request;
        stream.validate()?;
        if events.is_empty() {
            return Ok(AppendEventsResponse::default());
        }

        let occurred_at = self.clock.now();
        let mut tx = self.pool.begin().await.map_err(DomainError::backend)?;

        let last: i64 = sqlx::query_scalar(SELECT_LAST_SEQUENCE)
            .bind(&stream.tenant_id)
            .bind(&stream.aggregate_type)
            .bind(&stream.aggregate_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(DomainError::backend)?;

        let mut next = to_u64(last)?;
        let mut sequence_numbers = Vec::with_capacity(events.len());
        for event in events {
            next += 1;
            sqlx::query(INSERT_EVENT)
                .bind(&stream.tenant_id)
                .bind(&stream.aggregate_type)
                .bind(&stream.aggregate_id)
                .bind(to_i64(next)?)
                .bind(event.event_id)
                .bind(event.command_id)
                .bind(event.event_type)
                .bind(event.event_version)
                .bind(event.event_data)
                .bind(Json(event.metadata))
                .bind(event.pubsub_name)
                .bind(event.topic)
                .bind(occurred_at)
                .execute(&mut *tx)
                .await
                .map_err(|err| append_error(err, &stream, next))?;
            sequence_numbers.push(next);
        }

        tx.commit().await.map_err(DomainError::backend)?;
        debug!(?sequence_numbers, "events appended");
        Ok(AppendEventsResponse { sequence_numbers })
    }

    #[instrument(
        skip(self, request),
        fields(
            tenant_id = %request.stream.tenant_id,
            aggregate_type = %request.stream.aggregate_type,
            aggregate_id = %request.stream.aggregate_id
        )
    )]
    async fn load_events(
        &self,
        request: LoadEventsRequest,
    ) -> Result<LoadEventsResponse, DomainError> {
        let LoadEventsRequest { stream } = request;
        stream.validate()?;

        let snapshot = sqlx::query(SELECT_LATEST_SNAPSHOT)
            .bind(&stream.tenant_id)
            .bind(&stream.aggregate_type)
            .bind(&stream.aggregate_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DomainError::backend)?
            .map(|row| snapshot_from_row(&row))
            .transpose()?;

        let after = snapshot.as_ref().map_or(0, |s| s.sequence_number);
        let events = sqlx::query(SELECT_EVENTS_AFTER)
            .bind(&stream.tenant_id)
            .bind(&stream.aggregate_type)
            .bind(&stream.aggregate_id)
            .bind(to_i64(after)?)
            .fetch_all(&self.pool)
            .await
            .map_err(DomainError::backend)?
            .iter()
            .map(event_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            snapshot = snapshot.is_some(),
            events = events.len(),
            "stream loaded"
        );
        Ok(LoadEventsResponse {
            stream,
            snapshot,
            events,
        })
    }

    #[instrument(
        skip(self, request),
        fields(
            tenant_id = %request.stream.tenant_id,
            aggregate_type = %request.stream.aggregate_type,
            aggregate_id = %request.stream.aggregate_id,
            sequence_number = request.sequence_number
        )
    )]
    async fn save_snapshot(
        &self,
        request: SaveSnapshotRequest,
    ) -> Result<SaveSnapshotResponse, DomainError> {
        request.stream.validate()?;

        sqlx::query(UPSERT_SNAPSHOT)
            .bind(&request.stream.tenant_id)
            .bind(&request.stream.aggregate_type)
            .bind(&request.stream.aggregate_id)
            .bind(to_i64(request.sequence_number)?)
            .bind(&request.aggregate_data)
            .bind(&request.aggregate_version)
            .bind(Json(&request.metadata))
            .execute(&self.pool)
            .await
            .map_err(DomainError::backend)?;

        Ok(SaveSnapshotResponse {})
    }
}

//! Routes for tenant-scoped aggregate streams.
//!
//! Every route lives under
//! `/{tenant_id}/aggregates/{aggregate_type}/{aggregate_id}` and is nested
//! at `/api/v1/tenants` by the server.

use std::collections::HashMap;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::{debug, info, instrument};

use tenantdb_core::error::DomainError;
use tenantdb_core::event::{
    AppendEventsRequest, AppendEventsResponse, EventDto, LoadEventsRequest, LoadEventsResponse,
    SaveSnapshotRequest, SaveSnapshotResponse, StreamKey,
};
use tenantdb_core::outcome::FindResult;

use crate::error::ApiError;
use crate::state::AppState;

/// Path parameters addressing one aggregate stream.
#[derive(Debug, Deserialize)]
pub struct StreamPath {
    /// Owning tenant.
    pub tenant_id: String,
    /// Aggregate type name.
    pub aggregate_type: String,
    /// Aggregate identifier.
    pub aggregate_id: String,
}

impl From<StreamPath> for StreamKey {
    fn from(path: StreamPath) -> Self {
        StreamKey::new(path.tenant_id, path.aggregate_type, path.aggregate_id)
    }
}

/// Request body for POST `.../events`.
#[derive(Debug, Deserialize)]
pub struct AppendBody {
    /// Events in the order they must be stored.
    pub events: Vec<EventDto>,
}

/// Request body for POST `.../snapshots`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotBody {
    /// Serialized aggregate state.
    pub aggregate_data: serde_json::Value,
    /// Aggregate revision the state was produced by.
    #[serde(default)]
    pub aggregate_version: String,
    /// Free-form metadata.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    /// Sequence number of the last event folded into the state.
    pub sequence_number: u64,
}

/// POST `.../events`
#[instrument(
    skip(state, path, body),
    fields(
        tenant_id = %path.tenant_id,
        aggregate_type = %path.aggregate_type,
        aggregate_id = %path.aggregate_id
    )
)]
async fn append_events(
    State(state): State<AppState>,
    Path(path): Path<StreamPath>,
    Json(body): Json<AppendBody>,
) -> Result<Json<AppendEventsResponse>, ApiError> {
    if body.events.is_empty() {
        return Err(DomainError::Validation("events must not be empty".to_owned()).into());
    }

    info!(count = body.events.len(), "appending events");

    let response = state
        .event_store
        .append_events(AppendEventsRequest {
            stream: path.into(),
            events: body.events,
        })
        .await?;

    Ok(Json(response))
}

/// GET `.../events`
#[instrument(
    skip(state, path),
    fields(
        tenant_id = %path.tenant_id,
        aggregate_type = %path.aggregate_type,
        aggregate_id = %path.aggregate_id
    )
)]
async fn load_events(
    State(state): State<AppState>,
    Path(path): Path<StreamPath>,
) -> Result<Json<LoadEventsResponse>, ApiError> {
    let description = format!(
        "{} {} of tenant {}",
        path.aggregate_type, path.aggregate_id, path.tenant_id
    );
    let not_found = || DomainError::NotFound(description.clone());

    let loaded = state
        .event_store
        .load_events(LoadEventsRequest {
            stream: path.into(),
        })
        .await
        .map(|response| (!response.is_empty()).then_some(response));

    let response = FindResult::from_result(loaded)
        .on_success(|response| {
            debug!(
                events = response.events.len(),
                snapshot = response.snapshot.is_some(),
                "stream loaded"
            );
            Ok(())
        })
        .on_not_found(not_found)
        .into_result()?
        .ok_or_else(not_found)?;

    Ok(Json(response))
}

/// POST `.../snapshots`
#[instrument(
    skip(state, path, body),
    fields(
        tenant_id = %path.tenant_id,
        aggregate_type = %path.aggregate_type,
        aggregate_id = %path.aggregate_id,
        sequence_number = body.sequence_number
    )
)]
async fn save_snapshot(
    State(state): State<AppState>,
    Path(path): Path<StreamPath>,
    Json(body): Json<SnapshotBody>,
) -> Result<Json<SaveSnapshotResponse>, ApiError> {
    info!("saving snapshot");

    let response = state
        .event_store
        .save_snapshot(SaveSnapshotRequest {
            stream: path.into(),
            aggregate_data: body.aggregate_data,
            aggregate_version: body.aggregate_version,
            metadata: body.metadata,
            sequence_number: body.sequence_number,
        })
        .await?;

    Ok(Json(response))
}

/// Returns the router for aggregate streams.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/{tenant_id}/aggregates/{aggregate_type}/{aggregate_id}/events",
            get(load_events).post(append_events),
        )
        .route(
            "/{tenant_id}/aggregates/{aggregate_type}/{aggregate_id}/snapshots",
            post(save_snapshot),
        )
}

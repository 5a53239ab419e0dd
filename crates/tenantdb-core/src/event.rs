//! Event-store request/response contracts.
//!
//! Every request is scoped by tenant, aggregate type and aggregate id.
//! Sequence numbers are assigned by the store and increase monotonically
//! within one aggregate stream.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// An event submitted for appending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDto {
    /// Unique event identifier.
    pub event_id: String,
    /// Command that produced this event.
    #[serde(default)]
    pub command_id: String,
    /// Event payload.
    pub event_data: serde_json::Value,
    /// Type name for deserialization routing.
    pub event_type: String,
    /// Schema version of the payload.
    #[serde(default)]
    pub event_version: String,
    /// Free-form metadata.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    /// Pub/sub component the event is published on.
    #[serde(default)]
    pub pubsub_name: String,
    /// Topic the event is published to.
    #[serde(default)]
    pub topic: String,
}

impl EventDto {
    /// Creates an event with a fresh identifier and empty routing fields.
    #[must_use]
    pub fn new(event_type: impl Into<String>, event_data: serde_json::Value) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            command_id: String::new(),
            event_data,
            event_type: event_type.into(),
            event_version: String::new(),
            metadata: HashMap::new(),
            pubsub_name: String::new(),
            topic: String::new(),
        }
    }
}

/// A persisted event as returned by a load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    /// Unique event identifier.
    pub event_id: String,
    /// Event payload.
    pub event_data: serde_json::Value,
    /// Type name for deserialization routing.
    pub event_type: String,
    /// Schema version of the payload.
    pub event_version: String,
    /// Position within the aggregate stream.
    pub sequence_number: u64,
    /// When the event was stored.
    pub occurred_at: DateTime<Utc>,
}

impl EventRecord {
    /// Deserializes the payload into a domain event type.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the payload does not match `E`.
    pub fn decode<E: DeserializeOwned>(&self) -> Result<E, DomainError> {
        serde_json::from_value(self.event_data.clone()).map_err(|e| {
            DomainError::Infrastructure(format!(
                "event {} ({}) deserialization failed: {e}",
                self.event_id, self.event_type
            ))
        })
    }

    /// Returns a top-level payload field, if the payload is an object.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&serde_json::Value> {
        self.event_data.get(key)
    }
}

/// The latest saved state of an aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Serialized aggregate state.
    pub aggregate_data: serde_json::Value,
    /// Aggregate revision the state was produced by.
    pub aggregate_revision: String,
    /// Sequence number of the last event folded into this state.
    pub sequence_number: u64,
    /// Free-form metadata.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// Identifies one aggregate stream of one tenant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamKey {
    /// Owning tenant.
    pub tenant_id: String,
    /// Aggregate identifier.
    pub aggregate_id: String,
    /// Aggregate type name.
    pub aggregate_type: String,
}

impl StreamKey {
    /// Creates a stream key.
    #[must_use]
    pub fn new(
        tenant_id: impl Into<String>,
        aggregate_type: impl Into<String>,
        aggregate_id: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            aggregate_id: aggregate_id.into(),
            aggregate_type: aggregate_type.into(),
        }
    }

    /// Checks the fields every store requires.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::PreconditionFailed` for an empty tenant and
    /// `DomainError::Validation` for an empty aggregate id or type.
    pub fn validate(&self) -> Result<(), DomainError> {
        crate::tenant::TenantId::new(self.tenant_id.as_str())?;
        if self.aggregate_id.trim().is_empty() {
            return Err(DomainError::Validation("aggregateId is empty".to_owned()));
        }
        if self.aggregate_type.trim().is_empty() {
            return Err(DomainError::Validation("aggregateType is empty".to_owned()));
        }
        Ok(())
    }
}

/// Request to append events to an aggregate stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendEventsRequest {
    /// The target stream.
    #[serde(flatten)]
    pub stream: StreamKey,
    /// Events in the order they must be stored.
    pub events: Vec<EventDto>,
}

/// Result of an append.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendEventsResponse {
    /// Sequence numbers assigned to the appended events, in order.
    pub sequence_numbers: Vec<u64>,
}

/// Request to load an aggregate stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadEventsRequest {
    /// The stream to load.
    #[serde(flatten)]
    pub stream: StreamKey,
}

/// The latest snapshot plus every event stored after it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadEventsResponse {
    /// The loaded stream.
    #[serde(flatten)]
    pub stream: StreamKey,
    /// Latest snapshot, if one was saved.
    pub snapshot: Option<Snapshot>,
    /// Events after the snapshot, ordered by sequence number.
    pub events: Vec<EventRecord>,
}

impl LoadEventsResponse {
    /// Returns `true` if the stream has neither a snapshot nor events.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshot.is_none() && self.events.is_empty()
    }

    /// Highest sequence number known for the stream, or zero.
    #[must_use]
    pub fn last_sequence_number(&self) -> u64 {
        self.events
            .last()
            .map(|e| e.sequence_number)
            .or_else(|| self.snapshot.as_ref().map(|s| s.sequence_number))
            .unwrap_or(0)
    }
}

/// Request to save a new snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveSnapshotRequest {
    /// The stream the snapshot belongs to.
    #[serde(flatten)]
    pub stream: StreamKey,
    /// Serialized aggregate state.
    pub aggregate_data: serde_json::Value,
    /// Aggregate revision the state was produced by.
    pub aggregate_version: String,
    /// Free-form metadata.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    /// Sequence number of the last event folded into this state.
    pub sequence_number: u64,
}

/// Result of saving a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveSnapshotResponse {}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde::Deserialize;

    use super::{EventRecord, LoadEventsResponse, Snapshot, StreamKey};
    use crate::error::DomainError;

    #[derive(Debug, Deserialize, PartialEq)]
    struct UserRenamed {
        name: String,
    }

    fn record(sequence_number: u64, data: serde_json::Value) -> EventRecord {
        EventRecord {
            event_id: format!("e{sequence_number}"),
            event_data: data,
            event_type: "user.renamed".to_owned(),
            event_version: "1".to_owned(),
            sequence_number,
            occurred_at: Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_decode_event_payload() {
        let event = record(1, serde_json::json!({"name": "Ada"}));

        let decoded: UserRenamed = event.decode().unwrap();

        assert_eq!(decoded.name, "Ada");
        assert_eq!(event.field("name"), Some(&serde_json::json!("Ada")));
        assert!(event.field("missing").is_none());
    }

    #[test]
    fn test_decode_mismatch_is_infrastructure_error() {
        let event = record(1, serde_json::json!({"other": 1}));

        let result: Result<UserRenamed, _> = event.decode();

        assert!(matches!(result, Err(DomainError::Infrastructure(_))));
    }

    #[test]
    fn test_validate_rejects_empty_tenant_before_other_fields() {
        let result = StreamKey::new("", "", "").validate();

        assert!(matches!(result, Err(DomainError::PreconditionFailed(_))));
    }

    #[test]
    fn test_validate_rejects_empty_aggregate_fields() {
        assert!(matches!(
            StreamKey::new("t1", "user", "").validate(),
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            StreamKey::new("t1", "", "u1").validate(),
            Err(DomainError::Validation(_))
        ));
        assert!(StreamKey::new("t1", "user", "u1").validate().is_ok());
    }

    #[test]
    fn test_last_sequence_number_prefers_events_over_snapshot() {
        let mut response = LoadEventsResponse {
            stream: StreamKey::new("t1", "user", "u1"),
            snapshot: Some(Snapshot {
                aggregate_data: serde_json::json!({}),
                aggregate_revision: "1".to_owned(),
                sequence_number: 4,
                metadata: std::collections::HashMap::new(),
            }),
            events: Vec::new(),
        };
        assert_eq!(response.last_sequence_number(), 4);
        assert!(!response.is_empty());

        response.events.push(record(5, serde_json::json!({})));
        assert_eq!(response.last_sequence_number(), 5);
    }

    #[test]
    fn test_stream_key_serializes_camel_case_fields() {
        let json = serde_json::to_value(StreamKey::new("t1", "user", "u1")).unwrap();

        assert_eq!(
            json,
            serde_json::json!({"tenantId": "t1", "aggregateId": "u1", "aggregateType": "user"})
        );
    }
}

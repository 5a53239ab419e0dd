//! Event store statements over the `tenant_events` and `tenant_snapshots`
//! tables created by `migrations/0001_event_store.sql`.
//!
//! Every statement filters on `$1` tenant, `$2` aggregate type and `$3`
//! aggregate id.

/// Highest sequence number stored for a stream, or zero.
pub const SELECT_LAST_SEQUENCE: &str = r"
SELECT COALESCE(MAX(sequence_number), 0)
FROM tenant_events
WHERE tenant_id = $1 AND aggregate_type = $2 AND aggregate_id = $3
";

/// Inserts one event.
pub const INSERT_EVENT: &str = r"
INSERT INTO tenant_events (
    tenant_id, aggregate_type, aggregate_id, sequence_number, event_id, command_id,
    event_type, event_version, event_data, metadata, pubsub_name, topic, occurred_at
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
";

/// Events stored after sequence number `$4`, in order.
pub const SELECT_EVENTS_AFTER: &str = r"
SELECT event_id, event_type, event_version, event_data, sequence_number, occurred_at
FROM tenant_events
WHERE tenant_id = $1 AND aggregate_type = $2 AND aggregate_id = $3 AND sequence_number > $4
ORDER BY sequence_number
";

/// The most recent snapshot of a stream.
pub const SELECT_LATEST_SNAPSHOT: &str = r"
SELECT aggregate_data, aggregate_revision, sequence_number, metadata
FROM tenant_snapshots
WHERE tenant_id = $1 AND aggregate_type = $2 AND aggregate_id = $3
ORDER BY sequence_number DESC
LIMIT 1
";

/// Saves a snapshot, replacing one taken at the same sequence number.
pub const UPSERT_SNAPSHOT: &str = r"
INSERT INTO tenant_snapshots (
    tenant_id, aggregate_type, aggregate_id, sequence_number,
    aggregate_data, aggregate_revision, metadata
)
VALUES ($1, $2, $3, $4, $5, $6, $7)
ON CONFLICT (tenant_id, aggregate_type, aggregate_id, sequence_number)
DO UPDATE SET aggregate_data = EXCLUDED.aggregate_data,
              aggregate_revision = EXCLUDED.aggregate_revision,
              metadata = EXCLUDED.metadata,
              created_at = NOW()
";

//! tenantdb Event Store — `PostgreSQL` implementation of `EventStore`.

pub mod pg_event_store;
pub mod schema;

pub use pg_event_store::PgEventStore;

//! tenantdb API — HTTP surface over the tenant-scoped event store.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod telemetry;

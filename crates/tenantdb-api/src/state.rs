//! Shared application state.

use std::sync::Arc;

use tenantdb_core::repository::EventStore;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Event store every stream route reads from and writes to.
    pub event_store: Arc<dyn EventStore>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(event_store: Arc<dyn EventStore>) -> Self {
        Self { event_store }
    }
}

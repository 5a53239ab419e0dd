//! Driver seam for a graph database session.

use async_trait::async_trait;
use serde_json::{Map, Value};
use tenantdb_core::error::DomainError;

/// One result record, keyed by the returned column names.
pub type Row = Map<String, Value>;

/// Transaction mode a statement must run in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// Read transaction.
    Read,
    /// Write transaction.
    Write,
}

/// A Cypher statement and its parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct CypherQuery {
    /// Statement text with `$name` placeholders.
    pub text: String,
    /// Parameter values keyed by name.
    pub params: Map<String, Value>,
}

/// Runs statements against the graph database.
///
/// Implementations wrap driver failures with `DomainError::backend`.
#[async_trait]
pub trait GraphSession: Send + Sync {
    /// Runs `query` in a transaction of the given mode and collects its rows.
    async fn run(&self, query: CypherQuery, mode: AccessMode) -> Result<Vec<Row>, DomainError>;
}

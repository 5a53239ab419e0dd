//! Recording `GraphSession` with scripted replies.

use std::collections::VecDeque;
use std::io;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use tenantdb_core::error::DomainError;
use tenantdb_graph::session::{AccessMode, CypherQuery, GraphSession, Row};

#[derive(Debug)]
enum Reply {
    Rows(Vec<Row>),
    Fail(String),
}

/// A graph session that records every statement it receives.
///
/// Replies are consumed in order; once the script is exhausted every
/// statement returns no rows.
#[derive(Debug, Default)]
pub struct RecordingGraphSession {
    replies: Mutex<VecDeque<Reply>>,
    statements: Mutex<Vec<(CypherQuery, AccessMode)>>,
}

impl RecordingGraphSession {
    /// Creates a session with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues rows for the next unanswered statement.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn with_rows(self, rows: Vec<Row>) -> Self {
        self.replies.lock().unwrap().push_back(Reply::Rows(rows));
        self
    }

    /// Queues rows returning each value under `column`.
    #[must_use]
    pub fn with_column(self, column: &str, values: Vec<Value>) -> Self {
        let rows = values
            .into_iter()
            .map(|value| {
                let mut row = Row::new();
                row.insert(column.to_owned(), value);
                row
            })
            .collect();
        self.with_rows(rows)
    }

    /// Queues a backend failure for the next unanswered statement.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn with_failure(self, message: impl Into<String>) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(Reply::Fail(message.into()));
        self
    }

    /// Returns every statement received, in call order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn statements(&self) -> Vec<(CypherQuery, AccessMode)> {
        self.statements.lock().unwrap().clone()
    }
}

#[async_trait]
impl GraphSession for RecordingGraphSession {
    async fn run(&self, query: CypherQuery, mode: AccessMode) -> Result<Vec<Row>, DomainError> {
        self.statements.lock().unwrap().push((query, mode));
        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(Reply::Rows(rows)) => Ok(rows),
            Some(Reply::Fail(message)) => Err(DomainError::backend(io::Error::other(message))),
            None => Ok(Vec::new()),
        }
    }
}

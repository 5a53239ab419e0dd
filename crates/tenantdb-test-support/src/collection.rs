//! In-memory `Collection` evaluating query documents locally.

use std::cmp::Ordering;
use std::io;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use tenantdb_core::error::DomainError;
use tenantdb_core::paging::{SortDirection, SortField};
use tenantdb_document::collection::{Collection, FindOptions};
use tenantdb_filter::document::Document;

use crate::matcher::{compare_values, matches};

/// A collection kept in a `Vec`, in insertion order.
///
/// Every call records its filter so tests can assert on the exact query
/// documents a repository produced. Inserting a document whose `key_field`
/// value already exists fails like a unique index would.
#[derive(Debug)]
pub struct InMemoryCollection {
    key_field: String,
    documents: Mutex<Vec<Document>>,
    filters: Mutex<Vec<Document>>,
    failure: Mutex<Option<String>>,
}

impl Default for InMemoryCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCollection {
    /// Creates an empty collection keyed by `_id`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_key_field("_id")
    }

    /// Creates an empty collection keyed by `key_field`.
    #[must_use]
    pub fn with_key_field(key_field: impl Into<String>) -> Self {
        Self {
            key_field: key_field.into(),
            documents: Mutex::new(Vec::new()),
            filters: Mutex::new(Vec::new()),
            failure: Mutex::new(None),
        }
    }

    /// Makes every following call fail with a backend error carrying `message`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn fail_with(&self, message: impl Into<String>) {
        *self.failure.lock().unwrap() = Some(message.into());
    }

    /// Returns a snapshot of the stored documents.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn documents(&self) -> Vec<Document> {
        self.documents.lock().unwrap().clone()
    }

    /// Returns every filter received, in call order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn filters(&self) -> Vec<Document> {
        self.filters.lock().unwrap().clone()
    }

    fn begin(&self, filter: Option<&Document>) -> Result<(), DomainError> {
        if let Some(filter) = filter {
            self.filters.lock().unwrap().push(filter.clone());
        }
        match self.failure.lock().unwrap().as_ref() {
            Some(message) => Err(DomainError::backend(io::Error::other(message.clone()))),
            None => Ok(()),
        }
    }
}

fn sort_order(left: &Document, right: &Document, sort: &[SortField]) -> Ordering {
    sort.iter()
        .map(|field| {
            let a = left.get(&field.field).unwrap_or(&Value::Null);
            let b = right.get(&field.field).unwrap_or(&Value::Null);
            let ordering = compare_values(a, b).unwrap_or_else(|| rank(a).cmp(&rank(b)));
            match field.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        })
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

fn rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Number(_) => 1,
        Value::String(_) => 2,
        Value::Object(_) => 3,
        Value::Array(_) => 4,
        Value::Bool(_) => 5,
    }
}

#[async_trait]
impl Collection for InMemoryCollection {
    async fn insert_one(&self, document: Document) -> Result<(), DomainError> {
        self.begin(None)?;
        let mut documents = self.documents.lock().unwrap();
        let key = document.get(&self.key_field);
        if key.is_some() && documents.iter().any(|stored| stored.get(&self.key_field) == key) {
            return Err(DomainError::backend(io::Error::new(
                io::ErrorKind::AlreadyExists,
                "duplicate key",
            )));
        }
        documents.push(document);
        Ok(())
    }

    async fn update_one(
        &self,
        filter: Document,
        replacement: Document,
    ) -> Result<u64, DomainError> {
        self.begin(Some(&filter))?;
        let mut documents = self.documents.lock().unwrap();
        match documents.iter_mut().find(|stored| matches(stored, &filter)) {
            Some(stored) => {
                *stored = replacement;
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_many(&self, filter: Document) -> Result<u64, DomainError> {
        self.begin(Some(&filter))?;
        let mut documents = self.documents.lock().unwrap();
        let before = documents.len();
        documents.retain(|stored| !matches(stored, &filter));
        Ok((before - documents.len()) as u64)
    }

    async fn find_one(&self, filter: Document) -> Result<Option<Document>, DomainError> {
        self.begin(Some(&filter))?;
        let documents = self.documents.lock().unwrap();
        Ok(documents
            .iter()
            .find(|stored| matches(stored, &filter))
            .cloned())
    }

    async fn find(
        &self,
        filter: Document,
        options: FindOptions,
    ) -> Result<Vec<Document>, DomainError> {
        self.begin(Some(&filter))?;
        let mut found: Vec<Document> = self
            .documents
            .lock()
            .unwrap()
            .iter()
            .filter(|stored| matches(stored, &filter))
            .cloned()
            .collect();
        found.sort_by(|a, b| sort_order(a, b, &options.sort));
        let skip = usize::try_from(options.skip).unwrap_or(usize::MAX);
        let limit = options
            .limit
            .map_or(usize::MAX, |limit| usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(found.into_iter().skip(skip).take(limit).collect())
    }

    async fn count(&self, filter: Document) -> Result<u64, DomainError> {
        self.begin(Some(&filter))?;
        let documents = self.documents.lock().unwrap();
        Ok(documents.iter().filter(|stored| matches(stored, &filter)).count() as u64)
    }
}

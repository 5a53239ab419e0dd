//! Driver seam for one document collection.

use async_trait::async_trait;
use tenantdb_core::error::DomainError;
use tenantdb_core::paging::SortField;
use tenantdb_filter::document::Document;

/// Cursor options for [`Collection::find`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindOptions {
    /// Matching documents to skip.
    pub skip: u64,
    /// Maximum number of documents to return.
    pub limit: Option<u64>,
    /// Sort order over native field names.
    pub sort: Vec<SortField>,
}

/// The document-store operations the repository needs.
///
/// Implementations wrap driver failures with `DomainError::backend` and
/// must not alter them otherwise.
#[async_trait]
pub trait Collection: Send + Sync {
    /// Stores a new document.
    async fn insert_one(&self, document: Document) -> Result<(), DomainError>;

    /// Replaces the first document matching `filter`; returns the match count.
    async fn update_one(&self, filter: Document, replacement: Document)
    -> Result<u64, DomainError>;

    /// Deletes every document matching `filter`; returns the delete count.
    async fn delete_many(&self, filter: Document) -> Result<u64, DomainError>;

    /// Returns the first document matching `filter`.
    async fn find_one(&self, filter: Document) -> Result<Option<Document>, DomainError>;

    /// Returns the documents matching `filter`.
    async fn find(
        &self,
        filter: Document,
        options: FindOptions,
    ) -> Result<Vec<Document>, DomainError>;

    /// Counts the documents matching `filter`.
    async fn count(&self, filter: Document) -> Result<u64, DomainError>;
}

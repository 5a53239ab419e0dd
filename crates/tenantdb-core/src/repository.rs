//! Repository and event-store abstractions.

use async_trait::async_trait;

use crate::entity::Entity;
use crate::error::DomainError;
use crate::event::{
    AppendEventsRequest, AppendEventsResponse, LoadEventsRequest, LoadEventsResponse,
    SaveSnapshotRequest, SaveSnapshotResponse,
};
use crate::outcome::{FindListResult, FindResult, SetManyResult, SetResult};
use crate::paging::{FindPagingQuery, FindPagingResult};

/// Tenant-scoped entity repository implemented once per storage backend.
///
/// Every operation checks the tenant identifier before touching the backend
/// and reports an empty one as `DomainError::PreconditionFailed`.
#[async_trait]
pub trait Repository<T: Entity>: Send + Sync {
    /// Inserts a new entity.
    async fn insert(&self, entity: T) -> SetResult<T>;

    /// Inserts entities one by one, stopping at the first failure.
    async fn insert_many(&self, entities: Vec<T>) -> SetManyResult<T>;

    /// Replaces an existing entity; not found if nothing matched.
    async fn update(&self, entity: T) -> SetResult<T>;

    /// Replaces entities one by one, stopping at the first failure.
    async fn update_many(&self, entities: Vec<T>) -> SetManyResult<T>;

    /// Deletes one entity. The payload is the number of deleted entities.
    async fn delete_by_id(&self, tenant_id: &str, id: &str) -> SetResult<u64>;

    /// Deletes several entities by id.
    async fn delete_by_ids(&self, tenant_id: &str, ids: &[String]) -> SetResult<u64>;

    /// Deletes every entity of the tenant.
    async fn delete_all(&self, tenant_id: &str) -> SetResult<u64>;

    /// Deletes the tenant's entities matching an RSQL-style filter.
    async fn delete_by_filter(&self, tenant_id: &str, filter: &str) -> SetResult<u64>;

    /// Looks up one entity by id.
    async fn find_by_id(&self, tenant_id: &str, id: &str) -> FindResult<T>;

    /// Looks up several entities by id.
    async fn find_by_ids(&self, tenant_id: &str, ids: &[String]) -> FindListResult<T>;

    /// Lists every entity of the tenant.
    async fn find_all(&self, tenant_id: &str) -> FindListResult<T>;

    /// Lists the entities matching an RSQL-style filter.
    async fn find_list(&self, tenant_id: &str, filter: &str) -> FindListResult<T>;

    /// Returns one filtered, sorted page.
    async fn find_paging(&self, query: &FindPagingQuery) -> FindPagingResult<T>;
}

/// Tenant-scoped event store: append, load with snapshot, save snapshot.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Appends events to a stream, assigning consecutive sequence numbers.
    async fn append_events(
        &self,
        request: AppendEventsRequest,
    ) -> Result<AppendEventsResponse, DomainError>;

    /// Loads the latest snapshot and every event stored after it.
    async fn load_events(
        &self,
        request: LoadEventsRequest,
    ) -> Result<LoadEventsResponse, DomainError>;

    /// Saves a new snapshot of the aggregate.
    async fn save_snapshot(
        &self,
        request: SaveSnapshotRequest,
    ) -> Result<SaveSnapshotResponse, DomainError>;
}

//! Document-store implementation of the `Repository` trait.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tenantdb_core::entity::Entity;
use tenantdb_core::error::DomainError;
use tenantdb_core::outcome::{FindListResult, FindResult, SetManyResult, SetResult};
use tenantdb_core::paging::{FindPagingQuery, FindPagingResult, SortField};
use tenantdb_core::repository::Repository;
use tenantdb_core::tenant::TenantId;
use tenantdb_filter::document::{Document, to_document};
use tenantdb_filter::{
    BackendProfile, FilterParser, ScopedFilter, compile_filter, id_filter, ids_filter, scope,
    tenant_filter,
};
use tracing::{debug, instrument};

use crate::codec::{decode, encode};
use crate::collection::{Collection, FindOptions};

/// Tenant-scoped repository over one document collection.
pub struct DocumentRepository<T> {
    collection: Arc<dyn Collection>,
    parser: Arc<dyn FilterParser>,
    profile: BackendProfile,
    entity: PhantomData<fn() -> T>,
}

impl<T> DocumentRepository<T>
where
    T: Entity + Serialize + DeserializeOwned,
{
    /// Creates a repository using the document-store profile (`_id` keys).
    #[must_use]
    pub fn new(collection: Arc<dyn Collection>, parser: Arc<dyn FilterParser>) -> Self {
        Self::with_profile(collection, parser, BackendProfile::document())
    }

    /// Creates a repository with explicit native field names.
    #[must_use]
    pub fn with_profile(
        collection: Arc<dyn Collection>,
        parser: Arc<dyn FilterParser>,
        profile: BackendProfile,
    ) -> Self {
        Self {
            collection,
            parser,
            profile,
            entity: PhantomData,
        }
    }

    fn query(&self, filter: &ScopedFilter) -> Document {
        let document = to_document(filter);
        debug!(filter = ?document, "document query");
        document
    }

    fn compile(&self, tenant: &TenantId, filter: &str) -> Result<Document, DomainError> {
        let tree = compile_filter(self.parser.as_ref(), &self.profile, filter)?;
        Ok(self.query(&scope(&tree, tenant, &self.profile)))
    }

    fn sort_fields(&self, sort: &str) -> Result<Vec<SortField>, DomainError> {
        Ok(SortField::parse_list(sort)?
            .into_iter()
            .map(|field| SortField {
                field: self.profile.native_field(&field.field).to_owned(),
                direction: field.direction,
            })
            .collect())
    }

    async fn try_insert(&self, entity: &T) -> Result<(), DomainError> {
        TenantId::new(entity.tenant_id())?;
        let document = encode(entity, self.profile.key_field())?;
        self.collection.insert_one(document).await
    }

    async fn try_update(&self, entity: &T) -> Result<bool, DomainError> {
        let tenant = TenantId::new(entity.tenant_id())?;
        let filter = self.query(&id_filter(&tenant, entity.id(), &self.profile));
        let replacement = encode(entity, self.profile.key_field())?;
        let matched = self.collection.update_one(filter, replacement).await?;
        Ok(matched > 0)
    }

    async fn try_delete(&self, filter: Result<Document, DomainError>) -> Result<u64, DomainError> {
        self.collection.delete_many(filter?).await
    }

    async fn try_find(
        &self,
        filter: Result<Document, DomainError>,
        options: FindOptions,
    ) -> Result<Vec<T>, DomainError> {
        self.collection
            .find(filter?, options)
            .await?
            .into_iter()
            .map(|document| decode(document, self.profile.key_field()))
            .collect()
    }

    async fn try_find_one(&self, tenant_id: &str, id: &str) -> Result<Option<T>, DomainError> {
        let tenant = TenantId::new(tenant_id)?;
        let filter = self.query(&id_filter(&tenant, id, &self.profile));
        self.collection
            .find_one(filter)
            .await?
            .map(|document| decode(document, self.profile.key_field()))
            .transpose()
    }

    async fn try_find_paging(&self, query: &FindPagingQuery) -> Result<(Vec<T>, i64), DomainError> {
        let tenant = TenantId::new(query.tenant_id.as_str())?;
        query.validate()?;
        let filter = self.compile(&tenant, &query.filter)?;
        let options = FindOptions {
            skip: u64::try_from(query.skip()?).unwrap_or_default(),
            limit: query.limit().and_then(|limit| u64::try_from(limit).ok()),
            sort: self.sort_fields(&query.sort)?,
        };
        let total_rows = self.collection.count(filter.clone()).await?;
        let rows = self.try_find(Ok(filter), options).await?;
        Ok((rows, i64::try_from(total_rows).unwrap_or(i64::MAX)))
    }
}

#[async_trait]
impl<T> Repository<T> for DocumentRepository<T>
where
    T: Entity + Serialize + DeserializeOwned,
{
    #[instrument(skip(self, entity), fields(tenant_id = %entity.tenant_id(), id = %entity.id()))]
    async fn insert(&self, entity: T) -> SetResult<T> {
        match self.try_insert(&entity).await {
            Ok(()) => SetResult::found(entity),
            Err(err) => SetResult::with_error(err),
        }
    }

    #[instrument(skip(self, entities), fields(count = entities.len()))]
    async fn insert_many(&self, entities: Vec<T>) -> SetManyResult<T> {
        let mut inserted = Vec::with_capacity(entities.len());
        for entity in entities {
            if let Err(err) = self.try_insert(&entity).await {
                return SetManyResult::with_error(err);
            }
            inserted.push(entity);
        }
        SetManyResult::from_list(inserted)
    }

    #[instrument(skip(self, entity), fields(tenant_id = %entity.tenant_id(), id = %entity.id()))]
    async fn update(&self, entity: T) -> SetResult<T> {
        match self.try_update(&entity).await {
            Ok(true) => SetResult::found(entity),
            Ok(false) => SetResult::not_found(),
            Err(err) => SetResult::with_error(err),
        }
    }

    #[instrument(skip(self, entities), fields(count = entities.len()))]
    async fn update_many(&self, entities: Vec<T>) -> SetManyResult<T> {
        let mut updated = Vec::with_capacity(entities.len());
        for entity in entities {
            match self.try_update(&entity).await {
                Ok(true) => updated.push(entity),
                Ok(false) => debug!(id = entity.id(), "update matched nothing"),
                Err(err) => return SetManyResult::with_error(err),
            }
        }
        SetManyResult::from_list(updated)
    }

    #[instrument(skip(self))]
    async fn delete_by_id(&self, tenant_id: &str, id: &str) -> SetResult<u64> {
        let filter = TenantId::new(tenant_id)
            .map(|tenant| self.query(&id_filter(&tenant, id, &self.profile)));
        self.try_delete(filter)
            .await
            .map_or_else(SetResult::with_error, SetResult::<u64>::from_count)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn delete_by_ids(&self, tenant_id: &str, ids: &[String]) -> SetResult<u64> {
        let filter = TenantId::new(tenant_id)
            .map(|tenant| self.query(&ids_filter(&tenant, ids, &self.profile)));
        self.try_delete(filter)
            .await
            .map_or_else(SetResult::with_error, SetResult::<u64>::from_count)
    }

    #[instrument(skip(self))]
    async fn delete_all(&self, tenant_id: &str) -> SetResult<u64> {
        let filter =
            TenantId::new(tenant_id).map(|tenant| self.query(&tenant_filter(&tenant, &self.profile)));
        self.try_delete(filter)
            .await
            .map_or_else(SetResult::with_error, SetResult::<u64>::from_count)
    }

    #[instrument(skip(self))]
    async fn delete_by_filter(&self, tenant_id: &str, filter: &str) -> SetResult<u64> {
        let filter = TenantId::new(tenant_id).and_then(|tenant| self.compile(&tenant, filter));
        self.try_delete(filter)
            .await
            .map_or_else(SetResult::with_error, SetResult::<u64>::from_count)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, tenant_id: &str, id: &str) -> FindResult<T> {
        FindResult::from_result(self.try_find_one(tenant_id, id).await)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn find_by_ids(&self, tenant_id: &str, ids: &[String]) -> FindListResult<T> {
        let filter = TenantId::new(tenant_id)
            .map(|tenant| self.query(&ids_filter(&tenant, ids, &self.profile)));
        self.try_find(filter, FindOptions::default())
            .await
            .map_or_else(FindListResult::with_error, FindListResult::from_list)
    }

    #[instrument(skip(self))]
    async fn find_all(&self, tenant_id: &str) -> FindListResult<T> {
        let filter =
            TenantId::new(tenant_id).map(|tenant| self.query(&tenant_filter(&tenant, &self.profile)));
        self.try_find(filter, FindOptions::default())
            .await
            .map_or_else(FindListResult::with_error, FindListResult::from_list)
    }

    #[instrument(skip(self))]
    async fn find_list(&self, tenant_id: &str, filter: &str) -> FindListResult<T> {
        let filter = TenantId::new(tenant_id).and_then(|tenant| self.compile(&tenant, filter));
        self.try_find(filter, FindOptions::default())
            .await
            .map_or_else(FindListResult::with_error, FindListResult::from_list)
    }

    #[instrument(skip(self, query), fields(tenant_id = %query.tenant_id, filter = %query.filter))]
    async fn find_paging(&self, query: &FindPagingQuery) -> FindPagingResult<T> {
        match self.try_find_paging(query).await {
            Ok((rows, total_rows)) => FindPagingResult::new(Some(rows), total_rows, Some(query), None),
            Err(err) => FindPagingResult::with_error(err),
        }
    }
}

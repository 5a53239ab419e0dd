//! Graph-store implementation of the `Repository` trait.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tenantdb_core::entity::Entity;
use tenantdb_core::error::DomainError;
use tenantdb_core::outcome::{FindListResult, FindResult, SetManyResult, SetResult};
use tenantdb_core::paging::{FindPagingQuery, FindPagingResult, SortField};
use tenantdb_core::repository::Repository;
use tenantdb_core::tenant::TenantId;
use tenantdb_filter::{
    BackendProfile, FilterParser, ScopedFilter, compile_filter, id_filter, ids_filter, scope,
    tenant_filter,
};
use tracing::{debug, instrument};

use crate::builder::{CypherBuilder, DELETED_COLUMN, NODE_ALIAS, TOTAL_COLUMN};
use crate::session::{AccessMode, CypherQuery, GraphSession, Row};

/// Tenant-scoped repository over nodes with one label.
pub struct GraphRepository<T> {
    session: Arc<dyn GraphSession>,
    parser: Arc<dyn FilterParser>,
    builder: CypherBuilder,
    profile: BackendProfile,
    entity: PhantomData<fn() -> T>,
}

fn properties<T: Serialize>(entity: &T) -> Result<Map<String, Value>, DomainError> {
    match serde_json::to_value(entity)? {
        Value::Object(properties) => Ok(properties),
        other => Err(DomainError::Infrastructure(format!(
            "entity must serialize to an object, got {other}"
        ))),
    }
}

fn count_column(rows: &[Row], column: &str) -> u64 {
    rows.first()
        .and_then(|row| row.get(column))
        .and_then(Value::as_u64)
        .unwrap_or_default()
}

impl<T> GraphRepository<T>
where
    T: Entity + Serialize + DeserializeOwned,
{
    /// Creates a repository over nodes labelled `label`.
    #[must_use]
    pub fn new(
        session: Arc<dyn GraphSession>,
        parser: Arc<dyn FilterParser>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            session,
            parser,
            builder: CypherBuilder::new(label),
            profile: BackendProfile::graph(),
            entity: PhantomData,
        }
    }

    async fn run(&self, query: CypherQuery, mode: AccessMode) -> Result<Vec<Row>, DomainError> {
        debug!(cypher = %query.text, ?mode, "running statement");
        self.session.run(query, mode).await
    }

    fn decode_rows(rows: Vec<Row>) -> Result<Vec<T>, DomainError> {
        rows.into_iter()
            .map(|mut row| {
                let node = row.remove(NODE_ALIAS).ok_or_else(|| {
                    DomainError::Infrastructure(format!(
                        "result row has no `{NODE_ALIAS}` column"
                    ))
                })?;
                serde_json::from_value(node).map_err(DomainError::from)
            })
            .collect()
    }

    fn compile(&self, tenant: &TenantId, filter: &str) -> Result<ScopedFilter, DomainError> {
        let tree = compile_filter(self.parser.as_ref(), &self.profile, filter)?;
        Ok(scope(&tree, tenant, &self.profile))
    }

    async fn try_insert(&self, entity: &T) -> Result<(), DomainError> {
        TenantId::new(entity.tenant_id())?;
        let query = self.builder.create(properties(entity)?);
        self.run(query, AccessMode::Write).await.map(|_| ())
    }

    async fn try_update(&self, entity: &T) -> Result<bool, DomainError> {
        let tenant = TenantId::new(entity.tenant_id())?;
        let filter = id_filter(&tenant, entity.id(), &self.profile);
        let query = self.builder.update(&filter, properties(entity)?);
        let rows = self.run(query, AccessMode::Write).await?;
        Ok(!rows.is_empty())
    }

    async fn try_delete(&self, filter: Result<ScopedFilter, DomainError>) -> Result<u64, DomainError> {
        let rows = self.run(self.builder.delete(&filter?), AccessMode::Write).await?;
        Ok(count_column(&rows, DELETED_COLUMN))
    }

    async fn try_find(&self, filter: Result<ScopedFilter, DomainError>) -> Result<Vec<T>, DomainError> {
        let query = self.builder.find(&filter?, &[], 0, None);
        Self::decode_rows(self.run(query, AccessMode::Read).await?)
    }

    async fn try_find_paging(&self, query: &FindPagingQuery) -> Result<(Vec<T>, i64), DomainError> {
        let tenant = TenantId::new(query.tenant_id.as_str())?;
        query.validate()?;
        let filter = self.compile(&tenant, &query.filter)?;
        let sort: Vec<SortField> = SortField::parse_list(&query.sort)?
            .into_iter()
            .map(|field| SortField {
                field: self.profile.native_field(&field.field).to_owned(),
                direction: field.direction,
            })
            .collect();
        let total_rows = count_column(
            &self.run(self.builder.count(&filter), AccessMode::Read).await?,
            TOTAL_COLUMN,
        );
        let page = self.builder.find(
            &filter,
            &sort,
            u64::try_from(query.skip()?).unwrap_or_default(),
            query.limit().and_then(|limit| u64::try_from(limit).ok()),
        );
        let rows = Self::decode_rows(self.run(page, AccessMode::Read).await?)?;
        Ok((rows, i64::try_from(total_rows).unwrap_or(i64::MAX)))
    }
}

#[async_trait]
impl<T> Repository<T> for GraphRepository<T>
where
    T: Entity + Serialize + DeserializeOwned,
{
    #[instrument(skip(self, entity), fields(label = %self.builder.label(), tenant_id = %entity.tenant_id(), id = %entity.id()))]
    async fn insert(&self, entity: T) -> SetResult<T> {
        match self.try_insert(&entity).await {
            Ok(()) => SetResult::found(entity),
            Err(err) => SetResult::with_error(err),
        }
    }

    #[instrument(skip(self, entities), fields(label = %self.builder.label(), count = entities.len()))]
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

    #[instrument(skip(self, entity), fields(label = %self.builder.label(), tenant_id = %entity.tenant_id(), id = %entity.id()))]
    async fn update(&self, entity: T) -> SetResult<T> {
        match self.try_update(&entity).await {
            Ok(true) => SetResult::found(entity),
            Ok(false) => SetResult::not_found(),
            Err(err) => SetResult::with_error(err),
        }
    }

    #[instrument(skip(self, entities), fields(label = %self.builder.label(), count = entities.len()))]
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

    #[instrument(skip(self), fields(label = %self.builder.label()))]
    async fn delete_by_id(&self, tenant_id: &str, id: &str) -> SetResult<u64> {
        let filter = TenantId::new(tenant_id).map(|tenant| id_filter(&tenant, id, &self.profile));
        self.try_delete(filter)
            .await
            .map_or_else(SetResult::with_error, SetResult::<u64>::from_count)
    }

    #[instrument(skip(self, ids), fields(label = %self.builder.label(), count = ids.len()))]
    async fn delete_by_ids(&self, tenant_id: &str, ids: &[String]) -> SetResult<u64> {
        let filter = TenantId::new(tenant_id).map(|tenant| ids_filter(&tenant, ids, &self.profile));
        self.try_delete(filter)
            .await
            .map_or_else(SetResult::with_error, SetResult::<u64>::from_count)
    }

    #[instrument(skip(self), fields(label = %self.builder.label()))]
    async fn delete_all(&self, tenant_id: &str) -> SetResult<u64> {
        let filter = TenantId::new(tenant_id).map(|tenant| tenant_filter(&tenant, &self.profile));
        self.try_delete(filter)
            .await
            .map_or_else(SetResult::with_error, SetResult::<u64>::from_count)
    }

    #[instrument(skip(self), fields(label = %self.builder.label()))]
    async fn delete_by_filter(&self, tenant_id: &str, filter: &str) -> SetResult<u64> {
        let filter = TenantId::new(tenant_id).and_then(|tenant| self.compile(&tenant, filter));
        self.try_delete(filter)
            .await
            .map_or_else(SetResult::with_error, SetResult::<u64>::from_count)
    }

    #[instrument(skip(self), fields(label = %self.builder.label()))]
    async fn find_by_id(&self, tenant_id: &str, id: &str) -> FindResult<T> {
        let filter = TenantId::new(tenant_id).map(|tenant| id_filter(&tenant, id, &self.profile));
        FindResult::from_result(
            self.try_find(filter)
                .await
                .map(|entities| entities.into_iter().next()),
        )
    }

    #[instrument(skip(self, ids), fields(label = %self.builder.label(), count = ids.len()))]
    async fn find_by_ids(&self, tenant_id: &str, ids: &[String]) -> FindListResult<T> {
        let filter = TenantId::new(tenant_id).map(|tenant| ids_filter(&tenant, ids, &self.profile));
        self.try_find(filter)
            .await
            .map_or_else(FindListResult::with_error, FindListResult::from_list)
    }

    #[instrument(skip(self), fields(label = %self.builder.label()))]
    async fn find_all(&self, tenant_id: &str) -> FindListResult<T> {
        let filter = TenantId::new(tenant_id).map(|tenant| tenant_filter(&tenant, &self.profile));
        self.try_find(filter)
            .await
            .map_or_else(FindListResult::with_error, FindListResult::from_list)
    }

    #[instrument(skip(self), fields(label = %self.builder.label()))]
    async fn find_list(&self, tenant_id: &str, filter: &str) -> FindListResult<T> {
        let filter = TenantId::new(tenant_id).and_then(|tenant| self.compile(&tenant, filter));
        self.try_find(filter)
            .await
            .map_or_else(FindListResult::with_error, FindListResult::from_list)
    }

    #[instrument(skip(self, query), fields(label = %self.builder.label(), tenant_id = %query.tenant_id, filter = %query.filter))]
    async fn find_paging(&self, query: &FindPagingQuery) -> FindPagingResult<T> {
        match self.try_find_paging(query).await {
            Ok((rows, total_rows)) => FindPagingResult::new(Some(rows), total_rows, Some(query), None),
            Err(err) => FindPagingResult::with_error(err),
        }
    }
}

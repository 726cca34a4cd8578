//! Generic CRUD repository.

use crate::query::value::bind_all;
use crate::scope::BatchScope;
use crate::{
    ops, EntityMapping, NamedQueryRegistry, NamedQueryRequest, PersistenceContextProvider,
    ResultRow, SqlValue,
};
use sqlx::sqlite::SqliteRow;
use std::sync::Arc;
use strata_config::{BatchMode, RepositoryConfig};
use strata_core::{EntityId, Slice, StrataError, StrataResult};
use tracing::debug;

/// CRUD and named-query access for any [`EntityMapping`] type.
///
/// Every operation draws one connection from the current persistence context
/// and holds it until the operation completes. Batch operations follow the
/// configured [`BatchMode`].
#[derive(Debug, Clone)]
pub struct GenericRepository {
    provider: Arc<PersistenceContextProvider>,
    queries: Arc<NamedQueryRegistry>,
    batch_mode: BatchMode,
}

impl GenericRepository {
    /// Creates a repository with independent batch writes.
    #[must_use]
    pub fn new(provider: Arc<PersistenceContextProvider>, queries: NamedQueryRegistry) -> Self {
        Self {
            provider,
            queries: Arc::new(queries),
            batch_mode: BatchMode::default(),
        }
    }

    /// Creates a repository configured from `config`.
    #[must_use]
    pub fn from_config(
        provider: Arc<PersistenceContextProvider>,
        queries: NamedQueryRegistry,
        config: &RepositoryConfig,
    ) -> Self {
        Self::new(provider, queries).with_batch_mode(config.batch_mode)
    }

    /// Sets the batch mode.
    #[must_use]
    pub fn with_batch_mode(mut self, batch_mode: BatchMode) -> Self {
        self.batch_mode = batch_mode;
        self
    }

    #[must_use]
    pub const fn batch_mode(&self) -> BatchMode {
        self.batch_mode
    }

    #[must_use]
    pub fn queries(&self) -> &NamedQueryRegistry {
        &self.queries
    }

    /// Persists a new entity and returns the managed copy, with its
    /// storage-assigned id and creation date.
    pub async fn create<T: EntityMapping>(&self, entity: T) -> StrataResult<T> {
        debug!(table = T::TABLE, "Creating entity");
        let context = self.provider.context().await?;
        let mut conn = context.inner().acquire().await?;
        ops::insert(&mut conn, entity).await
    }

    /// Inserts the entity if it has no id or no row yet, updates it
    /// otherwise. Returns the managed copy.
    pub async fn create_or_update<T: EntityMapping>(&self, entity: T) -> StrataResult<T> {
        debug!(table = T::TABLE, id = ?entity.id(), "Creating or updating entity");
        let context = self.provider.context().await?;
        let mut conn = context.inner().acquire().await?;
        ops::merge(&mut conn, entity).await
    }

    /// Applies [`create_or_update`](Self::create_or_update) to each entity in
    /// order and returns the managed copies in the same order.
    pub async fn create_or_update_all<T, I>(&self, entities: I) -> StrataResult<Vec<T>>
    where
        T: EntityMapping,
        I: IntoIterator<Item = T>,
    {
        debug!(table = T::TABLE, batch_mode = %self.batch_mode, "Creating or updating batch");
        let context = self.provider.context().await?;
        let mut scope = BatchScope::begin(context.inner(), self.batch_mode).await?;
        let result = ops::merge_each(scope.conn(), entities).await;
        scope.finish(result).await
    }

    /// Same as [`create_or_update`](Self::create_or_update).
    pub async fn update<T: EntityMapping>(&self, entity: T) -> StrataResult<T> {
        self.create_or_update(entity).await
    }

    /// Removes the entity's row. An entity without an id has never been
    /// persisted, so nothing is removed.
    pub async fn delete<T: EntityMapping>(&self, entity: &T) -> StrataResult<()> {
        match entity.id() {
            Some(id) => {
                self.delete_by_id::<T>(id).await?;
            }
            None => debug!(table = T::TABLE, "Skipping delete of transient entity"),
        }
        Ok(())
    }

    /// Removes the row with `id`. Returns `false` when there was none.
    pub async fn delete_by_id<T: EntityMapping>(&self, id: EntityId) -> StrataResult<bool> {
        let context = self.provider.context().await?;
        let mut conn = context.inner().acquire().await?;
        ops::remove::<T>(&mut conn, id).await
    }

    /// Removes each row by id, skipping ids that have no row. Returns the
    /// number of rows removed.
    pub async fn delete_by_ids<T, I>(&self, ids: I) -> StrataResult<usize>
    where
        T: EntityMapping,
        I: IntoIterator<Item = EntityId>,
    {
        debug!(table = T::TABLE, batch_mode = %self.batch_mode, "Deleting batch by id");
        let context = self.provider.context().await?;
        let mut scope = BatchScope::begin(context.inner(), self.batch_mode).await?;
        let result = ops::remove_each::<T, _>(scope.conn(), ids).await;
        scope.finish(result).await
    }

    /// Removes the rows of every entity that has an id.
    pub async fn delete_all<T: EntityMapping>(&self, entities: &[T]) -> StrataResult<usize> {
        self.delete_by_ids::<T, _>(entities.iter().filter_map(|entity| entity.id()))
            .await
    }

    /// Loads the entity with `id`, or `None` when there is no such row.
    pub async fn find<T: EntityMapping>(&self, id: EntityId) -> StrataResult<Option<T>> {
        debug!(table = T::TABLE, %id, "Finding entity");
        let context = self.provider.context().await?;
        let mut conn = context.inner().acquire().await?;
        ops::find::<T>(&mut conn, id).await
    }

    /// Runs a named query and returns untyped rows.
    pub async fn find_by_named_query(
        &self,
        request: &NamedQueryRequest,
    ) -> StrataResult<Vec<ResultRow>> {
        let rows = self.fetch_named(request).await?;
        rows.iter().map(ResultRow::from_row).collect()
    }

    /// Runs a named query and decodes each row as `T`.
    ///
    /// When the request asks for `n` rows with `0 < n <= 100`, up to `n + 1`
    /// rows come back; the extra row signals that another page exists.
    pub async fn find_by_named_query_as<T: EntityMapping>(
        &self,
        request: &NamedQueryRequest,
    ) -> StrataResult<Vec<T>> {
        let rows = self.fetch_named(request).await?;
        rows.iter().map(T::from_row).collect()
    }

    /// Runs a named query and returns one page, with the extra row consumed
    /// into [`Slice::has_next`].
    pub async fn find_slice_by_named_query_as<T: EntityMapping>(
        &self,
        request: &NamedQueryRequest,
    ) -> StrataResult<Slice<T>> {
        let rows = self.find_by_named_query_as::<T>(request).await?;
        Ok(Slice::from_lookahead(rows, request.page_descriptor()))
    }

    async fn fetch_named(&self, request: &NamedQueryRequest) -> StrataResult<Vec<SqliteRow>> {
        let query = self.queries.get(request.name())?;
        let mut values = query.bind(request.bound_parameters())?;

        let page = request.page_descriptor();
        let offset = i64::try_from(page.offset()).map_err(|_| {
            StrataError::binding(format!("first result {} is out of range", page.offset()))
        })?;
        values.push(SqlValue::Integer(page.limit()));
        values.push(SqlValue::Integer(offset));

        debug!(
            query = request.name(),
            limit = page.limit(),
            offset,
            "Executing named query"
        );

        let context = self.provider.context().await?;
        let mut conn = context.inner().acquire().await?;
        let rows = bind_all(sqlx::query(query.paged_sql()), &values)
            .fetch_all(&mut *conn)
            .await?;
        Ok(rows)
    }
}

//! Single-entity storage operations over one connection.
//!
//! Every repository operation runs these against a connection it already
//! holds, so a write and the reload that follows it see the same state.

use crate::query::value::bind_all;
use crate::traits::{delete_sql, insert_sql, insert_with_id_sql, select_by_id_sql, upsert_sql};
use crate::{EntityMapping, SqlValue};
use chrono::{NaiveDate, Utc};
use sqlx::SqliteConnection;
use strata_core::{EntityId, StrataError, StrataResult};
use tracing::debug;

pub(crate) fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn values_with_id<T: EntityMapping>(id: EntityId, entity: &T) -> Vec<SqlValue> {
    let mut values = Vec::with_capacity(T::COLUMNS.len() + 1);
    values.push(id.into());
    values.extend(entity.values());
    values
}

/// Inserts a new row and returns the reloaded entity.
pub(crate) async fn insert<T: EntityMapping>(
    conn: &mut SqliteConnection,
    mut entity: T,
) -> StrataResult<T> {
    entity.validate_entity()?;
    entity.ensure_creation_date(today());

    let id = match entity.id() {
        Some(id) => {
            let sql = insert_with_id_sql::<T>();
            bind_all(sqlx::query(&sql), &values_with_id(id, &entity))
                .execute(&mut *conn)
                .await?;
            id
        }
        None => {
            let sql = insert_sql::<T>();
            let result = bind_all(sqlx::query(&sql), &entity.values())
                .execute(&mut *conn)
                .await?;
            EntityId::new(result.last_insert_rowid())
        }
    };

    debug!(table = T::TABLE, %id, "Inserted row");
    reload(conn, id).await
}

/// Inserts a transient entity, or upserts one that carries an id.
pub(crate) async fn merge<T: EntityMapping>(
    conn: &mut SqliteConnection,
    mut entity: T,
) -> StrataResult<T> {
    let Some(id) = entity.id() else {
        return insert(conn, entity).await;
    };

    entity.validate_entity()?;
    entity.ensure_creation_date(today());

    let sql = upsert_sql::<T>();
    bind_all(sqlx::query(&sql), &values_with_id(id, &entity))
        .execute(&mut *conn)
        .await?;

    debug!(table = T::TABLE, %id, "Upserted row");
    reload(conn, id).await
}

/// Upserts each entity in order.
pub(crate) async fn merge_each<T, I>(conn: &mut SqliteConnection, entities: I) -> StrataResult<Vec<T>>
where
    T: EntityMapping,
    I: IntoIterator<Item = T>,
{
    let mut merged = Vec::new();
    for entity in entities {
        merged.push(merge(conn, entity).await?);
    }
    Ok(merged)
}

pub(crate) async fn find<T: EntityMapping>(
    conn: &mut SqliteConnection,
    id: EntityId,
) -> StrataResult<Option<T>> {
    let sql = select_by_id_sql::<T>();
    let row = sqlx::query(&sql)
        .bind(id.into_inner())
        .fetch_optional(&mut *conn)
        .await?;

    row.as_ref().map(T::from_row).transpose()
}

async fn reload<T: EntityMapping>(conn: &mut SqliteConnection, id: EntityId) -> StrataResult<T> {
    find::<T>(conn, id)
        .await?
        .ok_or_else(|| StrataError::not_found(T::TABLE, id))
}

/// Deletes the row with `id`. Returns whether a row was removed.
pub(crate) async fn remove<T: EntityMapping>(
    conn: &mut SqliteConnection,
    id: EntityId,
) -> StrataResult<bool> {
    let sql = delete_sql::<T>();
    let result = sqlx::query(&sql)
        .bind(id.into_inner())
        .execute(&mut *conn)
        .await?;

    let removed = result.rows_affected() > 0;
    debug!(table = T::TABLE, %id, removed, "Deleted row");
    Ok(removed)
}

/// Deletes each id in order, skipping ids with no row. Returns the number
/// of rows removed.
pub(crate) async fn remove_each<T, I>(conn: &mut SqliteConnection, ids: I) -> StrataResult<usize>
where
    T: EntityMapping,
    I: IntoIterator<Item = EntityId>,
{
    let mut removed = 0;
    for id in ids {
        if remove::<T>(conn, id).await? {
            removed += 1;
        }
    }
    Ok(removed)
}

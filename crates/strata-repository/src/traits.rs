//! Storage mapping for entities handled by the generic repository.

use crate::SqlValue;
use sqlx::sqlite::SqliteRow;
use strata_core::{BaseEntity, StrataResult};

/// Maps an entity onto a single table.
///
/// The identifier lives in [`ID_COLUMN`](Self::ID_COLUMN); every other
/// persisted column is listed in [`COLUMNS`](Self::COLUMNS), in the same order
/// as [`values`](Self::values) returns them.
pub trait EntityMapping: BaseEntity + Sized + Unpin + 'static {
    /// Table name.
    const TABLE: &'static str;

    /// Identifier column.
    const ID_COLUMN: &'static str = "id";

    /// Non-identifier columns.
    const COLUMNS: &'static [&'static str];

    /// Columns written on insert but never on update.
    const IMMUTABLE_COLUMNS: &'static [&'static str] = &[];

    /// Column values, ordered like [`COLUMNS`](Self::COLUMNS).
    fn values(&self) -> Vec<SqlValue>;

    /// Decodes an entity from a row selected with [`select_columns`].
    fn from_row(row: &SqliteRow) -> StrataResult<Self>;

    /// Named queries this entity contributes, as `(name, sql)` pairs.
    fn named_queries() -> Vec<(&'static str, &'static str)> {
        Vec::new()
    }
}

pub(crate) fn select_columns<T: EntityMapping>() -> String {
    std::iter::once(T::ID_COLUMN)
        .chain(T::COLUMNS.iter().copied())
        .collect::<Vec<_>>()
        .join(", ")
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

fn is_mutable<T: EntityMapping>(column: &str) -> bool {
    !T::IMMUTABLE_COLUMNS.contains(&column)
}

pub(crate) fn select_by_id_sql<T: EntityMapping>() -> String {
    format!(
        "SELECT {} FROM {} WHERE {} = ?",
        select_columns::<T>(),
        T::TABLE,
        T::ID_COLUMN
    )
}

/// Insert letting storage assign the identifier.
pub(crate) fn insert_sql<T: EntityMapping>() -> String {
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        T::TABLE,
        T::COLUMNS.join(", "),
        placeholders(T::COLUMNS.len())
    )
}

/// Insert with the identifier bound first.
pub(crate) fn insert_with_id_sql<T: EntityMapping>() -> String {
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        T::TABLE,
        select_columns::<T>(),
        placeholders(T::COLUMNS.len() + 1)
    )
}

/// Insert-or-update keyed on the identifier. Immutable columns keep their
/// stored value when the row already exists.
pub(crate) fn upsert_sql<T: EntityMapping>() -> String {
    let assignments: Vec<String> = T::COLUMNS
        .iter()
        .filter(|column| is_mutable::<T>(column))
        .map(|column| format!("{column} = excluded.{column}"))
        .collect();

    let action = if assignments.is_empty() {
        "DO NOTHING".to_string()
    } else {
        format!("DO UPDATE SET {}", assignments.join(", "))
    };

    format!(
        "{} ON CONFLICT({}) {}",
        insert_with_id_sql::<T>(),
        T::ID_COLUMN,
        action
    )
}

pub(crate) fn delete_sql<T: EntityMapping>() -> String {
    format!("DELETE FROM {} WHERE {} = ?", T::TABLE, T::ID_COLUMN)
}

//! SQLite mapping for [`Book`].

use crate::{EntityMapping, SqlValue};
use chrono::NaiveDate;
use sqlx::sqlite::SqliteRow;
use sqlx::FromRow;
use strata_core::{Book, EntityId, StrataResult};

/// Lists every book, ordered by title.
pub const FIND_ALL_BOOKS: &str = "findAllBooks";
/// Books whose title matches a `LIKE` pattern bound to `:title`.
pub const FIND_BOOKS_BY_TITLE: &str = "findBooksByTitle";
/// Books created on or after `:since`.
pub const FIND_BOOKS_CREATED_SINCE: &str = "findBooksCreatedSince";
/// Single-row count of all books, in column `total`.
pub const COUNT_BOOKS: &str = "countBooks";

/// Database row representation of a book.
#[derive(Debug, FromRow)]
struct BookRow {
    id: i64,
    title: String,
    creation_date: NaiveDate,
}

impl From<BookRow> for Book {
    fn from(row: BookRow) -> Self {
        Book {
            id: Some(EntityId::new(row.id)),
            title: row.title,
            creation_date: Some(row.creation_date),
        }
    }
}

impl EntityMapping for Book {
    const TABLE: &'static str = "book";
    const COLUMNS: &'static [&'static str] = &["title", "creation_date"];
    const IMMUTABLE_COLUMNS: &'static [&'static str] = &["creation_date"];

    fn values(&self) -> Vec<SqlValue> {
        vec![self.title.clone().into(), self.creation_date.into()]
    }

    fn from_row(row: &SqliteRow) -> StrataResult<Self> {
        Ok(BookRow::from_row(row)?.into())
    }

    fn named_queries() -> Vec<(&'static str, &'static str)> {
        vec![
            (
                FIND_ALL_BOOKS,
                "SELECT id, title, creation_date FROM book ORDER BY title ASC, id ASC",
            ),
            (
                FIND_BOOKS_BY_TITLE,
                "SELECT id, title, creation_date FROM book \
                 WHERE title LIKE :title ORDER BY title ASC, id ASC",
            ),
            (
                FIND_BOOKS_CREATED_SINCE,
                "SELECT id, title, creation_date FROM book \
                 WHERE creation_date >= :since ORDER BY creation_date ASC, id ASC",
            ),
            (COUNT_BOOKS, "SELECT COUNT(*) AS total FROM book"),
        ]
    }
}

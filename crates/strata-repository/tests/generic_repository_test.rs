//! Integration tests for GenericRepository against in-memory SQLite.

mod common;

use chrono::{NaiveDate, Utc};
use common::{sorted_titles, TestDatabase, FIFTEEN_TITLES};
use strata_core::{Book, EntityId, StrataError};
use strata_repository::{
    GenericRepository, NamedQueryRegistry, NamedQueryRequest, SqlValue, COUNT_BOOKS,
    FIND_ALL_BOOKS, FIND_BOOKS_BY_TITLE, FIND_BOOKS_CREATED_SINCE,
};

fn titles(books: &[Book]) -> Vec<&str> {
    books.iter().map(|b| b.title.as_str()).collect()
}

#[tokio::test]
async fn test_create_assigns_id_and_creation_date() {
    let db = TestDatabase::new().await;
    let repo = db.repository();

    let book = repo.create(Book::new("Macunaíma")).await.expect("Failed to create book");

    assert!(book.id.is_some());
    assert_eq!(book.creation_date, Some(Utc::now().date_naive()));
    assert_eq!(book.title, "Macunaíma");
}

#[tokio::test]
async fn test_create_keeps_supplied_creation_date() {
    let db = TestDatabase::new().await;
    let repo = db.repository();
    let date = NaiveDate::from_ymd_opt(1999, 12, 31).unwrap();

    let mut book = Book::new("Grande Sertão");
    book.creation_date = Some(date);
    let saved = repo.create(book).await.unwrap();

    assert_eq!(saved.creation_date, Some(date));
}

#[tokio::test]
async fn test_create_rejects_invalid_entity() {
    let db = TestDatabase::new().await;
    let repo = db.repository();

    let err = repo.create(Book::new("")).await.unwrap_err();
    assert!(matches!(err, StrataError::Validation(_)));
    assert_eq!(db.count_books().await, 0);
}

#[tokio::test]
async fn test_create_duplicate_id_is_conflict() {
    let db = TestDatabase::new().await;
    let repo = db.repository();
    let ids = db.seed_books(&["Ubirajara"]).await;

    let err = repo
        .create(Book::with_id(ids[0], "Senhora"))
        .await
        .unwrap_err();
    assert!(matches!(err, StrataError::Conflict(_)));
    assert!(err.is_constraint_violation());
}

#[tokio::test]
async fn test_find_missing_returns_none() {
    let db = TestDatabase::new().await;
    let repo = db.repository();

    let found = repo.find::<Book>(EntityId::new(4242)).await.unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn test_find_returns_persisted_state() {
    let db = TestDatabase::new().await;
    let repo = db.repository();
    let created = repo.create(Book::new("O Cortiço")).await.unwrap();

    let found = repo
        .find::<Book>(created.id.unwrap())
        .await
        .unwrap()
        .expect("Book not found");
    assert_eq!(found, created);
}

#[tokio::test]
async fn test_create_or_update_inserts_transient() {
    let db = TestDatabase::new().await;
    let repo = db.repository();

    let book = repo.create_or_update(Book::new("Til")).await.unwrap();
    assert!(book.id.is_some());
    assert_eq!(db.count_books().await, 1);
}

#[tokio::test]
async fn test_create_or_update_inserts_unknown_id() {
    let db = TestDatabase::new().await;
    let repo = db.repository();

    let book = repo
        .create_or_update(Book::with_id(EntityId::new(77), "Lucíola"))
        .await
        .unwrap();
    assert_eq!(book.id, Some(EntityId::new(77)));
    assert!(book.creation_date.is_some());
}

#[tokio::test]
async fn test_update_changes_title_and_keeps_creation_date() {
    let db = TestDatabase::new().await;
    let repo = db.repository();
    let original_date = NaiveDate::from_ymd_opt(2001, 5, 20).unwrap();

    let mut book = Book::new("Draft");
    book.creation_date = Some(original_date);
    let mut book = repo.create(book).await.unwrap();

    book.retitle("Final");
    book.creation_date = None;
    let updated = repo.update(book).await.unwrap();

    assert_eq!(updated.title, "Final");
    assert_eq!(updated.creation_date, Some(original_date));
    assert_eq!(db.count_books().await, 1);
}

#[tokio::test]
async fn test_create_or_update_all_returns_in_order() {
    let db = TestDatabase::new().await;
    let repo = db.repository();

    let books = repo
        .create_or_update_all(vec![Book::new("C"), Book::new("A"), Book::new("B")])
        .await
        .unwrap();

    assert_eq!(titles(&books), vec!["C", "A", "B"]);
    assert!(books.iter().all(|b| b.id.is_some() && b.creation_date.is_some()));
    assert_eq!(db.count_books().await, 3);
}

#[tokio::test]
async fn test_independent_batch_keeps_earlier_writes() {
    let db = TestDatabase::new().await;
    let repo = db.repository();

    let err = repo
        .create_or_update_all(vec![Book::new("First"), Book::new(" "), Book::new("Third")])
        .await
        .unwrap_err();

    assert!(matches!(err, StrataError::Validation(_)));
    assert_eq!(db.count_books().await, 1);
}

#[tokio::test]
async fn test_atomic_batch_rolls_back_on_failure() {
    let db = TestDatabase::new().await;
    let repo = db.atomic_repository();

    let err = repo
        .create_or_update_all(vec![Book::new("First"), Book::new(" "), Book::new("Third")])
        .await
        .unwrap_err();

    assert!(matches!(err, StrataError::Validation(_)));
    assert_eq!(db.count_books().await, 0);
}

#[tokio::test]
async fn test_atomic_batch_commits_on_success() {
    let db = TestDatabase::new().await;
    let repo = db.atomic_repository();

    let books = repo
        .create_or_update_all(vec![Book::new("One"), Book::new("Two")])
        .await
        .unwrap();

    assert_eq!(books.len(), 2);
    assert_eq!(db.count_books().await, 2);
}

#[tokio::test]
async fn test_delete_entity() {
    let db = TestDatabase::new().await;
    let repo = db.repository();
    let book = repo.create(Book::new("Quincas Borba")).await.unwrap();

    repo.delete(&book).await.unwrap();

    assert!(repo.find::<Book>(book.id.unwrap()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_transient_entity_is_noop() {
    let db = TestDatabase::new().await;
    let repo = db.repository();
    db.seed_books(&["Kept"]).await;

    repo.delete(&Book::new("Never saved")).await.unwrap();
    assert_eq!(db.count_books().await, 1);
}

#[tokio::test]
async fn test_delete_by_id() {
    let db = TestDatabase::new().await;
    let repo = db.repository();
    let ids = db.seed_books(&["Helena"]).await;

    assert!(repo.delete_by_id::<Book>(ids[0]).await.unwrap());
    assert!(!repo.delete_by_id::<Book>(ids[0]).await.unwrap());
    assert_eq!(db.count_books().await, 0);
}

#[tokio::test]
async fn test_delete_by_id_missing_is_noop() {
    let db = TestDatabase::new().await;
    let repo = db.repository();
    db.seed_books(&["Helena"]).await;

    let removed = repo.delete_by_id::<Book>(EntityId::new(999)).await.unwrap();
    assert!(!removed);
    assert_eq!(db.count_books().await, 1);
}

#[tokio::test]
async fn test_delete_by_ids_skips_missing() {
    let db = TestDatabase::new().await;
    let repo = db.repository();
    let ids = db.seed_books(&["One", "Two", "Three"]).await;

    let removed = repo
        .delete_by_ids::<Book, _>(vec![ids[0], EntityId::new(999), ids[2]])
        .await
        .unwrap();

    assert_eq!(removed, 2);
    assert!(repo.find::<Book>(ids[0]).await.unwrap().is_none());
    assert!(repo.find::<Book>(ids[1]).await.unwrap().is_some());
    assert!(repo.find::<Book>(ids[2]).await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_all() {
    let db = TestDatabase::new().await;
    let repo = db.repository();
    let books = repo
        .create_or_update_all(vec![Book::new("X"), Book::new("Y"), Book::new("Z")])
        .await
        .unwrap();

    let removed = repo.delete_all(&books[..2]).await.unwrap();

    assert_eq!(removed, 2);
    assert_eq!(db.count_books().await, 1);
}

#[tokio::test]
async fn test_named_query_limit_fetches_lookahead_row() {
    let db = TestDatabase::new().await;
    let repo = db.repository();
    db.seed_books(&FIFTEEN_TITLES).await;

    let request = NamedQueryRequest::new(FIND_ALL_BOOKS)
        .result_limit(10)
        .first_result(0);
    let books = repo.find_by_named_query_as::<Book>(&request).await.unwrap();

    assert_eq!(books.len(), 11);
    assert_eq!(titles(&books), sorted_titles()[..11].to_vec());
}

#[tokio::test]
async fn test_named_query_zero_limit_returns_full_page() {
    let db = TestDatabase::new().await;
    let repo = db.repository();
    db.seed_books(&FIFTEEN_TITLES).await;

    let request = NamedQueryRequest::new(FIND_ALL_BOOKS).result_limit(0);
    let books = repo.find_by_named_query_as::<Book>(&request).await.unwrap();

    assert_eq!(titles(&books), sorted_titles());
}

#[tokio::test]
async fn test_named_query_oversized_limit_is_clamped() {
    let db = TestDatabase::new().await;
    let repo = db.repository();
    db.seed_books(&FIFTEEN_TITLES).await;

    let request = NamedQueryRequest::new(FIND_ALL_BOOKS).result_limit(500);
    let books = repo.find_by_named_query_as::<Book>(&request).await.unwrap();

    assert_eq!(books.len(), 15);
}

#[tokio::test]
async fn test_named_query_offset() {
    let db = TestDatabase::new().await;
    let repo = db.repository();
    db.seed_books(&FIFTEEN_TITLES).await;

    let request = NamedQueryRequest::new(FIND_ALL_BOOKS)
        .result_limit(10)
        .first_result(10);
    let books = repo.find_by_named_query_as::<Book>(&request).await.unwrap();

    assert_eq!(titles(&books), sorted_titles()[10..].to_vec());
}

#[tokio::test]
async fn test_named_query_slice_consumes_lookahead_row() {
    let db = TestDatabase::new().await;
    let repo = db.repository();
    db.seed_books(&FIFTEEN_TITLES).await;

    let first = NamedQueryRequest::new(FIND_ALL_BOOKS).result_limit(10);
    let page = repo.find_slice_by_named_query_as::<Book>(&first).await.unwrap();
    assert_eq!(page.len(), 10);
    assert!(page.has_next);

    let second = first.first_result(10);
    let page = repo.find_slice_by_named_query_as::<Book>(&second).await.unwrap();
    assert_eq!(page.len(), 5);
    assert_eq!(page.first_result, 10);
    assert!(!page.has_next);
}

#[tokio::test]
async fn test_named_query_binds_parameters() {
    let db = TestDatabase::new().await;
    let repo = db.repository();
    db.seed_books(&FIFTEEN_TITLES).await;

    let request = NamedQueryRequest::new(FIND_BOOKS_BY_TITLE).parameter("title", "%an%");
    let books = repo.find_by_named_query_as::<Book>(&request).await.unwrap();

    assert_eq!(
        titles(&books),
        vec!["Candide", "Frankenstein", "Ivanhoe", "Jane Eyre", "Orlando"]
    );
}

#[tokio::test]
async fn test_named_query_binds_dates() {
    let db = TestDatabase::new().await;
    let repo = db.repository();

    let mut old = Book::new("Old");
    old.creation_date = NaiveDate::from_ymd_opt(2000, 1, 1);
    let mut new = Book::new("New");
    new.creation_date = NaiveDate::from_ymd_opt(2020, 1, 1);
    repo.create_or_update_all(vec![old, new]).await.unwrap();

    let request = NamedQueryRequest::new(FIND_BOOKS_CREATED_SINCE)
        .parameter("since", NaiveDate::from_ymd_opt(2010, 1, 1).unwrap());
    let books = repo.find_by_named_query_as::<Book>(&request).await.unwrap();

    assert_eq!(titles(&books), vec!["New"]);
}

#[tokio::test]
async fn test_named_query_untyped_rows() {
    let db = TestDatabase::new().await;
    let repo = db.repository();
    db.seed_books(&["A", "B", "C"]).await;

    let rows = repo
        .find_by_named_query(&NamedQueryRequest::new(COUNT_BOOKS))
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("total"), Some(&SqlValue::Integer(3)));
}

#[tokio::test]
async fn test_named_query_missing_parameter() {
    let db = TestDatabase::new().await;
    let repo = db.repository();

    let err = repo
        .find_by_named_query_as::<Book>(&NamedQueryRequest::new(FIND_BOOKS_BY_TITLE))
        .await
        .unwrap_err();
    assert!(matches!(err, StrataError::Binding(_)));
}

#[tokio::test]
async fn test_named_query_undeclared_parameter() {
    let db = TestDatabase::new().await;
    let repo = db.repository();

    let request = NamedQueryRequest::new(FIND_ALL_BOOKS).parameter("author", "Machado");
    let err = repo.find_by_named_query(&request).await.unwrap_err();
    assert!(matches!(err, StrataError::Binding(_)));
}

#[tokio::test]
async fn test_named_query_unknown_name() {
    let db = TestDatabase::new().await;
    let repo = db.repository();

    let err = repo
        .find_by_named_query(&NamedQueryRequest::new("findBooksByAuthor"))
        .await
        .unwrap_err();
    assert!(matches!(err, StrataError::UnknownQuery(ref name) if name == "findBooksByAuthor"));
}

#[tokio::test]
async fn test_repository_reopens_closed_context() {
    let db = TestDatabase::new().await;
    let repo = db.repository();
    repo.create(Book::new("Before")).await.unwrap();

    db.provider().close().await;

    // A fresh in-memory database comes back with an empty, migrated table.
    let books = repo
        .find_by_named_query_as::<Book>(&NamedQueryRequest::new(FIND_ALL_BOOKS))
        .await
        .unwrap();
    assert!(books.is_empty());
}

#[tokio::test]
async fn test_named_query_with_trailing_comment_is_paged() {
    let db = TestDatabase::new().await;
    db.seed_books(&FIFTEEN_TITLES).await;
    let queries = NamedQueryRegistry::new()
        .with_query(
            "booksAlphabetical",
            "SELECT id, title, creation_date FROM book ORDER BY title -- alphabetical",
        )
        .expect("Failed to register query");
    let repo = GenericRepository::new(db.provider(), queries);

    let request = NamedQueryRequest::new("booksAlphabetical").result_limit(3);
    let books = repo.find_by_named_query_as::<Book>(&request).await.unwrap();

    assert_eq!(titles(&books), sorted_titles()[..4].to_vec());
}

#[tokio::test]
async fn test_not_null_failure_is_constraint_violation() {
    let db = TestDatabase::new().await;
    let pool = db.provider().context().await.unwrap();

    let err: StrataError = sqlx::query("INSERT INTO book (title) VALUES ('Undated')")
        .execute(pool.inner())
        .await
        .unwrap_err()
        .into();

    assert!(matches!(err, StrataError::ConstraintViolation(ref m) if m.contains("creation_date")));
    assert_eq!(err.error_code(), "CONSTRAINT_VIOLATION");
    assert!(err.is_constraint_violation());
    assert_eq!(db.count_books().await, 0);
}

//! Common test infrastructure for repository integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use strata_config::{BatchMode, DatabaseConfig};
use strata_core::telemetry::{init_tracing, TelemetryConfig};
use strata_core::{Book, EntityId};
use strata_repository::{
    GenericRepository, NamedQueryRegistry, PersistenceContextProvider, TransactionalRepository,
};

/// A private in-memory database with the bundled migrations applied.
///
/// Each instance owns its own single-connection pool, so tests never share
/// rows.
pub struct TestDatabase {
    provider: Arc<PersistenceContextProvider>,
}

impl TestDatabase {
    /// Opens a fresh database.
    pub async fn new() -> Self {
        init_tracing(&TelemetryConfig {
            log_level: "warn,strata=debug".to_string(),
            ..TelemetryConfig::default()
        })
        .expect("Failed to initialize tracing");

        let provider = Arc::new(PersistenceContextProvider::new(DatabaseConfig::in_memory()));
        provider
            .context()
            .await
            .expect("Failed to open in-memory database");
        Self { provider }
    }

    /// Returns the context provider.
    pub fn provider(&self) -> Arc<PersistenceContextProvider> {
        Arc::clone(&self.provider)
    }

    /// A repository with the book queries registered.
    pub fn repository(&self) -> GenericRepository {
        let queries = NamedQueryRegistry::new()
            .with_entity::<Book>()
            .expect("Failed to register book queries");
        GenericRepository::new(self.provider(), queries)
    }

    /// Same as [`repository`](Self::repository) with atomic batches.
    pub fn atomic_repository(&self) -> GenericRepository {
        self.repository().with_batch_mode(BatchMode::Atomic)
    }

    pub fn transactional(&self) -> TransactionalRepository {
        TransactionalRepository::new(self.provider())
    }

    /// Number of rows in the book table.
    pub async fn count_books(&self) -> i64 {
        let pool = self.provider.context().await.expect("No context");
        sqlx::query_scalar("SELECT COUNT(*) FROM book")
            .fetch_one(pool.inner())
            .await
            .expect("Failed to count books")
    }

    /// Creates one book per title, in order, and returns their ids.
    pub async fn seed_books(&self, titles: &[&str]) -> Vec<EntityId> {
        let repo = self.repository();
        let mut ids = Vec::with_capacity(titles.len());
        for title in titles {
            let book = repo
                .create(Book::new(*title))
                .await
                .expect("Failed to seed book");
            ids.push(book.id.expect("Seeded book has no id"));
        }
        ids
    }
}

/// Fifteen titles whose alphabetical order differs from insertion order.
pub const FIFTEEN_TITLES: [&str; 15] = [
    "Orlando",
    "Beloved",
    "Kindred",
    "Atonement",
    "Nostromo",
    "Middlemarch",
    "Emma",
    "Jane Eyre",
    "Dracula",
    "Lolita",
    "Hamlet",
    "Candide",
    "Frankenstein",
    "Ivanhoe",
    "Germinal",
];

/// [`FIFTEEN_TITLES`] sorted ascending.
pub fn sorted_titles() -> Vec<&'static str> {
    let mut titles = FIFTEEN_TITLES.to_vec();
    titles.sort_unstable();
    titles
}

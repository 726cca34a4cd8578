//! Persistence context provider.
//!
//! A context is a live [`DatabasePool`]. The provider opens one lazily from
//! its factory, hands out shared handles to it, and reopens it if it has been
//! closed. Providers are constructed and injected explicitly; there is no
//! process-wide instance.

use crate::DatabasePool;
use async_trait::async_trait;
use std::sync::{Arc, OnceLock};
use strata_config::DatabaseConfig;
use strata_core::{StrataError, StrataResult};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Opens new persistence contexts.
#[async_trait]
pub trait ContextFactory: Send + Sync {
    /// Opens a fresh, ready-to-use context.
    async fn create_context(&self) -> StrataResult<DatabasePool>;
}

/// Opens SQLite pools from a [`DatabaseConfig`], running the bundled
/// migrations when configured to.
#[derive(Debug, Clone)]
pub struct SqliteContextFactory {
    config: DatabaseConfig,
}

impl SqliteContextFactory {
    #[must_use]
    pub fn new(config: DatabaseConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ContextFactory for SqliteContextFactory {
    async fn create_context(&self) -> StrataResult<DatabasePool> {
        let pool = DatabasePool::new(&self.config).await?;
        if self.config.run_migrations {
            pool.run_migrations().await?;
        }
        Ok(pool)
    }
}

/// Hands out the current persistence context, opening it on demand.
pub struct PersistenceContextProvider {
    factory: OnceLock<Arc<dyn ContextFactory>>,
    current: Mutex<Option<Arc<DatabasePool>>>,
}

impl PersistenceContextProvider {
    /// Creates a provider backed by a SQLite factory.
    #[must_use]
    pub fn new(config: DatabaseConfig) -> Self {
        Self::with_factory(Arc::new(SqliteContextFactory::new(config)))
    }

    /// Creates a provider backed by a custom factory.
    #[must_use]
    pub fn with_factory(factory: Arc<dyn ContextFactory>) -> Self {
        let provider = Self::uninitialized();
        let _ = provider.factory.set(factory);
        provider
    }

    /// Creates a provider with no factory. [`context`](Self::context) fails
    /// until [`initialize`](Self::initialize) is called.
    #[must_use]
    pub fn uninitialized() -> Self {
        Self {
            factory: OnceLock::new(),
            current: Mutex::new(None),
        }
    }

    /// Sets the SQLite factory. A factory can only be set once.
    pub fn initialize(&self, config: DatabaseConfig) -> StrataResult<()> {
        self.initialize_with(Arc::new(SqliteContextFactory::new(config)))
    }

    /// Sets a custom factory. A factory can only be set once.
    pub fn initialize_with(&self, factory: Arc<dyn ContextFactory>) -> StrataResult<()> {
        self.factory.set(factory).map_err(|_| {
            StrataError::configuration("Persistence context factory is already initialized")
        })
    }

    /// Whether a factory has been set.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.factory.get().is_some()
    }

    /// Returns the live context, opening a new one if there is none or the
    /// cached one has been closed.
    pub async fn context(&self) -> StrataResult<Arc<DatabasePool>> {
        let mut current = self.current.lock().await;

        if let Some(pool) = current.as_ref() {
            if !pool.is_closed() {
                return Ok(Arc::clone(pool));
            }
            debug!("Cached persistence context is closed, reopening");
        }

        let factory = self.factory.get().ok_or_else(|| {
            StrataError::Initialization("Persistence context factory was not initialized".to_string())
        })?;

        info!("Opening persistence context");
        let pool = Arc::new(factory.create_context().await?);
        *current = Some(Arc::clone(&pool));
        Ok(pool)
    }

    /// Closes the cached context, if any. The next call to
    /// [`context`](Self::context) opens a new one.
    pub async fn close(&self) {
        if let Some(pool) = self.current.lock().await.take() {
            pool.close().await;
        }
    }
}

impl std::fmt::Debug for PersistenceContextProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceContextProvider")
            .field("initialized", &self.is_initialized())
            .finish_non_exhaustive()
    }
}

//! Repository with explicit transaction demarcation.

use crate::{ops, EntityMapping, PersistenceContextProvider};
use std::sync::Arc;
use strata_core::StrataResult;
use tracing::{debug, warn};

/// Saves entities inside an explicitly managed transaction.
#[derive(Debug, Clone)]
pub struct TransactionalRepository {
    provider: Arc<PersistenceContextProvider>,
}

impl TransactionalRepository {
    #[must_use]
    pub fn new(provider: Arc<PersistenceContextProvider>) -> Self {
        Self { provider }
    }

    /// Inserts the entity and commits. On failure the transaction is rolled
    /// back and the insert error is returned as is.
    pub async fn save<T: EntityMapping>(&self, entity: T) -> StrataResult<T> {
        debug!(table = T::TABLE, "Saving entity in transaction");
        let context = self.provider.context().await?;
        let mut tx = context.inner().begin().await?;

        match ops::insert(&mut tx, entity).await {
            Ok(saved) => {
                tx.commit().await?;
                Ok(saved)
            }
            Err(err) => {
                debug!(
                    table = T::TABLE,
                    code = err.error_code(),
                    storage_error = err.is_storage_error(),
                    "Save failed, rolling back"
                );
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(
                        table = T::TABLE,
                        error = %rollback_err,
                        "Rollback failed after save error: {}",
                        err
                    );
                }
                Err(err)
            }
        }
    }
}

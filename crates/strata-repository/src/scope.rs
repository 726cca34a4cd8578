//! Connection scope for batch operations.

use sqlx::pool::PoolConnection;
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use strata_config::BatchMode;
use strata_core::StrataResult;
use tracing::warn;

/// A connection held for the duration of a batch. In atomic mode the batch
/// runs inside a transaction.
pub(crate) enum BatchScope {
    Independent(PoolConnection<Sqlite>),
    Atomic(Transaction<'static, Sqlite>),
}

impl BatchScope {
    pub(crate) async fn begin(pool: &SqlitePool, mode: BatchMode) -> StrataResult<Self> {
        Ok(match mode {
            BatchMode::Independent => Self::Independent(pool.acquire().await?),
            BatchMode::Atomic => Self::Atomic(pool.begin().await?),
        })
    }

    pub(crate) fn conn(&mut self) -> &mut SqliteConnection {
        match self {
            Self::Independent(conn) => &mut **conn,
            Self::Atomic(tx) => &mut **tx,
        }
    }

    /// Commits on success, rolls back on failure. A failed rollback is
    /// logged and the original error returned.
    pub(crate) async fn finish<R>(self, result: StrataResult<R>) -> StrataResult<R> {
        let Self::Atomic(tx) = self else {
            return result;
        };

        match result {
            Ok(value) => {
                tx.commit().await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "Batch rollback failed");
                }
                Err(err)
            }
        }
    }
}

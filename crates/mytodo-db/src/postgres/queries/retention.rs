use tracing::debug;

use mytodo_core::clock::Clock;
use mytodo_core::retention::PurgeReport;

use super::super::{pg_err, PostgresDatabase};
use crate::{DbError, PurgeOutcome};

impl PostgresDatabase {
    pub(crate) async fn pg_purge_expired(&self, clock: &Clock) -> Result<PurgeOutcome, DbError> {
        let mut tx = self.pool.begin().await.map_err(pg_err)?;

        let trashed: Vec<i64> = sqlx::query_scalar(
            "SELECT id FROM tasks WHERE is_deleted AND deleted_at < $1 FOR UPDATE",
        )
        .bind(clock.trash_cutoff())
        .fetch_all(&mut *tx)
        .await
        .map_err(pg_err)?;

        let completed: Vec<i64> = sqlx::query_scalar(
            "SELECT id FROM tasks
             WHERE is_completed AND completed_at < $1 AND NOT (id = ANY($2))
             FOR UPDATE",
        )
        .bind(clock.logbox_cutoff())
        .bind(&trashed)
        .fetch_all(&mut *tx)
        .await
        .map_err(pg_err)?;

        let all: Vec<i64> = trashed.iter().chain(completed.iter()).copied().collect();

        let store_keys: Vec<String> = sqlx::query_scalar(
            "SELECT store_key FROM attachments
             WHERE task_id = ANY($1) AND store_key IS NOT NULL",
        )
        .bind(&all)
        .fetch_all(&mut *tx)
        .await
        .map_err(pg_err)?;

        sqlx::query("DELETE FROM attachments WHERE task_id = ANY($1)")
            .bind(&all)
            .execute(&mut *tx)
            .await
            .map_err(pg_err)?;
        sqlx::query("DELETE FROM tasks WHERE id = ANY($1)")
            .bind(&all)
            .execute(&mut *tx)
            .await
            .map_err(pg_err)?;
        tx.commit().await.map_err(pg_err)?;

        let report = PurgeReport {
            trashed_purged: trashed.len() as u64,
            completed_purged: completed.len() as u64,
        };
        debug!(?report, blobs = store_keys.len(), "postgres purge finished");
        Ok(PurgeOutcome { report, store_keys })
    }
}

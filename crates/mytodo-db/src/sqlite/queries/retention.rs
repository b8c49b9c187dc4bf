use chrono::{DateTime, Utc};
use rusqlite::params;
use tracing::debug;

use mytodo_core::clock::Clock;
use mytodo_core::retention::PurgeReport;

use super::super::{SqliteDatabase, SqliteResultExt};
use crate::{DbError, PurgeOutcome};

impl SqliteDatabase {
    pub fn purge_expired_sync(&self, clock: &Clock) -> Result<PurgeOutcome, DbError> {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction().to_db()?;

            let ids_where = |sql: &str, cutoff: DateTime<Utc>| -> Result<Vec<i64>, DbError> {
                let mut stmt = tx.prepare(sql).to_db()?;
                let ids = stmt
                    .query_map(params![cutoff], |row| row.get(0))
                    .to_db()?
                    .collect::<Result<Vec<_>, _>>()
                    .to_db()?;
                Ok(ids)
            };

            let trashed = ids_where(
                "SELECT id FROM tasks WHERE is_deleted AND deleted_at < ?1",
                clock.trash_cutoff(),
            )?;
            let completed: Vec<i64> = ids_where(
                "SELECT id FROM tasks WHERE is_completed AND completed_at < ?1",
                clock.logbox_cutoff(),
            )?
            .into_iter()
            .filter(|id| !trashed.contains(id))
            .collect();

            let mut store_keys = Vec::new();
            for id in trashed.iter().chain(completed.iter()) {
                let mut stmt = tx
                    .prepare(
                        "SELECT store_key FROM attachments
                         WHERE task_id = ?1 AND store_key IS NOT NULL",
                    )
                    .to_db()?;
                let keys = stmt
                    .query_map(params![id], |row| row.get::<_, String>(0))
                    .to_db()?
                    .collect::<Result<Vec<_>, _>>()
                    .to_db()?;
                store_keys.extend(keys);

                tx.execute("DELETE FROM attachments WHERE task_id = ?1", params![id])
                    .to_db()?;
                tx.execute("DELETE FROM tasks WHERE id = ?1", params![id])
                    .to_db()?;
            }
            tx.commit().to_db()?;

            let report = PurgeReport {
                trashed_purged: trashed.len() as u64,
                completed_purged: completed.len() as u64,
            };
            debug!(?report, blobs = store_keys.len(), "sqlite purge finished");
            Ok(PurgeOutcome { report, store_keys })
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use mytodo_core::task::{CreateTask, UpdateTask};

    use super::*;

    #[test]
    fn fresh_trash_survives_and_old_trash_goes() {
        let db = SqliteDatabase::open_in_memory().unwrap();
        let task = db.create_task_sync(&CreateTask::new("t")).unwrap();
        db.soft_delete_task_sync(task.id).unwrap();

        let now = Clock::local();
        let outcome = db.purge_expired_sync(&now).unwrap();
        assert_eq!(outcome.report.total(), 0);

        let later = Clock::at(now.now + Duration::days(31));
        let outcome = db.purge_expired_sync(&later).unwrap();
        assert_eq!(outcome.report.trashed_purged, 1);
        assert!(db.get_task_sync(task.id).is_err());
    }

    #[test]
    fn completed_and_trashed_counts_once() {
        let db = SqliteDatabase::open_in_memory().unwrap();
        let task = db.create_task_sync(&CreateTask::new("t")).unwrap();
        db.update_task_sync(task.id, &UpdateTask::completed(true)).unwrap();
        db.soft_delete_task_sync(task.id).unwrap();

        let later = Clock::at(Clock::local().now + Duration::days(200));
        let outcome = db.purge_expired_sync(&later).unwrap();
        assert_eq!(
            outcome.report,
            PurgeReport {
                trashed_purged: 1,
                completed_purged: 0
            }
        );
    }
}

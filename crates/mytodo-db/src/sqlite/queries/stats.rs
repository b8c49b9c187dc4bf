use rusqlite::params_from_iter;

use mytodo_core::clock::Clock;
use mytodo_core::stats::TaskStats;

use super::super::{SqliteDatabase, SqliteResultExt};
use crate::filter::{self, Dialect, STAT_SCOPES};
use crate::DbError;

impl SqliteDatabase {
    pub fn task_stats_sync(&self, clock: &Clock) -> Result<TaskStats, DbError> {
        self.with_conn(|conn| {
            let mut counts = [0i64; 7];
            for (slot, scope) in counts.iter_mut().zip(STAT_SCOPES) {
                let pred = filter::predicate(scope, clock, Dialect::Sqlite, 1);
                *slot = conn
                    .query_row(
                        &format!("SELECT COUNT(*) FROM tasks t WHERE {}", pred.sql),
                        params_from_iter(pred.params.iter()),
                        |row| row.get(0),
                    )
                    .to_db()?;
            }
            Ok(filter::stats_from_counts(counts))
        })
    }
}

use mytodo_core::clock::Clock;
use mytodo_core::stats::TaskStats;

use super::super::{pg_err, PostgresDatabase};
use crate::filter::{self, Dialect, Param, STAT_SCOPES};
use crate::DbError;

impl PostgresDatabase {
    pub(crate) async fn pg_task_stats(&self, clock: &Clock) -> Result<TaskStats, DbError> {
        let mut counts = [0i64; 7];
        for (slot, scope) in counts.iter_mut().zip(STAT_SCOPES) {
            let pred = filter::predicate(scope, clock, Dialect::Postgres, 1);
            let sql = format!("SELECT COUNT(*) FROM tasks t WHERE {}", pred.sql);
            let mut query = sqlx::query_scalar::<_, i64>(&sql);
            for p in &pred.params {
                query = match *p {
                    Param::Int(v) => query.bind(v),
                    Param::Date(d) => query.bind(d),
                    Param::Timestamp(t) => query.bind(t),
                };
            }
            *slot = query.fetch_one(&self.pool).await.map_err(pg_err)?;
        }
        Ok(filter::stats_from_counts(counts))
    }
}

pub(crate) mod migrations;
pub mod queries;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use mytodo_core::attachment::{Attachment, NewAttachment};
use mytodo_core::clock::Clock;
use mytodo_core::section::{CreateSection, Section, UpdateSection};
use mytodo_core::stats::TaskStats;
use mytodo_core::task::{CreateTask, Task, UpdateTask};
use mytodo_core::view::View;

use crate::{Database, DbError, PurgeOutcome};

/// Map a sqlx::Error into a DbError. Constraint violations are the caller's
/// fault; everything else is internal.
pub(crate) fn pg_err(e: sqlx::Error) -> DbError {
    match &e {
        sqlx::Error::Database(db)
            if db.is_foreign_key_violation() || db.is_check_violation() =>
        {
            DbError::InvalidInput(db.message().to_string())
        }
        _ => DbError::Internal(e.to_string()),
    }
}

/// Create a DbError::NotFound with the given entity description.
pub(crate) fn pg_not_found(entity: &str) -> DbError {
    DbError::NotFound(entity.to_string())
}

#[derive(Clone)]
pub struct PostgresDatabase {
    pub(crate) pool: PgPool,
}

impl PostgresDatabase {
    /// Connect to a Postgres database and run migrations.
    pub async fn connect(url: &str) -> Result<Self, DbError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(url)
            .await
            .map_err(pg_err)?;

        let db = Self { pool };
        migrations::run(&db.pool).await?;
        Ok(db)
    }
}

#[async_trait]
impl Database for PostgresDatabase {
    // -- Sections --
    async fn list_sections(&self) -> Result<Vec<Section>, DbError> {
        self.pg_list_sections().await
    }
    async fn get_section(&self, id: i64) -> Result<Section, DbError> {
        self.pg_get_section(id).await
    }
    async fn create_section(&self, input: &CreateSection) -> Result<Section, DbError> {
        self.pg_create_section(input).await
    }
    async fn update_section(&self, id: i64, update: &UpdateSection) -> Result<Section, DbError> {
        self.pg_update_section(id, update).await
    }
    async fn reorder_sections(&self, ids: &[i64]) -> Result<Vec<Section>, DbError> {
        self.pg_reorder_sections(ids).await
    }
    async fn delete_section(&self, id: i64) -> Result<(), DbError> {
        self.pg_delete_section(id).await
    }

    // -- Tasks --
    async fn list_tasks(&self, view: &View, clock: &Clock) -> Result<Vec<Task>, DbError> {
        self.pg_list_tasks(view, clock).await
    }
    async fn get_task(&self, id: i64) -> Result<Task, DbError> {
        self.pg_get_task(id).await
    }
    async fn create_task(&self, input: &CreateTask) -> Result<Task, DbError> {
        self.pg_create_task(input).await
    }
    async fn update_task(&self, id: i64, update: &UpdateTask) -> Result<Task, DbError> {
        self.pg_update_task(id, update).await
    }
    async fn soft_delete_task(&self, id: i64) -> Result<Task, DbError> {
        self.pg_soft_delete_task(id).await
    }
    async fn restore_task(&self, id: i64) -> Result<Task, DbError> {
        self.pg_restore_task(id).await
    }
    async fn delete_task(&self, id: i64) -> Result<Vec<Attachment>, DbError> {
        self.pg_delete_task(id).await
    }
    async fn mark_task_reminded(&self, id: i64, today: NaiveDate) -> Result<Task, DbError> {
        self.pg_mark_task_reminded(id, today).await
    }

    // -- Attachments --
    async fn list_attachments(&self, task_id: i64) -> Result<Vec<Attachment>, DbError> {
        self.pg_list_attachments(task_id).await
    }
    async fn get_attachment(&self, id: i64) -> Result<Attachment, DbError> {
        self.pg_get_attachment(id).await
    }
    async fn create_attachment(&self, input: &NewAttachment) -> Result<Attachment, DbError> {
        self.pg_create_attachment(input).await
    }
    async fn delete_attachment(&self, id: i64) -> Result<Attachment, DbError> {
        self.pg_delete_attachment(id).await
    }

    // -- Stats & retention --
    async fn task_stats(&self, clock: &Clock) -> Result<TaskStats, DbError> {
        self.pg_task_stats(clock).await
    }
    async fn purge_expired(&self, clock: &Clock) -> Result<PurgeOutcome, DbError> {
        self.pg_purge_expired(clock).await
    }
}

pub(crate) mod migrations;
pub mod queries;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use rusqlite::types::ToSqlOutput;
use rusqlite::{Connection, ErrorCode, ToSql};

use mytodo_core::attachment::{Attachment, NewAttachment};
use mytodo_core::clock::Clock;
use mytodo_core::section::{CreateSection, Section, UpdateSection};
use mytodo_core::stats::TaskStats;
use mytodo_core::task::{CreateTask, Task, UpdateTask};
use mytodo_core::view::View;

use crate::filter::Param;
use crate::{Database, DbConfig, DbError, PurgeOutcome};

/// Extension trait that converts `rusqlite::Result<T>` into `Result<T, DbError>`.
pub(crate) trait SqliteResultExt<T> {
    fn to_db(self) -> Result<T, DbError>;
}

impl<T> SqliteResultExt<T> for rusqlite::Result<T> {
    fn to_db(self) -> Result<T, DbError> {
        self.map_err(map_sqlite_err)
    }
}

impl ToSql for Param {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            Param::Int(v) => v.to_sql(),
            Param::Date(d) => d.to_sql(),
            Param::Timestamp(t) => t.to_sql(),
        }
    }
}

#[derive(Clone)]
pub struct SqliteDatabase {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteDatabase {
    pub fn open(config: &DbConfig) -> Result<Self, DbError> {
        let path = config
            .sqlite_path
            .as_deref()
            .map(PathBuf::from)
            .unwrap_or_else(|| crate::data_dir().join("mytodo.db"));
        std::fs::create_dir_all(path.parent().unwrap_or(Path::new(".")))?;
        Self::open_path(&path)
    }

    pub fn open_path(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path).to_db()?;
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA foreign_keys=ON;
             PRAGMA busy_timeout=5000;",
        )
        .to_db()?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory().to_db()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;").to_db()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, DbError> {
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.with_conn(migrations::run)?;
        Ok(db)
    }

    pub(crate) fn with_conn<F, T>(&self, f: F) -> Result<T, DbError>
    where
        F: FnOnce(&Connection) -> Result<T, DbError>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|_| DbError::Internal("lock poisoned".into()))?;
        f(&conn)
    }

    /// Run a synchronous query method on the blocking pool.
    async fn blocking<F, T>(&self, f: F) -> Result<T, DbError>
    where
        F: FnOnce(&SqliteDatabase) -> Result<T, DbError> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.clone();
        tokio::task::spawn_blocking(move || f(&db))
            .await
            .map_err(|e| DbError::Internal(e.to_string()))?
    }
}

/// Map a `rusqlite::Error` into a `DbError`. Constraint violations (bad
/// foreign keys, CHECK failures) are the caller's fault.
pub(crate) fn map_sqlite_err(e: rusqlite::Error) -> DbError {
    match e {
        rusqlite::Error::SqliteFailure(err, msg) if err.code == ErrorCode::ConstraintViolation => {
            DbError::InvalidInput(msg.unwrap_or_else(|| err.to_string()))
        }
        other => DbError::Internal(other.to_string()),
    }
}

/// `QueryReturnedNoRows` becomes `NotFound(what)`.
pub(crate) fn not_found_or(what: impl Into<String>) -> impl FnOnce(rusqlite::Error) -> DbError {
    let what = what.into();
    move |e| match e {
        rusqlite::Error::QueryReturnedNoRows => DbError::NotFound(what),
        other => map_sqlite_err(other),
    }
}


#[async_trait]
impl Database for SqliteDatabase {
    // -- Sections --
    async fn list_sections(&self) -> Result<Vec<Section>, DbError> {
        self.blocking(|db| db.list_sections_sync()).await
    }
    async fn get_section(&self, id: i64) -> Result<Section, DbError> {
        self.blocking(move |db| db.get_section_sync(id)).await
    }
    async fn create_section(&self, input: &CreateSection) -> Result<Section, DbError> {
        let input = input.clone();
        self.blocking(move |db| db.create_section_sync(&input)).await
    }
    async fn update_section(&self, id: i64, update: &UpdateSection) -> Result<Section, DbError> {
        let update = update.clone();
        self.blocking(move |db| db.update_section_sync(id, &update))
            .await
    }
    async fn reorder_sections(&self, ids: &[i64]) -> Result<Vec<Section>, DbError> {
        let ids = ids.to_vec();
        self.blocking(move |db| db.reorder_sections_sync(&ids)).await
    }
    async fn delete_section(&self, id: i64) -> Result<(), DbError> {
        self.blocking(move |db| db.delete_section_sync(id)).await
    }

    // -- Tasks --
    async fn list_tasks(&self, view: &View, clock: &Clock) -> Result<Vec<Task>, DbError> {
        let (view, clock) = (*view, *clock);
        self.blocking(move |db| db.list_tasks_sync(&view, &clock))
            .await
    }
    async fn get_task(&self, id: i64) -> Result<Task, DbError> {
        self.blocking(move |db| db.get_task_sync(id)).await
    }
    async fn create_task(&self, input: &CreateTask) -> Result<Task, DbError> {
        let input = input.clone();
        self.blocking(move |db| db.create_task_sync(&input)).await
    }
    async fn update_task(&self, id: i64, update: &UpdateTask) -> Result<Task, DbError> {
        let update = update.clone();
        self.blocking(move |db| db.update_task_sync(id, &update)).await
    }
    async fn soft_delete_task(&self, id: i64) -> Result<Task, DbError> {
        self.blocking(move |db| db.soft_delete_task_sync(id)).await
    }
    async fn restore_task(&self, id: i64) -> Result<Task, DbError> {
        self.blocking(move |db| db.restore_task_sync(id)).await
    }
    async fn delete_task(&self, id: i64) -> Result<Vec<Attachment>, DbError> {
        self.blocking(move |db| db.delete_task_sync(id)).await
    }
    async fn mark_task_reminded(&self, id: i64, today: NaiveDate) -> Result<Task, DbError> {
        self.blocking(move |db| db.mark_task_reminded_sync(id, today))
            .await
    }

    // -- Attachments --
    async fn list_attachments(&self, task_id: i64) -> Result<Vec<Attachment>, DbError> {
        self.blocking(move |db| db.list_attachments_sync(task_id))
            .await
    }
    async fn get_attachment(&self, id: i64) -> Result<Attachment, DbError> {
        self.blocking(move |db| db.get_attachment_sync(id)).await
    }
    async fn create_attachment(&self, input: &NewAttachment) -> Result<Attachment, DbError> {
        let input = input.clone();
        self.blocking(move |db| db.create_attachment_sync(&input))
            .await
    }
    async fn delete_attachment(&self, id: i64) -> Result<Attachment, DbError> {
        self.blocking(move |db| db.delete_attachment_sync(id)).await
    }

    // -- Stats & retention --
    async fn task_stats(&self, clock: &Clock) -> Result<TaskStats, DbError> {
        let clock = *clock;
        self.blocking(move |db| db.task_stats_sync(&clock)).await
    }
    async fn purge_expired(&self, clock: &Clock) -> Result<PurgeOutcome, DbError> {
        let clock = *clock;
        self.blocking(move |db| db.purge_expired_sync(&clock)).await
    }
}

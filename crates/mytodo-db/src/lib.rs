pub(crate) mod filter;
#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use mytodo_core::attachment::{Attachment, NewAttachment};
use mytodo_core::clock::Clock;
use mytodo_core::retention::PurgeReport;
use mytodo_core::section::{CreateSection, Section, UpdateSection};
use mytodo_core::stats::TaskStats;
use mytodo_core::task::{CreateTask, Task, UpdateTask};
use mytodo_core::view::View;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("database error: {0}")]
    Internal(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of a retention sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PurgeOutcome {
    pub report: PurgeReport,
    /// Object-store keys of the attachments removed with the purged tasks.
    pub store_keys: Vec<String>,
}

/// Storage backend for sections, tasks and attachments.
///
/// Callers validate input; implementations only enforce existence and
/// referential rules.
#[async_trait]
pub trait Database: Send + Sync {
    // -- Sections --
    async fn list_sections(&self) -> Result<Vec<Section>, DbError>;
    async fn get_section(&self, id: i64) -> Result<Section, DbError>;
    async fn create_section(&self, input: &CreateSection) -> Result<Section, DbError>;
    async fn update_section(&self, id: i64, update: &UpdateSection) -> Result<Section, DbError>;
    /// Rewrite `sort_order` to 1..n in the given order. `ids` must name every
    /// section exactly once.
    async fn reorder_sections(&self, ids: &[i64]) -> Result<Vec<Section>, DbError>;
    /// Remove a section; its tasks keep existing with no section.
    async fn delete_section(&self, id: i64) -> Result<(), DbError>;

    // -- Tasks --
    async fn list_tasks(&self, view: &View, clock: &Clock) -> Result<Vec<Task>, DbError>;
    async fn get_task(&self, id: i64) -> Result<Task, DbError>;
    async fn create_task(&self, input: &CreateTask) -> Result<Task, DbError>;
    async fn update_task(&self, id: i64, update: &UpdateTask) -> Result<Task, DbError>;
    async fn soft_delete_task(&self, id: i64) -> Result<Task, DbError>;
    async fn restore_task(&self, id: i64) -> Result<Task, DbError>;
    /// Remove the row and its attachments. Returns the removed attachments so
    /// the caller can drop their blobs.
    async fn delete_task(&self, id: i64) -> Result<Vec<Attachment>, DbError>;
    async fn mark_task_reminded(&self, id: i64, today: NaiveDate) -> Result<Task, DbError>;

    // -- Attachments --
    async fn list_attachments(&self, task_id: i64) -> Result<Vec<Attachment>, DbError>;
    async fn get_attachment(&self, id: i64) -> Result<Attachment, DbError>;
    async fn create_attachment(&self, input: &NewAttachment) -> Result<Attachment, DbError>;
    async fn delete_attachment(&self, id: i64) -> Result<Attachment, DbError>;

    // -- Stats & retention --
    async fn task_stats(&self, clock: &Clock) -> Result<TaskStats, DbError>;
    async fn purge_expired(&self, clock: &Clock) -> Result<PurgeOutcome, DbError>;
}

/// Which backend to open.
#[derive(Debug, Clone, Default)]
pub struct DbConfig {
    pub sqlite_path: Option<String>,
    pub database_url: Option<String>,
}

impl DbConfig {
    pub fn from_env() -> Self {
        Self {
            sqlite_path: std::env::var("MYTODO_DB_PATH").ok(),
            database_url: std::env::var("MYTODO_DATABASE_URL").ok(),
        }
    }
}

/// Open the configured backend: Postgres when a URL is set, SQLite otherwise.
pub async fn open_database(config: &DbConfig) -> Result<Arc<dyn Database>, DbError> {
    if let Some(url) = config.database_url.as_deref() {
        #[cfg(feature = "postgres")]
        {
            tracing::info!("connecting to postgres");
            return Ok(Arc::new(postgres::PostgresDatabase::connect(url).await?));
        }
        #[cfg(not(feature = "postgres"))]
        {
            let _ = url;
            return Err(DbError::Internal(
                "a database URL was given but the 'postgres' feature is not enabled".into(),
            ));
        }
    }

    #[cfg(feature = "sqlite")]
    {
        let db = SqliteDatabase::open(config)?;
        Ok(Arc::new(db))
    }
    #[cfg(not(feature = "sqlite"))]
    {
        Err(DbError::Internal(
            "no database URL given and the 'sqlite' feature is not enabled".into(),
        ))
    }
}

/// `$XDG_DATA_HOME/mytodo` or `~/.local/share/mytodo`.
pub fn data_dir() -> PathBuf {
    let base = if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        PathBuf::from(xdg)
    } else if let Some(home) = std::env::var_os("HOME") {
        PathBuf::from(home).join(".local/share")
    } else {
        PathBuf::from(".")
    };
    base.join("mytodo")
}

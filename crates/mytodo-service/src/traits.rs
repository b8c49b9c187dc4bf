use async_trait::async_trait;
use bytes::Bytes;
use mytodo_core::attachment::{Attachment, AttachmentUpload};
use mytodo_core::retention::PurgeReport;
use mytodo_core::section::{CreateSection, Section, UpdateSection};
use mytodo_core::stats::TaskStats;
use mytodo_core::task::{CreateTask, Task, UpdateTask};
use mytodo_core::view::View;
use mytodo_core::ValidationError;
use mytodo_db::DbError;
use mytodo_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ValidationError> for ServiceError {
    fn from(e: ValidationError) -> Self {
        ServiceError::InvalidInput(e.to_string())
    }
}

impl From<DbError> for ServiceError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound(msg) => ServiceError::NotFound(msg),
            DbError::InvalidInput(msg) => ServiceError::InvalidInput(msg),
            other => ServiceError::Internal(other.to_string()),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(msg) => ServiceError::NotFound(msg),
            StoreError::InvalidKey(msg) => ServiceError::InvalidInput(msg),
            StoreError::Internal(msg) => ServiceError::Internal(msg),
        }
    }
}

/// Everything the todo app can do.
///
/// The HTTP server and the TUI program against this trait.
/// `LocalService` owns the database and object store directly.
/// `HttpService` talks to a running mytodo-server.
#[async_trait]
pub trait TodoService: Send + Sync {
    // -- Sections --
    async fn list_sections(&self) -> Result<Vec<Section>, ServiceError>;
    async fn create_section(&self, input: &CreateSection) -> Result<Section, ServiceError>;
    async fn update_section(
        &self,
        id: i64,
        update: &UpdateSection,
    ) -> Result<Section, ServiceError>;
    async fn reorder_sections(&self, ids: &[i64]) -> Result<Vec<Section>, ServiceError>;
    async fn delete_section(&self, id: i64) -> Result<(), ServiceError>;

    // -- Tasks --
    async fn list_tasks(&self, view: &View) -> Result<Vec<Task>, ServiceError>;
    async fn get_task(&self, id: i64) -> Result<Task, ServiceError>;
    async fn create_task(&self, input: &CreateTask) -> Result<Task, ServiceError>;
    async fn update_task(&self, id: i64, update: &UpdateTask) -> Result<Task, ServiceError>;
    /// Move to trash, or remove for good (with attachments) when `permanent`.
    async fn delete_task(&self, id: i64, permanent: bool) -> Result<(), ServiceError>;
    async fn restore_task(&self, id: i64) -> Result<Task, ServiceError>;
    async fn mark_task_reminded(&self, id: i64) -> Result<Task, ServiceError>;

    // -- Attachments --
    async fn list_attachments(&self, task_id: i64) -> Result<Vec<Attachment>, ServiceError>;
    async fn add_attachment(
        &self,
        task_id: i64,
        upload: AttachmentUpload,
    ) -> Result<Attachment, ServiceError>;
    async fn delete_attachment(&self, id: i64) -> Result<(), ServiceError>;
    async fn read_file(&self, key: &str) -> Result<Bytes, ServiceError>;

    // -- Stats & retention --
    async fn task_stats(&self) -> Result<TaskStats, ServiceError>;
    async fn cleanup(&self) -> Result<PurgeReport, ServiceError>;
}

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use mytodo_core::attachment::{classify_upload, Attachment, AttachmentUpload, NewAttachment};
use mytodo_core::clock::Clock;
use mytodo_core::retention::PurgeReport;
use mytodo_core::section::{CreateSection, Section, UpdateSection};
use mytodo_core::stats::TaskStats;
use mytodo_core::task::{normalize_reminder, CreateTask, Task, UpdateTask};
use mytodo_core::view::View;
use mytodo_core::ValidationError;
use mytodo_db::{Database, DbError};
use mytodo_store::{attachment_key, validate_key, ObjectStore};
use tracing::{info, warn};

use crate::{ServiceError, TodoService};

/// Direct implementation over a database and an object store.
pub struct LocalService {
    db: Arc<dyn Database>,
    store: Arc<dyn ObjectStore>,
    clock: Option<Clock>,
}

impl LocalService {
    pub fn new(db: Arc<dyn Database>, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            db,
            store,
            clock: None,
        }
    }

    /// Evaluate views, stats and sweeps against a fixed "now".
    pub fn with_fixed_clock(mut self, clock: Clock) -> Self {
        self.clock = Some(clock);
        self
    }

    fn clock(&self) -> Clock {
        self.clock.unwrap_or_else(Clock::local)
    }

    async fn ensure_section(&self, id: i64) -> Result<(), ServiceError> {
        match self.db.get_section(id).await {
            Ok(_) => Ok(()),
            Err(DbError::NotFound(_)) => Err(ServiceError::InvalidInput(format!(
                "section {id} does not exist"
            ))),
            Err(e) => Err(e.into()),
        }
    }

    /// Blob removal never fails the request that triggered it.
    async fn discard_blob(&self, key: &str) {
        if let Err(e) = self.store.delete(key).await {
            warn!(key, error = %e, "failed to delete attachment blob");
        }
    }
}

fn clean_title(title: &str) -> Result<String, ValidationError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    Ok(title.to_string())
}

fn clean_section_name(name: &str) -> Result<String, ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptySectionName);
    }
    Ok(name.to_string())
}

#[async_trait]
impl TodoService for LocalService {
    async fn list_sections(&self) -> Result<Vec<Section>, ServiceError> {
        Ok(self.db.list_sections().await?)
    }

    async fn create_section(&self, input: &CreateSection) -> Result<Section, ServiceError> {
        let input = CreateSection {
            name: clean_section_name(&input.name)?,
            icon: Some(input.icon_or_default().to_string()),
        };
        Ok(self.db.create_section(&input).await?)
    }

    async fn update_section(
        &self,
        id: i64,
        update: &UpdateSection,
    ) -> Result<Section, ServiceError> {
        if update.is_empty() {
            return Err(ValidationError::EmptyUpdate.into());
        }
        let mut update = update.clone();
        if let Some(name) = &update.name {
            update.name = Some(clean_section_name(name)?);
        }
        Ok(self.db.update_section(id, &update).await?)
    }

    async fn reorder_sections(&self, ids: &[i64]) -> Result<Vec<Section>, ServiceError> {
        Ok(self.db.reorder_sections(ids).await?)
    }

    async fn delete_section(&self, id: i64) -> Result<(), ServiceError> {
        Ok(self.db.delete_section(id).await?)
    }

    async fn list_tasks(&self, view: &View) -> Result<Vec<Task>, ServiceError> {
        Ok(self.db.list_tasks(view, &self.clock()).await?)
    }

    async fn get_task(&self, id: i64) -> Result<Task, ServiceError> {
        Ok(self.db.get_task(id).await?)
    }

    async fn create_task(&self, input: &CreateTask) -> Result<Task, ServiceError> {
        let mut input = input.clone();
        input.title = clean_title(&input.title)?;
        input.reminder_day = normalize_reminder(input.reminder_type, input.reminder_day)?;
        if let Some(section_id) = input.section_id {
            self.ensure_section(section_id).await?;
        }
        Ok(self.db.create_task(&input).await?)
    }

    async fn update_task(&self, id: i64, update: &UpdateTask) -> Result<Task, ServiceError> {
        if update.is_empty() {
            return Err(ValidationError::EmptyUpdate.into());
        }
        let mut update = update.clone();
        if let Some(title) = &update.title {
            update.title = Some(clean_title(title)?);
        }
        if let Some(Some(section_id)) = update.section_id {
            self.ensure_section(section_id).await?;
        }
        let touches_reminder = update.reminder_type.is_some() || update.reminder_day.is_some();
        if update.is_completed.is_some() || touches_reminder {
            let current = self.db.get_task(id).await?;
            // Trashed tasks only leave the trash through restore.
            if current.is_deleted && update.is_completed.is_some() {
                return Err(ValidationError::CompletionInTrash(id).into());
            }
            if touches_reminder {
                // The pair is validated together, filling the missing half
                // from the stored task.
                let kind = update.reminder_type.unwrap_or(current.reminder_type);
                let day = update.reminder_day.unwrap_or(current.reminder_day);
                update.reminder_type = Some(kind);
                update.reminder_day = Some(normalize_reminder(kind, day)?);
            }
        }
        Ok(self.db.update_task(id, &update).await?)
    }

    async fn delete_task(&self, id: i64, permanent: bool) -> Result<(), ServiceError> {
        if !permanent {
            self.db.soft_delete_task(id).await?;
            return Ok(());
        }
        let attachments = self.db.delete_task(id).await?;
        for key in attachments.iter().filter_map(|a| a.store_key.as_deref()) {
            self.discard_blob(key).await;
        }
        Ok(())
    }

    async fn restore_task(&self, id: i64) -> Result<Task, ServiceError> {
        Ok(self.db.restore_task(id).await?)
    }

    async fn mark_task_reminded(&self, id: i64) -> Result<Task, ServiceError> {
        Ok(self.db.mark_task_reminded(id, self.clock().today).await?)
    }

    async fn list_attachments(&self, task_id: i64) -> Result<Vec<Attachment>, ServiceError> {
        self.db.get_task(task_id).await?;
        Ok(self.db.list_attachments(task_id).await?)
    }

    async fn add_attachment(
        &self,
        task_id: i64,
        upload: AttachmentUpload,
    ) -> Result<Attachment, ServiceError> {
        match upload {
            AttachmentUpload::Url(url) => {
                let url = url.trim();
                if url.is_empty() {
                    return Err(ServiceError::InvalidInput("url must not be empty".into()));
                }
                self.db.get_task(task_id).await?;
                Ok(self
                    .db
                    .create_attachment(&NewAttachment::link(task_id, url))
                    .await?)
            }
            AttachmentUpload::File(file) => {
                let kind = classify_upload(&file.content_type, file.data.len())?;
                self.db.get_task(task_id).await?;

                let name = match file.filename.trim() {
                    "" => "file",
                    name => name,
                };
                let key = attachment_key(task_id, Utc::now().timestamp_millis(), name);
                self.store.put(&key, file.data).await?;

                match self
                    .db
                    .create_attachment(&NewAttachment::file(task_id, kind, name, &key))
                    .await
                {
                    Ok(attachment) => Ok(attachment),
                    Err(e) => {
                        self.discard_blob(&key).await;
                        Err(e.into())
                    }
                }
            }
        }
    }

    async fn delete_attachment(&self, id: i64) -> Result<(), ServiceError> {
        let attachment = self.db.delete_attachment(id).await?;
        if let Some(key) = attachment.store_key.as_deref() {
            self.discard_blob(key).await;
        }
        Ok(())
    }

    async fn read_file(&self, key: &str) -> Result<Bytes, ServiceError> {
        validate_key(key)?;
        Ok(self.store.get(key).await?)
    }

    async fn task_stats(&self) -> Result<TaskStats, ServiceError> {
        Ok(self.db.task_stats(&self.clock()).await?)
    }

    async fn cleanup(&self) -> Result<PurgeReport, ServiceError> {
        let outcome = self.db.purge_expired(&self.clock()).await?;
        for key in &outcome.store_keys {
            self.discard_blob(key).await;
        }
        info!(
            trashed = outcome.report.trashed_purged,
            completed = outcome.report.completed_purged,
            blobs = outcome.store_keys.len(),
            "retention sweep finished"
        );
        Ok(outcome.report)
    }
}

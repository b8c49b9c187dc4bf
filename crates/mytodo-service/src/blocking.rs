use bytes::Bytes;
use mytodo_core::attachment::{Attachment, AttachmentUpload};
use mytodo_core::retention::PurgeReport;
use mytodo_core::section::{CreateSection, Section, UpdateSection};
use mytodo_core::stats::TaskStats;
use mytodo_core::task::{CreateTask, Task, UpdateTask};
use mytodo_core::view::View;
use tokio::runtime::Runtime;

use crate::{HttpService, ServiceError, TodoService};

/// Blocking wrapper around the async `HttpService`.
///
/// Owns a tokio runtime and uses `block_on()` for each call.
/// Designed for sync callers like the TUI.
pub struct BlockingHttpService {
    inner: HttpService,
    rt: Runtime,
}

impl BlockingHttpService {
    pub fn new(base_url: &str) -> Result<Self, ServiceError> {
        Self::from_inner(HttpService::new(base_url))
    }

    pub fn with_api_key(base_url: &str, key: String) -> Result<Self, ServiceError> {
        Self::from_inner(HttpService::with_api_key(base_url, key))
    }

    fn from_inner(inner: HttpService) -> Result<Self, ServiceError> {
        let rt = Runtime::new()
            .map_err(|e| ServiceError::Internal(format!("failed to create tokio runtime: {e}")))?;
        Ok(Self { inner, rt })
    }

    pub fn base_url(&self) -> &str {
        self.inner.base_url()
    }

    pub fn health_check(&self) -> Result<(), ServiceError> {
        self.rt.block_on(self.inner.health_check())
    }

    // -- Trait method delegates --

    pub fn list_sections(&self) -> Result<Vec<Section>, ServiceError> {
        self.rt.block_on(self.inner.list_sections())
    }

    pub fn create_section(&self, input: &CreateSection) -> Result<Section, ServiceError> {
        self.rt.block_on(self.inner.create_section(input))
    }

    pub fn update_section(
        &self,
        id: i64,
        update: &UpdateSection,
    ) -> Result<Section, ServiceError> {
        self.rt.block_on(self.inner.update_section(id, update))
    }

    pub fn reorder_sections(&self, ids: &[i64]) -> Result<Vec<Section>, ServiceError> {
        self.rt.block_on(self.inner.reorder_sections(ids))
    }

    pub fn delete_section(&self, id: i64) -> Result<(), ServiceError> {
        self.rt.block_on(self.inner.delete_section(id))
    }

    pub fn list_tasks(&self, view: &View) -> Result<Vec<Task>, ServiceError> {
        self.rt.block_on(self.inner.list_tasks(view))
    }

    pub fn get_task(&self, id: i64) -> Result<Task, ServiceError> {
        self.rt.block_on(self.inner.get_task(id))
    }

    pub fn create_task(&self, input: &CreateTask) -> Result<Task, ServiceError> {
        self.rt.block_on(self.inner.create_task(input))
    }

    pub fn update_task(&self, id: i64, update: &UpdateTask) -> Result<Task, ServiceError> {
        self.rt.block_on(self.inner.update_task(id, update))
    }

    pub fn delete_task(&self, id: i64, permanent: bool) -> Result<(), ServiceError> {
        self.rt.block_on(self.inner.delete_task(id, permanent))
    }

    pub fn restore_task(&self, id: i64) -> Result<Task, ServiceError> {
        self.rt.block_on(self.inner.restore_task(id))
    }

    pub fn mark_task_reminded(&self, id: i64) -> Result<Task, ServiceError> {
        self.rt.block_on(self.inner.mark_task_reminded(id))
    }

    pub fn list_attachments(&self, task_id: i64) -> Result<Vec<Attachment>, ServiceError> {
        self.rt.block_on(self.inner.list_attachments(task_id))
    }

    pub fn add_attachment(
        &self,
        task_id: i64,
        upload: AttachmentUpload,
    ) -> Result<Attachment, ServiceError> {
        self.rt.block_on(self.inner.add_attachment(task_id, upload))
    }

    pub fn delete_attachment(&self, id: i64) -> Result<(), ServiceError> {
        self.rt.block_on(self.inner.delete_attachment(id))
    }

    pub fn read_file(&self, key: &str) -> Result<Bytes, ServiceError> {
        self.rt.block_on(self.inner.read_file(key))
    }

    pub fn task_stats(&self) -> Result<TaskStats, ServiceError> {
        self.rt.block_on(self.inner.task_stats())
    }

    pub fn cleanup(&self) -> Result<PurgeReport, ServiceError> {
        self.rt.block_on(self.inner.cleanup())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mytodo_core::attachment::{AttachmentKind, FileUpload};

    /// Spawn a test server on a background thread (BlockingHttpService owns
    /// its own runtime and cannot run inside another). Returns the base_url.
    /// The server lives until the test process exits.
    fn spawn_blocking_server() -> String {
        let (tx, rx) = std::sync::mpsc::sync_channel(1);
        std::thread::spawn(move || {
            let rt = tokio::runtime::Runtime::new().unwrap();
            rt.block_on(async {
                let server = mytodo_server::test_helpers::spawn_test_server().await;
                tx.send(server.base_url.clone()).unwrap();
                std::future::pending::<()>().await;
            });
        });
        rx.recv().unwrap()
    }

    #[test]
    fn blocking_health_check() {
        let url = spawn_blocking_server();
        let svc = BlockingHttpService::new(&url).unwrap();
        svc.health_check().unwrap();
        assert_eq!(svc.base_url(), url);
    }

    #[test]
    fn blocking_health_check_unreachable() {
        let svc = BlockingHttpService::new("http://127.0.0.1:1").unwrap();
        assert!(matches!(svc.health_check(), Err(ServiceError::Internal(_))));
    }

    #[test]
    fn blocking_section_crud() {
        let url = spawn_blocking_server();
        let svc = BlockingHttpService::new(&url).unwrap();

        let a = svc
            .create_section(&CreateSection {
                name: "Work".into(),
                icon: None,
            })
            .unwrap();
        let b = svc
            .create_section(&CreateSection {
                name: "Home".into(),
                icon: Some("🏠".into()),
            })
            .unwrap();
        assert_eq!(a.icon, "📁");

        let reordered = svc.reorder_sections(&[b.id, a.id]).unwrap();
        assert_eq!(reordered[0].id, b.id);
        assert_eq!(reordered[0].sort_order, 1);

        let renamed = svc
            .update_section(
                a.id,
                &UpdateSection {
                    name: Some("Office".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(renamed.name, "Office");

        svc.delete_section(b.id).unwrap();
        assert_eq!(svc.list_sections().unwrap().len(), 1);
    }

    #[test]
    fn blocking_task_lifecycle() {
        let url = spawn_blocking_server();
        let svc = BlockingHttpService::new(&url).unwrap();

        let task = svc.create_task(&CreateTask::new("Blocking Task")).unwrap();
        assert_eq!(svc.list_tasks(&View::All).unwrap().len(), 1);

        let done = svc.update_task(task.id, &UpdateTask::completed(true)).unwrap();
        assert!(done.is_completed);
        assert_eq!(svc.list_tasks(&View::Logbox).unwrap().len(), 1);

        svc.delete_task(task.id, false).unwrap();
        assert_eq!(svc.list_tasks(&View::Trash).unwrap().len(), 1);
        let restored = svc.restore_task(task.id).unwrap();
        assert!(!restored.is_deleted);

        svc.delete_task(task.id, true).unwrap();
        let err = svc.get_task(task.id).unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[test]
    fn blocking_validation_errors_map_to_invalid_input() {
        let url = spawn_blocking_server();
        let svc = BlockingHttpService::new(&url).unwrap();
        let err = svc.create_task(&CreateTask::new("  ")).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[test]
    fn blocking_attachments_and_files() {
        let url = spawn_blocking_server();
        let svc = BlockingHttpService::new(&url).unwrap();
        let task = svc.create_task(&CreateTask::new("with file")).unwrap();

        let link = svc
            .add_attachment(task.id, AttachmentUpload::Url("https://example.com".into()))
            .unwrap();
        assert_eq!(link.kind, AttachmentKind::Url);

        let file = svc
            .add_attachment(
                task.id,
                AttachmentUpload::File(FileUpload {
                    filename: "doc.pdf".into(),
                    content_type: "application/pdf".into(),
                    data: Bytes::from_static(b"%PDF-1.4"),
                }),
            )
            .unwrap();
        assert_eq!(file.kind, AttachmentKind::Pdf);

        let key = file.store_key.clone().unwrap();
        assert_eq!(svc.read_file(&key).unwrap(), Bytes::from_static(b"%PDF-1.4"));
        assert_eq!(svc.list_attachments(task.id).unwrap().len(), 2);

        svc.delete_attachment(file.id).unwrap();
        assert!(matches!(svc.read_file(&key), Err(ServiceError::NotFound(_))));
    }

    #[test]
    fn blocking_stats_reminded_and_cleanup() {
        let url = spawn_blocking_server();
        let svc = BlockingHttpService::new(&url).unwrap();
        let task = svc
            .create_task(&CreateTask {
                reminder_type: mytodo_core::task::ReminderType::Daily,
                ..CreateTask::new("stretch")
            })
            .unwrap();
        assert_eq!(svc.task_stats().unwrap().reminders, 1);
        svc.mark_task_reminded(task.id).unwrap();
        assert_eq!(svc.task_stats().unwrap().reminders, 0);

        let report = svc.cleanup().unwrap();
        assert_eq!(report.total(), 0);
    }
}

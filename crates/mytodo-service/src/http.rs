use async_trait::async_trait;
use bytes::Bytes;
use mytodo_core::attachment::{Attachment, AttachmentUpload};
use mytodo_core::retention::PurgeReport;
use mytodo_core::section::{CreateSection, ReorderSections, Section, UpdateSection};
use mytodo_core::stats::TaskStats;
use mytodo_core::task::{CreateTask, Task, UpdateTask};
use mytodo_core::view::View;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, StatusCode};

use crate::{ServiceError, TodoService};

/// Async HTTP client implementation of TodoService.
/// Connects to a running mytodo-server.
pub struct HttpService {
    base_url: String,
    client: Client,
    api_key: Option<String>,
}

impl HttpService {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
            api_key: None,
        }
    }

    pub fn with_api_key(base_url: &str, key: String) -> Self {
        Self {
            api_key: Some(key),
            ..Self::new(base_url)
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn with_auth(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => builder.header("Authorization", format!("Bearer {key}")),
            None => builder,
        }
    }

    /// Check if the server is reachable.
    /// Health endpoint is NOT authenticated.
    pub async fn health_check(&self) -> Result<(), ServiceError> {
        let resp = self
            .client
            .get(format!("{}/api/health", self.base_url))
            .send()
            .await
            .map_err(|e| ServiceError::Internal(format!("connection failed: {e}")))?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(ServiceError::Internal(format!(
                "health check failed: {}",
                resp.status()
            )))
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<reqwest::Response, ServiceError> {
        self.with_auth(builder)
            .send()
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, ServiceError> {
        let resp = self
            .send(self.client.get(format!("{}{path}", self.base_url)))
            .await?;
        handle_response(resp).await
    }

    async fn post_json<B: serde::Serialize + ?Sized, T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ServiceError> {
        let builder = self
            .client
            .post(format!("{}{path}", self.base_url))
            .json(body);
        handle_response(self.send(builder).await?).await
    }

    async fn post_empty<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, ServiceError> {
        let resp = self
            .send(self.client.post(format!("{}{path}", self.base_url)))
            .await?;
        handle_response(resp).await
    }

    async fn put_json<B: serde::Serialize + ?Sized, T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ServiceError> {
        let builder = self
            .client
            .put(format!("{}{path}", self.base_url))
            .json(body);
        handle_response(self.send(builder).await?).await
    }

    async fn delete_req(&self, path: &str) -> Result<(), ServiceError> {
        let resp = self
            .send(self.client.delete(format!("{}{path}", self.base_url)))
            .await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(parse_error(resp).await)
        }
    }
}

async fn handle_response<T: serde::de::DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T, ServiceError> {
    let status = resp.status();
    if status.is_success() {
        resp.json::<T>()
            .await
            .map_err(|e| ServiceError::Internal(format!("json decode: {e}")))
    } else {
        Err(parse_error_with_status(status, resp).await)
    }
}

async fn parse_error(resp: reqwest::Response) -> ServiceError {
    let status = resp.status();
    parse_error_with_status(status, resp).await
}

async fn parse_error_with_status(status: StatusCode, resp: reqwest::Response) -> ServiceError {
    let body = resp.text().await.unwrap_or_default();
    let msg = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v["error"].as_str().map(String::from))
        .unwrap_or(body);

    match status {
        StatusCode::NOT_FOUND => ServiceError::NotFound(msg),
        StatusCode::BAD_REQUEST | StatusCode::PAYLOAD_TOO_LARGE => ServiceError::InvalidInput(msg),
        StatusCode::UNAUTHORIZED => ServiceError::Internal(format!("unauthorized: {msg}")),
        _ => ServiceError::Internal(msg),
    }
}

#[async_trait]
impl TodoService for HttpService {
    async fn list_sections(&self) -> Result<Vec<Section>, ServiceError> {
        self.get_json("/api/sections").await
    }

    async fn create_section(&self, input: &CreateSection) -> Result<Section, ServiceError> {
        self.post_json("/api/sections", input).await
    }

    async fn update_section(
        &self,
        id: i64,
        update: &UpdateSection,
    ) -> Result<Section, ServiceError> {
        self.put_json(&format!("/api/sections/{id}"), update).await
    }

    async fn reorder_sections(&self, ids: &[i64]) -> Result<Vec<Section>, ServiceError> {
        let body = ReorderSections {
            section_ids: ids.to_vec(),
        };
        self.put_json("/api/sections/reorder", &body).await
    }

    async fn delete_section(&self, id: i64) -> Result<(), ServiceError> {
        self.delete_req(&format!("/api/sections/{id}")).await
    }

    async fn list_tasks(&self, view: &View) -> Result<Vec<Task>, ServiceError> {
        self.get_json(&format!("/api/tasks?{}", view.query_string()))
            .await
    }

    async fn get_task(&self, id: i64) -> Result<Task, ServiceError> {
        self.get_json(&format!("/api/tasks/{id}")).await
    }

    async fn create_task(&self, input: &CreateTask) -> Result<Task, ServiceError> {
        self.post_json("/api/tasks", input).await
    }

    async fn update_task(&self, id: i64, update: &UpdateTask) -> Result<Task, ServiceError> {
        self.put_json(&format!("/api/tasks/{id}"), update).await
    }

    async fn delete_task(&self, id: i64, permanent: bool) -> Result<(), ServiceError> {
        if permanent {
            self.delete_req(&format!("/api/tasks/{id}?permanent=true"))
                .await
        } else {
            self.delete_req(&format!("/api/tasks/{id}")).await
        }
    }

    async fn restore_task(&self, id: i64) -> Result<Task, ServiceError> {
        self.post_empty(&format!("/api/tasks/{id}/restore")).await
    }

    async fn mark_task_reminded(&self, id: i64) -> Result<Task, ServiceError> {
        self.post_empty(&format!("/api/tasks/{id}/reminded")).await
    }

    async fn list_attachments(&self, task_id: i64) -> Result<Vec<Attachment>, ServiceError> {
        self.get_json(&format!("/api/tasks/{task_id}/attachments"))
            .await
    }

    async fn add_attachment(
        &self,
        task_id: i64,
        upload: AttachmentUpload,
    ) -> Result<Attachment, ServiceError> {
        let form = match upload {
            AttachmentUpload::Url(url) => Form::new().text("url", url),
            AttachmentUpload::File(file) => {
                let part = Part::bytes(file.data.to_vec())
                    .file_name(file.filename)
                    .mime_str(&file.content_type)
                    .map_err(|e| ServiceError::InvalidInput(format!("content type: {e}")))?;
                Form::new().part("file", part)
            }
        };
        let builder = self
            .client
            .post(format!("{}/api/tasks/{task_id}/attachments", self.base_url))
            .multipart(form);
        handle_response(self.send(builder).await?).await
    }

    async fn delete_attachment(&self, id: i64) -> Result<(), ServiceError> {
        self.delete_req(&format!("/api/attachments/{id}")).await
    }

    async fn read_file(&self, key: &str) -> Result<Bytes, ServiceError> {
        let resp = self
            .send(self.client.get(format!("{}/api/files/{key}", self.base_url)))
            .await?;
        let status = resp.status();
        if status.is_success() {
            resp.bytes()
                .await
                .map_err(|e| ServiceError::Internal(format!("read body: {e}")))
        } else {
            Err(parse_error_with_status(status, resp).await)
        }
    }

    async fn task_stats(&self) -> Result<TaskStats, ServiceError> {
        self.get_json("/api/stats").await
    }

    async fn cleanup(&self) -> Result<PurgeReport, ServiceError> {
        self.post_empty("/api/cleanup").await
    }
}

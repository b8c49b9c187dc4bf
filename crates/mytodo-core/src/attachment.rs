use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Largest accepted upload, in bytes.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Route prefix uploaded blobs are served from.
pub const FILES_ROUTE: &str = "/api/files/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Image,
    Pdf,
    Url,
}

impl AttachmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttachmentKind::Image => "image",
            AttachmentKind::Pdf => "pdf",
            AttachmentKind::Url => "url",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s {
            "image" => Some(AttachmentKind::Image),
            "pdf" => Some(AttachmentKind::Pdf),
            "url" => Some(AttachmentKind::Url),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: i64,
    pub task_id: i64,
    #[serde(rename = "type")]
    pub kind: AttachmentKind,
    pub name: String,
    pub url: String,
    /// Object-store key for uploaded files; `None` for links.
    #[serde(default)]
    pub store_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Row to insert. The database assigns id and created_at.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAttachment {
    pub task_id: i64,
    pub kind: AttachmentKind,
    pub name: String,
    pub url: String,
    pub store_key: Option<String>,
}

impl NewAttachment {
    pub fn link(task_id: i64, url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            task_id,
            kind: AttachmentKind::Url,
            name: url.clone(),
            url,
            store_key: None,
        }
    }

    pub fn file(task_id: i64, kind: AttachmentKind, name: impl Into<String>, key: &str) -> Self {
        Self {
            task_id,
            kind,
            name: name.into(),
            url: file_url(key),
            store_key: Some(key.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FileUpload {
    pub filename: String,
    pub content_type: String,
    pub data: Bytes,
}

#[derive(Debug, Clone)]
pub enum AttachmentUpload {
    Url(String),
    File(FileUpload),
}

/// Decide whether an upload is acceptable and which kind it becomes.
///
/// Size is checked before type.
pub fn classify_upload(content_type: &str, size: usize) -> Result<AttachmentKind, ValidationError> {
    if size > MAX_UPLOAD_BYTES {
        return Err(ValidationError::FileTooLarge { size });
    }
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    if mime.starts_with("image/") {
        Ok(AttachmentKind::Image)
    } else if mime == "application/pdf" {
        Ok(AttachmentKind::Pdf)
    } else {
        Err(ValidationError::UnsupportedFileType(content_type.to_string()))
    }
}

pub fn file_url(key: &str) -> String {
    format!("{FILES_ROUTE}{key}")
}

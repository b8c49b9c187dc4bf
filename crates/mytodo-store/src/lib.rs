mod local;
#[cfg(feature = "s3")]
mod s3;

pub use local::LocalStore;
#[cfg(feature = "s3")]
pub use s3::S3Store;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("store error: {0}")]
    Internal(String),
}

/// A store for opaque blobs keyed by string paths.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write (create or overwrite) an object.
    async fn put(&self, key: &str, data: Bytes) -> Result<(), StoreError>;

    /// Read an object. Returns `StoreError::NotFound` if absent.
    async fn get(&self, key: &str) -> Result<Bytes, StoreError>;

    /// Read an object, returning `None` if it does not exist.
    async fn get_opt(&self, key: &str) -> Result<Option<Bytes>, StoreError> {
        match self.get(key).await {
            Ok(data) => Ok(Some(data)),
            Err(StoreError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Delete an object. No-op if absent.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// List object keys under a prefix.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError>;

    /// Check if an object exists.
    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        match self.get(key).await {
            Ok(_) => Ok(true),
            Err(StoreError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

// -- Keys --

/// Key for an uploaded attachment: `attachments/<task>/<millis>-<filename>`.
///
/// Path separators in the client-supplied filename are replaced so the blob
/// always lands directly under the task's prefix. URL delimiters (`#`, `?`,
/// `%`) are replaced too, since the key is served verbatim under `/api/files/`.
pub fn attachment_key(task_id: i64, millis: i64, filename: &str) -> String {
    let name: String = filename
        .trim()
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | '#' | '?' | '%') { '_' } else { c })
        .collect();
    let name = if name.is_empty() || name.chars().all(|c| c == '.') {
        "file".to_string()
    } else {
        name
    };
    format!("attachments/{task_id}/{millis}-{name}")
}

pub fn task_attachments_prefix(task_id: i64) -> String {
    format!("attachments/{task_id}/")
}

/// Reject keys that are empty, absolute or climb out of the store root.
pub fn validate_key(key: &str) -> Result<(), StoreError> {
    let bad = key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..");
    if bad {
        Err(StoreError::InvalidKey(key.to_string()))
    } else {
        Ok(())
    }
}

/// MIME type served for a key, from its extension.
pub fn content_type_for_key(key: &str) -> &'static str {
    let ext = key
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "heic" => "image/heic",
        "bmp" => "image/bmp",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

// -- Configuration --

/// Configuration for the object store backend.
#[derive(Debug, Clone, Default)]
pub struct StoreConfig {
    /// S3-compatible endpoint URL (e.g., "http://127.0.0.1:3900").
    /// When `None`, use local filesystem.
    pub endpoint_url: Option<String>,
    /// S3 region (e.g., "garage", "us-east-1").
    pub region: Option<String>,
    pub bucket: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    /// Local filesystem base directory (used when S3 is not configured).
    pub local_data_dir: Option<String>,
}

impl StoreConfig {
    /// Build from environment variables.
    /// If `MYTODO_S3_ENDPOINT` (or `AWS_ENDPOINT_URL`) is set along with
    /// credentials and a bucket name, use S3. Otherwise, fall back to local filesystem.
    pub fn from_env() -> Self {
        Self {
            endpoint_url: std::env::var("MYTODO_S3_ENDPOINT")
                .or_else(|_| std::env::var("AWS_ENDPOINT_URL"))
                .ok(),
            region: std::env::var("MYTODO_S3_REGION")
                .or_else(|_| std::env::var("AWS_REGION"))
                .ok(),
            bucket: std::env::var("MYTODO_S3_BUCKET").ok(),
            access_key_id: std::env::var("MYTODO_S3_ACCESS_KEY_ID")
                .or_else(|_| std::env::var("AWS_ACCESS_KEY_ID"))
                .ok(),
            secret_access_key: std::env::var("MYTODO_S3_SECRET_ACCESS_KEY")
                .or_else(|_| std::env::var("AWS_SECRET_ACCESS_KEY"))
                .ok(),
            local_data_dir: None,
        }
    }

    pub fn with_local_dir(mut self, dir: impl Into<String>) -> Self {
        self.local_data_dir = Some(dir.into());
        self
    }

    pub fn is_s3(&self) -> bool {
        self.endpoint_url.is_some()
            && self.access_key_id.is_some()
            && self.secret_access_key.is_some()
            && self.bucket.is_some()
    }
}

/// Default blob directory: `$XDG_DATA_HOME/mytodo/files` or
/// `~/.local/share/mytodo/files`.
pub fn default_local_dir() -> PathBuf {
    let base = if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        PathBuf::from(xdg)
    } else if let Some(home) = std::env::var_os("HOME") {
        PathBuf::from(home).join(".local/share")
    } else {
        PathBuf::from(".")
    };
    base.join("mytodo").join("files")
}

// -- Factory --

/// Create an `ObjectStore` from configuration.
pub fn create_store(config: &StoreConfig) -> Result<Arc<dyn ObjectStore>, StoreError> {
    if config.is_s3() {
        #[cfg(feature = "s3")]
        {
            info!(
                bucket = config.bucket.as_deref().unwrap_or_default(),
                "using S3 object store"
            );
            Ok(Arc::new(S3Store::new(config)?))
        }
        #[cfg(not(feature = "s3"))]
        {
            Err(StoreError::Internal(
                "S3 configuration detected but the 's3' feature is not enabled".into(),
            ))
        }
    } else {
        let store = LocalStore::new(config);
        info!(dir = %store.base_dir().display(), "using local object store");
        Ok(Arc::new(store))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attachment_key_layout() {
        assert_eq!(
            attachment_key(7, 1700000000000, "scan.pdf"),
            "attachments/7/1700000000000-scan.pdf"
        );
        assert!(attachment_key(7, 1, "scan.pdf").starts_with(&task_attachments_prefix(7)));
    }

    #[test]
    fn attachment_key_flattens_path_separators() {
        let key = attachment_key(7, 1, "../../etc/passwd");
        assert_eq!(key, "attachments/7/1-.._.._etc_passwd");
        assert!(validate_key(&key).is_ok());
        assert_eq!(attachment_key(7, 1, ""), "attachments/7/1-file");
    }

    #[test]
    fn attachment_key_replaces_url_delimiters() {
        assert_eq!(
            attachment_key(7, 1, "receipt #4?v=2 100%.png"),
            "attachments/7/1-receipt _4_v=2 100_.png"
        );
    }

    #[test]
    fn validate_key_rejects_traversal() {
        assert!(validate_key("attachments/1/a.png").is_ok());
        for bad in ["", "/etc/passwd", "a/../b", "..", "a//b", "a\\b", "./a"] {
            assert!(
                matches!(validate_key(bad), Err(StoreError::InvalidKey(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn content_type_detection() {
        assert_eq!(content_type_for_key("attachments/1/2-photo.PNG"), "image/png");
        assert_eq!(content_type_for_key("attachments/1/2-photo.jpeg"), "image/jpeg");
        assert_eq!(content_type_for_key("attachments/1/2-doc.pdf"), "application/pdf");
        assert_eq!(content_type_for_key("attachments/1/2-noext"), "application/octet-stream");
    }

    #[test]
    fn store_config_is_s3_requires_all_fields() {
        let full = StoreConfig {
            endpoint_url: Some("http://localhost:3900".into()),
            region: Some("garage".into()),
            bucket: Some("mytodo".into()),
            access_key_id: Some("key".into()),
            secret_access_key: Some("secret".into()),
            local_data_dir: None,
        };
        assert!(full.is_s3());

        let no_bucket = StoreConfig {
            bucket: None,
            ..full.clone()
        };
        assert!(!no_bucket.is_s3());

        let no_creds = StoreConfig {
            access_key_id: None,
            secret_access_key: None,
            ..full.clone()
        };
        assert!(!no_creds.is_s3());

        assert!(!StoreConfig::default().is_s3());
    }

    #[test]
    fn create_store_local_fallback() {
        let tmp = tempfile::tempdir().unwrap();
        let config = StoreConfig::default().with_local_dir(tmp.path().to_string_lossy());
        assert!(create_store(&config).is_ok());
    }

    // These subtests mutate global env vars and must run sequentially
    // in a single test to avoid races with parallel test execution.
    #[test]
    fn store_config_from_env_scenarios() {
        use std::sync::Mutex;
        static ENV_LOCK: Mutex<()> = Mutex::new(());
        let _guard = ENV_LOCK.lock().unwrap();

        let clear_all = || {
            for var in [
                "MYTODO_S3_ENDPOINT", "AWS_ENDPOINT_URL",
                "MYTODO_S3_REGION", "AWS_REGION",
                "MYTODO_S3_BUCKET",
                "MYTODO_S3_ACCESS_KEY_ID", "AWS_ACCESS_KEY_ID",
                "MYTODO_S3_SECRET_ACCESS_KEY", "AWS_SECRET_ACCESS_KEY",
            ] {
                std::env::remove_var(var);
            }
        };

        clear_all();
        let config = StoreConfig::from_env();
        assert!(config.endpoint_url.is_none());
        assert!(!config.is_s3());

        // AWS_* fallbacks
        clear_all();
        std::env::set_var("AWS_ENDPOINT_URL", "http://aws-endpoint:443");
        std::env::set_var("AWS_REGION", "us-west-2");
        std::env::set_var("AWS_ACCESS_KEY_ID", "aws-key");
        std::env::set_var("AWS_SECRET_ACCESS_KEY", "aws-secret");
        std::env::set_var("MYTODO_S3_BUCKET", "todo-files");
        let config = StoreConfig::from_env();
        assert_eq!(config.endpoint_url.as_deref(), Some("http://aws-endpoint:443"));
        assert_eq!(config.region.as_deref(), Some("us-west-2"));
        assert_eq!(config.bucket.as_deref(), Some("todo-files"));
        assert!(config.is_s3());

        // MYTODO_S3_* take precedence
        clear_all();
        std::env::set_var("MYTODO_S3_ENDPOINT", "http://minio:9000");
        std::env::set_var("AWS_ENDPOINT_URL", "http://aws:443");
        std::env::set_var("MYTODO_S3_ACCESS_KEY_ID", "todo-key");
        std::env::set_var("AWS_ACCESS_KEY_ID", "aws-key");
        let config = StoreConfig::from_env();
        assert_eq!(config.endpoint_url.as_deref(), Some("http://minio:9000"));
        assert_eq!(config.access_key_id.as_deref(), Some("todo-key"));

        clear_all();
    }
}

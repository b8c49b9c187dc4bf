use std::sync::Arc;

use axum::Router;
use mytodo_service::{LocalService, TodoService};
use mytodo_store::StoreConfig;
use tokio::net::TcpListener;

/// In-memory SQLite plus a local store in a temp directory that outlives the test.
pub fn test_service() -> Arc<dyn TodoService> {
    let db = Arc::new(mytodo_db::SqliteDatabase::open_in_memory().unwrap());
    let dir = tempfile::tempdir().unwrap().keep();
    let store_config = StoreConfig::default().with_local_dir(dir.to_string_lossy());
    let store = mytodo_store::create_store(&store_config).unwrap();
    Arc::new(LocalService::new(db, store))
}

/// Build a test router with no auth.
pub async fn test_router() -> Router {
    crate::routes::build_router(test_service(), None)
}

/// Build a test router with auth enabled, returning (router, api_key).
pub async fn test_router_with_auth() -> (Router, String) {
    let api_key = crate::auth::generate_api_key();
    let auth = crate::auth::build_auth_config(Some(&api_key));
    (crate::routes::build_router(test_service(), auth), api_key)
}

/// A running test server with base_url and background task handle.
pub struct TestServer {
    pub base_url: String,
    _handle: tokio::task::JoinHandle<()>,
}

/// Spawn an axum test server on a random port. Returns the TestServer
/// with the `base_url` (e.g. "http://127.0.0.1:12345").
pub async fn spawn_test_server() -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let base_url = format!("http://{addr}");
    let app = test_router().await;
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    TestServer {
        base_url,
        _handle: handle,
    }
}

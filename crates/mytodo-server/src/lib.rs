pub mod auth;
pub mod config;
mod routes;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

use std::sync::Arc;

use anyhow::Result;
use mytodo_service::{LocalService, TodoService};
use tokio::net::TcpListener;

use auth::AuthConfig;
use config::ServerConfig;

pub use routes::{build_router, AppState, InnerAppState};

/// Open the configured database and object store behind a `LocalService`.
pub async fn build_service(config: &ServerConfig) -> Result<Arc<dyn TodoService>> {
    let db = mytodo_db::open_database(&config.db_config()).await?;
    let store = mytodo_store::create_store(&config.store_config())?;
    Ok(Arc::new(LocalService::new(db, store)))
}

pub async fn serve(
    listener: TcpListener,
    service: Arc<dyn TodoService>,
    auth: Option<Arc<AuthConfig>>,
) -> Result<()> {
    let app = routes::build_router(service, auth);
    axum::serve(listener, app).await?;
    Ok(())
}

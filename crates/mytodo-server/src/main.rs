use anyhow::Result;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

use mytodo_server::auth;
use mytodo_server::config::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.config;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Keygen => {
            // Raw key on stdout so it can be captured.
            println!("{}", auth::generate_api_key());
            eprintln!("Set MYTODO_API_KEY to this value on the server and pass it to clients.");
        }
        Commands::Cleanup => {
            let service = mytodo_server::build_service(&config).await?;
            let report = service.cleanup().await?;
            println!(
                "purged {} trashed and {} completed tasks",
                report.trashed_purged, report.completed_purged
            );
        }
        Commands::Serve => {
            let addr = config.socket_addr()?;
            let service = mytodo_server::build_service(&config).await?;

            let auth = auth::build_auth_config(config.api_key.as_deref());
            if auth.is_some() {
                info!("authentication enabled");
            } else {
                info!("authentication disabled (no MYTODO_API_KEY)");
            }

            let listener = TcpListener::bind(addr).await?;
            info!("mytodo-server listening on http://{addr}");

            mytodo_server::serve(listener, service, auth).await?;
        }
    }

    Ok(())
}

use std::net::{AddrParseError, IpAddr, SocketAddr};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use mytodo_db::DbConfig;
use mytodo_store::StoreConfig;

#[derive(Debug, Parser)]
#[command(name = "mytodo-server", about = "MyToDo HTTP API")]
pub struct Cli {
    #[command(flatten)]
    pub config: ServerConfig,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Commands {
    /// Run the HTTP API (the default)
    Serve,
    /// Purge expired trash and logbox tasks, then exit
    Cleanup,
    /// Print a fresh API key to use as MYTODO_API_KEY
    Keygen,
}

#[derive(Debug, Clone, Args)]
pub struct ServerConfig {
    /// Address to bind
    #[arg(long, env = "MYTODO_BIND", default_value = "0.0.0.0")]
    pub bind: String,

    /// Port to listen on
    #[arg(long, env = "MYTODO_PORT", default_value = "3000")]
    pub port: u16,

    /// SQLite database file
    #[arg(long, env = "MYTODO_DB_PATH")]
    pub db_path: Option<PathBuf>,

    /// Postgres connection URL; takes precedence over the SQLite file
    #[arg(long, env = "MYTODO_DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Directory for the default database file and local attachment blobs
    #[arg(long, env = "MYTODO_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Require `Authorization: Bearer <key>` on every API route except health
    #[arg(long, env = "MYTODO_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        let ip: IpAddr = self.bind.parse()?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn db_config(&self) -> DbConfig {
        let sqlite_path = self
            .db_path
            .clone()
            .or_else(|| self.data_dir.as_ref().map(|d| d.join("mytodo.db")));
        DbConfig {
            sqlite_path: sqlite_path.map(|p| p.to_string_lossy().into_owned()),
            database_url: self.database_url.clone().filter(|u| !u.is_empty()),
        }
    }

    /// S3 settings come from the environment; the data directory only moves
    /// the local fallback.
    pub fn store_config(&self) -> StoreConfig {
        let config = StoreConfig::from_env();
        match &self.data_dir {
            Some(dir) => config.with_local_dir(dir.join("files").to_string_lossy()),
            None => config,
        }
    }
}

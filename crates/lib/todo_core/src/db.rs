//! Private PostgreSQL instances.
//!
//! `DbManager` drives the server binaries found through `pg_config`.
//! `todo_api_server --local-db` keeps its cluster in the platform data
//! directory; every database test gets a throwaway cluster in a tempdir.

use std::net::TcpListener;
use std::path::{Path, PathBuf};

use sqlx::postgres::PgPool;
use tempfile::TempDir;
use thiserror::Error;
use tokio::process::Command;

/// Name of the application database inside the cluster.
const DATABASE: &str = "todo";

/// Seconds `pg_ctl` waits for the server to accept connections.
const START_TIMEOUT_SECS: u32 = 30;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("{tool} failed: {stderr}")]
    Tool { tool: &'static str, stderr: String },

    #[error("pg_config not found on PATH")]
    PgConfigNotFound,

    #[error("Data directory not available")]
    NoDataDir,

    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DbError>;

/// A PostgreSQL cluster run on localhost by this process.
pub struct DbManager {
    bin_dir: PathBuf,
    data_dir: PathBuf,
    port: u16,
    started: bool,
    /// Owns the cluster directory of an ephemeral instance.
    _scratch: Option<TempDir>,
}

impl DbManager {
    /// Cluster stored in [`default_data_dir`], kept across runs.
    pub async fn with_default_data_dir() -> Result<Self> {
        let data_dir = default_data_dir().ok_or(DbError::NoDataDir)?;
        Ok(Self::at(pg_bindir().await?, data_dir, None))
    }

    /// Cluster in a fresh temporary directory, deleted when dropped.
    pub async fn ephemeral() -> Result<Self> {
        let scratch = tempfile::tempdir()?;
        let data_dir = scratch.path().join("pgdata");
        Ok(Self::at(pg_bindir().await?, data_dir, Some(scratch)))
    }

    fn at(bin_dir: PathBuf, data_dir: PathBuf, scratch: Option<TempDir>) -> Self {
        Self {
            bin_dir,
            data_dir,
            port: 0,
            started: false,
            _scratch: scratch,
        }
    }

    /// Run `initdb` unless the data directory already holds a cluster.
    pub async fn setup(&mut self) -> Result<()> {
        if self.data_dir.join("PG_VERSION").exists() {
            log::debug!("cluster exists at {}", self.data_dir.display());
            return Ok(());
        }

        log::info!("initializing cluster at {}", self.data_dir.display());
        self.pg_tool("initdb", |cmd| {
            cmd.arg("-D")
                .arg(&self.data_dir)
                .args(["--no-locale", "--encoding=UTF8", "--auth=trust"]);
        })
        .await?;
        Ok(())
    }

    /// Start the server on a free port and create the `todo` database.
    pub async fn start(&mut self) -> Result<()> {
        if self.port == 0 {
            self.port = free_port()?;
        }

        let server_opts = format!(
            "-p {} -k {} -h localhost",
            self.port,
            self.data_dir.display()
        );
        let logfile = self.data_dir.join("postgresql.log");
        let timeout = START_TIMEOUT_SECS.to_string();
        self.pg_tool("pg_ctl", |cmd| {
            cmd.arg("-D")
                .arg(&self.data_dir)
                .args(["-o", server_opts.as_str(), "-w", "-t", timeout.as_str(), "-l"])
                .arg(&logfile)
                .arg("start");
        })
        .await?;
        self.started = true;

        self.ensure_database().await?;
        log::info!("postgres ready at {}", self.connection_url());
        Ok(())
    }

    /// Fast shutdown. A manager that never started is left alone.
    pub async fn stop(&mut self) -> Result<()> {
        if !self.started {
            return Ok(());
        }
        self.pg_tool("pg_ctl", |cmd| {
            cmd.arg("-D")
                .arg(&self.data_dir)
                .args(["-m", "fast", "-w", "stop"]);
        })
        .await?;
        self.started = false;
        log::info!("postgres on port {} stopped", self.port);
        Ok(())
    }

    /// Pool on the `todo` database with the schema applied.
    pub async fn connect_migrated(&self) -> Result<PgPool> {
        let pool = PgPool::connect(&self.connection_url()).await?;
        crate::migrate::migrate(&pool).await?;
        Ok(pool)
    }

    pub fn connection_url(&self) -> String {
        format!("postgresql://localhost:{}/{DATABASE}", self.port)
    }

    /// Listening port, 0 before the first start.
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    async fn ensure_database(&self) -> Result<()> {
        let admin_url = format!("postgresql://localhost:{}/postgres", self.port);
        let admin = PgPool::connect(&admin_url).await?;

        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
                .bind(DATABASE)
                .fetch_one(&admin)
                .await?;
        if !exists {
            sqlx::query(&format!("CREATE DATABASE {DATABASE}"))
                .execute(&admin)
                .await?;
            log::info!("created database {DATABASE}");
        }

        admin.close().await;
        Ok(())
    }

    /// Run one of the server binaries, turning a non-zero exit into an error.
    async fn pg_tool(
        &self,
        tool: &'static str,
        args: impl FnOnce(&mut Command),
    ) -> Result<()> {
        let mut cmd = Command::new(self.bin_dir.join(tool));
        args(&mut cmd);
        let output = cmd.output().await?;
        if !output.status.success() {
            return Err(DbError::Tool {
                tool,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

/// Directory holding `initdb` and `pg_ctl`, from `pg_config --bindir`.
async fn pg_bindir() -> Result<PathBuf> {
    let output = Command::new("pg_config")
        .arg("--bindir")
        .output()
        .await
        .map_err(|_| DbError::PgConfigNotFound)?;
    if !output.status.success() {
        return Err(DbError::PgConfigNotFound);
    }
    Ok(PathBuf::from(String::from_utf8_lossy(&output.stdout).trim()))
}

fn free_port() -> Result<u16> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?.port())
}

/// `<platform data dir>/todo/pgdata`, e.g. `~/.local/share/todo/pgdata`.
pub fn default_data_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join("todo").join("pgdata"))
}

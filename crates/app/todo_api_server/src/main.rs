//! Todo HTTP API server binary.
//!
//! Connects to PostgreSQL (or starts a local instance with `--local-db`),
//! runs migrations, serves the API, and periodically sweeps expired tokens.

use std::time::Duration;

use clap::Parser;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use todo_api::config::ApiConfig;
use todo_core::auth::AuthError;
use todo_core::auth::password;
use todo_core::auth::tokens::{MAX_TOKEN_TTL_MINUTES, purge_expired_tokens, ttl_from_minutes};
use todo_core::db::DbManager;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// CLI arguments for the API server. Each flag overrides the matching
/// environment setting read by [`ApiConfig::from_env`].
#[derive(Parser, Debug)]
#[command(name = "todo_api_server", about = "Todo API server")]
struct Args {
    /// Address to bind, e.g. `0.0.0.0:8080` (overrides `BIND_ADDR`).
    #[arg(long)]
    bind_addr: Option<String>,

    /// Port to listen on, keeping the configured host (0 = ephemeral).
    #[arg(long)]
    port: Option<u16>,

    /// PostgreSQL connection URL (overrides `DATABASE_URL`).
    #[arg(long)]
    database_url: Option<String>,

    /// Start and use a local PostgreSQL instance in the platform data
    /// directory instead of the configured database URL.
    #[arg(long, default_value_t = false)]
    local_db: bool,

    /// Maximum number of database connections in the pool.
    #[arg(long, default_value_t = 5)]
    max_connections: u32,

    /// Lifetime of tokens issued at login, in minutes (overrides
    /// `TOKEN_EXPIRE_MINUTES`).
    #[arg(long, value_parser = clap::value_parser!(i64).range(1..=MAX_TOKEN_TTL_MINUTES))]
    token_ttl_minutes: Option<i64>,

    /// Seconds between expired-token sweeps (0 disables the sweep).
    #[arg(long, env = "TOKEN_SWEEP_INTERVAL_SECS", default_value_t = 300)]
    sweep_interval_secs: u64,
}

impl Args {
    /// Layer command-line overrides on top of `config`.
    fn apply_to(&self, mut config: ApiConfig) -> Result<ApiConfig, AuthError> {
        if let Some(addr) = &self.bind_addr {
            config.bind_addr = addr.clone();
        }
        if let Some(port) = self.port {
            config.bind_addr = with_port(&config.bind_addr, port);
        }
        if let Some(url) = &self.database_url {
            config.pg_connection_url = url.clone();
        }
        if let Some(minutes) = self.token_ttl_minutes {
            config.token_ttl = ttl_from_minutes(minutes)?;
        }
        Ok(config)
    }
}

/// Replace the port of a `host:port` address.
fn with_port(addr: &str, port: u16) -> String {
    let host = addr.rsplit_once(':').map_or(addr, |(host, _)| host);
    format!("{host}:{port}")
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("info,todo_api=debug,todo_core=debug")
            }),
        )
        .init();

    let args = Args::parse();
    let mut config = args.apply_to(ApiConfig::from_env())?;

    let mut local_db = None;
    if args.local_db {
        let mut mgr = DbManager::with_default_data_dir().await?;
        mgr.setup().await?;
        mgr.start().await?;
        config.pg_connection_url = mgr.connection_url();
        info!(data_dir = %mgr.data_dir().display(), "local PostgreSQL started");
        local_db = Some(mgr);
    }

    info!(
        bind_addr = %config.bind_addr,
        local_db = args.local_db,
        max_connections = args.max_connections,
        token_ttl_minutes = config.token_ttl.num_minutes(),
        "starting todo_api_server"
    );

    password::warm_up();

    let pool = PgPoolOptions::new()
        .max_connections(args.max_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&config.pg_connection_url)
        .await?;

    info!("running database migrations");
    todo_api::migrate(&pool).await?;

    let shutdown = CancellationToken::new();

    let sweeper = (args.sweep_interval_secs > 0).then(|| {
        tokio::spawn(sweep_expired_tokens(
            pool.clone(),
            Duration::from_secs(args.sweep_interval_secs),
            shutdown.clone(),
        ))
    });

    let state = todo_api::AppState {
        pool: pool.clone(),
        config: config.clone(),
    };
    let app = todo_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "REST API listening");

    let serve_result = axum::serve(listener, app)
        .with_graceful_shutdown({
            let shutdown = shutdown.clone();
            async move {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => info!("ctrl-c received, shutting down"),
                    _ = shutdown.cancelled() => {}
                }
            }
        })
        .await;

    shutdown.cancel();
    if let Some(handle) = sweeper {
        let _ = handle.await;
    }
    pool.close().await;

    if let Some(mut mgr) = local_db {
        mgr.stop().await?;
    }

    serve_result?;
    Ok(())
}

/// Periodically delete expired tokens until `shutdown` fires.
async fn sweep_expired_tokens(pool: PgPool, every: Duration, shutdown: CancellationToken) {
    let mut ticker = tokio::time::interval(every);
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {
                if let Err(e) = purge_expired_tokens(&pool).await {
                    warn!(error = %e, "expired-token sweep failed");
                }
            }
        }
    }
}

//! API server configuration.

use chrono::Duration;
use todo_core::auth::tokens::{default_ttl, ttl_from_minutes};

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:3100").
    pub bind_addr: String,
    /// PostgreSQL connection URL.
    pub pg_connection_url: String,
    /// Lifetime of tokens issued at login.
    pub token_ttl: Duration,
}

impl ApiConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable               | Default                          |
    /// |------------------------|----------------------------------|
    /// | `BIND_ADDR`            | `127.0.0.1:3100`                 |
    /// | `DATABASE_URL`         | `postgres://localhost:5432/todo` |
    /// | `TOKEN_EXPIRE_MINUTES` | `60`                             |
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3100".into()),
            pg_connection_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost:5432/todo".into()),
            token_ttl: parse_ttl(std::env::var("TOKEN_EXPIRE_MINUTES").ok().as_deref()),
        }
    }
}

/// Minutes to a TTL. Missing, unparsable or out-of-range values fall back
/// to the default.
fn parse_ttl(minutes: Option<&str>) -> Duration {
    minutes
        .and_then(|v| v.trim().parse::<i64>().ok())
        .and_then(|m| ttl_from_minutes(m).ok())
        .unwrap_or_else(default_ttl)
}

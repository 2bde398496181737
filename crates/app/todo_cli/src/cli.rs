use clap::{Parser, Subcommand};
use todo_core::auth::tokens::{DEFAULT_TOKEN_TTL_MINUTES, MAX_TOKEN_TTL_MINUTES};

#[derive(Parser, Debug)]
#[command(name = "todo", version, about = "Todo list in the terminal")]
pub struct Cli {
    /// PostgreSQL connection URL.
    #[arg(
        long,
        global = true,
        env = "DATABASE_URL",
        default_value = "postgres://localhost:5432/todo"
    )]
    pub database_url: String,

    /// Lifetime of session tokens issued at login, in minutes.
    #[arg(
        long,
        global = true,
        env = "TOKEN_EXPIRE_MINUTES",
        default_value_t = DEFAULT_TOKEN_TTL_MINUTES,
        value_parser = clap::value_parser!(i64).range(1..=MAX_TOKEN_TTL_MINUTES)
    )]
    pub token_ttl_minutes: i64,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Interactive login/register and todo menu
    Menu,
    /// Wipe all data and create one user with sample todos
    Seed {
        #[arg(long, default_value = "admin")]
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Check connectivity, schema and password hashing
    Diagnose,
    /// Show whether a user exists and list their todos
    Inspect { username: String },
    /// Delete expired session tokens
    PurgeTokens,
    /// Print version
    Version,
}

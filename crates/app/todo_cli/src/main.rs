// Import and re-export the `error` module
pub use self::error::{Error, Result};
mod error;

use std::io::{self, Write};
use std::time::Duration;

use clap::Parser;
use cli::{Cli, Commands};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use todo_core::auth::tokens;

mod cli;
mod commands;
mod logging;
mod menu;

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = run().await {
        log::error!("{}", e);
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> Result<()> {
    logging::init()?;

    let args = Cli::parse();
    let mut stdout = io::stdout();

    match &args.command {
        Commands::Version => {
            println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        }
        Commands::Diagnose => {
            let pool = match connect(&args.database_url).await {
                Ok(pool) => pool,
                Err(e) => {
                    writeln!(stdout, "[FAIL] connection: {e}")?;
                    return Err(Error::Custom("diagnostics failed".into()));
                }
            };
            let ok = commands::diagnose(&pool, &mut stdout).await?;
            pool.close().await;
            if !ok {
                return Err(Error::Custom("diagnostics failed".into()));
            }
        }
        Commands::Menu => {
            let pool = connect_migrated(&args.database_url).await?;
            let ttl = tokens::ttl_from_minutes(args.token_ttl_minutes)?;
            let stdin = io::stdin().lock();
            menu::Menu::new(&pool, ttl, stdin, &mut stdout).run().await?;
            pool.close().await;
        }
        Commands::Seed { username, password } => {
            let pool = connect_migrated(&args.database_url).await?;
            commands::seed(&pool, username, password, &mut stdout).await?;
            pool.close().await;
        }
        Commands::Inspect { username } => {
            let pool = connect_migrated(&args.database_url).await?;
            let found = commands::inspect(&pool, username, &mut stdout).await?;
            pool.close().await;
            if !found {
                return Err(Error::Custom(format!("user '{username}' not found")));
            }
        }
        Commands::PurgeTokens => {
            let pool = connect_migrated(&args.database_url).await?;
            commands::purge_tokens(&pool, &mut stdout).await?;
            pool.close().await;
        }
    }

    Ok(())
}

async fn connect(database_url: &str) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await?;
    Ok(pool)
}

async fn connect_migrated(database_url: &str) -> Result<PgPool> {
    let pool = connect(database_url).await?;
    todo_core::migrate::migrate(&pool).await?;
    Ok(pool)
}

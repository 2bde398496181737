//! Ephemeral PostgreSQL harness shared by the integration tests.

use sqlx::PgPool;
use todo_core::db::DbManager;

pub struct TestDb {
    pub pool: PgPool,
    mgr: DbManager,
}

impl TestDb {
    /// Start a throwaway PostgreSQL instance with the schema applied.
    pub async fn start() -> Self {
        let mut mgr = DbManager::ephemeral().await.expect("DbManager::ephemeral");
        mgr.setup().await.expect("db setup");
        mgr.start().await.expect("db start");
        let pool = mgr.connect_migrated().await.expect("connect + migrate");
        Self { pool, mgr }
    }

    pub async fn stop(mut self) {
        self.pool.close().await;
        self.mgr.stop().await.expect("db stop");
    }
}

//! Installation health checks: connectivity, schema, password hashing.

use sqlx::PgPool;

use crate::auth::password::{hash_password, verify_password};

/// Columns each table must have.
const REQUIRED_COLUMNS: [(&str, &[&str]); 3] = [
    ("users", &["id", "username", "password_hash"]),
    (
        "auth_tokens",
        &["id", "user_id", "token_hash", "created_at", "expires_at"],
    ),
    (
        "todos",
        &["id", "user_id", "task", "is_completed", "created_at"],
    ),
];

/// Result of one check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Check {
    pub name: String,
    pub ok: bool,
    pub detail: String,
}

impl Check {
    fn pass(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ok: true,
            detail: detail.into(),
        }
    }

    fn fail(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ok: false,
            detail: detail.into(),
        }
    }
}

/// Run all checks. Stops after the connection check if it fails.
pub async fn run(pool: &PgPool) -> Vec<Check> {
    let mut checks = Vec::new();

    match sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(pool).await {
        Ok(_) => checks.push(Check::pass("connection", "database reachable")),
        Err(e) => {
            checks.push(Check::fail("connection", e.to_string()));
            return checks;
        }
    }

    for (table, required) in REQUIRED_COLUMNS {
        checks.push(check_table(pool, table, required).await);
    }

    checks.push(check_password_roundtrip());
    checks
}

/// Returns true when every check passed.
pub fn all_ok(checks: &[Check]) -> bool {
    checks.iter().all(|c| c.ok)
}

async fn check_table(pool: &PgPool, table: &str, required: &[&str]) -> Check {
    let name = format!("table {table}");
    let columns = sqlx::query_scalar::<_, String>(
        "SELECT column_name::text FROM information_schema.columns \
         WHERE table_schema = 'public' AND table_name = $1",
    )
    .bind(table)
    .fetch_all(pool)
    .await;

    match columns {
        Err(e) => Check::fail(name, e.to_string()),
        Ok(columns) if columns.is_empty() => Check::fail(name, "table does not exist"),
        Ok(columns) => {
            let missing: Vec<&str> = required
                .iter()
                .copied()
                .filter(|c| !columns.iter().any(|have| have == c))
                .collect();
            if missing.is_empty() {
                Check::pass(name, "all required columns present")
            } else {
                Check::fail(name, format!("missing columns: {}", missing.join(", ")))
            }
        }
    }
}

fn check_password_roundtrip() -> Check {
    const PROBE: &str = "diagnostic-probe";
    match hash_password(PROBE) {
        Ok(hash) if verify_password(PROBE, &hash) && !verify_password("wrong", &hash) => {
            Check::pass("password hashing", "hash/verify round-trip succeeded")
        }
        Ok(_) => Check::fail("password hashing", "verification mismatch"),
        Err(e) => Check::fail("password hashing", e.to_string()),
    }
}

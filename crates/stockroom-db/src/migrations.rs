//! # Schema Manager
//!
//! Embedded SQL migrations plus the first-run bootstrap user.
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Schema Provisioning                                │
//! │                                                                         │
//! │  Database::new(config)                                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ensure_schema()                                                       │
//! │       ├── _sqlx_migrations missing? create it                          │
//! │       ├── 001_initial_schema.sql  (CREATE TABLE IF NOT EXISTS ...)     │
//! │       └── already applied? nothing to do                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ensure_bootstrap_user()                                               │
//! │       ├── users not empty? nothing to do                               │
//! │       └── empty? insert "Admin" / PIN 1234 / role admin                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Adding New Migrations
//!
//! 1. Create a new file in `migrations/sqlite/` with the next sequence number
//! 2. Name format: `NNN_description.sql`
//! 3. Write idempotent SQL (use `IF NOT EXISTS` where possible)
//! 4. **NEVER** modify existing migrations - always add new ones

use chrono::Utc;
use sqlx::SqlitePool;
use stockroom_core::auth::{hash_pin, BOOTSTRAP_ADMIN_NAME, BOOTSTRAP_PIN};
use stockroom_core::Role;
use tracing::{info, warn};

use crate::error::DbResult;

/// Embedded migrations from the workspace `migrations/sqlite` directory.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Creates every table, index and foreign key if absent.
///
/// ## Safety
/// - Idempotent: safe to run on every startup
/// - Transactional: each migration runs in a transaction
/// - Tables created before migrations were tracked are left in place, since
///   the initial migration only uses `IF NOT EXISTS`. Existing rows are not
///   converted: amounts must already be integer cents and thousandths.
pub async fn ensure_schema(pool: &SqlitePool) -> DbResult<()> {
    info!("Checking for pending migrations");

    MIGRATOR.run(pool).await?;

    info!("All migrations applied successfully");
    Ok(())
}

/// Creates the bootstrap admin if the `users` table is empty.
///
/// Returns `true` when a user was created. The PIN is the publicly
/// documented [`BOOTSTRAP_PIN`]; a warning is logged every time it is
/// issued so operators know to rotate it.
pub async fn ensure_bootstrap_user(pool: &SqlitePool) -> DbResult<bool> {
    let mut tx = pool.begin().await?;

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&mut *tx)
        .await?;

    if count > 0 {
        return Ok(false);
    }

    sqlx::query("INSERT INTO users (name, pin_hash, role, created_at) VALUES (?1, ?2, ?3, ?4)")
        .bind(BOOTSTRAP_ADMIN_NAME)
        .bind(hash_pin(BOOTSTRAP_PIN))
        .bind(Role::Admin)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    warn!(
        name = BOOTSTRAP_ADMIN_NAME,
        "Created bootstrap admin with the default PIN 1234; change it after first login"
    );
    Ok(true)
}

/// Returns information about migrations.
///
/// ## Returns
/// Tuple of (total_migrations, applied_migrations)
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let total = MIGRATOR.migrations.len();

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await?;

    Ok((total, applied as usize))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    const TABLES: [&str; 7] = [
        "users",
        "products",
        "stock",
        "clients",
        "transactions",
        "transaction_items",
        "payments",
    ];

    #[tokio::test]
    async fn test_schema_creates_all_tables() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        for table in TABLES {
            let found: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            )
            .bind(table)
            .fetch_one(db.pool())
            .await
            .unwrap();
            assert_eq!(found, 1, "missing table {table}");
        }
    }

    #[tokio::test]
    async fn test_ensure_schema_is_idempotent() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        ensure_schema(db.pool()).await.unwrap();
        ensure_schema(db.pool()).await.unwrap();

        let (total, applied) = migration_status(db.pool()).await.unwrap();
        assert_eq!(total, applied);
    }

    #[tokio::test]
    async fn test_leaves_untracked_tables_in_place() {
        let db = Database::new(DbConfig::in_memory().run_migrations(false))
            .await
            .unwrap();

        sqlx::query(
            "CREATE TABLE users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                pin_hash TEXT NOT NULL,
                role TEXT NOT NULL,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )",
        )
        .execute(db.pool())
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO users (name, pin_hash, role, created_at) VALUES ('Dana', ?1, 'operator', ?2)",
        )
        .bind(hash_pin("5678"))
        .bind(Utc::now())
        .execute(db.pool())
        .await
        .unwrap();

        ensure_schema(db.pool()).await.unwrap();

        // table and row kept as they were; later tables created alongside
        assert_eq!(db.users().count().await.unwrap(), 1);
        assert!(db.users().authenticate("5678").await.unwrap().is_some());
        assert_eq!(db.products().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_bootstrap_user_created_exactly_once() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        // Database::new already ran it.
        assert!(!ensure_bootstrap_user(db.pool()).await.unwrap());
        assert_eq!(db.users().count().await.unwrap(), 1);

        let admin = db.users().authenticate(BOOTSTRAP_PIN).await.unwrap().unwrap();
        assert_eq!(admin.name, BOOTSTRAP_ADMIN_NAME);
        assert_eq!(admin.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_bootstrap_skipped_when_users_exist() {
        let db = Database::new(DbConfig::in_memory().run_migrations(false))
            .await
            .unwrap();
        ensure_schema(db.pool()).await.unwrap();

        db.users()
            .create_user("Dana", "5678", Role::Operator)
            .await
            .unwrap();

        assert!(!ensure_bootstrap_user(db.pool()).await.unwrap());
        assert!(db.users().authenticate(BOOTSTRAP_PIN).await.unwrap().is_none());
    }
}

//! # Database Pool Management
//!
//! Connection pool creation and configuration for SQLite.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Database Handle                                    │
//! │                                                                         │
//! │  DbConfig::new(path) / Settings::load()?.db_config()                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::new(config).await ← pool + schema + bootstrap user          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌──────────────────────────────┐   ┌──────────────────────────────┐   │
//! │  │         SqlitePool           │   │        Write gate            │   │
//! │  │  ┌─────┐ ┌─────┐ ┌─────┐     │   │  tokio::sync::Mutex<()>      │   │
//! │  │  │Conn1│ │Conn2│ │Conn3│ ... │   │  held by every writer for    │   │
//! │  │  └─────┘ └─────┘ └─────┘     │   │  its whole transaction       │   │
//! │  └──────────────────────────────┘   └──────────────────────────────┘   │
//! │       │                                     │                           │
//! │       └──────────────┬──────────────────────┘                           │
//! │                      ▼                                                  │
//! │  db.users() / db.products() / db.stock() / db.clients() /              │
//! │  db.transactions()  ← cheap clones sharing pool and gate               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Why WAL Mode?
//! - Readers don't block the single writer
//! - Better crash recovery

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::client::ClientRepository;
use crate::repository::product::ProductRepository;
use crate::repository::stock::StockRepository;
use crate::repository::transaction::TransactionRepository;
use crate::repository::user::UserRepository;

// =============================================================================
// Configuration
// =============================================================================

/// Database configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("/path/to/store.db")
///     .max_connections(5)
///     .min_connections(1);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Path to the SQLite database file.
    pub database_path: PathBuf,

    /// Maximum number of connections in the pool.
    /// Default: 5
    pub max_connections: u32,

    /// Minimum number of connections to keep alive.
    /// Default: 1
    pub min_connections: u32,

    /// Connection acquire timeout.
    /// Default: 30 seconds
    pub connect_timeout: Duration,

    /// Idle timeout before closing a connection.
    /// Default: 10 minutes
    pub idle_timeout: Duration,

    /// How long a statement waits on a locked database before failing.
    /// Default: 5 seconds
    pub busy_timeout: Duration,

    /// Whether to provision the schema and bootstrap user on connect.
    /// Default: true
    pub run_migrations: bool,
}

impl DbConfig {
    /// Creates a new database configuration with the given path.
    ///
    /// The file is created if it doesn't exist. Creating its parent
    /// directory is the caller's job.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            busy_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Sets whether to provision schema and bootstrap user on connect.
    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// Creates an in-memory database configuration (for testing).
    ///
    /// Every call yields a separate, empty database.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(":memory:"),
            max_connections: 1, // In-memory requires single connection
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            busy_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }
}

// =============================================================================
// Database
// =============================================================================

/// Main database handle providing repository access.
///
/// There is no process-wide handle: whoever needs the store is given a
/// `Database` (or a repository cloned from one). Tests build one in-memory
/// instance each.
#[derive(Debug, Clone)]
pub struct Database {
    /// The SQLite connection pool.
    pool: SqlitePool,

    /// Serializes every writer. A deferred SQLite transaction cannot
    /// upgrade from read to write once another connection has committed,
    /// so no write may slip in between a commit's reads and its writes.
    write_gate: Arc<Mutex<()>>,
}

impl Database {
    /// Creates a new database connection pool.
    ///
    /// ## What This Does
    /// 1. Creates the database file if it doesn't exist
    /// 2. Configures SQLite:
    ///    - WAL mode for concurrent reads
    ///    - NORMAL synchronous (balance of safety/speed)
    ///    - Foreign keys enabled
    /// 3. Creates the connection pool
    /// 4. Provisions schema and bootstrap user (if enabled)
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            "Initializing database connection"
        );

        // sqlite://path creates file if not exists
        let connect_url = format!("sqlite://{}?mode=rwc", config.database_path.display());

        let connect_options = SqliteConnectOptions::from_str(&connect_url)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            // SQLite has them disabled by default for backwards compatibility
            .foreign_keys(true)
            .busy_timeout(config.busy_timeout)
            .create_if_missing(true);

        debug!("Connection options configured");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(Some(config.idle_timeout))
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        info!(
            max_connections = config.max_connections,
            "Database pool created"
        );

        let db = Database {
            pool,
            write_gate: Arc::new(Mutex::new(())),
        };

        if config.run_migrations {
            db.ensure_schema().await?;
            db.ensure_bootstrap_user().await?;
        }

        Ok(db)
    }

    /// Creates every table if absent. Idempotent.
    pub async fn ensure_schema(&self) -> DbResult<()> {
        migrations::ensure_schema(&self.pool).await
    }

    /// Creates the bootstrap admin when no user exists yet.
    pub async fn ensure_bootstrap_user(&self) -> DbResult<bool> {
        migrations::ensure_bootstrap_user(&self.pool).await
    }

    /// Returns a reference to the connection pool.
    ///
    /// For reporting queries not covered by repositories. Writes should go
    /// through repositories so they take the write gate.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Identity Store.
    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.pool.clone(), self.write_gate.clone())
    }

    /// Inventory Ledger: products.
    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone(), self.write_gate.clone())
    }

    /// Inventory Ledger: stock lots.
    pub fn stock(&self) -> StockRepository {
        StockRepository::new(self.pool.clone(), self.write_gate.clone())
    }

    pub fn clients(&self) -> ClientRepository {
        ClientRepository::new(self.pool.clone(), self.write_gate.clone())
    }

    /// Transaction Engine.
    pub fn transactions(&self) -> TransactionRepository {
        TransactionRepository::new(self.pool.clone(), self.write_gate.clone())
    }

    /// Closes the database connection pool.
    ///
    /// After calling close, all repository operations fail with
    /// `DbError::ConnectionFailed`.
    pub async fn close(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
    }

    /// Checks if the database can execute queries.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(db.health_check().await);
    }

    #[tokio::test]
    async fn test_in_memory_databases_are_isolated() {
        let a = Database::new(DbConfig::in_memory()).await.unwrap();
        let b = Database::new(DbConfig::in_memory()).await.unwrap();

        a.users()
            .create_user("Only In A", "2468", stockroom_core::Role::Operator)
            .await
            .unwrap();

        assert_eq!(a.users().count().await.unwrap(), 2);
        assert_eq!(b.users().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_closed_pool_is_a_storage_fault() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.close().await;

        assert!(!db.health_check().await);
        let err = db.users().find_by_id(1).await.unwrap_err();
        assert!(err.is_storage());
    }

    #[tokio::test]
    async fn test_file_database_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.db");

        let db = Database::new(DbConfig::new(&path)).await.unwrap();
        db.users()
            .create_user("Dana", "5678", stockroom_core::Role::Operator)
            .await
            .unwrap();
        db.close().await;

        let reopened = Database::new(DbConfig::new(&path)).await.unwrap();
        assert_eq!(reopened.users().count().await.unwrap(), 2);
        assert!(reopened.users().authenticate("5678").await.unwrap().is_some());
    }

    #[test]
    fn test_config_builder() {
        let config = DbConfig::new("/tmp/test.db")
            .max_connections(10)
            .min_connections(2)
            .run_migrations(false);

        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 2);
        assert!(!config.run_migrations);
    }
}

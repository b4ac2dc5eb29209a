//! # Back-Office Store
//!
//! Opens the station's SQLite file and hands out repositories.
//!
//! ## Access Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Period load (PeriodSession::load)                                      │
//! │                                                                         │
//! │    fuels().list_active()        ─┐                                      │
//! │    tanks().list()                │  run together, one connection each   │
//! │    tanks().list_stock_levels()   │  (max_connections = 4)               │
//! │    suppliers().list_active()    ─┘                                      │
//! │                                                                         │
//! │  Save (PeriodSession::save)                                             │
//! │                                                                         │
//! │    purchases().commit_batch() ── BEGIN ... COMMIT on one connection     │
//! │                                   others may keep reading (WAL)         │
//! │                                   a second writer waits busy_timeout    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Tests use [`DbConfig::in_memory`]: a single connection, so every
//! repository sees the same private database.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::fuel::FuelRepository;
use crate::repository::purchase::PurchaseRepository;
use crate::repository::supplier::SupplierRepository;
use crate::repository::tank::TankRepository;

// =============================================================================
// Configuration
// =============================================================================

/// Where the back-office database lives and how the pool is sized.
///
/// ```rust,ignore
/// let config = DbConfig::new("/var/lib/posto/posto.db").busy_timeout(Duration::from_secs(10));
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub database_path: PathBuf,

    /// One per concurrent registry read. Default: 4
    pub max_connections: u32,

    /// How long a save waits for another writer's lock. Default: 5 seconds
    pub busy_timeout: Duration,

    /// Default: true
    pub run_migrations: bool,
}

impl DbConfig {
    /// File-backed store, created on first open.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 4,
            busy_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// Private in-memory store for tests.
    ///
    /// Each `:memory:` connection is its own database, so the pool is
    /// limited to one connection; concurrent period reads queue on it.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(":memory:"),
            max_connections: 1,
            busy_timeout: Duration::from_secs(1),
            run_migrations: true,
        }
    }
}

// =============================================================================
// Database
// =============================================================================

/// Handle to the back-office store.
///
/// Clones share one pool; the period session owns one and tests clone it
/// to reopen a period against the same data.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the store and applies pending migrations.
    ///
    /// Connections run in WAL mode with NORMAL synchronous and foreign keys on.
    ///
    /// ## Errors
    /// - `DbError::ConnectionFailed` when the file cannot be opened
    /// - `DbError::MigrationFailed` when a migration fails
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            "Opening back-office store"
        );

        let connect_url = format!("sqlite://{}?mode=rwc", config.database_path.display());

        let connect_options = SqliteConnectOptions::from_str(&connect_url)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(config.busy_timeout)
            // Off by default in SQLite
            .foreign_keys(true)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        debug!(max_connections = config.max_connections, "Pool ready");

        let db = Database { pool };

        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Runs database migrations.
    pub async fn run_migrations(&self) -> DbResult<()> {
        info!("Running database migrations");
        migrations::run_migrations(&self.pool).await?;
        info!("Migrations complete");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Product registry.
    pub fn fuels(&self) -> FuelRepository {
        FuelRepository::new(self.pool.clone())
    }

    /// Tanks, tankless stock levels and tank history.
    pub fn tanks(&self) -> TankRepository {
        TankRepository::new(self.pool.clone())
    }

    pub fn suppliers(&self) -> SupplierRepository {
        SupplierRepository::new(self.pool.clone())
    }

    /// The save batch and what it stored.
    pub fn purchases(&self) -> PurchaseRepository {
        PurchaseRepository::new(self.pool.clone())
    }

    /// Waits for in-flight queries, then closes every connection.
    pub async fn close(&self) {
        info!("Closing back-office store");
        self.pool.close().await;
    }

    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

//! # posto-db: Database Layer for the Posto Back Office
//!
//! SQLite storage for the registries the period view reads and the batch
//! the save workflow writes.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Back Office Data Flow                               │
//! │                                                                         │
//! │  PeriodStore (posto-backoffice)                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     posto-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────────┐  ┌────────────┐  │   │
//! │  │   │   Database    │    │   Repositories     │  │ Migrations │  │   │
//! │  │   │   (pool.rs)   │    │                    │  │ (embedded) │  │   │
//! │  │   │               │◄───│ FuelRepository     │  │            │  │   │
//! │  │   │ SqlitePool    │    │ TankRepository     │  │ 001_init   │  │   │
//! │  │   │               │    │ SupplierRepository │  │            │  │   │
//! │  │   │               │    │ PurchaseRepository │  │            │  │   │
//! │  │   └───────────────┘    └────────────────────┘  └────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (posto.db)                  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use posto_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("posto.db")).await?;
//!
//! let fuels = db.fuels().list_active().await?;
//! let tanks = db.tanks().list().await?;
//! db.purchases().commit_batch(&plan.batch).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::fuel::FuelRepository;
pub use repository::purchase::PurchaseRepository;
pub use repository::supplier::SupplierRepository;
pub use repository::tank::TankRepository;

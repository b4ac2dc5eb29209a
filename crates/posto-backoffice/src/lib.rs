//! # posto-backoffice: Purchases / Stock / Sales Back Office
//!
//! Application layer over `posto-core` and `posto-db`.
//!
//! ## Module Organization
//! ```text
//! posto_backoffice/
//! ├── lib.rs          ◄── You are here (tracing setup, re-exports)
//! ├── main.rs         ◄── Headless entry point (prints the period report)
//! ├── config.rs       ◄── posto.toml + POSTO_* environment
//! ├── error.rs        ◄── ApiError / ErrorCode
//! ├── period.rs       ◄── PeriodView + shared PeriodState
//! ├── save.rs         ◄── PeriodSession and the save workflow
//! └── store.rs        ◄── PeriodStore collaborator trait (+ SQLite impl)
//! ```
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. init_tracing()                                                     │
//! │  2. BackOfficeConfig::load()      posto.toml, then POSTO_* overrides   │
//! │  3. Database::new()               pool + embedded migrations           │
//! │  4. PeriodSession::load()         registries ──► seeded PeriodView     │
//! │  5. session.report() / session.save()                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod period;
pub mod save;
pub mod store;

pub use config::{BackOfficeConfig, ConfigError};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use period::{PeriodState, PeriodView};
pub use save::{PeriodSession, SaveOutcome};
pub use store::PeriodStore;

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Initializes the tracing subscriber for logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` for development
/// - `RUST_LOG=info` for production
/// - `RUST_LOG=posto=trace` for detailed back-office logs
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,posto=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::TRACE)
        .init();
}

//! # posto-core: Pure Fuel Costing Engine
//!
//! The logic behind the purchases / stock / sales screen of the fuel
//! station back office, as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Posto Back Office Architecture                      │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 posto-backoffice (Application)                  │   │
//! │  │   PeriodState ──► PeriodSession (save guard) ──► PeriodStore    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ posto-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌────────────┐  │   │
//! │  │   │  numeric  │  │  costing  │  │  totals   │  │reconcilia- │  │   │
//! │  │   │ normalize │─►│ per-fuel  │─►│  period   │  │   tion     │  │   │
//! │  │   │ parse/fmt │  │ metrics   │  │  totals   │  │ save plan  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    posto-db (Database Layer)                    │   │
//! │  │        SQLite registries, migrations, batch persistence         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`numeric`] - Brazilian-locale numeric input normalizer
//! - [`money`] - `Money`, `Liters`, `Percent` exact decimal types
//! - [`types`] - Domain types (FuelProduct, Tank, ProductPeriodRecord, etc.)
//! - [`costing`] - Per-product derivations
//! - [`totals`] - Period totals aggregator
//! - [`reconciliation`] - Save batch and roll-forward construction
//! - [`validation`] - Save-time rules
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: derivations are deterministic and hold no state
//! 2. **Total Functions**: malformed input is zero, every division is guarded
//! 3. **Exact Decimals**: no floating point anywhere in the engine
//! 4. **One Source of Truth**: math reads parsed values, never display text
//!
//! ## Example Usage
//!
//! ```rust
//! use posto_core::{compute_period, FuelProduct, Liters, Money, ProductPeriodRecord, RecordField};
//! use rust_decimal::Decimal;
//!
//! let product = FuelProduct {
//!     id: "gc".to_string(),
//!     name: "Gasolina Comum".to_string(),
//!     code: "GC".to_string(),
//!     cost_price: Money::new(Decimal::new(510, 2)),
//!     sale_price: Money::new(Decimal::new(629, 2)),
//!     is_active: true,
//! };
//!
//! let mut record = ProductPeriodRecord::new(product, Liters::new(Decimal::new(2000, 0)));
//! record.set_field(RecordField::MeterStart, "1.000,000");
//! record.set_field(RecordField::MeterEnd, "1.250,500");
//!
//! let report = compute_period(&[record], Money::ZERO);
//! assert_eq!(report.totals.total_sold.value(), Decimal::new(2505, 1));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod costing;
pub mod error;
pub mod money;
pub mod numeric;
pub mod reconciliation;
pub mod totals;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use costing::{DerivedProductMetrics, LossGain, LossGainKind, PeriodBasis};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{Liters, Money, Percent};
pub use numeric::{FieldKind, NumericField};
pub use reconciliation::{build_save_plan, PurchaseBatch, RollForward, SavePlan, SaveRequest};
pub use totals::{compute_period, PeriodReport, PeriodTotals};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Fraction digits for volumes (meter readings, purchases, stock).
pub const VOLUME_DECIMALS: u32 = 3;

/// Fraction digits for the per-liter sale price field.
pub const UNIT_PRICE_DECIMALS: u32 = 3;

/// Fraction digits for currency totals.
pub const CURRENCY_DECIMALS: u32 = 2;

/// Fraction digits kept when a blended cost price is persisted.
pub const COST_PRICE_DECIMALS: u32 = 4;

//! # Repository Module
//!
//! Database repository implementations for the back office.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Period view load                       Save workflow                  │
//! │       │                                      │                          │
//! │       │  db.fuels().list_active()            │  db.purchases()          │
//! │       │  db.tanks().list()                   │     .commit_batch(&b)    │
//! │       │  db.suppliers().list_active()        │                          │
//! │       ▼                                      ▼                          │
//! │  Row structs (FromRow) ──► TryFrom ──► posto-core domain types         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`fuel::FuelRepository`] - Fuel products
//! - [`tank::TankRepository`] - Tanks, stock registry, tank history
//! - [`supplier::SupplierRepository`] - Suppliers
//! - [`purchase::PurchaseRepository`] - Atomic save batch and purchase reads

pub mod fuel;
pub mod purchase;
pub mod supplier;
pub mod tank;

use rust_decimal::Decimal;
use std::str::FromStr;

use crate::error::{DbError, DbResult};

/// Parses a TEXT decimal column.
pub(crate) fn parse_decimal(column: &str, raw: &str) -> DbResult<Decimal> {
    Decimal::from_str(raw.trim()).map_err(|_| DbError::invalid_value(column, raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal("x", "1250.500").unwrap(), dec!(1250.5));
        assert_eq!(parse_decimal("x", "-50").unwrap(), dec!(-50));
        assert!(matches!(
            parse_decimal("tanks.current_stock", "1.250,5"),
            Err(DbError::InvalidValue { .. })
        ));
    }
}

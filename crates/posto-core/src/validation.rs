//! # Validation Module
//!
//! Save-time rules. Numeric fields themselves are never rejected (blank or
//! malformed text is zero); only the batch handed to storage is checked.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Numeric normalizer                                           │
//! │  └── Every keystroke becomes a well-formed value (never an error)      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Save workflow (THIS MODULE)                                  │
//! │  ├── Supplier selected when anything was purchased                     │
//! │  ├── Selected supplier exists                                          │
//! │  └── One record per product                                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK constraints on liters / values                              │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashSet;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::{ProductPeriodRecord, Supplier};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// True when any product has liters purchased this period.
pub fn requires_supplier(records: &[ProductPeriodRecord]) -> bool {
    records.iter().any(|r| r.purchased_liters().is_positive())
}

/// Resolves the selected supplier against the loaded list.
///
/// ## Rules
/// - A supplier is required when any product has a purchase
/// - A selected id (blank ids count as unselected) must exist in `suppliers`
///
/// ## Example
/// ```rust
/// use posto_core::validation::validate_supplier_selection;
/// use posto_core::types::Supplier;
///
/// let suppliers = vec![Supplier {
///     id: "sup-1".to_string(),
///     name: "Distribuidora Sul".to_string(),
///     tax_id: None,
///     is_active: true,
/// }];
///
/// assert!(validate_supplier_selection(Some("sup-1"), &suppliers, true).is_ok());
/// assert!(validate_supplier_selection(None, &suppliers, true).is_err());
/// assert!(validate_supplier_selection(None, &suppliers, false).unwrap().is_none());
/// ```
pub fn validate_supplier_selection<'a>(
    selected: Option<&str>,
    suppliers: &'a [Supplier],
    required: bool,
) -> CoreResult<Option<&'a Supplier>> {
    let selected = selected.map(str::trim).filter(|id| !id.is_empty());

    match selected {
        None if required => Err(ValidationError::Required {
            field: "supplier".to_string(),
        }
        .into()),
        None => Ok(None),
        Some(id) => suppliers
            .iter()
            .find(|s| s.id == id)
            .map(Some)
            .ok_or_else(|| CoreError::SupplierNotFound(id.to_string())),
    }
}

/// Each product may appear only once in a period.
pub fn validate_unique_products(records: &[ProductPeriodRecord]) -> ValidationResult<()> {
    let mut seen = HashSet::new();
    for record in records {
        if !seen.insert(record.product_id()) {
            return Err(ValidationError::Duplicate {
                field: "product".to_string(),
                value: record.product_id().to_string(),
            });
        }
    }
    Ok(())
}

/// Purchase figures must not be negative.
///
/// Typed input cannot carry a sign, but records can also be built from
/// stored values.
pub fn validate_purchase(record: &ProductPeriodRecord) -> ValidationResult<()> {
    if record.purchased_liters().is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: "purchased_liters".to_string(),
        });
    }
    if record.purchased_value().is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: "purchased_value".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::{Liters, Money};
    use crate::numeric::FieldKind;
    use crate::numeric::NumericField;
    use crate::types::{FuelProduct, RecordField};
    use rust_decimal_macros::dec;

    fn record(id: &str) -> ProductPeriodRecord {
        let product = FuelProduct {
            id: id.to_string(),
            name: id.to_string(),
            code: id.to_uppercase(),
            cost_price: Money::new(dec!(5)),
            sale_price: Money::new(dec!(6)),
            is_active: true,
        };
        ProductPeriodRecord::new(product, Liters::ZERO)
    }

    fn suppliers() -> Vec<Supplier> {
        vec![Supplier {
            id: "sup-1".to_string(),
            name: "Distribuidora Sul".to_string(),
            tax_id: Some("12.345.678/0001-90".to_string()),
            is_active: true,
        }]
    }

    #[test]
    fn test_requires_supplier_only_with_purchase() {
        let mut records = vec![record("gc"), record("et")];
        assert!(!requires_supplier(&records));

        records[1].set_field(RecordField::PurchasedLiters, "3000");
        assert!(requires_supplier(&records));
    }

    #[test]
    fn test_missing_supplier_is_required_error() {
        let err = validate_supplier_selection(Some("  "), &suppliers(), true).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::Required { .. })
        ));
    }

    #[test]
    fn test_unknown_supplier_is_rejected() {
        let err = validate_supplier_selection(Some("sup-9"), &suppliers(), false).unwrap_err();
        assert!(matches!(err, CoreError::SupplierNotFound(id) if id == "sup-9"));
    }

    #[test]
    fn test_known_supplier_resolves() {
        let list = suppliers();
        let supplier = validate_supplier_selection(Some("sup-1"), &list, true)
            .unwrap()
            .unwrap();
        assert_eq!(supplier.name, "Distribuidora Sul");
    }

    #[test]
    fn test_duplicate_products() {
        assert!(validate_unique_products(&[record("gc"), record("et")]).is_ok());

        let err = validate_unique_products(&[record("gc"), record("gc")]).unwrap_err();
        assert_eq!(err.to_string(), "product 'gc' already exists");
    }

    #[test]
    fn test_negative_purchase_rejected() {
        let mut r = record("gc");
        r.purchased_value = NumericField::from_value(FieldKind::Currency, dec!(-10));
        assert!(validate_purchase(&r).is_err());

        assert!(validate_purchase(&record("gc")).is_ok());
    }
}

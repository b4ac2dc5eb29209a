//! # Domain Types
//!
//! Reference data loaded once per period and the mutable working record
//! the operator edits.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Reference data (read-only for the engine)                             │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  FuelProduct    │   │      Tank       │   │    Supplier     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id, name, code │   │  product_id     │   │  id, name       │       │
//! │  │  cost_price     │   │  current_stock  │   │  tax_id         │       │
//! │  │  sale_price     │   │  capacity       │   │                 │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  Working state (one per product per period)                            │
//! │  ┌──────────────────────────────────────────────────────────────┐      │
//! │  │  ProductPeriodRecord                                          │      │
//! │  │  meter_start / meter_end          (NumericField, liters)      │      │
//! │  │  purchased_liters / purchased_value                           │      │
//! │  │  prior_stock / physical_measurement                           │      │
//! │  │  current_sale_price                                           │      │
//! │  └──────────────────────────────────────────────────────────────┘      │
//! │  PeriodExpensePool: one scalar shared by every product                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::{Liters, Money};
use crate::numeric::{FieldKind, NumericField};

// =============================================================================
// Reference Data
// =============================================================================

/// A fuel sold by the station (gasoline, ethanol, diesel...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FuelProduct {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name ("Gasolina Comum").
    pub name: String,

    /// Short code shown in tables ("GC").
    pub code: String,

    /// Registered cost per liter; the fallback cost basis.
    pub cost_price: Money,

    /// Registered sale price per liter.
    pub sale_price: Money,

    /// Inactive products are left out of the period view.
    pub is_active: bool,
}

/// A storage tank holding one fuel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Tank {
    pub id: String,
    pub product_id: String,
    pub name: String,
    pub capacity: Liters,
    /// Current book stock in the tank.
    pub current_stock: Liters,
}

/// Stock registry entry for products without a registered tank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockLevel {
    pub product_id: String,
    pub quantity: Liters,
}

/// A fuel distributor; only used to tag the persisted purchase batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Supplier {
    pub id: String,
    pub name: String,
    /// CNPJ, when registered.
    pub tax_id: Option<String>,
    pub is_active: bool,
}

// =============================================================================
// Record Field
// =============================================================================

/// The operator-editable fields of a [`ProductPeriodRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordField {
    MeterStart,
    MeterEnd,
    PurchasedLiters,
    PurchasedValue,
    PriorStock,
    PhysicalMeasurement,
    CurrentSalePrice,
}

// =============================================================================
// Product Period Record
// =============================================================================

/// The mutable working record for one fuel in the current period.
///
/// ## Lifecycle
/// ```text
/// period view loads ──► seed() ──► operator edits (set_field) ──┐
///                                        ▲                       │
///                                        │ save failed           ▼
///                                        └─────────────── save workflow
///                                                                │ success
///                                                                ▼
///                                                 roll forward / fields reset
/// ```
///
/// ## Invariants
/// - Every editable quantity is a [`NumericField`]; derivations read only
///   the parsed values through the accessors below.
/// - `meter_end < meter_start` is accepted input (counter reset) and is
///   handled by the derivations, not rejected here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPeriodRecord {
    /// Reference data snapshot for this period.
    pub product: FuelProduct,

    /// Tank holding this fuel, when one is registered.
    pub tank_id: Option<String>,

    pub meter_start: NumericField,
    pub meter_end: NumericField,
    pub purchased_liters: NumericField,
    pub purchased_value: NumericField,
    pub prior_stock: NumericField,
    pub physical_measurement: NumericField,
    pub current_sale_price: NumericField,
}

impl ProductPeriodRecord {
    /// Creates a blank record for a product with the given prior stock.
    ///
    /// The sale price starts at the registered sale price.
    pub fn new(product: FuelProduct, prior_stock: Liters) -> Self {
        let sale_price = product.sale_price.amount();
        ProductPeriodRecord {
            product,
            tank_id: None,
            meter_start: NumericField::empty(FieldKind::Volume),
            meter_end: NumericField::empty(FieldKind::Volume),
            purchased_liters: NumericField::empty(FieldKind::Volume),
            purchased_value: NumericField::empty(FieldKind::Currency),
            prior_stock: NumericField::from_value(FieldKind::Volume, prior_stock.value()),
            physical_measurement: NumericField::empty(FieldKind::Volume),
            current_sale_price: NumericField::from_value(FieldKind::UnitPrice, sale_price),
        }
    }

    /// Seeds a record from the registries.
    ///
    /// Prior stock comes from the product's tank when one exists, otherwise
    /// from the stock registry, otherwise zero.
    pub fn seed(product: FuelProduct, tank: Option<&Tank>, stock: Option<&StockLevel>) -> Self {
        let prior_stock = match (tank, stock) {
            (Some(tank), _) => tank.current_stock,
            (None, Some(stock)) => stock.quantity,
            (None, None) => Liters::ZERO,
        };

        let mut record = ProductPeriodRecord::new(product, prior_stock);
        record.tank_id = tank.map(|t| t.id.clone());
        record
    }

    /// Returns the product id.
    pub fn product_id(&self) -> &str {
        &self.product.id
    }

    /// Mutable access to one editable field.
    pub fn field_mut(&mut self, field: RecordField) -> &mut NumericField {
        match field {
            RecordField::MeterStart => &mut self.meter_start,
            RecordField::MeterEnd => &mut self.meter_end,
            RecordField::PurchasedLiters => &mut self.purchased_liters,
            RecordField::PurchasedValue => &mut self.purchased_value,
            RecordField::PriorStock => &mut self.prior_stock,
            RecordField::PhysicalMeasurement => &mut self.physical_measurement,
            RecordField::CurrentSalePrice => &mut self.current_sale_price,
        }
    }

    /// Read access to one editable field.
    pub fn field(&self, field: RecordField) -> &NumericField {
        match field {
            RecordField::MeterStart => &self.meter_start,
            RecordField::MeterEnd => &self.meter_end,
            RecordField::PurchasedLiters => &self.purchased_liters,
            RecordField::PurchasedValue => &self.purchased_value,
            RecordField::PriorStock => &self.prior_stock,
            RecordField::PhysicalMeasurement => &self.physical_measurement,
            RecordField::CurrentSalePrice => &self.current_sale_price,
        }
    }

    /// Applies a keystroke buffer to one field.
    pub fn set_field(&mut self, field: RecordField, raw: &str) {
        self.field_mut(field).set_text(raw);
    }

    // -------------------------------------------------------------------------
    // Parsed values (the only inputs derivations read)
    // -------------------------------------------------------------------------

    pub fn meter_start(&self) -> Liters {
        Liters::new(self.meter_start.value())
    }

    pub fn meter_end(&self) -> Liters {
        Liters::new(self.meter_end.value())
    }

    pub fn purchased_liters(&self) -> Liters {
        Liters::new(self.purchased_liters.value())
    }

    pub fn purchased_value(&self) -> Money {
        Money::new(self.purchased_value.value())
    }

    pub fn prior_stock(&self) -> Liters {
        Liters::new(self.prior_stock.value())
    }

    pub fn current_sale_price(&self) -> Money {
        Money::new(self.current_sale_price.value())
    }

    /// The tank gauge reading, or `None` when not measured this period.
    ///
    /// A blank field and an explicit zero both mean "not measured".
    pub fn physical_measurement(&self) -> Option<Liters> {
        let value = self.physical_measurement.value();
        if value.is_zero() {
            None
        } else {
            Some(Liters::new(value))
        }
    }

    /// True when the operator typed into any meter, purchase or
    /// measurement field.
    pub fn has_operator_input(&self) -> bool {
        !(self.meter_start.is_blank()
            && self.meter_end.is_blank()
            && self.purchased_liters.is_blank()
            && self.purchased_value.is_blank()
            && self.physical_measurement.is_blank())
    }
}

// =============================================================================
// Period Expense Pool
// =============================================================================

/// Total operational expense declared for the period, shared by all fuels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodExpensePool {
    field: NumericField,
}

impl PeriodExpensePool {
    /// An empty pool (zero expense).
    pub fn new() -> Self {
        PeriodExpensePool {
            field: NumericField::empty(FieldKind::Currency),
        }
    }

    /// A pool pre-filled with an amount.
    pub fn from_amount(amount: Money) -> Self {
        PeriodExpensePool {
            field: NumericField::from_value(FieldKind::Currency, amount.amount()),
        }
    }

    /// Applies a keystroke buffer.
    pub fn set_text(&mut self, raw: &str) {
        self.field.set_text(raw);
    }

    pub fn text(&self) -> &str {
        self.field.text()
    }

    pub fn amount(&self) -> Money {
        Money::new(self.field.value())
    }

    pub fn is_blank(&self) -> bool {
        self.field.is_blank()
    }
}

impl Default for PeriodExpensePool {
    fn default() -> Self {
        PeriodExpensePool::new()
    }
}

impl From<Decimal> for PeriodExpensePool {
    fn from(amount: Decimal) -> Self {
        PeriodExpensePool::from_amount(Money::new(amount))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn gasoline() -> FuelProduct {
        FuelProduct {
            id: "gc".to_string(),
            name: "Gasolina Comum".to_string(),
            code: "GC".to_string(),
            cost_price: Money::new(dec!(5.10)),
            sale_price: Money::new(dec!(6.29)),
            is_active: true,
        }
    }

    fn tank(stock: Decimal) -> Tank {
        Tank {
            id: "t1".to_string(),
            product_id: "gc".to_string(),
            name: "Tanque 1".to_string(),
            capacity: Liters::new(dec!(15000)),
            current_stock: Liters::new(stock),
        }
    }

    #[test]
    fn test_seed_prefers_tank_stock() {
        let stock = StockLevel {
            product_id: "gc".to_string(),
            quantity: Liters::new(dec!(100)),
        };
        let record = ProductPeriodRecord::seed(gasoline(), Some(&tank(dec!(2000))), Some(&stock));

        assert_eq!(record.prior_stock().value(), dec!(2000));
        assert_eq!(record.tank_id.as_deref(), Some("t1"));
        assert_eq!(record.prior_stock.text(), "2.000,000");
    }

    #[test]
    fn test_seed_falls_back_to_stock_registry_then_zero() {
        let stock = StockLevel {
            product_id: "gc".to_string(),
            quantity: Liters::new(dec!(750.5)),
        };
        let from_registry = ProductPeriodRecord::seed(gasoline(), None, Some(&stock));
        assert_eq!(from_registry.prior_stock().value(), dec!(750.5));
        assert!(from_registry.tank_id.is_none());

        let empty = ProductPeriodRecord::seed(gasoline(), None, None);
        assert_eq!(empty.prior_stock(), Liters::ZERO);
    }

    #[test]
    fn test_seed_uses_registered_sale_price() {
        let record = ProductPeriodRecord::seed(gasoline(), None, None);
        assert_eq!(record.current_sale_price().amount(), dec!(6.29));
        assert_eq!(record.current_sale_price.text(), "6,290");
    }

    #[test]
    fn test_set_field_reparses_value() {
        let mut record = ProductPeriodRecord::seed(gasoline(), None, None);
        record.set_field(RecordField::MeterEnd, "1250,5");

        assert_eq!(record.meter_end.text(), "1.250,5");
        assert_eq!(record.meter_end().value(), dec!(1250.5));
    }

    #[test]
    fn test_physical_measurement_zero_is_not_measured() {
        let mut record = ProductPeriodRecord::seed(gasoline(), None, None);
        assert_eq!(record.physical_measurement(), None);

        record.set_field(RecordField::PhysicalMeasurement, "0");
        assert_eq!(record.physical_measurement(), None);

        record.set_field(RecordField::PhysicalMeasurement, "5000");
        assert_eq!(record.physical_measurement(), Some(Liters::new(dec!(5000))));
    }

    #[test]
    fn test_has_operator_input() {
        let mut record = ProductPeriodRecord::seed(gasoline(), Some(&tank(dec!(10))), None);
        assert!(!record.has_operator_input());

        record.set_field(RecordField::PurchasedLiters, "500");
        assert!(record.has_operator_input());
    }

    #[test]
    fn test_expense_pool() {
        let mut pool = PeriodExpensePool::new();
        assert!(pool.is_blank());
        assert_eq!(pool.amount(), Money::ZERO);

        pool.set_text("1000,00");
        assert_eq!(pool.text(), "1.000,00");
        assert_eq!(pool.amount().amount(), dec!(1000));
    }
}

//! # Save Plan
//!
//! The pure half of the save workflow: turns the current period into the
//! batch handed to storage, plus the roll-forward applied to the working
//! records once storage reports success.
//!
//! ## Save Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  records + expense + supplier                                           │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  build_save_plan()  ── validation error ──► nothing changes             │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  SavePlan { batch, roll_forward }                                       │
//! │        │                                                                │
//! │        ├── batch ──► storage (one transaction, all or nothing)          │
//! │        │                 │                                              │
//! │        │        failure ─┴─► records untouched, operator retries        │
//! │        │                 │                                              │
//! │        │        success  ▼                                              │
//! │        └── roll_forward.apply() ──► next period's starting state        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::RoundingStrategy;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::costing::{projected_book_stock, stock_available, volume_sold};
use crate::error::CoreResult;
use crate::money::{safe_div, Liters, Money};
use crate::types::ProductPeriodRecord;
use crate::types::Supplier;
use crate::validation::{
    requires_supplier, validate_purchase, validate_supplier_selection, validate_unique_products,
};
use crate::COST_PRICE_DECIMALS;

// =============================================================================
// Batch Contents
// =============================================================================

/// One purchase received this period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PurchaseRecord {
    pub id: String,
    pub product_id: String,
    pub supplier_id: String,
    #[ts(type = "string")]
    pub period_date: NaiveDate,
    pub liters: Liters,
    pub total_value: Money,
    /// Zero when `liters` is zero.
    pub cost_per_liter: Money,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Reconciled stock for a product at the end of the period:
/// `prior + purchased − sold`, the same figure carried into the next period.
///
/// Written to the tank when one is registered, otherwise to the stock
/// registry entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockUpdate {
    pub product_id: String,
    pub tank_id: Option<String>,
    /// May be negative when meters and stock disagree.
    pub book_stock: Liters,
}

/// New registered cost price after blending the purchase into stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CostPriceUpdate {
    pub product_id: String,
    pub old_cost: Money,
    pub new_cost: Money,
}

/// Book vs physical stock at the end of the period, per tank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockSnapshot {
    pub id: String,
    pub tank_id: String,
    pub product_id: String,
    #[ts(type = "string")]
    pub period_date: NaiveDate,
    pub book_volume: Liters,
    /// Only when a positive measurement was entered.
    pub physical_volume: Option<Liters>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Everything written by one save. Storage must apply all of it or none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PurchaseBatch {
    #[ts(type = "string")]
    pub period_date: NaiveDate,
    pub supplier_id: Option<String>,
    pub period_expense: Money,
    pub purchases: Vec<PurchaseRecord>,
    pub stock_updates: Vec<StockUpdate>,
    pub cost_updates: Vec<CostPriceUpdate>,
    pub snapshots: Vec<StockSnapshot>,
}

impl PurchaseBatch {
    /// True when the batch carries no purchases.
    pub fn is_stock_only(&self) -> bool {
        self.purchases.is_empty()
    }

    /// Total liters purchased across the batch.
    pub fn total_liters(&self) -> Liters {
        self.purchases.iter().map(|p| p.liters).sum()
    }
}

// =============================================================================
// Roll Forward
// =============================================================================

/// The next period's starting state for one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollForward {
    pub product_id: String,
    /// Becomes the new prior stock.
    pub prior_stock: Liters,
    /// Becomes the new starting meter; `None` keeps the current one.
    pub meter_start: Option<Liters>,
    /// Replaces the product's registered cost price.
    pub cost_price: Option<Money>,
}

impl RollForward {
    /// Resets the record's transient fields and carries stock forward.
    pub fn apply(&self, record: &mut ProductPeriodRecord) {
        record.prior_stock.set_value(self.prior_stock.value());
        record.purchased_liters.clear();
        record.purchased_value.clear();

        if let Some(meter) = self.meter_start {
            record.meter_start.set_value(meter.value());
        }
        record.meter_end.clear();
        record.physical_measurement.clear();

        if let Some(cost) = self.cost_price {
            record.product.cost_price = cost;
        }
    }
}

/// A validated batch and what to do with the records once it is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavePlan {
    pub batch: PurchaseBatch,
    pub roll_forward: Vec<RollForward>,
}

impl SavePlan {
    /// Applies each roll-forward to the record with the same product id.
    ///
    /// Records without a matching entry are left alone.
    pub fn apply_roll_forward(&self, records: &mut [ProductPeriodRecord]) {
        for record in records.iter_mut() {
            if let Some(step) = self
                .roll_forward
                .iter()
                .find(|step| step.product_id == record.product.id)
            {
                step.apply(record);
            }
        }
    }
}

// =============================================================================
// Plan Construction
// =============================================================================

/// Blends a purchase into existing stock:
/// `(max(prior, 0) × old_cost + value) / (max(prior, 0) + liters)`.
///
/// Keeps `old_cost` when the combined volume is zero. The result is
/// rounded to [`COST_PRICE_DECIMALS`].
///
/// ## Example
/// ```rust
/// use posto_core::money::{Liters, Money};
/// use posto_core::reconciliation::moving_average_cost;
/// use rust_decimal::Decimal;
///
/// // 1.000 L at R$ 5,00 + 1.000 L bought for R$ 5.200,00
/// let cost = moving_average_cost(
///     Liters::new(Decimal::new(1000, 0)),
///     Money::new(Decimal::new(5, 0)),
///     Liters::new(Decimal::new(1000, 0)),
///     Money::new(Decimal::new(5200, 0)),
/// );
/// assert_eq!(cost.amount(), Decimal::new(51, 1));
/// ```
pub fn moving_average_cost(
    prior_stock: Liters,
    old_cost: Money,
    purchased_liters: Liters,
    purchased_value: Money,
) -> Money {
    let prior = prior_stock.clamp_non_negative();
    let combined = prior + purchased_liters;
    if combined.is_zero() {
        return old_cost;
    }

    let stock_value = old_cost * prior + purchased_value;
    let blended = safe_div(stock_value.amount(), combined.value());
    Money::new(blended.round_dp_with_strategy(
        COST_PRICE_DECIMALS,
        RoundingStrategy::MidpointAwayFromZero,
    ))
}

/// Inputs to [`build_save_plan`].
#[derive(Debug, Clone, Copy)]
pub struct SaveRequest<'a> {
    pub records: &'a [ProductPeriodRecord],
    pub period_expense: Money,
    pub supplier_id: Option<&'a str>,
    pub suppliers: &'a [Supplier],
    pub period_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Validates the period and builds the storage batch and roll-forward.
///
/// ## Errors
/// - `ValidationError::Required` when something was purchased and no
///   supplier is selected
/// - `CoreError::SupplierNotFound` for an unknown supplier id
/// - `ValidationError::Duplicate` when a product appears twice
pub fn build_save_plan(request: SaveRequest<'_>) -> CoreResult<SavePlan> {
    let records = request.records;

    validate_unique_products(records)?;
    for record in records {
        validate_purchase(record)?;
    }
    let supplier = validate_supplier_selection(
        request.supplier_id,
        request.suppliers,
        requires_supplier(records),
    )?;
    let supplier_id = supplier.map(|s| s.id.clone());

    let mut batch = PurchaseBatch {
        period_date: request.period_date,
        supplier_id: supplier_id.clone(),
        period_expense: request.period_expense,
        purchases: Vec::new(),
        stock_updates: Vec::new(),
        cost_updates: Vec::new(),
        snapshots: Vec::new(),
    };
    let mut roll_forward = Vec::with_capacity(records.len());

    for record in records {
        let product_id = record.product_id().to_string();
        let liters = record.purchased_liters();
        let value = record.purchased_value();
        let book = projected_book_stock(stock_available(record), volume_sold(record));
        let mut next_cost = None;

        // Validation guarantees a supplier whenever liters > 0.
        if let Some(supplier_id) = supplier_id.as_ref().filter(|_| liters.is_positive()) {
            batch.purchases.push(PurchaseRecord {
                id: Uuid::new_v4().to_string(),
                product_id: product_id.clone(),
                supplier_id: supplier_id.clone(),
                period_date: request.period_date,
                liters,
                total_value: value,
                cost_per_liter: value.per_liter(liters),
                created_at: request.created_at,
            });

            let old_cost = record.product.cost_price;
            let new_cost = moving_average_cost(record.prior_stock(), old_cost, liters, value);
            if new_cost != old_cost {
                batch.cost_updates.push(CostPriceUpdate {
                    product_id: product_id.clone(),
                    old_cost,
                    new_cost,
                });
                next_cost = Some(new_cost);
            }
        }

        batch.stock_updates.push(StockUpdate {
            product_id: product_id.clone(),
            tank_id: record.tank_id.clone(),
            book_stock: book,
        });

        if let Some(tank_id) = &record.tank_id {
            batch.snapshots.push(StockSnapshot {
                id: Uuid::new_v4().to_string(),
                tank_id: tank_id.clone(),
                product_id: product_id.clone(),
                period_date: request.period_date,
                book_volume: book,
                physical_volume: record.physical_measurement().filter(|l| l.is_positive()),
                created_at: request.created_at,
            });
        }

        roll_forward.push(RollForward {
            product_id,
            prior_stock: book,
            meter_start: (!record.meter_end.is_blank()).then(|| record.meter_end()),
            cost_price: next_cost,
        });
    }

    Ok(SavePlan {
        batch,
        roll_forward,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CoreError, ValidationError};
    use crate::types::{FuelProduct, RecordField};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn product(id: &str, cost: Decimal) -> FuelProduct {
        FuelProduct {
            id: id.to_string(),
            name: id.to_string(),
            code: id.to_uppercase(),
            cost_price: Money::new(cost),
            sale_price: Money::new(dec!(6.29)),
            is_active: true,
        }
    }

    fn suppliers() -> Vec<Supplier> {
        vec![Supplier {
            id: "sup-1".to_string(),
            name: "Distribuidora Sul".to_string(),
            tax_id: None,
            is_active: true,
        }]
    }

    fn period() -> Vec<ProductPeriodRecord> {
        let mut gc = ProductPeriodRecord::new(product("gc", dec!(5.00)), Liters::new(dec!(2000)));
        gc.tank_id = Some("tank-gc".to_string());
        gc.set_field(RecordField::MeterStart, "1000");
        gc.set_field(RecordField::MeterEnd, "1300");
        gc.set_field(RecordField::PurchasedLiters, "500");
        gc.set_field(RecordField::PurchasedValue, "2750,00");
        gc.set_field(RecordField::PhysicalMeasurement, "2150");

        let mut et = ProductPeriodRecord::new(product("et", dec!(3.80)), Liters::new(dec!(900)));
        et.set_field(RecordField::MeterStart, "400");

        vec![gc, et]
    }

    fn request<'a>(
        records: &'a [ProductPeriodRecord],
        supplier_id: Option<&'a str>,
        suppliers: &'a [Supplier],
    ) -> SaveRequest<'a> {
        SaveRequest {
            records,
            period_expense: Money::new(dec!(1000)),
            supplier_id,
            suppliers,
            period_date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_moving_average_cost() {
        let cost = moving_average_cost(
            Liters::new(dec!(2000)),
            Money::new(dec!(5.00)),
            Liters::new(dec!(500)),
            Money::new(dec!(2750)),
        );
        // (2000 × 5 + 2750) / 2500
        assert_eq!(cost.amount(), dec!(5.1));
    }

    #[test]
    fn test_moving_average_ignores_negative_prior_stock() {
        let cost = moving_average_cost(
            Liters::new(dec!(-300)),
            Money::new(dec!(5.00)),
            Liters::new(dec!(1000)),
            Money::new(dec!(5500)),
        );
        assert_eq!(cost.amount(), dec!(5.5));
    }

    #[test]
    fn test_moving_average_without_volume_keeps_old_cost() {
        let cost = moving_average_cost(Liters::ZERO, Money::new(dec!(5)), Liters::ZERO, Money::ZERO);
        assert_eq!(cost.amount(), dec!(5));
    }

    #[test]
    fn test_plan_requires_supplier_when_purchasing() {
        let records = period();
        let list = suppliers();
        let err = build_save_plan(request(&records, None, &list)).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::Required { .. })
        ));
    }

    #[test]
    fn test_plan_without_purchases_needs_no_supplier() {
        let records = vec![ProductPeriodRecord::new(product("ds", dec!(5.70)), Liters::new(dec!(800)))];
        let list = suppliers();
        let plan = build_save_plan(request(&records, None, &list)).unwrap();

        assert!(plan.batch.is_stock_only());
        assert!(plan.batch.supplier_id.is_none());
        assert_eq!(plan.batch.stock_updates.len(), 1);
        assert_eq!(plan.batch.stock_updates[0].book_stock.value(), dec!(800));
        assert_eq!(plan.roll_forward.len(), 1);
    }

    #[test]
    fn test_plan_batch_contents() {
        let records = period();
        let list = suppliers();
        let plan = build_save_plan(request(&records, Some("sup-1"), &list)).unwrap();
        let batch = &plan.batch;

        assert_eq!(batch.supplier_id.as_deref(), Some("sup-1"));
        assert_eq!(batch.period_expense.amount(), dec!(1000));

        assert_eq!(batch.purchases.len(), 1);
        let purchase = &batch.purchases[0];
        assert_eq!(purchase.product_id, "gc");
        assert_eq!(purchase.liters.value(), dec!(500));
        assert_eq!(purchase.cost_per_liter.amount(), dec!(5.5));
        assert_eq!(batch.total_liters().value(), dec!(500));

        assert_eq!(
            batch.stock_updates,
            vec![
                StockUpdate {
                    product_id: "gc".to_string(),
                    tank_id: Some("tank-gc".to_string()),
                    book_stock: Liters::new(dec!(2200)),
                },
                StockUpdate {
                    product_id: "et".to_string(),
                    tank_id: None,
                    book_stock: Liters::new(dec!(900)),
                },
            ]
        );

        assert_eq!(batch.cost_updates.len(), 1);
        assert_eq!(batch.cost_updates[0].new_cost.amount(), dec!(5.1));

        // Only the product with a tank gets a snapshot
        assert_eq!(batch.snapshots.len(), 1);
        let snapshot = &batch.snapshots[0];
        assert_eq!(snapshot.book_volume.value(), dec!(2200));
        assert_eq!(snapshot.physical_volume, Some(Liters::new(dec!(2150))));
    }

    #[test]
    fn test_unchanged_cost_emits_no_update() {
        let mut records = period();
        records[0].set_field(RecordField::PurchasedValue, "2500,00");
        let list = suppliers();
        let plan = build_save_plan(request(&records, Some("sup-1"), &list)).unwrap();

        assert!(plan.batch.cost_updates.is_empty());
        assert!(plan.roll_forward[0].cost_price.is_none());
    }

    #[test]
    fn test_roll_forward_resets_period() {
        let mut records = period();
        let list = suppliers();
        let plan = build_save_plan(request(&records, Some("sup-1"), &list)).unwrap();

        plan.apply_roll_forward(&mut records);

        let gc = &records[0];
        assert_eq!(gc.prior_stock().value(), dec!(2200));
        assert!(gc.purchased_liters.is_blank());
        assert!(gc.purchased_value.is_blank());
        assert_eq!(gc.meter_start().value(), dec!(1300));
        assert!(gc.meter_end.is_blank());
        assert!(gc.physical_measurement.is_blank());
        assert_eq!(gc.product.cost_price.amount(), dec!(5.1));

        // No closing meter typed: the opening meter is kept
        let et = &records[1];
        assert_eq!(et.meter_start().value(), dec!(400));
        assert_eq!(et.prior_stock().value(), dec!(900));
    }

    #[test]
    fn test_unknown_supplier_fails_before_building() {
        let records = period();
        let list = suppliers();
        let err = build_save_plan(request(&records, Some("sup-404"), &list)).unwrap_err();
        assert!(matches!(err, CoreError::SupplierNotFound(_)));
    }
}

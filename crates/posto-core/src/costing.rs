//! # Per-Product Derivations
//!
//! Pure, total functions that turn one [`ProductPeriodRecord`] into the
//! figures shown on the purchases / stock / sales screen.
//!
//! ## Derivation Graph
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  meter_start, meter_end ──────────► volume sold                         │
//! │  purchased_value / purchased_liters ► weighted average cost             │
//! │                         (cost_price when nothing was purchased)         │
//! │  PeriodBasis ─────────────────────► expense share per liter             │
//! │                                                                         │
//! │  average cost + expense share ────► cost-to-serve                       │
//! │  sale price − cost-to-serve ──────► unit profit ─► total profit, margin │
//! │                                                                         │
//! │  purchased_liters + prior_stock ──► stock available                     │
//! │  stock available − volume sold ───► projected book stock                │
//! │        ├─► stock value, projected stock profit                          │
//! │        └─► loss/gain (against physical_measurement)                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every ratio short-circuits to zero when its denominator is zero, so any
//! input state produces a displayable result.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::{Liters, Money, Percent};
use crate::types::ProductPeriodRecord;

// =============================================================================
// Period Basis
// =============================================================================

/// Period-wide inputs shared by every product's derivation.
///
/// The expense pool is spread as ONE flat rate per liter over a common
/// basis. It is not weighted by each product's own volume.
///
/// ## Basis Selection
/// ```text
/// total sold > 0 ?  ──yes──► basis = total sold
///        │
///        no
///        ▼
/// total purchased > 0 ? ──yes──► basis = total purchased
///        │
///        no
///        ▼
///   share = 0
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PeriodBasis {
    pub period_expense: Money,
    pub total_sold: Liters,
    pub total_purchased: Liters,
    pub basis_liters: Liters,
    pub expense_share_per_liter: Money,
}

impl PeriodBasis {
    /// Scans the full product list once.
    pub fn from_records(records: &[ProductPeriodRecord], period_expense: Money) -> Self {
        let total_sold: Liters = records.iter().map(volume_sold).sum();
        let total_purchased: Liters = records.iter().map(|r| r.purchased_liters()).sum();
        let basis_liters = basis_liters(total_sold, total_purchased);

        PeriodBasis {
            period_expense,
            total_sold,
            total_purchased,
            basis_liters,
            expense_share_per_liter: expense_share_per_liter(period_expense, basis_liters),
        }
    }
}

// =============================================================================
// Derivation Functions
// =============================================================================

/// Liters dispensed: `max(meter_end − meter_start, 0)`.
///
/// A counter reset (`meter_end < meter_start`) yields zero.
pub fn volume_sold(record: &ProductPeriodRecord) -> Liters {
    (record.meter_end() - record.meter_start()).clamp_non_negative()
}

/// Purchase value per purchased liter, falling back to the registered
/// cost price when nothing was purchased this period.
pub fn weighted_average_cost(record: &ProductPeriodRecord) -> Money {
    let liters = record.purchased_liters();
    if liters.is_positive() {
        record.purchased_value().per_liter(liters)
    } else {
        record.product.cost_price
    }
}

/// Total sold if positive, else total purchased if positive, else zero.
pub fn basis_liters(total_sold: Liters, total_purchased: Liters) -> Liters {
    if total_sold.is_positive() {
        total_sold
    } else if total_purchased.is_positive() {
        total_purchased
    } else {
        Liters::ZERO
    }
}

/// `period_expense / basis_liters`, zero without a basis.
pub fn expense_share_per_liter(period_expense: Money, basis_liters: Liters) -> Money {
    period_expense.per_liter(basis_liters)
}

/// Average cost plus expense share; zero when there is no cost basis.
pub fn cost_to_serve(average_cost: Money, expense_share: Money) -> Money {
    if average_cost.is_zero() {
        Money::ZERO
    } else {
        average_cost + expense_share
    }
}

/// `sale_price − cost_to_serve`; may be negative.
pub fn unit_profit(sale_price: Money, cost_to_serve: Money) -> Money {
    sale_price - cost_to_serve
}

pub fn total_profit(unit_profit: Money, volume_sold: Liters) -> Money {
    unit_profit * volume_sold
}

/// Pump revenue: `volume_sold × sale_price`.
pub fn revenue(volume_sold: Liters, sale_price: Money) -> Money {
    sale_price * volume_sold
}

/// `total_profit / revenue × 100`, zero when revenue is zero.
pub fn margin_pct(total_profit: Money, revenue: Money) -> Percent {
    Percent::of(total_profit.amount(), revenue.amount())
}

/// This product's share of the period's sold volume.
pub fn volume_share_pct(volume_sold: Liters, total_sold: Liters) -> Percent {
    Percent::of(volume_sold.value(), total_sold.value())
}

pub fn stock_available(record: &ProductPeriodRecord) -> Liters {
    record.purchased_liters() + record.prior_stock()
}

/// `stock_available − volume_sold`.
///
/// Not clamped: a negative book stock flags inconsistent data.
pub fn projected_book_stock(stock_available: Liters, volume_sold: Liters) -> Liters {
    stock_available - volume_sold
}

pub fn stock_value(projected_book_stock: Liters, average_cost: Money) -> Money {
    average_cost * projected_book_stock
}

pub fn projected_stock_profit(projected_book_stock: Liters, unit_profit: Money) -> Money {
    unit_profit * projected_book_stock
}

/// Physical measurement minus book stock, when measured.
pub fn loss_gain(physical_measurement: Option<Liters>, projected_book_stock: Liters) -> LossGain {
    match physical_measurement {
        Some(physical) => LossGain::measured(physical - projected_book_stock),
        None => LossGain::NotMeasured,
    }
}

// =============================================================================
// Loss / Gain
// =============================================================================

/// Direction of a measured book-vs-physical difference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum LossGainKind {
    /// Physical above book ("sobra").
    Surplus,
    /// Physical below book ("perca").
    Shortfall,
    /// Measured and exactly on book.
    Balanced,
}

/// Inventory loss/gain against a physical tank gauge reading.
///
/// `NotMeasured` is distinct from a measured zero difference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "status", rename_all = "snake_case")]
#[ts(export)]
pub enum LossGain {
    NotMeasured,
    Measured { difference: Liters, kind: LossGainKind },
}

impl LossGain {
    /// Classifies a difference (physical − book).
    pub fn measured(difference: Liters) -> Self {
        let kind = if difference.is_positive() {
            LossGainKind::Surplus
        } else if difference.is_negative() {
            LossGainKind::Shortfall
        } else {
            LossGainKind::Balanced
        };
        LossGain::Measured { difference, kind }
    }

    pub fn is_measured(&self) -> bool {
        matches!(self, LossGain::Measured { .. })
    }

    /// The difference, or zero when not measured (used by the totals).
    pub fn difference_or_zero(&self) -> Liters {
        match self {
            LossGain::Measured { difference, .. } => *difference,
            LossGain::NotMeasured => Liters::ZERO,
        }
    }
}

// =============================================================================
// Derived Product Metrics
// =============================================================================

/// Every figure derived for one product. Recomputed on each mutation,
/// never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DerivedProductMetrics {
    pub product_id: String,
    pub product_code: String,
    pub volume_sold: Liters,
    pub purchased_liters: Liters,
    pub purchased_value: Money,
    pub weighted_average_cost: Money,
    pub expense_share_per_liter: Money,
    pub cost_to_serve: Money,
    pub sale_price: Money,
    pub unit_profit: Money,
    pub total_profit: Money,
    pub revenue: Money,
    pub margin_pct: Percent,
    pub volume_share_pct: Percent,
    pub stock_available: Liters,
    pub projected_book_stock: Liters,
    pub stock_value: Money,
    pub projected_stock_profit: Money,
    pub loss_gain: LossGain,
}

/// Runs every derivation for one record against the period basis.
pub fn derive_metrics(record: &ProductPeriodRecord, basis: &PeriodBasis) -> DerivedProductMetrics {
    let sold = volume_sold(record);
    let average_cost = weighted_average_cost(record);
    let share = basis.expense_share_per_liter;
    let serve = cost_to_serve(average_cost, share);
    let sale_price = record.current_sale_price();
    let profit_per_liter = unit_profit(sale_price, serve);
    let profit = total_profit(profit_per_liter, sold);
    let pump_revenue = revenue(sold, sale_price);
    let available = stock_available(record);
    let book = projected_book_stock(available, sold);

    DerivedProductMetrics {
        product_id: record.product.id.clone(),
        product_code: record.product.code.clone(),
        volume_sold: sold,
        purchased_liters: record.purchased_liters(),
        purchased_value: record.purchased_value(),
        weighted_average_cost: average_cost,
        expense_share_per_liter: share,
        cost_to_serve: serve,
        sale_price,
        unit_profit: profit_per_liter,
        total_profit: profit,
        revenue: pump_revenue,
        margin_pct: margin_pct(profit, pump_revenue),
        volume_share_pct: volume_share_pct(sold, basis.total_sold),
        stock_available: available,
        projected_book_stock: book,
        stock_value: stock_value(book, average_cost),
        projected_stock_profit: projected_stock_profit(book, profit_per_liter),
        loss_gain: loss_gain(record.physical_measurement(), book),
    }
}

/// Derives metrics for every record in the period.
pub fn derive_all(records: &[ProductPeriodRecord], period_expense: Money) -> Vec<DerivedProductMetrics> {
    let basis = PeriodBasis::from_records(records, period_expense);
    records.iter().map(|r| derive_metrics(r, &basis)).collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FuelProduct, RecordField};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn product(id: &str, cost: Decimal, sale: Decimal) -> FuelProduct {
        FuelProduct {
            id: id.to_string(),
            name: format!("Fuel {}", id),
            code: id.to_uppercase(),
            cost_price: Money::new(cost),
            sale_price: Money::new(sale),
            is_active: true,
        }
    }

    fn record(id: &str, start: &str, end: &str) -> ProductPeriodRecord {
        let mut r = ProductPeriodRecord::new(product(id, dec!(5.10), dec!(6.00)), Liters::ZERO);
        r.set_field(RecordField::MeterStart, start);
        r.set_field(RecordField::MeterEnd, end);
        r
    }

    #[test]
    fn test_volume_sold_from_meters() {
        let r = record("gc", "1000,000", "1250,500");
        assert_eq!(volume_sold(&r).value(), dec!(250.5));
    }

    #[test]
    fn test_volume_sold_counter_reset_is_zero() {
        let r = record("gc", "999999", "120");
        assert_eq!(volume_sold(&r), Liters::ZERO);
    }

    #[test]
    fn test_weighted_average_cost_falls_back_to_registered_cost() {
        let r = record("gc", "0", "0");
        assert_eq!(weighted_average_cost(&r).amount(), dec!(5.10));
    }

    #[test]
    fn test_weighted_average_cost_from_purchase() {
        let mut r = record("gc", "0", "0");
        r.set_field(RecordField::PurchasedLiters, "5000");
        r.set_field(RecordField::PurchasedValue, "26000,00");
        assert_eq!(weighted_average_cost(&r).amount(), dec!(5.2));
    }

    #[test]
    fn test_flat_expense_share_across_products() {
        let records = vec![record("gc", "0", "400"), record("et", "0", "600")];
        let basis = PeriodBasis::from_records(&records, Money::new(dec!(1000)));

        assert_eq!(basis.basis_liters.value(), dec!(1000));
        for r in &records {
            let m = derive_metrics(r, &basis);
            assert_eq!(m.expense_share_per_liter.amount(), dec!(1));
        }
    }

    #[test]
    fn test_basis_falls_back_to_purchases_then_zero() {
        let mut r = record("gc", "0", "0");
        r.set_field(RecordField::PurchasedLiters, "500");
        let basis = PeriodBasis::from_records(&[r], Money::new(dec!(1000)));
        assert_eq!(basis.basis_liters.value(), dec!(500));
        assert_eq!(basis.expense_share_per_liter.amount(), dec!(2));

        let empty = PeriodBasis::from_records(&[record("gc", "0", "0")], Money::new(dec!(1000)));
        assert_eq!(empty.basis_liters, Liters::ZERO);
        assert_eq!(empty.expense_share_per_liter, Money::ZERO);
    }

    #[test]
    fn test_stock_projection() {
        let mut r = ProductPeriodRecord::new(
            product("gc", dec!(5.10), dec!(6.00)),
            Liters::new(dec!(2000)),
        );
        r.set_field(RecordField::PurchasedLiters, "500");
        r.set_field(RecordField::MeterStart, "1000");
        r.set_field(RecordField::MeterEnd, "1300");

        let available = stock_available(&r);
        assert_eq!(available.value(), dec!(2500));
        assert_eq!(projected_book_stock(available, volume_sold(&r)).value(), dec!(2200));
    }

    #[test]
    fn test_loss_gain_shortfall() {
        let lg = loss_gain(Some(Liters::new(dec!(2150))), Liters::new(dec!(2200)));
        assert_eq!(
            lg,
            LossGain::Measured {
                difference: Liters::new(dec!(-50)),
                kind: LossGainKind::Shortfall,
            }
        );
    }

    #[test]
    fn test_loss_gain_not_measured_differs_from_balanced() {
        let mut unmeasured = ProductPeriodRecord::new(
            product("gc", dec!(5.10), dec!(6.00)),
            Liters::new(dec!(5000)),
        );
        unmeasured.set_field(RecordField::PhysicalMeasurement, "0");

        let mut balanced = unmeasured.clone();
        balanced.set_field(RecordField::PhysicalMeasurement, "5000");

        let records = vec![unmeasured, balanced];
        let metrics = derive_all(&records, Money::ZERO);

        assert_eq!(metrics[0].loss_gain, LossGain::NotMeasured);
        assert_eq!(
            metrics[1].loss_gain,
            LossGain::Measured {
                difference: Liters::ZERO,
                kind: LossGainKind::Balanced,
            }
        );
        assert_ne!(metrics[0].loss_gain, metrics[1].loss_gain);
    }

    #[test]
    fn test_profit_and_margin() {
        let serve = Money::new(dec!(5.50));
        let unit = unit_profit(Money::new(dec!(6.00)), serve);
        let sold = Liters::new(dec!(300));
        let profit = total_profit(unit, sold);
        let rev = revenue(sold, Money::new(dec!(6.00)));

        assert_eq!(unit.amount(), dec!(0.50));
        assert_eq!(profit.amount(), dec!(150));
        assert_eq!(margin_pct(profit, rev).value().round_dp(2), dec!(8.33));
    }

    #[test]
    fn test_cost_to_serve_without_cost_basis_is_zero() {
        assert_eq!(cost_to_serve(Money::ZERO, Money::new(dec!(1))), Money::ZERO);
    }

    #[test]
    fn test_unit_profit_without_cost_basis_is_full_sale_price() {
        let mut r = record("gc", "0", "100");
        r.product.cost_price = Money::ZERO;
        r.set_field(RecordField::CurrentSalePrice, "6,00");

        let m = &derive_all(&[r], Money::new(dec!(300)))[0];
        assert!(m.cost_to_serve.is_zero());
        assert_eq!(m.unit_profit.amount(), dec!(6.00));
        assert_eq!(m.total_profit.amount(), dec!(600));
    }

    #[test]
    fn test_negative_unit_profit_is_kept() {
        let unit = unit_profit(Money::new(dec!(5.00)), Money::new(dec!(5.50)));
        assert_eq!(unit.amount(), dec!(-0.50));
    }

    #[test]
    fn test_zero_denominators_yield_zero() {
        assert!(margin_pct(Money::new(dec!(10)), Money::ZERO).is_zero());
        assert!(volume_share_pct(Liters::new(dec!(10)), Liters::ZERO).is_zero());
        assert_eq!(expense_share_per_liter(Money::new(dec!(1000)), Liters::ZERO), Money::ZERO);

        let r = record("gc", "", "");
        let m = derive_all(&[r], Money::new(dec!(500)));
        assert!(m[0].margin_pct.is_zero());
        assert!(m[0].volume_share_pct.is_zero());
        assert!(m[0].expense_share_per_liter.is_zero());
    }

    #[test]
    fn test_volume_share() {
        let records = vec![record("gc", "0", "400"), record("et", "0", "600")];
        let metrics = derive_all(&records, Money::ZERO);
        assert_eq!(metrics[0].volume_share_pct.value(), dec!(40));
        assert_eq!(metrics[1].volume_share_pct.value(), dec!(60));
    }

    #[test]
    fn test_negative_book_stock_is_not_clamped() {
        let r = record("gc", "0", "100");
        let metrics = derive_all(&[r], Money::ZERO);
        assert_eq!(metrics[0].projected_book_stock.value(), dec!(-100));
        assert_eq!(metrics[0].stock_value.amount(), dec!(-510));
    }

    #[test]
    fn test_loss_gain_serializes_with_status_tag() {
        let json = serde_json::to_value(LossGain::NotMeasured).unwrap();
        assert_eq!(json["status"], "not_measured");

        let json = serde_json::to_value(LossGain::measured(Liters::new(dec!(12)))).unwrap();
        assert_eq!(json["status"], "measured");
        assert_eq!(json["kind"], "surplus");
    }
}

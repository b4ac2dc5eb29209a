//! # Totals Aggregator
//!
//! Folds per-product metrics into period totals.
//!
//! Aggregate RATES are re-derived from aggregate amounts. They are never
//! averages of per-product rates:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  GC:   100 L sold, margin 20%      ┐                                    │
//! │  DS: 9.900 L sold, margin  2%      ┤                                    │
//! │                                    │                                    │
//! │  average of rates   = 11%          ✗ biased toward the small product   │
//! │  Σ profit / Σ revenue ≈ 2.2%       ✓ what PeriodTotals reports         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::costing::{derive_metrics, DerivedProductMetrics, PeriodBasis};
use crate::money::{Liters, Money, Percent};
use crate::types::ProductPeriodRecord;

// =============================================================================
// Period Totals
// =============================================================================

/// Period-wide aggregates across every product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PeriodTotals {
    pub total_sold: Liters,
    pub total_revenue: Money,
    /// Always Σ(unit profit × volume sold).
    pub total_profit: Money,
    /// Σ profit / Σ revenue × 100.
    pub margin_pct: Percent,
    pub total_purchased_liters: Liters,
    pub total_purchased_value: Money,
    /// Σ purchased value / Σ purchased liters.
    pub weighted_average_cost: Money,
    pub total_stock_value: Money,
    pub total_projected_stock_profit: Money,
    /// Unmeasured products contribute zero.
    pub total_loss_gain: Liters,
    pub measured_products: usize,
}

impl PeriodTotals {
    /// Aggregates already-derived per-product metrics.
    pub fn from_metrics(metrics: &[DerivedProductMetrics]) -> Self {
        let total_sold: Liters = metrics.iter().map(|m| m.volume_sold).sum();
        let total_revenue: Money = metrics.iter().map(|m| m.revenue).sum();
        let total_profit: Money = metrics.iter().map(|m| m.unit_profit * m.volume_sold).sum();
        let total_purchased_liters: Liters = metrics.iter().map(|m| m.purchased_liters).sum();
        let total_purchased_value: Money = metrics.iter().map(|m| m.purchased_value).sum();

        PeriodTotals {
            total_sold,
            total_revenue,
            total_profit,
            margin_pct: Percent::of(total_profit.amount(), total_revenue.amount()),
            total_purchased_liters,
            total_purchased_value,
            weighted_average_cost: total_purchased_value.per_liter(total_purchased_liters),
            total_stock_value: metrics.iter().map(|m| m.stock_value).sum(),
            total_projected_stock_profit: metrics.iter().map(|m| m.projected_stock_profit).sum(),
            total_loss_gain: metrics.iter().map(|m| m.loss_gain.difference_or_zero()).sum(),
            measured_products: metrics.iter().filter(|m| m.loss_gain.is_measured()).count(),
        }
    }
}

// =============================================================================
// Period Report
// =============================================================================

/// Everything the screen shows for one period, computed from scratch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PeriodReport {
    pub basis: PeriodBasis,
    pub products: Vec<DerivedProductMetrics>,
    pub totals: PeriodTotals,
}

/// Derives every product and the period totals in one pass.
///
/// ## Example
/// ```rust
/// use posto_core::money::{Liters, Money};
/// use posto_core::totals::compute_period;
/// use posto_core::types::{FuelProduct, ProductPeriodRecord, RecordField};
/// use rust_decimal::Decimal;
///
/// let product = FuelProduct {
///     id: "gc".to_string(),
///     name: "Gasolina Comum".to_string(),
///     code: "GC".to_string(),
///     cost_price: Money::new(Decimal::new(550, 2)),
///     sale_price: Money::new(Decimal::new(6, 0)),
///     is_active: true,
/// };
/// let mut record = ProductPeriodRecord::new(product, Liters::ZERO);
/// record.set_field(RecordField::MeterStart, "1000");
/// record.set_field(RecordField::MeterEnd, "1300");
///
/// let report = compute_period(&[record], Money::ZERO);
/// assert_eq!(report.totals.total_profit.amount(), Decimal::new(150, 0));
/// ```
pub fn compute_period(records: &[ProductPeriodRecord], period_expense: Money) -> PeriodReport {
    let basis = PeriodBasis::from_records(records, period_expense);
    let products: Vec<DerivedProductMetrics> =
        records.iter().map(|r| derive_metrics(r, &basis)).collect();
    let totals = PeriodTotals::from_metrics(&products);

    PeriodReport {
        basis,
        products,
        totals,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::costing::LossGain;
    use crate::types::{FuelProduct, RecordField};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn record(
        id: &str,
        cost: Decimal,
        sale: &str,
        prior: Decimal,
        meters: (&str, &str),
    ) -> ProductPeriodRecord {
        let product = FuelProduct {
            id: id.to_string(),
            name: id.to_string(),
            code: id.to_uppercase(),
            cost_price: Money::new(cost),
            sale_price: Money::new(dec!(6.00)),
            is_active: true,
        };
        let mut r = ProductPeriodRecord::new(product, Liters::new(prior));
        r.set_field(RecordField::MeterStart, meters.0);
        r.set_field(RecordField::MeterEnd, meters.1);
        r.set_field(RecordField::CurrentSalePrice, sale);
        r
    }

    fn sample_period() -> Vec<ProductPeriodRecord> {
        let mut gc = record("gc", dec!(5.10), "6,290", dec!(2000), ("1000", "1300"));
        gc.set_field(RecordField::PurchasedLiters, "5000");
        gc.set_field(RecordField::PurchasedValue, "25500,00");
        gc.set_field(RecordField::PhysicalMeasurement, "6650");

        let mut et = record("et", dec!(3.80), "4,490", dec!(1500), ("200", "650,5"));
        et.set_field(RecordField::PurchasedLiters, "3000");
        et.set_field(RecordField::PurchasedValue, "11100,00");

        let ds = record("ds", dec!(5.70), "6,190", dec!(800), ("50", "30"));

        vec![gc, et, ds]
    }

    #[test]
    fn test_profit_identity() {
        let report = compute_period(&sample_period(), Money::new(dec!(1000)));

        let expected: Money = report
            .products
            .iter()
            .map(|m| m.unit_profit * m.volume_sold)
            .sum();
        assert_eq!(report.totals.total_profit, expected);

        let per_product: Money = report.products.iter().map(|m| m.total_profit).sum();
        assert_eq!(report.totals.total_profit, per_product);
    }

    #[test]
    fn test_margin_is_rederived_not_averaged() {
        let report = compute_period(&sample_period(), Money::ZERO);
        let totals = &report.totals;

        assert_eq!(
            totals.margin_pct,
            Percent::of(totals.total_profit.amount(), totals.total_revenue.amount())
        );
    }

    #[test]
    fn test_weighted_average_cost_from_totals() {
        let report = compute_period(&sample_period(), Money::ZERO);

        assert_eq!(report.totals.total_purchased_liters.value(), dec!(8000));
        assert_eq!(report.totals.total_purchased_value.amount(), dec!(36600));
        assert_eq!(report.totals.weighted_average_cost.amount(), dec!(4.575));
    }

    #[test]
    fn test_loss_gain_totals_skip_unmeasured() {
        let report = compute_period(&sample_period(), Money::ZERO);

        // gc: 2000 + 5000 - 300 = 6700 on book, 6650 measured
        assert_eq!(
            report.products[0].loss_gain,
            LossGain::measured(Liters::new(dec!(-50)))
        );
        assert_eq!(report.products[1].loss_gain, LossGain::NotMeasured);
        assert_eq!(report.totals.total_loss_gain.value(), dec!(-50));
        assert_eq!(report.totals.measured_products, 1);
    }

    #[test]
    fn test_counter_reset_contributes_no_volume() {
        let report = compute_period(&sample_period(), Money::ZERO);

        assert_eq!(report.products[2].volume_sold, Liters::ZERO);
        assert_eq!(report.totals.total_sold.value(), dec!(750.5));
    }

    #[test]
    fn test_empty_period_is_all_zero() {
        let report = compute_period(&[], Money::new(dec!(1000)));

        assert!(report.products.is_empty());
        assert_eq!(report.totals.total_profit, Money::ZERO);
        assert!(report.totals.margin_pct.is_zero());
        assert_eq!(report.totals.weighted_average_cost, Money::ZERO);
        assert_eq!(report.totals.measured_products, 0);
    }

    #[test]
    fn test_totals_sum_stock_figures() {
        let report = compute_period(&sample_period(), Money::new(dec!(750.50)));

        let stock_value: Money = report.products.iter().map(|m| m.stock_value).sum();
        let stock_profit: Money = report.products.iter().map(|m| m.projected_stock_profit).sum();
        assert_eq!(report.totals.total_stock_value, stock_value);
        assert_eq!(report.totals.total_projected_stock_profit, stock_profit);
        // basis = 750,5 L sold, so the share is exactly R$ 1,00 / L
        assert_eq!(report.basis.expense_share_per_liter.amount(), dec!(1));
    }
}

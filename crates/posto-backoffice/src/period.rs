//! # Period State
//!
//! The single owned collection of [`ProductPeriodRecord`]s behind the
//! purchases / stock / sales screen, plus the shared expense pool and the
//! supplier selection.
//!
//! ## Data Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         PeriodView                                      │
//! │                                                                         │
//! │  registries ──► seed() ──► records: Vec<ProductPeriodRecord>            │
//! │                                │                                        │
//! │  operator ── update_field ─────┤                                        │
//! │          ── set_expense ───────┤                                        │
//! │                                ▼                                        │
//! │                      report() = compute_period(&records, expense)       │
//! │                      (recomputed on every call, nothing cached)         │
//! │                                                                         │
//! │  save ── build_plan() ──► store ──► apply_plan() (only on success)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};

use posto_core::{
    build_save_plan, compute_period, CoreError, CoreResult, FuelProduct, PeriodExpensePool,
    PeriodReport, ProductPeriodRecord, RecordField, SavePlan, SaveRequest, StockLevel, Supplier,
    Tank,
};

// =============================================================================
// Period View
// =============================================================================

/// Everything the operator edits for one period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodView {
    pub period_date: NaiveDate,
    pub records: Vec<ProductPeriodRecord>,
    pub expense: PeriodExpensePool,
    pub supplier_id: Option<String>,
    /// Loaded once; only used to validate and tag the save batch.
    pub suppliers: Vec<Supplier>,
}

impl PeriodView {
    /// Builds the period view from the registries.
    ///
    /// Inactive products are left out. Each record's prior stock comes from
    /// the product's tank, else the stock registry, else zero.
    pub fn seed(
        period_date: NaiveDate,
        products: Vec<FuelProduct>,
        tanks: &[Tank],
        stock_levels: &[StockLevel],
        suppliers: Vec<Supplier>,
    ) -> Self {
        let records = products
            .into_iter()
            .filter(|p| p.is_active)
            .map(|product| {
                let tank = tanks.iter().find(|t| t.product_id == product.id);
                let stock = stock_levels.iter().find(|s| s.product_id == product.id);
                ProductPeriodRecord::seed(product, tank, stock)
            })
            .collect();

        PeriodView {
            period_date,
            records,
            expense: PeriodExpensePool::new(),
            supplier_id: None,
            suppliers,
        }
    }

    /// Looks up a record by product id.
    pub fn record(&self, product_id: &str) -> Option<&ProductPeriodRecord> {
        self.records.iter().find(|r| r.product_id() == product_id)
    }

    /// Applies a keystroke buffer to one field of one product.
    pub fn update_field(
        &mut self,
        product_id: &str,
        field: RecordField,
        raw: &str,
    ) -> CoreResult<()> {
        let record = self
            .records
            .iter_mut()
            .find(|r| r.product_id() == product_id)
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;

        record.set_field(field, raw);
        Ok(())
    }

    /// Applies a keystroke buffer to the period expense.
    pub fn set_expense(&mut self, raw: &str) {
        self.expense.set_text(raw);
    }

    /// Pre-fills the period expense from a stored amount.
    pub fn set_expense_amount(&mut self, amount: Decimal) {
        self.expense = PeriodExpensePool::from(amount);
    }

    /// Selects (or clears) the supplier for the next save.
    pub fn select_supplier(&mut self, supplier_id: Option<String>) {
        self.supplier_id = supplier_id;
    }

    /// Derived metrics and totals for the current state.
    pub fn report(&self) -> PeriodReport {
        compute_period(&self.records, self.expense.amount())
    }

    /// True when leaving the view now would discard typed input.
    pub fn has_unsaved_input(&self) -> bool {
        !self.expense.is_blank() || self.records.iter().any(|r| r.has_operator_input())
    }

    /// Validates the current state and builds the save batch.
    pub fn build_plan(&self, created_at: DateTime<Utc>) -> CoreResult<SavePlan> {
        build_save_plan(SaveRequest {
            records: &self.records,
            period_expense: self.expense.amount(),
            supplier_id: self.supplier_id.as_deref(),
            suppliers: &self.suppliers,
            period_date: self.period_date,
            created_at,
        })
    }

    /// Rolls every record forward after its batch was stored.
    ///
    /// Expense and supplier selection are kept.
    pub fn apply_plan(&mut self, plan: &SavePlan) {
        plan.apply_roll_forward(&mut self.records);
    }
}

// =============================================================================
// Shared State
// =============================================================================

/// Shared handle to the period view.
///
/// Uses `Arc<Mutex<PeriodView>>`: one logical writer (the operator), but the
/// save workflow holds a handle across its storage await. The lock is never
/// held across an await point.
#[derive(Debug, Clone)]
pub struct PeriodState {
    view: Arc<Mutex<PeriodView>>,
}

impl PeriodState {
    pub fn new(view: PeriodView) -> Self {
        PeriodState {
            view: Arc::new(Mutex::new(view)),
        }
    }

    /// Executes a function with read access to the view.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let report = state.with_view(|view| view.report());
    /// ```
    pub fn with_view<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&PeriodView) -> R,
    {
        let view = self.view.lock().unwrap_or_else(PoisonError::into_inner);
        f(&view)
    }

    /// Executes a function with write access to the view.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// state.with_view_mut(|view| view.update_field("gc", RecordField::MeterEnd, "1250,5"))?;
    /// ```
    pub fn with_view_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut PeriodView) -> R,
    {
        let mut view = self.view.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut view)
    }

    /// Clones the current view.
    pub fn snapshot(&self) -> PeriodView {
        self.with_view(PeriodView::clone)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use posto_core::{Liters, LossGain, Money};
    use rust_decimal_macros::dec;

    fn product(id: &str, cost: Decimal, sale: Decimal, active: bool) -> FuelProduct {
        FuelProduct {
            id: id.to_string(),
            name: id.to_uppercase(),
            code: id.to_uppercase(),
            cost_price: Money::new(cost),
            sale_price: Money::new(sale),
            is_active: active,
        }
    }

    fn tank(id: &str, product_id: &str, stock: Decimal) -> Tank {
        Tank {
            id: id.to_string(),
            product_id: product_id.to_string(),
            name: format!("Tanque {}", id),
            capacity: Liters::new(dec!(15000)),
            current_stock: Liters::new(stock),
        }
    }

    fn supplier(id: &str) -> Supplier {
        Supplier {
            id: id.to_string(),
            name: format!("Distribuidora {}", id),
            tax_id: None,
            is_active: true,
        }
    }

    fn period_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 31).unwrap()
    }

    fn view() -> PeriodView {
        PeriodView::seed(
            period_date(),
            vec![
                product("gc", dec!(5.10), dec!(6.00), true),
                product("ga", dec!(5.30), dec!(6.40), true),
                product("old", dec!(4.00), dec!(5.00), false),
            ],
            &[tank("t1", "gc", dec!(2000))],
            &[StockLevel {
                product_id: "ga".to_string(),
                quantity: Liters::new(dec!(800)),
            }],
            vec![supplier("s1")],
        )
    }

    #[test]
    fn test_seed_excludes_inactive_and_picks_stock_source() {
        let view = view();

        assert_eq!(view.records.len(), 2);
        assert!(view.record("old").is_none());

        let gc = view.record("gc").unwrap();
        assert_eq!(gc.prior_stock().value(), dec!(2000));
        assert_eq!(gc.tank_id.as_deref(), Some("t1"));
        assert_eq!(gc.current_sale_price().amount(), dec!(6.00));

        let ga = view.record("ga").unwrap();
        assert_eq!(ga.prior_stock().value(), dec!(800));
        assert!(ga.tank_id.is_none());
    }

    #[test]
    fn test_update_field_unknown_product() {
        let mut view = view();
        let err = view
            .update_field("nope", RecordField::MeterEnd, "10")
            .unwrap_err();
        assert!(matches!(err, CoreError::ProductNotFound(id) if id == "nope"));
    }

    #[test]
    fn test_report_reflects_latest_edit() {
        let mut view = view();
        view.update_field("gc", RecordField::MeterStart, "1000").unwrap();
        view.update_field("gc", RecordField::MeterEnd, "1250,5").unwrap();
        assert_eq!(view.report().products[0].volume_sold.value(), dec!(250.5));

        view.update_field("gc", RecordField::MeterEnd, "1300").unwrap();
        assert_eq!(view.report().products[0].volume_sold.value(), dec!(300));
    }

    #[test]
    fn test_has_unsaved_input() {
        let mut view = view();
        assert!(!view.has_unsaved_input());

        view.set_expense("100");
        assert!(view.has_unsaved_input());

        view.set_expense("");
        assert!(!view.has_unsaved_input());

        view.update_field("ga", RecordField::PhysicalMeasurement, "0")
            .unwrap();
        assert!(view.has_unsaved_input());
    }

    #[test]
    fn test_build_plan_requires_supplier_for_purchases() {
        let mut view = view();
        view.update_field("gc", RecordField::PurchasedLiters, "500")
            .unwrap();
        view.update_field("gc", RecordField::PurchasedValue, "2600")
            .unwrap();

        assert!(matches!(
            view.build_plan(Utc::now()),
            Err(CoreError::Validation(_))
        ));

        view.select_supplier(Some("s1".to_string()));
        let plan = view.build_plan(Utc::now()).unwrap();
        assert_eq!(plan.batch.purchases.len(), 1);
        assert_eq!(plan.batch.supplier_id.as_deref(), Some("s1"));
    }

    #[test]
    fn test_apply_plan_rolls_forward_and_keeps_expense() {
        let mut view = view();
        view.select_supplier(Some("s1".to_string()));
        view.set_expense("1.000,00");
        view.update_field("gc", RecordField::MeterStart, "1000").unwrap();
        view.update_field("gc", RecordField::MeterEnd, "1300").unwrap();
        view.update_field("gc", RecordField::PurchasedLiters, "500")
            .unwrap();
        view.update_field("gc", RecordField::PurchasedValue, "2600")
            .unwrap();
        view.update_field("gc", RecordField::PhysicalMeasurement, "2150")
            .unwrap();

        let before = view.report();
        assert_eq!(before.products[0].projected_book_stock.value(), dec!(2200));

        let plan = view.build_plan(Utc::now()).unwrap();
        view.apply_plan(&plan);

        let gc = view.record("gc").unwrap();
        assert_eq!(gc.prior_stock().value(), dec!(2200));
        assert_eq!(gc.meter_start().value(), dec!(1300));
        assert!(gc.meter_end.is_blank());
        assert!(gc.purchased_liters.is_blank());
        assert!(gc.purchased_value.is_blank());
        assert!(gc.physical_measurement.is_blank());
        assert_eq!(view.expense.amount().amount(), dec!(1000));
        assert_eq!(view.supplier_id.as_deref(), Some("s1"));

        assert_eq!(view.report().products[0].loss_gain, LossGain::NotMeasured);
    }

    #[test]
    fn test_state_handle_shares_one_view() {
        let state = PeriodState::new(view());
        let other = state.clone();

        other
            .with_view_mut(|v| v.update_field("gc", RecordField::MeterEnd, "5"))
            .unwrap();

        let text = state.with_view(|v| v.record("gc").unwrap().meter_end.text().to_string());
        assert_eq!(text, "5");
        assert_eq!(state.snapshot(), other.snapshot());
    }
}

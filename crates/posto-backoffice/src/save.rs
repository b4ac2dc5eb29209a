//! # Period Session and Save Workflow
//!
//! Ties the period view to its storage collaborator.
//!
//! ## Save Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  save()                                                                 │
//! │    │                                                                    │
//! │    ├─ saving flag already set? ──► Err(SAVE_IN_PROGRESS), no queuing    │
//! │    │                                                                    │
//! │    ├─ lock view ─► build_plan() ─► unlock                               │
//! │    │     └─ validation error ──► Err, view untouched                    │
//! │    │                                                                    │
//! │    ├─ store.commit_batch(&plan.batch).await                             │
//! │    │     └─ storage error ─────► Err, view untouched (retry freely)     │
//! │    │                                                                    │
//! │    └─ lock view ─► apply_plan() (roll forward) ─► Ok(SaveOutcome)       │
//! │                                                                         │
//! │  The saving flag is released on every exit path.                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info, warn};

use crate::config::BackOfficeConfig;
use crate::error::{ApiError, ApiResult};
use crate::period::{PeriodState, PeriodView};
use crate::store::PeriodStore;
use posto_core::{Liters, PeriodReport, RecordField};

// =============================================================================
// Saving Guard
// =============================================================================

/// Holds the saving flag for as long as it lives.
struct SavingGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> SavingGuard<'a> {
    /// Sets the flag, or returns `None` if it was already set.
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SavingGuard { flag })
    }
}

impl Drop for SavingGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

// =============================================================================
// Save Outcome
// =============================================================================

/// Summary of a stored batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveOutcome {
    pub purchases: usize,
    pub purchased_liters: Liters,
    pub cost_updates: usize,
    pub snapshots: usize,
}

// =============================================================================
// Period Session
// =============================================================================

/// A loaded period view bound to its store.
pub struct PeriodSession<S: PeriodStore> {
    store: S,
    state: PeriodState,
    saving: AtomicBool,
}

impl<S: PeriodStore> PeriodSession<S> {
    /// Wraps an already seeded view.
    pub fn new(store: S, view: PeriodView) -> Self {
        PeriodSession {
            store,
            state: PeriodState::new(view),
            saving: AtomicBool::new(false),
        }
    }

    /// Reads the registries and seeds the period view.
    ///
    /// The configured expense and supplier are pre-filled.
    pub async fn load(
        store: S,
        period_date: NaiveDate,
        config: &BackOfficeConfig,
    ) -> ApiResult<Self> {
        let (products, tanks, stock_levels, suppliers) = tokio::try_join!(
            store.load_products(),
            store.load_tanks(),
            store.load_stock_levels(),
            store.load_suppliers(),
        )?;

        info!(
            period = %period_date,
            products = products.len(),
            tanks = tanks.len(),
            suppliers = suppliers.len(),
            "Loaded period registries"
        );

        let mut view = PeriodView::seed(period_date, products, &tanks, &stock_levels, suppliers);
        if let Some(amount) = config.period_expense {
            view.set_expense_amount(amount);
        }
        view.select_supplier(config.supplier_id.clone());

        Ok(PeriodSession::new(store, view))
    }

    /// Shared handle to the view.
    pub fn state(&self) -> &PeriodState {
        &self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// True while a save is pending.
    pub fn is_saving(&self) -> bool {
        self.saving.load(Ordering::Acquire)
    }

    /// Applies a keystroke buffer to one field and returns the new report.
    pub fn update_field(
        &self,
        product_id: &str,
        field: RecordField,
        raw: &str,
    ) -> ApiResult<PeriodReport> {
        self.state.with_view_mut(|view| -> ApiResult<PeriodReport> {
            view.update_field(product_id, field, raw)?;
            Ok(view.report())
        })
    }

    /// Applies a keystroke buffer to the period expense and returns the new report.
    pub fn set_expense(&self, raw: &str) -> PeriodReport {
        self.state.with_view_mut(|view| {
            view.set_expense(raw);
            view.report()
        })
    }

    /// Selects (or clears, with `None` or a blank id) the supplier.
    pub fn select_supplier(&self, supplier_id: Option<&str>) {
        let supplier_id = supplier_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string);
        self.state.with_view_mut(|view| view.select_supplier(supplier_id));
    }

    /// Derived metrics and totals for the current state.
    pub fn report(&self) -> PeriodReport {
        self.state.with_view(PeriodView::report)
    }

    pub fn has_unsaved_input(&self) -> bool {
        self.state.with_view(PeriodView::has_unsaved_input)
    }

    /// Stores the period and rolls the view forward.
    ///
    /// Rejected with `SAVE_IN_PROGRESS` while another save is pending.
    /// On any error the view is left exactly as it was.
    pub async fn save(&self) -> ApiResult<SaveOutcome> {
        let _guard = SavingGuard::acquire(&self.saving).ok_or_else(|| {
            warn!("Save rejected: another save is in progress");
            ApiError::save_in_progress()
        })?;

        let plan = self
            .state
            .with_view(|view| view.build_plan(Utc::now()))
            .map_err(|e| {
                debug!(error = %e, "Save rejected by validation");
                ApiError::from(e)
            })?;

        let batch = &plan.batch;
        info!(
            period = %batch.period_date,
            purchases = batch.purchases.len(),
            liters = %batch.total_liters(),
            supplier = ?batch.supplier_id,
            "Committing period batch"
        );

        self.store.commit_batch(batch).await.map_err(|e| {
            error!(error = %e, "Period batch failed, state kept for retry");
            ApiError::from(e)
        })?;

        self.state.with_view_mut(|view| view.apply_plan(&plan));
        info!(products = plan.roll_forward.len(), "Period rolled forward");

        Ok(SaveOutcome {
            purchases: batch.purchases.len(),
            purchased_liters: batch.total_liters(),
            cost_updates: batch.cost_updates.len(),
            snapshots: batch.snapshots.len(),
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use async_trait::async_trait;
    use posto_core::{FuelProduct, Money, PurchaseBatch, StockLevel, Supplier, Tank};
    use posto_db::{DbError, DbResult};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::Mutex;
    use tokio::sync::Notify;

    /// In-memory store that records committed batches.
    #[derive(Default)]
    struct FakeStore {
        products: Vec<FuelProduct>,
        tanks: Vec<Tank>,
        suppliers: Vec<Supplier>,
        committed: Mutex<Vec<PurchaseBatch>>,
        fail: bool,
        /// When set, `commit_batch` signals `entered` and waits on `release`.
        gate: Option<(Notify, Notify)>,
    }

    #[async_trait]
    impl PeriodStore for FakeStore {
        async fn load_products(&self) -> DbResult<Vec<FuelProduct>> {
            Ok(self.products.clone())
        }

        async fn load_tanks(&self) -> DbResult<Vec<Tank>> {
            Ok(self.tanks.clone())
        }

        async fn load_stock_levels(&self) -> DbResult<Vec<StockLevel>> {
            Ok(Vec::new())
        }

        async fn load_suppliers(&self) -> DbResult<Vec<Supplier>> {
            Ok(self.suppliers.clone())
        }

        async fn commit_batch(&self, batch: &PurchaseBatch) -> DbResult<()> {
            if let Some((entered, release)) = &self.gate {
                entered.notify_one();
                release.notified().await;
            }
            if self.fail {
                return Err(DbError::TransactionFailed("disk I/O error".to_string()));
            }
            self.committed.lock().unwrap().push(batch.clone());
            Ok(())
        }
    }

    fn fake_store() -> FakeStore {
        FakeStore {
            products: vec![FuelProduct {
                id: "gc".to_string(),
                name: "Gasolina Comum".to_string(),
                code: "GC".to_string(),
                cost_price: Money::new(dec!(5.10)),
                sale_price: Money::new(dec!(6.00)),
                is_active: true,
            }],
            tanks: vec![Tank {
                id: "t1".to_string(),
                product_id: "gc".to_string(),
                name: "Tanque 1".to_string(),
                capacity: Liters::new(dec!(15000)),
                current_stock: Liters::new(dec!(2000)),
            }],
            suppliers: vec![Supplier {
                id: "s1".to_string(),
                name: "Distribuidora Sul".to_string(),
                tax_id: None,
                is_active: true,
            }],
            ..Default::default()
        }
    }

    fn period_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 31).unwrap()
    }

    fn config() -> BackOfficeConfig {
        BackOfficeConfig {
            supplier_id: Some("s1".to_string()),
            ..Default::default()
        }
    }

    /// Meters 1000 → 1300, 500 L bought for 2.600,00.
    fn fill_period<S: PeriodStore>(session: &PeriodSession<S>) {
        for (field, raw) in [
            (RecordField::MeterStart, "1000"),
            (RecordField::MeterEnd, "1300"),
            (RecordField::PurchasedLiters, "500"),
            (RecordField::PurchasedValue, "2600"),
        ] {
            session.update_field("gc", field, raw).unwrap();
        }
    }

    fn prior_stock<S: PeriodStore>(session: &PeriodSession<S>) -> Decimal {
        session
            .state()
            .with_view(|v| v.record("gc").unwrap().prior_stock().value())
    }

    #[tokio::test]
    async fn test_load_seeds_from_store_and_config() {
        let config = BackOfficeConfig {
            period_expense: Some(dec!(1000)),
            ..config()
        };
        let session = PeriodSession::load(fake_store(), period_date(), &config)
            .await
            .unwrap();

        assert_eq!(prior_stock(&session), dec!(2000));
        let view = session.state().snapshot();
        assert_eq!(view.expense.text(), "1.000,00");
        assert_eq!(view.supplier_id.as_deref(), Some("s1"));
    }

    #[tokio::test]
    async fn test_successful_save_rolls_forward() {
        let session = PeriodSession::load(fake_store(), period_date(), &config())
            .await
            .unwrap();
        fill_period(&session);

        let outcome = session.save().await.unwrap();

        assert_eq!(outcome.purchases, 1);
        assert_eq!(outcome.purchased_liters.value(), dec!(500));
        assert_eq!(outcome.snapshots, 1);
        assert_eq!(session.store().committed.lock().unwrap().len(), 1);

        assert_eq!(prior_stock(&session), dec!(2200));
        let view = session.state().snapshot();
        let gc = view.record("gc").unwrap();
        assert_eq!(gc.meter_start().value(), dec!(1300));
        assert!(gc.purchased_liters.is_blank());
        assert_eq!(gc.product.cost_price.amount(), dec!(5.12));
        assert!(!session.is_saving());
    }

    #[tokio::test]
    async fn test_failed_save_leaves_state_untouched() {
        let store = FakeStore {
            fail: true,
            ..fake_store()
        };
        let session = PeriodSession::load(store, period_date(), &config())
            .await
            .unwrap();
        fill_period(&session);
        let before = session.state().snapshot();

        let err = session.save().await.unwrap_err();

        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert_eq!(session.state().snapshot(), before);
        assert!(!session.is_saving());
    }

    #[tokio::test]
    async fn test_missing_supplier_is_rejected_before_storage() {
        let session = PeriodSession::load(fake_store(), period_date(), &BackOfficeConfig::default())
            .await
            .unwrap();
        fill_period(&session);
        let before = session.state().snapshot();

        let err = session.save().await.unwrap_err();

        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(session.store().committed.lock().unwrap().is_empty());
        assert_eq!(session.state().snapshot(), before);
    }

    #[tokio::test]
    async fn test_unknown_supplier_is_not_found() {
        let session = PeriodSession::load(fake_store(), period_date(), &config())
            .await
            .unwrap();
        fill_period(&session);
        session.select_supplier(Some("gone"));

        let err = session.save().await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_reentrant_save_is_rejected_while_pending() {
        let store = FakeStore {
            gate: Some((Notify::new(), Notify::new())),
            ..fake_store()
        };
        let session = PeriodSession::load(store, period_date(), &config())
            .await
            .unwrap();
        fill_period(&session);

        let (entered, release) = session.store().gate.as_ref().unwrap();

        let (first, second) = tokio::join!(session.save(), async {
            entered.notified().await;
            assert!(session.is_saving());
            let second = session.save().await;
            release.notify_one();
            second
        });

        assert!(first.is_ok());
        assert_eq!(second.unwrap_err().code, ErrorCode::SaveInProgress);
        assert_eq!(session.store().committed.lock().unwrap().len(), 1);
        assert!(!session.is_saving());
    }

    #[tokio::test]
    async fn test_update_unknown_product_is_not_found() {
        let session = PeriodSession::load(fake_store(), period_date(), &config())
            .await
            .unwrap();
        let err = session
            .update_field("nope", RecordField::MeterEnd, "1")
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_stock_only_save_needs_no_supplier() {
        let session = PeriodSession::load(fake_store(), period_date(), &BackOfficeConfig::default())
            .await
            .unwrap();
        session
            .update_field("gc", RecordField::PhysicalMeasurement, "1990")
            .unwrap();

        let outcome = session.save().await.unwrap();
        assert_eq!(outcome.purchases, 0);
        assert_eq!(outcome.snapshots, 1);
        assert_eq!(prior_stock(&session), dec!(2000));
    }
}

//! # Purchase Repository
//!
//! Writes the period save batch and reads purchases back.
//!
//! ## Batch Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │    INSERT fuel_purchases          (one per purchase)                    │
//! │    UPDATE tanks / stock_levels    (stock = reconciled book stock)       │
//! │    UPDATE fuel_products           (blended cost price)                  │
//! │    INSERT cost_price_history                                            │
//! │    INSERT tank_history            (book vs physical)                    │
//! │    UPSERT period_expenses                                               │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Any failure drops the transaction: nothing from the batch is stored   │
//! │  and the caller retries the whole batch.                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stock is written as the reconciled figure (`prior + purchased − sold`),
//! never as a relative change, so reloading the period after a save seeds
//! the same prior stock the roll-forward produced.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::parse_decimal;
use crate::error::{DbError, DbResult};
use posto_core::reconciliation::{
    CostPriceUpdate, PurchaseBatch, PurchaseRecord, StockSnapshot, StockUpdate,
};
use posto_core::{Liters, Money};

#[derive(Debug, sqlx::FromRow)]
struct PurchaseRow {
    id: String,
    product_id: String,
    supplier_id: String,
    period_date: NaiveDate,
    liters: String,
    total_value: String,
    cost_per_liter: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<PurchaseRow> for PurchaseRecord {
    type Error = DbError;

    fn try_from(row: PurchaseRow) -> DbResult<Self> {
        Ok(PurchaseRecord {
            liters: Liters::new(parse_decimal("fuel_purchases.liters", &row.liters)?),
            total_value: Money::new(parse_decimal("fuel_purchases.total_value", &row.total_value)?),
            cost_per_liter: Money::new(parse_decimal(
                "fuel_purchases.cost_per_liter",
                &row.cost_per_liter,
            )?),
            id: row.id,
            product_id: row.product_id,
            supplier_id: row.supplier_id,
            period_date: row.period_date,
            created_at: row.created_at,
        })
    }
}

/// Repository for purchases and the save batch.
#[derive(Debug, Clone)]
pub struct PurchaseRepository {
    pool: SqlitePool,
}

impl PurchaseRepository {
    /// Creates a new PurchaseRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PurchaseRepository { pool }
    }

    /// Stores an entire save batch in one transaction.
    ///
    /// ## Returns
    /// * `Ok(())` - every row of the batch was written
    /// * `Err(_)` - nothing was written
    pub async fn commit_batch(&self, batch: &PurchaseBatch) -> DbResult<()> {
        info!(
            period_date = %batch.period_date,
            purchases = batch.purchases.len(),
            snapshots = batch.snapshots.len(),
            cost_updates = batch.cost_updates.len(),
            "Committing purchase batch"
        );

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        for purchase in &batch.purchases {
            insert_purchase(&mut tx, purchase).await?;
        }
        for update in &batch.stock_updates {
            apply_stock_update(&mut tx, update).await?;
        }
        for update in &batch.cost_updates {
            apply_cost_update(&mut tx, update, batch.period_date).await?;
        }
        for snapshot in &batch.snapshots {
            insert_snapshot(&mut tx, snapshot).await?;
        }
        upsert_expense(&mut tx, batch).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(period_date = %batch.period_date, "Purchase batch committed");
        Ok(())
    }

    /// Purchases recorded for a period date.
    pub async fn list_by_date(&self, period_date: NaiveDate) -> DbResult<Vec<PurchaseRecord>> {
        let rows: Vec<PurchaseRow> = sqlx::query_as(
            r#"
            SELECT id, product_id, supplier_id, period_date, liters, total_value,
                   cost_per_liter, created_at
            FROM fuel_purchases
            WHERE period_date = ?1
            ORDER BY created_at, product_id
            "#,
        )
        .bind(period_date)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(PurchaseRecord::try_from).collect()
    }

    /// The expense declared for a period, if one was saved.
    pub async fn period_expense(&self, period_date: NaiveDate) -> DbResult<Option<Money>> {
        let raw: Option<String> =
            sqlx::query_scalar("SELECT amount FROM period_expenses WHERE period_date = ?1")
                .bind(period_date)
                .fetch_optional(&self.pool)
                .await?;

        raw.map(|r| parse_decimal("period_expenses.amount", &r).map(Money::new))
            .transpose()
    }

    /// Counts all stored purchases.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM fuel_purchases")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Batch Steps
// =============================================================================

async fn insert_purchase(
    tx: &mut Transaction<'_, Sqlite>,
    purchase: &PurchaseRecord,
) -> DbResult<()> {
    debug!(product_id = %purchase.product_id, liters = %purchase.liters, "Inserting purchase");

    sqlx::query(
        r#"
        INSERT INTO fuel_purchases (
            id, product_id, supplier_id, period_date, liters, total_value,
            cost_per_liter, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&purchase.id)
    .bind(&purchase.product_id)
    .bind(&purchase.supplier_id)
    .bind(purchase.period_date)
    .bind(purchase.liters.value().to_string())
    .bind(purchase.total_value.amount().to_string())
    .bind(purchase.cost_per_liter.amount().to_string())
    .bind(purchase.created_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

async fn apply_stock_update(
    tx: &mut Transaction<'_, Sqlite>,
    update: &StockUpdate,
) -> DbResult<()> {
    let now = Utc::now();
    let stock = update.book_stock.value().to_string();

    match &update.tank_id {
        Some(tank_id) => {
            debug!(tank_id = %tank_id, stock = %update.book_stock, "Setting tank stock");

            let result =
                sqlx::query("UPDATE tanks SET current_stock = ?2, updated_at = ?3 WHERE id = ?1")
                    .bind(tank_id)
                    .bind(&stock)
                    .bind(now)
                    .execute(&mut **tx)
                    .await?;

            if result.rows_affected() == 0 {
                return Err(DbError::not_found("Tank", tank_id));
            }
        }
        None => {
            debug!(product_id = %update.product_id, stock = %update.book_stock, "Setting stock level");

            sqlx::query(
                r#"
                INSERT INTO stock_levels (product_id, quantity, updated_at)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(product_id) DO UPDATE SET
                    quantity = excluded.quantity,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(&update.product_id)
            .bind(&stock)
            .bind(now)
            .execute(&mut **tx)
            .await?;
        }
    }

    Ok(())
}

async fn apply_cost_update(
    tx: &mut Transaction<'_, Sqlite>,
    update: &CostPriceUpdate,
    period_date: NaiveDate,
) -> DbResult<()> {
    let now = Utc::now();

    let result =
        sqlx::query("UPDATE fuel_products SET cost_price = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(&update.product_id)
            .bind(update.new_cost.amount().to_string())
            .bind(now)
            .execute(&mut **tx)
            .await?;

    if result.rows_affected() == 0 {
        warn!(product_id = %update.product_id, "Cost update for unknown fuel");
        return Err(DbError::not_found("FuelProduct", &update.product_id));
    }

    sqlx::query(
        r#"
        INSERT INTO cost_price_history (id, product_id, period_date, old_cost, new_cost, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&update.product_id)
    .bind(period_date)
    .bind(update.old_cost.amount().to_string())
    .bind(update.new_cost.amount().to_string())
    .bind(now)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

async fn insert_snapshot(
    tx: &mut Transaction<'_, Sqlite>,
    snapshot: &StockSnapshot,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO tank_history (
            id, tank_id, product_id, period_date, book_volume, physical_volume, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&snapshot.id)
    .bind(&snapshot.tank_id)
    .bind(&snapshot.product_id)
    .bind(snapshot.period_date)
    .bind(snapshot.book_volume.value().to_string())
    .bind(snapshot.physical_volume.map(|l| l.value().to_string()))
    .bind(snapshot.created_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

async fn upsert_expense(tx: &mut Transaction<'_, Sqlite>, batch: &PurchaseBatch) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO period_expenses (period_date, amount, supplier_id, updated_at)
        VALUES (?1, ?2, ?3, ?4)
        ON CONFLICT(period_date) DO UPDATE SET
            amount = excluded.amount,
            supplier_id = excluded.supplier_id,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(batch.period_date)
    .bind(batch.period_expense.amount().to_string())
    .bind(&batch.supplier_id)
    .bind(Utc::now())
    .execute(&mut **tx)
    .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

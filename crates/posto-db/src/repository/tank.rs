//! # Tank Repository
//!
//! Tanks, the stock registry for fuels without a tank, and the per-period
//! tank history written by the save batch.
//!
//! ## Where Prior Stock Comes From
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  fuel has a tank?  ──yes──► tanks.current_stock                         │
//! │        │                                                                │
//! │        no                                                               │
//! │        ▼                                                                │
//! │  stock_levels row? ──yes──► stock_levels.quantity                       │
//! │        │                                                                │
//! │        no ──► 0                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use super::parse_decimal;
use crate::error::{DbError, DbResult};
use posto_core::reconciliation::StockSnapshot;
use posto_core::{Liters, StockLevel, Tank};

#[derive(Debug, sqlx::FromRow)]
struct TankRow {
    id: String,
    product_id: String,
    name: String,
    capacity: String,
    current_stock: String,
}

impl TryFrom<TankRow> for Tank {
    type Error = DbError;

    fn try_from(row: TankRow) -> DbResult<Self> {
        Ok(Tank {
            capacity: Liters::new(parse_decimal("tanks.capacity", &row.capacity)?),
            current_stock: Liters::new(parse_decimal("tanks.current_stock", &row.current_stock)?),
            id: row.id,
            product_id: row.product_id,
            name: row.name,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct StockLevelRow {
    product_id: String,
    quantity: String,
}

impl TryFrom<StockLevelRow> for StockLevel {
    type Error = DbError;

    fn try_from(row: StockLevelRow) -> DbResult<Self> {
        Ok(StockLevel {
            quantity: Liters::new(parse_decimal("stock_levels.quantity", &row.quantity)?),
            product_id: row.product_id,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TankHistoryRow {
    id: String,
    tank_id: String,
    product_id: String,
    period_date: NaiveDate,
    book_volume: String,
    physical_volume: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<TankHistoryRow> for StockSnapshot {
    type Error = DbError;

    fn try_from(row: TankHistoryRow) -> DbResult<Self> {
        let physical_volume = row
            .physical_volume
            .as_deref()
            .map(|raw| parse_decimal("tank_history.physical_volume", raw).map(Liters::new))
            .transpose()?;

        Ok(StockSnapshot {
            book_volume: Liters::new(parse_decimal("tank_history.book_volume", &row.book_volume)?),
            physical_volume,
            id: row.id,
            tank_id: row.tank_id,
            product_id: row.product_id,
            period_date: row.period_date,
            created_at: row.created_at,
        })
    }
}

/// Repository for tanks and stock levels.
#[derive(Debug, Clone)]
pub struct TankRepository {
    pool: SqlitePool,
}

impl TankRepository {
    /// Creates a new TankRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TankRepository { pool }
    }

    /// Lists every tank.
    pub async fn list(&self) -> DbResult<Vec<Tank>> {
        let rows: Vec<TankRow> = sqlx::query_as(
            "SELECT id, product_id, name, capacity, current_stock FROM tanks ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), "Loaded tanks");
        rows.into_iter().map(Tank::try_from).collect()
    }

    /// Gets a tank by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Tank>> {
        let row: Option<TankRow> = sqlx::query_as(
            "SELECT id, product_id, name, capacity, current_stock FROM tanks WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Tank::try_from).transpose()
    }

    /// Inserts a new tank.
    pub async fn insert(&self, tank: &Tank) -> DbResult<()> {
        debug!(id = %tank.id, product_id = %tank.product_id, "Inserting tank");

        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO tanks (
                id, product_id, name, capacity, current_stock, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            "#,
        )
        .bind(&tank.id)
        .bind(&tank.product_id)
        .bind(&tank.name)
        .bind(tank.capacity.value().to_string())
        .bind(tank.current_stock.value().to_string())
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Lists the stock registry.
    pub async fn list_stock_levels(&self) -> DbResult<Vec<StockLevel>> {
        let rows: Vec<StockLevelRow> =
            sqlx::query_as("SELECT product_id, quantity FROM stock_levels")
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(StockLevel::try_from).collect()
    }

    /// Sets a fuel's registry quantity, creating the row if needed.
    pub async fn set_stock_level(&self, product_id: &str, quantity: Liters) -> DbResult<()> {
        debug!(product_id = %product_id, quantity = %quantity, "Setting stock level");

        sqlx::query(
            r#"
            INSERT INTO stock_levels (product_id, quantity, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(product_id) DO UPDATE SET
                quantity = excluded.quantity,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(product_id)
        .bind(quantity.value().to_string())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Tank history, newest period first.
    pub async fn history(&self, tank_id: &str) -> DbResult<Vec<StockSnapshot>> {
        let rows: Vec<TankHistoryRow> = sqlx::query_as(
            r#"
            SELECT id, tank_id, product_id, period_date, book_volume, physical_volume, created_at
            FROM tank_history
            WHERE tank_id = ?1
            ORDER BY period_date DESC, created_at DESC
            "#,
        )
        .bind(tank_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(StockSnapshot::try_from).collect()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

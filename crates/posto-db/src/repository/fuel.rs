//! # Fuel Repository
//!
//! Database operations for the fuel product registry.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use super::parse_decimal;
use crate::error::{DbError, DbResult};
use posto_core::{FuelProduct, Money};

/// Raw `fuel_products` row. Prices are TEXT decimals.
#[derive(Debug, sqlx::FromRow)]
struct FuelRow {
    id: String,
    name: String,
    code: String,
    cost_price: String,
    sale_price: String,
    is_active: bool,
}

impl TryFrom<FuelRow> for FuelProduct {
    type Error = DbError;

    fn try_from(row: FuelRow) -> DbResult<Self> {
        Ok(FuelProduct {
            cost_price: Money::new(parse_decimal("fuel_products.cost_price", &row.cost_price)?),
            sale_price: Money::new(parse_decimal("fuel_products.sale_price", &row.sale_price)?),
            id: row.id,
            name: row.name,
            code: row.code,
            is_active: row.is_active,
        })
    }
}

const SELECT_FUEL: &str = r#"
    SELECT id, name, code, cost_price, sale_price, is_active
    FROM fuel_products
"#;

/// Repository for fuel product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = FuelRepository::new(pool);
/// let fuels = repo.list_active().await?;
/// ```
#[derive(Debug, Clone)]
pub struct FuelRepository {
    pool: SqlitePool,
}

impl FuelRepository {
    /// Creates a new FuelRepository.
    pub fn new(pool: SqlitePool) -> Self {
        FuelRepository { pool }
    }

    /// Lists active fuels ordered by code.
    pub async fn list_active(&self) -> DbResult<Vec<FuelProduct>> {
        let sql = format!("{SELECT_FUEL} WHERE is_active = 1 ORDER BY code");
        let rows: Vec<FuelRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;

        debug!(count = rows.len(), "Loaded active fuels");
        rows.into_iter().map(FuelProduct::try_from).collect()
    }

    /// Gets a fuel by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<FuelProduct>> {
        let sql = format!("{SELECT_FUEL} WHERE id = ?1");
        let row: Option<FuelRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(FuelProduct::try_from).transpose()
    }

    /// Inserts a new fuel.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - code already exists
    pub async fn insert(&self, fuel: &FuelProduct) -> DbResult<()> {
        debug!(code = %fuel.code, "Inserting fuel");

        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO fuel_products (
                id, name, code, cost_price, sale_price, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
            "#,
        )
        .bind(&fuel.id)
        .bind(&fuel.name)
        .bind(&fuel.code)
        .bind(fuel.cost_price.amount().to_string())
        .bind(fuel.sale_price.amount().to_string())
        .bind(fuel.is_active)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Counts all fuels (active or not).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM fuel_products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

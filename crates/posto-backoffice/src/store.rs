//! # Period Store
//!
//! The storage collaborator seen by the period view: four registry reads
//! and one all-or-nothing batch write.
//!
//! ```text
//! ┌──────────────────┐  load_products / load_tanks   ┌────────────────────┐
//! │                  │  load_stock_levels            │                    │
//! │  PeriodSession   │  load_suppliers ─────────────►│  impl PeriodStore  │
//! │                  │                               │  (posto_db or fake)│
//! │                  │  commit_batch ───────────────►│                    │
//! └──────────────────┘  Ok(()) or nothing written    └────────────────────┘
//! ```

use async_trait::async_trait;
use posto_core::{FuelProduct, PurchaseBatch, StockLevel, Supplier, Tank};
use posto_db::{Database, DbResult};

/// Reads and writes the period view needs.
///
/// `commit_batch` must either store the whole batch or nothing.
#[async_trait]
pub trait PeriodStore: Send + Sync {
    /// Active fuels.
    async fn load_products(&self) -> DbResult<Vec<FuelProduct>>;

    async fn load_tanks(&self) -> DbResult<Vec<Tank>>;

    /// Registry quantities for fuels without a tank.
    async fn load_stock_levels(&self) -> DbResult<Vec<StockLevel>>;

    /// Active suppliers.
    async fn load_suppliers(&self) -> DbResult<Vec<Supplier>>;

    async fn commit_batch(&self, batch: &PurchaseBatch) -> DbResult<()>;
}

#[async_trait]
impl PeriodStore for Database {
    async fn load_products(&self) -> DbResult<Vec<FuelProduct>> {
        self.fuels().list_active().await
    }

    async fn load_tanks(&self) -> DbResult<Vec<Tank>> {
        self.tanks().list().await
    }

    async fn load_stock_levels(&self) -> DbResult<Vec<StockLevel>> {
        self.tanks().list_stock_levels().await
    }

    async fn load_suppliers(&self) -> DbResult<Vec<Supplier>> {
        self.suppliers().list_active().await
    }

    async fn commit_batch(&self, batch: &PurchaseBatch) -> DbResult<()> {
        self.purchases().commit_batch(batch).await
    }
}

//! # Service Bundle
//!
//! Wires the catalog, stores, bus, gateway, and persistence into one
//! handle. Construction loads the snapshots; a corrupted snapshot aborts
//! construction with the error instead of starting on made-up data.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::info;

use splitease_core::MenuCatalog;
use splitease_gateway::PaymentGateway;

use crate::billing::BillingStore;
use crate::error::StoreResult;
use crate::events::UpdateBus;
use crate::media::MediaLibrary;
use crate::orders::OrderStore;
use crate::reports::{self, DailyRevenue, MethodStats};
use crate::snapshot::SnapshotStore;

/// Everything a front end needs, behind one handle.
#[derive(Debug)]
pub struct Services<G> {
    pub catalog: Arc<MenuCatalog>,
    pub bus: Arc<UpdateBus>,
    pub orders: Arc<OrderStore>,
    pub billing: BillingStore<G>,
    pub snapshots: SnapshotStore,
    pub media: MediaLibrary,
}

impl<G: PaymentGateway> Services<G> {
    /// Builds the service bundle over `data_dir` and loads the persisted
    /// snapshots into the stores.
    pub fn open(data_dir: impl AsRef<Path>, catalog: MenuCatalog, gateway: G) -> StoreResult<Self> {
        let data_dir = data_dir.as_ref();
        let catalog = Arc::new(catalog);
        let bus = Arc::new(UpdateBus::new());
        let orders = Arc::new(OrderStore::new(Arc::clone(&catalog), Arc::clone(&bus)));
        let billing = BillingStore::new(Arc::clone(&orders), gateway, Arc::clone(&bus));
        let snapshots = SnapshotStore::new(data_dir);
        let media = MediaLibrary::load(data_dir)?;

        let persisted_orders = snapshots.load_orders()?;
        let persisted_bills = snapshots.load_bills()?;
        info!(
            data_dir = %data_dir.display(),
            orders = persisted_orders.len(),
            bills = persisted_bills.len(),
            "Snapshots loaded"
        );
        orders.restore(persisted_orders);
        billing.restore(persisted_bills);

        Ok(Services {
            catalog,
            bus,
            orders,
            billing,
            snapshots,
            media,
        })
    }

    /// Writes both stores to disk.
    pub fn save(&self) -> StoreResult<()> {
        self.snapshots.save_orders(&self.orders.export())?;
        self.snapshots.save_bills(&self.billing.export())?;
        Ok(())
    }

    /// Clears the stores and deletes the snapshot files.
    pub fn reset(&self) -> StoreResult<()> {
        self.orders.reset();
        self.billing.reset();
        self.snapshots.reset()?;
        info!("Stores and snapshots cleared");
        Ok(())
    }

    // =========================================================================
    // Reports
    // =========================================================================

    pub fn daily_revenue(&self, date: NaiveDate) -> DailyRevenue {
        reports::daily_revenue(&self.billing.export(), date)
    }

    pub fn payment_method_stats(&self, date: Option<NaiveDate>) -> BTreeMap<String, MethodStats> {
        reports::payment_method_stats(&self.billing.export(), date)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

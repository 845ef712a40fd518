//! # splitease-store: Stores, Splitting, and Persistence
//!
//! The service layer of SplitEase: in-memory order and billing stores with
//! JSON snapshot persistence, the bill splitting engine, live update
//! broadcasting, and end-of-day reports.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     splitease-store (THIS CRATE)                        │
//! │                                                                         │
//! │  ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐            │
//! │  │  orders   │  │  billing  │  │   split   │  │  reports  │            │
//! │  │ lifecycle │  │ payments  │  │  planner  │  │ revenue   │            │
//! │  └─────┬─────┘  └─────┬─────┘  └───────────┘  └───────────┘            │
//! │        │              │                                                 │
//! │  ┌─────▼──────────────▼─────┐  ┌───────────┐  ┌───────────┐            │
//! │  │    events (UpdateBus)    │  │ snapshot  │  │   media   │            │
//! │  │  broadcast + history(50) │  │ JSON files│  │ settings  │            │
//! │  └──────────────────────────┘  └───────────┘  └───────────┘            │
//! │                                                                         │
//! │  domain:  splitease-core     payments:  splitease-gateway              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`orders`] - Order lifecycle store and kitchen queue
//! - [`billing`] - Bill generation, discounts, payment, refunds
//! - [`split`] - Share planning for the four split kinds
//! - [`events`] - Live update broadcast with capped history
//! - [`snapshot`] - JSON snapshot persistence
//! - [`media`] - Menu media settings
//! - [`reports`] - Daily revenue and payment method aggregates
//! - [`services`] - One-handle bundle over all of the above

pub mod billing;
pub mod error;
pub mod events;
pub mod media;
pub mod orders;
pub mod reports;
pub mod services;
pub mod snapshot;
pub mod split;

pub use billing::BillingStore;
pub use error::{StoreError, StoreResult};
pub use events::{LiveUpdate, Notification, NotificationLevel, UpdateBus};
pub use media::{MediaAsset, MediaLibrary};
pub use orders::{NewOrder, NewOrderItem, OrderStore};
pub use reports::{daily_revenue, payment_method_stats, DailyRevenue, MethodStats};
pub use services::Services;
pub use snapshot::{SnapshotError, SnapshotStore, BILLS_FILE, ORDERS_FILE};
pub use split::SplitPlan;

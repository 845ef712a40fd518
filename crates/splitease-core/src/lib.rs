//! # splitease-core: Pure Business Logic for SplitEase
//!
//! This crate is the **heart** of SplitEase. It contains the restaurant
//! ordering and billing domain as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       SplitEase Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     UI layer (out of scope)                     │   │
//! │  │    Menu page ──► Order tracker ──► Bill splitter ──► Payment   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ in-process calls                       │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │            splitease-store (services + persistence)             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ splitease-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  catalog  │  │ validation│  │   │
//! │  │   │   Order   │  │   Money   │  │ MenuItem  │  │   rules   │  │   │
//! │  │   │   Bill    │  │  RateBps  │  │  lookups  │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO CLOCK BRANCHING • NO NETWORK • PURE FUNCTIONS    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (MenuItem, Order, Bill, splits, payments)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`catalog`] - The immutable menu catalog
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: File system, network, clocks-as-control-flow are FORBIDDEN here
//! 3. **Integer Money**: All monetary values are euro-cents (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod catalog;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use catalog::MenuCatalog;
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{ChargeBreakdown, ChargeSchedule, Money, RateBps};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct line items on a single order.
///
/// ## Business Reason
/// A table order beyond this size is almost certainly a UI bug or abuse;
/// the kitchen display also degrades past this point.
pub const MAX_ORDER_ITEMS: usize = 50;

/// Maximum quantity of a single line item.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 100 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 99;

/// Highest table number a venue can address.
pub const MAX_TABLE_NUMBER: u32 = 500;

/// Tolerance, in cents, when checking that split shares cover a bill total.
///
/// Split plans produced by [`money::Money::split_even`] and
/// [`money::Money::allocate`] are exact; the tolerance exists for
/// custom amounts entered by customers.
pub const SPLIT_TOLERANCE_CENTS: i64 = 1;

/// Number of notifications the update bus retains for late subscribers.
pub const NOTIFICATION_HISTORY: usize = 50;

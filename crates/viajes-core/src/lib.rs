//! # viajes-core: Pure Business Logic for the Viajes Booking Engine
//!
//! This crate is the **heart** of the booking system. It contains all
//! business logic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      Viajes Architecture                            │
//! │                                                                     │
//! │  ┌───────────────────────────────────────────────────────────────┐ │
//! │  │                 JSON API / form surface                       │ │
//! │  │    get cart, add item, checkout, confirm payment, cancel      │ │
//! │  └─────────────────────────────┬─────────────────────────────────┘ │
//! │                                │                                   │
//! │  ┌─────────────────────────────▼─────────────────────────────────┐ │
//! │  │              viajes-db (Checkout Engine, stores)              │ │
//! │  └─────────────────────────────┬─────────────────────────────────┘ │
//! │                                │                                   │
//! │  ┌─────────────────────────────▼─────────────────────────────────┐ │
//! │  │              ★ viajes-core (THIS CRATE) ★                     │ │
//! │  │                                                               │ │
//! │  │   ┌───────────┐ ┌───────────┐ ┌───────────┐ ┌───────────┐    │ │
//! │  │   │   types   │ │   money   │ │  pricing  │ │ validation│    │ │
//! │  │   │  Package  │ │   Money   │ │ subtotals │ │   rules   │    │ │
//! │  │   │Reservation│ │  (cents)  │ │  totals   │ │  checks   │    │ │
//! │  │   └───────────┘ └───────────┘ └───────────┘ └───────────┘    │ │
//! │  │                                                               │ │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS          │ │
//! │  └───────────────────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Package, Service, Cart, Reservation, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`pricing`] - The single pricing function shared by cart views and checkout
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum items allowed in a single cart.
///
/// A cart item is one package, so this bounds the number of distinct
/// packages staged for one checkout.
pub const MAX_CART_ITEMS: usize = 50;

/// Maximum quantity of a single add-on service per item.
///
/// Prevents accidental over-ordering (e.g., typing 200 instead of 2).
/// Quantity applies to add-on services only; packages are always one
/// unit per item.
pub const MAX_SERVICE_QUANTITY: i64 = 99;

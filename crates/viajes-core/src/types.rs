//! # Domain Types
//!
//! Core domain types of the booking engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                │
//! │                                                                     │
//! │  Catalog (shared, referenced-not-owned):                            │
//! │    Package ── price, stock, travel window, status                   │
//! │    Service ── add-on with unit cost and status                      │
//! │                                                                     │
//! │  Cart (mutable staging, owned tree):                                │
//! │    Cart (1 per user) ── CartItem ── CartItemService                 │
//! │                                                                     │
//! │  Reservation (immutable, price-frozen, owned tree):                 │
//! │    Reservation ── ReservationItem ── ReservationItemService         │
//! │                        │                   │                        │
//! │                 subtotal frozen      unit cost frozen               │
//! │                 at checkout          at checkout                    │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! Cart items carry no stored prices - their subtotal is always derived
//! from the current catalog, so a cost edit before checkout is reflected.
//! Reservation items are the opposite: subtotal and per-service unit cost
//! are copied by value at checkout and never recomputed.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Catalog Status
// =============================================================================

/// Lifecycle status of a catalog entity (package or add-on service).
///
/// Catalog rows are never destroyed while reservations reference them;
/// retiring an offering flips this flag instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "UPPERCASE")]
pub enum CatalogStatus {
    /// Visible and bookable.
    Active,
    /// Retired; kept for referential integrity of past reservations.
    Inactive,
}

impl CatalogStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            CatalogStatus::Active => "ACTIVE",
            CatalogStatus::Inactive => "INACTIVE",
        }
    }
}

impl Default for CatalogStatus {
    fn default() -> Self {
        CatalogStatus::Active
    }
}

// =============================================================================
// Reservation Status
// =============================================================================

/// The state of a reservation.
///
/// ```text
///         confirm_payment()
/// PENDING ───────────────► PAID      (terminal)
///    │
///    │ cancel()
///    ▼
/// CANCELLED                           (terminal)
/// ```
///
/// Stored as TEXT; decoding an unknown string is a hard error rather
/// than a silent fallback, on both the serde and the database path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "UPPERCASE")]
pub enum ReservationStatus {
    /// Created by checkout; stock is already committed.
    Pending,
    /// Payment confirmed. Terminal.
    Paid,
    /// Cancelled; stock was restored. Terminal.
    Cancelled,
}

impl ReservationStatus {
    /// Terminal states admit no further transitions.
    pub const fn is_final(&self) -> bool {
        matches!(self, ReservationStatus::Paid | ReservationStatus::Cancelled)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "PENDING",
            ReservationStatus::Paid => "PAID",
            ReservationStatus::Cancelled => "CANCELLED",
        }
    }
}

impl Default for ReservationStatus {
    fn default() -> Self {
        ReservationStatus::Pending
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// User
// =============================================================================

/// Owner of carts and reservations.
///
/// Authentication is out of scope - callers always pass identity
/// explicitly, and the engine only verifies the user exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    /// Unique identifier (UUID v4).
    pub id: String,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Package
// =============================================================================

/// A purchasable travel offering with fixed dates, price, and finite stock.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Package {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown in listings and error messages.
    pub name: String,

    pub description: Option<String>,

    /// Unit price in cents. Always >= 1 (0.01).
    pub price_cents: i64,

    /// First day of the packaged trip.
    pub travel_start: NaiveDate,

    /// Last day of the packaged trip. Strictly after `travel_start`.
    pub travel_end: NaiveDate,

    /// Remaining bookable units. Never negative.
    pub stock: i64,

    pub status: CatalogStatus,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Package {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Checks whether at least one unit can still be reserved.
    ///
    /// This is the optimistic cart-time check only; the authoritative
    /// check is the conditional decrement at checkout.
    pub fn has_stock(&self) -> bool {
        self.stock > 0
    }

    pub fn is_active(&self) -> bool {
        self.status == CatalogStatus::Active
    }
}

// =============================================================================
// Service (add-on)
// =============================================================================

/// An optional extra chargeable per unit quantity, attachable to a
/// cart or reservation item.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Service {
    /// Unique identifier (UUID v4).
    pub id: String,

    pub name: String,

    /// Cost per unit in cents.
    pub cost_cents: i64,

    pub status: CatalogStatus,

    pub created_at: DateTime<Utc>,
}

impl Service {
    /// Returns the unit cost as a Money type.
    #[inline]
    pub fn cost(&self) -> Money {
        Money::from_cents(self.cost_cents)
    }
}

// =============================================================================
// Cart
// =============================================================================

/// Per-user staging area for prospective purchases, not yet stock-committed.
///
/// One cart per user, created lazily on first access. The row persists
/// across checkouts; only its items are cleared.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Cart {
    pub id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A line in a cart: one package plus the chosen travel start date.
///
/// A given package may appear at most once per cart. No price is stored;
/// subtotals are derived from the catalog at read time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CartItem {
    pub id: String,
    pub cart_id: String,
    pub package_id: String,
    pub travel_start: NaiveDate,
    pub added_at: DateTime<Utc>,
}

/// An add-on selection attached to a cart item.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CartItemService {
    pub cart_item_id: String,
    pub service_id: String,
    /// Units of the service. Always >= 1.
    pub quantity: i64,
}

// =============================================================================
// Reservation
// =============================================================================

/// A stock-committed, price-frozen purchase record with its own lifecycle.
///
/// ## Invariant
/// `total_cents` equals the sum of its items' subtotals at creation time
/// and is never recomputed afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Reservation {
    pub id: String,

    /// Owning user. Immutable after creation.
    pub user_id: String,

    /// Total amount payable, frozen at checkout.
    pub total_cents: i64,

    pub status: ReservationStatus,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reservation {
    /// Returns the frozen total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// A line in a reservation. Uses the snapshot pattern: the subtotal is
/// captured at checkout time, decoupled from future catalog price edits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ReservationItem {
    pub id: String,
    pub reservation_id: String,

    /// The package that was reserved (referenced, not owned).
    pub package_id: String,

    pub travel_start: NaiveDate,

    /// Package price + services at time of checkout (frozen).
    pub subtotal_cents: i64,

    pub created_at: DateTime<Utc>,
}

/// An add-on line of a reservation item, with the unit cost frozen at
/// checkout time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ReservationItemService {
    pub reservation_item_id: String,
    pub service_id: String,
    pub quantity: i64,
    /// Cost per unit in cents at time of checkout (frozen).
    pub unit_cost_cents: i64,
}

// =============================================================================
// Inputs & Aggregates
// =============================================================================

/// Caller's add-on choice when adding to cart or reserving directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSelection {
    pub service_id: String,
    pub quantity: i64,
}

/// A priced add-on line inside a cart or reservation detail view.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricedService {
    pub service_id: String,
    pub name: String,
    pub quantity: i64,
    pub unit_cost_cents: i64,
    pub line_total_cents: i64,
}

/// A cart item joined with its package and priced add-ons.
///
/// `subtotal_cents` is derived via [`crate::pricing::item_subtotal`],
/// never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemDetail {
    pub item: CartItem,
    pub package_name: String,
    pub package_price_cents: i64,
    pub services: Vec<PricedService>,
    pub subtotal_cents: i64,
}

/// The user's cart with derived totals, as consumed by every surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartDetail {
    pub cart: Cart,
    pub items: Vec<CartItemDetail>,
    pub total_cents: i64,
}

impl CartDetail {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }
}

/// A reservation item joined with its frozen add-on lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationItemDetail {
    pub item: ReservationItem,
    pub package_name: String,
    pub services: Vec<PricedService>,
}

/// The full reservation aggregate returned by the checkout engine and
/// the lifecycle manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationDetail {
    pub reservation: Reservation,
    pub items: Vec<ReservationItemDetail>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reservation_status_finality() {
        assert!(!ReservationStatus::Pending.is_final());
        assert!(ReservationStatus::Paid.is_final());
        assert!(ReservationStatus::Cancelled.is_final());
    }

    #[test]
    fn test_status_serde_round_trip() {
        let json = serde_json::to_string(&ReservationStatus::Pending).unwrap();
        assert_eq!(json, "\"PENDING\"");
        let back: ReservationStatus = serde_json::from_str("\"CANCELLED\"").unwrap();
        assert_eq!(back, ReservationStatus::Cancelled);
    }

    #[test]
    fn test_status_rejects_unknown_string() {
        let result = serde_json::from_str::<ReservationStatus>("\"REFUNDED\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_catalog_status_default_active() {
        assert_eq!(CatalogStatus::default(), CatalogStatus::Active);
        assert_eq!(CatalogStatus::Active.as_str(), "ACTIVE");
    }
}

//! # viajes-db: Database Layer for the Viajes Booking Engine
//!
//! SQLite persistence via sqlx, plus the two transactional engines the
//! rest of the system is built around.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                       Viajes Data Flow                              │
//! │                                                                     │
//! │  API handler (add item, checkout, cancel, ...)                      │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  ┌───────────────────────────────────────────────────────────────┐ │
//! │  │                    viajes-db (THIS CRATE)                     │ │
//! │  │                                                               │ │
//! │  │  ┌────────────┐  ┌──────────────┐  ┌────────────────────────┐ │ │
//! │  │  │  Database  │  │ Repositories │  │  CheckoutEngine        │ │ │
//! │  │  │  (pool.rs) │  │ catalog/cart │  │  ReservationLifecycle  │ │ │
//! │  │  │ SqlitePool │◄─│ reservation  │◄─│  (one tx per op)       │ │ │
//! │  │  └────────────┘  └──────────────┘  └────────────────────────┘ │ │
//! │  └───────────────────────────────────────────────────────────────┘ │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  SQLite database (WAL mode, foreign keys ON)                        │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and the [`Database`] handle
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - [`DbError`] and the combined [`BookingError`]
//! - [`repository`] - Catalog, cart, reservation, and user stores
//! - [`checkout`] - The cart-to-reservation Checkout Engine
//! - [`lifecycle`] - The reservation state machine (pay / cancel)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use viajes_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("viajes.db")).await?;
//! let cart = db.carts().get_or_create(&user_id).await?;
//! let reservation = db.checkout().checkout(&user_id).await?;
//! db.lifecycle().confirm_payment(&reservation.reservation.id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod error;
pub mod lifecycle;
pub mod migrations;
pub mod pool;
pub mod repository;

#[cfg(test)]
pub(crate) mod testutil;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{BookingError, BookingResult, DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use checkout::CheckoutEngine;
pub use lifecycle::ReservationLifecycle;
pub use repository::cart::{CartRepository, NewCartItem};
pub use repository::catalog::CatalogRepository;
pub use repository::reservation::ReservationRepository;
pub use repository::user::UserRepository;

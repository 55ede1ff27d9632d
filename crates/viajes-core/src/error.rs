//! # Error Types
//!
//! Domain-specific error types for viajes-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                 │
//! │                                                                     │
//! │  viajes-core errors (this file)                                     │
//! │  ├── CoreError        - Domain rule violations                      │
//! │  └── ValidationError  - Input validation failures                   │
//! │                                                                     │
//! │  viajes-db errors (separate crate)                                  │
//! │  ├── DbError          - Database operation failures                 │
//! │  └── BookingError     - Domain ∪ Db, returned by the engines        │
//! │                                                                     │
//! │  API errors (in app)                                                │
//! │  └── ApiError         - What callers see (serialized, HTTP status)  │
//! │                                                                     │
//! │  Flow: ValidationError → CoreError → BookingError → ApiError        │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (package name, reservation id)
//! 3. Errors are enum variants, never bare strings
//! 4. The core never swallows a domain error; the boundary decides how
//!    each variant is presented

use chrono::NaiveDate;
use thiserror::Error;

use crate::types::ReservationStatus;

// =============================================================================
// Core Error
// =============================================================================

/// Domain rule violations of the booking engine.
///
/// Every variant maps to exactly one outcome class at the boundary:
/// not-found, conflict/bad-request, or validation. The mapping itself
/// is boundary responsibility.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Package id does not exist in the catalog.
    #[error("Package not found: {0}")]
    PackageNotFound(String),

    /// Add-on service id does not exist in the catalog.
    #[error("Service not found: {0}")]
    ServiceNotFound(String),

    /// Caller identity does not resolve to a known user.
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// Cart item id is absent or belongs to another user's cart.
    ///
    /// Foreign items are reported as missing rather than forbidden,
    /// so item ids cannot be enumerated across users.
    #[error("Cart item not found: {0}")]
    CartItemNotFound(String),

    /// Reservation id does not exist.
    #[error("Reservation not found: {0}")]
    ReservationNotFound(String),

    /// The package is already staged in this cart.
    ///
    /// A package may appear at most once per cart; the quantity concept
    /// applies only to add-on services.
    #[error("Package '{package}' is already in the cart")]
    DuplicateItem { package: String },

    /// No bookable units remain for the package.
    ///
    /// Raised optimistically at cart-add time and authoritatively by the
    /// conditional stock decrement during checkout. Aborts the entire
    /// checkout - no partial reservation is ever created.
    #[error("Insufficient stock for package '{package}'")]
    InsufficientStock { package: String },

    /// Checkout was requested on a cart with no items.
    #[error("The cart is empty")]
    EmptyCart,

    /// Cart has reached the maximum number of staged packages.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// The reservation is in a terminal state and admits no transition.
    ///
    /// Calling `confirm_payment` twice, or `cancel` after payment, lands
    /// here deterministically - retries must fail loudly rather than
    /// silently succeed, or stock could be restored twice.
    #[error("Reservation {reservation_id} is already {status}")]
    AlreadyFinalized {
        reservation_id: String,
        status: ReservationStatus,
    },

    /// The requested travel start date is before today.
    #[error("Travel date {date} is in the past")]
    TravelDateInPast { date: NaiveDate },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when caller input does not meet requirements, before any
/// business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g., malformed date ordering).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

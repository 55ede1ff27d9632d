//! # Validation Module
//!
//! Business rule validation for caller input.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                              │
//! │                                                                     │
//! │  Layer 1: API boundary (deserialization)                            │
//! │  └── Types, required fields, closed status enums                    │
//! │           │                                                         │
//! │           ▼                                                         │
//! │  Layer 2: THIS MODULE - business rule validation                    │
//! │  └── Travel dates, quantities, catalog field rules                  │
//! │           │                                                         │
//! │           ▼                                                         │
//! │  Layer 3: Database (SQLite)                                         │
//! │  └── NOT NULL / UNIQUE / FK constraints, stock >= 0 CHECK           │
//! │                                                                     │
//! │  Multiple layers catch different errors                             │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashSet;

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::types::ServiceSelection;
use crate::MAX_SERVICE_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Booking Input Validators
// =============================================================================

/// Validates a requested travel start date against a reference "today".
///
/// Taking `today` as a parameter keeps this pure and testable; callers
/// pass `Utc::now().date_naive()`.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use viajes_core::validation::validate_travel_date;
///
/// let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
/// assert!(validate_travel_date(today, today).is_ok());
/// assert!(validate_travel_date(today.pred_opt().unwrap(), today).is_err());
/// ```
pub fn validate_travel_date(date: NaiveDate, today: NaiveDate) -> ValidationResult<()> {
    if date < today {
        return Err(ValidationError::InvalidFormat {
            field: "travelStart".to_string(),
            reason: format!("{} is before today", date),
        });
    }
    Ok(())
}

/// Validates an add-on service quantity.
///
/// ## Rules
/// - Must be at least 1
/// - Must not exceed [`MAX_SERVICE_QUANTITY`]
pub fn validate_service_quantity(quantity: i64) -> ValidationResult<()> {
    if quantity < 1 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if quantity > MAX_SERVICE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_SERVICE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a whole set of add-on selections for one item.
///
/// ## Rules
/// - Every quantity passes [`validate_service_quantity`]
/// - A service may be selected at most once; quantity expresses repetition
pub fn validate_service_selections(selections: &[ServiceSelection]) -> ValidationResult<()> {
    let mut seen = HashSet::new();
    for selection in selections {
        validate_service_quantity(selection.quantity)?;
        if !seen.insert(selection.service_id.as_str()) {
            return Err(ValidationError::InvalidFormat {
                field: "services".to_string(),
                reason: format!("service '{}' listed more than once", selection.service_id),
            });
        }
    }
    Ok(())
}

// =============================================================================
// Catalog Validators (admin edits)
// =============================================================================

/// Validates a catalog display name.
pub fn validate_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a package price in cents.
///
/// Zero-priced packages are not sellable; the minimum is one cent.
pub fn validate_price_cents(price_cents: i64) -> ValidationResult<()> {
    if price_cents < 1 {
        return Err(ValidationError::MustBePositive {
            field: "priceCents".to_string(),
        });
    }
    Ok(())
}

/// Validates a package travel window: the end must be strictly after
/// the start.
pub fn validate_travel_window(start: NaiveDate, end: NaiveDate) -> ValidationResult<()> {
    if end <= start {
        return Err(ValidationError::InvalidFormat {
            field: "travelEnd".to_string(),
            reason: format!("{} is not after {}", end, start),
        });
    }
    Ok(())
}

/// Validates a stock count for a catalog edit.
pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::OutOfRange {
            field: "stock".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_travel_date_today_is_valid() {
        let today = day(2026, 3, 1);
        assert!(validate_travel_date(today, today).is_ok());
        assert!(validate_travel_date(day(2026, 3, 2), today).is_ok());
    }

    #[test]
    fn test_travel_date_past_rejected() {
        let today = day(2026, 3, 1);
        assert!(validate_travel_date(day(2026, 2, 28), today).is_err());
    }

    #[test]
    fn test_service_quantity_bounds() {
        assert!(validate_service_quantity(1).is_ok());
        assert!(validate_service_quantity(99).is_ok());
        assert!(validate_service_quantity(0).is_err());
        assert!(validate_service_quantity(-1).is_err());
        assert!(validate_service_quantity(100).is_err());
    }

    #[test]
    fn test_selections_reject_repeated_service() {
        let pick = |id: &str, qty| ServiceSelection {
            service_id: id.to_string(),
            quantity: qty,
        };

        assert!(validate_service_selections(&[]).is_ok());
        assert!(validate_service_selections(&[pick("s-1", 2), pick("s-2", 1)]).is_ok());
        assert!(validate_service_selections(&[pick("s-1", 1), pick("s-1", 1)]).is_err());
        assert!(validate_service_selections(&[pick("s-1", 0)]).is_err());
    }

    #[test]
    fn test_name_rules() {
        assert!(validate_name("Cusco Explorer").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"a".repeat(201)).is_err());
    }

    #[test]
    fn test_price_minimum_one_cent() {
        assert!(validate_price_cents(1).is_ok());
        assert!(validate_price_cents(0).is_err());
        assert!(validate_price_cents(-100).is_err());
    }

    #[test]
    fn test_travel_window_ordering() {
        assert!(validate_travel_window(day(2026, 3, 1), day(2026, 3, 8)).is_ok());
        assert!(validate_travel_window(day(2026, 3, 1), day(2026, 3, 1)).is_err());
        assert!(validate_travel_window(day(2026, 3, 8), day(2026, 3, 1)).is_err());
    }

    #[test]
    fn test_stock_non_negative() {
        assert!(validate_stock(0).is_ok());
        assert!(validate_stock(10).is_ok());
        assert!(validate_stock(-1).is_err());
    }
}

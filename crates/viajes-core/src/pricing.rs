//! # Pricing Module
//!
//! The single pricing function shared by every consumer: the cart views,
//! the checkout engine, and any presentation-layer summary all price an
//! item the same way, so their totals always agree.
//!
//! ## Pricing Rule
//! ```text
//! item subtotal  =  package price + Σ (service unit cost × quantity)
//! booking total  =  Σ item subtotals
//! ```
//!
//! Packages are always one unit per item; quantity applies only to the
//! add-on services.

use crate::money::Money;

/// One add-on line entering the subtotal computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceLine {
    /// Cost per unit of the service.
    pub unit_cost: Money,
    /// Units chosen. Expected >= 1; validated upstream.
    pub quantity: i64,
}

impl ServiceLine {
    pub const fn new(unit_cost: Money, quantity: i64) -> Self {
        ServiceLine { unit_cost, quantity }
    }

    /// `unit cost × quantity` for this line.
    #[inline]
    pub const fn line_total(&self) -> Money {
        self.unit_cost.multiply_quantity(self.quantity)
    }
}

/// Computes the subtotal of one item: package price plus all add-on lines.
///
/// ## Example
/// ```rust
/// use viajes_core::money::Money;
/// use viajes_core::pricing::{item_subtotal, ServiceLine};
///
/// // Package 500.00 with one service 50.00 × 2
/// let subtotal = item_subtotal(
///     Money::from_cents(50000),
///     &[ServiceLine::new(Money::from_cents(5000), 2)],
/// );
/// assert_eq!(subtotal.cents(), 60000); // 600.00
/// ```
pub fn item_subtotal(package_price: Money, services: &[ServiceLine]) -> Money {
    services
        .iter()
        .fold(package_price, |acc, line| acc + line.line_total())
}

/// Sums item subtotals into the amount payable for a whole booking.
pub fn booking_total(subtotals: &[Money]) -> Money {
    subtotals.iter().copied().sum()
}

// =============================================================================
// Unit Tests
// =============================================================================

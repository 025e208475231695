//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Summing per-line taxes as doubles drifts:                              │
//! │    0.1 + 0.2 = 0.30000000000000004                                      │
//! │                                                                         │
//! │  An order total built that way may not equal                            │
//! │  subtotal + shipping + tax when re-added on the invoice.                 │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units (paise)                              │
//! │    Every line tax is rounded to one paisa, then summed exactly.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use culturaft_core::money::Money;
//!
//! let price = Money::from_cents(8500); // ₹85.00
//! let line = price.checked_mul(2);     // ₹170.00
//! assert_eq!(line.map(|m| m.cents()), Some(17000));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;
use ts_rs::TS;

use crate::types::TaxRate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (paise for INR).
///
/// ## Design Decisions
/// - **i64 (signed)**: arithmetic never has to special-case subtraction
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Serializes as a bare integer**: the wire carries `…Cents` fields
///
/// ## Where Money is Used
/// ```text
/// Product.price_cents ──► PricedLineItem.unit_price ──► line total
///                                   │
///                                   ├──► sgst_amount / cgst_amount
///                                   ▼
///           OrderTotals { subtotal, shipping, tax, total } ──► InvoiceView
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    ///
    /// ## Example
    /// ```rust
    /// use culturaft_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // ₹10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Calculates tax on this amount, rounded half-up to one minor unit.
    ///
    /// ## Implementation
    /// Integer math: `(amount * bps + 5000) / 10000`.
    /// The +5000 is the half-unit that makes the division round instead of
    /// truncate. Amounts handled here are never negative.
    ///
    /// Returns `None` when the result does not fit in `i64`, which only a
    /// rate above 100% can cause.
    ///
    /// ## Example
    /// ```rust
    /// use culturaft_core::money::Money;
    /// use culturaft_core::types::TaxRate;
    ///
    /// let line = Money::from_cents(17000);   // ₹170.00
    /// let sgst = TaxRate::from_bps(250);     // 2.5%
    /// assert_eq!(line.calculate_tax(sgst).map(|t| t.cents()), Some(425)); // ₹4.25
    /// ```
    ///
    /// ## Order Pricing Flow
    /// ```text
    /// line total ₹170.00
    ///      │
    ///      ├── calculate_tax(SGST 2.5%) ──► ₹4.25
    ///      └── calculate_tax(CGST 2.5%) ──► ₹4.25
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Option<Money> {
        // i128 so that large carts cannot overflow the intermediate product
        let tax_cents = (i128::from(self.0) * i128::from(rate.bps()) + 5000) / 10000;
        i64::try_from(tax_cents).ok().map(Money::from_cents)
    }

    /// Multiplies money by a quantity, `None` on overflow.
    ///
    /// ## Example
    /// ```rust
    /// use culturaft_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299);
    /// assert_eq!(unit_price.checked_mul(3).map(|m| m.cents()), Some(897));
    /// assert_eq!(Money::from_cents(i64::MAX / 2).checked_mul(3), None);
    /// ```
    #[inline]
    pub const fn checked_mul(&self, qty: i64) -> Option<Money> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Adds two amounts, `None` on overflow.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Money> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Human-readable rupee amount. UI code does its own localisation.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}₹{}.{:02}", sign, self.major().abs(), self.cents_part())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

/// Saturates at the `i64` bounds. Pricing uses [`Money::checked_add`].
impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

//! # Money, Liters and Percent
//!
//! Exact decimal value types used by every derivation in the engine.
//!
//! ## Why Decimal (and not integer cents)?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE AVERAGE COST PROBLEM                                               │
//! │                                                                         │
//! │  Purchase: 5.000,000 L for R$ 25.517,35                                 │
//! │  Average:  R$ 5,10347 per liter                                         │
//! │                                                                         │
//! │  In integer cents the average collapses to 510 and every liter sold    │
//! │  loses R$ 0,00347 of cost. Over 250 L/day that is a visible margin     │
//! │  error on the closing report.                                           │
//! │                                                                         │
//! │  OUR SOLUTION: rust_decimal                                             │
//! │    Exact base-10 arithmetic, 28 significant digits, no float drift.    │
//! │    Rounding happens only when a value is DISPLAYED.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Totality
//! Derivations must always produce a displayable result, so the arithmetic
//! here never panics:
//! - `+`, `-`, `*` saturate at the decimal range instead of overflowing
//! - every division checks for a zero denominator and yields zero
//!
//! ## Usage
//! ```rust
//! use posto_core::money::{Liters, Money};
//! use rust_decimal::Decimal;
//!
//! let purchase = Money::new(Decimal::new(25_500, 0));     // R$ 25.500,00
//! let liters = Liters::new(Decimal::new(5_000, 0));       // 5.000 L
//!
//! let unit_cost = purchase.per_liter(liters);
//! assert_eq!(unit_cost.amount(), Decimal::new(51, 1));    // R$ 5,10 / L
//!
//! // Zero denominators never panic
//! assert!(purchase.per_liter(Liters::ZERO).is_zero());
//! ```

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use ts_rs::TS;

use crate::numeric::format_br;
use crate::{CURRENCY_DECIMALS, VOLUME_DECIMALS};

/// Divides two decimals, returning zero when the denominator is zero
/// or the quotient is out of range.
#[inline]
pub(crate) fn safe_div(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator.is_zero() {
        return Decimal::ZERO;
    }
    numerator.checked_div(denominator).unwrap_or(Decimal::ZERO)
}

// =============================================================================
// Money
// =============================================================================

/// A currency amount in reais.
///
/// Used both for totals (purchase value, profit, stock value) and for
/// per-liter prices (average cost, cost-to-serve, sale price). The engine
/// never stores a rounded value; [`Money::round_to_cents`] exists for
/// display and persistence only.
///
/// ## Where Money Flows
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  purchasedValue ─┐                                                      │
/// │                  ├─► per_liter() ─► average cost ─► cost-to-serve       │
/// │  purchasedLiters ┘                                      │               │
/// │                                                         ▼               │
/// │  currentSalePrice ──────────────────────────────► unit profit           │
/// │                                                         │               │
/// │  volume sold ───────────────────────── × ───────────────┘               │
/// │                                         ▼                               │
/// │                                    total profit ─► PeriodTotals         │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[serde(transparent)]
#[ts(export)]
pub struct Money(#[ts(type = "string")] Decimal);

impl Money {
    /// Zero reais.
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Wraps a decimal amount.
    #[inline]
    pub const fn new(amount: Decimal) -> Self {
        Money(amount)
    }

    /// Returns the underlying decimal amount.
    #[inline]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Checks if the amount is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checks if the amount is greater than zero.
    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Checks if the amount is less than zero.
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Returns the absolute value.
    #[inline]
    pub fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Divides this amount by a volume, yielding a price per liter.
    ///
    /// Returns zero when `liters` is zero.
    ///
    /// ## Example
    /// ```rust
    /// use posto_core::money::{Liters, Money};
    /// use rust_decimal::Decimal;
    ///
    /// let expense = Money::new(Decimal::new(1000, 0));
    /// let basis = Liters::new(Decimal::new(1000, 0));
    /// assert_eq!(expense.per_liter(basis).amount(), Decimal::ONE);
    /// ```
    #[inline]
    pub fn per_liter(&self, liters: Liters) -> Money {
        Money(safe_div(self.0, liters.value()))
    }

    /// Rounds half away from zero to whole cents.
    pub fn round_to_cents(&self) -> Money {
        Money(
            self.0
                .round_dp_with_strategy(CURRENCY_DECIMALS, RoundingStrategy::MidpointAwayFromZero),
        )
    }
}

/// Display uses the Brazilian locale: `R$ 1.234,56`, `-R$ 50,00`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.is_negative() { "-" } else { "" };
        write!(
            f,
            "{}R$ {}",
            sign,
            format_br(self.0.abs(), CURRENCY_DECIMALS)
        )
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

/// Price per liter × volume = amount.
impl Mul<Liters> for Money {
    type Output = Money;

    #[inline]
    fn mul(self, liters: Liters) -> Money {
        Money(self.0.saturating_mul(liters.value()))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, |acc, m| acc + *m)
    }
}

// =============================================================================
// Liters
// =============================================================================

/// A fuel volume in liters.
///
/// Meter readings, purchases and stock figures all use this type. Values
/// may be negative when they are differences (projected book stock with
/// inconsistent data, loss/gain), so no clamping happens here.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[serde(transparent)]
#[ts(export)]
pub struct Liters(#[ts(type = "string")] Decimal);

impl Liters {
    /// Zero liters.
    pub const ZERO: Liters = Liters(Decimal::ZERO);

    /// Wraps a decimal volume.
    #[inline]
    pub const fn new(value: Decimal) -> Self {
        Liters(value)
    }

    /// Returns the underlying decimal volume.
    #[inline]
    pub const fn value(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Returns `self` or zero, whichever is larger.
    #[inline]
    pub fn clamp_non_negative(&self) -> Liters {
        Liters(self.0.max(Decimal::ZERO))
    }
}

/// Display uses the Brazilian locale with 3 fraction digits: `1.234,567 L`.
impl fmt::Display for Liters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} L", format_br(self.0, VOLUME_DECIMALS))
    }
}

impl Add for Liters {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Liters(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Liters {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Liters {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Liters(self.0.saturating_sub(other.0))
    }
}

impl Neg for Liters {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Liters(-self.0)
    }
}

/// Volume × price per liter = amount.
impl Mul<Money> for Liters {
    type Output = Money;

    #[inline]
    fn mul(self, price: Money) -> Money {
        price * self
    }
}

impl Sum for Liters {
    fn sum<I: Iterator<Item = Liters>>(iter: I) -> Self {
        iter.fold(Liters::ZERO, |acc, l| acc + l)
    }
}

impl<'a> Sum<&'a Liters> for Liters {
    fn sum<I: Iterator<Item = &'a Liters>>(iter: I) -> Self {
        iter.fold(Liters::ZERO, |acc, l| acc + *l)
    }
}

// =============================================================================
// Percent
// =============================================================================

/// A percentage value (`8.33` means 8.33%).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[serde(transparent)]
#[ts(export)]
pub struct Percent(#[ts(type = "string")] Decimal);

impl Percent {
    pub const ZERO: Percent = Percent(Decimal::ZERO);

    #[inline]
    pub const fn new(value: Decimal) -> Self {
        Percent(value)
    }

    /// Computes `part / whole × 100`, or zero when `whole` is zero.
    ///
    /// ## Example
    /// ```rust
    /// use posto_core::money::Percent;
    /// use rust_decimal::Decimal;
    ///
    /// let share = Percent::of(Decimal::new(400, 0), Decimal::new(1000, 0));
    /// assert_eq!(share.value(), Decimal::new(40, 0));
    ///
    /// assert!(Percent::of(Decimal::ONE, Decimal::ZERO).is_zero());
    /// ```
    pub fn of(part: Decimal, whole: Decimal) -> Percent {
        Percent(safe_div(part, whole).saturating_mul(Decimal::ONE_HUNDRED))
    }

    #[inline]
    pub const fn value(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

/// Display: `8,33%`.
impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < Decimal::ZERO { "-" } else { "" };
        write!(f, "{}{}%", sign, format_br(self.0.abs(), 2))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

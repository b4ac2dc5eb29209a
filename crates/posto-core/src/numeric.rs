//! # Numeric Input Normalizer
//!
//! Turns what the operator types into a Brazilian-locale display string
//! (`1.250,500`) and an exact decimal value, and formats decimals back.
//!
//! ## Input Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Keystroke → Value                                  │
//! │                                                                         │
//! │  raw buffer "R$ 1250,5a,7"                                              │
//! │       │                                                                 │
//! │       ▼  keep digits and commas                                         │
//! │  "1250,5,7"                                                             │
//! │       │                                                                 │
//! │       ▼  collapse extra commas into the fraction                        │
//! │  "1250,57"                                                              │
//! │       │                                                                 │
//! │       ▼  group thousands, cap fraction digits (kind-specific)           │
//! │  display "1.250,57"                                                     │
//! │       │                                                                 │
//! │       ▼  parse_br: drop dots, comma → point                             │
//! │  value 1250.57                                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Never Fails
//! Every field on the screen is optional input, so an empty or unparseable
//! string is worth zero. There is no error type in this module.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::{CURRENCY_DECIMALS, UNIT_PRICE_DECIMALS, VOLUME_DECIMALS};

// =============================================================================
// Field Kind
// =============================================================================

/// What kind of number a field holds, which decides its fraction digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Liters: meter readings, purchases, stock, tank gauge (3 digits).
    Volume,
    /// Price per liter (3 digits, as posted on the pump).
    UnitPrice,
    /// Currency totals: purchase value, period expense (2 digits).
    Currency,
    /// Whole numbers only.
    Integer,
}

impl FieldKind {
    /// Maximum fraction digits kept while typing and printed when formatting.
    pub const fn decimals(&self) -> u32 {
        match self {
            FieldKind::Volume => VOLUME_DECIMALS,
            FieldKind::UnitPrice => UNIT_PRICE_DECIMALS,
            FieldKind::Currency => CURRENCY_DECIMALS,
            FieldKind::Integer => 0,
        }
    }

    /// Whether a decimal comma is accepted.
    pub const fn allows_decimals(&self) -> bool {
        !matches!(self, FieldKind::Integer)
    }

    /// Normalizes a raw buffer for this kind of field.
    pub fn normalize(&self, raw: &str) -> String {
        normalize_input(raw, self.allows_decimals(), self.decimals() as usize)
    }
}

// =============================================================================
// Normalize / Parse / Format
// =============================================================================

/// Normalizes a raw text buffer into a Brazilian-locale numeric literal.
///
/// ## Rules
/// - Every character except digits and commas is dropped
/// - Everything after the first comma (further commas removed) is the fraction
/// - With decimals allowed and a comma present: the integer part gets dot
///   grouping and the fraction is truncated to `max_fraction_digits`
/// - Otherwise the whole buffer is an integer with dot grouping
///
/// ## Example
/// ```rust
/// use posto_core::numeric::normalize_input;
///
/// assert_eq!(normalize_input("1250,5", true, 3), "1.250,5");
/// assert_eq!(normalize_input("12,,5", true, 3), "12,5");
/// assert_eq!(normalize_input("1,23456", true, 3), "1,234");
/// assert_eq!(normalize_input("12,5", false, 3), "125");
/// assert_eq!(normalize_input("abc", true, 3), "");
/// ```
pub fn normalize_input(raw: &str, allow_decimals: bool, max_fraction_digits: usize) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',')
        .collect();

    let (int_part, fraction) = match cleaned.split_once(',') {
        Some((int_part, rest)) => (int_part, Some(rest.replace(',', ""))),
        None => (cleaned.as_str(), None),
    };

    match fraction {
        Some(fraction) if allow_decimals => {
            let fraction: String = fraction.chars().take(max_fraction_digits).collect();
            format!("{},{}", group_thousands(int_part), fraction)
        }
        Some(fraction) => group_thousands(&format!("{}{}", int_part, fraction)),
        None => group_thousands(int_part),
    }
}

/// Parses a Brazilian-locale literal into an exact decimal.
///
/// Dots are removed (grouping), the first comma becomes the decimal point,
/// and the longest leading number is taken. Empty, unparseable or
/// out-of-range input is zero.
///
/// ## Example
/// ```rust
/// use posto_core::numeric::parse_br;
/// use rust_decimal::Decimal;
///
/// assert_eq!(parse_br("1.250,500"), Decimal::new(12505, 1));
/// assert_eq!(parse_br(""), Decimal::ZERO);
/// assert_eq!(parse_br("abc"), Decimal::ZERO);
/// assert_eq!(parse_br("12abc"), Decimal::new(12, 0));
/// ```
pub fn parse_br(text: &str) -> Decimal {
    let ungrouped = text.trim().replace('.', "");
    let literal = ungrouped.replacen(',', ".", 1);
    parse_leading_number(&literal)
}

/// Formats a decimal as a Brazilian-locale literal with exactly `decimals`
/// fraction digits, rounding half away from zero.
///
/// ## Example
/// ```rust
/// use posto_core::numeric::format_br;
/// use rust_decimal::Decimal;
///
/// assert_eq!(format_br(Decimal::new(1234567, 3), 3), "1.234,567");
/// assert_eq!(format_br(Decimal::new(12345, 1), 2), "1.234,50");
/// assert_eq!(format_br(Decimal::ZERO, 3), "0,000");
/// assert_eq!(format_br(Decimal::new(-50, 0), 2), "-50,00");
/// ```
pub fn format_br(value: Decimal, decimals: u32) -> String {
    let mut rounded = value.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded < Decimal::ZERO;
    rounded = rounded.abs();
    rounded.rescale(decimals);

    let literal = rounded.to_string();
    let (int_part, fraction) = literal.split_once('.').unwrap_or((literal.as_str(), ""));

    let sign = if negative { "-" } else { "" };
    if decimals == 0 {
        format!("{}{}", sign, group_thousands(int_part))
    } else {
        format!("{}{},{}", sign, group_thousands(int_part), fraction)
    }
}

/// Inserts a dot every three digits counting from the right.
fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut grouped = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    grouped
}

/// Reads an optional sign, digits, and an optional `.digits` fraction from
/// the start of `literal`. Anything after that is ignored.
fn parse_leading_number(literal: &str) -> Decimal {
    let mut chars = literal.chars().peekable();
    let mut sign = "";
    if let Some(&c) = chars.peek() {
        if c == '-' || c == '+' {
            if c == '-' {
                sign = "-";
            }
            chars.next();
        }
    }

    let mut int_digits = String::new();
    while let Some(&c) = chars.peek() {
        if !c.is_ascii_digit() {
            break;
        }
        int_digits.push(c);
        chars.next();
    }

    let mut fraction_digits = String::new();
    if chars.peek() == Some(&'.') {
        chars.next();
        while let Some(&c) = chars.peek() {
            if !c.is_ascii_digit() {
                break;
            }
            fraction_digits.push(c);
            chars.next();
        }
    }

    if int_digits.is_empty() && fraction_digits.is_empty() {
        return Decimal::ZERO;
    }

    let int_digits = if int_digits.is_empty() { "0".to_string() } else { int_digits };
    let normalized = if fraction_digits.is_empty() {
        format!("{}{}", sign, int_digits)
    } else {
        format!("{}{}.{}", sign, int_digits, fraction_digits)
    };

    Decimal::from_str(&normalized).unwrap_or(Decimal::ZERO)
}

// =============================================================================
// Numeric Field
// =============================================================================

/// An operator-editable number: the text shown in the input plus the value
/// every calculation reads.
///
/// ## Single Source of Truth
/// The text exists only for display. `value` is recomputed from it on
/// every edit and is the only thing derivations ever look at.
///
/// ## Example
/// ```rust
/// use posto_core::numeric::{FieldKind, NumericField};
/// use rust_decimal::Decimal;
///
/// let mut meter = NumericField::empty(FieldKind::Volume);
/// meter.set_text("1250500,5");
/// assert_eq!(meter.text(), "1.250.500,5");
/// assert_eq!(meter.value(), Decimal::new(12505005, 1));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumericField {
    kind: FieldKind,
    text: String,
    value: Decimal,
}

impl NumericField {
    /// A blank field (value zero).
    pub fn empty(kind: FieldKind) -> Self {
        NumericField {
            kind,
            text: String::new(),
            value: Decimal::ZERO,
        }
    }

    /// A field pre-filled from a stored value, formatted for its kind.
    pub fn from_value(kind: FieldKind, value: Decimal) -> Self {
        let text = format_br(value, kind.decimals());
        let value = parse_br(&text);
        NumericField { kind, text, value }
    }

    /// Replaces the text with the normalized form of `raw` and re-parses.
    pub fn set_text(&mut self, raw: &str) {
        self.text = self.kind.normalize(raw);
        self.value = parse_br(&self.text);
    }

    /// Replaces the content with a formatted value.
    pub fn set_value(&mut self, value: Decimal) {
        *self = NumericField::from_value(self.kind, value);
    }

    /// Empties the field.
    pub fn clear(&mut self) {
        self.text.clear();
        self.value = Decimal::ZERO;
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn value(&self) -> Decimal {
        self.value
    }

    /// True when the operator has typed nothing.
    pub fn is_blank(&self) -> bool {
        self.text.is_empty()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

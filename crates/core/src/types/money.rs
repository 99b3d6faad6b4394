//! Ruble price type backed by decimal arithmetic.
//!
//! The shop trades in a single currency, so the price type carries only the
//! amount; currency handling collapses into display formatting.

use std::iter::Sum;
use std::ops::{Add, AddAssign};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A ruble amount.
///
/// Backed by [`Decimal`] to avoid floating-point drift in cart totals.
/// Serializes transparently as the decimal amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Zero rubles.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price from a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a price from a whole-ruble amount.
    #[must_use]
    pub fn from_rubles(rubles: i64) -> Self {
        Self(Decimal::from(rubles))
    }

    /// Get the underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether the amount is negative (invalid for catalog prices).
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Line total for a quantity of items at this unit price.
    #[must_use]
    pub fn line_total(&self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Price {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl std::fmt::Display for Price {
    /// Format for display, e.g. `1 500 ₽` or `249.50 ₽`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ₽", format_amount(self.0))
    }
}

/// Render a decimal amount with space-grouped thousands.
///
/// Whole amounts drop the fractional part entirely; anything else keeps two
/// decimal places (kopecks).
fn format_amount(amount: Decimal) -> String {
    let rounded = amount.round_dp(2);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let abs = rounded.abs();

    let (int_part, frac_part) = if abs.fract().is_zero() {
        (abs.trunc().to_string(), None)
    } else {
        let text = format!("{abs:.2}");
        match text.split_once('.') {
            Some((int, frac)) => (int.to_string(), Some(frac.to_string())),
            None => (text, None),
        }
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3 + 4);
    let digits: Vec<char> = int_part.chars().collect();
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(*c);
    }

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&grouped);
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(&frac);
    }
    out
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Price {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Price {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(amount))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Price {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::dec;

    #[test]
    fn test_display_whole_amount() {
        assert_eq!(Price::from_rubles(500).to_string(), "500 ₽");
        assert_eq!(Price::from_rubles(1500).to_string(), "1 500 ₽");
        assert_eq!(Price::from_rubles(1_234_567).to_string(), "1 234 567 ₽");
    }

    #[test]
    fn test_display_fractional_amount() {
        assert_eq!(Price::new(dec!(249.5)).to_string(), "249.50 ₽");
        assert_eq!(Price::new(dec!(1999.99)).to_string(), "1 999.99 ₽");
    }

    #[test]
    fn test_display_zero() {
        assert_eq!(Price::ZERO.to_string(), "0 ₽");
    }

    #[test]
    fn test_line_total() {
        let unit = Price::from_rubles(500);
        assert_eq!(unit.line_total(3), Price::from_rubles(1500));
        assert_eq!(unit.line_total(0), Price::ZERO);
    }

    #[test]
    fn test_sum_folds_amounts() {
        let total: Price = [Price::from_rubles(100), Price::new(dec!(0.50))]
            .into_iter()
            .sum();
        assert_eq!(total, Price::new(dec!(100.50)));
    }

    #[test]
    fn test_is_negative() {
        assert!(Price::new(dec!(-1)).is_negative());
        assert!(!Price::ZERO.is_negative());
        assert!(!Price::from_rubles(10).is_negative());
    }
}

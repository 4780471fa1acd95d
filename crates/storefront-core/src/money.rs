//! Money type for representing monetary values.
//!
//! Amounts are integers in the currency's minor unit, matching how the
//! catalog prices products. There is no floating-point arithmetic on the
//! amount path; `to_decimal` exists for display and provider payloads only.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported currencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Currency {
    /// Vietnamese dong, the store's trading currency.
    #[default]
    VND,
    USD,
    EUR,
}

impl Currency {
    /// Get the currency code (e.g., "VND").
    pub fn code(&self) -> &'static str {
        match self {
            Currency::VND => "VND",
            Currency::USD => "USD",
            Currency::EUR => "EUR",
        }
    }

    /// Get the currency symbol.
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::VND => "\u{0111}",
            Currency::USD => "$",
            Currency::EUR => "\u{20ac}",
        }
    }

    /// Get the number of decimal places for this currency.
    pub fn decimal_places(&self) -> u32 {
        match self {
            Currency::VND => 0,
            _ => 2,
        }
    }

    /// Parse a currency code string.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_uppercase().as_str() {
            "VND" => Some(Currency::VND),
            "USD" => Some(Currency::USD),
            "EUR" => Some(Currency::EUR),
            _ => None,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A monetary value with currency.
///
/// Amounts are stored in the smallest unit of the currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Money {
    /// Amount in the smallest currency unit.
    pub amount: i64,
    /// The currency.
    pub currency: Currency,
}

impl Money {
    /// Create a new Money value from minor units.
    pub fn new(amount: i64, currency: Currency) -> Self {
        Self { amount, currency }
    }

    /// Create a zero amount in the given currency.
    pub fn zero(currency: Currency) -> Self {
        Self::new(0, currency)
    }

    /// Check if this is zero.
    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }

    /// Check if this is positive.
    pub fn is_positive(&self) -> bool {
        self.amount > 0
    }

    /// Convert to a decimal value.
    pub fn to_decimal(&self) -> f64 {
        let divisor = 10_i64.pow(self.currency.decimal_places());
        self.amount as f64 / divisor as f64
    }

    /// Format as a display string (e.g., "đ130000").
    pub fn display(&self) -> String {
        format!("{}{}", self.currency.symbol(), self.display_amount())
    }

    /// Format the amount with the currency's decimal places and no symbol.
    ///
    /// This is the form payment providers expect (`"130000"`, `"49.99"`).
    pub fn display_amount(&self) -> String {
        let places = self.currency.decimal_places() as usize;
        format!("{:.places$}", self.to_decimal())
    }

    /// Try to add another Money value.
    ///
    /// Returns `None` if currencies don't match or the sum overflows.
    pub fn try_add(&self, other: &Money) -> Option<Money> {
        if self.currency != other.currency {
            return None;
        }
        self.amount
            .checked_add(other.amount)
            .map(|amount| Money::new(amount, self.currency))
    }

    /// Multiply by a quantity, returning `None` on overflow.
    pub fn try_multiply(&self, factor: i64) -> Option<Money> {
        self.amount
            .checked_mul(factor)
            .map(|amount| Money::new(amount, self.currency))
    }

    /// Add, clamping at the numeric bounds instead of failing.
    ///
    /// Amounts in other currencies are ignored.
    pub fn saturating_add(&self, other: &Money) -> Money {
        if self.currency != other.currency {
            return *self;
        }
        Money::new(self.amount.saturating_add(other.amount), self.currency)
    }

    /// Multiply, clamping at the numeric bounds instead of failing.
    pub fn saturating_multiply(&self, factor: i64) -> Money {
        Money::new(self.amount.saturating_mul(factor), self.currency)
    }

    /// Sum an iterator of Money values, returning `None` on overflow or mismatch.
    pub fn try_sum<'a>(mut iter: impl Iterator<Item = &'a Money>, currency: Currency) -> Option<Money> {
        iter.try_fold(Money::zero(currency), |acc, m| acc.try_add(m))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_display() {
        let m = Money::new(130_000, Currency::VND);
        assert_eq!(m.display(), "\u{0111}130000");

        let m = Money::new(4999, Currency::USD);
        assert_eq!(m.display(), "$49.99");
        assert_eq!(m.display_amount(), "49.99");
    }

    #[test]
    fn test_money_addition() {
        let a = Money::new(100_000, Currency::VND);
        let b = Money::new(30_000, Currency::VND);
        assert_eq!(a.try_add(&b), Some(Money::new(130_000, Currency::VND)));
    }

    #[test]
    fn test_money_currency_mismatch() {
        let vnd = Money::new(1000, Currency::VND);
        let usd = Money::new(1000, Currency::USD);
        assert_eq!(vnd.try_add(&usd), None);
        assert_eq!(vnd.saturating_add(&usd), vnd);
    }

    #[test]
    fn test_money_overflow() {
        let big = Money::new(i64::MAX, Currency::VND);
        assert_eq!(big.try_multiply(2), None);
        assert_eq!(big.saturating_multiply(2).amount, i64::MAX);
        assert_eq!(big.saturating_add(&Money::new(1, Currency::VND)).amount, i64::MAX);
    }

    #[test]
    fn test_try_sum() {
        let items = [
            Money::new(10, Currency::VND),
            Money::new(20, Currency::VND),
        ];
        assert_eq!(
            Money::try_sum(items.iter(), Currency::VND),
            Some(Money::new(30, Currency::VND))
        );
    }

    #[test]
    fn test_currency_from_code() {
        assert_eq!(Currency::from_code("vnd"), Some(Currency::VND));
        assert_eq!(Currency::from_code("EUR"), Some(Currency::EUR));
        assert_eq!(Currency::from_code("INVALID"), None);
    }
}

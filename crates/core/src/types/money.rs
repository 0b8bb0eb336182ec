//! Decimal money amounts.
//!
//! The shop trades in a single currency, configured per deployment. Amounts
//! are stored as decimal strings in documents (`serde-with-str`), so a
//! round-trip through JSON never loses precision.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A non-negative amount in the shop currency, kept at 2 decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create an amount, rounding half-up to 2 places and clamping negatives to zero.
    #[must_use]
    pub fn new(amount: Decimal) -> Self {
        let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        Self(rounded.max(Decimal::ZERO))
    }

    /// Create an amount from minor units (cents).
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self::new(Decimal::new(cents, 2))
    }

    /// The underlying decimal.
    #[must_use]
    pub const fn amount(self) -> Decimal {
        self.0
    }

    /// Whether the amount is zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    /// The amount multiplied by a quantity.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self::new(self.0 * Decimal::from(quantity))
    }

    /// Subtract, saturating at zero.
    #[must_use]
    pub fn saturating_sub(self, other: Self) -> Self {
        Self::new(self.0 - other.0)
    }

    /// Format for display in the given currency.
    #[must_use]
    pub fn display(self, currency: CurrencyCode) -> String {
        currency.format(self.0)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.0 + rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Self> for Money {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self::new(amount)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// ISO 4217 currency codes the shop can be configured with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    USD,
    EUR,
    GBP,
    VND,
}

impl CurrencyCode {
    /// Format an amount, e.g. `$12.50`, `€12.50`, `120,000₫`.
    #[must_use]
    pub fn format(self, amount: Decimal) -> String {
        match self {
            Self::USD => format!("${amount:.2}"),
            Self::EUR => format!("€{amount:.2}"),
            Self::GBP => format!("£{amount:.2}"),
            Self::VND => {
                let whole = amount
                    .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
                    .to_string();
                format!("{}₫", group_thousands(&whole))
            }
        }
    }
}

impl std::str::FromStr for CurrencyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "USD" => Ok(Self::USD),
            "EUR" => Ok(Self::EUR),
            "GBP" => Ok(Self::GBP),
            "VND" => Ok(Self::VND),
            other => Err(format!("unsupported currency: {other}")),
        }
    }
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rounds_and_clamps() {
        assert_eq!(Money::new(Decimal::new(12_345, 3)).amount(), Decimal::new(1235, 2));
        assert_eq!(Money::new(Decimal::new(-5, 0)), Money::ZERO);
    }

    #[test]
    fn test_times_and_sum() {
        let unit = Money::from_cents(1999);
        assert_eq!(unit.times(3), Money::from_cents(5997));

        let total: Money = [Money::from_cents(100), Money::from_cents(250)].iter().sum();
        assert_eq!(total, Money::from_cents(350));
    }

    #[test]
    fn test_display_formats() {
        let amount = Money::from_cents(1250);
        assert_eq!(amount.display(CurrencyCode::USD), "$12.50");
        assert_eq!(amount.display(CurrencyCode::EUR), "€12.50");
        assert_eq!(
            Money::new(Decimal::from(1_250_000)).display(CurrencyCode::VND),
            "1,250,000₫"
        );
        assert_eq!(Money::new(Decimal::from(500)).display(CurrencyCode::VND), "500₫");
    }

    #[test]
    fn test_serializes_as_decimal_string() {
        let json = serde_json::to_string(&Money::from_cents(4500)).unwrap();
        assert_eq!(json, "\"45.00\"");
    }

    #[test]
    fn test_currency_from_str() {
        assert_eq!("vnd".parse::<CurrencyCode>().unwrap(), CurrencyCode::VND);
        assert!("XYZ".parse::<CurrencyCode>().is_err());
    }
}

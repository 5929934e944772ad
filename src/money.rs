use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static DECIMAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]*)(?:\.([0-9]*))?$").expect("decimal pattern is valid"));

/// Fixed-point currency amount stored as a whole number of cents.
///
/// Prices, sale totals and restock costs all share this type so that the
/// ledger never accumulates floating point drift. Rendering always shows
/// exactly two fractional digits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money {
    cents: i64,
}

/// Reasons a decimal string can't be turned into [`Money`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoneyError {
    #[error("not a plain decimal amount: {0:?}")]
    Malformed(String),
    #[error("amount out of range: {0:?}")]
    Overflow(String),
}

impl Money {
    pub const ZERO: Money = Money { cents: 0 };

    pub fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    pub fn cents(self) -> i64 {
        self.cents
    }

    pub fn is_positive(self) -> bool {
        self.cents > 0
    }

    /// Price of `quantity` units, or `None` if it doesn't fit.
    pub fn checked_mul(self, quantity: u64) -> Option<Self> {
        let quantity = i64::try_from(quantity).ok()?;
        self.cents.checked_mul(quantity).map(Self::from_cents)
    }

    pub fn checked_add(self, rhs: Money) -> Option<Self> {
        self.cents.checked_add(rhs.cents).map(Self::from_cents)
    }

    pub fn checked_sub(self, rhs: Money) -> Option<Self> {
        self.cents.checked_sub(rhs.cents).map(Self::from_cents)
    }
}

impl FromStr for Money {
    type Err = MoneyError;

    /// Parses `digits[.digits]`. Anything past the second fractional digit
    /// is rounded half-up.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || MoneyError::Malformed(s.to_string());
        let overflow = || MoneyError::Overflow(s.to_string());

        let caps = DECIMAL.captures(s).ok_or_else(malformed)?;
        let whole = caps.get(1).map_or("", |m| m.as_str());
        let frac = caps.get(2).map_or("", |m| m.as_str());
        if whole.is_empty() && frac.is_empty() {
            return Err(malformed());
        }

        let units: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| overflow())?
        };

        let digits: Vec<i64> = frac.bytes().map(|b| i64::from(b - b'0')).collect();
        let tenths = digits.first().copied().unwrap_or(0);
        let hundredths = digits.get(1).copied().unwrap_or(0);
        let round_up = digits.get(2).is_some_and(|d| *d >= 5);

        units
            .checked_mul(100)
            .and_then(|c| c.checked_add(tenths * 10 + hundredths))
            .and_then(|c| c.checked_add(i64::from(round_up)))
            .map(Self::from_cents)
            .ok_or_else(overflow)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.cents < 0 { "-" } else { "" };
        let abs = self.cents.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn money(s: &str) -> Money {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_plain_decimals() {
        assert_eq!(money("9.99").cents(), 999);
        assert_eq!(money("20").cents(), 2000);
        assert_eq!(money("0.5").cents(), 50);
        assert_eq!(money(".25").cents(), 25);
        assert_eq!(money("7.").cents(), 700);
    }

    #[test]
    fn test_parse_rounds_extra_digits_half_up() {
        assert_eq!(money("1.234").cents(), 123);
        assert_eq!(money("1.235").cents(), 124);
        assert_eq!(money("9.995").cents(), 1000);
    }

    #[test]
    fn test_parse_rejects_signs_and_garbage() {
        for bad in ["", ".", "-1", "+1", "1e3", "inf", "NaN", "1.2.3", "12a", " 1"] {
            assert!(bad.parse::<Money>().is_err(), "{bad:?} should not parse");
        }
        assert!(matches!(
            "99999999999999999999".parse::<Money>(),
            Err(MoneyError::Overflow(_))
        ));
    }

    #[test]
    fn test_display_always_two_decimals() {
        assert_eq!(Money::from_cents(1998).to_string(), "19.98");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::ZERO.to_string(), "0.00");
        assert_eq!(Money::from_cents(-1250).to_string(), "-12.50");
    }

    #[test]
    fn test_checked_arithmetic() {
        assert_eq!(money("9.99").checked_mul(2), Some(money("19.98")));
        assert_eq!(Money::from_cents(i64::MAX).checked_mul(2), None);
        assert_eq!(money("1.10").checked_add(money("2.20")), Some(money("3.30")));
        assert_eq!(money("1").checked_sub(money("2.5")), Some(Money::from_cents(-150)));

        let near_max = money("90000000000000000");
        assert_eq!(near_max.cents(), 9_000_000_000_000_000_000);
        assert_eq!(near_max.checked_add(near_max), None);
        assert_eq!(Money::from_cents(i64::MIN).checked_sub(money("0.01")), None);
    }

    #[test]
    fn test_sub_cent_amounts_round_to_zero() {
        assert_eq!(money("0.004"), Money::ZERO);
        assert!(!money("0.004").is_positive());
        assert!(money("0.005").is_positive());
    }
}

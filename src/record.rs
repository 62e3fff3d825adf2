use crate::error::RowError;
use chrono::{Datelike, NaiveDate};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;
use std::str::FromStr;

/// A currency amount held as whole cents
///
/// Cents are stored as `i128`. A single parsed amount is limited to the `i64`
/// range, so `amount × quantity` and sums over any realistic number of rows
/// stay exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(i128);

/// Largest exponent accepted in `1.5E+3` style amounts
const MAX_EXPONENT: i64 = 40;

impl Money {
    pub const ZERO: Money = Money(0);

    /// Amount from a whole number of cents
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents as i128)
    }

    /// Get the amount in cents
    pub const fn cents(self) -> i128 {
        self.0
    }

    /// Check if the amount is below zero
    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// `self` multiplied by a quantity
    pub fn times(self, quantity: u32) -> Money {
        Money(self.0 * i128::from(quantity))
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let text = format!("{}{}.{:02}", sign, abs / 100, abs % 100);
        f.pad(&text)
    }
}

/// Parses a decimal such as `1000`, `30.5`, `-2.345` or `1.5E+3`, rounding
/// half up (away from zero) to cents. Amounts beyond the `i64` range of cents
/// are rejected.
impl FromStr for Money {
    type Err = RowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || RowError::Amount(s.to_string());
        let trimmed = s.trim();

        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };

        let (mantissa, exponent) = match unsigned.find(|c: char| c == 'e' || c == 'E') {
            Some(at) => {
                let exponent: i64 = unsigned[at + 1..].parse().map_err(|_| invalid())?;
                (&unsigned[..at], exponent)
            }
            None => (unsigned, 0),
        };
        if exponent.abs() > MAX_EXPONENT {
            return Err(invalid());
        }

        let (whole, fraction) = match mantissa.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (mantissa, ""),
        };

        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if (whole.is_empty() && fraction.is_empty()) || !all_digits(whole) || !all_digits(fraction) {
            return Err(invalid());
        }

        // Shift the decimal point by the exponent, then read digits around it
        let digits: Vec<i128> = whole
            .bytes()
            .chain(fraction.bytes())
            .map(|b| i128::from(b - b'0'))
            .collect();
        let point = whole.len() as i64 + exponent;
        let digit_at = |i: i64| {
            usize::try_from(i)
                .ok()
                .and_then(|i| digits.get(i).copied())
                .unwrap_or(0)
        };

        let mut cents: i128 = 0;
        for i in 0..point.max(0) {
            cents = cents
                .checked_mul(10)
                .and_then(|c| c.checked_add(digit_at(i)))
                .filter(|c| *c <= i128::from(i64::MAX))
                .ok_or_else(invalid)?;
        }

        let round_up = digit_at(point + 2) >= 5;
        cents = cents * 100 + digit_at(point) * 10 + digit_at(point + 1) + i128::from(round_up);
        if cents > i128::from(i64::MAX) {
            return Err(invalid());
        }

        Ok(Money(if negative { -cents } else { cents }))
    }
}

/// One sale, as read from a CSV row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalesRecord {
    pub product_id: String,
    pub product_name: String,
    pub category: String,
    pub sale_date: NaiveDate,
    pub amount: Money,
    pub quantity: u32,
    pub region: String,
    pub sales_rep: String,
}

impl SalesRecord {
    /// Build a validated record. Text fields are trimmed; blank category,
    /// region and rep fall back to defaults.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        product_id: &str,
        product_name: &str,
        category: &str,
        sale_date: NaiveDate,
        amount: Money,
        quantity: u32,
        region: &str,
        sales_rep: &str,
    ) -> Result<Self, RowError> {
        let product_id = product_id.trim();
        if product_id.is_empty() {
            return Err(RowError::Field {
                field: "product id",
                reason: "cannot be empty".into(),
            });
        }
        let product_name = product_name.trim();
        if product_name.is_empty() {
            return Err(RowError::Field {
                field: "product name",
                reason: "cannot be empty".into(),
            });
        }
        if amount.is_negative() {
            return Err(RowError::Field {
                field: "amount",
                reason: format!("must be non-negative, got {}", amount),
            });
        }

        Ok(Self {
            product_id: product_id.to_string(),
            product_name: product_name.to_string(),
            category: or_default(category, "Uncategorized"),
            sale_date,
            amount,
            quantity,
            region: or_default(region, "Unknown"),
            sales_rep: or_default(sales_rep, "Unknown"),
        })
    }

    /// amount × quantity
    pub fn total_value(&self) -> Money {
        self.amount.times(self.quantity)
    }

    /// Calendar year of the sale
    pub fn year(&self) -> i32 {
        self.sale_date.year()
    }

    /// Calendar month of the sale, 1 to 12
    pub fn month(&self) -> u32 {
        self.sale_date.month()
    }
}

fn or_default(value: &str, default: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_money_parsing() {
        assert_eq!("1000.00".parse::<Money>(), Ok(Money::from_cents(100_000)));
        assert_eq!("30".parse::<Money>(), Ok(Money::from_cents(3_000)));
        assert_eq!("0.5".parse::<Money>(), Ok(Money::from_cents(50)));
        assert_eq!(".25".parse::<Money>(), Ok(Money::from_cents(25)));
        assert_eq!("2.345".parse::<Money>(), Ok(Money::from_cents(235)));
        assert_eq!("2.344".parse::<Money>(), Ok(Money::from_cents(234)));
        assert_eq!("-2.345".parse::<Money>(), Ok(Money::from_cents(-235)));
    }

    #[test]
    fn test_money_exponent_forms() {
        assert_eq!("1E+3".parse::<Money>(), Ok(Money::from_cents(100_000)));
        assert_eq!("2.5e1".parse::<Money>(), Ok(Money::from_cents(2_500)));
        assert_eq!("125e-2".parse::<Money>(), Ok(Money::from_cents(125)));
        assert_eq!("1.2345E2".parse::<Money>(), Ok(Money::from_cents(12_345)));
        assert_eq!("5E-3".parse::<Money>(), Ok(Money::from_cents(1)));
        assert_eq!("-4e0".parse::<Money>(), Ok(Money::from_cents(-400)));
    }

    #[test]
    fn test_large_amount_times_quantity_is_exact() {
        let amount: Money = "100000000000000.00".parse().unwrap();
        let value = amount.times(1000);
        assert_eq!(value.cents(), 10_000_000_000_000_000_000);
        assert_eq!(value.to_string(), "100000000000000000.00");

        let total: Money = vec![value; 4].into_iter().sum();
        assert_eq!(total.cents(), 40_000_000_000_000_000_000);
        assert!(!total.is_negative());
    }

    #[test]
    fn test_money_rejects_garbage() {
        for bad in ["", "not-a-number", "1.2.3", "12a", ".", "-", "99999999999999999999", "1e", "1E+99", "e5"] {
            assert!(bad.parse::<Money>().is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_money_display() {
        assert_eq!(Money::from_cents(315_000).to_string(), "3150.00");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::from_cents(-120).to_string(), "-1.20");
        assert_eq!(format!("{:>8}", Money::from_cents(150)), "    1.50");
    }

    #[test]
    fn test_total_value() {
        let record = SalesRecord::new(
            "P001",
            "Laptop",
            "Electronics",
            date(2024, 1, 15),
            Money::from_cents(100_000),
            2,
            "North",
            "John",
        )
        .unwrap();
        assert_eq!(record.total_value(), Money::from_cents(200_000));
        assert_eq!(record.year(), 2024);
        assert_eq!(record.month(), 1);
    }

    #[test]
    fn test_defaults_and_trimming() {
        let record = SalesRecord::new(
            " P9 ",
            " Lamp ",
            "  ",
            date(2024, 5, 1),
            Money::ZERO,
            0,
            "",
            "",
        )
        .unwrap();
        assert_eq!(record.product_id, "P9");
        assert_eq!(record.product_name, "Lamp");
        assert_eq!(record.category, "Uncategorized");
        assert_eq!(record.region, "Unknown");
        assert_eq!(record.sales_rep, "Unknown");
    }

    #[test]
    fn test_rejects_empty_id_and_negative_amount() {
        let d = date(2024, 1, 1);
        assert!(SalesRecord::new("", "X", "C", d, Money::ZERO, 1, "R", "S").is_err());
        assert!(SalesRecord::new("P", "X", "C", d, Money::from_cents(-1), 1, "R", "S").is_err());
    }
}

/*!
 * Fixed point money amounts with two digits past the point.
 *
 * Amounts are kept as integer cents so that balances never pick up
 * floating point drift. Parsing accepts a leading minus sign so that
 * the ledger, not the parser, is the one rejecting negative amounts
 * with a proper error.
 */
use std::{fmt::Display, str::FromStr};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::AmountError;

const FIXED_POINT_MAGNITUDE: i64 = 100;
const EXPECTED_PRECISION: usize = 2;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    pub fn checked_sub(self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money)
    }
}

pub fn string_to_fixed_point(string: &str) -> Result<i64, AmountError> {
    let string = string.trim();
    let (negative, digits) = match string.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, string),
    };

    let split_amount: Vec<&str> = digits.split('.').collect();
    if split_amount.len() > 2 {
        return Err(AmountError::Malformed(string.to_owned()));
    }

    let units_part = split_amount[0];
    let decimals_part = split_amount.get(1).copied().unwrap_or("");

    if units_part.is_empty() && decimals_part.is_empty() {
        return Err(AmountError::Malformed(string.to_owned()));
    }
    if !units_part.chars().all(|c| c.is_ascii_digit())
        || !decimals_part.chars().all(|c| c.is_ascii_digit())
    {
        return Err(AmountError::Malformed(string.to_owned()));
    }
    if decimals_part.len() > EXPECTED_PRECISION {
        return Err(AmountError::TooPrecise(string.to_owned()));
    }

    let units: i64 = if units_part.is_empty() {
        0
    } else {
        units_part
            .parse()
            .map_err(|_| AmountError::OutOfRange(string.to_owned()))?
    };

    let mut hundredths: i64 = if decimals_part.is_empty() {
        0
    } else {
        decimals_part
            .parse()
            .map_err(|_| AmountError::Malformed(string.to_owned()))?
    };
    hundredths *= 10i64.pow((EXPECTED_PRECISION - decimals_part.len()) as u32);

    let magnitude = units
        .checked_mul(FIXED_POINT_MAGNITUDE)
        .and_then(|cents| cents.checked_add(hundredths))
        .ok_or_else(|| AmountError::OutOfRange(string.to_owned()))?;

    Ok(if negative { -magnitude } else { magnitude })
}

pub fn fixed_point_to_string(fixed_point: i64) -> String {
    let sign = if fixed_point < 0 { "-" } else { "" };
    let magnitude = fixed_point.unsigned_abs();
    format!(
        "{}{}.{:02}",
        sign,
        magnitude / FIXED_POINT_MAGNITUDE as u64,
        magnitude % FIXED_POINT_MAGNITUDE as u64
    )
}

impl FromStr for Money {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        string_to_fixed_point(s).map(Money)
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&fixed_point_to_string(self.0))
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

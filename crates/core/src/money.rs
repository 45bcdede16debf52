//! Fixed-point monetary amounts.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::value_object::ValueObject;

const MINOR_PER_MAJOR: u64 = 100;

/// Monetary amount in the smallest currency unit (e.g. cents).
///
/// `19.99` is stored as `1999`. All arithmetic is exact integer arithmetic;
/// floating point never enters the picture, so ticket prices multiply without
/// rounding drift.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(u64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Amount from minor units: `from_minor(1999)` is 19.99.
    pub const fn from_minor(minor: u64) -> Self {
        Self(minor)
    }

    pub const fn minor(&self) -> u64 {
        self.0
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Multiply by a count, rejecting overflow instead of wrapping.
    pub fn checked_mul(self, count: u32) -> Result<Money, DomainError> {
        self.0
            .checked_mul(u64::from(count))
            .map(Money)
            .ok_or_else(|| DomainError::validation("money multiplication overflow"))
    }

    pub fn checked_add(self, other: Money) -> Result<Money, DomainError> {
        self.0
            .checked_add(other.0)
            .map(Money)
            .ok_or_else(|| DomainError::validation("money addition overflow"))
    }
}

impl ValueObject for Money {}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{:02}", self.0 / MINOR_PER_MAJOR, self.0 % MINOR_PER_MAJOR)
    }
}

impl FromStr for Money {
    type Err = DomainError;

    /// Parse a non-negative decimal amount with at most two fraction digits
    /// ("19.99", "19.9", "19").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || DomainError::validation(format!("invalid money amount: {s:?}"));

        let (major, frac) = match s.split_once('.') {
            Some((major, frac)) => (major, frac),
            None => (s, ""),
        };
        if major.is_empty() || frac.len() > 2 {
            return Err(err());
        }
        if !major.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return Err(err());
        }

        let major: u64 = major.parse().map_err(|_| err())?;
        let frac_minor = match frac.len() {
            0 => 0,
            1 => frac.parse::<u64>().map_err(|_| err())? * 10,
            _ => frac.parse::<u64>().map_err(|_| err())?,
        };

        major
            .checked_mul(MINOR_PER_MAJOR)
            .and_then(|m| m.checked_add(frac_minor))
            .map(Money)
            .ok_or_else(err)
    }
}

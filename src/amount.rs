//! Fixed-point asset amounts. One unit is 10^7 stroops.

use crate::error::LedgerError;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

pub const STROOPS_PER_UNIT: i64 = 10_000_000;
const DECIMALS: u32 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(i64);

impl Amount {
    pub const ZERO: Amount = Amount(0);
    pub const MAX: Amount = Amount(i64::MAX);

    pub fn from_stroops(stroops: i64) -> Result<Self, LedgerError> {
        if stroops < 0 {
            return Err(LedgerError::InvalidAmount(format!(
                "Amount cannot be negative: {} stroops",
                stroops
            )));
        }
        Ok(Amount(stroops))
    }

    pub fn from_units(units: i64) -> Result<Self, LedgerError> {
        let stroops = units.checked_mul(STROOPS_PER_UNIT).ok_or_else(|| {
            LedgerError::InvalidAmount(format!("{} units exceeds the maximum amount", units))
        })?;
        Self::from_stroops(stroops)
    }

    pub fn stroops(&self) -> i64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl FromStr for Amount {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = |reason: &str| LedgerError::InvalidAmount(format!("'{}': {}", s, reason));

        let value = Decimal::from_str(s).map_err(|e| invalid(&e.to_string()))?;
        if value.is_sign_negative() {
            return Err(invalid("amount cannot be negative"));
        }
        // Trailing zeros beyond the seventh place carry no stroops.
        if value.normalize().scale() > DECIMALS {
            return Err(invalid("more than 7 decimal places"));
        }

        value
            .checked_mul(Decimal::from(STROOPS_PER_UNIT))
            .and_then(|stroops| stroops.to_i64())
            .map(Amount)
            .ok_or_else(|| invalid("exceeds the maximum amount"))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:07}",
            self.0 / STROOPS_PER_UNIT,
            self.0 % STROOPS_PER_UNIT
        )
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

//! # Money
//!
//! Currency handling for payment intents.
//! Prices are stored as decimals on tools and orders; the payment API wants
//! integer amounts in the smallest currency unit.

use crate::error::{MarketError, MarketResult};
use serde::{Deserialize, Serialize};

/// Currencies payment intents are created in (ISO 4217)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    #[default]
    USD,
}

impl Currency {
    /// Returns the ISO 4217 currency code
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::USD => "usd",
        }
    }

    /// Returns the number of decimal places for this currency
    pub fn decimal_places(&self) -> u8 {
        match self {
            Currency::USD => 2,
        }
    }

    /// Convert a decimal amount to the smallest currency unit (cents, etc.)
    ///
    /// Rejects amounts that are not finite or not strictly positive.
    pub fn to_smallest_unit(&self, amount: f64) -> MarketResult<i64> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(MarketError::InvalidRequest(format!(
                "price must be a positive number, got {}",
                amount
            )));
        }
        let multiplier = 10_f64.powi(i32::from(self.decimal_places()));
        let minor = (amount * multiplier).round();
        if minor < 1.0 || minor > i64::MAX as f64 {
            return Err(MarketError::InvalidRequest(format!(
                "price {} is out of range",
                amount
            )));
        }
        Ok(minor as i64)
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str().to_uppercase())
    }
}

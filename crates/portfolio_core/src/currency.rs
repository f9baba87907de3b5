//! Currency types for portfolio valuation.
//!
//! This module provides ISO 4217 currency codes with metadata for decimal
//! precision, used when reporting an [`ActionCandidate`](crate)'s native
//! currency alongside its EUR-denominated value.
//!
//! # Examples
//!
//! ```
//! use portfolio_core::Currency;
//!
//! let usd = Currency::USD;
//! assert_eq!(usd.code(), "USD");
//! assert_eq!(usd.decimal_places(), 2);
//!
//! let jpy = Currency::JPY;
//! assert_eq!(jpy.decimal_places(), 0);
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::CurrencyError;

/// ISO 4217 currency codes with decimal precision metadata.
///
/// Marked `#[non_exhaustive]` so new currencies can be added without a
/// breaking change for downstream matches.
///
/// # Examples
///
/// ```
/// use portfolio_core::Currency;
///
/// assert_eq!(Currency::EUR.code(), "EUR");
/// let eur: Currency = "eur".parse().unwrap();
/// assert_eq!(eur, Currency::EUR);
/// ```
#[non_exhaustive]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Currency {
    /// Euro
    EUR,
    /// United States Dollar
    USD,
    /// British Pound Sterling
    GBP,
    /// Swiss Franc
    CHF,
    /// Japanese Yen (0 decimal places)
    JPY,
    /// Swedish Krona
    SEK,
    /// Danish Krone
    DKK,
    /// Norwegian Krone
    NOK,
    /// Canadian Dollar
    CAD,
    /// Australian Dollar
    AUD,
    /// Hong Kong Dollar
    HKD,
}

impl Currency {
    /// Returns the ISO 4217 three-letter currency code.
    pub fn code(&self) -> &'static str {
        match self {
            Currency::EUR => "EUR",
            Currency::USD => "USD",
            Currency::GBP => "GBP",
            Currency::CHF => "CHF",
            Currency::JPY => "JPY",
            Currency::SEK => "SEK",
            Currency::DKK => "DKK",
            Currency::NOK => "NOK",
            Currency::CAD => "CAD",
            Currency::AUD => "AUD",
            Currency::HKD => "HKD",
        }
    }

    /// Returns the standard number of decimal places for this currency.
    ///
    /// Most currencies use 2 decimal places; JPY uses 0.
    pub fn decimal_places(&self) -> u8 {
        match self {
            Currency::JPY => 0,
            _ => 2,
        }
    }
}

impl FromStr for Currency {
    type Err = CurrencyError;

    /// Parses an ISO 4217 currency code (case-insensitive).
    fn from_str(s: &str) -> Result<Self, CurrencyError> {
        match s.to_uppercase().as_str() {
            "EUR" => Ok(Currency::EUR),
            "USD" => Ok(Currency::USD),
            "GBP" => Ok(Currency::GBP),
            "CHF" => Ok(Currency::CHF),
            "JPY" => Ok(Currency::JPY),
            "SEK" => Ok(Currency::SEK),
            "DKK" => Ok(Currency::DKK),
            "NOK" => Ok(Currency::NOK),
            "CAD" => Ok(Currency::CAD),
            "AUD" => Ok(Currency::AUD),
            "HKD" => Ok(Currency::HKD),
            _ => Err(CurrencyError::UnknownCurrency(s.to_string())),
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_code() {
        assert_eq!(Currency::USD.code(), "USD");
        assert_eq!(Currency::EUR.code(), "EUR");
    }

    #[test]
    fn test_currency_decimal_places() {
        assert_eq!(Currency::USD.decimal_places(), 2);
        assert_eq!(Currency::JPY.decimal_places(), 0);
    }

    #[test]
    fn test_currency_from_str_case_insensitive() {
        assert_eq!("usd".parse::<Currency>().unwrap(), Currency::USD);
        assert_eq!("Eur".parse::<Currency>().unwrap(), Currency::EUR);
    }

    #[test]
    fn test_currency_from_str_unknown() {
        let result = "XYZ".parse::<Currency>();
        assert!(result.is_err());
        match result {
            Err(CurrencyError::UnknownCurrency(code)) => assert_eq!(code, "XYZ"),
            _ => panic!("Expected UnknownCurrency error"),
        }
    }

    #[test]
    fn test_currency_display() {
        assert_eq!(format!("{}", Currency::EUR), "EUR");
    }
}

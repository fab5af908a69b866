//! Currency codes and display formatting for prices.
//!
//! Prices are carried as [`Decimal`] amounts in the currency's standard unit
//! (e.g., dollars, not cents). Formatting is a separate capability so display
//! code can be handed any formatter.
//!
//! ```
//! use go_marketplace_core::{CurrencyCode, FormatCurrency};
//! use rust_decimal::Decimal;
//!
//! assert_eq!(CurrencyCode::USD.format(Decimal::new(123_450, 2)), "$1,234.50");
//! assert_eq!(CurrencyCode::BRL.format(Decimal::new(123_450, 2)), "R$ 1.234,50");
//! ```

use core::fmt;

use num_format::{Locale, ToFormattedString};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Turns an amount into display text.
pub trait FormatCurrency {
    /// Format an amount given in the currency's standard unit.
    fn format(&self, amount: Decimal) -> String;
}

/// Error parsing a [`CurrencyCode`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported currency code: {0}")]
pub struct CurrencyCodeError(pub String);

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    USD,
    EUR,
    GBP,
    CAD,
    AUD,
    BRL,
}

impl CurrencyCode {
    /// Display symbol placed before the amount.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::USD | Self::CAD | Self::AUD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
            Self::BRL => "R$ ",
        }
    }

    /// ISO 4217 code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
            Self::CAD => "CAD",
            Self::AUD => "AUD",
            Self::BRL => "BRL",
        }
    }

    /// Locale supplying the thousands separator, and the decimal separator.
    const fn separators(self) -> (Locale, char) {
        match self {
            Self::BRL => (Locale::pt, ','),
            _ => (Locale::en, '.'),
        }
    }
}

impl FormatCurrency for CurrencyCode {
    fn format(&self, amount: Decimal) -> String {
        let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };

        let abs = rounded.abs();
        let digits = format!("{abs:.2}");
        let fraction = digits.rsplit_once('.').map_or("00", |(_, fraction)| fraction);
        // |Decimal::MAX| is below u128::MAX.
        let whole = abs.trunc().to_u128().unwrap_or_default();
        let (locale, decimal) = self.separators();

        format!(
            "{sign}{}{}{decimal}{fraction}",
            self.symbol(),
            whole.to_formatted_string(&locale)
        )
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for CurrencyCode {
    type Err = CurrencyCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "USD" => Ok(Self::USD),
            "EUR" => Ok(Self::EUR),
            "GBP" => Ok(Self::GBP),
            "CAD" => Ok(Self::CAD),
            "AUD" => Ok(Self::AUD),
            "BRL" => Ok(Self::BRL),
            _ => Err(CurrencyCodeError(s.to_owned())),
        }
    }
}

//! Money amounts and currency codes

use crate::core::error::ConversionError;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Currencies offered to the user as display options: (code, name, symbol).
pub const SUPPORTED_CURRENCIES: &[(&str, &str, &str)] = &[
    ("BRL", "Brazilian Real", "R$"),
    ("USD", "US Dollar", "$"),
    ("EUR", "Euro", "€"),
    ("GBP", "Pound Sterling", "£"),
    ("JPY", "Japanese Yen", "¥"),
    ("AUD", "Australian Dollar", "A$"),
    ("CAD", "Canadian Dollar", "C$"),
    ("CHF", "Swiss Franc", "CHF"),
    ("CNY", "Chinese Yuan", "¥"),
    ("INR", "Indian Rupee", "₹"),
];

/// Trims and uppercases a currency code, rejecting anything that is not
/// three ASCII letters.
pub fn normalize_code(code: &str) -> Result<String, ConversionError> {
    let code = code.trim().to_ascii_uppercase();
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(code)
    } else {
        Err(ConversionError::UnsupportedCurrency(code))
    }
}

pub fn is_supported(code: &str) -> bool {
    SUPPORTED_CURRENCIES.iter().any(|(c, _, _)| *c == code)
}

pub fn currency_symbol(code: &str) -> &str {
    SUPPORTED_CURRENCIES
        .iter()
        .find(|(c, _, _)| *c == code)
        .map_or(code, |(_, _, symbol)| symbol)
}

pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoneyAmount {
    pub value: f64,
    pub currency: String,
}

impl MoneyAmount {
    pub fn new(value: f64, currency: impl Into<String>) -> Self {
        Self {
            value,
            currency: currency.into(),
        }
    }

    pub fn zero(currency: impl Into<String>) -> Self {
        Self::new(0.0, currency)
    }

    fn ensure_same_currency(&self, other: &MoneyAmount) -> Result<(), ConversionError> {
        if self.currency != other.currency {
            return Err(ConversionError::CurrencyMismatch {
                expected: self.currency.clone(),
                actual: other.currency.clone(),
            });
        }
        Ok(())
    }

    pub fn checked_add(&self, other: &MoneyAmount) -> Result<MoneyAmount, ConversionError> {
        self.ensure_same_currency(other)?;
        Ok(MoneyAmount::new(self.value + other.value, &self.currency))
    }

    pub fn checked_sub(&self, other: &MoneyAmount) -> Result<MoneyAmount, ConversionError> {
        self.ensure_same_currency(other)?;
        Ok(MoneyAmount::new(self.value - other.value, &self.currency))
    }

    /// Applies `rate` and re-tags the amount with `target`, rounded to cents.
    pub fn convert(&self, rate: f64, target: &str) -> MoneyAmount {
        if self.value == 0.0 {
            return MoneyAmount::zero(target);
        }
        MoneyAmount::new(round_cents(self.value * rate), target)
    }
}

impl Display for MoneyAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {:.2}", currency_symbol(&self.currency), self.value)
    }
}

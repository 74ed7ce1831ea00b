//! Error taxonomy for currency conversion

use thiserror::Error;

/// Errors raised while converting ledger data into another currency.
///
/// These never cross the orchestrator boundary as failures: a conversion
/// error turns into a fallback view that shows ledger-currency data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    /// The provider could not be reached or answered with an HTTP error.
    #[error("Conversion provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// The provider answered with a payload we cannot use.
    #[error("Malformed provider response: {0}")]
    ProviderMalformedResponse(String),

    #[error("Unsupported currency: {0}")]
    UnsupportedCurrency(String),

    /// Arithmetic attempted across two currencies.
    #[error("Currency mismatch: expected {expected}, got {actual}")]
    CurrencyMismatch { expected: String, actual: String },
}

impl ConversionError {
    /// Whether retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, ConversionError::ProviderUnavailable(_))
    }
}

/// Error reported by the raw financial source itself, kept apart from
/// conversion errors so consumers can tell the two failures apart.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SourceError {
    pub message: String,
}

impl SourceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_unavailable_is_transient() {
        assert!(ConversionError::ProviderUnavailable("timeout".into()).is_transient());
        assert!(!ConversionError::ProviderMalformedResponse("bad json".into()).is_transient());
        assert!(!ConversionError::UnsupportedCurrency("XYZ".into()).is_transient());
    }

    #[test]
    fn test_error_messages() {
        let err = ConversionError::CurrencyMismatch {
            expected: "BRL".to_string(),
            actual: "USD".to_string(),
        };
        assert_eq!(err.to_string(), "Currency mismatch: expected BRL, got USD");
        assert_eq!(SourceError::new("db offline").to_string(), "db offline");
    }
}

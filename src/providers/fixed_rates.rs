use crate::core::currency::CurrencyRateProvider;
use crate::core::error::ConversionError;
use async_trait::async_trait;
use std::collections::HashMap;

/// Units of each currency per US dollar.
const DEFAULT_RATES: &[(&str, f64)] = &[
    ("USD", 1.0),
    ("BRL", 5.15),
    ("EUR", 0.92),
    ("GBP", 0.79),
    ("JPY", 154.5),
    ("AUD", 1.52),
    ("CAD", 1.35),
    ("CHF", 0.89),
    ("CNY", 7.24),
    ("INR", 83.12),
];

/// Offline rate table. Cross rates are derived through the common base and
/// rounded to four decimals.
#[derive(Debug, Clone)]
pub struct FixedRateProvider {
    rates: HashMap<String, f64>,
}

impl FixedRateProvider {
    pub fn new(rates: HashMap<String, f64>) -> Self {
        Self { rates }
    }

    /// Built-in table, with `overrides` replacing or adding entries.
    pub fn with_overrides(overrides: &HashMap<String, f64>) -> Self {
        let mut rates: HashMap<String, f64> = DEFAULT_RATES
            .iter()
            .map(|(code, rate)| (code.to_string(), *rate))
            .collect();
        rates.extend(overrides.iter().map(|(k, v)| (k.clone(), *v)));
        Self::new(rates)
    }

    fn base_rate(&self, code: &str) -> Result<f64, ConversionError> {
        self.rates
            .get(code)
            .copied()
            .filter(|rate| rate.is_finite() && *rate > 0.0)
            .ok_or_else(|| ConversionError::UnsupportedCurrency(code.to_string()))
    }

    pub fn currencies(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self.rates.keys().map(String::as_str).collect();
        codes.sort_unstable();
        codes
    }
}

impl Default for FixedRateProvider {
    fn default() -> Self {
        Self::with_overrides(&HashMap::new())
    }
}

#[async_trait]
impl CurrencyRateProvider for FixedRateProvider {
    async fn get_rate(&self, from: &str, to: &str) -> Result<f64, ConversionError> {
        let from_rate = self.base_rate(from)?;
        let to_rate = self.base_rate(to)?;
        if from == to {
            return Ok(1.0);
        }
        Ok(((to_rate / from_rate) * 10_000.0).round() / 10_000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cross_rates() {
        let provider = FixedRateProvider::default();
        assert_eq!(provider.get_rate("USD", "BRL").await.unwrap(), 5.15);
        assert_eq!(provider.get_rate("BRL", "USD").await.unwrap(), 0.1942);
        assert_eq!(provider.get_rate("EUR", "EUR").await.unwrap(), 1.0);
    }

    #[tokio::test]
    async fn test_unknown_currency() {
        let provider = FixedRateProvider::default();
        assert_eq!(
            provider.get_rate("BRL", "XYZ").await.unwrap_err(),
            ConversionError::UnsupportedCurrency("XYZ".to_string())
        );
    }

    #[tokio::test]
    async fn test_overrides() {
        let overrides = HashMap::from([("BRL".to_string(), 5.0), ("ARS".to_string(), 900.0)]);
        let provider = FixedRateProvider::with_overrides(&overrides);
        assert_eq!(provider.get_rate("USD", "BRL").await.unwrap(), 5.0);
        assert_eq!(provider.get_rate("BRL", "ARS").await.unwrap(), 180.0);
        assert!(provider.currencies().contains(&"ARS"));
    }
}

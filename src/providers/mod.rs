pub mod fixed_rates;
pub mod rate_converter;
pub mod rate_limit;
pub mod util;
pub mod yahoo_finance;

use crate::core::config::AppConfig;
use crate::core::currency::{ConversionProvider, CurrencyRateProvider};
use fixed_rates::FixedRateProvider;
use rate_converter::RateConversionProvider;
use rate_limit::{DEFAULT_WINDOW, RateLimiter};
use std::sync::Arc;
use tracing::debug;
use yahoo_finance::YahooCurrencyProvider;

/// Picks the rate source from config: Yahoo when configured, the offline
/// table otherwise.
pub fn build_rate_provider(config: &AppConfig) -> Arc<dyn CurrencyRateProvider> {
    match &config.providers.yahoo {
        Some(yahoo) => {
            debug!("Using Yahoo Finance rates from {}", yahoo.base_url);
            Arc::new(YahooCurrencyProvider::new(&yahoo.base_url, config.retries))
        }
        None => {
            debug!("Using fixed rate table");
            let overrides = config
                .providers
                .fixed
                .as_ref()
                .map(|fixed| fixed.rates.clone())
                .unwrap_or_default();
            Arc::new(FixedRateProvider::with_overrides(&overrides))
        }
    }
}

/// Rate-backed conversion, limited per session user unless
/// `rate_limit_per_minute` is 0.
pub fn build_conversion_provider(config: &AppConfig) -> Arc<dyn ConversionProvider> {
    let provider = RateConversionProvider::new(build_rate_provider(config), config.rate_ttl());
    if config.rate_limit_per_minute == 0 {
        return Arc::new(provider);
    }
    let limiter = Arc::new(RateLimiter::new(config.rate_limit_per_minute, DEFAULT_WINDOW));
    Arc::new(provider.with_rate_limit(limiter, &config.session_user()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_defaults_to_fixed_rates() {
        let config: AppConfig = serde_yaml::from_str("ledger_currency: BRL").unwrap();
        let provider = build_rate_provider(&config);
        assert_eq!(provider.get_rate("USD", "BRL").await.unwrap(), 5.15);
    }

    #[tokio::test]
    async fn test_fixed_overrides_from_config() {
        let yaml = r#"
providers:
  fixed:
    rates:
      BRL: 5.0
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        let provider = build_rate_provider(&config);
        assert_eq!(provider.get_rate("USD", "BRL").await.unwrap(), 5.0);
    }

    #[tokio::test]
    async fn test_conversion_provider_applies_rate_limit() {
        use crate::core::error::ConversionError;
        use crate::core::ledger::FinancialSummary;

        let yaml = "rate_limit_per_minute: 1\nuser: ana";
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        let provider = build_conversion_provider(&config);
        let summary = FinancialSummary::empty("BRL");

        assert!(provider.convert_summary(&summary, "BRL", "USD").await.is_ok());
        assert!(matches!(
            provider.convert_summary(&summary, "BRL", "EUR").await,
            Err(ConversionError::ProviderUnavailable(_))
        ));
    }
}

use serde::Deserialize;
use tracing::{debug, instrument};

use crate::core::currency::CurrencyRateProvider;
use crate::core::error::ConversionError;
use crate::providers::util::with_retry;
use async_trait::async_trait;

const RETRY_DELAY_MS: u64 = 250;

/// Exchange rates from the Yahoo Finance chart endpoint.
pub struct YahooCurrencyProvider {
    base_url: String,
    retries: usize,
}

impl YahooCurrencyProvider {
    pub fn new(base_url: &str, retries: usize) -> Self {
        YahooCurrencyProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            retries,
        }
    }

    async fn fetch_rate(&self, symbol: &str) -> Result<f64, ConversionError> {
        let url = format!("{}/v8/finance/chart/{symbol}", self.base_url);
        debug!("Requesting currency rate from {}", url);

        let client = reqwest::Client::builder()
            .user_agent("ledgerfx/1.0")
            .build()
            .map_err(|e| ConversionError::ProviderUnavailable(format!("HTTP client error: {e}")))?;

        let response = client.get(&url).send().await.map_err(|e| {
            ConversionError::ProviderUnavailable(format!(
                "Request error: {e} for currency pair: {symbol}"
            ))
        })?;

        if !response.status().is_success() {
            return Err(ConversionError::ProviderUnavailable(format!(
                "HTTP error: {} for currency pair: {}",
                response.status(),
                symbol
            )));
        }

        let text = response.text().await.map_err(|e| {
            ConversionError::ProviderUnavailable(format!(
                "Failed to read response for {symbol}: {e}"
            ))
        })?;

        let data: YahooCurrencyResponse = serde_json::from_str(&text).map_err(|e| {
            ConversionError::ProviderMalformedResponse(format!(
                "Failed to parse JSON response for {symbol}: {e}"
            ))
        })?;

        let item = data.chart.result.into_iter().next().ok_or_else(|| {
            ConversionError::ProviderMalformedResponse(format!(
                "No rate data found for currency pair: {symbol}"
            ))
        })?;

        let rate = item.meta.regular_market_price;
        if !rate.is_finite() || rate <= 0.0 {
            return Err(ConversionError::ProviderMalformedResponse(format!(
                "Invalid rate {rate} for currency pair: {symbol}"
            )));
        }
        Ok(rate)
    }
}

#[derive(Debug, Deserialize)]
struct YahooCurrencyResponse {
    chart: CurrencyChartResult,
}

#[derive(Debug, Deserialize)]
struct CurrencyChartResult {
    result: Vec<CurrencyChartItem>,
}

#[derive(Debug, Deserialize)]
struct CurrencyChartItem {
    meta: CurrencyChartMeta,
}

#[derive(Debug, Deserialize)]
struct CurrencyChartMeta {
    #[serde(alias = "regularMarketPrice")]
    regular_market_price: f64,
}

#[async_trait]
impl CurrencyRateProvider for YahooCurrencyProvider {
    #[instrument(name = "YahooRateFetch", skip(self))]
    async fn get_rate(&self, from: &str, to: &str) -> Result<f64, ConversionError> {
        if from == to {
            return Ok(1.0);
        }
        let symbol = format!("{from}{to}=X");
        with_retry(|| self.fetch_rate(&symbol), self.retries, RETRY_DELAY_MS).await
    }
}

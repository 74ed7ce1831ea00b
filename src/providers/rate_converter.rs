use crate::core::cache::TtlCache;
use crate::core::currency::{ConversionProvider, CurrencyRateProvider};
use crate::core::error::ConversionError;
use crate::core::ledger::{FinancialSummary, Transaction};
use crate::core::money::MoneyAmount;
use crate::providers::rate_limit::RateLimiter;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

/// Converts ledger records by applying one exchange rate per currency pair.
/// Rates are cached for `rate_ttl`; concurrent misses for a pair share one
/// upstream lookup.
pub struct RateConversionProvider {
    rates: Arc<dyn CurrencyRateProvider>,
    cache: TtlCache<String, f64>,
    fetch_lock: Mutex<()>,
    limit: Option<(Arc<RateLimiter>, String)>,
}

impl RateConversionProvider {
    pub fn new(rates: Arc<dyn CurrencyRateProvider>, rate_ttl: Option<Duration>) -> Self {
        Self {
            rates,
            cache: TtlCache::new(rate_ttl),
            fetch_lock: Mutex::new(()),
            limit: None,
        }
    }

    /// Charges every upstream rate lookup to `user` in `limiter`.
    pub fn with_rate_limit(mut self, limiter: Arc<RateLimiter>, user: &str) -> Self {
        self.limit = Some((limiter, user.to_string()));
        self
    }

    async fn rate(&self, from: &str, to: &str) -> Result<f64, ConversionError> {
        if from == to {
            return Ok(1.0);
        }
        let key = format!("{from}-{to}");
        if let Some(rate) = self.cache.get(&key).await {
            return Ok(rate);
        }

        let _fetching = self.fetch_lock.lock().await;
        // Filled while waiting for the lock
        if let Some(rate) = self.cache.get(&key).await {
            return Ok(rate);
        }
        if let Some((limiter, user)) = &self.limit {
            limiter.check(user).await?;
        }
        let rate = self.rates.get_rate(from, to).await?;
        if !rate.is_finite() || rate <= 0.0 {
            return Err(ConversionError::ProviderMalformedResponse(format!(
                "Invalid rate {rate} for {key}"
            )));
        }
        debug!(%key, rate, "Fetched exchange rate");
        self.cache.put(key, rate).await;
        Ok(rate)
    }
}

fn convert_amount(
    amount: &MoneyAmount,
    from: &str,
    to: &str,
    rate: f64,
) -> Result<MoneyAmount, ConversionError> {
    if amount.currency != from {
        return Err(ConversionError::CurrencyMismatch {
            expected: from.to_string(),
            actual: amount.currency.clone(),
        });
    }
    Ok(amount.convert(rate, to))
}

#[async_trait]
impl ConversionProvider for RateConversionProvider {
    async fn convert_summary(
        &self,
        summary: &FinancialSummary,
        from: &str,
        to: &str,
    ) -> Result<FinancialSummary, ConversionError> {
        let rate = self.rate(from, to).await?;
        summary.try_map_amounts(|amount| convert_amount(amount, from, to, rate))
    }

    async fn convert_transactions(
        &self,
        transactions: &[Transaction],
        from: &str,
        to: &str,
    ) -> Result<Vec<Transaction>, ConversionError> {
        let rate = self.rate(from, to).await?;
        transactions
            .iter()
            .map(|tx| -> Result<Transaction, ConversionError> {
                Ok(tx.with_amount(convert_amount(&tx.amount, from, to, rate)?))
            })
            .collect()
    }
}

//! Currency conversion abstractions

use crate::core::error::ConversionError;
use crate::core::ledger::{FinancialSummary, Transaction};
use async_trait::async_trait;

/// Source of exchange rates for a currency pair.
#[async_trait]
pub trait CurrencyRateProvider: Send + Sync {
    async fn get_rate(&self, from: &str, to: &str) -> Result<f64, ConversionError>;
}

/// Converts whole ledger records between currencies.
///
/// Implementations must be safe to call concurrently and report every
/// failure through the returned `Result`.
#[async_trait]
pub trait ConversionProvider: Send + Sync {
    async fn convert_summary(
        &self,
        summary: &FinancialSummary,
        from: &str,
        to: &str,
    ) -> Result<FinancialSummary, ConversionError>;

    async fn convert_transactions(
        &self,
        transactions: &[Transaction],
        from: &str,
        to: &str,
    ) -> Result<Vec<Transaction>, ConversionError>;
}

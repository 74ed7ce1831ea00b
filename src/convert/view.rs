use crate::convert::cache::ConvertedResult;
use crate::core::error::{ConversionError, SourceError};
use crate::core::ledger::{FinancialSummary, RawFinancialData, Transaction};
use std::sync::Arc;

/// Where the figures in a view came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Raw ledger data, no conversion needed or possible yet.
    Passthrough,
    /// Converted by the request that just completed.
    Fresh,
    /// Served from the conversion cache.
    Cached,
    /// An earlier conversion kept on screen while a new one runs.
    Previous,
    /// Conversion failed; raw ledger data shown instead.
    FallbackRaw,
}

/// What consumers see. Transactions and summary always come from the same
/// snapshot and the same currency.
#[derive(Debug, Clone)]
pub struct ConvertedView {
    pub transactions: Arc<Vec<Transaction>>,
    pub summary: Arc<FinancialSummary>,
    /// Raw data loading or conversion in flight.
    pub loading: bool,
    pub is_converting: bool,
    pub source_error: Option<SourceError>,
    pub conversion_error: Option<ConversionError>,
    /// Currency the figures are actually expressed in.
    pub current_currency: String,
    /// Currency the user asked for.
    pub requested_currency: String,
    pub freshness: Freshness,
}

impl ConvertedView {
    pub(crate) fn passthrough(raw: &RawFinancialData, ledger: &str, requested: &str) -> Self {
        Self {
            transactions: Arc::clone(&raw.transactions),
            summary: Arc::clone(&raw.summary),
            loading: raw.loading,
            is_converting: false,
            source_error: raw.error.clone(),
            conversion_error: None,
            current_currency: ledger.to_string(),
            requested_currency: requested.to_string(),
            freshness: Freshness::Passthrough,
        }
    }

    pub(crate) fn fallback(
        raw: &RawFinancialData,
        ledger: &str,
        requested: &str,
        error: ConversionError,
    ) -> Self {
        Self {
            conversion_error: Some(error),
            freshness: Freshness::FallbackRaw,
            ..Self::passthrough(raw, ledger, requested)
        }
    }

    pub(crate) fn converted(
        result: &ConvertedResult,
        raw: &RawFinancialData,
        freshness: Freshness,
    ) -> Self {
        Self {
            transactions: Arc::clone(&result.transactions),
            summary: Arc::clone(&result.summary),
            loading: raw.loading,
            is_converting: false,
            source_error: raw.error.clone(),
            conversion_error: None,
            current_currency: result.key.target.clone(),
            requested_currency: result.key.target.clone(),
            freshness,
        }
    }

    /// The view to show while a conversion into `requested` is in flight:
    /// the previous converted figures if there are any, otherwise the
    /// current raw snapshot.
    pub(crate) fn upgrading(
        previous: &ConvertedView,
        raw: &RawFinancialData,
        ledger: &str,
        requested: &str,
    ) -> Self {
        let base = match previous.freshness {
            Freshness::Fresh | Freshness::Cached | Freshness::Previous => Self {
                freshness: Freshness::Previous,
                conversion_error: None,
                source_error: raw.error.clone(),
                requested_currency: requested.to_string(),
                ..previous.clone()
            },
            Freshness::Passthrough | Freshness::FallbackRaw => {
                Self::passthrough(raw, ledger, requested)
            }
        };
        Self {
            loading: true,
            is_converting: true,
            ..base
        }
    }

    pub fn has_error(&self) -> bool {
        self.source_error.is_some() || self.conversion_error.is_some()
    }

    /// True only after a failed conversion left ledger figures on screen.
    pub fn is_fallback(&self) -> bool {
        self.freshness == Freshness::FallbackRaw
    }
}

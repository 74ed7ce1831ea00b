use crate::core::ledger::{FinancialSummary, Transaction};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Identifies one conversion: which snapshot, from which currency, into which.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConversionKey {
    pub source: String,
    pub target: String,
    pub data_version: u64,
}

impl ConversionKey {
    pub fn new(source: &str, target: &str, data_version: u64) -> Self {
        Self {
            source: source.to_string(),
            target: target.to_string(),
            data_version,
        }
    }
}

/// Converted transactions and summary together with the request that
/// produced them.
#[derive(Debug, Clone)]
pub struct ConvertedResult {
    pub key: ConversionKey,
    pub generation: u64,
    pub transactions: Arc<Vec<Transaction>>,
    pub summary: Arc<FinancialSummary>,
    pub converted_at: DateTime<Utc>,
}

/// Memoizes converted results for the snapshot currently on screen.
///
/// Storing a result for a new snapshot evicts every entry made for older
/// snapshots; entries for other targets of the same snapshot stay so that
/// flipping between currencies does not hit the provider again.
#[derive(Debug, Clone, Default)]
pub struct ConversionCache {
    entries: HashMap<ConversionKey, ConvertedResult>,
}

impl ConversionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &ConversionKey) -> Option<ConvertedResult> {
        let value = self.entries.get(key).cloned();
        if value.is_some() {
            debug!(target_currency = %key.target, "Conversion cache HIT");
        } else {
            debug!(target_currency = %key.target, "Conversion cache MISS");
        }
        value
    }

    pub fn put(&mut self, result: ConvertedResult) {
        let version = result.key.data_version;
        let before = self.entries.len();
        self.entries.retain(|key, _| key.data_version == version);
        let evicted = before - self.entries.len();
        if evicted > 0 {
            debug!(evicted, "Evicted superseded conversions");
        }
        debug!(target_currency = %result.key.target, "Conversion cache PUT");
        self.entries.insert(result.key.clone(), result);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

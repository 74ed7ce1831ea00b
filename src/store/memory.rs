use crate::core::error::{ConversionError, SourceError};
use crate::core::ledger::{RawFinancialData, Transaction};
use crate::core::preference::{CurrencyPreference, PreferenceStore};
use crate::core::source::RawFinancialSource;
use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::watch;
use tracing::debug;

/// Preference store that forgets everything on exit
pub struct MemoryPreferenceStore {
    tx: watch::Sender<CurrencyPreference>,
}

impl MemoryPreferenceStore {
    pub fn new(initial: CurrencyPreference) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx }
    }
}

#[async_trait]
impl PreferenceStore for MemoryPreferenceStore {
    fn current(&self) -> CurrencyPreference {
        self.tx.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<CurrencyPreference> {
        self.tx.subscribe()
    }

    async fn save(&self, prefs: CurrencyPreference) -> Result<()> {
        debug!("Preference PUT: {}", prefs.currency);
        self.tx.send_replace(prefs);
        Ok(())
    }
}

/// Ledger source backed by an in-memory transaction list. Every mutation
/// publishes a fresh snapshot.
pub struct MemoryLedgerSource {
    currency: String,
    tx: watch::Sender<RawFinancialData>,
}

impl MemoryLedgerSource {
    /// Starts in the loading state with no data.
    pub fn new(currency: &str) -> Self {
        let (tx, _) = watch::channel(RawFinancialData::pending(currency));
        Self {
            currency: currency.to_string(),
            tx,
        }
    }

    pub fn snapshot(&self) -> RawFinancialData {
        self.tx.borrow().clone()
    }

    /// Publishes a loaded snapshot and recomputes its summary.
    pub fn replace_transactions(&self, transactions: Vec<Transaction>) -> Result<(), ConversionError> {
        let data = RawFinancialData::loaded(transactions, &self.currency)?;
        debug!(count = data.transactions.len(), "Publishing ledger snapshot");
        self.tx.send_replace(data);
        Ok(())
    }

    /// Marks a refetch in progress; the current records stay visible.
    pub fn set_loading(&self) {
        self.tx.send_modify(|data| {
            data.loading = true;
            data.error = None;
        });
    }

    /// Ends the current fetch with an error, keeping the last records.
    pub fn set_error(&self, message: impl Into<String>) {
        let error = SourceError::new(message);
        self.tx.send_modify(|data| {
            data.loading = false;
            data.error = Some(error);
        });
    }
}

impl RawFinancialSource for MemoryLedgerSource {
    fn subscribe(&self) -> watch::Receiver<RawFinancialData> {
        self.tx.subscribe()
    }
}

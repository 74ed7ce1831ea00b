//! Display-currency preference

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyPreference {
    pub currency: String,
}

impl CurrencyPreference {
    pub fn new(currency: impl Into<String>) -> Self {
        Self {
            currency: currency.into(),
        }
    }
}

/// Holds the user's chosen display currency.
///
/// `save` is meant for currency selectors; the conversion layer only ever
/// subscribes.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    fn current(&self) -> CurrencyPreference;

    fn subscribe(&self) -> watch::Receiver<CurrencyPreference>;

    async fn save(&self, prefs: CurrencyPreference) -> Result<()>;
}

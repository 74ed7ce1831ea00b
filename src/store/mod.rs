pub mod disk;
pub mod memory;

use crate::core::config::AppConfig;
use crate::core::preference::{CurrencyPreference, PreferenceStore};
use disk::DiskPreferenceStore;
use memory::MemoryPreferenceStore;
use std::sync::Arc;
use tracing::warn;

/// Opens the persistent preference store under the configured data path.
/// Falls back to an in-memory store when the keyspace cannot be opened.
pub fn open_preference_store(config: &AppConfig) -> Arc<dyn PreferenceStore> {
    let default = CurrencyPreference::new(config.display_currency());
    let opened = config
        .default_data_path()
        .and_then(|path| DiskPreferenceStore::open(&path.join("preferences"), default.clone()));

    match opened {
        Ok(store) => Arc::new(store),
        Err(e) => {
            warn!("Preferences will not be saved: {e:#}");
            Arc::new(MemoryPreferenceStore::new(default))
        }
    }
}

use crate::core::preference::{CurrencyPreference, PreferenceStore};
use anyhow::{Context, Result};
use async_trait::async_trait;
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use std::path::Path;
use tokio::sync::watch;
use tracing::debug;

const PARTITION: &str = "preferences";
const CURRENCY_KEY: &str = "currency";

/// Preference store persisted in a fjall keyspace. Saved preferences
/// survive restarts.
pub struct DiskPreferenceStore {
    keyspace: Keyspace,
    partition: PartitionHandle,
    tx: watch::Sender<CurrencyPreference>,
}

impl DiskPreferenceStore {
    /// Opens the keyspace at `path`. `default` is used until something is
    /// saved.
    pub fn open(path: &Path, default: CurrencyPreference) -> Result<Self> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {}", path.display()))?;
        let keyspace = fjall::Config::new(path)
            .open()
            .with_context(|| format!("Failed to open keyspace at {}", path.display()))?;
        let partition = keyspace.open_partition(PARTITION, PartitionCreateOptions::default())?;

        let stored = match partition.get(CURRENCY_KEY)? {
            Some(bytes) => match serde_json::from_slice::<CurrencyPreference>(&bytes) {
                Ok(prefs) => {
                    debug!("Preference HIT: {}", prefs.currency);
                    Some(prefs)
                }
                Err(e) => {
                    debug!("Ignoring unreadable preference: {}", e);
                    None
                }
            },
            None => {
                debug!("Preference MISS, using {}", default.currency);
                None
            }
        };

        let (tx, _) = watch::channel(stored.unwrap_or(default));
        Ok(Self {
            keyspace,
            partition,
            tx,
        })
    }
}

#[async_trait]
impl PreferenceStore for DiskPreferenceStore {
    fn current(&self) -> CurrencyPreference {
        self.tx.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<CurrencyPreference> {
        self.tx.subscribe()
    }

    async fn save(&self, prefs: CurrencyPreference) -> Result<()> {
        self.partition
            .insert(CURRENCY_KEY, serde_json::to_vec(&prefs)?)
            .context("Failed to write preference")?;
        self.keyspace
            .persist(PersistMode::SyncAll)
            .context("Failed to persist preference")?;
        debug!("Preference PUT: {}", prefs.currency);
        self.tx.send_replace(prefs);
        Ok(())
    }
}

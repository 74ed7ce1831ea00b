use crate::core::ledger::{Transaction, TransactionKind};
use crate::core::money::{MoneyAmount, normalize_code};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::{fs, path::PathBuf, time::Duration};
use tracing::debug;

/// A ledger entry as written in the config file. Amounts are always in the
/// ledger currency.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TransactionEntry {
    pub id: Option<String>,
    pub date: NaiveDate,
    pub kind: TransactionKind,
    pub category: String,
    pub description: Option<String>,
    pub amount: f64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct YahooProviderConfig {
    pub base_url: String,
}

/// Rates relative to a common base, e.g. `USD: 1.0, BRL: 5.15`.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct FixedRatesConfig {
    #[serde(default)]
    pub rates: HashMap<String, f64>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ProvidersConfig {
    pub yahoo: Option<YahooProviderConfig>,
    pub fixed: Option<FixedRatesConfig>,
}

fn default_ledger_currency() -> String {
    "BRL".to_string()
}

fn default_rate_ttl_secs() -> u64 {
    3600
}

fn default_retries() -> usize {
    2
}

fn default_rate_limit_per_minute() -> usize {
    100
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default = "default_ledger_currency")]
    pub ledger_currency: String,
    /// Display currency used until the user saves a preference.
    pub currency: Option<String>,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default = "default_rate_ttl_secs")]
    pub rate_ttl_secs: u64,
    #[serde(default = "default_retries")]
    pub retries: usize,
    /// Upstream rate lookups allowed per user each minute, 0 for no limit.
    #[serde(default = "default_rate_limit_per_minute")]
    pub rate_limit_per_minute: usize,
    /// Session user; falls back to `$USER`.
    pub user: Option<String>,
    pub data_path: Option<String>,
    #[serde(default)]
    pub transactions: Vec<TransactionEntry>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "ledgerfx", "ledgerfx")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("dev", "ledgerfx", "ledgerfx")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        let config = config.normalized()?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    /// Uppercases every currency code and rejects malformed ones.
    pub fn normalized(mut self) -> Result<Self> {
        self.ledger_currency =
            normalize_code(&self.ledger_currency).context("Invalid ledger_currency")?;
        self.currency = self
            .currency
            .as_deref()
            .map(normalize_code)
            .transpose()
            .context("Invalid display currency")?;
        if let Some(fixed) = self.providers.fixed.as_mut() {
            let rates = std::mem::take(&mut fixed.rates);
            fixed.rates = rates
                .into_iter()
                .map(|(code, rate)| normalize_code(&code).map(|code| (code, rate)))
                .collect::<Result<_, _>>()
                .context("Invalid currency in fixed rates")?;
        }
        Ok(self)
    }

    /// The display currency to start with when nothing has been saved.
    pub fn display_currency(&self) -> &str {
        self.currency.as_deref().unwrap_or(&self.ledger_currency)
    }

    pub fn rate_ttl(&self) -> Option<Duration> {
        (self.rate_ttl_secs > 0).then(|| Duration::from_secs(self.rate_ttl_secs))
    }

    pub fn session_user(&self) -> String {
        self.user
            .clone()
            .or_else(|| std::env::var("USER").ok())
            .unwrap_or_else(|| "local".to_string())
    }

    /// Ledger transactions tagged with the ledger currency. Entries without an
    /// id get a positional one.
    pub fn ledger_transactions(&self) -> Vec<Transaction> {
        self.transactions
            .iter()
            .enumerate()
            .map(|(index, entry)| Transaction {
                id: entry
                    .id
                    .clone()
                    .unwrap_or_else(|| format!("tx-{}", index + 1)),
                date: entry.date,
                kind: entry.kind,
                category: entry.category.clone(),
                description: entry.description.clone().unwrap_or_default(),
                amount: MoneyAmount::new(entry.amount, &self.ledger_currency),
            })
            .collect()
    }
}

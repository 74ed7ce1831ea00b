pub mod cli;
pub mod convert;
pub mod core;
pub mod dashboard;
pub mod log;
pub mod providers;
pub mod store;

pub use crate::core::config;

use crate::core::money::normalize_code;
use crate::core::preference::{CurrencyPreference, PreferenceStore};
use crate::dashboard::Dashboard;
use crate::store::memory::MemoryPreferenceStore;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info};

pub enum AppCommand {
    /// Totals, monthly balances and category breakdown
    Summary { currency: Option<String> },
    /// Every ledger transaction
    Transactions { currency: Option<String> },
    /// Show the display currency, or save a new one
    Currency { code: Option<String> },
    /// Supported display currencies
    Currencies,
}

/// Dashboard for one command. A `currency` override applies to this run only
/// and is never saved.
fn open_dashboard(
    config: &config::AppConfig,
    preferences: Arc<dyn PreferenceStore>,
    currency: Option<&str>,
) -> Result<Dashboard> {
    let preferences: Arc<dyn PreferenceStore> = match currency {
        Some(code) => {
            let code = normalize_code(code).context("Invalid currency code")?;
            Arc::new(MemoryPreferenceStore::new(CurrencyPreference::new(code)))
        }
        None => preferences,
    };
    Dashboard::start(
        config,
        preferences,
        providers::build_conversion_provider(config),
    )
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("ledgerfx starting...");

    let config = match config_path {
        Some(path) => config::AppConfig::load_from_path(path)?,
        None => config::AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let preferences = store::open_preference_store(&config);

    match command {
        AppCommand::Summary { currency } => {
            let dashboard = open_dashboard(&config, preferences, currency.as_deref())?;
            cli::summary::run(&dashboard).await
        }
        AppCommand::Transactions { currency } => {
            let dashboard = open_dashboard(&config, preferences, currency.as_deref())?;
            cli::transactions::run(&dashboard).await
        }
        AppCommand::Currency { code: Some(code) } => {
            cli::currency::set(preferences.as_ref(), &code).await?;
            Ok(())
        }
        AppCommand::Currency { code: None } => {
            cli::currency::show(preferences.as_ref(), &config.ledger_currency);
            Ok(())
        }
        AppCommand::Currencies => {
            cli::currency::list(preferences.as_ref());
            Ok(())
        }
    }
}

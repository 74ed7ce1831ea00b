//! Wires a ledger source, a preference store and a conversion provider into a
//! running orchestrator.

use crate::convert::{ConversionOrchestrator, ConvertedView, OrchestratorHandle, OrchestratorInputs};
use crate::core::config::AppConfig;
use crate::core::currency::ConversionProvider;
use crate::core::ledger::Transaction;
use crate::core::money::normalize_code;
use crate::core::preference::{CurrencyPreference, PreferenceStore};
use crate::core::source::{RawFinancialSource, Session};
use crate::log::log_notices;
use crate::store::memory::MemoryLedgerSource;
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

pub struct Dashboard {
    source: Arc<MemoryLedgerSource>,
    preferences: Arc<dyn PreferenceStore>,
    session: watch::Sender<Option<Session>>,
    handle: OrchestratorHandle,
}

impl Dashboard {
    /// Starts the orchestrator and loads the configured transactions. Must be
    /// called inside a tokio runtime.
    pub fn start(
        config: &AppConfig,
        preferences: Arc<dyn PreferenceStore>,
        provider: Arc<dyn ConversionProvider>,
    ) -> Result<Self> {
        let source = Arc::new(MemoryLedgerSource::new(&config.ledger_currency));
        let (session, session_rx) = watch::channel(Some(Session::new(config.session_user())));

        let handle = ConversionOrchestrator::new(&config.ledger_currency, provider).spawn(
            OrchestratorInputs {
                raw: source.subscribe(),
                preference: preferences.subscribe(),
                session: session_rx,
            },
        );
        tokio::spawn(log_notices(handle.notices()));

        let transactions = config.ledger_transactions();
        info!(
            count = transactions.len(),
            ledger = %config.ledger_currency,
            display = %preferences.current().currency,
            "Dashboard started"
        );
        source
            .replace_transactions(transactions)
            .context("Ledger transactions must all be in the ledger currency")?;

        Ok(Self {
            source,
            preferences,
            session,
            handle,
        })
    }

    pub fn current(&self) -> ConvertedView {
        self.handle.current()
    }

    pub fn views(&self) -> watch::Receiver<ConvertedView> {
        self.handle.view()
    }

    pub fn display_currency(&self) -> String {
        self.preferences.current().currency
    }

    /// Waits until the view is neither loading nor converting.
    pub async fn settled_view(&self) -> ConvertedView {
        self.handle.settled().await
    }

    /// Waits for the first settled view produced for `currency`.
    pub async fn view_for(&self, currency: &str) -> ConvertedView {
        let mut views = self.handle.view();
        if let Ok(view) = views
            .wait_for(|v| !v.loading && v.requested_currency == currency)
            .await
        {
            return view.clone();
        }
        views.borrow().clone()
    }

    /// Validates and saves a new display currency. Returns the normalized
    /// code.
    pub async fn set_currency(&self, code: &str) -> Result<String> {
        let code = normalize_code(code)?;
        debug!("Switching display currency to {code}");
        self.preferences
            .save(CurrencyPreference::new(code.clone()))
            .await?;
        Ok(code)
    }

    /// Publishes a new ledger snapshot, as a refetch would.
    pub fn reload(&self, transactions: Vec<Transaction>) -> Result<()> {
        self.source.set_loading();
        self.source
            .replace_transactions(transactions)
            .context("Ledger transactions must all be in the ledger currency")?;
        Ok(())
    }

    pub fn sign_out(&self) {
        self.session.send_replace(None);
    }
}

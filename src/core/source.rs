//! Raw financial data boundary

use crate::core::ledger::RawFinancialData;
use tokio::sync::watch;

/// Authenticated context the dashboard runs under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
}

impl Session {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

/// Push source of ledger-currency snapshots. The source owns its own
/// fetch lifecycle and publishes every new snapshot on the channel.
pub trait RawFinancialSource: Send + Sync {
    fn subscribe(&self) -> watch::Receiver<RawFinancialData>;
}

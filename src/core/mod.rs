//! Core business logic abstractions

pub mod cache;
pub mod config;
pub mod currency;
pub mod error;
pub mod ledger;
pub mod money;
pub mod preference;
pub mod source;

// Re-export main types for cleaner imports
pub use currency::{ConversionProvider, CurrencyRateProvider};
pub use error::{ConversionError, SourceError};
pub use ledger::{FinancialSummary, RawFinancialData, Transaction, TransactionKind};
pub use money::MoneyAmount;
pub use preference::{CurrencyPreference, PreferenceStore};
pub use source::{RawFinancialSource, Session};

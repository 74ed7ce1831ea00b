//! The conversion state machine.
//!
//! [`reduce`] is a pure function from the current state and one event to the
//! next state, plus at most one provider request to issue and one notice to
//! publish. Every request carries the generation it was issued under; a
//! completion is only applied when its generation is still the one in
//! flight, which is how superseded results get dropped without cancelling
//! anything.

use crate::convert::cache::{ConversionCache, ConversionKey, ConvertedResult};
use crate::convert::notice::ConversionNotice;
use crate::convert::view::{ConvertedView, Freshness};
use crate::core::error::ConversionError;
use crate::core::ledger::{FinancialSummary, RawFinancialData, Transaction};
use crate::core::source::Session;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;

/// One unit of work for the conversion provider.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    pub generation: u64,
    pub key: ConversionKey,
    pub transactions: Arc<Vec<Transaction>>,
    pub summary: Arc<FinancialSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// Nothing to convert: loading, signed out, or target is the ledger currency.
    Idle,
    Converting { generation: u64, key: ConversionKey },
    Fresh,
    FallbackRaw,
}

#[derive(Debug, Clone)]
pub enum Event {
    RawDataChanged(RawFinancialData),
    CurrencyChanged(String),
    SessionChanged(Option<Session>),
    ConversionSucceeded {
        generation: u64,
        key: ConversionKey,
        transactions: Vec<Transaction>,
        summary: FinancialSummary,
        converted_at: DateTime<Utc>,
    },
    ConversionFailed {
        generation: u64,
        key: ConversionKey,
        error: ConversionError,
    },
}

#[derive(Debug, Clone)]
pub struct ConversionState {
    ledger_currency: String,
    target_currency: String,
    raw: RawFinancialData,
    session: Option<Session>,
    generation: u64,
    phase: Phase,
    cache: ConversionCache,
    view: ConvertedView,
}

/// Result of applying one event.
#[derive(Debug)]
pub struct Transition {
    pub state: ConversionState,
    pub request: Option<ConversionRequest>,
    pub notice: Option<ConversionNotice>,
}

impl Transition {
    fn quiet(state: ConversionState) -> Self {
        Self {
            state,
            request: None,
            notice: None,
        }
    }
}

impl ConversionState {
    /// Builds the initial state from the current inputs and evaluates it.
    pub fn start(
        ledger_currency: &str,
        raw: RawFinancialData,
        target_currency: &str,
        session: Option<Session>,
    ) -> Transition {
        let view = ConvertedView::passthrough(&raw, ledger_currency, target_currency);
        Self {
            ledger_currency: ledger_currency.to_string(),
            target_currency: target_currency.to_string(),
            raw,
            session,
            generation: 0,
            phase: Phase::Idle,
            cache: ConversionCache::new(),
            view,
        }
        .evaluate()
    }

    pub fn view(&self) -> &ConvertedView {
        &self.view
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// Number of requests issued so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn cache(&self) -> &ConversionCache {
        &self.cache
    }

    fn passthrough(&self) -> ConvertedView {
        ConvertedView::passthrough(&self.raw, &self.ledger_currency, &self.target_currency)
    }

    /// Decides what to show for the latest inputs.
    fn evaluate(mut self) -> Transition {
        if self.raw.loading
            || self.session.is_none()
            || self.target_currency == self.ledger_currency
        {
            // Anything still in flight becomes stale from here on.
            self.phase = Phase::Idle;
            self.view = self.passthrough();
            return Transition::quiet(self);
        }

        let key = ConversionKey::new(
            &self.ledger_currency,
            &self.target_currency,
            self.raw.fingerprint(),
        );

        if let Some(result) = self.cache.get(&key) {
            self.phase = Phase::Fresh;
            self.view = ConvertedView::converted(&result, &self.raw, Freshness::Cached);
            return Transition::quiet(self);
        }

        if matches!(&self.phase, Phase::Converting { key: in_flight, .. } if *in_flight == key) {
            self.view.source_error = self.raw.error.clone();
            return Transition::quiet(self);
        }

        self.generation += 1;
        let generation = self.generation;
        self.view = ConvertedView::upgrading(
            &self.view,
            &self.raw,
            &self.ledger_currency,
            &self.target_currency,
        );
        self.phase = Phase::Converting {
            generation,
            key: key.clone(),
        };
        debug!(generation, target_currency = %key.target, "Issuing conversion request");

        let request = ConversionRequest {
            generation,
            key,
            transactions: Arc::clone(&self.raw.transactions),
            summary: Arc::clone(&self.raw.summary),
        };
        let notice = ConversionNotice::Started {
            generation,
            target: self.target_currency.clone(),
        };
        Transition {
            state: self,
            request: Some(request),
            notice: Some(notice),
        }
    }

    fn is_in_flight(&self, generation: u64, key: &ConversionKey) -> bool {
        matches!(
            &self.phase,
            Phase::Converting { generation: g, key: k } if *g == generation && k == key
        )
    }

    fn discard(self, generation: u64, key: ConversionKey) -> Transition {
        debug!(generation, target_currency = %key.target, "Discarding superseded conversion");
        Transition {
            state: self,
            request: None,
            notice: Some(ConversionNotice::Discarded {
                generation,
                target: key.target,
            }),
        }
    }

    /// Rejects responses that would mix currencies or drop records.
    fn validate_response(
        &self,
        key: &ConversionKey,
        transactions: &[Transaction],
        summary: &FinancialSummary,
    ) -> Result<(), ConversionError> {
        if transactions.len() != self.raw.transactions.len() {
            return Err(ConversionError::ProviderMalformedResponse(format!(
                "expected {} transactions, got {}",
                self.raw.transactions.len(),
                transactions.len()
            )));
        }
        let stray = transactions
            .iter()
            .map(|tx| &tx.amount)
            .chain(summary.amounts())
            .find(|amount| amount.currency != key.target);
        match stray {
            Some(amount) => Err(ConversionError::ProviderMalformedResponse(format!(
                "amount in {} where {} was requested",
                amount.currency, key.target
            ))),
            None => Ok(()),
        }
    }

    fn on_success(
        mut self,
        generation: u64,
        key: ConversionKey,
        transactions: Vec<Transaction>,
        summary: FinancialSummary,
        converted_at: DateTime<Utc>,
    ) -> Transition {
        if !self.is_in_flight(generation, &key) {
            return self.discard(generation, key);
        }
        if let Err(error) = self.validate_response(&key, &transactions, &summary) {
            return self.on_failure(generation, key, error);
        }

        let result = ConvertedResult {
            key,
            generation,
            transactions: Arc::new(transactions),
            summary: Arc::new(summary),
            converted_at,
        };
        self.view = ConvertedView::converted(&result, &self.raw, Freshness::Fresh);
        self.phase = Phase::Fresh;
        let notice = ConversionNotice::Completed {
            generation,
            target: result.key.target.clone(),
        };
        self.cache.put(result);
        Transition {
            state: self,
            request: None,
            notice: Some(notice),
        }
    }

    fn on_failure(
        mut self,
        generation: u64,
        key: ConversionKey,
        error: ConversionError,
    ) -> Transition {
        if !self.is_in_flight(generation, &key) {
            return self.discard(generation, key);
        }
        self.view = ConvertedView::fallback(
            &self.raw,
            &self.ledger_currency,
            &self.target_currency,
            error.clone(),
        );
        self.phase = Phase::FallbackRaw;
        Transition {
            state: self,
            request: None,
            notice: Some(ConversionNotice::Failed {
                generation,
                target: key.target,
                error,
            }),
        }
    }
}

/// Applies one event to the state.
pub fn reduce(mut state: ConversionState, event: Event) -> Transition {
    match event {
        Event::RawDataChanged(raw) => {
            state.raw = raw;
            state.evaluate()
        }
        Event::CurrencyChanged(currency) => {
            state.target_currency = currency;
            state.evaluate()
        }
        Event::SessionChanged(session) => {
            state.session = session;
            state.evaluate()
        }
        Event::ConversionSucceeded {
            generation,
            key,
            transactions,
            summary,
            converted_at,
        } => state.on_success(generation, key, transactions, summary, converted_at),
        Event::ConversionFailed {
            generation,
            key,
            error,
        } => state.on_failure(generation, key, error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::SourceError;
    use crate::core::ledger::TransactionKind;
    use crate::core::money::MoneyAmount;
    use chrono::NaiveDate;

    fn raw_with_balance(balance: f64) -> RawFinancialData {
        let transactions = vec![Transaction {
            id: "salary".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
            kind: TransactionKind::Income,
            category: "Salary".to_string(),
            description: String::new(),
            amount: MoneyAmount::new(balance, "BRL"),
        }];
        RawFinancialData::loaded(transactions, "BRL").unwrap()
    }

    fn session() -> Option<Session> {
        Some(Session::new("user-1"))
    }

    fn start(raw: RawFinancialData, target: &str) -> Transition {
        ConversionState::start("BRL", raw, target, session())
    }

    /// Converts a request the way a provider would, at a fixed rate.
    fn succeed(request: &ConversionRequest, rate: f64) -> Event {
        let target = request.key.target.as_str();
        Event::ConversionSucceeded {
            generation: request.generation,
            key: request.key.clone(),
            transactions: request
                .transactions
                .iter()
                .map(|tx| tx.with_amount(tx.amount.convert(rate, target)))
                .collect(),
            summary: request
                .summary
                .try_map_amounts(|m| Ok::<_, ConversionError>(m.convert(rate, target)))
                .unwrap(),
            converted_at: Utc::now(),
        }
    }

    fn fail(request: &ConversionRequest) -> Event {
        Event::ConversionFailed {
            generation: request.generation,
            key: request.key.clone(),
            error: ConversionError::ProviderUnavailable("connection refused".to_string()),
        }
    }

    #[test]
    fn test_ledger_currency_never_converts() {
        let t = start(raw_with_balance(1000.0), "BRL");
        assert!(t.request.is_none());
        let view = t.state.view();
        assert_eq!(view.summary.balance.value, 1000.0);
        assert_eq!(view.current_currency, "BRL");
        assert!(!view.is_converting);
        assert_eq!(view.freshness, Freshness::Passthrough);

        let t = reduce(t.state, Event::RawDataChanged(raw_with_balance(2000.0)));
        assert!(t.request.is_none());
        assert_eq!(t.state.view().summary.balance.value, 2000.0);
        assert_eq!(t.state.generation(), 0);
    }

    #[test]
    fn test_brl_to_usd_success() {
        let t = start(raw_with_balance(1000.0), "BRL");
        let t = reduce(t.state, Event::CurrencyChanged("USD".to_string()));

        let request = t.request.expect("conversion should be requested");
        assert_eq!(request.key.source, "BRL");
        assert_eq!(request.key.target, "USD");
        assert!(matches!(t.notice, Some(ConversionNotice::Started { generation: 1, .. })));
        let view = t.state.view();
        assert!(view.is_converting);
        assert!(view.loading);
        // Still showing raw data while converting
        assert_eq!(view.summary.balance.value, 1000.0);
        assert_eq!(view.current_currency, "BRL");

        let t = reduce(t.state, succeed(&request, 0.1843));
        let view = t.state.view();
        assert_eq!(view.summary.balance.value, 184.3);
        assert_eq!(view.current_currency, "USD");
        assert_eq!(view.transactions[0].amount.currency, "USD");
        assert!(!view.is_converting);
        assert!(!view.loading);
        assert!(view.conversion_error.is_none());
        assert_eq!(view.freshness, Freshness::Fresh);
        assert_eq!(t.state.phase(), &Phase::Fresh);
        assert_eq!(t.state.cache().len(), 1);
    }

    #[test]
    fn test_unchanged_inputs_hit_cache() {
        let t = start(raw_with_balance(1000.0), "USD");
        let request = t.request.unwrap();
        let t = reduce(t.state, succeed(&request, 0.1843));

        // Same content, new snapshot
        let t = reduce(t.state, Event::RawDataChanged(raw_with_balance(1000.0)));
        assert!(t.request.is_none());
        assert_eq!(t.state.view().freshness, Freshness::Cached);
        assert_eq!(t.state.view().summary.balance.value, 184.3);
        assert_eq!(t.state.generation(), 1);

        // Back and forth between currencies
        let t = reduce(t.state, Event::CurrencyChanged("BRL".to_string()));
        let t = reduce(t.state, Event::CurrencyChanged("USD".to_string()));
        assert!(t.request.is_none());
        assert_eq!(t.state.view().current_currency, "USD");
    }

    #[test]
    fn test_superseded_result_is_discarded() {
        let t = start(raw_with_balance(1000.0), "BRL");
        let t = reduce(t.state, Event::CurrencyChanged("USD".to_string()));
        let usd_request = t.request.unwrap();
        let t = reduce(t.state, Event::CurrencyChanged("EUR".to_string()));
        let eur_request = t.request.unwrap();
        assert_eq!(eur_request.generation, 2);

        let t = reduce(t.state, succeed(&usd_request, 0.1843));
        assert!(matches!(
            t.notice,
            Some(ConversionNotice::Discarded { generation: 1, .. })
        ));
        let view = t.state.view();
        assert_ne!(view.current_currency, "USD");
        assert!(view.is_converting);
        assert!(t.state.cache().is_empty());

        let t = reduce(t.state, succeed(&eur_request, 0.17));
        let view = t.state.view();
        assert_eq!(view.current_currency, "EUR");
        assert_eq!(view.summary.balance.value, 170.0);
        assert!(!view.is_converting);
    }

    #[test]
    fn test_returning_to_earlier_currency_reissues() {
        let t = start(raw_with_balance(1000.0), "USD");
        let first = t.request.unwrap();
        let t = reduce(t.state, Event::CurrencyChanged("EUR".to_string()));
        let t = reduce(t.state, Event::CurrencyChanged("USD".to_string()));
        let third = t.request.unwrap();
        assert_eq!(third.key, first.key);
        assert_eq!(third.generation, 3);

        // Same key, older generation
        let t = reduce(t.state, succeed(&first, 0.1843));
        assert!(matches!(t.notice, Some(ConversionNotice::Discarded { .. })));
        assert!(t.state.view().is_converting);

        let t = reduce(t.state, succeed(&third, 0.1843));
        assert_eq!(t.state.view().current_currency, "USD");
    }

    #[test]
    fn test_switching_to_ledger_drops_in_flight() {
        let t = start(raw_with_balance(1000.0), "USD");
        let request = t.request.unwrap();
        let t = reduce(t.state, Event::CurrencyChanged("BRL".to_string()));
        assert_eq!(t.state.phase(), &Phase::Idle);
        assert!(!t.state.view().loading);

        let t = reduce(t.state, succeed(&request, 0.1843));
        assert!(matches!(t.notice, Some(ConversionNotice::Discarded { .. })));
        assert_eq!(t.state.view().current_currency, "BRL");
        assert_eq!(t.state.view().summary.balance.value, 1000.0);
    }

    #[test]
    fn test_same_key_in_flight_is_not_reissued() {
        let t = start(raw_with_balance(1000.0), "USD");
        assert!(t.request.is_some());
        let t = reduce(t.state, Event::RawDataChanged(raw_with_balance(1000.0)));
        assert!(t.request.is_none());
        assert!(t.state.view().is_converting);
        assert_eq!(t.state.generation(), 1);
    }

    #[test]
    fn test_failure_falls_back_to_raw() {
        let t = start(raw_with_balance(1000.0), "USD");
        let request = t.request.unwrap();
        let t = reduce(t.state, fail(&request));

        let view = t.state.view();
        assert_eq!(view.summary.balance.value, 1000.0);
        assert_eq!(view.current_currency, "BRL");
        assert_eq!(view.requested_currency, "USD");
        assert!(view.is_fallback());
        assert!(!view.is_converting);
        assert!(!view.loading);
        assert!(matches!(
            view.conversion_error,
            Some(ConversionError::ProviderUnavailable(_))
        ));
        assert_eq!(view.freshness, Freshness::FallbackRaw);
        assert!(matches!(t.notice, Some(ConversionNotice::Failed { .. })));
        assert!(t.state.cache().is_empty());
    }

    #[test]
    fn test_stale_failure_is_ignored() {
        let t = start(raw_with_balance(1000.0), "USD");
        let usd_request = t.request.unwrap();
        let t = reduce(t.state, Event::CurrencyChanged("EUR".to_string()));
        let eur_request = t.request.unwrap();
        let t = reduce(t.state, succeed(&eur_request, 0.17));

        let t = reduce(t.state, fail(&usd_request));
        let view = t.state.view();
        assert_eq!(view.current_currency, "EUR");
        assert!(view.conversion_error.is_none());
    }

    #[test]
    fn test_response_in_wrong_currency_is_rejected() {
        let t = start(raw_with_balance(1000.0), "USD");
        let request = t.request.unwrap();
        let mut event = succeed(&request, 0.1843);
        if let Event::ConversionSucceeded { summary, .. } = &mut event {
            summary.balance = MoneyAmount::new(184.3, "EUR");
        }

        let t = reduce(t.state, event);
        let view = t.state.view();
        assert_eq!(view.current_currency, "BRL");
        assert!(matches!(
            view.conversion_error,
            Some(ConversionError::ProviderMalformedResponse(_))
        ));
    }

    #[test]
    fn test_loading_or_signed_out_passes_raw_through() {
        let mut loading = raw_with_balance(1000.0);
        loading.loading = true;
        let t = start(loading, "USD");
        assert!(t.request.is_none());
        assert!(t.state.view().loading);
        assert!(!t.state.view().is_converting);

        let t = ConversionState::start("BRL", raw_with_balance(1000.0), "USD", None);
        assert!(t.request.is_none());
        assert_eq!(t.state.view().current_currency, "BRL");

        let t = reduce(t.state, Event::SessionChanged(session()));
        assert!(t.request.is_some());
    }

    #[test]
    fn test_source_error_is_reported_separately() {
        let mut raw = raw_with_balance(1000.0);
        raw.error = Some(SourceError::new("sync failed"));
        let t = start(raw, "USD");
        let request = t.request.unwrap();
        let t = reduce(t.state, succeed(&request, 0.1843));

        let view = t.state.view();
        assert_eq!(view.source_error, Some(SourceError::new("sync failed")));
        assert!(view.conversion_error.is_none());
        assert_eq!(view.current_currency, "USD");
    }

    #[test]
    fn test_new_data_during_conversion_keeps_previous_view() {
        let t = start(raw_with_balance(1000.0), "USD");
        let first = t.request.unwrap();
        let t = reduce(t.state, succeed(&first, 0.1843));

        let t = reduce(t.state, Event::RawDataChanged(raw_with_balance(2000.0)));
        let second = t.request.unwrap();
        assert_ne!(second.key.data_version, first.key.data_version);
        let view = t.state.view();
        assert!(view.is_converting);
        assert_eq!(view.freshness, Freshness::Previous);
        assert_eq!(view.summary.balance.value, 184.3);
        assert_eq!(view.current_currency, "USD");

        let t = reduce(t.state, succeed(&second, 0.1843));
        assert_eq!(t.state.view().summary.balance.value, 368.6);
        // Superseded snapshot evicted
        assert_eq!(t.state.cache().len(), 1);
    }

    #[test]
    fn test_description_edit_reconverts() {
        let mut raw = raw_with_balance(1000.0);
        Arc::make_mut(&mut raw.transactions)[0].description = "old text".to_string();
        let t = start(raw.clone(), "USD");
        let first = t.request.unwrap();
        let t = reduce(t.state, succeed(&first, 0.1843));

        Arc::make_mut(&mut raw.transactions)[0].description = "new text".to_string();
        let t = reduce(t.state, Event::RawDataChanged(raw));
        let second = t.request.expect("edited snapshot must be converted again");
        assert_ne!(second.key.data_version, first.key.data_version);

        let t = reduce(t.state, succeed(&second, 0.1843));
        let view = t.state.view();
        assert_eq!(view.freshness, Freshness::Fresh);
        assert_eq!(view.transactions[0].description, "new text");
    }

    #[test]
    fn test_raw_change_in_flight_discards_old_result() {
        let t = start(raw_with_balance(1000.0), "USD");
        let first = t.request.unwrap();

        let t = reduce(t.state, Event::RawDataChanged(raw_with_balance(2000.0)));
        let second = t.request.expect("new snapshot must be converted");
        assert_eq!(second.generation, 2);
        assert!(t.state.view().is_converting);

        let t = reduce(t.state, succeed(&first, 0.1843));
        assert!(matches!(
            t.notice,
            Some(ConversionNotice::Discarded { generation: 1, .. })
        ));
        let view = t.state.view();
        assert!(view.is_converting);
        assert_ne!(view.summary.balance.value, 184.3);
        assert!(t.state.cache().is_empty());

        let t = reduce(t.state, succeed(&second, 0.1843));
        let view = t.state.view();
        assert_eq!(view.summary.balance.value, 368.6);
        assert_eq!(view.current_currency, "USD");
        assert!(!view.is_converting);
    }

    #[test]
    fn test_source_reload_mid_conversion_passes_through() {
        let t = start(raw_with_balance(1000.0), "USD");
        let first = t.request.unwrap();

        let mut reloading = raw_with_balance(1000.0);
        reloading.loading = true;
        let t = reduce(t.state, Event::RawDataChanged(reloading));
        assert!(t.request.is_none());
        assert_eq!(t.state.phase(), &Phase::Idle);
        let view = t.state.view();
        assert_eq!(view.freshness, Freshness::Passthrough);
        assert_eq!(view.current_currency, "BRL");
        assert!(view.loading);
        assert!(!view.is_converting);

        let t = reduce(t.state, succeed(&first, 0.1843));
        assert!(matches!(
            t.notice,
            Some(ConversionNotice::Discarded { generation: 1, .. })
        ));
        assert_eq!(t.state.view().current_currency, "BRL");
        assert!(t.state.cache().is_empty());

        // Reload finished: converted again under a new generation
        let t = reduce(t.state, Event::RawDataChanged(raw_with_balance(1000.0)));
        let second = t.request.unwrap();
        assert_eq!(second.generation, 2);
    }
}

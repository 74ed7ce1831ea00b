use crate::convert::notice::ConversionNotice;
use crate::convert::state::{ConversionRequest, ConversionState, Event, Transition, reduce};
use crate::convert::view::ConvertedView;
use crate::core::currency::ConversionProvider;
use crate::core::ledger::RawFinancialData;
use crate::core::preference::CurrencyPreference;
use crate::core::source::Session;
use chrono::Utc;
use futures::future::try_join;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, instrument};

const NOTICE_CAPACITY: usize = 64;

/// Inputs the orchestrator reacts to.
pub struct OrchestratorInputs {
    pub raw: watch::Receiver<RawFinancialData>,
    pub preference: watch::Receiver<CurrencyPreference>,
    pub session: watch::Receiver<Option<Session>>,
}

/// Drives [`ConversionState`] on a tokio task: feeds it input changes,
/// runs the provider calls it asks for and publishes the resulting views.
pub struct ConversionOrchestrator {
    ledger_currency: String,
    provider: Arc<dyn ConversionProvider>,
}

impl ConversionOrchestrator {
    pub fn new(ledger_currency: &str, provider: Arc<dyn ConversionProvider>) -> Self {
        Self {
            ledger_currency: ledger_currency.to_string(),
            provider,
        }
    }

    /// Starts the event loop. It stops when any input sender is dropped or
    /// when the returned handle is dropped.
    pub fn spawn(self, mut inputs: OrchestratorInputs) -> OrchestratorHandle {
        let raw = inputs.raw.borrow_and_update().clone();
        let target = inputs.preference.borrow_and_update().currency.clone();
        let session = inputs.session.borrow_and_update().clone();
        let Transition {
            state,
            request,
            notice,
        } = ConversionState::start(&self.ledger_currency, raw, &target, session);

        let (view_tx, view_rx) = watch::channel(state.view().clone());
        let (notice_tx, _) = broadcast::channel(NOTICE_CAPACITY);
        let (done_tx, done_rx) = mpsc::unbounded_channel();

        let event_loop = EventLoop {
            provider: self.provider,
            view_tx,
            notice_tx: notice_tx.clone(),
            done_tx,
        };
        event_loop.dispatch(request, notice);
        let task = tokio::spawn(event_loop.run(state, inputs, done_rx));

        OrchestratorHandle {
            view: view_rx,
            notices: notice_tx,
            task,
        }
    }
}

struct EventLoop {
    provider: Arc<dyn ConversionProvider>,
    view_tx: watch::Sender<ConvertedView>,
    notice_tx: broadcast::Sender<ConversionNotice>,
    done_tx: mpsc::UnboundedSender<Event>,
}

impl EventLoop {
    async fn run(
        self,
        mut state: ConversionState,
        mut inputs: OrchestratorInputs,
        mut done_rx: mpsc::UnboundedReceiver<Event>,
    ) {
        loop {
            let event = tokio::select! {
                changed = inputs.raw.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    Event::RawDataChanged(inputs.raw.borrow_and_update().clone())
                }
                changed = inputs.preference.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    Event::CurrencyChanged(inputs.preference.borrow_and_update().currency.clone())
                }
                changed = inputs.session.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    Event::SessionChanged(inputs.session.borrow_and_update().clone())
                }
                Some(event) = done_rx.recv() => event,
            };

            let transition = reduce(state, event);
            state = transition.state;
            self.view_tx.send_replace(state.view().clone());
            self.dispatch(transition.request, transition.notice);
        }
        debug!("Conversion orchestrator stopped");
    }

    fn dispatch(&self, request: Option<ConversionRequest>, notice: Option<ConversionNotice>) {
        if let Some(notice) = notice {
            // No subscribers is fine
            let _ = self.notice_tx.send(notice);
        }
        if let Some(request) = request {
            tokio::spawn(convert(
                Arc::clone(&self.provider),
                request,
                self.done_tx.clone(),
            ));
        }
    }
}

#[instrument(
    name = "Conversion",
    skip_all,
    fields(generation = request.generation, target = %request.key.target)
)]
async fn convert(
    provider: Arc<dyn ConversionProvider>,
    request: ConversionRequest,
    done: mpsc::UnboundedSender<Event>,
) {
    let ConversionRequest {
        generation,
        key,
        transactions,
        summary,
    } = request;

    let outcome = try_join(
        provider.convert_summary(&summary, &key.source, &key.target),
        provider.convert_transactions(&transactions, &key.source, &key.target),
    )
    .await;

    let event = match outcome {
        Ok((summary, transactions)) => Event::ConversionSucceeded {
            generation,
            key,
            transactions,
            summary,
            converted_at: Utc::now(),
        },
        Err(error) => Event::ConversionFailed {
            generation,
            key,
            error,
        },
    };
    if done.send(event).is_err() {
        debug!("Orchestrator gone, dropping conversion result");
    }
}

/// Consumer side of a running orchestrator.
pub struct OrchestratorHandle {
    view: watch::Receiver<ConvertedView>,
    notices: broadcast::Sender<ConversionNotice>,
    task: JoinHandle<()>,
}

impl OrchestratorHandle {
    pub fn view(&self) -> watch::Receiver<ConvertedView> {
        self.view.clone()
    }

    pub fn current(&self) -> ConvertedView {
        self.view.borrow().clone()
    }

    /// Subscribes to request lifecycle notices from now on.
    pub fn notices(&self) -> broadcast::Receiver<ConversionNotice> {
        self.notices.subscribe()
    }

    /// Waits until neither raw data nor a conversion is in flight.
    pub async fn settled(&self) -> ConvertedView {
        let mut view = self.view.clone();
        if let Ok(settled) = view.wait_for(|v| !v.loading).await {
            return settled.clone();
        }
        // Loop stopped; the last published view is final
        view.borrow().clone()
    }
}

impl Drop for OrchestratorHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

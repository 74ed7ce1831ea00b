//! Currency-aware view over raw ledger data.
//!
//! [`state`] holds the pure state machine, [`orchestrator`] runs it against
//! live inputs and a [`ConversionProvider`](crate::core::ConversionProvider).

pub mod cache;
pub mod notice;
pub mod orchestrator;
pub mod state;
pub mod view;

pub use cache::{ConversionCache, ConversionKey, ConvertedResult};
pub use notice::ConversionNotice;
pub use orchestrator::{ConversionOrchestrator, OrchestratorHandle, OrchestratorInputs};
pub use state::{ConversionRequest, ConversionState, Event, Phase, Transition, reduce};
pub use view::{ConvertedView, Freshness};

use crate::convert::ConversionNotice;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::level_filters::LevelFilter;
use tracing::{debug, info, warn};
use tracing_subscriber::{
    EnvFilter, filter::Targets, fmt, prelude::__tracing_subscriber_SubscriberExt,
    util::SubscriberInitExt,
};

pub fn init_logging(verbose: bool) {
    let (level_filter, level) = if verbose {
        (LevelFilter::DEBUG, "debug")
    } else {
        (LevelFilter::OFF, "off")
    };
    let app_filter = Targets::new().with_target("ledgerfx", level_filter);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // A second init (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().pretty().without_time())
        .with(app_filter)
        .with(env_filter)
        .try_init();
}

/// Writes every conversion notice to the log until the orchestrator stops.
pub async fn log_notices(mut notices: broadcast::Receiver<ConversionNotice>) {
    loop {
        match notices.recv().await {
            Ok(ConversionNotice::Started { generation, target }) => {
                debug!(generation, %target, "Conversion started");
            }
            Ok(ConversionNotice::Completed { generation, target }) => {
                info!(generation, %target, "Conversion completed");
            }
            Ok(ConversionNotice::Failed {
                generation,
                target,
                error,
            }) => {
                warn!(generation, %target, %error, "Conversion failed, showing ledger currency");
            }
            Ok(ConversionNotice::Discarded { generation, target }) => {
                debug!(generation, %target, "Stale conversion result discarded");
            }
            Err(RecvError::Lagged(skipped)) => {
                debug!(skipped, "Notice logger lagged behind");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

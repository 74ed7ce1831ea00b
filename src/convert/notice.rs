use crate::core::error::ConversionError;

/// Observable lifecycle of conversion requests. Published on the
/// orchestrator's broadcast channel for loggers and UIs that want to surface
/// failures.
#[derive(Debug, Clone, PartialEq)]
pub enum ConversionNotice {
    Started { generation: u64, target: String },
    Completed { generation: u64, target: String },
    Failed {
        generation: u64,
        target: String,
        error: ConversionError,
    },
    /// A result arrived after its request was superseded and was dropped.
    Discarded { generation: u64, target: String },
}

impl ConversionNotice {
    pub fn generation(&self) -> u64 {
        match self {
            ConversionNotice::Started { generation, .. }
            | ConversionNotice::Completed { generation, .. }
            | ConversionNotice::Failed { generation, .. }
            | ConversionNotice::Discarded { generation, .. } => *generation,
        }
    }

    pub fn target(&self) -> &str {
        match self {
            ConversionNotice::Started { target, .. }
            | ConversionNotice::Completed { target, .. }
            | ConversionNotice::Failed { target, .. }
            | ConversionNotice::Discarded { target, .. } => target,
        }
    }
}

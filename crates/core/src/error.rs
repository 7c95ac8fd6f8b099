use thiserror::Error;

/// Error type shared by every `sampled` crate.
///
/// The variants mirror how a fault propagates: configuration errors reject
/// synchronously, collection and scheduling faults are absorbed by the
/// engine and only logged, fatal faults surface as `Status::Error`.
#[derive(Debug, Error)]
pub enum SampleSetError {
    /// Invalid parameter combination, rejected at apply time.
    #[error("config error: {0}")]
    Config(String),

    /// A parameter's value-read callback failed or produced nothing.
    #[error("collection fault: {0}")]
    Collection(String),

    /// Clock anomaly such as a backward jump.
    #[error("scheduling fault: {0}")]
    Scheduling(String),

    /// Unrecoverable internal inconsistency.
    #[error("fatal fault: {0}")]
    Fatal(String),

    #[error("unknown parameter '{0}'")]
    UnknownParameter(String),

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl SampleSetError {
    /// `true` for faults the engine absorbs without leaving `Enabled`.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Collection(_) | Self::Scheduling(_))
    }
}

pub type Result<T, E = SampleSetError> = std::result::Result<T, E>;

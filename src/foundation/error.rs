/// Convenience result type used across turntable.
pub type TurntableResult<T> = Result<T, TurntableError>;

/// Top-level error taxonomy used by capture, compositing and export APIs.
///
/// Every variant is terminal for the export that produced it; nothing is retried.
#[derive(thiserror::Error, Debug)]
pub enum TurntableError {
    /// The raster source has no renderable surface (yet), or its render thread is gone.
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    /// The output encoder rejected the frames or its configuration.
    #[error("encode failed: {0}")]
    EncodeFailed(String),

    /// Another export is running against the same [`crate::Exporter`].
    #[error("export already in progress")]
    ExportAlreadyInProgress,

    /// Invalid user-provided settings or buffers.
    #[error("validation error: {0}")]
    Validation(String),

    /// Filesystem errors while writing artifacts.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Wrapped lower-level error from dependencies.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TurntableError {
    /// Build a [`TurntableError::SourceUnavailable`] value.
    pub fn source_unavailable(msg: impl Into<String>) -> Self {
        Self::SourceUnavailable(msg.into())
    }

    /// Build a [`TurntableError::EncodeFailed`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::EncodeFailed(msg.into())
    }

    /// Build a [`TurntableError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;

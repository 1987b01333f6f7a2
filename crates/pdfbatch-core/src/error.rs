//! Error taxonomy surfaced by the batch engine's public API.

/// The five error kinds the engine can report to a caller.
///
/// Per-file handler failures are never represented here: they are recorded
/// as [`crate::model::OperationOutcome`]s inside a job's results, not raised
/// as engine errors.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    /// The caller supplied invalid arguments (empty operation name, unknown
    /// operation, empty file list, retry on a job with no failed files, ...).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A job id, config name, or other lookup key is unknown.
    #[error("not found: {0}")]
    NotFound(String),

    /// The requested operation conflicts with the job's current status.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A handler reported its own failure for a single file. Kept as a
    /// variant for completeness with the error taxonomy; engine code never
    /// constructs this directly, since handler failures are recorded in
    /// `OperationOutcome` instead of propagated.
    #[error("handler error: {0}")]
    HandlerError(String),

    /// Unrecoverable failure of the store or worker pool itself.
    #[error("system error: {0}")]
    SystemError(#[source] anyhow::Error),
}

impl BatchError {
    /// Wraps an arbitrary error as a [`BatchError::SystemError`].
    pub fn system(err: impl Into<anyhow::Error>) -> Self {
        BatchError::SystemError(err.into())
    }
}

/// Convenience alias for results returned by the engine's public API.
pub type BatchResult<T> = Result<T, BatchError>;

//! Error types returned by connector syncers.

use thiserror::Error;

/// Errors a syncer reports back to the sync engine.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The upstream system failed. The source is kept so callers can
    /// downcast to the client's own error type.
    #[error("upstream error: {0}")]
    Upstream(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The page token handed back by the engine could not be parsed.
    #[error("invalid page token: {0}")]
    InvalidPageToken(String),

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SyncError {
    /// Wrap an upstream failure.
    pub fn upstream<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Upstream(Box::new(err))
    }

    /// The upstream error as `E`, if that is what caused this failure.
    #[must_use]
    pub fn upstream_as<E: std::error::Error + 'static>(&self) -> Option<&E> {
        match self {
            Self::Upstream(source) => source.downcast_ref::<E>(),
            _ => None,
        }
    }
}

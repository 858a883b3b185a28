use crate::core::body::BodyId;
use crate::core::dispatch::Handle;
use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the simulation kernel and its configuration layer.
///
/// Construction contract violations surface as `InvalidParam`. Anything that signals a
/// corrupted simulation state surfaces as `Invariant`; callers must stop driving the engine
/// after receiving one.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid user or API parameter.
    #[error("invalid parameter: {0}")]
    InvalidParam(String),

    /// The id does not name a live body.
    #[error("unknown body: {0}")]
    UnknownBody(BodyId),

    /// The handle is not registered for the requested event kind.
    #[error("unknown subscription handle: {0:?}")]
    UnknownHandle(Handle),

    /// Numerical or geometric issue during collision resolution (e.g. a degenerate contact normal).
    #[error("numerical error: {0}")]
    MathError(String),

    /// Fatal simulation invariant violation (grid escape, NaN time-of-impact).
    #[error("invariant violated: {0}")]
    Invariant(String),

    /// Malformed scenario document.
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    /// Propagated I/O errors (scenario files).
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Log `msg` at error level and wrap it as an invariant violation.
    pub(crate) fn invariant(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        log::error!("{msg}");
        Error::Invariant(msg)
    }
}

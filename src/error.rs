//! Error taxonomy and native-exception translation.
//!
//! Callers only ever observe the canonical [`Error`] taxonomy; whatever an
//! underlying client library produces arrives here as a [`RawError`] and is
//! translated totally — unmapped shapes fall through to
//! [`ErrorKind::Unknown`] instead of leaking through unchanged.

use thiserror::Error;

use crate::value::Value;

/// Result type for all core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Canonical classification of an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Interrupted while blocked on a command.
    Interrupted,
    /// Remote-side error reported by the server (wrong type, bad command).
    Server,
    /// Transport/channel failure; the connection must not be reused.
    Connection,
    /// Operation exceeded its deadline.
    Timeout,
    /// Anything the translation could not classify.
    Unknown,
}

/// Native-side error surface of a [`RawConnection`](crate::connection::RawConnection)
/// adapter. Underlying client libraries report through these variants; the
/// core never sees their concrete exception types.
#[derive(Debug, Error)]
pub enum RawError {
    #[error("server error: {0}")]
    Server(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("operation timed out")]
    TimedOut,

    #[error("command interrupted")]
    Interrupted,
}

/// Partial results of a failed batch.
///
/// Successful entries keep their converted values; failing entries carry the
/// error that replaced their value. `first_failed` indexes the entry whose
/// error is treated as the batch's cause.
#[derive(Debug)]
pub struct BatchFailure {
    pub partial: Vec<std::result::Result<Value, Error>>,
    pub first_failed: usize,
}

impl BatchFailure {
    /// The error of the first failing entry.
    pub fn cause(&self) -> Option<&Error> {
        match self.partial.get(self.first_failed) {
            Some(Err(e)) => Some(e),
            _ => None,
        }
    }

    /// How many entries failed.
    pub fn failed_count(&self) -> usize {
        self.partial.iter().filter(|r| r.is_err()).count()
    }
}

/// Canonical error observed by callers of the core.
#[derive(Debug, Error)]
pub enum Error {
    #[error("server error: {0}")]
    Server(String),

    #[error("connection failure: {0}")]
    Connection(#[source] RawError),

    #[error("command interrupted: {0}")]
    Interrupted(#[source] RawError),

    #[error("command timed out: {0}")]
    Timeout(#[source] RawError),

    #[error("unexpected reply shape: {0}")]
    Unexpected(String),

    #[error("client error: {0}")]
    Unknown(#[source] RawError),

    #[error("no transaction in progress")]
    NoTransaction,

    #[error(
        "batch failed: {} of {} entries errored (first at entry {})",
        .0.failed_count(),
        .0.partial.len(),
        .0.first_failed
    )]
    Batch(BatchFailure),
}

impl Error {
    /// Canonical kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Server(_) | Error::NoTransaction | Error::Batch(_) => ErrorKind::Server,
            Error::Connection(_) => ErrorKind::Connection,
            Error::Interrupted(_) => ErrorKind::Interrupted,
            Error::Timeout(_) => ErrorKind::Timeout,
            Error::Unexpected(_) | Error::Unknown(_) => ErrorKind::Unknown,
        }
    }

    /// Partial results, when this is an aggregate batch error.
    pub fn partial_results(&self) -> Option<&[std::result::Result<Value, Error>]> {
        match self {
            Error::Batch(failure) => Some(&failure.partial),
            _ => None,
        }
    }

    /// True when batch resolution must stop instead of recording the error
    /// per-entry: a broken transport cannot yield further valid replies, and
    /// a blown deadline applies to the batch as a whole.
    pub(crate) fn aborts_batch(&self) -> bool {
        matches!(self, Error::Connection(_) | Error::Timeout(_))
    }
}

impl From<RawError> for Error {
    fn from(raw: RawError) -> Self {
        match raw {
            RawError::Server(msg) => Error::Server(msg),
            RawError::TimedOut => Error::Timeout(RawError::TimedOut),
            RawError::Interrupted => Error::Interrupted(RawError::Interrupted),
            RawError::Io(e) => match e.kind() {
                std::io::ErrorKind::Interrupted => Error::Interrupted(RawError::Io(e)),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock => {
                    Error::Timeout(RawError::Io(e))
                }
                _ => Error::Connection(RawError::Io(e)),
            },
            RawError::Protocol(_) => Error::Unknown(raw),
        }
    }
}

//! Errors - relay error taxonomy and its operational classification.

use thiserror::Error;

use super::ids::CallId;

/// ErrorKind decides how the dispatcher routes a failed message.
///
/// - Transient: retry through queue redelivery, dead-letter at the threshold
/// - Permanent: retrying cannot help, acknowledge and drop
/// - Infrastructure: queue/store/unknown failure, treated like Transient
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transient,
    Permanent,
    Infrastructure,
}

/// A failed remote invocation.
///
/// `status_code` is `None` for network-level failures (timeout, refused
/// connection, DNS) where no response was ever received.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct InvocationFailure {
    pub status_code: Option<u16>,
    pub message: String,
}

impl InvocationFailure {
    /// The endpoint answered with a non-success status.
    pub fn status(code: u16, message: impl Into<String>) -> Self {
        Self {
            status_code: Some(code),
            message: message.into(),
        }
    }

    /// No response was received.
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            status_code: None,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("no call record found for call_id={0}")]
    RecordNotFound(CallId),

    #[error("call record payload is missing or malformed for call_id={call_id}: {reason}")]
    MalformedRecordPayload { call_id: CallId, reason: String },

    #[error("remote invocation failed: {0}")]
    Invocation(#[from] InvocationFailure),

    #[error("version conflict while updating call_id={0}")]
    PersistenceConflict(CallId),

    #[error("envelope translation failed: {0}")]
    Translate(String),

    #[error("queue `{queue}` operation failed: {message}")]
    Queue { queue: String, message: String },

    #[error("record store operation failed: {0}")]
    Store(String),

    #[error("{0}")]
    Other(String),
}

impl RelayError {
    pub fn queue(queue: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Queue {
            queue: queue.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            RelayError::RecordNotFound(_) | RelayError::MalformedRecordPayload { .. } => {
                ErrorKind::Permanent
            }
            RelayError::Invocation(_) | RelayError::PersistenceConflict(_) => ErrorKind::Transient,
            RelayError::Translate(_)
            | RelayError::Queue { .. }
            | RelayError::Store(_)
            | RelayError::Other(_) => ErrorKind::Infrastructure,
        }
    }

    /// Whether queue redelivery could make this message succeed.
    pub fn is_retryable(&self) -> bool {
        self.kind() != ErrorKind::Permanent
    }
}

use std::time::Duration;

use thiserror::Error;

/// Why a single outbound call (token exchange or delivery) did not succeed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CallFailure {
    #[error("timed out after {0:?}")]
    TimedOut(Duration),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("malformed response: {0}")]
    Malformed(String),
}

/// FCM push error types
///
/// Credential problems are configuration mistakes and will not go away on
/// their own. Token exchange and delivery failures carry the call outcome so
/// callers can tell a provider rejection from a transient network problem.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FcmError {
    #[error("Invalid service credential: {0}")]
    Credential(String),

    #[error("Token exchange failed: {0}")]
    TokenExchange(CallFailure),

    #[error("FCM delivery failed: {0}")]
    Delivery(CallFailure),
}

impl FcmError {
    fn failure(&self) -> Option<&CallFailure> {
        match self {
            FcmError::Credential(_) => None,
            FcmError::TokenExchange(f) | FcmError::Delivery(f) => Some(f),
        }
    }

    /// HTTP status returned by the remote endpoint, if it answered at all.
    pub fn status(&self) -> Option<u16> {
        match self.failure() {
            Some(CallFailure::Rejected { status, .. }) => Some(*status),
            _ => None,
        }
    }

    /// Response body text returned alongside a rejection.
    pub fn body(&self) -> Option<&str> {
        match self.failure() {
            Some(CallFailure::Rejected { body, .. }) => Some(body),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self.failure(), Some(CallFailure::TimedOut(_)))
    }

    /// Whether re-invoking the whole operation could succeed without a
    /// configuration change.
    pub fn is_transient(&self) -> bool {
        match self.failure() {
            None => false,
            Some(CallFailure::TimedOut(_)) | Some(CallFailure::Transport(_)) => true,
            Some(CallFailure::Rejected { status, .. }) => *status == 429 || *status >= 500,
            Some(CallFailure::Malformed(_)) => false,
        }
    }
}

impl From<FcmError> for String {
    fn from(err: FcmError) -> Self {
        err.to_string()
    }
}

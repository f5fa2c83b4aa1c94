use std::fmt;

use thiserror::Error;

use crate::domain::SourceKind;

/// Why a source produced no joke. Kept for logs only; every reason is
/// handled identically by callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnavailableReason {
    Transport(String),
    Timeout,
    Status(u16),
    Malformed(String),
    Upstream(String),
}

impl fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnavailableReason::Transport(message) => write!(f, "transport error: {message}"),
            UnavailableReason::Timeout => f.write_str("request timed out"),
            UnavailableReason::Status(code) => write!(f, "unexpected http status {code}"),
            UnavailableReason::Malformed(message) => write!(f, "malformed payload: {message}"),
            UnavailableReason::Upstream(message) => write!(f, "upstream reported error: {message}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} joke source unavailable: {reason}")]
pub struct SourceUnavailable {
    pub kind: SourceKind,
    pub reason: UnavailableReason,
}

impl SourceUnavailable {
    pub fn new(kind: SourceKind, reason: UnavailableReason) -> Self {
        Self { kind, reason }
    }

    pub fn malformed(kind: SourceKind, message: impl Into<String>) -> Self {
        Self::new(kind, UnavailableReason::Malformed(message.into()))
    }
}

//! Classification of a single call attempt.

use reqwest::StatusCode;
use thiserror::Error;

use crate::credentials::SigningError;

/// What one call attempt produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallOutcome {
    /// The provider confirmed the call started.
    Started,
    /// The request was answered but the call did not start.
    NotStarted,
    /// The provider answered 429.
    RateLimited,
    /// The request never got a response (connect failure, timeout, reset).
    TransportError,
}

impl CallOutcome {
    /// Classify a provider response.
    pub fn classify(status: StatusCode, body: &str, started_marker: &str) -> Self {
        if status == StatusCode::TOO_MANY_REQUESTS {
            CallOutcome::RateLimited
        } else if body.contains(started_marker) {
            CallOutcome::Started
        } else {
            CallOutcome::NotStarted
        }
    }

    /// Label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            CallOutcome::Started => "started",
            CallOutcome::NotStarted => "not_started",
            CallOutcome::RateLimited => "rate_limited",
            CallOutcome::TransportError => "transport_error",
        }
    }
}

impl std::fmt::Display for CallOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failures that stop an attempt before anything is sent.
#[derive(Debug, Error)]
pub enum CallError {
    #[error(transparent)]
    Signing(#[from] SigningError),

    #[error("Invalid destination: {0:?}")]
    InvalidDestination(String),
}

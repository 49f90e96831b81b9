//! Call status events and their log severities.

use serde::Deserialize;

/// Status reported by the provider for a call.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallStatus {
    Started,
    Ringing,
    Answered,
    Complete,
    Machine,
    Unanswered,
    Busy,
    Failed,
    Timeout,
    Rejected,
    #[serde(other)]
    Unknown,
}

/// Log level an event is reported at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warn => "warn",
            Severity::Error => "error",
        }
    }
}

impl CallStatus {
    /// Parse a raw status string; unrecognised values map to `Unknown`.
    pub fn parse(raw: &str) -> Self {
        serde_json::from_value(serde_json::Value::String(raw.to_string()))
            .unwrap_or(CallStatus::Unknown)
    }

    pub fn severity(&self) -> Severity {
        match self {
            CallStatus::Started | CallStatus::Ringing => Severity::Debug,
            CallStatus::Answered | CallStatus::Complete => Severity::Info,
            CallStatus::Machine | CallStatus::Unanswered | CallStatus::Busy => Severity::Warn,
            CallStatus::Failed | CallStatus::Timeout | CallStatus::Rejected => Severity::Error,
            CallStatus::Unknown => Severity::Debug,
        }
    }
}

/// Pull the `status` field out of an event payload, if there is one.
pub fn event_status(payload: &serde_json::Value) -> Option<&str> {
    payload.get("status").and_then(|s| s.as_str())
}

/// Log an event at the severity its status maps to.
pub fn log_event(status: Option<&str>) -> Severity {
    let severity = status.map(CallStatus::parse).unwrap_or(CallStatus::Unknown).severity();
    let status = status.unwrap_or("<missing>");

    match severity {
        Severity::Debug => tracing::debug!(status, "New broadcast event"),
        Severity::Info => tracing::info!(status, "New broadcast event"),
        Severity::Warn => tracing::warn!(status, "New broadcast event"),
        Severity::Error => tracing::error!(status, "New broadcast event"),
    }
    severity
}

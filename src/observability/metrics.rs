//! Metrics collection and exposition.
//!
//! # Metrics
//! - `broadcast_call_attempts_total` (counter): attempts by outcome
//! - `broadcast_backoff_total` (counter): backoff sleeps by policy
//! - `broadcast_contacts_total` (counter): finished contacts by disposition
//! - `broadcast_webhook_events_total` (counter): status events by severity
//!
//! Recording is a no-op until a recorder is installed with [`init_metrics`].

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

use crate::calls::CallOutcome;
use crate::resilience::retries::{BackoffKind, Disposition};
use crate::webhook::events::Severity;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_call_attempt(outcome: CallOutcome) {
    metrics::counter!("broadcast_call_attempts_total", "outcome" => outcome.as_str()).increment(1);
}

pub fn record_backoff(kind: BackoffKind) {
    metrics::counter!("broadcast_backoff_total", "policy" => kind.as_str()).increment(1);
}

pub fn record_disposition(disposition: Disposition) {
    metrics::counter!("broadcast_contacts_total", "disposition" => disposition.as_str())
        .increment(1);
}

pub fn record_webhook_event(severity: Severity) {
    metrics::counter!("broadcast_webhook_events_total", "severity" => severity.as_str())
        .increment(1);
}

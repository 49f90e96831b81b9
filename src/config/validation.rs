//! Configuration validation.
//!
//! Serde handles syntax; this checks values the dispatcher cannot run with.
//! Every problem is reported, not just the first.

use std::net::SocketAddr;
use thiserror::Error;
use tokio::sync::Semaphore;

use crate::config::schema::BroadcastConfig;

/// Longest accepted broadcast deadline: one week.
pub const MAX_DEADLINE_SECS: u64 = 7 * 24 * 60 * 60;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    /// What is wrong with it.
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate a configuration needed to place calls.
pub fn validate_config(config: &BroadcastConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let provider = &config.provider;

    if url::Url::parse(&provider.api_base_url).is_err() {
        errors.push(ValidationError::new("provider.api_base_url", "not a valid URL"));
    }
    if provider.application_id.trim().is_empty() {
        errors.push(ValidationError::new("provider.application_id", "must be set"));
    }
    if provider.number_from.trim().is_empty() {
        errors.push(ValidationError::new("provider.number_from", "must be set"));
    }
    if provider.private_key_path.trim().is_empty() {
        errors.push(ValidationError::new("provider.private_key_path", "must be set"));
    }
    if url::Url::parse(&provider.answer_url).is_err() {
        errors.push(ValidationError::new("provider.answer_url", "not a valid URL"));
    }
    if provider.started_marker.is_empty() {
        errors.push(ValidationError::new("provider.started_marker", "must not be empty"));
    }
    if provider.request_timeout_secs == 0 {
        errors.push(ValidationError::new("provider.request_timeout_secs", "must be > 0"));
    }

    if config.contacts.page_size == 0 {
        errors.push(ValidationError::new("contacts.page_size", "must be > 0"));
    }

    let retries = &config.retries;
    if retries.rate_limit_base_delay_ms == 0 {
        errors.push(ValidationError::new("retries.rate_limit_base_delay_ms", "must be > 0"));
    }
    if retries.rate_limit_max_delay_ms < retries.rate_limit_base_delay_ms {
        errors.push(ValidationError::new(
            "retries.rate_limit_max_delay_ms",
            "must be >= rate_limit_base_delay_ms",
        ));
    }
    if retries.not_started_max_attempts == 0 {
        errors.push(ValidationError::new("retries.not_started_max_attempts", "must be > 0"));
    }
    if !(0.0..=1.0).contains(&retries.jitter_ratio) {
        errors.push(ValidationError::new("retries.jitter_ratio", "must be within 0.0..=1.0"));
    }

    match config.broadcast.max_in_flight {
        0 => errors.push(ValidationError::new("broadcast.max_in_flight", "must be > 0")),
        n if n > Semaphore::MAX_PERMITS => errors.push(ValidationError::new(
            "broadcast.max_in_flight",
            format!("must be <= {}", Semaphore::MAX_PERMITS),
        )),
        _ => {}
    }
    match config.broadcast.deadline_secs {
        Some(0) => {
            errors.push(ValidationError::new("broadcast.deadline_secs", "must be > 0 when set"))
        }
        Some(secs) if secs > MAX_DEADLINE_SECS => errors.push(ValidationError::new(
            "broadcast.deadline_secs",
            format!("must be <= {MAX_DEADLINE_SECS}"),
        )),
        _ => {}
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate the settings the webhook receiver needs.
pub fn validate_webhook(config: &BroadcastConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.webhook.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new("webhook.bind_address", "not a socket address"));
    }
    if config.webhook.request_timeout_secs == 0 {
        errors.push(ValidationError::new("webhook.request_timeout_secs", "must be > 0"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the dispatcher.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for a broadcast run and the webhook receiver.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BroadcastConfig {
    /// Telephony provider credentials and endpoint.
    pub provider: ProviderConfig,

    /// Contact store location and read cap.
    pub contacts: ContactsConfig,

    /// Retry/backoff policy.
    pub retries: RetryConfig,

    /// Fan-out limits and deadline.
    pub broadcast: DispatchConfig,

    /// Webhook receiver settings.
    pub webhook: WebhookConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Telephony provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Base URL of the provider API (calls are posted to `{base}/v1/calls`).
    pub api_base_url: String,

    /// Application identifier embedded in every signed token.
    pub application_id: String,

    /// Origin phone number for outbound calls.
    pub number_from: String,

    /// Path to the application's RSA private key (PEM).
    pub private_key_path: String,

    /// Public URL the provider fetches call instructions from.
    pub answer_url: String,

    /// User-Agent header sent with every call request.
    pub user_agent: String,

    /// Response body marker meaning the call was started.
    pub started_marker: String,

    /// Timeout for a single call request in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.nexmo.com".to_string(),
            application_id: String::new(),
            number_from: String::new(),
            private_key_path: "broadcast.key".to_string(),
            answer_url: "https://nexmo-broadcast.ngrok.io".to_string(),
            user_agent: "Nexmo/Demo (Voice Broadcast) v1".to_string(),
            started_marker: "started".to_string(),
            request_timeout_secs: 10,
        }
    }
}

/// Contact store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ContactsConfig {
    /// Path to a JSON array of `{ "number": ... }` records.
    pub path: String,

    /// Maximum number of contacts read for one broadcast.
    pub page_size: usize,
}

impl Default for ContactsConfig {
    fn default() -> Self {
        Self {
            path: "contacts.json".to_string(),
            page_size: 100,
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Base delay for rate-limit (exponential) backoff in milliseconds.
    pub rate_limit_base_delay_ms: u64,

    /// Ceiling for a single rate-limit backoff in milliseconds.
    pub rate_limit_max_delay_ms: u64,

    /// Base delay for not-started (Fibonacci) backoff in milliseconds.
    pub not_started_base_delay_ms: u64,

    /// Total attempts allowed while the call keeps not starting.
    pub not_started_max_attempts: u32,

    /// Extra random delay as a fraction of the computed one (0.0 disables).
    pub jitter_ratio: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            rate_limit_base_delay_ms: 1000,
            rate_limit_max_delay_ms: 60_000,
            not_started_base_delay_ms: 1000,
            not_started_max_attempts: 5,
            jitter_ratio: 0.0,
        }
    }
}

/// Fan-out configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Maximum contacts whose attempt chains run at the same time.
    pub max_in_flight: usize,

    /// Overall deadline for a run in seconds; unfinished contacts time out.
    pub deadline_secs: Option<u64>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_in_flight: 100,
            deadline_secs: None,
        }
    }
}

/// Webhook receiver configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind_address: String,

    /// Text spoken to the callee when the call is answered.
    pub answer_text: String,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
            answer_text: "Gotta go fast!".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

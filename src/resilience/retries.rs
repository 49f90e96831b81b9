//! Retry logic for one contact's call attempts.
//!
//! # Responsibilities
//! - Map each [`CallOutcome`] to an action through one [`RetryPolicy`]
//! - Sleep for the computed backoff without blocking other contacts
//! - Report the terminal [`Disposition`] of the attempt chain
//!
//! # State Transitions
//! ```text
//! Pending → {Retrying(rate_limit) | Retrying(not_started)}*
//!         → {Started | GaveUp | TransportFailed | Rejected | TimedOut}
//! ```
//!
//! # Design Decisions
//! - Rate limiting retries forever with exponential delays
//! - Not-started retries use Fibonacci delays and are bounded
//! - The two counters are independent; neither resets the other
//! - Transport and signing failures are terminal for the contact

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::calls::{CallInitiator, CallOutcome};
use crate::config::RetryConfig;
use crate::observability::metrics;
use crate::resilience::backoff::{exponential_delay, fibonacci_delay, with_jitter};

/// Terminal state of one contact's attempt chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Disposition {
    /// The provider confirmed the call started.
    Started,
    /// The call never started within the attempt budget.
    GaveUp,
    /// An attempt got no response from the provider.
    TransportFailed,
    /// The attempt could not be built (signing or invalid destination).
    Rejected,
    /// The broadcast deadline passed before the chain finished.
    TimedOut,
}

impl Disposition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Disposition::Started => "started",
            Disposition::GaveUp => "gave_up",
            Disposition::TransportFailed => "transport_failed",
            Disposition::Rejected => "rejected",
            Disposition::TimedOut => "timed_out",
        }
    }
}

impl std::fmt::Display for Disposition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which backoff path produced a retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffKind {
    RateLimit,
    NotStarted,
}

impl BackoffKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackoffKind::RateLimit => "rate_limit",
            BackoffKind::NotStarted => "not_started",
        }
    }
}

/// What to do after an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryAction {
    Retry { kind: BackoffKind, delay: Duration },
    Stop(Disposition),
}

/// Per-chain tallies consulted by the policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryCounters {
    pub rate_limited: u32,
    pub not_started: u32,
}

/// Outcome-to-action mapping for both backoff paths.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub rate_limit_base_ms: u64,
    pub rate_limit_max_ms: u64,
    pub not_started_base_ms: u64,
    pub not_started_max_attempts: u32,
    pub jitter_ratio: f64,
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            rate_limit_base_ms: config.rate_limit_base_delay_ms,
            rate_limit_max_ms: config.rate_limit_max_delay_ms,
            not_started_base_ms: config.not_started_base_delay_ms,
            not_started_max_attempts: config.not_started_max_attempts,
            jitter_ratio: config.jitter_ratio,
        }
    }

    /// Record `outcome` in `counters` and decide the next step.
    pub fn next_action(&self, outcome: CallOutcome, counters: &mut RetryCounters) -> RetryAction {
        match outcome {
            CallOutcome::Started => RetryAction::Stop(Disposition::Started),
            CallOutcome::TransportError => RetryAction::Stop(Disposition::TransportFailed),
            CallOutcome::RateLimited => {
                counters.rate_limited = counters.rate_limited.saturating_add(1);
                RetryAction::Retry {
                    kind: BackoffKind::RateLimit,
                    delay: exponential_delay(
                        counters.rate_limited,
                        self.rate_limit_base_ms,
                        self.rate_limit_max_ms,
                    ),
                }
            }
            CallOutcome::NotStarted => {
                counters.not_started += 1;
                if counters.not_started >= self.not_started_max_attempts {
                    RetryAction::Stop(Disposition::GaveUp)
                } else {
                    RetryAction::Retry {
                        kind: BackoffKind::NotStarted,
                        delay: fibonacci_delay(counters.not_started, self.not_started_base_ms),
                    }
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

/// Summary of one contact's attempt chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainReport {
    pub destination: String,
    pub disposition: Disposition,
    /// Requests actually handed to the initiator.
    pub attempts: u32,
    pub counters: RetryCounters,
}

/// Drives one contact from `Pending` to a terminal [`Disposition`].
#[derive(Clone)]
pub struct BackoffController {
    initiator: Arc<dyn CallInitiator>,
    policy: RetryPolicy,
}

impl BackoffController {
    pub fn new(initiator: Arc<dyn CallInitiator>, policy: RetryPolicy) -> Self {
        Self { initiator, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run attempts against `destination` until a terminal state is reached.
    pub async fn dispatch(&self, destination: &str) -> ChainReport {
        self.dispatch_until(destination, None).await
    }

    /// Like [`dispatch`](Self::dispatch), but an in-flight attempt or backoff
    /// still pending at `deadline` ends the chain as `TimedOut`.
    pub async fn dispatch_until(&self, destination: &str, deadline: Option<Instant>) -> ChainReport {
        let mut counters = RetryCounters::default();
        let mut attempts = 0u32;

        let disposition = loop {
            attempts += 1;

            let Some(result) = until(deadline, self.initiator.initiate(destination)).await else {
                break Disposition::TimedOut;
            };
            let outcome = match result {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!(to = %destination, attempt = attempts, error = %e, "Call attempt rejected");
                    break Disposition::Rejected;
                }
            };

            match self.policy.next_action(outcome, &mut counters) {
                RetryAction::Stop(disposition) => break disposition,
                RetryAction::Retry { kind, delay } => {
                    let wait = with_jitter(delay, self.policy.jitter_ratio);
                    match kind {
                        BackoffKind::RateLimit => tracing::warn!(
                            to = %destination,
                            tries = counters.rate_limited,
                            wait_secs = wait.as_secs_f64(),
                            "Rate limited, backing off"
                        ),
                        BackoffKind::NotStarted => tracing::warn!(
                            to = %destination,
                            tries = counters.not_started,
                            wait_secs = wait.as_secs_f64(),
                            "Call did not start, backing off"
                        ),
                    }
                    metrics::record_backoff(kind);
                    if until(deadline, tokio::time::sleep(wait)).await.is_none() {
                        break Disposition::TimedOut;
                    }
                }
            }
        };

        tracing::debug!(to = %destination, attempts, disposition = %disposition, "Attempt chain finished");

        ChainReport {
            destination: destination.to_string(),
            disposition,
            attempts,
            counters,
        }
    }
}

/// Await `fut`, giving up at `deadline` when one is set.
async fn until<F: Future>(deadline: Option<Instant>, fut: F) -> Option<F::Output> {
    match deadline {
        Some(at) => tokio::time::timeout_at(at, fut).await.ok(),
        None => Some(fut.await),
    }
}

impl std::fmt::Debug for BackoffController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackoffController")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

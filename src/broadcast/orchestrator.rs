//! Broadcast fan-out.
//!
//! # Responsibilities
//! - Read a capped batch of contacts, flagging anything past the cap
//! - Spawn one attempt chain per contact, at most `max_in_flight` at a time
//! - Join every task and tally terminal dispositions
//!
//! # Design Decisions
//! - Per-contact failures are logged and counted, never returned
//! - Only a failed contact read fails the run
//! - The deadline is shared by all chains; finished ones are unaffected

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;

use crate::broadcast::contacts::{ContactStore, ContactStoreError};
use crate::config::BroadcastConfig;
use crate::observability::metrics;
use crate::resilience::{BackoffController, ChainReport, Disposition, RetryCounters};

/// Errors that abort a whole broadcast.
#[derive(Debug, Error)]
pub enum BroadcastError {
    #[error(transparent)]
    Contacts(#[from] ContactStoreError),
}

/// Count of contacts per terminal disposition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispositionTally {
    pub started: usize,
    pub gave_up: usize,
    pub transport_failed: usize,
    pub rejected: usize,
    pub timed_out: usize,
}

impl DispositionTally {
    fn record(&mut self, disposition: Disposition) {
        let slot = match disposition {
            Disposition::Started => &mut self.started,
            Disposition::GaveUp => &mut self.gave_up,
            Disposition::TransportFailed => &mut self.transport_failed,
            Disposition::Rejected => &mut self.rejected,
            Disposition::TimedOut => &mut self.timed_out,
        };
        *slot += 1;
    }
}

/// Summary of one broadcast run.
#[derive(Debug, Clone, Default)]
pub struct BroadcastResult {
    /// Contacts a dispatch task was launched for.
    pub attempted: usize,
    /// The store held more contacts than the page size.
    pub truncated: bool,
    pub tally: DispositionTally,
    /// Per-contact reports, in completion order. Kept in memory only.
    pub reports: Vec<ChainReport>,
}

impl BroadcastResult {
    /// Disposition of the first report for `destination`.
    pub fn disposition_of(&self, destination: &str) -> Option<Disposition> {
        self.reports
            .iter()
            .find(|r| r.destination == destination)
            .map(|r| r.disposition)
    }
}

/// Fan-out limits for a run.
#[derive(Debug, Clone, Copy)]
pub struct DispatchLimits {
    pub page_size: usize,
    pub max_in_flight: usize,
    pub deadline: Option<Duration>,
}

impl DispatchLimits {
    pub fn from_config(config: &BroadcastConfig) -> Self {
        Self {
            page_size: config.contacts.page_size,
            max_in_flight: config.broadcast.max_in_flight,
            deadline: config.broadcast.deadline_secs.map(Duration::from_secs),
        }
    }
}

impl Default for DispatchLimits {
    fn default() -> Self {
        Self::from_config(&BroadcastConfig::default())
    }
}

/// Runs one broadcast over a contact store.
pub struct Orchestrator {
    store: Arc<dyn ContactStore>,
    controller: BackoffController,
    limits: DispatchLimits,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn ContactStore>,
        controller: BackoffController,
        limits: DispatchLimits,
    ) -> Self {
        Self {
            store,
            controller,
            limits,
        }
    }

    /// Dispatch every contact in the current batch and wait for all of them.
    pub async fn run(&self) -> Result<BroadcastResult, BroadcastError> {
        let page_size = self.limits.page_size;
        let mut contacts = self.store.fetch(page_size.saturating_add(1)).await?;

        let truncated = contacts.len() > page_size;
        if truncated {
            contacts.truncate(page_size);
            tracing::warn!(page_size, "Contact store holds more contacts than the page size; extra contacts skipped");
        }

        // A deadline past the clock's range is no deadline at all.
        let deadline = self
            .limits
            .deadline
            .and_then(|d| Instant::now().checked_add(d));
        let permits = self.limits.max_in_flight.clamp(1, Semaphore::MAX_PERMITS);
        let limiter = Arc::new(Semaphore::new(permits));
        let mut tasks = JoinSet::new();

        tracing::info!(
            contacts = contacts.len(),
            max_in_flight = self.limits.max_in_flight,
            deadline_secs = ?self.limits.deadline.map(|d| d.as_secs()),
            "Broadcast starting"
        );

        for contact in contacts {
            let controller = self.controller.clone();
            let limiter = limiter.clone();
            tasks.spawn(async move {
                dispatch_contact(controller, limiter, contact.number, deadline).await
            });
        }

        let attempted = tasks.len();
        let mut result = BroadcastResult {
            attempted,
            truncated,
            ..Default::default()
        };

        while let Some(joined) = tasks.join_next().await {
            let report = match joined {
                Ok(report) => report,
                Err(e) => {
                    tracing::error!(error = %e, "Dispatch task failed");
                    result.tally.record(Disposition::Rejected);
                    metrics::record_disposition(Disposition::Rejected);
                    continue;
                }
            };

            match report.disposition {
                Disposition::Started => {
                    tracing::info!(to = %report.destination, attempts = report.attempts, "Call started")
                }
                other => tracing::warn!(
                    to = %report.destination,
                    attempts = report.attempts,
                    disposition = %other,
                    "Call not placed"
                ),
            }
            result.tally.record(report.disposition);
            metrics::record_disposition(report.disposition);
            result.reports.push(report);
        }

        tracing::info!(
            attempted = result.attempted,
            started = result.tally.started,
            truncated = result.truncated,
            "Attempted to ring {} people",
            result.attempted
        );

        Ok(result)
    }
}

async fn dispatch_contact(
    controller: BackoffController,
    limiter: Arc<Semaphore>,
    destination: String,
    deadline: Option<Instant>,
) -> ChainReport {
    let permit = match deadline {
        Some(at) => tokio::time::timeout_at(at, limiter.acquire_owned()).await.ok(),
        None => Some(limiter.acquire_owned().await),
    };

    match permit {
        Some(Ok(_permit)) => controller.dispatch_until(&destination, deadline).await,
        // Deadline passed while queued, or the limiter was closed.
        _ => ChainReport {
            destination,
            disposition: Disposition::TimedOut,
            attempts: 0,
            counters: RetryCounters::default(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::contacts::StaticContactStore;
    use crate::calls::{CallError, CallInitiator, CallOutcome};
    use crate::resilience::RetryPolicy;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fixed outcome per destination; `Started` for anything unlisted.
    struct ByNumber {
        outcomes: HashMap<&'static str, CallOutcome>,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl ByNumber {
        fn new(outcomes: &[(&'static str, CallOutcome)]) -> Arc<Self> {
            Arc::new(Self {
                outcomes: outcomes.iter().copied().collect(),
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl CallInitiator for ByNumber {
        async fn initiate(&self, destination: &str) -> Result<CallOutcome, CallError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            Ok(self
                .outcomes
                .get(destination)
                .copied()
                .unwrap_or(CallOutcome::Started))
        }
    }

    fn policy() -> RetryPolicy {
        RetryPolicy {
            rate_limit_base_ms: 100,
            rate_limit_max_ms: 1000,
            not_started_base_ms: 100,
            not_started_max_attempts: 5,
            jitter_ratio: 0.0,
        }
    }

    fn orchestrator(
        numbers: &[&str],
        initiator: Arc<ByNumber>,
        limits: DispatchLimits,
    ) -> Orchestrator {
        let store = StaticContactStore::from_numbers(numbers.iter().map(|n| n.to_string()));
        Orchestrator::new(
            Arc::new(store),
            BackoffController::new(initiator, policy()),
            limits,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_failure_is_isolated() {
        let initiator = ByNumber::new(&[("B", CallOutcome::TransportError)]);
        let result = orchestrator(&["A", "B", "C"], initiator, DispatchLimits::default())
            .run()
            .await
            .unwrap();

        assert_eq!(result.attempted, 3);
        assert_eq!(result.disposition_of("A"), Some(Disposition::Started));
        assert_eq!(result.disposition_of("B"), Some(Disposition::TransportFailed));
        assert_eq!(result.disposition_of("C"), Some(Disposition::Started));
        assert_eq!(result.tally.started, 2);
        assert_eq!(result.tally.transport_failed, 1);
        assert!(!result.truncated);
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempted_matches_contact_count() {
        for k in [0usize, 1, 7, 100] {
            let numbers: Vec<String> = (0..k).map(|i| format!("4477009{:05}", i)).collect();
            let refs: Vec<&str> = numbers.iter().map(String::as_str).collect();
            let result = orchestrator(&refs, ByNumber::new(&[]), DispatchLimits::default())
                .run()
                .await
                .unwrap();
            assert_eq!(result.attempted, k);
            assert_eq!(result.reports.len(), k);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_overflow_is_flagged() {
        let limits = DispatchLimits {
            page_size: 2,
            ..DispatchLimits::default()
        };
        let result = orchestrator(&["A", "B", "C"], ByNumber::new(&[]), limits)
            .run()
            .await
            .unwrap();

        assert_eq!(result.attempted, 2);
        assert!(result.truncated);
        assert_eq!(result.disposition_of("C"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_bounded() {
        let initiator = ByNumber::new(&[]);
        let limits = DispatchLimits {
            max_in_flight: 2,
            ..DispatchLimits::default()
        };
        let result = orchestrator(&["A", "B", "C", "D", "E"], initiator.clone(), limits)
            .run()
            .await
            .unwrap();

        assert_eq!(result.tally.started, 5);
        assert_eq!(initiator.peak.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_times_out_only_unfinished() {
        let initiator = ByNumber::new(&[
            ("slow", CallOutcome::RateLimited),
            ("dud", CallOutcome::NotStarted),
        ]);
        let limits = DispatchLimits {
            deadline: Some(Duration::from_secs(2)),
            ..DispatchLimits::default()
        };
        let result = orchestrator(&["fast", "slow", "dud"], initiator, limits)
            .run()
            .await
            .unwrap();

        assert_eq!(result.attempted, 3);
        assert_eq!(result.disposition_of("fast"), Some(Disposition::Started));
        assert_eq!(result.disposition_of("slow"), Some(Disposition::TimedOut));
        // 5 attempts of 50ms plus 100+100+200+300ms of backoff fit in 2s.
        assert_eq!(result.disposition_of("dud"), Some(Disposition::GaveUp));
        assert_eq!(result.tally.timed_out, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unrepresentable_deadline_means_no_deadline() {
        let limits = DispatchLimits {
            deadline: Some(Duration::from_secs(u64::MAX)),
            ..DispatchLimits::default()
        };
        let result = orchestrator(&["A", "B"], ByNumber::new(&[]), limits)
            .run()
            .await
            .unwrap();

        assert_eq!(result.tally.started, 2);
        assert_eq!(result.tally.timed_out, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_clamped_to_semaphore_limit() {
        let initiator = ByNumber::new(&[]);
        let limits = DispatchLimits {
            max_in_flight: usize::MAX,
            ..DispatchLimits::default()
        };
        let result = orchestrator(&["A", "B", "C"], initiator.clone(), limits)
            .run()
            .await
            .unwrap();

        assert_eq!(result.tally.started, 3);
        assert_eq!(initiator.peak.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_store_failure_is_fatal() {
        let store = crate::broadcast::contacts::FileContactStore::new("/nonexistent/contacts.json");
        let orchestrator = Orchestrator::new(
            Arc::new(store),
            BackoffController::new(ByNumber::new(&[]), policy()),
            DispatchLimits::default(),
        );

        assert!(matches!(orchestrator.run().await, Err(BroadcastError::Contacts(_))));
    }
}

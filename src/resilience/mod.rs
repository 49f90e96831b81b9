//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! one contact's attempt chain:
//!     → retries.rs (RetryPolicy maps each CallOutcome to retry/stop)
//!     → backoff.rs (exponential for rate limits, Fibonacci for not-started)
//!     → terminal Disposition
//! ```
//!
//! # Design Decisions
//! - One policy evaluated in one loop, no nested retry wrappers
//! - Backoff sleeps are cooperative; other contacts keep going
//! - An optional deadline ends any chain still in flight

pub mod backoff;
pub mod retries;

pub use retries::{
    BackoffController, BackoffKind, ChainReport, Disposition, RetryAction, RetryCounters,
    RetryPolicy,
};

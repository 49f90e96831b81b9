//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! initiator, retries, orchestrator, webhook produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (counters)
//!
//! Consumers:
//!     → stdout
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```

pub mod logging;
pub mod metrics;

pub use logging::init_tracing;

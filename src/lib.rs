//! Voice broadcast dispatcher library.
//!
//! Places outbound calls to every contact in a batch through the provider's
//! call API, backing off on rate limits and calls that fail to start, and
//! receives the provider's call status callbacks.

pub mod broadcast;
pub mod calls;
pub mod config;
pub mod credentials;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod webhook;

pub use broadcast::{BroadcastResult, Orchestrator};
pub use calls::{CallInitiator, CallOutcome, HttpCallInitiator};
pub use config::BroadcastConfig;
pub use credentials::CredentialSigner;
pub use lifecycle::Shutdown;
pub use resilience::{BackoffController, Disposition, RetryPolicy};
pub use webhook::WebhookServer;

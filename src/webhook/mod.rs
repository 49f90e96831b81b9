//! Provider callback receiver.
//!
//! # Data Flow
//! ```text
//! provider
//!     → GET|POST /        → talk instructions for the answered call
//!     → POST /events      → events.rs (status → severity) → log + echo
//! ```
//!
//! Independent of the dispatcher; nothing here feeds back into a broadcast.

pub mod events;
pub mod server;

pub use events::{CallStatus, Severity};
pub use server::WebhookServer;

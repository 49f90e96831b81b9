//! Broadcast orchestration.
//!
//! # Data Flow
//! ```text
//! contacts.rs (ContactStore, capped read)
//!     → orchestrator.rs (one task per contact, semaphore-bounded)
//!     → resilience::BackoffController (per-contact attempt chain)
//!     → join barrier → BroadcastResult
//! ```

pub mod contacts;
pub mod orchestrator;

pub use contacts::{Contact, ContactStore, ContactStoreError, FileContactStore, StaticContactStore};
pub use orchestrator::{
    BroadcastError, BroadcastResult, DispatchLimits, DispositionTally, Orchestrator,
};

//! Outbound call plumbing.
//!
//! # Data Flow
//! ```text
//! destination number
//!     → initiator.rs (sign token, one POST per attempt)
//!     → request.rs (CallRequest + JSON payload, rebuilt per attempt)
//!     → provider /v1/calls
//!     → outcome.rs (status/body → CallOutcome)
//! ```

pub mod initiator;
pub mod outcome;
pub mod request;

pub use initiator::{build_client, client_builder, CallInitiator, HttpCallInitiator};
pub use outcome::{CallError, CallOutcome};
pub use request::{CallPayload, CallRequest, Endpoint, RequestHeaders};

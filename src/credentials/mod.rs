//! Provider credentials.
//!
//! # Data Flow
//! ```text
//! private key file (PEM, read once at startup)
//!     → signer.rs (CredentialSigner, shared via Arc)
//!     → SignedToken per call attempt (60s, unique nonce)
//! ```

pub mod signer;

pub use signer::{Claims, CredentialSigner, SignedToken, SigningError, TOKEN_TTL_SECS};

//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, environment overrides)
//!     → validation.rs (semantic checks)
//!     → BroadcastConfig (validated, immutable)
//!     → passed by reference to signer, initiator, orchestrator, webhook
//! ```
//!
//! # Design Decisions
//! - Config is built once at startup; nothing reads the environment later
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError, LoadedConfig};
pub use schema::BroadcastConfig;
pub use schema::{
    ContactsConfig, DispatchConfig, ObservabilityConfig, ProviderConfig, RetryConfig,
    WebhookConfig,
};
pub use validation::{validate_config, validate_webhook, ValidationError};

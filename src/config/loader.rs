//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::BroadcastConfig;
use crate::config::validation::ValidationError;

/// Environment variable overriding `provider.application_id`.
pub const APPLICATION_ID_ENV_VAR: &str = "BROADCAST_APPLICATION_ID";
/// Environment variable overriding `provider.number_from`.
pub const NUMBER_FROM_ENV_VAR: &str = "BROADCAST_NUMBER_FROM";
/// Environment variable overriding `provider.private_key_path`.
pub const PRIVATE_KEY_ENV_VAR: &str = "BROADCAST_PRIVATE_KEY";
/// Environment variable overriding `provider.answer_url`.
pub const ANSWER_URL_ENV_VAR: &str = "BROADCAST_ANSWER_URL";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// A loaded configuration and the environment variables that changed it.
///
/// Loading happens before the subscriber exists, so the overrides are handed
/// back for the caller to log once tracing is up.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: BroadcastConfig,
    pub env_overrides: Vec<&'static str>,
}

/// Load configuration from an optional TOML file, then apply environment overrides.
///
/// Without a file every section takes its defaults. Semantic validation is left
/// to the caller since the broadcast and the webhook need different settings.
pub fn load_config(path: Option<&Path>) -> Result<LoadedConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => BroadcastConfig::default(),
    };

    let env_overrides = apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(LoadedConfig {
        config,
        env_overrides,
    })
}

/// Overlay values found through `lookup` onto the provider section.
///
/// Returns the keys that were applied, in lookup order.
pub fn apply_env_overrides<F>(config: &mut BroadcastConfig, lookup: F) -> Vec<&'static str>
where
    F: Fn(&str) -> Option<String>,
{
    let provider = &mut config.provider;
    let overrides = [
        (APPLICATION_ID_ENV_VAR, &mut provider.application_id),
        (NUMBER_FROM_ENV_VAR, &mut provider.number_from),
        (PRIVATE_KEY_ENV_VAR, &mut provider.private_key_path),
        (ANSWER_URL_ENV_VAR, &mut provider.answer_url),
    ];

    let mut applied = Vec::new();
    for (key, field) in overrides {
        if let Some(value) = lookup(key).filter(|v| !v.trim().is_empty()) {
            *field = value;
            applied.push(key);
        }
    }
    applied
}

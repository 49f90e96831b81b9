//! Voice broadcast dispatcher.
//!
//! # Architecture Overview
//!
//! ```text
//!   broadcast ──▶ Orchestrator ──▶ BackoffController ──▶ HttpCallInitiator ──▶ provider
//!                  (contacts,        (rate limit: expo,     (CredentialSigner,     POST /v1/calls
//!                   fan-out, join)    not started: fibo)     CallRequest)
//!
//!   call [n]  ──▶ BackoffController ──▶ HttpCallInitiator ──▶ provider
//!
//!   serve     ──▶ WebhookServer  ◀── provider callbacks (/ and /events)
//! ```

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::net::TcpListener;

use voice_broadcast::broadcast::{ContactStore, DispatchLimits, FileContactStore, Orchestrator};
use voice_broadcast::calls::{build_client, HttpCallInitiator};
use voice_broadcast::config::{
    load_config, validate_config, validate_webhook, BroadcastConfig, ConfigError, LoadedConfig,
};
use voice_broadcast::credentials::CredentialSigner;
use voice_broadcast::lifecycle::{spawn_signal_listener, Shutdown};
use voice_broadcast::observability::{init_tracing, metrics};
use voice_broadcast::resilience::{BackoffController, RetryPolicy};
use voice_broadcast::webhook::WebhookServer;

#[derive(Parser)]
#[command(name = "voice-broadcast", version)]
#[command(about = "Ring every contact through the provider's voice API", long_about = None)]
struct Cli {
    /// TOML configuration file; defaults and environment apply without one.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Call every contact in the store
    Broadcast {
        /// Contacts file, overriding `contacts.path`
        #[arg(long)]
        contacts: Option<PathBuf>,
    },
    /// Call a single number, or the first stored contact
    Call { number: Option<String> },
    /// Run the answer/event webhook receiver
    Serve {
        /// Bind address, overriding `webhook.bind_address`
        #[arg(long)]
        bind: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let LoadedConfig {
        mut config,
        env_overrides,
    } = load_config(cli.config.as_deref())?;

    init_tracing(&config.observability.log_level);
    tracing::info!("voice-broadcast v{} starting", env!("CARGO_PKG_VERSION"));
    for key in env_overrides {
        tracing::debug!(env = key, "Configuration overridden from environment");
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    match cli.command {
        Commands::Broadcast { contacts } => {
            if let Some(path) = contacts {
                config.contacts.path = path.display().to_string();
            }
            validate_config(&config).map_err(ConfigError::Validation)?;

            let controller = build_controller(&config)?;
            let store = FileContactStore::new(&config.contacts.path);
            let orchestrator = Orchestrator::new(
                Arc::new(store),
                controller,
                DispatchLimits::from_config(&config),
            );

            let result = orchestrator.run().await?;
            tracing::info!(
                attempted = result.attempted,
                started = result.tally.started,
                gave_up = result.tally.gave_up,
                transport_failed = result.tally.transport_failed,
                rejected = result.tally.rejected,
                timed_out = result.tally.timed_out,
                truncated = result.truncated,
                "Broadcast complete"
            );
        }
        Commands::Call { number } => {
            validate_config(&config).map_err(ConfigError::Validation)?;

            let number = match number {
                Some(number) => number,
                None => {
                    FileContactStore::new(&config.contacts.path)
                        .first()
                        .await?
                        .ok_or("Contact store is empty")?
                        .number
                }
            };
            let report = build_controller(&config)?.dispatch(&number).await;
            tracing::info!(
                to = %report.destination,
                attempts = report.attempts,
                disposition = %report.disposition,
                "Call finished"
            );
        }
        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                config.webhook.bind_address = bind;
            }
            validate_webhook(&config).map_err(ConfigError::Validation)?;

            let listener = TcpListener::bind(&config.webhook.bind_address).await?;
            let shutdown = Arc::new(Shutdown::new());
            let server_shutdown = shutdown.subscribe();
            spawn_signal_listener(shutdown.clone());

            WebhookServer::new(config.webhook.clone())
                .run(listener, server_shutdown)
                .await?;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Load the key once and wire signer → initiator → controller.
fn build_controller(config: &BroadcastConfig) -> Result<BackoffController, Box<dyn std::error::Error>> {
    let signer = CredentialSigner::from_key_file(
        config.provider.application_id.clone(),
        Path::new(&config.provider.private_key_path),
    )?;
    let client = build_client(&config.provider)?;
    let initiator = HttpCallInitiator::new(client, Arc::new(signer), &config.provider);

    tracing::info!(
        calls_url = %initiator.calls_url(),
        from = %config.provider.number_from,
        "Call initiator ready"
    );

    Ok(BackoffController::new(
        Arc::new(initiator),
        RetryPolicy::from_config(&config.retries),
    ))
}

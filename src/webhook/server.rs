//! Webhook HTTP server.
//!
//! # Responsibilities
//! - Answer calls with talk instructions (`/`)
//! - Classify call status events into log severities (`/events`)
//! - Echo every event back with 200, whatever its shape

use axum::{
    body::Bytes,
    extract::State,
    response::{IntoResponse, Json},
    routing::{any, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::WebhookConfig;
use crate::observability::metrics;
use crate::webhook::events::{event_status, log_event};

/// State injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub answer_text: Arc<str>,
}

/// HTTP server receiving provider callbacks.
pub struct WebhookServer {
    router: Router,
    config: WebhookConfig,
}

impl WebhookServer {
    pub fn new(config: WebhookConfig) -> Self {
        let state = AppState {
            answer_text: Arc::from(config.answer_text.as_str()),
        };
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &WebhookConfig, state: AppState) -> Router {
        Router::new()
            .route("/", any(answer_handler))
            .route("/events", post(events_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
            .layer(TraceLayer::new_for_http())
    }

    pub fn config(&self) -> &WebhookConfig {
        &self.config
    }

    /// Serve on `listener` until the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Webhook server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("Webhook server stopped");
        Ok(())
    }
}

async fn answer_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!([{
        "action": "talk",
        "text": &*state.answer_text,
    }]))
}

async fn events_handler(body: Bytes) -> impl IntoResponse {
    let (severity, echo) = match serde_json::from_slice::<Value>(&body) {
        Ok(payload) => (log_event(event_status(&payload)), payload.to_string()),
        Err(e) => {
            tracing::debug!(error = %e, "Event body is not JSON");
            (log_event(None), String::from_utf8_lossy(&body).into_owned())
        }
    };
    metrics::record_webhook_event(severity);

    format!("POST request - {}", echo)
}

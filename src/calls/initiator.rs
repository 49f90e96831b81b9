//! Single call attempts against the provider.
//!
//! # Responsibilities
//! - Sign a fresh token and build the request for every attempt
//! - Send exactly one `POST /v1/calls`
//! - Classify the response into a [`CallOutcome`]

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, USER_AGENT};
use reqwest::{Client, ClientBuilder};
use std::sync::Arc;
use std::time::Duration;

use crate::calls::outcome::{CallError, CallOutcome};
use crate::calls::request::CallRequest;
use crate::config::ProviderConfig;
use crate::credentials::CredentialSigner;
use crate::observability::metrics;

/// Issues one call attempt per invocation.
#[async_trait]
pub trait CallInitiator: Send + Sync {
    /// Perform exactly one attempt to call `destination`.
    async fn initiate(&self, destination: &str) -> Result<CallOutcome, CallError>;
}

/// Client builder carrying the provider timeout; callers may layer more on top.
pub fn client_builder(config: &ProviderConfig) -> ClientBuilder {
    Client::builder().timeout(Duration::from_secs(config.request_timeout_secs))
}

/// Build the HTTP client shared by every in-flight call.
pub fn build_client(config: &ProviderConfig) -> reqwest::Result<Client> {
    client_builder(config).build()
}

/// [`CallInitiator`] backed by the provider's HTTP API.
#[derive(Debug, Clone)]
pub struct HttpCallInitiator {
    client: Client,
    signer: Arc<CredentialSigner>,
    calls_url: String,
    number_from: String,
    answer_url: String,
    user_agent: String,
    started_marker: String,
}

impl HttpCallInitiator {
    pub fn new(client: Client, signer: Arc<CredentialSigner>, config: &ProviderConfig) -> Self {
        Self {
            client,
            signer,
            calls_url: format!("{}/v1/calls", config.api_base_url.trim_end_matches('/')),
            number_from: config.number_from.clone(),
            answer_url: config.answer_url.clone(),
            user_agent: config.user_agent.clone(),
            started_marker: config.started_marker.clone(),
        }
    }

    pub fn calls_url(&self) -> &str {
        &self.calls_url
    }
}

#[async_trait]
impl CallInitiator for HttpCallInitiator {
    async fn initiate(&self, destination: &str) -> Result<CallOutcome, CallError> {
        let token = self.signer.sign()?;
        let request = CallRequest::build(
            destination,
            &self.number_from,
            &self.answer_url,
            token,
            &self.user_agent,
        )?;

        tracing::info!(to = %request.to, nonce = %request.headers.token.nonce(), "Calling");

        let response = self
            .client
            .post(&self.calls_url)
            .header(AUTHORIZATION, request.headers.authorization())
            .header(USER_AGENT, &request.headers.user_agent)
            .json(&request.payload())
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(to = %request.to, error = %e, "Call request failed");
                metrics::record_call_attempt(CallOutcome::TransportError);
                return Ok(CallOutcome::TransportError);
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(to = %request.to, status = %status, error = %e, "Failed to read call response");
                metrics::record_call_attempt(CallOutcome::TransportError);
                return Ok(CallOutcome::TransportError);
            }
        };

        let outcome = CallOutcome::classify(status, &body, &self.started_marker);
        tracing::info!(
            to = %request.to,
            status = status.as_u16(),
            outcome = %outcome,
            "Call requested"
        );
        metrics::record_call_attempt(outcome);

        Ok(outcome)
    }
}

//! Provider request construction.

use serde::Serialize;

use crate::calls::outcome::CallError;
use crate::credentials::SignedToken;

/// One side of a call as the provider expects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Endpoint {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub number: String,
}

impl Endpoint {
    pub fn phone(number: impl Into<String>) -> Self {
        Self {
            kind: "phone",
            number: number.into(),
        }
    }
}

/// JSON body of `POST /v1/calls`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallPayload {
    pub to: Vec<Endpoint>,
    pub from: Endpoint,
    pub answer_url: Vec<String>,
}

/// Headers sent with one call request.
#[derive(Debug, Clone)]
pub struct RequestHeaders {
    pub token: SignedToken,
    pub user_agent: String,
}

impl RequestHeaders {
    pub fn authorization(&self) -> String {
        format!("Bearer {}", self.token.token)
    }
}

/// Everything needed to send one call attempt. Built fresh per attempt.
#[derive(Debug, Clone)]
pub struct CallRequest {
    pub to: String,
    pub from: String,
    pub answer_url: String,
    pub headers: RequestHeaders,
}

impl CallRequest {
    /// Assemble a request for `destination`. Fails only on an empty destination.
    pub fn build(
        destination: &str,
        origin: &str,
        answer_url: &str,
        token: SignedToken,
        user_agent: &str,
    ) -> Result<Self, CallError> {
        let destination = destination.trim();
        if destination.is_empty() {
            return Err(CallError::InvalidDestination(destination.to_string()));
        }

        Ok(Self {
            to: destination.to_string(),
            from: origin.to_string(),
            answer_url: answer_url.to_string(),
            headers: RequestHeaders {
                token,
                user_agent: user_agent.to_string(),
            },
        })
    }

    pub fn payload(&self) -> CallPayload {
        CallPayload {
            to: vec![Endpoint::phone(&self.to)],
            from: Endpoint::phone(&self.from),
            answer_url: vec![self.answer_url.clone()],
        }
    }
}

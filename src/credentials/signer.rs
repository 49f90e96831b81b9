//! Short-lived application tokens for call requests.
//!
//! # Security
//! - The private key is read once and kept as a parsed, shared signing key
//! - Keys are never logged or serialized
//! - Every token carries a fresh nonce and expires 60 seconds after issue

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use uuid::Uuid;

/// Lifetime of every signed token, in seconds.
pub const TOKEN_TTL_SECS: u64 = 60;

/// Errors produced while loading the key or signing a token.
#[derive(Debug, Error)]
pub enum SigningError {
    /// The key file could not be read.
    #[error("Private key unreadable at {path}: {source}")]
    KeyUnreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The key material is not a usable RSA private key.
    #[error("Invalid private key format: {0}")]
    MalformedKey(String),

    /// Encoding the token failed.
    #[error("Token encoding failed: {0}")]
    Encoding(String),
}

/// Claims carried by an application token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Issued-at, seconds since the Unix epoch.
    pub iat: u64,
    /// Expiry, always `iat + 60`.
    pub exp: u64,
    /// Unique token identifier (nonce).
    pub jti: String,
    /// Application the token is issued for.
    pub application_id: String,
}

/// A signed bearer token together with the claims it encodes.
#[derive(Debug, Clone)]
pub struct SignedToken {
    /// Compact JWS form, ready for an `Authorization: Bearer` header.
    pub token: String,
    pub claims: Claims,
}

impl SignedToken {
    pub fn issued_at(&self) -> u64 {
        self.claims.iat
    }

    pub fn expires_at(&self) -> u64 {
        self.claims.exp
    }

    pub fn nonce(&self) -> &str {
        &self.claims.jti
    }

    /// Application identifier the token is issued for.
    pub fn subject(&self) -> &str {
        &self.claims.application_id
    }
}

/// Signs RS256 application tokens with a key loaded once at startup.
#[derive(Clone)]
pub struct CredentialSigner {
    application_id: String,
    key: Arc<EncodingKey>,
}

impl CredentialSigner {
    /// Build a signer from PEM-encoded RSA key bytes.
    pub fn from_pem(application_id: impl Into<String>, pem: &[u8]) -> Result<Self, SigningError> {
        let key = EncodingKey::from_rsa_pem(pem)
            .map_err(|e| SigningError::MalformedKey(e.to_string()))?;

        let application_id = application_id.into();
        tracing::info!(application_id = %application_id, "Credential signer initialized");

        Ok(Self {
            application_id,
            key: Arc::new(key),
        })
    }

    /// Read the key file once and build a signer from it.
    pub fn from_key_file(
        application_id: impl Into<String>,
        path: &Path,
    ) -> Result<Self, SigningError> {
        let pem = std::fs::read(path).map_err(|source| SigningError::KeyUnreadable {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_pem(application_id, &pem)
    }

    pub fn application_id(&self) -> &str {
        &self.application_id
    }

    /// Sign a new token valid for [`TOKEN_TTL_SECS`] from now.
    pub fn sign(&self) -> Result<SignedToken, SigningError> {
        let iat = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        self.sign_at(iat)
    }

    /// Sign a token issued at `iat` (seconds since the Unix epoch).
    pub fn sign_at(&self, iat: u64) -> Result<SignedToken, SigningError> {
        let claims = Claims {
            iat,
            exp: iat + TOKEN_TTL_SECS,
            jti: Uuid::new_v4().to_string(),
            application_id: self.application_id.clone(),
        };

        let token = encode(&Header::new(Algorithm::RS256), &claims, &self.key)
            .map_err(|e| SigningError::Encoding(e.to_string()))?;

        Ok(SignedToken { token, claims })
    }
}

impl std::fmt::Debug for CredentialSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialSigner")
            .field("application_id", &self.application_id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, DecodingKey, Validation};

    const TEST_PRIVATE_KEY: &str = include_str!("../../tests/fixtures/test_key.pem");
    const TEST_PUBLIC_KEY: &str = include_str!("../../tests/fixtures/test_key.pub.pem");

    fn signer() -> CredentialSigner {
        CredentialSigner::from_pem("app-123", TEST_PRIVATE_KEY.as_bytes()).unwrap()
    }

    #[test]
    fn test_token_expires_sixty_seconds_after_issue() {
        let token = signer().sign_at(1_700_000_000).unwrap();
        assert_eq!(token.issued_at(), 1_700_000_000);
        assert_eq!(token.expires_at(), 1_700_000_060);
        assert_eq!(token.subject(), "app-123");
    }

    #[test]
    fn test_token_verifies_with_public_key() {
        let token = signer().sign().unwrap();

        let key = DecodingKey::from_rsa_pem(TEST_PUBLIC_KEY.as_bytes()).unwrap();
        let decoded = decode::<Claims>(&token.token, &key, &Validation::new(Algorithm::RS256))
            .unwrap();

        assert_eq!(decoded.claims, token.claims);
        assert_eq!(decoded.header.alg, Algorithm::RS256);
    }

    #[test]
    fn test_same_instant_tokens_have_distinct_nonces() {
        let signer = signer();
        let a = signer.sign_at(1_700_000_000).unwrap();
        let b = signer.sign_at(1_700_000_000).unwrap();

        assert_eq!(a.issued_at(), b.issued_at());
        assert_ne!(a.nonce(), b.nonce());
        assert_ne!(a.token, b.token);
    }

    #[test]
    fn test_malformed_key_rejected() {
        let err = CredentialSigner::from_pem("app", b"not a key").unwrap_err();
        assert!(matches!(err, SigningError::MalformedKey(_)));
    }

    #[test]
    fn test_missing_key_file() {
        let err = CredentialSigner::from_key_file("app", Path::new("/nonexistent/broadcast.key"))
            .unwrap_err();
        assert!(matches!(err, SigningError::KeyUnreadable { .. }));
        assert!(err.to_string().contains("/nonexistent/broadcast.key"));
    }
}

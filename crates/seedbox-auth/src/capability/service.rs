//! Issuing and verifying capability tokens.
//!
//! Tokens are HS256 JWTs. Expiry is checked against the caller-supplied
//! clock with zero leeway so the TTL boundary is exact.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::debug;

use seedbox_core::config::AuthConfig;
use seedbox_core::error::AppError;
use seedbox_core::result::AppResult;

use super::payload::{CapabilityClaims, CapabilityPayload};

/// A freshly signed capability token.
#[derive(Debug, Clone)]
pub struct IssuedCapability {
    /// The bearer token.
    pub token: String,
    /// When it stops verifying.
    pub expires_at: DateTime<Utc>,
}

/// A token that passed signature and expiry checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedCapability {
    /// What the token grants.
    pub payload: CapabilityPayload,
    /// When the token was signed.
    pub issued_at: DateTime<Utc>,
    /// When it stops verifying.
    pub expires_at: DateTime<Utc>,
}

impl std::ops::Deref for VerifiedCapability {
    type Target = CapabilityPayload;

    fn deref(&self) -> &Self::Target {
        &self.payload
    }
}

/// Signs and verifies capability tokens with one HMAC key.
#[derive(Clone)]
pub struct CapabilityTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    default_ttl_seconds: u64,
}

impl std::fmt::Debug for CapabilityTokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityTokenService")
            .field("default_ttl_seconds", &self.default_ttl_seconds)
            .finish()
    }
}

impl CapabilityTokenService {
    /// Build the service from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self::with_secret(config.effective_link_secret(), config.link_ttl_seconds)
    }

    /// Build the service from a raw secret.
    pub fn with_secret(secret: &str, default_ttl_seconds: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            default_ttl_seconds,
        }
    }

    /// Configured link lifetime in seconds.
    pub fn default_ttl_seconds(&self) -> u64 {
        self.default_ttl_seconds
    }

    /// Sign `payload` valid for `ttl_seconds` from now.
    pub fn issue(&self, payload: &CapabilityPayload, ttl_seconds: u64) -> AppResult<IssuedCapability> {
        self.issue_at(payload, ttl_seconds, Utc::now().timestamp())
    }

    /// Sign `payload` valid for `ttl_seconds` from `now` (unix seconds).
    pub fn issue_at(
        &self,
        payload: &CapabilityPayload,
        ttl_seconds: u64,
        now: i64,
    ) -> AppResult<IssuedCapability> {
        let ttl = i64::try_from(ttl_seconds)
            .map_err(|_| AppError::validation("Capability TTL is too large"))?;
        let expires_at = now.saturating_add(ttl);
        let claims = CapabilityClaims::new(payload, now, expires_at);

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to sign capability token: {e}")))?;

        Ok(IssuedCapability {
            token,
            expires_at: DateTime::from_timestamp(expires_at, 0).unwrap_or_else(Utc::now),
        })
    }

    /// Verify `token` against the current time.
    pub fn verify(&self, token: &str) -> AppResult<VerifiedCapability> {
        self.verify_at(token, Utc::now().timestamp())
    }

    /// Verify `token` against `now` (unix seconds).
    pub fn verify_at(&self, token: &str, now: i64) -> AppResult<VerifiedCapability> {
        let claims = decode::<CapabilityClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    AppError::token_expired("Link has expired")
                }
                _ => {
                    debug!(error = %e, "Capability token rejected");
                    AppError::token_invalid("Invalid link")
                }
            })?
            .claims;

        if now >= claims.exp {
            return Err(AppError::token_expired("Link has expired"));
        }

        let issued_at = timestamp(claims.iat)?;
        let expires_at = timestamp(claims.exp)?;
        Ok(VerifiedCapability {
            payload: claims.into_payload(),
            issued_at,
            expires_at,
        })
    }
}

fn timestamp(secs: i64) -> AppResult<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0).ok_or_else(|| AppError::token_invalid("Invalid link"))
}

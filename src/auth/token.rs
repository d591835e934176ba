//! Self-describing HMAC-signed bearer tokens.
//!
//! Format: `base64url(json(claims)) "." hex(HMAC-SHA256(payload_segment, secret))`.
//! The scheme is private to this service; there is no header and no
//! algorithm negotiation.

use super::credentials::constant_time_eq;
use super::AuthError;
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde_json::{Map, Value};
use sha2::Sha256;
use tracing::debug;

type HmacSha256 = Hmac<Sha256>;

/// Default token lifetime
pub const DEFAULT_TOKEN_LIFETIME_MINUTES: i64 = 30;

/// Claims of a validated token
#[derive(Debug, Clone, PartialEq)]
pub struct TokenClaims {
    /// Subject identity (`sub`)
    pub subject: String,
    /// Absolute expiry (`exp`)
    pub expires_at: DateTime<Utc>,
    /// Every claim, including `sub` and `exp`
    pub claims: Map<String, Value>,
}

/// Issues and validates signed tokens with a server-held secret
#[derive(Clone)]
pub struct TokenSigner {
    secret: Vec<u8>,
    default_lifetime: Duration,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("secret", &"<redacted>")
            .field("default_lifetime", &self.default_lifetime)
            .finish()
    }
}

impl TokenSigner {
    /// Create a signer with the default 30 minute lifetime
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
            default_lifetime: Duration::minutes(DEFAULT_TOKEN_LIFETIME_MINUTES),
        }
    }

    /// Override the lifetime used when none is requested
    pub fn with_default_lifetime(mut self, lifetime: Duration) -> Self {
        self.default_lifetime = lifetime;
        self
    }

    pub fn default_lifetime(&self) -> Duration {
        self.default_lifetime
    }

    fn mac(&self) -> HmacSha256 {
        HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts any key length")
    }

    fn sign(&self, payload_segment: &str) -> String {
        let mut mac = self.mac();
        mac.update(payload_segment.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Issue a token for `subject` expiring after `lifetime` (or the default)
    pub fn issue(&self, subject: &str, claims: Map<String, Value>, lifetime: Option<Duration>) -> String {
        self.issue_at(subject, claims, lifetime, Utc::now())
    }

    /// Issue a token as of `now`.
    ///
    /// `sub` and `exp` always override same-named entries in `claims`.
    pub fn issue_at(
        &self,
        subject: &str,
        mut claims: Map<String, Value>,
        lifetime: Option<Duration>,
        now: DateTime<Utc>,
    ) -> String {
        let expires_at = now + lifetime.unwrap_or(self.default_lifetime);
        claims.insert("sub".to_string(), Value::from(subject));
        claims.insert("exp".to_string(), Value::from(expires_at.timestamp()));

        // serde_json's Map is ordered by key, so the encoding is deterministic
        let json = Value::Object(claims).to_string();
        let payload_segment = URL_SAFE.encode(json.as_bytes());
        let signature = self.sign(&payload_segment);

        format!("{}.{}", payload_segment, signature)
    }

    /// Validate a token against the current clock
    pub fn validate(&self, token: &str) -> Result<TokenClaims, AuthError> {
        self.validate_at(token, Utc::now())
    }

    /// Validate a token as of `now`.
    ///
    /// Every failure maps to [`AuthError::InvalidCredentials`]; the reason is
    /// only logged at debug level.
    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, AuthError> {
        self.check(token, now).map_err(|reason| {
            debug!(reason, "Token rejected");
            AuthError::InvalidCredentials
        })
    }

    fn check(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, &'static str> {
        let mut parts = token.split('.');
        let (Some(payload_segment), Some(signature_hex), None) = (parts.next(), parts.next(), parts.next())
        else {
            return Err("separator count");
        };

        // compared as text: a case-changed hex digit is a different token
        if !constant_time_eq(self.sign(payload_segment).as_bytes(), signature_hex.as_bytes()) {
            return Err("signature mismatch");
        }

        let payload = URL_SAFE.decode(payload_segment).map_err(|_| "payload encoding")?;
        let claims: Map<String, Value> =
            serde_json::from_slice(&payload).map_err(|_| "claim structure")?;

        let subject = claims
            .get("sub")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .ok_or("missing subject")?
            .to_string();

        let exp = claims.get("exp").and_then(Value::as_i64).ok_or("missing expiry")?;
        let expires_at = DateTime::<Utc>::from_timestamp(exp, 0).ok_or("expiry out of range")?;

        // The expiry instant itself is already outside the validity window
        if now >= expires_at {
            return Err("expired");
        }

        Ok(TokenClaims {
            subject,
            expires_at,
            claims,
        })
    }
}

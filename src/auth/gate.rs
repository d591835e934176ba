//! "Who is calling, if anyone" for the serving layer

use super::credentials::{constant_time_eq, verify_password, CredentialStore};
use super::token::TokenSigner;
use super::AuthError;
use crate::config::AuthConfig;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Identity name used for callers authenticated by API key
pub const API_KEY_USER: &str = "api_key_user";

/// How a caller proved its identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    BearerToken,
    ApiKey,
}

/// Authenticated caller
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub username: String,
    pub method: AuthMethod,
    /// Token claims, for bearer-token callers
    pub claims: Option<Map<String, Value>>,
}

/// Outcome of checking whatever credentials a request carried
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Authenticated(Identity),
    Unauthenticated {
        /// A token or key was sent but did not validate
        credentials_presented: bool,
    },
}

/// Login response body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
    /// Lifetime in seconds
    pub expires_in: i64,
}

/// Composes token validation, the static API key and the credential store.
///
/// Holds only read-only state; clone it freely across request tasks.
#[derive(Clone)]
pub struct AuthorizationGate {
    signer: TokenSigner,
    api_key_enabled: bool,
    api_key: Option<String>,
    store: Arc<dyn CredentialStore>,
}

impl AuthorizationGate {
    pub fn new(
        signer: TokenSigner,
        api_key_enabled: bool,
        api_key: Option<String>,
        store: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            signer,
            api_key_enabled,
            api_key: api_key.filter(|k| !k.is_empty()),
            store,
        }
    }

    /// Gate configured from the auth section
    pub fn from_config(config: &AuthConfig, store: Arc<dyn CredentialStore>) -> Self {
        let signer = TokenSigner::new(&config.secret_key)
            .with_default_lifetime(Duration::minutes(config.token_ttl_minutes));

        info!(
            token_ttl_minutes = config.token_ttl_minutes,
            api_key_enabled = config.api_key_enabled,
            api_key_configured = config.api_key.is_some(),
            "Authorization gate initialized"
        );

        Self::new(signer, config.api_key_enabled, config.api_key.clone(), store)
    }

    pub fn signer(&self) -> &TokenSigner {
        &self.signer
    }

    /// Check the presented credentials: bearer token first, then API key
    pub fn resolve(&self, bearer: Option<&str>, api_key: Option<&str>) -> Resolution {
        let bearer = bearer.filter(|t| !t.is_empty());
        let api_key = api_key.filter(|k| !k.is_empty());

        if let Some(token) = bearer {
            if let Ok(claims) = self.signer.validate(token) {
                return Resolution::Authenticated(Identity {
                    username: claims.subject,
                    method: AuthMethod::BearerToken,
                    claims: Some(claims.claims),
                });
            }
        }

        if let Some(key) = api_key {
            if self.api_key_matches(key) {
                return Resolution::Authenticated(Identity {
                    username: API_KEY_USER.to_string(),
                    method: AuthMethod::ApiKey,
                    claims: None,
                });
            }
        }

        Resolution::Unauthenticated {
            credentials_presented: bearer.is_some() || api_key.is_some(),
        }
    }

    fn api_key_matches(&self, presented: &str) -> bool {
        if !self.api_key_enabled {
            debug!("API key presented but API key auth is disabled");
            return false;
        }
        match &self.api_key {
            Some(expected) => constant_time_eq(presented.as_bytes(), expected.as_bytes()),
            None => false,
        }
    }

    /// Strict variant for protected endpoints
    pub fn require(&self, bearer: Option<&str>, api_key: Option<&str>) -> Result<Identity, AuthError> {
        match self.resolve(bearer, api_key) {
            Resolution::Authenticated(identity) => Ok(identity),
            Resolution::Unauthenticated {
                credentials_presented: false,
            } => Err(AuthError::NotAuthenticated),
            Resolution::Unauthenticated {
                credentials_presented: true,
            } => Err(AuthError::InvalidCredentials),
        }
    }

    /// Lenient variant: anonymous callers get `None`
    pub fn optional(&self, bearer: Option<&str>, api_key: Option<&str>) -> Option<Identity> {
        match self.resolve(bearer, api_key) {
            Resolution::Authenticated(identity) => Some(identity),
            Resolution::Unauthenticated { .. } => None,
        }
    }

    /// Exchange username and password for a bearer token
    pub fn login(&self, username: &str, password: &str) -> Result<AccessToken, AuthError> {
        let user = self
            .store
            .lookup(username)
            .filter(|u| verify_password(password, &u.hashed_password))
            .ok_or_else(|| {
                warn!("Login rejected");
                AuthError::InvalidCredentials
            })?;

        if user.disabled {
            warn!(username = %user.username, "Login by disabled user");
            return Err(AuthError::InactiveUser);
        }

        let lifetime = self.signer.default_lifetime();
        let access_token = self.signer.issue(&user.username, Map::new(), Some(lifetime));
        info!(username = %user.username, "Access token issued");

        Ok(AccessToken {
            access_token,
            token_type: "bearer".to_string(),
            expires_in: lifetime.num_seconds(),
        })
    }
}

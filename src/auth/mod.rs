//! Bearer-token and API-key authentication for the scoring service

pub mod credentials;
pub mod gate;
pub mod token;

pub use credentials::{CredentialStore, InMemoryCredentialStore, UserRecord};
pub use gate::{AccessToken, AuthMethod, AuthorizationGate, Identity, Resolution};
pub use token::{TokenClaims, TokenSigner};

/// Authentication failures surfaced to clients.
///
/// A rejected token never says whether it was expired or tampered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// No credential was presented at all
    #[error("Not authenticated")]
    NotAuthenticated,

    /// A credential was presented and did not validate
    #[error("Could not validate credentials")]
    InvalidCredentials,

    /// Credentials were right but the account is disabled
    #[error("Inactive user")]
    InactiveUser,
}

impl AuthError {
    /// Machine-readable kind for response bodies
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::NotAuthenticated => "missing_credentials",
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::InactiveUser => "inactive_user",
        }
    }

    /// HTTP status the serving layer should answer with
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::NotAuthenticated => 403,
            AuthError::InvalidCredentials => 401,
            AuthError::InactiveUser => 400,
        }
    }

    /// `WWW-Authenticate` challenge, where one applies
    pub fn www_authenticate(&self) -> Option<&'static str> {
        match self {
            AuthError::NotAuthenticated | AuthError::InvalidCredentials => Some("Bearer"),
            AuthError::InactiveUser => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_mapping() {
        assert_eq!(AuthError::NotAuthenticated.status_code(), 403);
        assert_eq!(AuthError::InvalidCredentials.status_code(), 401);
        assert_eq!(AuthError::InactiveUser.status_code(), 400);
        assert_eq!(AuthError::InvalidCredentials.www_authenticate(), Some("Bearer"));
        assert_ne!(
            AuthError::NotAuthenticated.kind(),
            AuthError::InvalidCredentials.kind()
        );
    }
}

//! Username/password lookup

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Stored account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub username: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Hex SHA-256 of the password
    pub hashed_password: String,
    #[serde(default)]
    pub disabled: bool,
}

/// Read-only account lookup, initialised once at startup
pub trait CredentialStore: Send + Sync {
    fn lookup(&self, username: &str) -> Option<UserRecord>;
}

/// Hex SHA-256 of a password
pub fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

/// Compare a plaintext password against a stored hash
pub fn verify_password(plain: &str, hashed: &str) -> bool {
    constant_time_eq(hash_password(plain).as_bytes(), hashed.as_bytes())
}

/// Byte equality that inspects every byte of equal-length inputs
pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Credential store backed by a map
#[derive(Debug, Clone, Default)]
pub struct InMemoryCredentialStore {
    users: HashMap<String, UserRecord>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a user, hashing the plaintext password
    pub fn with_user(mut self, username: &str, password: &str) -> Self {
        self.insert(UserRecord {
            username: username.to_string(),
            full_name: None,
            email: None,
            hashed_password: hash_password(password),
            disabled: false,
        });
        self
    }

    pub fn insert(&mut self, record: UserRecord) {
        self.users.insert(record.username.clone(), record);
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl FromIterator<UserRecord> for InMemoryCredentialStore {
    fn from_iter<I: IntoIterator<Item = UserRecord>>(iter: I) -> Self {
        let mut store = Self::new();
        for record in iter {
            store.insert(record);
        }
        store
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn lookup(&self, username: &str) -> Option<UserRecord> {
        self.users.get(username).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_hex_sha256() {
        assert_eq!(
            hash_password("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_verify_password() {
        let hashed = hash_password("admin123");
        assert!(verify_password("admin123", &hashed));
        assert!(!verify_password("admin124", &hashed));
        assert!(!verify_password("admin123", "short"));
    }

    #[test]
    fn test_lookup() {
        let store = InMemoryCredentialStore::new().with_user("admin", "admin123");
        assert_eq!(store.len(), 1);
        assert!(store.lookup("admin").is_some());
        assert!(store.lookup("nobody").is_none());
    }
}

//! Credential verification
//!
//! The auth store asks a [`CredentialVerifier`] for a token/user pair.
//! [`SharedSecretVerifier`] accepts any username with one fixed secret; it
//! stands in for a real identity provider and makes no security promise.

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::types::{AuthError, Grant, User};

/// Credential check collaborator
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn authenticate(&self, username: &str, credential: &str) -> Result<Grant, AuthError>;
}

/// Accepts any username, stored exactly as given, together with a single shared secret
#[derive(Debug, Clone)]
pub struct SharedSecretVerifier {
    secret: String,
}

impl SharedSecretVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }
}

impl Default for SharedSecretVerifier {
    fn default() -> Self {
        Self::new("test123")
    }
}

#[async_trait]
impl CredentialVerifier for SharedSecretVerifier {
    async fn authenticate(&self, username: &str, credential: &str) -> Result<Grant, AuthError> {
        if credential != self.secret {
            return Err(AuthError::InvalidCredential);
        }

        Ok(Grant {
            token: format!(
                "session-{}-{}",
                Utc::now().timestamp_millis(),
                Uuid::new_v4().simple()
            ),
            user: User {
                id: format!("local-{}", username),
                username: username.to_string(),
                email: format!("{}@example.com", username),
                display_name: username.to_string(),
            },
        })
    }
}

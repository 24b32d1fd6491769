//! Auth session types and the state reducer

use serde::{Deserialize, Serialize};

use super::storage::StorageError;

/// Storage key of the session token
pub const TOKEN_KEY: &str = "authToken";

/// Storage key of the serialized user record
pub const USER_KEY: &str = "user";

/// Logged-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(alias = "name")]
    pub display_name: String,
}

/// Token and user issued by a successful credential check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grant {
    pub token: String,
    pub user: User,
}

/// Snapshot of the authentication state
///
/// `user` and `token` are only ever set or cleared together, through [`AuthSession::reduce`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    user: Option<User>,
    token: Option<String>,
    is_loading: bool,
}

/// State transitions of the auth store
#[derive(Debug, Clone)]
pub enum AuthAction {
    RestoreSession(Grant),
    LoginSuccess(Grant),
    Logout,
    SetLoading(bool),
}

impl AuthSession {
    /// Initial state: unknown until restore completes
    pub fn loading() -> Self {
        Self {
            user: None,
            token: None,
            is_loading: true,
        }
    }

    pub fn reduce(self, action: AuthAction) -> Self {
        match action {
            AuthAction::RestoreSession(grant) | AuthAction::LoginSuccess(grant) => Self {
                user: Some(grant.user),
                token: Some(grant.token),
                is_loading: false,
            },
            AuthAction::Logout => Self {
                user: None,
                token: None,
                is_loading: false,
            },
            AuthAction::SetLoading(is_loading) => Self { is_loading, ..self },
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.user.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

impl Default for AuthSession {
    fn default() -> Self {
        Self::loading()
    }
}

/// Auth error types
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid username or password")]
    InvalidCredential,

    #[error("Session storage error: {0}")]
    Storage(#[from] StorageError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grant() -> Grant {
        Grant {
            token: "tok".to_string(),
            user: User {
                id: "local-ana".to_string(),
                username: "ana".to_string(),
                email: "ana@example.com".to_string(),
                display_name: "ana".to_string(),
            },
        }
    }

    #[test]
    fn test_initial_state_is_loading() {
        let state = AuthSession::loading();
        assert!(state.is_loading());
        assert!(!state.is_authenticated());
    }

    #[test]
    fn test_login_and_logout_move_user_and_token_together() {
        let state = AuthSession::loading().reduce(AuthAction::LoginSuccess(grant()));
        assert!(state.is_authenticated());
        assert!(!state.is_loading());
        assert_eq!(state.token(), Some("tok"));

        let state = state.reduce(AuthAction::Logout);
        assert!(state.user().is_none());
        assert!(state.token().is_none());
        assert!(!state.is_loading());
    }

    #[test]
    fn test_set_loading_keeps_session() {
        let state = AuthSession::loading()
            .reduce(AuthAction::RestoreSession(grant()))
            .reduce(AuthAction::SetLoading(true));
        assert!(state.is_loading());
        assert!(state.is_authenticated());
    }

    #[test]
    fn test_user_record_format() {
        let json = serde_json::to_value(grant().user).unwrap();
        assert_eq!(json["displayName"], "ana");

        // Records written with a plain `name` field still load
        let user: User = serde_json::from_str(
            r#"{"id":"1","username":"bo","email":"bo@example.com","name":"bo"}"#,
        )
        .unwrap();
        assert_eq!(user.display_name, "bo");
    }
}

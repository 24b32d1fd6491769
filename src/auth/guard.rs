//! Protected-route gate

use super::types::AuthSession;

/// What a protected view should do for the current session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Session restore or login still in flight; show a wait indicator
    Wait,
    /// Authenticated; proceed
    Allow,
    /// Not authenticated; send the user to the login view
    RedirectToLogin,
}

/// Gate for views that require a logged-in user
#[derive(Debug, Default, Clone, Copy)]
pub struct RouteGate;

impl RouteGate {
    pub fn decide(session: &AuthSession) -> GateDecision {
        if session.is_loading() {
            GateDecision::Wait
        } else if session.is_authenticated() {
            GateDecision::Allow
        } else {
            GateDecision::RedirectToLogin
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::types::{AuthAction, Grant, User};

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
    fn test_gate_waits_while_loading() {
        assert_eq!(RouteGate::decide(&AuthSession::loading()), GateDecision::Wait);

        // Even an authenticated session waits while a new login is in flight
        let relogin = AuthSession::loading()
            .reduce(AuthAction::LoginSuccess(grant()))
            .reduce(AuthAction::SetLoading(true));
        assert_eq!(RouteGate::decide(&relogin), GateDecision::Wait);
    }

    #[test]
    fn test_gate_after_settling() {
        let authenticated = AuthSession::loading().reduce(AuthAction::RestoreSession(grant()));
        assert_eq!(RouteGate::decide(&authenticated), GateDecision::Allow);

        let anonymous = authenticated.reduce(AuthAction::Logout);
        assert_eq!(RouteGate::decide(&anonymous), GateDecision::RedirectToLogin);
    }
}

//! Auth Session Store
//!
//! Single source of truth for the logged-in user:
//! - Restores `(token, user)` from storage on init, without re-validating the token
//! - Persists the session on login and clears it on logout
//! - Publishes every state change on a watch channel

use std::sync::Arc;

use tokio::sync::{watch, Mutex};

use super::storage::{SessionStorage, StorageError};
use super::types::{AuthAction, AuthError, AuthSession, Grant, User, TOKEN_KEY, USER_KEY};
use super::verifier::CredentialVerifier;

/// Owns the authentication state and the persisted session
#[derive(Clone)]
pub struct AuthSessionStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    state: watch::Sender<AuthSession>,
    storage: Arc<dyn SessionStorage>,
    verifier: Arc<dyn CredentialVerifier>,

    /// Serializes restore/login/logout
    op_lock: Mutex<()>,
}

impl AuthSessionStore {
    /// Create the store in the loading state; call [`restore`](Self::restore) next
    pub fn new(storage: Arc<dyn SessionStorage>, verifier: Arc<dyn CredentialVerifier>) -> Self {
        let (state, _) = watch::channel(AuthSession::loading());

        Self {
            inner: Arc::new(StoreInner {
                state,
                storage,
                verifier,
                op_lock: Mutex::new(()),
            }),
        }
    }

    /// Create the store and restore any persisted session
    pub async fn init(
        storage: Arc<dyn SessionStorage>,
        verifier: Arc<dyn CredentialVerifier>,
    ) -> Self {
        let store = Self::new(storage, verifier);
        store.restore().await;
        store
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Rebuild the session from storage
    ///
    /// Both keys present and readable restores the session as-is; anything
    /// else leaves the store unauthenticated. Loading is always cleared.
    pub async fn restore(&self) -> AuthSession {
        let _guard = self.inner.op_lock.lock().await;
        self.dispatch(AuthAction::SetLoading(true));

        match self.read_persisted().await {
            Ok(Some(grant)) => {
                tracing::info!(username = %grant.user.username, "Restored session");
                self.dispatch(AuthAction::RestoreSession(grant));
            }
            Ok(None) => {
                tracing::debug!("No persisted session");
                self.dispatch(AuthAction::Logout);
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to read persisted session");
                self.dispatch(AuthAction::Logout);
            }
        }

        self.session()
    }

    /// Check credentials and start a persisted session
    ///
    /// On failure nothing but the loading flag changes, in memory or in storage.
    pub async fn login(&self, username: &str, credential: &str) -> Result<AuthSession, AuthError> {
        let _guard = self.inner.op_lock.lock().await;
        self.dispatch(AuthAction::SetLoading(true));

        let grant = match self.inner.verifier.authenticate(username, credential).await {
            Ok(grant) => grant,
            Err(e) => {
                tracing::warn!(username = %username, error = %e, "Login rejected");
                self.dispatch(AuthAction::SetLoading(false));
                return Err(e);
            }
        };

        if let Err(e) = self.persist(&grant).await {
            tracing::error!(username = %username, error = %e, "Failed to persist session");
            self.dispatch(AuthAction::SetLoading(false));
            return Err(e.into());
        }

        tracing::info!(username = %grant.user.username, "Logged in");
        self.dispatch(AuthAction::LoginSuccess(grant));

        Ok(self.session())
    }

    /// Clear the persisted and in-memory session; idempotent
    ///
    /// The in-memory session is cleared even when storage fails. The error is
    /// still returned, since the persisted session would come back on restore.
    pub async fn logout(&self) -> Result<(), AuthError> {
        let _guard = self.inner.op_lock.lock().await;

        let cleared = self.inner.storage.remove_all(&[TOKEN_KEY, USER_KEY]).await;
        self.dispatch(AuthAction::Logout);

        match cleared {
            Ok(()) => {
                tracing::info!("Logged out");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "Logged out in memory, failed to clear persisted session");
                Err(e.into())
            }
        }
    }

    /// Release the storage backend
    pub async fn teardown(&self) {
        let _guard = self.inner.op_lock.lock().await;
        self.inner.storage.close().await;
    }

    // ========================================================================
    // Query Methods
    // ========================================================================

    /// Current state snapshot
    pub fn session(&self) -> AuthSession {
        self.inner.state.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.state.borrow().is_authenticated()
    }

    pub fn current_user(&self) -> Option<User> {
        self.inner.state.borrow().user().cloned()
    }

    /// Receive every state change
    pub fn subscribe(&self) -> watch::Receiver<AuthSession> {
        self.inner.state.subscribe()
    }

    /// Wait until no restore or login is in flight
    pub async fn settled(&self) -> AuthSession {
        let mut rx = self.subscribe();
        loop {
            let state = rx.borrow_and_update().clone();
            if !state.is_loading() {
                return state;
            }
            if rx.changed().await.is_err() {
                return self.session();
            }
        }
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn dispatch(&self, action: AuthAction) {
        self.inner
            .state
            .send_modify(|state| *state = state.clone().reduce(action));
    }

    async fn read_persisted(&self) -> Result<Option<Grant>, StorageError> {
        let storage = &self.inner.storage;

        let token = storage.get(TOKEN_KEY).await?.filter(|t| !t.is_empty());
        let user = storage.get(USER_KEY).await?.filter(|u| !u.is_empty());

        let (token, user_json) = match (token, user) {
            (Some(token), Some(user)) => (token, user),
            _ => return Ok(None),
        };

        match serde_json::from_str::<User>(&user_json) {
            Ok(user) => Ok(Some(Grant { token, user })),
            Err(e) => {
                tracing::warn!(error = %e, "Discarding unreadable persisted user record");
                storage.remove_all(&[TOKEN_KEY, USER_KEY]).await?;
                Ok(None)
            }
        }
    }

    async fn persist(&self, grant: &Grant) -> Result<(), StorageError> {
        let user_json = serde_json::to_string(&grant.user)
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;

        self.inner
            .storage
            .set_all(&[(TOKEN_KEY, grant.token.as_str()), (USER_KEY, user_json.as_str())])
            .await
    }
}

// ============================================================================
// Tests
// ============================================================================

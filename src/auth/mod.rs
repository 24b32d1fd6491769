//! Auth Module
//!
//! Login session handling for the dashboard client:
//! - `store`: the session state machine (restore, login, logout)
//! - `storage`: durable key-value backends for the persisted session
//! - `verifier`: the credential check collaborator
//! - `guard`: the protected-route decision

mod guard;
mod storage;
mod store;
mod types;
mod verifier;

pub use guard::{GateDecision, RouteGate};
pub use storage::{MemoryStorage, SessionStorage, SqliteStorage, StorageError};
pub use store::AuthSessionStore;
pub use types::{AuthAction, AuthError, AuthSession, Grant, User, TOKEN_KEY, USER_KEY};
pub use verifier::{CredentialVerifier, SharedSecretVerifier};

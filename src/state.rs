//! Application state management

use std::sync::Arc;

use crate::auth::{AuthSessionStore, SessionStorage, SharedSecretVerifier, SqliteStorage};
use crate::config::Config;
use crate::contracts::{ContractsSource, HttpContractsClient};
use crate::error::Result;
use crate::upload::{
    HttpUploadEndpoint, Notifier, RandomizedUploadEndpoint, RetryPolicy, TrackerOptions,
    UploadEndpoint, UploadTracker,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    auth: AuthSessionStore,
    uploads: UploadTracker,
    contracts: Arc<dyn ContractsSource>,
}

impl AppState {
    /// Build every component from configuration and restore the persisted session
    pub async fn new(config: Config, notifier: Arc<dyn Notifier>) -> Result<Self> {
        let storage: Arc<dyn SessionStorage> =
            Arc::new(SqliteStorage::connect(&config.session.database_url).await?);
        let verifier = Arc::new(SharedSecretVerifier::new(config.session.shared_secret.clone()));
        let auth = AuthSessionStore::init(storage, verifier).await;

        let contracts: Arc<dyn ContractsSource> = Arc::new(HttpContractsClient::new(&config.api)?);

        let endpoint = upload_endpoint(&config)?;
        let uploads = UploadTracker::with_options(
            endpoint,
            notifier,
            TrackerOptions {
                retry: RetryPolicy::attempts(
                    config.upload.max_attempts,
                    config.upload.retry_backoff(),
                ),
                timeout: config.upload.timeout(),
            },
        );

        Ok(Self::from_parts(config, auth, uploads, contracts))
    }

    /// Assemble state from already-built components
    pub fn from_parts(
        config: Config,
        auth: AuthSessionStore,
        uploads: UploadTracker,
        contracts: Arc<dyn ContractsSource>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                auth,
                uploads,
                contracts,
            }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the auth session store
    pub fn auth(&self) -> &AuthSessionStore {
        &self.inner.auth
    }

    /// Get the upload tracker
    pub fn uploads(&self) -> &UploadTracker {
        &self.inner.uploads
    }

    /// Get the contracts source
    pub fn contracts(&self) -> &dyn ContractsSource {
        self.inner.contracts.as_ref()
    }

    /// Let in-flight uploads settle, then release the session storage
    pub async fn shutdown(&self) {
        tracing::debug!("Shutting down application state...");
        self.inner.uploads.wait_settled().await;
        self.inner.auth.teardown().await;
    }
}

fn upload_endpoint(config: &Config) -> Result<Arc<dyn UploadEndpoint>> {
    let endpoint: Arc<dyn UploadEndpoint> = match &config.upload.url {
        Some(url) => {
            tracing::debug!(url = %url, "Using HTTP upload endpoint");
            Arc::new(HttpUploadEndpoint::new(url.clone(), config.upload.timeout())?)
        }
        None => {
            tracing::debug!(
                success_rate = config.upload.success_rate,
                delay_ms = config.upload.delay_ms,
                "Using randomized upload endpoint"
            );
            Arc::new(RandomizedUploadEndpoint::new(
                config.upload.success_rate,
                config.upload.delay(),
            ))
        }
    };
    Ok(endpoint)
}

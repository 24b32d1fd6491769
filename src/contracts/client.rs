//! Contract listing and detail retrieval
//!
//! Every failure is caught at the call, logged, and returned as a
//! [`ContractError`]; nothing escapes as a panic.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use super::types::{
    ContractError, ContractRecord, ContractSummary, FETCH_CONTRACTS_MESSAGE,
    FETCH_CONTRACT_DETAILS_MESSAGE,
};
use crate::config::ApiConfig;

/// Source of contract records
#[async_trait]
pub trait ContractsSource: Send + Sync {
    /// All contracts, in listing order
    async fn list(&self) -> Result<Vec<ContractSummary>, ContractError>;

    /// One contract by id
    async fn detail(&self, id: &str) -> Result<ContractRecord, ContractError>;
}

// ============================================================================
// HTTP
// ============================================================================

/// Fetches the listing and the detail map from static JSON endpoints
pub struct HttpContractsClient {
    client: reqwest::Client,
    contracts_url: String,
    details_url: String,
}

impl HttpContractsClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ContractError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ContractError::Fetch {
                message: FETCH_CONTRACTS_MESSAGE,
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            contracts_url: config.contracts_url(),
            details_url: config.contract_details_url(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, reqwest::Error> {
        self.client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }
}

#[async_trait]
impl ContractsSource for HttpContractsClient {
    async fn list(&self) -> Result<Vec<ContractSummary>, ContractError> {
        self.get_json(&self.contracts_url).await.map_err(|e| {
            tracing::error!(url = %self.contracts_url, error = %e, "{}", FETCH_CONTRACTS_MESSAGE);
            ContractError::Fetch {
                message: FETCH_CONTRACTS_MESSAGE,
                reason: e.to_string(),
            }
        })
    }

    async fn detail(&self, id: &str) -> Result<ContractRecord, ContractError> {
        let mut details: HashMap<String, ContractRecord> =
            self.get_json(&self.details_url).await.map_err(|e| {
                tracing::error!(
                    url = %self.details_url,
                    contract_id = %id,
                    error = %e,
                    "{}",
                    FETCH_CONTRACT_DETAILS_MESSAGE
                );
                ContractError::Fetch {
                    message: FETCH_CONTRACT_DETAILS_MESSAGE,
                    reason: e.to_string(),
                }
            })?;

        details.remove(id).ok_or_else(|| {
            tracing::debug!(contract_id = %id, "Contract not found");
            ContractError::NotFound(id.to_string())
        })
    }
}

// ============================================================================
// Static
// ============================================================================

/// In-memory contracts, optionally loaded from JSON files
#[derive(Debug, Clone, Default)]
pub struct StaticContractsSource {
    contracts: Vec<ContractSummary>,
    details: HashMap<String, ContractRecord>,
}

impl StaticContractsSource {
    pub fn new(contracts: Vec<ContractSummary>, details: HashMap<String, ContractRecord>) -> Self {
        Self { contracts, details }
    }

    /// Parse a listing document and a detail map document
    pub fn from_json(contracts: &str, details: &str) -> Result<Self, ContractError> {
        let contracts = serde_json::from_str(contracts).map_err(|e| ContractError::Fetch {
            message: FETCH_CONTRACTS_MESSAGE,
            reason: e.to_string(),
        })?;
        let details = serde_json::from_str(details).map_err(|e| ContractError::Fetch {
            message: FETCH_CONTRACT_DETAILS_MESSAGE,
            reason: e.to_string(),
        })?;

        Ok(Self::new(contracts, details))
    }

    pub async fn from_files(
        contracts: impl AsRef<Path>,
        details: impl AsRef<Path>,
    ) -> Result<Self, ContractError> {
        let contracts = tokio::fs::read_to_string(contracts)
            .await
            .map_err(|e| ContractError::Fetch {
                message: FETCH_CONTRACTS_MESSAGE,
                reason: e.to_string(),
            })?;
        let details = tokio::fs::read_to_string(details)
            .await
            .map_err(|e| ContractError::Fetch {
                message: FETCH_CONTRACT_DETAILS_MESSAGE,
                reason: e.to_string(),
            })?;

        Self::from_json(&contracts, &details)
    }
}

#[async_trait]
impl ContractsSource for StaticContractsSource {
    async fn list(&self) -> Result<Vec<ContractSummary>, ContractError> {
        Ok(self.contracts.clone())
    }

    async fn detail(&self, id: &str) -> Result<ContractRecord, ContractError> {
        self.details
            .get(id)
            .cloned()
            .ok_or_else(|| ContractError::NotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::types::{ContractStatus, RiskLevel};

    use axum::{routing::get, Json, Router};
    use serde_json::{json, Value};

    const CONTRACTS: &str = r#"[
        { "id": "c1", "name": "MSA with Acme", "parties": "Acme & Us", "expiry": "2025-12-31", "status": "Active", "risk": "Medium" },
        { "id": "c2", "name": "NDA with Initech", "parties": "Initech & Us", "expiry": "2024-06-30", "status": "Expired", "risk": "Low" }
    ]"#;

    const DETAILS: &str = r#"{
        "c1": {
            "name": "MSA with Acme",
            "parties": "Acme & Us",
            "status": "Active",
            "risk": "Medium",
            "start": "2023-01-01",
            "expiry": "2025-12-31",
            "clauses": [],
            "insights": [],
            "evidence": []
        }
    }"#;

    fn api_config(base_url: String) -> ApiConfig {
        ApiConfig {
            base_url,
            contracts_endpoint: "/contracts.json".to_string(),
            contract_details_endpoint: "/contract-details.json".to_string(),
            request_timeout_secs: 5,
        }
    }

    async fn spawn_server() -> String {
        let contracts: Value = serde_json::from_str(CONTRACTS).unwrap();
        let details: Value = serde_json::from_str(DETAILS).unwrap();
        let router = Router::new()
            .route("/contracts.json", get(move || async move { Json(contracts) }))
            .route(
                "/contract-details.json",
                get(move || async move { Json(details) }),
            )
            .route("/broken.json", get(|| async { Json(json!({ "unexpected": true })) }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_http_list_and_detail() {
        let base = spawn_server().await;
        let client = HttpContractsClient::new(&api_config(base)).unwrap();

        let contracts = client.list().await.unwrap();
        assert_eq!(contracts.len(), 2);
        assert_eq!(contracts[1].status, ContractStatus::Expired);

        let detail = client.detail("c1").await.unwrap();
        assert_eq!(detail.name, "MSA with Acme");
        assert_eq!(detail.risk, RiskLevel::Medium);
    }

    #[tokio::test]
    async fn test_http_detail_not_found() {
        let base = spawn_server().await;
        let client = HttpContractsClient::new(&api_config(base)).unwrap();

        let err = client.detail("missing").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_http_missing_endpoint_is_fetch_error() {
        let base = spawn_server().await;
        let mut config = api_config(base);
        config.contracts_endpoint = "/nope.json".to_string();
        config.contract_details_endpoint = "/broken.json".to_string();
        let client = HttpContractsClient::new(&config).unwrap();

        let err = client.list().await.unwrap_err();
        assert_eq!(err.user_message(), "Failed to fetch contracts");

        let err = client.detail("c1").await.unwrap_err();
        assert!(!err.is_not_found());
        assert_eq!(err.user_message(), "Failed to fetch contract details");
    }

    #[tokio::test]
    async fn test_http_unreachable_is_fetch_error() {
        let client = HttpContractsClient::new(&api_config("http://127.0.0.1:1".to_string())).unwrap();
        let err = client.list().await.unwrap_err();
        assert!(matches!(err, ContractError::Fetch { .. }));
    }

    #[tokio::test]
    async fn test_static_source() {
        let source = StaticContractsSource::from_json(CONTRACTS, DETAILS).unwrap();

        assert_eq!(source.list().await.unwrap().len(), 2);
        assert!(source.detail("c1").await.is_ok());
        assert!(source.detail("c2").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_static_source_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let list = dir.path().join("contracts.json");
        let details = dir.path().join("contract-details.json");
        tokio::fs::write(&list, CONTRACTS).await.unwrap();
        tokio::fs::write(&details, DETAILS).await.unwrap();

        let source = StaticContractsSource::from_files(&list, &details).await.unwrap();
        assert_eq!(source.list().await.unwrap()[0].id, "c1");

        let err = StaticContractsSource::from_files(dir.path().join("absent.json"), &details)
            .await
            .unwrap_err();
        assert!(matches!(err, ContractError::Fetch { .. }));
    }
}

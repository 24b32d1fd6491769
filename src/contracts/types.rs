//! Contract record types

use std::fmt;

use serde::{Deserialize, Serialize};

/// Message for a failed listing request
pub const FETCH_CONTRACTS_MESSAGE: &str = "Failed to fetch contracts";

/// Message for a failed detail request
pub const FETCH_CONTRACT_DETAILS_MESSAGE: &str = "Failed to fetch contract details";

/// Message for an unknown contract id
pub const CONTRACT_NOT_FOUND_MESSAGE: &str = "Contract not found";

// ============================================================================
// Enumerations
// ============================================================================

/// Contract lifecycle status
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ContractStatus {
    Active,
    Expired,
    RenewalDue,
    Other(String),
}

impl From<String> for ContractStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Active" => Self::Active,
            "Expired" => Self::Expired,
            "Renewal Due" => Self::RenewalDue,
            _ => Self::Other(value),
        }
    }
}

impl From<ContractStatus> for String {
    fn from(status: ContractStatus) -> Self {
        status.to_string()
    }
}

impl fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => f.write_str("Active"),
            Self::Expired => f.write_str("Expired"),
            Self::RenewalDue => f.write_str("Renewal Due"),
            Self::Other(value) => f.write_str(value),
        }
    }
}

/// Risk rating of a contract or insight
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Other(String),
}

impl From<String> for RiskLevel {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Low" => Self::Low,
            "Medium" => Self::Medium,
            "High" => Self::High,
            _ => Self::Other(value),
        }
    }
}

impl From<RiskLevel> for String {
    fn from(risk: RiskLevel) -> Self {
        risk.to_string()
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => f.write_str("Low"),
            Self::Medium => f.write_str("Medium"),
            Self::High => f.write_str("High"),
            Self::Other(value) => f.write_str(value),
        }
    }
}

// ============================================================================
// Records
// ============================================================================

/// One row of the contract listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractSummary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub parties: String,
    #[serde(default)]
    pub expiry: String,
    pub status: ContractStatus,
    pub risk: RiskLevel,
}

/// Full contract record from the detail map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractRecord {
    pub name: String,
    #[serde(default)]
    pub parties: String,
    pub status: ContractStatus,
    pub risk: RiskLevel,
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub expiry: String,
    #[serde(default)]
    pub clauses: Vec<Clause>,
    #[serde(default)]
    pub insights: Vec<Insight>,
    #[serde(default)]
    pub evidence: Vec<Evidence>,
}

/// Key clause extracted from the contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clause {
    pub title: String,
    pub summary: String,
    /// 0.0..=1.0
    pub confidence: f64,
}

/// AI-derived risk observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub risk: RiskLevel,
    pub message: String,
}

/// Supporting excerpt for an insight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub source: String,
    /// 0.0..=1.0
    pub relevance: f64,
    pub snippet: String,
}

// ============================================================================
// Error Types
// ============================================================================

/// Contract retrieval errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ContractError {
    /// Listing or detail request failed
    #[error("{message}: {reason}")]
    Fetch { message: &'static str, reason: String },

    /// No record for this id
    #[error("Contract not found: {0}")]
    NotFound(String),
}

impl ContractError {
    /// Message suitable for display next to a "back to dashboard" action
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Fetch { message, .. } => message,
            Self::NotFound(_) => CONTRACT_NOT_FOUND_MESSAGE,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DETAIL: &str = r#"{
        "name": "MSA with Acme Corp",
        "parties": "Acme Corp & Initech",
        "status": "Renewal Due",
        "risk": "High",
        "start": "2023-01-01",
        "expiry": "2025-12-31",
        "clauses": [
            { "title": "Termination", "summary": "90 days notice.", "confidence": 0.92 }
        ],
        "insights": [
            { "risk": "High", "message": "Liability cap is missing." },
            { "risk": "Critical", "message": "Unknown rating." }
        ],
        "evidence": [
            { "source": "Section 12.2", "relevance": 0.873, "snippet": "Either party may terminate..." }
        ]
    }"#;

    #[test]
    fn test_parse_detail_record() {
        let record: ContractRecord = serde_json::from_str(DETAIL).unwrap();

        assert_eq!(record.status, ContractStatus::RenewalDue);
        assert_eq!(record.risk, RiskLevel::High);
        assert_eq!(record.clauses.len(), 1);
        assert_eq!(record.insights[1].risk, RiskLevel::Other("Critical".to_string()));
        assert_eq!(record.evidence[0].relevance, 0.873);
    }

    #[test]
    fn test_status_keeps_unknown_spelling() {
        let json = serde_json::to_string(&ContractStatus::RenewalDue).unwrap();
        assert_eq!(json, "\"Renewal Due\"");

        let other: ContractStatus = serde_json::from_str("\"Draft\"").unwrap();
        assert_eq!(other.to_string(), "Draft");
    }

    #[test]
    fn test_missing_collections_default_to_empty() {
        let record: ContractRecord =
            serde_json::from_str(r#"{ "name": "NDA", "status": "Active", "risk": "Low" }"#).unwrap();
        assert!(record.clauses.is_empty());
        assert!(record.insights.is_empty());
        assert!(record.evidence.is_empty());
    }

    #[test]
    fn test_error_messages() {
        let fetch = ContractError::Fetch {
            message: FETCH_CONTRACTS_MESSAGE,
            reason: "connection refused".to_string(),
        };
        assert_eq!(fetch.user_message(), "Failed to fetch contracts");
        assert!(!fetch.is_not_found());

        let missing = ContractError::NotFound("c-9".to_string());
        assert_eq!(missing.user_message(), "Contract not found");
        assert!(missing.is_not_found());
    }
}

//! Display formatting and label tables for contract views

use chrono::{DateTime, NaiveDate};

use super::types::{ContractStatus, RiskLevel};

/// Fixed UI labels of the contract views
pub mod labels {
    pub const HEADER: &str = "Contract Details";
    pub const KEY_CLAUSES: &str = "Key Clauses";
    pub const AI_INSIGHTS: &str = "AI Risk Insights";
    pub const EVIDENCE: &str = "Evidence & References";
    pub const SHOW_DETAILS: &str = "Show Details";
    pub const HIDE_DETAILS: &str = "Hide Details";
    pub const BACK_TO_DASHBOARD: &str = "Back to Dashboard";
    pub const BACK_TO_CONTRACTS: &str = "Back to Contracts";
    pub const CONTRACT_NOT_FOUND: &str = "Contract not found";
    pub const CONTRACT_NOT_FOUND_DESC: &str = "The contract you're looking for doesn't exist.";
    pub const ERROR_LOADING_CONTRACT: &str = "Error loading contract";
}

const NEUTRAL_BADGE: &str = "bg-gray-100 text-gray-800";

impl ContractStatus {
    pub fn badge_class(&self) -> &'static str {
        match self {
            Self::Active => "bg-green-100 text-green-800",
            Self::Expired => "bg-red-100 text-red-800",
            Self::RenewalDue => "bg-yellow-100 text-yellow-800",
            Self::Other(_) => NEUTRAL_BADGE,
        }
    }
}

impl RiskLevel {
    pub fn badge_class(&self) -> &'static str {
        match self {
            Self::Low => "bg-green-100 text-green-800",
            Self::Medium => "bg-yellow-100 text-yellow-800",
            Self::High => "bg-red-100 text-red-800",
            Self::Other(_) => NEUTRAL_BADGE,
        }
    }

    pub fn icon_class(&self) -> &'static str {
        match self {
            Self::High => "text-red-500",
            Self::Medium => "text-yellow-500",
            Self::Low => "text-green-500",
            Self::Other(_) => "text-gray-500",
        }
    }
}

/// Whole percentage of a 0..=1 score, rounding half up
///
/// The product is snapped to 9 decimal places first so that values such as
/// `0.845`, stored as `0.84499999...`, round as written.
pub fn percent(value: f64) -> u8 {
    if !value.is_finite() {
        return 0;
    }
    let scaled = (value * 100.0 * 1e9).round() / 1e9;
    (scaled + 0.5).floor().clamp(0.0, 100.0) as u8
}

/// `0.873` → `"87%"`
pub fn format_percent(value: f64) -> String {
    format!("{}%", percent(value))
}

/// `"2024-01-15"` → `"January 15, 2024"`; anything unparseable is returned as-is
pub fn format_date(value: &str) -> String {
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|d| d.date_naive()));

    match date {
        Some(date) => date.format("%B %-d, %Y").to_string(),
        None => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_rounding() {
        assert_eq!(format_percent(0.873), "87%");
        assert_eq!(format_percent(0.92), "92%");
        assert_eq!(format_percent(1.0), "100%");
        assert_eq!(format_percent(0.0), "0%");
    }

    #[test]
    fn test_percent_half_up_at_boundaries() {
        assert_eq!(percent(0.845), 85);
        assert_eq!(percent(0.835), 84);
        assert_eq!(percent(0.125), 13);
        assert_eq!(percent(0.005), 1);
        assert_eq!(percent(0.0049), 0);
        assert_eq!(percent(0.8449), 84);
        assert_eq!(percent(0.995), 100);
    }

    #[test]
    fn test_percent_out_of_range() {
        assert_eq!(percent(-0.2), 0);
        assert_eq!(percent(1.7), 100);
        assert_eq!(percent(f64::NAN), 0);
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date("2024-01-15"), "January 15, 2024");
        assert_eq!(format_date("2025-12-01T09:30:00Z"), "December 1, 2025");
        assert_eq!(format_date("soon"), "soon");
    }

    #[test]
    fn test_badge_classes() {
        assert_eq!(ContractStatus::Active.badge_class(), "bg-green-100 text-green-800");
        assert_eq!(ContractStatus::RenewalDue.badge_class(), "bg-yellow-100 text-yellow-800");
        assert_eq!(
            ContractStatus::Other("Draft".to_string()).badge_class(),
            "bg-gray-100 text-gray-800"
        );
        assert_eq!(RiskLevel::High.badge_class(), "bg-red-100 text-red-800");
        assert_eq!(RiskLevel::High.icon_class(), "text-red-500");
        assert_eq!(RiskLevel::Other("?".to_string()).icon_class(), "text-gray-500");
    }
}

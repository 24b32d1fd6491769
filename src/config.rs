//! Configuration management for Contract Desk

use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub upload: UploadConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub contracts_endpoint: String,
    pub contract_details_endpoint: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Real upload endpoint; `None` selects the randomized mock
    pub url: Option<String>,
    pub delay_ms: u64,
    pub success_rate: f64,
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub retry_backoff_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub database_url: String,
    pub shared_secret: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api: ApiConfig {
                base_url: "http://localhost:5173".to_string(),
                contracts_endpoint: "/contracts.json".to_string(),
                contract_details_endpoint: "/contract-details.json".to_string(),
                request_timeout_secs: 10,
            },
            upload: UploadConfig {
                url: None,
                delay_ms: 2000,
                success_rate: 0.9,
                timeout_secs: 30,
                max_attempts: 1,
                retry_backoff_ms: 500,
            },
            session: SessionConfig {
                database_url: "sqlite:./contract-desk.db".to_string(),
                shared_secret: "test123".to_string(),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Config::default();

        Ok(Config {
            api: ApiConfig {
                base_url: env::var("API_BASE_URL").unwrap_or(defaults.api.base_url),
                contracts_endpoint: env::var("CONTRACTS_ENDPOINT")
                    .unwrap_or(defaults.api.contracts_endpoint),
                contract_details_endpoint: env::var("CONTRACT_DETAILS_ENDPOINT")
                    .unwrap_or(defaults.api.contract_details_endpoint),
                request_timeout_secs: parse_var(
                    "REQUEST_TIMEOUT_SECS",
                    defaults.api.request_timeout_secs,
                )?,
            },
            upload: UploadConfig {
                url: env::var("UPLOAD_URL").ok().filter(|u| !u.is_empty()),
                delay_ms: parse_var("UPLOAD_DELAY_MS", defaults.upload.delay_ms)?,
                success_rate: parse_var("UPLOAD_SUCCESS_RATE", defaults.upload.success_rate)?,
                timeout_secs: parse_var("UPLOAD_TIMEOUT_SECS", defaults.upload.timeout_secs)?,
                max_attempts: parse_var("UPLOAD_MAX_ATTEMPTS", defaults.upload.max_attempts)?,
                retry_backoff_ms: parse_var(
                    "UPLOAD_RETRY_BACKOFF_MS",
                    defaults.upload.retry_backoff_ms,
                )?,
            },
            session: SessionConfig {
                database_url: env::var("SESSION_DATABASE_URL")
                    .unwrap_or(defaults.session.database_url),
                shared_secret: env::var("AUTH_SHARED_SECRET")
                    .unwrap_or(defaults.session.shared_secret),
            },
        })
    }
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn contracts_url(&self) -> String {
        join_url(&self.base_url, &self.contracts_endpoint)
    }

    pub fn contract_details_url(&self) -> String {
        join_url(&self.base_url, &self.contract_details_endpoint)
    }
}

impl UploadConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

fn parse_var<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        Err(_) => Ok(default),
    }
}

fn join_url(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_url() {
        assert_eq!(
            join_url("http://localhost:5173/", "/contracts.json"),
            "http://localhost:5173/contracts.json"
        );
        assert_eq!(
            join_url("http://localhost:5173", "data/contracts.json"),
            "http://localhost:5173/data/contracts.json"
        );
        assert_eq!(
            join_url("http://localhost:5173", "https://cdn.example.com/c.json"),
            "https://cdn.example.com/c.json"
        );
    }

    #[test]
    fn test_defaults_match_mock_backend() {
        let config = Config::default();
        assert_eq!(config.upload.delay(), Duration::from_millis(2000));
        assert_eq!(config.upload.success_rate, 0.9);
        assert_eq!(config.upload.max_attempts, 1);
        assert!(config.upload.url.is_none());
        assert_eq!(config.api.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.session.shared_secret, "test123");
    }

    #[test]
    fn test_invalid_var_is_an_error() {
        env::set_var("UPLOAD_MAX_ATTEMPTS", "lots");
        let result = Config::from_env();
        env::remove_var("UPLOAD_MAX_ATTEMPTS");

        match result {
            Err(ConfigError::Invalid { key, value }) => {
                assert_eq!(key, "UPLOAD_MAX_ATTEMPTS");
                assert_eq!(value, "lots");
            }
            other => panic!("expected invalid config, got {:?}", other.map(|_| ())),
        }
    }
}

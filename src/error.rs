//! Error types for Contract Desk

use thiserror::Error;

use crate::auth::{AuthError, StorageError};
use crate::config::ConfigError;
use crate::contracts::ContractError;
use crate::upload::UploadError;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Auth(#[from] AuthError),

    #[error("Session storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("{0}")]
    Contract(#[from] ContractError),

    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),

    #[error("Not signed in")]
    Unauthenticated,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Process exit code for the command-line front end
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Config(_) => 78,
            AppError::Auth(AuthError::InvalidCredential) | AppError::Unauthenticated => 77,
            AppError::Contract(e) if e.is_not_found() => 66,
            AppError::Io(_) => 74,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let invalid = ConfigError::Invalid {
            key: "UPLOAD_DELAY_MS",
            value: "soon".to_string(),
        };
        assert_eq!(AppError::from(invalid).exit_code(), 78);
        assert_eq!(AppError::from(AuthError::InvalidCredential).exit_code(), 77);
        assert_eq!(AppError::Unauthenticated.exit_code(), 77);
        assert_eq!(
            AppError::from(ContractError::NotFound("c1".to_string())).exit_code(),
            66
        );
        assert_eq!(
            AppError::from(UploadError::Rejected("no".to_string())).exit_code(),
            1
        );
    }
}

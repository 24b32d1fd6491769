//! Contract Desk Library
//!
//! Client core of the contract dashboard. The command-line front end is in main.rs.
//!
//! # Modules
//!
//! - `upload`: concurrent upload tracking against a pluggable endpoint
//! - `auth`: login session store with durable restore
//! - `contracts`: contract listing/detail retrieval and display formatting
//! - `state`: wiring of the above from configuration

pub mod auth;
pub mod config;
pub mod contracts;
pub mod error;
pub mod state;
pub mod upload;

pub use config::Config;
pub use error::{AppError, Result};
pub use state::AppState;

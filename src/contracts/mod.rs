//! Contracts Module
//!
//! Read-only access to contract records and their AI risk insights.
//! Records are passed through as fetched; the only derivation is display
//! formatting in [`present`].

mod client;
pub mod present;
mod types;

pub use client::{ContractsSource, HttpContractsClient, StaticContractsSource};
pub use present::{format_date, format_percent, percent};
pub use types::*;

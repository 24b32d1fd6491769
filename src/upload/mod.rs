//! Upload Module
//!
//! Tracks concurrent file uploads against an upload endpoint:
//! - Each file becomes an entry that moves `Pending → Uploading → Success | Error` exactly once
//! - Submissions run as independent tasks; one failure never affects another
//! - Only finished entries can be dismissed
//!
//! The endpoint is pluggable (HTTP, randomized mock, scripted) and every
//! outcome is reported through a [`Notifier`].

pub mod endpoint;
pub mod notify;
pub mod tracker;
pub mod types;

pub use endpoint::{
    HttpUploadEndpoint, RandomizedUploadEndpoint, ScriptedOutcome, ScriptedUploadEndpoint,
    UploadEndpoint,
};
pub use notify::{ChannelNotifier, LogNotifier, Notification, NotificationKind, Notifier};
pub use tracker::{RetryPolicy, TrackerOptions, UploadTracker};
pub use types::*;

//! Respo Core Library
//!
//! This crate provides the core functionality for Respo, including:
//! - Vendor API client for the Respondent.io private API
//! - Hourly rate normalization for study listings
//! - Hide criteria and project filtering
//! - Hide pipeline (list -> normalize -> filter -> hide -> report)
//! - Session credential storage (file or OS keyring)
//! - Configuration management

pub mod config;
pub mod credentials;
pub mod error;
pub mod filter;
pub mod pipeline;
pub mod rate;
pub mod vendor;

pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::credentials::{Credential, CredentialStore};
    pub use crate::error::{Error, Result};
    pub use crate::filter::HideCriteria;
    pub use crate::pipeline::{HidePipeline, HideReport};
    pub use crate::vendor::VendorApi;
}

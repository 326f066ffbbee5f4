//! Error types for Respo

use thiserror::Error;

/// Result type alias using Respo's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Respo error types with helpful messages and suggestions
#[derive(Error, Debug)]
pub enum Error {
    /// Credential is missing, expired, or was rejected by the vendor.
    /// The user must capture a fresh session from their browser.
    #[error("Authentication failed: {0}. Refresh your session with `respo credentials set`.")]
    Auth(String),

    /// Unknown project ID (vendor 404 or no match in the listing).
    #[error("Project '{0}' not found.")]
    NotFound(String),

    /// Vendor rate-limited us or is temporarily unavailable. Safe to
    /// retry later; never retried automatically.
    #[error("Vendor temporarily unavailable ({status}): {body}")]
    Transient { status: u16, body: String },

    /// A project's duration or incentive could not be parsed. The
    /// project is excluded from automatic filtering and surfaced for
    /// manual review.
    #[error("Malformed project data: {0}")]
    MalformedData(String),

    /// Anything else from the vendor, surfaced verbatim for diagnostics.
    #[error("Unexpected vendor response ({status}): {body}")]
    Unexpected { status: u16, body: String },

    #[error("Network error: {0}. Check your internet connection.")]
    Network(#[from] reqwest::Error),

    #[error("Credential store error: {0}")]
    CredentialStore(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            Self::Auth(_) => "E100",
            Self::NotFound(_) => "E101",
            Self::Transient { .. } => "E102",
            Self::MalformedData(_) => "E103",
            Self::Unexpected { .. } => "E104",
            Self::Network(_) => "E105",
            Self::CredentialStore(_) => "E200",
            Self::Config(_) => "E300",
            Self::InvalidInput(_) => "E400",
            Self::Io(_) => "E9999",
        }
    }

    /// Whether a later retry of the same call could reasonably succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient { .. } | Self::Network(_))
    }

    /// Get suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::Auth(_) => Some("respo credentials set".to_string()),
            Self::NotFound(_) => Some("respo projects".to_string()),
            Self::Transient { .. } => Some("Wait a minute and re-run the command".to_string()),
            Self::Network(_) => Some("Check internet connection".to_string()),
            Self::Config(_) => Some("respo config list".to_string()),
            _ => None,
        }
    }

    /// Classify a vendor HTTP status into the local error taxonomy.
    ///
    /// 401/403 mean the captured session is invalid or expired, 404 is
    /// an unknown project, 429 and 5xx are retryable vendor conditions,
    /// and everything else is surfaced verbatim.
    pub fn from_vendor_status(status: u16, body: String, project_id: Option<&str>) -> Self {
        match status {
            401 | 403 => Self::Auth(format!("vendor rejected credentials (HTTP {})", status)),
            404 => Self::NotFound(project_id.unwrap_or("unknown").to_string()),
            429 | 500..=599 => Self::Transient { status, body },
            _ => Self::Unexpected { status, body },
        }
    }
}

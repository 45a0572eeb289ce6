//! Error types for cfddns
//!
//! Errors fall into three classes:
//! - configuration errors, raised before any network call
//! - transport errors, which abort the whole run
//! - reconciliation failures, which are not errors at all but
//!   [`UpdateOutcome`](crate::reconciler::UpdateOutcome) values

use std::fmt;
use thiserror::Error;

/// Result type alias for cfddns operations
pub type Result<T> = std::result::Result<T, Error>;

/// The three credential values every run needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialField {
    /// Account e-mail the API key is authorized for
    Email,
    /// API key or token
    ApiKey,
    /// Zone identifier
    ZoneId,
}

impl CredentialField {
    /// Name of the variable that carries this value
    pub fn var_name(&self) -> &'static str {
        match self {
            CredentialField::Email => "CLOUDFLARE_EMAIL",
            CredentialField::ApiKey => "CLOUDFLARE_API_KEY",
            CredentialField::ZoneId => "CLOUDFLARE_ZONE_ID",
        }
    }
}

impl fmt::Display for CredentialField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CredentialField::Email => "account email",
            CredentialField::ApiKey => "API key",
            CredentialField::ZoneId => "zone id",
        };
        write!(f, "{} ({})", label, self.var_name())
    }
}

/// Core error type for cfddns
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid user input (bad address, family mismatch)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A required credential is missing or empty
    #[error("Missing credential: {0}")]
    MissingCredential(CredentialField),

    /// The current address could not be detected
    #[error("Address detection failed: {0}")]
    AddressDetection(String),

    /// The DNS provider could not be queried
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// The HTTP client could not be constructed
    #[error("HTTP client unavailable: {0}")]
    HttpClient(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create an address detection error
    pub fn address_detection(msg: impl Into<String>) -> Self {
        Self::AddressDetection(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create an HTTP client construction error
    pub fn http_client(msg: impl Into<String>) -> Self {
        Self::HttpClient(msg.into())
    }
}

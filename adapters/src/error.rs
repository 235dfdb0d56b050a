//! Error types for provider adapters

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for adapter operations
pub type Result<T> = std::result::Result<T, Error>;

/// Provider error normalized from a bank-specific envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderError {
    /// Provider error code (as sent by the bank, stringified)
    pub code: String,
    /// Human readable message
    pub message: String,
    /// Extra detail, when the envelope carries one
    pub detail: Option<String>,
    /// HTTP status of the response
    pub http_status: u16,
    /// Provider that produced the error
    pub provider_name: String,
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] {} (HTTP {})",
            self.provider_name, self.code, self.message, self.http_status
        )?;
        if let Some(detail) = &self.detail {
            write!(f, ": {}", detail)?;
        }
        Ok(())
    }
}

/// Failure category exposed to calling services
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Credentials rejected by the token endpoint
    Auth,
    /// Request rejected locally before any network call
    Validation,
    /// The bank answered with an error
    UpstreamBank,
    /// The bank answered success but the record does not exist
    NotFound,
    /// Network failure, timeout or cancellation
    Transport,
    /// Local encoding or configuration failure
    Internal,
}

/// Adapter errors
#[derive(Error, Debug)]
pub enum Error {
    /// Token endpoint returned a non-200 status
    #[error("Authentication failed for {provider} (HTTP {status}): {body}")]
    Authentication {
        /// Provider name
        provider: String,
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },

    /// Network or timeout failure before an HTTP status was received
    #[error("Transport error calling {provider}: {message}")]
    Transport {
        /// Provider name
        provider: String,
        /// Failure description
        message: String,
        /// Whether the failure was a timeout
        timeout: bool,
    },

    /// Non-success status with a decodable provider envelope
    #[error("Provider API error: {0}")]
    ProviderApi(ProviderError),

    /// Non-success status whose body could not be decoded
    #[error("Undecoded provider error from {provider} (HTTP {status}): {body}")]
    UndecodedProvider {
        /// Provider name
        provider: String,
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },

    /// Local request/response encode or decode failure
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Request rejected before a network call
    #[error("Validation error: {0}")]
    Validation(String),

    /// Provider returned no record for the lookup
    #[error("{provider}: {resource} not found")]
    NotFound {
        /// Provider name
        provider: String,
        /// What was looked up
        resource: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Caller cancelled the request context
    #[error("Request cancelled: {0}")]
    Cancelled(String),
}

impl Error {
    /// Failure category for status mapping and retry decisions
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Authentication { .. } => ErrorCategory::Auth,
            Error::Transport { .. } | Error::Cancelled(_) => ErrorCategory::Transport,
            Error::ProviderApi(_) | Error::UndecodedProvider { .. } => ErrorCategory::UpstreamBank,
            Error::Validation(_) => ErrorCategory::Validation,
            Error::NotFound { .. } => ErrorCategory::NotFound,
            Error::Serialization(_) | Error::Config(_) => ErrorCategory::Internal,
        }
    }

    /// Whether replaying an idempotent request may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Transport { .. })
    }

    /// HTTP status carried by the error, if any
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Error::Authentication { status, .. } | Error::UndecodedProvider { status, .. } => {
                Some(*status)
            }
            Error::ProviderApi(err) => Some(err.http_status),
            _ => None,
        }
    }

    /// Provider error, if the bank answered with a decodable envelope
    pub fn provider_error(&self) -> Option<&ProviderError> {
        match self {
            Error::ProviderApi(err) => Some(err),
            _ => None,
        }
    }

    pub(crate) fn transport(provider: &str, err: reqwest::Error) -> Self {
        Error::Transport {
            provider: provider.to_string(),
            timeout: err.is_timeout(),
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Error::Validation(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Config(err.to_string())
    }
}

//! Error types for diagnosis operations.
//!
//! This module defines [`DiagnosisError`] which covers the failures of the
//! collaborators around the engine: fetching statements, normalising raw line
//! items and persisting results. The ratio calculator itself never errors; an
//! undefined ratio is reported as `None`.

use thiserror::Error;

/// Errors that can occur while fetching, normalising or storing data.
#[derive(Error, Debug)]
pub enum DiagnosisError {
    /// Network-related errors (connection failures, timeouts, etc.).
    #[error("Network error: {0}")]
    Network(String),

    /// Rate limit exceeded by a provider.
    #[error("Rate limited by {provider}: retry after {retry_after:?}")]
    RateLimited {
        /// The provider that rate limited the request.
        provider: String,
        /// Suggested time to wait before retrying.
        retry_after: Option<std::time::Duration>,
    },

    /// The requested symbol was not found.
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    /// Data is not available for the requested symbol.
    #[error("Data not available for {symbol}: {detail}")]
    DataNotAvailable {
        /// The symbol that was requested.
        symbol: String,
        /// What was missing.
        detail: String,
    },

    /// A required current-period field was absent from the raw data.
    #[error("Missing input field {field} for {symbol}")]
    MissingInput {
        /// The symbol being normalised.
        symbol: String,
        /// The missing field.
        field: &'static str,
    },

    /// Error parsing data from a provider or a stored payload.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Error interacting with the store.
    #[error("Store error: {0}")]
    Store(String),

    /// The requested provider is not configured.
    #[error("Provider not configured: {0}")]
    ProviderNotConfigured(String),

    /// An invalid parameter was provided.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl DiagnosisError {
    /// Returns true if retrying the same request may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::RateLimited { .. })
    }
}

/// Result type alias using [`DiagnosisError`].
pub type Result<T> = std::result::Result<T, DiagnosisError>;

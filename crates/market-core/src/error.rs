//! # Market Error Types
//!
//! Typed error handling for the tools marketplace.
//! Store, provider and auth operations all return `Result<T, MarketError>`.

use thiserror::Error;

/// Core error type for all marketplace operations
#[derive(Debug, Error)]
pub enum MarketError {
    /// Configuration errors (missing keys, invalid config)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// No usable credential was presented
    #[error("{0}")]
    Unauthorized(String),

    /// Credential rejected, or caller lacks the required role
    #[error("{0}")]
    Forbidden(String),

    /// Record not found in a collection
    #[error("Not found in {collection}: {id}")]
    NotFound { collection: String, id: String },

    /// Document database failure
    #[error("Database error: {0}")]
    Database(String),

    /// Payment provider API error
    #[error("Provider error [{provider}]: {message}")]
    ProviderError { provider: String, message: String },

    /// Network/HTTP error communicating with provider
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl MarketError {
    /// Fixed 401 returned when no bearer token is present
    pub fn unauthorized() -> Self {
        MarketError::Unauthorized("unauthorized access".to_string())
    }

    /// Fixed 403 returned for bad tokens and missing privileges
    pub fn forbidden() -> Self {
        MarketError::Forbidden("forbidden access".to_string())
    }

    pub fn not_found(collection: impl Into<String>, id: impl Into<String>) -> Self {
        MarketError::NotFound {
            collection: collection.into(),
            id: id.into(),
        }
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            MarketError::Configuration(_) => 500,
            MarketError::InvalidRequest(_) => 400,
            MarketError::Unauthorized(_) => 401,
            MarketError::Forbidden(_) => 403,
            MarketError::NotFound { .. } => 404,
            MarketError::Database(_) => 500,
            MarketError::ProviderError { .. } => 502,
            MarketError::NetworkError(_) => 503,
            MarketError::Serialization(_) => 500,
            MarketError::Internal(_) => 500,
        }
    }
}

impl From<serde_json::Error> for MarketError {
    fn from(err: serde_json::Error) -> Self {
        MarketError::Serialization(err.to_string())
    }
}

/// Result type alias for marketplace operations
pub type MarketResult<T> = Result<T, MarketError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(MarketError::unauthorized().status_code(), 401);
        assert_eq!(MarketError::forbidden().status_code(), 403);
        assert_eq!(MarketError::not_found("tools", "x").status_code(), 404);
        assert_eq!(
            MarketError::ProviderError {
                provider: "stripe".into(),
                message: "card declined".into()
            }
            .status_code(),
            502
        );
        assert_eq!(MarketError::Database("down".into()).status_code(), 500);
    }

    #[test]
    fn test_auth_messages() {
        assert_eq!(MarketError::unauthorized().to_string(), "unauthorized access");
        assert_eq!(MarketError::forbidden().to_string(), "forbidden access");
    }
}

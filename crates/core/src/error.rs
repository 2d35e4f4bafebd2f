//! Error types for the Parlor domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each external collaborator has its own error type; [`Error`] is the
//! taxonomy the orchestrator reports to the HTTP boundary.

use thiserror::Error;

/// The top-level error type for all Parlor operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Caller identity ---
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    // --- Ownership ---
    /// The conversation does not exist or belongs to someone else.
    /// The two cases are deliberately merged.
    #[error("Conversation not found")]
    NotFoundOrForbidden,

    // --- Request validation ---
    #[error("Invalid request: {0}")]
    Validation(String),

    // --- Text generation ---
    #[error("Generation failed: {0}")]
    Generation(#[from] ProviderError),

    // --- Persistence ---
    #[error("Store unavailable: {0}")]
    Store(#[from] StoreError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Collaborator errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Prompt blocked by provider: {0}")]
    Blocked(String),

    #[error("Provider returned no text")]
    EmptyResponse,

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Conversation {0} not found")]
    NotFound(String),
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("Missing bearer token")]
    MissingToken,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Verifier misconfigured: {0}")]
    Misconfigured(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = Error::Generation(ProviderError::ApiError {
            status_code: 503,
            message: "model overloaded".into(),
        });
        assert!(err.to_string().contains("503"));
        assert!(err.to_string().contains("model overloaded"));
    }

    #[test]
    fn not_found_message_does_not_leak_ids() {
        let err = Error::NotFoundOrForbidden;
        assert_eq!(err.to_string(), "Conversation not found");
    }

    #[test]
    fn store_error_converts_into_top_level() {
        let err: Error = StoreError::Storage("disk full".into()).into();
        assert!(matches!(err, Error::Store(_)));
    }
}

//! Error types for the s3kit core.

/// Core error type for configuration and shared types.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The signature scheme name is not recognized.
    #[error("unknown signature scheme: {0} (expected v2 or v4)")]
    UnknownSigningScheme(String),

    /// The endpoint is empty or carries a URL scheme.
    #[error("invalid endpoint: {0} (expected a bare host such as s3.amazonaws.com)")]
    InvalidEndpoint(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal error with context.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Convenience result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

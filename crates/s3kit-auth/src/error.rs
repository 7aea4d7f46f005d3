//! Error types for request signing.

use s3kit_core::SigningScheme;

/// Errors that can occur while signing a request.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No signer is registered for the requested scheme.
    #[error("no signer registered for scheme {0}")]
    MissingSigner(SigningScheme),

    /// The configured credentials lack an access key ID.
    #[error("missing access key ID")]
    MissingAccessKey,

    /// The signer rejected the request context.
    #[error("signing failed: {0}")]
    SigningFailed(String),

}

//! Service error payload and multipart session errors.

use std::fmt;

/// Code used for the server-side timeout that S3 may report after a
/// multipart merge has actually completed.
pub const REQUEST_TIMEOUT_CODE: &str = "RequestTimeout";

/// The code/message pair reported by the service or synthesized by the client.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ServiceError {
    /// The error code, e.g. `NoSuchKey`, or the HTTP status for synthesized errors.
    pub code: String,
    /// A human-readable error message.
    pub message: String,
    /// The resource that caused the error, when reported.
    pub resource: Option<String>,
}

impl ServiceError {
    /// Create a new error from a code and message.
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            resource: None,
        }
    }

    /// Synthesize an error for a status code outside the expected set.
    ///
    /// ```
    /// use s3kit_model::ServiceError;
    ///
    /// let err = ServiceError::unexpected_status(403);
    /// assert_eq!(err.code, "403");
    /// assert_eq!(err.message, "Unexpected HTTP status 403");
    /// ```
    #[must_use]
    pub fn unexpected_status(status: u16) -> Self {
        Self::new(status.to_string(), format!("Unexpected HTTP status {status}"))
    }

    /// Set the resource that caused this error.
    #[must_use]
    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    /// Whether this error carries exactly the given code.
    #[must_use]
    pub fn is_code(&self, code: &str) -> bool {
        self.code == code
    }

    /// Whether this is a `RequestTimeout` error.
    #[must_use]
    pub fn is_request_timeout(&self) -> bool {
        self.is_code(REQUEST_TIMEOUT_CODE)
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)?;
        if let Some(resource) = &self.resource {
            write!(f, " ({resource})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ServiceError {}

/// Errors raised by [`crate::MultipartSession`] bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// A part number outside `1..=total_parts`.
    #[error("part number {part} is outside 1..={total}")]
    PartOutOfRange {
        /// Offending part number.
        part: u32,
        /// Total parts in the session.
        total: u64,
    },

    /// Some parts have not been recorded yet.
    #[error("multipart session is missing parts {missing:?}")]
    IncompleteParts {
        /// Part numbers with no recorded etag.
        missing: Vec<u64>,
    },
}

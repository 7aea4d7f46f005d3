//! Client error types.

use std::fmt;

use s3kit_auth::AuthError;
use s3kit_core::CoreError;
use s3kit_model::{ServiceError, SessionError};
use s3kit_xml::XmlError;

/// Step of a multipart upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MultipartStage {
    /// `CreateMultipartUpload`.
    Start,
    /// `UploadPart`.
    UploadPart,
    /// `CompleteMultipartUpload`.
    Finalize,
}

impl MultipartStage {
    /// Returns the stage name used in messages.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::UploadPart => "upload part",
            Self::Finalize => "finalize",
        }
    }
}

impl fmt::Display for MultipartStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by [`crate::S3Client`] operations.
///
/// Service failures carry the code and message reported by the server, or a
/// synthesized `"Unexpected HTTP status"` error when the body had none.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// A local precondition failed before any request was sent.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// `PutObject` failed.
    #[error("put object failed: {0}")]
    PutFailed(ServiceError),

    /// `GetObject` failed.
    #[error("get object failed: {0}")]
    GetFailed(ServiceError),

    /// `DeleteObject` failed.
    #[error("delete object failed: {0}")]
    DeleteFailed(ServiceError),

    /// `ListObjects` failed on the first page.
    #[error("list objects failed: {0}")]
    ListObjectsFailed(ServiceError),

    /// `ListBuckets` failed.
    #[error("list buckets failed: {0}")]
    ListBucketsFailed(ServiceError),

    /// A multipart upload step failed.
    #[error("multipart {stage} failed: {source}")]
    MultipartFailed {
        /// Step that failed.
        stage: MultipartStage,
        /// Reported error.
        source: ServiceError,
    },

    /// Request signing failed.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// A success response body could not be decoded.
    #[error(transparent)]
    Xml(#[from] XmlError),

    /// Invalid client configuration.
    #[error(transparent)]
    Config(#[from] CoreError),

    /// Multipart session bookkeeping failed.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Local I/O on a body source or sink failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// The service error behind a classified failure, if any.
    #[must_use]
    pub fn service_error(&self) -> Option<&ServiceError> {
        match self {
            Self::PutFailed(e)
            | Self::GetFailed(e)
            | Self::DeleteFailed(e)
            | Self::ListObjectsFailed(e)
            | Self::ListBucketsFailed(e)
            | Self::MultipartFailed { source: e, .. } => Some(e),
            _ => None,
        }
    }

    /// The service error code behind a classified failure, if any.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.service_error().map(|e| e.code.as_str())
    }
}

/// Convenience result alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

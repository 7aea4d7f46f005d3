//! Response classification.
//!
//! Each operation accepts a fixed set of success statuses. Anything else is a
//! failure carrying either the service's `<Error>` code and message or a
//! synthesized `"Unexpected HTTP status"` error. Failures are then mapped to
//! the operation's [`ClientError`] variant.

use std::fmt;

use s3kit_model::ServiceError;
use s3kit_xml::parse_error_body;
use tracing::warn;

use crate::error::{ClientError, MultipartStage};
use crate::transport::{HttpResponse, TransportError};

/// The operations the client performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `PutObject`.
    PutObject,
    /// `GetObject`.
    GetObject,
    /// `DeleteObject`.
    DeleteObject,
    /// `ListObjects`, one page.
    ListObjects,
    /// `ListBuckets`.
    ListBuckets,
    /// `CreateMultipartUpload`.
    StartMultipart,
    /// `UploadPart`.
    UploadPart,
    /// `CompleteMultipartUpload`.
    FinalizeMultipart,
}

impl Operation {
    /// Statuses treated as success.
    #[must_use]
    pub fn expected_statuses(&self) -> &'static [u16] {
        match self {
            Self::GetObject => &[200, 206],
            Self::DeleteObject => &[204],
            Self::PutObject
            | Self::ListObjects
            | Self::ListBuckets
            | Self::StartMultipart
            | Self::UploadPart
            | Self::FinalizeMultipart => &[200],
        }
    }

    /// Whether `status` is a success for this operation.
    #[must_use]
    pub fn accepts(&self, status: u16) -> bool {
        self.expected_statuses().contains(&status)
    }

    /// Returns the operation name as used in logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PutObject => "PutObject",
            Self::GetObject => "GetObject",
            Self::DeleteObject => "DeleteObject",
            Self::ListObjects => "ListObjects",
            Self::ListBuckets => "ListBuckets",
            Self::StartMultipart => "CreateMultipartUpload",
            Self::UploadPart => "UploadPart",
            Self::FinalizeMultipart => "CompleteMultipartUpload",
        }
    }

    /// Wrap a service error in this operation's failure kind.
    #[must_use]
    pub fn failure(&self, error: ServiceError) -> ClientError {
        match self {
            Self::PutObject => ClientError::PutFailed(error),
            Self::GetObject => ClientError::GetFailed(error),
            Self::DeleteObject => ClientError::DeleteFailed(error),
            Self::ListObjects => ClientError::ListObjectsFailed(error),
            Self::ListBuckets => ClientError::ListBucketsFailed(error),
            Self::StartMultipart => ClientError::MultipartFailed {
                stage: MultipartStage::Start,
                source: error,
            },
            Self::UploadPart => ClientError::MultipartFailed {
                stage: MultipartStage::UploadPart,
                source: error,
            },
            Self::FinalizeMultipart => ClientError::MultipartFailed {
                stage: MultipartStage::Finalize,
                source: error,
            },
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify the outcome of one exchange.
///
/// Returns `Ok(Some(response))` on success, `Ok(None)` when a failure is
/// absorbed, and `Err` with the code/message pair otherwise. The only absorbed
/// failure is `RequestTimeout` on [`Operation::FinalizeMultipart`]: S3 can
/// report it after the merge has completed.
///
/// A finalize response with status 200 and an `<Error>` body is a failure.
pub fn classify(
    operation: Operation,
    outcome: Result<HttpResponse, TransportError>,
) -> Result<Option<HttpResponse>, ServiceError> {
    let failure = match outcome {
        Err(err) => ServiceError::new(err.code, err.message),
        Ok(response) if !operation.accepts(response.status) => parse_error_body(&response.body)
            .unwrap_or_else(|| ServiceError::unexpected_status(response.status)),
        Ok(response) if operation == Operation::FinalizeMultipart => {
            match parse_error_body(&response.body) {
                Some(err) => err,
                None => return Ok(Some(response)),
            }
        }
        Ok(response) => return Ok(Some(response)),
    };

    if operation == Operation::FinalizeMultipart && failure.is_request_timeout() {
        warn!(
            operation = %operation,
            message = %failure.message,
            "ignoring RequestTimeout on multipart completion"
        );
        return Ok(None);
    }

    Err(failure)
}

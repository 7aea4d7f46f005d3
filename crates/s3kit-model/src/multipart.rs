//! Caller-owned multipart upload session.
//!
//! A [`MultipartSession`] is created from the upload id returned by
//! `CreateMultipartUpload`, receives one etag per uploaded part, and is
//! consumed when the upload is completed. The client never keeps a copy, so
//! the session can be moved between tasks or persisted for resumption.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::SessionError;
use crate::types::StorageObjectRef;

/// Fixed part size: 5 MiB, the S3 minimum for every part but the last.
pub const DEFAULT_PART_SIZE: u64 = 5 * 1024 * 1024;

/// Number of parts needed for `total_size` bytes. Always at least one, so an
/// empty object is uploaded as a single empty part.
///
/// ```
/// use s3kit_model::{DEFAULT_PART_SIZE, part_count};
///
/// assert_eq!(part_count(12_000_000, DEFAULT_PART_SIZE), 3);
/// assert_eq!(part_count(0, DEFAULT_PART_SIZE), 1);
/// ```
#[must_use]
pub fn part_count(total_size: u64, part_size: u64) -> u64 {
    total_size.div_ceil(part_size.max(1)).max(1)
}

/// State of one multipart upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultipartSession {
    /// Upload id assigned by the service.
    pub upload_id: String,
    /// Target bucket.
    pub bucket: String,
    /// Target key.
    pub key: String,
    /// Size of the whole object.
    pub total_size: u64,
    /// Size of every part except possibly the last. Set at creation only.
    part_size: u64,
    /// Etags of completed parts by part number.
    pub completed_parts: BTreeMap<u32, String>,
}

impl MultipartSession {
    /// Start tracking an upload with the default part size.
    #[must_use]
    pub fn new(
        upload_id: impl Into<String>,
        bucket: impl Into<String>,
        key: impl Into<String>,
        total_size: u64,
    ) -> Self {
        Self::with_part_size(upload_id, bucket, key, total_size, DEFAULT_PART_SIZE)
    }

    /// Start tracking an upload split into `part_size` byte parts.
    #[must_use]
    pub fn with_part_size(
        upload_id: impl Into<String>,
        bucket: impl Into<String>,
        key: impl Into<String>,
        total_size: u64,
        part_size: u64,
    ) -> Self {
        Self {
            upload_id: upload_id.into(),
            bucket: bucket.into(),
            key: key.into(),
            total_size,
            part_size,
            completed_parts: BTreeMap::new(),
        }
    }

    /// Size of every part except possibly the last.
    #[must_use]
    pub fn part_size(&self) -> u64 {
        self.part_size
    }

    /// The object this session uploads.
    #[must_use]
    pub fn object(&self) -> StorageObjectRef {
        StorageObjectRef::new(&self.bucket, &self.key)
    }

    /// Number of parts the object is split into.
    #[must_use]
    pub fn total_parts(&self) -> u64 {
        part_count(self.total_size, self.part_size)
    }

    /// Record the etag of an uploaded part, replacing any earlier etag for the
    /// same part (a retried upload).
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::PartOutOfRange`] if `part` is zero or beyond
    /// [`MultipartSession::total_parts`].
    pub fn record_part(&mut self, part: u32, etag: impl Into<String>) -> Result<(), SessionError> {
        let total = self.total_parts();
        if part == 0 || u64::from(part) > total {
            return Err(SessionError::PartOutOfRange { part, total });
        }
        self.completed_parts.insert(part, etag.into());
        Ok(())
    }

    /// Part numbers not yet recorded, ascending.
    #[must_use]
    pub fn missing_parts(&self) -> Vec<u64> {
        (1..=self.total_parts())
            .filter(|n| {
                !u32::try_from(*n).is_ok_and(|part| self.completed_parts.contains_key(&part))
            })
            .collect()
    }

    /// Whether every part has an etag.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing_parts().is_empty()
    }

    /// Etags in ascending part order, ready for the completion manifest.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::IncompleteParts`] unless exactly parts
    /// `1..=total_parts` are recorded.
    pub fn ordered_etags(&self) -> Result<Vec<String>, SessionError> {
        let missing = self.missing_parts();
        if !missing.is_empty() {
            return Err(SessionError::IncompleteParts { missing });
        }
        Ok(self.completed_parts.values().cloned().collect())
    }
}

/// Body of a successful `CreateMultipartUpload` response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartUploadInit {
    /// Bucket echoed by the service.
    pub bucket: String,
    /// Key echoed by the service.
    pub key: String,
    /// Assigned upload id. Empty if the service omitted it.
    pub upload_id: String,
}

/// One entry of the completion manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedPart {
    /// 1-based part number.
    pub part_number: u32,
    /// Etag returned for the part.
    pub etag: String,
}

/// The `CompleteMultipartUpload` manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletedMultipartUpload {
    /// Parts in manifest order.
    pub parts: Vec<CompletedPart>,
}

impl CompletedMultipartUpload {
    /// Build a manifest from etags in ascending part order. Part numbers are
    /// positional: the first etag is part 1.
    #[must_use]
    pub fn from_etags<S: AsRef<str>>(etags: &[S]) -> Self {
        let parts = (1u32..)
            .zip(etags)
            .map(|(part_number, etag)| CompletedPart {
                part_number,
                etag: etag.as_ref().to_owned(),
            })
            .collect();
        Self { parts }
    }
}

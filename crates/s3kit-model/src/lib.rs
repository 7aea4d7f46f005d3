//! Data model for the s3kit client.
//!
//! These are plain values produced by response decoding and consumed by the
//! operation layer. None of them hold connections or perform I/O.
//!
//! # Modules
//!
//! - [`error`] - Service error payload and session errors
//! - [`listing`] - Object and bucket listings
//! - [`multipart`] - Caller-owned multipart upload session
//! - [`types`] - Object references, owners, canned ACLs

pub mod error;
pub mod listing;
pub mod multipart;
pub mod types;

pub use error::{REQUEST_TIMEOUT_CODE, ServiceError, SessionError};
pub use listing::{
    BucketEntry, BucketInventory, BucketListing, CommonPrefix, ListingPage, ObjectMetadata,
};
pub use multipart::{
    CompletedMultipartUpload, CompletedPart, DEFAULT_PART_SIZE, MultipartSession,
    MultipartUploadInit, part_count,
};
pub use types::{CannedAcl, Owner, StorageObjectRef};

//! Request orchestration for S3-compatible object storage.
//!
//! [`S3Client`] turns typed operation inputs into signed requests, hands them
//! to a [`Transport`], classifies the responses and decodes the results. It
//! never opens connections or computes signatures itself: both are supplied
//! by the embedding application.
//!
//! # Operations
//!
//! | Method | Request | Success |
//! |--------|---------|---------|
//! | [`S3Client::put_object`] | `PUT /bucket/key` | 200 |
//! | [`S3Client::get_object`] | `GET /bucket/key` | 200, 206 |
//! | [`S3Client::delete_object`] | `DELETE /bucket/key` | 204 |
//! | [`S3Client::list_objects`] | `GET /bucket/` (paginated) | 200 |
//! | [`S3Client::list_buckets`] | `GET /` | 200 |
//! | [`S3Client::start_multipart`] | `POST /bucket/key?uploads` | 200 |
//! | [`S3Client::upload_multipart`] | `PUT /bucket/key?partNumber&uploadId` | 200 |
//! | [`S3Client::finalize_multipart`] | `POST /bucket/key?uploadId` | 200 |
//! | [`S3Client::presigned_url`] | none, URL only | |
//!
//! # Modules
//!
//! - [`body`] - Request bodies with positioned reads
//! - [`chunk`] - Multipart part planning
//! - [`classify`] - Response classification per operation
//! - [`error`] - Client error types
//! - [`paginate`] - Listing pagination
//! - [`parallel`] - Concurrent part uploads
//! - [`presign`] - Pre-signed URL construction
//! - [`request`] - Operation inputs
//! - [`transport`] - Transport trait and wire types

pub mod body;
pub mod chunk;
pub mod classify;
mod client;
pub mod error;
mod ops;
pub mod paginate;
pub mod parallel;
pub mod presign;
pub mod request;
pub mod transport;

pub use body::{Body, BodySource, PositionedRead};
pub use chunk::{PartPlan, PartRange};
pub use classify::Operation;
pub use client::S3Client;
pub use error::{ClientError, ClientResult, MultipartStage};
pub use parallel::{DEFAULT_UPLOAD_CONCURRENCY, upload_parts_concurrently};
pub use request::{
    GetObjectRequest, ListObjectsRequest, ObjectSink, PresignRequest, PutObjectRequest,
    SharedWriter, UploadPartRequest,
};
pub use transport::{HttpResponse, SignedRequest, Transport, TransportError};

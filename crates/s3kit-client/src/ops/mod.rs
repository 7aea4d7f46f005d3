//! Operation implementations on [`crate::S3Client`].
//!
//! - `object` - Put, get and delete of single objects
//! - `bucket` - Object and bucket listings
//! - `multipart` - Multipart upload steps and session helpers

mod bucket;
mod multipart;
mod object;

use crate::body::Body;
use crate::client::RequestSpec;
use crate::request::PutObjectRequest;

/// Headers shared by `PutObject` and `CreateMultipartUpload`: content type,
/// canned ACL, user metadata and caller headers.
fn object_headers(spec: RequestSpec, body: &Body, request: &PutObjectRequest) -> RequestSpec {
    let mut spec = spec
        .header("content-type", body.content_type())
        .amz_header("x-amz-acl", request.acl.as_str());
    for (name, value) in &request.meta {
        spec = spec.amz_header(&format!("x-amz-meta-{name}"), value.clone());
    }
    spec.extra_headers(&request.headers)
}

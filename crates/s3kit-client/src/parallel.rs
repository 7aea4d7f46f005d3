//! Concurrent part uploads for a multipart session.

use futures::{StreamExt, stream};
use s3kit_model::MultipartSession;
use tracing::debug;

use crate::body::Body;
use crate::chunk::plan_all;
use crate::client::S3Client;
use crate::error::{ClientError, ClientResult};
use crate::request::UploadPartRequest;

/// Parts in flight when the caller does not choose.
pub const DEFAULT_UPLOAD_CONCURRENCY: usize = 4;

/// Upload every part of `session` not yet recorded, at most `concurrency` at
/// a time.
///
/// Parts complete in any order and each etag is recorded in `session` as
/// soon as its part finishes. The first failure stops the remaining uploads
/// and is returned; parts finished before it stay recorded, so the session
/// can be persisted and passed back in to upload only what is missing.
///
/// # Errors
///
/// Returns [`ClientError::InvalidInput`] if the body size differs from the
/// session's total size, or the first part upload error.
pub async fn upload_parts_concurrently(
    client: &S3Client,
    session: &mut MultipartSession,
    body: &Body,
    concurrency: usize,
) -> ClientResult<()> {
    if body.size() != session.total_size {
        return Err(ClientError::InvalidInput(format!(
            "body has {} bytes but the session expects {}",
            body.size(),
            session.total_size
        )));
    }

    let pending: Vec<UploadPartRequest> = plan_all(session.total_size, session.part_size())?
        .into_iter()
        .filter(|part| !session.completed_parts.contains_key(&part.part_number))
        .map(|part| UploadPartRequest::for_session(session, part.part_number))
        .collect();
    let count = pending.len();

    let mut uploads = stream::iter(pending)
        .map(|request| upload_one(client, body, request))
        .buffer_unordered(concurrency.max(1));

    while let Some(uploaded) = uploads.next().await {
        let (part_number, etag) = uploaded?;
        session.record_part(part_number, etag)?;
    }

    debug!(
        bucket = %session.bucket,
        key = %session.key,
        upload_id = %session.upload_id,
        parts = count,
        concurrency,
        "uploaded parts concurrently"
    );
    Ok(())
}

async fn upload_one(
    client: &S3Client,
    body: &Body,
    request: UploadPartRequest,
) -> ClientResult<(u32, String)> {
    match client.upload_multipart(body, &request).await? {
        Some(etag) => Ok((request.part_number, etag)),
        None => Err(ClientError::InvalidInput(format!(
            "part {} is past the end of the body",
            request.part_number
        ))),
    }
}

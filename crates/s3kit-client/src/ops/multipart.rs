use s3kit_model::{CompletedMultipartUpload, MultipartSession, MultipartUploadInit, ServiceError};
use s3kit_xml::{from_xml, to_xml};
use tracing::debug;

use super::object_headers;
use crate::body::Body;
use crate::chunk::{PartPlan, plan_part};
use crate::classify::Operation;
use crate::client::{RequestSpec, S3Client};
use crate::error::{ClientError, ClientResult};
use crate::request::{PutObjectRequest, UploadPartRequest};

impl S3Client {
    /// Begin a multipart upload and return its upload id.
    ///
    /// Sends the same content type, ACL, metadata and caller headers as
    /// [`S3Client::put_object`]. The body itself is not sent.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::MultipartFailed`] when the service rejects the
    /// request or answers without an upload id.
    pub async fn start_multipart(
        &self,
        body: &Body,
        request: &PutObjectRequest,
    ) -> ClientResult<String> {
        let spec = object_headers(
            RequestSpec::new(http::Method::POST, &request.bucket, &request.key)
                .query("uploads", ""),
            body,
            request,
        );
        let response = self.call(Operation::StartMultipart, spec).await?;
        let init = from_xml::<MultipartUploadInit>(&response.body)?;
        if init.upload_id.is_empty() {
            return Err(Operation::StartMultipart.failure(ServiceError::new(
                "MissingUploadId",
                "response carried no UploadId",
            )));
        }

        debug!(
            bucket = %request.bucket,
            key = %request.key,
            upload_id = %init.upload_id,
            "started multipart upload"
        );
        Ok(init.upload_id)
    }

    /// Upload one part of `body` and return its etag.
    ///
    /// Returns `Ok(None)` without sending anything when the part number is
    /// past the last part, so callers can loop until `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidInput`] for an empty upload id or a part
    /// number of zero, and [`ClientError::MultipartFailed`] when the service
    /// rejects the part or omits the `ETag` header.
    pub async fn upload_multipart(
        &self,
        body: &Body,
        request: &UploadPartRequest,
    ) -> ClientResult<Option<String>> {
        if request.upload_id.is_empty() {
            return Err(ClientError::InvalidInput("upload id is empty".to_owned()));
        }

        let part = match plan_part(body.size(), request.part_size, request.part_number)? {
            PartPlan::Part(part) => part,
            PartPlan::NoMoreParts => return Ok(None),
        };
        let data = body.read_range(part.offset, part.len).await?;

        let spec = RequestSpec::new(http::Method::PUT, &request.bucket, &request.key)
            .query("partNumber", part.part_number.to_string())
            .query("uploadId", request.upload_id.as_str())
            .extra_headers(&request.headers)
            .header("content-type", "")
            .body(data);
        let response = self.call(Operation::UploadPart, spec).await?;

        let etag = response
            .header("etag")
            .map(|v| v.trim().trim_matches('"').to_owned())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                Operation::UploadPart.failure(ServiceError::new(
                    "MissingETag",
                    format!("no ETag returned for part {}", part.part_number),
                ))
            })?;

        debug!(
            bucket = %request.bucket,
            key = %request.key,
            part = part.part_number,
            total = part.total_parts,
            size = part.len,
            "uploaded part"
        );
        Ok(Some(etag))
    }

    /// Complete a multipart upload from part etags in part order.
    ///
    /// The n-th etag is sent as part `n + 1`. A `RequestTimeout` reply is
    /// treated as success.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidInput`] for an empty upload id or etag
    /// list and [`ClientError::MultipartFailed`] for any other failure.
    pub async fn finalize_multipart(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        etags: &[String],
    ) -> ClientResult<()> {
        if upload_id.is_empty() {
            return Err(ClientError::InvalidInput("upload id is empty".to_owned()));
        }
        if etags.is_empty() {
            return Err(ClientError::InvalidInput(
                "at least one part etag is required".to_owned(),
            ));
        }

        let manifest = CompletedMultipartUpload::from_etags(etags);
        let xml = to_xml("CompleteMultipartUpload", &manifest)?;

        let spec = RequestSpec::new(http::Method::POST, bucket, key)
            .query("uploadId", upload_id)
            .header("content-type", "application/xml")
            .body(xml.into());
        let completed = self
            .execute(Operation::FinalizeMultipart, spec)
            .await?
            .is_some();

        debug!(
            bucket,
            key,
            upload_id,
            parts = etags.len(),
            completed,
            "finalized multipart upload"
        );
        Ok(())
    }

    /// Start a multipart upload and track it in a new session.
    ///
    /// # Errors
    ///
    /// See [`S3Client::start_multipart`].
    pub async fn start_session(
        &self,
        body: &Body,
        request: &PutObjectRequest,
    ) -> ClientResult<MultipartSession> {
        let upload_id = self.start_multipart(body, request).await?;
        Ok(MultipartSession::new(
            upload_id,
            &request.bucket,
            &request.key,
            body.size(),
        ))
    }

    /// Upload one part of a session and record its etag.
    ///
    /// # Errors
    ///
    /// See [`S3Client::upload_multipart`].
    pub async fn upload_session_part(
        &self,
        session: &mut MultipartSession,
        body: &Body,
        part_number: u32,
    ) -> ClientResult<Option<String>> {
        let request = UploadPartRequest::for_session(session, part_number);
        let etag = self.upload_multipart(body, &request).await?;
        if let Some(etag) = &etag {
            session.record_part(part_number, etag.as_str())?;
        }
        Ok(etag)
    }

    /// Complete a session, consuming it.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Session`] if any part is missing, otherwise see
    /// [`S3Client::finalize_multipart`].
    pub async fn finalize_session(&self, session: MultipartSession) -> ClientResult<()> {
        let etags = session.ordered_etags()?;
        self.finalize_multipart(&session.bucket, &session.key, &session.upload_id, &etags)
            .await
    }
}

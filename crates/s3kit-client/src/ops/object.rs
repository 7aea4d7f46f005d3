use std::path::Path;

use bytes::Bytes;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::object_headers;
use crate::body::{Body, content_md5};
use crate::classify::Operation;
use crate::client::{RequestSpec, S3Client};
use crate::error::{ClientError, ClientResult};
use crate::request::{GetObjectRequest, ObjectSink, PutObjectRequest};

impl S3Client {
    /// Upload an object in a single request.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidInput`] for an empty body and
    /// [`ClientError::PutFailed`] when the service rejects the upload.
    pub async fn put_object(&self, body: &Body, request: &PutObjectRequest) -> ClientResult<()> {
        if body.is_empty() {
            return Err(ClientError::InvalidInput(format!(
                "refusing to upload empty body to {}/{}",
                request.bucket, request.key
            )));
        }

        let data = body.read_all().await?;
        let md5 = match body.content_md5() {
            Some(md5) => Some(md5.to_owned()),
            None if request.compute_md5 => Some(content_md5(&data)),
            None => None,
        };

        let mut spec = object_headers(
            RequestSpec::new(http::Method::PUT, &request.bucket, &request.key),
            body,
            request,
        );
        if let Some(md5) = md5 {
            spec = spec.header("content-md5", md5);
        }

        self.call(Operation::PutObject, spec.body(data)).await?;
        debug!(bucket = %request.bucket, key = %request.key, size = body.size(), "put object");
        Ok(())
    }

    /// Download an object, or a byte range of it.
    ///
    /// Returns the bytes for [`ObjectSink::Memory`] and `None` when the body
    /// was written to a file or writer. A file sink is downloaded into a
    /// temporary file next to the target and renamed over it on success, so
    /// a failed download leaves any existing file untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidInput`] for a malformed range or a file
    /// sink whose directory cannot hold a temporary file, and
    /// [`ClientError::GetFailed`] when the service rejects the request.
    pub async fn get_object(&self, request: &GetObjectRequest) -> ClientResult<Option<Bytes>> {
        let range = byte_range(request.range_from, request.range_to)?;

        let staged = match &request.sink {
            ObjectSink::File(path) => Some(staging_file(path)?),
            ObjectSink::Memory | ObjectSink::Writer(_) => None,
        };

        let mut spec = RequestSpec::new(http::Method::GET, &request.bucket, &request.key);
        if let Some(range) = range {
            spec = spec.header("range", range);
        }

        let response = self.call(Operation::GetObject, spec).await?;
        let size = response.body.len();

        let result = match &request.sink {
            ObjectSink::Memory => Some(response.body),
            ObjectSink::File(path) => {
                if let Some(staged) = staged {
                    tokio::fs::write(staged.path(), &response.body).await?;
                    staged.persist(path).map_err(|e| ClientError::Io(e.error))?;
                }
                None
            }
            ObjectSink::Writer(writer) => {
                let mut writer = writer.lock().await;
                writer.write_all(&response.body).await?;
                writer.flush().await?;
                None
            }
        };

        debug!(bucket = %request.bucket, key = %request.key, size, "got object");
        Ok(result)
    }

    /// Delete an object.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::DeleteFailed`] unless the service answers 204.
    pub async fn delete_object(&self, bucket: &str, key: &str) -> ClientResult<()> {
        let spec = RequestSpec::new(http::Method::DELETE, bucket, key);
        self.call(Operation::DeleteObject, spec).await?;
        debug!(bucket, key, "deleted object");
        Ok(())
    }
}

/// Temporary file in the same directory as `target`, so it can be renamed
/// into place. Dropped unpersisted, it deletes itself.
fn staging_file(target: &Path) -> ClientResult<NamedTempFile> {
    let dir = target
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    NamedTempFile::new_in(dir).map_err(|e| {
        ClientError::InvalidInput(format!("cannot download to {}: {e}", target.display()))
    })
}

/// `Range` header value for an inclusive byte range.
///
/// Both bounds or neither; `from` must not exceed `to`.
fn byte_range(from: Option<u64>, to: Option<u64>) -> ClientResult<Option<String>> {
    match (from, to) {
        (None, None) => Ok(None),
        (Some(from), Some(to)) if from <= to => Ok(Some(format!("bytes={from}-{to}"))),
        (Some(from), Some(to)) => Err(ClientError::InvalidInput(format!(
            "range start {from} is after range end {to}"
        ))),
        _ => Err(ClientError::InvalidInput(
            "a byte range needs both a start and an end".to_owned(),
        )),
    }
}

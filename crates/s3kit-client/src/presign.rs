//! Pre-signed GET URLs.

use chrono::{DateTime, Utc};
use s3kit_auth::{AuthError, PresignedParams, Signer, SigningContext, SigningDate, normalize_key};
use s3kit_core::S3ClientConfig;
use tracing::debug;

use crate::error::{ClientError, ClientResult};
use crate::request::PresignRequest;

/// Build a time-limited GET URL for an object. No request is sent.
///
/// The URL is `{scheme}://{host}/{key}?AWSAccessKeyId=..&Expires=..&Signature=..`
/// where `host` is the bucket itself for host-style requests and
/// `endpoint/bucket` otherwise. `Expires` is `now + lifetime` in Unix seconds.
///
/// # Errors
///
/// Returns [`AuthError::MissingAccessKey`] when the configuration has no
/// access key ID, [`ClientError::InvalidInput`] when `now + lifetime` does not
/// fit in Unix seconds, or any error the signer reports.
pub fn build_presigned_url(
    config: &S3ClientConfig,
    signer: &dyn Signer,
    request: &PresignRequest,
    now: DateTime<Utc>,
) -> ClientResult<String> {
    let access_key_id = &config.credentials.access_key_id;
    if access_key_id.is_empty() {
        return Err(AuthError::MissingAccessKey.into());
    }

    let expires = now
        .timestamp()
        .checked_add(request.lifetime_secs)
        .ok_or_else(|| {
            ClientError::InvalidInput(format!(
                "lifetime of {} seconds overflows the expiry time",
                request.lifetime_secs
            ))
        })?;
    let key = normalize_key(&request.key);

    let context = SigningContext::new(
        http::Method::GET,
        &request.bucket,
        &key,
        SigningDate::Expires(expires),
    )
    .with_region(config.region.as_str());
    let signature = signer.sign(&context)?;

    let params = PresignedParams {
        access_key_id: access_key_id.clone(),
        expires,
        signature,
    };

    let scheme = match request.https {
        Some(true) => "https",
        Some(false) => "http",
        None => config.url_scheme(),
    };
    let host = if request.host_style {
        request.bucket.clone()
    } else {
        format!("{}/{}", config.endpoint, request.bucket)
    };

    debug!(bucket = %request.bucket, key = %key, expires, "built pre-signed URL");
    Ok(format!("{scheme}://{host}/{key}?{}", params.to_query()))
}

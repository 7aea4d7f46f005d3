//! The S3 client: configuration, signers and transport wired together.

use std::collections::BTreeMap;
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use s3kit_auth::{SignerRegistry, SigningContext, SigningDate, SigningScheme, encode_key};
use s3kit_core::S3ClientConfig;
use s3kit_model::ServiceError;
use tracing::debug;

use crate::classify::{Operation, classify};
use crate::error::ClientResult;
use crate::presign::build_presigned_url;
use crate::request::PresignRequest;
use crate::transport::{HttpResponse, SignedRequest, Transport};

/// Format of the `Date` header.
const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Client for an S3-compatible service.
///
/// Holds no mutable state between calls. Cloning is cheap and clones share
/// the configuration, signers and transport.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
///
/// use s3kit_auth::{FixedSigner, SignerRegistry, SigningScheme};
/// use s3kit_client::{S3Client, Transport};
/// use s3kit_core::S3ClientConfig;
///
/// # fn run(transport: Arc<dyn Transport>) -> Result<(), s3kit_client::ClientError> {
/// let signers = SignerRegistry::new()
///     .with_signer(Arc::new(FixedSigner::new(SigningScheme::V4, "AWS4-HMAC-SHA256 ...")));
/// let client = S3Client::new(S3ClientConfig::default(), signers, transport)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct S3Client {
    config: Arc<S3ClientConfig>,
    signers: Arc<SignerRegistry>,
    transport: Arc<dyn Transport>,
}

impl S3Client {
    /// Create a client.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ClientError::Config`] if the configuration is invalid.
    pub fn new(
        config: S3ClientConfig,
        signers: SignerRegistry,
        transport: Arc<dyn Transport>,
    ) -> ClientResult<Self> {
        config.validate()?;
        debug!(
            endpoint = %config.endpoint,
            scheme = %config.signing_scheme,
            "created S3 client"
        );
        Ok(Self {
            config: Arc::new(config),
            signers: Arc::new(signers),
            transport,
        })
    }

    /// The client configuration.
    #[must_use]
    pub fn config(&self) -> &S3ClientConfig {
        &self.config
    }

    /// Build a pre-signed GET URL valid from now.
    ///
    /// Always signed with the [`SigningScheme::V2`] signer.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ClientError::Auth`] if no V2 signer is registered, the
    /// access key is missing, or signing fails.
    pub fn presigned_url(&self, request: &PresignRequest) -> ClientResult<String> {
        self.presigned_url_at(request, Utc::now())
    }

    /// Build a pre-signed GET URL valid from `now`.
    ///
    /// # Errors
    ///
    /// See [`S3Client::presigned_url`].
    pub fn presigned_url_at(
        &self,
        request: &PresignRequest,
        now: DateTime<Utc>,
    ) -> ClientResult<String> {
        let signer = self.signers.get(SigningScheme::V2)?;
        build_presigned_url(&self.config, signer.as_ref(), request, now)
    }

    /// Sign, send and classify one request.
    ///
    /// `Ok(None)` means the failure was absorbed by the classifier.
    pub(crate) async fn execute(
        &self,
        operation: Operation,
        spec: RequestSpec,
    ) -> ClientResult<Option<HttpResponse>> {
        let now = Utc::now();
        let RequestSpec {
            method,
            bucket,
            key,
            query,
            mut headers,
            mut amz_headers,
            body,
        } = spec;

        headers.insert("date".to_owned(), now.format(HTTP_DATE_FORMAT).to_string());
        headers
            .entry("host".to_owned())
            .or_insert_with(|| self.config.endpoint.clone());
        if let Some(token) = &self.config.credentials.session_token {
            amz_headers.insert("x-amz-security-token".to_owned(), token.clone());
        }

        let context = SigningContext {
            method: method.clone(),
            bucket: bucket.clone(),
            key: key.clone(),
            query: query.clone(),
            headers: headers.clone(),
            amz_headers: amz_headers.clone(),
            date: SigningDate::Timestamp(now),
            region: self.config.region.as_str().to_owned(),
        };
        let signer = self.signers.get(self.config.signing_scheme)?;
        let authorization = signer.sign(&context)?;

        let request = SignedRequest {
            method,
            scheme: self.config.url_scheme(),
            host: self.config.endpoint.clone(),
            bucket,
            key,
            query,
            headers,
            amz_headers,
            authorization,
            body,
        };
        let path = request.path();

        match classify(operation, self.transport.execute(request).await) {
            Ok(response) => {
                debug!(
                    operation = %operation,
                    path = %path,
                    status = ?response.as_ref().map(|r| r.status),
                    "request completed"
                );
                Ok(response)
            }
            Err(err) => {
                debug!(
                    operation = %operation,
                    path = %path,
                    code = %err.code,
                    "request failed"
                );
                Err(operation.failure(err))
            }
        }
    }

    /// Like [`S3Client::execute`] for operations that never absorb failures.
    pub(crate) async fn call(
        &self,
        operation: Operation,
        spec: RequestSpec,
    ) -> ClientResult<HttpResponse> {
        self.execute(operation, spec).await?.ok_or_else(|| {
            operation.failure(ServiceError::new(
                "EmptyResponse",
                "no response to decode",
            ))
        })
    }
}

/// An unsigned request under construction.
#[derive(Debug, Clone)]
pub(crate) struct RequestSpec {
    pub(crate) method: http::Method,
    pub(crate) bucket: String,
    pub(crate) key: String,
    pub(crate) query: Vec<(String, String)>,
    pub(crate) headers: BTreeMap<String, String>,
    pub(crate) amz_headers: BTreeMap<String, String>,
    pub(crate) body: Bytes,
}

impl RequestSpec {
    /// Start a request for `bucket`/`key`. The key is URI-encoded here.
    pub(crate) fn new(method: http::Method, bucket: &str, key: &str) -> Self {
        Self {
            method,
            bucket: bucket.to_owned(),
            key: encode_key(key),
            query: Vec::new(),
            headers: BTreeMap::new(),
            amz_headers: BTreeMap::new(),
            body: Bytes::new(),
        }
    }

    pub(crate) fn query(mut self, name: &str, value: impl Into<String>) -> Self {
        self.query.push((name.to_owned(), value.into()));
        self
    }

    pub(crate) fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub(crate) fn amz_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.amz_headers
            .insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Attach a body and its `Content-Length`.
    pub(crate) fn body(self, body: Bytes) -> Self {
        let mut spec = self.header("content-length", body.len().to_string());
        spec.body = body;
        spec
    }

    /// Add caller headers, routing `x-amz-*` names (any case) to the amz map.
    pub(crate) fn extra_headers(mut self, headers: &BTreeMap<String, String>) -> Self {
        for (name, value) in headers {
            self = if is_amz_header(name) {
                self.amz_header(name, value.clone())
            } else {
                self.header(name, value.clone())
            };
        }
        self
    }
}

fn is_amz_header(name: &str) -> bool {
    name.get(..6)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("x-amz-"))
}

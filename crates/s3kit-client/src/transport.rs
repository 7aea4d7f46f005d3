//! Transport abstraction: one signed request in, one response out.
//!
//! The client never opens connections. It hands a fully described
//! [`SignedRequest`] to a [`Transport`] and classifies whatever comes back.
//! Retries, TLS and connection pooling belong to the implementation.

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// A transport-level failure: no HTTP response was obtained.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct TransportError {
    /// Transport-specific code, e.g. `"RequestTimeout"` or `"ConnectionRefused"`.
    pub code: String,
    /// Human-readable description.
    pub message: String,
}

impl TransportError {
    /// Create a new transport error.
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// A request ready to be sent.
#[derive(Debug, Clone)]
pub struct SignedRequest {
    /// HTTP verb.
    pub method: http::Method,
    /// `http` or `https`.
    pub scheme: &'static str,
    /// Service host.
    pub host: String,
    /// Bucket; empty for service-level requests.
    pub bucket: String,
    /// URI-encoded object key; empty for bucket-level requests.
    pub key: String,
    /// Query parameters in send order. An empty value renders as a bare name.
    pub query: Vec<(String, String)>,
    /// Plain headers, lowercase names.
    pub headers: BTreeMap<String, String>,
    /// `x-amz-*` headers, lowercase names.
    pub amz_headers: BTreeMap<String, String>,
    /// Value for the `Authorization` header, as produced by the signer.
    pub authorization: String,
    /// Request body.
    pub body: Bytes,
}

impl SignedRequest {
    /// Path-style request path: `/bucket/key`, `/bucket/`, or `/`.
    #[must_use]
    pub fn path(&self) -> String {
        if self.bucket.is_empty() {
            return "/".to_owned();
        }
        format!("/{}/{}", self.bucket, self.key)
    }

    /// The query string without the leading `?`.
    #[must_use]
    pub fn query_string(&self) -> String {
        let mut out = String::new();
        for (name, value) in &self.query {
            if !out.is_empty() {
                out.push('&');
            }
            out.push_str(name);
            if !value.is_empty() {
                out.push('=');
                out.extend(utf8_percent_encode(value, QUERY_VALUE_ENCODE_SET));
            }
        }
        out
    }

    /// Absolute URL of the request.
    #[must_use]
    pub fn url(&self) -> String {
        let query = self.query_string();
        if query.is_empty() {
            format!("{}://{}{}", self.scheme, self.host, self.path())
        } else {
            format!("{}://{}{}?{query}", self.scheme, self.host, self.path())
        }
    }

    /// Look up a plain or `x-amz-*` header by case-insensitive name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .chain(&self.amz_headers)
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Look up a query parameter by name.
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Query values keep RFC 3986 unreserved characters literal.
const QUERY_VALUE_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// A received HTTP response.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// Response headers, lowercase names.
    pub headers: BTreeMap<String, String>,
    /// Raw response body.
    pub body: Bytes,
}

impl HttpResponse {
    /// Create a response with the given status and no headers or body.
    #[must_use]
    pub fn new(status: u16) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    /// Add a header. The name is stored lowercase.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Set the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Look up a header by case-insensitive name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("body_len", &self.body.len())
            .finish()
    }
}

/// Executes signed requests.
#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
    /// Send one request and return the response.
    ///
    /// Any HTTP status is a successful exchange; only failures to obtain a
    /// response are errors.
    async fn execute(&self, request: SignedRequest) -> Result<HttpResponse, TransportError>;
}

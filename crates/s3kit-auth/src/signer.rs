//! Signer trait, signing context, and scheme registry.
//!
//! A [`Signer`] turns a [`SigningContext`] into opaque authorization material.
//! Header-signing schemes return an `Authorization` header value; query
//! signing (pre-signed URLs) returns the bare signature. Concrete schemes live
//! outside this workspace and are registered by the embedding application.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use s3kit_core::SigningScheme;
use tracing::debug;

use crate::error::AuthError;

/// Time basis of a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningDate {
    /// Request time, for header-signed requests.
    Timestamp(DateTime<Utc>),
    /// Absolute expiry in Unix seconds, for query-signed URLs.
    Expires(i64),
}

/// Everything a signer may need to know about one request.
///
/// The client fills this in; it never inspects what the signer returns.
#[derive(Debug, Clone)]
pub struct SigningContext {
    /// HTTP verb.
    pub method: http::Method,
    /// Target bucket; empty for service-level requests.
    pub bucket: String,
    /// Object key, already URI-encoded; empty for bucket-level requests.
    pub key: String,
    /// Query parameters in the order they will be sent.
    pub query: Vec<(String, String)>,
    /// Plain headers, lowercase names.
    pub headers: BTreeMap<String, String>,
    /// `x-amz-*` headers, lowercase names.
    pub amz_headers: BTreeMap<String, String>,
    /// Time basis.
    pub date: SigningDate,
    /// Region for scoped schemes.
    pub region: String,
}

impl SigningContext {
    /// Create a context with no query parameters or headers.
    #[must_use]
    pub fn new(
        method: http::Method,
        bucket: impl Into<String>,
        key: impl Into<String>,
        date: SigningDate,
    ) -> Self {
        Self {
            method,
            bucket: bucket.into(),
            key: key.into(),
            query: Vec::new(),
            headers: BTreeMap::new(),
            amz_headers: BTreeMap::new(),
            date,
            region: String::new(),
        }
    }

    /// Set the region.
    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// The path-style resource, `/bucket/key`, or `/` for the service root.
    #[must_use]
    pub fn resource(&self) -> String {
        if self.bucket.is_empty() {
            return "/".to_owned();
        }
        format!("/{}/{}", self.bucket, self.key)
    }

    /// Look up a plain header by case-insensitive name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A request-signing scheme.
pub trait Signer: Send + Sync + fmt::Debug {
    /// The scheme this signer implements.
    fn scheme(&self) -> SigningScheme;

    /// Produce authorization material for the given request.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::SigningFailed`] if the context cannot be signed.
    fn sign(&self, context: &SigningContext) -> Result<String, AuthError>;
}

/// Signers keyed by scheme.
#[derive(Debug, Clone, Default)]
pub struct SignerRegistry {
    signers: HashMap<SigningScheme, Arc<dyn Signer>>,
}

impl SignerRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a signer under its own scheme, replacing any previous one.
    #[must_use]
    pub fn with_signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.register(signer);
        self
    }

    /// Register a signer under its own scheme, replacing any previous one.
    pub fn register(&mut self, signer: Arc<dyn Signer>) {
        let scheme = signer.scheme();
        debug!(%scheme, "registered signer");
        self.signers.insert(scheme, signer);
    }

    /// Resolve the signer for a scheme.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingSigner`] if nothing is registered for `scheme`.
    pub fn get(&self, scheme: SigningScheme) -> Result<Arc<dyn Signer>, AuthError> {
        self.signers
            .get(&scheme)
            .cloned()
            .ok_or(AuthError::MissingSigner(scheme))
    }
}

/// A signer that returns a preconfigured value regardless of the request.
///
/// Suitable for tests and for endpoints that ignore signatures. Never use
/// it against a real service.
#[derive(Debug, Clone)]
pub struct FixedSigner {
    scheme: SigningScheme,
    signature: String,
}

impl FixedSigner {
    /// Create a signer that always returns `signature`.
    pub fn new(scheme: SigningScheme, signature: impl Into<String>) -> Self {
        Self {
            scheme,
            signature: signature.into(),
        }
    }
}

impl Signer for FixedSigner {
    fn scheme(&self) -> SigningScheme {
        self.scheme
    }

    fn sign(&self, _context: &SigningContext) -> Result<String, AuthError> {
        Ok(self.signature.clone())
    }
}

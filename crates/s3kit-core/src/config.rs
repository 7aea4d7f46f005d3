//! Client configuration.
//!
//! Provides [`S3ClientConfig`], the connection-level settings shared by every
//! operation. Values can be assembled with the builder or loaded from
//! environment variables.

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::error::{CoreError, CoreResult};
use crate::types::{AwsRegion, Credentials, SigningScheme};

/// Endpoint used when none is configured.
const DEFAULT_ENDPOINT: &str = "s3.amazonaws.com";

/// S3 client configuration.
///
/// # Examples
///
/// ```
/// use s3kit_core::{S3ClientConfig, SigningScheme};
///
/// let config = S3ClientConfig::default();
/// assert_eq!(config.endpoint, "s3.amazonaws.com");
/// assert!(config.use_ssl);
/// assert_eq!(config.signing_scheme, SigningScheme::V4);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct S3ClientConfig {
    /// Service host, without URL scheme (e.g. `"s3.amazonaws.com"`).
    #[builder(default = String::from(DEFAULT_ENDPOINT), setter(into))]
    pub endpoint: String,

    /// Region used for V4 signing scopes.
    #[builder(default)]
    pub region: AwsRegion,

    /// Whether requests and generated URLs use `https`.
    #[builder(default = true)]
    pub use_ssl: bool,

    /// Signature scheme for regular requests.
    #[builder(default)]
    pub signing_scheme: SigningScheme,

    /// Access credentials. The access key ID is embedded in pre-signed URLs.
    #[builder(default)]
    pub credentials: Credentials,
}

impl Default for S3ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: String::from(DEFAULT_ENDPOINT),
            region: AwsRegion::default(),
            use_ssl: true,
            signing_scheme: SigningScheme::default(),
            credentials: Credentials::default(),
        }
    }
}

impl S3ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Reads the following environment variables (falling back to defaults):
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `S3_ENDPOINT` | `s3.amazonaws.com` |
    /// | `S3_USE_SSL` | `true` |
    /// | `S3_SIGNATURE_VERSION` | `v4` |
    /// | `DEFAULT_REGION` | `us-east-1` |
    /// | `AWS_ACCESS_KEY_ID` | empty |
    /// | `AWS_SECRET_ACCESS_KEY` | empty |
    /// | `AWS_SESSION_TOKEN` | unset |
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownSigningScheme`] if `S3_SIGNATURE_VERSION`
    /// is set to something other than `v2` or `v4`.
    pub fn from_env() -> CoreResult<Self> {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("S3_ENDPOINT") {
            config.endpoint = v;
        }
        if let Ok(v) = std::env::var("S3_USE_SSL") {
            config.use_ssl = parse_bool(&v);
        }
        if let Ok(v) = std::env::var("S3_SIGNATURE_VERSION") {
            config.signing_scheme = v.parse()?;
        }
        if let Ok(v) = std::env::var("DEFAULT_REGION") {
            config.region = AwsRegion::new(v);
        }
        if let Ok(v) = std::env::var("AWS_ACCESS_KEY_ID") {
            config.credentials.access_key_id = v;
        }
        if let Ok(v) = std::env::var("AWS_SECRET_ACCESS_KEY") {
            config.credentials.secret_access_key = v;
        }
        if let Ok(v) = std::env::var("AWS_SESSION_TOKEN") {
            config.credentials.session_token = Some(v);
        }

        tracing::debug!(
            endpoint = %config.endpoint,
            region = %config.region,
            scheme = %config.signing_scheme,
            "loaded client configuration from environment"
        );

        Ok(config)
    }

    /// Check that the endpoint is a bare host.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidEndpoint`] if the endpoint is empty or
    /// includes a URL scheme or path.
    pub fn validate(&self) -> CoreResult<()> {
        let endpoint = self.endpoint.trim();
        if endpoint.is_empty() || endpoint.contains("://") || endpoint.contains('/') {
            return Err(CoreError::InvalidEndpoint(self.endpoint.clone()));
        }
        Ok(())
    }

    /// URL scheme matching [`S3ClientConfig::use_ssl`].
    #[must_use]
    pub fn url_scheme(&self) -> &'static str {
        if self.use_ssl { "https" } else { "http" }
    }
}

/// Parse a string as a boolean, accepting `"1"` and `"true"` (case-insensitive).
fn parse_bool(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

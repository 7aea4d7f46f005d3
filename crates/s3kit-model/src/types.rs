//! Object references, owners, and canned ACLs.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of a stored object. The server is authoritative for existence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StorageObjectRef {
    /// Bucket name.
    pub bucket: String,
    /// Object key.
    pub key: String,
}

impl StorageObjectRef {
    /// Create a new reference.
    #[must_use]
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for StorageObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

/// Owner of a bucket listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Owner {
    /// Canonical user ID.
    pub id: String,
    /// Display name.
    pub display_name: String,
}

/// Canned ACL sent as `x-amz-acl`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CannedAcl {
    /// Owner-only access.
    #[default]
    #[serde(rename = "private")]
    Private,
    /// Anyone may read.
    #[serde(rename = "public-read")]
    PublicRead,
    /// Anyone may read and write.
    #[serde(rename = "public-read-write")]
    PublicReadWrite,
    /// Any authenticated user may read.
    #[serde(rename = "authenticated-read")]
    AuthenticatedRead,
}

impl CannedAcl {
    /// Returns the header value for this ACL.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::PublicRead => "public-read",
            Self::PublicReadWrite => "public-read-write",
            Self::AuthenticatedRead => "authenticated-read",
        }
    }
}

impl fmt::Display for CannedAcl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for CannedAcl {
    fn from(s: &str) -> Self {
        match s {
            "public-read" => Self::PublicRead,
            "public-read-write" => Self::PublicReadWrite,
            "authenticated-read" => Self::AuthenticatedRead,
            _ => Self::default(),
        }
    }
}

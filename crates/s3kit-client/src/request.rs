//! Operation inputs.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use s3kit_model::{CannedAcl, DEFAULT_PART_SIZE, MultipartSession};
use tokio::io::AsyncWrite;
use tokio::sync::Mutex;
use typed_builder::TypedBuilder;

/// Lifetime of a pre-signed URL when none is given.
pub const DEFAULT_PRESIGN_LIFETIME_SECS: i64 = 10;

/// Delimiter used by listings when none is given.
pub const DEFAULT_DELIMITER: &str = "/";

/// A writer shared with the caller, who keeps a handle to read it back.
pub type SharedWriter = Arc<Mutex<dyn AsyncWrite + Send + Unpin>>;

/// Input for `put_object` and `start_multipart`.
///
/// # Examples
///
/// ```
/// use s3kit_client::PutObjectRequest;
/// use s3kit_model::CannedAcl;
///
/// let req = PutObjectRequest::builder()
///     .bucket("photos")
///     .key("2024/cat.jpg")
///     .acl(CannedAcl::PublicRead)
///     .build();
/// assert!(req.meta.is_empty());
/// ```
#[derive(Debug, Clone, TypedBuilder)]
pub struct PutObjectRequest {
    /// Target bucket.
    #[builder(setter(into))]
    pub bucket: String,
    /// Target key.
    #[builder(setter(into))]
    pub key: String,
    /// Canned ACL.
    #[builder(default)]
    pub acl: CannedAcl,
    /// User metadata, sent as `x-amz-meta-<name>`.
    #[builder(default)]
    pub meta: BTreeMap<String, String>,
    /// Extra request headers. Names starting with `x-amz-` (any case) are
    /// sent as amz headers, the rest as plain headers.
    #[builder(default)]
    pub headers: BTreeMap<String, String>,
    /// Compute `Content-MD5` when the body has none.
    #[builder(default)]
    pub compute_md5: bool,
}

/// Destination for a downloaded object.
#[derive(Clone, Default)]
pub enum ObjectSink {
    /// Return the bytes to the caller.
    #[default]
    Memory,
    /// Create (or truncate) a local file and write the body to it.
    File(PathBuf),
    /// Write the body to a caller-held writer.
    Writer(SharedWriter),
}

impl fmt::Debug for ObjectSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => f.write_str("Memory"),
            Self::File(path) => f.debug_tuple("File").field(path).finish(),
            Self::Writer(_) => f.write_str("Writer(..)"),
        }
    }
}

/// Input for `get_object`.
///
/// A byte range is requested only when both `range_from` and `range_to` are
/// set; supplying exactly one is rejected.
#[derive(Debug, Clone, TypedBuilder)]
pub struct GetObjectRequest {
    /// Source bucket.
    #[builder(setter(into))]
    pub bucket: String,
    /// Source key.
    #[builder(setter(into))]
    pub key: String,
    /// First byte of the range, inclusive.
    #[builder(default, setter(strip_option))]
    pub range_from: Option<u64>,
    /// Last byte of the range, inclusive.
    #[builder(default, setter(strip_option))]
    pub range_to: Option<u64>,
    /// Where the body goes.
    #[builder(default)]
    pub sink: ObjectSink,
}

/// Input for `list_objects`.
#[derive(Debug, Clone, TypedBuilder)]
pub struct ListObjectsRequest {
    /// Bucket to list.
    #[builder(setter(into))]
    pub bucket: String,
    /// Only keys starting with this prefix. Empty lists everything.
    #[builder(default, setter(into))]
    pub prefix: String,
    /// Start after this key. Empty starts at the beginning.
    #[builder(default, setter(into))]
    pub marker: String,
    /// Page size. When set, only the first page is returned.
    #[builder(default, setter(strip_option))]
    pub max_keys: Option<u32>,
    /// Grouping delimiter. Empty disables grouping.
    #[builder(default = DEFAULT_DELIMITER.to_owned(), setter(into))]
    pub delimiter: String,
    /// Collect common prefixes into the result.
    #[builder(default)]
    pub include_common_prefixes: bool,
}

/// Input for `upload_multipart`.
#[derive(Debug, Clone, TypedBuilder)]
pub struct UploadPartRequest {
    /// Target bucket.
    #[builder(setter(into))]
    pub bucket: String,
    /// Target key.
    #[builder(setter(into))]
    pub key: String,
    /// Upload id from `start_multipart`.
    #[builder(setter(into))]
    pub upload_id: String,
    /// 1-based part number.
    pub part_number: u32,
    /// Size of every part but the last.
    #[builder(default = DEFAULT_PART_SIZE)]
    pub part_size: u64,
    /// Extra request headers, split like [`PutObjectRequest::headers`].
    #[builder(default)]
    pub headers: BTreeMap<String, String>,
}

impl UploadPartRequest {
    /// Input for uploading `part_number` of `session`.
    #[must_use]
    pub fn for_session(session: &MultipartSession, part_number: u32) -> Self {
        Self::builder()
            .bucket(session.bucket.as_str())
            .key(session.key.as_str())
            .upload_id(session.upload_id.as_str())
            .part_number(part_number)
            .part_size(session.part_size())
            .build()
    }
}

/// Input for `presigned_url`.
#[derive(Debug, Clone, TypedBuilder)]
pub struct PresignRequest {
    /// Bucket.
    #[builder(setter(into))]
    pub bucket: String,
    /// Key, raw or already percent-encoded.
    #[builder(setter(into))]
    pub key: String,
    /// Seconds until the URL expires.
    #[builder(default = DEFAULT_PRESIGN_LIFETIME_SECS)]
    pub lifetime_secs: i64,
    /// Use `bucket` as the host instead of `endpoint/bucket`.
    #[builder(default)]
    pub host_style: bool,
    /// Override the configured URL scheme.
    #[builder(default, setter(strip_option))]
    pub https: Option<bool>,
}

//! Request body sources with positioned reads.
//!
//! Every body exposes [`Body::read_range`], which reads an independent byte
//! range without touching shared state. In-memory bodies slice their buffer,
//! file bodies open a fresh handle per call, and caller-supplied handles
//! implement [`PositionedRead`]. Concurrent part uploads rely on this.

use std::fmt;
use std::io::{self, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use bytes::Bytes;
use md5::{Digest, Md5};
use tokio::io::{AsyncReadExt, AsyncSeekExt};

/// A byte source that can serve arbitrary ranges concurrently.
#[async_trait]
pub trait PositionedRead: Send + Sync + fmt::Debug {
    /// Read exactly `len` bytes starting at `offset`.
    async fn read_at(&self, offset: u64, len: u64) -> io::Result<Bytes>;
}

/// Where the bytes of a [`Body`] come from.
#[derive(Debug, Clone)]
pub enum BodySource {
    /// An in-memory buffer.
    Data(Bytes),
    /// A local file of known size.
    File {
        /// File path.
        path: PathBuf,
        /// Size in bytes when the body was created.
        size: u64,
    },
    /// A caller-supplied positioned reader.
    Handle {
        /// The reader.
        reader: Arc<dyn PositionedRead>,
        /// Total size in bytes.
        size: u64,
    },
}

/// A request body: bytes plus the metadata sent alongside them.
#[derive(Debug, Clone)]
pub struct Body {
    source: BodySource,
    content_type: Option<String>,
    content_md5: Option<String>,
}

impl Body {
    /// Body backed by an in-memory buffer.
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        Self::new(BodySource::Data(data.into()))
    }

    /// Body backed by a local file. The size is taken now.
    pub async fn from_file(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let size = tokio::fs::metadata(&path).await?.len();
        Ok(Self::new(BodySource::File { path, size }))
    }

    /// Body backed by a caller-supplied reader of `size` bytes.
    pub fn from_reader(reader: Arc<dyn PositionedRead>, size: u64) -> Self {
        Self::new(BodySource::Handle { reader, size })
    }

    fn new(source: BodySource) -> Self {
        Self {
            source,
            content_type: None,
            content_md5: None,
        }
    }

    /// Set the content type.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Set a precomputed base64 `Content-MD5`.
    #[must_use]
    pub fn with_content_md5(mut self, md5: impl Into<String>) -> Self {
        self.content_md5 = Some(md5.into());
        self
    }

    /// The underlying source.
    #[must_use]
    pub fn source(&self) -> &BodySource {
        &self.source
    }

    /// Size in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        match &self.source {
            BodySource::Data(data) => data.len() as u64,
            BodySource::File { size, .. } | BodySource::Handle { size, .. } => *size,
        }
    }

    /// Whether the body has no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Content type, defaulting to `application/octet-stream`.
    #[must_use]
    pub fn content_type(&self) -> String {
        self.content_type
            .clone()
            .unwrap_or_else(|| mime::APPLICATION_OCTET_STREAM.to_string())
    }

    /// The configured `Content-MD5`, if any.
    #[must_use]
    pub fn content_md5(&self) -> Option<&str> {
        self.content_md5.as_deref()
    }

    /// Read `len` bytes starting at `offset`. Repeating a call returns the
    /// same bytes.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the range extends past the end of the body,
    /// or any error from the underlying file or reader.
    ///
    /// # Example
    ///
    /// ```
    /// # tokio_test::block_on(async {
    /// use s3kit_client::Body;
    ///
    /// let body = Body::from_bytes("hello, world");
    /// let part = body.read_range(7, 5).await.unwrap();
    /// assert_eq!(&part[..], b"world");
    /// # });
    /// ```
    pub async fn read_range(&self, offset: u64, len: u64) -> io::Result<Bytes> {
        let end = offset
            .checked_add(len)
            .filter(|end| *end <= self.size())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!(
                        "range {offset}+{len} exceeds body size {}",
                        self.size()
                    ),
                )
            })?;

        match &self.source {
            BodySource::Data(data) => {
                let start = to_usize(offset)?;
                let end = to_usize(end)?;
                Ok(data.slice(start..end))
            }
            BodySource::File { path, .. } => read_file_range(path, offset, len).await,
            BodySource::Handle { reader, .. } => reader.read_at(offset, len).await,
        }
    }

    /// Read the whole body.
    pub async fn read_all(&self) -> io::Result<Bytes> {
        self.read_range(0, self.size()).await
    }

    /// Compute the base64 MD5 of the whole body.
    pub async fn compute_content_md5(&self) -> io::Result<String> {
        let data = self.read_all().await?;
        Ok(content_md5(&data))
    }
}

/// Base64 MD5 digest of `data`, as sent in `Content-MD5`.
#[must_use]
pub fn content_md5(data: &[u8]) -> String {
    BASE64_STANDARD.encode(Md5::digest(data))
}

async fn read_file_range(path: &Path, offset: u64, len: u64) -> io::Result<Bytes> {
    let mut file = tokio::fs::File::open(path).await?;
    file.seek(SeekFrom::Start(offset)).await?;
    let mut buf = vec![0u8; to_usize(len)?];
    file.read_exact(&mut buf).await?;
    Ok(Bytes::from(buf))
}

fn to_usize(n: u64) -> io::Result<usize> {
    usize::try_from(n).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{n} does not fit in memory"),
        )
    })
}

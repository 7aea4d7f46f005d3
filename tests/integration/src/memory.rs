//! In-memory S3 service implementing [`Transport`].
//!
//! Understands the requests the client sends: object put/get/delete, bucket
//! and object listings, and the multipart create/upload/complete steps.
//! Errors come back as S3 `<Error>` documents with realistic status codes.
//! Tests can inject transport failures and inspect every request received.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use bytes::Bytes;
use chrono::{DateTime, SecondsFormat, Utc};
use md5::{Digest, Md5};
use percent_encoding::percent_decode_str;
use quick_xml::Reader;
use quick_xml::escape::{escape, resolve_predefined_entity};
use quick_xml::events::Event;
use s3kit_client::{HttpResponse, SignedRequest, Transport, TransportError};
use s3kit_model::ServiceError;
use s3kit_xml::S3_NAMESPACE;

/// Owner reported by bucket listings.
pub const OWNER_ID: &str = "75aa57f09aa0c8caeab4f8c24e99d10f8e7faeebf76c078efc7c6caea54ba06a";

/// Objects per listing page when the caller does not ask for fewer.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// A stored object.
#[derive(Debug, Clone)]
pub struct StoredObject {
    /// Object bytes.
    pub data: Bytes,
    /// Unquoted etag.
    pub etag: String,
    /// Content type sent on upload.
    pub content_type: String,
    /// Canned ACL sent on upload.
    pub acl: String,
    /// `x-amz-meta-*` values by lowercase name, prefix removed.
    pub metadata: BTreeMap<String, String>,
    /// Upload time.
    pub last_modified: DateTime<Utc>,
}

#[derive(Debug)]
struct Bucket {
    created: DateTime<Utc>,
    objects: BTreeMap<String, StoredObject>,
}

#[derive(Debug)]
struct Upload {
    bucket: String,
    key: String,
    content_type: String,
    acl: String,
    metadata: BTreeMap<String, String>,
    parts: BTreeMap<u32, (String, Bytes)>,
}

#[derive(Debug, Default)]
struct State {
    buckets: BTreeMap<String, Bucket>,
    uploads: HashMap<String, Upload>,
    requests: Vec<SignedRequest>,
    failures: BTreeMap<usize, TransportError>,
}

type Failure = (u16, ServiceError);

/// In-memory S3-compatible service.
#[derive(Debug)]
pub struct MemoryS3 {
    state: Mutex<State>,
    page_size: usize,
    timeout_after_complete: AtomicBool,
}

impl Default for MemoryS3 {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryS3 {
    /// Create an empty service.
    #[must_use]
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    /// Create an empty service that truncates listings at `page_size` entries.
    #[must_use]
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            state: Mutex::new(State::default()),
            page_size: page_size.max(1),
            timeout_after_complete: AtomicBool::new(false),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Create a bucket directly.
    pub fn create_bucket(&self, name: &str) {
        self.state().buckets.insert(
            name.to_owned(),
            Bucket {
                created: Utc::now(),
                objects: BTreeMap::new(),
            },
        );
    }

    /// Store an object directly, bypassing the client.
    pub fn insert_object(&self, bucket: &str, key: &str, data: impl Into<Bytes>) {
        let data = data.into();
        let object = StoredObject {
            etag: hex::encode(Md5::digest(&data)),
            data,
            content_type: mime_default(),
            acl: "private".to_owned(),
            metadata: BTreeMap::new(),
            last_modified: Utc::now(),
        };
        if let Some(b) = self.state().buckets.get_mut(bucket) {
            b.objects.insert(key.to_owned(), object);
        }
    }

    /// A stored object.
    #[must_use]
    pub fn object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.state()
            .buckets
            .get(bucket)
            .and_then(|b| b.objects.get(key).cloned())
    }

    /// Number of multipart uploads started but not completed.
    #[must_use]
    pub fn open_uploads(&self) -> usize {
        self.state().uploads.len()
    }

    /// Every request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<SignedRequest> {
        self.state().requests.clone()
    }

    /// Fail the request `offset` positions from now (0 = the next one) with a
    /// transport error.
    pub fn fail_request_at(&self, offset: usize, error: TransportError) {
        let mut state = self.state();
        let index = state.requests.len() + offset;
        state.failures.insert(index, error);
    }

    /// Complete multipart uploads but report `RequestTimeout`, as S3 may do
    /// for slow merges.
    pub fn time_out_after_complete(&self, enabled: bool) {
        self.timeout_after_complete.store(enabled, Ordering::SeqCst);
    }

    fn handle(&self, request: &SignedRequest) -> Result<HttpResponse, Failure> {
        if request.authorization.is_empty() {
            return Err(failure(403, "AccessDenied", "Access Denied"));
        }

        let key = decode_key(&request.key);
        let method = &request.method;

        if request.bucket.is_empty() {
            return match *method {
                http::Method::GET => Ok(self.list_buckets()),
                _ => Err(failure(405, "MethodNotAllowed", "method not allowed")),
            };
        }

        if key.is_empty() {
            return match *method {
                http::Method::GET => self.list_objects(request),
                _ => Err(failure(405, "MethodNotAllowed", "method not allowed")),
            };
        }

        match *method {
            http::Method::PUT if request.query_param("partNumber").is_some() => {
                self.upload_part(request)
            }
            http::Method::PUT => self.put_object(request, &key),
            http::Method::GET => self.get_object(request, &key),
            http::Method::DELETE => self.delete_object(request, &key),
            http::Method::POST if request.query_param("uploads").is_some() => {
                self.create_upload(request, &key)
            }
            http::Method::POST if request.query_param("uploadId").is_some() => {
                self.complete_upload(request, &key)
            }
            _ => Err(failure(405, "MethodNotAllowed", "method not allowed")),
        }
    }

    fn list_buckets(&self) -> HttpResponse {
        let state = self.state();
        let mut xml = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
             <ListAllMyBucketsResult xmlns=\"{S3_NAMESPACE}\">\
             <Owner><ID>{OWNER_ID}</ID><DisplayName>tester</DisplayName></Owner><Buckets>"
        );
        for (name, bucket) in &state.buckets {
            xml.push_str(&format!(
                "<Bucket><Name>{}</Name><CreationDate>{}</CreationDate></Bucket>",
                escape(name.as_str()),
                timestamp(bucket.created)
            ));
        }
        xml.push_str("</Buckets></ListAllMyBucketsResult>");
        HttpResponse::new(200)
            .with_header("content-type", "application/xml")
            .with_body(xml)
    }

    fn list_objects(&self, request: &SignedRequest) -> Result<HttpResponse, Failure> {
        let prefix = request.query_param("prefix").unwrap_or_default();
        let marker = request.query_param("marker").unwrap_or_default();
        let delimiter = request.query_param("delimiter").unwrap_or_default();
        let limit = match request.query_param("max-keys") {
            Some(v) => v
                .parse::<usize>()
                .map_err(|_| failure(400, "InvalidArgument", "max-keys must be an integer"))?,
            None => self.page_size,
        }
        .min(self.page_size);

        let state = self.state();
        let bucket = state
            .buckets
            .get(&request.bucket)
            .ok_or_else(|| no_such_bucket(&request.bucket))?;

        let mut contents = String::new();
        let mut prefixes: Vec<String> = Vec::new();
        let mut emitted = 0usize;
        let mut last = None;
        let mut truncated = false;

        for (key, object) in &bucket.objects {
            if !key.starts_with(prefix) || key.as_str() <= marker {
                continue;
            }
            let group = (!delimiter.is_empty())
                .then(|| key[prefix.len()..].find(delimiter))
                .flatten()
                .map(|i| key[..prefix.len() + i + delimiter.len()].to_owned());

            if let Some(group) = &group {
                if group.as_str() <= marker || prefixes.last() == Some(group) {
                    continue;
                }
            }
            if emitted == limit {
                truncated = true;
                break;
            }
            emitted += 1;

            match group {
                Some(group) => {
                    last = Some(group.clone());
                    prefixes.push(group);
                }
                None => {
                    last = Some(key.clone());
                    contents.push_str(&format!(
                        "<Contents><Key>{}</Key><LastModified>{}</LastModified>\
                         <ETag>&quot;{}&quot;</ETag><Size>{}</Size>\
                         <StorageClass>STANDARD</StorageClass></Contents>",
                        escape(key.as_str()),
                        timestamp(object.last_modified),
                        object.etag,
                        object.data.len()
                    ));
                }
            }
        }

        let mut xml = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
             <ListBucketResult xmlns=\"{S3_NAMESPACE}\">\
             <Name>{}</Name><Prefix>{}</Prefix><Marker>{}</Marker>\
             <MaxKeys>{limit}</MaxKeys><IsTruncated>{truncated}</IsTruncated>",
            escape(request.bucket.as_str()),
            escape(prefix),
            escape(marker),
        );
        if truncated && !delimiter.is_empty() {
            if let Some(last) = &last {
                xml.push_str(&format!("<NextMarker>{}</NextMarker>", escape(last.as_str())));
            }
        }
        xml.push_str(&contents);
        for p in &prefixes {
            xml.push_str(&format!(
                "<CommonPrefixes><Prefix>{}</Prefix></CommonPrefixes>",
                escape(p.as_str())
            ));
        }
        xml.push_str("</ListBucketResult>");

        Ok(HttpResponse::new(200)
            .with_header("content-type", "application/xml")
            .with_body(xml))
    }

    fn put_object(&self, request: &SignedRequest, key: &str) -> Result<HttpResponse, Failure> {
        if let Some(expected) = request.header("content-md5") {
            if BASE64_STANDARD.encode(Md5::digest(&request.body)) != expected {
                return Err(failure(
                    400,
                    "BadDigest",
                    "The Content-MD5 you specified did not match what we received.",
                ));
            }
        }

        let object = StoredObject {
            data: request.body.clone(),
            etag: hex::encode(Md5::digest(&request.body)),
            content_type: request
                .header("content-type")
                .map_or_else(mime_default, str::to_owned),
            acl: request.header("x-amz-acl").unwrap_or("private").to_owned(),
            metadata: metadata(request),
            last_modified: Utc::now(),
        };
        let etag = object.etag.clone();

        let mut state = self.state();
        let bucket = state
            .buckets
            .get_mut(&request.bucket)
            .ok_or_else(|| no_such_bucket(&request.bucket))?;
        bucket.objects.insert(key.to_owned(), object);

        Ok(HttpResponse::new(200).with_header("etag", format!("\"{etag}\"")))
    }

    fn get_object(&self, request: &SignedRequest, key: &str) -> Result<HttpResponse, Failure> {
        let state = self.state();
        let object = state
            .buckets
            .get(&request.bucket)
            .ok_or_else(|| no_such_bucket(&request.bucket))?
            .objects
            .get(key)
            .ok_or_else(|| {
                failure(404, "NoSuchKey", "The specified key does not exist.")
                    .with_resource(key)
            })?;

        let response = HttpResponse::new(200)
            .with_header("etag", format!("\"{}\"", object.etag))
            .with_header("content-type", object.content_type.clone());

        let Some(range) = request.header("range") else {
            return Ok(response.with_body(object.data.clone()));
        };
        let (start, end) = parse_range(range, object.data.len()).ok_or_else(|| {
            failure(
                416,
                "InvalidRange",
                "The requested range is not satisfiable",
            )
        })?;

        let mut partial = response.with_body(object.data.slice(start..=end));
        partial.status = 206;
        Ok(partial.with_header(
            "content-range",
            format!("bytes {start}-{end}/{}", object.data.len()),
        ))
    }

    fn delete_object(&self, request: &SignedRequest, key: &str) -> Result<HttpResponse, Failure> {
        let mut state = self.state();
        let bucket = state
            .buckets
            .get_mut(&request.bucket)
            .ok_or_else(|| no_such_bucket(&request.bucket))?;
        bucket.objects.remove(key);
        Ok(HttpResponse::new(204))
    }

    fn create_upload(&self, request: &SignedRequest, key: &str) -> Result<HttpResponse, Failure> {
        let mut state = self.state();
        if !state.buckets.contains_key(&request.bucket) {
            return Err(no_such_bucket(&request.bucket));
        }

        let upload_id = uuid::Uuid::new_v4().simple().to_string();
        state.uploads.insert(
            upload_id.clone(),
            Upload {
                bucket: request.bucket.clone(),
                key: key.to_owned(),
                content_type: request
                    .header("content-type")
                    .map_or_else(mime_default, str::to_owned),
                acl: request.header("x-amz-acl").unwrap_or("private").to_owned(),
                metadata: metadata(request),
                parts: BTreeMap::new(),
            },
        );

        let xml = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
             <InitiateMultipartUploadResult xmlns=\"{S3_NAMESPACE}\">\
             <Bucket>{}</Bucket><Key>{}</Key><UploadId>{upload_id}</UploadId>\
             </InitiateMultipartUploadResult>",
            escape(request.bucket.as_str()),
            escape(key),
        );
        Ok(HttpResponse::new(200).with_body(xml))
    }

    fn upload_part(&self, request: &SignedRequest) -> Result<HttpResponse, Failure> {
        let part_number = request
            .query_param("partNumber")
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|n| (1..=10_000).contains(n))
            .ok_or_else(|| {
                failure(
                    400,
                    "InvalidArgument",
                    "Part number must be an integer between 1 and 10000, inclusive",
                )
            })?;
        let upload_id = request.query_param("uploadId").unwrap_or_default();

        let mut state = self.state();
        let upload = state
            .uploads
            .get_mut(upload_id)
            .ok_or_else(|| no_such_upload(upload_id))?;

        let etag = hex::encode(Md5::digest(&request.body));
        upload
            .parts
            .insert(part_number, (etag.clone(), request.body.clone()));

        Ok(HttpResponse::new(200).with_header("etag", format!("\"{etag}\"")))
    }

    fn complete_upload(&self, request: &SignedRequest, key: &str) -> Result<HttpResponse, Failure> {
        let upload_id = request.query_param("uploadId").unwrap_or_default();
        let parts = parse_manifest(&request.body)?;
        if parts.is_empty() {
            return Err(failure(
                400,
                "MalformedXML",
                "The XML you provided was not well-formed",
            ));
        }

        let mut state = self.state();
        let upload = state
            .uploads
            .get(upload_id)
            .filter(|u| u.bucket == request.bucket && u.key == key)
            .ok_or_else(|| no_such_upload(upload_id))?;

        let mut data = Vec::new();
        let mut part_digests = Vec::new();
        let mut previous = 0;
        for part in &parts {
            if part.part_number <= previous {
                return Err(failure(
                    400,
                    "InvalidPartOrder",
                    "The list of parts was not in ascending order.",
                ));
            }
            previous = part.part_number;

            let (etag, bytes) = upload
                .parts
                .get(&part.part_number)
                .filter(|(etag, _)| etag == part.etag.trim_matches('"'))
                .ok_or_else(|| {
                    failure(
                        400,
                        "InvalidPart",
                        "One or more of the specified parts could not be found.",
                    )
                })?;
            data.extend_from_slice(bytes);
            part_digests.extend(hex::decode(etag).unwrap_or_default());
        }

        let etag = format!(
            "{}-{}",
            hex::encode(Md5::digest(&part_digests)),
            parts.len()
        );
        let object = StoredObject {
            data: Bytes::from(data),
            etag: etag.clone(),
            content_type: upload.content_type.clone(),
            acl: upload.acl.clone(),
            metadata: upload.metadata.clone(),
            last_modified: Utc::now(),
        };
        state.uploads.remove(upload_id);
        let bucket = state
            .buckets
            .get_mut(&request.bucket)
            .ok_or_else(|| no_such_bucket(&request.bucket))?;
        bucket.objects.insert(key.to_owned(), object);

        let xml = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
             <CompleteMultipartUploadResult xmlns=\"{S3_NAMESPACE}\">\
             <Bucket>{}</Bucket><Key>{}</Key><ETag>&quot;{etag}&quot;</ETag>\
             </CompleteMultipartUploadResult>",
            escape(request.bucket.as_str()),
            escape(key),
        );
        Ok(HttpResponse::new(200).with_body(xml))
    }
}

#[async_trait]
impl Transport for MemoryS3 {
    async fn execute(&self, request: SignedRequest) -> Result<HttpResponse, TransportError> {
        let injected = {
            let mut state = self.state();
            let index = state.requests.len();
            state.requests.push(request.clone());
            state.failures.remove(&index)
        };
        if let Some(error) = injected {
            tracing::debug!(path = %request.path(), code = %error.code, "injected transport failure");
            return Err(error);
        }

        let completing = request.method == http::Method::POST
            && request.query_param("uploadId").is_some();

        match self.handle(&request) {
            Ok(_) if completing && self.timeout_after_complete.load(Ordering::SeqCst) => {
                Err(TransportError::new(
                    "RequestTimeout",
                    "Your socket connection to the server was not read from or written to \
                     within the timeout period.",
                ))
            }
            Ok(response) => Ok(response),
            Err((status, error)) => {
                let error = if error.resource.is_some() {
                    error
                } else {
                    error.with_resource(request.path())
                };
                Ok(HttpResponse::new(status)
                    .with_header("content-type", "application/xml")
                    .with_body(error_document(&error)))
            }
        }
    }
}

trait WithResource {
    fn with_resource(self, resource: &str) -> Self;
}

impl WithResource for Failure {
    fn with_resource(self, resource: &str) -> Self {
        (self.0, self.1.with_resource(resource))
    }
}

fn failure(status: u16, code: &str, message: &str) -> Failure {
    (status, ServiceError::new(code, message))
}

fn no_such_bucket(bucket: &str) -> Failure {
    failure(404, "NoSuchBucket", "The specified bucket does not exist").with_resource(bucket)
}

fn no_such_upload(upload_id: &str) -> Failure {
    failure(
        404,
        "NoSuchUpload",
        "The specified multipart upload does not exist.",
    )
    .with_resource(upload_id)
}

/// Format `error` as an S3 `<Error>` document.
fn error_document(error: &ServiceError) -> String {
    let resource = error
        .resource
        .as_deref()
        .map(|r| format!("<Resource>{}</Resource>", escape(r)))
        .unwrap_or_default();
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <Error><Code>{}</Code><Message>{}</Message>{resource}</Error>",
        escape(error.code.as_str()),
        escape(error.message.as_str()),
    )
}

/// One `<Part>` of a `CompleteMultipartUpload` manifest.
#[derive(Debug, Default, PartialEq, Eq)]
struct ManifestPart {
    part_number: u32,
    etag: String,
}

/// Read the parts of a `CompleteMultipartUpload` manifest in document order.
fn parse_manifest(body: &[u8]) -> Result<Vec<ManifestPart>, Failure> {
    let malformed = |detail: String| failure(400, "MalformedXML", &detail);
    let mut reader = Reader::from_reader(body);
    let mut parts = Vec::new();
    let mut current: Option<ManifestPart> = None;
    let mut text = String::new();

    loop {
        match reader.read_event().map_err(|e| malformed(e.to_string()))? {
            Event::Start(e) => {
                if e.local_name().as_ref() == b"Part" {
                    current = Some(ManifestPart::default());
                }
                text.clear();
            }
            Event::Text(e) => {
                text.push_str(&e.decode().map_err(|e| malformed(e.to_string()))?);
            }
            Event::GeneralRef(e) => {
                let name = e.decode().map_err(|e| malformed(e.to_string()))?;
                text.push_str(resolve_predefined_entity(&name).unwrap_or_default());
            }
            Event::End(e) => {
                match (e.local_name().as_ref(), current.as_mut()) {
                    (b"PartNumber", Some(part)) => {
                        part.part_number = text
                            .trim()
                            .parse()
                            .map_err(|_| malformed(format!("invalid part number '{text}'")))?;
                    }
                    (b"ETag", Some(part)) => part.etag = text.trim().trim_matches('"').to_owned(),
                    (b"Part", _) => parts.extend(current.take()),
                    _ => {}
                }
                text.clear();
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(parts)
}

fn decode_key(key: &str) -> String {
    percent_decode_str(key).decode_utf8_lossy().into_owned()
}

fn metadata(request: &SignedRequest) -> BTreeMap<String, String> {
    request
        .amz_headers
        .iter()
        .filter_map(|(name, value)| {
            name.strip_prefix("x-amz-meta-")
                .map(|n| (n.to_owned(), value.clone()))
        })
        .collect()
}

fn mime_default() -> String {
    "binary/octet-stream".to_owned()
}

fn timestamp(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse `bytes=start-end` against an object of `len` bytes, clamping `end`.
fn parse_range(header: &str, len: usize) -> Option<(usize, usize)> {
    let (start, end) = header.strip_prefix("bytes=")?.split_once('-')?;
    let start: usize = start.parse().ok()?;
    let end: usize = end.parse().ok()?;
    if start > end || start >= len {
        return None;
    }
    Some((start, end.min(len - 1)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_parse_and_clamp_ranges() {
        assert_eq!(parse_range("bytes=0-4", 10), Some((0, 4)));
        assert_eq!(parse_range("bytes=5-100", 10), Some((5, 9)));
        assert_eq!(parse_range("bytes=10-12", 10), None);
        assert_eq!(parse_range("bytes=4-2", 10), None);
        assert_eq!(parse_range("items=0-1", 10), None);
    }

    #[test]
    fn test_should_decode_keys() {
        assert_eq!(decode_key("dir/a%20b+c.txt"), "dir/a b+c.txt");
        assert_eq!(decode_key("100%2525%20off"), "100%25 off");
    }

    #[test]
    fn test_should_read_manifest_parts() {
        let body = br#"<?xml version="1.0" encoding="UTF-8"?>
            <CompleteMultipartUpload xmlns="http://s3.amazonaws.com/doc/2006-03-01/">
              <Part><PartNumber>1</PartNumber><ETag>&quot;abc&quot;</ETag></Part>
              <Part><PartNumber>2</PartNumber><ETag>def</ETag></Part>
            </CompleteMultipartUpload>"#;

        let parts = parse_manifest(body).unwrap();
        assert_eq!(
            parts,
            vec![
                ManifestPart {
                    part_number: 1,
                    etag: "abc".to_owned()
                },
                ManifestPart {
                    part_number: 2,
                    etag: "def".to_owned()
                },
            ]
        );
        assert_eq!(
            parse_manifest(b"<CompleteMultipartUpload><Part><PartNumber>x</PartNumber></Part>")
                .unwrap_err()
                .1
                .code,
            "MalformedXML"
        );
    }

    #[test]
    fn test_should_format_escaped_error_document() {
        let error = ServiceError::new("InvalidArgument", "size must be < 5 & > 0")
            .with_resource("/b/k");
        let xml = error_document(&error);
        assert!(xml.contains("<Code>InvalidArgument</Code>"));
        assert!(xml.contains("size must be &lt; 5 &amp; &gt; 0"));
        assert!(xml.contains("<Resource>/b/k</Resource>"));
        assert!(!error_document(&ServiceError::new("E", "m")).contains("<Resource>"));
    }
}

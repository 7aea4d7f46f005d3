//! S3 XML deserialization: parsing S3 response bodies into model types.
//!
//! This module provides the [`S3Deserialize`] trait and implementations for the
//! response documents the client reads. Unknown elements are skipped so newer
//! service fields never break decoding.

use quick_xml::Reader;
use quick_xml::events::Event;
use s3kit_model::{
    BucketEntry, BucketInventory, CommonPrefix, ListingPage, MultipartUploadInit, ObjectMetadata,
    Owner, ServiceError,
};

use crate::error::XmlError;

/// Trait for deserializing S3 types from XML.
///
/// The root element has already been consumed by the caller; the
/// implementation reads child elements until the matching end tag.
pub trait S3Deserialize: Sized {
    /// Deserialize an instance from the given XML reader.
    ///
    /// The reader is positioned just after the opening tag of this element.
    ///
    /// # Errors
    ///
    /// Returns `XmlError` if the XML is malformed or required fields are missing.
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError>;
}

/// Deserialize S3 XML into a typed value.
///
/// Finds the root element and delegates to the type's `S3Deserialize`
/// implementation. The root element's name is not checked.
///
/// # Errors
///
/// Returns `XmlError` if the XML is malformed or deserialization fails.
pub fn from_xml<T: S3Deserialize>(xml: &[u8]) -> Result<T, XmlError> {
    // Text is not trimmed: keys may carry significant leading or trailing
    // whitespace, and whitespace between elements is ignored below anyway.
    let mut reader = Reader::from_reader(xml);

    loop {
        match reader.read_event()? {
            Event::Start(_) => {
                return T::deserialize_xml(&mut reader);
            }
            Event::Eof => {
                return Err(XmlError::MissingElement("root element".to_string()));
            }
            _ => {}
        }
    }
}

/// Name of the document's root element.
///
/// # Errors
///
/// Returns `XmlError` if the input is not XML or has no root element.
pub fn root_element(xml: &[u8]) -> Result<String, XmlError> {
    let mut reader = Reader::from_reader(xml);

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) => {
                let name = e.name();
                let tag_name = std::str::from_utf8(name.as_ref())
                    .map_err(|e| XmlError::ParseError(e.to_string()))?;
                return Ok(tag_name.to_owned());
            }
            Event::Eof => {
                return Err(XmlError::MissingElement("root element".to_string()));
            }
            _ => {}
        }
    }
}

/// Decode `xml` as an S3 `<Error>` document.
///
/// Returns `None` for empty bodies, malformed XML, or any other root element.
#[must_use]
pub fn parse_error_body(xml: &[u8]) -> Option<ServiceError> {
    if xml.is_empty() {
        return None;
    }
    match root_element(xml) {
        Ok(root) if root == "Error" => from_xml(xml).ok(),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Helper functions for reading common XML patterns
// ---------------------------------------------------------------------------

/// Read the text content of the current element and consume its end tag.
fn read_text_content(reader: &mut Reader<&[u8]>) -> Result<String, XmlError> {
    let mut text = String::new();
    loop {
        match reader.read_event()? {
            Event::Text(e) => {
                let decoded = e
                    .decode()
                    .map_err(|err| XmlError::ParseError(err.to_string()))?;
                text.push_str(&decoded);
            }
            Event::CData(e) => {
                let decoded = e
                    .decode()
                    .map_err(|err| XmlError::ParseError(err.to_string()))?;
                text.push_str(&decoded);
            }
            Event::GeneralRef(e) => {
                if let Some(ch) = e
                    .resolve_char_ref()
                    .map_err(|err| XmlError::ParseError(err.to_string()))?
                {
                    text.push(ch);
                } else {
                    let name = e
                        .decode()
                        .map_err(|err| XmlError::ParseError(err.to_string()))?;
                    let resolved = quick_xml::escape::resolve_predefined_entity(&name)
                        .ok_or_else(|| XmlError::ParseError(format!("unknown entity &{name};")))?;
                    text.push_str(resolved);
                }
            }
            Event::End(_) => {
                return Ok(text);
            }
            Event::Eof => {
                return Err(XmlError::UnexpectedElement(
                    "unexpected EOF while reading text content".to_string(),
                ));
            }
            _ => {}
        }
    }
}

/// Skip over an element and all its children.
fn skip_element(reader: &mut Reader<&[u8]>) -> Result<(), XmlError> {
    let mut depth: u32 = 1;
    loop {
        match reader.read_event()? {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            }
            Event::Eof => {
                return Err(XmlError::UnexpectedElement(
                    "unexpected EOF while skipping element".to_string(),
                ));
            }
            _ => {}
        }
    }
}

/// Parse a boolean from XML text ("true"/"false").
fn parse_bool(s: &str) -> Result<bool, XmlError> {
    match s.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(XmlError::ParseError(format!("invalid boolean: {s}"))),
    }
}

/// Parse a u64 from XML text.
fn parse_u64(s: &str) -> Result<u64, XmlError> {
    s.trim()
        .parse::<u64>()
        .map_err(|e| XmlError::ParseError(format!("invalid u64 '{s}': {e}")))
}

/// Parse an ISO 8601 timestamp from XML text.
fn parse_timestamp(s: &str) -> Result<chrono::DateTime<chrono::Utc>, XmlError> {
    let s = s.trim();
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .or_else(|_| {
            // S3 format without offset: 2006-02-03T16:45:09.000Z
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.fZ")
                .map(|ndt| ndt.and_utc())
        })
        .map_err(|e| XmlError::ParseError(format!("invalid timestamp '{s}': {e}")))
}

/// Remove the quotes S3 wraps around ETag values.
fn strip_etag_quotes(s: &str) -> String {
    s.trim().trim_matches('"').to_owned()
}

/// Deserialize a list of items where each item is wrapped in the given element name.
fn deserialize_list<T: S3Deserialize>(
    reader: &mut Reader<&[u8]>,
    item_tag: &str,
) -> Result<Vec<T>, XmlError> {
    let mut items = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = e.name();
                let tag_name = std::str::from_utf8(name.as_ref())
                    .map_err(|e| XmlError::ParseError(e.to_string()))?;
                if tag_name == item_tag {
                    items.push(T::deserialize_xml(reader)?);
                } else {
                    skip_element(reader)?;
                }
            }
            Event::End(_) => break,
            Event::Eof => {
                return Err(XmlError::UnexpectedElement(
                    "unexpected EOF in list".to_string(),
                ));
            }
            _ => {}
        }
    }

    Ok(items)
}

// ---------------------------------------------------------------------------
// S3Deserialize implementations for response types
// ---------------------------------------------------------------------------

impl S3Deserialize for ServiceError {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut code = None;
        let mut message = None;
        let mut resource = None;

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    let name = e.name();
                    let tag_name = std::str::from_utf8(name.as_ref())
                        .map_err(|e| XmlError::ParseError(e.to_string()))?;
                    match tag_name {
                        "Code" => code = Some(read_text_content(reader)?),
                        "Message" => message = Some(read_text_content(reader)?),
                        "Resource" => resource = Some(read_text_content(reader)?),
                        _ => skip_element(reader)?,
                    }
                }
                Event::End(_) => break,
                Event::Eof => {
                    return Err(XmlError::UnexpectedElement(
                        "unexpected EOF in Error".to_string(),
                    ));
                }
                _ => {}
            }
        }

        Ok(ServiceError {
            code: code.ok_or_else(|| XmlError::MissingElement("Code".to_string()))?,
            message: message.unwrap_or_default(),
            resource,
        })
    }
}

impl S3Deserialize for Owner {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut id = None;
        let mut display_name = None;

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    let name = e.name();
                    let tag_name = std::str::from_utf8(name.as_ref())
                        .map_err(|e| XmlError::ParseError(e.to_string()))?;
                    match tag_name {
                        "ID" => id = Some(read_text_content(reader)?),
                        "DisplayName" => display_name = Some(read_text_content(reader)?),
                        _ => skip_element(reader)?,
                    }
                }
                Event::End(_) => break,
                Event::Eof => {
                    return Err(XmlError::UnexpectedElement(
                        "unexpected EOF in Owner".to_string(),
                    ));
                }
                _ => {}
            }
        }

        Ok(Owner {
            id: id.unwrap_or_default(),
            display_name: display_name.unwrap_or_default(),
        })
    }
}

impl S3Deserialize for ObjectMetadata {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut key = None;
        let mut last_modified = None;
        let mut size = 0;
        let mut etag = String::new();

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    let name = e.name();
                    let tag_name = std::str::from_utf8(name.as_ref())
                        .map_err(|e| XmlError::ParseError(e.to_string()))?;
                    match tag_name {
                        "Key" => key = Some(read_text_content(reader)?),
                        "LastModified" => {
                            let text = read_text_content(reader)?;
                            last_modified = Some(parse_timestamp(&text)?);
                        }
                        "Size" => {
                            let text = read_text_content(reader)?;
                            size = parse_u64(&text)?;
                        }
                        "ETag" => etag = strip_etag_quotes(&read_text_content(reader)?),
                        _ => skip_element(reader)?,
                    }
                }
                Event::End(_) => break,
                Event::Eof => {
                    return Err(XmlError::UnexpectedElement(
                        "unexpected EOF in Contents".to_string(),
                    ));
                }
                _ => {}
            }
        }

        Ok(ObjectMetadata {
            name: key.ok_or_else(|| XmlError::MissingElement("Key".to_string()))?,
            last_modified: last_modified
                .ok_or_else(|| XmlError::MissingElement("LastModified".to_string()))?,
            size,
            content_hash: etag,
        })
    }
}

impl S3Deserialize for CommonPrefix {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut prefix = None;

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    let name = e.name();
                    let tag_name = std::str::from_utf8(name.as_ref())
                        .map_err(|e| XmlError::ParseError(e.to_string()))?;
                    match tag_name {
                        "Prefix" => prefix = Some(read_text_content(reader)?),
                        _ => skip_element(reader)?,
                    }
                }
                Event::End(_) => break,
                Event::Eof => {
                    return Err(XmlError::UnexpectedElement(
                        "unexpected EOF in CommonPrefixes".to_string(),
                    ));
                }
                _ => {}
            }
        }

        Ok(CommonPrefix {
            prefix: prefix.ok_or_else(|| XmlError::MissingElement("Prefix".to_string()))?,
        })
    }
}

/// `ListBucketResult`.
impl S3Deserialize for ListingPage {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut page = ListingPage::default();

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    let name = e.name();
                    let tag_name = std::str::from_utf8(name.as_ref())
                        .map_err(|e| XmlError::ParseError(e.to_string()))?;
                    match tag_name {
                        "Contents" => page.objects.push(ObjectMetadata::deserialize_xml(reader)?),
                        "CommonPrefixes" => page
                            .common_prefixes
                            .push(CommonPrefix::deserialize_xml(reader)?),
                        "IsTruncated" => {
                            let text = read_text_content(reader)?;
                            page.is_truncated = parse_bool(&text)?;
                        }
                        "NextMarker" => {
                            let text = read_text_content(reader)?;
                            if !text.is_empty() {
                                page.next_marker = Some(text);
                            }
                        }
                        _ => skip_element(reader)?,
                    }
                }
                Event::End(_) => break,
                Event::Eof => {
                    return Err(XmlError::UnexpectedElement(
                        "unexpected EOF in ListBucketResult".to_string(),
                    ));
                }
                _ => {}
            }
        }

        Ok(page)
    }
}

impl S3Deserialize for BucketEntry {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut name = None;
        let mut created = None;

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    let tag = e.name();
                    let tag_name = std::str::from_utf8(tag.as_ref())
                        .map_err(|e| XmlError::ParseError(e.to_string()))?;
                    match tag_name {
                        "Name" => name = Some(read_text_content(reader)?),
                        "CreationDate" => {
                            let text = read_text_content(reader)?;
                            created = Some(parse_timestamp(&text)?);
                        }
                        _ => skip_element(reader)?,
                    }
                }
                Event::End(_) => break,
                Event::Eof => {
                    return Err(XmlError::UnexpectedElement(
                        "unexpected EOF in Bucket".to_string(),
                    ));
                }
                _ => {}
            }
        }

        Ok(BucketEntry {
            name: name.ok_or_else(|| XmlError::MissingElement("Name".to_string()))?,
            created: created.ok_or_else(|| XmlError::MissingElement("CreationDate".to_string()))?,
        })
    }
}

/// `ListAllMyBucketsResult`.
impl S3Deserialize for BucketInventory {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut inventory = BucketInventory::default();

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    let name = e.name();
                    let tag_name = std::str::from_utf8(name.as_ref())
                        .map_err(|e| XmlError::ParseError(e.to_string()))?;
                    match tag_name {
                        "Owner" => inventory.owner = Some(Owner::deserialize_xml(reader)?),
                        "Buckets" => inventory.buckets = deserialize_list(reader, "Bucket")?,
                        _ => skip_element(reader)?,
                    }
                }
                Event::End(_) => break,
                Event::Eof => {
                    return Err(XmlError::UnexpectedElement(
                        "unexpected EOF in ListAllMyBucketsResult".to_string(),
                    ));
                }
                _ => {}
            }
        }

        Ok(inventory)
    }
}

/// `InitiateMultipartUploadResult`.
impl S3Deserialize for MultipartUploadInit {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut init = MultipartUploadInit::default();

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    let name = e.name();
                    let tag_name = std::str::from_utf8(name.as_ref())
                        .map_err(|e| XmlError::ParseError(e.to_string()))?;
                    match tag_name {
                        "Bucket" => init.bucket = read_text_content(reader)?,
                        "Key" => init.key = read_text_content(reader)?,
                        "UploadId" => init.upload_id = read_text_content(reader)?,
                        _ => skip_element(reader)?,
                    }
                }
                Event::End(_) => break,
                Event::Eof => {
                    return Err(XmlError::UnexpectedElement(
                        "unexpected EOF in InitiateMultipartUploadResult".to_string(),
                    ));
                }
                _ => {}
            }
        }

        Ok(init)
    }
}

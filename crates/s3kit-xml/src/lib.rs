//! S3 XML codec for s3kit.
//!
//! Decodes the response documents the client consumes and encodes the one
//! request body it sends.
//!
//! # Key components
//!
//! - [`S3Deserialize`] trait and [`from_xml`] for response bodies
//!   (`ListBucketResult`, `ListAllMyBucketsResult`,
//!   `InitiateMultipartUploadResult`, `Error`)
//! - [`S3Serialize`] trait and [`to_xml`] for the `CompleteMultipartUpload`
//!   manifest
//! - [`parse_error_body`] to recognise an `<Error>` document regardless of status
//!
//! # S3 XML conventions
//!
//! - Namespace: `http://s3.amazonaws.com/doc/2006-03-01/`
//! - Booleans: lowercase `true`/`false`
//! - Timestamps: ISO 8601 format (`2006-02-03T16:45:09.000Z`)
//! - ETags arrive quoted; decoded values have the quotes removed

pub mod deserialize;
pub mod error;
pub mod serialize;

pub use deserialize::{S3Deserialize, from_xml, parse_error_body, root_element};
pub use error::XmlError;
pub use serialize::{S3_NAMESPACE, S3Serialize, to_xml};

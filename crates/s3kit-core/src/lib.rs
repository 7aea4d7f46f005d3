//! Core types and configuration for the s3kit client.
//!
//! This crate provides the foundational building blocks shared by the other
//! s3kit crates: client configuration, credentials, the signature scheme
//! selector, and region handling.

mod config;
mod error;
mod types;

pub use config::S3ClientConfig;
pub use error::{CoreError, CoreResult};
pub use types::{AwsRegion, Credentials, SigningScheme};

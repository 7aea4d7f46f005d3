//! Request signing abstraction for s3kit.
//!
//! The client never computes signatures itself. It assembles a
//! [`SigningContext`] describing the request, hands it to a [`Signer`]
//! resolved from a [`SignerRegistry`] by [`SigningScheme`], and attaches the
//! returned material to the outgoing request or pre-signed URL.
//!
//! # Usage
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use s3kit_auth::{FixedSigner, SignerRegistry, SigningScheme};
//!
//! let registry = SignerRegistry::new()
//!     .with_signer(Arc::new(FixedSigner::new(SigningScheme::V2, "c2lnbmF0dXJl")));
//!
//! assert!(registry.get(SigningScheme::V2).is_ok());
//! assert!(registry.get(SigningScheme::V4).is_err());
//! ```
//!
//! # Modules
//!
//! - [`error`] - Authentication error types
//! - [`presigned`] - Pre-signed URL query assembly and key encoding
//! - [`signer`] - Signer trait, signing context, and scheme registry

pub mod error;
pub mod presigned;
pub mod signer;

pub use error::AuthError;
pub use presigned::{PresignedParams, encode_key, normalize_key};
pub use s3kit_core::SigningScheme;
pub use signer::{FixedSigner, Signer, SignerRegistry, SigningContext, SigningDate};

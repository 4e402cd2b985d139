//! Encode backend trait and shared error type.
//!
//! [`EncodeBackend`] defines the three operations the generator needs:
//! identify (header-only dimension read), decode (full decode, once per
//! image), and encode (resize + write one (breakpoint, format) job). The
//! decoded image is an associated type so the production backend can hand
//! out a real pixel buffer while the test mock hands out a stub — and so
//! one decode is shared read-only across all of an image's encode jobs.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend) — pure Rust, statically
//! linked, no system dependencies.

use super::params::EncodeParams;
use crate::types::Dimensions;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("decode failed: {0}")]
    DecodeFailed(String),
    #[error("encode failed: {0}")]
    EncodeFailed(String),
}

/// Trait for image encode backends.
///
/// `Sync` (and a `Sync` image type) because the generator fans encode jobs
/// out across rayon workers that share one decoded buffer.
pub trait EncodeBackend: Sync {
    /// Decoded source image, shared read-only across encode jobs.
    type Image: Sync;

    /// Read intrinsic dimensions without a full decode.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Fully decode a source image. Called once per image.
    fn decode(&self, path: &Path) -> Result<Self::Image, BackendError>;

    /// Resize the decoded image and write one encoded output file.
    fn encode(&self, image: &Self::Image, params: &EncodeParams) -> Result<(), BackendError>;
}

//! Build-run reporting: per-item failures and the aggregate summary.
//!
//! Build-time failures are per-image and non-fatal — the generator logs
//! them, keeps going, and surfaces everything here at the end of the run.
//! A partial build is acceptable and must be visible, so the report is the
//! CLI's last word on every `generate` invocation.

use crate::types::{Breakpoint, Format};
use std::fmt;
use thiserror::Error;

/// One non-fatal build failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildFailure {
    /// The source file could not be decoded (corrupt or unsupported). The
    /// whole image is skipped.
    #[error("{image}: unreadable source ({reason})")]
    UnreadableSource { image: String, reason: String },
    /// One (breakpoint, format) transcode failed. The affected breakpoint
    /// is dropped from the image's metadata so no partial breakpoint is
    /// ever published.
    #[error("{image}: {breakpoint}.{format} encode failed ({reason})")]
    EncodeFailure {
        image: String,
        breakpoint: Breakpoint,
        format: Format,
        reason: String,
    },
}

impl BuildFailure {
    pub fn image(&self) -> &str {
        match self {
            BuildFailure::UnreadableSource { image, .. } => image,
            BuildFailure::EncodeFailure { image, .. } => image,
        }
    }
}

/// Summary of one generator run.
#[derive(Debug, Default)]
pub struct ProcessReport {
    /// Images that produced metadata (possibly with dropped breakpoints).
    pub images: u32,
    /// Encoded variant files written.
    pub files: u32,
    pub failures: Vec<BuildFailure>,
}

impl ProcessReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn merge(&mut self, other: ProcessReport) {
        self.images += other.images;
        self.files += other.files;
        self.failures.extend(other.failures);
    }
}

impl fmt::Display for ProcessReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.failures.is_empty() {
            write!(f, "{} images, {} files", self.images, self.files)
        } else {
            write!(
                f,
                "{} images, {} files, {} failures",
                self.images,
                self.files,
                self.failures.len()
            )
        }
    }
}

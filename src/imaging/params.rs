//! Parameter types for encode operations.
//!
//! These structs describe *what* to encode, not *how*. They are the
//! interface between [`process`](crate::process) (which plans the variant
//! matrix) and the [`backend`](super::backend) (which does the pixel work),
//! so backends can be swapped for a recording mock in tests.

use crate::types::Format;
use std::path::PathBuf;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(85)
    }
}

/// Full specification of one (breakpoint, format) encode job.
///
/// The decoded source buffer is passed separately — one decode is shared
/// read-only across all of an image's encode jobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeParams {
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub format: Format,
    pub quality: Quality,
}

//! Shared metadata schema — the sole coupling surface between build time
//! and runtime.
//!
//! The variant generator serializes these types to JSON
//! (`optimized/<name>/metadata.json` plus an aggregate `optimized/index.json`);
//! the runtime components deserialize them as static configuration. Nothing
//! else crosses the build/runtime boundary.
//!
//! Invariants carried by [`ImageMetadata`]:
//! - every variant satisfies `width <= original.width` (no upscaling), except
//!   `original`, which always exists and matches the source exactly
//! - ladder breakpoints appear in strictly increasing width order
//!   (mobile < tablet < desktop < xl), and only when the target width is
//!   smaller than the source width
//! - every present breakpoint carries a file for every requested format —
//!   a breakpoint with webp but no jpg is a build defect, never a
//!   runtime-tolerable state

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Named target width used to generate one resized variant.
///
/// The derived `Ord` follows declaration order, which is the fixed ladder
/// order mobile < tablet < desktop < xl < original. `BTreeMap` keys in
/// [`ImageMetadata::variants`] therefore iterate in ladder order for free.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Breakpoint {
    Mobile,
    Tablet,
    Desktop,
    Xl,
    Original,
}

impl Breakpoint {
    /// The resize ladder, ascending. `Original` is not part of the ladder:
    /// it is always emitted at source resolution and closes the matrix.
    pub const LADDER: [Breakpoint; 4] = [
        Breakpoint::Mobile,
        Breakpoint::Tablet,
        Breakpoint::Desktop,
        Breakpoint::Xl,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Breakpoint::Mobile => "mobile",
            Breakpoint::Tablet => "tablet",
            Breakpoint::Desktop => "desktop",
            Breakpoint::Xl => "xl",
            Breakpoint::Original => "original",
        }
    }
}

impl fmt::Display for Breakpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output encoding format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Webp,
    Jpg,
}

impl Format {
    /// File extension (also the serialized name).
    pub fn ext(self) -> &'static str {
        match self {
            Format::Webp => "webp",
            Format::Jpg => "jpg",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ext())
    }
}

/// Intrinsic pixel dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// One source image discovered during a build pass. Immutable once found;
/// its lifecycle is the single build run.
#[derive(Debug, Clone)]
pub struct SourceImage {
    /// Path relative to the source root.
    pub path: std::path::PathBuf,
    /// Name stem used for output files (`<name>-<breakpoint>.<format>`).
    pub name: String,
}

/// All encoded outputs for one breakpoint of one image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantSet {
    pub width: u32,
    pub height: u32,
    /// Format → URL (path relative to the output root). Contains every
    /// requested format — never a subset.
    pub files: BTreeMap<Format, String>,
}

/// Flattened (breakpoint, format) view handed to the rendering layer by
/// variant selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    pub breakpoint: Breakpoint,
    pub width: u32,
    pub height: u32,
    pub format: Format,
    pub url: String,
}

/// Per-source-image aggregate written by the generator and consumed by the
/// runtime. Created once per build, read-only thereafter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMetadata {
    pub original: Dimensions,
    pub variants: BTreeMap<Breakpoint, VariantSet>,
}

impl ImageMetadata {
    /// The variant set for a breakpoint, if that breakpoint was emitted.
    pub fn variant_set(&self, breakpoint: Breakpoint) -> Option<&VariantSet> {
        self.variants.get(&breakpoint)
    }

    /// Flatten one (breakpoint, format) pair into a [`Variant`].
    pub fn variant(&self, breakpoint: Breakpoint, format: Format) -> Option<Variant> {
        let set = self.variants.get(&breakpoint)?;
        let url = set.files.get(&format)?;
        Some(Variant {
            breakpoint,
            width: set.width,
            height: set.height,
            format,
            url: url.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn breakpoint_ladder_order() {
        assert!(Breakpoint::Mobile < Breakpoint::Tablet);
        assert!(Breakpoint::Tablet < Breakpoint::Desktop);
        assert!(Breakpoint::Desktop < Breakpoint::Xl);
        assert!(Breakpoint::Xl < Breakpoint::Original);
    }

    #[test]
    fn breakpoint_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&Breakpoint::Mobile).unwrap(),
            "\"mobile\""
        );
        let bp: Breakpoint = serde_json::from_str("\"xl\"").unwrap();
        assert_eq!(bp, Breakpoint::Xl);
    }

    #[test]
    fn format_ext() {
        assert_eq!(Format::Webp.ext(), "webp");
        assert_eq!(Format::Jpg.ext(), "jpg");
    }

    #[test]
    fn metadata_roundtrip() {
        let mut files = BTreeMap::new();
        files.insert(Format::Webp, "optimized/dawn/dawn-mobile.webp".to_string());
        files.insert(Format::Jpg, "optimized/dawn/dawn-mobile.jpg".to_string());
        let mut variants = BTreeMap::new();
        variants.insert(
            Breakpoint::Mobile,
            VariantSet {
                width: 480,
                height: 225,
                files,
            },
        );
        let meta = ImageMetadata {
            original: Dimensions {
                width: 1920,
                height: 900,
            },
            variants,
        };

        let json = serde_json::to_string(&meta).unwrap();
        let back: ImageMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(back, meta);
    }

    #[test]
    fn variant_flattening() {
        let mut files = BTreeMap::new();
        files.insert(Format::Jpg, "optimized/a/a-tablet.jpg".to_string());
        files.insert(Format::Webp, "optimized/a/a-tablet.webp".to_string());
        let mut variants = BTreeMap::new();
        variants.insert(
            Breakpoint::Tablet,
            VariantSet {
                width: 768,
                height: 432,
                files,
            },
        );
        let meta = ImageMetadata {
            original: Dimensions {
                width: 2000,
                height: 1125,
            },
            variants,
        };

        let v = meta.variant(Breakpoint::Tablet, Format::Webp).unwrap();
        assert_eq!(v.width, 768);
        assert_eq!(v.url, "optimized/a/a-tablet.webp");
        assert!(meta.variant(Breakpoint::Desktop, Format::Webp).is_none());
    }

    #[test]
    fn variants_map_iterates_in_ladder_order() {
        let mut variants = BTreeMap::new();
        for bp in [Breakpoint::Original, Breakpoint::Mobile, Breakpoint::Desktop] {
            variants.insert(
                bp,
                VariantSet {
                    width: 1,
                    height: 1,
                    files: BTreeMap::new(),
                },
            );
        }
        let order: Vec<Breakpoint> = variants.keys().copied().collect();
        assert_eq!(
            order,
            vec![Breakpoint::Mobile, Breakpoint::Desktop, Breakpoint::Original]
        );
    }
}

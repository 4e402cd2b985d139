//! Variant selection — the contract the rendering layer consumes.
//!
//! Given a viewport width and whether the runtime decodes WebP, pick the
//! smallest breakpoint whose nominal width covers the viewport, falling
//! through mobile → tablet → desktop → xl → original, then pick `webp` if
//! supported, else `jpg`.

use crate::types::{Breakpoint, Format, ImageMetadata, Variant};

/// Select the variant to render.
///
/// Returns `None` only for metadata that violates the build invariants
/// (missing `original`, or a present breakpoint missing the fallback
/// format) — well-formed metadata always yields a variant.
pub fn select_variant(
    metadata: &ImageMetadata,
    viewport_width: u32,
    webp_supported: bool,
) -> Option<Variant> {
    let breakpoint = Breakpoint::LADDER
        .into_iter()
        .find(|bp| {
            metadata
                .variant_set(*bp)
                .is_some_and(|set| set.width >= viewport_width)
        })
        .unwrap_or(Breakpoint::Original);

    let format = if webp_supported {
        Format::Webp
    } else {
        Format::Jpg
    };
    metadata
        .variant(breakpoint, format)
        // Tolerate a single-format build (e.g. jpg-only config).
        .or_else(|| metadata.variant(breakpoint, Format::Jpg))
}

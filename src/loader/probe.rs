//! Decode-capability probe.
//!
//! Format support is asked of the codec registry itself rather than
//! guessed from version strings, and the answer is cached for the life of
//! the process.

use image::ImageFormat;
use std::sync::OnceLock;

static WEBP_SUPPORTED: OnceLock<bool> = OnceLock::new();

/// Whether this build can decode WebP. Feeds variant selection: when this
/// is `false` the `jpg` rendition is requested instead.
pub fn webp_decode_supported() -> bool {
    *WEBP_SUPPORTED.get_or_init(|| ImageFormat::WebP.reading_enabled())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_is_stable_across_calls() {
        assert_eq!(webp_decode_supported(), webp_decode_supported());
    }

    #[test]
    fn probe_reflects_codec_registry() {
        assert_eq!(
            webp_decode_supported(),
            ImageFormat::WebP.reading_enabled()
        );
    }
}

//! Pure Rust encode backend — zero system dependencies.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `image::image_dimensions` |
//! | Decode (JPEG, PNG, WebP) | `image` crate (pure Rust decoders) |
//! | Resize | `image::DynamicImage::resize_exact` with `Lanczos3` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` |
//! | Encode → WebP | `webp` crate (lossy; the `image` crate's WebP encoder is lossless-only and ignores quality) |

use super::backend::{BackendError, EncodeBackend};
use super::params::EncodeParams;
use crate::types::{Dimensions, Format};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::path::Path;
use std::sync::LazyLock;

/// Extensions whose decoders are compiled in and known to work.
const PHOTO_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("webp", ImageFormat::WebP),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    PHOTO_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// The set of source file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Pure Rust backend using the `image` crate ecosystem plus `webp`.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Encode and save as lossy WebP via libwebp.
fn save_webp(img: &DynamicImage, path: &Path, quality: u32) -> Result<(), BackendError> {
    // libwebp accepts RGB8/RGBA8 input only.
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let encoder = webp::Encoder::from_image(&rgb)
        .map_err(|e| BackendError::EncodeFailed(format!("WebP encoder rejected input: {e}")))?;
    let memory = encoder.encode(quality as f32);
    std::fs::write(path, &*memory).map_err(BackendError::Io)
}

/// Encode and save as JPEG at the given quality.
fn save_jpeg(img: &DynamicImage, path: &Path, quality: u32) -> Result<(), BackendError> {
    let file = std::fs::File::create(path).map_err(BackendError::Io)?;
    let writer = std::io::BufWriter::new(file);
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(writer, quality as u8);
    // JPEG has no alpha channel; flatten before encoding.
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    rgb.write_with_encoder(encoder)
        .map_err(|e| BackendError::EncodeFailed(format!("JPEG encode failed: {e}")))
}

impl EncodeBackend for RustBackend {
    type Image = DynamicImage;

    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) = image::image_dimensions(path).map_err(|e| {
            BackendError::DecodeFailed(format!(
                "failed to read dimensions of {}: {e}",
                path.display()
            ))
        })?;
        Ok(Dimensions { width, height })
    }

    fn decode(&self, path: &Path) -> Result<DynamicImage, BackendError> {
        ImageReader::open(path)
            .map_err(BackendError::Io)?
            .decode()
            .map_err(|e| {
                BackendError::DecodeFailed(format!("failed to decode {}: {e}", path.display()))
            })
    }

    fn encode(&self, image: &DynamicImage, params: &EncodeParams) -> Result<(), BackendError> {
        // Planned dimensions already preserve the source aspect ratio, so an
        // exact resize never distorts; no crop is involved.
        let resized = if image.width() == params.width && image.height() == params.height {
            image.clone()
        } else {
            image.resize_exact(params.width, params.height, FilterType::Lanczos3)
        };
        match params.format {
            Format::Webp => save_webp(&resized, &params.output, params.quality.value()),
            Format::Jpg => save_jpeg(&resized, &params.output, params.quality.value()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::params::Quality;
    use image::{ImageEncoder, RgbImage};

    #[test]
    fn supported_extensions_match_decodable_formats() {
        let exts = supported_input_extensions();
        for expected in &["jpg", "jpeg", "png", "webp"] {
            assert!(
                exts.contains(expected),
                "expected {expected} in supported extensions"
            );
        }
    }

    /// Create a small valid JPEG file with the given dimensions.
    fn create_test_jpeg(path: &Path, width: u32, height: u32) {
        let img = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        let file = std::fs::File::create(path).unwrap();
        let writer = std::io::BufWriter::new(file);
        image::codecs::jpeg::JpegEncoder::new(writer)
            .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
            .unwrap();
    }

    #[test]
    fn identify_synthetic_jpeg() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("test.jpg");
        create_test_jpeg(&path, 200, 150);

        let backend = RustBackend::new();
        let dims = backend.identify(&path).unwrap();
        assert_eq!(dims.width, 200);
        assert_eq!(dims.height, 150);
    }

    #[test]
    fn identify_nonexistent_file_errors() {
        let backend = RustBackend::new();
        assert!(backend.identify(Path::new("/nonexistent/image.jpg")).is_err());
    }

    #[test]
    fn decode_corrupt_file_errors() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("corrupt.jpg");
        std::fs::write(&path, b"not a jpeg at all").unwrap();

        let backend = RustBackend::new();
        assert!(matches!(
            backend.decode(&path),
            Err(BackendError::DecodeFailed(_))
        ));
    }

    fn encode_to(format: Format, name: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("source.jpg");
        create_test_jpeg(&source, 400, 300);

        let backend = RustBackend::new();
        let decoded = backend.decode(&source).unwrap();
        let output = tmp.path().join(name);
        backend
            .encode(
                &decoded,
                &EncodeParams {
                    output: output.clone(),
                    width: 200,
                    height: 150,
                    format,
                    quality: Quality::new(80),
                },
            )
            .unwrap();
        (tmp, output)
    }

    #[test]
    fn encode_webp_output_decodes_at_target_dimensions() {
        let (_tmp, output) = encode_to(Format::Webp, "out.webp");
        assert!(std::fs::metadata(&output).unwrap().len() > 0);
        assert_eq!(image::image_dimensions(&output).unwrap(), (200, 150));
    }

    #[test]
    fn encode_jpg_output_decodes_at_target_dimensions() {
        let (_tmp, output) = encode_to(Format::Jpg, "out.jpg");
        assert!(std::fs::metadata(&output).unwrap().len() > 0);
        assert_eq!(image::image_dimensions(&output).unwrap(), (200, 150));
    }

    #[test]
    fn encode_at_source_dimensions_skips_resize() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("source.jpg");
        create_test_jpeg(&source, 64, 48);

        let backend = RustBackend::new();
        let decoded = backend.decode(&source).unwrap();
        let output = tmp.path().join("original.jpg");
        backend
            .encode(
                &decoded,
                &EncodeParams {
                    output: output.clone(),
                    width: 64,
                    height: 48,
                    format: Format::Jpg,
                    quality: Quality::new(85),
                },
            )
            .unwrap();
        assert_eq!(image::image_dimensions(&output).unwrap(), (64, 48));
    }

    #[test]
    fn webp_quality_affects_file_size() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("source.jpg");
        create_test_jpeg(&source, 256, 256);

        let backend = RustBackend::new();
        let decoded = backend.decode(&source).unwrap();
        let mut sizes = Vec::new();
        for (name, quality) in [("low.webp", 10), ("high.webp", 95)] {
            let output = tmp.path().join(name);
            backend
                .encode(
                    &decoded,
                    &EncodeParams {
                        output: output.clone(),
                        width: 256,
                        height: 256,
                        format: Format::Webp,
                        quality: Quality::new(quality),
                    },
                )
                .unwrap();
            sizes.push(std::fs::metadata(&output).unwrap().len());
        }
        assert!(
            sizes[0] < sizes[1],
            "q10 ({}) should be smaller than q95 ({})",
            sizes[0],
            sizes[1]
        );
    }
}

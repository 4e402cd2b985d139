//! Post-build verification of generated output.
//!
//! Re-reads every `metadata.json` under `optimized/` and checks the schema
//! invariants the runtime depends on:
//!
//! - no upscaling: every variant width ≤ the source width
//! - `original` present, at exact source dimensions
//! - ladder widths strictly increasing in ladder order
//! - no partial breakpoint: every present breakpoint carries every format
//!   seen anywhere in that image's matrix
//! - every referenced asset file exists on disk
//!
//! Defects are collected per image (a broken metadata file does not stop
//! the scan); the CLI exits non-zero when any defect is found.

use crate::types::{Breakpoint, Format, ImageMetadata};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("no optimized/ directory under {0}")]
    NotGenerated(PathBuf),
}

/// One invariant violation found in the generated output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Defect {
    UnparsableMetadata {
        image: String,
        reason: String,
    },
    MissingOriginal {
        image: String,
    },
    OriginalDimensionsMismatch {
        image: String,
    },
    Upscaled {
        image: String,
        breakpoint: Breakpoint,
    },
    WidthsNotAscending {
        image: String,
    },
    PartialBreakpoint {
        image: String,
        breakpoint: Breakpoint,
        missing: Format,
    },
    MissingAsset {
        image: String,
        url: String,
    },
}

impl fmt::Display for Defect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Defect::UnparsableMetadata { image, reason } => {
                write!(f, "{image}: unparsable metadata ({reason})")
            }
            Defect::MissingOriginal { image } => {
                write!(f, "{image}: no original breakpoint")
            }
            Defect::OriginalDimensionsMismatch { image } => {
                write!(f, "{image}: original variant does not match source dimensions")
            }
            Defect::Upscaled { image, breakpoint } => {
                write!(f, "{image}: {breakpoint} is wider than the source")
            }
            Defect::WidthsNotAscending { image } => {
                write!(f, "{image}: breakpoint widths are not strictly increasing")
            }
            Defect::PartialBreakpoint {
                image,
                breakpoint,
                missing,
            } => write!(f, "{image}: {breakpoint} is missing the {missing} file"),
            Defect::MissingAsset { image, url } => {
                write!(f, "{image}: referenced asset not on disk: {url}")
            }
        }
    }
}

/// Result of a verification pass.
#[derive(Debug, Default)]
pub struct VerifyReport {
    pub images: u32,
    pub defects: Vec<Defect>,
}

impl VerifyReport {
    pub fn is_clean(&self) -> bool {
        self.defects.is_empty()
    }
}

impl fmt::Display for VerifyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.defects.is_empty() {
            write!(f, "{} images verified", self.images)
        } else {
            write!(
                f,
                "{} images verified, {} defects",
                self.images,
                self.defects.len()
            )
        }
    }
}

/// Verify everything the generator wrote under `output_dir`.
pub fn verify(output_dir: &Path) -> Result<VerifyReport, VerifyError> {
    let optimized = output_dir.join("optimized");
    if !optimized.is_dir() {
        return Err(VerifyError::NotGenerated(output_dir.to_path_buf()));
    }

    let mut report = VerifyReport::default();
    let mut image_dirs: Vec<PathBuf> = std::fs::read_dir(&optimized)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    image_dirs.sort();

    for dir in image_dirs {
        let image = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        report.images += 1;

        let metadata_path = dir.join("metadata.json");
        let meta: ImageMetadata = match std::fs::read_to_string(&metadata_path)
            .map_err(|e| e.to_string())
            .and_then(|s| serde_json::from_str(&s).map_err(|e| e.to_string()))
        {
            Ok(meta) => meta,
            Err(reason) => {
                report
                    .defects
                    .push(Defect::UnparsableMetadata { image, reason });
                continue;
            }
        };

        check_image(&image, &meta, output_dir, &mut report.defects);
    }

    Ok(report)
}

fn check_image(image: &str, meta: &ImageMetadata, output_dir: &Path, defects: &mut Vec<Defect>) {
    match meta.variant_set(Breakpoint::Original) {
        None => defects.push(Defect::MissingOriginal {
            image: image.into(),
        }),
        Some(set) => {
            if set.width != meta.original.width || set.height != meta.original.height {
                defects.push(Defect::OriginalDimensionsMismatch {
                    image: image.into(),
                });
            }
        }
    }

    for (&breakpoint, set) in &meta.variants {
        if breakpoint != Breakpoint::Original && set.width > meta.original.width {
            defects.push(Defect::Upscaled {
                image: image.into(),
                breakpoint,
            });
        }
    }

    // BTreeMap iterates in ladder order, so widths must ascend as seen.
    let widths: Vec<u32> = meta.variants.values().map(|set| set.width).collect();
    if !widths.windows(2).all(|w| w[0] < w[1]) {
        defects.push(Defect::WidthsNotAscending {
            image: image.into(),
        });
    }

    // Every format seen anywhere in the matrix must resolve for every
    // present breakpoint.
    let requested: BTreeSet<Format> = meta
        .variants
        .values()
        .flat_map(|set| set.files.keys().copied())
        .collect();
    for (&breakpoint, set) in &meta.variants {
        for &format in &requested {
            if !set.files.contains_key(&format) {
                defects.push(Defect::PartialBreakpoint {
                    image: image.into(),
                    breakpoint,
                    missing: format,
                });
            }
        }
        for url in set.files.values() {
            if !output_dir.join(url).is_file() {
                defects.push(Defect::MissingAsset {
                    image: image.into(),
                    url: url.clone(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Dimensions, VariantSet};
    use std::collections::BTreeMap;
    use std::fs;
    use tempfile::TempDir;

    fn write_image(
        output_dir: &Path,
        name: &str,
        meta: &ImageMetadata,
        write_assets: bool,
    ) {
        let dir = output_dir.join("optimized").join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("metadata.json"),
            serde_json::to_string_pretty(meta).unwrap(),
        )
        .unwrap();
        if write_assets {
            for set in meta.variants.values() {
                for url in set.files.values() {
                    let path = output_dir.join(url);
                    fs::create_dir_all(path.parent().unwrap()).unwrap();
                    fs::write(path, b"").unwrap();
                }
            }
        }
    }

    fn valid_meta(name: &str) -> ImageMetadata {
        let mut variants = BTreeMap::new();
        for (bp, width, height) in [
            (Breakpoint::Mobile, 480u32, 225u32),
            (Breakpoint::Original, 1920, 900),
        ] {
            let mut files = BTreeMap::new();
            for format in [Format::Webp, Format::Jpg] {
                files.insert(format, format!("optimized/{name}/{name}-{bp}.{format}"));
            }
            variants.insert(bp, VariantSet { width, height, files });
        }
        ImageMetadata {
            original: Dimensions {
                width: 1920,
                height: 900,
            },
            variants,
        }
    }

    #[test]
    fn clean_output_verifies() {
        let tmp = TempDir::new().unwrap();
        write_image(tmp.path(), "dawn", &valid_meta("dawn"), true);

        let report = verify(tmp.path()).unwrap();
        assert!(report.is_clean(), "{:?}", report.defects);
        assert_eq!(report.images, 1);
        assert_eq!(format!("{report}"), "1 images verified");
    }

    #[test]
    fn missing_format_is_partial_breakpoint() {
        let tmp = TempDir::new().unwrap();
        let mut meta = valid_meta("dawn");
        meta.variants
            .get_mut(&Breakpoint::Mobile)
            .unwrap()
            .files
            .remove(&Format::Jpg);
        write_image(tmp.path(), "dawn", &meta, true);

        let report = verify(tmp.path()).unwrap();
        assert!(report.defects.iter().any(|d| matches!(
            d,
            Defect::PartialBreakpoint {
                breakpoint: Breakpoint::Mobile,
                missing: Format::Jpg,
                ..
            }
        )));
    }

    #[test]
    fn missing_asset_file_flagged() {
        let tmp = TempDir::new().unwrap();
        write_image(tmp.path(), "dawn", &valid_meta("dawn"), false);

        let report = verify(tmp.path()).unwrap();
        assert!(
            report
                .defects
                .iter()
                .any(|d| matches!(d, Defect::MissingAsset { .. }))
        );
    }

    #[test]
    fn missing_original_flagged() {
        let tmp = TempDir::new().unwrap();
        let mut meta = valid_meta("dawn");
        meta.variants.remove(&Breakpoint::Original);
        write_image(tmp.path(), "dawn", &meta, true);

        let report = verify(tmp.path()).unwrap();
        assert!(
            report
                .defects
                .iter()
                .any(|d| matches!(d, Defect::MissingOriginal { .. }))
        );
    }

    #[test]
    fn upscaled_variant_flagged() {
        let tmp = TempDir::new().unwrap();
        let mut meta = valid_meta("dawn");
        meta.original.width = 400; // smaller than the 480 mobile variant
        meta.variants.get_mut(&Breakpoint::Original).unwrap().width = 400;
        write_image(tmp.path(), "dawn", &meta, true);

        let report = verify(tmp.path()).unwrap();
        assert!(
            report
                .defects
                .iter()
                .any(|d| matches!(d, Defect::Upscaled { .. }))
        );
    }

    #[test]
    fn corrupt_metadata_does_not_stop_scan() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("optimized/broken");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("metadata.json"), "not json").unwrap();
        write_image(tmp.path(), "dawn", &valid_meta("dawn"), true);

        let report = verify(tmp.path()).unwrap();
        assert_eq!(report.images, 2);
        assert_eq!(report.defects.len(), 1);
        assert!(matches!(
            report.defects[0],
            Defect::UnparsableMetadata { .. }
        ));
    }

    #[test]
    fn unbuilt_directory_is_fatal() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(
            verify(tmp.path()),
            Err(VerifyError::NotGenerated(_))
        ));
    }
}

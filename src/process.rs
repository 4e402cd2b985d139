//! Variant generation — the build-time stage of the pipeline.
//!
//! Walks a source directory, and for every decodable image produces the
//! full {breakpoint × format} matrix plus its metadata record:
//!
//! ```text
//! optimized/
//! ├── index.json                    # imageName → ImageMetadata, all images
//! ├── dawn/
//! │   ├── metadata.json             # this image's ImageMetadata
//! │   ├── dawn-mobile.webp          # 480w
//! │   ├── dawn-mobile.jpg
//! │   ├── dawn-tablet.webp          # 768w
//! │   ├── dawn-tablet.jpg
//! │   ├── ...
//! │   ├── dawn-original.webp        # exact source resolution, always present
//! │   └── dawn-original.jpg
//! └── ...
//! ```
//!
//! ## Failure model
//!
//! Per-image failures are non-fatal: an unreadable source skips that image,
//! a failed transcode drops the affected breakpoint (a breakpoint missing
//! one format must never be published), and the run continues. Everything
//! is collected into the returned [`ProcessReport`].
//!
//! ## Parallelism
//!
//! Images are processed in parallel under rayon — there is no shared
//! mutable state across images. Within one image, every (breakpoint,
//! format) encode job runs in parallel too, reading the single decoded
//! source buffer read-only.

use crate::config::{PipelineConfig, QualityConfig};
use crate::imaging::{
    BackendError, EncodeBackend, EncodeParams, PlannedVariant, Quality, RustBackend,
    plan_variants, supported_input_extensions,
};
use crate::report::{BuildFailure, ProcessReport};
use crate::types::{Breakpoint, Format, ImageMetadata, SourceImage, VariantSet};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("source directory not found: {0}")]
    SourceDirMissing(PathBuf),
    #[error("two source images share the name '{0}' — output files would collide")]
    DuplicateImageName(String),
}

/// Generator inputs distilled from the pipeline config.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Ascending named-width ladder (validated at config load).
    pub ladder: Vec<(Breakpoint, u32)>,
    pub formats: Vec<Format>,
    pub quality: QualityConfig,
}

impl GeneratorConfig {
    pub fn from_pipeline_config(config: &PipelineConfig) -> Self {
        Self {
            ladder: config.breakpoints.ladder().to_vec(),
            formats: config.images.formats.clone(),
            quality: config.images.quality.clone(),
        }
    }

    fn quality_for(&self, format: Format) -> Quality {
        Quality::new(self.quality.for_format(format))
    }
}

/// Result of one generator run: the metadata map (what `index.json`
/// contains) and the build report.
#[derive(Debug)]
pub struct ProcessOutcome {
    pub metadata: BTreeMap<String, ImageMetadata>,
    pub report: ProcessReport,
}

/// Run the generator with the production backend.
pub fn process(
    source_dir: &Path,
    output_dir: &Path,
    config: &GeneratorConfig,
) -> Result<ProcessOutcome, ProcessError> {
    process_with_backend(&RustBackend::new(), source_dir, output_dir, config)
}

/// Run the generator with a specific backend (allows testing with a mock).
pub fn process_with_backend<B: EncodeBackend>(
    backend: &B,
    source_dir: &Path,
    output_dir: &Path,
    config: &GeneratorConfig,
) -> Result<ProcessOutcome, ProcessError> {
    if !source_dir.is_dir() {
        return Err(ProcessError::SourceDirMissing(source_dir.to_path_buf()));
    }
    let sources = discover_sources(source_dir)?;
    let optimized_dir = output_dir.join("optimized");
    std::fs::create_dir_all(&optimized_dir)?;

    // One independent unit of work per image; nothing is shared but the
    // backend and config, both read-only.
    let results: Vec<(Option<(String, ImageMetadata)>, ProcessReport)> = sources
        .par_iter()
        .map(|source| process_image(backend, source, source_dir, &optimized_dir, config))
        .collect();

    let mut metadata = BTreeMap::new();
    let mut report = ProcessReport::default();
    for (entry, image_report) in results {
        report.merge(image_report);
        if let Some((name, meta)) = entry {
            metadata.insert(name, meta);
        }
    }

    // Per-image metadata files, then the aggregate index.
    for (name, meta) in &metadata {
        let path = optimized_dir.join(name).join("metadata.json");
        std::fs::write(&path, serde_json::to_string_pretty(meta)?)?;
    }
    std::fs::write(
        optimized_dir.join("index.json"),
        serde_json::to_string_pretty(&metadata)?,
    )?;

    Ok(ProcessOutcome { metadata, report })
}

/// Walk the source tree and collect decodable images, sorted by name.
fn discover_sources(source_dir: &Path) -> Result<Vec<SourceImage>, ProcessError> {
    let extensions = supported_input_extensions();
    let mut sources = Vec::new();
    for entry in walkdir::WalkDir::new(source_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let path = entry.path();
        let is_image = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                extensions
                    .iter()
                    .any(|supported| supported.eq_ignore_ascii_case(ext))
            });
        if !is_image {
            continue;
        }
        let name = match path.file_stem().and_then(|s| s.to_str()) {
            Some(stem) => stem.to_string(),
            None => continue,
        };
        let rel = path
            .strip_prefix(source_dir)
            .unwrap_or(path)
            .to_path_buf();
        sources.push(SourceImage { path: rel, name });
    }

    // Output files are keyed by name alone; collisions would silently
    // overwrite each other.
    let mut seen = std::collections::HashSet::new();
    for source in &sources {
        if !seen.insert(source.name.clone()) {
            return Err(ProcessError::DuplicateImageName(source.name.clone()));
        }
    }
    Ok(sources)
}

/// Process one source image end to end. Never fails the run: all failures
/// are folded into the returned report.
fn process_image<B: EncodeBackend>(
    backend: &B,
    source: &SourceImage,
    source_dir: &Path,
    optimized_dir: &Path,
    config: &GeneratorConfig,
) -> (Option<(String, ImageMetadata)>, ProcessReport) {
    let mut report = ProcessReport::default();
    let name = &source.name;
    let absolute = source_dir.join(&source.path);

    // Dimensions once (header read), then one full decode shared by every
    // encode job.
    let original = match backend.identify(&absolute) {
        Ok(dims) => dims,
        Err(e) => {
            warn!(image = %name, error = %e, "skipping unreadable source");
            report.failures.push(BuildFailure::UnreadableSource {
                image: name.clone(),
                reason: e.to_string(),
            });
            return (None, report);
        }
    };
    let decoded = match backend.decode(&absolute) {
        Ok(img) => img,
        Err(e) => {
            warn!(image = %name, error = %e, "skipping unreadable source");
            report.failures.push(BuildFailure::UnreadableSource {
                image: name.clone(),
                reason: e.to_string(),
            });
            return (None, report);
        }
    };

    let planned = plan_variants(original, &config.ladder);
    let image_dir = optimized_dir.join(name);
    if let Err(e) = std::fs::create_dir_all(&image_dir) {
        warn!(image = %name, error = %e, "cannot create output directory");
        report.failures.push(BuildFailure::UnreadableSource {
            image: name.clone(),
            reason: e.to_string(),
        });
        return (None, report);
    }

    // Fan every (breakpoint, format) job out in parallel over the shared
    // decoded buffer.
    struct JobResult {
        planned: PlannedVariant,
        format: Format,
        url: String,
        path: PathBuf,
        outcome: Result<(), BackendError>,
    }

    let jobs: Vec<(PlannedVariant, Format)> = planned
        .iter()
        .flat_map(|&p| config.formats.iter().map(move |&f| (p, f)))
        .collect();

    let results: Vec<JobResult> = jobs
        .par_iter()
        .map(|&(planned, format)| {
            let file = format!("{name}-{}.{}", planned.breakpoint, format.ext());
            let path = image_dir.join(&file);
            let outcome = backend.encode(
                &decoded,
                &EncodeParams {
                    output: path.clone(),
                    width: planned.width,
                    height: planned.height,
                    format,
                    quality: config.quality_for(format),
                },
            );
            JobResult {
                planned,
                format,
                url: format!("optimized/{name}/{file}"),
                path,
                outcome,
            }
        })
        .collect();

    // Group per breakpoint; a breakpoint survives only if every requested
    // format encoded — one format missing would publish a partial variant.
    let mut variants: BTreeMap<Breakpoint, VariantSet> = BTreeMap::new();
    let mut dropped: Vec<Breakpoint> = Vec::new();
    for &p in &planned {
        let for_breakpoint: Vec<&JobResult> = results
            .iter()
            .filter(|r| r.planned.breakpoint == p.breakpoint)
            .collect();
        let failed: Vec<&&JobResult> = for_breakpoint
            .iter()
            .filter(|r| r.outcome.is_err())
            .collect();
        if failed.is_empty() {
            let files = for_breakpoint
                .iter()
                .map(|r| (r.format, r.url.clone()))
                .collect();
            variants.insert(
                p.breakpoint,
                VariantSet {
                    width: p.width,
                    height: p.height,
                    files,
                },
            );
            report.files += for_breakpoint.len() as u32;
        } else {
            dropped.push(p.breakpoint);
            for result in &for_breakpoint {
                match &result.outcome {
                    Err(e) => {
                        warn!(
                            image = %name,
                            breakpoint = %result.planned.breakpoint,
                            format = %result.format,
                            error = %e,
                            "dropping breakpoint after encode failure"
                        );
                        report.failures.push(BuildFailure::EncodeFailure {
                            image: name.clone(),
                            breakpoint: result.planned.breakpoint,
                            format: result.format,
                            reason: e.to_string(),
                        });
                    }
                    // Remove the surviving sibling so the output tree holds
                    // only files the metadata references.
                    Ok(()) => {
                        let _ = std::fs::remove_file(&result.path);
                    }
                }
            }
        }
    }

    // `original` closes every matrix; without it the metadata is unusable.
    // Remove everything already written — no metadata will reference it.
    if !variants.contains_key(&Breakpoint::Original) {
        warn!(image = %name, "dropping image: original breakpoint failed");
        if let Err(e) = std::fs::remove_dir_all(&image_dir) {
            warn!(image = %name, error = %e, "could not remove dropped image's output directory");
        }
        report.files = 0;
        return (None, report);
    }

    debug!(
        image = %name,
        breakpoints = variants.len(),
        dropped = dropped.len(),
        "processed"
    );
    report.images += 1;
    (
        Some((
            name.clone(),
            ImageMetadata {
                original,
                variants,
            },
        )),
        report,
    )
}

//! Pipeline configuration — `respimg.toml` loading and stock defaults.
//!
//! One TOML file covers every tunable in the pipeline: the breakpoint
//! ladder, the output formats and per-format encoder quality, cache bounds,
//! and loader batching parameters. Every section is optional; missing values
//! fall back to the stock defaults below, so an empty (or absent) file is a
//! valid configuration.
//!
//! ```toml
//! [breakpoints]
//! mobile = 480
//! tablet = 768
//! desktop = 1200
//! xl = 1920
//!
//! [images]
//! formats = ["webp", "jpg"]
//!
//! [images.quality]
//! webp = 80
//! jpg = 85
//!
//! [processing]
//! threads = 0          # 0 = all available cores
//!
//! [cache]
//! image_max_entries = 60
//! api_max_entries = 30
//! static_max_entries = 40
//! navigation_max_entries = 20
//!
//! [loader]
//! priority_count = 1
//! max_concurrent = 3
//! settle_delay_ms = 1000
//! inter_batch_delay_ms = 150
//! ```

use crate::types::{Breakpoint, Format};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("breakpoint widths must be strictly ascending (mobile < tablet < desktop < xl), got {0:?}")]
    LadderNotAscending([u32; 4]),
    #[error("at least one output format is required")]
    NoFormats,
}

/// Named widths of the resize ladder, ascending.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakpointsConfig {
    pub mobile: u32,
    pub tablet: u32,
    pub desktop: u32,
    pub xl: u32,
}

impl Default for BreakpointsConfig {
    fn default() -> Self {
        Self {
            mobile: 480,
            tablet: 768,
            desktop: 1200,
            xl: 1920,
        }
    }
}

impl BreakpointsConfig {
    /// Ladder as `(breakpoint, target_width)` pairs in ascending order.
    pub fn ladder(&self) -> [(Breakpoint, u32); 4] {
        [
            (Breakpoint::Mobile, self.mobile),
            (Breakpoint::Tablet, self.tablet),
            (Breakpoint::Desktop, self.desktop),
            (Breakpoint::Xl, self.xl),
        ]
    }
}

/// Encoder quality per output format (1–100).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    pub webp: u32,
    pub jpg: u32,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self { webp: 80, jpg: 85 }
    }
}

impl QualityConfig {
    pub fn for_format(&self, format: Format) -> u32 {
        match format {
            Format::Webp => self.webp,
            Format::Jpg => self.jpg,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImagesConfig {
    pub formats: Vec<Format>,
    pub quality: QualityConfig,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            formats: vec![Format::Webp, Format::Jpg],
            quality: QualityConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Worker threads for the batch generator. 0 means all available cores.
    pub threads: usize,
}

/// Per-category entry bounds for the runtime cache stores.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub image_max_entries: usize,
    pub api_max_entries: usize,
    pub static_max_entries: usize,
    pub navigation_max_entries: usize,
    /// Optional per-store byte quota. Unset means entry counts alone bound
    /// the stores.
    pub quota_bytes: Option<usize>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            image_max_entries: 60,
            api_max_entries: 30,
            static_max_entries: 40,
            navigation_max_entries: 20,
            quota_bytes: None,
        }
    }
}

/// Batching parameters for the progressive loader.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    pub priority_count: usize,
    pub max_concurrent: usize,
    pub settle_delay_ms: u64,
    pub inter_batch_delay_ms: u64,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            priority_count: 1,
            max_concurrent: 3,
            settle_delay_ms: 1000,
            inter_batch_delay_ms: 150,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub breakpoints: BreakpointsConfig,
    pub images: ImagesConfig,
    pub processing: ProcessingConfig,
    pub cache: CacheConfig,
    pub loader: LoaderConfig,
}

impl PipelineConfig {
    /// Load from a TOML file, falling back to stock defaults when the file
    /// does not exist. A file that exists but fails to parse is an error —
    /// silent misconfiguration of encoder quality is worse than a failed run.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check invariants the serde layer can't express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let b = &self.breakpoints;
        let widths = [b.mobile, b.tablet, b.desktop, b.xl];
        if !widths.windows(2).all(|w| w[0] < w[1]) {
            return Err(ConfigError::LadderNotAscending(widths));
        }
        if self.images.formats.is_empty() {
            return Err(ConfigError::NoFormats);
        }
        Ok(())
    }
}

/// Effective generator thread count: configured value capped at available
/// cores — users can constrain down, not up.
pub fn effective_threads(processing: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    if processing.threads == 0 {
        cores
    } else {
        processing.threads.min(cores)
    }
}

//! # respimg
//!
//! A responsive image pipeline: a build-time generator that transcodes
//! source photographs into a breakpoint × format matrix with JSON
//! metadata, and a runtime layer that picks, caches, and progressively
//! loads the right rendition.
//!
//! # Architecture: Build Time vs Runtime
//!
//! The two halves meet only at the generated artifacts:
//!
//! ```text
//! Build    photos/   →  optimized/           (variants + metadata.json)
//! Runtime  metadata  →  select → cache → load (what the page actually shows)
//! ```
//!
//! This split exists for three reasons:
//!
//! - **Static hosting**: the build output is plain files; nothing is
//!   resized on request.
//! - **Inspectability**: every image's matrix is a human-readable
//!   `metadata.json` you can diff between builds.
//! - **Testability**: selection, caching, and load scheduling are pure or
//!   mock-backed, so the runtime is exercised without a network or a
//!   browser.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`process`] | Build stage — discovers sources, plans and encodes the variant matrix, writes metadata |
//! | [`imaging`] | Encode backend trait and the pure-Rust implementation (resize, WebP/JPEG encode) |
//! | [`verify`] | Post-build check that the generated output upholds the metadata invariants |
//! | [`select`] | Picks the variant for a viewport width and decode capability |
//! | [`cache`] | Categorized runtime cache: FIFO stores, per-category strategies, command protocol |
//! | [`loader`] | Progressive loader: phased batches, per-slot state, the advance gate |
//! | [`config`] | `respimg.toml` loading, defaults, validation |
//! | [`types`] | The breakpoint ladder, formats, and metadata schema shared by both halves |
//! | [`report`] | Build-run reporting: non-fatal failures and the aggregate summary |
//!
//! # Design Decisions
//!
//! ## WebP + JPEG, Not One Format
//!
//! Every emitted breakpoint carries every configured format, and the
//! matrix is all-or-nothing per breakpoint: a breakpoint that lost one of
//! its formats is dropped entirely rather than published half-built, so
//! format selection at runtime can never dead-end.
//!
//! ## FIFO Caches, Not LRU
//!
//! The runtime stores evict oldest-inserted, not least-recently-used.
//! Gallery traffic is a sweep, not a working set: recency is a poor
//! predictor, and FIFO keeps eviction order independent of read patterns,
//! which makes cache behavior reproducible.

pub mod cache;
pub mod config;
pub mod imaging;
pub mod loader;
pub mod process;
pub mod report;
pub mod select;
pub mod types;
pub mod verify;

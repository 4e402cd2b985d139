//! Image operations for the variant generator — pure Rust, zero external
//! dependencies.
//!
//! The module is split into:
//! - **Calculations**: pure functions planning the breakpoint matrix (unit testable)
//! - **Parameters**: data structures describing encode jobs
//! - **Backend**: [`EncodeBackend`] trait + [`RustBackend`]

pub mod backend;
pub mod calculations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, EncodeBackend};
pub use calculations::{PlannedVariant, plan_variants};
pub use params::{EncodeParams, Quality};
pub use rust_backend::{RustBackend, supported_input_extensions};

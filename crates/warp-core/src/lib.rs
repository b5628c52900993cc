//! The pure warp engine: geometry primitives, the spline smoother, the warp
//! interpolator, the stamp compositor and the resampler.
//!
//! Everything here is a pure function of an immutable [`warp_data::Document`]
//! snapshot; the editing layer clones under its lock before evaluating.

pub mod bezier;
pub mod distortion;
pub mod interpolate;
pub mod rect;
pub mod resample;
pub mod smooth;
pub mod stamp;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;

pub use distortion::{build_map, map_extent, DisplacementMap};
pub use interpolate::{interpolate_paths, STAMP_RELOCATION};
pub use rect::IRect;
pub use resample::{apply_map, copy_through, Kernel};
pub use smooth::smooth_paths;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum EngineError {
    #[error("evaluation cancelled")]
    Cancelled,
    #[error("displacement map of {width}x{height} px is too large")]
    MapTooLarge { width: i32, height: i32 },
    #[error("unknown kernel id {0}")]
    UnknownKernel(u32),
}

/// Cooperative cancellation flag, checked between stamps and between row
/// blocks. On cancel the output buffer is undefined and must be discarded.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

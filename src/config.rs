//! Editor configuration.
//!
//! The only process-wide state the engine keeps is the last radius the user
//! dragged out; everything else here is per-session defaults. All reads go
//! through [`Settings`] so the rest of the core never touches storage.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use warp_core::Kernel;

/// Default warp radius in raw-frame pixels when no stored radius exists,
/// before view scaling.
pub const DEFAULT_RADIUS: f64 = 100.0;
/// Default strength handle offset in device-independent pixels.
pub const DEFAULT_STRENGTH: f64 = 50.0;
/// Pointer travel (device pixels) before a press becomes a drag.
pub const MIN_DRAG: f64 = 4.0;
/// Handle gizmo diameter in device pixels, used for hit testing.
pub const GIZMO: f64 = 8.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Radius (raw-frame pixels) to seed newly created warps with.
    #[serde(default)]
    pub last_used_radius: Option<f64>,
    /// Reconstruction kernel for the resampler.
    #[serde(default)]
    pub kernel: Kernel,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            last_used_radius: None,
            kernel: Kernel::default(),
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Radius for a newly placed warp: the stored radius if any, otherwise
    /// the default scaled to the current view.
    pub fn seed_radius(&self, view_scale: f64) -> f64 {
        self.last_used_radius
            .unwrap_or(DEFAULT_RADIUS * view_scale)
    }
}

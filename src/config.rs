//! Render configuration
//!
//! Tunables for the hardware/software dispatch, stored as JSON next to the
//! application the same way scene files are.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Smallest rectangle (in pixels) worth a hardware fill call
pub const DEFAULT_HARDWARE_FILL_MIN_AREA: i32 = 32 * 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Let large fills on hardware surfaces go to the native blitter
    pub allow_hardware_fills: bool,
    /// Minimum (dx - sx) * (dy - sy) for the hardware fill path
    pub hardware_fill_min_area: i32,
    /// Whether the native blitter copes with overlapping source/destination
    /// rectangles on one surface. When false those blits run in software.
    pub overlapped_video_blits: bool,
}

impl RenderConfig {
    /// Save config to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load config from a JSON file. Missing keys take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            allow_hardware_fills: true,
            hardware_fill_min_area: DEFAULT_HARDWARE_FILL_MIN_AREA,
            overlapped_video_blits: true,
        }
    }
}

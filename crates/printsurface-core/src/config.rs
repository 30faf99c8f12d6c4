//! Editor tuning knobs.

use crate::snap::DEFAULT_SNAP_THRESHOLD;
use crate::document::MAX_UNDO_HISTORY;
use serde::{Deserialize, Serialize};

/// Thresholds used by preflight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreflightConfig {
    /// Strokes thinner than this (but not zero) are flagged, in stage px.
    pub min_stroke_px: f64,
    /// Text smaller than this is flagged, in stage px.
    pub min_font_px: f64,
    /// Images printing below this resolution are flagged.
    pub min_image_dpi: f64,
}

impl Default for PreflightConfig {
    fn default() -> Self {
        Self {
            min_stroke_px: 2.0,
            min_font_px: 14.0,
            min_image_dpi: 150.0,
        }
    }
}

/// Configuration for one editor session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Snap distance in stage pixels.
    pub snap_threshold_px: f64,
    pub preflight: PreflightConfig,
    /// Corner radius used when the first side does not suggest one.
    pub default_corner_radius_mm: f64,
    /// Undo states kept for the live tree.
    pub undo_limit: usize,
    /// Hit-test slack around nodes, in stage pixels.
    pub hit_tolerance_px: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            snap_threshold_px: DEFAULT_SNAP_THRESHOLD,
            preflight: PreflightConfig::default(),
            default_corner_radius_mm: 3.0,
            undo_limit: MAX_UNDO_HISTORY,
            hit_tolerance_px: 4.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: EditorConfig =
            serde_json::from_str(r#"{"snap_threshold_px": 10, "preflight": {"min_font_px": 18}}"#)
                .unwrap();
        assert_eq!(config.snap_threshold_px, 10.0);
        assert_eq!(config.preflight.min_font_px, 18.0);
        assert_eq!(config.preflight.min_stroke_px, 2.0);
        assert_eq!(config.undo_limit, MAX_UNDO_HISTORY);
    }
}

//! Physical product description and the canvas geometry derived from it.
//!
//! A [`PrintSpec`] is handed to the editor once at mount and never changes.
//! All pixel geometry is recomputed from the millimetre values on demand
//! through [`PrintSide::geometry`], so it can never drift from its source.

use crate::units::{DEFAULT_DPI, mm_to_px};
use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Identifier of a printable side (`front`, `back`, ...).
pub type SideId = String;

/// Fatal configuration problems in a [`PrintSpec`].
#[derive(Debug, Error, PartialEq)]
pub enum SpecError {
    #[error("Print spec has no sides")]
    EmptySideList,
    #[error("Side '{0}' is referenced but not defined")]
    MissingSide(SideId),
    #[error("Side '{0}' is defined more than once")]
    DuplicateSide(SideId),
    #[error("Export DPI must be positive, got {0}")]
    InvalidDpi(f64),
    #[error("Side '{side}' has invalid {field}: {value}")]
    InvalidDimension {
        side: SideId,
        field: &'static str,
        value: f64,
    },
    #[error("Side '{0}' has no room left inside its safe margin")]
    SafeAreaCollapsed(SideId),
    #[error("Side id '{0}' must be a plain name without path separators")]
    InvalidSideId(SideId),
    #[error("Invalid print spec JSON: {0}")]
    Json(String),
}

/// Physical corner finish of the printed piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CornerStyle {
    #[default]
    Square,
    Rounded,
}

impl CornerStyle {
    /// Flip between square and rounded.
    pub fn toggled(self) -> Self {
        match self {
            CornerStyle::Square => CornerStyle::Rounded,
            CornerStyle::Rounded => CornerStyle::Square,
        }
    }
}

/// Per-side corner finish suggested by the product.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CornerSpec {
    pub style: CornerStyle,
    pub radius_mm: f64,
}

/// Orientation of a fold line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FoldOrientation {
    /// Runs top to bottom; offset is measured from the left trim edge.
    Vertical,
    /// Runs left to right; offset is measured from the top trim edge.
    Horizontal,
}

/// A fold on a folded product, positioned relative to the trim edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FoldLine {
    pub orientation: FoldOrientation,
    pub offset_mm: f64,
}

/// One printable face of the product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrintSide {
    pub id: SideId,
    pub name: String,
    pub trim_width_mm: f64,
    pub trim_height_mm: f64,
    pub bleed_mm: f64,
    pub safe_mm: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corner: Option<CornerSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fold_lines: Vec<FoldLine>,
}

/// Pixel geometry of a side at a given resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SideGeometry {
    /// Resolution the geometry was computed at.
    pub dpi: f64,
    /// Full canvas including bleed on every side.
    pub canvas: Size,
    pub bleed_px: f64,
    pub safe_px: f64,
    /// Final cut boundary, inset from the canvas by the bleed.
    pub trim_rect: Rect,
    /// Area important content should stay in, inset from trim by the safe margin.
    pub safe_rect: Rect,
}

impl SideGeometry {
    /// The whole stage as a rectangle anchored at the origin.
    pub fn stage_rect(&self) -> Rect {
        self.canvas.to_rect()
    }

    /// Center of the stage.
    pub fn stage_center(&self) -> Point {
        self.stage_rect().center()
    }
}

impl PrintSide {
    /// Create a side with square corners and no folds.
    pub fn new(
        id: impl Into<SideId>,
        name: impl Into<String>,
        trim_width_mm: f64,
        trim_height_mm: f64,
        bleed_mm: f64,
        safe_mm: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            trim_width_mm,
            trim_height_mm,
            bleed_mm,
            safe_mm,
            corner: None,
            fold_lines: Vec::new(),
        }
    }

    /// Set the suggested corner finish.
    pub fn with_corner(mut self, style: CornerStyle, radius_mm: f64) -> Self {
        self.corner = Some(CornerSpec { style, radius_mm });
        self
    }

    /// Add a fold line.
    pub fn with_fold(mut self, orientation: FoldOrientation, offset_mm: f64) -> Self {
        self.fold_lines.push(FoldLine {
            orientation,
            offset_mm,
        });
        self
    }

    /// Compute the pixel geometry of this side at `dpi`.
    pub fn geometry(&self, dpi: f64) -> SideGeometry {
        let canvas = Size::new(
            mm_to_px(self.trim_width_mm + 2.0 * self.bleed_mm, dpi),
            mm_to_px(self.trim_height_mm + 2.0 * self.bleed_mm, dpi),
        );
        let bleed_px = mm_to_px(self.bleed_mm, dpi);
        let safe_px = mm_to_px(self.safe_mm, dpi);
        let trim_rect = Rect::new(
            bleed_px,
            bleed_px,
            canvas.width - bleed_px,
            canvas.height - bleed_px,
        );
        let safe_rect = trim_rect.inset(-safe_px);
        SideGeometry {
            dpi,
            canvas,
            bleed_px,
            safe_px,
            trim_rect,
            safe_rect,
        }
    }

    /// Fold lines as stage-space segments at `dpi`.
    pub fn fold_segments(&self, dpi: f64) -> Vec<kurbo::Line> {
        let geometry = self.geometry(dpi);
        let trim = geometry.trim_rect;
        self.fold_lines
            .iter()
            .map(|fold| {
                let offset = mm_to_px(fold.offset_mm, dpi);
                match fold.orientation {
                    FoldOrientation::Vertical => kurbo::Line::new(
                        Point::new(trim.x0 + offset, trim.y0),
                        Point::new(trim.x0 + offset, trim.y1),
                    ),
                    FoldOrientation::Horizontal => kurbo::Line::new(
                        Point::new(trim.x0, trim.y0 + offset),
                        Point::new(trim.x1, trim.y0 + offset),
                    ),
                }
            })
            .collect()
    }

    fn validate(&self, dpi: f64) -> Result<(), SpecError> {
        let checks = [
            ("trim width", self.trim_width_mm, self.trim_width_mm > 0.0),
            ("trim height", self.trim_height_mm, self.trim_height_mm > 0.0),
            ("bleed", self.bleed_mm, self.bleed_mm >= 0.0),
            ("safe margin", self.safe_mm, self.safe_mm >= 0.0),
        ];
        for (field, value, ok) in checks {
            if !ok || !value.is_finite() {
                return Err(SpecError::InvalidDimension {
                    side: self.id.clone(),
                    field,
                    value,
                });
            }
        }
        if let Some(corner) = self.corner {
            if !(corner.radius_mm >= 0.0) || !corner.radius_mm.is_finite() {
                return Err(SpecError::InvalidDimension {
                    side: self.id.clone(),
                    field: "corner radius",
                    value: corner.radius_mm,
                });
            }
        }
        let safe = self.geometry(dpi).safe_rect;
        if safe.width() <= 0.0 || safe.height() <= 0.0 {
            return Err(SpecError::SafeAreaCollapsed(self.id.clone()));
        }
        Ok(())
    }
}

/// Wire shape of a print spec before validation.
#[derive(Debug, Clone, Deserialize)]
struct PrintSpecDef {
    id: String,
    name: String,
    #[serde(default)]
    folded: bool,
    side_ids: Vec<SideId>,
    sides: Vec<PrintSide>,
    #[serde(default = "default_dpi")]
    export_dpi: f64,
}

fn default_dpi() -> f64 {
    DEFAULT_DPI
}

/// Side ids end up in export file names.
fn is_plain_side_id(id: &str) -> bool {
    !id.is_empty() && id != "." && !id.contains("..") && !id.contains(['/', '\\'])
}

/// Immutable description of a printable product.
///
/// Construction validates every referenced side, so a `PrintSpec` value is
/// always well formed. Sides are stored in `side_ids` order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PrintSpecDef")]
pub struct PrintSpec {
    id: String,
    name: String,
    folded: bool,
    side_ids: Vec<SideId>,
    sides: Vec<PrintSide>,
    export_dpi: f64,
}

impl TryFrom<PrintSpecDef> for PrintSpec {
    type Error = SpecError;

    fn try_from(def: PrintSpecDef) -> Result<Self, Self::Error> {
        PrintSpec::new(
            def.id,
            def.name,
            def.folded,
            def.side_ids,
            def.sides,
            def.export_dpi,
        )
    }
}

impl PrintSpec {
    /// Build and validate a print spec.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        folded: bool,
        side_ids: Vec<SideId>,
        sides: Vec<PrintSide>,
        export_dpi: f64,
    ) -> Result<Self, SpecError> {
        if !(export_dpi > 0.0) || !export_dpi.is_finite() {
            return Err(SpecError::InvalidDpi(export_dpi));
        }
        if side_ids.is_empty() {
            return Err(SpecError::EmptySideList);
        }

        if let Some(bad) = side_ids
            .iter()
            .chain(sides.iter().map(|s| &s.id))
            .find(|id| !is_plain_side_id(id))
        {
            return Err(SpecError::InvalidSideId(bad.clone()));
        }

        let mut seen = HashSet::new();
        for side in &sides {
            if !seen.insert(side.id.as_str()) {
                return Err(SpecError::DuplicateSide(side.id.clone()));
            }
        }
        let mut referenced = HashSet::new();
        for id in &side_ids {
            if !referenced.insert(id.as_str()) {
                return Err(SpecError::DuplicateSide(id.clone()));
            }
        }

        let mut ordered = Vec::with_capacity(side_ids.len());
        for id in &side_ids {
            let side = sides
                .iter()
                .find(|s| &s.id == id)
                .ok_or_else(|| SpecError::MissingSide(id.clone()))?;
            side.validate(export_dpi)?;
            ordered.push(side.clone());
        }

        Ok(Self {
            id: id.into(),
            name: name.into(),
            folded,
            side_ids,
            sides: ordered,
            export_dpi,
        })
    }

    /// Parse and validate a print spec from JSON.
    pub fn from_json(json: &str) -> Result<Self, SpecError> {
        let def: PrintSpecDef =
            serde_json::from_str(json).map_err(|e| SpecError::Json(e.to_string()))?;
        PrintSpec::try_from(def)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_folded(&self) -> bool {
        self.folded
    }

    pub fn export_dpi(&self) -> f64 {
        self.export_dpi
    }

    /// Side ids in display order.
    pub fn side_ids(&self) -> &[SideId] {
        &self.side_ids
    }

    /// Sides in display order.
    pub fn sides(&self) -> &[PrintSide] {
        &self.sides
    }

    /// The side shown when the editor mounts.
    pub fn first_side(&self) -> &PrintSide {
        // Validation guarantees at least one side.
        &self.sides[0]
    }

    /// Look up a side by id.
    pub fn side(&self, id: &str) -> Option<&PrintSide> {
        self.sides.iter().find(|s| s.id == id)
    }

    /// Check if a side id belongs to this spec.
    pub fn has_side(&self, id: &str) -> bool {
        self.side(id).is_some()
    }

    /// Geometry of a side at the export resolution.
    pub fn geometry(&self, id: &str) -> Option<SideGeometry> {
        self.side(id).map(|s| s.geometry(self.export_dpi))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::px_to_mm;
    use proptest::prelude::*;

    fn card() -> PrintSpec {
        PrintSpec::new(
            "card",
            "Business card",
            false,
            vec!["front".into(), "back".into()],
            vec![
                PrintSide::new("back", "Back", 85.0, 55.0, 3.0, 3.0),
                PrintSide::new("front", "Front", 85.0, 55.0, 3.0, 3.0),
            ],
            300.0,
        )
        .unwrap()
    }

    #[test]
    fn test_sides_follow_side_id_order() {
        let spec = card();
        let ids: Vec<_> = spec.sides().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["front", "back"]);
        assert_eq!(spec.first_side().id, "front");
    }

    #[test]
    fn test_missing_side_is_fatal() {
        let result = PrintSpec::new(
            "card",
            "Card",
            false,
            vec!["front".into(), "back".into()],
            vec![PrintSide::new("front", "Front", 85.0, 55.0, 3.0, 3.0)],
            300.0,
        );
        assert_eq!(result, Err(SpecError::MissingSide("back".into())));
    }

    #[test]
    fn test_invalid_dpi() {
        let result = PrintSpec::new(
            "card",
            "Card",
            false,
            vec!["front".into()],
            vec![PrintSide::new("front", "Front", 85.0, 55.0, 3.0, 3.0)],
            0.0,
        );
        assert!(matches!(result, Err(SpecError::InvalidDpi(_))));
    }

    #[test]
    fn test_safe_area_collapse() {
        let result = PrintSpec::new(
            "tiny",
            "Tiny",
            false,
            vec!["front".into()],
            vec![PrintSide::new("front", "Front", 10.0, 10.0, 0.0, 5.0)],
            300.0,
        );
        assert_eq!(result, Err(SpecError::SafeAreaCollapsed("front".into())));
    }

    #[test]
    fn test_duplicate_side() {
        let result = PrintSpec::new(
            "card",
            "Card",
            false,
            vec!["front".into()],
            vec![
                PrintSide::new("front", "Front", 85.0, 55.0, 3.0, 3.0),
                PrintSide::new("front", "Front again", 85.0, 55.0, 3.0, 3.0),
            ],
            300.0,
        );
        assert_eq!(result, Err(SpecError::DuplicateSide("front".into())));
    }

    #[test]
    fn test_from_json_validates() {
        let json = r#"{
            "id": "poster",
            "name": "Poster",
            "side_ids": ["front", "back"],
            "sides": [{"id": "front", "name": "Front", "trim_width_mm": 100,
                       "trim_height_mm": 150, "bleed_mm": 3, "safe_mm": 3}]
        }"#;
        assert_eq!(
            PrintSpec::from_json(json),
            Err(SpecError::MissingSide("back".into()))
        );
    }

    #[test]
    fn test_from_json_reports_malformed_json() {
        assert!(matches!(PrintSpec::from_json("{"), Err(SpecError::Json(_))));
    }

    #[test]
    fn test_side_ids_must_be_plain_names() {
        for bad in ["../x", "a/b", "a\\b", ""] {
            let result = PrintSpec::new(
                "card",
                "Card",
                false,
                vec![bad.into()],
                vec![PrintSide::new(bad, "Front", 85.0, 55.0, 3.0, 3.0)],
                300.0,
            );
            assert_eq!(result, Err(SpecError::InvalidSideId(bad.into())), "{bad}");
        }
        let json = r#"{
            "id": "poster",
            "name": "Poster",
            "side_ids": ["../escape"],
            "sides": [{"id": "../escape", "name": "Front", "trim_width_mm": 100,
                       "trim_height_mm": 150, "bleed_mm": 3, "safe_mm": 3}]
        }"#;
        assert_eq!(
            PrintSpec::from_json(json),
            Err(SpecError::InvalidSideId("../escape".into()))
        );
    }

    #[test]
    fn test_from_json_defaults_dpi() {
        let json = r#"{
            "id": "poster",
            "name": "Poster",
            "side_ids": ["front"],
            "sides": [{"id": "front", "name": "Front", "trim_width_mm": 100,
                       "trim_height_mm": 150, "bleed_mm": 3, "safe_mm": 3,
                       "corner": {"style": "rounded", "radius_mm": 4}}]
        }"#;
        let spec = PrintSpec::from_json(json).unwrap();
        assert_eq!(spec.export_dpi(), DEFAULT_DPI);
        assert!(!spec.is_folded());
        assert_eq!(
            spec.first_side().corner,
            Some(CornerSpec {
                style: CornerStyle::Rounded,
                radius_mm: 4.0
            })
        );
    }

    #[test]
    fn test_geometry_scenario() {
        // 1200x1800 px trim with 36 px bleed and safe at 300 DPI
        let side = PrintSide::new(
            "front",
            "Front",
            px_to_mm(1200.0, 300.0),
            px_to_mm(1800.0, 300.0),
            px_to_mm(36.0, 300.0),
            px_to_mm(36.0, 300.0),
        );
        let g = side.geometry(300.0);
        assert_eq!(g.canvas, Size::new(1272.0, 1872.0));
        assert_eq!(g.trim_rect, Rect::new(36.0, 36.0, 1236.0, 1836.0));
        assert_eq!(g.safe_rect, Rect::new(72.0, 72.0, 1200.0, 1800.0));
    }

    #[test]
    fn test_fold_segments() {
        let side = PrintSide::new("inside", "Inside", 200.0, 100.0, 0.0, 5.0)
            .with_fold(FoldOrientation::Vertical, 100.0);
        let segments = side.fold_segments(25.4);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].p0, Point::new(100.0, 0.0));
        assert_eq!(segments[0].p1, Point::new(100.0, 100.0));
    }

    proptest! {
        #[test]
        fn prop_safe_rect_inset_from_trim(
            w in 20.0f64..600.0,
            h in 20.0f64..600.0,
            b in 0.0f64..5.0,
            s in 0.0f64..5.0,
            dpi in prop::sample::select(vec![150.0f64, 300.0, 600.0]),
        ) {
            prop_assume!(w > 2.0 * (b + s) && h > 2.0 * (b + s));
            let g = PrintSide::new("front", "Front", w, h, b, s).geometry(dpi);
            let trim = g.trim_rect;
            let safe = g.safe_rect;
            prop_assert_eq!(safe.x0 - trim.x0, g.safe_px);
            prop_assert_eq!(safe.y0 - trim.y0, g.safe_px);
            prop_assert_eq!(trim.x1 - safe.x1, g.safe_px);
            prop_assert_eq!(trim.y1 - safe.y1, g.safe_px);
            prop_assert_eq!(g.canvas.width, mm_to_px(w + 2.0 * b, dpi));
        }
    }
}

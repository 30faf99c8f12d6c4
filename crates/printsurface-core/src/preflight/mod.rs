//! Print-readiness checks over a side's design tree.
//!
//! Preflight never fails: every problem becomes a [`WarningItem`] whose id
//! is derived from the warning kind and node id, so running it again on the
//! same tree yields the same ids and fixing one node removes exactly its
//! warnings.

mod corner;

pub use corner::{Corner, corner_danger};

use crate::config::PreflightConfig;
use crate::document::DesignTree;
use crate::nodes::{Node, NodeId};
use crate::print_spec::{CornerStyle, SideGeometry};
use crate::units::mm_to_px;
use kurbo::Rect;
use serde::{Deserialize, Serialize};

/// How serious a warning is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Advisory only.
    Warn,
    /// Blocks export.
    Error,
}

/// Kind of print-readiness problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningKind {
    OutsideTrim,
    OutsideSafe,
    RoundedCornerDanger,
    ThinStroke,
    SmallText,
    LowResolution,
}

impl WarningKind {
    /// Stable code used in warning ids.
    pub fn code(self) -> &'static str {
        match self {
            WarningKind::OutsideTrim => "OUTSIDE_TRIM",
            WarningKind::OutsideSafe => "OUTSIDE_SAFE",
            WarningKind::RoundedCornerDanger => "ROUNDED_CORNER_DANGER",
            WarningKind::ThinStroke => "THIN_STROKE",
            WarningKind::SmallText => "SMALL_TEXT",
            WarningKind::LowResolution => "LOW_RESOLUTION",
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            WarningKind::OutsideTrim => Severity::Error,
            _ => Severity::Warn,
        }
    }

    /// The fix suggested for this kind of problem.
    pub fn fix(self) -> FixHint {
        match self {
            WarningKind::OutsideTrim => FixHint::MoveInsideTrim,
            WarningKind::OutsideSafe => FixHint::MoveInsideSafe,
            WarningKind::RoundedCornerDanger => FixHint::MoveAwayFromCorner,
            WarningKind::ThinStroke => FixHint::IncreaseStroke,
            WarningKind::SmallText => FixHint::IncreaseFontSize,
            WarningKind::LowResolution => FixHint::ReplaceImage,
        }
    }
}

/// Suggested remedy attached to a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FixHint {
    MoveInsideTrim,
    MoveInsideSafe,
    MoveAwayFromCorner,
    IncreaseStroke,
    IncreaseFontSize,
    ReplaceImage,
}

impl FixHint {
    pub fn tag(self) -> &'static str {
        match self {
            FixHint::MoveInsideTrim => "move-inside-trim",
            FixHint::MoveInsideSafe => "move-inside-safe",
            FixHint::MoveAwayFromCorner => "move-away-from-corner",
            FixHint::IncreaseStroke => "increase-stroke",
            FixHint::IncreaseFontSize => "increase-font-size",
            FixHint::ReplaceImage => "replace-image",
        }
    }
}

/// One preflight finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarningItem {
    /// `KIND:node-id`, stable across runs.
    pub id: String,
    pub kind: WarningKind,
    pub message: String,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fix: Option<FixHint>,
}

impl WarningItem {
    /// Create a warning about a node.
    pub fn for_node(kind: WarningKind, node_id: &str, message: impl Into<String>) -> Self {
        Self {
            id: warning_id(kind, node_id),
            kind,
            message: message.into(),
            severity: kind.severity(),
            node_id: Some(node_id.to_string()),
            fix: Some(kind.fix()),
        }
    }

    pub fn is_blocking(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Id of the warning of `kind` raised for `node_id`.
pub fn warning_id(kind: WarningKind, node_id: &str) -> String {
    format!("{}:{}", kind.code(), node_id)
}

/// Check if any warning should block export.
pub fn has_blocking(warnings: &[WarningItem]) -> bool {
    warnings.iter().any(WarningItem::is_blocking)
}

/// Side geometry and corner settings a preflight run is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreflightContext {
    pub geometry: SideGeometry,
    pub corner_style: CornerStyle,
    pub corner_radius_mm: f64,
}

impl PreflightContext {
    pub fn new(geometry: SideGeometry, corner_style: CornerStyle, corner_radius_mm: f64) -> Self {
        Self {
            geometry,
            corner_style,
            corner_radius_mm,
        }
    }

    /// Corner radius in stage pixels, zero unless corners are rounded.
    pub fn corner_radius_px(&self) -> f64 {
        match self.corner_style {
            CornerStyle::Rounded if self.corner_radius_mm > 0.0 => {
                mm_to_px(self.corner_radius_mm, self.geometry.dpi)
            }
            _ => 0.0,
        }
    }
}

fn contains_rect(outer: Rect, inner: Rect) -> bool {
    inner.x0 >= outer.x0 && inner.y0 >= outer.y0 && inner.x1 <= outer.x1 && inner.y1 <= outer.y1
}

/// Check every visible, identifiable node of `tree`.
///
/// Warnings come out in z-order, and within one node in the fixed order
/// of [`WarningKind`].
pub fn run_preflight(
    tree: &DesignTree,
    ctx: &PreflightContext,
    config: &PreflightConfig,
) -> Vec<WarningItem> {
    let radius_px = ctx.corner_radius_px();
    let mut warnings = Vec::new();
    for node in tree.nodes_ordered() {
        if node.id().is_empty() || !node.is_visible() {
            continue;
        }
        check_node(node, ctx, config, radius_px, &mut warnings);
    }
    log::debug!("Preflight found {} warning(s)", warnings.len());
    warnings
}

fn check_node(
    node: &Node,
    ctx: &PreflightContext,
    config: &PreflightConfig,
    radius_px: f64,
    out: &mut Vec<WarningItem>,
) {
    let id = node.id();
    let kind = node.kind_name();
    let bbox = node.bounds();
    let geometry = &ctx.geometry;

    if !contains_rect(geometry.trim_rect, bbox) {
        out.push(WarningItem::for_node(
            WarningKind::OutsideTrim,
            id,
            format!("This {kind} extends past the trim line and will be cut off."),
        ));
    }
    if !contains_rect(geometry.safe_rect, bbox) {
        out.push(WarningItem::for_node(
            WarningKind::OutsideSafe,
            id,
            format!("This {kind} is outside the safe zone and may be trimmed."),
        ));
    }
    if let Some(corner) = corner_danger(bbox, geometry.safe_rect, radius_px) {
        out.push(WarningItem::for_node(
            WarningKind::RoundedCornerDanger,
            id,
            format!(
                "This {kind} reaches into the rounded {} corner, which is cut away.",
                corner.name()
            ),
        ));
    }

    let style = node.style();
    if style.is_stroked() && style.stroke_width < config.min_stroke_px {
        out.push(WarningItem::for_node(
            WarningKind::ThinStroke,
            id,
            format!(
                "Stroke width {:.1}px is below {:.0}px and may not print clearly.",
                style.stroke_width, config.min_stroke_px
            ),
        ));
    }

    if let Some(text) = node.as_text() {
        if text.font_size < config.min_font_px {
            out.push(WarningItem::for_node(
                WarningKind::SmallText,
                id,
                format!(
                    "Text size {:.0}px is below {:.0}px and may be hard to read.",
                    text.font_size, config.min_font_px
                ),
            ));
        }
    }

    if let Some(image) = node.as_image() {
        if let Some(dpi) = image.effective_dpi(geometry.dpi) {
            if dpi < config.min_image_dpi {
                out.push(WarningItem::for_node(
                    WarningKind::LowResolution,
                    id,
                    format!(
                        "Image prints at {dpi:.0} DPI, below the recommended {:.0} DPI.",
                        config.min_image_dpi
                    ),
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::{Image, ImageFormat, Line, NodeStyle, Rectangle, SerializableColor, Text};
    use crate::print_spec::PrintSide;
    use crate::units::px_to_mm;
    use kurbo::Point;
    use std::collections::HashSet;

    fn geometry() -> SideGeometry {
        PrintSide::new(
            "front",
            "Front",
            px_to_mm(1200.0, 300.0),
            px_to_mm(1800.0, 300.0),
            px_to_mm(36.0, 300.0),
            px_to_mm(36.0, 300.0),
        )
        .geometry(300.0)
    }

    fn square_ctx() -> PreflightContext {
        PreflightContext::new(geometry(), CornerStyle::Square, 3.0)
    }

    fn kinds(warnings: &[WarningItem]) -> Vec<WarningKind> {
        warnings.iter().map(|w| w.kind).collect()
    }

    #[test]
    fn test_outside_trim_and_safe() {
        let tree = DesignTree::from_nodes(vec![
            Rectangle::with_id("box", Point::new(0.0, 0.0), 100.0, 100.0).into(),
        ]);
        let warnings = run_preflight(&tree, &square_ctx(), &PreflightConfig::default());
        assert_eq!(kinds(&warnings), vec![WarningKind::OutsideTrim, WarningKind::OutsideSafe]);
        assert_eq!(warnings[0].id, "OUTSIDE_TRIM:box");
        assert_eq!(warnings[0].severity, Severity::Error);
        assert_eq!(warnings[1].fix, Some(FixHint::MoveInsideSafe));
        assert!(has_blocking(&warnings));
    }

    #[test]
    fn test_between_trim_and_safe_is_advisory() {
        let tree = DesignTree::from_nodes(vec![
            Rectangle::with_id("box", Point::new(40.0, 200.0), 100.0, 100.0).into(),
        ]);
        let warnings = run_preflight(&tree, &square_ctx(), &PreflightConfig::default());
        assert_eq!(kinds(&warnings), vec![WarningKind::OutsideSafe]);
        assert!(!has_blocking(&warnings));
    }

    #[test]
    fn test_thin_stroke() {
        let mut style = NodeStyle::default();
        style.stroke_width = 1.0;
        let thin = Line::new(Point::new(200.0, 200.0), Point::new(400.0, 200.0)).with_style(style);
        let mut hairless = NodeStyle::default();
        hairless.stroke_width = 0.0;
        let none = Rectangle::with_id("nostroke", Point::new(200.0, 300.0), 50.0, 50.0)
            .with_style(hairless);
        let tree = DesignTree::from_nodes(vec![thin.into(), none.into()]);
        let warnings = run_preflight(&tree, &square_ctx(), &PreflightConfig::default());
        assert_eq!(kinds(&warnings), vec![WarningKind::ThinStroke]);
    }

    #[test]
    fn test_small_text() {
        let tree = DesignTree::from_nodes(vec![
            Text::new("small", Point::new(200.0, 200.0), "fine print").with_font_size(10.0).into(),
            Text::new("big", Point::new(200.0, 400.0), "Headline").with_font_size(14.0).into(),
        ]);
        let warnings = run_preflight(&tree, &square_ctx(), &PreflightConfig::default());
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].id, "SMALL_TEXT:small");
        assert_eq!(warnings[0].fix.map(FixHint::tag), Some("increase-font-size"));
    }

    #[test]
    fn test_low_resolution_image() {
        let image = Image::new(Point::new(200.0, 200.0), &[0u8; 4], 100, 100, ImageFormat::Png)
            .with_id("photo")
            .with_size(400.0, 400.0);
        let tree = DesignTree::from_nodes(vec![image.into()]);
        let warnings = run_preflight(&tree, &square_ctx(), &PreflightConfig::default());
        assert_eq!(kinds(&warnings), vec![WarningKind::LowResolution]);
    }

    #[test]
    fn test_rounded_corner_only_when_rounded() {
        let center = Corner::TopLeft.circle_center(geometry().safe_rect, mm_to_px(3.0, 300.0));
        let node = Rectangle::with_id("badge", Point::new(center.x - 40.0, center.y - 40.0), 40.0, 40.0)
            .with_style(NodeStyle::filled(SerializableColor::black()));
        let tree = DesignTree::from_nodes(vec![node.into()]);
        let config = PreflightConfig::default();

        let square = run_preflight(&tree, &square_ctx(), &config);
        assert!(!kinds(&square).contains(&WarningKind::RoundedCornerDanger));

        let rounded = PreflightContext::new(geometry(), CornerStyle::Rounded, 3.0);
        let warnings = run_preflight(&tree, &rounded, &config);
        assert!(kinds(&warnings).contains(&WarningKind::RoundedCornerDanger));

        let zero = PreflightContext::new(geometry(), CornerStyle::Rounded, 0.0);
        let warnings = run_preflight(&tree, &zero, &config);
        assert!(!kinds(&warnings).contains(&WarningKind::RoundedCornerDanger));
    }

    #[test]
    fn test_flat_line_in_rounded_corner_flags() {
        let rule = Line::from_points("rule", vec![Point::new(72.0, 73.0), Point::new(150.0, 73.0)]);
        let tree = DesignTree::from_nodes(vec![rule.into()]);
        let config = PreflightConfig::default();

        let rounded = PreflightContext::new(geometry(), CornerStyle::Rounded, px_to_mm(40.0, 300.0));
        let warnings = run_preflight(&tree, &rounded, &config);
        assert!(warnings.iter().any(|w| w.id == "ROUNDED_CORNER_DANGER:rule"));

        let warnings = run_preflight(&tree, &square_ctx(), &config);
        assert!(!kinds(&warnings).contains(&WarningKind::RoundedCornerDanger));
    }

    #[test]
    fn test_hidden_and_anonymous_nodes_are_skipped() {
        let mut hidden = Rectangle::with_id("hidden", Point::ZERO, 10.0, 10.0);
        hidden.visible = false;
        let anonymous = Rectangle::with_id("", Point::ZERO, 10.0, 10.0);
        let tree = DesignTree::from_nodes(vec![hidden.into(), anonymous.into()]);
        assert!(run_preflight(&tree, &square_ctx(), &PreflightConfig::default()).is_empty());
    }

    #[test]
    fn test_idempotent() {
        let tree = DesignTree::from_nodes(vec![
            Rectangle::with_id("a", Point::new(0.0, 0.0), 100.0, 100.0).into(),
            Text::new("b", Point::new(10.0, 500.0), "x").with_font_size(8.0).into(),
        ]);
        let ctx = square_ctx();
        let config = PreflightConfig::default();
        let first: HashSet<String> = run_preflight(&tree, &ctx, &config).into_iter().map(|w| w.id).collect();
        let second: HashSet<String> = run_preflight(&tree, &ctx, &config).into_iter().map(|w| w.id).collect();
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }

    #[test]
    fn test_warning_json_shape() {
        let item = WarningItem::for_node(WarningKind::OutsideTrim, "n1", "msg");
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["kind"], "OUTSIDE_TRIM");
        assert_eq!(json["severity"], "error");
        assert_eq!(json["fix"], "move-inside-trim");
    }
}

//! Snap functionality for aligning a dragged node to the safe zone and stage.
//!
//! Each axis is handled on its own. The moving node offers three edges per
//! axis (start, end, center) and the stage offers four candidate positions:
//! both safe-rect edges, the safe-rect center and the stage center. The
//! closest pair within the threshold wins; ties keep the candidate declared
//! first.

use kurbo::{Line, Point, Rect, Size, Vec2};

/// Distance threshold for guide snapping (in stage pixels).
pub const DEFAULT_SNAP_THRESHOLD: f64 = 6.0;

/// Axis a guide constrains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Horizontal position; drawn as a vertical line.
    X,
    /// Vertical position; drawn as a horizontal line.
    Y,
}

/// Where a guide comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuideKind {
    /// Left or top edge of the safe rect.
    SafeStart,
    /// Right or bottom edge of the safe rect.
    SafeEnd,
    SafeCenter,
    StageCenter,
}

/// A transient alignment line shown while dragging.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapGuide {
    pub axis: Axis,
    /// Coordinate along `axis` the node snapped to.
    pub position: f64,
    pub kind: GuideKind,
}

impl SnapGuide {
    /// The guide as a line spanning the whole stage.
    pub fn line(&self, stage: Size) -> Line {
        match self.axis {
            Axis::X => Line::new(
                Point::new(self.position, 0.0),
                Point::new(self.position, stage.height),
            ),
            Axis::Y => Line::new(
                Point::new(0.0, self.position),
                Point::new(stage.width, self.position),
            ),
        }
    }
}

/// Result of a snap operation.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapResult {
    /// Translation to apply to the node.
    pub offset: Vec2,
    /// Guides to draw for this move, at most one per axis.
    pub guides: Vec<SnapGuide>,
    /// Whether the X coordinate was snapped.
    pub snapped_x: bool,
    /// Whether the Y coordinate was snapped.
    pub snapped_y: bool,
}

impl SnapResult {
    /// Create a result with no snapping.
    pub fn none() -> Self {
        Self {
            offset: Vec2::ZERO,
            guides: Vec::new(),
            snapped_x: false,
            snapped_y: false,
        }
    }

    /// Check if any snapping occurred.
    pub fn is_snapped(&self) -> bool {
        self.snapped_x || self.snapped_y
    }
}

/// Best match on one axis: offset to apply and the guide it lands on.
fn snap_axis(
    axis: Axis,
    edges: [f64; 3],
    candidates: [(f64, GuideKind); 4],
    threshold: f64,
) -> Option<(f64, SnapGuide)> {
    let mut best: Option<(f64, SnapGuide)> = None;
    for (position, kind) in candidates {
        for edge in edges {
            let offset = position - edge;
            if offset.abs() > threshold {
                continue;
            }
            let better = match best {
                Some((current, _)) => offset.abs() < current.abs(),
                None => true,
            };
            if better {
                best = Some((offset, SnapGuide { axis, position, kind }));
            }
        }
    }
    best
}

/// Snap a node's bounding box to the safe rect and stage center.
///
/// `bounds` is the node's post-transform bounding box in stage coordinates.
/// An axis without a candidate within `threshold` is left untouched and
/// produces no guide.
pub fn snap_bounds(bounds: Rect, safe: Rect, stage: Size, threshold: f64) -> SnapResult {
    let stage_center = stage.to_rect().center();
    let safe_center = safe.center();

    let x = snap_axis(
        Axis::X,
        [bounds.x0, bounds.x1, bounds.center().x],
        [
            (safe.x0, GuideKind::SafeStart),
            (safe.x1, GuideKind::SafeEnd),
            (safe_center.x, GuideKind::SafeCenter),
            (stage_center.x, GuideKind::StageCenter),
        ],
        threshold,
    );
    let y = snap_axis(
        Axis::Y,
        [bounds.y0, bounds.y1, bounds.center().y],
        [
            (safe.y0, GuideKind::SafeStart),
            (safe.y1, GuideKind::SafeEnd),
            (safe_center.y, GuideKind::SafeCenter),
            (stage_center.y, GuideKind::StageCenter),
        ],
        threshold,
    );

    let mut result = SnapResult::none();
    if let Some((dx, guide)) = x {
        result.offset.x = dx;
        result.snapped_x = true;
        result.guides.push(guide);
    }
    if let Some((dy, guide)) = y {
        result.offset.y = dy;
        result.snapped_y = true;
        result.guides.push(guide);
    }
    result
}

//! Line and polyline node.

use super::{NodeId, NodeStyle, NodeTrait, new_node_id, point_to_polyline_dist, to_local};
use kurbo::{Affine, BezPath, Point, Rect};
use serde::{Deserialize, Serialize};

/// A straight line or open polyline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub(crate) id: NodeId,
    /// Vertices before rotation (at least two).
    pub points: Vec<Point>,
    /// Rotation angle in radians around the center of the points' bounds.
    #[serde(default)]
    pub rotation: f64,
    #[serde(default = "super::default_visible")]
    pub visible: bool,
    /// Style properties.
    pub style: NodeStyle,
}

impl Line {
    /// Create a new two-point line.
    pub fn new(start: Point, end: Point) -> Self {
        Self::from_points(new_node_id(), vec![start, end])
    }

    /// Create a polyline with a specific id.
    pub fn from_points(id: impl Into<NodeId>, points: Vec<Point>) -> Self {
        Self {
            id: id.into(),
            points,
            rotation: 0.0,
            visible: true,
            style: NodeStyle::default(),
        }
    }

    /// Set the style.
    pub fn with_style(mut self, style: NodeStyle) -> Self {
        self.style = style;
        self
    }

    /// Vertices in stage coordinates, rotation applied.
    pub fn stage_points(&self) -> Vec<Point> {
        if self.rotation == 0.0 {
            return self.points.clone();
        }
        let affine = Affine::rotate_about(self.rotation, self.local_rect().center());
        self.points.iter().map(|p| affine * *p).collect()
    }

    /// Get the length of the polyline.
    pub fn length(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| (w[1] - w[0]).hypot())
            .sum()
    }
}

impl NodeTrait for Line {
    fn id(&self) -> &str {
        &self.id
    }

    fn local_rect(&self) -> Rect {
        let Some(first) = self.points.first() else {
            return Rect::ZERO;
        };
        self.points
            .iter()
            .fold(Rect::from_points(*first, *first), |r, p| r.union_pt(*p))
    }

    fn rotation(&self) -> f64 {
        self.rotation
    }

    /// Bounds of the rotated vertices, tighter than the rotated frame.
    fn bounds(&self) -> Rect {
        let points = self.stage_points();
        let Some(first) = points.first() else {
            return Rect::ZERO;
        };
        points
            .iter()
            .fold(Rect::from_points(*first, *first), |r, p| r.union_pt(*p))
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let local = to_local(point, self.local_rect(), self.rotation);
        point_to_polyline_dist(local, &self.points) <= tolerance + self.style.stroke_width / 2.0
    }

    fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();
        if let Some((first, rest)) = self.stage_points().split_first() {
            path.move_to(*first);
            for p in rest {
                path.line_to(*p);
            }
        }
        path
    }

    fn style(&self) -> &NodeStyle {
        &self.style
    }

    fn style_mut(&mut self) -> &mut NodeStyle {
        &mut self.style
    }

    /// Axis-aligned scale/translate; rotation is kept separately.
    fn transform(&mut self, affine: Affine) {
        for p in &mut self.points {
            *p = affine * *p;
        }
    }
}

//! Ellipse node.

use super::{NodeId, NodeStyle, NodeTrait, new_node_id};
use kurbo::{Affine, BezPath, Ellipse as KurboEllipse, Point, Rect, Shape as KurboShape};
use serde::{Deserialize, Serialize};

/// An ellipse node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ellipse {
    pub(crate) id: NodeId,
    /// Center point.
    pub center: Point,
    /// Horizontal radius.
    pub radius_x: f64,
    /// Vertical radius.
    pub radius_y: f64,
    /// Rotation angle in radians (around center).
    #[serde(default)]
    pub rotation: f64,
    #[serde(default = "super::default_visible")]
    pub visible: bool,
    /// Style properties.
    pub style: NodeStyle,
}

impl Ellipse {
    /// Create a new ellipse.
    pub fn new(center: Point, radius_x: f64, radius_y: f64) -> Self {
        Self::with_id(new_node_id(), center, radius_x, radius_y)
    }

    /// Create an ellipse with a specific id.
    pub fn with_id(id: impl Into<NodeId>, center: Point, radius_x: f64, radius_y: f64) -> Self {
        Self {
            id: id.into(),
            center,
            radius_x,
            radius_y,
            rotation: 0.0,
            visible: true,
            style: NodeStyle::default(),
        }
    }

    /// Create a circle.
    pub fn circle(center: Point, radius: f64) -> Self {
        Self::new(center, radius, radius)
    }

    /// Get as a kurbo Ellipse (rotation included).
    pub fn as_kurbo(&self) -> KurboEllipse {
        KurboEllipse::new(self.center, (self.radius_x, self.radius_y), self.rotation)
    }
}

impl NodeTrait for Ellipse {
    fn id(&self) -> &str {
        &self.id
    }

    fn local_rect(&self) -> Rect {
        Rect::new(
            self.center.x - self.radius_x,
            self.center.y - self.radius_y,
            self.center.x + self.radius_x,
            self.center.y + self.radius_y,
        )
    }

    fn rotation(&self) -> f64 {
        self.rotation
    }

    fn bounds(&self) -> Rect {
        if self.rotation == 0.0 {
            self.local_rect()
        } else {
            // Tighter than rotating the frame corners.
            self.as_kurbo().bounding_box()
        }
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let local = Affine::rotate_about(-self.rotation, self.center) * point;
        let rx = self.radius_x + tolerance;
        let ry = self.radius_y + tolerance;
        if rx <= 0.0 || ry <= 0.0 {
            return false;
        }
        let dx = (local.x - self.center.x) / rx;
        let dy = (local.y - self.center.y) / ry;
        dx * dx + dy * dy <= 1.0
    }

    fn to_path(&self) -> BezPath {
        self.as_kurbo().to_path(0.1)
    }

    fn style(&self) -> &NodeStyle {
        &self.style
    }

    fn style_mut(&mut self) -> &mut NodeStyle {
        &mut self.style
    }

    fn transform(&mut self, affine: Affine) {
        self.center = affine * self.center;
        let scale = affine.as_coeffs();
        self.radius_x *= scale[0].abs();
        self.radius_y *= scale[3].abs();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circle_bounds() {
        let circle = Ellipse::circle(Point::new(50.0, 50.0), 20.0);
        assert_eq!(circle.bounds(), Rect::new(30.0, 30.0, 70.0, 70.0));
    }

    #[test]
    fn test_hit_test_excludes_frame_corner() {
        let circle = Ellipse::circle(Point::new(50.0, 50.0), 20.0);
        assert!(circle.hit_test(Point::new(50.0, 50.0), 0.0));
        assert!(!circle.hit_test(Point::new(31.0, 31.0), 0.0));
    }

    #[test]
    fn test_rotated_bounds_swap_axes() {
        let mut ellipse = Ellipse::new(Point::new(0.0, 0.0), 40.0, 10.0);
        ellipse.rotation = std::f64::consts::FRAC_PI_2;
        let bounds = ellipse.bounds();
        assert!((bounds.width() - 20.0).abs() < 1e-6);
        assert!((bounds.height() - 80.0).abs() < 1e-6);
    }
}

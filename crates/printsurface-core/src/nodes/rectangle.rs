//! Rectangle node.

use super::{NodeId, NodeStyle, NodeTrait, new_node_id};
use kurbo::{Affine, BezPath, Point, Rect, RoundedRect, Shape as KurboShape};
use serde::{Deserialize, Serialize};

/// A rectangle with optional rounded corners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    pub(crate) id: NodeId,
    /// Top-left corner position.
    pub position: Point,
    /// Width of the rectangle.
    pub width: f64,
    /// Height of the rectangle.
    pub height: f64,
    /// Corner radius (0 = sharp corners).
    #[serde(default)]
    pub corner_radius: f64,
    /// Rotation angle in radians (around center).
    #[serde(default)]
    pub rotation: f64,
    #[serde(default = "super::default_visible")]
    pub visible: bool,
    /// Style properties.
    pub style: NodeStyle,
}

impl Rectangle {
    /// Create a new rectangle with a random id.
    pub fn new(position: Point, width: f64, height: f64) -> Self {
        Self::with_id(new_node_id(), position, width, height)
    }

    /// Create a rectangle with a specific id.
    pub fn with_id(id: impl Into<NodeId>, position: Point, width: f64, height: f64) -> Self {
        Self {
            id: id.into(),
            position,
            width,
            height,
            corner_radius: 0.0,
            rotation: 0.0,
            visible: true,
            style: NodeStyle::default(),
        }
    }

    /// Create a rectangle from two corner points.
    pub fn from_corners(p1: Point, p2: Point) -> Self {
        let rect = Rect::from_points(p1, p2);
        Self::new(rect.origin(), rect.width(), rect.height())
    }

    /// Set the style.
    pub fn with_style(mut self, style: NodeStyle) -> Self {
        self.style = style;
        self
    }

    /// Get the rectangle as a kurbo Rect.
    pub fn as_rect(&self) -> Rect {
        Rect::new(
            self.position.x,
            self.position.y,
            self.position.x + self.width,
            self.position.y + self.height,
        )
    }
}

impl NodeTrait for Rectangle {
    fn id(&self) -> &str {
        &self.id
    }

    fn local_rect(&self) -> Rect {
        self.as_rect()
    }

    fn rotation(&self) -> f64 {
        self.rotation
    }

    fn to_path(&self) -> BezPath {
        let path = if self.corner_radius > 0.0 {
            RoundedRect::from_rect(self.as_rect(), self.corner_radius).to_path(0.1)
        } else {
            self.as_rect().to_path(0.1)
        };
        if self.rotation == 0.0 {
            path
        } else {
            Affine::rotate_about(self.rotation, self.as_rect().center()) * path
        }
    }

    fn style(&self) -> &NodeStyle {
        &self.style
    }

    fn style_mut(&mut self) -> &mut NodeStyle {
        &mut self.style
    }

    fn transform(&mut self, affine: Affine) {
        self.position = affine * self.position;
        // Axis-aligned scale only; rotation is kept separately.
        let scale = affine.as_coeffs();
        self.width *= scale[0].abs();
        self.height *= scale[3].abs();
    }
}

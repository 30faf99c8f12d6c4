//! Design node definitions.
//!
//! The design tree is a flat, z-ordered list of nodes. Each kind carries only
//! the fields it needs; preflight dispatches on the variant rather than on a
//! runtime class name.

mod ellipse;
mod image;
mod line;
mod rectangle;
mod text;

pub use ellipse::Ellipse;
pub use image::{Image, ImageFormat};
pub use line::Line;
pub use rectangle::Rectangle;
pub use text::Text;

use kurbo::{Affine, BezPath, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for nodes.
///
/// Ids are strings so that derived ids (such as `Logo_back` for a clone
/// placed on the back side) stay readable and deterministic.
pub type NodeId = String;

/// Generate a fresh random node id.
pub fn new_node_id() -> NodeId {
    Uuid::new_v4().to_string()
}

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    pub fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// Alpha channel scaled by an opacity factor.
    pub fn with_opacity(self, opacity: f64) -> Self {
        let alpha = (self.a as f64 * opacity.clamp(0.0, 1.0)) as u8;
        Self { a: alpha, ..self }
    }
}

/// Style properties shared by all nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeStyle {
    /// Stroke color (None = not stroked).
    pub stroke_color: Option<SerializableColor>,
    /// Stroke width in stage pixels.
    pub stroke_width: f64,
    /// Fill color (None = no fill).
    pub fill_color: Option<SerializableColor>,
    /// Overall opacity (0.0 = fully transparent, 1.0 = fully opaque).
    #[serde(default = "default_opacity")]
    pub opacity: f64,
}

fn default_opacity() -> f64 {
    1.0
}

pub(crate) fn default_visible() -> bool {
    true
}

impl Default for NodeStyle {
    fn default() -> Self {
        Self {
            stroke_color: Some(SerializableColor::black()),
            stroke_width: 2.0,
            fill_color: None,
            opacity: 1.0,
        }
    }
}

impl NodeStyle {
    /// A filled style without an outline.
    pub fn filled(color: SerializableColor) -> Self {
        Self {
            stroke_color: None,
            stroke_width: 0.0,
            fill_color: Some(color),
            opacity: 1.0,
        }
    }

    /// Check if the node draws an outline.
    pub fn is_stroked(&self) -> bool {
        self.stroke_color.is_some() && self.stroke_width > 0.0
    }

    /// Stroke color with opacity applied.
    pub fn stroke_with_opacity(&self) -> Option<SerializableColor> {
        self.stroke_color.map(|c| c.with_opacity(self.opacity))
    }

    /// Fill color with opacity applied.
    pub fn fill_with_opacity(&self) -> Option<SerializableColor> {
        self.fill_color.map(|c| c.with_opacity(self.opacity))
    }
}

/// Distance from a point to a line segment (a→b).
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = b - a;
    let pv = point - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    let proj = a + seg * t;
    (point - proj).hypot()
}

/// Minimum distance from a point to a polyline (sequence of connected segments).
pub fn point_to_polyline_dist(point: Point, points: &[Point]) -> f64 {
    points
        .windows(2)
        .map(|w| point_to_segment_dist(point, w[0], w[1]))
        .fold(f64::INFINITY, f64::min)
}

/// Axis-aligned bounding box of `rect` after rotating it about its center.
pub fn rotated_bounds(rect: Rect, rotation: f64) -> Rect {
    if rotation == 0.0 {
        return rect;
    }
    let affine = Affine::rotate_about(rotation, rect.center());
    let corners = [
        Point::new(rect.x0, rect.y0),
        Point::new(rect.x1, rect.y0),
        Point::new(rect.x1, rect.y1),
        Point::new(rect.x0, rect.y1),
    ];
    let mut bounds = Rect::from_points(affine * corners[0], affine * corners[0]);
    for corner in &corners[1..] {
        bounds = bounds.union_pt(affine * *corner);
    }
    bounds
}

/// Map a stage point into the unrotated frame of `rect`.
fn to_local(point: Point, rect: Rect, rotation: f64) -> Point {
    if rotation == 0.0 {
        point
    } else {
        Affine::rotate_about(-rotation, rect.center()) * point
    }
}

/// Common behavior of all node kinds.
pub trait NodeTrait {
    /// Get the node id.
    fn id(&self) -> &str;

    /// The node's frame before rotation is applied.
    fn local_rect(&self) -> Rect;

    /// Rotation in radians around the frame center.
    fn rotation(&self) -> f64 {
        0.0
    }

    /// Post-transform axis-aligned bounding box in stage coordinates.
    fn bounds(&self) -> Rect {
        rotated_bounds(self.local_rect(), self.rotation())
    }

    /// Check if a stage point hits this node.
    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let frame = self.local_rect();
        let local = to_local(point, frame, self.rotation());
        frame.inflate(tolerance, tolerance).contains(local)
    }

    /// Outline in stage coordinates, rotation included.
    fn to_path(&self) -> BezPath;

    fn style(&self) -> &NodeStyle;

    fn style_mut(&mut self) -> &mut NodeStyle;

    /// Apply an axis-aligned scale/translate to the node's geometry.
    fn transform(&mut self, affine: Affine);
}

/// A design node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Rectangle(Rectangle),
    Ellipse(Ellipse),
    Line(Line),
    Text(Text),
    Image(Image),
}

macro_rules! each_node {
    ($node:expr, $inner:ident => $body:expr) => {
        match $node {
            Node::Rectangle($inner) => $body,
            Node::Ellipse($inner) => $body,
            Node::Line($inner) => $body,
            Node::Text($inner) => $body,
            Node::Image($inner) => $body,
        }
    };
}

impl Node {
    pub fn id(&self) -> &str {
        each_node!(self, n => n.id())
    }

    pub fn bounds(&self) -> Rect {
        each_node!(self, n => n.bounds())
    }

    pub fn local_rect(&self) -> Rect {
        each_node!(self, n => n.local_rect())
    }

    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        each_node!(self, n => n.hit_test(point, tolerance))
    }

    pub fn to_path(&self) -> BezPath {
        each_node!(self, n => n.to_path())
    }

    pub fn style(&self) -> &NodeStyle {
        each_node!(self, n => n.style())
    }

    pub fn style_mut(&mut self) -> &mut NodeStyle {
        each_node!(self, n => n.style_mut())
    }

    pub fn transform(&mut self, affine: Affine) {
        each_node!(self, n => n.transform(affine))
    }

    /// Move the node by a stage-space delta.
    pub fn translate(&mut self, delta: Vec2) {
        self.transform(Affine::translate(delta));
    }

    /// Get the rotation angle in radians.
    pub fn rotation(&self) -> f64 {
        each_node!(self, n => n.rotation())
    }

    /// Set the rotation angle in radians.
    pub fn set_rotation(&mut self, rotation: f64) {
        each_node!(self, n => n.rotation = rotation)
    }

    /// Resize the node so its unrotated frame becomes `frame`.
    pub fn set_frame(&mut self, frame: Rect) {
        let current = self.local_rect();
        let sx = if current.width() > 0.0 { frame.width() / current.width() } else { 1.0 };
        let sy = if current.height() > 0.0 { frame.height() / current.height() } else { 1.0 };
        let affine = Affine::translate(frame.origin().to_vec2())
            * Affine::scale_non_uniform(sx, sy)
            * Affine::translate(-current.origin().to_vec2());
        self.transform(affine);
    }

    pub fn is_visible(&self) -> bool {
        each_node!(self, n => n.visible)
    }

    pub fn set_visible(&mut self, visible: bool) {
        each_node!(self, n => n.visible = visible)
    }

    /// Replace the node's id.
    pub fn set_id(&mut self, id: NodeId) {
        each_node!(self, n => n.id = id)
    }

    /// A copy of this node under a different id.
    pub fn cloned_with_id(&self, id: NodeId) -> Node {
        let mut clone = self.clone();
        clone.set_id(id);
        clone
    }

    /// Short lowercase name of the node kind.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Rectangle(_) => "rectangle",
            Node::Ellipse(_) => "ellipse",
            Node::Line(_) => "line",
            Node::Text(_) => "text",
            Node::Image(_) => "image",
        }
    }

    pub fn as_text(&self) -> Option<&Text> {
        match self {
            Node::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&Image> {
        match self {
            Node::Image(i) => Some(i),
            _ => None,
        }
    }
}

impl From<Rectangle> for Node {
    fn from(r: Rectangle) -> Self {
        Node::Rectangle(r)
    }
}

impl From<Ellipse> for Node {
    fn from(e: Ellipse) -> Self {
        Node::Ellipse(e)
    }
}

impl From<Line> for Node {
    fn from(l: Line) -> Self {
        Node::Line(l)
    }
}

impl From<Text> for Node {
    fn from(t: Text) -> Self {
        Node::Text(t)
    }
}

impl From<Image> for Node {
    fn from(i: Image) -> Self {
        Node::Image(i)
    }
}

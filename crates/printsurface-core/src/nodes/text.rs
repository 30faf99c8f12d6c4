//! Text node.

use super::{NodeId, NodeStyle, NodeTrait, SerializableColor};
use kurbo::{Affine, BezPath, Point, Rect, Shape as KurboShape};
use serde::{Deserialize, Serialize};

/// Average glyph advance as a fraction of the font size.
const CHAR_WIDTH_FACTOR: f64 = 0.55;
/// Line height as a multiple of the font size.
const LINE_HEIGHT: f64 = 1.2;

fn default_font_family() -> String {
    Text::DEFAULT_FONT_FAMILY.to_string()
}

/// A block of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    pub(crate) id: NodeId,
    /// Position (top-left corner of text bounding box).
    pub position: Point,
    /// The text content.
    pub content: String,
    /// Font size in stage pixels.
    pub font_size: f64,
    /// Font family name, resolved by the host's font stack.
    #[serde(default = "default_font_family")]
    pub font_family: String,
    /// Fixed layout width; when absent the width follows the content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub box_width: Option<f64>,
    /// Rotation angle in radians (around center).
    #[serde(default)]
    pub rotation: f64,
    #[serde(default = "super::default_visible")]
    pub visible: bool,
    /// Style properties.
    pub style: NodeStyle,
}

impl Text {
    pub const DEFAULT_FONT_SIZE: f64 = 24.0;
    pub const DEFAULT_FONT_FAMILY: &'static str = "Inter";

    /// Create a new text node with a specific id.
    pub fn new(id: impl Into<NodeId>, position: Point, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            position,
            content: content.into(),
            font_size: Self::DEFAULT_FONT_SIZE,
            font_family: default_font_family(),
            box_width: None,
            rotation: 0.0,
            visible: true,
            style: NodeStyle::filled(SerializableColor::black()),
        }
    }

    /// Create a new text node with font size.
    pub fn with_font_size(mut self, size: f64) -> Self {
        self.font_size = size;
        self
    }

    /// Set the style.
    pub fn with_style(mut self, style: NodeStyle) -> Self {
        self.style = style;
        self
    }

    /// Number of laid out lines (empty content still occupies one line).
    pub fn line_count(&self) -> usize {
        let count = self.content.lines().count().max(1);
        if self.content.ends_with('\n') { count + 1 } else { count }
    }

    /// Approximate width based on character count and font size.
    fn approximate_width(&self) -> f64 {
        let max_line_len = self
            .content
            .lines()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0);
        max_line_len as f64 * self.font_size * CHAR_WIDTH_FACTOR
    }

    /// Height of one line of text.
    pub fn line_height(&self) -> f64 {
        self.font_size * LINE_HEIGHT
    }
}

impl NodeTrait for Text {
    fn id(&self) -> &str {
        &self.id
    }

    fn local_rect(&self) -> Rect {
        let width = self.box_width.unwrap_or_else(|| self.approximate_width());
        let height = self.line_count() as f64 * self.line_height();
        Rect::new(
            self.position.x,
            self.position.y,
            self.position.x + width,
            self.position.y + height,
        )
    }

    fn rotation(&self) -> f64 {
        self.rotation
    }

    fn to_path(&self) -> BezPath {
        // No glyph outlines in the core; the box stands in for selection.
        let frame = self.local_rect();
        Affine::rotate_about(self.rotation, frame.center()) * frame.to_path(0.1)
    }

    fn style(&self) -> &NodeStyle {
        &self.style
    }

    fn style_mut(&mut self) -> &mut NodeStyle {
        &mut self.style
    }

    fn transform(&mut self, affine: Affine) {
        self.position = affine * self.position;
        // Vertical scale drives the font size; horizontal only a fixed box.
        let coeffs = affine.as_coeffs();
        let sy = coeffs[3].abs();
        if (sy - 1.0).abs() > f64::EPSILON {
            self.font_size *= sy;
        }
        if let Some(width) = self.box_width.as_mut() {
            *width *= coeffs[0].abs();
        }
    }
}

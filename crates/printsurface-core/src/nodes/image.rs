//! Image node for embedded raster artwork.

use super::{NodeId, NodeStyle, NodeTrait, new_node_id};
use base64::{Engine, engine::general_purpose::STANDARD};
use kurbo::{Affine, BezPath, Point, Rect, Shape as KurboShape};
use serde::{Deserialize, Serialize};

/// Image format for stored image data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpeg,
}

/// A raster image placed on the design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub(crate) id: NodeId,
    /// Top-left corner position.
    pub position: Point,
    /// Display width in stage pixels.
    pub width: f64,
    /// Display height in stage pixels.
    pub height: f64,
    /// Original image width in pixels.
    pub source_width: u32,
    /// Original image height in pixels.
    pub source_height: u32,
    pub format: ImageFormat,
    /// Image data as base64 so snapshots stay plain JSON.
    pub data_base64: String,
    /// Rotation angle in radians (around center).
    #[serde(default)]
    pub rotation: f64,
    #[serde(default = "super::default_visible")]
    pub visible: bool,
    /// Style properties (stroke used for optional border).
    pub style: NodeStyle,
}

impl Image {
    /// Create an image node from raw bytes, displayed at source size.
    pub fn new(
        position: Point,
        data: &[u8],
        source_width: u32,
        source_height: u32,
        format: ImageFormat,
    ) -> Self {
        Self {
            id: new_node_id(),
            position,
            width: source_width as f64,
            height: source_height as f64,
            source_width,
            source_height,
            format,
            data_base64: STANDARD.encode(data),
            rotation: 0.0,
            visible: true,
            style: NodeStyle {
                stroke_color: None,
                stroke_width: 0.0,
                ..NodeStyle::default()
            },
        }
    }

    /// Replace the generated id.
    pub fn with_id(mut self, id: impl Into<NodeId>) -> Self {
        self.id = id.into();
        self
    }

    /// Create an image node with specific display dimensions.
    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Get the raw image data (decoded from base64).
    pub fn data(&self) -> Option<Vec<u8>> {
        STANDARD.decode(&self.data_base64).ok()
    }

    /// Get the display rectangle.
    pub fn as_rect(&self) -> Rect {
        Rect::new(
            self.position.x,
            self.position.y,
            self.position.x + self.width,
            self.position.y + self.height,
        )
    }

    /// Resolution the image will print at when the stage is `stage_dpi`.
    ///
    /// Takes the worse of the two axes. Returns `None` for a zero-sized
    /// display box.
    pub fn effective_dpi(&self, stage_dpi: f64) -> Option<f64> {
        if self.width <= 0.0 || self.height <= 0.0 {
            return None;
        }
        let x = self.source_width as f64 * stage_dpi / self.width;
        let y = self.source_height as f64 * stage_dpi / self.height;
        Some(x.min(y))
    }
}

impl NodeTrait for Image {
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
        Affine::rotate_about(self.rotation, self.as_rect().center()) * self.as_rect().to_path(0.1)
    }

    fn style(&self) -> &NodeStyle {
        &self.style
    }

    fn style_mut(&mut self) -> &mut NodeStyle {
        &mut self.style
    }

    fn transform(&mut self, affine: Affine) {
        self.position = affine * self.position;
        let scale = affine.as_coeffs();
        self.width *= scale[0].abs();
        self.height *= scale[3].abs();
    }
}

//! Renderer trait abstraction.

use kurbo::{Line, RoundedRect, Size};
use printsurface_core::nodes::Node;
use printsurface_core::selection::{Handle, get_handles};
use printsurface_core::snap::SnapGuide;
use printsurface_core::{DesignTree, SerializableColor, SideGeometry, Stage};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Cannot allocate a {width}x{height} surface")]
    InvalidSize { width: u32, height: u32 },
    #[error("Render failed: {0}")]
    RenderFailed(String),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RendererError>;

/// The stage's drawing layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    /// Paper and design nodes, clipped by the rounded-corner preview.
    Design,
    /// Bleed, trim, safe and fold lines plus live snap guides.
    Guides,
    /// Selection outline and transform handles.
    Handles,
}

impl Layer {
    /// Every layer, bottom to top.
    pub const ALL: [Layer; 3] = [Layer::Design, Layer::Guides, Layer::Handles];
}

/// Colors used for everything that is not design content.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderColors {
    /// Paper color under the design.
    pub paper: SerializableColor,
    /// Tint over the bleed area.
    pub bleed: SerializableColor,
    pub trim: SerializableColor,
    pub safe: SerializableColor,
    pub fold: SerializableColor,
    pub snap_guide: SerializableColor,
    pub selection: SerializableColor,
}

impl Default for RenderColors {
    fn default() -> Self {
        Self {
            paper: SerializableColor::white(),
            bleed: SerializableColor::new(239, 68, 68, 48),
            trim: SerializableColor::new(239, 68, 68, 255),
            safe: SerializableColor::new(34, 197, 94, 255),
            fold: SerializableColor::new(107, 114, 128, 255),
            snap_guide: SerializableColor::new(236, 72, 153, 255),
            // Blue
            selection: SerializableColor::new(59, 130, 246, 255),
        }
    }
}

/// Context for a single render.
pub struct RenderContext<'a> {
    pub geometry: SideGeometry,
    pub tree: &'a DesignTree,
    /// Layers to draw, bottom to top.
    pub layers: Vec<Layer>,
    pub colors: RenderColors,
    /// Rounded-corner clip for the design layer.
    pub clip: Option<RoundedRect>,
    /// Fold lines in stage coordinates.
    pub folds: Vec<Line>,
    pub snap_guides: Vec<SnapGuide>,
    pub selected: Option<&'a Node>,
    pub handles: Vec<Handle>,
}

impl<'a> RenderContext<'a> {
    /// Create a context that draws only the design of `tree`.
    pub fn new(geometry: SideGeometry, tree: &'a DesignTree) -> Self {
        Self {
            geometry,
            tree,
            layers: vec![Layer::Design],
            colors: RenderColors::default(),
            clip: None,
            folds: Vec::new(),
            snap_guides: Vec::new(),
            selected: None,
            handles: Vec::new(),
        }
    }

    /// Everything the editor shows for the stage's active side.
    pub fn for_stage(stage: &'a Stage) -> Self {
        let state = stage.state();
        let geometry = state.active_geometry();
        let selected = stage.selected_node();
        Self {
            layers: Layer::ALL.to_vec(),
            clip: stage.preview_clip(),
            folds: state.active_print_side().fold_segments(geometry.dpi),
            snap_guides: stage.guides().to_vec(),
            handles: selected.map(get_handles).unwrap_or_default(),
            selected,
            ..Self::new(geometry, stage.tree())
        }
    }

    pub fn with_colors(mut self, colors: RenderColors) -> Self {
        self.colors = colors;
        self
    }

    /// Choose which layers to draw.
    pub fn with_layers(mut self, layers: &[Layer]) -> Self {
        self.layers = layers.to_vec();
        self
    }

    /// Set or remove the design-layer clip.
    pub fn with_clip(mut self, clip: Option<RoundedRect>) -> Self {
        self.clip = clip;
        self
    }

    pub fn draws(&self, layer: Layer) -> bool {
        self.layers.contains(&layer)
    }

    /// Size of the output surface in pixels; one stage pixel per output pixel.
    pub fn output_size(&self) -> Size {
        let canvas = self.geometry.canvas;
        Size::new(canvas.width.round(), canvas.height.round())
    }
}

/// Trait for rendering backends.
pub trait Renderer: Send + Sync {
    type Output;

    /// Draw the requested layers of one side.
    fn render(&mut self, ctx: &RenderContext) -> RenderResult<Self::Output>;
}

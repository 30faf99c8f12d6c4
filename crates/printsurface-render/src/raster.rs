//! CPU renderer built on tiny-skia.

use crate::renderer::{Layer, RenderContext, RenderResult, Renderer, RendererError};
use kurbo::{BezPath, PathEl, Rect, Shape as KurboShape};
use printsurface_core::nodes::{Image, Node, NodeTrait, Text};
use printsurface_core::selection::{HANDLE_SIZE, HandleKind};
use printsurface_core::SerializableColor;
use tiny_skia::{
    Color, ColorU8, FillRule, FilterQuality, Mask, Paint, PathBuilder, Pixmap, PixmapPaint,
    Stroke, StrokeDash, Transform,
};

/// Width of a greeked glyph relative to the font size.
const GREEK_CHAR_WIDTH: f32 = 0.55;
const GUIDE_WIDTH: f32 = 1.5;

/// Result of rasterizing - straight (non-premultiplied) RGBA pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    /// RGBA pixel data (4 bytes per pixel).
    pub rgba_data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl RasterImage {
    /// Pixel at `(x, y)` as `[r, g, b, a]`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y * self.width + x) * 4) as usize;
        self.rgba_data.get(i..i + 4).map(|p| [p[0], p[1], p[2], p[3]])
    }
}

/// Rasterizes render contexts into RGBA images.
#[derive(Debug, Default, Clone, Copy)]
pub struct TinySkiaRenderer;

impl TinySkiaRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for TinySkiaRenderer {
    type Output = RasterImage;

    fn render(&mut self, ctx: &RenderContext) -> RenderResult<RasterImage> {
        let size = ctx.output_size();
        let (width, height) = (size.width as u32, size.height as u32);
        let mut pixmap =
            Pixmap::new(width, height).ok_or(RendererError::InvalidSize { width, height })?;
        let transform = Transform::identity();

        for layer in &ctx.layers {
            match layer {
                Layer::Design => draw_design(&mut pixmap, ctx, transform)?,
                Layer::Guides => draw_guides(&mut pixmap, ctx, transform),
                Layer::Handles => draw_handles(&mut pixmap, ctx, transform),
            }
        }

        Ok(RasterImage {
            rgba_data: demultiply(&pixmap),
            width,
            height,
        })
    }
}

fn demultiply(pixmap: &Pixmap) -> Vec<u8> {
    let mut data = Vec::with_capacity(pixmap.data().len());
    for pixel in pixmap.pixels() {
        let c = pixel.demultiply();
        data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    data
}

fn skia_color(color: SerializableColor) -> Color {
    Color::from_rgba8(color.r, color.g, color.b, color.a)
}

fn paint(color: SerializableColor) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(skia_color(color));
    paint.anti_alias = true;
    paint
}

/// Convert a kurbo path into a tiny-skia path.
fn to_skia_path(path: &BezPath) -> Option<tiny_skia::Path> {
    let mut pb = PathBuilder::new();
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => pb.move_to(p.x as f32, p.y as f32),
            PathEl::LineTo(p) => pb.line_to(p.x as f32, p.y as f32),
            PathEl::QuadTo(p1, p2) => pb.quad_to(p1.x as f32, p1.y as f32, p2.x as f32, p2.y as f32),
            PathEl::CurveTo(p1, p2, p3) => pb.cubic_to(
                p1.x as f32,
                p1.y as f32,
                p2.x as f32,
                p2.y as f32,
                p3.x as f32,
                p3.y as f32,
            ),
            PathEl::ClosePath => pb.close(),
        }
    }
    pb.finish()
}

fn rect_path(rect: Rect) -> Option<tiny_skia::Path> {
    tiny_skia::Rect::from_ltrb(rect.x0 as f32, rect.y0 as f32, rect.x1 as f32, rect.y1 as f32)
        .map(PathBuilder::from_rect)
}

/// Rotation about the node's frame center, in stage coordinates.
fn node_rotation(frame: Rect, rotation: f64) -> Transform {
    let center = frame.center();
    Transform::from_rotate_at(rotation.to_degrees() as f32, center.x as f32, center.y as f32)
}

fn draw_design(pixmap: &mut Pixmap, ctx: &RenderContext, transform: Transform) -> RenderResult<()> {
    let mask = match ctx.clip {
        Some(clip) => {
            let mut mask = Mask::new(pixmap.width(), pixmap.height()).ok_or(
                RendererError::InvalidSize {
                    width: pixmap.width(),
                    height: pixmap.height(),
                },
            )?;
            let path = to_skia_path(&clip.to_path(0.1))
                .ok_or_else(|| RendererError::RenderFailed("empty clip path".to_string()))?;
            mask.fill_path(&path, FillRule::Winding, true, transform);
            Some(mask)
        }
        None => None,
    };
    let mask = mask.as_ref();

    if let Some(paper) = rect_path(ctx.geometry.stage_rect()) {
        pixmap.fill_path(&paper, &paint(ctx.colors.paper), FillRule::Winding, transform, mask);
    }

    for node in ctx.tree.nodes_ordered().filter(|n| n.is_visible()) {
        match node {
            Node::Text(text) => draw_text(pixmap, text, transform, mask),
            Node::Image(image) => draw_image(pixmap, image, transform, mask),
            _ => draw_shape(pixmap, node, transform, mask),
        }
    }
    Ok(())
}

fn draw_shape(pixmap: &mut Pixmap, node: &Node, transform: Transform, mask: Option<&Mask>) {
    let Some(path) = to_skia_path(&node.to_path()) else {
        return;
    };
    let style = node.style();
    if let Some(fill) = style.fill_with_opacity() {
        pixmap.fill_path(&path, &paint(fill), FillRule::Winding, transform, mask);
    }
    if style.is_stroked() {
        if let Some(color) = style.stroke_with_opacity() {
            let stroke = Stroke {
                width: style.stroke_width as f32,
                ..Stroke::default()
            };
            pixmap.stroke_path(&path, &paint(color), &stroke, transform, mask);
        }
    }
}

/// Text is drawn as one bar per line at the estimated line width.
fn draw_text(pixmap: &mut Pixmap, text: &Text, transform: Transform, mask: Option<&Mask>) {
    let Some(color) = text.style.fill_with_opacity() else {
        return;
    };
    let frame = text.local_rect();
    let local = transform.pre_concat(node_rotation(frame, text.rotation));
    let font_size = text.font_size as f32;
    let line_height = text.line_height() as f32;
    let paint = paint(color);

    for (i, line) in text.content.lines().enumerate() {
        let chars = line.chars().count() as f32;
        if chars == 0.0 {
            continue;
        }
        let width = (chars * font_size * GREEK_CHAR_WIDTH).min(frame.width() as f32);
        let top = frame.y0 as f32 + i as f32 * line_height + font_size * 0.3;
        if let Some(bar) = tiny_skia::Rect::from_xywh(frame.x0 as f32, top, width, font_size * 0.6) {
            pixmap.fill_rect(bar, &paint, local, mask);
        }
    }
}

/// Decode embedded image data into a premultiplied pixmap.
fn decode_image(image: &Image) -> Option<Pixmap> {
    let data = image.data()?;
    let decoded = match ::image::load_from_memory(&data) {
        Ok(decoded) => decoded.to_rgba8(),
        Err(e) => {
            log::warn!("Failed to decode image '{}': {e}", image.id());
            return None;
        }
    };
    let (width, height) = decoded.dimensions();
    let mut pixmap = Pixmap::new(width, height)?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(decoded.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Some(pixmap)
}

fn draw_image(pixmap: &mut Pixmap, image: &Image, transform: Transform, mask: Option<&Mask>) {
    let frame = image.as_rect();
    let local = transform.pre_concat(node_rotation(frame, image.rotation));
    let Some(source) = decode_image(image) else {
        draw_image_placeholder(pixmap, frame, local, mask);
        return;
    };
    let sx = frame.width() / source.width() as f64;
    let sy = frame.height() / source.height() as f64;
    let placement = local
        .pre_translate(frame.x0 as f32, frame.y0 as f32)
        .pre_scale(sx as f32, sy as f32);
    let paint = PixmapPaint {
        opacity: image.style.opacity as f32,
        quality: FilterQuality::Bicubic,
        ..PixmapPaint::default()
    };
    pixmap.draw_pixmap(0, 0, source.as_ref(), &paint, placement, mask);
}

fn draw_image_placeholder(pixmap: &mut Pixmap, frame: Rect, transform: Transform, mask: Option<&Mask>) {
    let Some(path) = rect_path(frame) else {
        return;
    };
    let grey = SerializableColor::new(200, 200, 200, 255);
    let dark = SerializableColor::new(120, 120, 120, 255);
    pixmap.fill_path(&path, &paint(grey), FillRule::Winding, transform, mask);

    let mut pb = PathBuilder::new();
    pb.move_to(frame.x0 as f32, frame.y0 as f32);
    pb.line_to(frame.x1 as f32, frame.y1 as f32);
    pb.move_to(frame.x1 as f32, frame.y0 as f32);
    pb.line_to(frame.x0 as f32, frame.y1 as f32);
    if let Some(cross) = pb.finish() {
        let stroke = Stroke {
            width: 2.0,
            ..Stroke::default()
        };
        pixmap.stroke_path(&cross, &paint(dark), &stroke, transform, mask);
    }
}

fn dashed(width: f32) -> Stroke {
    Stroke {
        width,
        dash: StrokeDash::new(vec![6.0, 4.0], 0.0),
        ..Stroke::default()
    }
}

fn line_path(line: kurbo::Line) -> Option<tiny_skia::Path> {
    let mut pb = PathBuilder::new();
    pb.move_to(line.p0.x as f32, line.p0.y as f32);
    pb.line_to(line.p1.x as f32, line.p1.y as f32);
    pb.finish()
}

fn draw_guides(pixmap: &mut Pixmap, ctx: &RenderContext, transform: Transform) {
    let geometry = &ctx.geometry;
    let colors = &ctx.colors;

    // Trim line follows the rounded corners when the preview clip is on.
    let trim_path = match ctx.clip {
        Some(clip) => to_skia_path(&clip.to_path(0.1)),
        None => rect_path(geometry.trim_rect),
    };

    // Bleed band: everything outside the trim.
    if geometry.bleed_px > 0.0 {
        let mut band = geometry.stage_rect().to_path(0.1);
        match ctx.clip {
            Some(clip) => band.extend(clip.path_elements(0.1)),
            None => band.extend(geometry.trim_rect.path_elements(0.1)),
        }
        if let Some(path) = to_skia_path(&band) {
            pixmap.fill_path(&path, &paint(colors.bleed), FillRule::EvenOdd, transform, None);
        }
    }

    let solid = Stroke {
        width: GUIDE_WIDTH,
        ..Stroke::default()
    };
    if let Some(path) = trim_path {
        pixmap.stroke_path(&path, &paint(colors.trim), &solid, transform, None);
    }
    if let Some(path) = rect_path(geometry.safe_rect) {
        pixmap.stroke_path(&path, &paint(colors.safe), &dashed(GUIDE_WIDTH), transform, None);
    }
    for fold in &ctx.folds {
        if let Some(path) = line_path(*fold) {
            pixmap.stroke_path(&path, &paint(colors.fold), &dashed(GUIDE_WIDTH), transform, None);
        }
    }
    for guide in &ctx.snap_guides {
        if let Some(path) = line_path(guide.line(geometry.canvas)) {
            pixmap.stroke_path(&path, &paint(colors.snap_guide), &dashed(1.0), transform, None);
        }
    }
}

fn draw_handles(pixmap: &mut Pixmap, ctx: &RenderContext, transform: Transform) {
    let Some(node) = ctx.selected else {
        return;
    };
    let color = paint(ctx.colors.selection);
    let outline = Stroke {
        width: 1.0,
        ..Stroke::default()
    };

    let frame = node.local_rect();
    if let Some(path) = rect_path(frame) {
        let local = transform.pre_concat(node_rotation(frame, node.rotation()));
        pixmap.stroke_path(&path, &color, &outline, local, None);
    }

    let fill = paint(SerializableColor::white());
    for handle in &ctx.handles {
        let path = match handle.kind {
            HandleKind::Rotate => PathBuilder::from_circle(
                handle.position.x as f32,
                handle.position.y as f32,
                (HANDLE_SIZE / 2.0) as f32,
            ),
            HandleKind::Corner(_) => rect_path(handle.rect()),
        };
        if let Some(path) = path {
            pixmap.fill_path(&path, &fill, FillRule::Winding, transform, None);
            pixmap.stroke_path(&path, &color, &outline, transform, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;
    use printsurface_core::nodes::{ImageFormat, NodeStyle, Rectangle};
    use printsurface_core::{DesignTree, PrintSide};

    fn geometry() -> printsurface_core::SideGeometry {
        // 100x60 px trim, 10 px bleed and safe at 25.4 DPI (1 mm = 1 px)
        PrintSide::new("front", "Front", 100.0, 60.0, 10.0, 10.0).geometry(25.4)
    }

    fn filled_rect(id: &str, x: f64, y: f64, w: f64, h: f64, color: SerializableColor) -> Node {
        Rectangle::with_id(id, Point::new(x, y), w, h)
            .with_style(NodeStyle::filled(color))
            .into()
    }

    #[test]
    fn test_canvas_size_includes_bleed() {
        let tree = DesignTree::new();
        let image = TinySkiaRenderer::new()
            .render(&RenderContext::new(geometry(), &tree))
            .unwrap();
        assert_eq!((image.width, image.height), (120, 80));
        assert_eq!(image.pixel(0, 0), Some([255, 255, 255, 255]));
    }

    #[test]
    fn test_fill_is_drawn() {
        let red = SerializableColor::new(255, 0, 0, 255);
        let tree = DesignTree::from_nodes(vec![filled_rect("r", 20.0, 20.0, 40.0, 20.0, red)]);
        let image = TinySkiaRenderer::new()
            .render(&RenderContext::new(geometry(), &tree))
            .unwrap();
        assert_eq!(image.pixel(30, 30), Some([255, 0, 0, 255]));
        assert_eq!(image.pixel(100, 70), Some([255, 255, 255, 255]));
    }

    #[test]
    fn test_rounded_clip_hides_corner() {
        let blue = SerializableColor::new(0, 0, 255, 255);
        let tree = DesignTree::from_nodes(vec![filled_rect("bg", 0.0, 0.0, 120.0, 80.0, blue)]);
        let geometry = geometry();
        let clip = kurbo::RoundedRect::from_rect(geometry.trim_rect, 20.0);

        let clipped = TinySkiaRenderer::new()
            .render(&RenderContext::new(geometry, &tree).with_clip(Some(clip)))
            .unwrap();
        // Just inside the trim corner is cut away by the rounding
        assert_eq!(clipped.pixel(11, 11).map(|p| p[3]), Some(0));
        assert_eq!(clipped.pixel(60, 40), Some([0, 0, 255, 255]));

        let unclipped = TinySkiaRenderer::new()
            .render(&RenderContext::new(geometry, &tree).with_clip(None))
            .unwrap();
        assert_eq!(unclipped.pixel(11, 11), Some([0, 0, 255, 255]));
        assert_eq!(unclipped.pixel(0, 0), Some([0, 0, 255, 255]));
    }

    #[test]
    fn test_undecodable_image_gets_placeholder() {
        let image = Image::new(Point::new(20.0, 20.0), b"not an image", 10, 10, ImageFormat::Png)
            .with_id("broken")
            .with_size(40.0, 40.0);
        let tree = DesignTree::from_nodes(vec![image.into()]);
        let raster = TinySkiaRenderer::new()
            .render(&RenderContext::new(geometry(), &tree))
            .unwrap();
        assert_eq!(raster.pixel(30, 25), Some([200, 200, 200, 255]));
    }

    #[test]
    fn test_guides_layer_marks_bleed() {
        let tree = DesignTree::new();
        let ctx = RenderContext::new(geometry(), &tree).with_layers(&[Layer::Design, Layer::Guides]);
        let raster = TinySkiaRenderer::new().render(&ctx).unwrap();
        // Bleed tint over white paper is no longer pure white
        assert_ne!(raster.pixel(3, 40), Some([255, 255, 255, 255]));
        assert_eq!(raster.pixel(60, 40), Some([255, 255, 255, 255]));
    }

    #[test]
    fn test_path_conversion_keeps_curves() {
        let circle = kurbo::Circle::new((10.0, 10.0), 5.0).to_path(0.1);
        let path = to_skia_path(&circle).unwrap();
        let bounds = path.bounds();
        assert!((bounds.left() - 5.0).abs() < 0.01);
        assert!((bounds.right() - 15.0).abs() < 0.01);
    }
}

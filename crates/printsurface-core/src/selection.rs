//! Transform handles for the selected node.

use crate::nodes::{Node, NodeId};
use crate::preflight::Corner;
use kurbo::{Point, Rect, Vec2};
use std::f64::consts::FRAC_PI_2;

/// Handle size in stage pixels.
pub const HANDLE_SIZE: f64 = 16.0;
/// Distance from the node's top edge to the rotation handle.
pub const ROTATE_HANDLE_OFFSET: f64 = 25.0;
/// Smallest frame a resize may produce.
const MIN_FRAME_SIZE: f64 = 1.0;

/// Type of selection handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleKind {
    /// Corner resize handle.
    Corner(Corner),
    /// Rotation handle (positioned above the node).
    Rotate,
}

/// A selection handle with its position and type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Handle {
    /// Position in stage coordinates.
    pub position: Point,
    pub kind: HandleKind,
}

impl Handle {
    pub fn new(position: Point, kind: HandleKind) -> Self {
        Self { position, kind }
    }

    /// Check if a stage point hits this handle.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        (point - self.position).hypot2() <= tolerance * tolerance
    }

    /// Square drawn for this handle.
    pub fn rect(&self) -> Rect {
        Rect::from_center_size(self.position, (HANDLE_SIZE, HANDLE_SIZE))
    }
}

/// Get the transform handles for a node.
///
/// Text only rotates, everything else gets four corner handles and a
/// rotation handle.
pub fn get_handles(node: &Node) -> Vec<Handle> {
    let frame = node.local_rect();
    let rotation = node.rotation();
    match node {
        Node::Text(_) => vec![rotate_handle(frame, rotation)],
        _ => {
            let mut handles = corner_handles(frame, rotation);
            handles.push(rotate_handle(frame, rotation));
            handles
        }
    }
}

/// Rotate a frame-relative offset around the frame center.
fn frame_point(frame: Rect, rotation: f64, dx: f64, dy: f64) -> Point {
    let center = frame.center();
    let (sin_r, cos_r) = rotation.sin_cos();
    Point::new(
        center.x + dx * cos_r - dy * sin_r,
        center.y + dx * sin_r + dy * cos_r,
    )
}

fn corner_handles(frame: Rect, rotation: f64) -> Vec<Handle> {
    let half_w = frame.width() / 2.0;
    let half_h = frame.height() / 2.0;
    Corner::ALL
        .into_iter()
        .map(|corner| {
            let (dx, dy) = match corner {
                Corner::TopLeft => (-half_w, -half_h),
                Corner::TopRight => (half_w, -half_h),
                Corner::BottomRight => (half_w, half_h),
                Corner::BottomLeft => (-half_w, half_h),
            };
            Handle::new(frame_point(frame, rotation, dx, dy), HandleKind::Corner(corner))
        })
        .collect()
}

fn rotate_handle(frame: Rect, rotation: f64) -> Handle {
    let dy = -frame.height() / 2.0 - ROTATE_HANDLE_OFFSET;
    Handle::new(frame_point(frame, rotation, 0.0, dy), HandleKind::Rotate)
}

/// Find which handle (if any) is hit at the given point.
pub fn hit_test_handles(node: &Node, point: Point, tolerance: f64) -> Option<HandleKind> {
    get_handles(node)
        .into_iter()
        .find(|handle| handle.hit_test(point, tolerance))
        .map(|handle| handle.kind)
}

/// State of an active drag on the selected node.
#[derive(Debug, Clone, PartialEq)]
pub struct ManipulationState {
    pub node_id: NodeId,
    /// The handle being dragged (None = moving the whole node).
    pub handle: Option<HandleKind>,
    pub start_point: Point,
    pub current_point: Point,
    /// Node as it was when the drag started.
    pub original_node: Node,
}

impl ManipulationState {
    pub fn new(handle: Option<HandleKind>, start_point: Point, original_node: Node) -> Self {
        Self {
            node_id: original_node.id().to_string(),
            handle,
            start_point,
            current_point: start_point,
            original_node,
        }
    }

    /// The original node with the current drag applied.
    pub fn apply(&self, keep_aspect_ratio: bool) -> Node {
        apply_manipulation(
            &self.original_node,
            self.handle,
            self.start_point,
            self.current_point,
            keep_aspect_ratio,
        )
    }
}

/// Apply a handle drag from `start` to `current` to a copy of `node`.
pub fn apply_manipulation(
    node: &Node,
    handle: Option<HandleKind>,
    start: Point,
    current: Point,
    keep_aspect_ratio: bool,
) -> Node {
    let mut node = node.clone();
    match handle {
        None => node.translate(current - start),
        Some(HandleKind::Corner(corner)) => {
            let frame = resize_frame(
                node.local_rect(),
                node.rotation(),
                corner,
                current - start,
                keep_aspect_ratio,
            );
            node.set_frame(frame);
        }
        Some(HandleKind::Rotate) => {
            let center = node.local_rect().center();
            let v = current - center;
            if v.hypot2() > 0.0 {
                node.set_rotation(v.y.atan2(v.x) + FRAC_PI_2);
            }
        }
    }
    node
}

/// Move one corner of an unrotated frame, keeping the opposite corner fixed.
fn resize_frame(frame: Rect, rotation: f64, corner: Corner, delta: Vec2, keep_aspect: bool) -> Rect {
    // Bring the drag into the node's own frame.
    let (sin_r, cos_r) = (-rotation).sin_cos();
    let local = Vec2::new(delta.x * cos_r - delta.y * sin_r, delta.x * sin_r + delta.y * cos_r);

    let (mut x0, mut y0, mut x1, mut y1) = (frame.x0, frame.y0, frame.x1, frame.y1);
    match corner {
        Corner::TopLeft => {
            x0 += local.x;
            y0 += local.y;
        }
        Corner::TopRight => {
            x1 += local.x;
            y0 += local.y;
        }
        Corner::BottomRight => {
            x1 += local.x;
            y1 += local.y;
        }
        Corner::BottomLeft => {
            x0 += local.x;
            y1 += local.y;
        }
    }
    let mut resized = Rect::new(x0, y0, x1, y1).abs();

    if keep_aspect && frame.width() > 0.0 && frame.height() > 0.0 {
        let scale = (resized.width() / frame.width()).max(resized.height() / frame.height());
        let (w, h) = (frame.width() * scale, frame.height() * scale);
        let anchor = corner_opposite(corner).point_of(frame);
        resized = match corner {
            Corner::TopLeft => Rect::new(anchor.x - w, anchor.y - h, anchor.x, anchor.y),
            Corner::TopRight => Rect::new(anchor.x, anchor.y - h, anchor.x + w, anchor.y),
            Corner::BottomRight => Rect::new(anchor.x, anchor.y, anchor.x + w, anchor.y + h),
            Corner::BottomLeft => Rect::new(anchor.x - w, anchor.y, anchor.x, anchor.y + h),
        };
    }

    Rect::new(
        resized.x0,
        resized.y0,
        resized.x0 + resized.width().max(MIN_FRAME_SIZE),
        resized.y0 + resized.height().max(MIN_FRAME_SIZE),
    )
}

fn corner_opposite(corner: Corner) -> Corner {
    match corner {
        Corner::TopLeft => Corner::BottomRight,
        Corner::TopRight => Corner::BottomLeft,
        Corner::BottomRight => Corner::TopLeft,
        Corner::BottomLeft => Corner::TopRight,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::{Line, Rectangle, Text};

    fn rect_node() -> Node {
        Rectangle::with_id("r", Point::new(100.0, 100.0), 100.0, 50.0).into()
    }

    #[test]
    fn test_rectangle_gets_corners_and_rotate() {
        let handles = get_handles(&rect_node());
        assert_eq!(handles.len(), 5);
        assert_eq!(handles[0].position, Point::new(100.0, 100.0));
        assert_eq!(handles[4].kind, HandleKind::Rotate);
        assert_eq!(handles[4].position, Point::new(150.0, 100.0 - ROTATE_HANDLE_OFFSET));
    }

    #[test]
    fn test_text_gets_rotate_only() {
        let text: Node = Text::new("t", Point::new(0.0, 0.0), "Hello").into();
        let handles = get_handles(&text);
        assert_eq!(handles.len(), 1);
        assert_eq!(handles[0].kind, HandleKind::Rotate);
    }

    #[test]
    fn test_line_rotates_like_shapes() {
        let line: Node = Line::new(Point::new(0.0, 0.0), Point::new(50.0, 50.0)).into();
        let handles = get_handles(&line);
        assert_eq!(handles.len(), 5);
        assert_eq!(handles[4].kind, HandleKind::Rotate);

        let rotated = apply_manipulation(
            &line,
            Some(HandleKind::Rotate),
            Point::new(25.0, -25.0),
            Point::new(100.0, 25.0),
            false,
        );
        assert!((rotated.rotation() - FRAC_PI_2).abs() < 1e-9);
    }

    #[test]
    fn test_hit_test_handles() {
        let node = rect_node();
        assert_eq!(
            hit_test_handles(&node, Point::new(203.0, 152.0), 8.0),
            Some(HandleKind::Corner(Corner::BottomRight))
        );
        assert_eq!(hit_test_handles(&node, Point::new(150.0, 125.0), 8.0), None);
    }

    #[test]
    fn test_move() {
        let state = ManipulationState {
            current_point: Point::new(30.0, 40.0),
            ..ManipulationState::new(None, Point::new(10.0, 10.0), rect_node())
        };
        assert_eq!(state.apply(false).bounds(), Rect::new(120.0, 130.0, 220.0, 180.0));
    }

    #[test]
    fn test_corner_resize() {
        let moved = apply_manipulation(
            &rect_node(),
            Some(HandleKind::Corner(Corner::BottomRight)),
            Point::new(200.0, 150.0),
            Point::new(250.0, 200.0),
            false,
        );
        assert_eq!(moved.bounds(), Rect::new(100.0, 100.0, 250.0, 200.0));
    }

    #[test]
    fn test_corner_resize_keeps_aspect() {
        let moved = apply_manipulation(
            &rect_node(),
            Some(HandleKind::Corner(Corner::BottomRight)),
            Point::new(200.0, 150.0),
            Point::new(300.0, 160.0),
            true,
        );
        assert_eq!(moved.bounds(), Rect::new(100.0, 100.0, 300.0, 200.0));
    }

    #[test]
    fn test_rotate_handle() {
        let rotated = apply_manipulation(
            &rect_node(),
            Some(HandleKind::Rotate),
            Point::new(150.0, 75.0),
            Point::new(300.0, 125.0),
            false,
        );
        assert!((rotated.rotation() - FRAC_PI_2).abs() < 1e-9);
    }
}

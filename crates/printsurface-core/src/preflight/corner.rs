//! Rounded-corner intrusion test.
//!
//! A rounded corner of radius `r` cuts away the part of the `r x r` corner
//! square that lies outside the quarter circle centered `r` in from both
//! edges. The test works on bounding boxes only, so rotated or non
//! rectangular nodes are judged by their axis-aligned bounds.

use kurbo::{Point, Rect};

/// One of the four corners of a rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomRight,
    BottomLeft,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomRight,
        Corner::BottomLeft,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Corner::TopLeft => "top-left",
            Corner::TopRight => "top-right",
            Corner::BottomRight => "bottom-right",
            Corner::BottomLeft => "bottom-left",
        }
    }

    /// The corner point of `rect`.
    pub fn point_of(self, rect: Rect) -> Point {
        match self {
            Corner::TopLeft => Point::new(rect.x0, rect.y0),
            Corner::TopRight => Point::new(rect.x1, rect.y0),
            Corner::BottomRight => Point::new(rect.x1, rect.y1),
            Corner::BottomLeft => Point::new(rect.x0, rect.y1),
        }
    }

    /// The `r x r` square in this corner of `rect`.
    pub fn square(self, rect: Rect, r: f64) -> Rect {
        let p = self.point_of(rect);
        let inward = self.inward();
        Rect::from_points(p, Point::new(p.x + inward.0 * r, p.y + inward.1 * r))
    }

    /// Center of the quarter circle rounding this corner of `rect`.
    pub fn circle_center(self, rect: Rect, r: f64) -> Point {
        let p = self.point_of(rect);
        let inward = self.inward();
        Point::new(p.x + inward.0 * r, p.y + inward.1 * r)
    }

    /// Unit direction pointing from the corner into the rect.
    fn inward(self) -> (f64, f64) {
        match self {
            Corner::TopLeft => (1.0, 1.0),
            Corner::TopRight => (-1.0, 1.0),
            Corner::BottomRight => (-1.0, -1.0),
            Corner::BottomLeft => (1.0, -1.0),
        }
    }
}

/// Find the first corner of `safe` whose cut-away region `bbox` reaches into.
///
/// For each corner square the bbox meets (zero-width and zero-height bounds
/// included), the part of the overlap nearest the physical corner is compared against the circle:
/// if it lies farther than `radius_px` from the circle center the bbox
/// covers material that will be trimmed away.
pub fn corner_danger(bbox: Rect, safe: Rect, radius_px: f64) -> Option<Corner> {
    if radius_px <= 0.0 {
        return None;
    }
    let r_sq = radius_px * radius_px;
    Corner::ALL.into_iter().find(|&corner| {
        let square = corner.square(safe, radius_px);
        let overlap = Rect::new(
            bbox.x0.max(square.x0),
            bbox.y0.max(square.y0),
            bbox.x1.min(square.x1),
            bbox.y1.min(square.y1),
        );
        // Closed intersection: degenerate bounds from lines still count.
        if overlap.x0 > overlap.x1 || overlap.y0 > overlap.y1 {
            return false;
        }
        let center = corner.circle_center(safe, radius_px);
        // Clamp the physical corner into the overlap: its nearest point.
        let physical = corner.point_of(safe);
        let reach = Point::new(
            physical.x.clamp(overlap.x0, overlap.x1),
            physical.y.clamp(overlap.y0, overlap.y1),
        );
        (reach - center).hypot2() > r_sq
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAFE: Rect = Rect::new(72.0, 72.0, 1200.0, 1800.0);

    #[test]
    fn test_zero_radius_never_flags() {
        let bbox = Rect::new(50.0, 50.0, 90.0, 90.0);
        assert_eq!(corner_danger(bbox, SAFE, 0.0), None);
    }

    #[test]
    fn test_node_well_inside_is_clear() {
        let bbox = Rect::new(616.0, 916.0, 656.0, 956.0);
        assert_eq!(corner_danger(bbox, SAFE, 35.0), None);
    }

    #[test]
    fn test_bbox_corner_at_circle_center_flags() {
        let r = 35.0;
        let center = Corner::TopLeft.circle_center(SAFE, r);
        let bbox = Rect::new(center.x - 40.0, center.y - 40.0, center.x, center.y);
        assert_eq!(corner_danger(bbox, SAFE, r), Some(Corner::TopLeft));
        assert_eq!(corner_danger(bbox, SAFE, 0.0), None);
    }

    #[test]
    fn test_each_corner_is_checked() {
        let r = 20.0;
        for corner in Corner::ALL {
            let p = corner.point_of(SAFE);
            let bbox = Rect::from_points(p, p).inflate(5.0, 5.0);
            assert_eq!(corner_danger(bbox, SAFE, r), Some(corner), "{}", corner.name());
        }
    }

    #[test]
    fn test_inside_the_arc_is_clear() {
        // Overlaps the corner square but stays within the quarter circle
        let r = 40.0;
        let bbox = Rect::new(90.0, 90.0, 300.0, 300.0);
        assert_eq!(corner_danger(bbox, SAFE, r), None);
    }

    #[test]
    fn test_zero_height_bbox_in_cut_away_flags() {
        let r = 40.0;
        let bbox = Rect::new(72.0, 73.0, 150.0, 73.0);
        assert_eq!(corner_danger(bbox, SAFE, r), Some(Corner::TopLeft));
        let vertical = Rect::new(73.0, 72.0, 73.0, 150.0);
        assert_eq!(corner_danger(vertical, SAFE, r), Some(Corner::TopLeft));
    }

    #[test]
    fn test_zero_height_bbox_outside_square_is_clear() {
        let bbox = Rect::new(300.0, 73.0, 400.0, 73.0);
        assert_eq!(corner_danger(bbox, SAFE, 40.0), None);
    }

    #[test]
    fn test_touching_square_edge_is_not_overlap() {
        let r = 40.0;
        let bbox = Rect::new(112.0, 72.0, 200.0, 100.0);
        assert_eq!(corner_danger(bbox, SAFE, r), None);
    }
}

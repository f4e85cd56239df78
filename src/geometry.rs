use serde::{Deserialize, Serialize};

use crate::color::Rgba;

/// A pixel position on the canvas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// A filled, axis-aligned rectangle. `(x, y)` is the top-left corner.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub color: Rgba,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: u32, height: u32, color: Rgba) -> Self {
        Self {
            x,
            y,
            width,
            height,
            color,
        }
    }

    /// Builds a rectangle from a signed extent, flipping the origin when the
    /// extent points left or up.
    pub fn from_extent(x: i32, y: i32, dx: i32, dy: i32, color: Rgba) -> Self {
        Self {
            x: x.min(x + dx),
            y: y.min(y + dy),
            width: dx.unsigned_abs(),
            height: dy.unsigned_abs(),
            color,
        }
    }

    /// The rectangle spanned by two corners, in any order.
    pub fn from_corners(a: Point, b: Point, color: Rgba) -> Self {
        Self::from_extent(a.x, a.y, b.x - a.x, b.y - a.y, color)
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn right(&self) -> i32 {
        self.x.saturating_add_unsigned(self.width)
    }

    pub fn bottom(&self) -> i32 {
        self.y.saturating_add_unsigned(self.height)
    }

    /// Inclusive containment with `tolerance` pixels of slack on every side.
    pub fn contains(&self, p: Point, tolerance: i32) -> bool {
        p.x >= self.x.saturating_sub(tolerance)
            && p.x <= self.right().saturating_add(tolerance)
            && p.y >= self.y.saturating_sub(tolerance)
            && p.y <= self.bottom().saturating_add(tolerance)
    }

    /// Limits size to the canvas and the origin to one canvas extent either
    /// side of zero, so the far edges stay well inside `i32`.
    pub fn fit_to(&mut self, canvas: (u32, u32)) {
        let (w, h) = (canvas.0.min(i32::MAX as u32), canvas.1.min(i32::MAX as u32));
        self.width = self.width.min(w);
        self.height = self.height.min(h);
        self.x = self.x.clamp(-(w as i32), w as i32);
        self.y = self.y.clamp(-(h as i32), h as i32);
    }

    /// Moves the origin to `target`, keeping the rectangle inside a canvas of
    /// the given size. A rectangle larger than the canvas is pinned to 0.
    pub fn move_clamped(&mut self, target: Point, canvas: (u32, u32)) {
        self.x = clamp_axis(target.x, self.width, canvas.0);
        self.y = clamp_axis(target.y, self.height, canvas.1);
    }
}

fn clamp_axis(pos: i32, size: u32, extent: u32) -> i32 {
    let max = extent as i32 - size as i32;
    pos.min(max).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x: i32, y: i32, w: u32, h: u32) -> Rect {
        Rect::new(x, y, w, h, Rgba::default())
    }

    #[test]
    fn contains_uses_tolerance_on_all_sides() {
        let r = rect(10, 10, 20, 20);
        assert!(r.contains(Point::new(15, 15), 1));
        assert!(r.contains(Point::new(9, 9), 1));
        assert!(r.contains(Point::new(31, 31), 1));
        assert!(!r.contains(Point::new(8, 15), 1));
        assert!(!r.contains(Point::new(15, 32), 1));
    }

    #[test]
    fn from_corners_normalizes_direction() {
        let r = Rect::from_corners(Point::new(80, 60), Point::new(20, 10), Rgba::default());
        assert_eq!((r.x, r.y, r.width, r.height), (20, 10, 60, 50));
    }

    #[test]
    fn move_clamped_keeps_rect_on_canvas() {
        let mut r = rect(10, 10, 50, 50);
        r.move_clamped(Point::new(-5, -5), (100, 100));
        assert_eq!(r.origin(), Point::new(0, 0));

        r.move_clamped(Point::new(80, 80), (100, 100));
        assert_eq!(r.origin(), Point::new(50, 50));
    }

    #[test]
    fn far_edges_saturate_instead_of_overflowing() {
        let r = rect(i32::MAX - 5, 0, u32::MAX, 10);
        assert_eq!(r.right(), i32::MAX);
        assert!(r.contains(Point::new(i32::MAX, 5), 1));
        assert!(!r.contains(Point::new(0, 5), 1));
    }

    #[test]
    fn fit_to_bounds_size_and_origin() {
        let mut r = rect(i32::MAX, -7, i32::MAX as u32, 40);
        r.fit_to((100, 80));
        assert_eq!((r.x, r.y, r.width, r.height), (100, -7, 100, 40));

        let mut r = rect(i32::MIN, 0, 5, 5);
        r.fit_to((100, 80));
        assert_eq!(r.origin(), Point::new(-100, 0));
    }

    #[test]
    fn oversized_rect_pins_to_origin() {
        let mut r = rect(0, 0, 150, 20);
        r.move_clamped(Point::new(30, 30), (100, 100));
        assert_eq!(r.origin(), Point::new(0, 30));
    }
}

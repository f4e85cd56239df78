use image::RgbaImage;

use crate::color::Rgba;
use crate::geometry::{Point, Rect};

/// The in-progress rectangle of a draw gesture. It is not part of the scene
/// until committed.
#[derive(Clone, Debug, PartialEq)]
pub struct Draft {
    pub anchor: Point,
    pub current: Point,
    pub color: Rgba,
}

impl Draft {
    pub fn new(anchor: Point, color: Rgba) -> Self {
        Self {
            anchor,
            current: anchor,
            color,
        }
    }

    /// Signed extent from the anchor, negative when dragging left or up.
    pub fn extent(&self) -> (i32, i32) {
        (self.current.x - self.anchor.x, self.current.y - self.anchor.y)
    }

    pub fn normalized(&self) -> Rect {
        Rect::from_corners(self.anchor, self.current, self.color)
    }
}

/// Rectangles in z-order (later on top), the selection, the background image
/// and the transient draft.
#[derive(Clone, Debug)]
pub struct Scene {
    pub rects: Vec<Rect>,
    pub selected: Option<usize>,
    pub background: Option<RgbaImage>,
    pub draft: Option<Draft>,
    default_size: (u32, u32),
}

impl Scene {
    pub fn new(default_size: (u32, u32)) -> Self {
        Self {
            rects: Vec::new(),
            selected: None,
            background: None,
            draft: None,
            default_size,
        }
    }

    /// Canvas size: the background's pixel size, or the configured default.
    pub fn size(&self) -> (u32, u32) {
        self.background
            .as_ref()
            .map(|img| img.dimensions())
            .unwrap_or(self.default_size)
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty() && self.background.is_none()
    }

    pub fn selected_rect(&self) -> Option<&Rect> {
        self.selected.and_then(|i| self.rects.get(i))
    }

    /// Topmost rectangle under `p`, last-inserted first.
    pub fn hit_test(&self, p: Point, tolerance: i32) -> Option<usize> {
        self.rects
            .iter()
            .enumerate()
            .rev()
            .find(|(_, r)| r.contains(p, tolerance))
            .map(|(i, _)| i)
    }

    /// Appends a rectangle and returns its index.
    pub fn push(&mut self, rect: Rect) -> usize {
        self.rects.push(rect);
        self.rects.len() - 1
    }

    /// Removes the rectangle at `index`, keeping the selection pointing at the
    /// same rectangle (or clearing it when that rectangle is the one removed).
    pub fn remove(&mut self, index: usize) -> Option<Rect> {
        if index >= self.rects.len() {
            return None;
        }
        let removed = self.rects.remove(index);
        self.selected = match self.selected {
            Some(s) if s == index => None,
            Some(s) if s > index => Some(s - 1),
            other => other,
        };
        Some(removed)
    }

    /// Replaces the rectangle sequence wholesale, dropping the selection.
    pub fn restore(&mut self, rects: Vec<Rect>) {
        self.rects = rects;
        self.selected = None;
    }

    pub fn clear(&mut self) {
        self.rects.clear();
        self.selected = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene_with(rects: &[(i32, i32, u32, u32)]) -> Scene {
        let mut scene = Scene::new((200, 200));
        for &(x, y, w, h) in rects {
            scene.push(Rect::new(x, y, w, h, Rgba::default()));
        }
        scene
    }

    #[test]
    fn size_follows_background() {
        let mut scene = Scene::new((200, 150));
        assert_eq!(scene.size(), (200, 150));
        scene.background = Some(RgbaImage::new(64, 32));
        assert_eq!(scene.size(), (64, 32));
    }

    #[test]
    fn hit_test_prefers_topmost() {
        let scene = scene_with(&[(0, 0, 50, 50), (25, 25, 50, 50)]);
        assert_eq!(scene.hit_test(Point::new(30, 30), 1), Some(1));
        assert_eq!(scene.hit_test(Point::new(10, 10), 1), Some(0));
        assert_eq!(scene.hit_test(Point::new(150, 150), 1), None);
    }

    #[test]
    fn hit_test_misses_beyond_tolerance() {
        let scene = scene_with(&[(10, 10, 10, 10)]);
        assert_eq!(scene.hit_test(Point::new(21, 21), 1), Some(0));
        assert_eq!(scene.hit_test(Point::new(22, 15), 1), None);
        assert_eq!(scene.hit_test(Point::new(15, 8), 1), None);
    }

    #[test]
    fn remove_shifts_selection() {
        let mut scene = scene_with(&[(0, 0, 5, 5), (10, 10, 5, 5), (20, 20, 5, 5)]);
        scene.selected = Some(2);
        scene.remove(0);
        assert_eq!(scene.selected, Some(1));
        assert_eq!(scene.selected_rect().map(|r| r.x), Some(20));

        scene.remove(1);
        assert_eq!(scene.selected, None);
        assert!(scene.remove(7).is_none());
    }

    #[test]
    fn draft_normalizes_negative_extent() {
        let mut draft = Draft::new(Point::new(50, 50), Rgba::default());
        draft.current = Point::new(20, 70);
        assert_eq!(draft.extent(), (-30, 20));
        let r = draft.normalized();
        assert_eq!((r.x, r.y, r.width, r.height), (20, 50, 30, 20));
    }
}

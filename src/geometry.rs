//! # Geometry
//!
//! Plain value types shared by every renderer. Coordinates are in points
//! with the origin at the top-left of the page and `y` growing downwards.
//! A renderer never keeps a reference to a caller's rectangle: anything it
//! stores as its occupied area is its own copy.

use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rectangle {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Move the rectangle by the given offsets.
    pub fn translate(&mut self, dx: f64, dy: f64) -> &mut Self {
        self.x += dx;
        self.y += dy;
        self
    }

    /// Shrink the rectangle by `edges` on every side. Width and height never
    /// go below zero.
    pub fn shrink(&self, edges: &Edges) -> Rectangle {
        Rectangle {
            x: self.x + edges.left,
            y: self.y + edges.top,
            width: (self.width - edges.horizontal()).max(0.0),
            height: (self.height - edges.vertical()).max(0.0),
        }
    }

    /// Grow the rectangle by `edges` on every side.
    pub fn expand(&self, edges: &Edges) -> Rectangle {
        Rectangle {
            x: self.x - edges.left,
            y: self.y - edges.top,
            width: self.width + edges.horizontal(),
            height: self.height + edges.vertical(),
        }
    }

    /// True when the two rectangles overlap vertically.
    pub fn overlaps_vertically(&self, top: f64, bottom: f64) -> bool {
        self.y < bottom && top < self.bottom()
    }

    /// The intersection of two rectangles, if non-empty.
    pub fn intersection(&self, other: &Rectangle) -> Option<Rectangle> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right < x || bottom < y {
            return None;
        }
        Some(Rectangle::new(x, y, right - x, bottom - y))
    }

    /// The smallest rectangle containing both.
    pub fn union(&self, other: &Rectangle) -> Rectangle {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rectangle::new(x, y, right - x, bottom - y)
    }

    /// Axis-aligned bounding box of this rectangle rotated by `angle`
    /// radians around its top-left corner, re-anchored at the same corner.
    pub fn rotated_bounds(&self, angle: f64) -> Rectangle {
        let (w, h) = rotated_size(self.width, self.height, angle);
        Rectangle::new(self.x, self.y, w, h)
    }
}

/// Width and height of the bounding box of a `width × height` box rotated
/// by `angle` radians.
pub fn rotated_size(width: f64, height: f64, angle: f64) -> (f64, f64) {
    let (sin, cos) = angle.sin_cos();
    let (sin, cos) = (sin.abs(), cos.abs());
    (width * cos + height * sin, width * sin + height * cos)
}

/// A rectangle tagged with the page or column it belongs to.
///
/// Areas are always produced by the caller; a renderer only narrows them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutArea {
    pub area_index: usize,
    pub bbox: Rectangle,
}

impl LayoutArea {
    pub fn new(area_index: usize, bbox: Rectangle) -> Self {
        Self { area_index, bbox }
    }

    /// Same area index, different rectangle.
    pub fn with_bbox(&self, bbox: Rectangle) -> Self {
        Self {
            area_index: self.area_index,
            bbox,
        }
    }
}

/// Edge values (top, right, bottom, left) used for margin, border and padding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Edges {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Edges {
    pub fn uniform(v: f64) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    pub fn symmetric(vertical: f64, horizontal: f64) -> Self {
        Self {
            top: vertical,
            right: horizontal,
            bottom: vertical,
            left: horizontal,
        }
    }

    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }
}

impl std::ops::Add for Edges {
    type Output = Edges;

    fn add(self, rhs: Edges) -> Edges {
        Edges {
            top: self.top + rhs.top,
            right: self.right + rhs.right,
            bottom: self.bottom + rhs.bottom,
            left: self.left + rhs.left,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn shrink_then_expand_is_identity() {
        let r = Rectangle::new(10.0, 20.0, 100.0, 50.0);
        let e = Edges {
            top: 1.0,
            right: 2.0,
            bottom: 3.0,
            left: 4.0,
        };
        assert_eq!(r.shrink(&e).expand(&e), r);
    }

    #[test]
    fn shrink_never_goes_negative() {
        let r = Rectangle::new(0.0, 0.0, 5.0, 5.0);
        let s = r.shrink(&Edges::uniform(10.0));
        assert_eq!(s.width, 0.0);
        assert_eq!(s.height, 0.0);
    }

    #[test]
    fn quarter_turn_swaps_dimensions() {
        let (w, h) = rotated_size(100.0, 20.0, FRAC_PI_2);
        assert!((w - 20.0).abs() < 1e-9);
        assert!((h - 100.0).abs() < 1e-9);
    }

    #[test]
    fn intersection_of_disjoint_rectangles_is_none() {
        let a = Rectangle::new(0.0, 0.0, 10.0, 10.0);
        let b = Rectangle::new(20.0, 0.0, 10.0, 10.0);
        assert!(a.intersection(&b).is_none());
        assert_eq!(a.union(&b), Rectangle::new(0.0, 0.0, 30.0, 10.0));
    }
}

//! Float placement and clearance.
//!
//! Floats are tracked per area as margin-box rectangles. Line boxes and
//! boxes that cannot overlap floats ask for the band left free at their
//! vertical position.

use crate::geometry::Rectangle;
use crate::style::{Clear, Float};

/// A placed float.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloatBox {
    /// Margin box.
    pub rect: Rectangle,
    pub side: Float,
}

/// The horizontal range `[left, right)` not covered by floats between `top`
/// and `bottom`.
pub fn available_band(floats: &[FloatBox], left: f64, right: f64, top: f64, bottom: f64) -> (f64, f64) {
    let mut band = (left, right);
    for float in floats {
        if !float.rect.overlaps_vertically(top, bottom.max(top + 1e-6)) {
            continue;
        }
        match float.side {
            Float::Left => band.0 = band.0.max(float.rect.right()),
            Float::Right => band.1 = band.1.min(float.rect.x),
            Float::None => {}
        }
    }
    (band.0, band.1.max(band.0))
}

/// Where a float of the given outer size goes: the highest position at or
/// below `top` where it fits beside the floats already placed, pushed to
/// its side.
pub fn place_float(
    floats: &[FloatBox],
    side: Float,
    width: f64,
    height: f64,
    left: f64,
    right: f64,
    top: f64,
) -> Rectangle {
    let mut candidates: Vec<f64> = std::iter::once(top)
        .chain(floats.iter().map(|f| f.rect.bottom()).filter(|&b| b > top))
        .collect();
    candidates.sort_by(f64::total_cmp);

    let mut y = top;
    let mut band = (left, right);
    for &candidate in &candidates {
        y = candidate;
        band = available_band(floats, left, right, y, y + height);
        if band.1 - band.0 + 1e-9 >= width {
            break;
        }
    }

    let x = match side {
        Float::Right => band.1 - width,
        _ => band.0,
    };
    Rectangle::new(x, y, width, height)
}

/// The lowest bottom edge among floats that `clear` has to get past.
pub fn clearance(floats: &[FloatBox], clear: Clear) -> Option<f64> {
    floats
        .iter()
        .filter(|f| match clear {
            Clear::None => false,
            Clear::Left => f.side == Float::Left,
            Clear::Right => f.side == Float::Right,
            Clear::Both => true,
        })
        .map(|f| f.rect.bottom())
        .max_by(f64::total_cmp)
}

/// Bottom edge of the lowest float.
pub fn floats_bottom(floats: &[FloatBox]) -> Option<f64> {
    floats.iter().map(|f| f.rect.bottom()).max_by(f64::total_cmp)
}

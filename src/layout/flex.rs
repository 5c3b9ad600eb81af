//! # Flex Layout Utilities
//!
//! The pure parts of the flexbox algorithm: line partitioning, the
//! clamp-and-retry resolution of flexible lengths, and the free-space
//! distribution formulas of `justify-content` / `align-content`. The
//! container renderer in `flex_container` feeds these with measured sizes.

use crate::layout::NodeId;
use crate::geometry::Rectangle;
use crate::style::{AlignContent, JustifyContent};

/// Working state of one item during one flex pass.
#[derive(Debug, Clone, PartialEq)]
pub struct FlexItemCalculationInfo {
    pub flex_basis: f64,
    pub flex_grow: f64,
    pub flex_shrink: f64,
    /// Smallest main size the item accepts (automatic minimum included).
    pub min_content: f64,
    /// Largest main size the item accepts.
    pub max_content: f64,
    /// Margins along the main axis; part of the item's outer size.
    pub margin: f64,
    /// Current target main size.
    pub main_size: f64,
    pub frozen: bool,
}

impl FlexItemCalculationInfo {
    pub fn new(flex_basis: f64, flex_grow: f64, flex_shrink: f64) -> Self {
        Self {
            flex_basis,
            flex_grow,
            flex_shrink,
            min_content: 0.0,
            max_content: f64::INFINITY,
            margin: 0.0,
            main_size: flex_basis,
            frozen: false,
        }
    }

    pub fn with_bounds(mut self, min: f64, max: f64) -> Self {
        self.min_content = min;
        self.max_content = max;
        self
    }

    pub fn with_margin(mut self, margin: f64) -> Self {
        self.margin = margin;
        self
    }

    fn clamp(&self, size: f64) -> f64 {
        size.min(self.max_content).max(self.min_content)
    }

    /// Basis clamped by the item's bounds.
    pub fn hypothetical_main_size(&self) -> f64 {
        self.clamp(self.flex_basis)
    }

    pub fn outer_hypothetical_main_size(&self) -> f64 {
        self.hypothetical_main_size() + self.margin
    }
}

/// Final placement of one item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlexItemInfo {
    pub renderer: NodeId,
    /// Border box of the item.
    pub rectangle: Rectangle,
}

/// A single line of items in a wrapping flex container.
#[derive(Debug, Clone, PartialEq)]
pub struct WrapLine {
    /// Index of the first item in this line.
    pub start: usize,
    /// One past the last item (exclusive end).
    pub end: usize,
}

/// Partition items into wrap lines based on available main size.
/// Always adds at least one item per line (prevents infinite loops on oversized items).
pub fn partition_into_lines(base_sizes: &[f64], gap: f64, available: f64) -> Vec<WrapLine> {
    if base_sizes.is_empty() {
        return vec![];
    }

    let mut lines = Vec::new();
    let mut line_start = 0;
    let mut line_size = 0.0;

    for (i, &w) in base_sizes.iter().enumerate() {
        let needed = if i == line_start { w } else { gap + w };
        if i > line_start && line_size + needed > available + 1e-9 {
            lines.push(WrapLine {
                start: line_start,
                end: i,
            });
            line_start = i;
            line_size = w;
        } else {
            line_size += needed;
        }
    }

    lines.push(WrapLine {
        start: line_start,
        end: base_sizes.len(),
    });

    lines
}

/// Resolve the main sizes of one line's items.
///
/// Surplus space grows items by `flex_grow`, a deficit shrinks them by
/// `flex_shrink × basis`. Items whose share lands outside their bounds are
/// frozen at the bound and the rest is redistributed until no item hits a
/// new bound.
pub fn resolve_flexible_lengths(items: &mut [FlexItemCalculationInfo], available: f64) {
    if items.is_empty() {
        return;
    }

    let outer_basis: f64 = items.iter().map(|i| i.flex_basis + i.margin).sum();
    let growing = outer_basis < available;

    // Size inflexible items.
    for item in items.iter_mut() {
        item.main_size = item.flex_basis;
        item.frozen = false;
        let hypothetical = item.hypothetical_main_size();
        let factor = if growing {
            item.flex_grow
        } else {
            item.flex_shrink
        };
        if factor == 0.0
            || (growing && item.flex_basis > hypothetical)
            || (!growing && item.flex_basis < hypothetical)
        {
            item.main_size = hypothetical;
            item.frozen = true;
        }
    }

    let free_space = |items: &[FlexItemCalculationInfo]| -> f64 {
        available
            - items
                .iter()
                .map(|i| i.margin + if i.frozen { i.main_size } else { i.flex_basis })
                .sum::<f64>()
    };
    let initial_free = free_space(items);

    // Each pass freezes at least one item, so this terminates.
    for pass in 0..=items.len() {
        if items.iter().all(|i| i.frozen) {
            break;
        }

        let mut remaining = free_space(items);
        let factor_sum: f64 = items
            .iter()
            .filter(|i| !i.frozen)
            .map(|i| if growing { i.flex_grow } else { i.flex_shrink })
            .sum();
        if factor_sum < 1.0 {
            let scaled = initial_free * factor_sum;
            if scaled.abs() < remaining.abs() {
                remaining = scaled;
            }
        }

        if growing {
            let total_grow: f64 = items.iter().filter(|i| !i.frozen).map(|i| i.flex_grow).sum();
            for item in items.iter_mut().filter(|i| !i.frozen) {
                item.main_size = if total_grow > 0.0 {
                    item.flex_basis + remaining * item.flex_grow / total_grow
                } else {
                    item.flex_basis
                };
            }
        } else {
            let total_scaled: f64 = items
                .iter()
                .filter(|i| !i.frozen)
                .map(|i| i.flex_shrink * i.flex_basis)
                .sum();
            for item in items.iter_mut().filter(|i| !i.frozen) {
                item.main_size = if total_scaled > 0.0 {
                    item.flex_basis
                        - remaining.abs() * (item.flex_shrink * item.flex_basis) / total_scaled
                } else {
                    item.flex_basis
                };
            }
        }

        let mut total_violation = 0.0;
        let mut violations = vec![0.0; items.len()];
        for (i, item) in items.iter().enumerate() {
            if item.frozen {
                continue;
            }
            let clamped = item.clamp(item.main_size.max(0.0));
            violations[i] = clamped - item.main_size;
            total_violation += violations[i];
        }

        log::trace!(
            "flex pass {pass}: free {remaining:.3}, total violation {total_violation:.3}"
        );

        for (i, item) in items.iter_mut().enumerate() {
            if item.frozen {
                continue;
            }
            let freeze = if total_violation.abs() < 1e-9 {
                true
            } else if total_violation > 0.0 {
                violations[i] > 0.0
            } else {
                violations[i] < 0.0
            };
            item.main_size += violations[i];
            if freeze {
                item.frozen = true;
            }
        }
    }
}

/// Leading offset and spacing between items for `justify-content`.
/// Negative free space falls back to start alignment for the `space-*`
/// modes.
pub fn justify_offsets(justify: JustifyContent, free: f64, count: usize) -> (f64, f64) {
    if count == 0 {
        return (0.0, 0.0);
    }
    let n = count as f64;
    match justify {
        JustifyContent::FlexStart => (0.0, 0.0),
        JustifyContent::FlexEnd => (free, 0.0),
        JustifyContent::Center => (free / 2.0, 0.0),
        _ if free <= 0.0 => (0.0, 0.0),
        JustifyContent::SpaceBetween if count > 1 => (0.0, free / (n - 1.0)),
        JustifyContent::SpaceBetween => (0.0, 0.0),
        JustifyContent::SpaceAround => {
            let space = free / n;
            (space / 2.0, space)
        }
        JustifyContent::SpaceEvenly => {
            let space = free / (n + 1.0);
            (space, space)
        }
    }
}

/// Leading offset, spacing between lines and extra size per line for
/// `align-content`.
pub fn align_content_offsets(align: AlignContent, free: f64, lines: usize) -> (f64, f64, f64) {
    if lines == 0 {
        return (0.0, 0.0, 0.0);
    }
    let n = lines as f64;
    match align {
        AlignContent::Stretch if free > 0.0 => (0.0, 0.0, free / n),
        AlignContent::Stretch | AlignContent::FlexStart => (0.0, 0.0, 0.0),
        AlignContent::FlexEnd => (free, 0.0, 0.0),
        AlignContent::Center => (free / 2.0, 0.0, 0.0),
        _ if free <= 0.0 => (0.0, 0.0, 0.0),
        AlignContent::SpaceBetween if lines > 1 => (0.0, free / (n - 1.0), 0.0),
        AlignContent::SpaceBetween => (0.0, 0.0, 0.0),
        AlignContent::SpaceAround => (free / n / 2.0, free / n, 0.0),
        AlignContent::SpaceEvenly => (free / (n + 1.0), free / (n + 1.0), 0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sizes(items: &[FlexItemCalculationInfo]) -> Vec<f64> {
        items.iter().map(|i| i.main_size).collect()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 0.01
    }

    #[test]
    fn grow_is_proportional_to_weights() {
        let mut items = vec![
            FlexItemCalculationInfo::new(100.0, 1.0, 1.0),
            FlexItemCalculationInfo::new(100.0, 2.0, 1.0),
        ];
        resolve_flexible_lengths(&mut items, 290.0);
        let s = sizes(&items);
        assert!(close(s[0], 130.0), "got {s:?}");
        assert!(close(s[1], 160.0), "got {s:?}");
    }

    #[test]
    fn shrink_is_weighted_by_basis() {
        let mut items = vec![
            FlexItemCalculationInfo::new(100.0, 0.0, 1.0),
            FlexItemCalculationInfo::new(200.0, 0.0, 1.0),
            FlexItemCalculationInfo::new(300.0, 0.0, 1.0),
        ];
        resolve_flexible_lengths(&mut items, 400.0);
        let s = sizes(&items);
        assert!(close(s[0], 66.67) && close(s[1], 133.33) && close(s[2], 200.0), "got {s:?}");
    }

    #[test]
    fn clamped_item_frees_space_for_the_others() {
        // Equal shares would be 100 each; the first may not exceed 40.
        let mut items = vec![
            FlexItemCalculationInfo::new(0.0, 1.0, 1.0).with_bounds(0.0, 40.0),
            FlexItemCalculationInfo::new(0.0, 1.0, 1.0),
            FlexItemCalculationInfo::new(0.0, 1.0, 1.0),
        ];
        resolve_flexible_lengths(&mut items, 300.0);
        let s = sizes(&items);
        assert!(close(s[0], 40.0) && close(s[1], 130.0) && close(s[2], 130.0), "got {s:?}");
        assert!(close(s.iter().sum::<f64>(), 300.0));
    }

    #[test]
    fn shrink_stops_at_min_content() {
        let mut items = vec![
            FlexItemCalculationInfo::new(200.0, 0.0, 1.0).with_bounds(180.0, f64::INFINITY),
            FlexItemCalculationInfo::new(200.0, 0.0, 1.0),
        ];
        resolve_flexible_lengths(&mut items, 300.0);
        let s = sizes(&items);
        assert!(close(s[0], 180.0) && close(s[1], 120.0), "got {s:?}");
    }

    #[test]
    fn zero_grow_items_keep_their_basis() {
        let mut items = vec![
            FlexItemCalculationInfo::new(50.0, 0.0, 1.0),
            FlexItemCalculationInfo::new(50.0, 1.0, 1.0),
        ];
        resolve_flexible_lengths(&mut items, 200.0);
        let s = sizes(&items);
        assert!(close(s[0], 50.0) && close(s[1], 150.0), "got {s:?}");
    }

    #[test]
    fn fractional_grow_leaves_space_unused() {
        let mut items = vec![FlexItemCalculationInfo::new(0.0, 0.5, 1.0)];
        resolve_flexible_lengths(&mut items, 100.0);
        assert!(close(items[0].main_size, 50.0));
    }

    #[test]
    fn margins_take_space_from_the_line() {
        let mut items = vec![
            FlexItemCalculationInfo::new(0.0, 1.0, 1.0).with_margin(20.0),
            FlexItemCalculationInfo::new(0.0, 1.0, 1.0),
        ];
        resolve_flexible_lengths(&mut items, 220.0);
        let s = sizes(&items);
        assert!(close(s[0], 100.0) && close(s[1], 100.0), "got {s:?}");
    }

    #[test]
    fn test_partition_two_line_split() {
        // 3 items × 100pt + 2 gaps × 10pt = 320pt; available = 250pt
        let lines = partition_into_lines(&[100.0, 100.0, 100.0], 10.0, 250.0);
        assert_eq!(lines, vec![WrapLine { start: 0, end: 2 }, WrapLine { start: 2, end: 3 }]);
    }

    #[test]
    fn test_partition_oversized_item() {
        // Single item wider than available, must still get its own line
        let lines = partition_into_lines(&[500.0, 10.0], 10.0, 200.0);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], WrapLine { start: 0, end: 1 });
    }

    #[test]
    fn test_partition_exact_fit() {
        let lines = partition_into_lines(&[100.0, 100.0], 10.0, 210.0);
        assert_eq!(lines.len(), 1);
        assert!(partition_into_lines(&[], 10.0, 210.0).is_empty());
    }

    #[test]
    fn justify_distribution_formulas() {
        assert_eq!(justify_offsets(JustifyContent::SpaceBetween, 90.0, 4), (0.0, 30.0));
        assert_eq!(justify_offsets(JustifyContent::SpaceAround, 90.0, 3), (15.0, 30.0));
        assert_eq!(justify_offsets(JustifyContent::SpaceEvenly, 80.0, 3), (20.0, 20.0));
        assert_eq!(justify_offsets(JustifyContent::Center, -20.0, 2), (-10.0, 0.0));
        assert_eq!(justify_offsets(JustifyContent::SpaceEvenly, -20.0, 2), (0.0, 0.0));
    }

    #[test]
    fn align_content_stretch_splits_free_space() {
        assert_eq!(
            align_content_offsets(AlignContent::Stretch, 60.0, 3),
            (0.0, 0.0, 20.0)
        );
        assert_eq!(
            align_content_offsets(AlignContent::SpaceBetween, 60.0, 3),
            (0.0, 30.0, 0.0)
        );
    }
}

//! # Multi-Column Layout
//!
//! Content is flowed through `column_count` equal columns. The column height
//! is found by bisection between the ideal height (content spread evenly)
//! and the content's height in a single column, keeping the lowest height at
//! which everything fits. When even columns as tall as the area cannot hold
//! the content, the columns are filled to the bottom and the rest goes to
//! the next area.
//!
//! Each column is an anonymous block; the blocks placed are kept in the
//! multi-column record's `fragments` and painted in place of its children.

use crate::error::{Diagnostic, LayoutError};
use crate::geometry::Rectangle;
use crate::layout::block::BoxFrame;
use crate::layout::{LayoutContext, LayoutEngine, LayoutResult, LayoutStatus, NodeId};
use crate::style::ResolvedStyle;

/// Content poured into a run of columns.
#[derive(Debug, Clone, Default)]
struct ColumnFill {
    /// Column blocks placed, left to right.
    columns: Vec<NodeId>,
    /// Content left over after the last column.
    rest: Option<NodeId>,
    /// Set when the first column could take nothing.
    nothing: Option<NodeId>,
}

impl ColumnFill {
    fn is_complete(&self) -> bool {
        self.rest.is_none() && self.nothing.is_none()
    }
}

impl LayoutEngine {
    pub(crate) fn layout_multicol(
        &mut self,
        id: NodeId,
        ctx: &LayoutContext,
    ) -> Result<LayoutResult, LayoutError> {
        let Some(frame) = self.open_box(id, ctx)? else {
            return Ok(LayoutResult::nothing(id));
        };
        let children = self.tree.children(id)?.to_vec();
        let count = frame.style.column_count.unwrap_or(1).max(1) as usize;
        let gap = frame.style.column_gap;
        let content = frame.content;
        let column_width = ((content.width - gap * (count - 1) as f64) / count as f64).max(0.0);
        let eps = self.config.epsilon;

        if !ctx.forced_placement {
            for &child in &children {
                if self.min_max_width(child)?.min_width > column_width + eps {
                    let cause = if frame.style.keep_together { id } else { child };
                    return Ok(LayoutResult::nothing(cause));
                }
            }
        }

        let height = self.balanced_height(id, ctx, &frame, &children, count, column_width)?;
        let rects = column_rects(content, count, column_width, gap, height);
        let fill = self.fill_columns(id, ctx, &children, &rects, ctx.forced_placement)?;
        if let Some(cause) = fill.nothing {
            let cause = if frame.style.keep_together { id } else { cause };
            return Ok(LayoutResult::nothing(cause));
        }

        let mut bottom = content.y;
        for &column in &fill.columns {
            if let Some(area) = self.tree.get(column)?.occupied_area {
                bottom = bottom.max(area.bbox.bottom());
            }
        }
        let content_height = bottom - content.y;
        self.tree.get_mut(id)?.fragments = fill.columns.clone();

        let Some(rest) = fill.rest else {
            return self.close_full(id, ctx, &frame, content_height);
        };
        let mut split_children = Vec::new();
        for &column in &fill.columns {
            split_children.extend_from_slice(self.tree.children(column)?);
        }
        let overflow_children = self.tree.children(rest)?.to_vec();
        log::debug!(
            "multi-column {id}: {} columns of {height:.2} full, {} children carried over",
            fill.columns.len(),
            overflow_children.len()
        );
        self.split_box(id, ctx, &frame, content_height, split_children, overflow_children)
    }

    /// Min/max width: every column as wide as the widest child needs.
    pub(crate) fn multicol_min_max(
        &mut self,
        children: &[NodeId],
        style: &ResolvedStyle,
    ) -> Result<(f64, f64), LayoutError> {
        let count = style.column_count.unwrap_or(1).max(1) as f64;
        let (mut min, mut max) = (0.0_f64, 0.0_f64);
        for &child in children {
            let m = self.min_max_width(child)?;
            min = min.max(m.min_width);
            max = max.max(m.max_width);
        }
        let gaps = style.column_gap * (count - 1.0);
        Ok((min * count + gaps, max * count + gaps))
    }

    /// Lowest column height at which all content fits, or the area's height
    /// when it does not fit at all.
    fn balanced_height(
        &mut self,
        id: NodeId,
        ctx: &LayoutContext,
        frame: &BoxFrame,
        children: &[NodeId],
        count: usize,
        column_width: f64,
    ) -> Result<f64, LayoutError> {
        let content = frame.content;
        let single = self.tree.anonymous_block(id, children.to_vec())?;
        let total = self.measure_height(single, column_width)?;
        let cap = content.height;
        if count == 1 {
            return Ok(total.min(cap));
        }

        let mut hi = total.min(cap);
        if !self.columns_fit(id, ctx, frame, children, count, column_width, hi)? {
            return Ok(cap);
        }
        let mut lo = total / count as f64;
        if self.columns_fit(id, ctx, frame, children, count, column_width, lo)? {
            return Ok(lo);
        }

        let tolerance = self.config.epsilon;
        let mut iterations = 0;
        while hi - lo > tolerance {
            if iterations == self.config.max_balancing_iterations {
                self.diagnose(Diagnostic::BalancingLimitReached { node: id, iterations });
                break;
            }
            iterations += 1;
            let mid = (lo + hi) / 2.0;
            if self.columns_fit(id, ctx, frame, children, count, column_width, mid)? {
                hi = mid;
            } else {
                lo = mid;
            }
            log::trace!("multi-column {id}: probe {iterations} at {mid:.3}, range [{lo:.3}, {hi:.3}]");
        }
        Ok(hi)
    }

    #[allow(clippy::too_many_arguments)]
    fn columns_fit(
        &mut self,
        id: NodeId,
        ctx: &LayoutContext,
        frame: &BoxFrame,
        children: &[NodeId],
        count: usize,
        column_width: f64,
        height: f64,
    ) -> Result<bool, LayoutError> {
        let rects = column_rects(frame.content, count, column_width, frame.style.column_gap, height);
        self.measuring += 1;
        let fill = self.fill_columns(id, ctx, children, &rects, false);
        self.measuring -= 1;
        Ok(fill?.is_complete())
    }

    /// Pour `children` into `rects` one column after the other.
    fn fill_columns(
        &mut self,
        id: NodeId,
        ctx: &LayoutContext,
        children: &[NodeId],
        rects: &[Rectangle],
        forced: bool,
    ) -> Result<ColumnFill, LayoutError> {
        let mut fill = ColumnFill::default();
        let mut current = self.tree.anonymous_block(id, children.to_vec())?;
        for &rect in rects {
            let column_ctx = ctx.child(rect).forced(forced && fill.columns.is_empty());
            let result = self.layout(current, &column_ctx)?;
            match (result.status, result.split_renderer, result.overflow_renderer) {
                (LayoutStatus::Full, ..) => {
                    fill.columns.push(current);
                    return Ok(fill);
                }
                (LayoutStatus::Partial, Some(split), Some(overflow)) => {
                    fill.columns.push(split);
                    current = overflow;
                }
                _ if fill.columns.is_empty() => {
                    fill.nothing = Some(result.cause_of_nothing.unwrap_or(current));
                    return Ok(fill);
                }
                _ => break,
            }
        }
        fill.rest = Some(current);
        Ok(fill)
    }
}

fn column_rects(content: Rectangle, count: usize, width: f64, gap: f64, height: f64) -> Vec<Rectangle> {
    (0..count)
        .map(|i| Rectangle::new(content.x + i as f64 * (width + gap), content.y, width, height))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::geometry::LayoutArea;
    use crate::layout::{LayoutTree, RendererKind};
    use crate::style::{Dimension, Style};

    fn area(width: f64, height: f64) -> LayoutContext {
        LayoutContext::new(LayoutArea::new(0, Rectangle::new(0.0, 0.0, width, height)))
    }

    fn columns(tree: &mut LayoutTree, count: u32, gap: f64, heights: &[f64]) -> (NodeId, Vec<NodeId>) {
        let mc = tree.add(
            RendererKind::MultiColumn,
            Style {
                column_count: Some(count),
                column_gap: Some(gap),
                ..Default::default()
            },
        );
        let kids = heights
            .iter()
            .map(|&h| {
                let b = tree.add(
                    RendererKind::Block,
                    Style {
                        height: Some(Dimension::Pt(h)),
                        ..Default::default()
                    },
                );
                tree.append_child(mc, b).unwrap();
                b
            })
            .collect();
        (mc, kids)
    }

    #[test]
    fn content_is_balanced_over_the_columns() {
        let mut tree = LayoutTree::new();
        let (mc, kids) = columns(&mut tree, 2, 0.0, &[30.0, 30.0, 30.0, 30.0]);
        let mut engine = LayoutEngine::new(tree);
        let result = engine.layout(mc, &area(200.0, 500.0)).unwrap();
        assert!(result.is_full());
        assert!((result.occupied_area.unwrap().bbox.height - 60.0).abs() < 0.01);
        assert_eq!(engine.tree().get(mc).unwrap().fragments.len(), 2);
        let third = engine.tree().get(kids[2]).unwrap().border_box.unwrap();
        assert_eq!((third.x, third.y), (100.0, 0.0));
    }

    #[test]
    fn uneven_content_converges_on_the_tallest_column() {
        let mut tree = LayoutTree::new();
        let (mc, _) = columns(&mut tree, 2, 10.0, &[30.0, 30.0, 30.0]);
        let mut engine = LayoutEngine::new(tree);
        let result = engine.layout(mc, &area(210.0, 500.0)).unwrap();
        assert!((result.occupied_area.unwrap().bbox.height - 60.0).abs() < 0.01);
        assert!(engine.diagnostics().is_empty());
    }

    #[test]
    fn balancing_stops_at_the_probe_cap() {
        let mut tree = LayoutTree::new();
        let (mc, _) = columns(&mut tree, 2, 0.0, &[30.0, 30.0, 30.0]);
        let mut engine = LayoutEngine::new(tree).with_config(LayoutConfig {
            max_balancing_iterations: 1,
            ..Default::default()
        });
        let result = engine.layout(mc, &area(200.0, 500.0)).unwrap();
        assert!(result.is_full());
        assert_eq!(
            engine.diagnostics(),
            &[Diagnostic::BalancingLimitReached {
                node: mc,
                iterations: 1
            }]
        );
    }

    #[test]
    fn columns_full_to_the_bottom_carry_the_rest_over() {
        let mut tree = LayoutTree::new();
        let (mc, kids) = columns(&mut tree, 2, 0.0, &[20.0; 6]);
        let mut engine = LayoutEngine::new(tree);
        let result = engine.layout(mc, &area(100.0, 50.0)).unwrap();
        assert!(result.is_partial());
        let split = engine.tree().children(result.split_renderer.unwrap()).unwrap().to_vec();
        let overflow = engine.tree().children(result.overflow_renderer.unwrap()).unwrap().to_vec();
        assert_eq!(split, kids[..4].to_vec());
        assert_eq!(overflow, kids[4..].to_vec());
    }

    #[test]
    fn child_wider_than_a_column_is_nothing() {
        let mut tree = LayoutTree::new();
        let (mc, _) = columns(&mut tree, 2, 0.0, &[10.0]);
        let wide = tree.add(
            RendererKind::Block,
            Style {
                width: Some(Dimension::Pt(80.0)),
                ..Default::default()
            },
        );
        tree.append_child(mc, wide).unwrap();
        let mut engine = LayoutEngine::new(tree);
        let result = engine.layout(mc, &area(100.0, 100.0)).unwrap();
        assert_eq!(result.cause_of_nothing, Some(wide));
    }

    #[test]
    fn metrics_multiply_by_the_column_count() {
        let mut tree = LayoutTree::new();
        let (mc, _) = columns(&mut tree, 2, 10.0, &[]);
        let p = tree.add(RendererKind::Paragraph, Style::default());
        let run = tree.add_text(
            "aa bbbb",
            Style {
                font_size: Some(10.0),
                ..Default::default()
            },
        );
        tree.append_child(p, run).unwrap();
        tree.append_child(mc, p).unwrap();
        let mut engine = LayoutEngine::new(tree);
        let m = engine.min_max_width(mc).unwrap();
        assert!((m.min_width - 50.0).abs() < 0.01);
        assert!((m.max_width - 80.0).abs() < 0.01);
    }
}

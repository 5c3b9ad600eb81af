//! Box metrics: the narrowest width a box can be wrapped into and the width
//! it takes without any wrapping, independent of the space it will get.

use crate::error::LayoutError;
use crate::geometry::rotated_size;
use crate::layout::{LayoutEngine, NodeId, RendererKind};
use crate::style::Dimension;

/// Intrinsic widths of a box, margin box included.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MinMaxWidth {
    pub min_width: f64,
    pub max_width: f64,
    /// Content contribution before the box's own edges and constraints.
    pub children_min_width: f64,
    pub children_max_width: f64,
}

impl LayoutEngine {
    /// Min/max width of `id`, computed once per record.
    pub fn min_max_width(&mut self, id: NodeId) -> Result<MinMaxWidth, LayoutError> {
        if let Some(cached) = self.tree.get(id)?.min_max {
            return Ok(cached);
        }
        let metrics = self.compute_min_max(id)?;
        self.tree.get_mut(id)?.min_max = Some(metrics);
        Ok(metrics)
    }

    fn compute_min_max(&mut self, id: NodeId) -> Result<MinMaxWidth, LayoutError> {
        let record = self.tree.get(id)?;
        let kind = record.kind.clone();
        let declared_width = match record.style.width {
            Some(Dimension::Pt(w)) => Some(w),
            _ => None,
        };
        let style = record.style.resolve(0.0, None);
        let children = record.children.clone();
        let bp = style.border_padding().horizontal();

        let (children_min, children_max) = match &kind {
            RendererKind::Text => self.inline_min_max(&[id])?,
            RendererKind::Paragraph => self.inline_min_max(&children)?,
            RendererKind::Image { .. } => {
                let (width, _) = self.image_border_size(id, 0.0)?;
                (width - bp, width - bp)
            }
            RendererKind::Flex => self.flex_min_max(&children, &style)?,
            RendererKind::Grid { .. } => self.grid_min_max(id, &style)?,
            RendererKind::Table { .. } => self.table_min_max(id)?,
            RendererKind::MultiColumn => self.multicol_min_max(&children, &style)?,
            RendererKind::AreaBreak => (0.0, 0.0),
            RendererKind::Block | RendererKind::TableCell { .. } | RendererKind::TableRow { .. } => {
                let mut bounds = (0.0_f64, 0.0_f64);
                for child in children {
                    let m = self.min_max_width(child)?;
                    bounds.0 = bounds.0.max(m.min_width);
                    bounds.1 = bounds.1.max(m.max_width);
                }
                bounds
            }
        };

        let (mut min, mut max) = match declared_width {
            // A declared width wins unless unbreakable content is wider.
            Some(width) => {
                let width = style.clamp_width(width);
                (width.max(children_min + bp), width.max(children_min + bp))
            }
            None => (
                style.clamp_width(children_min + bp),
                style.clamp_width(children_max + bp),
            ),
        };
        max = max.max(min);

        if style.rotation_angle != 0.0 {
            let height = self.measure_height(id, max + style.margin.horizontal())? - style.margin.vertical();
            let (rotated, _) = rotated_size(max, height.max(0.0), style.rotation_angle);
            min = rotated;
            max = rotated;
        }

        let margin = style.margin.horizontal();
        Ok(MinMaxWidth {
            min_width: (min + margin).max(0.0),
            max_width: (max + margin).max(min + margin).max(0.0),
            children_min_width: children_min,
            children_max_width: children_max.max(children_min),
        })
    }
}

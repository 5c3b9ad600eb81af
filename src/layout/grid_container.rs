//! # Grid Container
//!
//! Places items with [`crate::layout::grid::place_items`], sizes the column
//! tracks against the width offered and the rows against the items' content,
//! then lays every item out in its cell. A grid breaks between areas only at
//! row boundaries that no item crosses; the items carried over keep their
//! resolved cells, moved up by the rows already placed.

use crate::error::{Diagnostic, LayoutError};
use crate::geometry::Rectangle;
use crate::layout::block::BoxFrame;
use crate::layout::grid::{
    place_items, resolve_tracks, span_size, track_offset, AxisPlacement, Grid, GridCell,
    GridItemRequest,
};
use crate::layout::{LayoutContext, LayoutEngine, LayoutResult, NodeId, RendererKind};
use crate::style::{GridTrackSize, ResolvedStyle};

/// Sized tracks and item cells of one grid pass.
#[derive(Debug, Clone)]
struct GridPlan {
    grid: Grid,
    columns: Vec<f64>,
    rows: Vec<f64>,
}

impl GridPlan {
    fn cell_rect(&self, origin: Rectangle, cell: &GridCell, column_gap: f64, row_gap: f64) -> Rectangle {
        Rectangle::new(
            origin.x + track_offset(cell.column_start, &self.columns, column_gap),
            origin.y + track_offset(cell.row_start, &self.rows, row_gap),
            span_size(cell.column_start, cell.column_end, &self.columns, column_gap),
            span_size(cell.row_start, cell.row_end, &self.rows, row_gap),
        )
    }

    /// Height of rows `[0, count)` including the gaps between them.
    fn rows_height(&self, count: usize, row_gap: f64) -> f64 {
        span_size(0, count, &self.rows, row_gap)
    }

    /// Whether a cut before row `k` leaves every item whole.
    fn is_row_boundary(&self, k: usize) -> bool {
        self.grid
            .placements()
            .iter()
            .all(|(_, cell)| cell.row_end <= k || cell.row_start >= k)
    }
}

impl LayoutEngine {
    /// Placement of the items of grid `id`, without sizing anything.
    pub fn grid_placement(&mut self, id: NodeId) -> Result<Grid, LayoutError> {
        let record = self.tree.get(id)?;
        let style = record.style.resolve(0.0, None);
        let template = self.column_template(id, &style)?;
        let children = record.children.clone();
        let requests = self.grid_requests(&children)?;
        Ok(place_items(
            &requests,
            style.row_count.unwrap_or(0) as usize,
            template.len(),
            style.grid_auto_flow,
        ))
    }

    pub(crate) fn layout_grid(
        &mut self,
        id: NodeId,
        ctx: &LayoutContext,
    ) -> Result<LayoutResult, LayoutError> {
        let Some(frame) = self.open_box(id, ctx)? else {
            return Ok(LayoutResult::nothing(id));
        };
        let plan = self.plan_grid(id, &frame)?;
        let style = &frame.style;
        let (row_gap, column_gap) = (style.row_gap, style.column_gap);
        let content = frame.content;
        let eps = self.config.epsilon;
        let row_count = plan.rows.len();

        let fitting = (0..=row_count)
            .rev()
            .find(|&k| plan.rows_height(k, row_gap) <= content.height + eps)
            .unwrap_or(0);
        let cut = if fitting == row_count || frame.fixed_height.is_some() {
            row_count
        } else {
            match (1..=fitting).rev().find(|&k| plan.is_row_boundary(k)) {
                Some(k) => k,
                None if ctx.forced_placement => (1..=row_count)
                    .find(|&k| plan.is_row_boundary(k))
                    .unwrap_or(row_count),
                None => {
                    let cause = plan.grid.get(0, 0).filter(|_| !style.keep_together).unwrap_or(id);
                    return Ok(LayoutResult::nothing(cause));
                }
            }
        };

        let mut placed = Vec::new();
        let mut carried = Vec::new();
        for &(item, cell) in plan.grid.placements() {
            if cell.row_end > cut {
                carried.push((item, cell));
                continue;
            }
            let rect = plan.cell_rect(content, &cell, column_gap, row_gap);
            self.place_grid_item(ctx, item, rect)?;
            placed.push(item);
        }

        let content_height = plan.rows_height(cut, row_gap);
        if carried.is_empty() {
            return self.close_full(id, ctx, &frame, content_height);
        }
        log::debug!("grid {id}: cut before row {cut} of {row_count}");

        let children = self.tree.children(id)?.to_vec();
        let in_order = |set: &[NodeId]| -> Vec<NodeId> {
            children.iter().copied().filter(|c| set.contains(c)).collect()
        };
        let split_children = in_order(&placed);
        let carried_ids: Vec<NodeId> = carried.iter().map(|(item, _)| *item).collect();
        let overflow_children = in_order(&carried_ids);
        for (item, cell) in carried {
            self.tree.get_mut(item)?.grid_area = Some(cell.shifted_up(cut));
        }
        self.split_box(id, ctx, &frame, content_height, split_children, overflow_children)
    }

    /// Min/max content width of a grid: column tracks side by side.
    pub(crate) fn grid_min_max(
        &mut self,
        id: NodeId,
        style: &ResolvedStyle,
    ) -> Result<(f64, f64), LayoutError> {
        let grid = self.grid_placement(id)?;
        let mut template = self.column_template(id, style)?;
        template.resize(grid.columns().max(template.len()), GridTrackSize::Auto);

        let mut mins = vec![0.0_f64; template.len()];
        let mut maxes = vec![0.0_f64; template.len()];
        let mut spanning = Vec::new();
        for &(item, cell) in grid.placements() {
            let metrics = self.min_max_width(item)?;
            if cell.column_span() == 1 {
                mins[cell.column_start] = mins[cell.column_start].max(metrics.min_width);
                maxes[cell.column_start] = maxes[cell.column_start].max(metrics.max_width);
            } else {
                spanning.push((cell, metrics));
            }
        }
        // Spanning items spread what their columns lack evenly.
        let gap = style.column_gap;
        for (cell, metrics) in spanning {
            let range = cell.column_start..cell.column_end;
            let span = cell.column_span() as f64;
            let inner_gaps = gap * (span - 1.0);
            let min_lack = metrics.min_width - inner_gaps - mins[range.clone()].iter().sum::<f64>();
            let max_lack = metrics.max_width - inner_gaps - maxes[range.clone()].iter().sum::<f64>();
            for c in range {
                mins[c] += min_lack.max(0.0) / span;
                maxes[c] += max_lack.max(0.0) / span;
            }
        }

        let mut total = (0.0, 0.0);
        for (i, track) in template.iter().enumerate() {
            let (min, max) = match track {
                GridTrackSize::Pt(v) => (*v, *v),
                _ => (mins[i], maxes[i].max(mins[i])),
            };
            total.0 += min;
            total.1 += max;
        }
        let gaps = gap * template.len().saturating_sub(1) as f64;
        Ok((total.0 + gaps, total.1 + gaps))
    }

    fn column_template(
        &self,
        id: NodeId,
        style: &ResolvedStyle,
    ) -> Result<Vec<GridTrackSize>, LayoutError> {
        let RendererKind::Grid { columns } = &self.tree.get(id)?.kind else {
            return Err(LayoutError::KindMismatch {
                expected: "grid",
                found: self.tree.get(id)?.kind.name(),
            });
        };
        if !columns.is_empty() {
            return Ok(columns.clone());
        }
        let count = style.column_count.unwrap_or(1).max(1) as usize;
        Ok(vec![GridTrackSize::Fr(1.0); count])
    }

    fn grid_requests(&mut self, children: &[NodeId]) -> Result<Vec<GridItemRequest>, LayoutError> {
        let max_lines = self.config.max_grid_lines;
        let mut requests = Vec::with_capacity(children.len());
        for &child in children {
            let record = self.tree.get(child)?;
            if record.kind == RendererKind::AreaBreak {
                continue;
            }
            let (row, column) = match record.grid_area {
                Some(cell) => (
                    explicit_axis(cell.row_start, cell.row_end),
                    explicit_axis(cell.column_start, cell.column_end),
                ),
                None => {
                    let style = &record.style;
                    let (row, row_cut) = AxisPlacement {
                        start: style.grid_row_start,
                        end: style.grid_row_end,
                        span: style.grid_row_span,
                    }
                    .clamped(max_lines);
                    let (column, column_cut) = AxisPlacement {
                        start: style.grid_column_start,
                        end: style.grid_column_end,
                        span: style.grid_column_span,
                    }
                    .clamped(max_lines);
                    if row_cut || column_cut {
                        self.diagnose(Diagnostic::GridLineClamped {
                            node: child,
                            max_lines,
                        });
                    }
                    (row, column)
                }
            };
            requests.push(GridItemRequest {
                item: child,
                row,
                column,
            });
        }
        Ok(requests)
    }

    fn plan_grid(&mut self, id: NodeId, frame: &BoxFrame) -> Result<GridPlan, LayoutError> {
        let style = &frame.style;
        let grid = self.grid_placement(id)?;
        let mut template = self.column_template(id, style)?;
        template.resize(grid.columns().max(template.len()), GridTrackSize::Auto);

        // Content size of each column: widest single-column item.
        let mut content_sizes = vec![0.0_f64; template.len()];
        for &(item, cell) in grid.placements() {
            if cell.column_span() == 1 {
                let metrics = self.min_max_width(item)?;
                let size = &mut content_sizes[cell.column_start];
                *size = size.max(metrics.max_width);
            }
        }
        let columns = resolve_tracks(&template, frame.content.width, style.column_gap, &content_sizes);

        let mut rows = vec![0.0_f64; grid.rows()];
        let mut spanning = Vec::new();
        for &(item, cell) in grid.placements() {
            let track_width = span_size(cell.column_start, cell.column_end, &columns, style.column_gap);
            let metrics = self.min_max_width(item)?;
            if metrics.min_width > track_width + self.config.epsilon {
                self.diagnose(Diagnostic::ItemWiderThanTrack {
                    node: item,
                    min_width: metrics.min_width,
                    track_width,
                });
            }
            let width = self.grid_item_width(item, track_width)?;
            let height = self.measure(item, track_width, Some(width))?;
            if cell.row_span() == 1 {
                rows[cell.row_start] = rows[cell.row_start].max(height);
            } else {
                spanning.push((cell, height));
            }
        }
        for (cell, height) in spanning {
            let spanned = span_size(cell.row_start, cell.row_end, &rows, style.row_gap);
            if height > spanned {
                rows[cell.row_end - 1] += height - spanned;
            }
        }
        log::trace!("grid {id}: columns {columns:?}, rows {rows:?}");

        Ok(GridPlan { grid, columns, rows })
    }

    fn place_grid_item(
        &mut self,
        ctx: &LayoutContext,
        item: NodeId,
        cell: Rectangle,
    ) -> Result<LayoutResult, LayoutError> {
        let style = self.resolve_style(item, cell.width, Some(cell.height))?;
        let margin = style.margin;
        let width = self.grid_item_width(item, cell.width)?;
        let height = style
            .height
            .is_auto()
            .then(|| (cell.height - margin.vertical()).max(0.0));
        let slot = ctx
            .child(cell)
            .forced(true)
            .with_definite_size(Some(width), height);
        self.layout(item, &slot)
    }
}

impl LayoutEngine {
    /// Border-box width of an item in a track span. An item that cannot
    /// shrink to the span keeps its minimum and overflows it.
    fn grid_item_width(&mut self, item: NodeId, track_width: f64) -> Result<f64, LayoutError> {
        let metrics = self.min_max_width(item)?;
        let margin = self.tree.get(item)?.style.margin.unwrap_or_default().horizontal();
        Ok((track_width - margin).max(metrics.min_width - margin).max(0.0))
    }
}

fn explicit_axis(start: usize, end: usize) -> AxisPlacement {
    AxisPlacement {
        start: Some(start as i32 + 1),
        end: Some(end as i32 + 1),
        span: None,
    }
}

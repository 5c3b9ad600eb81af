//! # Table Layout
//!
//! Rows are stacked top to bottom on columns sized once per table by
//! [`crate::layout::table_widths`]. Header rows repeat at the top of every
//! area the table reaches; each repetition is a deep copy so no renderer is
//! placed twice. Rows tied together by row-spanning cells move as one
//! group. A lone row that does not fit is split cell by cell.

use std::ops::Range;

use crate::error::{Diagnostic, LayoutError};
use crate::geometry::{LayoutArea, Rectangle};
use crate::layout::block::BoxFrame;
use crate::layout::grid::{span_size, track_offset};
use crate::layout::table_widths::{column_min_max, distribute_column_widths, CellWidthInfo};
use crate::layout::{LayoutContext, LayoutEngine, LayoutResult, LayoutStatus, NodeId, RendererKind};
use crate::model::ColumnWidth;
use crate::style::Dimension;

#[derive(Debug, Clone, Copy, PartialEq)]
struct CellSlot {
    cell: NodeId,
    column: usize,
    col_span: usize,
    row_span: usize,
}

#[derive(Debug, Clone, PartialEq)]
struct RowSlots {
    row: NodeId,
    cells: Vec<CellSlot>,
}

/// Rows with their cells resolved to columns.
#[derive(Debug, Clone, PartialEq)]
struct TableStructure {
    rows: Vec<RowSlots>,
    /// Leading header rows.
    header_count: usize,
}

impl TableStructure {
    /// Body row groups: consecutive rows no row-spanning cell reaches out of.
    fn body_groups(&self) -> Vec<Range<usize>> {
        let mut groups = Vec::new();
        let mut start = self.header_count;
        while start < self.rows.len() {
            let mut end = start + 1;
            let mut r = start;
            while r < end {
                for slot in &self.rows[r].cells {
                    end = end.max(r + slot.row_span);
                }
                r += 1;
            }
            let end = end.min(self.rows.len());
            groups.push(start..end);
            start = end;
        }
        groups
    }

    fn cell_infos(&self) -> impl Iterator<Item = &CellSlot> {
        self.rows.iter().flat_map(|r| r.cells.iter())
    }
}

struct TablePlan {
    structure: TableStructure,
    columns: Vec<f64>,
    heights: Vec<f64>,
}

impl LayoutEngine {
    pub(crate) fn layout_table(
        &mut self,
        id: NodeId,
        ctx: &LayoutContext,
    ) -> Result<LayoutResult, LayoutError> {
        let Some(frame) = self.open_box(id, ctx)? else {
            return Ok(LayoutResult::nothing(id));
        };
        let plan = self.plan_table(id, &frame)?;
        let structure = &plan.structure;
        let content = frame.content;
        let limit = content.bottom();
        let eps = self.config.epsilon;

        let header_height = span_size(0, structure.header_count, &plan.heights, 0.0);
        if header_height > content.height + eps && !ctx.forced_placement {
            return Ok(LayoutResult::nothing(id));
        }
        let mut y = content.y;
        self.place_table_rows(ctx, &plan, content, 0..structure.header_count, y)?;
        y += header_height;

        let groups = structure.body_groups();
        let mut placed_body = false;
        let mut cut = None;
        for (g, group) in groups.iter().enumerate() {
            let height = span_size(group.start, group.end, &plan.heights, 0.0);
            let forced = ctx.forced_placement && !placed_body;
            if y + height <= limit + eps || (forced && group.len() > 1) {
                self.place_table_rows(ctx, &plan, content, group.clone(), y)?;
                y += height;
                placed_body = true;
                continue;
            }
            if group.len() == 1 {
                let row = structure.rows[group.start].clone();
                match self.split_table_row(ctx, &plan, content, &row, y, forced)? {
                    RowSplit::Whole(height) => {
                        y += height;
                        placed_body = true;
                        continue;
                    }
                    RowSplit::Cut { split, overflow, height } => {
                        y += height;
                        cut = Some((g, Some((split, overflow))));
                        break;
                    }
                    RowSplit::Nothing => {}
                }
            }
            if !placed_body {
                let cause = if frame.style.keep_together {
                    id
                } else {
                    structure.rows[group.start].row
                };
                return Ok(LayoutResult::nothing(cause));
            }
            cut = Some((g, None));
            break;
        }

        let content_height = y - content.y;
        let Some((g, split_row)) = cut else {
            return self.close_full(id, ctx, &frame, content_height);
        };

        let row_ids = |range: Range<usize>| -> Vec<NodeId> {
            structure.rows[range].iter().map(|r| r.row).collect()
        };
        let headers = row_ids(0..structure.header_count);
        let remaining_start = match split_row {
            Some(_) => groups[g].end,
            None => groups[g].start,
        };
        let mut split_children = row_ids(0..groups[g].start);
        let mut overflow_children = Vec::with_capacity(structure.rows.len());
        for header in &headers {
            overflow_children.push(self.tree.deep_clone(*header)?);
        }
        if let Some((split, overflow)) = split_row {
            split_children.push(split);
            overflow_children.push(overflow);
        }
        overflow_children.extend(row_ids(remaining_start..structure.rows.len()));
        log::debug!(
            "table {id}: {} body rows carried over with {} repeated headers",
            structure.rows.len() - remaining_start,
            headers.len()
        );

        let result = self.split_box(id, ctx, &frame, content_height, split_children, overflow_children)?;
        if let Some(overflow) = result.overflow_renderer {
            // Later areas keep this area's columns.
            self.tree.get_mut(overflow)?.kind = RendererKind::Table {
                columns: plan.columns.iter().map(|&w| ColumnWidth::Pt(w)).collect(),
            };
        }
        Ok(result)
    }

    /// Min/max width of a table: its columns side by side.
    pub(crate) fn table_min_max(&mut self, id: NodeId) -> Result<(f64, f64), LayoutError> {
        let structure = self.table_structure(id)?;
        let declared = self.declared_columns(id)?;
        let cells = self.cell_width_infos(&structure)?;
        let (mins, maxes) = column_min_max(&declared, &cells);
        Ok((mins.iter().sum(), maxes.iter().sum()))
    }

    fn declared_columns(&self, id: NodeId) -> Result<Vec<ColumnWidth>, LayoutError> {
        match &self.tree.get(id)?.kind {
            RendererKind::Table { columns } => Ok(columns.clone()),
            other => Err(LayoutError::KindMismatch {
                expected: "table",
                found: other.name(),
            }),
        }
    }

    fn table_structure(&self, id: NodeId) -> Result<TableStructure, LayoutError> {
        let row_ids = self.tree.children(id)?;
        let mut rows = Vec::with_capacity(row_ids.len());
        let mut header_count = 0;
        let mut in_header = true;
        for (r, &row) in row_ids.iter().enumerate() {
            match self.tree.kind(row)? {
                RendererKind::TableRow { is_header } => {
                    in_header &= *is_header;
                    if in_header {
                        header_count = r + 1;
                    }
                }
                other => {
                    return Err(LayoutError::KindMismatch {
                        expected: "table row",
                        found: other.name(),
                    })
                }
            }
            rows.push(row);
        }

        // Columns taken by row-spanning cells from rows above.
        let mut occupied: Vec<Vec<bool>> = vec![Vec::new(); rows.len()];
        let mut slots = Vec::with_capacity(rows.len());
        for (r, &row) in rows.iter().enumerate() {
            let section_end = if r < header_count { header_count } else { rows.len() };
            let mut cells = Vec::new();
            let mut column = 0;
            for &cell in self.tree.children(row)? {
                let (col_span, row_span) = match self.tree.kind(cell)? {
                    RendererKind::TableCell { col_span, row_span } => (*col_span as usize, *row_span as usize),
                    other => {
                        return Err(LayoutError::KindMismatch {
                            expected: "table cell",
                            found: other.name(),
                        })
                    }
                };
                while occupied[r].get(column).copied().unwrap_or(false) {
                    column += 1;
                }
                let row_span = row_span.max(1).min(section_end - r);
                let col_span = col_span.max(1);
                for taken in &mut occupied[r..r + row_span] {
                    if taken.len() < column + col_span {
                        taken.resize(column + col_span, false);
                    }
                    taken[column..column + col_span].fill(true);
                }
                cells.push(CellSlot {
                    cell,
                    column,
                    col_span,
                    row_span,
                });
                column += col_span;
            }
            slots.push(RowSlots { row, cells });
        }
        Ok(TableStructure {
            rows: slots,
            header_count,
        })
    }

    fn cell_width_infos(&mut self, structure: &TableStructure) -> Result<Vec<CellWidthInfo>, LayoutError> {
        let slots: Vec<CellSlot> = structure.cell_infos().copied().collect();
        let mut infos = Vec::with_capacity(slots.len());
        for slot in slots {
            let metrics = self.min_max_width(slot.cell)?;
            let declared = match self.tree.get(slot.cell)?.style.width {
                Some(Dimension::Pt(w)) => Some(ColumnWidth::Pt(w)),
                Some(Dimension::Percent(p)) => Some(ColumnWidth::Percent(p)),
                _ => None,
            };
            infos.push(CellWidthInfo {
                column: slot.column,
                col_span: slot.col_span,
                min_width: metrics.min_width,
                max_width: metrics.max_width,
                declared,
            });
        }
        Ok(infos)
    }

    fn plan_table(&mut self, id: NodeId, frame: &BoxFrame) -> Result<TablePlan, LayoutError> {
        let structure = self.table_structure(id)?;
        let declared = self.declared_columns(id)?;
        let cells = self.cell_width_infos(&structure)?;
        let available = frame.content.width;
        let distribution = distribute_column_widths(&declared, &cells, available);
        if let Some(total_percent) = distribution.percent_overflow {
            self.diagnose(Diagnostic::PercentOverflow {
                node: id,
                total_percent,
            });
        }
        if let Some(required) = distribution.min_overflow {
            self.diagnose(Diagnostic::ColumnsOverflowTable {
                node: id,
                required,
                available,
            });
        }
        let columns = distribution.widths;

        let mut heights = vec![0.0_f64; structure.rows.len()];
        let mut spanning = Vec::new();
        for (r, row) in structure.rows.iter().enumerate() {
            let row_style = self.resolve_style(row.row, available, None)?;
            heights[r] = row_style.height.fixed().unwrap_or(0.0).max(row_style.min_height);
            for slot in &row.cells {
                let width = span_size(slot.column, slot.column + slot.col_span, &columns, 0.0);
                let height = self.measure(slot.cell, width, Some(width))?;
                if slot.row_span == 1 {
                    heights[r] = heights[r].max(height);
                } else {
                    spanning.push((r..r + slot.row_span, height));
                }
            }
        }
        for (rows, height) in spanning {
            let spanned = span_size(rows.start, rows.end, &heights, 0.0);
            if height > spanned {
                heights[rows.end - 1] += height - spanned;
            }
        }
        log::trace!("table {id}: columns {columns:?}, rows {heights:?}");

        Ok(TablePlan {
            structure,
            columns,
            heights,
        })
    }

    fn place_table_rows(
        &mut self,
        ctx: &LayoutContext,
        plan: &TablePlan,
        content: Rectangle,
        rows: Range<usize>,
        top: f64,
    ) -> Result<(), LayoutError> {
        let table_width: f64 = plan.columns.iter().sum();
        let mut y = top;
        for r in rows {
            let row = &plan.structure.rows[r];
            let height = plan.heights[r];
            self.place_row_box(ctx, row.row, Rectangle::new(content.x, y, table_width, height))?;
            for slot in &row.cells {
                let rect = Rectangle::new(
                    content.x + track_offset(slot.column, &plan.columns, 0.0),
                    y,
                    span_size(slot.column, slot.column + slot.col_span, &plan.columns, 0.0),
                    span_size(r, r + slot.row_span, &plan.heights, 0.0),
                );
                self.place_cell(ctx, slot.cell, rect)?;
            }
            y += height;
        }
        Ok(())
    }

    /// Rows are not laid out on their own; they only record their box.
    fn place_row_box(&mut self, ctx: &LayoutContext, row: NodeId, rect: Rectangle) -> Result<(), LayoutError> {
        let style = self.resolve_style(row, rect.width, None)?;
        let record = self.tree.get_mut(row)?;
        record.reset_placement();
        record.resolved = Some(style);
        record.occupied_area = Some(LayoutArea::new(ctx.area.area_index, rect));
        record.border_box = Some(rect);
        Ok(())
    }

    fn place_cell(&mut self, ctx: &LayoutContext, cell: NodeId, rect: Rectangle) -> Result<LayoutResult, LayoutError> {
        let slot = ctx
            .child(rect)
            .forced(true)
            .with_definite_size(Some(rect.width), Some(rect.height));
        self.layout(cell, &slot)
    }

    /// A copy of `cell` without content, standing in for it in the part of
    /// a split row where it has nothing left to show.
    fn empty_cell(&mut self, cell: NodeId) -> Result<NodeId, LayoutError> {
        let empty = self.tree.clone_with_children(cell, Vec::new())?;
        self.tree.get_mut(empty)?.reset_placement();
        Ok(empty)
    }

    /// Lay the cells of a row that does not fit into what is left of the
    /// area, each cut on its own.
    fn split_table_row(
        &mut self,
        ctx: &LayoutContext,
        plan: &TablePlan,
        content: Rectangle,
        row: &RowSlots,
        top: f64,
        forced: bool,
    ) -> Result<RowSplit, LayoutError> {
        if row.cells.is_empty() {
            return Ok(RowSplit::Nothing);
        }
        let available = (content.bottom() - top).max(0.0);
        let table_width: f64 = plan.columns.iter().sum();

        let mut outcomes = Vec::with_capacity(row.cells.len());
        for slot in &row.cells {
            let rect = Rectangle::new(
                content.x + track_offset(slot.column, &plan.columns, 0.0),
                top,
                span_size(slot.column, slot.column + slot.col_span, &plan.columns, 0.0),
                available,
            );
            let cell_ctx = ctx
                .child(rect)
                .forced(forced)
                .with_definite_size(Some(rect.width), None);
            let result = self.layout(slot.cell, &cell_ctx)?;
            outcomes.push((slot.cell, rect, result));
        }
        if outcomes.iter().all(|(_, _, result)| result.is_nothing()) {
            return Ok(RowSplit::Nothing);
        }

        let height = outcomes
            .iter()
            .filter_map(|(_, _, result)| result.bottom())
            .fold(top, f64::max)
            - top;
        if outcomes.iter().all(|(_, _, result)| result.is_full()) {
            self.place_row_box(ctx, row.row, Rectangle::new(content.x, top, table_width, height))?;
            for (cell, rect, _) in outcomes {
                self.place_cell(ctx, cell, Rectangle { height, ..rect })?;
            }
            return Ok(RowSplit::Whole(height));
        }

        let mut split_cells = Vec::with_capacity(outcomes.len());
        let mut overflow_cells = Vec::with_capacity(outcomes.len());
        for (cell, rect, result) in outcomes {
            let slot = Rectangle { height, ..rect };
            match (result.status, result.split_renderer, result.overflow_renderer) {
                (LayoutStatus::Partial, Some(split), Some(overflow)) => {
                    split_cells.push(split);
                    overflow_cells.push(overflow);
                }
                (LayoutStatus::Full, ..) => {
                    self.place_cell(ctx, cell, slot)?;
                    split_cells.push(cell);
                    overflow_cells.push(self.empty_cell(cell)?);
                }
                _ => {
                    let empty = self.empty_cell(cell)?;
                    self.place_cell(ctx, empty, slot)?;
                    split_cells.push(empty);
                    overflow_cells.push(cell);
                }
            }
        }
        let split = self.tree.clone_with_children(row.row, split_cells)?;
        self.place_row_box(ctx, split, Rectangle::new(content.x, top, table_width, height))?;
        let overflow = self.tree.clone_with_children(row.row, overflow_cells)?;
        self.tree.get_mut(overflow)?.reset_placement();
        Ok(RowSplit::Cut {
            split,
            overflow,
            height,
        })
    }
}

enum RowSplit {
    /// Every cell fit after all.
    Whole(f64),
    Cut {
        split: NodeId,
        overflow: NodeId,
        height: f64,
    },
    Nothing,
}

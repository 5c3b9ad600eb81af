//! # Grid Placement
//!
//! The pure half of grid layout:
//! - Normalization of authored (1-based, possibly reversed) line numbers
//!   into 0-based half-open [`GridCell`]s
//! - Placement into an occupancy [`Grid`] with explicit positions, sparse
//!   or dense auto-placement, in row-major or column-major flow
//! - Fixed (pt), fractional (fr), auto and minmax track sizing

use crate::layout::NodeId;
use crate::style::{GridAutoFlow, GridTrackSize};

/// Area covered by an item: rows `[row_start, row_end)` × columns
/// `[column_start, column_end)`, 0-based. `start < end` on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridCell {
    pub row_start: usize,
    pub row_end: usize,
    pub column_start: usize,
    pub column_end: usize,
}

impl GridCell {
    pub fn new(row_start: usize, row_end: usize, column_start: usize, column_end: usize) -> Self {
        Self {
            row_start,
            row_end: row_end.max(row_start + 1),
            column_start,
            column_end: column_end.max(column_start + 1),
        }
    }

    pub fn row_span(&self) -> usize {
        self.row_end - self.row_start
    }

    pub fn column_span(&self) -> usize {
        self.column_end - self.column_start
    }

    /// Same area moved `rows` rows up.
    pub fn shifted_up(&self, rows: usize) -> Self {
        Self {
            row_start: self.row_start.saturating_sub(rows),
            row_end: self.row_end.saturating_sub(rows).max(1),
            ..*self
        }
    }

    fn transposed(&self) -> Self {
        Self {
            row_start: self.column_start,
            row_end: self.column_end,
            column_start: self.row_start,
            column_end: self.row_end,
        }
    }
}

/// Authored placement along one axis, as 1-based grid lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AxisPlacement {
    pub start: Option<i32>,
    pub end: Option<i32>,
    pub span: Option<u32>,
}

impl AxisPlacement {
    /// 0-based start (if the axis is explicit) and span.
    ///
    /// Reversed lines are swapped; a missing bound is derived from the span
    /// (1 unless authored).
    pub fn normalize(&self) -> (Option<usize>, usize) {
        let span = i64::from(self.span.unwrap_or(1).max(1));
        let (start, end) = match (self.start.map(i64::from), self.end.map(i64::from)) {
            (Some(s), Some(e)) if s > e => (e, s),
            (Some(s), Some(e)) if s == e => (s, s + 1),
            (Some(s), Some(e)) => (s, e),
            (Some(s), None) => (s, s + span),
            (None, Some(e)) => ((e - span).max(1), e.max(2)),
            (None, None) => return (None, span as usize),
        };
        let start = start.max(1);
        let end = end.max(start + 1);
        (Some((start - 1) as usize), (end - start) as usize)
    }

    /// This placement with every line kept within `max_lines + 1` and the
    /// span within `max_lines`, and whether anything had to be cut.
    pub fn clamped(&self, max_lines: u32) -> (Self, bool) {
        let max_lines = max_lines.max(1);
        let limit = i32::try_from(max_lines).unwrap_or(i32::MAX - 1) + 1;
        let clamp_line = |line: Option<i32>| line.map(|l| l.min(limit));
        let clamped = Self {
            start: clamp_line(self.start),
            end: clamp_line(self.end),
            span: self.span.map(|s| s.min(max_lines)),
        };
        (clamped, clamped != *self)
    }
}

/// A placement request for one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridItemRequest {
    pub item: NodeId,
    pub row: AxisPlacement,
    pub column: AxisPlacement,
}

/// Traversal order of a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridOrder {
    RowMajor,
    ColumnMajor,
}

/// Occupancy of a grid, `[row][column]`. A spanning item appears in every
/// slot it covers.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    cells: Vec<Vec<Option<NodeId>>>,
    order: GridOrder,
    placements: Vec<(NodeId, GridCell)>,
}

impl Grid {
    fn new(rows: usize, columns: usize, order: GridOrder) -> Self {
        Self {
            cells: vec![vec![None; columns]; rows],
            order,
            placements: Vec::new(),
        }
    }

    pub fn rows(&self) -> usize {
        self.cells.len()
    }

    pub fn columns(&self) -> usize {
        self.cells.first().map(Vec::len).unwrap_or(0)
    }

    pub fn order(&self) -> GridOrder {
        self.order
    }

    pub fn get(&self, row: usize, column: usize) -> Option<NodeId> {
        self.cells.get(row).and_then(|r| r.get(column)).copied().flatten()
    }

    /// Placements in authoring order.
    pub fn placements(&self) -> &[(NodeId, GridCell)] {
        &self.placements
    }

    /// Distinct items in traversal order, de-duplicated by identity.
    pub fn unique_items(&self) -> Vec<NodeId> {
        let mut seen = Vec::new();
        let (major, minor) = match self.order {
            GridOrder::RowMajor => (self.rows(), self.columns()),
            GridOrder::ColumnMajor => (self.columns(), self.rows()),
        };
        for a in 0..major {
            for b in 0..minor {
                let (r, c) = match self.order {
                    GridOrder::RowMajor => (a, b),
                    GridOrder::ColumnMajor => (b, a),
                };
                if let Some(item) = self.get(r, c) {
                    if !seen.contains(&item) {
                        seen.push(item);
                    }
                }
            }
        }
        seen
    }

    fn ensure(&mut self, rows: usize, columns: usize) {
        let columns = columns.max(self.columns());
        for row in &mut self.cells {
            row.resize(columns, None);
        }
        while self.cells.len() < rows {
            self.cells.push(vec![None; columns]);
        }
    }

    fn is_free(&self, cell: &GridCell) -> bool {
        (cell.row_start..cell.row_end).all(|r| {
            (cell.column_start..cell.column_end).all(|c| self.get(r, c).is_none())
        })
    }

    fn occupy(&mut self, item: NodeId, cell: GridCell) {
        self.ensure(cell.row_end, cell.column_end);
        for r in cell.row_start..cell.row_end {
            for c in cell.column_start..cell.column_end {
                self.cells[r][c] = Some(item);
            }
        }
        self.placements.push((item, cell));
    }

    fn transposed(self) -> Self {
        let rows = self.rows();
        let columns = self.columns();
        let mut cells = vec![vec![None; rows]; columns];
        for (r, row) in self.cells.iter().enumerate() {
            for (c, slot) in row.iter().enumerate() {
                cells[c][r] = *slot;
            }
        }
        Self {
            cells,
            order: self.order,
            placements: self
                .placements
                .into_iter()
                .map(|(item, cell)| (item, cell.transposed()))
                .collect(),
        }
    }
}

/// Place items into a grid of at least `rows × columns`.
///
/// Fully explicit items are placed first. The others are placed in authoring
/// order at the first position, in flow order, where their whole footprint is
/// free. Sparse packing never moves the cursor backwards; dense packing
/// restarts from the origin for every item. The grid grows along the flow's
/// major axis as needed.
pub fn place_items(
    requests: &[GridItemRequest],
    rows: usize,
    columns: usize,
    flow: GridAutoFlow,
) -> Grid {
    let column_flow = flow.is_column();
    let order = if column_flow {
        GridOrder::ColumnMajor
    } else {
        GridOrder::RowMajor
    };

    // Column flow is row flow on the transposed grid.
    let (major_count, minor_count) = if column_flow {
        (columns, rows)
    } else {
        (rows, columns)
    };
    let normalized: Vec<_> = requests
        .iter()
        .map(|r| {
            let (row, column) = if column_flow {
                (r.column.normalize(), r.row.normalize())
            } else {
                (r.row.normalize(), r.column.normalize())
            };
            (r.item, row, column)
        })
        .collect();

    let mut grid = Grid::new(major_count.max(1), minor_count.max(1), order);

    for &(item, (row, row_span), (column, column_span)) in &normalized {
        if let (Some(r), Some(c)) = (row, column) {
            grid.occupy(item, GridCell::new(r, r + row_span, c, c + column_span));
        }
    }

    let dense = flow.is_dense();
    let mut cursor = (0usize, 0usize);

    for &(item, (row, row_span), (column, column_span)) in &normalized {
        let cell = match (row, column) {
            (Some(_), Some(_)) => continue,
            (None, Some(c)) => {
                // Column locked; walk down the rows.
                let mut r = if dense {
                    0
                } else if c < cursor.1 {
                    cursor.0 + 1
                } else {
                    cursor.0
                };
                loop {
                    let cell = GridCell::new(r, r + row_span, c, c + column_span);
                    if grid.is_free(&cell) {
                        break cell;
                    }
                    r += 1;
                }
            }
            (Some(r), None) => {
                // Row locked; walk right, growing the row if nothing fits.
                let mut c = if !dense && cursor.0 == r { cursor.1 } else { 0 };
                loop {
                    let cell = GridCell::new(r, r + row_span, c, c + column_span);
                    if grid.is_free(&cell) {
                        break cell;
                    }
                    c += 1;
                }
            }
            (None, None) => {
                let width = grid.columns().max(column_span);
                grid.ensure(0, width);
                let (mut r, mut c) = if dense { (0, 0) } else { cursor };
                loop {
                    if c + column_span > width {
                        r += 1;
                        c = 0;
                        continue;
                    }
                    let cell = GridCell::new(r, r + row_span, c, c + column_span);
                    if grid.is_free(&cell) {
                        break cell;
                    }
                    c += 1;
                }
            }
        };
        grid.occupy(item, cell);
        if !dense {
            cursor = (cell.row_start, cell.column_end);
        }
    }

    if column_flow {
        grid.transposed()
    } else {
        grid
    }
}

/// Resolve track sizes to concrete widths/heights in points.
///
/// Algorithm:
/// 1. Fixed tracks → exact size
/// 2. Auto tracks → `content_sizes[i]` (intrinsic content size)
/// 3. Fr tracks → distribute remaining space proportionally
/// 4. MinMax → content size clamped between resolved min and max
pub fn resolve_tracks(
    template: &[GridTrackSize],
    available_space: f64,
    gap: f64,
    content_sizes: &[f64],
) -> Vec<f64> {
    if template.is_empty() {
        return vec![];
    }

    let total_gap = gap * (template.len() - 1) as f64;
    let space_after_gaps = (available_space - total_gap).max(0.0);

    let mut sizes = vec![0.0_f64; template.len()];
    let mut remaining = space_after_gaps;
    let mut total_fr = 0.0_f64;

    for (i, track) in template.iter().enumerate() {
        let content = content_sizes.get(i).copied().unwrap_or(0.0);
        match track {
            GridTrackSize::Pt(pts) => {
                sizes[i] = *pts;
                remaining -= pts;
            }
            GridTrackSize::Auto => {
                sizes[i] = content;
                remaining -= content;
            }
            GridTrackSize::Fr(fr) => {
                total_fr += fr;
            }
            GridTrackSize::MinMax(min, max) => {
                let min_val = resolve_single_track(min, 0.0);
                let max_val = resolve_single_track(max, space_after_gaps);
                let val = content.min(max_val).max(min_val);
                sizes[i] = val;
                remaining -= val;
            }
        }
    }

    remaining = remaining.max(0.0);
    if total_fr > 0.0 {
        let fr_unit = remaining / total_fr;
        for (i, track) in template.iter().enumerate() {
            if let GridTrackSize::Fr(fr) = track {
                sizes[i] = fr * fr_unit;
            }
        }
    }

    sizes
}

/// Resolve a single track size to a point value (for MinMax bounds).
fn resolve_single_track(track: &GridTrackSize, available: f64) -> f64 {
    match track {
        GridTrackSize::Pt(pts) => *pts,
        GridTrackSize::Fr(_) => available,
        GridTrackSize::Auto => 0.0,
        GridTrackSize::MinMax(min, _) => resolve_single_track(min, available),
    }
}

/// Offset of track `index` from the start of the first track.
pub fn track_offset(index: usize, sizes: &[f64], gap: f64) -> f64 {
    sizes.iter().take(index).map(|s| s + gap).sum()
}

/// Size of the tracks `[start, end)` including the gaps between them.
pub fn span_size(start: usize, end: usize, sizes: &[f64], gap: f64) -> f64 {
    let tracks = &sizes[start.min(sizes.len())..end.min(sizes.len())];
    tracks.iter().sum::<f64>() + gap * tracks.len().saturating_sub(1) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auto(item: usize) -> GridItemRequest {
        GridItemRequest {
            item: NodeId(item),
            row: AxisPlacement::default(),
            column: AxisPlacement::default(),
        }
    }

    fn columns(item: usize, start: i32, end: i32) -> GridItemRequest {
        GridItemRequest {
            column: AxisPlacement {
                start: Some(start),
                end: Some(end),
                span: None,
            },
            ..auto(item)
        }
    }

    fn span(item: usize, column_span: u32) -> GridItemRequest {
        GridItemRequest {
            column: AxisPlacement {
                span: Some(column_span),
                ..Default::default()
            },
            ..auto(item)
        }
    }

    #[test]
    fn normalize_swaps_reversed_lines() {
        let p = AxisPlacement {
            start: Some(4),
            end: Some(2),
            span: None,
        };
        assert_eq!(p.normalize(), (Some(1), 2));
    }

    #[test]
    fn normalize_derives_missing_bound() {
        let only_start = AxisPlacement {
            start: Some(3),
            ..Default::default()
        };
        assert_eq!(only_start.normalize(), (Some(2), 1));
        let only_end = AxisPlacement {
            end: Some(3),
            ..Default::default()
        };
        assert_eq!(only_end.normalize(), (Some(1), 1));
    }

    #[test]
    fn normalize_handles_extreme_lines() {
        let p = AxisPlacement {
            start: Some(i32::MAX),
            end: None,
            span: Some(2),
        };
        assert_eq!(p.normalize(), (Some(i32::MAX as usize - 1), 2));
        let q = AxisPlacement {
            start: None,
            end: Some(i32::MIN),
            span: Some(u32::MAX),
        };
        assert_eq!(q.normalize(), (Some(0), 1));
    }

    #[test]
    fn clamped_caps_lines_and_span() {
        let p = AxisPlacement {
            start: Some(1_000_000),
            end: None,
            span: Some(50),
        };
        let (clamped, cut) = p.clamped(10);
        assert!(cut);
        assert_eq!(
            clamped,
            AxisPlacement {
                start: Some(11),
                end: None,
                span: Some(10),
            }
        );
        assert_eq!(clamped.normalize(), (Some(10), 10));

        let small = AxisPlacement {
            start: Some(2),
            end: Some(4),
            span: None,
        };
        assert_eq!(small.clamped(10), (small, false));
    }

    #[test]
    fn spanning_item_fills_both_slots_and_pushes_next_row() {
        let grid = place_items(
            &[auto(1), columns(2, 2, 4), auto(3)],
            3,
            3,
            GridAutoFlow::Row,
        );
        assert_eq!(grid.get(0, 0), Some(NodeId(1)));
        assert_eq!(grid.get(0, 1), Some(NodeId(2)));
        assert_eq!(grid.get(0, 2), Some(NodeId(2)));
        assert_eq!(grid.get(1, 0), Some(NodeId(3)));
        assert_eq!(grid.unique_items().len(), 3);
    }

    #[test]
    fn sparse_leaves_holes_dense_fills_them() {
        let requests = [auto(1), span(2, 3), auto(3)];
        let sparse = place_items(&requests, 1, 3, GridAutoFlow::Row);
        // 1 at (0,0); the 3-wide item wraps to row 1; 3 follows it on row 2.
        assert_eq!(sparse.get(1, 0), Some(NodeId(2)));
        assert_eq!(sparse.get(2, 0), Some(NodeId(3)));
        assert_eq!(sparse.get(0, 1), None);

        let dense = place_items(&requests, 1, 3, GridAutoFlow::RowDense);
        assert_eq!(dense.get(0, 1), Some(NodeId(3)));
    }

    #[test]
    fn column_flow_fills_top_to_bottom() {
        let grid = place_items(&[auto(1), auto(2), auto(3)], 2, 2, GridAutoFlow::Column);
        assert_eq!(grid.get(0, 0), Some(NodeId(1)));
        assert_eq!(grid.get(1, 0), Some(NodeId(2)));
        assert_eq!(grid.get(0, 1), Some(NodeId(3)));
        assert_eq!(grid.order(), GridOrder::ColumnMajor);
    }

    #[test]
    fn explicit_items_are_placed_before_auto_items() {
        let explicit = GridItemRequest {
            row: AxisPlacement {
                start: Some(1),
                ..Default::default()
            },
            column: AxisPlacement {
                start: Some(1),
                ..Default::default()
            },
            item: NodeId(9),
        };
        let grid = place_items(&[auto(1), explicit], 1, 2, GridAutoFlow::Row);
        assert_eq!(grid.get(0, 0), Some(NodeId(9)));
        assert_eq!(grid.get(0, 1), Some(NodeId(1)));
    }

    #[test]
    fn test_resolve_tracks_fr() {
        let tracks = vec![
            GridTrackSize::Pt(100.0),
            GridTrackSize::Fr(1.0),
            GridTrackSize::Fr(2.0),
        ];
        let sizes = resolve_tracks(&tracks, 400.0, 0.0, &[]);
        assert!((sizes[0] - 100.0).abs() < 0.001);
        assert!((sizes[1] - 100.0).abs() < 0.001); // 1fr = 300/3 = 100
        assert!((sizes[2] - 200.0).abs() < 0.001); // 2fr = 300*2/3 = 200
    }

    #[test]
    fn test_resolve_tracks_auto_and_minmax() {
        let tracks = vec![
            GridTrackSize::Auto,
            GridTrackSize::MinMax(Box::new(GridTrackSize::Pt(50.0)), Box::new(GridTrackSize::Pt(70.0))),
            GridTrackSize::Fr(1.0),
        ];
        let sizes = resolve_tracks(&tracks, 400.0, 0.0, &[80.0, 10.0, 0.0]);
        assert!((sizes[0] - 80.0).abs() < 0.001);
        assert!((sizes[1] - 50.0).abs() < 0.001);
        assert!((sizes[2] - 270.0).abs() < 0.001);
    }

    #[test]
    fn test_span_size_and_offset() {
        let widths = vec![100.0, 200.0, 150.0];
        assert!((span_size(0, 2, &widths, 10.0) - 310.0).abs() < 0.001);
        assert!((span_size(0, 3, &widths, 10.0) - 470.0).abs() < 0.001);
        assert!((track_offset(2, &widths, 10.0) - 320.0).abs() < 0.001);
    }
}

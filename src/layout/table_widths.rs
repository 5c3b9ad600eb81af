//! # Table Column Widths
//!
//! Distributes a table's content width over its columns. Declared column
//! widths come first (points, then percentages of the table width); the
//! rest goes to auto columns according to their cells' min/max widths. A
//! cell spanning several columns constrains the sum of those columns only,
//! spreading what they lack in proportion to their provisional widths.

use crate::model::ColumnWidth;

/// Width constraints one cell puts on the columns it covers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellWidthInfo {
    /// First column covered, 0-based.
    pub column: usize,
    pub col_span: usize,
    /// Outer min/max width of the cell.
    pub min_width: f64,
    pub max_width: f64,
    /// Width declared on the cell itself.
    pub declared: Option<ColumnWidth>,
}

impl CellWidthInfo {
    fn columns(&self) -> std::ops::Range<usize> {
        self.column..self.column + self.col_span.max(1)
    }
}

/// Outcome of [`distribute_column_widths`].
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDistribution {
    pub widths: Vec<f64>,
    /// Sum of declared percentages, when it went past 100.
    pub percent_overflow: Option<f64>,
    /// Sum of minimum widths, when it went past the table width.
    pub min_overflow: Option<f64>,
}

/// What each column asks for before the table width is known.
#[derive(Debug, Clone, PartialEq)]
struct ColumnRequests {
    mins: Vec<f64>,
    maxes: Vec<f64>,
    fixed: Vec<Option<f64>>,
    percents: Vec<Option<f64>>,
    percent_total: f64,
}

/// Number of columns a table has: declared ones or as many as cells reach.
pub fn column_count(declared: &[ColumnWidth], cells: &[CellWidthInfo]) -> usize {
    cells
        .iter()
        .map(|c| c.columns().end)
        .max()
        .unwrap_or(0)
        .max(declared.len())
}

/// Per-column min and max widths, spanning cells included.
pub fn column_min_max(declared: &[ColumnWidth], cells: &[CellWidthInfo]) -> (Vec<f64>, Vec<f64>) {
    let requests = collect_requests(declared, cells);
    let mins = requests
        .mins
        .iter()
        .zip(&requests.fixed)
        .map(|(&min, fixed)| fixed.map_or(min, |w| w.max(min)))
        .collect();
    let maxes = requests
        .maxes
        .iter()
        .zip(&requests.fixed)
        .map(|(&max, fixed)| fixed.unwrap_or(max))
        .zip(&requests.mins)
        .map(|(max, &min)| max.max(min))
        .collect();
    (mins, maxes)
}

/// Distribute `available` over the columns.
///
/// The widths always add up to `available` unless the columns' minimum
/// widths alone exceed it, in which case every column gets its minimum.
pub fn distribute_column_widths(
    declared: &[ColumnWidth],
    cells: &[CellWidthInfo],
    available: f64,
) -> ColumnDistribution {
    let requests = collect_requests(declared, cells);
    let count = requests.mins.len();
    if count == 0 {
        return ColumnDistribution {
            widths: Vec::new(),
            percent_overflow: None,
            min_overflow: None,
        };
    }

    let percent_overflow = (requests.percent_total > 100.0).then_some(requests.percent_total);
    let percent_scale = percent_overflow.map_or(1.0, |total| 100.0 / total);

    let mut classes = vec![Class::Auto; count];
    let mut widths = vec![0.0; count];
    for i in 0..count {
        let min = requests.mins[i];
        widths[i] = if let Some(fixed) = requests.fixed[i] {
            classes[i] = Class::Fixed;
            fixed.max(min)
        } else if let Some(percent) = requests.percents[i] {
            classes[i] = Class::Percent;
            (available * percent * percent_scale / 100.0).max(min)
        } else {
            requests.maxes[i].max(min)
        };
    }

    let required: f64 = requests.mins.iter().sum();
    if required > available + 1e-9 {
        return ColumnDistribution {
            widths: requests.mins,
            percent_overflow,
            min_overflow: Some(required),
        };
    }

    let total: f64 = widths.iter().sum();
    if total < available {
        grow(&mut widths, &classes, available - total);
    } else if total > available {
        shrink(&mut widths, &classes, &requests.mins, total - available);
    }
    log::trace!("column widths {widths:?} for {available}");

    ColumnDistribution {
        widths,
        percent_overflow,
        min_overflow: None,
    }
}

/// Columns are given and taken space by class, in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Class {
    Auto,
    Percent,
    Fixed,
}

const CLASS_ORDER: [Class; 3] = [Class::Auto, Class::Percent, Class::Fixed];

fn grow(widths: &mut [f64], classes: &[Class], extra: f64) {
    let Some(class) = CLASS_ORDER.into_iter().find(|c| classes.contains(c)) else {
        return;
    };
    let members: Vec<usize> = (0..widths.len()).filter(|&i| classes[i] == class).collect();
    let weight: f64 = members.iter().map(|&i| widths[i]).sum();
    for &i in &members {
        let share = if weight > 0.0 {
            widths[i] / weight
        } else {
            1.0 / members.len() as f64
        };
        widths[i] += extra * share;
    }
}

/// Take `deficit` away from the columns above their minimum, auto columns
/// first. Each class gives in proportion to its members' slack, so no
/// column ends below its minimum.
fn shrink(widths: &mut [f64], classes: &[Class], mins: &[f64], mut deficit: f64) {
    for class in CLASS_ORDER {
        if deficit <= 0.0 {
            break;
        }
        let members: Vec<usize> = (0..widths.len()).filter(|&i| classes[i] == class).collect();
        let slack: f64 = members.iter().map(|&i| widths[i] - mins[i]).sum();
        if slack <= 0.0 {
            continue;
        }
        let taken = deficit.min(slack);
        for &i in &members {
            widths[i] -= taken * (widths[i] - mins[i]) / slack;
        }
        deficit -= taken;
    }
}

fn collect_requests(declared: &[ColumnWidth], cells: &[CellWidthInfo]) -> ColumnRequests {
    let count = column_count(declared, cells);
    let mut requests = ColumnRequests {
        mins: vec![0.0; count],
        maxes: vec![0.0; count],
        fixed: vec![None; count],
        percents: vec![None; count],
        percent_total: 0.0,
    };
    for (i, width) in declared.iter().enumerate() {
        match *width {
            ColumnWidth::Pt(w) => requests.fixed[i] = Some(w.max(0.0)),
            ColumnWidth::Percent(p) => requests.percents[i] = Some(p.max(0.0)),
            ColumnWidth::Auto => {}
        }
    }

    // Single-column cells constrain their column directly.
    for cell in cells.iter().filter(|c| c.col_span <= 1) {
        let i = cell.column;
        requests.mins[i] = requests.mins[i].max(cell.min_width);
        requests.maxes[i] = requests.maxes[i].max(cell.max_width);
        match cell.declared {
            Some(ColumnWidth::Pt(w)) if requests.percents[i].is_none() => {
                requests.fixed[i] = Some(requests.fixed[i].unwrap_or(0.0).max(w));
            }
            Some(ColumnWidth::Percent(p)) if requests.fixed[i].is_none() => {
                requests.percents[i] = Some(requests.percents[i].unwrap_or(0.0).max(p));
            }
            _ => {}
        }
    }

    // Spanning cells, narrowest span first, until none of them lacks room.
    let mut spanning: Vec<&CellWidthInfo> = cells.iter().filter(|c| c.col_span > 1).collect();
    spanning.sort_by_key(|c| c.col_span);
    for _ in 0..count.max(1) {
        let mut changed = false;
        for cell in &spanning {
            let range = cell.columns();
            changed |= spread(&mut requests.mins[range.clone()], cell.min_width, None);
            let provisional: Vec<f64> = requests.maxes[range.clone()].to_vec();
            changed |= spread(&mut requests.maxes[range.clone()], cell.max_width, Some(provisional.as_slice()));
            if let Some(ColumnWidth::Percent(p)) = cell.declared {
                let mut percents: Vec<f64> = range.clone().map(|i| requests.percents[i].unwrap_or(0.0)).collect();
                if spread(&mut percents, p, None) {
                    changed = true;
                    for (i, p) in range.zip(percents) {
                        if requests.fixed[i].is_none() {
                            requests.percents[i] = Some(p);
                        }
                    }
                }
            }
        }
        if !changed {
            break;
        }
    }

    for i in 0..count {
        requests.maxes[i] = requests.maxes[i].max(requests.mins[i]);
    }
    requests.percent_total = requests.percents.iter().flatten().sum();
    requests
}

/// Raise `columns` so they add up to at least `target`, each in proportion
/// to its weight (its current value unless `weights` is given; equal when
/// every weight is zero). Returns whether anything changed.
fn spread(columns: &mut [f64], target: f64, weights: Option<&[f64]>) -> bool {
    let sum: f64 = columns.iter().sum();
    let lack = target - sum;
    if lack <= 1e-9 || columns.is_empty() {
        return false;
    }
    let weights: Vec<f64> = weights.map_or_else(|| columns.to_vec(), <[f64]>::to_vec);
    let weight: f64 = weights.iter().sum();
    for (column, w) in columns.iter_mut().zip(&weights) {
        let share = if weight > 0.0 {
            w / weight
        } else {
            1.0 / weights.len() as f64
        };
        *column += lack * share;
    }
    true
}

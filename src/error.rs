//! Error and diagnostic types for the layout core.
//!
//! Two channels carry problems out of layout:
//! - [`LayoutError`] is returned as `Err` and stops the pass. Only conflicts
//!   that cannot be resolved without producing a wrong placement end up here.
//! - [`Diagnostic`] values are recorded on the engine and logged. The layout
//!   already applied a deterministic fallback; the caller may inspect them.
//!
//! "No room in this area" is neither: it is `LayoutStatus::Nothing`.

use std::fmt;

use thiserror::Error;

use crate::layout::NodeId;

/// The unrecoverable error type returned by every layout operation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
    #[error("Node {node} must be kept together but does not fit into area {area_index}, even when empty.")]
    KeepTogetherConflict { node: NodeId, area_index: usize },
    #[error("Layout did not converge after {0} areas.")]
    AreaLimitExceeded(usize),
    #[error("Node {0} does not exist in the layout tree.")]
    UnknownNode(NodeId),
    #[error("Renderer mismatch: expected {expected} node, got {found}.")]
    KindMismatch {
        expected: &'static str,
        found: &'static str,
    },
    #[error("Invalid value for property {property}: {reason}")]
    InvalidProperty { property: String, reason: String },
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
}

/// A non-fatal condition resolved by a fallback during layout.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// Declared percentages add up to more than 100%; columns were shrunk.
    PercentOverflow { node: NodeId, total_percent: f64 },
    /// A declared min-width exceeded the declared max-width; min wins.
    MinExceedsMax { node: NodeId, min: f64, max: f64 },
    /// A grid item's minimum width does not fit the track span it occupies.
    ItemWiderThanTrack {
        node: NodeId,
        min_width: f64,
        track_width: f64,
    },
    /// A box exceeding its area was placed anyway and clipped.
    ForcedPlacement { node: NodeId, area_index: usize },
    /// The relaxed-relayout ladder for a paragraph hit its cap.
    RelayoutLimitReached { node: NodeId, attempts: usize },
    /// Minimum column widths add up to more than the table width.
    ColumnsOverflowTable {
        node: NodeId,
        required: f64,
        available: f64,
    },
    /// Multi-column balancing stopped probing before converging.
    BalancingLimitReached { node: NodeId, iterations: usize },
    /// A grid item named a line or span beyond the grid line cap.
    GridLineClamped { node: NodeId, max_lines: u32 },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::PercentOverflow {
                node,
                total_percent,
            } => write!(
                f,
                "{node}: percentages total {total_percent:.2}%, columns shrunk to fit"
            ),
            Diagnostic::MinExceedsMax { node, min, max } => {
                write!(f, "{node}: min-width {min:.2} exceeds max-width {max:.2}")
            }
            Diagnostic::ItemWiderThanTrack {
                node,
                min_width,
                track_width,
            } => write!(
                f,
                "{node}: min width {min_width:.2} exceeds grid track width {track_width:.2}"
            ),
            Diagnostic::ForcedPlacement { node, area_index } => {
                write!(f, "{node}: forced into area {area_index} and clipped")
            }
            Diagnostic::RelayoutLimitReached { node, attempts } => {
                write!(f, "{node}: gave up relaxing line breaks after {attempts} attempts")
            }
            Diagnostic::ColumnsOverflowTable {
                node,
                required,
                available,
            } => write!(
                f,
                "{node}: columns need {required:.2} but the table offers {available:.2}"
            ),
            Diagnostic::BalancingLimitReached { node, iterations } => {
                write!(f, "{node}: column balancing stopped after {iterations} probes")
            }
            Diagnostic::GridLineClamped { node, max_lines } => {
                write!(f, "{node}: grid placement clamped to {max_lines} lines")
            }
        }
    }
}

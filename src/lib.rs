//! # Quire
//!
//! A page-native layout core.
//!
//! Most engines lay a document out on an infinitely tall canvas and slice it
//! into pages afterwards. Quire does the opposite: **the area is the unit of
//! layout.** Every renderer is offered one rectangle of one area and reports
//! whether its content fit fully, partially (handing back the rest for the
//! next area) or not at all. Flex lines, grid rows, table rows and balanced
//! columns are all decided against that boundary.
//!
//! ## Architecture
//!
//! ```text
//! Input (JSON/API)
//!       ↓
//!   [model]    : Document tree: nodes, styles, key→value properties
//!       ↓
//!   [layout]   : Arena tree, area-aware renderers, area driver
//!       ↓          (uses [style], [text], [typography])
//!   [paint]    : Final rectangles and glyph runs handed to a sink
//! ```

pub mod config;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod model;
pub mod paint;
pub mod style;
pub mod text;
pub mod typography;

pub use config::LayoutConfig;
pub use error::{Diagnostic, LayoutError};
pub use layout::{
    AreaProvider, LayoutContext, LayoutEngine, LayoutResult, LayoutStatus, LayoutTree, NodeId,
    PlacedArea, UniformAreas,
};
pub use model::{Node, NodeKind};
pub use paint::{DisplayList, DrawCommand, PainterSink};

/// A document laid out into areas and painted into a display list.
#[derive(Debug, Clone)]
pub struct LaidOutDocument {
    pub display_list: DisplayList,
    /// Number of areas used.
    pub area_count: usize,
    pub diagnostics: Vec<Diagnostic>,
}

/// Lay a document out into equal areas of the given size.
///
/// This is the primary entry point. Takes a document tree and returns
/// what was drawn in each area.
pub fn layout_document(
    document: &Node,
    width: f64,
    height: f64,
    config: LayoutConfig,
) -> Result<LaidOutDocument, LayoutError> {
    let tree = LayoutTree::from_document(document)?;
    let root = tree
        .root()
        .ok_or_else(|| LayoutError::InvalidDocument("the document has no root".to_string()))?;
    let mut engine = LayoutEngine::new(tree).with_config(config);
    let areas = engine.layout_areas(root, &mut UniformAreas::new(width, height))?;
    let mut display_list = DisplayList::new();
    engine.paint(&areas, &mut display_list)?;
    Ok(LaidOutDocument {
        display_list,
        area_count: areas.len(),
        diagnostics: engine.take_diagnostics(),
    })
}

/// Lay a document described as JSON out into equal areas.
pub fn layout_json(json: &str, width: f64, height: f64) -> Result<LaidOutDocument, LayoutError> {
    let document: Node =
        serde_json::from_str(json).map_err(|e| LayoutError::InvalidDocument(e.to_string()))?;
    layout_document(&document, width, height, LayoutConfig::default())
}

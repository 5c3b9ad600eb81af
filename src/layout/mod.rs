//! # Area-Aware Layout Engine
//!
//! Layout never happens on an infinitely tall canvas that is sliced into
//! pages afterwards. Every renderer is offered one rectangle of one area and
//! answers with what it managed to place there:
//!
//! 1. `Full`: everything fits; the occupied rectangle is reported
//! 2. `Partial`: part fits; the renderer is cut into a split part (placed)
//!    and an overflow part (to be offered the next area)
//! 3. `Nothing`: not even the first unbreakable piece fits; the caller
//!    tries a fresh area or forces placement
//!
//! Containers run their algorithm (flex, grid, table, columns) against the
//! area they were offered, so when a container splits, BOTH fragments get
//! their own layout pass in their own area.

pub mod block;
pub mod flex;
pub mod flex_container;
pub mod floats;
pub mod grid;
pub mod grid_container;
pub mod inline;
pub mod metrics;
pub mod multicol;
pub mod table;
pub mod table_widths;
pub mod tree;

pub use flex::{FlexItemCalculationInfo, FlexItemInfo};
pub use floats::FloatBox;
pub use grid::{Grid, GridCell};
pub use inline::{LineBox, PlacedGlyph};
pub use metrics::MinMaxWidth;
pub use tree::{LayoutTree, NodeId, NodeRecord, RendererKind};

use crate::config::LayoutConfig;
use crate::error::{Diagnostic, LayoutError};
use crate::geometry::{LayoutArea, Rectangle};
use crate::style::ResolvedStyle;
use crate::typography::{BasicTypography, TypographyService};

/// Height offered when measuring content without an area limit.
pub(crate) const UNBOUNDED: f64 = 1.0e7;

/// Outcome of one `layout` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutStatus {
    Full,
    Partial,
    Nothing,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutResult {
    pub status: LayoutStatus,
    pub occupied_area: Option<LayoutArea>,
    pub split_renderer: Option<NodeId>,
    pub overflow_renderer: Option<NodeId>,
    pub cause_of_nothing: Option<NodeId>,
}

impl LayoutResult {
    pub fn full(occupied: LayoutArea) -> Self {
        Self {
            status: LayoutStatus::Full,
            occupied_area: Some(occupied),
            split_renderer: None,
            overflow_renderer: None,
            cause_of_nothing: None,
        }
    }

    pub fn partial(occupied: LayoutArea, split: NodeId, overflow: NodeId) -> Self {
        Self {
            status: LayoutStatus::Partial,
            occupied_area: Some(occupied),
            split_renderer: Some(split),
            overflow_renderer: Some(overflow),
            cause_of_nothing: None,
        }
    }

    pub fn nothing(cause: NodeId) -> Self {
        Self {
            status: LayoutStatus::Nothing,
            occupied_area: None,
            split_renderer: None,
            overflow_renderer: None,
            cause_of_nothing: Some(cause),
        }
    }

    pub fn is_full(&self) -> bool {
        self.status == LayoutStatus::Full
    }

    pub fn is_partial(&self) -> bool {
        self.status == LayoutStatus::Partial
    }

    pub fn is_nothing(&self) -> bool {
        self.status == LayoutStatus::Nothing
    }

    /// Bottom edge of the occupied area.
    pub(crate) fn bottom(&self) -> Option<f64> {
        self.occupied_area.map(|a| a.bbox.bottom())
    }
}

/// What a parent hands to a child's `layout`.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutContext {
    pub area: LayoutArea,
    /// Floats already placed in this area that content must flow around.
    pub floats: Vec<FloatBox>,
    /// Place something even if it does not fit, clipping it.
    pub forced_placement: bool,
    /// Whether inline content may wrap onto further lines.
    pub allow_wrap: bool,
    /// Border-box width imposed by the parent algorithm.
    pub definite_width: Option<f64>,
    /// Border-box height imposed by the parent algorithm.
    pub definite_height: Option<f64>,
}

impl LayoutContext {
    pub fn new(area: LayoutArea) -> Self {
        Self {
            area,
            floats: Vec::new(),
            forced_placement: false,
            allow_wrap: true,
            definite_width: None,
            definite_height: None,
        }
    }

    pub fn forced(mut self, forced: bool) -> Self {
        self.forced_placement = forced;
        self
    }

    pub fn with_floats(mut self, floats: Vec<FloatBox>) -> Self {
        self.floats = floats;
        self
    }

    pub fn with_definite_size(mut self, width: Option<f64>, height: Option<f64>) -> Self {
        self.definite_width = width;
        self.definite_height = height;
        self
    }

    /// A context for a child placed in `bbox` of the same area.
    pub fn child(&self, bbox: Rectangle) -> Self {
        Self {
            area: self.area.with_bbox(bbox),
            floats: Vec::new(),
            forced_placement: false,
            allow_wrap: self.allow_wrap,
            definite_width: None,
            definite_height: None,
        }
    }
}

/// Supplies the successive areas of a document.
pub trait AreaProvider {
    fn area(&mut self, area_index: usize) -> LayoutArea;
}

/// Every area is the same rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformAreas {
    pub bbox: Rectangle,
}

impl UniformAreas {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            bbox: Rectangle::new(0.0, 0.0, width, height),
        }
    }
}

impl AreaProvider for UniformAreas {
    fn area(&mut self, area_index: usize) -> LayoutArea {
        LayoutArea::new(area_index, self.bbox)
    }
}

/// A renderer placed into one area by [`LayoutEngine::layout_areas`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedArea {
    pub area: LayoutArea,
    pub root: NodeId,
}

pub struct LayoutEngine {
    tree: LayoutTree,
    typography: Box<dyn TypographyService>,
    config: LayoutConfig,
    diagnostics: Vec<Diagnostic>,
    /// Nesting depth of measurement passes; diagnostics are muted inside.
    measuring: usize,
}

impl LayoutEngine {
    pub fn new(tree: LayoutTree) -> Self {
        Self {
            tree,
            typography: Box::new(BasicTypography),
            config: LayoutConfig::default(),
            diagnostics: Vec::new(),
            measuring: 0,
        }
    }

    pub fn with_typography(mut self, typography: Box<dyn TypographyService>) -> Self {
        self.typography = typography;
        self
    }

    pub fn with_config(mut self, config: LayoutConfig) -> Self {
        self.config = config;
        self
    }

    pub fn tree(&self) -> &LayoutTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut LayoutTree {
        &mut self.tree
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Non-fatal problems resolved by a fallback so far.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    pub(crate) fn diagnose(&mut self, diagnostic: Diagnostic) {
        if self.measuring > 0 || self.diagnostics.contains(&diagnostic) {
            return;
        }
        log::warn!("{diagnostic}");
        self.diagnostics.push(diagnostic);
    }

    /// Lay `id` out into the area of `ctx`.
    pub fn layout(&mut self, id: NodeId, ctx: &LayoutContext) -> Result<LayoutResult, LayoutError> {
        let record = self.tree.get_mut(id)?;
        record.reset_placement();
        let kind = record.kind.clone();

        let result = match kind {
            RendererKind::Block | RendererKind::TableCell { .. } => self.layout_block(id, ctx)?,
            RendererKind::Paragraph => self.layout_paragraph(id, ctx)?,
            RendererKind::Image { .. } => self.layout_image(id, ctx)?,
            RendererKind::Flex => self.layout_flex(id, ctx)?,
            RendererKind::Grid { .. } => self.layout_grid(id, ctx)?,
            RendererKind::Table { .. } => self.layout_table(id, ctx)?,
            RendererKind::MultiColumn => self.layout_multicol(id, ctx)?,
            RendererKind::AreaBreak => {
                let bbox = ctx.area.bbox;
                let occupied = ctx.area.with_bbox(Rectangle::new(bbox.x, bbox.y, bbox.width, 0.0));
                self.tree.get_mut(id)?.occupied_area = Some(occupied);
                LayoutResult::full(occupied)
            }
            RendererKind::Text => {
                return Err(LayoutError::KindMismatch {
                    expected: RendererKind::Paragraph.name(),
                    found: kind.name(),
                })
            }
            RendererKind::TableRow { .. } => {
                return Err(LayoutError::KindMismatch {
                    expected: "table",
                    found: kind.name(),
                })
            }
        };

        if !result.is_full() {
            log::debug!(
                "{} {id} in area {}: {:?} (split {:?}, overflow {:?}, cause {:?})",
                kind.name(),
                ctx.area.area_index,
                result.status,
                result.split_renderer,
                result.overflow_renderer,
                result.cause_of_nothing
            );
        }
        Ok(result)
    }

    /// Lay `root` into successive areas until everything is placed.
    ///
    /// `Nothing` in a fresh area is retried with forced placement, except
    /// when the renderer at fault must be kept together: that is a conflict
    /// no area can resolve.
    pub fn layout_areas(
        &mut self,
        root: NodeId,
        provider: &mut dyn AreaProvider,
    ) -> Result<Vec<PlacedArea>, LayoutError> {
        let mut placed = Vec::new();
        let mut current = root;

        loop {
            if placed.len() >= self.config.max_areas {
                return Err(LayoutError::AreaLimitExceeded(placed.len()));
            }
            let area = provider.area(placed.len());
            let ctx = LayoutContext::new(area);
            let mut result = self.layout(current, &ctx)?;

            if result.is_nothing() {
                let cause = result.cause_of_nothing.unwrap_or(current);
                if self.tree.get(cause)?.style.keep_together.unwrap_or(false) {
                    return Err(LayoutError::KeepTogetherConflict {
                        node: cause,
                        area_index: area.area_index,
                    });
                }
                log::debug!("{current} placed nothing into empty area {}, forcing", area.area_index);
                result = self.layout(current, &ctx.clone().forced(true))?;
            }

            match result.status {
                LayoutStatus::Full => {
                    placed.push(PlacedArea {
                        area,
                        root: current,
                    });
                    return Ok(placed);
                }
                LayoutStatus::Partial => {
                    let (Some(split), Some(overflow)) =
                        (result.split_renderer, result.overflow_renderer)
                    else {
                        return Err(LayoutError::UnknownNode(current));
                    };
                    placed.push(PlacedArea { area, root: split });
                    current = overflow;
                }
                LayoutStatus::Nothing => {
                    let cause = result.cause_of_nothing.unwrap_or(current);
                    return Err(LayoutError::KeepTogetherConflict {
                        node: cause,
                        area_index: area.area_index,
                    });
                }
            }
        }
    }

    /// Style of `id` resolved against the given containing size. A min-width
    /// larger than max-width is reported once; min wins.
    pub(crate) fn resolve_style(
        &mut self,
        id: NodeId,
        available_width: f64,
        available_height: Option<f64>,
    ) -> Result<ResolvedStyle, LayoutError> {
        let resolved = self.tree.get(id)?.style.resolve(available_width, available_height);
        if resolved.min_width > resolved.max_width {
            self.diagnose(Diagnostic::MinExceedsMax {
                node: id,
                min: resolved.min_width,
                max: resolved.max_width,
            });
        }
        Ok(resolved)
    }

    /// Outer (margin box) height of `id` laid out in an area `width` wide
    /// with no height limit. Results of this pass are overwritten by the
    /// final layout.
    pub(crate) fn measure_height(&mut self, id: NodeId, width: f64) -> Result<f64, LayoutError> {
        self.measure(id, width, None)
    }

    /// Like [`Self::measure_height`] but with a definite border-box width.
    pub(crate) fn measure(
        &mut self,
        id: NodeId,
        width: f64,
        definite_width: Option<f64>,
    ) -> Result<f64, LayoutError> {
        self.measuring += 1;
        let ctx = LayoutContext::new(LayoutArea::new(0, Rectangle::new(0.0, 0.0, width, UNBOUNDED)))
            .with_definite_size(definite_width, None);
        let mut result = self.layout(id, &ctx);
        if matches!(result, Ok(ref r) if r.is_nothing()) {
            result = self.layout(id, &ctx.forced(true));
        }
        self.measuring -= 1;
        Ok(result?.occupied_area.map(|a| a.bbox.height).unwrap_or(0.0))
    }

    /// Hypothetical cross size of a flex item at a main size and under the
    /// container's definite cross size, cached on the item for as long as
    /// it lives.
    pub(crate) fn cached_cross_size(
        &mut self,
        id: NodeId,
        main_size: f64,
        definite_cross: Option<f64>,
        measure: impl FnOnce(&mut Self) -> Result<f64, LayoutError>,
    ) -> Result<f64, LayoutError> {
        let key = (main_size.to_bits(), definite_cross.map(f64::to_bits));
        if let Some(&cached) = self.tree.get(id)?.cross_size_cache.get(&key) {
            return Ok(cached);
        }
        let size = measure(self)?;
        self.tree.get_mut(id)?.cross_size_cache.insert(key, size);
        Ok(size)
    }

    pub(crate) fn typography(&self) -> &dyn TypographyService {
        self.typography.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{Dimension, Style};

    fn sized_block(tree: &mut LayoutTree, height: f64) -> NodeId {
        tree.add(
            RendererKind::Block,
            Style {
                height: Some(Dimension::Pt(height)),
                ..Default::default()
            },
        )
    }

    #[test]
    fn driver_follows_overflow_renderers() {
        let mut tree = LayoutTree::new();
        let root = tree.add(RendererKind::Block, Style::default());
        for _ in 0..5 {
            let child = sized_block(&mut tree, 40.0);
            tree.append_child(root, child).unwrap();
        }
        let mut engine = LayoutEngine::new(tree);
        let placed = engine
            .layout_areas(root, &mut UniformAreas::new(100.0, 100.0))
            .unwrap();
        assert_eq!(placed.len(), 3);
        let counts: Vec<usize> = placed
            .iter()
            .map(|p| engine.tree().children(p.root).unwrap().len())
            .collect();
        assert_eq!(counts, vec![2, 2, 1]);
    }

    #[test]
    fn keep_together_that_never_fits_is_an_error() {
        let mut tree = LayoutTree::new();
        let root = tree.add(
            RendererKind::Block,
            Style {
                keep_together: Some(true),
                ..Default::default()
            },
        );
        for _ in 0..3 {
            let child = sized_block(&mut tree, 40.0);
            tree.append_child(root, child).unwrap();
        }
        let mut engine = LayoutEngine::new(tree);
        let err = engine
            .layout_areas(root, &mut UniformAreas::new(100.0, 100.0))
            .unwrap_err();
        assert_eq!(
            err,
            LayoutError::KeepTogetherConflict {
                node: root,
                area_index: 0
            }
        );
    }

    #[test]
    fn oversized_box_is_forced_and_reported() {
        let mut tree = LayoutTree::new();
        let root = sized_block(&mut tree, 500.0);
        let mut engine = LayoutEngine::new(tree);
        let placed = engine
            .layout_areas(root, &mut UniformAreas::new(100.0, 100.0))
            .unwrap();
        assert_eq!(placed.len(), 1);
        assert!(matches!(
            engine.diagnostics(),
            [Diagnostic::ForcedPlacement { area_index: 0, .. }]
        ));
    }

    #[test]
    fn area_limit_guarantees_termination() {
        let mut tree = LayoutTree::new();
        let root = tree.add(RendererKind::Block, Style::default());
        for _ in 0..10 {
            let child = sized_block(&mut tree, 90.0);
            tree.append_child(root, child).unwrap();
        }
        let mut engine = LayoutEngine::new(tree).with_config(LayoutConfig {
            max_areas: 3,
            ..Default::default()
        });
        let err = engine
            .layout_areas(root, &mut UniformAreas::new(100.0, 100.0))
            .unwrap_err();
        assert_eq!(err, LayoutError::AreaLimitExceeded(3));
    }

    #[test]
    fn text_cannot_be_laid_out_directly() {
        let mut tree = LayoutTree::new();
        let run = tree.add_text("x", Style::default());
        let mut engine = LayoutEngine::new(tree);
        let ctx = LayoutContext::new(LayoutArea::new(0, Rectangle::new(0.0, 0.0, 10.0, 10.0)));
        assert!(matches!(
            engine.layout(run, &ctx),
            Err(LayoutError::KindMismatch { .. })
        ));
    }
}

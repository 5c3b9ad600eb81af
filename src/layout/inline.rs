//! # Paragraph Layout
//!
//! A paragraph flattens its children into one sequence of units: a glyph
//! per character of every text run, one unit per inline box (an atom, seen
//! by the line breaker as U+FFFC), with floats anchored between units.
//!
//! Lines are filled greedily. When an unbreakable word is wider than the
//! line and overflow is not allowed, the whole paragraph is broken again
//! with looser rules: first any boundary inside special-script text, then
//! any character boundary. The number of such retries is capped.
//!
//! Bidi reordering happens per line once its content is fixed; marks then
//! take their anchor from the reordered sequence.

use unicode_linebreak::BreakOpportunity;

use crate::error::{Diagnostic, LayoutError};
use crate::geometry::Rectangle;
use crate::layout::block::BoxFrame;
use crate::layout::floats::{available_band, floats_bottom, FloatBox};
use crate::layout::{LayoutContext, LayoutEngine, LayoutResult, NodeId, RendererKind};
use crate::style::{Float, Overflow, TextAlign};
use crate::text::bidi::{repair_mark_anchors, resolve_levels, visual_order};
use crate::text::{compute_break_opportunities, discover_special_breaks, RunShape};
use crate::typography::{has_special_script, needs_word_break_discovery, FontSpec};

/// A glyph placed on a line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedGlyph {
    pub ch: char,
    pub x: f64,
    /// Top of the glyph's line box.
    pub y: f64,
    pub advance: f64,
    pub font_size: f64,
    /// Text run the glyph came from.
    pub run: NodeId,
    /// Visual offset of a mark's base glyph within the line.
    pub anchor_delta: Option<isize>,
}

/// One laid-out line of a paragraph, glyphs in visual order.
#[derive(Debug, Clone, PartialEq)]
pub struct LineBox {
    pub rect: Rectangle,
    pub glyphs: Vec<PlacedGlyph>,
    /// Inline boxes laid out on this line.
    pub atoms: Vec<NodeId>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum UnitKind {
    Glyph {
        run: NodeId,
        anchor_delta: Option<isize>,
        font_size: f64,
        line_height: f64,
    },
    Atom {
        node: NodeId,
        min_width: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct InlineUnit {
    ch: char,
    width: f64,
    /// Index of the paragraph child the unit belongs to.
    child: usize,
    /// Char index inside that child.
    local: usize,
    kind: UnitKind,
}

impl InlineUnit {
    fn is_space(&self) -> bool {
        matches!(self.kind, UnitKind::Glyph { .. }) && self.ch.is_whitespace()
    }

    fn anchor_delta(&self) -> Option<isize> {
        match self.kind {
            UnitKind::Glyph { anchor_delta, .. } => anchor_delta,
            UnitKind::Atom { .. } => None,
        }
    }

    fn is_mark(&self) -> bool {
        self.anchor_delta().is_some()
    }

    fn min_width(&self) -> f64 {
        match self.kind {
            UnitKind::Atom { min_width, .. } => min_width,
            UnitKind::Glyph { .. } => self.width,
        }
    }
}

struct InlineContent {
    children: Vec<NodeId>,
    units: Vec<InlineUnit>,
    /// Floated children with the unit index they precede.
    floats: Vec<(usize, NodeId)>,
    /// Break before unit `i` found by the typography service.
    special: Vec<bool>,
}

impl InlineContent {
    fn text(&self) -> Vec<char> {
        self.units.iter().map(|u| u.ch).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BreakMode {
    Strict,
    /// Also between any two characters of special-script text.
    ClusterBreaks,
    /// Also between any two characters.
    Anywhere,
}

impl BreakMode {
    fn relaxed(self) -> Option<Self> {
        match self {
            BreakMode::Strict => Some(BreakMode::ClusterBreaks),
            BreakMode::ClusterBreaks => Some(BreakMode::Anywhere),
            BreakMode::Anywhere => None,
        }
    }
}

/// Break permissions before each unit.
struct BreakTable {
    soft: Vec<bool>,
    mandatory: Vec<bool>,
    cluster: Vec<bool>,
    anywhere: Vec<bool>,
}

impl BreakTable {
    fn new(content: &InlineContent) -> Self {
        let text = content.text();
        let opportunities = compute_break_opportunities(&text);
        let n = text.len();
        let mut table = BreakTable {
            soft: vec![false; n],
            mandatory: vec![false; n],
            cluster: vec![false; n],
            anywhere: vec![false; n],
        };
        for i in 1..n {
            match opportunities[i] {
                Some(BreakOpportunity::Mandatory) => table.mandatory[i] = true,
                Some(BreakOpportunity::Allowed) => table.soft[i] = true,
                None => {}
            }
            table.soft[i] |= content.special[i];
            let mark = content.units[i].is_mark();
            table.cluster[i] =
                !mark && needs_word_break_discovery(text[i - 1]) && needs_word_break_discovery(text[i]);
            table.anywhere[i] = !mark;
        }
        table
    }

    fn allows(&self, index: usize, mode: BreakMode) -> bool {
        match mode {
            BreakMode::Strict => self.soft[index],
            BreakMode::ClusterBreaks => self.soft[index] || self.cluster[index],
            BreakMode::Anywhere => self.soft[index] || self.anywhere[index],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct LineSpan {
    start: usize,
    end: usize,
    /// Ended by a mandatory break.
    hard: bool,
    /// Holds a word wider than the line.
    overflowed: bool,
}

/// Greedily fill one line starting at unit `start`.
fn break_line(
    units: &[InlineUnit],
    table: &BreakTable,
    start: usize,
    available: f64,
    mode: BreakMode,
    allow_wrap: bool,
    eps: f64,
) -> LineSpan {
    let n = units.len();
    let mut width = 0.0;
    // Breaks the text allows on its own, and breaks only the relaxed mode
    // allows. The latter are used when the line has none of the former.
    let mut last_break = None;
    let mut last_relaxed_break = None;
    let mut i = start;
    while i < n {
        if i > start && table.mandatory[i] {
            return LineSpan {
                start,
                end: i,
                hard: true,
                overflowed: false,
            };
        }
        if i > start && allow_wrap {
            if table.soft[i] {
                last_break = Some(i);
            } else if table.allows(i, mode) {
                last_relaxed_break = Some(i);
            }
        }
        let unit = &units[i];
        if allow_wrap && i > start && !unit.is_space() && width + unit.width > available + eps {
            if let Some(end) = last_break.or(last_relaxed_break) {
                return LineSpan {
                    start,
                    end,
                    hard: false,
                    overflowed: false,
                };
            }
            // The word does not fit anywhere: it runs to its end.
            let end = (i + 1..n)
                .find(|&j| table.mandatory[j] || table.allows(j, mode))
                .unwrap_or(n);
            return LineSpan {
                start,
                end,
                hard: false,
                overflowed: true,
            };
        }
        width += unit.width;
        i += 1;
    }
    LineSpan {
        start,
        end: n,
        hard: false,
        overflowed: false,
    }
}

#[derive(Debug, Clone, Copy)]
struct PlannedLine {
    span: LineSpan,
    rect: Rectangle,
}

struct LineFlow {
    lines: Vec<PlannedLine>,
    /// First unit not placed.
    end: usize,
    /// Floats that met no room, in order.
    pending: Vec<NodeId>,
    own_floats: Vec<FloatBox>,
    bottom: f64,
    overflowed: bool,
}

impl LayoutEngine {
    pub(crate) fn layout_paragraph(
        &mut self,
        id: NodeId,
        ctx: &LayoutContext,
    ) -> Result<LayoutResult, LayoutError> {
        let Some(frame) = self.open_box(id, ctx)? else {
            return Ok(LayoutResult::nothing(id));
        };
        let children = self.tree.children(id)?.to_vec();
        let content = self.collect_inline(&children, Some(frame.content.width))?;
        let table = BreakTable::new(&content);

        let mut mode = BreakMode::Strict;
        let mut attempts = 0;
        let flow = loop {
            let flow = self.flow_lines(ctx, &frame, &content, &table, mode)?;
            if !flow.overflowed || frame.style.overflow_x != Overflow::Fit {
                break flow;
            }
            match mode.relaxed() {
                Some(next) if attempts < self.config.max_relayout_attempts => {
                    attempts += 1;
                    log::trace!("paragraph {id}: relayout with {next:?}");
                    mode = next;
                }
                Some(_) => {
                    self.diagnose(Diagnostic::RelayoutLimitReached { node: id, attempts });
                    break flow;
                }
                None => break flow,
            }
        };

        let n = content.units.len();
        let nothing_fits = flow.lines.is_empty()
            && (flow.end < n || (!flow.pending.is_empty() && flow.own_floats.is_empty()));
        if nothing_fits {
            return Ok(LayoutResult::nothing(id));
        }

        let lines = self.place_lines(ctx, &frame, &content, &flow)?;
        self.tree.get_mut(id)?.lines = lines;
        let content_height = (flow.bottom - frame.content.y).max(0.0);

        if flow.end >= n && flow.pending.is_empty() {
            return self.close_full(id, ctx, &frame, content_height);
        }
        if frame.style.keep_together && !ctx.forced_placement {
            return Ok(LayoutResult::nothing(id));
        }
        let (split_children, overflow_children) = self.cut_inline(&content, &flow)?;
        self.split_box(id, ctx, &frame, content_height, split_children, overflow_children)
    }

    /// Min-content and max-content width of inline content.
    pub(crate) fn inline_min_max(&mut self, children: &[NodeId]) -> Result<(f64, f64), LayoutError> {
        let content = self.collect_inline(children, None)?;
        let table = BreakTable::new(&content);

        let (mut min, mut max) = (0.0_f64, 0.0_f64);
        let (mut segment, mut segment_trimmed) = (0.0, 0.0);
        let (mut line, mut line_trimmed) = (0.0, 0.0);
        for (i, unit) in content.units.iter().enumerate() {
            if i > 0 && (table.soft[i] || table.mandatory[i]) {
                min = min.max(segment_trimmed);
                segment = 0.0;
                segment_trimmed = 0.0;
            }
            if i > 0 && table.mandatory[i] {
                max = max.max(line_trimmed);
                line = 0.0;
                line_trimmed = 0.0;
            }
            segment += unit.min_width();
            line += unit.width;
            if !unit.is_space() {
                segment_trimmed = segment;
                line_trimmed = line;
            }
        }
        min = min.max(segment_trimmed);
        max = max.max(line_trimmed);

        for &(_, node) in &content.floats {
            let metrics = self.min_max_width(node)?;
            min = min.max(metrics.min_width);
            max += metrics.max_width;
        }
        Ok((min, max.max(min)))
    }

    /// Ask the typography service for break points of special-script runs
    /// that have none yet.
    fn ensure_special_breaks(&mut self, children: &[NodeId]) -> Result<(), LayoutError> {
        enum Shape {
            Text(Vec<char>),
            Floating,
            Atom,
        }

        let mut shapes = Vec::with_capacity(children.len());
        let mut undiscovered = false;
        for &child in children {
            let record = self.tree.get(child)?;
            shapes.push(if record.kind == RendererKind::Text {
                undiscovered |= record.special_breaks.is_none() && has_special_script(&record.text);
                Shape::Text(record.text.clone())
            } else if record.style.float.unwrap_or_default() != Float::None {
                Shape::Floating
            } else {
                Shape::Atom
            });
        }
        if !undiscovered {
            return Ok(());
        }

        let runs: Vec<RunShape<'_>> = shapes
            .iter()
            .map(|s| match s {
                Shape::Text(chars) => RunShape::Text(chars),
                Shape::Floating => RunShape::Floating,
                Shape::Atom => RunShape::Atom,
            })
            .collect();
        let found = discover_special_breaks(&runs, self.typography());
        for ((&child, shape), breaks) in children.iter().zip(&shapes).zip(found) {
            let record = self.tree.get_mut(child)?;
            if matches!(shape, Shape::Text(_)) && record.special_breaks.is_none() {
                record.special_breaks = Some(breaks.unwrap_or_default());
            }
        }
        Ok(())
    }

    /// Flatten a paragraph's children into units. Atoms are as wide as
    /// their max-content width, limited to `available` when given.
    fn collect_inline(
        &mut self,
        children: &[NodeId],
        available: Option<f64>,
    ) -> Result<InlineContent, LayoutError> {
        self.ensure_special_breaks(children)?;
        let mut content = InlineContent {
            children: children.to_vec(),
            units: Vec::new(),
            floats: Vec::new(),
            special: Vec::new(),
        };

        for (index, &child) in children.iter().enumerate() {
            let record = self.tree.get(child)?;
            if record.kind == RendererKind::Text {
                let style = record.style.resolve(available.unwrap_or(0.0), None);
                let text = record.text.clone();
                let breaks = record.special_breaks.clone().unwrap_or_default();
                let font = FontSpec {
                    family: style.font_family.clone(),
                    size: style.font_size,
                    weight: style.font_weight,
                };
                let glyphs = self.typography.shape(&text, &font);
                let start = content.units.len();
                for (local, &ch) in text.iter().enumerate() {
                    let glyph = glyphs.get(local);
                    content.units.push(InlineUnit {
                        ch,
                        width: glyph.map(|g| g.advance).unwrap_or(0.0),
                        child: index,
                        local,
                        kind: UnitKind::Glyph {
                            run: child,
                            anchor_delta: glyph.and_then(|g| g.anchor_delta),
                            font_size: style.font_size,
                            line_height: style.line_box_height(),
                        },
                    });
                    content.special.push(false);
                }
                for offset in breaks {
                    let at = start + offset;
                    if at > 0 && at < content.special.len() {
                        content.special[at] = true;
                    }
                }
            } else if record.style.float.unwrap_or_default() != Float::None {
                content.floats.push((content.units.len(), child));
            } else {
                let metrics = self.min_max_width(child)?;
                let width = match available {
                    Some(a) => metrics.max_width.min(a).max(metrics.min_width),
                    None => metrics.max_width,
                };
                content.units.push(InlineUnit {
                    ch: '\u{FFFC}',
                    width,
                    child: index,
                    local: 0,
                    kind: UnitKind::Atom {
                        node: child,
                        min_width: metrics.min_width,
                    },
                });
                content.special.push(false);
            }
        }
        Ok(content)
    }

    /// Break lines and stack them in the frame until the area is full.
    fn flow_lines(
        &mut self,
        ctx: &LayoutContext,
        frame: &BoxFrame,
        content: &InlineContent,
        table: &BreakTable,
        mode: BreakMode,
    ) -> Result<LineFlow, LayoutError> {
        let area = frame.content;
        let limit = area.bottom();
        let eps = self.config.epsilon;
        let strut = frame.style.line_box_height();
        let n = content.units.len();

        let mut floats = ctx.floats.clone();
        let inherited = floats.len();
        let mut pending = Vec::new();
        let mut next_float = 0;
        let mut lines: Vec<PlannedLine> = Vec::new();
        let mut cursor = area.y;
        let mut start = 0;
        let mut overflowed = false;

        loop {
            while let Some(&(anchor, node)) = content.floats.get(next_float) {
                if anchor > start {
                    break;
                }
                next_float += 1;
                // Floats keep their order: once one waits, the rest wait too.
                let placed = if pending.is_empty() {
                    let forced = ctx.forced_placement && lines.is_empty() && floats.len() == inherited;
                    self.place_float_child(node, ctx, &floats, area, cursor, forced)?
                } else {
                    None
                };
                match placed {
                    Some(float) => floats.push(float),
                    None => pending.push(node),
                }
            }
            if start >= n {
                break;
            }

            let (left, right) = available_band(&floats, area.x, area.right(), cursor, cursor + strut);
            let span = break_line(&content.units, table, start, right - left, mode, ctx.allow_wrap, eps);
            let height = self.line_height(&content.units[span.start..span.end], strut)?;
            if cursor + height > limit + eps && !(lines.is_empty() && ctx.forced_placement) {
                break;
            }
            overflowed |= span.overflowed;
            lines.push(PlannedLine {
                span,
                rect: Rectangle::new(left, cursor, right - left, height),
            });
            cursor += height;
            start = span.end;
        }

        let own_floats = floats[inherited..].to_vec();
        let bottom = floats_bottom(&own_floats).map_or(cursor, |b| b.max(cursor));
        Ok(LineFlow {
            lines,
            end: start,
            pending,
            own_floats,
            bottom,
            overflowed,
        })
    }

    fn line_height(&mut self, units: &[InlineUnit], strut: f64) -> Result<f64, LayoutError> {
        let mut height = strut;
        for unit in units {
            let unit_height = match unit.kind {
                UnitKind::Glyph { line_height, .. } => line_height,
                UnitKind::Atom { node, .. } => self.measure_height(node, unit.width)?,
            };
            height = height.max(unit_height);
        }
        Ok(height)
    }

    /// Reorder, align and position the planned lines, laying out atoms.
    fn place_lines(
        &mut self,
        ctx: &LayoutContext,
        frame: &BoxFrame,
        content: &InlineContent,
        flow: &LineFlow,
    ) -> Result<Vec<LineBox>, LayoutError> {
        let levels = resolve_levels(&content.text(), frame.style.direction);
        let paragraph_ends = flow.end >= content.units.len();
        let mut boxes = Vec::with_capacity(flow.lines.len());

        for (index, line) in flow.lines.iter().enumerate() {
            let LineSpan { start, end, hard, .. } = line.span;
            let mut trimmed = end;
            while trimmed > start && content.units[trimmed - 1].is_space() {
                trimmed -= 1;
            }
            let units = &content.units[start..trimmed];
            let natural: f64 = units.iter().map(|u| u.width).sum();
            let free = (line.rect.width - natural).max(0.0);
            let spaces = units.iter().filter(|u| u.is_space()).count();
            let last = paragraph_ends && index + 1 == flow.lines.len();

            let (offset, stretch) = match frame.style.text_align {
                TextAlign::Left => (0.0, 0.0),
                TextAlign::Right => (free, 0.0),
                TextAlign::Center => (free / 2.0, 0.0),
                TextAlign::Justify if !last && !hard && spaces > 0 => (0.0, free / spaces as f64),
                TextAlign::Justify if levels.base_rtl => (free, 0.0),
                TextAlign::Justify => (0.0, 0.0),
            };

            let order = visual_order(&levels.levels[start..trimmed]);
            let anchors: Vec<Option<isize>> = units.iter().map(InlineUnit::anchor_delta).collect();
            let repaired = repair_mark_anchors(&anchors, &order);

            let mut xs = vec![0.0; order.len()];
            let mut x = line.rect.x + offset;
            for (visual, &logical) in order.iter().enumerate() {
                let unit = &units[logical];
                if unit.is_mark() {
                    continue;
                }
                xs[visual] = x;
                x += unit.width + if unit.is_space() { stretch } else { 0.0 };
            }
            for (visual, &logical) in order.iter().enumerate() {
                if !units[logical].is_mark() {
                    continue;
                }
                if let Some(delta) = repaired[visual] {
                    let base = visual as isize + delta;
                    if base >= 0 && (base as usize) < xs.len() {
                        xs[visual] = xs[base as usize];
                    }
                }
            }

            let mut glyphs = Vec::with_capacity(order.len());
            let mut atoms = Vec::new();
            for (visual, &logical) in order.iter().enumerate() {
                let unit = &units[logical];
                match unit.kind {
                    UnitKind::Glyph {
                        run,
                        font_size,
                        line_height,
                        ..
                    } => glyphs.push(PlacedGlyph {
                        ch: unit.ch,
                        x: xs[visual],
                        y: line.rect.bottom() - line_height,
                        advance: unit.width,
                        font_size,
                        run,
                        anchor_delta: repaired[visual],
                    }),
                    UnitKind::Atom { node, .. } => {
                        let slot = Rectangle::new(xs[visual], line.rect.y, unit.width, line.rect.height);
                        self.layout(node, &ctx.child(slot))?;
                        atoms.push(node);
                    }
                }
            }
            boxes.push(LineBox {
                rect: line.rect,
                glyphs,
                atoms,
            });
        }
        Ok(boxes)
    }

    /// Children of the placed part and of the remainder. A text run holding
    /// the cut is split in two.
    fn cut_inline(
        &mut self,
        content: &InlineContent,
        flow: &LineFlow,
    ) -> Result<(Vec<NodeId>, Vec<NodeId>), LayoutError> {
        let children = &content.children;
        let (cut, local) = content
            .units
            .get(flow.end)
            .map_or((children.len(), 0), |u| (u.child, u.local));

        let mut split: Vec<NodeId> = children[..cut]
            .iter()
            .filter(|c| !flow.pending.contains(c))
            .copied()
            .collect();
        let mut overflow = flow.pending.clone();
        if let Some(&boundary) = children.get(cut) {
            if local > 0 {
                let (head, tail) = self.tree.split_text(boundary, local)?;
                split.push(head);
                overflow.push(tail);
            } else {
                overflow.push(boundary);
            }
            overflow.extend_from_slice(&children[cut + 1..]);
        }
        Ok((split, overflow))
    }
}

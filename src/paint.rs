//! # Painting
//!
//! Layout ends with every placed box knowing its border box and resolved
//! style. Painting walks the placed pieces of each area and hands them to a
//! [`PainterSink`]; what a sink does with them (PDF content streams, a
//! raster, a test assertion) is its own business.
//!
//! [`DisplayList`] is the sink used for inspection: it records flat
//! [`DrawCommand`]s that serialize to JSON.

use serde::Serialize;

use crate::error::LayoutError;
use crate::geometry::{Edges, LayoutArea, Rectangle};
use crate::layout::{LayoutEngine, LineBox, NodeId, PlacedArea, RendererKind};
use crate::style::{Color, ResolvedStyle};

/// A placed box as handed to a sink.
#[derive(Debug, Clone, Copy)]
pub struct PaintedBox<'a> {
    pub node: NodeId,
    pub kind: &'a RendererKind,
    /// Unrotated border box.
    pub border_box: Rectangle,
    /// Rectangle the content is clipped to, if any.
    pub clip: Option<Rectangle>,
    pub style: &'a ResolvedStyle,
}

/// Receiver of the final geometry.
pub trait PainterSink {
    /// Called once before the boxes of each area.
    fn begin_area(&mut self, area: &LayoutArea);

    /// Called for every placed box, parents before children.
    fn paint_box(&mut self, placed: &PaintedBox<'_>);

    /// Called for every line of a paragraph, after the paragraph's box.
    fn paint_line(&mut self, paragraph: NodeId, line: &LineBox, style: &ResolvedStyle);
}

/// One drawing instruction of a [`DisplayList`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DrawCommand {
    /// Start of a new area.
    Area { index: usize, bbox: Rectangle },
    /// Background and border of a box.
    #[serde(rename_all = "camelCase")]
    Box {
        node: usize,
        kind: &'static str,
        rect: Rectangle,
        #[serde(skip_serializing_if = "Option::is_none")]
        clip: Option<Rectangle>,
        #[serde(skip_serializing_if = "Option::is_none")]
        background: Option<Color>,
        border_width: Edges,
        border_color: Color,
        /// Radians, clockwise about the box center.
        rotation: f64,
    },
    /// A line of glyphs, in visual order.
    #[serde(rename_all = "camelCase")]
    Text {
        node: usize,
        rect: Rectangle,
        text: String,
        glyphs: Vec<GlyphPosition>,
        color: Color,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlyphPosition {
    pub ch: char,
    pub x: f64,
    pub y: f64,
    pub font_size: f64,
}

/// Sink that keeps every command in order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DisplayList {
    pub commands: Vec<DrawCommand>,
}

impl DisplayList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rectangles of the boxes painted for `node`, in paint order.
    pub fn boxes_of(&self, node: NodeId) -> Vec<Rectangle> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Box { node: n, rect, .. } if *n == node.index() => Some(*rect),
                _ => None,
            })
            .collect()
    }

    /// Text of every painted line, in paint order.
    pub fn text_lines(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl PainterSink for DisplayList {
    fn begin_area(&mut self, area: &LayoutArea) {
        self.commands.push(DrawCommand::Area {
            index: area.area_index,
            bbox: area.bbox,
        });
    }

    fn paint_box(&mut self, placed: &PaintedBox<'_>) {
        let style = placed.style;
        self.commands.push(DrawCommand::Box {
            node: placed.node.index(),
            kind: placed.kind.name(),
            rect: placed.border_box,
            clip: placed.clip,
            background: style.background_color,
            border_width: style.border_width,
            border_color: style.border_color,
            rotation: style.rotation_angle,
        });
    }

    fn paint_line(&mut self, paragraph: NodeId, line: &LineBox, style: &ResolvedStyle) {
        self.commands.push(DrawCommand::Text {
            node: paragraph.index(),
            rect: line.rect,
            text: line.glyphs.iter().map(|g| g.ch).collect(),
            glyphs: line
                .glyphs
                .iter()
                .map(|g| GlyphPosition {
                    ch: g.ch,
                    x: g.x,
                    y: g.y,
                    font_size: g.font_size,
                })
                .collect(),
            color: style.color,
        });
    }
}

impl LayoutEngine {
    /// Hand every box placed by [`LayoutEngine::layout_areas`] to `sink`.
    pub fn paint(&self, areas: &[PlacedArea], sink: &mut dyn PainterSink) -> Result<(), LayoutError> {
        for placed in areas {
            sink.begin_area(&placed.area);
            self.paint_node(placed.root, sink)?;
        }
        Ok(())
    }

    fn paint_node(&self, id: NodeId, sink: &mut dyn PainterSink) -> Result<(), LayoutError> {
        let record = self.tree().get(id)?;
        if record.kind == RendererKind::Text {
            return Ok(());
        }
        if let (Some(border_box), Some(style)) = (record.border_box, record.resolved.as_ref()) {
            sink.paint_box(&PaintedBox {
                node: id,
                kind: &record.kind,
                border_box,
                clip: record.clip,
                style,
            });
            for line in &record.lines {
                sink.paint_line(id, line, style);
            }
        }
        // Multi-column boxes paint their column blocks instead.
        let children = if record.fragments.is_empty() {
            &record.children
        } else {
            &record.fragments
        };
        for &child in children {
            self.paint_node(child, sink)?;
        }
        Ok(())
    }
}

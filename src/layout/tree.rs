//! The layout arena.
//!
//! Every renderer is a [`NodeRecord`] owned by one [`LayoutTree`] and named by
//! a [`NodeId`]. Parent/child links are indices, never owning pointers. A
//! split creates new records; the pieces remember the record they were cut
//! from in [`NodeRecord::origin`].

use std::collections::HashMap;
use std::fmt;

use crate::error::LayoutError;
use crate::geometry::{LayoutArea, Rectangle};
use crate::layout::grid::GridCell;
use crate::layout::inline::LineBox;
use crate::layout::metrics::MinMaxWidth;
use crate::model::{ColumnWidth, Node, NodeKind};
use crate::style::{GridTrackSize, ResolvedStyle, Style};

/// Index of a renderer in the [`LayoutTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The closed set of box kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum RendererKind {
    Block,
    Paragraph,
    Text,
    Image { src: String, width: f64, height: f64 },
    Flex,
    Grid { columns: Vec<GridTrackSize> },
    Table { columns: Vec<ColumnWidth> },
    TableRow { is_header: bool },
    TableCell { col_span: u32, row_span: u32 },
    MultiColumn,
    AreaBreak,
}

impl RendererKind {
    pub fn name(&self) -> &'static str {
        match self {
            RendererKind::Block => "block",
            RendererKind::Paragraph => "paragraph",
            RendererKind::Text => "text",
            RendererKind::Image { .. } => "image",
            RendererKind::Flex => "flex",
            RendererKind::Grid { .. } => "grid",
            RendererKind::Table { .. } => "table",
            RendererKind::TableRow { .. } => "table row",
            RendererKind::TableCell { .. } => "table cell",
            RendererKind::MultiColumn => "multi-column",
            RendererKind::AreaBreak => "area break",
        }
    }

    /// Kinds laid out as a vertical stack of children.
    pub fn is_block_like(&self) -> bool {
        matches!(self, RendererKind::Block | RendererKind::TableCell { .. })
    }

    fn from_node_kind(kind: &NodeKind) -> Self {
        match kind {
            NodeKind::Block => RendererKind::Block,
            NodeKind::Paragraph => RendererKind::Paragraph,
            NodeKind::Text { .. } => RendererKind::Text,
            NodeKind::Image { src, width, height } => RendererKind::Image {
                src: src.clone(),
                width: *width,
                height: *height,
            },
            NodeKind::Flex => RendererKind::Flex,
            NodeKind::Grid { columns } => RendererKind::Grid {
                columns: columns.clone(),
            },
            NodeKind::Table { columns } => RendererKind::Table {
                columns: columns.clone(),
            },
            NodeKind::TableRow { is_header } => RendererKind::TableRow {
                is_header: *is_header,
            },
            NodeKind::TableCell { col_span, row_span } => RendererKind::TableCell {
                col_span: (*col_span).max(1),
                row_span: (*row_span).max(1),
            },
            NodeKind::MultiColumn => RendererKind::MultiColumn,
            NodeKind::AreaBreak => RendererKind::AreaBreak,
        }
    }
}

/// One renderer: authored data plus the working state of the last layout.
#[derive(Debug, Clone)]
pub struct NodeRecord {
    pub kind: RendererKind,
    pub style: Style,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// The authored node this record was split or cloned from.
    pub origin: NodeId,
    pub debug_id: Option<String>,

    /// Characters of a text run.
    pub text: Vec<char>,
    /// Break offsets found by the typography service, local to `text`.
    pub special_breaks: Option<Vec<usize>>,
    /// Grid placement that overrides the authored one.
    pub grid_area: Option<GridCell>,

    // Results of the last layout.
    pub occupied_area: Option<LayoutArea>,
    /// Unrotated border box.
    pub border_box: Option<Rectangle>,
    pub resolved: Option<ResolvedStyle>,
    pub clip: Option<Rectangle>,
    pub lines: Vec<LineBox>,
    /// Boxes painted in place of `children` (multi-column fragments).
    pub fragments: Vec<NodeId>,

    // Caches living as long as the record.
    pub min_max: Option<MinMaxWidth>,
    /// Hypothetical cross size keyed by main size and the container's
    /// definite cross size.
    pub cross_size_cache: HashMap<(u64, Option<u64>), f64>,
}

impl NodeRecord {
    fn new(id: NodeId, kind: RendererKind, style: Style) -> Self {
        Self {
            kind,
            style,
            parent: None,
            children: Vec::new(),
            origin: id,
            debug_id: None,
            text: Vec::new(),
            special_breaks: None,
            grid_area: None,
            occupied_area: None,
            border_box: None,
            resolved: None,
            clip: None,
            lines: Vec::new(),
            fragments: Vec::new(),
            min_max: None,
            cross_size_cache: HashMap::new(),
        }
    }

    /// Drop the results of a previous layout. Caches stay.
    pub(crate) fn reset_placement(&mut self) {
        self.occupied_area = None;
        self.border_box = None;
        self.clip = None;
        self.lines.clear();
        self.fragments.clear();
    }
}

/// Arena owning every renderer of one document.
#[derive(Debug, Clone, Default)]
pub struct LayoutTree {
    nodes: Vec<NodeRecord>,
    root: Option<NodeId>,
}

impl LayoutTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the arena from a document tree.
    ///
    /// Property maps are folded into styles, inherited text properties are
    /// propagated, and bare text outside a paragraph is wrapped in an
    /// anonymous one.
    pub fn from_document(document: &Node) -> Result<Self, LayoutError> {
        let mut tree = Self::new();
        let root = tree.build(document, &Style::default())?;
        let root = if tree.get(root)?.kind == RendererKind::Text {
            tree.wrap_in_paragraph(&[root], &Style::default())
        } else {
            root
        };
        tree.root = Some(root);
        Ok(tree)
    }

    fn build(&mut self, node: &Node, parent_style: &Style) -> Result<NodeId, LayoutError> {
        let mut style = node.style.clone();
        style.apply_properties(&node.properties)?;
        style.inherit_from(parent_style);

        let kind = RendererKind::from_node_kind(&node.kind);
        let id = self.add(kind.clone(), style.clone());
        self.nodes[id.0].debug_id = node.id.clone();

        if let NodeKind::Text { content } = &node.kind {
            self.nodes[id.0].text = content.chars().collect();
            return Ok(id);
        }

        let mut built = Vec::with_capacity(node.children.len());
        for child in &node.children {
            built.push(self.build(child, &style)?);
        }

        let children = if kind == RendererKind::Paragraph {
            built
        } else {
            // Group consecutive bare text runs into anonymous paragraphs.
            let mut grouped = Vec::with_capacity(built.len());
            let mut pending = Vec::new();
            for child in built {
                if self.nodes[child.0].kind == RendererKind::Text {
                    pending.push(child);
                    continue;
                }
                if !pending.is_empty() {
                    grouped.push(self.wrap_in_paragraph(&pending, &style));
                    pending.clear();
                }
                grouped.push(child);
            }
            if !pending.is_empty() {
                grouped.push(self.wrap_in_paragraph(&pending, &style));
            }
            grouped
        };

        for &child in &children {
            self.nodes[child.0].parent = Some(id);
        }
        self.nodes[id.0].children = children;
        Ok(id)
    }

    fn wrap_in_paragraph(&mut self, runs: &[NodeId], parent_style: &Style) -> NodeId {
        let mut style = Style::default();
        style.inherit_from(parent_style);
        let paragraph = self.add(RendererKind::Paragraph, style);
        for &run in runs {
            self.nodes[run.0].parent = Some(paragraph);
        }
        self.nodes[paragraph.0].children = runs.to_vec();
        paragraph
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn set_root(&mut self, root: NodeId) {
        self.root = Some(root);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Add a detached node.
    pub fn add(&mut self, kind: RendererKind, style: Style) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeRecord::new(id, kind, style));
        id
    }

    /// Add a text run.
    pub fn add_text(&mut self, content: &str, style: Style) -> NodeId {
        let id = self.add(RendererKind::Text, style);
        self.nodes[id.0].text = content.chars().collect();
        id
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), LayoutError> {
        self.get(child)?;
        self.get_mut(parent)?.children.push(child);
        self.nodes[child.0].parent = Some(parent);
        Ok(())
    }

    pub fn get(&self, id: NodeId) -> Result<&NodeRecord, LayoutError> {
        self.nodes.get(id.0).ok_or(LayoutError::UnknownNode(id))
    }

    pub fn get_mut(&mut self, id: NodeId) -> Result<&mut NodeRecord, LayoutError> {
        self.nodes.get_mut(id.0).ok_or(LayoutError::UnknownNode(id))
    }

    pub fn children(&self, id: NodeId) -> Result<&[NodeId], LayoutError> {
        Ok(&self.get(id)?.children)
    }

    pub fn kind(&self, id: NodeId) -> Result<&RendererKind, LayoutError> {
        Ok(&self.get(id)?.kind)
    }

    pub fn text(&self, id: NodeId) -> Result<String, LayoutError> {
        Ok(self.get(id)?.text.iter().collect())
    }

    /// All text of a subtree in document order.
    pub fn text_content(&self, id: NodeId) -> Result<String, LayoutError> {
        let record = self.get(id)?;
        let mut out: String = record.text.iter().collect();
        for &child in &record.children {
            out.push_str(&self.text_content(child)?);
        }
        Ok(out)
    }

    /// A copy of `id` holding `children` instead of its own. Layout results
    /// are copied; caches are not.
    pub fn clone_with_children(
        &mut self,
        id: NodeId,
        children: Vec<NodeId>,
    ) -> Result<NodeId, LayoutError> {
        let source = self.get(id)?;
        let new_id = NodeId(self.nodes.len());
        let mut record = NodeRecord::new(source.origin, source.kind.clone(), source.style.clone());
        record.origin = source.origin;
        record.parent = source.parent;
        record.debug_id = source.debug_id.clone();
        record.text = source.text.clone();
        record.special_breaks = source.special_breaks.clone();
        record.grid_area = source.grid_area;
        record.occupied_area = source.occupied_area;
        record.border_box = source.border_box;
        record.resolved = source.resolved.clone();
        record.clip = source.clip;
        record.lines = source.lines.clone();
        record.fragments = source.fragments.clone();
        record.children = children;

        for &child in &record.children {
            if let Some(c) = self.nodes.get_mut(child.0) {
                c.parent = Some(new_id);
            }
        }
        self.nodes.push(record);
        Ok(new_id)
    }

    /// An unstyled block holding `children`, standing in for a piece of
    /// `origin`.
    pub fn anonymous_block(
        &mut self,
        origin: NodeId,
        children: Vec<NodeId>,
    ) -> Result<NodeId, LayoutError> {
        let mut style = Style::default();
        style.inherit_from(&self.get(origin)?.style);
        let block = self.add(RendererKind::Block, style);
        self.nodes[block.0].origin = origin;
        for &child in &children {
            self.get_mut(child)?.parent = Some(block);
        }
        self.nodes[block.0].children = children;
        Ok(block)
    }

    /// A fresh copy of a whole subtree, sharing no record with it.
    pub fn deep_clone(&mut self, id: NodeId) -> Result<NodeId, LayoutError> {
        let children = self.get(id)?.children.clone();
        let mut copies = Vec::with_capacity(children.len());
        for child in children {
            copies.push(self.deep_clone(child)?);
        }
        let copy = self.clone_with_children(id, copies)?;
        self.nodes[copy.0].reset_placement();
        Ok(copy)
    }

    /// Cut a text run before char `at`. Special break offsets are handed to
    /// the piece that owns them, re-offset to its local indices.
    pub fn split_text(&mut self, id: NodeId, at: usize) -> Result<(NodeId, NodeId), LayoutError> {
        let record = self.get(id)?;
        if record.kind != RendererKind::Text {
            return Err(LayoutError::KindMismatch {
                expected: RendererKind::Text.name(),
                found: record.kind.name(),
            });
        }
        let at = at.min(record.text.len());
        let head_text = record.text[..at].to_vec();
        let tail_text = record.text[at..].to_vec();
        let breaks = record.special_breaks.clone();

        let head = self.clone_with_children(id, Vec::new())?;
        let tail = self.clone_with_children(id, Vec::new())?;
        for (piece, text) in [(head, head_text), (tail, tail_text)] {
            let r = &mut self.nodes[piece.0];
            r.text = text;
            r.reset_placement();
        }
        self.nodes[head.0].special_breaks = breaks
            .as_ref()
            .map(|b| b.iter().copied().filter(|&o| o < at).collect());
        self.nodes[tail.0].special_breaks = breaks
            .as_ref()
            .map(|b| b.iter().copied().filter(|&o| o > at).map(|o| o - at).collect());
        Ok((head, tail))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_text_is_wrapped_in_a_paragraph() {
        let doc = Node::new(NodeKind::Block).with_children(vec![
            Node::text("one"),
            Node::text("two"),
            Node::new(NodeKind::Block),
            Node::text("three"),
        ]);
        let tree = LayoutTree::from_document(&doc).unwrap();
        let root = tree.root().unwrap();
        let kids = tree.children(root).unwrap();
        assert_eq!(kids.len(), 3);
        assert_eq!(tree.kind(kids[0]).unwrap(), &RendererKind::Paragraph);
        assert_eq!(tree.children(kids[0]).unwrap().len(), 2);
        assert_eq!(tree.text_content(kids[2]).unwrap(), "three");
    }

    #[test]
    fn text_properties_inherit_down_the_tree() {
        let doc = Node::new(NodeKind::Block)
            .with_style(Style {
                font_size: Some(20.0),
                ..Default::default()
            })
            .with_children(vec![Node::new(NodeKind::Paragraph).with_children(vec![Node::text("x")])]);
        let tree = LayoutTree::from_document(&doc).unwrap();
        let root = tree.root().unwrap();
        let para = tree.children(root).unwrap()[0];
        let run = tree.children(para).unwrap()[0];
        assert_eq!(tree.get(run).unwrap().style.font_size, Some(20.0));
    }

    #[test]
    fn split_text_reoffsets_special_breaks() {
        let mut tree = LayoutTree::new();
        let run = tree.add_text("abcdefgh", Style::default());
        tree.get_mut(run).unwrap().special_breaks = Some(vec![2, 5, 7]);
        let (head, tail) = tree.split_text(run, 5).unwrap();
        assert_eq!(tree.text(head).unwrap(), "abcde");
        assert_eq!(tree.text(tail).unwrap(), "fgh");
        assert_eq!(tree.get(head).unwrap().special_breaks, Some(vec![2]));
        assert_eq!(tree.get(tail).unwrap().special_breaks, Some(vec![2]));
        assert_eq!(tree.get(tail).unwrap().origin, run);
    }

    #[test]
    fn deep_clone_shares_no_records() {
        let mut tree = LayoutTree::new();
        let row = tree.add(RendererKind::TableRow { is_header: true }, Style::default());
        let cell = tree.add(
            RendererKind::TableCell {
                col_span: 1,
                row_span: 1,
            },
            Style::default(),
        );
        tree.append_child(row, cell).unwrap();
        let copy = tree.deep_clone(row).unwrap();
        assert_ne!(copy, row);
        assert_ne!(tree.children(copy).unwrap()[0], cell);
        assert_eq!(tree.get(copy).unwrap().origin, row);
    }
}

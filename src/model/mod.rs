//! # Document Model
//!
//! The input to layout. A document is a tree of [`Node`]s, each with a kind,
//! a style and children. This is the serializable boundary: producers write
//! JSON (or build the structs directly) and [`crate::layout::LayoutTree`]
//! turns it into the arena the renderers work on.

use serde::{Deserialize, Serialize};

use crate::style::{GridTrackSize, PropertyMap, Style};

/// A node in the document tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// What kind of node this is.
    pub kind: NodeKind,

    /// Style properties for this node.
    #[serde(default)]
    pub style: Style,

    /// Key→value configuration applied on top of `style`.
    #[serde(default, skip_serializing_if = "PropertyMap::is_empty")]
    pub properties: PropertyMap,

    /// Child nodes.
    #[serde(default)]
    pub children: Vec<Node>,

    /// A unique identifier for this node (optional, useful for debugging).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            ..Default::default()
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self::new(NodeKind::Text {
            content: content.into(),
        })
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }
}

/// The different kinds of nodes in the document tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NodeKind {
    /// A generic container, analogous to a `<div>`.
    #[default]
    Block,

    /// A container of inline content laid out in lines.
    Paragraph,

    /// A run of text. Outside a paragraph it is wrapped in one.
    Text { content: String },

    /// A replaced box of fixed intrinsic size.
    Image {
        src: String,
        /// Width in points.
        width: f64,
        /// Height in points.
        height: f64,
    },

    /// A flex container.
    Flex,

    /// A grid container.
    Grid {
        /// Column track template. If omitted, `columnCount` equal `1fr` tracks.
        #[serde(default)]
        columns: Vec<GridTrackSize>,
    },

    /// A table container. Children should be TableRow nodes.
    Table {
        /// Declared column widths. Missing entries are auto.
        #[serde(default)]
        columns: Vec<ColumnWidth>,
    },

    /// A row inside a Table.
    TableRow {
        /// Header rows repeat at the top of every area the table spans.
        #[serde(default)]
        is_header: bool,
    },

    /// A cell inside a TableRow.
    TableCell {
        #[serde(default = "default_one")]
        col_span: u32,
        #[serde(default = "default_one")]
        row_span: u32,
    },

    /// Content balanced across `columnCount` equal columns.
    MultiColumn,

    /// Ends the current area.
    AreaBreak,
}

fn default_one() -> u32 {
    1
}

/// Declared width of a table column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ColumnWidth {
    /// Fixed width in points.
    Pt(f64),
    /// Percentage of the table's content width.
    Percent(f64),
    /// Sized from cell content.
    Auto,
}

//! # Style System
//!
//! A CSS-like style model for layout boxes. This is intentionally a subset
//! of CSS: the box model, flexbox, grid placement, floats, overflow and the
//! handful of text properties that line layout needs.
//!
//! Authors supply a [`Style`] (every field optional) either directly or as a
//! key→value [`PropertyMap`]. Layout works on a [`ResolvedStyle`] where every
//! value is concrete and percentages are resolved against the area offered.

mod properties;

pub use properties::{Property, PropertyMap, PropertyValue};

use serde::{Deserialize, Serialize};

use crate::geometry::Edges;

/// The complete set of style properties for a node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Style {
    // ── Box Model ──────────────────────────────────────────────
    /// Explicit width of the border box.
    pub width: Option<Dimension>,
    /// Explicit height of the border box.
    pub height: Option<Dimension>,
    pub min_width: Option<Dimension>,
    pub min_height: Option<Dimension>,
    pub max_width: Option<Dimension>,
    pub max_height: Option<Dimension>,

    /// Padding inside the border.
    #[serde(default)]
    pub padding: Option<Edges>,
    /// Margin outside the border.
    #[serde(default)]
    pub margin: Option<Edges>,
    /// Border width for each side.
    #[serde(default)]
    pub border_width: Option<Edges>,
    pub border_color: Option<Color>,
    pub background_color: Option<Color>,

    // ── Flexbox Layout ─────────────────────────────────────────
    #[serde(default)]
    pub flex_direction: Option<FlexDirection>,
    #[serde(default)]
    pub justify_content: Option<JustifyContent>,
    #[serde(default)]
    pub align_items: Option<AlignItems>,
    /// Override align-items for this specific child.
    #[serde(default)]
    pub align_self: Option<AlignItems>,
    #[serde(default)]
    pub flex_wrap: Option<FlexWrap>,
    pub align_content: Option<AlignContent>,
    pub flex_grow: Option<f64>,
    pub flex_shrink: Option<f64>,
    /// Flex basis (initial main size).
    pub flex_basis: Option<Dimension>,
    /// Gap between items, both axes.
    pub gap: Option<f64>,
    /// Row gap (overrides gap for rows).
    pub row_gap: Option<f64>,
    /// Column gap (overrides gap for columns).
    pub column_gap: Option<f64>,

    // ── Grid & Columns ─────────────────────────────────────────
    /// 1-based grid line the item starts at, as authored.
    pub grid_row_start: Option<i32>,
    pub grid_row_end: Option<i32>,
    pub grid_column_start: Option<i32>,
    pub grid_column_end: Option<i32>,
    /// Span used when only one bound (or none) is authored.
    pub grid_row_span: Option<u32>,
    pub grid_column_span: Option<u32>,
    pub grid_auto_flow: Option<GridAutoFlow>,
    /// Column count of a grid or multi-column box.
    pub column_count: Option<u32>,
    /// Declared row count of a grid.
    pub row_count: Option<u32>,

    // ── Typography ─────────────────────────────────────────────
    pub font_family: Option<String>,
    pub font_size: Option<f64>,
    pub font_weight: Option<u32>,
    /// Line height as a multiplier of font size.
    pub line_height: Option<f64>,
    pub text_align: Option<TextAlign>,
    pub direction: Option<Direction>,
    pub color: Option<Color>,

    // ── Floats & Overflow ──────────────────────────────────────
    pub float: Option<Float>,
    pub clear: Option<Clear>,
    pub overflow_x: Option<Overflow>,
    pub overflow_y: Option<Overflow>,

    // ── Area Behavior ──────────────────────────────────────────
    /// Keep this box in a single area. If it cannot fit an empty area the
    /// layout fails instead of splitting it.
    pub keep_together: Option<bool>,
    /// Rotation in radians, applied around the top-left corner.
    pub rotation_angle: Option<f64>,
}

/// A dimension that can be points, percentage, or auto.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Dimension {
    /// Fixed size in points (1/72 inch).
    Pt(f64),
    /// Percentage of the containing block's corresponding dimension.
    Percent(f64),
    /// Size determined by content.
    Auto,
}

impl Dimension {
    /// Resolve this dimension given a parent size.
    /// Returns None for Auto, and for percentages without a parent size.
    pub fn resolve(&self, parent_size: Option<f64>) -> Option<f64> {
        match self {
            Dimension::Pt(v) => Some(*v),
            Dimension::Percent(p) => parent_size.map(|s| s * p / 100.0),
            Dimension::Auto => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlexDirection {
    #[default]
    Row,
    Column,
    RowReverse,
    ColumnReverse,
}

impl FlexDirection {
    pub fn is_row(&self) -> bool {
        matches!(self, FlexDirection::Row | FlexDirection::RowReverse)
    }

    pub fn is_reverse(&self) -> bool {
        matches!(self, FlexDirection::RowReverse | FlexDirection::ColumnReverse)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum JustifyContent {
    #[default]
    FlexStart,
    FlexEnd,
    Center,
    SpaceBetween,
    SpaceAround,
    SpaceEvenly,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlignItems {
    FlexStart,
    FlexEnd,
    Center,
    #[default]
    Stretch,
    Baseline,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlexWrap {
    #[default]
    NoWrap,
    Wrap,
    WrapReverse,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlignContent {
    #[default]
    FlexStart,
    FlexEnd,
    Center,
    SpaceBetween,
    SpaceAround,
    SpaceEvenly,
    Stretch,
}

/// A grid track size definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GridTrackSize {
    /// Fixed size in points.
    Pt(f64),
    /// Fractional unit of the space left after fixed and auto tracks.
    Fr(f64),
    /// Sized to content.
    Auto,
    /// Content size clamped between two track sizes.
    MinMax(Box<GridTrackSize>, Box<GridTrackSize>),
}

/// Grid auto-placement direction and packing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GridAutoFlow {
    #[default]
    Row,
    Column,
    RowDense,
    ColumnDense,
}

impl GridAutoFlow {
    pub fn is_column(&self) -> bool {
        matches!(self, GridAutoFlow::Column | GridAutoFlow::ColumnDense)
    }

    pub fn is_dense(&self) -> bool {
        matches!(self, GridAutoFlow::RowDense | GridAutoFlow::ColumnDense)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextAlign {
    #[default]
    Left,
    Right,
    Center,
    Justify,
}

/// Paragraph base direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    Ltr,
    Rtl,
    /// Detect from the first strong character.
    Auto,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Float {
    #[default]
    None,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Clear {
    #[default]
    None,
    Left,
    Right,
    Both,
}

/// What happens to content that does not fit its box or area.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Overflow {
    /// Content must fit; otherwise the box reports no room.
    #[default]
    Fit,
    /// Content is placed and may extend outside the box.
    Visible,
    /// Content is placed and clipped to the box.
    Hidden,
}

/// RGB color, components in 0.0..=1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };
    pub const WHITE: Color = Color {
        r: 1.0,
        g: 1.0,
        b: 1.0,
    };

    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rgb` or `#rrggbb`. Unparseable input yields black.
    pub fn hex(hex: &str) -> Self {
        let hex = hex.trim_start_matches('#');
        let channel = |s: &str| u8::from_str_radix(s, 16).map(|v| v as f64 / 255.0).ok();
        let parsed = match hex.len() {
            3 => {
                let expand = |i: usize| {
                    let c = &hex[i..i + 1];
                    channel(&format!("{c}{c}"))
                };
                expand(0).zip(expand(1)).zip(expand(2))
            }
            6 => channel(&hex[0..2])
                .zip(channel(&hex[2..4]))
                .zip(channel(&hex[4..6])),
            _ => None,
        };
        match parsed {
            Some(((r, g), b)) => Self { r, g, b },
            None => Self::BLACK,
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SizeConstraint {
    Fixed(f64),
    Auto,
}

impl SizeConstraint {
    pub fn fixed(&self) -> Option<f64> {
        match self {
            SizeConstraint::Fixed(v) => Some(*v),
            SizeConstraint::Auto => None,
        }
    }

    pub fn is_auto(&self) -> bool {
        matches!(self, SizeConstraint::Auto)
    }
}

/// Resolved style: all values are concrete.
/// This is what the layout engine works with after style resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStyle {
    // Box model
    pub width: SizeConstraint,
    pub height: SizeConstraint,
    pub min_width: f64,
    pub min_height: f64,
    pub max_width: f64,
    pub max_height: f64,
    pub padding: Edges,
    pub margin: Edges,
    pub border_width: Edges,
    pub border_color: Color,
    pub background_color: Option<Color>,

    // Flex
    pub flex_direction: FlexDirection,
    pub justify_content: JustifyContent,
    pub align_items: AlignItems,
    pub align_self: Option<AlignItems>,
    pub flex_wrap: FlexWrap,
    pub align_content: AlignContent,
    pub flex_grow: f64,
    pub flex_shrink: f64,
    pub flex_basis: SizeConstraint,
    pub row_gap: f64,
    pub column_gap: f64,

    // Grid & columns
    pub grid_auto_flow: GridAutoFlow,
    pub column_count: Option<u32>,
    pub row_count: Option<u32>,

    // Text
    pub font_family: String,
    pub font_size: f64,
    pub font_weight: u32,
    pub line_height: f64,
    pub text_align: TextAlign,
    pub direction: Direction,
    pub color: Color,

    // Floats & overflow
    pub float: Float,
    pub clear: Clear,
    pub overflow_x: Overflow,
    pub overflow_y: Overflow,

    // Area behavior
    pub keep_together: bool,
    pub rotation_angle: f64,
}

impl ResolvedStyle {
    /// Border plus padding on every side.
    pub fn border_padding(&self) -> Edges {
        self.border_width + self.padding
    }

    /// Margin, border and padding on every side.
    pub fn all_edges(&self) -> Edges {
        self.margin + self.border_width + self.padding
    }

    /// Clamp a border-box width by min-width and max-width. When the two
    /// conflict, min-width wins.
    pub fn clamp_width(&self, width: f64) -> f64 {
        width.min(self.max_width).max(self.min_width)
    }

    pub fn clamp_height(&self, height: f64) -> f64 {
        height.min(self.max_height).max(self.min_height)
    }

    /// Height of one line box of text in this style.
    pub fn line_box_height(&self) -> f64 {
        self.font_size * self.line_height
    }

    pub fn is_floating(&self) -> bool {
        !matches!(self.float, Float::None)
    }
}

impl Style {
    /// Copy inherited text properties from `parent` where this style leaves
    /// them unset.
    pub fn inherit_from(&mut self, parent: &Style) {
        if self.font_family.is_none() {
            self.font_family = parent.font_family.clone();
        }
        self.font_size = self.font_size.or(parent.font_size);
        self.font_weight = self.font_weight.or(parent.font_weight);
        self.line_height = self.line_height.or(parent.line_height);
        self.text_align = self.text_align.or(parent.text_align);
        self.direction = self.direction.or(parent.direction);
        self.color = self.color.or(parent.color);
    }

    /// Resolve this style against the width (and, when known, height) of
    /// the containing area.
    pub fn resolve(&self, available_width: f64, available_height: Option<f64>) -> ResolvedStyle {
        let width = Some(available_width);
        let direction = self.direction.unwrap_or_default();

        ResolvedStyle {
            width: to_constraint(self.width, width),
            height: to_constraint(self.height, available_height),
            min_width: self.min_width.and_then(|d| d.resolve(width)).unwrap_or(0.0),
            min_height: self
                .min_height
                .and_then(|d| d.resolve(available_height))
                .unwrap_or(0.0),
            max_width: self
                .max_width
                .and_then(|d| d.resolve(width))
                .unwrap_or(f64::INFINITY),
            max_height: self
                .max_height
                .and_then(|d| d.resolve(available_height))
                .unwrap_or(f64::INFINITY),
            padding: self.padding.unwrap_or_default(),
            margin: self.margin.unwrap_or_default(),
            border_width: self.border_width.unwrap_or_default(),
            border_color: self.border_color.unwrap_or(Color::BLACK),
            background_color: self.background_color,

            flex_direction: self.flex_direction.unwrap_or_default(),
            justify_content: self.justify_content.unwrap_or_default(),
            align_items: self.align_items.unwrap_or_default(),
            align_self: self.align_self,
            flex_wrap: self.flex_wrap.unwrap_or_default(),
            align_content: self.align_content.unwrap_or_default(),
            flex_grow: self.flex_grow.unwrap_or(0.0).max(0.0),
            flex_shrink: self.flex_shrink.unwrap_or(1.0).max(0.0),
            flex_basis: to_constraint(self.flex_basis, width),
            row_gap: self.row_gap.or(self.gap).unwrap_or(0.0),
            column_gap: self.column_gap.or(self.gap).unwrap_or(0.0),

            grid_auto_flow: self.grid_auto_flow.unwrap_or_default(),
            column_count: self.column_count,
            row_count: self.row_count,

            font_family: self
                .font_family
                .clone()
                .unwrap_or_else(|| "Helvetica".to_string()),
            font_size: self.font_size.unwrap_or(12.0),
            font_weight: self.font_weight.unwrap_or(400),
            line_height: self.line_height.unwrap_or(1.2),
            text_align: self.text_align.unwrap_or(match direction {
                Direction::Rtl => TextAlign::Right,
                _ => TextAlign::Left,
            }),
            direction,
            color: self.color.unwrap_or(Color::BLACK),

            float: self.float.unwrap_or_default(),
            clear: self.clear.unwrap_or_default(),
            overflow_x: self.overflow_x.unwrap_or_default(),
            overflow_y: self.overflow_y.unwrap_or_default(),

            keep_together: self.keep_together.unwrap_or(false),
            rotation_angle: self.rotation_angle.unwrap_or(0.0),
        }
    }
}

fn to_constraint(dimension: Option<Dimension>, parent: Option<f64>) -> SizeConstraint {
    dimension
        .and_then(|d| d.resolve(parent))
        .map(SizeConstraint::Fixed)
        .unwrap_or(SizeConstraint::Auto)
}

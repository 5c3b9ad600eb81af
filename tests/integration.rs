//! Integration tests for the quire layout pipeline.
//!
//! These tests exercise the full path from a document tree (or JSON) to
//! placed, painted areas. They verify:
//! - Flex, grid and table containers size their children as documented
//! - Content split across areas is placed exactly once, with no gaps
//! - Intrinsic widths are consistent for every box
//! - JSON input deserializes and lays out end to end

use quire::error::Diagnostic;
use quire::geometry::Rectangle;
use quire::layout::{LayoutEngine, LayoutTree, NodeId, RendererKind, UniformAreas};
use quire::model::{ColumnWidth, Node, NodeKind};
use quire::paint::{DisplayList, DrawCommand};
use quire::style::{Dimension, Style};
use quire::{layout_document, layout_json, LayoutConfig, LayoutError};

// ─── Helpers ────────────────────────────────────────────────────

fn make_text(content: &str, font_size: f64) -> Node {
    Node::text(content).with_style(Style {
        font_size: Some(font_size),
        ..Default::default()
    })
}

fn make_paragraph(content: &str) -> Node {
    Node::new(NodeKind::Paragraph).with_children(vec![make_text(content, 10.0)])
}

fn make_block(height: f64) -> Node {
    Node::new(NodeKind::Block).with_style(Style {
        height: Some(Dimension::Pt(height)),
        ..Default::default()
    })
}

fn make_cell(col_span: u32, style: Style) -> Node {
    Node::new(NodeKind::TableCell {
        col_span,
        row_span: 1,
    })
    .with_style(style)
}

fn build(document: &Node) -> (LayoutEngine, NodeId) {
    let tree = LayoutTree::from_document(document).unwrap();
    let root = tree.root().unwrap();
    (LayoutEngine::new(tree), root)
}

fn children(engine: &LayoutEngine, id: NodeId) -> Vec<NodeId> {
    engine.tree().children(id).unwrap().to_vec()
}

fn border_box(engine: &LayoutEngine, id: NodeId) -> Rectangle {
    engine.tree().get(id).unwrap().border_box.unwrap()
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 0.01,
        "expected {expected}, got {actual}"
    );
}

fn paint(engine: &mut LayoutEngine, root: NodeId, width: f64, height: f64) -> (usize, DisplayList) {
    let areas = engine
        .layout_areas(root, &mut UniformAreas::new(width, height))
        .unwrap();
    let mut list = DisplayList::new();
    engine.paint(&areas, &mut list).unwrap();
    (areas.len(), list)
}

fn all_nodes(engine: &LayoutEngine, id: NodeId, out: &mut Vec<NodeId>) {
    out.push(id);
    for child in children(engine, id) {
        all_nodes(engine, child, out);
    }
}

// ─── Flex ───────────────────────────────────────────────────────

#[test]
fn test_flex_items_grow_equally() {
    let item = || {
        Node::new(NodeKind::Block).with_style(Style {
            flex_grow: Some(1.0),
            flex_shrink: Some(1.0),
            ..Default::default()
        })
    };
    let doc = Node::new(NodeKind::Flex)
        .with_style(Style {
            width: Some(Dimension::Pt(400.0)),
            height: Some(Dimension::Pt(100.0)),
            ..Default::default()
        })
        .with_children(vec![item(), item(), item()]);
    let (mut engine, root) = build(&doc);
    let (areas, _) = paint(&mut engine, root, 400.0, 500.0);
    assert_eq!(areas, 1);
    for (i, item) in children(&engine, root).into_iter().enumerate() {
        let rect = border_box(&engine, item);
        assert_close(rect.width, 400.0 / 3.0);
        assert_close(rect.height, 100.0);
        assert_close(rect.x, i as f64 * 400.0 / 3.0);
    }
}

#[test]
fn test_flex_items_shrink_by_weighted_basis() {
    let item = |basis: f64| {
        Node::new(NodeKind::Block).with_style(Style {
            flex_basis: Some(Dimension::Pt(basis)),
            flex_grow: Some(0.0),
            flex_shrink: Some(1.0),
            height: Some(Dimension::Pt(10.0)),
            ..Default::default()
        })
    };
    let doc = Node::new(NodeKind::Flex)
        .with_style(Style {
            width: Some(Dimension::Pt(400.0)),
            ..Default::default()
        })
        .with_children(vec![item(100.0), item(200.0), item(300.0)]);
    let (mut engine, root) = build(&doc);
    paint(&mut engine, root, 400.0, 500.0);
    let widths: Vec<f64> = children(&engine, root)
        .into_iter()
        .map(|c| border_box(&engine, c).width)
        .collect();
    for (actual, expected) in widths.iter().zip([66.67, 133.33, 200.0]) {
        assert_close(*actual, expected);
    }
    assert_close(widths.iter().sum(), 400.0);
}

// ─── Grid ───────────────────────────────────────────────────────

#[test]
fn test_grid_spanning_item_occupies_every_cell_once() {
    let spanning = Node::new(NodeKind::Block).with_style(Style {
        grid_column_start: Some(2),
        grid_column_end: Some(4),
        ..Default::default()
    });
    let doc = Node::new(NodeKind::Grid { columns: vec![] })
        .with_style(Style {
            column_count: Some(3),
            row_count: Some(3),
            ..Default::default()
        })
        .with_children(vec![make_block(10.0), spanning, make_block(10.0)]);
    let (mut engine, root) = build(&doc);
    let items = children(&engine, root);
    let grid = engine.grid_placement(root).unwrap();

    assert_eq!(grid.get(0, 0), Some(items[0]));
    assert_eq!(grid.get(0, 1), Some(items[1]));
    assert_eq!(grid.get(0, 2), Some(items[1]));
    assert_eq!(grid.get(1, 0), Some(items[2]));
    assert_eq!(grid.unique_items(), items);
}

#[test]
fn test_grid_rows_continue_in_next_area() {
    let doc = Node::new(NodeKind::Grid { columns: vec![] })
        .with_style(Style {
            column_count: Some(2),
            ..Default::default()
        })
        .with_children((0..6).map(|_| make_block(40.0)).collect());
    let (mut engine, root) = build(&doc);
    let items = children(&engine, root);
    let (areas, list) = paint(&mut engine, root, 200.0, 100.0);
    assert_eq!(areas, 2);
    for item in items {
        assert_eq!(list.boxes_of(item).len(), 1, "item {item} painted once");
    }
}

// ─── Tables ─────────────────────────────────────────────────────

#[test]
fn test_table_percent_overflow_keeps_declared_width() {
    let wide = make_cell(
        3,
        Style {
            width: Some(Dimension::Percent(200.0)),
            ..Default::default()
        },
    );
    let narrow = || make_cell(1, Style::default());
    let doc = Node::new(NodeKind::Table {
        columns: vec![
            ColumnWidth::Percent(2.0),
            ColumnWidth::Percent(1.0),
            ColumnWidth::Percent(1.0),
        ],
    })
    .with_style(Style {
        width: Some(Dimension::Pt(400.0)),
        ..Default::default()
    })
    .with_children(vec![
        Node::new(NodeKind::TableRow { is_header: false }).with_children(vec![wide]),
        Node::new(NodeKind::TableRow { is_header: false })
            .with_children(vec![narrow(), narrow(), narrow()]),
    ]);
    let (mut engine, root) = build(&doc);
    paint(&mut engine, root, 500.0, 500.0);

    assert!(engine
        .diagnostics()
        .iter()
        .any(|d| matches!(d, Diagnostic::PercentOverflow { .. })));
    let rows = children(&engine, root);
    let cells = children(&engine, rows[1]);
    let widths: Vec<f64> = cells.iter().map(|&c| border_box(&engine, c).width).collect();
    assert_close(widths.iter().sum(), 400.0);
    assert_close(border_box(&engine, children(&engine, rows[0])[0]).width, 400.0);
}

#[test]
fn test_table_header_repeats_in_every_area() {
    let row = |is_header: bool| {
        Node::new(NodeKind::TableRow { is_header }).with_children(vec![
            make_cell(1, Style::default()).with_children(vec![make_block(30.0)])
        ])
    };
    let mut rows = vec![row(true)];
    rows.extend((0..5).map(|_| row(false)));
    let doc = Node::new(NodeKind::Table {
        columns: vec![ColumnWidth::Auto],
    })
    .with_children(rows);
    let (mut engine, root) = build(&doc);
    let (areas, list) = paint(&mut engine, root, 100.0, 100.0);

    // Header plus two body rows per area.
    assert_eq!(areas, 3);
    let header_boxes = list
        .commands
        .iter()
        .filter(|c| matches!(c, DrawCommand::Box { kind: "table row", rect, .. } if rect.y == 0.0))
        .count();
    assert_eq!(header_boxes, 3);
}

// ─── Areas ──────────────────────────────────────────────────────

#[test]
fn test_split_content_is_placed_exactly_once() {
    let doc = Node::new(NodeKind::Block).with_children((0..7).map(|_| make_block(30.0)).collect());
    let (mut engine, root) = build(&doc);
    let blocks = children(&engine, root);
    let (areas, list) = paint(&mut engine, root, 100.0, 100.0);
    assert_eq!(areas, 3);
    for block in blocks {
        assert_eq!(list.boxes_of(block).len(), 1);
    }
}

#[test]
fn test_paragraph_lines_flow_across_areas() {
    let text = "aaa bbb ccc ddd eee fff ggg";
    let doc = make_paragraph(text);
    let (mut engine, root) = build(&doc);
    let (areas, list) = paint(&mut engine, root, 40.0, 30.0);
    assert_eq!(areas, 2);
    assert_eq!(list.text_lines().join(" "), text);
}

#[test]
fn test_area_break_starts_a_new_area() {
    let doc = Node::new(NodeKind::Block).with_children(vec![
        make_paragraph("one"),
        Node::new(NodeKind::AreaBreak),
        make_paragraph("two"),
    ]);
    let laid_out = layout_document(&doc, 100.0, 100.0, LayoutConfig::default()).unwrap();
    assert_eq!(laid_out.area_count, 2);
    assert_eq!(laid_out.display_list.text_lines(), vec!["one", "two"]);
}

#[test]
fn test_keep_together_conflict_is_reported() {
    let doc = Node::new(NodeKind::Block)
        .with_style(Style {
            keep_together: Some(true),
            ..Default::default()
        })
        .with_children(vec![make_block(60.0), make_block(60.0)]);
    let err = layout_document(&doc, 100.0, 100.0, LayoutConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        LayoutError::KeepTogetherConflict { area_index: 0, .. }
    ));
}

// ─── Metrics ────────────────────────────────────────────────────

#[test]
fn test_min_never_exceeds_max() {
    let doc = Node::new(NodeKind::Block).with_children(vec![
        make_paragraph("a bb ccc dddd"),
        Node::new(NodeKind::Flex).with_children(vec![
            make_paragraph("flex item"),
            make_block(10.0),
        ]),
        Node::new(NodeKind::Grid { columns: vec![] })
            .with_style(Style {
                column_count: Some(2),
                ..Default::default()
            })
            .with_children(vec![make_paragraph("x yy"), make_paragraph("zzz")]),
        Node::new(NodeKind::MultiColumn)
            .with_style(Style {
                column_count: Some(2),
                ..Default::default()
            })
            .with_children(vec![make_paragraph("one two three")]),
    ]);
    let (mut engine, root) = build(&doc);
    let mut nodes = Vec::new();
    all_nodes(&engine, root, &mut nodes);
    for id in nodes {
        let m = engine.min_max_width(id).unwrap();
        assert!(
            0.0 <= m.min_width && m.min_width <= m.max_width,
            "{id}: {m:?}"
        );
    }
}

// ─── JSON ───────────────────────────────────────────────────────

#[test]
fn test_json_document_lays_out() {
    let json = r#"{
        "kind": {"type": "Block"},
        "children": [
            {"kind": {"type": "Text", "content": "Hello"}, "style": {"fontSize": 10}},
            {"kind": {"type": "MultiColumn"}, "style": {"columnCount": 2},
             "children": [
                {"kind": {"type": "Block"}, "style": {"height": {"Pt": 20}}},
                {"kind": {"type": "Block"}, "style": {"height": {"Pt": 20}}}
             ]}
        ]
    }"#;
    let laid_out = layout_json(json, 200.0, 200.0).unwrap();
    assert_eq!(laid_out.area_count, 1);
    assert_eq!(laid_out.display_list.text_lines(), vec!["Hello"]);
    assert!(laid_out.diagnostics.is_empty());
    let kinds: Vec<&str> = laid_out
        .display_list
        .commands
        .iter()
        .filter_map(|c| match c {
            DrawCommand::Box { kind, .. } => Some(*kind),
            _ => None,
        })
        .collect();
    assert_eq!(
        kinds,
        vec!["block", "paragraph", "multi-column", "block", "block", "block", "block"]
    );
}

#[test]
fn test_invalid_json_is_an_error() {
    let err = layout_json(r#"{"kind": {"type": "Nope"}}"#, 100.0, 100.0).unwrap_err();
    assert!(matches!(err, LayoutError::InvalidDocument(_)));
}

#[test]
fn test_renderer_kinds_follow_the_document() {
    let doc = Node::new(NodeKind::Block).with_children(vec![make_text("bare", 10.0)]);
    let (engine, root) = build(&doc);
    let wrapper = children(&engine, root)[0];
    assert_eq!(engine.tree().kind(wrapper).unwrap(), &RendererKind::Paragraph);
}

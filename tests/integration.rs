//! Integration tests for the quire layout pipeline.
//!
//! These tests drive the public API from a JSON source through formatting
//! to recorded draw commands. They verify:
//! - float rows and clearing
//! - page breaking of dynamic pages
//! - drawing task ordering and the single-draw rule
//! - end-to-end text, table and list output

use quire::draw::recording::RecordingEngine;
use quire::draw::{DrawCommand, DrawingTask, DrawingTaskHeap};
use quire::geometry::{Boundary, Point};
use quire::model::{Element, Source};
use quire::tree::{NodeId, NodeKind};
use quire::{Document, LayoutError};

// ─── Helpers ────────────────────────────────────────────────────

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 0.01
}

fn document(page_size: &str, children: Vec<Element>) -> Document {
    let page = children
        .into_iter()
        .fold(Element::new("page").attr("page-size", page_size), Element::child);
    Document::from_source(Source {
        children: vec![page],
        ..Source::default()
    })
    .unwrap()
}

fn dynamic_document(page_size: &str, children: Vec<Element>) -> Document {
    let page = children
        .into_iter()
        .fold(Element::new("dynamic-page").attr("page-size", page_size), Element::child);
    Document::from_source(Source {
        children: vec![page],
        ..Source::default()
    })
    .unwrap()
}

fn block(width: f64, height: f64, float: &str) -> Element {
    Element::new("div")
        .attr("width", width)
        .attr("height", height)
        .attr("float", float)
}

/// Children of the first content node on the first page.
fn content_children(doc: &Document) -> Vec<NodeId> {
    let page = doc.pages()[0];
    let container = doc.tree().children(page)[0];
    doc.tree().children(container).to_vec()
}

// ─── Floats ─────────────────────────────────────────────────────

#[test]
fn test_unfloated_child_starts_a_new_row() {
    let mut doc = document(
        "200:400",
        vec![Element::new("div")
            .child(block(50.0, 20.0, "left"))
            .child(block(30.0, 20.0, "none"))
            .child(block(50.0, 20.0, "left"))],
    );
    doc.format().unwrap();

    let tree = doc.tree();
    let ids = content_children(&doc);
    assert_eq!(tree.first_point(ids[0]), Point::new(0.0, 400.0));
    assert_eq!(tree.first_point(ids[1]), Point::new(0.0, tree.diagonal_point(ids[0]).y));
    assert_eq!(tree.first_point(ids[2]), Point::new(0.0, tree.diagonal_point(ids[1]).y));
    assert!(approx_eq(tree.diagonal_point(ids[1]).y, 360.0));
}

#[test]
fn test_floats_around_a_cleared_child_form_two_rows() {
    let mut doc = document(
        "200:400",
        vec![Element::new("div")
            .child(block(20.0, 20.0, "left"))
            .child(block(20.0, 20.0, "left"))
            .child(block(20.0, 20.0, "none"))
            .child(block(20.0, 20.0, "left"))
            .child(block(20.0, 20.0, "left"))],
    );
    doc.format().unwrap();

    let tree = doc.tree();
    let points: Vec<Point> = content_children(&doc).iter().map(|&id| tree.first_point(id)).collect();
    assert_eq!(points[0], Point::new(0.0, 400.0));
    assert_eq!(points[1], Point::new(20.0, 400.0));
    assert_eq!(points[2], Point::new(0.0, 380.0));
    assert_eq!(points[3], Point::new(0.0, 360.0));
    assert_eq!(points[4], Point::new(20.0, 360.0));

    let page = doc.pages()[0];
    let container = tree.children(page)[0];
    assert!(approx_eq(tree.height(container), 60.0));
    assert!(approx_eq(tree.diagonal_point(container).y, 400.0 - 60.0));
}

#[test]
fn test_floats_directly_on_a_page_share_a_row() {
    let mut doc = document("200:400", vec![block(50.0, 20.0, "left"), block(50.0, 20.0, "left")]);
    doc.format().unwrap();

    let tree = doc.tree();
    let page = doc.pages()[0];
    let ids = tree.children(page);
    assert_eq!(tree.first_point(ids[0]), Point::new(0.0, 400.0));
    assert_eq!(tree.first_point(ids[1]), Point::new(50.0, 400.0));
    assert_eq!(tree.diagonal_point(page), Point::new(200.0, 0.0));
}

#[test]
fn test_floats_on_a_dynamic_page_are_laid_out_before_breaking() {
    let mut doc = dynamic_document(
        "200:100",
        vec![
            block(100.0, 60.0, "left"),
            block(100.0, 60.0, "right"),
            Element::new("div").attr("height", 60.0).attr("breakable", false),
        ],
    );
    doc.format().unwrap();

    let pages = doc.pages();
    assert_eq!(pages.len(), 2);
    let tree = doc.tree();
    let first = tree.children(pages[0]);
    assert_eq!(first.len(), 2);
    assert_eq!(tree.first_point(first[0]), Point::new(0.0, 100.0));
    assert_eq!(tree.first_point(first[1]), Point::new(100.0, 100.0));
    let second = tree.children(pages[1]);
    assert_eq!(tree.first_point(second[0]).y, 100.0);
}

// ─── Page breaking ──────────────────────────────────────────────

#[test]
fn test_content_filling_the_page_exactly_stays_on_one_page() {
    let mut doc = dynamic_document(
        "200:100",
        vec![
            Element::new("div").attr("height", 50.0),
            Element::new("div").attr("height", 50.0),
        ],
    );
    doc.format().unwrap();

    let pages = doc.pages();
    assert_eq!(pages.len(), 1);
    let first = doc.tree().children(pages[0])[0];
    assert_eq!(doc.tree().first_point(first), Point::new(0.0, 100.0));
}

#[test]
fn test_tall_content_is_spread_over_pages() {
    let mut doc = dynamic_document("200:100", vec![Element::new("div").attr("height", 400.0)]);
    doc.format().unwrap();

    let pages = doc.pages();
    assert_eq!(pages.len(), 4);
    for page in pages {
        let tree = doc.tree();
        let piece = tree.children(page)[0];
        assert_eq!(tree.first_point(piece), Point::new(0.0, 100.0));
        assert!(approx_eq(tree.diagonal_point(piece).y, 0.0));
        assert!(approx_eq(tree.diagonal_point(piece).x, 200.0));
    }
}

#[test]
fn test_paragraph_breaks_between_lines() {
    // "word " is 25pt wide at 10pt: two words per 60pt line, 10 lines of 12pt.
    let words = vec!["word "; 20].concat();
    let mut doc = dynamic_document(
        "60:100",
        vec![Element::new("p")
            .attr("font-size", 10.0)
            .child(Element::text(words.trim_end()))],
    );
    doc.format().unwrap();

    let pages = doc.pages();
    assert_eq!(pages.len(), 2);
    let tree = doc.tree();
    for &page in &pages {
        for &node in tree.children(page) {
            assert!(tree.diagonal_point(node).y >= -0.01);
        }
    }
}

#[test]
fn test_nested_unbreakable_overflow_is_a_constraint_error() {
    let mut doc = dynamic_document(
        "100:100",
        vec![Element::new("div").child(Element::new("div").attr("height", 200.0).attr("breakable", false))],
    );
    assert!(matches!(doc.format(), Err(LayoutError::Constraint { .. })));
}

#[test]
fn test_failed_layout_can_not_be_retried_into_an_empty_document() {
    let mut doc = dynamic_document(
        "200:100",
        vec![
            Element::new("div").attr("height", 20.0),
            Element::new("div").attr("height", 200.0).attr("breakable", false),
        ],
    );
    assert!(matches!(doc.format(), Err(LayoutError::Constraint { .. })));
    assert!(matches!(doc.format(), Err(LayoutError::Constraint { .. })));

    let dynamic = doc.tree().children(doc.root())[0];
    assert_eq!(doc.tree().children(dynamic).len(), 2);
}

// ─── Drawing ────────────────────────────────────────────────────

#[test]
fn test_task_heap_is_fifo_within_a_priority() {
    let mut heap = DrawingTaskHeap::new();
    for priority in [2, 1, 2] {
        heap.insert(DrawingTask::new(priority, 0, Vec::new()));
    }
    let order: Vec<u64> = std::iter::from_fn(|| heap.pop()).map(|t| t.order()).collect();
    assert_eq!(order, vec![0, 2, 1]);
}

#[test]
fn test_document_is_drawn_once() {
    let mut doc = document("200:100", vec![]);
    doc.draw(&mut RecordingEngine::new()).unwrap();
    assert!(matches!(doc.draw(&mut RecordingEngine::new()), Err(LayoutError::AlreadyDrawn)));

    doc.initialize();
    assert!(doc.draw(&mut RecordingEngine::new()).is_ok());
}

#[test]
fn test_backend_failure_names_the_task() {
    let mut doc = document("200:100", vec![Element::new("div").attr("background-color", "red")]);
    let err = doc.draw(&mut RecordingEngine::failing_on_page(0)).unwrap_err();
    assert!(matches!(err, LayoutError::Drawing { page: 0, .. }));
}

// ─── Serialization ──────────────────────────────────────────────

#[test]
fn test_boundary_round_trip() {
    let mut boundary = Boundary::new();
    for point in [(0.0, 10.0), (10.0, 10.0), (10.0, 0.0), (0.0, 0.0)] {
        boundary.set_next(point).unwrap();
    }
    boundary.close().unwrap();

    let json = serde_json::to_string(&boundary).unwrap();
    let back: Boundary = serde_json::from_str(&json).unwrap();

    assert!(back.is_closed());
    assert_eq!(back.points(), boundary.points());
    assert_eq!(back.diagonal_point(), Some(Point::new(10.0, 0.0)));
}

// ─── End to end ─────────────────────────────────────────────────

const REPORT: &str = r##"{
    "metadata": { "title": "Quarterly" },
    "config": { "pageSize": { "Custom": { "width": 300, "height": 200 } }, "fontSize": 10 },
    "children": [
        { "tag": "dynamic-page", "attributes": { "margin": 10 }, "children": [
            { "tag": "p", "attributes": { "background-color": "#eeeeee" },
              "text": "Revenue grew in every region",
              "behaviours": [ { "type": "bookmark", "title": "Summary" } ] },
            { "tag": "table", "children": [
                { "tag": "tr", "children": [
                    { "tag": "td", "text": "North" },
                    { "tag": "td", "attributes": { "colspan": 2 }, "text": "12%" }
                ] }
            ] },
            { "tag": "ol", "attributes": { "list-position": "inside" }, "children": [
                { "tag": "li", "text": "First" },
                { "tag": "li", "text": "Second" }
            ] }
        ] }
    ]
}"##;

#[test]
fn test_json_document_end_to_end() {
    let mut engine = RecordingEngine::new();
    let doc = quire::render_json(REPORT, &mut engine).unwrap();

    assert_eq!(doc.metadata().title.as_deref(), Some("Quarterly"));
    assert_eq!(engine.pages().len(), 1);
    let page = &engine.pages()[0];
    assert_eq!((page.width, page.height), (300.0, 200.0));

    let texts = page.texts().join("|");
    for expected in ["Revenue", "North", "12%", "1.", "2.", "First", "Second"] {
        assert!(texts.contains(expected), "{expected:?} missing from {texts:?}");
    }

    // Backgrounds paint before any text.
    let first_fill = page
        .commands
        .iter()
        .position(|c| matches!(c, DrawCommand::Polygon { filled: true, .. }))
        .unwrap();
    let first_text = page
        .commands
        .iter()
        .position(|c| matches!(c, DrawCommand::Text { .. }))
        .unwrap();
    assert!(first_fill < first_text);

    // Annotations paint last.
    assert!(matches!(
        page.commands.last(),
        Some(DrawCommand::Bookmark { title, .. }) if title == "Summary"
    ));

    // Everything stays inside the page margins.
    for command in &page.commands {
        if let DrawCommand::Text { origin, .. } = command {
            assert!(origin.x >= 10.0 - 0.01 && origin.y <= 190.0);
        }
    }
}

#[test]
fn test_table_cells_share_the_row() {
    let doc = quire::layout_json(REPORT).unwrap();
    let tree = doc.tree();
    let page = doc.pages()[0];
    let table = tree.children(page)[1];
    let NodeKind::Table { columns } = &tree[table].kind else {
        panic!("expected a table");
    };
    assert_eq!(columns.len(), 3);

    let row = tree.children(table)[0];
    let cells = tree.children(row);
    assert_eq!(tree.first_point(cells[0]).y, tree.first_point(cells[1]).y);
    assert!(approx_eq(tree.diagonal_point(cells[0]).y, tree.diagonal_point(row).y));
    assert!(approx_eq(tree.width(table), 280.0));
}

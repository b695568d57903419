//! Placement of a node's box inside its parent.

use crate::attribute::{self, AttributeValue};
use crate::error::Result;
use crate::geometry::Point;
use crate::style::VerticalAlign;
use crate::tree::{NodeId, NodeTree};

use super::FormatContext;

fn place_first_point(tree: &mut NodeTree, id: NodeId, point: Point) -> Result<()> {
    let boundary = tree.boundary_mut(id);
    boundary.reset();
    boundary.set_next(point)?;
    Ok(())
}

/// Put the node's top-left corner under its previous sibling, or at the
/// parent's drawing start when it is the first child. Two consecutive
/// `line-break` nodes are an extra line apart.
pub fn first_point_position(ctx: &mut FormatContext<'_>, id: NodeId) -> Result<()> {
    let tree = &mut *ctx.tree;
    let margins = tree.margins(id);
    let Some(parent) = tree.parent(id) else {
        let point = Point::new(margins.left, -margins.top);
        return place_first_point(tree, id, point);
    };
    let start = tree.start_drawing_point(parent);

    let previous = tree
        .previous_sibling(id)
        .filter(|&prev| !tree.boundary(prev).is_empty());
    let y = match previous {
        Some(prev) => {
            let mut y = tree.diagonal_point(prev).y - tree.margins(prev).bottom - margins.top;
            if tree.flag(id, attribute::LINE_BREAK) && tree.flag(prev, attribute::LINE_BREAK) {
                y -= tree.line_height(id);
            }
            y
        }
        None => start.y - margins.top,
    };

    place_first_point(tree, id, Point::new(start.x + margins.left, y))
}

/// Table cells sit at their column offset inside the row.
pub fn cell_first_point(ctx: &mut FormatContext<'_>, id: NodeId) -> Result<()> {
    let tree = &mut *ctx.tree;
    let row_start = tree.parent(id).map(|row| tree.first_point(row)).unwrap_or_default();
    let point = row_start.translate(tree[id].hints.cell_offset, -tree.margins(id).top);
    place_first_point(tree, id, point)
}

/// Close the boundary as a rectangle from the first point and the final
/// width and height. A box centered with auto margins whose width changed
/// since the margins were computed is shifted back to center.
pub fn standard_position(ctx: &mut FormatContext<'_>, id: NodeId) -> Result<()> {
    let tree = &mut *ctx.tree;
    tree.rebuild_rectangle(id);

    if let Some(centered_for) = tree[id].hints.auto_margin_width {
        let width = tree.width(id);
        if width != centered_for {
            tree.translate(id, -(width - centered_for) / 2.0, 0.0);
        }
    }
    Ok(())
}

/// Move the children as one block to the top, middle or bottom of the
/// content area.
pub fn vertical_align(ctx: &mut FormatContext<'_>, id: NodeId) -> Result<()> {
    let tree = &mut *ctx.tree;
    let align = tree
        .attribute(id, attribute::VERTICAL_ALIGN)
        .and_then(AttributeValue::as_str)
        .and_then(VerticalAlign::parse)
        .unwrap_or_default();

    let children: Vec<NodeId> = tree
        .children(id)
        .iter()
        .copied()
        .filter(|&c| !tree.boundary(c).is_empty())
        .collect();
    if children.is_empty() {
        return Ok(());
    }

    let paddings = tree.paddings(id);
    let inner_top = tree.first_point(id).y - paddings.top;
    let inner_height = tree.height(id) - paddings.vertical();

    let mut content_top = f64::MIN;
    let mut content_bottom = f64::MAX;
    for &child in &children {
        let margins = tree.margins(child);
        content_top = content_top.max(tree.first_point(child).y + margins.top);
        content_bottom = content_bottom.min(tree.diagonal_point(child).y - margins.bottom);
    }
    let free = (inner_height - (content_top - content_bottom)).max(0.0);

    let target = match align {
        VerticalAlign::Top => inner_top,
        VerticalAlign::Middle => inner_top - free / 2.0,
        VerticalAlign::Bottom => inner_top - free,
    };
    let dy = target - content_top;
    if dy.abs() > f64::EPSILON {
        for child in children {
            tree.translate(child, 0.0, dy);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::testing::Fixture;
    use crate::tree::NodeKind;

    #[test]
    fn test_first_point_without_previous_sibling() {
        for (margin_left, margin_top) in [(0.0, 0.0), (10.0, 10.0)] {
            let mut fx = Fixture::new();
            let parent = fx.placed(NodeKind::Container, 0.0, 600.0, 500.0, 600.0);
            let node = fx.tree.create(NodeKind::Container);
            fx.child(parent, node);
            fx.tree.set_attribute(node, attribute::MARGIN_LEFT, margin_left);
            fx.tree.set_attribute(node, attribute::MARGIN_TOP, margin_top);

            first_point_position(&mut fx.ctx(), node).unwrap();

            assert_eq!(fx.tree.first_point(node), Point::new(margin_left, 600.0 - margin_top));
            assert_eq!(fx.tree.boundary(node).len(), 1);
        }
    }

    #[test]
    fn test_first_point_follows_previous_sibling_margins() {
        let mut fx = Fixture::new();
        let parent = fx.placed(NodeKind::Container, 0.0, 600.0, 500.0, 600.0);
        let prev = fx.placed(NodeKind::Container, 0.0, 600.0, 500.0, 100.0);
        fx.tree.set_attribute(prev, attribute::MARGIN_BOTTOM, 10.0);
        let node = fx.tree.create(NodeKind::Container);
        fx.tree.set_attribute(node, attribute::MARGIN_TOP, 5.0);
        fx.child(parent, prev);
        fx.child(parent, node);

        first_point_position(&mut fx.ctx(), node).unwrap();
        assert_eq!(fx.tree.first_point(node), Point::new(0.0, 485.0));
    }

    #[test]
    fn test_line_break_only_when_both_siblings_break() {
        for previous_breaks in [true, false] {
            let mut fx = Fixture::new();
            let parent = fx.placed(NodeKind::Container, 0.0, 100.0, 500.0, 100.0);
            let prev = fx.placed(NodeKind::Container, 0.0, 100.0, 100.0, 0.0);
            fx.tree.set_attribute(prev, attribute::LINE_BREAK, previous_breaks);
            let node = fx.tree.create(NodeKind::Container);
            fx.tree.set_attribute(node, attribute::LINE_BREAK, true);
            fx.tree.set_attribute(node, attribute::LINE_HEIGHT, 20.0);
            fx.child(parent, prev);
            fx.child(parent, node);

            first_point_position(&mut fx.ctx(), node).unwrap();

            let expected = if previous_breaks { 80.0 } else { 100.0 };
            assert_eq!(fx.tree.first_point(node).y, expected);
        }
    }

    #[test]
    fn test_standard_position_recenters_auto_margin_box() {
        let mut fx = Fixture::new();
        let node = fx.tree.create(NodeKind::Container);
        fx.tree.boundary_mut(node).set_next((50.0, 100.0)).unwrap();
        fx.tree.set_width(node, 110.0);
        fx.tree.set_height(node, 20.0);
        fx.tree[node].hints.auto_margin_width = Some(100.0);

        standard_position(&mut fx.ctx(), node).unwrap();

        assert_eq!(fx.tree.first_point(node), Point::new(45.0, 100.0));
        assert_eq!(fx.tree.diagonal_point(node), Point::new(155.0, 80.0));
        assert!(fx.tree.boundary(node).is_closed());
    }

    #[test]
    fn test_vertical_align() {
        for (align, expected_top) in [("top", 500.0), ("middle", 400.0), ("bottom", 300.0)] {
            let mut fx = Fixture::new();
            let parent = fx.placed(NodeKind::Container, 0.0, 500.0, 500.0, 500.0);
            fx.tree.set_attribute(parent, attribute::VERTICAL_ALIGN, align);
            let child = fx.placed(NodeKind::Container, 0.0, 500.0, 100.0, 300.0);
            fx.child(parent, child);

            vertical_align(&mut fx.ctx(), parent).unwrap();
            assert_eq!(fx.tree.first_point(child).y, expected_top, "{align}");

            // Running again does not move the child further.
            vertical_align(&mut fx.ctx(), parent).unwrap();
            assert_eq!(fx.tree.first_point(child).y, expected_top, "{align}");
        }
    }

    #[test]
    fn test_cell_first_point_uses_column_offset() {
        let mut fx = Fixture::new();
        let row = fx.placed(NodeKind::Row, 10.0, 300.0, 200.0, 0.0);
        let cell = fx.tree.create(NodeKind::cell());
        fx.child(row, cell);
        fx.tree[cell].hints.cell_offset = 60.0;
        fx.tree.set_attribute(cell, attribute::MARGIN_TOP, 4.0);

        cell_first_point(&mut fx.ctx(), cell).unwrap();
        assert_eq!(fx.tree.first_point(cell), Point::new(70.0, 296.0));
    }
}

//! Vertical splitting of formatted nodes.
//!
//! `break_at(node, h)` cuts a node `h` units below its top edge. The node
//! keeps the part above the cut; the part below comes back as a new,
//! detached node (the *break product*) positioned directly under the cut.
//! Page and column breaking decide what to do with the product.

use crate::attribute::{self, AttributeValue};
use crate::error::StructuralError;
use crate::geometry::{Boundary, Point};
use crate::text::EPSILON;

use super::{Line, LinePart, NodeId, NodeKind, NodeTree};

impl NodeTree {
    /// Whether the node may be split at all.
    pub fn is_breakable(&self, id: NodeId) -> bool {
        let allowed = self
            .attribute(id, attribute::BREAKABLE)
            .map_or(true, AttributeValue::as_bool);
        allowed
            && !matches!(
                self[id].kind,
                NodeKind::Row
                    | NodeKind::Image
                    | NodeKind::Text { .. }
                    | NodeKind::Page
                    | NodeKind::DynamicPage { .. }
                    | NodeKind::PageCollection
            )
    }

    /// Split the node `height` units below its top. Returns `None` when the
    /// node cannot or need not be split there.
    pub fn break_at(&mut self, id: NodeId, height: f64) -> Result<Option<NodeId>, StructuralError> {
        if height <= 0.0 || height >= self[id].boundary.height() - EPSILON || !self.is_breakable(id) {
            return Ok(None);
        }
        match self[id].kind {
            NodeKind::Paragraph { .. } => self.break_paragraph(id, height),
            _ => self.break_container(id, height),
        }
    }

    /// Cut the node's own box: the node becomes `height` tall and a copy
    /// holding the remainder is returned.
    fn split_box(&mut self, id: NodeId, height: f64) -> NodeId {
        let first = self.first_point(id);
        let diagonal = self.diagonal_point(id);
        let width = diagonal.x - first.x;
        let full_height = first.y - diagonal.y;

        self[id].boundary = Boundary::rectangle(first, width, height);
        self.set_height(id, height);

        let product = self.copy_without_children(id);
        let remainder = full_height - height;
        self[product].boundary = Boundary::rectangle(Point::new(first.x, first.y - height), width, remainder);
        self.set_height(product, remainder);
        product
    }

    /// Children crossing the cut are broken recursively; children that
    /// start below it move into the product. The product grows by however
    /// much the broken children pushed their remainders down.
    ///
    /// Returns `None`, leaving the node untouched, when an unbreakable child
    /// starting at the node's top crosses the cut and nothing else stays
    /// above it. The product would only repeat the node.
    fn break_container(&mut self, id: NodeId, height: f64) -> Result<Option<NodeId>, StructuralError> {
        let break_line = self.first_point(id).y - height;

        let mut to_break = Vec::new();
        let mut to_move = Vec::new();
        let mut kept = 0;
        for &child in self.children(id) {
            let start = self.first_point(child).y;
            let end = self.diagonal_point(child).y;
            if break_line < start && break_line > end {
                to_break.push(child);
            } else if break_line >= start {
                to_move.push(child);
            } else {
                kept += 1;
            }
        }

        let mut products = Vec::new();
        let mut translate: f64 = 0.0;
        let mut unbroken = Vec::new();
        for &child in &to_break {
            let child_break = self.first_point(child).y - break_line;
            let original_height = self.height(child);

            match self.break_at(child, child_break)? {
                Some(piece) => {
                    let grown = self.height(piece) + self.height(child) - original_height;
                    let gap = self.diagonal_point(child).y - self.first_point(piece).y;
                    translate = translate.max(grown + gap);
                    products.push(piece);
                }
                None => {
                    let start = self.first_point(child).y;
                    let end = self.diagonal_point(child).y;
                    translate = translate.max((start - end) - (self.height(child) - child_break));
                    unbroken.push(child);
                }
            }
        }

        let top = self.first_point(id).y;
        if kept == 0
            && products.is_empty()
            && unbroken.iter().any(|&c| self.first_point(c).y >= top - EPSILON)
        {
            return Ok(None);
        }
        for child in unbroken.into_iter().rev() {
            to_move.insert(0, child);
        }

        let product = self.split_box(id, height);
        for &child in products.iter().chain(to_move.iter()) {
            self.reparent(child, product)?;
        }

        if translate != 0.0 {
            let grown = self.height(product) + translate;
            self.set_height(product, grown);
            let boundary = &mut self[product].boundary;
            boundary.point_translate(2, 0.0, -translate)?;
            boundary.point_translate(3, 0.0, -translate)?;
            for child in to_move {
                self.translate(child, 0.0, -translate);
            }
        }

        Ok(Some(product))
    }

    /// Keep the lines that end above the cut; the rest move to the product
    /// together with the text fragments on them.
    fn break_paragraph(&mut self, id: NodeId, height: f64) -> Result<Option<NodeId>, StructuralError> {
        let break_line = self.first_point(id).y - height;
        let NodeKind::Paragraph { lines } = &self[id].kind else {
            return Ok(None);
        };
        let kept = lines
            .iter()
            .take_while(|line| line.bottom() >= break_line - EPSILON)
            .count();
        if kept == 0 || kept == lines.len() {
            return Ok(None);
        }

        let shift = lines[kept].top - break_line;
        let mut moved_lines: Vec<Line> = Vec::new();
        if let NodeKind::Paragraph { lines } = &mut self[id].kind {
            moved_lines = lines.split_off(kept);
        }
        for line in &mut moved_lines {
            line.top -= shift;
        }

        let product = self.split_box(id, height);
        if shift != 0.0 {
            let grown = self.height(product) + shift;
            self.set_height(product, grown);
            let boundary = &mut self[product].boundary;
            boundary.point_translate(2, 0.0, -shift)?;
            boundary.point_translate(3, 0.0, -shift)?;
        }
        self[product].kind = NodeKind::Paragraph { lines: moved_lines };

        let texts = self.children(id).to_vec();
        for text in texts {
            let NodeKind::Text { parts, .. } = &mut self[text].kind else {
                continue;
            };
            let split = parts.iter().position(|p| p.line >= kept).unwrap_or(parts.len());
            let mut moved: Vec<LinePart> = parts.split_off(split);
            let nothing_left = parts.is_empty();
            for part in &mut moved {
                part.line -= kept;
                part.top -= shift;
            }
            if moved.is_empty() {
                continue;
            }

            let target = if nothing_left {
                text
            } else {
                self.copy_without_children(text)
            };
            if let NodeKind::Text { parts, .. } = &mut self[target].kind {
                *parts = moved;
            }
            self.reparent(target, product)?;
            self.rebuild_text_boundary(target)?;
            if target != text {
                self.rebuild_text_boundary(text)?;
            }
        }

        Ok(Some(product))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxed(tree: &mut NodeTree, kind: NodeKind, x: f64, y: f64, w: f64, h: f64) -> NodeId {
        let id = tree.create(kind);
        tree.set_width(id, w);
        tree.set_height(id, h);
        tree[id].boundary = Boundary::rectangle(Point::new(x, y), w, h);
        id
    }

    #[test]
    fn test_container_break_moves_lower_half_of_crossing_child() {
        let mut tree = NodeTree::new();
        let container = boxed(&mut tree, NodeKind::Container, 50.0, 600.0, 350.0, 300.0);
        let first = boxed(&mut tree, NodeKind::Container, 50.0, 600.0, 350.0, 100.0);
        let second = boxed(&mut tree, NodeKind::Container, 50.0, 400.0, 350.0, 100.0);
        tree.reparent(first, container).unwrap();
        tree.reparent(second, container).unwrap();

        let product = tree.break_at(container, 250.0).unwrap().unwrap();

        assert_eq!(tree.height(container), 250.0);
        assert_eq!(tree.children(container), &[first, second]);
        assert_eq!(tree.height(first), 100.0);
        assert_eq!(tree.height(second), 50.0);
        assert_eq!(tree.diagonal_point(second), Point::new(400.0, 350.0));

        assert_eq!(tree.height(product), 50.0);
        let moved = tree.children(product);
        assert_eq!(moved.len(), 1);
        assert_eq!(tree.height(moved[0]), 50.0);
        assert_eq!(tree.first_point(moved[0]), Point::new(50.0, 350.0));
        assert_eq!(tree.diagonal_point(moved[0]), Point::new(400.0, 300.0));
        assert_eq!(tree.parent(product), None);
    }

    #[test]
    fn test_children_below_the_cut_move_to_product() {
        let mut tree = NodeTree::new();
        let container = boxed(&mut tree, NodeKind::Container, 0.0, 300.0, 100.0, 300.0);
        let top = boxed(&mut tree, NodeKind::Container, 0.0, 300.0, 100.0, 100.0);
        let bottom = boxed(&mut tree, NodeKind::Container, 0.0, 150.0, 100.0, 100.0);
        tree.reparent(top, container).unwrap();
        tree.reparent(bottom, container).unwrap();

        let product = tree.break_at(container, 120.0).unwrap().unwrap();
        assert_eq!(tree.children(container), &[top]);
        assert_eq!(tree.children(product), &[bottom]);
        assert_eq!(tree.first_point(product), Point::new(0.0, 180.0));
        assert_eq!(tree.first_point(bottom), Point::new(0.0, 150.0));
    }

    #[test]
    fn test_unbreakable_child_is_pushed_below_the_cut() {
        let mut tree = NodeTree::new();
        let container = boxed(&mut tree, NodeKind::Container, 0.0, 300.0, 100.0, 300.0);
        let row = boxed(&mut tree, NodeKind::Row, 0.0, 250.0, 100.0, 100.0);
        tree.reparent(row, container).unwrap();

        let product = tree.break_at(container, 100.0).unwrap().unwrap();
        assert_eq!(tree.children(product), &[row]);
        // The row started 50 above the cut and is moved down by that much.
        assert_eq!(tree.first_point(row).y, 200.0);
        assert_eq!(tree.height(product), 250.0);
        assert_eq!(tree.diagonal_point(product).y, -50.0);
    }

    #[test]
    fn test_break_refusals() {
        let mut tree = NodeTree::new();
        let row = boxed(&mut tree, NodeKind::Row, 0.0, 100.0, 100.0, 100.0);
        assert_eq!(tree.break_at(row, 50.0), Ok(None));

        let container = boxed(&mut tree, NodeKind::Container, 0.0, 100.0, 100.0, 100.0);
        assert_eq!(tree.break_at(container, 0.0), Ok(None));
        assert_eq!(tree.break_at(container, 100.0), Ok(None));
        tree.set_attribute(container, attribute::BREAKABLE, false);
        assert_eq!(tree.break_at(container, 50.0), Ok(None));
    }

    #[test]
    fn test_container_refuses_a_break_that_repeats_itself() {
        let mut tree = NodeTree::new();
        let container = boxed(&mut tree, NodeKind::Container, 0.0, 100.0, 100.0, 200.0);
        let inner = boxed(&mut tree, NodeKind::Container, 0.0, 100.0, 100.0, 200.0);
        tree.set_attribute(inner, attribute::BREAKABLE, false);
        tree.reparent(inner, container).unwrap();

        assert_eq!(tree.break_at(container, 100.0), Ok(None));
        assert_eq!(tree.children(container), &[inner]);
        assert_eq!(tree.height(container), 200.0);
        assert_eq!(tree.first_point(inner), Point::new(0.0, 100.0));
    }

    #[test]
    fn test_nested_refusal_propagates_upwards() {
        let mut tree = NodeTree::new();
        let outer = boxed(&mut tree, NodeKind::Container, 0.0, 100.0, 100.0, 200.0);
        let middle = boxed(&mut tree, NodeKind::Container, 0.0, 100.0, 100.0, 200.0);
        let image = boxed(&mut tree, NodeKind::Image, 0.0, 100.0, 100.0, 200.0);
        tree.reparent(image, middle).unwrap();
        tree.reparent(middle, outer).unwrap();

        assert_eq!(tree.break_at(outer, 100.0), Ok(None));
        assert_eq!(tree.children(outer), &[middle]);
        assert_eq!(tree.children(middle), &[image]);
    }

    fn part(line: usize, top: f64) -> LinePart {
        LinePart {
            line,
            text: "word".to_string(),
            x: 0.0,
            top,
            width: 40.0,
            height: 10.0,
            word_spacing: 0.0,
        }
    }

    #[test]
    fn test_paragraph_break_splits_lines_and_text() {
        let mut tree = NodeTree::new();
        let paragraph = boxed(&mut tree, NodeKind::paragraph(), 0.0, 100.0, 100.0, 30.0);
        if let NodeKind::Paragraph { lines } = &mut tree[paragraph].kind {
            for i in 0..3 {
                lines.push(Line {
                    top: 100.0 - 10.0 * i as f64,
                    height: 10.0,
                    x: 0.0,
                    width: 40.0,
                });
            }
        }
        let text = tree.create(NodeKind::text("word word word"));
        if let NodeKind::Text { parts, .. } = &mut tree[text].kind {
            parts.extend([part(0, 100.0), part(1, 90.0), part(2, 80.0)]);
        }
        tree.reparent(text, paragraph).unwrap();
        tree.rebuild_text_boundary(text).unwrap();

        // Cut through the middle of the second line.
        let product = tree.break_at(paragraph, 15.0).unwrap().unwrap();

        let NodeKind::Paragraph { lines } = &tree[paragraph].kind else { unreachable!() };
        assert_eq!(lines.len(), 1);
        let NodeKind::Paragraph { lines } = &tree[product].kind else { unreachable!() };
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].top, 85.0);

        assert_eq!(tree.height(paragraph), 15.0);
        assert_eq!(tree.height(product), 20.0);
        assert_eq!(tree.first_point(product).y, 85.0);

        let moved = tree.children(product);
        assert_eq!(moved.len(), 1);
        let NodeKind::Text { parts, .. } = &tree[moved[0]].kind else { unreachable!() };
        assert_eq!(parts.iter().map(|p| p.line).collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(tree.height(moved[0]), 20.0);
        assert_eq!(tree.height(text), 10.0);
    }

    #[test]
    fn test_paragraph_without_a_whole_line_above_the_cut_does_not_break() {
        let mut tree = NodeTree::new();
        let paragraph = boxed(&mut tree, NodeKind::paragraph(), 0.0, 100.0, 100.0, 20.0);
        if let NodeKind::Paragraph { lines } = &mut tree[paragraph].kind {
            lines.push(Line { top: 100.0, height: 20.0, x: 0.0, width: 10.0 });
        }
        assert_eq!(tree.break_at(paragraph, 5.0), Ok(None));
    }
}

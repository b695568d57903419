//! Column breaking.
//!
//! The children of a columnable container are poured into side-by-side
//! columns. A column ends at the page content bottom (or, past the first
//! row, at the next multiple of the page content height below it); a child
//! crossing that line is broken and its remainder opens the next column.
//! Once every column of a row is used, a new row of columns starts below.
//!
//! With `equals-columns`, a row whose remaining content fits is balanced:
//! every column but the last is cut at the same height.

use std::collections::VecDeque;

use crate::attribute;
use crate::error::Result;
use crate::geometry::{Boundary, Point};
use crate::text::EPSILON;
use crate::tree::{NodeId, NodeKind, NodeTree};

use super::page::content_bounds;
use super::FormatContext;

pub fn column_breaking(ctx: &mut FormatContext<'_>, page: NodeId) -> Result<()> {
    let containers: Vec<NodeId> = ctx
        .tree
        .children(page)
        .iter()
        .copied()
        .filter(|&c| ctx.tree[c].kind == NodeKind::ColumnableContainer)
        .collect();
    for container in containers {
        break_into_columns(ctx.tree, page, container)?;
    }
    Ok(())
}

struct Flow {
    bottom: f64,
    height: f64,
}

impl Flow {
    /// First content-bottom line strictly below `row_top`.
    fn limit_below(&self, row_top: f64) -> f64 {
        if row_top > self.bottom + EPSILON {
            self.bottom
        } else {
            let k = ((self.bottom - row_top) / self.height + EPSILON).floor() + 1.0;
            self.bottom - k * self.height
        }
    }
}

/// A column being filled.
struct OpenColumn {
    x: f64,
    top: f64,
    limit: f64,
    cursor: f64,
    items: Vec<NodeId>,
}

fn outer_height(tree: &NodeTree, id: NodeId) -> f64 {
    tree.boundary(id).height() + tree.margins(id).vertical()
}

fn break_into_columns(tree: &mut NodeTree, page: NodeId, container: NodeId) -> Result<()> {
    let (content_top, content_bottom) = content_bounds(tree, page);
    let flow = Flow {
        bottom: content_bottom,
        height: content_top - content_bottom,
    };
    if flow.height <= EPSILON {
        log::warn!("Page {} has no content height; columns of {} are left as is", page, container);
        return Ok(());
    }

    let settings = tree.column_settings(container);
    let count = settings.count.max(1);
    let column_width = tree.inner_width(container);
    let first = tree.first_point(container);
    let paddings = tree.paddings(container);
    let origin_x = first.x + paddings.left;
    let column_x = |index: usize| origin_x + index as f64 * (column_width + settings.gap);

    let mut queue: VecDeque<(NodeId, f64)> = tree
        .remove_all(container)
        .into_iter()
        .filter(|&c| !tree.boundary(c).is_empty())
        .map(|c| (c, tree.first_point(c).x - origin_x))
        .collect();

    let mut row_top = first.y - paddings.top;
    let mut row_limit = flow.limit_below(row_top);
    let mut row_target: Option<f64> = None;
    let mut index = 0;
    let mut columns: Vec<NodeId> = Vec::new();
    let mut lowest = row_top;

    let column_limit = |index: usize, row_top: f64, row_limit: f64, target: Option<f64>| match target {
        Some(target) if settings.equal && index + 1 < count && target <= row_top - row_limit + EPSILON => {
            (row_top - target).max(row_limit)
        }
        _ => row_limit,
    };

    let mut column = OpenColumn {
        x: column_x(0),
        top: row_top,
        limit: row_limit,
        cursor: row_top,
        items: Vec::new(),
    };

    while let Some((child, offset)) = queue.pop_front() {
        if index == 0 && column.items.is_empty() && row_target.is_none() {
            let remaining = outer_height(tree, child) + queue.iter().map(|&(c, _)| outer_height(tree, c)).sum::<f64>();
            row_target = Some(remaining / count as f64);
            column.limit = column_limit(index, row_top, row_limit, row_target);
        }

        let margins = tree.margins(child);
        let current = tree.first_point(child);
        tree.translate(child, column.x + offset - current.x, column.cursor - margins.top - current.y);

        let starts_column = tree.flag(child, attribute::BREAK) && !column.items.is_empty();
        let bottom = tree.diagonal_point(child).y - margins.bottom;
        let placed = if starts_column {
            false
        } else if bottom >= column.limit - EPSILON {
            column.cursor = bottom;
            column.items.push(child);
            continue;
        } else {
            let cut = tree.first_point(child).y - column.limit;
            match tree.break_at(child, cut)? {
                Some(product) => {
                    column.cursor = tree.diagonal_point(child).y - margins.bottom;
                    column.items.push(child);
                    queue.push_front((product, offset));
                    true
                }
                None if column.items.is_empty() => {
                    column.cursor = bottom;
                    column.items.push(child);
                    true
                }
                None => false,
            }
        };
        if !placed {
            queue.push_front((child, offset));
        }

        // Close the column and open the next one.
        let last_in_row = index + 1 == count;
        if let Some(node) = close_column(tree, container, column, column_width, last_in_row)? {
            lowest = lowest.min(tree.diagonal_point(node).y);
            columns.push(node);
        }

        index += 1;
        if index == count {
            index = 0;
            row_top = row_limit;
            row_limit -= flow.height;
            row_target = None;
        }
        column = OpenColumn {
            x: column_x(index),
            top: row_top,
            limit: column_limit(index, row_top, row_limit, row_target),
            cursor: row_top,
            items: Vec::new(),
        };
    }

    if let Some(node) = close_column(tree, container, column, column_width, true)? {
        lowest = lowest.min(tree.diagonal_point(node).y);
        columns.push(node);
    }

    log::debug!("Container {} broken into {} columns", container, columns.len());
    let height = (first.y - lowest) + paddings.bottom;
    tree.set_height(container, height);
    tree.rebuild_rectangle(container);
    Ok(())
}

/// Turn a filled column into a container node under `parent`. A column cut
/// by the flow is as tall as its room; the last one only as its content.
fn close_column(
    tree: &mut NodeTree,
    parent: NodeId,
    column: OpenColumn,
    width: f64,
    content_sized: bool,
) -> Result<Option<NodeId>> {
    if column.items.is_empty() {
        return Ok(None);
    }
    let height = if content_sized {
        column.top - column.cursor
    } else {
        column.top - column.limit.min(column.cursor)
    };

    let node = tree.create(NodeKind::Container);
    tree.set_width(node, width);
    tree.set_height(node, height);
    tree[node].boundary = Boundary::rectangle(Point::new(column.x, column.top), width, height);
    tree.reparent(node, parent)?;
    for item in column.items {
        tree.reparent(item, node)?;
    }
    Ok(Some(node))
}

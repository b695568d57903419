//! Table column sizing and row heights.
//!
//! Column widths are settled before any cell is formatted: every column is
//! as wide as its widest cell, then the columns are stretched evenly to
//! fill the table or shrunk one by one (never below their minimum content
//! width) until they fit. Rows are sized afterwards: a row is as tall as
//! its tallest cell and every cell is stretched to that height.

use crate::attribute;
use crate::error::Result;
use crate::tree::{NodeId, NodeKind};

use super::dimension::{length_of, margins_of, min_content_width, paddings_of};
use super::{position, FormatContext};

/// Width and horizontal margins of one column.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Column {
    width: f64,
    min_width: f64,
    margin_left: f64,
    margin_right: f64,
}

fn cells_of(ctx: &FormatContext<'_>, row: NodeId) -> Vec<NodeId> {
    ctx.tree
        .children(row)
        .iter()
        .copied()
        .filter(|&c| matches!(ctx.tree[c].kind, NodeKind::Cell { .. }))
        .collect()
}

/// Largest colspan honoured; wider spans are cut down to it.
pub const MAX_COLSPAN: usize = 1000;

fn colspan(ctx: &FormatContext<'_>, cell: NodeId) -> usize {
    let Some(span) = ctx.tree.number(cell, attribute::COLSPAN).filter(|n| *n >= 1.0) else {
        return 1;
    };
    if span > MAX_COLSPAN as f64 {
        log::warn!("Cell {} spans {} columns; limiting it to {}", cell, span, MAX_COLSPAN);
        return MAX_COLSPAN;
    }
    span as usize
}

pub fn table_columns(ctx: &mut FormatContext<'_>, table: NodeId) -> Result<()> {
    let rows: Vec<NodeId> = ctx
        .tree
        .children(table)
        .iter()
        .copied()
        .filter(|&r| ctx.tree[r].kind == NodeKind::Row)
        .collect();

    // (cell, first column, span)
    let mut placements = Vec::new();
    for &row in &rows {
        let mut column = 0;
        for cell in cells_of(ctx, row) {
            let span = colspan(ctx, cell);
            ctx.tree[cell].kind = NodeKind::Cell { column };
            placements.push((cell, column, span));
            column += span;
        }
    }
    let count = placements.iter().map(|&(_, c, s)| c + s).max().unwrap_or(0);
    if count == 0 {
        return Ok(());
    }

    let mut columns = vec![Column::default(); count];
    for &(cell, first, span) in &placements {
        let margins = margins_of(ctx, cell);
        let paddings = paddings_of(ctx, cell);
        let min = (min_content_width(ctx, cell) - margins.horizontal()).max(0.0);
        let declared = length_of(ctx, cell, attribute::WIDTH);
        let natural = if declared > 0.0 { declared + paddings.horizontal() } else { min };

        for column in &mut columns[first..first + span] {
            column.width = column.width.max(natural / span as f64);
            column.min_width = column.min_width.max(min / span as f64);
        }
        columns[first].margin_left = columns[first].margin_left.max(margins.left);
        let last = first + span - 1;
        columns[last].margin_right = columns[last].margin_right.max(margins.right);
    }

    let occupied: f64 = columns
        .iter()
        .map(|c| c.width + c.margin_left + c.margin_right)
        .sum();
    let mut diff = ctx.tree.inner_width(table) - occupied;
    if diff > 0.0 {
        let share = diff / count as f64;
        for column in &mut columns {
            column.width += share;
        }
    } else {
        for column in &mut columns {
            if diff >= 0.0 {
                break;
            }
            let min = column.min_width;
            let slack = (column.width - min).max(0.0);
            if -diff >= slack {
                column.width = min;
                diff += slack;
            } else {
                column.width += diff;
                diff = 0.0;
            }
        }
        if diff < 0.0 {
            log::warn!("Table {} overflows its width by {} even at minimum column widths", table, -diff);
        }
    }

    let mut offsets = Vec::with_capacity(count);
    let mut translate = 0.0;
    for column in &columns {
        translate += column.margin_left;
        offsets.push(translate);
        translate += column.width + column.margin_right;
    }

    for &(cell, first, span) in &placements {
        let last = first + span - 1;
        let width = offsets[last] + columns[last].width - offsets[first];
        let paddings = paddings_of(ctx, cell);
        ctx.tree.set_attribute(cell, attribute::WIDTH, (width - paddings.horizontal()).max(0.0));
        ctx.tree[cell].hints.cell_offset = offsets[first];
    }

    log::debug!("Table {} has {} columns", table, count);
    ctx.tree[table].kind = NodeKind::Table {
        columns: columns.iter().map(|c| c.width).collect(),
    };
    Ok(())
}

/// Make the row as tall as its tallest cell (plus the largest vertical
/// cell margins) and stretch every cell to the tallest cell's height.
pub fn row_dimension(ctx: &mut FormatContext<'_>, row: NodeId) -> Result<()> {
    let cells: Vec<NodeId> = cells_of(ctx, row)
        .into_iter()
        .filter(|&c| !ctx.tree.boundary(c).is_empty())
        .collect();
    if cells.is_empty() {
        return Ok(());
    }

    let tree = &mut *ctx.tree;
    let tallest = cells.iter().map(|&c| tree.height(c)).fold(0.0, f64::max);
    let margin_top = cells.iter().map(|&c| tree.margins(c).top).fold(0.0, f64::max);
    let margin_bottom = cells.iter().map(|&c| tree.margins(c).bottom).fold(0.0, f64::max);

    let row_height = tallest + margin_top + margin_bottom;
    stretch(ctx, row, row_height)?;
    for cell in cells {
        stretch(ctx, cell, tallest)?;
        position::vertical_align(ctx, cell)?;
    }
    Ok(())
}

fn stretch(ctx: &mut FormatContext<'_>, id: NodeId, height: f64) -> Result<()> {
    let dh = height - ctx.tree.height(id);
    if dh.abs() <= f64::EPSILON {
        return Ok(());
    }
    let boundary = ctx.tree.boundary_mut(id);
    boundary.point_translate(2, 0.0, -dh)?;
    boundary.point_translate(3, 0.0, -dh)?;
    ctx.tree.set_height(id, height);
    Ok(())
}

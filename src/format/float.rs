//! Float layout.
//!
//! Children are visited in order and packed into rows. `float: left`
//! children fill a row from the inner left edge, `float: right` children
//! from the inner right edge; a float that no longer fits between the two
//! starts a new row below the tallest float of the current one. A
//! non-floating child clears: it goes below every float placed so far and
//! the next row starts under it.
//!
//! If any child moved, the container is resized to its new content. Pages
//! keep their size; page breaking takes care of what no longer fits.

use crate::attribute;
use crate::error::Result;
use crate::style::Float;
use crate::text::EPSILON;
use crate::tree::NodeId;

use super::FormatContext;

struct Row {
    top: f64,
    bottom: f64,
    left: f64,
    right: f64,
    has_floats: bool,
}

impl Row {
    fn new(top: f64, left: f64, right: f64) -> Self {
        Self {
            top,
            bottom: top,
            left,
            right,
            has_floats: false,
        }
    }
}

pub fn float_layout(ctx: &mut FormatContext<'_>, id: NodeId) -> Result<()> {
    let tree = &mut *ctx.tree;
    let children: Vec<NodeId> = tree
        .children(id)
        .iter()
        .copied()
        .filter(|&c| !tree.boundary(c).is_empty())
        .collect();
    if !children.iter().any(|&c| tree.float(c).is_floating()) {
        return Ok(());
    }

    let first = tree.first_point(id);
    let paddings = tree.paddings(id);
    let inner_left = tree.start_drawing_point(id).x;
    let inner_right = inner_left + tree.inner_width(id);

    let start = tree.first_point(children[0]).y + tree.margins(children[0]).top;
    let mut row = Row::new(start, inner_left, inner_right);
    let mut rightmost = inner_left;
    let mut moved = false;

    for child in children {
        let margins = tree.margins(child);
        let boundary = tree.boundary(child);
        let (width, height) = (boundary.width(), boundary.height());
        let outer_width = width + margins.horizontal();
        let outer_height = height + margins.vertical();
        let current = tree.first_point(child);

        let (x, y) = match tree.float(child) {
            side @ (Float::Left | Float::Right) => {
                if row.has_floats && row.left + outer_width > row.right + EPSILON {
                    row = Row::new(row.bottom, inner_left, inner_right);
                }
                let x = if side == Float::Left {
                    let x = row.left + margins.left;
                    row.left += outer_width;
                    x
                } else {
                    let x = row.right - margins.right - width;
                    row.right -= outer_width;
                    x
                };
                row.bottom = row.bottom.min(row.top - outer_height);
                row.has_floats = true;
                (x, row.top - margins.top)
            }
            Float::None => {
                let top = row.bottom;
                row = Row::new(top - outer_height, inner_left, inner_right);
                (current.x, top - margins.top)
            }
        };

        let (dx, dy) = (x - current.x, y - current.y);
        if dx.abs() > EPSILON || dy.abs() > EPSILON {
            tree.translate(child, dx, dy);
            moved = true;
        }
        rightmost = rightmost.max(x + width + margins.right);
    }

    if !moved || tree[id].kind.is_page() {
        return Ok(());
    }

    let lowest = tree
        .children(id)
        .iter()
        .filter(|&&c| !tree.boundary(c).is_empty())
        .map(|&c| tree.diagonal_point(c).y - tree.margins(c).bottom)
        .fold(first.y - paddings.top, f64::min);
    let content_height = (first.y - paddings.top) - lowest;
    let min_height = tree.number(id, attribute::MIN_HEIGHT).unwrap_or(0.0);
    let height = min_height.max(paddings.top + content_height + paddings.bottom);

    let width = tree.width(id);
    let needed_width = rightmost - first.x + paddings.right;
    let dw = if needed_width > width + EPSILON { needed_width - width } else { 0.0 };

    let dh = height - tree.height(id);
    log::debug!("Floats moved in {}; resizing by ({}, {})", id, dw, dh);
    tree.resize(id, dw, dh)?;
    Ok(())
}

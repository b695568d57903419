//! # Pages
//!
//! Page geometry, the splitting of a dynamic page into physical pages, and
//! elastic pages that shrink or grow to their content.
//!
//! Every page lives in its own coordinate space: the top-left corner is
//! `(0, height)` and the bottom edge is `y = 0`.

use crate::attribute::{self, AttributeValue};
use crate::config::PageSize;
use crate::error::{LayoutError, Result};
use crate::geometry::{Boundary, Point};
use crate::text::EPSILON;
use crate::tree::{NodeId, NodeKind, NodeTree};
use crate::units::Length;

use super::FormatContext;

/// Top and bottom of the area children may occupy.
pub(crate) fn content_bounds(tree: &NodeTree, page: NodeId) -> (f64, f64) {
    let top = tree.start_drawing_point(page).y;
    let bottom = tree.diagonal_point(page).y + tree.margins(page).bottom + tree.paddings(page).bottom;
    (top, bottom)
}

/// Size the page from `page-size` or the configured default and resolve
/// its margins. Unset margins come from the configuration.
pub fn page_geometry(ctx: &mut FormatContext<'_>, page: NodeId) -> Result<()> {
    let size = ctx
        .tree
        .attribute(page, attribute::PAGE_SIZE)
        .and_then(AttributeValue::as_str)
        .and_then(|raw| {
            let parsed = PageSize::parse(raw);
            if parsed.is_none() {
                log::warn!("Unknown page-size {:?} on page {}; using the default", raw, page);
            }
            parsed
        })
        .unwrap_or(ctx.config.page_size);
    let (width, height) = size.dimensions();

    let defaults = ctx.config.margin;
    let sides = [
        (attribute::MARGIN_TOP, defaults.top, height),
        (attribute::MARGIN_RIGHT, defaults.right, width),
        (attribute::MARGIN_BOTTOM, defaults.bottom, height),
        (attribute::MARGIN_LEFT, defaults.left, width),
        (attribute::PADDING_TOP, 0.0, height),
        (attribute::PADDING_RIGHT, 0.0, width),
        (attribute::PADDING_BOTTOM, 0.0, height),
        (attribute::PADDING_LEFT, 0.0, width),
    ];
    super::convert::expand_shorthand(
        ctx.tree,
        page,
        attribute::MARGIN,
        [attribute::MARGIN_TOP, attribute::MARGIN_RIGHT, attribute::MARGIN_BOTTOM, attribute::MARGIN_LEFT],
    );
    let font_size = ctx.tree.font_size(page);
    for (name, default, base) in sides {
        let value = match ctx.tree.attribute(page, name) {
            Some(AttributeValue::Number(n)) => *n,
            Some(AttributeValue::Text(raw)) => Length::parse(raw)
                .and_then(|length| length.resolve(ctx.units, base, font_size))
                .unwrap_or(default),
            _ => default,
        };
        ctx.tree.set_attribute(page, name, value);
    }

    ctx.tree.set_width(page, width);
    ctx.tree.set_height(page, height);
    ctx.tree[page].boundary = Boundary::rectangle(Point::new(0.0, height), width, height);
    Ok(())
}

/// Move a node so the top of its margin box is at `top`.
fn shift_to_top(tree: &mut NodeTree, id: NodeId, top: f64) {
    let dy = top - tree.margins(id).top - tree.first_point(id).y;
    tree.translate(id, 0.0, dy);
}

fn open_page(tree: &mut NodeTree, dynamic: NodeId, pages: &mut Vec<NodeId>) -> NodeId {
    let page = tree.copy_without_children(dynamic);
    tree[page].kind = NodeKind::Page;
    tree[page].boundary = tree[dynamic].boundary.clone();
    tree.adopt(dynamic, page);
    pages.push(page);
    log::debug!("Dynamic page {} opened page {} ({} so far)", dynamic, page, pages.len());
    page
}

/// Distribute the content of a dynamic page over as many pages as it
/// needs. Children crossing the bottom edge are broken; the part below
/// continues at the top of the next page and everything after it moves
/// along by the same amount.
pub fn page_breaking(ctx: &mut FormatContext<'_>, dynamic: NodeId) -> Result<()> {
    let tree = &mut *ctx.tree;
    let (top, bottom) = content_bounds(tree, dynamic);
    let children = tree.remove_all(dynamic);

    let mut pages = Vec::new();
    let mut current = open_page(tree, dynamic, &mut pages);
    let mut offset = 0.0;

    for child in children {
        if tree.boundary(child).is_empty() {
            continue;
        }
        tree.translate(child, 0.0, offset);
        let bottom_before = tree.diagonal_point(child).y;
        let mut piece = child;

        loop {
            let page_empty = tree.children(current).is_empty();
            if piece == child && !page_empty && tree.flag(piece, attribute::BREAK) {
                current = open_page(tree, dynamic, &mut pages);
                shift_to_top(tree, piece, top);
                continue;
            }

            let first_y = tree.first_point(piece).y;
            if tree.diagonal_point(piece).y >= bottom - EPSILON {
                tree.reparent(piece, current)?;
                break;
            }
            if first_y <= bottom + EPSILON {
                current = open_page(tree, dynamic, &mut pages);
                shift_to_top(tree, piece, top);
                continue;
            }

            match tree.break_at(piece, first_y - bottom)? {
                Some(product) => {
                    tree.reparent(piece, current)?;
                    current = open_page(tree, dynamic, &mut pages);
                    shift_to_top(tree, product, top);
                    piece = product;
                }
                None if page_empty => {
                    return Err(LayoutError::Constraint {
                        node: piece,
                        message: format!(
                            "unbreakable content of height {} does not fit the page content height {}",
                            tree.boundary(piece).height(),
                            top - bottom
                        ),
                    });
                }
                None => {
                    current = open_page(tree, dynamic, &mut pages);
                    shift_to_top(tree, piece, top);
                }
            }
        }

        offset += tree.diagonal_point(piece).y - bottom_before;
    }

    log::debug!("Dynamic page {} produced {} pages", dynamic, pages.len());
    tree[dynamic].kind = NodeKind::DynamicPage { pages };
    Ok(())
}

/// Resize an `elastic` page so it ends just below its lowest child.
pub fn elastic_page(ctx: &mut FormatContext<'_>, page: NodeId) -> Result<()> {
    let tree = &mut *ctx.tree;
    if !tree.flag(page, attribute::ELASTIC) {
        return Ok(());
    }
    let (width, height) = (tree.width(page), tree.height(page));
    let lowest = tree
        .children(page)
        .iter()
        .filter(|&&c| !tree.boundary(c).is_empty())
        .map(|&c| tree.diagonal_point(c).y)
        .fold(None, |acc: Option<f64>, y| Some(acc.map_or(y, |a| a.min(y))))
        .unwrap_or(height);

    let shift = lowest - tree.margins(page).bottom;
    let new_height = (height - shift).max(0.0);
    for child in tree.children(page).to_vec() {
        tree.translate(child, 0.0, -shift);
    }
    tree.set_height(page, new_height);
    tree[page].boundary = Boundary::rectangle(Point::new(0.0, new_height), width, new_height);
    log::debug!("Elastic page {} resized from {} to {}", page, height, new_height);
    Ok(())
}

//! Box sizes: declared dimensions, growth to content, text measurement.

use crate::attribute::{self, AttributeValue};
use crate::error::Result;
use crate::style::Edges;
use crate::text::{measure_words, split_words};
use crate::tree::{NodeId, NodeKind, NodeTree};
use crate::units::Length;

use super::FormatContext;

/// Inner width of the node itself or of its nearest ancestor that has one.
pub(crate) fn nearest_inner_width(tree: &NodeTree, id: NodeId) -> f64 {
    std::iter::once(id)
        .chain(tree.ancestors(id))
        .map(|n| tree.inner_width(n))
        .find(|w| *w > 0.0)
        .unwrap_or(0.0)
}

/// Turn the declared content size into the border-box size.
///
/// A node without a width takes what its ancestors leave for it, floats
/// excepted: they start empty and grow to their content. The result is
/// clamped to the parent's inner width, then to `max-*` and `min-*`.
pub fn standard_dimension(ctx: &mut FormatContext<'_>, id: NodeId) -> Result<()> {
    let tree = &mut *ctx.tree;
    let paddings = tree.paddings(id);
    let margins = tree.margins(id);

    let mut width = match tree.number(id, attribute::WIDTH) {
        Some(width) => width.max(0.0) + paddings.horizontal(),
        None if tree.float(id).is_floating() => paddings.horizontal(),
        None => {
            let available = tree.parent(id).map_or(0.0, |p| nearest_inner_width(tree, p));
            (available - margins.horizontal()).max(paddings.horizontal())
        }
    };
    let mut height = tree.number(id, attribute::HEIGHT).unwrap_or(0.0).max(0.0) + paddings.vertical();

    if let Some(parent) = tree.parent(id) {
        let parent_inner = tree.inner_width(parent);
        if parent_inner > 0.0 && width > parent_inner {
            width = parent_inner;
        }
    }

    if let Some(max) = tree.number(id, attribute::MAX_WIDTH) {
        width = width.min(max);
    }
    if let Some(min) = tree.number(id, attribute::MIN_WIDTH) {
        width = width.max(min);
    }
    if let Some(max) = tree.number(id, attribute::MAX_HEIGHT) {
        height = height.min(max);
    }
    if let Some(min) = tree.number(id, attribute::MIN_HEIGHT) {
        height = height.max(min);
    }

    tree.set_width(id, width);
    tree.set_height(id, height);
    Ok(())
}

/// Grow the box so it encloses every child's margin box.
pub fn container_dimension(ctx: &mut FormatContext<'_>, id: NodeId) -> Result<()> {
    let tree = &mut *ctx.tree;
    let first = tree.first_point(id);
    let paddings = tree.paddings(id);
    let content_top = first.y - paddings.top;

    let mut lowest = content_top;
    let mut rightmost = first.x + paddings.left;
    for &child in tree.children(id) {
        if tree.boundary(child).is_empty() {
            continue;
        }
        let margins = tree.margins(child);
        let diagonal = tree.diagonal_point(child);
        lowest = lowest.min(diagonal.y - margins.bottom);
        rightmost = rightmost.max(diagonal.x + margins.right);
    }

    let height = tree.height(id).max(paddings.top + (content_top - lowest) + paddings.bottom);
    let width = tree.width(id).max(rightmost - first.x + paddings.right);
    tree.set_height(id, height);
    tree.set_width(id, width);
    Ok(())
}

/// Measure the words of a text node against the width its paragraph
/// offers.
pub fn text_dimension(ctx: &mut FormatContext<'_>, id: NodeId) -> Result<()> {
    let tree = &mut *ctx.tree;
    let font = ctx.fonts.resolve(tree.keyword(id, attribute::FONT_TYPE));
    let size = tree.font_size(id);

    let mut max_width = tree.parent(id).map_or(0.0, |p| nearest_inner_width(tree, p));
    if let Some(limit) = tree.number(id, attribute::MAX_WIDTH).filter(|w| *w > 0.0) {
        max_width = if max_width > 0.0 { max_width.min(limit) } else { limit };
    }

    let NodeKind::Text { content, words, .. } = &mut tree[id].kind else {
        return Ok(());
    };
    *words = measure_words(content, max_width, |s| font.width_of_text(s, size));
    log::debug!("Measured {} words for text {} at {}pt", words.len(), id, size);
    Ok(())
}

/// A length attribute in points, whether or not the node has been
/// converted yet. Percentages count as zero.
pub(crate) fn length_of(ctx: &FormatContext<'_>, id: NodeId, name: &str) -> f64 {
    match ctx.tree.attribute(id, name) {
        Some(AttributeValue::Number(n)) => *n,
        Some(AttributeValue::Text(raw)) => match Length::parse(raw) {
            Some(length @ Length::Value(..)) => length
                .resolve(ctx.units, 0.0, ctx.tree.font_size(id))
                .unwrap_or(0.0),
            _ => 0.0,
        },
        _ => 0.0,
    }
}

fn edges_of(ctx: &FormatContext<'_>, id: NodeId, sides: [&str; 4]) -> Edges {
    Edges {
        top: length_of(ctx, id, sides[0]),
        right: length_of(ctx, id, sides[1]),
        bottom: length_of(ctx, id, sides[2]),
        left: length_of(ctx, id, sides[3]),
    }
}

pub(crate) fn margins_of(ctx: &FormatContext<'_>, id: NodeId) -> Edges {
    edges_of(
        ctx,
        id,
        [attribute::MARGIN_TOP, attribute::MARGIN_RIGHT, attribute::MARGIN_BOTTOM, attribute::MARGIN_LEFT],
    )
}

pub(crate) fn paddings_of(ctx: &FormatContext<'_>, id: NodeId) -> Edges {
    edges_of(
        ctx,
        id,
        [attribute::PADDING_TOP, attribute::PADDING_RIGHT, attribute::PADDING_BOTTOM, attribute::PADDING_LEFT],
    )
}

/// The narrowest width the node can be laid out in without overflowing:
/// its widest unbreakable word or image, plus its own paddings and
/// margins.
pub fn min_content_width(ctx: &FormatContext<'_>, id: NodeId) -> f64 {
    let tree = &*ctx.tree;
    match &tree[id].kind {
        NodeKind::Text { content, .. } => {
            let font = ctx.fonts.resolve(tree.keyword(id, attribute::FONT_TYPE));
            let size = tree.font_size(id);
            split_words(content)
                .iter()
                .map(|(word, _)| font.width_of_text(word.trim_end(), size))
                .fold(0.0, f64::max)
        }
        NodeKind::Image => {
            let declared = length_of(ctx, id, attribute::WIDTH);
            if declared > 0.0 {
                declared
            } else {
                tree.number(id, attribute::ORIGINAL_WIDTH).unwrap_or(0.0)
            }
        }
        _ => {
            let children = tree
                .children(id)
                .iter()
                .map(|&child| min_content_width(ctx, child))
                .fold(0.0, f64::max);
            let own = length_of(ctx, id, attribute::MIN_WIDTH);
            own.max(children) + paddings_of(ctx, id).horizontal() + margins_of(ctx, id).horizontal()
        }
    }
}

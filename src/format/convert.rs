//! Attribute conversion: lengths to points, keywords to canonical values.
//!
//! Runs first in most chains. Afterwards every length attribute of the node
//! is either a plain number in points or the keyword `auto`.

use std::f64::consts::PI;

use log::warn;

use crate::attribute::{self, AttributeValue};
use crate::error::Result;
use crate::tree::{NodeId, NodeKind, NodeTree};
use crate::units::Length;

use super::FormatContext;

/// Lengths whose percentages refer to the parent's width.
const HORIZONTAL: &[&str] = &[
    attribute::WIDTH,
    attribute::MIN_WIDTH,
    attribute::MAX_WIDTH,
    attribute::MARGIN_LEFT,
    attribute::MARGIN_RIGHT,
    attribute::PADDING_LEFT,
    attribute::PADDING_RIGHT,
    attribute::WORD_SPACING,
];

/// Lengths whose percentages refer to the parent's height.
const VERTICAL: &[&str] = &[
    attribute::HEIGHT,
    attribute::MIN_HEIGHT,
    attribute::MAX_HEIGHT,
    attribute::MARGIN_TOP,
    attribute::MARGIN_BOTTOM,
    attribute::PADDING_TOP,
    attribute::PADDING_BOTTOM,
    attribute::BORDER_WIDTH,
];

const COLORS: &[&str] = &[attribute::COLOR, attribute::BACKGROUND_COLOR, attribute::BORDER_COLOR];

pub fn convert_attributes(ctx: &mut FormatContext<'_>, id: NodeId) -> Result<()> {
    expand_shorthand(
        ctx.tree,
        id,
        attribute::MARGIN,
        [attribute::MARGIN_TOP, attribute::MARGIN_RIGHT, attribute::MARGIN_BOTTOM, attribute::MARGIN_LEFT],
    );
    expand_shorthand(
        ctx.tree,
        id,
        attribute::PADDING,
        [attribute::PADDING_TOP, attribute::PADDING_RIGHT, attribute::PADDING_BOTTOM, attribute::PADDING_LEFT],
    );

    let parent = ctx.tree.parent(id);
    let (reference_width, reference_height) = match parent {
        Some(parent) => reference_size(ctx.tree, parent),
        None => ctx.config.page_size.dimensions(),
    };

    let parent_font = parent.map_or(ctx.config.font_size, |p| ctx.tree.font_size(p));
    convert_length(ctx, id, attribute::FONT_SIZE, parent_font, parent_font);
    let font_size = ctx.tree.font_size(id);
    convert_length(ctx, id, attribute::LINE_HEIGHT, font_size, font_size);

    let relative_width = match ctx.tree.attribute(id, attribute::WIDTH) {
        Some(AttributeValue::Text(raw)) => match Length::parse(raw) {
            Some(Length::Percent(p)) => Some(p),
            _ => None,
        },
        _ => None,
    };
    for name in HORIZONTAL {
        convert_length(ctx, id, name, reference_width, font_size);
    }
    for name in VERTICAL {
        convert_length(ctx, id, name, reference_height, font_size);
    }
    if relative_width.is_some() {
        ctx.tree[id].hints.relative_width = relative_width;
    }

    auto_margins(ctx.tree, id, parent, reference_width);
    convert_rotation(ctx.tree, id);

    for name in COLORS {
        if let Some(raw) = ctx.tree.attribute(id, name).and_then(AttributeValue::as_str) {
            let resolved = ctx.config.color(raw);
            ctx.tree.set_attribute(id, name, resolved);
        }
    }
    Ok(())
}

/// Size percentages of a child refer to.
fn reference_size(tree: &NodeTree, parent: NodeId) -> (f64, f64) {
    let width = match tree[parent].kind {
        NodeKind::Page | NodeKind::DynamicPage { .. } | NodeKind::ColumnableContainer => tree.inner_width(parent),
        _ => tree.width(parent),
    };
    let mut height = tree.height(parent);
    if tree[parent].kind.is_page() {
        height -= tree.margins(parent).vertical() + tree.paddings(parent).vertical();
    }
    (width, height.max(0.0))
}

/// Expand `"a"`, `"a b"`, `"a b c"` or `"a b c d"` onto the four sides in
/// CSS order. Sides set explicitly win.
pub(crate) fn expand_shorthand(tree: &mut NodeTree, id: NodeId, name: &str, sides: [&str; 4]) {
    let Some(value) = tree[id].attributes.remove(name) else {
        return;
    };
    let parts: Vec<AttributeValue> = match &value {
        AttributeValue::Text(raw) => raw.split_whitespace().map(AttributeValue::from).collect(),
        other => vec![other.clone()],
    };
    let [top, right, bottom, left] = match parts.as_slice() {
        [all] => [all, all, all, all],
        [v, h] => [v, h, v, h],
        [t, h, b] => [t, h, b, h],
        [t, r, b, l] => [t, r, b, l],
        _ => {
            warn!("Ignoring malformed {} shorthand on node {}: {:?}", name, id, value);
            return;
        }
    };
    for (side, value) in sides.into_iter().zip([top, right, bottom, left]) {
        if !tree[id].attributes.contains(side) {
            tree[id].attributes.set(side, value.clone());
        }
    }
}

fn convert_length(ctx: &mut FormatContext<'_>, id: NodeId, name: &str, base: f64, font_size: f64) {
    let Some(AttributeValue::Text(raw)) = ctx.tree.attribute(id, name) else {
        return;
    };
    match Length::parse(raw) {
        Some(Length::Auto) => {}
        Some(length) => {
            if let Some(value) = length.resolve(ctx.units, base, font_size) {
                ctx.tree.set_attribute(id, name, value);
            }
        }
        None => {
            warn!("Dropping unparsable {} on node {}: {:?}", name, id, raw);
            ctx.tree[id].attributes.remove(name);
        }
    }
}

/// Resolve `margin-left: auto; margin-right: auto` to equal margins that
/// center the box. A box wider than its parent widens the parent instead.
fn auto_margins(tree: &mut NodeTree, id: NodeId, parent: Option<NodeId>, parent_width: f64) {
    let is_auto = |name| tree.attribute(id, name).is_some_and(AttributeValue::is_auto);
    let (left_auto, right_auto) = (is_auto(attribute::MARGIN_LEFT), is_auto(attribute::MARGIN_RIGHT));
    if !left_auto && !right_auto {
        return;
    }
    if !(left_auto && right_auto) {
        for name in [attribute::MARGIN_LEFT, attribute::MARGIN_RIGHT] {
            if tree.attribute(id, name).is_some_and(AttributeValue::is_auto) {
                tree.set_attribute(id, name, 0.0);
            }
        }
        return;
    }

    let declared = tree.number(id, attribute::WIDTH);
    let Some(width) = declared else {
        tree.set_attribute(id, attribute::MARGIN_LEFT, 0.0);
        tree.set_attribute(id, attribute::MARGIN_RIGHT, 0.0);
        return;
    };
    let width = width + tree.paddings(id).horizontal();

    let margin = if width > parent_width {
        if let Some(parent) = parent {
            tree.set_width(parent, width);
        }
        0.0
    } else {
        (parent_width - width) / 2.0
    };
    tree.set_attribute(id, attribute::MARGIN_LEFT, margin);
    tree.set_attribute(id, attribute::MARGIN_RIGHT, margin);
    tree[id].hints.auto_margin_width = Some(width);
}

/// `"180deg"` → π. Bare numbers are radians already.
fn convert_rotation(tree: &mut NodeTree, id: NodeId) {
    let Some(AttributeValue::Text(raw)) = tree.attribute(id, attribute::ROTATE) else {
        return;
    };
    let raw = raw.trim();
    let radians = match raw.strip_suffix("deg") {
        Some(degrees) => degrees.trim().parse::<f64>().ok().map(|d| d * PI / 180.0),
        None => raw.parse::<f64>().ok(),
    };
    match radians {
        Some(radians) => tree.set_attribute(id, attribute::ROTATE, radians),
        None => {
            warn!("Dropping unparsable rotate on node {}: {:?}", id, raw);
            tree[id].attributes.remove(attribute::ROTATE);
        }
    }
}

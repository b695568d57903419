//! List enumeration: labels and the room they take.

use crate::attribute::{self, AttributeValue};
use crate::error::Result;
use crate::style::{ListPosition, ListType};
use crate::tree::{NodeId, NodeKind, NodeTree};

use super::dimension::length_of;
use super::FormatContext;

pub fn list_type(tree: &NodeTree, id: NodeId, fallback: ListType) -> ListType {
    tree.attribute(id, attribute::LIST_TYPE)
        .and_then(AttributeValue::as_str)
        .and_then(ListType::parse)
        .unwrap_or(fallback)
}

pub fn list_position(tree: &NodeTree, id: NodeId) -> ListPosition {
    tree.attribute(id, attribute::LIST_POSITION)
        .and_then(AttributeValue::as_str)
        .and_then(ListPosition::parse)
        .unwrap_or_default()
}

/// Label of the item at `index` (zero-based).
pub fn enumeration_label(list_type: ListType, index: usize) -> String {
    let n = index + 1;
    match list_type {
        ListType::Disc => "\u{2022}".to_string(),
        ListType::Circle => "\u{25CB}".to_string(),
        ListType::Square => "\u{25AA}".to_string(),
        ListType::None => String::new(),
        ListType::Decimal => format!("{}.", n),
        ListType::LowerAlpha => format!("{}.", alpha(n)),
        ListType::UpperAlpha => format!("{}.", alpha(n).to_ascii_uppercase()),
        ListType::LowerRoman => format!("{}.", roman(n)),
        ListType::UpperRoman => format!("{}.", roman(n).to_ascii_uppercase()),
    }
}

/// 1 → a, 26 → z, 27 → aa.
fn alpha(mut n: usize) -> String {
    let mut out = Vec::new();
    while n > 0 {
        n -= 1;
        out.push(b'a' + (n % 26) as u8);
        n /= 26;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

fn roman(mut n: usize) -> String {
    const NUMERALS: [(usize, &str); 13] = [
        (1000, "m"),
        (900, "cm"),
        (500, "d"),
        (400, "cd"),
        (100, "c"),
        (90, "xc"),
        (50, "l"),
        (40, "xl"),
        (10, "x"),
        (9, "ix"),
        (5, "v"),
        (4, "iv"),
        (1, "i"),
    ];
    let mut out = String::new();
    for (value, numeral) in NUMERALS {
        while n >= value {
            out.push_str(numeral);
            n -= value;
        }
    }
    out
}

/// Measure the widest label. Inside lists make room for it by widening
/// every item's left margin; outside lists hang the labels in the margin.
pub fn list_enumeration(ctx: &mut FormatContext<'_>, id: NodeId) -> Result<()> {
    let kind = list_type(ctx.tree, id, ctx.config.list_type);
    let font = ctx.fonts.resolve(ctx.tree.keyword(id, attribute::FONT_TYPE));
    let size = ctx.tree.font_size(id);
    let items = ctx.tree.children(id).to_vec();

    let width = (0..items.len())
        .map(|i| font.width_of_text(&enumeration_label(kind, i), size))
        .fold(0.0, f64::max);

    if list_position(ctx.tree, id) == ListPosition::Inside {
        for &item in &items {
            let margin = length_of(ctx, item, attribute::MARGIN_LEFT) + width;
            ctx.tree.set_attribute(item, attribute::MARGIN_LEFT, margin);
        }
    }

    ctx.tree[id].kind = NodeKind::List {
        enumeration_width: width,
    };
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::testing::{approx_eq, Fixture};

    #[test]
    fn test_labels() {
        assert_eq!(enumeration_label(ListType::Decimal, 0), "1.");
        assert_eq!(enumeration_label(ListType::LowerAlpha, 1), "b.");
        assert_eq!(enumeration_label(ListType::UpperAlpha, 26), "AA.");
        assert_eq!(enumeration_label(ListType::LowerRoman, 3), "iv.");
        assert_eq!(enumeration_label(ListType::UpperRoman, 13), "XIV.");
        assert_eq!(enumeration_label(ListType::Disc, 5), "\u{2022}");
        assert_eq!(enumeration_label(ListType::None, 0), "");
    }

    fn list(fx: &mut Fixture, items: usize) -> (NodeId, Vec<NodeId>) {
        let list = fx.tree.create(NodeKind::list());
        fx.tree.set_attribute(list, attribute::FONT_SIZE, 10.0);
        let ids = (0..items)
            .map(|_| {
                let item = fx.tree.create(NodeKind::Container);
                fx.tree.set_attribute(item, attribute::MARGIN_LEFT, 10.0);
                fx.child(list, item);
                item
            })
            .collect();
        (list, ids)
    }

    #[test]
    fn test_inside_list_widens_item_margins() {
        let mut fx = Fixture::new();
        let (list, items) = list(&mut fx, 12);
        fx.tree.set_attribute(list, attribute::LIST_TYPE, "decimal");
        fx.tree.set_attribute(list, attribute::LIST_POSITION, "inside");

        list_enumeration(&mut fx.ctx(), list).unwrap();

        // "12." is the widest label: 3 characters at 5pt.
        let NodeKind::List { enumeration_width } = fx.tree[list].kind else { unreachable!() };
        assert!(approx_eq(enumeration_width, 15.0));
        assert!(approx_eq(fx.tree.margins(items[0]).left, 25.0));
    }

    #[test]
    fn test_outside_list_leaves_margins_alone() {
        let mut fx = Fixture::new();
        let (list, items) = list(&mut fx, 2);

        list_enumeration(&mut fx.ctx(), list).unwrap();

        let NodeKind::List { enumeration_width } = fx.tree[list].kind else { unreachable!() };
        assert!(approx_eq(enumeration_width, 5.0));
        assert_eq!(fx.tree.margins(items[1]).left, 10.0);
    }
}

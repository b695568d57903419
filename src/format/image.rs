//! Image sizing from intrinsic dimensions.

use log::warn;

use crate::attribute::{self, AttributeValue};
use crate::error::Result;
use crate::image_loader::image_info;
use crate::tree::{NodeId, NodeTree};

use super::FormatContext;

/// Intrinsic size from `original-width`/`original-height`, or from the
/// image source. Caches what it reads from the source.
fn original_size(tree: &mut NodeTree, id: NodeId) -> Option<(f64, f64)> {
    let declared = (
        tree.number(id, attribute::ORIGINAL_WIDTH),
        tree.number(id, attribute::ORIGINAL_HEIGHT),
    );
    if let (Some(w), Some(h)) = declared {
        return (w > 0.0 && h > 0.0).then_some((w, h));
    }

    let src = tree.attribute(id, attribute::SRC).and_then(AttributeValue::as_str)?;
    match image_info(src) {
        Ok(info) => {
            let (w, h) = (info.width_px as f64, info.height_px as f64);
            tree.set_attribute(id, attribute::ORIGINAL_WIDTH, w);
            tree.set_attribute(id, attribute::ORIGINAL_HEIGHT, h);
            (w > 0.0 && h > 0.0).then_some((w, h))
        }
        Err(e) => {
            warn!("Cannot read size of image {}: {}", id, e);
            None
        }
    }
}

/// Fill in missing dimensions. An image without either dimension takes its
/// intrinsic size, scaled down to fit its parent; with one dimension the
/// other follows from the intrinsic ratio.
pub fn image_attributes(ctx: &mut FormatContext<'_>, id: NodeId) -> Result<()> {
    let tree = &mut *ctx.tree;
    let Some((original_width, original_height)) = original_size(tree, id) else {
        warn!("Image {} has no intrinsic size; using declared dimensions only", id);
        return Ok(());
    };

    let declared_width = tree.number(id, attribute::WIDTH).filter(|w| *w > 0.0);
    let declared_height = tree.number(id, attribute::HEIGHT).filter(|h| *h > 0.0);
    let (width, height) = match (declared_width, declared_height) {
        (Some(w), Some(h)) => (w, h),
        (Some(w), None) => (w, w * original_height / original_width),
        (None, Some(h)) => (h * original_width / original_height, h),
        (None, None) => {
            let (mut w, mut h) = (original_width, original_height);
            if let Some(parent) = tree.parent(id) {
                let max_width = tree.inner_width(parent);
                let max_height = tree.height(parent) - tree.paddings(parent).vertical();
                if max_width > 0.0 && w > max_width {
                    h *= max_width / w;
                    w = max_width;
                }
                if max_height > 0.0 && h > max_height {
                    w *= max_height / h;
                    h = max_height;
                }
            }
            (w, h)
        }
    };

    tree.set_width(id, width);
    tree.set_height(id, height);
    Ok(())
}

/// With `keep-ratio` (the default) shrink one dimension so the box has the
/// intrinsic aspect ratio.
pub fn image_ratio(ctx: &mut FormatContext<'_>, id: NodeId) -> Result<()> {
    let tree = &mut *ctx.tree;
    let keep_ratio = tree
        .attribute(id, attribute::KEEP_RATIO)
        .map_or(true, AttributeValue::as_bool);
    if !keep_ratio {
        return Ok(());
    }
    let (Some(original_width), Some(original_height)) = (
        tree.number(id, attribute::ORIGINAL_WIDTH),
        tree.number(id, attribute::ORIGINAL_HEIGHT),
    ) else {
        return Ok(());
    };
    let (width, height) = (tree.width(id), tree.height(id));
    if original_height <= 0.0 || height <= 0.0 {
        return Ok(());
    }

    let ratio = original_width / original_height;
    if width / height > ratio {
        tree.set_width(id, height * ratio);
    } else {
        tree.set_height(id, width / ratio);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::testing::{approx_eq, Fixture};
    use crate::tree::NodeKind;

    fn image(fx: &mut Fixture, original: (f64, f64)) -> NodeId {
        let id = fx.tree.create(NodeKind::Image);
        fx.tree.set_attribute(id, attribute::ORIGINAL_WIDTH, original.0);
        fx.tree.set_attribute(id, attribute::ORIGINAL_HEIGHT, original.1);
        id
    }

    #[test]
    fn test_ratio_is_kept() {
        for (original, size, expected) in [
            ((50.0, 100.0), (50.0, 50.0), (25.0, 50.0)),
            ((100.0, 50.0), (50.0, 50.0), (50.0, 25.0)),
        ] {
            let mut fx = Fixture::new();
            let id = image(&mut fx, original);
            fx.tree.set_width(id, size.0);
            fx.tree.set_height(id, size.1);

            image_ratio(&mut fx.ctx(), id).unwrap();
            assert_eq!((fx.tree.width(id), fx.tree.height(id)), expected);
        }
    }

    #[test]
    fn test_ratio_can_be_disabled() {
        let mut fx = Fixture::new();
        let id = image(&mut fx, (50.0, 100.0));
        fx.tree.set_width(id, 50.0);
        fx.tree.set_height(id, 50.0);
        fx.tree.set_attribute(id, attribute::KEEP_RATIO, false);

        image_ratio(&mut fx.ctx(), id).unwrap();
        assert_eq!(fx.tree.width(id), 50.0);
    }

    #[test]
    fn test_missing_dimensions_fit_the_parent() {
        let mut fx = Fixture::new();
        let parent = fx.placed(NodeKind::Container, 0.0, 100.0, 84.0, 50.0);
        let id = image(&mut fx, (120.0, 100.0));
        fx.child(parent, id);

        image_attributes(&mut fx.ctx(), id).unwrap();

        assert!(approx_eq(fx.tree.height(id), 50.0));
        assert!(fx.tree.width(id) < 84.0);
    }

    #[test]
    fn test_one_dimension_derives_the_other() {
        let mut fx = Fixture::new();
        let id = image(&mut fx, (200.0, 100.0));
        fx.tree.set_attribute(id, attribute::WIDTH, 50.0);

        image_attributes(&mut fx.ctx(), id).unwrap();
        assert_eq!(fx.tree.height(id), 25.0);
    }

    #[test]
    fn test_size_is_read_from_the_source() {
        let mut fx = Fixture::new();
        let id = fx.tree.create(NodeKind::Image);
        fx.tree.set_attribute(
            id,
            attribute::SRC,
            "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==",
        );

        image_attributes(&mut fx.ctx(), id).unwrap();

        assert_eq!(fx.tree.number(id, attribute::ORIGINAL_WIDTH), Some(1.0));
        assert_eq!((fx.tree.width(id), fx.tree.height(id)), (1.0, 1.0));
    }
}

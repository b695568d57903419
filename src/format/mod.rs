//! # Formatter Pipeline
//!
//! Every node kind has a fixed chain of formatters. The *pre* chain runs
//! top-down before the node's children are formatted and resolves
//! everything a child needs from its parent: converted attributes, width,
//! first point. The *post* chain runs bottom-up once all children are
//! final and settles what depends on them: height, float placement,
//! paragraph lines, row heights, columns and pages.
//!
//! ```text
//! format(node):
//!     for f in chain(node).pre:  f.apply(node)
//!     for child in children:     format(child)
//!     for f in chain(node).post: f.apply(node)
//! ```
//!
//! A formatter reads the node's own attributes and what its ancestors and
//! earlier siblings already resolved, and writes the node's boundary and
//! attributes (plus, for the structural passes, the positions of its
//! children).

pub mod column;
pub mod convert;
pub mod dimension;
pub mod float;
pub mod image;
pub mod list;
pub mod page;
pub mod paragraph;
pub mod position;
pub mod table;

use crate::config::LayoutConfig;
use crate::error::Result;
use crate::font::FontRegistry;
use crate::tree::{NodeId, NodeKind, NodeTree};
use crate::units::UnitConverter;

/// Everything a formatter may touch.
pub struct FormatContext<'a> {
    pub tree: &'a mut NodeTree,
    pub config: &'a LayoutConfig,
    pub units: &'a dyn UnitConverter,
    pub fonts: &'a FontRegistry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Formatter {
    PageGeometry,
    ConvertAttributes,
    ImageAttributes,
    ImageRatio,
    StandardDimension,
    FirstPointPosition,
    CellFirstPoint,
    TextDimension,
    TableColumns,
    ListEnumeration,
    ContainerDimension,
    StandardPosition,
    Float,
    VerticalAlign,
    Paragraph,
    RowDimension,
    ColumnBreaking,
    PageBreaking,
    ElasticPage,
}

impl Formatter {
    pub fn apply(self, ctx: &mut FormatContext<'_>, node: NodeId) -> Result<()> {
        log::trace!("{:?} on {} ({})", self, node, ctx.tree[node].kind.name());
        match self {
            Formatter::PageGeometry => page::page_geometry(ctx, node),
            Formatter::ConvertAttributes => convert::convert_attributes(ctx, node),
            Formatter::ImageAttributes => image::image_attributes(ctx, node),
            Formatter::ImageRatio => image::image_ratio(ctx, node),
            Formatter::StandardDimension => dimension::standard_dimension(ctx, node),
            Formatter::FirstPointPosition => position::first_point_position(ctx, node),
            Formatter::CellFirstPoint => position::cell_first_point(ctx, node),
            Formatter::TextDimension => dimension::text_dimension(ctx, node),
            Formatter::TableColumns => table::table_columns(ctx, node),
            Formatter::ListEnumeration => list::list_enumeration(ctx, node),
            Formatter::ContainerDimension => dimension::container_dimension(ctx, node),
            Formatter::StandardPosition => position::standard_position(ctx, node),
            Formatter::Float => float::float_layout(ctx, node),
            Formatter::VerticalAlign => position::vertical_align(ctx, node),
            Formatter::Paragraph => paragraph::paragraph_layout(ctx, node),
            Formatter::RowDimension => table::row_dimension(ctx, node),
            Formatter::ColumnBreaking => column::column_breaking(ctx, node),
            Formatter::PageBreaking => page::page_breaking(ctx, node),
            Formatter::ElasticPage => page::elastic_page(ctx, node),
        }
    }
}

/// The formatters of one node kind.
#[derive(Debug, Clone, Copy)]
pub struct Chain {
    pub pre: &'static [Formatter],
    pub post: &'static [Formatter],
}

const CONTAINER: Chain = Chain {
    pre: &[
        Formatter::ConvertAttributes,
        Formatter::StandardDimension,
        Formatter::FirstPointPosition,
    ],
    post: &[
        Formatter::ContainerDimension,
        Formatter::StandardPosition,
        Formatter::Float,
        Formatter::VerticalAlign,
    ],
};

pub fn chain_for(kind: &NodeKind) -> Chain {
    use Formatter::*;
    match kind {
        NodeKind::PageCollection => Chain { pre: &[], post: &[] },
        NodeKind::Page => Chain {
            pre: &[PageGeometry],
            post: &[Float, ColumnBreaking, ElasticPage],
        },
        NodeKind::DynamicPage { .. } => Chain {
            pre: &[PageGeometry],
            post: &[Float, ColumnBreaking, PageBreaking],
        },
        NodeKind::Container => CONTAINER,
        NodeKind::ColumnableContainer => Chain {
            pre: CONTAINER.pre,
            post: &[ContainerDimension, StandardPosition],
        },
        NodeKind::List { .. } => Chain {
            pre: &[ConvertAttributes, StandardDimension, FirstPointPosition, ListEnumeration],
            post: CONTAINER.post,
        },
        NodeKind::Paragraph { .. } => Chain {
            pre: CONTAINER.pre,
            post: &[Paragraph, StandardPosition],
        },
        NodeKind::Text { .. } => Chain {
            pre: &[TextDimension],
            post: &[],
        },
        NodeKind::Image => Chain {
            pre: &[
                ConvertAttributes,
                ImageAttributes,
                ImageRatio,
                StandardDimension,
                FirstPointPosition,
            ],
            post: &[StandardPosition],
        },
        NodeKind::Table { .. } => Chain {
            pre: &[ConvertAttributes, StandardDimension, FirstPointPosition, TableColumns],
            post: &[ContainerDimension, StandardPosition],
        },
        NodeKind::Row => Chain {
            pre: &[StandardDimension, FirstPointPosition],
            post: &[StandardPosition, RowDimension],
        },
        NodeKind::Cell { .. } => Chain {
            pre: &[ConvertAttributes, StandardDimension, CellFirstPoint],
            post: CONTAINER.post,
        },
    }
}

/// Format a node and its whole subtree.
pub fn format_node(ctx: &mut FormatContext<'_>, node: NodeId) -> Result<()> {
    let chain = chain_for(&ctx.tree[node].kind);
    for formatter in chain.pre {
        formatter.apply(ctx, node)?;
    }
    let children = ctx.tree.children(node).to_vec();
    for child in children {
        format_node(ctx, child)?;
    }
    for formatter in chain.post {
        formatter.apply(ctx, node)?;
    }
    Ok(())
}

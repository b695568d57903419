//! # Node Factory
//!
//! Maps element tags to node kinds and builds the node tree from a
//! [`Source`](crate::model::Source).
//!
//! | Tag                  | Node                 |
//! |----------------------|----------------------|
//! | `page`               | `Page`               |
//! | `dynamic-page`       | `DynamicPage`        |
//! | `div`, `li`          | `Container`          |
//! | `column-layout`      | `ColumnableContainer`|
//! | `p`                  | `Paragraph`          |
//! | `span`, `text`, `br` | `Text`               |
//! | `table`, `tr`, `td`  | `Table`, `Row`, `Cell` |
//! | `img`                | `Image`              |
//! | `ul`, `ol`           | `List`               |
//!
//! Text that is not inside a paragraph is wrapped into an anonymous one;
//! consecutive text siblings share it. Top-level content that is not a page
//! goes into a dynamic page.

use std::collections::HashMap;

use crate::attribute::{self, AttributeBag};
use crate::error::{LayoutError, Result};
use crate::model::Element;
use crate::tree::{NodeId, NodeKind, NodeTree};

/// A node kind with the attributes its tag implies.
#[derive(Debug, Clone, PartialEq)]
pub struct Prototype {
    pub kind: NodeKind,
    pub attributes: AttributeBag,
}

impl Prototype {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            attributes: AttributeBag::new(),
        }
    }

    pub fn with(mut self, name: &str, value: impl Into<attribute::AttributeValue>) -> Self {
        self.attributes.set(name, value);
        self
    }
}

pub trait NodeFactory {
    fn create(&self, tag: &str) -> Result<Prototype>;
}

#[derive(Debug, Clone)]
pub struct TagFactory {
    prototypes: HashMap<String, Prototype>,
}

impl Default for TagFactory {
    fn default() -> Self {
        let mut factory = Self {
            prototypes: HashMap::new(),
        };
        factory.register("page", Prototype::new(NodeKind::Page));
        factory.register("dynamic-page", Prototype::new(NodeKind::dynamic_page()));
        factory.register("div", Prototype::new(NodeKind::Container));
        factory.register("li", Prototype::new(NodeKind::Container));
        factory.register("column-layout", Prototype::new(NodeKind::ColumnableContainer));
        factory.register("p", Prototype::new(NodeKind::paragraph()));
        factory.register("span", Prototype::new(NodeKind::text("")));
        factory.register("text", Prototype::new(NodeKind::text("")));
        factory.register("br", Prototype::new(NodeKind::text("\n")));
        factory.register("table", Prototype::new(NodeKind::table()));
        factory.register("tr", Prototype::new(NodeKind::Row));
        factory.register("td", Prototype::new(NodeKind::cell()));
        factory.register("img", Prototype::new(NodeKind::Image));
        factory.register("ul", Prototype::new(NodeKind::list()));
        factory.register("ol", Prototype::new(NodeKind::list()).with(attribute::LIST_TYPE, "decimal"));
        factory
    }
}

impl TagFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the prototype of a tag.
    pub fn register(&mut self, tag: impl Into<String>, prototype: Prototype) {
        self.prototypes.insert(tag.into(), prototype);
    }
}

impl NodeFactory for TagFactory {
    fn create(&self, tag: &str) -> Result<Prototype> {
        self.prototypes
            .get(tag)
            .cloned()
            .ok_or_else(|| LayoutError::UnknownTag(tag.to_string()))
    }
}

/// Build the tree of `elements` under a new page collection and return the
/// collection.
pub fn build_tree(tree: &mut NodeTree, factory: &dyn NodeFactory, elements: &[Element]) -> Result<NodeId> {
    let root = tree.create(NodeKind::PageCollection);
    let mut loose_page: Option<NodeId> = None;
    let mut paragraph: Option<NodeId> = None;

    for element in elements {
        let id = build_element(tree, factory, element)?;
        if tree[id].kind.is_page() {
            tree.append(root, id)?;
            loose_page = None;
            paragraph = None;
            continue;
        }
        let page = match loose_page {
            Some(page) => page,
            None => {
                log::debug!("Wrapping top-level <{}> into a dynamic page", element.tag);
                let page = tree.create(NodeKind::dynamic_page());
                tree.append(root, page)?;
                loose_page = Some(page);
                page
            }
        };
        attach(tree, page, id, &mut paragraph)?;
    }
    Ok(root)
}

fn build_element(tree: &mut NodeTree, factory: &dyn NodeFactory, element: &Element) -> Result<NodeId> {
    let Prototype { mut kind, mut attributes } = factory.create(&element.tag)?;
    for (name, value) in &element.attributes {
        attributes.set(name.as_str(), value.clone());
    }

    let mut inline_text = element.text.as_deref();
    if let NodeKind::Text { content, .. } = &mut kind {
        if let Some(text) = inline_text.take() {
            content.push_str(text);
        }
        if !element.children.is_empty() {
            log::warn!("Children of text element <{}> are ignored", element.tag);
        }
    }

    let id = tree.create_with(kind, attributes);
    for behaviour in &element.behaviours {
        tree.add_behaviour(id, behaviour.clone());
    }
    if tree[id].kind.is_leaf() {
        return Ok(id);
    }

    let mut paragraph = None;
    if let Some(text) = inline_text {
        let child = tree.create(NodeKind::text(text));
        attach(tree, id, child, &mut paragraph)?;
    }
    for child in &element.children {
        let child = build_element(tree, factory, child)?;
        attach(tree, id, child, &mut paragraph)?;
    }
    Ok(id)
}

/// Append `child` to `parent`, routing text outside paragraphs through the
/// open anonymous paragraph.
fn attach(tree: &mut NodeTree, parent: NodeId, child: NodeId, paragraph: &mut Option<NodeId>) -> Result<()> {
    let is_text = matches!(tree[child].kind, NodeKind::Text { .. });
    if !is_text || matches!(tree[parent].kind, NodeKind::Paragraph { .. }) {
        *paragraph = None;
        tree.append(parent, child)?;
        return Ok(());
    }
    let wrapper = match *paragraph {
        Some(wrapper) => wrapper,
        None => {
            let wrapper = tree.create(NodeKind::paragraph());
            tree.append(parent, wrapper)?;
            *paragraph = Some(wrapper);
            wrapper
        }
    };
    tree.append(wrapper, child)?;
    Ok(())
}

//! # Node Tree
//!
//! All layout nodes live in one arena, [`NodeTree`], and refer to each other
//! by [`NodeId`]. Parent and child links are plain indices, so moving a
//! subtree to another page or splitting a node in two is a matter of
//! rewiring ids. Slots are never freed; a node removed from the tree simply
//! ends up without a parent.
//!
//! Every node owns exactly one [`Boundary`] and one [`AttributeBag`]. What
//! differs between node types is captured by the closed [`NodeKind`] enum,
//! which also carries the per-kind layout results (paragraph lines, text
//! line parts, table columns, generated pages).

pub mod breaking;

use std::fmt;
use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use crate::attribute::{self, AttributeBag, AttributeValue};
use crate::error::StructuralError;
use crate::geometry::{Boundary, Point};
use crate::style::{Edges, Float};
use crate::text::Word;

/// Index of a node in its [`NodeTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One line of a formatted paragraph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Line {
    pub top: f64,
    pub height: f64,
    /// X of the first word after alignment.
    pub x: f64,
    /// Width occupied by words and spacing.
    pub width: f64,
}

impl Line {
    pub fn bottom(&self) -> f64 {
        self.top - self.height
    }
}

/// The words of one text node that sit on one paragraph line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinePart {
    /// Index of the paragraph line.
    pub line: usize,
    pub text: String,
    pub x: f64,
    pub top: f64,
    pub width: f64,
    /// Line height of the owning text node.
    pub height: f64,
    pub word_spacing: f64,
}

/// The node types known to the layout core.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Root of a document; its children are pages.
    PageCollection,
    Page,
    /// A page that grows into as many physical pages as its content needs.
    DynamicPage { pages: Vec<NodeId> },
    Container,
    /// A container whose content flows through side-by-side columns.
    ColumnableContainer,
    Paragraph { lines: Vec<Line> },
    Text {
        content: String,
        words: Vec<Word>,
        parts: Vec<LinePart>,
    },
    Image,
    Table { columns: Vec<f64> },
    Row,
    Cell { column: usize },
    List { enumeration_width: f64 },
}

impl NodeKind {
    pub fn text(content: impl Into<String>) -> Self {
        NodeKind::Text {
            content: content.into(),
            words: Vec::new(),
            parts: Vec::new(),
        }
    }

    pub fn paragraph() -> Self {
        NodeKind::Paragraph { lines: Vec::new() }
    }

    pub fn dynamic_page() -> Self {
        NodeKind::DynamicPage { pages: Vec::new() }
    }

    pub fn table() -> Self {
        NodeKind::Table { columns: Vec::new() }
    }

    pub fn cell() -> Self {
        NodeKind::Cell { column: 0 }
    }

    pub fn list() -> Self {
        NodeKind::List {
            enumeration_width: 0.0,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::PageCollection => "page-collection",
            NodeKind::Page => "page",
            NodeKind::DynamicPage { .. } => "dynamic-page",
            NodeKind::Container => "container",
            NodeKind::ColumnableContainer => "columnable-container",
            NodeKind::Paragraph { .. } => "paragraph",
            NodeKind::Text { .. } => "text",
            NodeKind::Image => "image",
            NodeKind::Table { .. } => "table",
            NodeKind::Row => "row",
            NodeKind::Cell { .. } => "cell",
            NodeKind::List { .. } => "list",
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, NodeKind::Text { .. } | NodeKind::Image)
    }

    pub fn is_page(&self) -> bool {
        matches!(self, NodeKind::Page | NodeKind::DynamicPage { .. })
    }

    /// The same kind with its layout results dropped.
    fn emptied(&self) -> Self {
        match self {
            NodeKind::DynamicPage { .. } => NodeKind::dynamic_page(),
            NodeKind::Paragraph { .. } => NodeKind::paragraph(),
            NodeKind::Text { content, words, .. } => NodeKind::Text {
                content: content.clone(),
                words: words.clone(),
                parts: Vec::new(),
            },
            other => other.clone(),
        }
    }
}

/// Attach points for interactive features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Behaviour {
    Bookmark { title: String },
    GoToUri { uri: String },
    /// Link to the node whose `id` attribute equals `target`.
    GoToInternal { target: String },
    StickyNote { text: String },
}

/// Bookkeeping left by earlier formatters for later ones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutHints {
    /// Width the auto margins were computed for.
    pub auto_margin_width: Option<f64>,
    /// Percentage width as declared, before resolution.
    pub relative_width: Option<f64>,
    /// Horizontal offset of a table cell inside its row.
    pub cell_offset: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeData {
    pub kind: NodeKind,
    pub attributes: AttributeBag,
    pub boundary: Boundary,
    pub behaviours: Vec<Behaviour>,
    pub hints: LayoutHints,
    priority: i32,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl NodeData {
    fn new(kind: NodeKind, attributes: AttributeBag) -> Self {
        Self {
            kind,
            attributes,
            boundary: Boundary::new(),
            behaviours: Vec::new(),
            hints: LayoutHints::default(),
            priority: 0,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Column layout of a columnable container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnSettings {
    pub count: usize,
    /// Horizontal space between adjacent columns.
    pub gap: f64,
    /// Balance column heights instead of filling each column to the page.
    pub equal: bool,
}

impl ColumnSettings {
    pub const DEFAULT_COUNT: usize = 2;
    pub const MAX_COUNT: usize = 100;
    pub const DEFAULT_GAP: f64 = 10.0;

    pub fn column_width(&self, total: f64) -> f64 {
        let count = self.count.max(1) as f64;
        ((total - self.gap * (count - 1.0)) / count).max(0.0)
    }
}

/// Fallbacks for inherited typography.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeDefaults {
    pub font_size: f64,
    pub line_height_factor: f64,
}

impl Default for TreeDefaults {
    fn default() -> Self {
        Self {
            font_size: 12.0,
            line_height_factor: 1.2,
        }
    }
}

/// Arena of layout nodes.
#[derive(Debug, Clone, Default)]
pub struct NodeTree {
    nodes: Vec<NodeData>,
    defaults: TreeDefaults,
}

impl Index<NodeId> for NodeTree {
    type Output = NodeData;

    fn index(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0]
    }
}

impl IndexMut<NodeId> for NodeTree {
    fn index_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.0]
    }
}

impl NodeTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults(defaults: TreeDefaults) -> Self {
        Self {
            nodes: Vec::new(),
            defaults,
        }
    }

    pub fn defaults(&self) -> TreeDefaults {
        self.defaults
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id.0)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    pub fn create(&mut self, kind: NodeKind) -> NodeId {
        self.create_with(kind, AttributeBag::new())
    }

    pub fn create_with(&mut self, kind: NodeKind, attributes: AttributeBag) -> NodeId {
        self.nodes.push(NodeData::new(kind, attributes));
        NodeId(self.nodes.len() - 1)
    }

    fn check(&self, id: NodeId) -> Result<(), StructuralError> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(StructuralError::UnknownNode(id))
        }
    }

    // ── Structure ──────────────────────────────────────────────

    /// Add `child` as the last child of `parent`. The child is detached from
    /// its previous parent, its boundary is reset and its priority derived
    /// from the new parent.
    pub fn append(&mut self, parent: NodeId, child: NodeId) -> Result<(), StructuralError> {
        let index = self.check_link(parent, child)?;
        self.insert_unchecked(parent, index, child);
        self[child].boundary.reset();
        Ok(())
    }

    /// Like [`append`](Self::append) but at a given position.
    pub fn insert(&mut self, parent: NodeId, index: usize, child: NodeId) -> Result<(), StructuralError> {
        self.check_link(parent, child)?;
        let index = index.min(self[parent].children.len());
        self.insert_unchecked(parent, index, child);
        self[child].boundary.reset();
        Ok(())
    }

    /// Move a formatted subtree under a new parent, keeping its geometry.
    pub fn reparent(&mut self, child: NodeId, parent: NodeId) -> Result<(), StructuralError> {
        let index = self.check_link(parent, child)?;
        self.insert_unchecked(parent, index, child);
        Ok(())
    }

    /// Point `child` at `parent` without listing it as a child. Used for the
    /// pages generated by a dynamic page, which inherit from it but are not
    /// part of its content.
    pub(crate) fn adopt(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self[child].parent = Some(parent);
        self.assign_priority(child, self[parent].priority - 1);
    }

    fn check_link(&self, parent: NodeId, child: NodeId) -> Result<usize, StructuralError> {
        self.check(parent)?;
        self.check(child)?;
        if parent == child || self.ancestors(parent).any(|a| a == child) {
            return Err(StructuralError::InvalidParent { parent, child });
        }
        let len = self[parent].children.len();
        Ok(if self[child].parent == Some(parent) { len - 1 } else { len })
    }

    fn insert_unchecked(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.detach(child);
        let index = index.min(self[parent].children.len());
        self[parent].children.insert(index, child);
        self[child].parent = Some(parent);
        self.assign_priority(child, self[parent].priority - 1);
    }

    fn assign_priority(&mut self, id: NodeId, priority: i32) {
        self[id].priority = priority;
        let children = self[id].children.clone();
        for child in children {
            self.assign_priority(child, priority - 1);
        }
    }

    /// Unlink a node from its parent. Returns the former parent.
    pub fn detach(&mut self, id: NodeId) -> Option<NodeId> {
        let parent = self[id].parent.take()?;
        self[parent].children.retain(|&c| c != id);
        Some(parent)
    }

    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        if self[child].parent != Some(parent) {
            return false;
        }
        self.detach(child);
        true
    }

    /// Detach and return all children of `parent`.
    pub fn remove_all(&mut self, parent: NodeId) -> Vec<NodeId> {
        let children = std::mem::take(&mut self[parent].children);
        for &child in &children {
            self[child].parent = None;
        }
        children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self[id].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self[id].children
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self[id].parent?;
        let siblings = &self[parent].children;
        let index = siblings.iter().position(|&c| c == id)?;
        index.checked_sub(1).map(|i| siblings[i])
    }

    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self[id].parent, move |&p| self[p].parent)
    }

    /// The node and all of its descendants in document order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self[current].children.iter().rev().copied());
        }
        out
    }

    /// Depth-first search for the node whose `id` attribute matches.
    pub fn find_by_id(&self, root: NodeId, key: &str) -> Option<NodeId> {
        self.descendants(root).into_iter().find(|&n| {
            self[n].attributes.get("id").and_then(AttributeValue::as_str) == Some(key)
        })
    }

    pub fn has_leaf_descendants(&self, id: NodeId) -> bool {
        self[id]
            .children
            .iter()
            .any(|&c| self[c].kind.is_leaf() || self.has_leaf_descendants(c))
    }

    /// A detached copy of the node with the same attributes and an empty
    /// boundary, without children or layout results.
    pub fn copy_without_children(&mut self, id: NodeId) -> NodeId {
        let source = &self[id];
        let mut copy = NodeData::new(source.kind.emptied(), source.attributes.clone());
        copy.behaviours = source.behaviours.clone();
        copy.hints = source.hints.clone();
        copy.priority = source.priority;
        self.nodes.push(copy);
        NodeId(self.nodes.len() - 1)
    }

    // ── Attributes ─────────────────────────────────────────────

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&AttributeValue> {
        self[id].attributes.get(name)
    }

    /// Local lookup that falls back to ancestors for inherited attributes.
    pub fn recursive_attribute(&self, id: NodeId, name: &str) -> Option<&AttributeValue> {
        if let Some(value) = self[id].attributes.get(name) {
            return Some(value);
        }
        if !attribute::is_recursive(name) {
            return None;
        }
        self.ancestors(id)
            .find_map(|ancestor| self[ancestor].attributes.get(name))
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: impl Into<AttributeValue>) {
        self[id].attributes.set(name, value);
    }

    pub fn number(&self, id: NodeId, name: &str) -> Option<f64> {
        self[id].attributes.number(name)
    }

    pub fn flag(&self, id: NodeId, name: &str) -> bool {
        self[id].attributes.flag(name)
    }

    pub fn keyword(&self, id: NodeId, name: &str) -> Option<&str> {
        self.recursive_attribute(id, name)
            .and_then(AttributeValue::as_str)
    }

    pub fn width(&self, id: NodeId) -> f64 {
        self.number(id, attribute::WIDTH).unwrap_or(0.0).max(0.0)
    }

    pub fn height(&self, id: NodeId) -> f64 {
        self.number(id, attribute::HEIGHT).unwrap_or(0.0).max(0.0)
    }

    pub fn set_width(&mut self, id: NodeId, width: f64) {
        self.set_attribute(id, attribute::WIDTH, width.max(0.0));
    }

    pub fn set_height(&mut self, id: NodeId, height: f64) {
        self.set_attribute(id, attribute::HEIGHT, height.max(0.0));
    }

    pub fn margins(&self, id: NodeId) -> Edges {
        Edges {
            top: self.number(id, attribute::MARGIN_TOP).unwrap_or(0.0),
            right: self.number(id, attribute::MARGIN_RIGHT).unwrap_or(0.0),
            bottom: self.number(id, attribute::MARGIN_BOTTOM).unwrap_or(0.0),
            left: self.number(id, attribute::MARGIN_LEFT).unwrap_or(0.0),
        }
    }

    pub fn paddings(&self, id: NodeId) -> Edges {
        Edges {
            top: self.number(id, attribute::PADDING_TOP).unwrap_or(0.0),
            right: self.number(id, attribute::PADDING_RIGHT).unwrap_or(0.0),
            bottom: self.number(id, attribute::PADDING_BOTTOM).unwrap_or(0.0),
            left: self.number(id, attribute::PADDING_LEFT).unwrap_or(0.0),
        }
    }

    pub fn float(&self, id: NodeId) -> Float {
        self.attribute(id, attribute::FLOAT)
            .and_then(AttributeValue::as_str)
            .and_then(Float::parse)
            .unwrap_or_default()
    }

    pub fn font_size(&self, id: NodeId) -> f64 {
        self.recursive_attribute(id, attribute::FONT_SIZE)
            .and_then(AttributeValue::as_number)
            .filter(|s| *s > 0.0)
            .unwrap_or(self.defaults.font_size)
    }

    pub fn line_height(&self, id: NodeId) -> f64 {
        self.recursive_attribute(id, attribute::LINE_HEIGHT)
            .and_then(AttributeValue::as_number)
            .filter(|h| *h > 0.0)
            .unwrap_or_else(|| self.font_size(id) * self.defaults.line_height_factor)
    }

    // ── Geometry ───────────────────────────────────────────────

    pub fn boundary(&self, id: NodeId) -> &Boundary {
        &self[id].boundary
    }

    pub fn boundary_mut(&mut self, id: NodeId) -> &mut Boundary {
        &mut self[id].boundary
    }

    pub fn first_point(&self, id: NodeId) -> Point {
        self[id].boundary.first_point().unwrap_or_default()
    }

    pub fn diagonal_point(&self, id: NodeId) -> Point {
        self[id].boundary.diagonal_point().unwrap_or_default()
    }

    /// Where the first child's margin box starts: inside the paddings, and
    /// for pages inside the page margins too.
    pub fn start_drawing_point(&self, id: NodeId) -> Point {
        let padding = self.paddings(id);
        let mut point = self.first_point(id).translate(padding.left, -padding.top);
        if self[id].kind.is_page() {
            let margin = self.margins(id);
            point = point.translate(margin.left, -margin.top);
        }
        point
    }

    /// Width available to children. Children of a columnable container see
    /// the width of a single column.
    pub fn inner_width(&self, id: NodeId) -> f64 {
        let mut inner = self.width(id) - self.paddings(id).horizontal();
        if self[id].kind.is_page() {
            inner -= self.margins(id).horizontal();
        }
        if self[id].kind == NodeKind::ColumnableContainer {
            inner = self.column_settings(id).column_width(inner);
        }
        inner.max(0.0)
    }

    pub fn column_settings(&self, id: NodeId) -> ColumnSettings {
        let count = match self.number(id, attribute::NUMBER_OF_COLUMNS).filter(|n| *n >= 1.0) {
            None => ColumnSettings::DEFAULT_COUNT,
            Some(n) if n > ColumnSettings::MAX_COUNT as f64 => {
                log::warn!(
                    "Node {} asks for {} columns; limiting it to {}",
                    id,
                    n,
                    ColumnSettings::MAX_COUNT
                );
                ColumnSettings::MAX_COUNT
            }
            Some(n) => n as usize,
        };
        ColumnSettings {
            count,
            gap: self
                .number(id, attribute::MARGIN_BETWEEN_COLUMNS)
                .unwrap_or(ColumnSettings::DEFAULT_GAP)
                .max(0.0),
            equal: self.flag(id, attribute::EQUALS_COLUMNS),
        }
    }

    /// Shift a node and its whole subtree.
    pub fn translate(&mut self, id: NodeId, dx: f64, dy: f64) {
        if dx == 0.0 && dy == 0.0 {
            return;
        }
        for node in self.descendants(id) {
            let data = &mut self[node];
            data.boundary.translate(dx, dy);
            match &mut data.kind {
                NodeKind::Paragraph { lines } => {
                    for line in lines {
                        line.x += dx;
                        line.top += dy;
                    }
                }
                NodeKind::Text { parts, .. } => {
                    for part in parts {
                        part.x += dx;
                        part.top += dy;
                    }
                }
                _ => {}
            }
        }
    }

    /// Grow a rectangular node by `dw` to the right and `dh` downwards.
    /// Children with a percentage width grow proportionally; right floats
    /// move with the right edge.
    pub fn resize(&mut self, id: NodeId, dw: f64, dh: f64) -> Result<(), StructuralError> {
        if dw == 0.0 && dh == 0.0 {
            return Ok(());
        }
        let boundary = &mut self[id].boundary;
        boundary.point_translate(1, dw, 0.0)?;
        boundary.point_translate(2, dw, -dh)?;
        boundary.point_translate(3, 0.0, -dh)?;

        let width = self.width(id) + dw;
        let height = self.height(id) + dh;
        self.set_width(id, width);
        self.set_height(id, height);

        if dw == 0.0 {
            return Ok(());
        }
        let right_edge = self.diagonal_point(id).x - self.paddings(id).right;
        let children = self[id].children.clone();
        for child in children {
            if self.float(child) == Float::Right {
                self.translate(child, dw, 0.0);
            } else if let Some(percent) = self[child].hints.relative_width {
                let target = self[id].boundary.width() * percent / 100.0;
                let by = target - self[child].boundary.width();
                self.resize(child, by, 0.0)?;
            } else {
                let overflow = right_edge - (self.diagonal_point(child).x + self.margins(child).right);
                if overflow < 0.0 {
                    self.resize(child, overflow, 0.0)?;
                }
            }
        }
        Ok(())
    }

    /// Replace the boundary with a closed rectangle matching the node's
    /// first point and width/height attributes.
    pub fn rebuild_rectangle(&mut self, id: NodeId) {
        let first = self.first_point(id);
        let (width, height) = (self.width(id), self.height(id));
        self[id].boundary = Boundary::rectangle(first, width, height);
    }

    /// Rebuild a text node's boundary as the polygon enclosing its line
    /// parts: down the right side of every part, then back along the bottom
    /// of the last one.
    pub fn rebuild_text_boundary(&mut self, id: NodeId) -> Result<(), StructuralError> {
        let NodeKind::Text { parts, .. } = &self[id].kind else {
            return Ok(());
        };
        let Some(first_part) = parts.first() else {
            let first = self.first_point(id);
            self[id].boundary = Boundary::rectangle(first, 0.0, 0.0);
            return Ok(());
        };

        let mut boundary = Boundary::new();
        boundary.set_next((first_part.x, first_part.top))?;
        for part in parts {
            let right = part.x + part.width;
            boundary.set_next((right, part.top))?;
            boundary.set_next((right, part.top - part.height))?;
        }
        if let Some(last) = parts.last() {
            boundary.set_next((last.x, last.top - last.height))?;
        }
        boundary.close()?;

        let (width, height) = (boundary.width(), boundary.height());
        self[id].boundary = boundary;
        self.set_width(id, width);
        self.set_height(id, height);
        Ok(())
    }

    pub fn add_behaviour(&mut self, id: NodeId, behaviour: Behaviour) {
        self[id].behaviours.push(behaviour);
    }
}

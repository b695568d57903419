//! # Attributes
//!
//! Nodes carry a bag of named attributes as produced by the document parser:
//! raw strings such as `"50%"`, `"auto"` or `"12mm"`, plain numbers and
//! flags. Formatters progressively replace raw values with resolved numbers.
//!
//! Some attributes are inherited. Looking one up on a node that does not set
//! it walks up the parent chain (see [`crate::tree::NodeTree::recursive_attribute`]).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const WIDTH: &str = "width";
pub const HEIGHT: &str = "height";
pub const MIN_WIDTH: &str = "min-width";
pub const MIN_HEIGHT: &str = "min-height";
pub const MAX_WIDTH: &str = "max-width";
pub const MAX_HEIGHT: &str = "max-height";
/// Shorthand expanded into the four margin sides: `"10"`, `"10 20"`, `"10 20 30 40"`.
pub const MARGIN: &str = "margin";
pub const MARGIN_TOP: &str = "margin-top";
pub const MARGIN_RIGHT: &str = "margin-right";
pub const MARGIN_BOTTOM: &str = "margin-bottom";
pub const MARGIN_LEFT: &str = "margin-left";
pub const PADDING: &str = "padding";
pub const PADDING_TOP: &str = "padding-top";
pub const PADDING_RIGHT: &str = "padding-right";
pub const PADDING_BOTTOM: &str = "padding-bottom";
pub const PADDING_LEFT: &str = "padding-left";
pub const FLOAT: &str = "float";
pub const FONT_SIZE: &str = "font-size";
pub const FONT_TYPE: &str = "font-type";
pub const LINE_HEIGHT: &str = "line-height";
pub const TEXT_ALIGN: &str = "text-align";
pub const VERTICAL_ALIGN: &str = "vertical-align";
pub const WORD_SPACING: &str = "word-spacing";
pub const COLOR: &str = "color";
pub const BACKGROUND_COLOR: &str = "background-color";
pub const BORDER_COLOR: &str = "border-color";
pub const BORDER_WIDTH: &str = "border-width";
pub const BREAK: &str = "break";
pub const BREAKABLE: &str = "breakable";
pub const LINE_BREAK: &str = "line-break";
pub const ROTATE: &str = "rotate";
pub const COLSPAN: &str = "colspan";
pub const LIST_TYPE: &str = "type";
pub const LIST_POSITION: &str = "list-position";
pub const PAGE_SIZE: &str = "page-size";
pub const ELASTIC: &str = "elastic";
pub const NUMBER_OF_COLUMNS: &str = "number-of-columns";
pub const MARGIN_BETWEEN_COLUMNS: &str = "margin-between-columns";
pub const EQUALS_COLUMNS: &str = "equals-columns";
pub const SRC: &str = "src";
pub const ORIGINAL_WIDTH: &str = "original-width";
pub const ORIGINAL_HEIGHT: &str = "original-height";
pub const KEEP_RATIO: &str = "keep-ratio";

/// Attributes looked up through the ancestor chain when a node leaves them
/// unset.
pub const RECURSIVE: &[&str] = &[
    FONT_SIZE,
    FONT_TYPE,
    LINE_HEIGHT,
    TEXT_ALIGN,
    WORD_SPACING,
    COLOR,
];

pub fn is_recursive(name: &str) -> bool {
    RECURSIVE.contains(&name)
}

/// A single attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl AttributeValue {
    /// Numeric view. Text holding a bare number counts as a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttributeValue::Number(n) => Some(*n),
            AttributeValue::Text(s) => s.trim().parse().ok(),
            AttributeValue::Bool(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> bool {
        match self {
            AttributeValue::Bool(b) => *b,
            AttributeValue::Number(n) => *n != 0.0,
            AttributeValue::Text(s) => matches!(s.trim(), "true" | "1" | "yes" | "on"),
        }
    }

    pub fn is_auto(&self) -> bool {
        matches!(self, AttributeValue::Text(s) if s.trim().eq_ignore_ascii_case("auto"))
    }
}

impl From<f64> for AttributeValue {
    fn from(n: f64) -> Self {
        AttributeValue::Number(n)
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        AttributeValue::Bool(b)
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::Text(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::Text(s)
    }
}

/// Name → value map owned by a single node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeBag {
    values: BTreeMap<String, AttributeValue>,
}

impl AttributeBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.values.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<AttributeValue>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<AttributeValue> {
        self.values.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(AttributeValue::as_number)
    }

    pub fn flag(&self, name: &str) -> bool {
        self.get(name).is_some_and(AttributeValue::as_bool)
    }

    /// Copy every value of `other` into this bag, overwriting on conflict.
    pub fn merge(&mut self, other: &AttributeBag) {
        for (name, value) in &other.values {
            self.values.insert(name.clone(), value.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(String, AttributeValue)> for AttributeBag {
    fn from_iter<I: IntoIterator<Item = (String, AttributeValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

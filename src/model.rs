//! # Document Source
//!
//! The input representation: a tree of tagged elements with raw attribute
//! values, as a markup parser would produce it after resolving stylesheets.
//! Everything is plain serde data so a source can be written by hand as
//! JSON:
//!
//! ```json
//! {
//!   "config": { "pageSize": "Letter" },
//!   "children": [
//!     { "tag": "dynamic-page", "children": [
//!       { "tag": "p", "attributes": { "text-align": "justify" },
//!         "children": [ { "tag": "text", "text": "Hello" } ] }
//!     ] }
//!   ]
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::attribute::AttributeValue;
use crate::config::LayoutConfig;
use crate::error::LayoutError;
use crate::tree::Behaviour;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    /// Pages (or content that is wrapped into a dynamic page).
    pub children: Vec<Element>,

    #[serde(default)]
    pub metadata: Metadata,

    #[serde(default)]
    pub config: LayoutConfig,

    /// Fonts to measure text with, referenced by `font-type`.
    #[serde(default)]
    pub fonts: Vec<FontEntry>,
}

impl Source {
    pub fn from_json(json: &str) -> Result<Self, LayoutError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
}

/// A TrueType/OpenType font given as base64 data or a data URI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FontEntry {
    pub name: String,
    pub src: String,
}

/// One tagged element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub tag: String,

    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeValue>,

    /// Character data of text elements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default)]
    pub children: Vec<Element>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub behaviours: Vec<Behaviour>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self {
            tag: "text".to_string(),
            text: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }
}

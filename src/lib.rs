//! # Quire
//!
//! A paginating layout core. Quire takes a tree of document nodes with
//! already resolved attribute values (containers, paragraphs of text,
//! tables, lists, images, pages), computes the exact geometry of every node
//! across as many pages as the content needs, and then schedules the
//! drawing calls for a rendering backend.
//!
//! ## Architecture
//!
//! ```text
//! Input (JSON / model::Source)
//!       ↓
//!   [factory]  — tags to nodes, anonymous paragraphs and pages
//!       ↓
//!   [tree]     — arena of nodes, boundaries, attributes, break_at
//!       ↓
//!   [format]   — per-kind formatter chains: dimensions, positions,
//!                floats, paragraphs, tables, columns, pages
//!       ↓
//!   [draw]     — drawing tasks in a priority heap, drained into an Engine
//! ```
//!
//! Coordinates follow the PDF convention: Y grows upward and every page has
//! its origin at the bottom-left corner.

pub mod attribute;
pub mod config;
pub mod document;
pub mod draw;
pub mod error;
pub mod factory;
pub mod font;
pub mod format;
pub mod geometry;
pub mod image_loader;
pub mod model;
pub mod style;
pub mod text;
pub mod tree;
pub mod units;

pub use document::Document;
pub use error::{LayoutError, Result};

use draw::Engine;

/// Lay out a document described as JSON.
pub fn layout_json(json: &str) -> Result<Document> {
    let mut document = Document::from_json(json)?;
    document.format()?;
    Ok(document)
}

/// Lay out a document described as JSON and draw it into `engine`.
pub fn render_json(json: &str, engine: &mut dyn Engine) -> Result<Document> {
    let mut document = Document::from_json(json)?;
    document.draw(engine)?;
    Ok(document)
}

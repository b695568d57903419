//! Structured error types for the layout engine.
//!
//! Three categories cover the failure sources of a render: structural
//! misuse of geometry and the node arena, constraint violations found while
//! formatting, and backend failures raised while draining drawing tasks.

use thiserror::Error;

use crate::tree::NodeId;

/// Misuse of a boundary or of the node arena. Always a programming error
/// upstream; never retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StructuralError {
    #[error("boundary is closed; no further points can be appended")]
    BoundaryClosed,
    #[error("boundary needs at least 3 points to close, it has {count}")]
    TooFewPoints { count: usize },
    #[error("point index {index} is out of range for a boundary of {count} points")]
    OutOfRange { index: usize, count: usize },
    #[error("node {0} is not part of this tree")]
    UnknownNode(NodeId),
    #[error("node {0} has no parent")]
    Detached(NodeId),
    #[error("node {child} cannot be placed under {parent}: it would create a cycle")]
    InvalidParent { parent: NodeId, child: NodeId },
}

/// Failure reported by a rendering backend.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DrawError {
    #[error("page {0} has not been created by the engine")]
    MissingPage(usize),
    #[error("backend failure: {0}")]
    Backend(String),
}

/// The unified error type returned by all public entry points.
#[derive(Error, Debug)]
pub enum LayoutError {
    #[error(transparent)]
    Structural(#[from] StructuralError),

    /// An attribute combination that cannot be laid out, e.g. unsplittable
    /// content taller than a whole page.
    #[error("constraint violated at node {node}: {message}")]
    Constraint { node: NodeId, message: String },

    /// A drawing task failed mid-drain. The remaining tasks were not run.
    #[error("drawing task #{order} (priority {priority}, page {page}) failed: {source}")]
    Drawing {
        order: u64,
        priority: i32,
        page: usize,
        #[source]
        source: DrawError,
    },

    #[error("backend could not create page {page}: {source}")]
    PageSetup {
        page: usize,
        #[source]
        source: DrawError,
    },

    #[error("document has already been drawn; call initialize() before drawing again")]
    AlreadyDrawn,

    #[error("no node kind is registered for tag <{0}>")]
    UnknownTag(String),

    #[error("failed to parse document: {source}{}", hint_suffix(.hint))]
    Parse {
        #[source]
        source: serde_json::Error,
        hint: String,
    },

    #[error("image error: {0}")]
    Image(String),

    #[error("font error: {0}")]
    Font(String),
}

fn hint_suffix(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl From<serde_json::Error> for LayoutError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the document schema. Check tag, attributes and children.".to_string()
            }
            serde_json::error::Category::Eof => "Unexpected end of input. Is the JSON truncated?".to_string(),
            serde_json::error::Category::Io => String::new(),
        };
        LayoutError::Parse { source: e, hint }
    }
}

pub type Result<T, E = LayoutError> = std::result::Result<T, E>;

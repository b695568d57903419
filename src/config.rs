//! # Configuration
//!
//! Document-wide defaults consulted when a node leaves an attribute unset.
//! A config can be embedded in the JSON source or built in code.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::LayoutError;
use crate::style::{Edges, ListType};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    /// Size of pages that do not set `page-size`.
    pub page_size: PageSize,
    /// Page margins in points (1/72 inch).
    pub margin: Edges,
    /// Font size of nodes without an inherited `font-size`.
    pub font_size: f64,
    /// Line height as a multiple of the font size.
    pub line_height_factor: f64,
    /// Pixels per inch for `px` lengths.
    pub dpi: f64,
    /// Advance ratio of the fallback font metrics.
    pub fallback_char_ratio: f64,
    /// Enumeration for lists created without a `type`.
    pub list_type: ListType,
    /// Named colors resolved to `#rrggbb` by attribute conversion.
    pub colors: HashMap<String, String>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            page_size: PageSize::A4,
            margin: Edges::default(),
            font_size: 12.0,
            line_height_factor: 1.2,
            dpi: 96.0,
            fallback_char_ratio: 0.5,
            list_type: ListType::Disc,
            colors: default_palette(),
        }
    }
}

impl LayoutConfig {
    pub fn from_json(json: &str) -> Result<Self, LayoutError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Resolve a color name through the palette. Hex values pass through.
    pub fn color(&self, raw: &str) -> String {
        let key = raw.trim().to_ascii_lowercase();
        self.colors.get(&key).cloned().unwrap_or_else(|| raw.trim().to_string())
    }
}

fn default_palette() -> HashMap<String, String> {
    [
        ("black", "#000000"),
        ("white", "#ffffff"),
        ("red", "#ff0000"),
        ("green", "#008000"),
        ("blue", "#0000ff"),
        ("yellow", "#ffff00"),
        ("gray", "#808080"),
        ("grey", "#808080"),
        ("silver", "#c0c0c0"),
        ("navy", "#000080"),
        ("maroon", "#800000"),
        ("orange", "#ffa500"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Standard page sizes.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum PageSize {
    #[default]
    A4,
    A3,
    A5,
    Letter,
    Legal,
    Tabloid,
    Custom {
        width: f64,
        height: f64,
    },
}

impl PageSize {
    /// Returns (width, height) in points.
    pub fn dimensions(&self) -> (f64, f64) {
        match self {
            PageSize::A4 => (595.28, 841.89),
            PageSize::A3 => (841.89, 1190.55),
            PageSize::A5 => (419.53, 595.28),
            PageSize::Letter => (612.0, 792.0),
            PageSize::Legal => (612.0, 1008.0),
            PageSize::Tabloid => (792.0, 1224.0),
            PageSize::Custom { width, height } => (*width, *height),
        }
    }

    /// Parse a `page-size` attribute: `"595:842"`, `"a4"`, `"letter-landscape"`.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim().to_ascii_lowercase();
        if let Some((w, h)) = raw.split_once(':') {
            return Some(PageSize::Custom {
                width: w.trim().parse().ok()?,
                height: h.trim().parse().ok()?,
            });
        }

        let (name, landscape) = match raw.strip_suffix("-landscape") {
            Some(name) => (name, true),
            None => (raw.as_str(), false),
        };
        let size = match name {
            "a4" => PageSize::A4,
            "a3" => PageSize::A3,
            "a5" => PageSize::A5,
            "letter" => PageSize::Letter,
            "legal" => PageSize::Legal,
            "tabloid" => PageSize::Tabloid,
            _ => return None,
        };
        if landscape {
            let (width, height) = size.dimensions();
            Some(PageSize::Custom {
                width: height,
                height: width,
            })
        } else {
            Some(size)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_size_parsing() {
        assert_eq!(
            PageSize::parse("500:400"),
            Some(PageSize::Custom { width: 500.0, height: 400.0 })
        );
        assert_eq!(PageSize::parse("A4"), Some(PageSize::A4));
        assert_eq!(
            PageSize::parse("letter-landscape").map(|s| s.dimensions()),
            Some((792.0, 612.0))
        );
        assert_eq!(PageSize::parse("huge"), None);
        assert_eq!(PageSize::parse("10:x"), None);
    }

    #[test]
    fn test_config_from_json_keeps_defaults() {
        let config = LayoutConfig::from_json(r#"{"fontSize": 10, "pageSize": "Letter"}"#).unwrap();
        assert_eq!(config.font_size, 10.0);
        assert_eq!(config.page_size, PageSize::Letter);
        assert_eq!(config.line_height_factor, 1.2);
        assert_eq!(config.color("Red"), "#ff0000");
        assert_eq!(config.color("#123456"), "#123456");
    }

    #[test]
    fn test_config_rejects_bad_json() {
        assert!(matches!(
            LayoutConfig::from_json("{\"fontSize\": }"),
            Err(LayoutError::Parse { .. })
        ));
    }
}

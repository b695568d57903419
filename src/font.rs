//! # Font Metrics
//!
//! Text measurement is a service: the layout core only ever asks "how wide
//! is this run at this size". [`FontRegistry`] maps `font-type` attribute
//! values to metric providers and falls back to a fixed-ratio provider for
//! names it does not know.

use std::collections::HashMap;
use std::fmt;

use crate::error::LayoutError;

/// Width oracle for a single font face.
pub trait FontMetrics {
    fn width_of_text(&self, text: &str, font_size: f64) -> f64;
}

/// Every character advances by `ratio × font_size`. Deterministic, which
/// makes it the default for tests and for documents without real fonts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedRatioMetrics {
    pub ratio: f64,
}

impl FixedRatioMetrics {
    pub fn new(ratio: f64) -> Self {
        Self { ratio }
    }
}

impl Default for FixedRatioMetrics {
    fn default() -> Self {
        Self { ratio: 0.5 }
    }
}

impl FontMetrics for FixedRatioMetrics {
    fn width_of_text(&self, text: &str, font_size: f64) -> f64 {
        text.chars().filter(|c| !c.is_control()).count() as f64 * self.ratio * font_size
    }
}

/// Advance widths read from a TrueType/OpenType face via ttf-parser.
#[derive(Debug, Clone)]
pub struct TrueTypeMetrics {
    pub units_per_em: u16,
    pub advance_widths: HashMap<char, u16>,
    pub default_advance: u16,
}

impl TrueTypeMetrics {
    pub fn from_font_data(data: &[u8]) -> Result<Self, LayoutError> {
        let face = ttf_parser::Face::parse(data, 0)
            .map_err(|e| LayoutError::Font(format!("Failed to parse font: {}", e)))?;
        let units_per_em = face.units_per_em();

        let mut advance_widths = HashMap::new();
        let mut default_advance = 0u16;

        for code in 32u32..=0xFFFF {
            let Some(ch) = char::from_u32(code) else {
                continue;
            };
            if let Some(glyph_id) = face.glyph_index(ch) {
                let advance = face.glyph_hor_advance(glyph_id).unwrap_or(0);
                advance_widths.insert(ch, advance);
                if ch == ' ' {
                    default_advance = advance;
                }
            }
        }

        if default_advance == 0 {
            default_advance = units_per_em / 2;
        }

        log::debug!(
            "loaded font metrics: {} glyph advances, {} units per em",
            advance_widths.len(),
            units_per_em
        );

        Ok(Self {
            units_per_em,
            advance_widths,
            default_advance,
        })
    }

    fn char_width(&self, ch: char, font_size: f64) -> f64 {
        let w = self
            .advance_widths
            .get(&ch)
            .copied()
            .unwrap_or(self.default_advance);
        (w as f64 / self.units_per_em.max(1) as f64) * font_size
    }
}

impl FontMetrics for TrueTypeMetrics {
    fn width_of_text(&self, text: &str, font_size: f64) -> f64 {
        text.chars()
            .filter(|c| !c.is_control())
            .map(|c| self.char_width(c, font_size))
            .sum()
    }
}

/// Maps font names to metric providers.
pub struct FontRegistry {
    fonts: HashMap<String, Box<dyn FontMetrics>>,
    fallback: Box<dyn FontMetrics>,
}

impl fmt::Debug for FontRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.fonts.keys().collect();
        names.sort();
        f.debug_struct("FontRegistry").field("fonts", &names).finish()
    }
}

impl Default for FontRegistry {
    fn default() -> Self {
        Self::new(FixedRatioMetrics::default())
    }
}

impl FontRegistry {
    pub fn new(fallback: impl FontMetrics + 'static) -> Self {
        Self {
            fonts: HashMap::new(),
            fallback: Box::new(fallback),
        }
    }

    pub fn register(&mut self, name: impl Into<String>, metrics: impl FontMetrics + 'static) {
        self.fonts.insert(name.into().to_ascii_lowercase(), Box::new(metrics));
    }

    /// Parse and register a TrueType/OpenType font.
    pub fn register_font_data(&mut self, name: impl Into<String>, data: &[u8]) -> Result<(), LayoutError> {
        let metrics = TrueTypeMetrics::from_font_data(data)?;
        self.register(name, metrics);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fonts.contains_key(&name.to_ascii_lowercase())
    }

    /// Look up a font, falling back to the default provider.
    pub fn resolve(&self, name: Option<&str>) -> &dyn FontMetrics {
        name.and_then(|n| self.fonts.get(&n.to_ascii_lowercase()))
            .map(|m| m.as_ref())
            .unwrap_or(self.fallback.as_ref())
    }
}

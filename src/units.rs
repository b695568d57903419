//! # Units
//!
//! Raw length attributes arrive as strings with an optional unit suffix.
//! Layout works in PDF units (1/72 inch, the same as points). The
//! [`UnitConverter`] trait is the seam for the conversion service; the
//! bundled [`PdfUnitConverter`] covers the usual print units.

use serde::{Deserialize, Serialize};

pub const UNITS_PER_INCH: f64 = 72.0;
pub const MM_PER_INCH: f64 = 25.3995;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    /// PDF unit; identical to a point.
    Pu,
    Pt,
    Px,
    Cm,
    Mm,
    In,
    Pc,
    Em,
    Ex,
}

impl Unit {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "" | "pu" => Some(Unit::Pu),
            "pt" => Some(Unit::Pt),
            "px" => Some(Unit::Px),
            "cm" => Some(Unit::Cm),
            "mm" => Some(Unit::Mm),
            "in" => Some(Unit::In),
            "pc" => Some(Unit::Pc),
            "em" => Some(Unit::Em),
            "ex" => Some(Unit::Ex),
            _ => None,
        }
    }
}

/// A parsed length attribute.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Length {
    Auto,
    Percent(f64),
    Value(f64, Unit),
}

impl Length {
    /// Parse `"auto"`, `"40%"`, `"12"`, `"12.5mm"` and friends.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("auto") {
            return Some(Length::Auto);
        }
        if let Some(percent) = raw.strip_suffix('%') {
            return percent.trim().parse().ok().map(Length::Percent);
        }
        let split = raw
            .find(|c: char| c.is_ascii_alphabetic())
            .unwrap_or(raw.len());
        let (number, unit) = raw.split_at(split);
        let value: f64 = number.trim().parse().ok()?;
        Some(Length::Value(value, Unit::parse(unit.trim())?))
    }

    /// Absolute value in PDF units. `Auto` has none.
    pub fn resolve(&self, converter: &dyn UnitConverter, base: f64, font_size: f64) -> Option<f64> {
        match *self {
            Length::Auto => None,
            Length::Percent(p) => Some(converter.convert_percentage(p, base)),
            Length::Value(v, Unit::Em) => Some(v * font_size),
            Length::Value(v, Unit::Ex) => Some(v * font_size / 2.0),
            Length::Value(v, unit) => Some(converter.convert_unit(v, unit)),
        }
    }
}

/// Conversion service consumed by the formatters.
pub trait UnitConverter {
    fn convert_unit(&self, value: f64, unit: Unit) -> f64;

    fn convert_percentage(&self, percent: f64, base: f64) -> f64 {
        base * percent / 100.0
    }
}

/// Converter for a PDF target.
#[derive(Debug, Clone, Copy)]
pub struct PdfUnitConverter {
    /// Pixels per inch used for `px`.
    pub dpi: f64,
    /// Size of an `em` when no font context is known.
    pub em_size: f64,
}

impl Default for PdfUnitConverter {
    fn default() -> Self {
        Self {
            dpi: 96.0,
            em_size: 12.0,
        }
    }
}

impl UnitConverter for PdfUnitConverter {
    fn convert_unit(&self, value: f64, unit: Unit) -> f64 {
        match unit {
            Unit::Pu | Unit::Pt => value,
            Unit::Px => value * UNITS_PER_INCH / self.dpi,
            Unit::In => value * UNITS_PER_INCH,
            Unit::Cm => value * UNITS_PER_INCH * 10.0 / MM_PER_INCH,
            Unit::Mm => value * UNITS_PER_INCH / MM_PER_INCH,
            Unit::Pc => value * 12.0,
            Unit::Em => value * self.em_size,
            Unit::Ex => value * self.em_size / 2.0,
        }
    }
}

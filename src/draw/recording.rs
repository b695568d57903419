//! An in-memory backend that records every command it receives. Used by
//! tests and for inspecting what a document would draw.

use crate::error::DrawError;
use crate::geometry::Point;
use crate::style::Color;

use super::{DrawCommand, Engine, GraphicsContext};

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedPage {
    pub width: f64,
    pub height: f64,
    pub commands: Vec<DrawCommand>,
    broken: bool,
}

impl RecordedPage {
    fn record(&mut self, command: DrawCommand) -> Result<(), DrawError> {
        if self.broken {
            return Err(DrawError::Backend(format!("page refused {:?}", command)));
        }
        self.commands.push(command);
        Ok(())
    }

    /// Text of every text command, in drawing order.
    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl GraphicsContext for RecordedPage {
    fn save_state(&mut self) -> Result<(), DrawError> {
        self.record(DrawCommand::SaveState)
    }

    fn restore_state(&mut self) -> Result<(), DrawError> {
        self.record(DrawCommand::RestoreState)
    }

    fn rotate(&mut self, origin: Point, angle: f64) -> Result<(), DrawError> {
        self.record(DrawCommand::Rotate { origin, angle })
    }

    fn set_fill_color(&mut self, color: Color) -> Result<(), DrawError> {
        self.record(DrawCommand::SetFillColor(color))
    }

    fn set_line_color(&mut self, color: Color) -> Result<(), DrawError> {
        self.record(DrawCommand::SetLineColor(color))
    }

    fn set_line_width(&mut self, width: f64) -> Result<(), DrawError> {
        self.record(DrawCommand::SetLineWidth(width))
    }

    fn draw_line(&mut self, from: Point, to: Point) -> Result<(), DrawError> {
        self.record(DrawCommand::Line { from, to })
    }

    fn draw_polygon(&mut self, points: &[Point], filled: bool) -> Result<(), DrawError> {
        self.record(DrawCommand::Polygon {
            points: points.to_vec(),
            filled,
        })
    }

    fn draw_text(
        &mut self,
        text: &str,
        origin: Point,
        font: Option<&str>,
        font_size: f64,
        word_spacing: f64,
    ) -> Result<(), DrawError> {
        self.record(DrawCommand::Text {
            text: text.to_string(),
            origin,
            font: font.map(str::to_string),
            font_size,
            word_spacing,
        })
    }

    fn draw_image(&mut self, src: &str, first: Point, diagonal: Point) -> Result<(), DrawError> {
        self.record(DrawCommand::Image {
            src: src.to_string(),
            first,
            diagonal,
        })
    }

    fn add_bookmark(&mut self, title: &str, top: f64) -> Result<(), DrawError> {
        self.record(DrawCommand::Bookmark {
            title: title.to_string(),
            top,
        })
    }

    fn uri_action(&mut self, first: Point, diagonal: Point, uri: &str) -> Result<(), DrawError> {
        self.record(DrawCommand::UriLink {
            uri: uri.to_string(),
            first,
            diagonal,
        })
    }

    fn go_to_action(&mut self, first: Point, diagonal: Point, page: usize, top: f64) -> Result<(), DrawError> {
        self.record(DrawCommand::InternalLink {
            first,
            diagonal,
            page,
            top,
        })
    }

    fn attach_note(&mut self, first: Point, diagonal: Point, text: &str) -> Result<(), DrawError> {
        self.record(DrawCommand::StickyNote {
            text: text.to_string(),
            first,
            diagonal,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordingEngine {
    pages: Vec<RecordedPage>,
    failing_page: Option<usize>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// An engine whose page `page` rejects every command.
    pub fn failing_on_page(page: usize) -> Self {
        Self {
            pages: Vec::new(),
            failing_page: Some(page),
        }
    }

    pub fn pages(&self) -> &[RecordedPage] {
        &self.pages
    }

    /// Every recorded command, page after page.
    pub fn commands(&self) -> impl Iterator<Item = (usize, &DrawCommand)> {
        self.pages
            .iter()
            .enumerate()
            .flat_map(|(i, page)| page.commands.iter().map(move |c| (i, c)))
    }
}

impl Engine for RecordingEngine {
    fn create_page(&mut self, width: f64, height: f64) -> Result<usize, DrawError> {
        let index = self.pages.len();
        self.pages.push(RecordedPage {
            width,
            height,
            commands: Vec::new(),
            broken: self.failing_page == Some(index),
        });
        Ok(index)
    }

    fn graphics_context(&mut self, page: usize) -> Result<&mut dyn GraphicsContext, DrawError> {
        self.pages
            .get_mut(page)
            .map(|p| p as &mut dyn GraphicsContext)
            .ok_or(DrawError::MissingPage(page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_per_page() {
        let mut engine = RecordingEngine::new();
        assert_eq!(engine.create_page(10.0, 20.0).unwrap(), 0);
        assert_eq!(engine.create_page(10.0, 20.0).unwrap(), 1);

        let gc = engine.graphics_context(1).unwrap();
        gc.draw_text("hi", Point::new(1.0, 2.0), None, 12.0, 0.0).unwrap();

        assert!(engine.pages()[0].commands.is_empty());
        assert_eq!(engine.pages()[1].texts(), vec!["hi"]);
        assert_eq!(engine.commands().count(), 1);
    }

    #[test]
    fn test_missing_and_failing_pages() {
        let mut engine = RecordingEngine::failing_on_page(0);
        assert!(matches!(engine.graphics_context(0), Err(DrawError::MissingPage(0))));

        engine.create_page(10.0, 10.0).unwrap();
        let gc = engine.graphics_context(0).unwrap();
        assert!(matches!(gc.save_state(), Err(DrawError::Backend(_))));
    }
}

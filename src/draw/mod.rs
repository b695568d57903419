//! # Drawing
//!
//! Formatting only computes geometry. Drawing turns every formatted node
//! into [`DrawingTask`]s, collects them in a [`DrawingTaskHeap`] and drains
//! the heap into a backend [`Engine`].
//!
//! The heap decides the paint order. A task's priority combines its
//! [`Layer`] (backgrounds before content before annotations) with the
//! node's depth priority, so within a layer parents paint before their
//! children. Tasks of equal priority run in insertion order.

pub mod emit;
pub mod recording;

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::error::{DrawError, LayoutError, Result};
use crate::geometry::Point;
use crate::style::Color;

/// A single call into a graphics context.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    SaveState,
    RestoreState,
    Rotate { origin: Point, angle: f64 },
    SetFillColor(Color),
    SetLineColor(Color),
    SetLineWidth(f64),
    Line { from: Point, to: Point },
    Polygon { points: Vec<Point>, filled: bool },
    /// `origin` is the start of the baseline.
    Text {
        text: String,
        origin: Point,
        font: Option<String>,
        font_size: f64,
        word_spacing: f64,
    },
    Image { src: String, first: Point, diagonal: Point },
    Bookmark { title: String, top: f64 },
    UriLink { uri: String, first: Point, diagonal: Point },
    /// Link to `top` on page `page` (zero-based).
    InternalLink { first: Point, diagonal: Point, page: usize, top: f64 },
    StickyNote { text: String, first: Point, diagonal: Point },
}

impl DrawCommand {
    pub fn apply(&self, gc: &mut dyn GraphicsContext) -> Result<(), DrawError> {
        match self {
            DrawCommand::SaveState => gc.save_state(),
            DrawCommand::RestoreState => gc.restore_state(),
            DrawCommand::Rotate { origin, angle } => gc.rotate(*origin, *angle),
            DrawCommand::SetFillColor(color) => gc.set_fill_color(*color),
            DrawCommand::SetLineColor(color) => gc.set_line_color(*color),
            DrawCommand::SetLineWidth(width) => gc.set_line_width(*width),
            DrawCommand::Line { from, to } => gc.draw_line(*from, *to),
            DrawCommand::Polygon { points, filled } => gc.draw_polygon(points, *filled),
            DrawCommand::Text {
                text,
                origin,
                font,
                font_size,
                word_spacing,
            } => gc.draw_text(text, *origin, font.as_deref(), *font_size, *word_spacing),
            DrawCommand::Image { src, first, diagonal } => gc.draw_image(src, *first, *diagonal),
            DrawCommand::Bookmark { title, top } => gc.add_bookmark(title, *top),
            DrawCommand::UriLink { uri, first, diagonal } => gc.uri_action(*first, *diagonal, uri),
            DrawCommand::InternalLink {
                first,
                diagonal,
                page,
                top,
            } => gc.go_to_action(*first, *diagonal, *page, *top),
            DrawCommand::StickyNote { text, first, diagonal } => gc.attach_note(*first, *diagonal, text),
        }
    }
}

/// Drawing surface of one page. Coordinates are in points with Y up.
pub trait GraphicsContext {
    fn save_state(&mut self) -> Result<(), DrawError>;
    fn restore_state(&mut self) -> Result<(), DrawError>;
    /// Rotate everything drawn until the next restore by `angle` radians
    /// around `origin`.
    fn rotate(&mut self, origin: Point, angle: f64) -> Result<(), DrawError>;
    fn set_fill_color(&mut self, color: Color) -> Result<(), DrawError>;
    fn set_line_color(&mut self, color: Color) -> Result<(), DrawError>;
    fn set_line_width(&mut self, width: f64) -> Result<(), DrawError>;
    fn draw_line(&mut self, from: Point, to: Point) -> Result<(), DrawError>;
    fn draw_polygon(&mut self, points: &[Point], filled: bool) -> Result<(), DrawError>;
    fn draw_text(
        &mut self,
        text: &str,
        origin: Point,
        font: Option<&str>,
        font_size: f64,
        word_spacing: f64,
    ) -> Result<(), DrawError>;
    fn draw_image(&mut self, src: &str, first: Point, diagonal: Point) -> Result<(), DrawError>;
    fn add_bookmark(&mut self, title: &str, top: f64) -> Result<(), DrawError>;
    fn uri_action(&mut self, first: Point, diagonal: Point, uri: &str) -> Result<(), DrawError>;
    fn go_to_action(&mut self, first: Point, diagonal: Point, page: usize, top: f64) -> Result<(), DrawError>;
    fn attach_note(&mut self, first: Point, diagonal: Point, text: &str) -> Result<(), DrawError>;
}

/// A rendering backend: a sequence of pages, each with a graphics context.
pub trait Engine {
    /// Append a page and return its index.
    fn create_page(&mut self, width: f64, height: f64) -> Result<usize, DrawError>;
    fn graphics_context(&mut self, page: usize) -> Result<&mut dyn GraphicsContext, DrawError>;
}

const LAYER_SPACING: i32 = 1_000_000;

/// Paint layers, earliest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Layer {
    Background1,
    Background2,
    Background3,
    Foreground1,
    Foreground2,
    Foreground3,
}

impl Layer {
    /// Task priority for a node of depth priority `node_priority`.
    pub fn priority(self, node_priority: i32) -> i32 {
        let rank = match self {
            Layer::Background1 => 6,
            Layer::Background2 => 5,
            Layer::Background3 => 4,
            Layer::Foreground1 => 3,
            Layer::Foreground2 => 2,
            Layer::Foreground3 => 1,
        };
        rank * LAYER_SPACING + node_priority
    }
}

/// Commands to run on one page at one priority.
#[derive(Debug, Clone)]
pub struct DrawingTask {
    pub priority: i32,
    pub page: usize,
    pub commands: Vec<DrawCommand>,
    order: u64,
}

impl DrawingTask {
    pub fn new(priority: i32, page: usize, commands: Vec<DrawCommand>) -> Self {
        Self {
            priority,
            page,
            commands,
            order: 0,
        }
    }

    /// Sequence number stamped by [`DrawingTaskHeap::insert`].
    pub fn order(&self) -> u64 {
        self.order
    }

    /// Wrap the commands so they are drawn rotated around `origin`.
    pub fn rotated(mut self, origin: Point, angle: f64) -> Self {
        let mut commands = Vec::with_capacity(self.commands.len() + 3);
        commands.push(DrawCommand::SaveState);
        commands.push(DrawCommand::Rotate { origin, angle });
        commands.append(&mut self.commands);
        commands.push(DrawCommand::RestoreState);
        self.commands = commands;
        self
    }

    pub fn invoke(&self, engine: &mut dyn Engine) -> Result<(), DrawError> {
        let gc = engine.graphics_context(self.page)?;
        for command in &self.commands {
            command.apply(gc)?;
        }
        Ok(())
    }
}

impl PartialEq for DrawingTask {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for DrawingTask {}

impl Ord for DrawingTask {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.order.cmp(&self.order))
    }
}

impl PartialOrd for DrawingTask {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Max-heap of drawing tasks; equal priorities pop in insertion order.
#[derive(Debug, Default)]
pub struct DrawingTaskHeap {
    heap: BinaryHeap<DrawingTask>,
    next_order: u64,
}

impl DrawingTaskHeap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp the task with the next sequence number and queue it.
    pub fn insert(&mut self, mut task: DrawingTask) -> u64 {
        let order = self.next_order;
        self.next_order += 1;
        task.order = order;
        self.heap.push(task);
        order
    }

    pub fn pop(&mut self) -> Option<DrawingTask> {
        self.heap.pop()
    }

    pub fn peek(&self) -> Option<&DrawingTask> {
        self.heap.peek()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Run every task against `engine` in heap order. The first failure
    /// stops the drain. Returns the number of tasks run.
    pub fn drain(mut self, engine: &mut dyn Engine) -> Result<usize> {
        let mut count = 0;
        while let Some(task) = self.heap.pop() {
            task.invoke(engine).map_err(|source| LayoutError::Drawing {
                order: task.order,
                priority: task.priority,
                page: task.page,
                source,
            })?;
            count += 1;
        }
        log::debug!("Drained {} drawing tasks", count);
        Ok(count)
    }
}

impl Extend<DrawingTask> for DrawingTaskHeap {
    fn extend<I: IntoIterator<Item = DrawingTask>>(&mut self, iter: I) {
        for task in iter {
            self.insert(task);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::recording::RecordingEngine;
    use super::*;

    fn task(priority: i32) -> DrawingTask {
        DrawingTask::new(priority, 0, vec![DrawCommand::SetLineWidth(priority as f64)])
    }

    #[test]
    fn test_equal_priorities_pop_in_insertion_order() {
        let mut heap = DrawingTaskHeap::new();
        let orders: Vec<u64> = [2, 1, 2].into_iter().map(|p| heap.insert(task(p))).collect();
        assert_eq!(orders, vec![0, 1, 2]);

        let popped: Vec<u64> = std::iter::from_fn(|| heap.pop()).map(|t| t.order()).collect();
        assert_eq!(popped, vec![0, 2, 1]);
    }

    #[test]
    fn test_layers_dominate_depth() {
        assert!(Layer::Background1.priority(-50) > Layer::Background2.priority(0));
        assert!(Layer::Foreground1.priority(-1) > Layer::Foreground1.priority(-2));
        assert!(Layer::Background3.priority(-900) > Layer::Foreground1.priority(0));
    }

    #[test]
    fn test_rotated_task_is_wrapped() {
        let rotated = task(0).rotated(Point::new(5.0, 5.0), 1.0);
        assert_eq!(rotated.commands.len(), 4);
        assert_eq!(rotated.commands[0], DrawCommand::SaveState);
        assert_eq!(rotated.commands[3], DrawCommand::RestoreState);
    }

    #[test]
    fn test_drain_runs_tasks_in_order() {
        let mut engine = RecordingEngine::new();
        engine.create_page(100.0, 100.0).unwrap();
        let mut heap = DrawingTaskHeap::new();
        heap.extend([task(1), task(3), task(2)]);

        assert_eq!(heap.drain(&mut engine).unwrap(), 3);
        assert_eq!(
            engine.pages()[0].commands,
            vec![
                DrawCommand::SetLineWidth(3.0),
                DrawCommand::SetLineWidth(2.0),
                DrawCommand::SetLineWidth(1.0),
            ]
        );
    }

    #[test]
    fn test_failing_task_aborts_the_drain() {
        let mut engine = RecordingEngine::new();
        engine.create_page(100.0, 100.0).unwrap();
        let mut heap = DrawingTaskHeap::new();
        heap.insert(task(5));
        heap.insert(DrawingTask::new(4, 3, vec![DrawCommand::SaveState]));
        heap.insert(task(1));

        let err = heap.drain(&mut engine).unwrap_err();
        assert!(matches!(
            err,
            LayoutError::Drawing {
                order: 1,
                priority: 4,
                page: 3,
                source: DrawError::MissingPage(3),
            }
        ));
        assert_eq!(engine.pages()[0].commands.len(), 1);
    }
}

//! # Geometry
//!
//! Points and boundaries. Coordinates follow the PDF convention: the origin
//! is the bottom-left corner of a page and Y grows upward, so "down the
//! page" means decreasing Y.
//!
//! A [`Boundary`] is the authoritative shape of a node. It is an ordered
//! polygon that is built point by point and then closed. While points are
//! appended the boundary tracks which inserted point carries the largest X
//! and which carries the smallest Y. Together those two coordinates form the
//! *diagonal point*, the bounding-box corner opposite the first point.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::StructuralError;

/// An immutable 2D point.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn translate(self, dx: f64, dy: f64) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }

    pub fn compare_x(&self, other: &Point) -> Ordering {
        self.x.partial_cmp(&other.x).unwrap_or(Ordering::Equal)
    }

    pub fn compare_y(&self, other: &Point) -> Ordering {
        self.y.partial_cmp(&other.y).unwrap_or(Ordering::Equal)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Point::new(x, y)
    }
}

impl From<[f64; 2]> for Point {
    fn from([x, y]: [f64; 2]) -> Self {
        Point::new(x, y)
    }
}

impl From<Point> for [f64; 2] {
    fn from(p: Point) -> Self {
        [p.x, p.y]
    }
}

/// Ordered, closeable polygon describing a node's shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "BoundaryRepr", into = "BoundaryRepr")]
pub struct Boundary {
    points: Vec<Point>,
    closed: bool,
    diagonal_x: Option<usize>,
    diagonal_y: Option<usize>,
}

impl Boundary {
    pub fn new() -> Self {
        Self::default()
    }

    /// A closed axis-aligned rectangle hanging down from `first`.
    pub fn rectangle(first: Point, width: f64, height: f64) -> Self {
        let mut boundary = Self::new();
        boundary.push(first);
        boundary.push(first.translate(width, 0.0));
        boundary.push(first.translate(width, -height));
        boundary.push(first.translate(0.0, -height));
        // Degenerate rectangles would otherwise track the last corner.
        boundary.diagonal_x = Some(2);
        boundary.diagonal_y = Some(2);
        boundary.seal();
        boundary
    }

    /// Append a point. Fails once the boundary is closed.
    pub fn set_next(&mut self, point: impl Into<Point>) -> Result<&mut Self, StructuralError> {
        if self.closed {
            return Err(StructuralError::BoundaryClosed);
        }
        self.push(point.into());
        Ok(self)
    }

    /// Close the ring by appending a copy of the first point.
    pub fn close(&mut self) -> Result<(), StructuralError> {
        if self.closed {
            return Err(StructuralError::BoundaryClosed);
        }
        if self.points.len() < 3 {
            return Err(StructuralError::TooFewPoints {
                count: self.points.len(),
            });
        }
        self.seal();
        Ok(())
    }

    fn push(&mut self, point: Point) {
        // Compared against the diagonal as it was before this point.
        let diagonal = self.diagonal_point();
        self.points.push(point);
        let index = self.points.len() - 1;

        match diagonal {
            None => {
                self.diagonal_x = Some(index);
                self.diagonal_y = Some(index);
            }
            Some(diagonal) => {
                if diagonal.y >= point.y {
                    self.diagonal_y = Some(index);
                }
                if diagonal.x <= point.x {
                    self.diagonal_x = Some(index);
                }
            }
        }
    }

    fn seal(&mut self) {
        if let Some(first) = self.points.first().copied() {
            self.points.push(first);
        }
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn get(&self, index: usize) -> Result<Point, StructuralError> {
        self.points.get(index).copied().ok_or(StructuralError::OutOfRange {
            index,
            count: self.points.len(),
        })
    }

    pub fn first_point(&self) -> Option<Point> {
        self.points.first().copied()
    }

    /// Bounding-box corner opposite the first point: the largest X and the
    /// smallest Y among inserted points.
    pub fn diagonal_point(&self) -> Option<Point> {
        let x = self.points.get(self.diagonal_x?)?.x;
        let y = self.points.get(self.diagonal_y?)?.y;
        Some(Point::new(x, y))
    }

    pub fn middle_point(&self) -> Option<Point> {
        Some(point_between(self.first_point()?, self.diagonal_point()?))
    }

    /// Horizontal extent between the first and diagonal points.
    pub fn width(&self) -> f64 {
        match (self.first_point(), self.diagonal_point()) {
            (Some(first), Some(diagonal)) => diagonal.x - first.x,
            _ => 0.0,
        }
    }

    /// Vertical extent between the first and diagonal points.
    pub fn height(&self) -> f64 {
        match (self.first_point(), self.diagonal_point()) {
            (Some(first), Some(diagonal)) => first.y - diagonal.y,
            _ => 0.0,
        }
    }

    pub fn translate(&mut self, dx: f64, dy: f64) {
        if dx == 0.0 && dy == 0.0 {
            return;
        }
        for point in &mut self.points {
            *point = point.translate(dx, dy);
        }
    }

    /// Move one point. Diagonal indices are left untouched.
    pub fn point_translate(&mut self, index: usize, dx: f64, dy: f64) -> Result<(), StructuralError> {
        let count = self.points.len();
        let point = self
            .points
            .get_mut(index)
            .ok_or(StructuralError::OutOfRange { index, count })?;
        if dx != 0.0 || dy != 0.0 {
            *point = point.translate(dx, dy);
        }
        Ok(())
    }

    pub fn reset(&mut self) {
        self.points.clear();
        self.closed = false;
        self.diagonal_x = None;
        self.diagonal_y = None;
    }

    /// Strict containment in the open rectangle spanned by the first and
    /// diagonal points. Points on an edge are outside.
    pub fn contains(&self, point: Point) -> bool {
        let (Some(first), Some(diagonal)) = (self.first_point(), self.diagonal_point()) else {
            return false;
        };
        first.x < point.x && first.y > point.y && diagonal.x > point.x && diagonal.y < point.y
    }

    /// Box-overlap heuristic over corners and centre points.
    pub fn intersects(&self, other: &Boundary) -> bool {
        if other.points.iter().any(|p| self.contains(*p)) {
            return true;
        }
        if self.points.iter().any(|p| other.contains(*p)) {
            return true;
        }

        let (Some(first), Some(diagonal)) = (self.first_point(), self.diagonal_point()) else {
            return false;
        };
        let (Some(other_first), Some(other_diagonal)) = (other.first_point(), other.diagonal_point()) else {
            return false;
        };

        if other.contains(point_between(first, diagonal)) {
            return true;
        }
        if self.contains(point_between(other_first, other_diagonal)) {
            return true;
        }

        let cross = point_between(first, other_diagonal);
        if self.contains(cross) && other.contains(cross) {
            return true;
        }
        let cross = point_between(other_first, diagonal);
        self.contains(cross) && other.contains(cross)
    }
}

/// Midpoint between a top-left point and a bottom-right point.
pub fn point_between(first: Point, second: Point) -> Point {
    Point::new(
        first.x + (second.x - first.x) / 2.0,
        second.y + (first.y - second.y) / 2.0,
    )
}

#[derive(Serialize, Deserialize)]
struct BoundaryRepr {
    closed: bool,
    points: Vec<Point>,
}

impl From<Boundary> for BoundaryRepr {
    fn from(boundary: Boundary) -> Self {
        Self {
            closed: boundary.closed,
            points: boundary.points,
        }
    }
}

impl From<BoundaryRepr> for Boundary {
    fn from(repr: BoundaryRepr) -> Self {
        // Replaying the inserts rebuilds the diagonal indices; the closing
        // copy is already part of the stored points.
        let mut boundary = Boundary::new();
        for point in repr.points {
            boundary.push(point);
        }
        boundary.closed = repr.closed;
        boundary
    }
}

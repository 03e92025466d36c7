//! Freehand strokes recorded by the drawing surface.

use crate::brush::BrushColor;
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// A freehand stroke: the pointer path plus the brush it was drawn with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    /// Points in the stroke path, in canvas pixel coordinates.
    pub points: Vec<Point>,
    /// Brush color at the time the stroke started.
    pub color: BrushColor,
    /// Brush radius in pixels.
    pub radius: f64,
}

impl Stroke {
    /// Start a stroke at `start`.
    pub fn new(start: Point, color: BrushColor, radius: f64) -> Self {
        Self {
            points: vec![start],
            color,
            radius,
        }
    }

    /// Add a point to the path.
    pub fn add_point(&mut self, point: Point) {
        self.points.push(point);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Last point of the path, if any.
    pub fn last_point(&self) -> Option<Point> {
        self.points.last().copied()
    }

    /// Bounding box of the painted area (path bounds inflated by the radius).
    pub fn bounds(&self) -> Rect {
        let Some(first) = self.points.first() else {
            return Rect::ZERO;
        };

        let mut rect = Rect::from_points(*first, *first);
        for point in &self.points[1..] {
            rect = rect.union_pt(*point);
        }
        rect.inflate(self.radius, self.radius)
    }
}

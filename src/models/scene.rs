// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Drawing scene data structures.
//!
//! A scene is the vector markup drawn over one snapshot. Coordinates are in
//! the drawing surface's internal pixel space; the scene records the size
//! of that space so it can be rescaled to a different surface or flattened
//! onto a frame of any resolution.

use serde::{Deserialize, Serialize};

/// Number of segments used to approximate an ellipse outline.
const ELLIPSE_SEGMENTS: usize = 48;

/// A 2D point in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Stroke color (straight RGBA) and width in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub color: [u8; 4],
    pub width: f32,
}

impl Default for Stroke {
    fn default() -> Self {
        Self {
            color: [230, 40, 40, 255],
            width: 4.0,
        }
    }
}

/// Geometry of a single shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Geometry {
    /// Freehand pen path.
    Path { points: Vec<Point> },
    Line { from: Point, to: Point },
    Arrow { from: Point, to: Point },
    Rectangle { min: Point, max: Point },
    Ellipse { center: Point, radius: Point },
}

/// A shape with its stroke.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    #[serde(flatten)]
    pub geometry: Geometry,
    pub stroke: Stroke,
}

impl Shape {
    pub fn new(geometry: Geometry, stroke: Stroke) -> Self {
        Self { geometry, stroke }
    }

    /// Outline of the shape as open polylines.
    ///
    /// Both the on-screen painter and the raster compositor draw from this,
    /// so a shape looks the same in the editor and in the thumbnail.
    pub fn polylines(&self) -> Vec<Vec<Point>> {
        match &self.geometry {
            Geometry::Path { points } => vec![points.clone()],
            Geometry::Line { from, to } => vec![vec![*from, *to]],
            Geometry::Arrow { from, to } => {
                let (left, right) = arrow_head(*from, *to, self.stroke.width);
                vec![vec![*from, *to], vec![left, *to, right]]
            }
            Geometry::Rectangle { min, max } => vec![vec![
                *min,
                Point::new(max.x, min.y),
                *max,
                Point::new(min.x, max.y),
                *min,
            ]],
            Geometry::Ellipse { center, radius } => vec![ellipse_points(*center, *radius)],
        }
    }

    fn points_mut(&mut self) -> Vec<&mut Point> {
        match &mut self.geometry {
            Geometry::Path { points } => points.iter_mut().collect(),
            Geometry::Line { from, to } | Geometry::Arrow { from, to } => vec![from, to],
            Geometry::Rectangle { min, max } => vec![min, max],
            Geometry::Ellipse { center, radius } => vec![center, radius],
        }
    }

    /// Whether `point` lies within `tolerance` of the shape's outline.
    pub fn hit(&self, point: Point, tolerance: f32) -> bool {
        let reach = tolerance + self.stroke.width / 2.0;
        self.polylines().iter().any(|line| match line.as_slice() {
            [single] => single.distance_to(&point) <= reach,
            _ => line
                .windows(2)
                .any(|seg| distance_to_segment(point, seg[0], seg[1]) <= reach),
        })
    }
}

/// The full vector markup of one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub width: f32,
    pub height: f32,
    #[serde(default)]
    pub shapes: Vec<Shape>,
}

impl Scene {
    /// Create an empty scene for a surface of the given size.
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            shapes: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Index of the topmost shape under `point`.
    pub fn hit_test(&self, point: Point, tolerance: f32) -> Option<usize> {
        self.shapes.iter().rposition(|shape| shape.hit(point, tolerance))
    }

    /// Rescale every shape so it keeps its position relative to the frame
    /// when the surface changes size.
    pub fn rescale_to(&mut self, width: f32, height: f32) {
        if self.width <= 0.0 || self.height <= 0.0 || width <= 0.0 || height <= 0.0 {
            self.width = width;
            self.height = height;
            return;
        }
        let sx = width / self.width;
        let sy = height / self.height;
        let stroke_scale = (sx + sy) / 2.0;
        for shape in &mut self.shapes {
            // Ellipse radii are stored as a point and scale per axis too.
            for point in shape.points_mut() {
                point.x *= sx;
                point.y *= sy;
            }
            shape.stroke.width *= stroke_scale;
        }
        self.width = width;
        self.height = height;
    }

    /// A copy rescaled to the given size.
    pub fn rescaled(&self, width: f32, height: f32) -> Scene {
        let mut scene = self.clone();
        scene.rescale_to(width, height);
        scene
    }
}

fn arrow_head(from: Point, to: Point, width: f32) -> (Point, Point) {
    let length = (4.0 * width).max(12.0);
    let angle = (from.y - to.y).atan2(from.x - to.x);
    let spread = 25f32.to_radians();
    let left = Point::new(
        to.x + length * (angle + spread).cos(),
        to.y + length * (angle + spread).sin(),
    );
    let right = Point::new(
        to.x + length * (angle - spread).cos(),
        to.y + length * (angle - spread).sin(),
    );
    (left, right)
}

fn ellipse_points(center: Point, radius: Point) -> Vec<Point> {
    (0..=ELLIPSE_SEGMENTS)
        .map(|i| {
            let t = i as f32 / ELLIPSE_SEGMENTS as f32 * std::f32::consts::TAU;
            Point::new(center.x + radius.x * t.cos(), center.y + radius.y * t.sin())
        })
        .collect()
}

fn distance_to_segment(p: Point, a: Point, b: Point) -> f32 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return p.distance_to(&a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    p.distance_to(&Point::new(a.x + t * dx, a.y + t * dy))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(from: (f32, f32), to: (f32, f32)) -> Shape {
        Shape::new(
            Geometry::Line {
                from: Point::new(from.0, from.1),
                to: Point::new(to.0, to.1),
            },
            Stroke::default(),
        )
    }

    #[test]
    fn test_rescale_keeps_relative_position() {
        let mut scene = Scene::new(800.0, 450.0);
        scene.shapes.push(line((400.0, 100.0), (400.0, 300.0)));

        scene.rescale_to(1200.0, 675.0);

        match &scene.shapes[0].geometry {
            Geometry::Line { from, to } => {
                assert!((from.x / scene.width - 0.5).abs() < 1e-6);
                assert!((to.x / scene.width - 0.5).abs() < 1e-6);
                assert!((to.y - 450.0).abs() < 1e-3);
            }
            other => panic!("unexpected geometry {:?}", other),
        }
        assert!((scene.shapes[0].stroke.width - 6.0).abs() < 1e-4);
    }

    #[test]
    fn test_hit_test_returns_topmost() {
        let mut scene = Scene::new(100.0, 100.0);
        scene.shapes.push(line((0.0, 50.0), (100.0, 50.0)));
        scene.shapes.push(line((50.0, 0.0), (50.0, 100.0)));

        assert_eq!(scene.hit_test(Point::new(50.0, 50.0), 2.0), Some(1));
        assert_eq!(scene.hit_test(Point::new(10.0, 51.0), 2.0), Some(0));
        assert_eq!(scene.hit_test(Point::new(10.0, 10.0), 2.0), None);
    }

    #[test]
    fn test_scene_json_shape_is_tagged() {
        let mut scene = Scene::new(10.0, 10.0);
        scene.shapes.push(line((1.0, 1.0), (2.0, 2.0)));
        let json = serde_json::to_value(&scene).unwrap();
        assert_eq!(json["shapes"][0]["type"], "line");

        let back: Scene = serde_json::from_value(json).unwrap();
        assert_eq!(back, scene);
    }

    #[test]
    fn test_ellipse_outline_is_closed() {
        let shape = Shape::new(
            Geometry::Ellipse {
                center: Point::new(10.0, 10.0),
                radius: Point::new(5.0, 3.0),
            },
            Stroke::default(),
        );
        let lines = shape.polylines();
        let outline = &lines[0];
        assert!(outline[0].distance_to(outline.last().unwrap()) < 1e-3);
    }
}

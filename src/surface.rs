// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! The drawing surface: a single reusable vector canvas.
//!
//! One surface instance lives for the whole application and is bound to
//! one snapshot at a time. It is resized and cleared rather than recreated.
//! Only the lifecycle manager binds and unbinds it; the UI feeds it pointer
//! input through the lifecycle.

use crate::models::scene::{Geometry, Point, Scene, Shape, Stroke};
use crate::models::SnapshotId;
use crate::util::geometry::Size;

/// Maximum number of undo states kept per bound snapshot.
const HISTORY_LIMIT: usize = 50;

/// Minimum distance between freehand samples, in surface pixels.
const PEN_SAMPLE_SPACING: f32 = 1.5;

/// Pointer reach for the eraser, in surface pixels.
const ERASER_TOLERANCE: f32 = 6.0;

/// History system for undo/redo of scene edits.
#[derive(Debug, Default)]
struct History {
    /// Undo stack (past states)
    undo_stack: Vec<Scene>,
    /// Redo stack (future states after undo)
    redo_stack: Vec<Scene>,
}

impl History {
    /// Save current state before making a change
    fn push(&mut self, scene: Scene) {
        self.undo_stack.push(scene);
        if self.undo_stack.len() > HISTORY_LIMIT {
            self.undo_stack.remove(0);
        }
        // Clear redo stack when new action is performed
        self.redo_stack.clear();
    }

    fn undo(&mut self, current: Scene) -> Option<Scene> {
        let previous = self.undo_stack.pop()?;
        self.redo_stack.push(current);
        Some(previous)
    }

    fn redo(&mut self, current: Scene) -> Option<Scene> {
        let next = self.redo_stack.pop()?;
        self.undo_stack.push(current);
        Some(next)
    }

    fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

/// Current drawing tool selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Select,
    Pen,
    Line,
    Arrow,
    Rectangle,
    Ellipse,
    Eraser,
}

impl Tool {
    pub const ALL: [Tool; 7] = [
        Tool::Select,
        Tool::Pen,
        Tool::Line,
        Tool::Arrow,
        Tool::Rectangle,
        Tool::Ellipse,
        Tool::Eraser,
    ];

    /// Whether using this tool on an empty frame should create a snapshot.
    pub fn draws(&self) -> bool {
        !matches!(self, Tool::Select | Tool::Eraser)
    }
}

/// Pointer input in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down(Point),
    Move(Point),
    Up,
}

#[derive(Debug)]
struct InProgress {
    anchor: Point,
    shape: Shape,
}

/// Vector canvas shared across snapshots.
#[derive(Debug)]
pub struct DrawingSurface {
    size: Size,
    scene: Scene,
    bound: Option<SnapshotId>,
    tool: Tool,
    brush: Stroke,
    in_progress: Option<InProgress>,
    erasing: bool,
    history: History,
}

impl DrawingSurface {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            scene: Scene::new(size.width, size.height),
            bound: None,
            tool: Tool::Pen,
            brush: Stroke::default(),
            in_progress: None,
            erasing: false,
            history: History::default(),
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Shape currently being dragged out, not yet part of the scene.
    pub fn preview(&self) -> Option<&Shape> {
        self.in_progress.as_ref().map(|p| &p.shape)
    }

    pub fn bound(&self) -> Option<SnapshotId> {
        self.bound
    }

    /// Whether the surface has finished loading `id`'s scene.
    pub fn is_ready_for(&self, id: SnapshotId) -> bool {
        self.bound == Some(id)
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn set_tool(&mut self, tool: Tool) {
        self.tool = tool;
        self.in_progress = None;
    }

    pub fn brush(&self) -> Stroke {
        self.brush
    }

    pub fn set_brush(&mut self, brush: Stroke) {
        self.brush = brush;
    }

    /// Load a snapshot's scene, rescaled to the current surface size.
    pub(crate) fn bind(&mut self, id: SnapshotId, scene: Option<&Scene>) {
        self.scene = match scene {
            Some(scene) => scene.rescaled(self.size.width, self.size.height),
            None => Scene::new(self.size.width, self.size.height),
        };
        self.bound = Some(id);
        self.in_progress = None;
        self.erasing = false;
        self.history.clear();
        log::debug!("Drawing surface bound to snapshot {}", id);
    }

    pub(crate) fn unbind(&mut self) {
        self.bound = None;
        self.scene = Scene::new(self.size.width, self.size.height);
        self.in_progress = None;
        self.erasing = false;
        self.history.clear();
    }

    /// Adopt a new pixel size, rescaling the scene and history so shapes
    /// keep their place in the frame. Returns whether anything changed.
    pub fn resize(&mut self, size: Size) -> bool {
        if size.is_empty() || size.approx_eq(&self.size) {
            return false;
        }
        log::debug!(
            "Resizing drawing surface {}x{} -> {}x{}",
            self.size.width,
            self.size.height,
            size.width,
            size.height
        );
        self.size = size;
        self.scene.rescale_to(size.width, size.height);
        for state in self
            .history
            .undo_stack
            .iter_mut()
            .chain(self.history.redo_stack.iter_mut())
        {
            state.rescale_to(size.width, size.height);
        }
        self.in_progress = None;
        true
    }

    /// Feed pointer input. Returns true when the scene was modified.
    pub fn pointer(&mut self, event: PointerEvent) -> bool {
        if self.bound.is_none() {
            return false;
        }
        match (self.tool, event) {
            (Tool::Select, _) => false,
            (Tool::Eraser, PointerEvent::Down(p)) => {
                self.erasing = true;
                self.erase_at(p)
            }
            (Tool::Eraser, PointerEvent::Move(p)) => self.erasing && self.erase_at(p),
            (Tool::Eraser, PointerEvent::Up) => {
                self.erasing = false;
                false
            }
            (tool, PointerEvent::Down(p)) => {
                self.in_progress = Some(InProgress {
                    anchor: p,
                    shape: Shape::new(start_geometry(tool, p), self.brush),
                });
                false
            }
            (_, PointerEvent::Move(p)) => {
                if let Some(progress) = &mut self.in_progress {
                    drag_to(&mut progress.shape.geometry, progress.anchor, p);
                }
                false
            }
            (_, PointerEvent::Up) => match self.in_progress.take() {
                Some(progress) if !is_degenerate(&progress.shape.geometry) => {
                    self.add_shape(progress.shape);
                    true
                }
                _ => false,
            },
        }
    }

    pub fn add_shape(&mut self, shape: Shape) {
        self.history.push(self.scene.clone());
        self.scene.shapes.push(shape);
    }

    pub fn remove_shape(&mut self, index: usize) -> Option<Shape> {
        if index >= self.scene.shapes.len() {
            return None;
        }
        self.history.push(self.scene.clone());
        Some(self.scene.shapes.remove(index))
    }

    fn erase_at(&mut self, point: Point) -> bool {
        match self.scene.hit_test(point, ERASER_TOLERANCE) {
            Some(index) => self.remove_shape(index).is_some(),
            None => false,
        }
    }

    /// Remove every shape. Returns false when there was nothing to clear.
    pub fn clear(&mut self) -> bool {
        if self.bound.is_none() || self.scene.is_empty() {
            return false;
        }
        self.history.push(self.scene.clone());
        self.scene.shapes.clear();
        true
    }

    pub fn undo(&mut self) -> bool {
        match self.history.undo(self.scene.clone()) {
            Some(previous) => {
                self.scene = previous;
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo(self.scene.clone()) {
            Some(next) => {
                self.scene = next;
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }
}

fn start_geometry(tool: Tool, p: Point) -> Geometry {
    match tool {
        Tool::Line => Geometry::Line { from: p, to: p },
        Tool::Arrow => Geometry::Arrow { from: p, to: p },
        Tool::Rectangle => Geometry::Rectangle { min: p, max: p },
        Tool::Ellipse => Geometry::Ellipse {
            center: p,
            radius: Point::default(),
        },
        _ => Geometry::Path { points: vec![p] },
    }
}

fn drag_to(geometry: &mut Geometry, anchor: Point, p: Point) {
    match geometry {
        Geometry::Path { points } => {
            let far_enough = points
                .last()
                .map_or(true, |last| last.distance_to(&p) >= PEN_SAMPLE_SPACING);
            if far_enough {
                points.push(p);
            }
        }
        Geometry::Line { to, .. } | Geometry::Arrow { to, .. } => *to = p,
        Geometry::Rectangle { min, max } => {
            *min = Point::new(anchor.x.min(p.x), anchor.y.min(p.y));
            *max = Point::new(anchor.x.max(p.x), anchor.y.max(p.y));
        }
        Geometry::Ellipse { center, radius } => {
            *center = Point::new((anchor.x + p.x) / 2.0, (anchor.y + p.y) / 2.0);
            *radius = Point::new((p.x - anchor.x).abs() / 2.0, (p.y - anchor.y).abs() / 2.0);
        }
    }
}

fn is_degenerate(geometry: &Geometry) -> bool {
    match geometry {
        Geometry::Path { points } => points.is_empty(),
        Geometry::Line { from, to } | Geometry::Arrow { from, to } => from.distance_to(to) < 1.0,
        Geometry::Rectangle { min, max } => (max.x - min.x) < 1.0 && (max.y - min.y) < 1.0,
        Geometry::Ellipse { radius, .. } => radius.x < 0.5 && radius.y < 0.5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bound_surface() -> DrawingSurface {
        let mut surface = DrawingSurface::new(Size::new(800.0, 450.0));
        surface.bind(SnapshotId(1), None);
        surface
    }

    fn drag(surface: &mut DrawingSurface, from: (f32, f32), to: (f32, f32)) -> bool {
        surface.pointer(PointerEvent::Down(Point::new(from.0, from.1)));
        surface.pointer(PointerEvent::Move(Point::new(to.0, to.1)));
        surface.pointer(PointerEvent::Up)
    }

    #[test]
    fn test_unbound_surface_ignores_input() {
        let mut surface = DrawingSurface::new(Size::new(100.0, 100.0));
        assert!(!drag(&mut surface, (0.0, 0.0), (50.0, 50.0)));
        assert!(surface.scene().is_empty());
    }

    #[test]
    fn test_pen_stroke_commits_on_release() {
        let mut surface = bound_surface();
        surface.pointer(PointerEvent::Down(Point::new(10.0, 10.0)));
        surface.pointer(PointerEvent::Move(Point::new(20.0, 10.0)));
        assert!(surface.preview().is_some());
        assert!(surface.scene().is_empty());

        assert!(surface.pointer(PointerEvent::Up));
        assert_eq!(surface.scene().shapes.len(), 1);
        assert!(surface.preview().is_none());
    }

    #[test]
    fn test_rectangle_normalizes_corners() {
        let mut surface = bound_surface();
        surface.set_tool(Tool::Rectangle);
        assert!(drag(&mut surface, (100.0, 80.0), (20.0, 10.0)));
        match &surface.scene().shapes[0].geometry {
            Geometry::Rectangle { min, max } => {
                assert_eq!(*min, Point::new(20.0, 10.0));
                assert_eq!(*max, Point::new(100.0, 80.0));
            }
            other => panic!("unexpected geometry {:?}", other),
        }
    }

    #[test]
    fn test_zero_length_line_is_dropped() {
        let mut surface = bound_surface();
        surface.set_tool(Tool::Line);
        assert!(!drag(&mut surface, (5.0, 5.0), (5.0, 5.0)));
        assert!(surface.scene().is_empty());
    }

    #[test]
    fn test_eraser_removes_shape_and_undo_restores() {
        let mut surface = bound_surface();
        surface.set_tool(Tool::Line);
        drag(&mut surface, (0.0, 100.0), (200.0, 100.0));

        surface.set_tool(Tool::Eraser);
        assert!(surface.pointer(PointerEvent::Down(Point::new(100.0, 101.0))));
        surface.pointer(PointerEvent::Up);
        assert!(surface.scene().is_empty());

        assert!(surface.undo());
        assert_eq!(surface.scene().shapes.len(), 1);
        assert!(surface.redo());
        assert!(surface.scene().is_empty());
    }

    #[test]
    fn test_resize_keeps_center_shape_centered() {
        let mut surface = bound_surface();
        surface.set_tool(Tool::Line);
        drag(&mut surface, (400.0, 100.0), (400.0, 300.0));

        assert!(surface.resize(Size::new(1600.0, 900.0)));

        match &surface.scene().shapes[0].geometry {
            Geometry::Line { from, to } => {
                assert!((from.x - 800.0).abs() < 1e-3);
                assert!((to.x - 800.0).abs() < 1e-3);
                assert!((to.y - 600.0).abs() < 1e-3);
            }
            other => panic!("unexpected geometry {:?}", other),
        }
        assert!(!surface.resize(Size::new(1600.2, 900.1)));
    }

    #[test]
    fn test_bind_rescales_stored_scene_and_resets_history() {
        let mut surface = bound_surface();
        drag(&mut surface, (0.0, 0.0), (10.0, 10.0));
        assert!(surface.can_undo());

        let mut stored = Scene::new(400.0, 225.0);
        stored.shapes.push(Shape::new(
            Geometry::Line {
                from: Point::new(200.0, 0.0),
                to: Point::new(200.0, 225.0),
            },
            Stroke::default(),
        ));
        surface.bind(SnapshotId(2), Some(&stored));

        assert!(surface.is_ready_for(SnapshotId(2)));
        assert!(!surface.can_undo());
        assert_eq!(surface.scene().width, 800.0);
        match &surface.scene().shapes[0].geometry {
            Geometry::Line { from, .. } => assert!((from.x - 400.0).abs() < 1e-3),
            other => panic!("unexpected geometry {:?}", other),
        }
    }
}

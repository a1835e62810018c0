// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Coordinate mapping between the displayed overlay and the drawing
//! surface.
//!
//! The overlay is shown at a layout-dependent size while the surface keeps
//! its own pixel grid (display size times pixel density). Pointer input is
//! translated with `internal = (viewport - origin) * (internal / display)`
//! per axis. A mapping is only valid for the rectangle it was built from;
//! callers rebuild it whenever the layout changes.

use crate::models::scene::Point;

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Sizes closer than half a pixel are treated as equal so float noise
    /// from layout does not cause rescale churn.
    pub fn approx_eq(&self, other: &Size) -> bool {
        (self.width - other.width).abs() < 0.5 && (self.height - other.height).abs() < 0.5
    }
}

/// Maps pointer coordinates from the displayed rectangle to surface pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportMapping {
    origin: Point,
    display: Size,
    internal: Size,
}

impl ViewportMapping {
    pub fn new(origin: Point, display: Size, internal: Size) -> Self {
        Self {
            origin,
            display,
            internal,
        }
    }

    fn scale(&self) -> (f32, f32) {
        if self.display.is_empty() {
            return (1.0, 1.0);
        }
        (
            self.internal.width / self.display.width,
            self.internal.height / self.display.height,
        )
    }

    /// Viewport → surface pixels.
    pub fn to_internal(&self, viewport: Point) -> Point {
        let (sx, sy) = self.scale();
        Point::new(
            (viewport.x - self.origin.x) * sx,
            (viewport.y - self.origin.y) * sy,
        )
    }

    /// Surface pixels → viewport.
    pub fn to_viewport(&self, internal: Point) -> Point {
        let (sx, sy) = self.scale();
        Point::new(internal.x / sx + self.origin.x, internal.y / sy + self.origin.y)
    }
}

/// Fit content of `content` size inside `available`, preserving aspect
/// ratio. Returns the offset and size of the letterboxed rectangle.
pub fn fit_rect(content: Size, available: Size) -> (Point, Size) {
    if content.is_empty() || available.is_empty() {
        return (Point::default(), Size::default());
    }
    let content_aspect = content.width / content.height;
    let available_aspect = available.width / available.height;

    let size = if content_aspect > available_aspect {
        // Content is wider - fit to width
        Size::new(available.width, available.width / content_aspect)
    } else {
        // Content is taller - fit to height
        Size::new(available.height * content_aspect, available.height)
    };
    let offset = Point::new(
        (available.width - size.width) / 2.0,
        (available.height - size.height) / 2.0,
    );
    (offset, size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_internal_scales_per_axis() {
        let mapping = ViewportMapping::new(
            Point::new(100.0, 50.0),
            Size::new(640.0, 360.0),
            Size::new(1280.0, 720.0),
        );
        let p = mapping.to_internal(Point::new(420.0, 230.0));
        assert!((p.x - 640.0).abs() < 1e-4);
        assert!((p.y - 360.0).abs() < 1e-4);
    }

    #[test]
    fn test_viewport_round_trip() {
        let mapping = ViewportMapping::new(
            Point::new(12.0, 7.0),
            Size::new(300.0, 200.0),
            Size::new(450.0, 400.0),
        );
        let viewport = Point::new(150.0, 99.0);
        let back = mapping.to_viewport(mapping.to_internal(viewport));
        assert!((back.x - viewport.x).abs() < 1e-3);
        assert!((back.y - viewport.y).abs() < 1e-3);
    }

    #[test]
    fn test_fit_rect_letterboxes_wide_content() {
        let (offset, size) = fit_rect(Size::new(1920.0, 1080.0), Size::new(800.0, 800.0));
        assert!((size.width - 800.0).abs() < 1e-3);
        assert!((size.height - 450.0).abs() < 1e-3);
        assert!((offset.y - 175.0).abs() < 1e-3);
        assert_eq!(offset.x, 0.0);
    }

    #[test]
    fn test_fit_rect_pillarboxes_tall_content() {
        let (offset, size) = fit_rect(Size::new(1080.0, 1920.0), Size::new(800.0, 800.0));
        assert!((size.height - 800.0).abs() < 1e-3);
        assert!((size.width - 450.0).abs() < 1e-3);
        assert!((offset.x - 175.0).abs() < 1e-3);
    }
}

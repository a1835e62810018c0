// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Raster side of the markup: PNG encode/decode and compositing a scene
//! onto the captured frame.
//!
//! The composite is the only persisted image used for thumbnails and
//! export, so it is regenerated whenever the scene changes.

use crate::error::Result;
use crate::models::scene::Scene;
use image::{ImageFormat, Rgba, RgbaImage};
use resvg::tiny_skia::{
    FillRule, LineCap, LineJoin, Paint, PathBuilder, Pixmap, PremultipliedColorU8,
    Stroke as SkStroke, Transform,
};
use std::io::Cursor;

/// Encode an RGBA image as PNG bytes.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

/// Decode any supported image bytes into RGBA.
pub fn decode_image(bytes: &[u8]) -> Result<RgbaImage> {
    Ok(image::load_from_memory(bytes)?.to_rgba8())
}

/// Decode and shrink an image to fit within `max_side` pixels.
pub fn decode_thumbnail(bytes: &[u8], max_side: u32) -> Result<RgbaImage> {
    let image = image::load_from_memory(bytes)?;
    Ok(image.thumbnail(max_side, max_side).to_rgba8())
}

/// Flatten `scene` onto a copy of `frame`.
///
/// Scene coordinates are mapped from the scene's own size to the frame's
/// pixel size, so the scene may have been drawn at any display resolution.
/// Shapes are stroked anti-aliased into a transparent layer, which is then
/// blended over the frame once.
pub fn composite(frame: &RgbaImage, scene: &Scene) -> RgbaImage {
    let mut out = frame.clone();
    let (width, height) = out.dimensions();
    if scene.width <= 0.0 || scene.height <= 0.0 {
        return out;
    }
    // None for a zero-sized frame.
    let Some(mut layer) = Pixmap::new(width, height) else {
        return out;
    };
    let sx = width as f32 / scene.width;
    let sy = height as f32 / scene.height;
    let stroke_scale = (sx + sy) / 2.0;

    for shape in &scene.shapes {
        let [r, g, b, a] = shape.stroke.color;
        let mut paint = Paint::default();
        paint.set_color_rgba8(r, g, b, a);
        paint.anti_alias = true;
        let stroke = SkStroke {
            width: (shape.stroke.width * stroke_scale).max(1.0),
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..SkStroke::default()
        };

        let mut builder = PathBuilder::new();
        let mut dots = Vec::new();
        for line in shape.polylines() {
            let mut points = line.iter().map(|p| (p.x * sx, p.y * sy));
            match (points.next(), line.len()) {
                (None, _) => {}
                (Some((x, y)), 1) => dots.push((x, y)),
                (Some((x, y)), _) => {
                    builder.move_to(x, y);
                    for (x, y) in points {
                        builder.line_to(x, y);
                    }
                }
            }
        }
        // One path per shape, so self-overlapping strokes cover once.
        if let Some(path) = builder.finish() {
            layer.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        }
        for (x, y) in dots {
            if let Some(dot) = PathBuilder::from_circle(x, y, stroke.width / 2.0) {
                layer.fill_path(&dot, &paint, FillRule::Winding, Transform::identity(), None);
            }
        }
    }

    for (dst, src) in out.pixels_mut().zip(layer.pixels()) {
        blend_over(dst, *src);
    }
    out
}

/// Source-over of a premultiplied pixel onto a straight-alpha one.
fn blend_over(dst: &mut Rgba<u8>, src: PremultipliedColorU8) {
    if src.alpha() == 0 {
        return;
    }
    let keep = 1.0 - src.alpha() as f32 / 255.0;
    let channels = [src.red(), src.green(), src.blue()];
    for (channel, value) in channels.into_iter().enumerate() {
        let mixed = value as f32 + dst[channel] as f32 * keep;
        dst[channel] = mixed.round().min(255.0) as u8;
    }
    let alpha = src.alpha() as f32 + dst[3] as f32 * keep;
    dst[3] = alpha.round().min(255.0) as u8;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::scene::{Geometry, Point, Shape, Stroke};

    fn gray_frame(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba([50, 50, 50, 255]))
    }

    #[test]
    fn test_composite_draws_scaled_line() {
        let frame = gray_frame(200, 100);
        // Scene drawn on a surface half the frame's size.
        let mut scene = Scene::new(100.0, 50.0);
        scene.shapes.push(Shape::new(
            Geometry::Line {
                from: Point::new(10.0, 25.0),
                to: Point::new(90.0, 25.0),
            },
            Stroke {
                color: [255, 0, 0, 255],
                width: 2.0,
            },
        ));

        let out = composite(&frame, &scene);

        assert_eq!(out.get_pixel(100, 50), &Rgba([255, 0, 0, 255]));
        assert_eq!(out.get_pixel(100, 10), &Rgba([50, 50, 50, 255]));
        // Original frame untouched.
        assert_eq!(frame.get_pixel(100, 50), &Rgba([50, 50, 50, 255]));
    }

    #[test]
    fn test_overlapping_segments_blend_once() {
        let frame = gray_frame(50, 50);
        let mut scene = Scene::new(50.0, 50.0);
        scene.shapes.push(Shape::new(
            Geometry::Path {
                points: vec![
                    Point::new(10.0, 25.0),
                    Point::new(40.0, 25.0),
                    Point::new(10.0, 25.0),
                ],
            },
            Stroke {
                color: [250, 250, 250, 128],
                width: 4.0,
            },
        ));

        let out = composite(&frame, &scene);
        // 250 at half alpha over 50 once is ~150; a second pass would be ~200.
        let px = out.get_pixel(25, 25);
        assert!((px[0] as i32 - 150).abs() <= 2, "got {:?}", px);
        assert_eq!(px[3], 255);
    }

    #[test]
    fn test_single_point_path_leaves_a_dot() {
        let frame = gray_frame(40, 40);
        let mut scene = Scene::new(40.0, 40.0);
        scene.shapes.push(Shape::new(
            Geometry::Path {
                points: vec![Point::new(20.0, 20.0)],
            },
            Stroke {
                color: [0, 0, 255, 255],
                width: 8.0,
            },
        ));

        let out = composite(&frame, &scene);
        assert_eq!(out.get_pixel(20, 20), &Rgba([0, 0, 255, 255]));
        assert_eq!(out.get_pixel(20, 30), &Rgba([50, 50, 50, 255]));
    }

    #[test]
    fn test_empty_frame_is_returned_as_is() {
        let frame = RgbaImage::new(0, 0);
        let mut scene = Scene::new(10.0, 10.0);
        scene.shapes.push(Shape::new(
            Geometry::Line {
                from: Point::new(0.0, 0.0),
                to: Point::new(10.0, 10.0),
            },
            Stroke {
                color: [255, 255, 255, 255],
                width: 1.0,
            },
        ));
        assert_eq!(composite(&frame, &scene).dimensions(), (0, 0));
    }

    #[test]
    fn test_png_round_trip_keeps_dimensions() {
        let frame = gray_frame(16, 9);
        let bytes = encode_png(&frame).unwrap();
        let decoded = decode_image(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), (16, 9));
        assert_eq!(decode_thumbnail(&bytes, 8).unwrap().width(), 8);
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(decode_image(b"not an image").is_err());
    }
}

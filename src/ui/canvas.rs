// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Drawing canvas: the current frame with the markup overlay.
//!
//! The frame is letterboxed into the available space. The overlay's pixel
//! size is the displayed size times the pixel density; pointer input is
//! mapped into those pixels before it reaches the drawing surface.

use crate::models::scene::{Point, Shape};
use crate::surface::{DrawingSurface, PointerEvent, Tool};
use crate::util::geometry::{fit_rect, Size, ViewportMapping};

/// Result of canvas interaction.
#[derive(Debug, Default)]
pub struct CanvasOutput {
    /// Overlay pixel size this frame, when a frame is shown.
    pub overlay_size: Option<Size>,
    pub events: Vec<PointerEvent>,
}

/// Display the canvas area.
pub fn show(
    ui: &mut egui::Ui,
    frame: Option<&egui::TextureHandle>,
    surface: Option<&DrawingSurface>,
) -> CanvasOutput {
    let mut output = CanvasOutput::default();
    ui.style_mut().visuals.extreme_bg_color = egui::Color32::from_gray(40);
    let available_size = ui.available_size();

    egui::Frame::canvas(ui.style()).show(ui, |ui| {
        ui.set_min_size(available_size);

        let (Some(texture), Some(surface)) = (frame, surface) else {
            placeholder(ui, surface.is_some());
            return;
        };

        let [tex_w, tex_h] = texture.size();
        let available = ui.available_size();
        let (offset, display) = fit_rect(
            Size::new(tex_w as f32, tex_h as f32),
            Size::new(available.x, available.y),
        );
        if display.is_empty() {
            return;
        }
        let image_rect = egui::Rect::from_min_size(
            ui.min_rect().min + egui::vec2(offset.x, offset.y),
            egui::vec2(display.width, display.height),
        );

        ui.painter().image(
            texture.id(),
            image_rect,
            egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
            egui::Color32::WHITE,
        );

        let density = ui.ctx().pixels_per_point();
        let internal = Size::new(
            (display.width * density).round(),
            (display.height * density).round(),
        );
        output.overlay_size = Some(internal);
        let mapping = ViewportMapping::new(
            Point::new(image_rect.min.x, image_rect.min.y),
            display,
            internal,
        );

        let response = ui.allocate_rect(image_rect, egui::Sense::click_and_drag());
        if surface.tool() != Tool::Select {
            collect_pointer(ui, &response, image_rect, &mapping, &mut output.events);
        }

        // The scene may still be at the previous size until the resize is
        // applied; map it through its own size.
        let scene = surface.scene();
        let scene_mapping = ViewportMapping::new(
            Point::new(image_rect.min.x, image_rect.min.y),
            display,
            Size::new(scene.width, scene.height),
        );
        let painter = ui.painter_at(image_rect);
        for shape in &scene.shapes {
            draw_shape(&painter, shape, &scene_mapping, display.width / scene.width.max(1.0));
        }
        if let Some(preview) = surface.preview() {
            draw_shape(&painter, preview, &scene_mapping, display.width / scene.width.max(1.0));
        }
    });

    output
}

fn collect_pointer(
    ui: &egui::Ui,
    response: &egui::Response,
    image_rect: egui::Rect,
    mapping: &ViewportMapping,
    events: &mut Vec<PointerEvent>,
) {
    let (pressed, released, down, moved, pos) = ui.input(|i| {
        (
            i.pointer.primary_pressed(),
            i.pointer.primary_released(),
            i.pointer.primary_down(),
            i.pointer.delta() != egui::Vec2::ZERO,
            i.pointer.interact_pos(),
        )
    });
    let Some(pos) = pos else {
        return;
    };
    let to_internal = |p: egui::Pos2| mapping.to_internal(Point::new(p.x, p.y));

    if pressed && response.hovered() && image_rect.contains(pos) {
        events.push(PointerEvent::Down(to_internal(pos)));
    } else if down && moved && response.is_pointer_button_down_on() {
        let clamped = image_rect.clamp(pos);
        events.push(PointerEvent::Move(to_internal(clamped)));
    }
    if released {
        events.push(PointerEvent::Up);
    }
}

fn draw_shape(painter: &egui::Painter, shape: &Shape, mapping: &ViewportMapping, scale: f32) {
    let [r, g, b, a] = shape.stroke.color;
    let stroke = egui::Stroke::new(
        (shape.stroke.width * scale).max(1.0),
        egui::Color32::from_rgba_unmultiplied(r, g, b, a),
    );
    for line in shape.polylines() {
        let points: Vec<egui::Pos2> = line
            .iter()
            .map(|p| {
                let v = mapping.to_viewport(*p);
                egui::pos2(v.x, v.y)
            })
            .collect();
        match points.as_slice() {
            [] => {}
            [single] => {
                painter.circle_filled(*single, stroke.width / 2.0, stroke.color);
            }
            _ => {
                painter.add(egui::Shape::line(points, stroke));
            }
        }
    }
}

fn placeholder(ui: &mut egui::Ui, has_project: bool) {
    ui.centered_and_justified(|ui| {
        ui.vertical_centered(|ui| {
            ui.add_space(20.0);
            if has_project {
                ui.spinner();
                ui.label(
                    egui::RichText::new("Loading media...").color(egui::Color32::from_gray(200)),
                );
                return;
            }
            ui.heading(
                egui::RichText::new("ReelNotes")
                    .size(32.0)
                    .color(egui::Color32::from_gray(200)),
            );
            ui.label(
                egui::RichText::new("Frame-accurate review notes")
                    .size(14.0)
                    .color(egui::Color32::from_gray(150)),
            );
            ui.add_space(20.0);
            ui.label(
                egui::RichText::new("Open a video or image to begin reviewing")
                    .color(egui::Color32::from_gray(180)),
            );
            ui.add_space(10.0);
            ui.label(
                egui::RichText::new("File → New Project from Media...")
                    .weak()
                    .color(egui::Color32::from_gray(130)),
            );
        });
    });
}

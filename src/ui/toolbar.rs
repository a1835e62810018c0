// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Toolbar: drawing tools, brush and history controls.

use crate::models::scene::Stroke;
use crate::surface::{DrawingSurface, Tool};

/// Result of toolbar interaction. Tool and brush changes are applied to
/// the surface directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolbarAction {
    None,
    Capture,
    Undo,
    Redo,
    Clear,
    ExitEditing,
}

fn tool_label(tool: Tool) -> &'static str {
    match tool {
        Tool::Select => "⬆ Select",
        Tool::Pen => "✏ Pen",
        Tool::Line => "⟋ Line",
        Tool::Arrow => "➡ Arrow",
        Tool::Rectangle => "⬜ Rect",
        Tool::Ellipse => "⭕ Ellipse",
        Tool::Eraser => "⌫ Eraser",
    }
}

fn tool_hint(tool: Tool) -> &'static str {
    match tool {
        Tool::Select => "Pointer input is ignored",
        Tool::Pen => "Drag to draw freehand",
        Tool::Line | Tool::Arrow => "Drag from start to end",
        Tool::Rectangle | Tool::Ellipse => "Drag to size the shape",
        Tool::Eraser => "Click or drag over shapes to remove them",
    }
}

/// Display the toolbar.
pub fn show(ui: &mut egui::Ui, surface: &mut DrawingSurface, editing: bool) -> ToolbarAction {
    let mut action = ToolbarAction::None;
    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;

        if ui
            .button("📷 Snapshot")
            .on_hover_text("Capture or open the snapshot at the current frame")
            .clicked()
        {
            action = ToolbarAction::Capture;
        }
        if ui
            .add_enabled(editing, egui::Button::new("Done (Esc)"))
            .clicked()
        {
            action = ToolbarAction::ExitEditing;
        }

        ui.separator();

        let current = surface.tool();
        for tool in Tool::ALL {
            if ui.selectable_label(current == tool, tool_label(tool)).clicked() {
                surface.set_tool(tool);
            }
        }

        ui.separator();

        let brush = surface.brush();
        let mut color = egui::Color32::from_rgba_unmultiplied(
            brush.color[0],
            brush.color[1],
            brush.color[2],
            brush.color[3],
        );
        let mut width = brush.width;
        ui.color_edit_button_srgba(&mut color);
        ui.add(egui::Slider::new(&mut width, 1.0..=40.0).text("px"));
        let updated = Stroke {
            color: color.to_srgba_unmultiplied(),
            width,
        };
        if updated != brush {
            surface.set_brush(updated);
        }

        ui.separator();

        if ui
            .add_enabled(surface.can_undo(), egui::Button::new("↶"))
            .on_hover_text("Undo (Ctrl+Z)")
            .clicked()
        {
            action = ToolbarAction::Undo;
        }
        if ui
            .add_enabled(surface.can_redo(), egui::Button::new("↷"))
            .on_hover_text("Redo (Ctrl+Shift+Z)")
            .clicked()
        {
            action = ToolbarAction::Redo;
        }
        if ui
            .add_enabled(editing && !surface.scene().is_empty(), egui::Button::new("🗑 Clear"))
            .clicked()
        {
            action = ToolbarAction::Clear;
        }

        ui.separator();
        ui.label(egui::RichText::new(tool_hint(surface.tool())).italics().weak());
    });
    action
}

// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Small shared widgets.

use std::time::Duration;

#[derive(Debug, Clone, Copy)]
struct HoldState {
    started: f64,
    fired: bool,
}

/// A button that only reports a click after being held for `hold`.
///
/// A thin bar under the button shows progress. Releasing early cancels.
/// Fires once per press.
pub fn hold_to_confirm(ui: &mut egui::Ui, label: impl Into<egui::WidgetText>, hold: Duration) -> bool {
    let response = ui
        .add(egui::Button::new(label))
        .on_hover_text("Hold to confirm");
    let id = response.id.with("hold_to_confirm");
    let now = ui.input(|i| i.time);

    if !response.is_pointer_button_down_on() {
        ui.data_mut(|d| d.remove::<HoldState>(id));
        return false;
    }

    let mut state = ui
        .data(|d| d.get_temp::<HoldState>(id))
        .unwrap_or(HoldState {
            started: now,
            fired: false,
        });
    if state.fired {
        return false;
    }

    let progress = ((now - state.started) / hold.as_secs_f64().max(0.001)).min(1.0) as f32;
    let rect = response.rect;
    let bar = egui::Rect::from_min_size(
        egui::pos2(rect.min.x, rect.max.y - 3.0),
        egui::vec2(rect.width() * progress, 3.0),
    );
    ui.painter()
        .rect_filled(bar, 0.0, egui::Color32::from_rgb(214, 69, 65));
    ui.ctx().request_repaint();

    let confirmed = progress >= 1.0;
    state.fired = confirmed;
    ui.data_mut(|d| d.insert_temp(id, state));
    confirmed
}

/// Chip color as an egui color.
pub fn rgb(color: [u8; 3]) -> egui::Color32 {
    egui::Color32::from_rgb(color[0], color[1], color[2])
}

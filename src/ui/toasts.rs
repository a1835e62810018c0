// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Toast overlay in the bottom-right corner.

use crate::notify::{Level, Notifications};

/// Draw current toasts. Returns the id of a toast the user clicked away.
pub fn show(ctx: &egui::Context, notifications: &Notifications) -> Option<u64> {
    if notifications.is_empty() {
        return None;
    }
    let mut dismissed = None;
    egui::Area::new(egui::Id::new("toasts"))
        .anchor(egui::Align2::RIGHT_BOTTOM, [-12.0, -12.0])
        .order(egui::Order::Foreground)
        .show(ctx, |ui| {
            for toast in notifications.iter() {
                let (accent, icon) = match toast.level {
                    Level::Info => (egui::Color32::from_rgb(52, 152, 219), "ℹ"),
                    Level::Warning => (egui::Color32::from_rgb(241, 196, 15), "⚠"),
                    Level::Error => (egui::Color32::from_rgb(214, 69, 65), "✖"),
                };
                let response = egui::Frame::popup(ui.style())
                    .stroke(egui::Stroke::new(1.0, accent))
                    .show(ui, |ui| {
                        ui.set_max_width(320.0);
                        ui.horizontal(|ui| {
                            ui.label(egui::RichText::new(icon).color(accent));
                            ui.label(&toast.text);
                        });
                    })
                    .response
                    .interact(egui::Sense::click());
                if response.clicked() {
                    dismissed = Some(toast.id);
                }
                ui.add_space(4.0);
            }
        });
    dismissed
}

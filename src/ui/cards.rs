// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Snapshot card list.

use super::widgets::{hold_to_confirm, rgb};
use crate::models::SnapshotId;
use crate::presenter::Card;
use std::collections::HashMap;
use std::time::Duration;

const THUMB_WIDTH: f32 = 200.0;

/// Card interactions, keyed by snapshot id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardAction {
    None,
    Open(SnapshotId),
    Delete(SnapshotId),
    DeleteAll,
}

/// Display all cards. `thumbnails` maps snapshot ids to textures; cards
/// without one show their timecode only.
pub fn show(
    ui: &mut egui::Ui,
    cards: &[Card],
    thumbnails: &HashMap<SnapshotId, egui::TextureHandle>,
    hold: Duration,
) -> CardAction {
    let mut action = CardAction::None;

    ui.horizontal(|ui| {
        ui.heading("Snapshots");
        ui.label(format!("({})", cards.len()));
    });
    ui.separator();

    if cards.is_empty() {
        ui.label(
            egui::RichText::new("Pause on a frame and draw, comment or tag to capture it.")
                .weak()
                .italics(),
        );
        return action;
    }

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .max_height(ui.available_height() - 40.0)
        .show(ui, |ui| {
            for card in cards {
                let frame = egui::Frame::group(ui.style()).stroke(if card.editing {
                    egui::Stroke::new(2.0, egui::Color32::from_rgb(241, 196, 15))
                } else {
                    ui.visuals().widgets.noninteractive.bg_stroke
                });
                frame.show(ui, |ui| {
                    if let Some(card_action) = show_card(ui, card, thumbnails.get(&card.id), hold) {
                        action = card_action;
                    }
                });
                ui.add_space(4.0);
            }
        });

    ui.separator();
    if hold_to_confirm(ui, "Delete all snapshots", hold) {
        action = CardAction::DeleteAll;
    }
    action
}

fn show_card(
    ui: &mut egui::Ui,
    card: &Card,
    thumbnail: Option<&egui::TextureHandle>,
    hold: Duration,
) -> Option<CardAction> {
    let mut action = None;

    if let Some(texture) = thumbnail {
        let [w, h] = texture.size();
        let size = egui::vec2(THUMB_WIDTH, THUMB_WIDTH * h as f32 / (w.max(1) as f32));
        let image = egui::Image::from_texture(egui::load::SizedTexture::new(texture.id(), size))
            .sense(egui::Sense::click());
        if ui.add(image).on_hover_text("Open for editing").clicked() {
            action = Some(CardAction::Open(card.id));
        }
    }

    ui.horizontal(|ui| {
        if ui.link(egui::RichText::new(&card.timecode).monospace()).clicked() {
            action = Some(CardAction::Open(card.id));
        }
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if hold_to_confirm(ui, "🗑", hold) {
                action = Some(CardAction::Delete(card.id));
            }
        });
    });

    if !card.chips.is_empty() {
        ui.horizontal_wrapped(|ui| {
            for chip in &card.chips {
                egui::Frame::none()
                    .fill(rgb(chip.color))
                    .rounding(8.0)
                    .inner_margin(egui::Margin::symmetric(6.0, 1.0))
                    .show(ui, |ui| {
                        ui.label(
                            egui::RichText::new(&chip.label)
                                .small()
                                .color(egui::Color32::BLACK),
                        );
                    });
            }
        });
    }

    if !card.preview.is_empty() {
        ui.label(egui::RichText::new(&card.preview).weak());
    }
    action
}

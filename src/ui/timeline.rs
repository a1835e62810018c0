// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Playback controls and the timeline scrubber with snapshot markers.

use crate::models::SnapshotId;
use crate::presenter::Marker;
use crate::util::timecode::format_timecode;

const TRACK_HEIGHT: f32 = 28.0;
const MARKER_HIT_RADIUS: f32 = 6.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimelineAction {
    None,
    TogglePlay,
    Seek(f64),
    OpenSnapshot(SnapshotId),
}

/// Display the playback bar.
pub fn show(
    ui: &mut egui::Ui,
    position: f64,
    duration: f64,
    paused: bool,
    markers: &[Marker],
) -> TimelineAction {
    let mut action = TimelineAction::None;
    ui.horizontal(|ui| {
        let label = if paused { "▶" } else { "⏸" };
        if ui
            .add_enabled(duration > 0.0, egui::Button::new(label))
            .on_hover_text("Play/Pause (Space)")
            .clicked()
        {
            action = TimelineAction::TogglePlay;
        }
        ui.monospace(format!(
            "{} / {}",
            format_timecode(position),
            format_timecode(duration)
        ));

        let width = ui.available_width().max(50.0);
        let (rect, response) =
            ui.allocate_exact_size(egui::vec2(width, TRACK_HEIGHT), egui::Sense::click_and_drag());
        let painter = ui.painter_at(rect);
        let track = rect.shrink2(egui::vec2(MARKER_HIT_RADIUS, TRACK_HEIGHT / 2.0 - 3.0));
        painter.rect_filled(track, 3.0, egui::Color32::from_gray(70));

        let x_at = |fraction: f32| track.min.x + fraction * track.width();
        let fraction_of = |t: f64| {
            if duration > 0.0 {
                (t / duration).clamp(0.0, 1.0) as f32
            } else {
                0.0
            }
        };

        let played = egui::Rect::from_min_max(
            track.min,
            egui::pos2(x_at(fraction_of(position)), track.max.y),
        );
        painter.rect_filled(played, 3.0, egui::Color32::from_rgb(90, 120, 160));

        for marker in markers {
            let x = x_at(marker.position);
            let color = if marker.editing {
                egui::Color32::from_rgb(241, 196, 15)
            } else {
                egui::Color32::from_rgb(230, 230, 230)
            };
            painter.line_segment(
                [egui::pos2(x, rect.min.y + 3.0), egui::pos2(x, rect.max.y - 3.0)],
                egui::Stroke::new(if marker.editing { 3.0 } else { 2.0 }, color),
            );
        }

        let head = x_at(fraction_of(position));
        painter.circle_filled(egui::pos2(head, rect.center().y), 6.0, egui::Color32::WHITE);

        if duration <= 0.0 {
            return;
        }
        let Some(pointer) = response.interact_pointer_pos() else {
            return;
        };
        let seek_to = || {
            let fraction = ((pointer.x - track.min.x) / track.width()).clamp(0.0, 1.0) as f64;
            fraction * duration
        };
        if response.clicked() {
            let hit = markers
                .iter()
                .find(|m| (x_at(m.position) - pointer.x).abs() <= MARKER_HIT_RADIUS);
            action = match hit {
                Some(marker) => TimelineAction::OpenSnapshot(marker.id),
                None => TimelineAction::Seek(seek_to()),
            };
        } else if response.dragged() {
            action = TimelineAction::Seek(seek_to());
        }
    });
    action
}

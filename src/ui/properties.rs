// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Snapshot editor: comment, department tags and hour estimates.
//!
//! The panel edits drafts owned by the app. Every change is reported as an
//! action; the lifecycle decides what gets stored.

use super::widgets::rgb;
use crate::models::tags::{TagDef, TagState};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub enum PropertiesAction {
    None,
    CommentChanged,
    ToggleTag(String),
    SetHours { tag: String, input: String },
}

/// Text the editor fields are bound to.
#[derive(Debug, Default)]
pub struct EditorDrafts {
    pub comment: String,
    pub hours: BTreeMap<String, String>,
}

impl EditorDrafts {
    /// Reset every field from the open snapshot (or blank when none is).
    pub fn reset(&mut self, comment: &str, tags: Option<&TagState>) {
        self.comment = comment.to_string();
        self.hours.clear();
        if let Some(tags) = tags {
            for (tag, hours) in tags.hours_map() {
                self.hours
                    .insert(tag, crate::models::tags::format_hours(hours));
            }
        }
    }

    /// Re-sync hour fields after a toggle; typing is left alone otherwise.
    pub fn sync_hours(&mut self, tags: Option<&TagState>) {
        if let Some(tags) = tags {
            self.hours.retain(|tag, _| tags.is_active(tag));
        }
    }
}

/// Display the editor panel.
pub fn show(
    ui: &mut egui::Ui,
    catalog: &[TagDef],
    tags: Option<&TagState>,
    drafts: &mut EditorDrafts,
    editing: Option<String>,
    pending: bool,
) -> PropertiesAction {
    let mut action = PropertiesAction::None;

    ui.heading("Notes");
    ui.horizontal(|ui| {
        match &editing {
            Some(timecode) => ui.label(format!("Editing snapshot at {}", timecode)),
            None => ui.label(egui::RichText::new("No snapshot open").weak()),
        };
        if pending {
            ui.label(egui::RichText::new("● unsaved").small().weak())
                .on_hover_text("Changes are written shortly after you stop editing");
        }
    });
    ui.separator();

    ui.label("Comment");
    let comment = ui.add(
        egui::TextEdit::multiline(&mut drafts.comment)
            .desired_rows(6)
            .desired_width(f32::INFINITY)
            .hint_text("Describe the fix..."),
    );
    if comment.changed() {
        action = PropertiesAction::CommentChanged;
    }

    ui.add_space(8.0);
    ui.label("Departments");
    egui::Grid::new("tag_grid")
        .num_columns(2)
        .spacing([8.0, 4.0])
        .show(ui, |ui| {
            for def in catalog {
                let active = tags.map_or(false, |t| t.is_active(&def.id));
                let text = egui::RichText::new(&def.label).color(if active {
                    egui::Color32::BLACK
                } else {
                    rgb(def.color)
                });
                let button = egui::Button::new(text)
                    .fill(if active {
                        rgb(def.color)
                    } else {
                        egui::Color32::TRANSPARENT
                    })
                    .min_size(egui::vec2(110.0, 0.0));
                if ui.add(button).clicked() {
                    action = PropertiesAction::ToggleTag(def.id.clone());
                }

                let draft = drafts.hours.entry(def.id.clone()).or_default();
                let hours = ui.add(
                    egui::TextEdit::singleline(draft)
                        .desired_width(48.0)
                        .hint_text("h"),
                );
                if hours.changed() {
                    action = PropertiesAction::SetHours {
                        tag: def.id.clone(),
                        input: draft.clone(),
                    };
                }
                ui.end_row();
            }
        });

    action
}

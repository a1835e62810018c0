// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Project browser window.

use super::widgets::hold_to_confirm;
use crate::models::{Project, ProjectId};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectsAction {
    None,
    Open(ProjectId),
    Delete(ProjectId),
}

pub fn show(
    ctx: &egui::Context,
    open: &mut bool,
    projects: &[Project],
    current: Option<ProjectId>,
    hold: Duration,
) -> ProjectsAction {
    let mut action = ProjectsAction::None;
    egui::Window::new("Projects")
        .open(open)
        .default_width(420.0)
        .show(ctx, |ui| {
            if projects.is_empty() {
                ui.label(egui::RichText::new("No projects yet").weak());
                return;
            }
            egui::ScrollArea::vertical().show(ui, |ui| {
                egui::Grid::new("projects_grid")
                    .num_columns(4)
                    .striped(true)
                    .show(ui, |ui| {
                        for project in projects {
                            let name = if current == Some(project.id) {
                                egui::RichText::new(&project.name).strong()
                            } else {
                                egui::RichText::new(&project.name)
                            };
                            ui.label(name).on_hover_text(&project.video_file_name);
                            ui.label(
                                project
                                    .last_edited_at
                                    .with_timezone(&chrono::Local)
                                    .format("%Y-%m-%d %H:%M")
                                    .to_string(),
                            );
                            if ui.button("Open").clicked() {
                                action = ProjectsAction::Open(project.id);
                            }
                            if hold_to_confirm(ui, "Delete", hold) {
                                action = ProjectsAction::Delete(project.id);
                            }
                            ui.end_row();
                        }
                    });
            });
        });
    action
}

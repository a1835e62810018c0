// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Main application state and egui App implementation.
//!
//! The app owns the store and at most one open project. Panels return
//! actions; the app routes them to the snapshot lifecycle, drains the
//! lifecycle's events into the presenter and turns errors into toasts.

use crate::config::AppConfig;
use crate::error::ReelError;
use crate::io::media::{self, FrameSource, MediaPlayer, Player, IMAGE_EXTENSIONS, VIDEO_EXTENSIONS};
use crate::io::package::{export_package, import_package};
use crate::io::report::{build_report, write_report};
use crate::io::serialization::DocFormat;
use crate::lifecycle::Lifecycle;
use crate::models::{Blob, NewProject, Project, ProjectId, SnapshotId};
use crate::notify::{Level, Notifications};
use crate::presenter::Presenter;
use crate::render;
use crate::store::Store;
use crate::surface::PointerEvent;
use crate::ui::cards::CardAction;
use crate::ui::projects::ProjectsAction;
use crate::ui::properties::{EditorDrafts, PropertiesAction};
use crate::ui::timeline::TimelineAction;
use crate::ui::toolbar::ToolbarAction;
use crate::ui::{canvas, cards, projects, properties, timeline, toasts, toolbar};
use crate::util::clock::{Clock, SystemClock};
use crate::util::geometry::Size;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::Duration;

/// Surface size before the canvas has been laid out.
const INITIAL_SURFACE: Size = Size {
    width: 1280.0,
    height: 720.0,
};

/// Upper bound on one playback step, so a stalled frame does not skip ahead.
const MAX_FRAME_DT: f64 = 0.1;

type MediaLoader = Receiver<anyhow::Result<Box<dyn FrameSource>>>;

/// Everything that exists while a project is open.
struct OpenProject {
    project: Project,
    lifecycle: Lifecycle,
    presenter: Presenter,
    player: Player,
    loader: Option<MediaLoader>,
    frame_texture: Option<(egui::TextureHandle, u64)>,
    thumbnails: HashMap<SnapshotId, egui::TextureHandle>,
    thumbnail_revisions: HashMap<SnapshotId, u64>,
    drafts: EditorDrafts,
    drafts_for: Option<SnapshotId>,
}

/// Main application state.
pub struct ReelNotesApp {
    config: AppConfig,
    store: Box<dyn Store>,
    open: Option<OpenProject>,
    notifications: Notifications,
    clock: SystemClock,
    show_projects: bool,
    project_list: Vec<Project>,
    /// A window close was refused because the final save failed.
    close_refused: bool,
}

/// Route a lifecycle error to the user. Rejected hour input and repeated
/// creation requests are dropped quietly.
fn report_error(notifications: &mut Notifications, now: Duration, err: ReelError) {
    match err {
        ReelError::InvalidTagHours(_) | ReelError::CreationInProgress => {
            log::debug!("Ignored: {}", err)
        }
        ReelError::MediaNotReady(_) | ReelError::SnapshotNotFound(_) | ReelError::NoActiveSnapshot => {
            notifications.push(Level::Warning, err.to_string(), now)
        }
        ReelError::PersistFailure(_) | ReelError::Image(_) => {
            notifications.push(Level::Error, err.to_string(), now)
        }
    }
}

impl ReelNotesApp {
    pub fn new(config: AppConfig, store: Box<dyn Store>) -> Self {
        let notifications = Notifications::new(config.toast_ttl());
        let mut app = Self {
            config,
            store,
            open: None,
            notifications,
            clock: SystemClock::new(),
            show_projects: false,
            project_list: Vec::new(),
            close_refused: false,
        };
        app.refresh_projects();
        app.show_projects = !app.project_list.is_empty();
        app
    }

    fn notify(&mut self, level: Level, text: impl Into<String>) {
        let now = self.clock.now();
        self.notifications.push(level, text, now);
    }

    fn refresh_projects(&mut self) {
        match self.store.projects() {
            Ok(list) => self.project_list = list,
            Err(e) => self.notify(Level::Error, format!("Could not list projects: {}", e)),
        }
    }

    /// Save and close the open project. Returns false when pending edits
    /// could not be written; the project then stays open.
    fn close_project(&mut self) -> bool {
        let Some(open) = self.open.as_mut() else {
            return true;
        };
        if let Err(e) = open.lifecycle.exit_editing(self.store.as_mut()) {
            report_error(&mut self.notifications, self.clock.now(), e);
            return false;
        }
        log::info!("Closed project '{}'", open.project.name);
        self.open = None;
        true
    }

    /// Whether a window close may go ahead. When the final save fails the
    /// first request is refused so the edits stay in memory; asking again
    /// closes anyway.
    fn allow_close(&mut self) -> bool {
        if self.close_project() {
            return true;
        }
        if self.close_refused {
            log::warn!("Closing with unsaved edits after a failed save");
            return true;
        }
        self.close_refused = true;
        self.notify(
            Level::Warning,
            "Edits could not be saved. Close again to discard them.",
        );
        false
    }

    fn open_project(&mut self, id: ProjectId) {
        if self.open.as_ref().map(|o| o.project.id) == Some(id) {
            return;
        }
        if !self.close_project() {
            return;
        }
        let loaded = self
            .store
            .project(id)
            .and_then(|project| Ok((self.store.snapshots_for(id)?, project)));
        let (snapshots, project) = match loaded {
            Ok(loaded) => loaded,
            Err(e) => {
                self.notify(Level::Error, format!("Could not open project: {}", e));
                return;
            }
        };
        if project.video_data.is_empty() {
            self.notify(
                Level::Error,
                format!("Project '{}' has no media data", project.name),
            );
            return;
        }

        let loader = media::spawn_open(
            project.video_file_name.clone(),
            project.video_data.as_bytes().to_vec(),
            self.config.still_duration_secs,
        );
        let mut presenter = Presenter::new(self.config.tags.clone());
        presenter.load(snapshots, 0.0);
        log::info!(
            "Opened project '{}' with {} snapshots",
            project.name,
            presenter.len()
        );

        self.open = Some(OpenProject {
            lifecycle: Lifecycle::new(
                project.id,
                self.config.lifecycle(),
                Box::new(SystemClock::new()),
                INITIAL_SURFACE,
            ),
            project,
            presenter,
            player: Player::new(),
            loader: Some(loader),
            frame_texture: None,
            thumbnails: HashMap::new(),
            thumbnail_revisions: HashMap::new(),
            drafts: EditorDrafts::default(),
            drafts_for: None,
        });
        self.show_projects = false;
    }

    fn new_project_from_media(&mut self, path: PathBuf) {
        let created = std::fs::read(&path)
            .map_err(anyhow::Error::from)
            .and_then(|bytes| {
                let new = NewProject::from_media(&path, Blob::new(bytes));
                Ok(self.store.create_project(new)?)
            });
        match created {
            Ok(project) => {
                log::info!("Created project '{}' from {}", project.name, path.display());
                self.refresh_projects();
                self.open_project(project.id);
            }
            Err(e) => self.notify(Level::Error, format!("Could not create project: {}", e)),
        }
    }

    fn delete_project(&mut self, id: ProjectId) {
        if self.open.as_ref().map(|o| o.project.id) == Some(id) {
            // Pending edits go with the project.
            self.open = None;
        }
        match self.store.delete_project(id) {
            Ok(()) => self.notify(Level::Info, "Project deleted"),
            Err(e) => self.notify(Level::Error, format!("Could not delete project: {}", e)),
        }
        self.refresh_projects();
    }

    /// Write pending edits so exports see them.
    fn flush_open(&mut self) -> bool {
        let Some(open) = self.open.as_mut() else {
            return false;
        };
        match open.lifecycle.flush(self.store.as_mut()) {
            Ok(()) => true,
            Err(e) => {
                report_error(&mut self.notifications, self.clock.now(), e);
                false
            }
        }
    }

    fn export_package(&mut self, format: DocFormat) {
        if !self.flush_open() {
            return;
        }
        let Some(project_id) = self.open.as_ref().map(|o| o.project.id) else {
            return;
        };
        let Some(dir) = rfd::FileDialog::new().pick_folder() else {
            return;
        };
        match export_package(self.store.as_ref(), project_id, &dir, format) {
            Ok(path) => self.notify(Level::Info, format!("Exported to {}", path.display())),
            Err(e) => self.notify(Level::Error, format!("Export failed: {}", e)),
        }
    }

    fn export_report(&mut self) {
        if !self.flush_open() {
            return;
        }
        let Some(open) = self.open.as_ref() else {
            return;
        };
        let Some(path) = rfd::FileDialog::new()
            .add_filter("YAML", &["yaml", "yml"])
            .add_filter("JSON", &["json"])
            .set_file_name(format!("{}-staffing.yaml", open.project.name))
            .save_file()
        else {
            return;
        };
        let result = self.write_report_for(open.project.id, &path);
        match result {
            Ok(()) => self.notify(Level::Info, format!("Report written to {}", path.display())),
            Err(e) => self.notify(Level::Error, format!("Report failed: {}", e)),
        }
    }

    fn write_report_for(&self, project_id: ProjectId, path: &Path) -> anyhow::Result<()> {
        let project = self.store.project(project_id)?;
        let snapshots = self.store.snapshots_for(project_id)?;
        let report = build_report(&project, &snapshots, &self.config.tags);
        write_report(&report, path)
    }

    fn import_package(&mut self, path: PathBuf) {
        if !self.close_project() {
            return;
        }
        match import_package(self.store.as_mut(), &path) {
            Ok(project) => {
                self.notify(Level::Info, format!("Imported '{}'", project.name));
                self.refresh_projects();
                self.open_project(project.id);
            }
            Err(e) => self.notify(Level::Error, format!("Import failed: {:#}", e)),
        }
    }

    /// Pick up decoded media from the background loader.
    fn poll_loader(&mut self) {
        let Some(open) = self.open.as_mut() else {
            return;
        };
        let Some(loader) = open.loader.as_ref() else {
            return;
        };
        let result = match loader.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => Err(anyhow::anyhow!("media loader stopped")),
        };
        open.loader = None;
        match result {
            Ok(source) => {
                open.player.load(source);
                open.presenter.set_duration(open.player.duration());
                log::info!("Media ready: {:.2}s", open.player.duration());
            }
            Err(e) => {
                let now = self.clock.now();
                self.notifications
                    .push(Level::Error, format!("Could not load media: {}", e), now);
            }
        }
    }

    fn toggle_play(&mut self) {
        let Some(open) = self.open.as_mut() else {
            return;
        };
        if !open.player.is_paused() {
            open.player.pause();
            return;
        }
        match open.lifecycle.exit_editing(self.store.as_mut()) {
            Ok(()) => open.player.play(),
            Err(e) => report_error(&mut self.notifications, self.clock.now(), e),
        }
    }

    fn seek(&mut self, seconds: f64) {
        let Some(open) = self.open.as_mut() else {
            return;
        };
        match open.lifecycle.exit_editing(self.store.as_mut()) {
            Ok(()) => open.player.seek(seconds),
            Err(e) => report_error(&mut self.notifications, self.clock.now(), e),
        }
    }

    /// Jump to a snapshot's frame and open it.
    fn open_snapshot(&mut self, id: SnapshotId) {
        let Some(open) = self.open.as_mut() else {
            return;
        };
        let Some(timestamp) = open.presenter.card(id).map(|c| c.timestamp) else {
            return;
        };
        open.player.pause();
        open.player.seek(timestamp);
        let result = open
            .lifecycle
            .ensure_snapshot_at(self.store.as_mut(), &open.player, timestamp);
        if let Err(e) = result {
            report_error(&mut self.notifications, self.clock.now(), e);
        }
    }

    fn capture(&mut self) {
        let Some(open) = self.open.as_mut() else {
            return;
        };
        let now = open.player.current_time();
        let result = open
            .lifecycle
            .ensure_snapshot_at(self.store.as_mut(), &open.player, now);
        if let Err(e) = result {
            report_error(&mut self.notifications, self.clock.now(), e);
        }
    }

    fn exit_editing(&mut self) {
        let Some(open) = self.open.as_mut() else {
            return;
        };
        if let Err(e) = open.lifecycle.exit_editing(self.store.as_mut()) {
            report_error(&mut self.notifications, self.clock.now(), e);
        }
    }

    fn handle_toolbar(&mut self, action: ToolbarAction) {
        match action {
            ToolbarAction::None => {}
            ToolbarAction::Capture => self.capture(),
            ToolbarAction::ExitEditing => self.exit_editing(),
            ToolbarAction::Undo | ToolbarAction::Redo | ToolbarAction::Clear => {
                self.edit_drawing(action)
            }
        }
    }

    fn edit_drawing(&mut self, action: ToolbarAction) {
        let Some(open) = self.open.as_mut() else {
            return;
        };
        let result = match action {
            ToolbarAction::Undo => open.lifecycle.undo(),
            ToolbarAction::Redo => open.lifecycle.redo(),
            ToolbarAction::Clear => open.lifecycle.clear_drawing(),
            _ => Ok(()),
        };
        if let Err(e) = result {
            report_error(&mut self.notifications, self.clock.now(), e);
        }
    }

    fn handle_properties(&mut self, action: PropertiesAction) {
        let Some(open) = self.open.as_mut() else {
            return;
        };
        let store = self.store.as_mut();
        let result = match action {
            PropertiesAction::None => Ok(()),
            PropertiesAction::CommentChanged => {
                open.lifecycle
                    .edit_comment(store, &open.player, &open.drafts.comment)
            }
            PropertiesAction::ToggleTag(tag) => open
                .lifecycle
                .toggle_tag(store, &open.player, &tag)
                .map(|_| open.drafts.sync_hours(open.lifecycle.tags())),
            PropertiesAction::SetHours { tag, input } => {
                open.lifecycle
                    .set_tag_hours(store, &open.player, &tag, &input)
            }
        };
        if let Err(e) = result {
            if open.lifecycle.active_snapshot_id().is_none() {
                // Nothing could be opened; don't leave orphaned text behind.
                open.drafts.reset("", None);
            }
            report_error(&mut self.notifications, self.clock.now(), e);
        }
    }

    fn handle_cards(&mut self, action: CardAction) {
        let result = match action {
            CardAction::None => return,
            CardAction::Open(id) => return self.open_snapshot(id),
            CardAction::Delete(id) => match self.open.as_mut() {
                Some(open) => open.lifecycle.delete_snapshot(self.store.as_mut(), id),
                None => return,
            },
            CardAction::DeleteAll => match self.open.as_mut() {
                Some(open) => open
                    .lifecycle
                    .delete_all_snapshots(self.store.as_mut())
                    .map(|n| log::info!("Bulk delete removed {} snapshots", n)),
                None => return,
            },
        };
        if let Err(e) = result {
            report_error(&mut self.notifications, self.clock.now(), e);
        }
    }

    fn handle_canvas(&mut self, output: canvas::CanvasOutput) {
        let Some(open) = self.open.as_mut() else {
            return;
        };
        if let Some(size) = output.overlay_size {
            open.lifecycle.resize_surface(size);
        }
        for event in output.events {
            let result = open
                .lifecycle
                .pointer(self.store.as_mut(), &open.player, event);
            if let Err(e) = result {
                report_error(&mut self.notifications, self.clock.now(), e);
                if matches!(event, PointerEvent::Down(_)) {
                    break;
                }
            }
        }
    }

    fn handle_keyboard(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() {
            return;
        }
        if ctx.input(|i| i.key_pressed(egui::Key::Space)) {
            self.toggle_play();
        }
        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.exit_editing();
        }
        let undo = ctx.input(|i| i.modifiers.command && !i.modifiers.shift && i.key_pressed(egui::Key::Z));
        let redo = ctx.input(|i| {
            (i.modifiers.command && i.modifiers.shift && i.key_pressed(egui::Key::Z))
                || (i.modifiers.command && i.key_pressed(egui::Key::Y))
        });
        if undo {
            self.handle_toolbar(ToolbarAction::Undo);
        } else if redo {
            self.handle_toolbar(ToolbarAction::Redo);
        }
    }

    /// Upload the player's frame when it changed.
    fn update_frame_texture(&mut self, ctx: &egui::Context) {
        let Some(open) = self.open.as_mut() else {
            return;
        };
        let Some((frame, revision)) = open.player.frame() else {
            return;
        };
        if open.frame_texture.as_ref().map(|(_, r)| *r) == Some(revision) {
            return;
        }
        let size = [frame.width() as usize, frame.height() as usize];
        let image = egui::ColorImage::from_rgba_unmultiplied(size, frame.as_raw());
        match open.frame_texture.as_mut() {
            Some((texture, r)) => {
                texture.set(image, egui::TextureOptions::LINEAR);
                *r = revision;
            }
            None => {
                let texture = ctx.load_texture("frame", image, egui::TextureOptions::LINEAR);
                open.frame_texture = Some((texture, revision));
            }
        }
    }

    /// Decode thumbnails for new or re-rendered cards.
    fn update_thumbnails(&mut self, ctx: &egui::Context) {
        let Some(open) = self.open.as_mut() else {
            return;
        };
        let max_side = self.config.thumbnail_size;
        for card in open.presenter.cards() {
            if open.thumbnail_revisions.get(&card.id) == Some(&card.revision) {
                continue;
            }
            match render::decode_thumbnail(card.thumbnail.as_bytes(), max_side) {
                Ok(thumb) => {
                    let size = [thumb.width() as usize, thumb.height() as usize];
                    let image = egui::ColorImage::from_rgba_unmultiplied(size, thumb.as_raw());
                    let texture = ctx.load_texture(
                        format!("thumb-{}", card.id.0),
                        image,
                        egui::TextureOptions::LINEAR,
                    );
                    open.thumbnails.insert(card.id, texture);
                }
                Err(e) => log::warn!("Thumbnail for snapshot {} failed: {}", card.id, e),
            }
            open.thumbnail_revisions.insert(card.id, card.revision);
        }
        let live: Vec<SnapshotId> = open.presenter.cards().iter().map(|c| c.id).collect();
        open.thumbnails.retain(|id, _| live.contains(id));
        open.thumbnail_revisions.retain(|id, _| live.contains(id));
    }

    /// Apply lifecycle events and keep the editor fields on the open snapshot.
    fn sync_views(&mut self) {
        let Some(open) = self.open.as_mut() else {
            return;
        };
        for event in open.lifecycle.drain_events() {
            open.presenter.apply(&event);
        }
        let active = open.lifecycle.active_snapshot_id();
        if active != open.drafts_for {
            open.drafts
                .reset(open.lifecycle.comment(), open.lifecycle.tags());
            open.drafts_for = active;
        }
    }

    fn menu_bar(&mut self, ctx: &egui::Context) {
        let has_project = self.open.is_some();
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("New Project from Media...").clicked() {
                        let extensions: Vec<&str> = IMAGE_EXTENSIONS
                            .iter()
                            .chain(VIDEO_EXTENSIONS.iter())
                            .copied()
                            .collect();
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("Media", &extensions)
                            .pick_file()
                        {
                            self.new_project_from_media(path);
                        }
                        ui.close_menu();
                    }
                    if ui.button("Projects...").clicked() {
                        self.refresh_projects();
                        self.show_projects = true;
                        ui.close_menu();
                    }
                    if ui.button("Import Review Package...").clicked() {
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("Review manifest", &["yaml", "yml", "json"])
                            .pick_file()
                        {
                            self.import_package(path);
                        }
                        ui.close_menu();
                    }
                    ui.separator();
                    ui.add_enabled_ui(has_project, |ui| {
                        ui.menu_button("Export Review Package", |ui| {
                            if ui.button("With YAML manifest...").clicked() {
                                self.export_package(DocFormat::Yaml);
                                ui.close_menu();
                            }
                            if ui.button("With JSON manifest...").clicked() {
                                self.export_package(DocFormat::Json);
                                ui.close_menu();
                            }
                        });
                        if ui.button("Export Staffing Report...").clicked() {
                            self.export_report();
                            ui.close_menu();
                        }
                        if ui.button("Close Project").clicked() {
                            self.close_project();
                            ui.close_menu();
                        }
                    });
                    ui.separator();
                    if ui.button("Quit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });

                ui.menu_button("Edit", |ui| {
                    let (can_undo, can_redo, editing) = self.open.as_ref().map_or(
                        (false, false, false),
                        |o| {
                            let surface = o.lifecycle.surface();
                            (
                                surface.can_undo(),
                                surface.can_redo(),
                                o.lifecycle.active_snapshot_id().is_some(),
                            )
                        },
                    );
                    if ui.add_enabled(can_undo, egui::Button::new("Undo (Ctrl+Z)")).clicked() {
                        self.handle_toolbar(ToolbarAction::Undo);
                        ui.close_menu();
                    }
                    if ui
                        .add_enabled(can_redo, egui::Button::new("Redo (Ctrl+Shift+Z)"))
                        .clicked()
                    {
                        self.handle_toolbar(ToolbarAction::Redo);
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.add_enabled(editing, egui::Button::new("Clear Drawing")).clicked() {
                        self.handle_toolbar(ToolbarAction::Clear);
                        ui.close_menu();
                    }
                    if ui.add_enabled(editing, egui::Button::new("Done Editing (Esc)")).clicked() {
                        self.exit_editing();
                        ui.close_menu();
                    }
                });
            });
        });
    }

    fn schedule_repaint(&self, ctx: &egui::Context) {
        let Some(open) = self.open.as_ref() else {
            if !self.notifications.is_empty() {
                ctx.request_repaint_after(Duration::from_millis(250));
            }
            return;
        };
        if !open.player.is_paused() || open.loader.is_some() {
            ctx.request_repaint();
            return;
        }
        if let Some(due) = open.lifecycle.next_deadline() {
            ctx.request_repaint_after(due);
        }
        if !self.notifications.is_empty() {
            ctx.request_repaint_after(Duration::from_millis(250));
        }
    }
}

impl eframe::App for ReelNotesApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = self.clock.now();
        self.notifications.expire(now);
        self.poll_loader();

        if let Some(open) = self.open.as_mut() {
            let dt = (ctx.input(|i| i.stable_dt) as f64).min(MAX_FRAME_DT);
            open.player.advance(dt);
            if let Err(e) = open.lifecycle.tick(self.store.as_mut()) {
                report_error(&mut self.notifications, now, e);
            }
        }
        self.update_frame_texture(ctx);
        self.sync_views();
        self.update_thumbnails(ctx);

        if ctx.input(|i| i.viewport().close_requested()) && !self.allow_close() {
            ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose);
        }

        self.menu_bar(ctx);

        let toolbar_action = match self.open.as_mut() {
            Some(open) => {
                let editing = open.lifecycle.active_snapshot_id().is_some();
                egui::TopBottomPanel::top("toolbar")
                    .show(ctx, |ui| toolbar::show(ui, open.lifecycle.surface_mut(), editing))
                    .inner
            }
            None => ToolbarAction::None,
        };
        self.handle_toolbar(toolbar_action);

        let timeline_action = match self.open.as_ref() {
            Some(open) => {
                let markers = open.presenter.markers();
                egui::TopBottomPanel::bottom("timeline")
                    .show(ctx, |ui| {
                        timeline::show(
                            ui,
                            open.player.current_time(),
                            open.player.duration(),
                            open.player.is_paused(),
                            &markers,
                        )
                    })
                    .inner
            }
            None => TimelineAction::None,
        };
        match timeline_action {
            TimelineAction::None => {}
            TimelineAction::TogglePlay => self.toggle_play(),
            TimelineAction::Seek(t) => self.seek(t),
            TimelineAction::OpenSnapshot(id) => self.open_snapshot(id),
        }

        let hold = self.config.hold_to_confirm();
        let card_action = match self.open.as_ref() {
            Some(open) => {
                egui::SidePanel::left("cards")
                    .default_width(230.0)
                    .show(ctx, |ui| {
                        cards::show(ui, open.presenter.cards(), &open.thumbnails, hold)
                    })
                    .inner
            }
            None => CardAction::None,
        };
        self.handle_cards(card_action);

        let catalog = &self.config.tags;
        let properties_action = match self.open.as_mut() {
            Some(open) => {
                let editing = open
                    .lifecycle
                    .active_snapshot_id()
                    .and_then(|id| open.presenter.card(id))
                    .map(|card| card.timecode.clone());
                let pending = open.lifecycle.has_pending_edits();
                egui::SidePanel::right("properties")
                    .default_width(260.0)
                    .show(ctx, |ui| {
                        properties::show(
                            ui,
                            catalog,
                            open.lifecycle.tags(),
                            &mut open.drafts,
                            editing,
                            pending,
                        )
                    })
                    .inner
            }
            None => PropertiesAction::None,
        };
        self.handle_properties(properties_action);

        let canvas_output = egui::CentralPanel::default()
            .show(ctx, |ui| {
                let open = self.open.as_ref();
                canvas::show(
                    ui,
                    open.and_then(|o| o.frame_texture.as_ref().map(|(t, _)| t)),
                    open.map(|o| o.lifecycle.surface()),
                )
            })
            .inner;
        self.handle_canvas(canvas_output);

        self.handle_keyboard(ctx);

        if self.show_projects {
            let mut window_open = true;
            let current = self.open.as_ref().map(|o| o.project.id);
            let action = projects::show(ctx, &mut window_open, &self.project_list, current, hold);
            self.show_projects = window_open;
            match action {
                ProjectsAction::None => {}
                ProjectsAction::Open(id) => self.open_project(id),
                ProjectsAction::Delete(id) => self.delete_project(id),
            }
        }

        if let Some(id) = toasts::show(ctx, &self.notifications) {
            self.notifications.dismiss(id);
        }

        self.sync_views();
        self.schedule_repaint(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::models::{NewSnapshot, Snapshot};
    use crate::store::MemoryStore;
    use image::{Rgba, RgbaImage};
    use std::cell::Cell;
    use std::rc::Rc;

    /// Memory store whose snapshot writes fail while `offline` is set.
    struct FlakyStore {
        inner: MemoryStore,
        offline: Rc<Cell<bool>>,
    }

    impl Store for FlakyStore {
        fn create_project(&mut self, new: NewProject) -> Result<Project, StoreError> {
            self.inner.create_project(new)
        }
        fn project(&self, id: ProjectId) -> Result<Project, StoreError> {
            self.inner.project(id)
        }
        fn projects(&self) -> Result<Vec<Project>, StoreError> {
            self.inner.projects()
        }
        fn update_project(&mut self, project: &Project) -> Result<(), StoreError> {
            self.inner.update_project(project)
        }
        fn delete_project(&mut self, id: ProjectId) -> Result<(), StoreError> {
            self.inner.delete_project(id)
        }
        fn create_snapshot(&mut self, new: NewSnapshot) -> Result<Snapshot, StoreError> {
            self.inner.create_snapshot(new)
        }
        fn snapshot(&self, id: SnapshotId) -> Result<Snapshot, StoreError> {
            self.inner.snapshot(id)
        }
        fn snapshots_for(&self, project: ProjectId) -> Result<Vec<Snapshot>, StoreError> {
            self.inner.snapshots_for(project)
        }
        fn update_snapshot(&mut self, snapshot: &Snapshot) -> Result<(), StoreError> {
            if self.offline.get() {
                return Err(StoreError::Unavailable("offline".to_string()));
            }
            self.inner.update_snapshot(snapshot)
        }
        fn delete_snapshot(&mut self, id: SnapshotId) -> Result<(), StoreError> {
            self.inner.delete_snapshot(id)
        }
    }

    struct PausedPlayer;

    impl MediaPlayer for PausedPlayer {
        fn has_media(&self) -> bool {
            true
        }
        fn is_paused(&self) -> bool {
            true
        }
        fn current_time(&self) -> f64 {
            1.0
        }
        fn duration(&self) -> f64 {
            10.0
        }
        fn capture_frame(&self) -> crate::error::Result<RgbaImage> {
            Ok(RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 255])))
        }
    }

    fn app_with_unsaved_edit() -> (ReelNotesApp, Rc<Cell<bool>>) {
        let offline = Rc::new(Cell::new(false));
        let mut inner = MemoryStore::new();
        let project = inner
            .create_project(NewProject {
                name: "Demo".to_string(),
                video_file_name: "demo.png".to_string(),
                video_data: Blob::new(vec![0; 4]),
            })
            .unwrap();
        let store = FlakyStore {
            inner,
            offline: Rc::clone(&offline),
        };
        let mut app = ReelNotesApp::new(AppConfig::default(), Box::new(store));
        app.open_project(project.id);
        let open = app.open.as_mut().unwrap();
        open.lifecycle
            .edit_comment(app.store.as_mut(), &PausedPlayer, "not yet saved")
            .unwrap();
        (app, offline)
    }

    #[test]
    fn test_close_refused_while_save_fails() {
        let (mut app, offline) = app_with_unsaved_edit();
        offline.set(true);

        assert!(!app.allow_close());
        let open = app.open.as_ref().unwrap();
        assert!(open.lifecycle.has_pending_edits());
        assert_eq!(open.lifecycle.comment(), "not yet saved");

        // Once the store is back the close saves and goes ahead.
        offline.set(false);
        assert!(app.allow_close());
        assert!(app.open.is_none());
        let project = app.store.projects().unwrap()[0].id;
        let saved = app.store.snapshots_for(project).unwrap();
        assert_eq!(saved[0].comment, "not yet saved");
    }

    #[test]
    fn test_second_close_request_discards_edits() {
        let (mut app, offline) = app_with_unsaved_edit();
        offline.set(true);

        assert!(!app.allow_close());
        assert!(app.allow_close());
    }

    #[test]
    fn test_project_without_media_is_not_opened() {
        let mut store = MemoryStore::new();
        let project = store
            .create_project(NewProject {
                name: "Empty".to_string(),
                video_file_name: "empty.mp4".to_string(),
                video_data: Blob::new(Vec::new()),
            })
            .unwrap();
        let mut app = ReelNotesApp::new(AppConfig::default(), Box::new(store));
        app.open_project(project.id);
        assert!(app.open.is_none());
        assert!(!app.notifications.is_empty());
    }
}

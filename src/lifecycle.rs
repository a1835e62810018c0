// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Snapshot lifecycle manager.
//!
//! The single authority for which snapshot, if any, is being edited, and
//! for turning edits into persisted state. Edits land in a pending buffer
//! that is written after a quiet period (debounce) or immediately at save
//! points: exiting, switching snapshots, deleting.
//!
//! The store and the media player are passed into each operation; the
//! lifecycle owns the drawing surface, the clock and the edit session.
//! Outcomes the presenter cares about are queued as `LifecycleEvent`s.

use crate::error::{ReelError, Result, StoreError};
use crate::io::media::MediaPlayer;
use crate::models::tags::{parse_hours, TagState};
use crate::models::{
    Blob, NewSnapshot, ProjectId, Scene, Snapshot, SnapshotId, SnapshotPatch,
};
use crate::render;
use crate::store::Store;
use crate::surface::{DrawingSurface, PointerEvent};
use crate::util::clock::Clock;
use crate::util::debounce::Debounce;
use crate::util::geometry::Size;
use chrono::Utc;
use image::RgbaImage;
use std::time::Duration;

/// Tunables for lookup and auto-save.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LifecycleConfig {
    /// Snapshots closer than this many seconds are the same snapshot.
    pub tolerance: f64,
    /// Quiet period before pending edits are written.
    pub debounce: Duration,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            tolerance: crate::models::snapshot::TIMESTAMP_TOLERANCE,
            debounce: Duration::from_millis(300),
        }
    }
}

/// Changes the card/timeline presenter reconciles against.
#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleEvent {
    Created(Snapshot),
    Updated(Snapshot),
    Deleted(SnapshotId),
    EditingStarted(SnapshotId),
    EditingEnded(SnapshotId),
}

/// State that exists only while one snapshot is open for editing.
struct EditSession {
    snapshot_id: SnapshotId,
    timestamp: f64,
    /// Decoded original frame, the base of every composite.
    frame: RgbaImage,
    comment: String,
    tags: TagState,
    pending: SnapshotPatch,
}

pub struct Lifecycle {
    project_id: ProjectId,
    config: LifecycleConfig,
    clock: Box<dyn Clock>,
    surface: DrawingSurface,
    session: Option<EditSession>,
    is_creating: bool,
    debounce: Debounce,
    events: Vec<LifecycleEvent>,
}

impl Lifecycle {
    pub fn new(
        project_id: ProjectId,
        config: LifecycleConfig,
        clock: Box<dyn Clock>,
        surface_size: Size,
    ) -> Self {
        Self {
            project_id,
            config,
            clock,
            surface: DrawingSurface::new(surface_size),
            session: None,
            is_creating: false,
            debounce: Debounce::new(config.debounce),
            events: Vec::new(),
        }
    }

    pub fn project_id(&self) -> ProjectId {
        self.project_id
    }

    pub fn active_snapshot_id(&self) -> Option<SnapshotId> {
        self.session.as_ref().map(|s| s.snapshot_id)
    }

    pub fn surface(&self) -> &DrawingSurface {
        &self.surface
    }

    /// Tool and brush changes. Binding stays with the lifecycle.
    pub fn surface_mut(&mut self) -> &mut DrawingSurface {
        &mut self.surface
    }

    /// Comment of the open snapshot (empty when none is open).
    pub fn comment(&self) -> &str {
        self.session.as_ref().map_or("", |s| s.comment.as_str())
    }

    pub fn tags(&self) -> Option<&TagState> {
        self.session.as_ref().map(|s| &s.tags)
    }

    pub fn has_pending_edits(&self) -> bool {
        self.session
            .as_ref()
            .map_or(false, |s| !s.pending.is_empty())
    }

    /// Events accumulated since the last call.
    pub fn drain_events(&mut self) -> Vec<LifecycleEvent> {
        std::mem::take(&mut self.events)
    }

    /// Time until the pending write is due, for scheduling a wake-up.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.debounce.remaining(self.clock.now())
    }

    /// Open the snapshot at `timestamp`, creating it from the current frame
    /// when none exists within tolerance.
    ///
    /// Only a paused player can be annotated. Asking while it plays closes
    /// the open snapshot (saving it) and fails with `MediaNotReady`.
    ///
    /// Creation completes before this returns. `is_creating` is set only
    /// across the store call and rejects a caller that re-enters while the
    /// store is still writing.
    pub fn ensure_snapshot_at(
        &mut self,
        store: &mut dyn Store,
        player: &dyn MediaPlayer,
        timestamp: f64,
    ) -> Result<SnapshotId> {
        if self.is_creating {
            return Err(ReelError::CreationInProgress);
        }
        if !player.has_media() {
            return Err(ReelError::MediaNotReady("no media loaded".into()));
        }
        if !player.is_paused() {
            self.exit_editing(store)?;
            return Err(ReelError::MediaNotReady("pause playback to annotate".into()));
        }
        if let Some(session) = &self.session {
            if (session.timestamp - timestamp).abs() < self.config.tolerance {
                return Ok(session.snapshot_id);
            }
        }

        let existing = store
            .snapshots_for(self.project_id)?
            .into_iter()
            .find(|s| s.matches_time(timestamp, self.config.tolerance));

        // Leaving the current snapshot is a save point.
        self.exit_editing(store)?;

        if let Some(snapshot) = existing {
            let frame = render::decode_image(snapshot.original_image.as_bytes())?;
            let id = snapshot.id;
            self.begin_session(&snapshot, frame);
            return Ok(id);
        }

        let frame = player.capture_frame()?;
        self.is_creating = true;
        let created = self.create_snapshot(store, timestamp, &frame);
        self.is_creating = false;
        let snapshot = created?;

        log::info!(
            "Created snapshot {} at {:.3}s in project {}",
            snapshot.id,
            timestamp,
            self.project_id
        );
        self.touch_project(store);
        self.events.push(LifecycleEvent::Created(snapshot.clone()));
        let id = snapshot.id;
        self.begin_session(&snapshot, frame);
        Ok(id)
    }

    fn create_snapshot(
        &mut self,
        store: &mut dyn Store,
        timestamp: f64,
        frame: &RgbaImage,
    ) -> Result<Snapshot> {
        let png = Blob::new(render::encode_png(frame)?);
        let new = NewSnapshot {
            project_id: self.project_id,
            timestamp,
            original_image: png,
        };
        match store.create_snapshot(new.clone()) {
            Ok(snapshot) => Ok(snapshot),
            Err(first) => {
                log::warn!("Snapshot create failed, retrying once: {}", first);
                Ok(store.create_snapshot(new)?)
            }
        }
    }

    fn begin_session(&mut self, snapshot: &Snapshot, frame: RgbaImage) {
        self.surface
            .bind(snapshot.id, snapshot.drawing_scene.as_ref());
        self.session = Some(EditSession {
            snapshot_id: snapshot.id,
            timestamp: snapshot.timestamp,
            frame,
            comment: snapshot.comment.clone(),
            tags: TagState::from_record(&snapshot.tags, &snapshot.tag_hours),
            pending: SnapshotPatch::default(),
        });
        self.events
            .push(LifecycleEvent::EditingStarted(snapshot.id));
    }

    fn end_session(&mut self) {
        self.debounce.cancel();
        if let Some(session) = self.session.take() {
            self.surface.unbind();
            self.events
                .push(LifecycleEvent::EditingEnded(session.snapshot_id));
        }
    }

    /// Merge `patch` into the pending buffer and restart the quiet period.
    pub fn record_edit(&mut self, patch: SnapshotPatch) -> Result<()> {
        let session = self.session.as_mut().ok_or(ReelError::NoActiveSnapshot)?;
        session.pending.merge(patch);
        self.debounce.schedule(self.clock.now());
        Ok(())
    }

    /// Write pending edits if the quiet period has elapsed.
    pub fn tick(&mut self, store: &mut dyn Store) -> Result<()> {
        if self.debounce.take_due(self.clock.now()) {
            self.flush(store)?;
        }
        Ok(())
    }

    /// Write pending edits now, bypassing the debounce.
    ///
    /// On failure the pending fields stay buffered and are merged with any
    /// later edits; nothing is rescheduled until the next edit or flush.
    pub fn flush(&mut self, store: &mut dyn Store) -> Result<()> {
        self.debounce.cancel();
        let Some(session) = self.session.as_ref() else {
            return Ok(());
        };
        if session.pending.is_empty() {
            return Ok(());
        }

        let id = session.snapshot_id;
        let patch = derive_composite(session)?;
        match write_with_retry(store, id, &patch) {
            Ok(snapshot) => {
                if let Some(session) = self.session.as_mut() {
                    session.pending = SnapshotPatch::default();
                }
                log::debug!("Saved snapshot {}", id);
                self.touch_project(store);
                self.events.push(LifecycleEvent::Updated(snapshot));
                Ok(())
            }
            Err(StoreError::SnapshotNotFound(_)) => {
                log::warn!("Snapshot {} vanished while editing", id);
                self.end_session();
                self.events.push(LifecycleEvent::Deleted(id));
                Err(ReelError::SnapshotNotFound(id))
            }
            Err(e) => {
                log::error!("Saving snapshot {} failed after retry: {}", id, e);
                Err(ReelError::PersistFailure(e))
            }
        }
    }

    /// Flush, then close the open snapshot. When the flush fails the
    /// session stays open so no edit is lost.
    pub fn exit_editing(&mut self, store: &mut dyn Store) -> Result<()> {
        if self.session.is_none() {
            return Ok(());
        }
        self.flush(store)?;
        self.end_session();
        Ok(())
    }

    /// The snapshot at the player position, creating one if needed.
    ///
    /// An open session only counts while the player is paused on it; after
    /// a seek or during playback the edit is resolved against the current
    /// frame instead.
    fn ensure_active(
        &mut self,
        store: &mut dyn Store,
        player: &dyn MediaPlayer,
    ) -> Result<SnapshotId> {
        let time = player.current_time();
        if let Some(session) = &self.session {
            if player.is_paused() && (session.timestamp - time).abs() < self.config.tolerance {
                return Ok(session.snapshot_id);
            }
        }
        self.ensure_snapshot_at(store, player, time)
    }

    pub fn edit_comment(
        &mut self,
        store: &mut dyn Store,
        player: &dyn MediaPlayer,
        comment: &str,
    ) -> Result<()> {
        self.ensure_active(store, player)?;
        if let Some(session) = self.session.as_mut() {
            session.comment = comment.to_string();
        }
        self.record_edit(SnapshotPatch::comment(comment))
    }

    /// Flip a tag on the open snapshot. Returns whether it is now active.
    pub fn toggle_tag(
        &mut self,
        store: &mut dyn Store,
        player: &dyn MediaPlayer,
        tag: &str,
    ) -> Result<bool> {
        self.ensure_active(store, player)?;
        let session = self.session.as_mut().ok_or(ReelError::NoActiveSnapshot)?;
        let active = session.tags.toggle(tag);
        let patch = SnapshotPatch::tags(session.tags.tags(), session.tags.hours_map());
        self.record_edit(patch)?;
        Ok(active)
    }

    /// Apply typed hour input. Invalid input is rejected before anything
    /// is created; blank input with nothing open is a no-op.
    pub fn set_tag_hours(
        &mut self,
        store: &mut dyn Store,
        player: &dyn MediaPlayer,
        tag: &str,
        input: &str,
    ) -> Result<()> {
        let parsed = parse_hours(input)?;
        if parsed.is_none() && self.session.is_none() {
            return Ok(());
        }
        self.ensure_active(store, player)?;
        let session = self.session.as_mut().ok_or(ReelError::NoActiveSnapshot)?;
        session.tags.set_hours(tag, input)?;
        let patch = SnapshotPatch::tags(session.tags.tags(), session.tags.hours_map());
        self.record_edit(patch)
    }

    /// Route pointer input to the surface. Starting to draw resolves the
    /// snapshot at the player position first, creating one if needed.
    pub fn pointer(
        &mut self,
        store: &mut dyn Store,
        player: &dyn MediaPlayer,
        event: PointerEvent,
    ) -> Result<()> {
        if let PointerEvent::Down(_) = event {
            if self.surface.tool().draws() {
                self.ensure_active(store, player)?;
            }
        }
        if self.surface.pointer(event) {
            self.record_scene()?;
        }
        Ok(())
    }

    pub fn undo(&mut self) -> Result<()> {
        if self.surface.undo() {
            self.record_scene()?;
        }
        Ok(())
    }

    pub fn redo(&mut self) -> Result<()> {
        if self.surface.redo() {
            self.record_scene()?;
        }
        Ok(())
    }

    pub fn clear_drawing(&mut self) -> Result<()> {
        if self.surface.clear() {
            self.record_scene()?;
        }
        Ok(())
    }

    fn record_scene(&mut self) -> Result<()> {
        let scene = self.surface.scene().clone();
        self.record_edit(SnapshotPatch::scene(scene))
    }

    /// Resize the drawing surface to the overlay's current pixel size.
    /// The scene is rescaled in place; the stored scene carries its own
    /// size, so nothing needs writing.
    pub fn resize_surface(&mut self, size: Size) -> bool {
        self.surface.resize(size)
    }

    /// Delete one snapshot. Deleting the open one discards its pending
    /// edits once the record is gone; deleting another one saves the open
    /// one first. A failed delete leaves the open session untouched.
    pub fn delete_snapshot(&mut self, store: &mut dyn Store, id: SnapshotId) -> Result<()> {
        let deleting_open = self.active_snapshot_id() == Some(id);
        if !deleting_open {
            self.flush(store)?;
        }

        match delete_with_retry(store, id) {
            Ok(()) => {
                if deleting_open {
                    self.end_session();
                }
                log::info!("Deleted snapshot {}", id);
                self.touch_project(store);
                self.events.push(LifecycleEvent::Deleted(id));
                Ok(())
            }
            Err(StoreError::SnapshotNotFound(_)) => {
                // Already gone; make sure no stale card lingers.
                if deleting_open {
                    self.end_session();
                }
                self.events.push(LifecycleEvent::Deleted(id));
                Err(ReelError::SnapshotNotFound(id))
            }
            Err(e) => {
                log::error!("Deleting snapshot {} failed after retry: {}", id, e);
                Err(ReelError::PersistFailure(e))
            }
        }
    }

    /// Delete every snapshot in the project. Returns how many went.
    ///
    /// The open session is closed only once its own record is deleted, so
    /// a failure part way through keeps its pending edits.
    pub fn delete_all_snapshots(&mut self, store: &mut dyn Store) -> Result<usize> {
        let snapshots = store.snapshots_for(self.project_id)?;
        let mut deleted = 0;
        for snapshot in snapshots {
            match delete_with_retry(store, snapshot.id) {
                Ok(()) | Err(StoreError::SnapshotNotFound(_)) => {
                    if self.active_snapshot_id() == Some(snapshot.id) {
                        self.end_session();
                    }
                    deleted += 1;
                    self.events.push(LifecycleEvent::Deleted(snapshot.id));
                }
                Err(e) => {
                    log::error!(
                        "Deleting snapshots stopped at {} after {} deleted: {}",
                        snapshot.id,
                        deleted,
                        e
                    );
                    self.touch_project(store);
                    return Err(ReelError::PersistFailure(e));
                }
            }
        }
        log::info!("Deleted {} snapshots from project {}", deleted, self.project_id);
        self.touch_project(store);
        Ok(deleted)
    }

    fn touch_project(&self, store: &mut dyn Store) {
        let touched = store.project(self.project_id).and_then(|mut project| {
            project.last_edited_at = Utc::now();
            store.update_project(&project)
        });
        if let Err(e) = touched {
            log::warn!("Could not update project {} edit time: {}", self.project_id, e);
        }
    }
}

/// The pending patch, with the marked-up image regenerated when the scene
/// is part of it.
fn derive_composite(session: &EditSession) -> Result<SnapshotPatch> {
    let mut patch = session.pending.clone();
    if let Some(scene) = &patch.drawing_scene {
        patch.marked_up_image = Some(composite_blob(&session.frame, scene)?);
    }
    Ok(patch)
}

fn composite_blob(frame: &RgbaImage, scene: &Scene) -> Result<Option<Blob>> {
    if scene.is_empty() {
        return Ok(None);
    }
    let image = render::composite(frame, scene);
    Ok(Some(Blob::new(render::encode_png(&image)?)))
}

fn write_patch(
    store: &mut dyn Store,
    id: SnapshotId,
    patch: &SnapshotPatch,
) -> std::result::Result<Snapshot, StoreError> {
    let mut snapshot = store.snapshot(id)?;
    snapshot.apply(patch);
    store.update_snapshot(&snapshot)?;
    Ok(snapshot)
}

fn write_with_retry(
    store: &mut dyn Store,
    id: SnapshotId,
    patch: &SnapshotPatch,
) -> std::result::Result<Snapshot, StoreError> {
    match write_patch(store, id, patch) {
        Err(StoreError::SnapshotNotFound(id)) => Err(StoreError::SnapshotNotFound(id)),
        Err(first) => {
            log::warn!("Save of snapshot {} failed, retrying once: {}", id, first);
            write_patch(store, id, patch)
        }
        ok => ok,
    }
}

fn delete_with_retry(store: &mut dyn Store, id: SnapshotId) -> std::result::Result<(), StoreError> {
    match store.delete_snapshot(id) {
        Err(StoreError::SnapshotNotFound(id)) => Err(StoreError::SnapshotNotFound(id)),
        Err(first) => {
            log::warn!("Delete of snapshot {} failed, retrying once: {}", id, first);
            store.delete_snapshot(id)
        }
        ok => ok,
    }
}

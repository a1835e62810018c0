// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Snapshot records and partial updates.

use super::{Blob, ProjectId, Scene, SnapshotId};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};

/// Two snapshots closer than this (in seconds) are the same logical frame.
pub const TIMESTAMP_TOLERANCE: f64 = 0.1;

/// A captured frame with its markup, comment and tags.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub id: SnapshotId,
    pub project_id: ProjectId,
    /// Seconds from the start of the video.
    pub timestamp: f64,
    /// PNG of the captured frame.
    pub original_image: Blob,
    /// PNG of the frame with the scene flattened on top.
    pub marked_up_image: Option<Blob>,
    pub drawing_scene: Option<Scene>,
    /// Inline-styled markup.
    pub comment: String,
    pub tags: Vec<String>,
    pub tag_hours: BTreeMap<String, f64>,
    pub created_at: DateTime<Utc>,
}

impl Snapshot {
    /// Whether this snapshot sits at `timestamp` within `tolerance`.
    pub fn matches_time(&self, timestamp: f64, tolerance: f64) -> bool {
        (self.timestamp - timestamp).abs() < tolerance
    }

    /// Image used for thumbnails: the marked-up frame when there is one.
    pub fn thumbnail(&self) -> &Blob {
        self.marked_up_image.as_ref().unwrap_or(&self.original_image)
    }

    /// Hour estimates for tags that are actually set, in tag order.
    pub fn visible_hours(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.tags
            .iter()
            .filter_map(|tag| self.tag_hours.get(tag).map(|h| (tag.as_str(), *h)))
    }

    /// Merge a patch and restore the tag invariants.
    pub fn apply(&mut self, patch: &SnapshotPatch) {
        if let Some(comment) = &patch.comment {
            self.comment = comment.clone();
        }
        if let Some(tags) = &patch.tags {
            self.tags = tags.clone();
        }
        if let Some(hours) = &patch.tag_hours {
            self.tag_hours = hours.clone();
        }
        if let Some(scene) = &patch.drawing_scene {
            self.drawing_scene = Some(scene.clone());
        }
        if let Some(image) = &patch.marked_up_image {
            self.marked_up_image = image.clone();
        }
        self.normalize_tags();
    }

    fn normalize_tags(&mut self) {
        let mut seen = BTreeSet::new();
        self.tags.retain(|tag| seen.insert(tag.clone()));
        self.tag_hours
            .retain(|tag, hours| seen.contains(tag) && hours.is_finite() && *hours > 0.0);
    }
}

/// Fields needed to create a snapshot; everything else starts empty.
#[derive(Debug, Clone)]
pub struct NewSnapshot {
    pub project_id: ProjectId,
    pub timestamp: f64,
    pub original_image: Blob,
}

/// A partial update. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapshotPatch {
    pub comment: Option<String>,
    pub tags: Option<Vec<String>>,
    pub tag_hours: Option<BTreeMap<String, f64>>,
    pub drawing_scene: Option<Scene>,
    /// `Some(None)` clears the marked-up image (empty scene).
    pub marked_up_image: Option<Option<Blob>>,
}

impl SnapshotPatch {
    pub fn comment(comment: impl Into<String>) -> Self {
        Self {
            comment: Some(comment.into()),
            ..Default::default()
        }
    }

    pub fn scene(scene: Scene) -> Self {
        Self {
            drawing_scene: Some(scene),
            ..Default::default()
        }
    }

    pub fn tags(tags: Vec<String>, tag_hours: BTreeMap<String, f64>) -> Self {
        Self {
            tags: Some(tags),
            tag_hours: Some(tag_hours),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == SnapshotPatch::default()
    }

    /// Fold a newer patch into this one; newer fields win.
    pub fn merge(&mut self, newer: SnapshotPatch) {
        if newer.comment.is_some() {
            self.comment = newer.comment;
        }
        if newer.tags.is_some() {
            self.tags = newer.tags;
        }
        if newer.tag_hours.is_some() {
            self.tag_hours = newer.tag_hours;
        }
        if newer.drawing_scene.is_some() {
            self.drawing_scene = newer.drawing_scene;
        }
        if newer.marked_up_image.is_some() {
            self.marked_up_image = newer.marked_up_image;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> Snapshot {
        Snapshot {
            id: SnapshotId(1),
            project_id: ProjectId(1),
            timestamp: 2.5,
            original_image: Blob::new(vec![1, 2, 3]),
            marked_up_image: None,
            drawing_scene: None,
            comment: String::new(),
            tags: Vec::new(),
            tag_hours: BTreeMap::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_matches_time_within_tolerance() {
        let snap = snapshot();
        assert!(snap.matches_time(2.55, TIMESTAMP_TOLERANCE));
        assert!(snap.matches_time(2.45, TIMESTAMP_TOLERANCE));
        assert!(!snap.matches_time(2.65, TIMESTAMP_TOLERANCE));
    }

    #[test]
    fn test_apply_drops_duplicate_tags_and_stray_hours() {
        let mut snap = snapshot();
        let mut hours = BTreeMap::new();
        hours.insert("vfx".to_string(), 3.0);
        hours.insert("roto".to_string(), 2.0);
        snap.apply(&SnapshotPatch::tags(
            vec!["vfx".to_string(), "vfx".to_string()],
            hours,
        ));

        assert_eq!(snap.tags, vec!["vfx".to_string()]);
        assert_eq!(snap.tag_hours.len(), 1);
        assert_eq!(snap.tag_hours.get("vfx"), Some(&3.0));
    }

    #[test]
    fn test_visible_hours_ignores_stray_entries() {
        let mut snap = snapshot();
        snap.tags = vec!["comp".to_string()];
        snap.tag_hours.insert("comp".to_string(), 1.5);
        snap.tag_hours.insert("cg".to_string(), 8.0);

        let visible: Vec<_> = snap.visible_hours().collect();
        assert_eq!(visible, vec![("comp", 1.5)]);
    }

    #[test]
    fn test_thumbnail_prefers_marked_up() {
        let mut snap = snapshot();
        assert_eq!(snap.thumbnail().as_bytes(), &[1, 2, 3]);
        snap.marked_up_image = Some(Blob::new(vec![9]));
        assert_eq!(snap.thumbnail().as_bytes(), &[9]);
    }

    #[test]
    fn test_merge_newer_fields_win() {
        let mut pending = SnapshotPatch::comment("first");
        pending.merge(SnapshotPatch::scene(Scene::new(10.0, 10.0)));
        pending.merge(SnapshotPatch::comment("second"));

        assert_eq!(pending.comment.as_deref(), Some("second"));
        assert!(pending.drawing_scene.is_some());
        assert!(pending.tags.is_none());
    }
}

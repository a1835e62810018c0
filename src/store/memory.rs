// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! In-memory store.

use super::{sort_by_timestamp, Store};
use crate::error::StoreError;
use crate::models::{NewProject, NewSnapshot, Project, ProjectId, Snapshot, SnapshotId};
use chrono::Utc;
use std::collections::BTreeMap;

/// Store that keeps every record in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pub(crate) next_project_id: u64,
    pub(crate) next_snapshot_id: u64,
    pub(crate) projects: BTreeMap<ProjectId, Project>,
    pub(crate) snapshots: BTreeMap<SnapshotId, Snapshot>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_project_id(&mut self) -> ProjectId {
        self.next_project_id += 1;
        ProjectId(self.next_project_id)
    }

    fn allocate_snapshot_id(&mut self) -> SnapshotId {
        self.next_snapshot_id += 1;
        SnapshotId(self.next_snapshot_id)
    }
}

impl Store for MemoryStore {
    fn create_project(&mut self, new: NewProject) -> Result<Project, StoreError> {
        let now = Utc::now();
        let project = Project {
            id: self.allocate_project_id(),
            name: new.name,
            video_file_name: new.video_file_name,
            video_data: new.video_data,
            created_at: now,
            last_edited_at: now,
        };
        self.projects.insert(project.id, project.clone());
        Ok(project)
    }

    fn project(&self, id: ProjectId) -> Result<Project, StoreError> {
        self.projects
            .get(&id)
            .cloned()
            .ok_or(StoreError::ProjectNotFound(id))
    }

    fn projects(&self) -> Result<Vec<Project>, StoreError> {
        let mut projects: Vec<Project> = self.projects.values().cloned().collect();
        projects.sort_by(|a, b| b.last_edited_at.cmp(&a.last_edited_at));
        Ok(projects)
    }

    fn update_project(&mut self, project: &Project) -> Result<(), StoreError> {
        let slot = self
            .projects
            .get_mut(&project.id)
            .ok_or(StoreError::ProjectNotFound(project.id))?;
        *slot = project.clone();
        Ok(())
    }

    fn delete_project(&mut self, id: ProjectId) -> Result<(), StoreError> {
        if self.projects.remove(&id).is_none() {
            return Err(StoreError::ProjectNotFound(id));
        }
        self.snapshots.retain(|_, snapshot| snapshot.project_id != id);
        Ok(())
    }

    fn create_snapshot(&mut self, new: NewSnapshot) -> Result<Snapshot, StoreError> {
        if !self.projects.contains_key(&new.project_id) {
            return Err(StoreError::ProjectNotFound(new.project_id));
        }
        let snapshot = Snapshot {
            id: self.allocate_snapshot_id(),
            project_id: new.project_id,
            timestamp: new.timestamp,
            original_image: new.original_image,
            marked_up_image: None,
            drawing_scene: None,
            comment: String::new(),
            tags: Vec::new(),
            tag_hours: BTreeMap::new(),
            created_at: Utc::now(),
        };
        self.snapshots.insert(snapshot.id, snapshot.clone());
        Ok(snapshot)
    }

    fn snapshot(&self, id: SnapshotId) -> Result<Snapshot, StoreError> {
        self.snapshots
            .get(&id)
            .cloned()
            .ok_or(StoreError::SnapshotNotFound(id))
    }

    fn snapshots_for(&self, project: ProjectId) -> Result<Vec<Snapshot>, StoreError> {
        let mut snapshots: Vec<Snapshot> = self
            .snapshots
            .values()
            .filter(|snapshot| snapshot.project_id == project)
            .cloned()
            .collect();
        sort_by_timestamp(&mut snapshots);
        Ok(snapshots)
    }

    fn update_snapshot(&mut self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let slot = self
            .snapshots
            .get_mut(&snapshot.id)
            .ok_or(StoreError::SnapshotNotFound(snapshot.id))?;
        *slot = snapshot.clone();
        Ok(())
    }

    fn delete_snapshot(&mut self, id: SnapshotId) -> Result<(), StoreError> {
        self.snapshots
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::SnapshotNotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Blob;

    fn project(store: &mut MemoryStore, name: &str) -> Project {
        store
            .create_project(NewProject {
                name: name.to_string(),
                video_file_name: format!("{}.mp4", name),
                video_data: Blob::new(vec![0; 16]),
            })
            .unwrap()
    }

    fn snapshot_at(store: &mut MemoryStore, project: ProjectId, timestamp: f64) -> Snapshot {
        store
            .create_snapshot(NewSnapshot {
                project_id: project,
                timestamp,
                original_image: Blob::new(vec![1]),
            })
            .unwrap()
    }

    #[test]
    fn test_ids_auto_increment() {
        let mut store = MemoryStore::new();
        let a = project(&mut store, "a");
        let b = project(&mut store, "b");
        assert_eq!(a.id, ProjectId(1));
        assert_eq!(b.id, ProjectId(2));
    }

    #[test]
    fn test_delete_project_cascades() {
        let mut store = MemoryStore::new();
        let demo = project(&mut store, "demo");
        let other = project(&mut store, "other");
        snapshot_at(&mut store, demo.id, 1.0);
        snapshot_at(&mut store, demo.id, 2.0);
        let kept = snapshot_at(&mut store, other.id, 1.0);

        store.delete_project(demo.id).unwrap();

        assert!(store.snapshots_for(demo.id).unwrap().is_empty());
        assert_eq!(store.snapshots.len(), 1);
        assert!(store.snapshot(kept.id).is_ok());
        assert!(matches!(
            store.project(demo.id),
            Err(StoreError::ProjectNotFound(_))
        ));
    }

    #[test]
    fn test_snapshots_sorted_by_timestamp_then_insertion() {
        let mut store = MemoryStore::new();
        let demo = project(&mut store, "demo");
        let late = snapshot_at(&mut store, demo.id, 5.0);
        let early = snapshot_at(&mut store, demo.id, 1.0);
        let tie = snapshot_at(&mut store, demo.id, 5.0);

        let ids: Vec<_> = store
            .snapshots_for(demo.id)
            .unwrap()
            .iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec![early.id, late.id, tie.id]);
    }

    #[test]
    fn test_snapshot_requires_project() {
        let mut store = MemoryStore::new();
        let result = store.create_snapshot(NewSnapshot {
            project_id: ProjectId(42),
            timestamp: 0.0,
            original_image: Blob::default(),
        });
        assert!(matches!(result, Err(StoreError::ProjectNotFound(_))));
    }

    #[test]
    fn test_update_missing_snapshot_fails() {
        let mut store = MemoryStore::new();
        let demo = project(&mut store, "demo");
        let mut snap = snapshot_at(&mut store, demo.id, 1.0);
        store.delete_snapshot(snap.id).unwrap();
        snap.comment = "late edit".to_string();
        assert!(matches!(
            store.update_snapshot(&snap),
            Err(StoreError::SnapshotNotFound(_))
        ));
    }
}

// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Directory-backed store.
//!
//! Layout under the root directory:
//!
//! ```text
//! index.json                         ids and record documents
//! blobs/project-<id>.media           media bytes
//! blobs/snapshot-<id>-original.png
//! blobs/snapshot-<id>-marked.png
//! ```
//!
//! Every mutation is applied to a copy of the in-memory tables, the
//! affected blobs and the index are written, and only then is the copy
//! swapped in. The index is replaced atomically, so a cascading project
//! delete commits in one write. Orphaned blob files left behind by a crash
//! are harmless and are removed on the next delete of the same id.

use super::{MemoryStore, Store};
use crate::error::StoreError;
use crate::models::{
    Blob, NewProject, NewSnapshot, Project, ProjectId, Scene, Snapshot, SnapshotId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

const INDEX_FILE: &str = "index.json";
const BLOB_DIR: &str = "blobs";

#[derive(Debug, Default, Serialize, Deserialize)]
struct IndexDoc {
    next_project_id: u64,
    next_snapshot_id: u64,
    projects: Vec<ProjectDoc>,
    snapshots: Vec<SnapshotDoc>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectDoc {
    id: ProjectId,
    name: String,
    video_file_name: String,
    created_at: DateTime<Utc>,
    last_edited_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotDoc {
    id: SnapshotId,
    project_id: ProjectId,
    timestamp: f64,
    has_marked_up_image: bool,
    drawing_scene: Option<Scene>,
    comment: String,
    tags: Vec<String>,
    tag_hours: BTreeMap<String, f64>,
    created_at: DateTime<Utc>,
}

/// Store persisted to a directory of JSON and blob files.
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
    tables: MemoryStore,
}

impl FileStore {
    /// Open (or create) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(root.join(BLOB_DIR))?;

        let index_path = root.join(INDEX_FILE);
        let tables = if index_path.exists() {
            let text = fs::read_to_string(&index_path)?;
            let index: IndexDoc = serde_json::from_str(&text)?;
            load_tables(&root, index)?
        } else {
            MemoryStore::new()
        };

        log::info!(
            "Opened store at {} ({} projects, {} snapshots)",
            root.display(),
            tables.projects.len(),
            tables.snapshots.len()
        );
        Ok(Self { root, tables })
    }

    fn blob_path(&self, name: &str) -> PathBuf {
        self.root.join(BLOB_DIR).join(name)
    }

    fn commit(&mut self, next: MemoryStore) -> Result<(), StoreError> {
        let index = IndexDoc {
            next_project_id: next.next_project_id,
            next_snapshot_id: next.next_snapshot_id,
            projects: next.projects.values().map(project_doc).collect(),
            snapshots: next.snapshots.values().map(snapshot_doc).collect(),
        };
        let json = serde_json::to_vec_pretty(&index)?;
        write_atomic(&self.root.join(INDEX_FILE), &json)?;
        self.tables = next;
        Ok(())
    }

    fn remove_blob(&self, name: &str) {
        let path = self.blob_path(name);
        if let Err(e) = fs::remove_file(&path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                log::warn!("Failed to remove blob {}: {}", path.display(), e);
            }
        }
    }

    fn remove_snapshot_blobs(&self, id: SnapshotId) {
        self.remove_blob(&original_name(id));
        self.remove_blob(&marked_name(id));
    }
}

impl Store for FileStore {
    fn create_project(&mut self, new: NewProject) -> Result<Project, StoreError> {
        let mut next = self.tables.clone();
        let project = next.create_project(new)?;
        write_atomic(
            &self.blob_path(&media_name(project.id)),
            project.video_data.as_bytes(),
        )?;
        self.commit(next)?;
        Ok(project)
    }

    fn project(&self, id: ProjectId) -> Result<Project, StoreError> {
        self.tables.project(id)
    }

    fn projects(&self) -> Result<Vec<Project>, StoreError> {
        self.tables.projects()
    }

    fn update_project(&mut self, project: &Project) -> Result<(), StoreError> {
        let mut next = self.tables.clone();
        let previous = next.project(project.id)?;
        next.update_project(project)?;
        if previous.video_data != project.video_data {
            write_atomic(
                &self.blob_path(&media_name(project.id)),
                project.video_data.as_bytes(),
            )?;
        }
        self.commit(next)
    }

    fn delete_project(&mut self, id: ProjectId) -> Result<(), StoreError> {
        let doomed: Vec<SnapshotId> = self
            .tables
            .snapshots
            .values()
            .filter(|s| s.project_id == id)
            .map(|s| s.id)
            .collect();
        let mut next = self.tables.clone();
        next.delete_project(id)?;
        self.commit(next)?;

        self.remove_blob(&media_name(id));
        for snapshot in doomed {
            self.remove_snapshot_blobs(snapshot);
        }
        Ok(())
    }

    fn create_snapshot(&mut self, new: NewSnapshot) -> Result<Snapshot, StoreError> {
        let mut next = self.tables.clone();
        let snapshot = next.create_snapshot(new)?;
        write_atomic(
            &self.blob_path(&original_name(snapshot.id)),
            snapshot.original_image.as_bytes(),
        )?;
        self.commit(next)?;
        Ok(snapshot)
    }

    fn snapshot(&self, id: SnapshotId) -> Result<Snapshot, StoreError> {
        self.tables.snapshot(id)
    }

    fn snapshots_for(&self, project: ProjectId) -> Result<Vec<Snapshot>, StoreError> {
        self.tables.snapshots_for(project)
    }

    fn update_snapshot(&mut self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let mut next = self.tables.clone();
        let previous = next.snapshot(snapshot.id)?;
        next.update_snapshot(snapshot)?;
        if previous.marked_up_image != snapshot.marked_up_image {
            if let Some(image) = &snapshot.marked_up_image {
                write_atomic(&self.blob_path(&marked_name(snapshot.id)), image.as_bytes())?;
            }
        }
        self.commit(next)?;
        if snapshot.marked_up_image.is_none() && previous.marked_up_image.is_some() {
            self.remove_blob(&marked_name(snapshot.id));
        }
        Ok(())
    }

    fn delete_snapshot(&mut self, id: SnapshotId) -> Result<(), StoreError> {
        let mut next = self.tables.clone();
        next.delete_snapshot(id)?;
        self.commit(next)?;
        self.remove_snapshot_blobs(id);
        Ok(())
    }
}

fn media_name(id: ProjectId) -> String {
    format!("project-{}.media", id.0)
}

fn original_name(id: SnapshotId) -> String {
    format!("snapshot-{}-original.png", id.0)
}

fn marked_name(id: SnapshotId) -> String {
    format!("snapshot-{}-marked.png", id.0)
}

fn project_doc(project: &Project) -> ProjectDoc {
    ProjectDoc {
        id: project.id,
        name: project.name.clone(),
        video_file_name: project.video_file_name.clone(),
        created_at: project.created_at,
        last_edited_at: project.last_edited_at,
    }
}

fn snapshot_doc(snapshot: &Snapshot) -> SnapshotDoc {
    SnapshotDoc {
        id: snapshot.id,
        project_id: snapshot.project_id,
        timestamp: snapshot.timestamp,
        has_marked_up_image: snapshot.marked_up_image.is_some(),
        drawing_scene: snapshot.drawing_scene.clone(),
        comment: snapshot.comment.clone(),
        tags: snapshot.tags.clone(),
        tag_hours: snapshot.tag_hours.clone(),
        created_at: snapshot.created_at,
    }
}

fn read_blob(root: &Path, name: &str) -> Result<Blob, StoreError> {
    Ok(Blob::new(fs::read(root.join(BLOB_DIR).join(name))?))
}

fn load_tables(root: &Path, index: IndexDoc) -> Result<MemoryStore, StoreError> {
    let mut tables = MemoryStore {
        next_project_id: index.next_project_id,
        next_snapshot_id: index.next_snapshot_id,
        ..MemoryStore::default()
    };

    for doc in index.projects {
        let project = Project {
            video_data: read_blob(root, &media_name(doc.id))?,
            id: doc.id,
            name: doc.name,
            video_file_name: doc.video_file_name,
            created_at: doc.created_at,
            last_edited_at: doc.last_edited_at,
        };
        tables.projects.insert(project.id, project);
    }

    for doc in index.snapshots {
        if !tables.projects.contains_key(&doc.project_id) {
            log::warn!("Skipping orphaned snapshot {} in index", doc.id);
            continue;
        }
        let marked_up_image = if doc.has_marked_up_image {
            Some(read_blob(root, &marked_name(doc.id))?)
        } else {
            None
        };
        let snapshot = Snapshot {
            original_image: read_blob(root, &original_name(doc.id))?,
            marked_up_image,
            id: doc.id,
            project_id: doc.project_id,
            timestamp: doc.timestamp,
            drawing_scene: doc.drawing_scene,
            comment: doc.comment,
            tags: doc.tags,
            tag_hours: doc.tag_hours,
            created_at: doc.created_at,
        };
        tables.snapshots.insert(snapshot.id, snapshot);
    }

    Ok(tables)
}

/// Write through a temp file and rename over the target.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let tmp = path.with_extension("tmp");
    {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SnapshotPatch;

    fn demo_project(store: &mut FileStore) -> Project {
        store
            .create_project(NewProject {
                name: "Demo".to_string(),
                video_file_name: "demo.png".to_string(),
                video_data: Blob::new(vec![7; 32]),
            })
            .unwrap()
    }

    fn add_snapshot(store: &mut FileStore, project: ProjectId, timestamp: f64) -> Snapshot {
        store
            .create_snapshot(NewSnapshot {
                project_id: project,
                timestamp,
                original_image: Blob::new(vec![1, 2, 3]),
            })
            .unwrap()
    }

    #[test]
    fn test_records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let (project_id, snapshot_id) = {
            let mut store = FileStore::open(dir.path()).unwrap();
            let project = demo_project(&mut store);
            let mut snap = add_snapshot(&mut store, project.id, 2.5);
            let mut hours = BTreeMap::new();
            hours.insert("vfx".to_string(), 3.0);
            snap.apply(&SnapshotPatch::tags(vec!["vfx".to_string()], hours));
            snap.marked_up_image = Some(Blob::new(vec![4, 5]));
            store.update_snapshot(&snap).unwrap();
            (project.id, snap.id)
        };

        let store = FileStore::open(dir.path()).unwrap();
        let project = store.project(project_id).unwrap();
        assert_eq!(project.video_data.len(), 32);

        let snap = store.snapshot(snapshot_id).unwrap();
        assert_eq!(snap.timestamp, 2.5);
        assert_eq!(snap.tags, vec!["vfx".to_string()]);
        assert_eq!(snap.tag_hours.get("vfx"), Some(&3.0));
        assert_eq!(snap.marked_up_image.unwrap().as_bytes(), &[4, 5]);
        assert_eq!(snap.original_image.as_bytes(), &[1, 2, 3]);
    }

    #[test]
    fn test_ids_continue_after_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut store = FileStore::open(dir.path()).unwrap();
            let project = demo_project(&mut store);
            store.delete_project(project.id).unwrap();
        }
        let mut store = FileStore::open(dir.path()).unwrap();
        let project = demo_project(&mut store);
        assert_eq!(project.id, ProjectId(2));
    }

    #[test]
    fn test_delete_project_cascades_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::open(dir.path()).unwrap();
        let project = demo_project(&mut store);
        let snap = add_snapshot(&mut store, project.id, 1.0);
        add_snapshot(&mut store, project.id, 2.0);

        store.delete_project(project.id).unwrap();

        assert!(store.snapshots_for(project.id).unwrap().is_empty());
        assert!(!dir.path().join(BLOB_DIR).join(original_name(snap.id)).exists());
        assert!(!dir.path().join(BLOB_DIR).join(media_name(project.id)).exists());

        let reopened = FileStore::open(dir.path()).unwrap();
        assert!(reopened.projects().unwrap().is_empty());
        assert!(reopened.snapshots_for(project.id).unwrap().is_empty());
    }

    #[test]
    fn test_clearing_markup_removes_blob() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::open(dir.path()).unwrap();
        let project = demo_project(&mut store);
        let mut snap = add_snapshot(&mut store, project.id, 1.0);
        snap.marked_up_image = Some(Blob::new(vec![9]));
        store.update_snapshot(&snap).unwrap();
        assert!(dir.path().join(BLOB_DIR).join(marked_name(snap.id)).exists());

        snap.marked_up_image = None;
        store.update_snapshot(&snap).unwrap();
        assert!(!dir.path().join(BLOB_DIR).join(marked_name(snap.id)).exists());
    }

    #[test]
    fn test_failed_update_leaves_tables_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::open(dir.path()).unwrap();
        let project = demo_project(&mut store);
        let mut snap = add_snapshot(&mut store, project.id, 1.0);
        store.delete_snapshot(snap.id).unwrap();

        snap.comment = "orphan".to_string();
        assert!(store.update_snapshot(&snap).is_err());
        assert!(store.snapshots_for(project.id).unwrap().is_empty());
    }
}

// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Review packages: a project exported to a plain directory.
//!
//! ```text
//! review.yaml | review.json      manifest
//! <media file>
//! frames/snapshot-NNN-original.png
//! frames/snapshot-NNN-marked.png
//! ```
//!
//! Export reads records and blobs only. Import goes through the normal
//! store operations: create the project, then create each snapshot and
//! write its annotations.

use super::serialization::{export_document, import_document, DocFormat};
use crate::models::{Blob, NewProject, NewSnapshot, Project, ProjectId, Scene, SnapshotPatch};
use crate::store::Store;
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const PACKAGE_VERSION: u32 = 1;
const FRAMES_DIR: &str = "frames";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewManifest {
    pub version: u32,
    pub project: ManifestProject,
    pub snapshots: Vec<ManifestSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestProject {
    pub name: String,
    pub video_file: String,
    pub created_at: DateTime<Utc>,
    pub last_edited_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestSnapshot {
    pub timestamp: f64,
    pub original_image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marked_up_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drawing_scene: Option<Scene>,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub tag_hours: BTreeMap<String, f64>,
    pub created_at: DateTime<Utc>,
}

/// Export a project into `dir`. Returns the manifest path.
pub fn export_package(
    store: &dyn Store,
    project_id: ProjectId,
    dir: &Path,
    format: DocFormat,
) -> Result<PathBuf> {
    let project = store.project(project_id)?;
    let snapshots = store.snapshots_for(project_id)?;
    fs::create_dir_all(dir.join(FRAMES_DIR))?;

    let video_file = safe_file_name(&project.video_file_name)?;
    fs::write(dir.join(&video_file), project.video_data.as_bytes())?;

    let mut entries = Vec::with_capacity(snapshots.len());
    for (index, snapshot) in snapshots.iter().enumerate() {
        let stem = format!("snapshot-{:03}", index + 1);
        let original = format!("{}/{}-original.png", FRAMES_DIR, stem);
        fs::write(dir.join(&original), snapshot.original_image.as_bytes())?;

        let marked = match &snapshot.marked_up_image {
            Some(image) => {
                let name = format!("{}/{}-marked.png", FRAMES_DIR, stem);
                fs::write(dir.join(&name), image.as_bytes())?;
                Some(name)
            }
            None => None,
        };

        entries.push(ManifestSnapshot {
            timestamp: snapshot.timestamp,
            original_image: original,
            marked_up_image: marked,
            drawing_scene: snapshot.drawing_scene.clone(),
            comment: snapshot.comment.clone(),
            tags: snapshot.tags.clone(),
            tag_hours: snapshot
                .visible_hours()
                .map(|(tag, hours)| (tag.to_string(), hours))
                .collect(),
            created_at: snapshot.created_at,
        });
    }

    let manifest = ReviewManifest {
        version: PACKAGE_VERSION,
        project: ManifestProject {
            name: project.name.clone(),
            video_file,
            created_at: project.created_at,
            last_edited_at: project.last_edited_at,
        },
        snapshots: entries,
    };
    let manifest_path = dir.join(format!("review.{}", format.extension()));
    export_document(&manifest, &manifest_path)?;
    log::info!(
        "Exported {} snapshots of '{}' to {}",
        manifest.snapshots.len(),
        project.name,
        manifest_path.display()
    );
    Ok(manifest_path)
}

/// Import a package from its manifest file as a new project.
pub fn import_package(store: &mut dyn Store, manifest_path: &Path) -> Result<Project> {
    let manifest: ReviewManifest = import_document(manifest_path)
        .with_context(|| format!("reading {}", manifest_path.display()))?;
    if manifest.version > PACKAGE_VERSION {
        bail!(
            "package version {} is newer than supported version {}",
            manifest.version,
            PACKAGE_VERSION
        );
    }
    let dir = manifest_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();

    let video_file = safe_file_name(&manifest.project.video_file)?;
    let project = store.create_project(NewProject {
        name: manifest.project.name.clone(),
        video_file_name: video_file.clone(),
        video_data: Blob::new(fs::read(dir.join(&video_file))?),
    })?;

    if let Err(e) = import_snapshots(store, project.id, &dir, &manifest.snapshots) {
        // Leave no half-imported project behind.
        if let Err(cleanup) = store.delete_project(project.id) {
            log::error!(
                "Could not remove partially imported project {}: {}",
                project.id,
                cleanup
            );
        }
        return Err(e);
    }

    log::info!(
        "Imported '{}' with {} snapshots",
        project.name,
        manifest.snapshots.len()
    );
    Ok(project)
}

fn import_snapshots(
    store: &mut dyn Store,
    project_id: ProjectId,
    dir: &Path,
    entries: &[ManifestSnapshot],
) -> Result<()> {
    for entry in entries {
        let original = read_package_file(dir, &entry.original_image)?;
        let mut snapshot = store.create_snapshot(NewSnapshot {
            project_id,
            timestamp: entry.timestamp,
            original_image: original,
        })?;
        let marked = entry
            .marked_up_image
            .as_deref()
            .map(|name| read_package_file(dir, name))
            .transpose()?;
        snapshot.apply(&SnapshotPatch {
            comment: Some(entry.comment.clone()),
            tags: Some(entry.tags.clone()),
            tag_hours: Some(entry.tag_hours.clone()),
            drawing_scene: entry.drawing_scene.clone(),
            marked_up_image: Some(marked),
        });
        store.update_snapshot(&snapshot)?;
    }
    Ok(())
}

/// Reject names that would escape the package directory.
fn safe_file_name(name: &str) -> Result<String> {
    let path = Path::new(name);
    match path.file_name() {
        Some(file) if file == path.as_os_str() => Ok(name.to_string()),
        _ => bail!("invalid file name in package: {:?}", name),
    }
}

fn read_package_file(dir: &Path, relative: &str) -> Result<Blob> {
    let path = Path::new(relative);
    let inside = path.components().all(|c| matches!(c, std::path::Component::Normal(_)));
    if !inside {
        bail!("invalid path in package: {:?}", relative);
    }
    let bytes = fs::read(dir.join(path)).with_context(|| format!("reading {}", relative))?;
    Ok(Blob::new(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::scene::{Geometry, Point, Shape, Stroke};
    use crate::store::MemoryStore;

    fn populated_store() -> (MemoryStore, ProjectId) {
        let mut store = MemoryStore::new();
        let project = store
            .create_project(NewProject {
                name: "Demo".to_string(),
                video_file_name: "demo.mp4".to_string(),
                video_data: Blob::new(vec![3; 10]),
            })
            .unwrap();
        for (timestamp, tag, hours) in [(5.0, "comp", 2.0), (1.0, "vfx", 3.0)] {
            let mut snap = store
                .create_snapshot(NewSnapshot {
                    project_id: project.id,
                    timestamp,
                    original_image: Blob::new(vec![timestamp as u8]),
                })
                .unwrap();
            let mut scene = Scene::new(100.0, 50.0);
            scene.shapes.push(Shape::new(
                Geometry::Line {
                    from: Point::new(0.0, 0.0),
                    to: Point::new(10.0, 10.0),
                },
                Stroke::default(),
            ));
            let mut tag_hours = BTreeMap::new();
            tag_hours.insert(tag.to_string(), hours);
            snap.apply(&SnapshotPatch {
                comment: Some(format!("<b>note</b> at {}", timestamp)),
                tags: Some(vec![tag.to_string()]),
                tag_hours: Some(tag_hours),
                drawing_scene: Some(scene),
                marked_up_image: Some(Some(Blob::new(vec![99]))),
            });
            store.update_snapshot(&snap).unwrap();
        }
        (store, project.id)
    }

    #[test]
    fn test_export_then_import_recreates_project() {
        let (store, project_id) = populated_store();
        let dir = tempfile::tempdir().unwrap();
        let manifest = export_package(&store, project_id, dir.path(), DocFormat::Yaml).unwrap();
        assert!(manifest.ends_with("review.yaml"));
        assert!(dir.path().join("demo.mp4").exists());

        let mut target = MemoryStore::new();
        let project = import_package(&mut target, &manifest).unwrap();
        assert_eq!(project.name, "Demo");
        assert_eq!(project.video_data.len(), 10);

        let imported = target.snapshots_for(project.id).unwrap();
        assert_eq!(imported.len(), 2);
        assert_eq!(imported[0].timestamp, 1.0);
        assert_eq!(imported[0].tags, vec!["vfx".to_string()]);
        assert_eq!(imported[0].tag_hours.get("vfx"), Some(&3.0));
        assert_eq!(imported[0].comment, "<b>note</b> at 1");
        assert_eq!(imported[1].marked_up_image.as_ref().unwrap().as_bytes(), &[99]);
        assert_eq!(imported[1].drawing_scene.as_ref().unwrap().shapes.len(), 1);
    }

    #[test]
    fn test_manifest_lists_snapshots_in_timestamp_order() {
        let (store, project_id) = populated_store();
        let dir = tempfile::tempdir().unwrap();
        let path = export_package(&store, project_id, dir.path(), DocFormat::Json).unwrap();
        let manifest: ReviewManifest = import_document(&path).unwrap();
        let times: Vec<f64> = manifest.snapshots.iter().map(|s| s.timestamp).collect();
        assert_eq!(times, vec![1.0, 5.0]);
        assert_eq!(manifest.snapshots[0].original_image, "frames/snapshot-001-original.png");
    }

    #[test]
    fn test_import_rejects_escaping_paths() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = ReviewManifest {
            version: PACKAGE_VERSION,
            project: ManifestProject {
                name: "Evil".to_string(),
                video_file: "../../etc/passwd".to_string(),
                created_at: Utc::now(),
                last_edited_at: Utc::now(),
            },
            snapshots: Vec::new(),
        };
        let path = dir.path().join("review.json");
        export_document(&manifest, &path).unwrap();

        let mut store = MemoryStore::new();
        assert!(import_package(&mut store, &path).is_err());
        assert!(store.projects().unwrap().is_empty());
    }

    #[test]
    fn test_failed_import_leaves_no_project() {
        let (store, project_id) = populated_store();
        let dir = tempfile::tempdir().unwrap();
        let manifest = export_package(&store, project_id, dir.path(), DocFormat::Yaml).unwrap();
        // Second frame goes missing after the first one imports fine.
        fs::remove_file(dir.path().join("frames/snapshot-002-original.png")).unwrap();

        let mut target = MemoryStore::new();
        assert!(import_package(&mut target, &manifest).is_err());
        assert!(target.projects().unwrap().is_empty());
    }

    #[test]
    fn test_import_rejects_newer_version() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = ReviewManifest {
            version: PACKAGE_VERSION + 1,
            project: ManifestProject {
                name: "Future".to_string(),
                video_file: "f.mp4".to_string(),
                created_at: Utc::now(),
                last_edited_at: Utc::now(),
            },
            snapshots: Vec::new(),
        };
        let path = dir.path().join("review.yaml");
        export_document(&manifest, &path).unwrap();
        assert!(import_package(&mut MemoryStore::new(), &path).is_err());
    }
}

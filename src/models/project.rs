// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Project records.
//!
//! A project owns one media file and all snapshots taken from it.

use super::{Blob, ProjectId};
use chrono::{DateTime, Utc};
use std::path::Path;

/// A persisted project.
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub video_file_name: String,
    pub video_data: Blob,
    pub created_at: DateTime<Utc>,
    pub last_edited_at: DateTime<Utc>,
}

/// Fields needed to create a project; the store assigns id and times.
#[derive(Debug, Clone)]
pub struct NewProject {
    pub name: String,
    pub video_file_name: String,
    pub video_data: Blob,
}

impl NewProject {
    /// Build a project for a media file, named after the file stem.
    pub fn from_media(path: &Path, video_data: Blob) -> Self {
        let video_file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "untitled".to_string());
        let name = path
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| video_file_name.clone());
        Self {
            name,
            video_file_name,
            video_data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_project_named_after_file_stem() {
        let project = NewProject::from_media(Path::new("/tmp/shots/sh010_v002.mov"), Blob::default());
        assert_eq!(project.name, "sh010_v002");
        assert_eq!(project.video_file_name, "sh010_v002.mov");
    }
}

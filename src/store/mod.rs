// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Persistent document store for projects and snapshots.
//!
//! Records are addressed by auto-incrementing ids. `MemoryStore` keeps
//! everything in memory; `FileStore` layers a directory on disk over it.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::StoreError;
use crate::models::{NewProject, NewSnapshot, Project, ProjectId, Snapshot, SnapshotId};

/// Create/get/list/update/delete for both collections.
pub trait Store {
    fn create_project(&mut self, new: NewProject) -> Result<Project, StoreError>;

    fn project(&self, id: ProjectId) -> Result<Project, StoreError>;

    /// All projects, most recently edited first.
    fn projects(&self) -> Result<Vec<Project>, StoreError>;

    fn update_project(&mut self, project: &Project) -> Result<(), StoreError>;

    /// Delete a project together with every snapshot that belongs to it.
    fn delete_project(&mut self, id: ProjectId) -> Result<(), StoreError>;

    /// Fails with `ProjectNotFound` when the owning project is missing.
    fn create_snapshot(&mut self, new: NewSnapshot) -> Result<Snapshot, StoreError>;

    fn snapshot(&self, id: SnapshotId) -> Result<Snapshot, StoreError>;

    /// Snapshots of a project sorted by timestamp, ties in insertion order.
    fn snapshots_for(&self, project: ProjectId) -> Result<Vec<Snapshot>, StoreError>;

    fn update_snapshot(&mut self, snapshot: &Snapshot) -> Result<(), StoreError>;

    fn delete_snapshot(&mut self, id: SnapshotId) -> Result<(), StoreError>;
}

/// Order snapshots by timestamp, falling back to id (insertion order).
pub fn sort_by_timestamp(snapshots: &mut [Snapshot]) {
    snapshots.sort_by(|a, b| {
        a.timestamp
            .total_cmp(&b.timestamp)
            .then_with(|| a.id.cmp(&b.id))
    });
}

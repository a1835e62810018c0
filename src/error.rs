// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Typed errors for the store and the snapshot lifecycle.
//!
//! The UI edge wraps these in `anyhow`; everything below the app speaks
//! `ReelError` or `StoreError` so callers can decide which failures become
//! notifications and which are silently dropped.

use crate::models::{ProjectId, SnapshotId};
use thiserror::Error;

/// Errors raised by a persistent store implementation.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("project {0} not found")]
    ProjectNotFound(ProjectId),

    #[error("snapshot {0} not found")]
    SnapshotNotFound(SnapshotId),

    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store index is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    /// The backing store refused the operation (e.g. read-only or gone).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised by the snapshot lifecycle and its collaborators.
#[derive(Error, Debug)]
pub enum ReelError {
    /// No media loaded, or a capture was attempted while playing.
    #[error("media not ready: {0}")]
    MediaNotReady(String),

    #[error("snapshot {0} no longer exists")]
    SnapshotNotFound(SnapshotId),

    #[error("no snapshot is being edited")]
    NoActiveSnapshot,

    #[error("a snapshot is already being created")]
    CreationInProgress,

    /// A store write or read failed after its retry.
    #[error("could not save: {0}")]
    PersistFailure(#[source] StoreError),

    #[error("invalid hour value {0:?}")]
    InvalidTagHours(String),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

impl From<StoreError> for ReelError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::SnapshotNotFound(id) => ReelError::SnapshotNotFound(id),
            other => ReelError::PersistFailure(other),
        }
    }
}

pub type Result<T, E = ReelError> = std::result::Result<T, E>;

// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! UI components for the ReelNotes application.

pub mod canvas;
pub mod cards;
pub mod projects;
pub mod properties;
pub mod timeline;
pub mod toasts;
pub mod toolbar;
pub mod widgets;

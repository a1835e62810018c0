// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Small utilities shared by the core and the UI.

pub mod clock;
pub mod debounce;
pub mod geometry;
pub mod timecode;

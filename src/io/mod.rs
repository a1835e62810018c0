// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Media decoding and document files: review packages and reports.

pub mod media;
pub mod package;
pub mod report;
pub mod serialization;

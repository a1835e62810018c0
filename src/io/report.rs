// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Staffing report: hour estimates rolled up per department.

use super::serialization::export_document;
use crate::models::tags::TagDef;
use crate::models::{Project, Snapshot};
use crate::presenter::comment_preview;
use crate::util::timecode::format_timecode;
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

const REPORT_PREVIEW_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StaffingReport {
    pub project: String,
    pub video_file: String,
    pub generated_at: DateTime<Utc>,
    pub snapshot_count: usize,
    pub total_hours: f64,
    pub departments: Vec<DepartmentTotal>,
    pub shots: Vec<ReportRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepartmentTotal {
    pub tag: String,
    pub label: String,
    pub hours: f64,
    /// Snapshots carrying this tag, with or without an estimate.
    pub snapshots: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub timecode: String,
    pub timestamp: f64,
    pub tags: Vec<String>,
    pub hours: BTreeMap<String, f64>,
    pub comment: String,
}

/// Roll up a project's snapshots.
///
/// Departments follow catalog order; tags unknown to the catalog come
/// last, alphabetically, labelled with their id. Hours recorded for tags
/// that are not set are ignored.
pub fn build_report(project: &Project, snapshots: &[Snapshot], catalog: &[TagDef]) -> StaffingReport {
    let mut totals: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    let mut shots = Vec::with_capacity(snapshots.len());

    for snapshot in snapshots {
        for tag in &snapshot.tags {
            totals.entry(tag.as_str()).or_default().1 += 1;
        }
        let hours: BTreeMap<String, f64> = snapshot
            .visible_hours()
            .map(|(tag, h)| (tag.to_string(), h))
            .collect();
        for (tag, h) in &hours {
            if let Some(entry) = totals.get_mut(tag.as_str()) {
                entry.0 += h;
            }
        }
        shots.push(ReportRow {
            timecode: format_timecode(snapshot.timestamp),
            timestamp: snapshot.timestamp,
            tags: snapshot.tags.clone(),
            hours,
            comment: comment_preview(&snapshot.comment, REPORT_PREVIEW_CHARS),
        });
    }

    let mut departments = Vec::with_capacity(totals.len());
    for def in catalog {
        if let Some((hours, count)) = totals.remove(def.id.as_str()) {
            departments.push(DepartmentTotal {
                tag: def.id.clone(),
                label: def.label.clone(),
                hours,
                snapshots: count,
            });
        }
    }
    departments.extend(totals.into_iter().map(|(tag, (hours, count))| DepartmentTotal {
        tag: tag.to_string(),
        label: tag.to_string(),
        hours,
        snapshots: count,
    }));

    StaffingReport {
        project: project.name.clone(),
        video_file: project.video_file_name.clone(),
        generated_at: Utc::now(),
        snapshot_count: snapshots.len(),
        total_hours: departments.iter().map(|d| d.hours).sum(),
        departments,
        shots,
    }
}

/// Write a report as YAML or JSON depending on the extension.
pub fn write_report(report: &StaffingReport, path: &Path) -> Result<()> {
    export_document(report, path)?;
    log::info!(
        "Wrote staffing report for '{}' ({:.1}h) to {}",
        report.project,
        report.total_hours,
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tags::default_catalog;
    use crate::models::{Blob, ProjectId, SnapshotId};

    fn project() -> Project {
        Project {
            id: ProjectId(1),
            name: "Reel".to_string(),
            video_file_name: "reel.mov".to_string(),
            video_data: Blob::new(Vec::new()),
            created_at: Utc::now(),
            last_edited_at: Utc::now(),
        }
    }

    fn snapshot(id: u64, timestamp: f64, tags: &[&str], hours: &[(&str, f64)]) -> Snapshot {
        Snapshot {
            id: SnapshotId(id),
            project_id: ProjectId(1),
            timestamp,
            original_image: Blob::new(vec![0]),
            marked_up_image: None,
            drawing_scene: None,
            comment: "<p>Fix the <i>sky</i></p>".to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            tag_hours: hours.iter().map(|(t, h)| (t.to_string(), *h)).collect(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_totals_per_department() {
        let snapshots = vec![
            snapshot(1, 1.0, &["vfx", "roto"], &[("vfx", 3.0), ("roto", 1.5)]),
            snapshot(2, 4.0, &["vfx"], &[("vfx", 2.0)]),
            snapshot(3, 9.0, &["comp"], &[]),
        ];
        let report = build_report(&project(), &snapshots, &default_catalog());

        assert_eq!(report.snapshot_count, 3);
        assert_eq!(report.total_hours, 6.5);
        let tags: Vec<&str> = report.departments.iter().map(|d| d.tag.as_str()).collect();
        assert_eq!(tags, vec!["vfx", "comp", "roto"]);
        assert_eq!(report.departments[0].hours, 5.0);
        assert_eq!(report.departments[0].snapshots, 2);
        assert_eq!(report.departments[1].hours, 0.0);
        assert_eq!(report.shots[0].comment, "Fix the sky");
        assert_eq!(report.shots[1].timecode, "00:04.00");
    }

    #[test]
    fn test_stray_hours_and_unknown_tags() {
        let snapshots = vec![snapshot(
            1,
            0.0,
            &["zzz"],
            &[("zzz", 1.0), ("vfx", 8.0)],
        )];
        let report = build_report(&project(), &snapshots, &default_catalog());
        assert_eq!(report.total_hours, 1.0);
        assert_eq!(report.departments.len(), 1);
        assert_eq!(report.departments[0].label, "zzz");
        assert!(!report.shots[0].hours.contains_key("vfx"));
    }

    #[test]
    fn test_write_report_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("staffing.json");
        let report = build_report(&project(), &[], &default_catalog());
        write_report(&report, &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"project\": \"Reel\""));
    }
}

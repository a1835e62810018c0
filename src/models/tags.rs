// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Department tags and hour estimates.
//!
//! `TagState` is the editable tag/hours state of the snapshot currently
//! open. It exists before any snapshot does, so tags can be toggled on a
//! frame that has not been captured yet.

use crate::error::{ReelError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A production-department tag as shown in the editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagDef {
    pub id: String,
    pub label: String,
    /// Chip color (RGB).
    pub color: [u8; 3],
}

impl TagDef {
    fn new(id: &str, label: &str, color: [u8; 3]) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            color,
        }
    }
}

/// Tags offered when no configuration overrides them.
pub fn default_catalog() -> Vec<TagDef> {
    vec![
        TagDef::new("vfx", "VFX", [214, 69, 65]),
        TagDef::new("comp", "Comp", [230, 126, 34]),
        TagDef::new("roto", "Roto", [241, 196, 15]),
        TagDef::new("paint", "Paint", [46, 204, 113]),
        TagDef::new("cg", "CG", [52, 152, 219]),
        TagDef::new("matte", "Matte Painting", [155, 89, 182]),
        TagDef::new("grade", "Grade", [26, 188, 156]),
        TagDef::new("edit", "Editorial", [149, 165, 166]),
        TagDef::new("sound", "Sound", [127, 140, 141]),
    ]
}

/// Parse an hour estimate typed by the user.
///
/// Blank and zero mean "no estimate" (`Ok(None)`). Anything non-numeric,
/// negative or non-finite is rejected.
pub fn parse_hours(input: &str) -> Result<Option<f64>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let value: f64 = trimmed
        .parse()
        .map_err(|_| ReelError::InvalidTagHours(input.to_string()))?;
    if !value.is_finite() || value < 0.0 {
        return Err(ReelError::InvalidTagHours(input.to_string()));
    }
    Ok((value > 0.0).then_some(value))
}

/// Format an hour value for chips and reports (`3`, `2.5`).
pub fn format_hours(hours: f64) -> String {
    if hours.fract() == 0.0 {
        format!("{}", hours as i64)
    } else {
        let text = format!("{:.2}", hours);
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Active tags and hour estimates for the snapshot being edited.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagState {
    tags: BTreeSet<String>,
    hours: BTreeMap<String, f64>,
}

impl TagState {
    /// Load from a persisted record, ignoring hours for absent tags and
    /// any hour value that would not survive `parse_hours`.
    pub fn from_record(tags: &[String], hours: &BTreeMap<String, f64>) -> Self {
        let tags: BTreeSet<String> = tags.iter().cloned().collect();
        let hours = hours
            .iter()
            .filter(|(tag, value)| tags.contains(*tag) && value.is_finite() && **value > 0.0)
            .map(|(tag, value)| (tag.clone(), *value))
            .collect();
        Self { tags, hours }
    }

    pub fn is_active(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn hours(&self, tag: &str) -> Option<f64> {
        self.hours.get(tag).copied()
    }

    /// Flip a tag. Turning it off clears its hours. Returns the new state.
    pub fn toggle(&mut self, tag: &str) -> bool {
        if self.tags.remove(tag) {
            self.hours.remove(tag);
            false
        } else {
            self.tags.insert(tag.to_string());
            true
        }
    }

    /// Apply typed hour input for a tag.
    ///
    /// A positive value activates the tag if needed. Blank or zero clears
    /// the estimate but leaves the tag as it was.
    pub fn set_hours(&mut self, tag: &str, input: &str) -> Result<()> {
        match parse_hours(input)? {
            Some(value) => {
                self.tags.insert(tag.to_string());
                self.hours.insert(tag.to_string(), value);
            }
            None => {
                self.hours.remove(tag);
            }
        }
        Ok(())
    }

    /// Active tags, sorted and unique.
    pub fn tags(&self) -> Vec<String> {
        self.tags.iter().cloned().collect()
    }

    /// Hour entries restricted to active tags.
    pub fn hours_map(&self) -> BTreeMap<String, f64> {
        self.hours
            .iter()
            .filter(|(tag, _)| self.tags.contains(*tag))
            .map(|(tag, value)| (tag.clone(), *value))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_off_clears_hours() {
        let mut state = TagState::default();
        state.set_hours("vfx", "3").unwrap();
        assert!(state.is_active("vfx"));

        assert!(!state.toggle("vfx"));
        assert_eq!(state.hours("vfx"), None);

        // on → off → on with no hour input leaves no estimate
        assert!(state.toggle("vfx"));
        assert_eq!(state.hours("vfx"), None);
        assert!(state.hours_map().is_empty());
    }

    #[test]
    fn test_hours_on_inactive_tag_activates_it() {
        let mut state = TagState::default();
        state.set_hours("roto", "2.5").unwrap();
        assert_eq!(state.tags(), vec!["roto".to_string()]);
        assert_eq!(state.hours("roto"), Some(2.5));
    }

    #[test]
    fn test_blank_or_zero_hours_not_kept() {
        let mut state = TagState::default();
        state.set_hours("comp", "4").unwrap();
        state.set_hours("comp", "0").unwrap();
        assert_eq!(state.hours("comp"), None);
        assert!(state.is_active("comp"));

        state.set_hours("comp", "  ").unwrap();
        assert_eq!(state.hours("comp"), None);

        // zero on an inactive tag does not activate it
        state.set_hours("paint", "0").unwrap();
        assert!(!state.is_active("paint"));
    }

    #[test]
    fn test_invalid_hours_rejected() {
        let mut state = TagState::default();
        assert!(matches!(
            state.set_hours("vfx", "lots"),
            Err(ReelError::InvalidTagHours(_))
        ));
        assert!(state.set_hours("vfx", "-2").is_err());
        assert!(state.set_hours("vfx", "NaN").is_err());
        assert!(!state.is_active("vfx"));
    }

    #[test]
    fn test_from_record_drops_stray_hours() {
        let mut hours = BTreeMap::new();
        hours.insert("vfx".to_string(), 3.0);
        hours.insert("sound".to_string(), 1.0);
        let state = TagState::from_record(&["vfx".to_string(), "vfx".to_string()], &hours);

        assert_eq!(state.tags(), vec!["vfx".to_string()]);
        assert_eq!(state.hours("sound"), None);
        assert_eq!(state.hours_map().len(), 1);
    }

    #[test]
    fn test_format_hours() {
        assert_eq!(format_hours(3.0), "3");
        assert_eq!(format_hours(2.5), "2.5");
        assert_eq!(format_hours(1.25), "1.25");
    }
}

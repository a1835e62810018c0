// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Card and timeline presenter.
//!
//! Pure reconciliation from snapshot records to view models: one card and
//! one timeline marker per snapshot, kept in timestamp order. Lifecycle
//! events touch only the affected card. Cards are keyed by snapshot id and
//! carry a render revision so texture caches know when to refresh.

use crate::lifecycle::LifecycleEvent;
use crate::models::tags::{format_hours, TagDef};
use crate::models::{Blob, Snapshot, SnapshotId};
use crate::util::timecode::format_timecode;

/// Characters of comment shown on a card.
const PREVIEW_CHARS: usize = 80;

/// Chip color for tags missing from the catalog.
const UNKNOWN_TAG_COLOR: [u8; 3] = [120, 120, 120];

/// A tag chip on a card, e.g. "VFX 3h".
#[derive(Debug, Clone, PartialEq)]
pub struct Chip {
    pub tag: String,
    pub label: String,
    pub color: [u8; 3],
}

/// View model for one snapshot in the list.
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub id: SnapshotId,
    pub timestamp: f64,
    pub timecode: String,
    pub thumbnail: Blob,
    /// Changes every time the card is re-rendered.
    pub revision: u64,
    pub chips: Vec<Chip>,
    pub preview: String,
    pub editing: bool,
}

/// A snapshot's position on the timeline, `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marker {
    pub id: SnapshotId,
    pub position: f32,
    pub editing: bool,
}

#[derive(Debug, Default)]
pub struct Presenter {
    cards: Vec<Card>,
    duration: f64,
    catalog: Vec<TagDef>,
    editing: Option<SnapshotId>,
    revision: u64,
}

impl Presenter {
    pub fn new(catalog: Vec<TagDef>) -> Self {
        Self {
            catalog,
            ..Default::default()
        }
    }

    /// Render a whole project from scratch.
    pub fn load(&mut self, mut snapshots: Vec<Snapshot>, duration: f64) {
        crate::store::sort_by_timestamp(&mut snapshots);
        self.duration = duration;
        self.editing = None;
        let cards = snapshots.iter().map(|s| self.render(s)).collect();
        self.cards = cards;
    }

    pub fn set_duration(&mut self, duration: f64) {
        self.duration = duration;
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn card(&self, id: SnapshotId) -> Option<&Card> {
        self.cards.iter().find(|c| c.id == id)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn markers(&self) -> Vec<Marker> {
        self.cards
            .iter()
            .map(|card| Marker {
                id: card.id,
                position: marker_position(card.timestamp, self.duration),
                editing: card.editing,
            })
            .collect()
    }

    /// Reconcile one lifecycle event.
    pub fn apply(&mut self, event: &LifecycleEvent) {
        match event {
            LifecycleEvent::Created(snapshot) | LifecycleEvent::Updated(snapshot) => {
                let card = self.render(snapshot);
                self.cards.retain(|c| c.id != card.id);
                let index = self.cards.partition_point(|c| {
                    c.timestamp < card.timestamp
                        || (c.timestamp == card.timestamp && c.id < card.id)
                });
                self.cards.insert(index, card);
            }
            LifecycleEvent::Deleted(id) => {
                self.cards.retain(|c| c.id != *id);
                if self.editing == Some(*id) {
                    self.editing = None;
                }
            }
            LifecycleEvent::EditingStarted(id) => self.set_editing(Some(*id)),
            LifecycleEvent::EditingEnded(id) => {
                if self.editing == Some(*id) {
                    self.set_editing(None);
                }
            }
        }
    }

    fn set_editing(&mut self, id: Option<SnapshotId>) {
        self.editing = id;
        for card in &mut self.cards {
            card.editing = Some(card.id) == id;
        }
    }

    fn render(&mut self, snapshot: &Snapshot) -> Card {
        self.revision += 1;
        Card {
            id: snapshot.id,
            timestamp: snapshot.timestamp,
            timecode: format_timecode(snapshot.timestamp),
            thumbnail: snapshot.thumbnail().clone(),
            revision: self.revision,
            chips: self.chips(snapshot),
            preview: comment_preview(&snapshot.comment, PREVIEW_CHARS),
            editing: self.editing == Some(snapshot.id),
        }
    }

    fn chips(&self, snapshot: &Snapshot) -> Vec<Chip> {
        let mut tags = snapshot.tags.clone();
        tags.sort();
        tags.dedup();
        tags.into_iter()
            .map(|tag| {
                let def = self.catalog.iter().find(|d| d.id == tag);
                let name = def.map_or(tag.as_str(), |d| d.label.as_str());
                // Hours only count for tags that are set.
                let label = match snapshot.tag_hours.get(&tag) {
                    Some(hours) if *hours > 0.0 => format!("{} {}h", name, format_hours(*hours)),
                    _ => name.to_string(),
                };
                Chip {
                    color: def.map_or(UNKNOWN_TAG_COLOR, |d| d.color),
                    label,
                    tag,
                }
            })
            .collect()
    }
}

/// Fractional timeline position of `timestamp`.
pub fn marker_position(timestamp: f64, duration: f64) -> f32 {
    if duration <= 0.0 {
        return 0.0;
    }
    (timestamp / duration).clamp(0.0, 1.0) as f32
}

/// Plain-text excerpt of an inline-styled comment.
pub fn comment_preview(markup: &str, max_chars: usize) -> String {
    let mut text = String::with_capacity(markup.len());
    let mut in_tag = false;
    for c in markup.chars() {
        match c {
            '<' => {
                in_tag = true;
                text.push(' ');
            }
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }
    let text = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let cut: String = collapsed.chars().take(max_chars).collect();
        format!("{}…", cut.trim_end())
    }
}

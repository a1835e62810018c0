// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Transient notifications shown as auto-dismissing toasts.

use std::collections::VecDeque;
use std::time::Duration;

/// Oldest toasts are dropped beyond this many.
const MAX_VISIBLE: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub id: u64,
    pub level: Level,
    pub text: String,
    shown_at: Duration,
}

#[derive(Debug)]
pub struct Notifications {
    ttl: Duration,
    items: VecDeque<Toast>,
    next_id: u64,
}

impl Notifications {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            items: VecDeque::new(),
            next_id: 0,
        }
    }

    pub fn push(&mut self, level: Level, text: impl Into<String>, now: Duration) {
        let text = text.into();
        match level {
            Level::Info => log::info!("{}", text),
            Level::Warning => log::warn!("{}", text),
            Level::Error => log::error!("{}", text),
        }
        // Repeats of the newest toast just refresh it.
        if let Some(last) = self.items.back_mut() {
            if last.text == text && last.level == level {
                last.shown_at = now;
                return;
            }
        }
        self.next_id += 1;
        self.items.push_back(Toast {
            id: self.next_id,
            level,
            text,
            shown_at: now,
        });
        while self.items.len() > MAX_VISIBLE {
            self.items.pop_front();
        }
    }

    /// Drop toasts older than the time-to-live.
    pub fn expire(&mut self, now: Duration) {
        let ttl = self.ttl;
        self.items
            .retain(|toast| now.saturating_sub(toast.shown_at) < ttl);
    }

    pub fn dismiss(&mut self, id: u64) {
        self.items.retain(|toast| toast.id != id);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Toast> {
        self.items.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn test_toasts_expire() {
        let mut notes = Notifications::new(secs(4));
        notes.push(Level::Info, "saved", secs(0));
        notes.push(Level::Error, "could not save", secs(2));

        notes.expire(secs(4));
        let texts: Vec<_> = notes.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["could not save"]);

        notes.expire(secs(6));
        assert!(notes.is_empty());
    }

    #[test]
    fn test_repeat_refreshes_instead_of_stacking() {
        let mut notes = Notifications::new(secs(4));
        notes.push(Level::Warning, "pause to capture", secs(0));
        notes.push(Level::Warning, "pause to capture", secs(3));
        assert_eq!(notes.iter().count(), 1);
        notes.expire(secs(5));
        assert_eq!(notes.iter().count(), 1);
    }

    #[test]
    fn test_bounded_and_dismissable() {
        let mut notes = Notifications::new(secs(60));
        for i in 0..6 {
            notes.push(Level::Info, format!("note {}", i), secs(0));
        }
        assert_eq!(notes.iter().count(), MAX_VISIBLE);
        let first = notes.iter().next().unwrap().clone();
        assert_eq!(first.text, "note 2");
        notes.dismiss(first.id);
        assert_eq!(notes.iter().count(), MAX_VISIBLE - 1);
    }
}

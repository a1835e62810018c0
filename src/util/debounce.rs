// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Cancel-and-reschedule debounce token.
//!
//! The token holds at most one deadline. Scheduling again replaces it, so a
//! burst of triggers collapses into a single firing once the burst has been
//! quiet for `delay`. The owner polls `take_due` from its event loop.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Debounce {
    delay: Duration,
    deadline: Option<Duration>,
}

impl Debounce {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// (Re)start the quiet period from `now`.
    pub fn schedule(&mut self, now: Duration) {
        self.deadline = Some(now + self.delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Time left until the deadline, zero if already due.
    pub fn remaining(&self, now: Duration) -> Option<Duration> {
        self.deadline.map(|deadline| deadline.saturating_sub(now))
    }

    /// Consume the deadline if it has passed.
    pub fn take_due(&mut self, now: Duration) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[test]
    fn test_fires_after_quiet_period() {
        let mut debounce = Debounce::new(ms(300));
        debounce.schedule(ms(0));
        assert!(!debounce.take_due(ms(299)));
        assert!(debounce.take_due(ms(300)));
        assert!(!debounce.is_pending());
        assert!(!debounce.take_due(ms(1000)));
    }

    #[test]
    fn test_reschedule_replaces_deadline() {
        let mut debounce = Debounce::new(ms(300));
        debounce.schedule(ms(0));
        debounce.schedule(ms(200));
        assert!(!debounce.take_due(ms(300)));
        assert_eq!(debounce.remaining(ms(300)), Some(ms(200)));
        assert!(debounce.take_due(ms(500)));
    }

    #[test]
    fn test_cancel() {
        let mut debounce = Debounce::new(ms(300));
        debounce.schedule(ms(0));
        debounce.cancel();
        assert!(!debounce.take_due(ms(1000)));
        assert_eq!(debounce.remaining(ms(0)), None);
    }
}

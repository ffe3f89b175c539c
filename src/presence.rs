//! Marker presence tracking for touch detection.
//!
//! This module keeps a short history of which tracked markers were visible in
//! each frame and reports the markers that were recently visible but are
//! absent now. A player covering a marker with their hand shows up here as
//! that marker "vanishing".

use crate::target::MarkerId;
use log::debug;
use std::collections::{BTreeSet, VecDeque};

/// One bit per tracked marker: was it detected in a given frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibilitySnapshot {
    bits: Vec<bool>,
}

impl VisibilitySnapshot {
    /// Build a snapshot of `visible` over the tracked id universe
    #[must_use]
    pub fn capture(tracked: &[MarkerId], visible: &BTreeSet<MarkerId>) -> Self {
        Self {
            bits: tracked.iter().map(|id| visible.contains(id)).collect(),
        }
    }

    /// Whether the marker at `index` in the tracked list was visible
    #[must_use]
    pub fn is_visible(&self, index: usize) -> bool {
        self.bits.get(index).copied().unwrap_or(false)
    }

    /// Number of tracked markers in the snapshot
    #[must_use]
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Whether the snapshot covers no markers
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }
}

/// Presence tracker over a sliding window of visibility snapshots
pub struct PresenceTracker {
    tracked: Vec<MarkerId>,
    past: usize,
    history: VecDeque<VisibilitySnapshot>,
    // Cleared once a vanish is reported, set again when the marker reappears.
    armed: Vec<bool>,
}

impl PresenceTracker {
    /// Create a new tracker for `tracked` ids with a window of `past` frames
    #[must_use]
    pub fn new(tracked: Vec<MarkerId>, past: usize) -> Self {
        let armed = vec![false; tracked.len()];
        Self {
            tracked,
            past,
            history: VecDeque::with_capacity(past + 1),
            armed,
        }
    }

    /// Record the markers detected in this frame and return those that just vanished
    ///
    /// A marker is reported when it is absent now, was visible in one of the
    /// previous snapshots of the window, and has not already been reported
    /// since it was last seen. Nothing is reported until `past / 2`
    /// snapshots have been recorded since the last reset.
    pub fn record_and_find_vanished(&mut self, visible: &BTreeSet<MarkerId>) -> Vec<MarkerId> {
        let snapshot = VisibilitySnapshot::capture(&self.tracked, visible);
        self.history.push_back(snapshot);

        let vanished = if self.history.len() < self.warm_up_len() {
            Vec::new()
        } else {
            self.find_vanished()
        };

        if let Some(current) = self.history.back() {
            for (index, armed) in self.armed.iter_mut().enumerate() {
                if current.is_visible(index) {
                    *armed = true;
                }
            }
        }

        while self.history.len() > self.past {
            self.history.pop_front();
        }

        if !vanished.is_empty() {
            debug!("Vanished markers: {:?}", vanished);
        }
        vanished
    }

    fn find_vanished(&mut self) -> Vec<MarkerId> {
        let Some(current) = self.history.back() else {
            return Vec::new();
        };
        let window = self.past.min(self.history.len());

        let mut vanished = Vec::new();
        for (index, id) in self.tracked.iter().enumerate() {
            if current.is_visible(index) || !self.armed[index] {
                continue;
            }
            let was_present_recently = self
                .history
                .iter()
                .rev()
                .skip(1)
                .take(window.saturating_sub(1))
                .any(|snapshot| snapshot.is_visible(index));
            if was_present_recently {
                vanished.push(*id);
            }
        }

        for id in &vanished {
            if let Some(index) = self.tracked.iter().position(|tracked| tracked == id) {
                self.armed[index] = false;
            }
        }
        vanished
    }

    /// Clear the history, starting a new warm-up period
    pub fn reset(&mut self) {
        self.history.clear();
        self.armed.iter_mut().for_each(|armed| *armed = false);
    }

    /// Number of snapshots currently held
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Window capacity in frames
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.past
    }

    /// Tracked id universe, in snapshot order
    #[must_use]
    pub fn tracked(&self) -> &[MarkerId] {
        &self.tracked
    }

    fn warm_up_len(&self) -> usize {
        self.past / 2
    }
}

// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Ring of the last few local inputs.
//!
//! The rollback window bounds how far back a re-simulation can reach:
//! the worst case replays the W frames before the current one and then
//! advances the current frame itself, so the ring must hold W + 1 entries:
//! the current frame plus its W re-simulable predecessors. Anything
//! older is already confirmed on every peer or unrecoverable.

use rewind_core::{FrameType, MAX_ROLLBACK_WINDOW};
use rewind_input::PlayerInput;

const CAPACITY: u32 = MAX_ROLLBACK_WINDOW + 1;

/// Frame-keyed ring of recent local inputs.
#[derive(Debug, Clone, Default)]
pub struct InputHistory {
    entries: [Option<(FrameType, PlayerInput)>; CAPACITY as usize],
}

impl InputHistory {
    /// Creates an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the local input for `frame`, evicting whatever previously
    /// occupied its ring slot.
    pub fn record(&mut self, frame: FrameType, input: PlayerInput) {
        self.entries[(frame % CAPACITY) as usize] = Some((frame, input));
    }

    /// The input recorded for `frame`, if still retained.
    #[must_use]
    pub fn get(&self, frame: FrameType) -> Option<PlayerInput> {
        match self.entries[(frame % CAPACITY) as usize] {
            Some((stored, input)) if stored == frame => Some(input),
            _ => None,
        }
    }

    /// The most recently recorded frame and input, if any.
    #[must_use]
    pub fn latest(&self) -> Option<(FrameType, PlayerInput)> {
        self.entries.iter().flatten().max_by_key(|(frame, _)| *frame).copied()
    }

    /// Clears the history.
    pub fn reset(&mut self) {
        self.entries = Default::default();
    }
}

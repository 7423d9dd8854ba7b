// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Pause/resume frame clock.
//!
//! Decides how many gameplay frames must run to keep the simulation at 60
//! fps of wall-clock time. Two guards shape the answer:
//!
//! - catch-up is bounded at [`MAX_FRAMES_PER_POLL`] so a breakpoint or a
//!   slow machine cannot trigger a death spiral of ever-growing backlogs
//! - after a resume at most one frame runs regardless of how long the pause
//!   lasted, so pausing cannot be abused to skip the simulation forward

use rewind_core::{FrameType, MICROS_PER_FRAME};

/// Upper bound on frames processed per poll while catching up.
pub const MAX_FRAMES_PER_POLL: FrameType = 3;

/// Time source in microseconds. Injectable so tests can script it.
pub type TimeSource = Box<dyn FnMut() -> u64>;

/// Reads the host wall clock in microseconds.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn wall_clock_micros() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_micros() as u64
}

/// Frame clock for one session.
pub struct FrameClock {
    time_source: TimeSource,
    last_update_micros: u64,
    paused: bool,
    handle_unpause_next_poll: bool,
    pause_time_micros: u64,
}

impl core::fmt::Debug for FrameClock {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FrameClock")
            .field("last_update_micros", &self.last_update_micros)
            .field("paused", &self.paused)
            .finish_non_exhaustive()
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    /// Creates a clock reading the host wall clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_time_source(Box::new(wall_clock_micros))
    }

    /// Creates a clock with an injected time source (unit-test seam).
    #[must_use]
    pub fn with_time_source(time_source: TimeSource) -> Self {
        Self {
            time_source,
            last_update_micros: 0,
            paused: false,
            handle_unpause_next_poll: false,
            pause_time_micros: 0,
        }
    }

    /// Resets state for a fresh session.
    pub fn start(&mut self) {
        self.last_update_micros = 0;
        self.paused = false;
        self.handle_unpause_next_poll = false;
        self.pause_time_micros = 0;
    }

    /// Whether the clock is paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Pauses: subsequent polls report zero frames.
    pub fn pause(&mut self) {
        self.paused = true;
        self.pause_time_micros = (self.time_source)();
    }

    /// Resumes; the next poll reports at most one frame.
    pub fn resume(&mut self) {
        self.paused = false;
        self.handle_unpause_next_poll = true;
    }

    /// Reads the injected time source (shared with the network layer so
    /// every subsystem sees one clock).
    pub fn now_micros(&mut self) -> u64 {
        (self.time_source)()
    }

    /// How many gameplay frames must run now to stay at the target rate.
    pub fn frames_to_process(&mut self) -> FrameType {
        if self.paused {
            return 0;
        }

        // First poll of a session always runs exactly one frame.
        if self.last_update_micros == 0 {
            self.last_update_micros = (self.time_source)();
            return 1;
        }

        let now = (self.time_source)();

        if self.handle_unpause_next_poll {
            self.handle_unpause_next_poll = false;
            // Whatever wall-clock time the pause consumed, grant one frame
            // at most; anything else would let pause/unpause skip ahead.
            return if now.saturating_sub(self.pause_time_micros) > MICROS_PER_FRAME {
                self.last_update_micros = now;
                1
            } else {
                self.last_update_micros = now;
                0
            };
        }

        let elapsed = now.saturating_sub(self.last_update_micros);
        let mut frames = u32::try_from(elapsed / MICROS_PER_FRAME).unwrap_or(FrameType::MAX);

        if frames > 0 {
            // Account for exactly the time we are about to simulate, so the
            // remainder keeps accumulating toward the next frame.
            self.last_update_micros += MICROS_PER_FRAME * u64::from(frames);
            if frames > MAX_FRAMES_PER_POLL {
                // Pretend to be caught up after the bounded burst.
                frames = MAX_FRAMES_PER_POLL;
            }
        }
        frames
    }
}

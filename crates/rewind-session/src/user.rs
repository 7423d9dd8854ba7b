// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Session user callbacks and events.
//!
//! The session core invokes these; the host engine implements them. The
//! split keeps the core free of rendering, capture, and socket concerns
//! while still owning the predict/rollback/re-simulate loop.

use rewind_core::FrameType;
use rewind_input::PlayerInput;

use crate::history::InputHistory;

/// A full, value-semantic copy of the deterministic game state at the end
/// of one frame.
pub trait Snapshot: Clone {
    /// CRC32 over all deterministic state, in field-declaration order.
    fn checksum(&self) -> u32;
}

/// Diagnostics handed to [`RollbackUser::on_stalling_for_remote_inputs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StallInfo {
    /// Frame the session is trying to advance to.
    pub current_frame: FrameType,
    /// Player slots whose confirmed inputs are too old to proceed.
    pub stalling_players: Vec<usize>,
}

/// Events surfaced by [`crate::RollbackSession`]'s tick report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Remote peers report the local side is running ahead; the external
    /// clock should sleep this many extra frames.
    TimeSync {
        /// Recommended number of frames to sleep.
        frames_ahead: u32,
    },
    /// A peer was declared gone; its inputs are reconstructed from its last
    /// known value from here on.
    PlayerDisconnected {
        /// The disconnected player slot.
        player: usize,
    },
}

/// Host-implemented callbacks the session drives.
///
/// `inputs_per_player` slices are indexed by player slot and cover every
/// player, local included.
pub trait RollbackUser<S: Snapshot> {
    /// Captures the deterministic state after frame `frame`.
    fn generate_snapshot(&mut self, frame: FrameType) -> S;

    /// Restores the deterministic state captured after frame `frame`.
    fn restore_snapshot(&mut self, frame: FrameType, snapshot: &S);

    /// Collects the local player's input for `frame`. `None` means capture
    /// had nothing this tick; the session repeats the previous input.
    fn get_input_for_next_frame(&mut self, frame: FrameType) -> Option<PlayerInput>;

    /// Runs one full simulation step, rendering included.
    fn process_frame(&mut self, frame: FrameType, inputs_per_player: &[PlayerInput]);

    /// Runs one simulation step during rollback re-simulation (no
    /// rendering or other frame-visible side effects).
    fn process_frame_without_rendering(&mut self, frame: FrameType, inputs_per_player: &[PlayerInput]);

    /// Called once after a rollback finishes re-simulating, before the
    /// current frame advances.
    fn on_post_rollback(&mut self);

    /// Time to send link-quality reports to peers (every
    /// [`crate::session::RECOMMENDATION_INTERVAL`] frames).
    fn send_time_quality_report(&mut self, frame: FrameType);

    /// Broadcast the local inputs for `frame` (and anything unacked) to the
    /// remote players.
    fn send_local_inputs_to_remote_players(&mut self, frame: FrameType, history: &InputHistory);

    /// The session cannot advance until remote inputs arrive.
    fn on_stalling_for_remote_inputs(&mut self, info: &StallInfo);

    /// `confirmed_frame` left the rollback window with confirmed inputs
    /// from every peer; its side effects may be finalized.
    fn on_inputs_exit_rollback_window(&mut self, confirmed_frame: FrameType);
}

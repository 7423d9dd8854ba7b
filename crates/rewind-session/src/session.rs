// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The rollback session: predict, detect mispredictions, roll back,
//! re-simulate, advance.
//!
//! Ordering guarantees (per tick):
//! - rollback re-simulation happens before the current frame advances, so
//!   the user sees at most one rendered simulation step per processed
//!   frame, preceded by up to W historical re-simulations
//! - the snapshot stored for frame `f` reflects state after `f` and before
//!   `f + 1`
//! - prediction is repeat-last: an unknown remote input is assumed equal to
//!   that peer's most recent known input

use std::collections::BTreeMap;

use thiserror::Error;

use rewind_core::{FrameType, MAX_ROLLBACK_WINDOW};
use rewind_input::PlayerInput;
use rewind_session_proto::NO_FRAME_RECEIVED;

use crate::clock::FrameClock;
use crate::history::InputHistory;
use crate::snapshots::SnapshotStore;
use crate::user::{RollbackUser, SessionEvent, Snapshot, StallInfo};

/// Frames between time-quality reports / sleep recommendations.
pub const RECOMMENDATION_INTERVAL: FrameType = 240;

/// Lifecycle errors returned by session operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    /// The session has not been started.
    #[error("session not started")]
    NotStarted,
    /// The peer handshake has not completed yet.
    #[error("session not synchronized with all peers")]
    NotSynchronized,
    /// Advancing would outrun the rollback window without any remote
    /// confirmation.
    #[error("prediction threshold reached; remote confirmations are too far behind")]
    PredictionThreshold,
    /// Player slot outside the session's player count.
    #[error("player slot {0} is out of range")]
    PeerOutOfRange(usize),
    /// Operation addressed the wrong player (e.g. remote-only operation on
    /// the local slot).
    #[error("invalid player handle {0}")]
    InvalidPlayerHandle(usize),
    /// The peer was disconnected earlier; its inputs are synthesized.
    #[error("player {0} is disconnected")]
    PeerDisconnected(usize),
}

/// What one processed frame decided to do.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TickDecision {
    /// Inputs were available (or predictable); the frame advanced.
    ProceedNormally,
    /// A remote peer is too far behind; no forward progress this frame.
    WaitFrame,
    /// A misprediction was detected; history was re-simulated before the
    /// frame advanced.
    Rollback,
}

/// Outcome of one [`RollbackSession::tick`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    /// Frames actually advanced this tick (0..=3).
    pub frames_advanced: u32,
    /// Rollback > WaitFrame > ProceedNormally, across the tick's frames.
    pub decision: TickDecision,
    /// Events for the host (time-sync hints, disconnects).
    pub events: Vec<SessionEvent>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum SessionMode {
    NotStarted,
    Running,
}

/// Rollback session for one local player among `num_players`.
pub struct RollbackSession<S: Snapshot> {
    mode: SessionMode,
    num_players: usize,
    local_player: usize,
    synchronized: bool,

    frame: FrameType,
    last_confirmed: Vec<Option<FrameType>>,
    disconnected: Vec<bool>,
    confirmed_inputs: Vec<BTreeMap<FrameType, PlayerInput>>,
    last_known_input: Vec<PlayerInput>,
    used_inputs: BTreeMap<FrameType, Vec<PlayerInput>>,
    first_incorrect_frame: Option<FrameType>,

    snapshots: SnapshotStore<S>,
    initial_snapshot: Option<S>,
    history: InputHistory,
    clock: FrameClock,

    next_recommendation_frame: FrameType,
    recommended_sleep_frames: u32,
    confirmed_frontier: Option<FrameType>,
    events: Vec<SessionEvent>,
}

impl<S: Snapshot> RollbackSession<S> {
    /// Creates a session of `num_players` with the local player at
    /// `local_player`, using the wall clock.
    pub fn new(num_players: usize, local_player: usize) -> Result<Self, SessionError> {
        Self::with_clock(num_players, local_player, FrameClock::new())
    }

    /// Creates a session with an injected frame clock (test seam).
    pub fn with_clock(
        num_players: usize,
        local_player: usize,
        clock: FrameClock,
    ) -> Result<Self, SessionError> {
        if num_players == 0 || local_player >= num_players {
            return Err(SessionError::InvalidPlayerHandle(local_player));
        }
        Ok(Self {
            mode: SessionMode::NotStarted,
            num_players,
            local_player,
            synchronized: num_players == 1,
            frame: 0,
            last_confirmed: vec![None; num_players],
            disconnected: vec![false; num_players],
            confirmed_inputs: vec![BTreeMap::new(); num_players],
            last_known_input: vec![PlayerInput::neutral(); num_players],
            used_inputs: BTreeMap::new(),
            first_incorrect_frame: None,
            snapshots: SnapshotStore::new(),
            initial_snapshot: None,
            history: InputHistory::new(),
            clock,
            next_recommendation_frame: 0,
            recommended_sleep_frames: 0,
            confirmed_frontier: None,
            events: Vec::new(),
        })
    }

    /// Starts the session: captures the pre-frame-0 snapshot and arms the
    /// clock.
    pub fn start_session(&mut self, user: &mut dyn RollbackUser<S>) {
        self.mode = SessionMode::Running;
        self.frame = 0;
        self.initial_snapshot = Some(user.generate_snapshot(0));
        self.snapshots.reset();
        self.history.reset();
        self.clock.start();
    }

    /// Marks the peer handshake complete; inputs are accepted from here on.
    pub fn set_synchronized(&mut self) {
        self.synchronized = true;
    }

    /// Current (not yet simulated) frame.
    #[must_use]
    pub fn current_frame(&self) -> FrameType {
        self.frame
    }

    /// Pauses the frame clock.
    pub fn pause(&mut self) {
        self.clock.pause();
    }

    /// Resumes the frame clock. At most one frame advances on the next
    /// tick, however long the pause lasted.
    pub fn resume(&mut self) {
        self.clock.resume();
    }

    /// Whether the clock is paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.clock.is_paused()
    }

    /// Highest confirmed input frame for `player`, if any.
    pub fn confirmed_frame_of(&self, player: usize) -> Result<Option<FrameType>, SessionError> {
        self.last_confirmed
            .get(player)
            .copied()
            .ok_or(SessionError::PeerOutOfRange(player))
    }

    /// Per-player confirmed frames in wire-trailer form.
    #[must_use]
    pub fn confirmed_frame_trailer(&self) -> Vec<u32> {
        self.last_confirmed
            .iter()
            .map(|confirmed| confirmed.map_or(NO_FRAME_RECEIVED, |frame| frame))
            .collect()
    }

    /// Records the host-measured sleep recommendation (from peer quality
    /// reports); surfaced as a [`SessionEvent::TimeSync`] at the next
    /// recommendation interval.
    pub fn set_recommended_sleep_frames(&mut self, frames: u32) {
        self.recommended_sleep_frames = frames;
    }

    /// CRC32 of the newest snapshot whose inputs are confirmed on every
    /// peer, i.e. the value the wire trailer carries as a desync cross-check.
    #[must_use]
    pub fn confirmed_snapshot_checksum(&self) -> Option<u32> {
        let frontier = self.confirmed_frontier?;
        self.snapshots.get(frontier).ok().map(Snapshot::checksum)
    }

    /// Records the local input for the current frame ahead of [`Self::tick`].
    ///
    /// Push-style alternative to
    /// [`RollbackUser::get_input_for_next_frame`]; returns the frame the
    /// input was bound to.
    pub fn add_local_input(&mut self, input: PlayerInput) -> Result<FrameType, SessionError> {
        if self.mode != SessionMode::Running {
            return Err(SessionError::NotStarted);
        }
        if !self.synchronized {
            return Err(SessionError::NotSynchronized);
        }
        if !self.stalling_players().is_empty() {
            // Advancing would outrun the window with no confirmations.
            return Err(SessionError::PredictionThreshold);
        }
        let input = input.canonicalized();
        self.history.record(self.frame, input);
        self.last_known_input[self.local_player] = input;
        Ok(self.frame)
    }

    /// Ingests confirmed inputs from a remote player, starting at
    /// `start_frame`. Frames at or below that player's confirmed frontier
    /// are ignored (redundant bundling makes overlap the common case).
    #[allow(clippy::cast_possible_truncation)] // runs are capped at the window
    pub fn ingest_remote_inputs(
        &mut self,
        player: usize,
        start_frame: FrameType,
        inputs: &[PlayerInput],
    ) -> Result<(), SessionError> {
        if player >= self.num_players {
            return Err(SessionError::PeerOutOfRange(player));
        }
        if player == self.local_player {
            return Err(SessionError::InvalidPlayerHandle(player));
        }
        if self.disconnected[player] {
            return Err(SessionError::PeerDisconnected(player));
        }

        for (offset, input) in inputs.iter().enumerate() {
            let frame = start_frame + offset as FrameType;
            let already_confirmed =
                self.last_confirmed[player].map_or(false, |confirmed| frame <= confirmed);
            if already_confirmed {
                continue;
            }

            self.confirmed_inputs[player].insert(frame, *input);
            self.last_confirmed[player] = Some(frame);
            self.last_known_input[player] = *input;

            // Misprediction check against what we actually simulated with.
            if let Some(used) = self.used_inputs.get(&frame) {
                if used[player] != *input {
                    self.first_incorrect_frame = Some(
                        self.first_incorrect_frame.map_or(frame, |first| first.min(frame)),
                    );
                }
            }
        }
        Ok(())
    }

    /// Declares `player` gone: its confirmed frame is pinned at the local
    /// current frame and its last known input repeats forever after.
    pub fn disconnect_player(&mut self, player: usize) -> Result<(), SessionError> {
        if player >= self.num_players {
            return Err(SessionError::PeerOutOfRange(player));
        }
        if self.disconnected[player] {
            return Err(SessionError::PeerDisconnected(player));
        }
        self.disconnected[player] = true;
        self.last_confirmed[player] = Some(self.frame);
        self.events.push(SessionEvent::PlayerDisconnected { player });
        Ok(())
    }

    /// Runs one wall-clock tick: polls the clock and processes however many
    /// frames (0..=3) it grants, rolling back first where needed.
    pub fn tick(&mut self, user: &mut dyn RollbackUser<S>) -> Result<TickReport, SessionError> {
        if self.mode != SessionMode::Running {
            return Err(SessionError::NotStarted);
        }

        let frames_due = self.clock.frames_to_process();
        let mut frames_advanced = 0;
        let mut rolled_back = false;
        let mut last_decision = TickDecision::ProceedNormally;

        for _ in 0..frames_due {
            let decision = self.step(user);
            last_decision = decision;
            match decision {
                TickDecision::WaitFrame => break,
                TickDecision::Rollback => {
                    rolled_back = true;
                    frames_advanced += 1;
                }
                TickDecision::ProceedNormally => frames_advanced += 1,
            }
        }

        let decision = if rolled_back {
            TickDecision::Rollback
        } else {
            last_decision
        };
        Ok(TickReport { frames_advanced, decision, events: std::mem::take(&mut self.events) })
    }

    fn step(&mut self, user: &mut dyn RollbackUser<S>) -> TickDecision {
        if !self.synchronized {
            return TickDecision::WaitFrame;
        }

        // Stall before anything else: no local input capture, no advance,
        // but keep the session alive so ingestion can unblock it.
        let stalling = self.stalling_players();
        if !stalling.is_empty() {
            user.on_stalling_for_remote_inputs(&StallInfo {
                current_frame: self.frame,
                stalling_players: stalling,
            });
            return TickDecision::WaitFrame;
        }

        // Local input for this frame (unless pushed in already).
        if self.history.get(self.frame).is_none() {
            let captured = user
                .get_input_for_next_frame(self.frame)
                .map_or(self.last_known_input[self.local_player], PlayerInput::canonicalized);
            self.history.record(self.frame, captured);
            self.last_known_input[self.local_player] = captured;
        }
        user.send_local_inputs_to_remote_players(self.frame, &self.history);

        // Misprediction repair precedes the forward step.
        let decision = if self.first_incorrect_frame.is_some_and(|first| first < self.frame) {
            self.execute_rollback(user);
            TickDecision::Rollback
        } else {
            self.first_incorrect_frame = None;
            TickDecision::ProceedNormally
        };

        self.advance_frame(user);
        self.advance_confirmed_frontier(user);
        self.maybe_recommend_time_sync(user);

        decision
    }

    fn execute_rollback(&mut self, user: &mut dyn RollbackUser<S>) {
        let Some(rollback_to) = self.first_incorrect_frame else {
            return;
        };

        if rollback_to == 0 {
            if let Some(initial) = self.initial_snapshot.clone() {
                user.restore_snapshot(0, &initial);
            }
        } else if let Ok(snapshot) = self.snapshots.get(rollback_to - 1) {
            let snapshot = snapshot.clone();
            user.restore_snapshot(rollback_to - 1, &snapshot);
        } else {
            // The stall logic keeps mispredictions inside the window; a miss
            // here would be a logic error, and restoring nothing is the
            // deterministic least-harm option.
            return;
        }

        for frame in rollback_to..self.frame {
            let inputs = self.inputs_for_frame(frame);
            user.process_frame_without_rendering(frame, &inputs);
            let snapshot = user.generate_snapshot(frame);
            let _ = self.snapshots.store(frame, snapshot);
            self.used_inputs.insert(frame, inputs);
        }

        user.on_post_rollback();
        self.first_incorrect_frame = None;
    }

    fn advance_frame(&mut self, user: &mut dyn RollbackUser<S>) {
        let inputs = self.inputs_for_frame(self.frame);
        user.process_frame(self.frame, &inputs);
        let snapshot = user.generate_snapshot(self.frame);
        let _ = self.snapshots.store(self.frame, snapshot);
        self.used_inputs.insert(self.frame, inputs);
        self.frame += 1;

        // Bound the bookkeeping to what rollback can still reach.
        let horizon = self.frame.saturating_sub(MAX_ROLLBACK_WINDOW * 2);
        self.used_inputs.retain(|frame, _| *frame >= horizon);
        for per_player in &mut self.confirmed_inputs {
            per_player.retain(|frame, _| *frame >= horizon);
        }
    }

    fn advance_confirmed_frontier(&mut self, user: &mut dyn RollbackUser<S>) {
        // The frontier is the newest frame every participant has confirmed
        // inputs for: local frames are confirmed as simulated, disconnected
        // peers are synthesized (never a constraint).
        let mut frontier = self.frame.saturating_sub(1);
        for player in 0..self.num_players {
            if player == self.local_player || self.disconnected[player] {
                continue;
            }
            match self.last_confirmed[player] {
                Some(confirmed) => frontier = frontier.min(confirmed),
                None => return,
            }
        }

        let start = match self.confirmed_frontier {
            Some(previous) if previous >= frontier => return,
            Some(previous) => previous + 1,
            None => 0,
        };
        for confirmed in start..=frontier {
            user.on_inputs_exit_rollback_window(confirmed);
        }
        self.confirmed_frontier = Some(frontier);
    }

    fn maybe_recommend_time_sync(&mut self, user: &mut dyn RollbackUser<S>) {
        if self.frame < self.next_recommendation_frame {
            return;
        }
        user.send_time_quality_report(self.frame);
        if self.recommended_sleep_frames > 0 {
            self.events.push(SessionEvent::TimeSync {
                frames_ahead: self.recommended_sleep_frames,
            });
        }
        self.next_recommendation_frame = self.frame + RECOMMENDATION_INTERVAL;
    }

    /// Remote player slots whose confirmed inputs trail the current frame
    /// by the full rollback window or more.
    fn stalling_players(&self) -> Vec<usize> {
        let frame = i64::from(self.frame);
        let window = i64::from(MAX_ROLLBACK_WINDOW);
        (0..self.num_players)
            .filter(|player| *player != self.local_player && !self.disconnected[*player])
            .filter(|player| {
                let confirmed = self.last_confirmed[*player].map_or(-1, i64::from);
                confirmed < frame - window
            })
            .collect()
    }

    /// Inputs for every player at `frame`: recorded local input, confirmed
    /// remote inputs, repeat-last prediction for the rest.
    fn inputs_for_frame(&self, frame: FrameType) -> Vec<PlayerInput> {
        (0..self.num_players)
            .map(|player| {
                if player == self.local_player {
                    self.history
                        .get(frame)
                        .unwrap_or(self.last_known_input[self.local_player])
                } else {
                    self.confirmed_inputs[player]
                        .get(&frame)
                        .copied()
                        .unwrap_or(self.last_known_input[player])
                }
            })
            .collect()
    }
}

impl<S: Snapshot> core::fmt::Debug for RollbackSession<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RollbackSession")
            .field("mode", &self.mode)
            .field("frame", &self.frame)
            .field("num_players", &self.num_players)
            .field("local_player", &self.local_player)
            .field("synchronized", &self.synchronized)
            .field("first_incorrect_frame", &self.first_incorrect_frame)
            .finish_non_exhaustive()
    }
}

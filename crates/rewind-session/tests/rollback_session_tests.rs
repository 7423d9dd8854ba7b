// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(
    missing_docs,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::cast_possible_truncation
)]
//! Integration tests for the rollback session: prediction, rollback
//! equivalence, stalling, and pause-skip prevention.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::rc::Rc;

use rewind_core::{
    ChecksumState, FrameType, Fp, StateChecksum, Vec3, MAX_ROLLBACK_WINDOW, MICROS_PER_FRAME,
};
use rewind_input::{Command, CommandSet, PlayerInput};
use rewind_session::{
    FrameClock, InputHistory, RollbackSession, RollbackUser, SessionError, SessionEvent, Snapshot,
    StallInfo, TickDecision,
};

#[derive(Debug, Clone, PartialEq, Eq)]
struct GameSnapshot {
    positions: Vec<Vec3>,
}

impl Snapshot for GameSnapshot {
    fn checksum(&self) -> u32 {
        let mut sum = StateChecksum::new();
        for position in &self.positions {
            position.accumulate(&mut sum);
        }
        sum.finish()
    }
}

/// Minimal deterministic two-ish-player game: forward axis slides along x,
/// a buffered jump pops the player up one unit.
struct TestGame {
    positions: Vec<Vec3>,
    local_script: BTreeMap<FrameType, PlayerInput>,
    rendered_frames: Vec<FrameType>,
    resimulated_frames: Vec<FrameType>,
    post_rollbacks: u32,
    stalls: Vec<StallInfo>,
    exited_window: Vec<FrameType>,
    quality_reports: u32,
}

impl TestGame {
    fn new(num_players: usize) -> Self {
        Self {
            positions: vec![Vec3::ZERO; num_players],
            local_script: BTreeMap::new(),
            rendered_frames: Vec::new(),
            resimulated_frames: Vec::new(),
            post_rollbacks: 0,
            stalls: Vec::new(),
            exited_window: Vec::new(),
            quality_reports: 0,
        }
    }

    fn apply(&mut self, inputs: &[PlayerInput]) {
        for (position, input) in self.positions.iter_mut().zip(inputs) {
            position.x += input.move_forward;
            if input.commands.is_set(Command::Jump) {
                position.z += Fp::ONE;
            }
        }
    }

    fn state_checksum(&self) -> u32 {
        GameSnapshot { positions: self.positions.clone() }.checksum()
    }
}

impl RollbackUser<GameSnapshot> for TestGame {
    fn generate_snapshot(&mut self, _frame: FrameType) -> GameSnapshot {
        GameSnapshot { positions: self.positions.clone() }
    }

    fn restore_snapshot(&mut self, _frame: FrameType, snapshot: &GameSnapshot) {
        self.positions = snapshot.positions.clone();
    }

    fn get_input_for_next_frame(&mut self, frame: FrameType) -> Option<PlayerInput> {
        Some(self.local_script.get(&frame).copied().unwrap_or_else(PlayerInput::neutral))
    }

    fn process_frame(&mut self, frame: FrameType, inputs_per_player: &[PlayerInput]) {
        self.rendered_frames.push(frame);
        self.apply(inputs_per_player);
    }

    fn process_frame_without_rendering(
        &mut self,
        frame: FrameType,
        inputs_per_player: &[PlayerInput],
    ) {
        self.resimulated_frames.push(frame);
        self.apply(inputs_per_player);
    }

    fn on_post_rollback(&mut self) {
        self.post_rollbacks += 1;
    }

    fn send_time_quality_report(&mut self, _frame: FrameType) {
        self.quality_reports += 1;
    }

    fn send_local_inputs_to_remote_players(&mut self, _frame: FrameType, _history: &InputHistory) {}

    fn on_stalling_for_remote_inputs(&mut self, info: &StallInfo) {
        self.stalls.push(info.clone());
    }

    fn on_inputs_exit_rollback_window(&mut self, confirmed_frame: FrameType) {
        self.exited_window.push(confirmed_frame);
    }
}

/// Session + game + scripted clock, advancing one frame of wall time per
/// tick.
struct Harness {
    session: RollbackSession<GameSnapshot>,
    game: TestGame,
    time: Rc<Cell<u64>>,
    started: bool,
}

const BASE_TIME: u64 = 50_000_000;

impl Harness {
    fn new(num_players: usize) -> Self {
        let time = Rc::new(Cell::new(BASE_TIME));
        let handle = Rc::clone(&time);
        let clock = FrameClock::with_time_source(Box::new(move || handle.get()));
        let mut session =
            RollbackSession::with_clock(num_players, 0, clock).expect("valid player layout");
        session.set_synchronized();
        Self { session, game: TestGame::new(num_players), time, started: false }
    }

    fn tick(&mut self) -> rewind_session::TickReport {
        if !self.started {
            self.session.start_session(&mut self.game);
            self.started = true;
        } else {
            self.time.set(self.time.get() + MICROS_PER_FRAME);
        }
        self.session.tick(&mut self.game).expect("session is running")
    }
}

fn jump_input() -> PlayerInput {
    let mut commands = CommandSet::new();
    commands.set(Command::Jump, true);
    PlayerInput { commands, ..PlayerInput::neutral() }
}

fn forward_input() -> PlayerInput {
    PlayerInput { move_forward: Fp::ONE, ..PlayerInput::neutral() }
}

#[test]
fn solo_session_advances_one_frame_per_tick() {
    let mut harness = Harness::new(1);
    for expected in 0..5_u32 {
        let report = harness.tick();
        assert_eq!(report.frames_advanced, 1);
        assert_eq!(report.decision, TickDecision::ProceedNormally);
        assert_eq!(harness.session.current_frame(), expected + 1);
    }
    assert_eq!(harness.game.rendered_frames, vec![0, 1, 2, 3, 4]);
    assert!(harness.game.resimulated_frames.is_empty());
    // Solo frames leave the window as soon as they are simulated.
    assert_eq!(harness.game.exited_window, vec![0, 1, 2, 3, 4]);
}

#[test]
fn late_remote_jump_rolls_back_and_matches_forward_simulation() {
    // Rollback path: peer 1 silent while frames 0..=5 simulate on neutral
    // prediction, then its inputs (jump on frame 3) arrive late.
    let mut late = Harness::new(2);
    late.game.local_script.insert(2, forward_input());
    for _ in 0..6 {
        late.tick();
    }
    assert_eq!(late.session.current_frame(), 6);

    let remote_inputs: Vec<PlayerInput> = (0..=5)
        .map(|frame| if frame == 3 { jump_input() } else { PlayerInput::neutral() })
        .collect();
    late.session.ingest_remote_inputs(1, 0, &remote_inputs).expect("peer 1 inputs");

    let report = late.tick();
    assert_eq!(report.decision, TickDecision::Rollback);
    // Re-simulated exactly the mispredicted tail before advancing frame 6.
    assert_eq!(late.game.resimulated_frames, vec![3, 4, 5]);
    assert_eq!(late.game.post_rollbacks, 1);
    assert_eq!(late.session.current_frame(), 7);

    // Reference path: the same inputs known before each frame simulates.
    let mut reference = Harness::new(2);
    reference.game.local_script.insert(2, forward_input());
    for frame in 0..7_u32 {
        if frame <= 5 {
            let input = if frame == 3 { jump_input() } else { PlayerInput::neutral() };
            reference.session.ingest_remote_inputs(1, frame, &[input]).expect("peer 1 input");
        }
        reference.tick();
    }

    assert_eq!(late.game.positions, reference.game.positions);
    assert_eq!(late.game.state_checksum(), reference.game.state_checksum());
    // The reference never mispredicted.
    assert!(reference.game.resimulated_frames.is_empty());
}

#[test]
fn session_stalls_after_a_window_of_remote_silence() {
    let mut harness = Harness::new(2);

    // Ticks 1..=8 advance frames 0..=7 on prediction alone.
    for _ in 0..8 {
        let report = harness.tick();
        assert_eq!(report.decision, TickDecision::ProceedNormally);
    }
    assert_eq!(harness.session.current_frame(), 8);

    // Ninth tick: peer 1 still silent, a full window behind. No progress.
    let report = harness.tick();
    assert_eq!(report.decision, TickDecision::WaitFrame);
    assert_eq!(report.frames_advanced, 0);
    assert_eq!(harness.session.current_frame(), 8);
    assert_eq!(harness.game.stalls.len(), 1);
    assert_eq!(harness.game.stalls[0].current_frame, 8);
    assert_eq!(harness.game.stalls[0].stalling_players, vec![1]);

    // Still stalled on further ticks.
    harness.tick();
    assert_eq!(harness.session.current_frame(), 8);

    // Confirmed inputs for frames 0..=1 unblock one frame of progress.
    harness
        .session
        .ingest_remote_inputs(1, 0, &[PlayerInput::neutral(), PlayerInput::neutral()])
        .expect("peer 1 inputs");
    let report = harness.tick();
    assert_eq!(report.frames_advanced, 1);
    assert_eq!(harness.session.current_frame(), 9);
}

#[test]
fn pause_skip_is_prevented() {
    let mut harness = Harness::new(1);
    harness.tick();

    harness.session.pause();
    assert!(harness.session.is_paused());
    let report = harness.session.tick(&mut harness.game).expect("running");
    assert_eq!(report.frames_advanced, 0);

    // Ten seconds pass while paused.
    harness.time.set(harness.time.get() + 10_000_000);
    harness.session.resume();
    let report = harness.session.tick(&mut harness.game).expect("running");
    // Exactly one frame, not six hundred.
    assert_eq!(report.frames_advanced, 1);
}

#[test]
fn identical_runs_produce_identical_checksums() {
    let run = || {
        let mut harness = Harness::new(2);
        for frame in 0..20_u32 {
            harness.game.local_script.insert(frame, forward_input());
        }
        let mut checksums = Vec::new();
        for frame in 0..20_u32 {
            let input = if frame % 3 == 0 { jump_input() } else { PlayerInput::neutral() };
            harness.session.ingest_remote_inputs(1, frame, &[input]).expect("peer input");
            harness.tick();
            checksums.push(harness.game.state_checksum());
        }
        checksums
    };
    assert_eq!(run(), run());
}

#[test]
fn confirmed_frames_exit_the_window_in_order() {
    let mut harness = Harness::new(2);
    for frame in 0..4_u32 {
        harness.session.ingest_remote_inputs(1, frame, &[PlayerInput::neutral()]).expect("input");
        harness.tick();
    }
    assert_eq!(harness.game.exited_window, vec![0, 1, 2, 3]);
    // The confirmed frontier's snapshot backs the wire checksum cross-check.
    assert_eq!(
        harness.session.confirmed_snapshot_checksum(),
        Some(harness.game.state_checksum())
    );
}

#[test]
fn disconnected_peer_stops_constraining_progress() {
    let mut harness = Harness::new(2);
    harness.session.ingest_remote_inputs(1, 0, &[forward_input()]).expect("input");
    harness.tick();

    harness.session.disconnect_player(1).expect("first disconnect");
    let report = harness.tick();
    assert!(report
        .events
        .iter()
        .any(|e| matches!(e, SessionEvent::PlayerDisconnected { player: 1 })));

    // A full window beyond the disconnect: no stall, last input repeats.
    for _ in 0..(MAX_ROLLBACK_WINDOW + 4) {
        let report = harness.tick();
        assert_eq!(report.decision, TickDecision::ProceedNormally);
    }
    // Peer 1 kept sliding forward on its last known input.
    let expected = Fp::from_num(i64::from(MAX_ROLLBACK_WINDOW) + 6);
    assert_eq!(harness.game.positions[1].x, expected);

    assert_eq!(
        harness.session.disconnect_player(1),
        Err(SessionError::PeerDisconnected(1))
    );
    assert_eq!(
        harness.session.ingest_remote_inputs(1, 5, &[PlayerInput::neutral()]),
        Err(SessionError::PeerDisconnected(1))
    );
}

#[test]
fn lifecycle_errors_are_explicit() {
    let mut game = TestGame::new(2);
    let mut session: RollbackSession<GameSnapshot> =
        RollbackSession::new(2, 0).expect("valid layout");

    // Not started yet.
    assert_eq!(session.tick(&mut game), Err(SessionError::NotStarted));
    assert_eq!(
        session.add_local_input(PlayerInput::neutral()),
        Err(SessionError::NotStarted)
    );

    session.start_session(&mut game);
    // Started but the handshake has not completed.
    assert_eq!(
        session.add_local_input(PlayerInput::neutral()),
        Err(SessionError::NotSynchronized)
    );

    session.set_synchronized();
    assert_eq!(session.add_local_input(PlayerInput::neutral()), Ok(0));

    // Bad player handles.
    assert_eq!(
        session.ingest_remote_inputs(7, 0, &[PlayerInput::neutral()]),
        Err(SessionError::PeerOutOfRange(7))
    );
    assert_eq!(
        session.ingest_remote_inputs(0, 0, &[PlayerInput::neutral()]),
        Err(SessionError::InvalidPlayerHandle(0))
    );
    assert_eq!(
        RollbackSession::<GameSnapshot>::new(2, 5).err(),
        Some(SessionError::InvalidPlayerHandle(5))
    );
}

#[test]
fn prediction_threshold_refuses_runaway_local_input() {
    let mut harness = Harness::new(2);
    for _ in 0..8 {
        harness.tick();
    }
    // Frame 8 with nothing confirmed: pushing more local input must refuse.
    assert_eq!(
        harness.session.add_local_input(PlayerInput::neutral()),
        Err(SessionError::PredictionThreshold)
    );
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(8))]

        /// Two independent in-process runs over the same scripted inputs
        /// produce identical state checksums at every frame.
        #[test]
        fn determinism_over_scripted_inputs(
            local_moves in proptest::collection::vec(-2_i64..=2, 12),
            remote_moves in proptest::collection::vec(-2_i64..=2, 12),
        ) {
            let run = |local: &[i64], remote: &[i64]| {
                let mut harness = Harness::new(2);
                for (frame, magnitude) in local.iter().enumerate() {
                    let input = PlayerInput {
                        move_forward: Fp::from_num(*magnitude),
                        ..PlayerInput::neutral()
                    };
                    harness.game.local_script.insert(frame as FrameType, input);
                }
                let mut checksums = Vec::new();
                for (frame, magnitude) in remote.iter().enumerate() {
                    let input = PlayerInput {
                        move_forward: Fp::from_num(*magnitude),
                        ..PlayerInput::neutral()
                    };
                    harness
                        .session
                        .ingest_remote_inputs(1, frame as FrameType, &[input])
                        .expect("peer input");
                    harness.tick();
                    checksums.push(harness.game.state_checksum());
                }
                checksums
            };
            prop_assert_eq!(run(&local_moves, &remote_moves), run(&local_moves, &remote_moves));
        }
    }
}

#[test]
fn time_sync_event_surfaces_recommended_sleep() {
    let mut harness = Harness::new(1);
    harness.session.set_recommended_sleep_frames(2);
    let report = harness.tick();
    assert!(report
        .events
        .iter()
        .any(|e| matches!(e, SessionEvent::TimeSync { frames_ahead: 2 })));
    assert_eq!(harness.game.quality_reports, 1);
}

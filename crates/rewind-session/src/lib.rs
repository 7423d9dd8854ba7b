// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! rewind-session: the rollback orchestration core.
//!
//! One [`session::RollbackSession`] per simulation instance, driven from
//! the host's main loop: collect the local input, ingest whatever arrived
//! from the network, decide (proceed / wait / rollback), re-simulate where
//! needed, advance one frame, snapshot. The session is single-threaded and
//! network-agnostic; the host wires
//! [`user::RollbackUser::send_local_inputs_to_remote_players`] to a
//! `rewind-net` [`rewind_net::PeerNetwork`] (or anything else).
#![forbid(unsafe_code)]

/// Pause/resume frame clock with catch-up bounding.
pub mod clock;

/// Ring of recent local inputs.
pub mod history;

/// Frame-keyed snapshot ring buffer.
pub mod snapshots;

/// Session user callbacks and events.
pub mod user;

/// The rollback session itself.
pub mod session;

/// Wiring between the session and the peer network.
pub mod glue;

pub use clock::{FrameClock, MAX_FRAMES_PER_POLL};
pub use glue::{apply_network_events, remote_slot_to_player};
pub use history::InputHistory;
pub use session::{RollbackSession, SessionError, TickDecision, TickReport};
pub use snapshots::{SnapshotError, SnapshotStore};
pub use user::{RollbackUser, SessionEvent, Snapshot, StallInfo};

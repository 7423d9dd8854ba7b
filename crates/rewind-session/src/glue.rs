// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Wiring between the session and the peer network.
//!
//! The per-frame data flow is: drain the [`rewind_net::PeerNetwork`], feed
//! what arrived into the [`RollbackSession`], then tick. This module holds
//! the mechanical parts of that loop so hosts do not re-derive the slot
//! mapping or the event routing.

use rewind_core::Logger;
use rewind_net::{EndpointEvent, NetworkEvent};

use crate::session::RollbackSession;
use crate::user::Snapshot;

/// Maps a remote endpoint slot to its session player index.
///
/// Endpoint slots cover only remote players in order; the local player
/// occupies one session index in between.
#[must_use]
pub fn remote_slot_to_player(local_player: usize, slot: usize) -> usize {
    slot + usize::from(slot >= local_player)
}

/// Applies one poll's worth of network events to the session.
///
/// Input runs are ingested as confirmed remote inputs, disconnects are
/// forwarded, and sync-progress events are left to the host (it decides
/// when to call [`RollbackSession::set_synchronized`], typically once
/// `PeerNetwork::all_players_synchronized` turns true).
pub fn apply_network_events<S: Snapshot>(
    session: &mut RollbackSession<S>,
    log: &dyn Logger,
    local_player: usize,
    events: &[NetworkEvent],
) {
    for event in events {
        let NetworkEvent::Player { slot, event } = event else {
            // Spectator links never feed inputs back.
            continue;
        };
        let player = remote_slot_to_player(local_player, *slot);
        match event {
            EndpointEvent::Input(message) => {
                let Some(run) = message.per_peer_inputs.first() else {
                    continue;
                };
                if let Err(error) =
                    session.ingest_remote_inputs(player, message.start_frame, run)
                {
                    log.warn(&format!("Ignoring input run from player {player}: {error}"));
                }
            }
            EndpointEvent::Disconnected => {
                if let Err(error) = session.disconnect_player(player) {
                    log.warn(&format!("Ignoring duplicate disconnect of player {player}: {error}"));
                }
            }
            EndpointEvent::Synchronizing { .. }
            | EndpointEvent::Synchronized
            | EndpointEvent::NetworkInterrupted { .. }
            | EndpointEvent::NetworkResumed => {}
        }
    }
}

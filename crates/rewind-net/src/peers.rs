// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Multi-peer endpoint management: routing, handshake tracking, spectator
//! fan-out.
//!
//! One [`PeerNetwork`] owns every endpoint of a session, player peers and
//! spectators alike, and routes inbound datagrams by transport peer id. Player
//! endpoints exchange inputs both ways; spectator endpoints only ever send
//! confirmed combined-input frames.

use rewind_core::{FrameType, Logger};
use rewind_input::PlayerInput;
use rewind_session_proto::InputMessage;

use crate::endpoint::{EndpointEvent, PeerEndpoint};
use crate::transport::{PeerId, Transport};

/// An endpoint event tagged with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkEvent {
    /// Event from a player peer (index into the remote player list).
    Player {
        /// Remote player slot.
        slot: usize,
        /// The underlying endpoint event.
        event: EndpointEvent,
    },
    /// Event from a spectator endpoint.
    Spectator {
        /// Spectator slot.
        slot: usize,
        /// The underlying endpoint event.
        event: EndpointEvent,
    },
}

/// Every peer link of one session.
#[derive(Debug)]
pub struct PeerNetwork {
    players: Vec<PeerEndpoint>,
    spectators: Vec<PeerEndpoint>,
    next_spectator_frame: FrameType,
}

impl PeerNetwork {
    /// Creates endpoints for the given remote players and spectators.
    #[must_use]
    pub fn new(remote_players: &[PeerId], spectators: &[PeerId]) -> Self {
        Self {
            players: remote_players.iter().map(|id| PeerEndpoint::new(*id)).collect(),
            spectators: spectators.iter().map(|id| PeerEndpoint::new(*id)).collect(),
            next_spectator_frame: 0,
        }
    }

    /// Remote player endpoints, in slot order.
    #[must_use]
    pub fn players(&self) -> &[PeerEndpoint] {
        &self.players
    }

    /// Starts the handshake on every endpoint.
    pub fn synchronize(&mut self, transport: &mut dyn Transport, now_micros: u64) {
        for endpoint in self.players.iter_mut().chain(self.spectators.iter_mut()) {
            endpoint.synchronize(transport, now_micros);
        }
    }

    /// True once every player endpoint finished its handshake (disconnected
    /// peers no longer count against readiness).
    #[must_use]
    pub fn all_players_synchronized(&self) -> bool {
        self.players.iter().all(|e| e.is_running() || e.is_disconnected())
    }

    /// Drains the transport, routes packets to their endpoints, pumps every
    /// endpoint's timers, and returns all surfaced events.
    pub fn poll(
        &mut self,
        log: &dyn Logger,
        transport: &mut dyn Transport,
        now_micros: u64,
    ) -> Vec<NetworkEvent> {
        while let Some((from, bytes)) = transport.receive_from() {
            let Some(endpoint) = self
                .players
                .iter_mut()
                .chain(self.spectators.iter_mut())
                .find(|e| e.peer() == from)
            else {
                log.warn(&format!("Dropping packet from unknown peer {from}"));
                continue;
            };
            endpoint.on_packet(log, transport, now_micros, &bytes);
        }

        let mut events = Vec::new();
        for (slot, endpoint) in self.players.iter_mut().enumerate() {
            endpoint.pump(transport, now_micros);
            while let Some(event) = endpoint.poll_event() {
                events.push(NetworkEvent::Player { slot, event });
            }
        }
        for (slot, endpoint) in self.spectators.iter_mut().enumerate() {
            endpoint.pump(transport, now_micros);
            while let Some(event) = endpoint.poll_event() {
                events.push(NetworkEvent::Spectator { slot, event });
            }
        }
        events
    }

    /// Sends the local input for `frame` to every running player peer.
    pub fn send_local_input(
        &mut self,
        transport: &mut dyn Transport,
        now_micros: u64,
        frame: FrameType,
        input: PlayerInput,
        last_received_frames: &[u32],
        state_checksum: u16,
    ) {
        for endpoint in &mut self.players {
            if endpoint.is_running() {
                endpoint.send_input(
                    transport,
                    now_micros,
                    frame,
                    input,
                    last_received_frames.to_vec(),
                    state_checksum,
                );
            }
        }
    }

    /// Records the local frame advantage on every player endpoint.
    pub fn set_local_frame_advantage(&mut self, frames: i8) {
        for endpoint in &mut self.players {
            endpoint.set_local_frame_advantage(frames);
        }
    }

    /// Largest recommended sleep across player peers, in frames.
    #[must_use]
    pub fn recommended_sleep_frames(&self) -> u32 {
        self.players.iter().map(PeerEndpoint::recommend_frame_delay).max().unwrap_or(0)
    }

    /// Next frame owed to spectators.
    #[must_use]
    pub fn next_spectator_frame(&self) -> FrameType {
        self.next_spectator_frame
    }

    /// Fans one confirmed combined-inputs frame out to every spectator and
    /// advances the spectator frontier.
    pub fn broadcast_spectator_frame(
        &mut self,
        transport: &mut dyn Transport,
        now_micros: u64,
        frame: FrameType,
        inputs_per_player: &[PlayerInput],
    ) {
        let message = InputMessage {
            start_frame: frame,
            per_peer_inputs: inputs_per_player.iter().map(|i| vec![*i]).collect(),
            last_received_frames: Vec::new(),
            state_checksum: 0,
        };
        for endpoint in &mut self.spectators {
            endpoint.send_spectator_frame(transport, now_micros, message.clone());
        }
        self.next_spectator_frame = frame + 1;
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::transport::LoopbackTransport;
    use rewind_core::NullLogger;
    use rewind_session_proto::{decode, Message};

    #[test]
    fn unknown_sources_are_dropped_with_a_warning() {
        let log = rewind_core::RecordingLogger::new();
        let mut network = PeerNetwork::new(&[1], &[]);
        let mut transport = LoopbackTransport::new();
        transport.push_inbound(99, vec![7, 0, 0]);
        let events = network.poll(&log, &mut transport, 0);
        assert!(events.is_empty());
        assert_eq!(log.count_at(rewind_core::LogLevel::Warn), 1);
    }

    #[test]
    fn spectator_broadcast_advances_the_frontier() {
        let mut network = PeerNetwork::new(&[], &[5]);
        let mut transport = LoopbackTransport::new();
        // Force the spectator link into Running by completing a handshake.
        network.synchronize(&mut transport, 0);
        let mut handshaken = false;
        for _ in 0..crate::endpoint::SYNC_ROUNDTRIPS {
            let sent = transport.drain_sent();
            for (_, bytes) in sent {
                let envelope = decode(&bytes).expect("valid");
                if let Message::SyncRequest { random } = envelope.message {
                    let reply = rewind_session_proto::Envelope {
                        sequence: 0,
                        message: Message::SyncReply { random },
                    };
                    transport.push_inbound(5, rewind_session_proto::encode(&reply));
                    handshaken = true;
                }
            }
            network.poll(&NullLogger, &mut transport, 0);
        }
        assert!(handshaken);

        assert_eq!(network.next_spectator_frame(), 0);
        network.broadcast_spectator_frame(&mut transport, 1, 0, &[PlayerInput::neutral()]);
        assert_eq!(network.next_spectator_frame(), 1);
        let sent = transport.drain_sent();
        let inputs = sent
            .iter()
            .filter(|(_, bytes)| {
                matches!(decode(bytes).map(|e| e.message), Ok(Message::Input(_)))
            })
            .count();
        assert_eq!(inputs, 1);
    }
}

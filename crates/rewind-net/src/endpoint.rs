// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Per-peer protocol state machine.
//!
//! Connection lifecycle: `Syncing → Running → Disconnected`. Synchronizing
//! is a nonce handshake ([`SYNC_ROUNDTRIPS`] completed echoes); Running
//! exchanges input runs, acks, and link-quality reports; a peer silent past
//! [`DISCONNECT_TIMEOUT_MICROS`] is Disconnected for good.
//!
//! Input delivery is redundant rather than reliable: every send bundles all
//! local inputs the peer has not acked (capped at the rollback window), so
//! one lost datagram heals on the next send without retransmission timers.

use std::collections::VecDeque;

use rand::Rng;

use rewind_core::{FrameType, Logger};
use rewind_input::PlayerInput;
use rewind_session_proto::{
    decode, encode, Envelope, InputMessage, Message, WireError, MAX_INPUT_RUN, NO_FRAME_RECEIVED,
};

use crate::transport::{PeerId, Transport};

/// Completed request/reply roundtrips required before a link is Running.
pub const SYNC_ROUNDTRIPS: u32 = 5;

/// Resend interval for unanswered sync requests.
pub const SYNC_RETRY_MICROS: u64 = 2_000_000;

/// Interval between link-quality reports while Running.
pub const QUALITY_REPORT_MICROS: u64 = 1_000_000;

/// Idle interval after which a keepalive goes out.
pub const KEEP_ALIVE_MICROS: u64 = 200_000;

/// Silence threshold for declaring the peer gone (5000 ms).
pub const DISCONNECT_TIMEOUT_MICROS: u64 = 5_000_000;

/// Silence threshold for warning the user about an interruption (750 ms).
pub const DISCONNECT_NOTIFY_MICROS: u64 = 750_000;

/// Lifecycle state of one peer link.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EndpointState {
    /// Nonce handshake in progress.
    Syncing {
        /// Roundtrips still outstanding.
        roundtrips_remaining: u32,
        /// Nonce the next reply must echo.
        random: u32,
    },
    /// Link is live; inputs flow.
    Running,
    /// Peer is gone; terminal.
    Disconnected,
}

/// Events surfaced to the session by [`PeerEndpoint::poll_event`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointEvent {
    /// A handshake roundtrip completed.
    Synchronizing {
        /// Completed roundtrips.
        count: u32,
        /// Required roundtrips.
        total: u32,
    },
    /// Handshake finished; the link is Running.
    Synchronized,
    /// An input run arrived (already deduplicated against previously
    /// delivered frames).
    Input(InputMessage),
    /// The peer has been silent past the notify threshold.
    NetworkInterrupted {
        /// Microseconds of silence after which the link dies.
        disconnect_timeout_micros: u64,
    },
    /// The peer spoke again after an interruption notice.
    NetworkResumed,
    /// The peer has been silent past the disconnect timeout. Terminal.
    Disconnected,
}

/// Protocol endpoint for a single remote peer.
#[derive(Debug)]
pub struct PeerEndpoint {
    peer: PeerId,
    state: EndpointState,
    next_send_sequence: u16,

    // Receive-side bookkeeping.
    last_receive_time_micros: u64,
    received_anything: bool,
    interruption_notified: bool,

    // Send-side bookkeeping.
    last_send_time_micros: u64,
    sync_requested: bool,
    last_sync_request_micros: u64,
    last_quality_report_micros: u64,

    // Input flow.
    pending_outputs: VecDeque<(FrameType, PlayerInput)>,
    last_received_input_frame: Option<FrameType>,
    last_acked_input_frame: Option<FrameType>,
    peer_reported_last_received: Vec<u32>,

    // Link quality.
    local_frame_advantage: i8,
    remote_frame_advantage: i8,
    round_trip_micros: u64,

    events: VecDeque<EndpointEvent>,
}

impl PeerEndpoint {
    /// Creates an endpoint for `peer`, waiting to synchronize. The nonce is
    /// re-armed by [`PeerEndpoint::synchronize`]; nothing is sent until
    /// then.
    #[must_use]
    pub fn new(peer: PeerId) -> Self {
        Self {
            peer,
            state: EndpointState::Syncing { roundtrips_remaining: SYNC_ROUNDTRIPS, random: 0 },
            next_send_sequence: 0,
            last_receive_time_micros: 0,
            received_anything: false,
            interruption_notified: false,
            last_send_time_micros: 0,
            sync_requested: false,
            last_sync_request_micros: 0,
            last_quality_report_micros: 0,
            pending_outputs: VecDeque::new(),
            last_received_input_frame: None,
            last_acked_input_frame: None,
            peer_reported_last_received: Vec::new(),
            local_frame_advantage: 0,
            remote_frame_advantage: 0,
            round_trip_micros: 0,
            events: VecDeque::new(),
        }
    }

    /// The peer this endpoint talks to.
    #[must_use]
    pub fn peer(&self) -> PeerId {
        self.peer
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> EndpointState {
        self.state
    }

    /// True once the handshake completed (and the peer has not dropped).
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state == EndpointState::Running
    }

    /// True when the link is gone for good.
    #[must_use]
    pub fn is_disconnected(&self) -> bool {
        self.state == EndpointState::Disconnected
    }

    /// Highest input frame received from this peer, if any.
    #[must_use]
    pub fn last_received_input_frame(&self) -> Option<FrameType> {
        self.last_received_input_frame
    }

    /// Highest of our input frames this peer has acked, if any.
    #[must_use]
    pub fn last_acked_input_frame(&self) -> Option<FrameType> {
        self.last_acked_input_frame
    }

    /// The peer's reported per-peer progress from its latest input trailer.
    #[must_use]
    pub fn peer_reported_last_received(&self) -> &[u32] {
        &self.peer_reported_last_received
    }

    /// Estimated round-trip time in microseconds (0 until measured).
    #[must_use]
    pub fn round_trip_micros(&self) -> u64 {
        self.round_trip_micros
    }

    /// Records how far ahead of this peer the local simulation runs; feeds
    /// the next quality report.
    pub fn set_local_frame_advantage(&mut self, frames: i8) {
        self.local_frame_advantage = frames;
    }

    /// Frames the local side should sleep so this peer can catch up:
    /// half the advantage gap, never negative.
    #[must_use]
    pub fn recommend_frame_delay(&self) -> u32 {
        let gap = i32::from(self.remote_frame_advantage) - i32::from(self.local_frame_advantage);
        (gap / 2).max(0).unsigned_abs()
    }

    /// Begins the handshake.
    pub fn synchronize(&mut self, transport: &mut dyn Transport, now_micros: u64) {
        let random = rand::thread_rng().gen();
        self.state =
            EndpointState::Syncing { roundtrips_remaining: SYNC_ROUNDTRIPS, random };
        self.sync_requested = true;
        self.last_receive_time_micros = now_micros;
        self.send_sync_request(transport, now_micros, random);
    }

    /// Pops the next pending event.
    pub fn poll_event(&mut self) -> Option<EndpointEvent> {
        self.events.pop_front()
    }

    /// Queues the local input for `frame` and sends every unacked input as
    /// one bundle.
    pub fn send_input(
        &mut self,
        transport: &mut dyn Transport,
        now_micros: u64,
        frame: FrameType,
        input: PlayerInput,
        last_received_frames: Vec<u32>,
        state_checksum: u16,
    ) {
        if self.is_disconnected() {
            return;
        }
        self.pending_outputs.push_back((frame, input));
        while self.pending_outputs.len() > MAX_INPUT_RUN {
            // Beyond the rollback window the stale input can never matter.
            self.pending_outputs.pop_front();
        }

        let Some(&(start_frame, _)) = self.pending_outputs.front() else {
            return;
        };
        let run = self.pending_outputs.iter().map(|(_, i)| *i).collect();
        let message = Message::Input(InputMessage {
            start_frame,
            per_peer_inputs: vec![run],
            last_received_frames,
            state_checksum,
        });
        self.send(transport, now_micros, message);
    }

    /// Sends a pre-built combined-inputs message (spectator fan-out).
    pub fn send_spectator_frame(
        &mut self,
        transport: &mut dyn Transport,
        now_micros: u64,
        message: InputMessage,
    ) {
        if self.is_disconnected() {
            return;
        }
        self.send(transport, now_micros, Message::Input(message));
    }

    /// Feeds one received packet into the state machine.
    pub fn on_packet(
        &mut self,
        log: &dyn Logger,
        transport: &mut dyn Transport,
        now_micros: u64,
        bytes: &[u8],
    ) {
        let envelope = match decode(bytes) {
            Ok(envelope) => envelope,
            Err(error) => {
                self.log_wire_error(log, &error);
                return;
            }
        };

        self.last_receive_time_micros = now_micros;
        self.received_anything = true;
        if self.interruption_notified && !self.is_disconnected() {
            self.interruption_notified = false;
            self.events.push_back(EndpointEvent::NetworkResumed);
        }

        match envelope.message {
            Message::SyncRequest { random } => {
                // Always answer, whatever our own state: the peer's
                // handshake must be able to finish.
                self.send(transport, now_micros, Message::SyncReply { random });
            }
            Message::SyncReply { random } => self.on_sync_reply(transport, now_micros, random),
            Message::Input(input) => self.on_input(transport, now_micros, input),
            Message::InputAck { ack_frame } => self.on_input_ack(ack_frame),
            Message::QualityReport { frame_advantage, ping } => {
                self.remote_frame_advantage = frame_advantage;
                self.send(transport, now_micros, Message::QualityReply { pong: ping });
            }
            Message::QualityReply { pong } => {
                self.round_trip_micros = now_micros.saturating_sub(pong);
            }
            Message::KeepAlive => {}
        }
    }

    /// Drives timers: sync retries, quality reports, keepalives, and
    /// disconnect detection. Call once per session tick.
    pub fn pump(&mut self, transport: &mut dyn Transport, now_micros: u64) {
        match self.state {
            EndpointState::Syncing { random, .. } => {
                if self.sync_requested
                    && now_micros.saturating_sub(self.last_sync_request_micros)
                        >= SYNC_RETRY_MICROS
                {
                    self.send_sync_request(transport, now_micros, random);
                }
            }
            EndpointState::Running => {
                if now_micros.saturating_sub(self.last_quality_report_micros)
                    >= QUALITY_REPORT_MICROS
                {
                    self.last_quality_report_micros = now_micros;
                    let report = Message::QualityReport {
                        frame_advantage: self.local_frame_advantage,
                        ping: now_micros,
                    };
                    self.send(transport, now_micros, report);
                }
                if now_micros.saturating_sub(self.last_send_time_micros) >= KEEP_ALIVE_MICROS {
                    self.send(transport, now_micros, Message::KeepAlive);
                }
            }
            EndpointState::Disconnected => return,
        }

        self.check_silence(now_micros);
    }

    fn check_silence(&mut self, now_micros: u64) {
        if !self.received_anything {
            return;
        }
        let silence = now_micros.saturating_sub(self.last_receive_time_micros);
        if silence >= DISCONNECT_TIMEOUT_MICROS {
            self.state = EndpointState::Disconnected;
            self.events.push_back(EndpointEvent::Disconnected);
        } else if silence >= DISCONNECT_NOTIFY_MICROS && !self.interruption_notified {
            self.interruption_notified = true;
            self.events.push_back(EndpointEvent::NetworkInterrupted {
                disconnect_timeout_micros: DISCONNECT_TIMEOUT_MICROS,
            });
        }
    }

    fn on_sync_reply(&mut self, transport: &mut dyn Transport, now_micros: u64, random: u32) {
        let EndpointState::Syncing { roundtrips_remaining, random: expected } = self.state else {
            return;
        };
        if random != expected {
            // Stale or spoofed reply; the retry timer will re-probe.
            return;
        }

        let remaining = roundtrips_remaining - 1;
        self.events.push_back(EndpointEvent::Synchronizing {
            count: SYNC_ROUNDTRIPS - remaining,
            total: SYNC_ROUNDTRIPS,
        });
        if remaining == 0 {
            self.state = EndpointState::Running;
            self.events.push_back(EndpointEvent::Synchronized);
            return;
        }
        let next_random = rand::thread_rng().gen();
        self.state =
            EndpointState::Syncing { roundtrips_remaining: remaining, random: next_random };
        self.send_sync_request(transport, now_micros, next_random);
    }

    // run lengths are capped at MAX_INPUT_RUN, far below u32.
    #[allow(clippy::cast_possible_truncation)]
    fn on_input(&mut self, transport: &mut dyn Transport, now_micros: u64, input: InputMessage) {
        self.peer_reported_last_received = input.last_received_frames.clone();

        let run_length = input.input_count();
        if run_length == 0 {
            return;
        }
        let newest_frame = input.start_frame + (run_length as u32) - 1;

        // Only surface frames newer than anything already delivered; the
        // redundant bundling makes overlap the common case.
        let already_have =
            self.last_received_input_frame.map_or(false, |last| newest_frame <= last);
        if !already_have {
            self.last_received_input_frame = Some(newest_frame);
            self.events.push_back(EndpointEvent::Input(input));
        }

        self.send(transport, now_micros, Message::InputAck { ack_frame: newest_frame });
    }

    fn on_input_ack(&mut self, ack_frame: FrameType) {
        self.last_acked_input_frame = Some(match self.last_acked_input_frame {
            Some(last) => last.max(ack_frame),
            None => ack_frame,
        });
        while let Some(&(frame, _)) = self.pending_outputs.front() {
            if frame <= ack_frame {
                self.pending_outputs.pop_front();
            } else {
                break;
            }
        }
    }

    fn send_sync_request(&mut self, transport: &mut dyn Transport, now_micros: u64, random: u32) {
        self.last_sync_request_micros = now_micros;
        self.send(transport, now_micros, Message::SyncRequest { random });
    }

    fn send(&mut self, transport: &mut dyn Transport, now_micros: u64, message: Message) {
        let envelope = Envelope { sequence: self.next_send_sequence, message };
        self.next_send_sequence = self.next_send_sequence.wrapping_add(1);
        self.last_send_time_micros = now_micros;
        transport.send_to(self.peer, &encode(&envelope), 0);
    }

    fn log_wire_error(&self, log: &dyn Logger, error: &WireError) {
        log.warn(&format!("Dropping malformed packet from peer {}: {error}", self.peer));
    }
}

/// Builds the per-peer trailer value for an input message.
#[must_use]
pub fn trailer_frame(last_received: Option<FrameType>) -> u32 {
    last_received.map_or(NO_FRAME_RECEIVED, |frame| frame)
}

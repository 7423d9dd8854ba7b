// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Peer wire schema for the rollback session layer.
//!
//! Every message rides in an [`Envelope`] carrying a u8 type tag and a u16
//! sequence number. Multibyte integers and fixed-point values are encoded
//! little-endian; fp values travel as their raw `i64` representation. The
//! byte layout is contractual (it is what peers checksum and replay), so
//! framing is hand-rolled in [`wire`] rather than delegated to a
//! self-describing serializer.

use rewind_core::FrameType;
use rewind_input::PlayerInput;

pub mod wire;

pub use wire::{decode, encode, WireError};

/// Longest run of per-frame inputs one message may carry (the rollback
/// window; anything older is either confirmed everywhere or lost anyway).
pub const MAX_INPUT_RUN: usize = rewind_core::MAX_ROLLBACK_WINDOW as usize;

/// Most peers a session supports on the wire.
pub const MAX_PEERS: usize = 8;

/// Sentinel "no frame received yet" value for the input trailer.
pub const NO_FRAME_RECEIVED: u32 = u32::MAX;

/// A run of inputs for consecutive frames, with the sender's view of every
/// peer's progress.
///
/// Senders bundle every not-yet-acked local input (capped at
/// [`MAX_INPUT_RUN`]) into each packet, so a single lost datagram heals on
/// the next send without retransmission timers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputMessage {
    /// Frame of the first input in each run.
    pub start_frame: FrameType,
    /// Input runs, one per covered peer. Each inner run holds the inputs
    /// for `start_frame`, `start_frame + 1`, … in order, all runs the same
    /// length. Player-to-player traffic covers one peer (the sender);
    /// spectator fan-out covers every player.
    pub per_peer_inputs: Vec<Vec<PlayerInput>>,
    /// The sender's last received frame per peer ([`NO_FRAME_RECEIVED`]
    /// when nothing arrived yet). Feeds disconnect detection.
    pub last_received_frames: Vec<u32>,
    /// Low 16 bits of the sender's newest confirmed-snapshot checksum; an
    /// optional cross-check for desync diagnostics.
    pub state_checksum: u16,
}

impl InputMessage {
    /// Number of frames in each run.
    #[must_use]
    pub fn input_count(&self) -> usize {
        self.per_peer_inputs.first().map_or(0, Vec::len)
    }
}

/// Peer protocol message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Handshake probe carrying a random nonce.
    SyncRequest {
        /// Nonce the reply must echo.
        random: u32,
    },
    /// Handshake echo of a [`Message::SyncRequest`] nonce.
    SyncReply {
        /// Echoed nonce.
        random: u32,
    },
    /// Run of inputs plus sender progress (see [`InputMessage`]).
    Input(InputMessage),
    /// Highest frame the sender has received input for.
    InputAck {
        /// Highest confirmed frame.
        ack_frame: FrameType,
    },
    /// Periodic link-quality probe.
    QualityReport {
        /// How many frames the sender believes it runs ahead of the
        /// receiver (negative: behind).
        frame_advantage: i8,
        /// Sender timestamp in microseconds, echoed by the reply.
        ping: u64,
    },
    /// Echo of a [`Message::QualityReport`] timestamp.
    QualityReply {
        /// Echoed timestamp.
        pong: u64,
    },
    /// Keeps the link warm when there is nothing else to say.
    KeepAlive,
}

impl Message {
    /// Message-type name for diagnostics.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Message::SyncRequest { .. } => "sync_request",
            Message::SyncReply { .. } => "sync_reply",
            Message::Input(_) => "input",
            Message::InputAck { .. } => "input_ack",
            Message::QualityReport { .. } => "quality_report",
            Message::QualityReply { .. } => "quality_reply",
            Message::KeepAlive => "keep_alive",
        }
    }
}

/// One framed message: sequence header plus body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Sender's per-connection sequence number (wraps).
    pub sequence: u16,
    /// The message body.
    pub message: Message,
}

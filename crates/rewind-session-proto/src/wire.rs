// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Little-endian framing for session messages.

use bytes::{Buf, BufMut};
use thiserror::Error;

use rewind_core::Fp;
use rewind_input::PlayerInput;

use crate::{Envelope, InputMessage, Message, MAX_INPUT_RUN, MAX_PEERS};

const TAG_SYNC_REQUEST: u8 = 1;
const TAG_SYNC_REPLY: u8 = 2;
const TAG_INPUT: u8 = 3;
const TAG_INPUT_ACK: u8 = 4;
const TAG_QUALITY_REPORT: u8 = 5;
const TAG_QUALITY_REPLY: u8 = 6;
const TAG_KEEP_ALIVE: u8 = 7;

/// Decoding failure.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WireError {
    /// Packet ended before the advertised fields did.
    #[error("packet truncated")]
    UnexpectedEnd,
    /// Unknown message type tag.
    #[error("unknown message type tag {0}")]
    UnknownMessageType(u8),
    /// Input run longer than the rollback window.
    #[error("input run of {0} exceeds the maximum of {MAX_INPUT_RUN}")]
    InputRunTooLong(u8),
    /// More peers than the protocol supports.
    #[error("peer count {0} exceeds the maximum of {MAX_PEERS}")]
    TooManyPeers(u8),
    /// Bytes left over after the message body.
    #[error("{0} trailing bytes after message body")]
    TrailingBytes(usize),
}

/// Encodes an envelope into a fresh byte vector.
#[must_use]
pub fn encode(envelope: &Envelope) -> Vec<u8> {
    let mut out = Vec::with_capacity(16);
    out.put_u8(tag_of(&envelope.message));
    out.put_u16_le(envelope.sequence);
    match &envelope.message {
        Message::SyncRequest { random } | Message::SyncReply { random } => {
            out.put_u32_le(*random);
        }
        Message::Input(input) => encode_input(&mut out, input),
        Message::InputAck { ack_frame } => out.put_u32_le(*ack_frame),
        Message::QualityReport { frame_advantage, ping } => {
            out.put_i8(*frame_advantage);
            out.put_u64_le(*ping);
        }
        Message::QualityReply { pong } => out.put_u64_le(*pong),
        Message::KeepAlive => {}
    }
    out
}

/// Decodes an envelope, requiring the packet to contain exactly one.
pub fn decode(mut bytes: &[u8]) -> Result<Envelope, WireError> {
    let buf = &mut bytes;
    let tag = take_u8(buf)?;
    let sequence = take_u16(buf)?;
    let message = match tag {
        TAG_SYNC_REQUEST => Message::SyncRequest { random: take_u32(buf)? },
        TAG_SYNC_REPLY => Message::SyncReply { random: take_u32(buf)? },
        TAG_INPUT => Message::Input(decode_input(buf)?),
        TAG_INPUT_ACK => Message::InputAck { ack_frame: take_u32(buf)? },
        TAG_QUALITY_REPORT => {
            let frame_advantage = i8::from_le_bytes([take_u8(buf)?]);
            let ping = take_u64(buf)?;
            Message::QualityReport { frame_advantage, ping }
        }
        TAG_QUALITY_REPLY => Message::QualityReply { pong: take_u64(buf)? },
        TAG_KEEP_ALIVE => Message::KeepAlive,
        unknown => return Err(WireError::UnknownMessageType(unknown)),
    };
    if !bytes.is_empty() {
        return Err(WireError::TrailingBytes(bytes.len()));
    }
    Ok(Envelope { sequence, message })
}

fn tag_of(message: &Message) -> u8 {
    match message {
        Message::SyncRequest { .. } => TAG_SYNC_REQUEST,
        Message::SyncReply { .. } => TAG_SYNC_REPLY,
        Message::Input(_) => TAG_INPUT,
        Message::InputAck { .. } => TAG_INPUT_ACK,
        Message::QualityReport { .. } => TAG_QUALITY_REPORT,
        Message::QualityReply { .. } => TAG_QUALITY_REPLY,
        Message::KeepAlive => TAG_KEEP_ALIVE,
    }
}

#[allow(clippy::cast_possible_truncation)]
fn encode_input(out: &mut Vec<u8>, input: &InputMessage) {
    out.put_u32_le(input.start_frame);
    out.put_u8(input.input_count() as u8);
    out.put_u8(input.per_peer_inputs.len() as u8);
    for run in &input.per_peer_inputs {
        for sample in run {
            for axis in sample.wire_axes() {
                out.put_i64_le(axis.raw());
            }
            out.put_u32_le(sample.commands.to_bits());
        }
    }
    out.put_u8(input.last_received_frames.len() as u8);
    for frame in &input.last_received_frames {
        out.put_u32_le(*frame);
    }
    out.put_u16_le(input.state_checksum);
}

fn decode_input(buf: &mut &[u8]) -> Result<InputMessage, WireError> {
    let start_frame = take_u32(buf)?;
    let input_count = take_u8(buf)?;
    if input_count as usize > MAX_INPUT_RUN {
        return Err(WireError::InputRunTooLong(input_count));
    }
    let peer_count = take_u8(buf)?;
    if peer_count as usize > MAX_PEERS {
        return Err(WireError::TooManyPeers(peer_count));
    }

    let mut per_peer_inputs = Vec::with_capacity(peer_count as usize);
    for _ in 0..peer_count {
        let mut run = Vec::with_capacity(input_count as usize);
        for _ in 0..input_count {
            let mut axes = [Fp::ZERO; 4];
            for axis in &mut axes {
                *axis = Fp::from_raw(take_i64(buf)?);
            }
            let command_bits = take_u32(buf)?;
            run.push(PlayerInput::from_wire(axes, command_bits));
        }
        per_peer_inputs.push(run);
    }

    let trailer_count = take_u8(buf)?;
    if trailer_count as usize > MAX_PEERS {
        return Err(WireError::TooManyPeers(trailer_count));
    }
    let mut last_received_frames = Vec::with_capacity(trailer_count as usize);
    for _ in 0..trailer_count {
        last_received_frames.push(take_u32(buf)?);
    }
    let state_checksum = take_u16(buf)?;

    Ok(InputMessage { start_frame, per_peer_inputs, last_received_frames, state_checksum })
}

fn take_u8(buf: &mut &[u8]) -> Result<u8, WireError> {
    if buf.remaining() < 1 {
        return Err(WireError::UnexpectedEnd);
    }
    Ok(buf.get_u8())
}

fn take_u16(buf: &mut &[u8]) -> Result<u16, WireError> {
    if buf.remaining() < 2 {
        return Err(WireError::UnexpectedEnd);
    }
    Ok(buf.get_u16_le())
}

fn take_u32(buf: &mut &[u8]) -> Result<u32, WireError> {
    if buf.remaining() < 4 {
        return Err(WireError::UnexpectedEnd);
    }
    Ok(buf.get_u32_le())
}

fn take_u64(buf: &mut &[u8]) -> Result<u64, WireError> {
    if buf.remaining() < 8 {
        return Err(WireError::UnexpectedEnd);
    }
    Ok(buf.get_u64_le())
}

fn take_i64(buf: &mut &[u8]) -> Result<i64, WireError> {
    if buf.remaining() < 8 {
        return Err(WireError::UnexpectedEnd);
    }
    Ok(buf.get_i64_le())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rewind_input::{Command, CommandSet};

    fn round_trip(message: Message) {
        let envelope = Envelope { sequence: 42, message };
        let bytes = encode(&envelope);
        let decoded = decode(&bytes).expect("decode must succeed");
        assert_eq!(decoded, envelope);
    }

    #[test]
    fn every_message_kind_round_trips() {
        round_trip(Message::SyncRequest { random: 0xDEAD_BEEF });
        round_trip(Message::SyncReply { random: 7 });
        round_trip(Message::InputAck { ack_frame: 900 });
        round_trip(Message::QualityReport { frame_advantage: -3, ping: 123_456 });
        round_trip(Message::QualityReply { pong: 123_456 });
        round_trip(Message::KeepAlive);
    }

    #[test]
    fn input_message_round_trips() {
        let mut commands = CommandSet::new();
        commands.set(Command::Jump, true);
        let sample = PlayerInput {
            move_forward: Fp::HALF,
            move_right: -Fp::frac(1, 4),
            commands,
            ..PlayerInput::neutral()
        };
        let message = Message::Input(InputMessage {
            start_frame: 120,
            per_peer_inputs: vec![vec![sample, PlayerInput::neutral()]],
            last_received_frames: vec![119, crate::NO_FRAME_RECEIVED],
            state_checksum: 0xBEEF,
        });
        round_trip(message);
    }

    #[test]
    fn header_layout_is_tag_then_sequence_le() {
        let bytes = encode(&Envelope { sequence: 0x0102, message: Message::KeepAlive });
        assert_eq!(bytes, vec![TAG_KEEP_ALIVE, 0x02, 0x01]);
    }

    #[test]
    fn ack_payload_is_little_endian() {
        let bytes =
            encode(&Envelope { sequence: 0, message: Message::InputAck { ack_frame: 0x0A0B_0C0D } });
        assert_eq!(bytes[3..], [0x0D, 0x0C, 0x0B, 0x0A]);
    }

    #[test]
    fn truncated_packets_are_rejected() {
        let bytes = encode(&Envelope {
            sequence: 3,
            message: Message::SyncRequest { random: 99 },
        });
        for cut in 0..bytes.len() {
            assert_eq!(decode(&bytes[..cut]), Err(WireError::UnexpectedEnd));
        }
    }

    #[test]
    fn unknown_tags_and_trailing_bytes_are_rejected() {
        assert_eq!(decode(&[0xEE, 0, 0]), Err(WireError::UnknownMessageType(0xEE)));
        let mut bytes = encode(&Envelope { sequence: 0, message: Message::KeepAlive });
        bytes.push(0);
        assert_eq!(decode(&bytes), Err(WireError::TrailingBytes(1)));
    }

    #[test]
    fn oversized_runs_are_rejected() {
        // Hand-build an input header advertising a 9-frame run.
        let mut bytes = vec![TAG_INPUT, 0, 0];
        bytes.put_u32_le(5);
        bytes.put_u8(9);
        bytes.put_u8(1);
        assert_eq!(decode(&bytes), Err(WireError::InputRunTooLong(9)));
    }
}

// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Injected datagram transport.

use std::collections::VecDeque;

/// Identifies a remote peer or spectator to the transport.
pub type PeerId = u16;

/// Datagram transport the session consumes.
///
/// Implementations may be lossy and may reorder; the protocol layer is
/// built for that. `receive_from` must be non-blocking: return `None`
/// promptly when nothing is pending. Any thread safety the implementation
/// needs is its own business; the session never shares it.
pub trait Transport {
    /// Sends one datagram to `peer`. `flags` are transport-specific hints
    /// (0 for none).
    fn send_to(&mut self, peer: PeerId, bytes: &[u8], flags: u32);

    /// Receives one pending datagram, or `None` when the queue is empty.
    fn receive_from(&mut self) -> Option<(PeerId, Vec<u8>)>;
}

/// In-process transport for tests and local sessions: everything sent is
/// queued, and the harness moves packets between halves by hand.
#[derive(Debug, Default)]
pub struct LoopbackTransport {
    sent: VecDeque<(PeerId, Vec<u8>)>,
    inbound: VecDeque<(PeerId, Vec<u8>)>,
}

impl LoopbackTransport {
    /// Creates an empty loopback.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drains everything sent so far.
    pub fn drain_sent(&mut self) -> Vec<(PeerId, Vec<u8>)> {
        self.sent.drain(..).collect()
    }

    /// Queues a packet for the receive side, as if `from` had sent it.
    pub fn push_inbound(&mut self, from: PeerId, bytes: Vec<u8>) {
        self.inbound.push_back((from, bytes));
    }
}

impl Transport for LoopbackTransport {
    fn send_to(&mut self, peer: PeerId, bytes: &[u8], _flags: u32) {
        self.sent.push_back((peer, bytes.to_vec()));
    }

    fn receive_from(&mut self) -> Option<(PeerId, Vec<u8>)> {
        self.inbound.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loopback_preserves_order_per_direction() {
        let mut transport = LoopbackTransport::new();
        transport.send_to(1, &[1], 0);
        transport.send_to(2, &[2], 0);
        assert_eq!(transport.drain_sent(), vec![(1, vec![1]), (2, vec![2])]);

        transport.push_inbound(7, vec![9]);
        assert_eq!(transport.receive_from(), Some((7, vec![9])));
        assert_eq!(transport.receive_from(), None);
    }
}

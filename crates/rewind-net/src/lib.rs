// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! rewind-net: peer transport seam and protocol state machines.
//!
//! The session layer never touches sockets. It is handed a [`Transport`]
//! (UDP, an in-process loopback for tests, a relay; its problem), and owns
//! one [`PeerEndpoint`] per remote peer. Endpoints are pure state machines:
//! messages in, messages out through the transport, and a polled event
//! queue. No callbacks back into the session, so there are no ownership
//! cycles.
#![forbid(unsafe_code)]

/// Injected datagram transport.
pub mod transport;

/// Per-peer protocol state machine.
pub mod endpoint;

/// Multi-peer endpoint management and spectator fan-out.
pub mod peers;

pub use endpoint::{EndpointEvent, EndpointState, PeerEndpoint};
pub use peers::{NetworkEvent, PeerNetwork};
pub use transport::{LoopbackTransport, PeerId, Transport};

// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! rewind-core: deterministic fixed-point math kernel.
//!
//! Everything in this crate upholds one invariant: two peers performing the
//! same operation sequence on the same inputs produce bit-identical results,
//! regardless of host platform. All arithmetic stays in integer space; no
//! `f32`/`f64` participates in any simulation-visible computation.
#![forbid(unsafe_code)]

/// Per-tick frame counter type and tick-rate constants.
pub mod frame;

/// Q48.16 fixed-point scalar.
pub mod fixed;

/// Deterministic transcendentals (`sin`, `cos`, `sqrt`) over fixed point.
pub mod trig;

/// 3D vector over the fixed-point scalar.
pub mod vec3;

/// Unit quaternion over the fixed-point scalar.
pub mod quat;

/// CRC32 state-checksum accumulation.
pub mod checksum;

/// Injected logger capability.
pub mod logging;

pub use checksum::{ChecksumState, StateChecksum};
pub use fixed::Fp;
pub use frame::{FrameType, MAX_ROLLBACK_WINDOW, MICROS_PER_FRAME, SECONDS_PER_FRAME, TICKS_PER_SECOND};
pub use logging::{FacadeLogger, LogLevel, Logger, NullLogger, RecordingLogger};
pub use quat::Quat;
pub use vec3::Vec3;

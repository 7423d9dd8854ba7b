// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! CRC32 state checksums for desync detection.
//!
//! Determinism contract
//! - State hashes field by field in declaration order; nothing is implicit.
//! - Every multi-byte value feeds the hasher as little-endian bytes.
//! - Fixed-point values hash as their raw `i64` representation, so the hash
//!   is identical wherever the simulated values are identical.

use crc32fast::Hasher;

use crate::fixed::Fp;
use crate::quat::Quat;
use crate::vec3::Vec3;

/// Incremental CRC32 accumulator over deterministic simulation state.
#[derive(Debug, Default)]
pub struct StateChecksum {
    hasher: Hasher,
}

impl StateChecksum {
    /// Creates an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds raw bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }

    /// Feeds a `bool` as a single byte (0 or 1).
    pub fn write_bool(&mut self, value: bool) {
        self.write_bytes(&[u8::from(value)]);
    }

    /// Feeds a `u16` as little-endian bytes.
    pub fn write_u16(&mut self, value: u16) {
        self.write_bytes(&value.to_le_bytes());
    }

    /// Feeds a `u32` as little-endian bytes.
    pub fn write_u32(&mut self, value: u32) {
        self.write_bytes(&value.to_le_bytes());
    }

    /// Feeds a `u64` as little-endian bytes.
    pub fn write_u64(&mut self, value: u64) {
        self.write_bytes(&value.to_le_bytes());
    }

    /// Feeds a fixed-point value as its raw little-endian `i64`.
    pub fn write_fp(&mut self, value: Fp) {
        self.write_bytes(&value.raw().to_le_bytes());
    }

    /// Consumes the accumulator and returns the CRC32.
    #[must_use]
    pub fn finish(self) -> u32 {
        self.hasher.finalize()
    }
}

/// Deterministic state that can feed a [`StateChecksum`].
///
/// Implementations must visit fields in declaration order.
pub trait ChecksumState {
    /// Feeds this value's deterministic state into `sum`.
    fn accumulate(&self, sum: &mut StateChecksum);
}

impl ChecksumState for Fp {
    fn accumulate(&self, sum: &mut StateChecksum) {
        sum.write_fp(*self);
    }
}

impl ChecksumState for Vec3 {
    fn accumulate(&self, sum: &mut StateChecksum) {
        sum.write_fp(self.x);
        sum.write_fp(self.y);
        sum.write_fp(self.z);
    }
}

impl ChecksumState for Quat {
    fn accumulate(&self, sum: &mut StateChecksum) {
        sum.write_fp(self.w);
        self.v.accumulate(sum);
    }
}

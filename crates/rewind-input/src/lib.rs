// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! rewind-input: per-entity command buffering.
//!
//! Raw device buttons are mapped to gameplay *commands* by the capture
//! layer; this crate models the command side only. The buffering rule is
//! one-activation-per-press with a bounded acceptance window: a rising edge
//! arms a command for [`buffer::BUFFERED_INPUT_LIFETIME`] frames, consuming
//! it or letting it expire clears it.
#![forbid(unsafe_code)]

/// Command enum and fixed-width bit-set.
pub mod command;

/// Rising-edge buffering with bounded lifetime.
pub mod buffer;

/// Full per-player input sample.
pub mod player;

pub use buffer::{BufferedCommand, CommandBuffer, BUFFERED_INPUT_LIFETIME};
pub use command::{Command, CommandSet};
pub use player::PlayerInput;

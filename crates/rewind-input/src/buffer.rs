// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Rising-edge command buffering with bounded lifetime.
//!
//! There is deliberately no circular buffer here: the same command cannot
//! be buffered twice at once. Rapidly mashing jump while meaning to jump
//! once should produce one jump.

use rewind_core::{ChecksumState, FrameType, StateChecksum};

use crate::command::{Command, CommandSet};

/// How many frames a buffered press stays consumable (at 60 fps).
pub const BUFFERED_INPUT_LIFETIME: FrameType = 7;

/// Buffer bookkeeping for a single command.
///
/// Remembers whether the press was consumed (one press, one activation) and
/// when it was made (bounded acceptance window).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct BufferedCommand {
    set_frame: FrameType,
    is_set: bool,
    was_used: bool,
}

impl BufferedCommand {
    /// Consumes the buffered press, returning whether it was armed.
    pub fn get_and_consume(&mut self) -> bool {
        self.was_used = true;
        self.is_set
    }

    /// Arms the buffer for a press made on `frame`.
    pub fn remember_press(&mut self, frame: FrameType) {
        self.is_set = true;
        self.set_frame = frame;
        self.was_used = false;
    }

    /// Clears the entry when it was consumed or was pressed too long ago.
    pub fn clear_if_consumed_or_expired(&mut self, latest_completed_frame: FrameType) {
        if !self.is_set {
            return;
        }
        if self.was_used
            || latest_completed_frame.wrapping_sub(self.set_frame) >= BUFFERED_INPUT_LIFETIME
        {
            self.is_set = false;
        }
    }
}

impl ChecksumState for BufferedCommand {
    fn accumulate(&self, sum: &mut StateChecksum) {
        sum.write_u32(self.set_frame);
        sum.write_bool(self.is_set);
        sum.write_bool(self.was_used);
    }
}

/// Gameplay input buffer for a single entity.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandBuffer {
    raw_commands: CommandSet,
    buffered: [BufferedCommand; Command::COUNT],
}

impl CommandBuffer {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds the commands for `frame`, arming the buffer for every command
    /// that was just pressed (set now, clear last frame).
    pub fn update_commands(&mut self, frame: FrameType, commands: CommandSet) {
        for command in Command::ALL {
            if commands.is_set(command) && !self.raw_commands.is_set(command) {
                self.buffered[command.index()].remember_press(frame);
            }
        }
        self.raw_commands = commands;
    }

    /// Consumes a buffered press of `command`: returns true at most once per
    /// press, regardless of how many frames the press stays buffered.
    pub fn is_command_initially_pressed(&mut self, command: Command) -> bool {
        self.buffered[command.index()].get_and_consume()
    }

    /// Whether `command` is actively held this frame (raw value, bypassing
    /// the buffer). Useful for hold-to-charge style logic.
    #[must_use]
    pub fn is_command_held(&self, command: Command) -> bool {
        self.raw_commands.is_set(command)
    }

    /// End-of-frame cleanup: drops entries that were consumed or expired.
    pub fn clear_consumed_or_expired(&mut self, frame: FrameType) {
        for entry in &mut self.buffered {
            entry.clear_if_consumed_or_expired(frame);
        }
    }
}

impl ChecksumState for CommandBuffer {
    fn accumulate(&self, sum: &mut StateChecksum) {
        self.raw_commands.accumulate(sum);
        for entry in &self.buffered {
            entry.accumulate(sum);
        }
    }
}

// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Gameplay commands and the fixed-width set over them.
//!
//! Commands abstract over raw buttons so gameplay thinks in actions (what
//! two buttons together initiate a special attack is the capture layer's
//! problem). The set serializes to a single `u32` for network framing and
//! checksumming.

use rewind_core::{ChecksumState, StateChecksum};

/// A gameplay command an entity can issue.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    /// Crouch / slide.
    Crouch = 0,
    /// Jump.
    Jump = 1,
    /// Dash / dodge.
    Dash = 2,
    /// Guard / block.
    Guard = 3,
    /// Aim the grapple.
    GrappleAim = 4,
    /// Primary attack.
    AttackPrimary = 5,
    /// Secondary attack.
    AttackSecondary = 6,
    /// Contextual interact.
    Interact = 7,
    /// Cycle weapon.
    SwitchWeapon = 8,
    /// Cast spell slot 1.
    CastSpell1 = 9,
    /// Cast spell slot 2.
    CastSpell2 = 10,
    /// Cast spell slot 3.
    CastSpell3 = 11,
    /// Cast spell slot 4.
    CastSpell4 = 12,
}

impl Command {
    /// Number of distinct commands.
    pub const COUNT: usize = 13;

    /// All commands in discriminant order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Crouch,
        Self::Jump,
        Self::Dash,
        Self::Guard,
        Self::GrappleAim,
        Self::AttackPrimary,
        Self::AttackSecondary,
        Self::Interact,
        Self::SwitchWeapon,
        Self::CastSpell1,
        Self::CastSpell2,
        Self::CastSpell3,
        Self::CastSpell4,
    ];

    /// The command's bit index.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Set of commands active in one frame, backed by a single `u32`.
///
/// A plain array of bools makes no layout guarantee; a fixed numeric
/// representation serializes and hashes identically everywhere.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Hash)]
pub struct CommandSet {
    bits: u32,
}

impl CommandSet {
    /// The empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self { bits: 0 }
    }

    /// Reconstructs a set from its wire integer. Bits beyond
    /// [`Command::COUNT`] are masked off.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self { bits: bits & ((1 << Command::COUNT as u32) - 1) }
    }

    /// The wire integer for this set.
    #[must_use]
    pub const fn to_bits(self) -> u32 {
        self.bits
    }

    /// True when `command` is in the set.
    #[must_use]
    pub fn is_set(self, command: Command) -> bool {
        (self.bits >> command.index()) & 1 != 0
    }

    /// Adds or removes `command`.
    pub fn set(&mut self, command: Command, value: bool) {
        if value {
            self.bits |= 1 << command.index();
        } else {
            self.bits &= !(1 << command.index());
        }
    }

    /// True when no command is set.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.bits == 0
    }
}

impl ChecksumState for CommandSet {
    fn accumulate(&self, sum: &mut StateChecksum) {
        sum.write_u32(self.bits);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get_round_trip() {
        let mut set = CommandSet::new();
        assert!(set.is_empty());
        set.set(Command::Jump, true);
        set.set(Command::Guard, true);
        assert!(set.is_set(Command::Jump));
        assert!(set.is_set(Command::Guard));
        assert!(!set.is_set(Command::Dash));
        set.set(Command::Jump, false);
        assert!(!set.is_set(Command::Jump));
    }

    #[test]
    fn serializes_to_a_single_integer() {
        let mut set = CommandSet::new();
        set.set(Command::Crouch, true);
        set.set(Command::Dash, true);
        assert_eq!(set.to_bits(), 0b101);
        assert_eq!(CommandSet::from_bits(0b101), set);
    }

    #[test]
    fn from_bits_masks_unknown_bits() {
        let set = CommandSet::from_bits(u32::MAX);
        assert_eq!(set.to_bits(), (1 << Command::COUNT as u32) - 1);
    }

    #[test]
    fn discriminants_match_all_ordering() {
        for (position, command) in Command::ALL.iter().enumerate() {
            assert_eq!(command.index(), position);
        }
    }
}

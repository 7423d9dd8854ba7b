// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Full per-player input sample for one frame.

use rewind_core::{ChecksumState, Fp, StateChecksum};

use crate::command::CommandSet;

/// Everything one player contributed on one frame.
///
/// Axis values are fixed point in `[-1, 1]`. Mouse and controller look axes
/// are captured separately; [`PlayerInput::canonicalized`] merges each pair
/// before the sample enters the deterministic pipeline, because the wire
/// format carries the merged form and every peer must simulate identical
/// values.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct PlayerInput {
    /// Forward/backward movement axis.
    pub move_forward: Fp,
    /// Right/left movement axis.
    pub move_right: Fp,
    /// Mouse yaw axis.
    pub mouse_turn: Fp,
    /// Mouse pitch axis.
    pub mouse_look_up: Fp,
    /// Controller yaw axis.
    pub controller_turn: Fp,
    /// Controller pitch axis.
    pub controller_look_up: Fp,
    /// Commands active this frame.
    pub commands: CommandSet,
}

impl PlayerInput {
    /// The neutral sample: centered axes, no commands.
    #[must_use]
    pub fn neutral() -> Self {
        Self::default()
    }

    /// Collapses the mouse/controller pairs into the mouse fields and clamps
    /// every axis to `[-1, 1]`.
    ///
    /// The wire layout encodes four axes; whichever peer captured the input
    /// locally must simulate from the same merged values every remote peer
    /// will decode, or their checksums drift apart.
    #[must_use]
    pub fn canonicalized(self) -> Self {
        let clamp = |axis: Fp| axis.clamp(Fp::from_num(-1), Fp::ONE);
        Self {
            move_forward: clamp(self.move_forward),
            move_right: clamp(self.move_right),
            mouse_turn: clamp(self.mouse_turn + self.controller_turn),
            mouse_look_up: clamp(self.mouse_look_up + self.controller_look_up),
            controller_turn: Fp::ZERO,
            controller_look_up: Fp::ZERO,
            commands: self.commands,
        }
    }

    /// The four wire axes of a canonicalized sample.
    #[must_use]
    pub fn wire_axes(&self) -> [Fp; 4] {
        [self.move_forward, self.move_right, self.mouse_turn, self.mouse_look_up]
    }

    /// Rebuilds a (canonical) sample from its wire fields.
    #[must_use]
    pub fn from_wire(axes: [Fp; 4], command_bits: u32) -> Self {
        Self {
            move_forward: axes[0],
            move_right: axes[1],
            mouse_turn: axes[2],
            mouse_look_up: axes[3],
            controller_turn: Fp::ZERO,
            controller_look_up: Fp::ZERO,
            commands: CommandSet::from_bits(command_bits),
        }
    }
}

impl ChecksumState for PlayerInput {
    fn accumulate(&self, sum: &mut StateChecksum) {
        sum.write_fp(self.move_forward);
        sum.write_fp(self.move_right);
        sum.write_fp(self.mouse_turn);
        sum.write_fp(self.mouse_look_up);
        sum.write_fp(self.controller_turn);
        sum.write_fp(self.controller_look_up);
        self.commands.accumulate(sum);
    }
}

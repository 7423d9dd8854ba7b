// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Q48.16 fixed-point scalar.
//!
//! The representation is an `i64` storing the real value scaled by `2^16`:
//! `real_value = raw / 2^16`.
//!
//! # Determinism contract
//!
//! - Arithmetic is performed entirely in integer space. Implementations must
//!   never route through `f32`/`f64`.
//! - Add/sub/neg wrap on overflow (the simulation domain is assumed to stay
//!   within ±2^47).
//! - Multiplication computes a doubled `i128` intermediate `(a·b) / 2^15` and
//!   rounds with `v/2 + v%2`, i.e. half away from zero.
//! - Division scales the numerator by `2^17` before the divide and applies
//!   the same rounding step.

use core::fmt;
use core::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

/// Number of fractional bits in the Q48.16 encoding.
pub const FRAC_BITS: u32 = 16;

const ONE_RAW: i64 = 1_i64 << FRAC_BITS;

/// Q48.16 fixed-point scalar.
///
/// Value semantics, total ordering, and wrapping integer arithmetic. See the
/// module docs for the exact rounding rules.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
pub struct Fp {
    raw: i64,
}

impl Fp {
    /// The additive identity.
    pub const ZERO: Self = Self { raw: 0 };

    /// The multiplicative identity.
    pub const ONE: Self = Self { raw: ONE_RAW };

    /// One half.
    pub const HALF: Self = Self { raw: ONE_RAW / 2 };

    /// π. Raw value matches `round(π · 2^16)`.
    pub const PI: Self = Self { raw: 205_887 };

    /// π / 2.
    pub const HALF_PI: Self = Self { raw: 102_944 };

    /// 2π.
    pub const TWO_PI: Self = Self { raw: 411_775 };

    /// Euler's number. Raw value matches `round(e · 2^16)`.
    pub const E: Self = Self { raw: 178_145 };

    /// Largest representable value.
    pub const MAX: Self = Self { raw: i64::MAX };

    /// Smallest (most negative) representable value.
    pub const MIN: Self = Self { raw: i64::MIN };

    /// Constructs from an integer value (`n · 2^16`).
    #[must_use]
    pub const fn from_num(n: i64) -> Self {
        Self { raw: n.wrapping_shl(FRAC_BITS) }
    }

    /// Constructs directly from raw Q48.16 bits (no scaling).
    #[must_use]
    pub const fn from_raw(raw: i64) -> Self {
        Self { raw }
    }

    /// Constructs the ratio `num / den`, rounded with the division rule.
    ///
    /// Usable in const context, e.g. `Fp::frac(1, 60)` for the tick delta.
    /// A zero denominator follows [`Fp::div`]'s saturation policy.
    #[must_use]
    pub const fn frac(num: i64, den: i64) -> Self {
        Self { raw: div_raw(ONE_RAW.wrapping_mul(num), den.wrapping_shl(FRAC_BITS)) }
    }

    /// Returns the raw Q48.16 representation.
    #[must_use]
    pub const fn raw(self) -> i64 {
        self.raw
    }

    /// Truncates toward zero to an integer.
    #[must_use]
    pub const fn to_num(self) -> i64 {
        self.raw / ONE_RAW
    }

    /// Absolute value. `Fp::MIN` wraps (stays `MIN`), matching the wrapping
    /// overflow policy.
    #[must_use]
    pub const fn abs(self) -> Self {
        Self { raw: if self.raw < 0 { self.raw.wrapping_neg() } else { self.raw } }
    }

    /// Returns the smaller of `self` and `other`.
    #[must_use]
    pub fn min(self, other: Self) -> Self {
        if self <= other {
            self
        } else {
            other
        }
    }

    /// Returns the larger of `self` and `other`.
    #[must_use]
    pub fn max(self, other: Self) -> Self {
        if self >= other {
            self
        } else {
            other
        }
    }

    /// Clamps to the inclusive `[lo, hi]` range.
    #[must_use]
    pub fn clamp(self, lo: Self, hi: Self) -> Self {
        self.max(lo).min(hi)
    }

    /// True when `self` is within `±positive_error_range` of `other`.
    #[must_use]
    pub fn is_near(self, other: Self, positive_error_range: Self) -> bool {
        (self - other).abs() <= positive_error_range
    }

    /// True when the value is negative.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.raw < 0
    }
}

const fn mul_raw(a: i64, b: i64) -> i64 {
    // Doubled intermediate keeps one extra bit so the final halving step can
    // round half away from zero: (a·b)/2^15, then v/2 + v%2.
    let doubled = ((a as i128) * (b as i128)) / (1_i128 << (FRAC_BITS - 1));
    (doubled / 2 + doubled % 2) as i64
}

const fn div_raw(a: i64, b: i64) -> i64 {
    if b == 0 {
        // Deterministic policy for the undefined case: 0/0 → 0, otherwise
        // saturate toward the sign of the numerator.
        if a == 0 {
            return 0;
        }
        return if a < 0 { i64::MIN } else { i64::MAX };
    }
    let doubled = ((a as i128) << (FRAC_BITS + 1)) / (b as i128);
    (doubled / 2 + doubled % 2) as i64
}

impl Add for Fp {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self { raw: self.raw.wrapping_add(rhs.raw) }
    }
}

impl Sub for Fp {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self { raw: self.raw.wrapping_sub(rhs.raw) }
    }
}

impl Mul for Fp {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self { raw: mul_raw(self.raw, rhs.raw) }
    }
}

impl Div for Fp {
    type Output = Self;

    fn div(self, rhs: Self) -> Self {
        Self { raw: div_raw(self.raw, rhs.raw) }
    }
}

impl Neg for Fp {
    type Output = Self;

    fn neg(self) -> Self {
        Self { raw: self.raw.wrapping_neg() }
    }
}

impl AddAssign for Fp {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl SubAssign for Fp {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl MulAssign for Fp {
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl DivAssign for Fp {
    fn div_assign(&mut self, rhs: Self) {
        *self = *self / rhs;
    }
}

impl fmt::Display for Fp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Render through integer math only; a float round-trip could differ
        // across platforms.
        let sign = if self.raw < 0 { "-" } else { "" };
        let abs = self.raw.unsigned_abs();
        let int_part = abs >> FRAC_BITS;
        let frac_part = abs & (ONE_RAW as u64 - 1);
        // Four decimal digits covers the full 2^-16 resolution for display.
        let decimals = frac_part * 10_000 / (ONE_RAW as u64);
        write!(f, "{sign}{int_part}.{decimals:04}")
    }
}

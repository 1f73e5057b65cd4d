//! Q16.16 Fixed-Point Number
//!
//! A signed 32-bit fixed-point type with 16 integer bits and 16 fractional
//! bits. All arithmetic widens through `i64` intermediates, so a multiply or
//! divide never loses the low fraction bits before the final shift.
//!
//! `Fix16` is the deterministic scalar backend of the engine: identical
//! operations produce identical raw bit patterns on every platform.
//!
//! # Representation
//!
//! `value = raw / 65536`. `1.0` is `0x10000`.

use core::cmp::Ordering;
use core::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Rem, Sub, SubAssign};

/// Q16.16 fixed-point number backed by a raw `i32`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Fix16 {
    /// Raw bits; the value is `raw / 2^16`.
    pub raw: i32,
}

/// Number of fractional bits.
pub const FRACTION_BITS: u32 = 16;

/// Raw representation of 1.0.
pub const ONE_RAW: i32 = 1 << FRACTION_BITS;

impl Fix16 {
    /// Zero constant.
    pub const ZERO: Self = Self { raw: 0 };

    /// One constant (1.0).
    pub const ONE: Self = Self { raw: ONE_RAW };

    /// Construct from raw Q16.16 bits.
    #[inline]
    pub const fn from_raw(raw: i32) -> Self {
        Self { raw }
    }

    /// Construct from an integer.
    #[inline]
    pub const fn from_int(i: i32) -> Self {
        Self { raw: i << FRACTION_BITS }
    }

    /// Construct from integer thousandths (`from_milli(500)` is 0.5).
    ///
    /// The division by 1000 happens on a 64-bit intermediate so small
    /// magnitudes keep their full fraction.
    #[inline]
    pub const fn from_milli(m: i32) -> Self {
        Self {
            raw: ((((m as i64) << 32) / 1000) >> FRACTION_BITS) as i32,
        }
    }

    /// Truncate to an integer (rounds toward negative infinity).
    #[inline]
    pub const fn to_int(self) -> i32 {
        self.raw >> FRACTION_BITS
    }

    /// Convert to `f32`. For display and interop only; not deterministic.
    #[inline]
    pub fn to_f32(self) -> f32 {
        self.raw as f32 / ONE_RAW as f32
    }

    /// True if the value is exactly zero.
    #[inline]
    pub const fn is_zero(self) -> bool {
        self.raw == 0
    }

    /// True if the value is negative.
    #[inline]
    pub const fn is_negative(self) -> bool {
        self.raw < 0
    }
}

impl Add for Fix16 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::from_raw(self.raw.wrapping_add(rhs.raw))
    }
}

impl Sub for Fix16 {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::from_raw(self.raw.wrapping_sub(rhs.raw))
    }
}

impl Mul for Fix16 {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        Self::from_raw((((self.raw as i64) * (rhs.raw as i64)) >> FRACTION_BITS) as i32)
    }
}

impl Div for Fix16 {
    type Output = Self;

    /// Division. A zero divisor yields zero; the engine treats the result as
    /// a degenerate value rather than a fault.
    #[inline]
    fn div(self, rhs: Self) -> Self {
        if rhs.raw == 0 {
            return Self::ZERO;
        }
        Self::from_raw(((((self.raw as i64) << 32) / (rhs.raw as i64)) >> FRACTION_BITS) as i32)
    }
}

impl Rem for Fix16 {
    type Output = Self;

    #[inline]
    fn rem(self, rhs: Self) -> Self {
        if rhs.raw == 0 {
            return Self::ZERO;
        }
        Self::from_raw(self.raw % rhs.raw)
    }
}

impl Neg for Fix16 {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self::from_raw(self.raw.wrapping_neg())
    }
}

impl AddAssign for Fix16 {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl SubAssign for Fix16 {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl MulAssign for Fix16 {
    #[inline]
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl DivAssign for Fix16 {
    #[inline]
    fn div_assign(&mut self, rhs: Self) {
        *self = *self / rhs;
    }
}

impl PartialOrd for Fix16 {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Fix16 {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.raw.cmp(&other.raw)
    }
}

//! The share element type.
//!
//! Everything in the core is generic over [`Element`]: the signed integer
//! types that can live inside a share. The trait collects the wrapping
//! ring arithmetic of arithmetic sharing, the bit-level operations of
//! boolean sharing, and the two widening relations the operator library
//! needs:
//!
//! - [`Element::Wide`] — the double-width type used internally by private
//!   division (`i8`/`i16` widen to `i32`, `i32` to `i64`, `i64` to `i128`).
//! - [`Element::Padded`] — the type a sort key is widened into so that 32
//!   index bits fit below the value (`<= 32` bits pad to `i64`, `i64` pads
//!   to `i128`).
//!
//! `i128` has no wider type, so private division and table sorting of
//! `i128` columns report `PreconditionViolated` (see `SUPPORTS_WIDE` /
//! `SUPPORTS_PAD`).

use crate::protocol::{Protocol, ProtocolSuite};
use rand::Rng;
use std::fmt::Debug;
use std::ops::{BitAnd, BitOr, BitXor, Not};

/// A signed integer type usable as a share element.
pub trait Element:
    Copy
    + Default
    + Debug
    + PartialEq
    + Eq
    + PartialOrd
    + Ord
    + Send
    + Sync
    + BitAnd<Output = Self>
    + BitOr<Output = Self>
    + BitXor<Output = Self>
    + Not<Output = Self>
    + 'static
{
    /// Bit width of the type.
    const BITS: u32;
    /// `ceil(log2(BITS))`, the round count of log-depth circuits.
    const LOG_BITS: u32;
    const ZERO: Self;
    const ONE: Self;
    /// Per-type masking sentinel used when blinding invalid rows.
    const MAX_VALUE: Self;
    const MIN_VALUE: Self;
    /// Whether a strictly wider type exists for private division.
    const SUPPORTS_WIDE: bool;
    /// Whether the padded-index sort widening exists for this type.
    const SUPPORTS_PAD: bool;

    /// Double-width type for the non-restoring division algorithm.
    type Wide: Element;
    /// Widened type holding `value << 32 | index` for padded-index sorts.
    type Padded: Element;

    fn wrapping_add(self, rhs: Self) -> Self;
    fn wrapping_sub(self, rhs: Self) -> Self;
    fn wrapping_mul(self, rhs: Self) -> Self;
    fn wrapping_neg(self) -> Self;
    fn wrapping_div(self, rhs: Self) -> Self;
    fn wrapping_rem(self, rhs: Self) -> Self;

    /// Arithmetic (sign-preserving) right shift.
    fn shr_arith(self, n: u32) -> Self;
    /// Logical (zero-filling) right shift.
    fn shr_logical(self, n: u32) -> Self;
    /// Left shift; high bits are discarded.
    fn shl(self, n: u32) -> Self;

    /// The bit at `index`, as `ZERO` or `ONE`.
    fn get_bit(self, index: u32) -> Self;
    /// Overwrite the bit at `index` with the LSB of `bit`.
    fn set_bit(&mut self, bit: Self, index: u32);
    /// Per-element parity (popcount mod 2), as `ZERO` or `ONE`.
    fn parity(self) -> Self;

    /// Lossless interchange representation for cross-width casts.
    fn to_i128(self) -> i128;
    /// Truncating cast from the interchange representation.
    fn from_i128(v: i128) -> Self;

    /// Interpret as an index. Callers guarantee non-negativity.
    fn as_index(self) -> usize {
        self.to_i128() as usize
    }

    /// Uniformly random element.
    fn random<R: Rng + ?Sized>(rng: &mut R) -> Self;

    /// Select this width's primitive set from a protocol backend.
    /// (A width-directed upcast; generic operator code cannot otherwise
    /// name `Protocol<T>` on a `dyn ProtocolSuite`.)
    fn protocol(suite: &dyn ProtocolSuite) -> &dyn Protocol<Self>
    where
        Self: Sized;

    /// The canonical level mask: the bit at offset `level` within every
    /// chunk of `2^(level+1)` bits. `level_mask(0) = 0b…0101`,
    /// `level_mask(1) = 0b…0010_0010`, and so on. Building block of the
    /// bit-level shifts used by prefix circuits.
    fn level_mask(level: u32) -> Self {
        let mut m: i128 = 0;
        let chunk = 1u32 << (level + 1);
        let mut bit = level;
        while bit < Self::BITS {
            m |= 1i128 << bit;
            bit += chunk;
        }
        Self::from_i128(m)
    }
}

macro_rules! impl_element {
    ($t:ty, $u:ty, $wide:ty, $padded:ty, $bits:expr, $log_bits:expr, $has_wide:expr, $has_pad:expr) => {
        impl Element for $t {
            const BITS: u32 = $bits;
            const LOG_BITS: u32 = $log_bits;
            const ZERO: Self = 0;
            const ONE: Self = 1;
            const MAX_VALUE: Self = <$t>::MAX;
            const MIN_VALUE: Self = <$t>::MIN;
            const SUPPORTS_WIDE: bool = $has_wide;
            const SUPPORTS_PAD: bool = $has_pad;

            type Wide = $wide;
            type Padded = $padded;

            #[inline]
            fn wrapping_add(self, rhs: Self) -> Self {
                <$t>::wrapping_add(self, rhs)
            }
            #[inline]
            fn wrapping_sub(self, rhs: Self) -> Self {
                <$t>::wrapping_sub(self, rhs)
            }
            #[inline]
            fn wrapping_mul(self, rhs: Self) -> Self {
                <$t>::wrapping_mul(self, rhs)
            }
            #[inline]
            fn wrapping_neg(self) -> Self {
                <$t>::wrapping_neg(self)
            }
            #[inline]
            fn wrapping_div(self, rhs: Self) -> Self {
                <$t>::wrapping_div(self, rhs)
            }
            #[inline]
            fn wrapping_rem(self, rhs: Self) -> Self {
                <$t>::wrapping_rem(self, rhs)
            }

            #[inline]
            fn shr_arith(self, n: u32) -> Self {
                self >> n
            }
            #[inline]
            fn shr_logical(self, n: u32) -> Self {
                ((self as $u) >> n) as $t
            }
            #[inline]
            fn shl(self, n: u32) -> Self {
                self << n
            }

            #[inline]
            fn get_bit(self, index: u32) -> Self {
                (self >> index) & 1
            }
            #[inline]
            fn set_bit(&mut self, bit: Self, index: u32) {
                *self = (*self & !(1 << index)) | ((bit & 1) << index);
            }
            #[inline]
            fn parity(self) -> Self {
                (self.count_ones() & 1) as $t
            }

            #[inline]
            fn to_i128(self) -> i128 {
                self as i128
            }
            #[inline]
            fn from_i128(v: i128) -> Self {
                v as $t
            }

            #[inline]
            fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
                rng.r#gen()
            }

            #[inline]
            fn protocol(suite: &dyn ProtocolSuite) -> &dyn Protocol<Self> {
                suite
            }
        }
    };
}

impl_element!(i8, u8, i32, i64, 8, 3, true, true);
impl_element!(i16, u16, i32, i64, 16, 4, true, true);
impl_element!(i32, u32, i64, i64, 32, 5, true, true);
impl_element!(i64, u64, i128, i128, 64, 6, true, true);
impl_element!(i128, u128, i128, i128, 128, 7, false, false);

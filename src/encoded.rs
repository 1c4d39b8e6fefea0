//! Encoded (secret-shared) vectors (L2).
//!
//! An [`ASharedVector`] holds arithmetic (additive) shares; a
//! [`BSharedVector`] holds boolean (XOR) shares. Both wrap a replicated
//! share container plus a protocol handle, and mirror the plain vector's
//! access patterns share-wise: a view of a shared vector aliases the same
//! share storage, so writes through one view are seen by all.
//!
//! Operator surface:
//!
//! - **Local (linear) operations** are infallible and get `std::ops`
//!   impls: `+`, `-`, unary `-`, `+=`, `-=` on A-shared values; `^`,
//!   `^=`, `!` (complement), `<<`, `>>` on B-shared values. Shifts are
//!   purely local; left shift discards high bits, right shift is
//!   arithmetic.
//! - **Round operations** go through the protocol and return `Result`:
//!   [`ASharedVector::mul`], [`BSharedVector::and`],
//!   [`BSharedVector::or`] (De Morgan over AND), boolean addition and
//!   comparison circuits, and the share conversions `a2b`, `b2a_bit`,
//!   `b2a`.
//!
//! Binary operations require equal sizes and panic otherwise (a caller
//! bug, like an out-of-range slice).

use crate::circuits;
use crate::element::Element;
use crate::error::Result;
use crate::protocol::{Ctx, Protocol};
use crate::share::{Encoding, ReplicatedShares};
use crate::vector::PlainVector;
use paste::paste;

/// Arithmetic-shared vector.
pub struct ASharedVector<T: Element> {
    pub(crate) shares: ReplicatedShares<T>,
    pub(crate) ctx: Ctx,
}

/// Boolean-shared vector.
pub struct BSharedVector<T: Element> {
    pub(crate) shares: ReplicatedShares<T>,
    pub(crate) ctx: Ctx,
}

macro_rules! impl_shared_vector_common {
    ($name:ident, $encoding:expr) => {
        impl<T: Element> Clone for $name<T> {
            /// Shallow copy sharing storage. Use
            /// [`Self::deepcopy`] for an independent vector.
            fn clone(&self) -> Self {
                Self {
                    shares: self.shares.clone(),
                    ctx: self.ctx.clone(),
                }
            }
        }

        impl<T: Element> $name<T> {
            /// Zero-initialized shared vector of `size` elements.
            pub fn zeroed(ctx: &Ctx, size: usize) -> Self {
                Self {
                    shares: ReplicatedShares::zeroed(ctx.replication(), size),
                    ctx: ctx.clone(),
                }
            }

            pub(crate) fn zeroed_like(&self) -> Self {
                Self::zeroed(&self.ctx, self.size())
            }

            pub fn from_shares(ctx: &Ctx, shares: ReplicatedShares<T>) -> Self {
                Self {
                    shares,
                    ctx: ctx.clone(),
                }
            }

            pub const fn encoding(&self) -> Encoding {
                $encoding
            }

            #[inline]
            pub fn size(&self) -> usize {
                self.shares.size()
            }

            #[inline]
            pub fn total_size(&self) -> usize {
                self.shares.total_size()
            }

            pub fn is_empty(&self) -> bool {
                self.size() == 0
            }

            pub fn shares(&self) -> &ReplicatedShares<T> {
                &self.shares
            }

            pub fn shares_mut(&mut self) -> &mut ReplicatedShares<T> {
                &mut self.shares
            }

            pub fn context(&self) -> &Ctx {
                &self.ctx
            }

            #[inline]
            pub(crate) fn proto(&self) -> &dyn Protocol<T> {
                T::protocol(&*self.ctx)
            }

            fn view(&self, f: impl Fn(&PlainVector<T>) -> PlainVector<T>) -> Self {
                Self {
                    shares: self.shares.project(f),
                    ctx: self.ctx.clone(),
                }
            }

            // ----- Access patterns (share-wise) -----

            pub fn slice_range(&self, start: usize, end: usize) -> Self {
                self.view(|s| s.slice_range(start, end))
            }

            pub fn slice_from(&self, start: usize) -> Self {
                self.view(|s| s.slice_from(start))
            }

            pub fn simple_subset_reference(&self, start: usize, step: usize, end: usize) -> Self {
                self.view(|s| s.simple_subset_reference(start, step, end))
            }

            pub fn simple_subset_reference_from(&self, start: usize, step: usize) -> Self {
                self.view(|s| s.simple_subset_reference_from(start, step))
            }

            pub fn alternating_subset_reference(&self, included: usize, excluded: usize) -> Self {
                self.view(|s| s.alternating_subset_reference(included, excluded))
            }

            pub fn reversed_alternating_subset_reference(
                &self,
                included: usize,
                excluded: usize,
            ) -> Self {
                self.view(|s| s.reversed_alternating_subset_reference(included, excluded))
            }

            pub fn repeated_subset_reference(&self, repetition: usize) -> Self {
                self.view(|s| s.repeated_subset_reference(repetition))
            }

            pub fn cyclic_subset_reference(&self, cycles: usize) -> Self {
                self.view(|s| s.cyclic_subset_reference(cycles))
            }

            pub fn directed_subset_reference(&self, direction: i32) -> Self {
                self.view(|s| s.directed_subset_reference(direction))
            }

            /// Filter view over a public flag vector. Discloses the flag
            /// count; see the plain-vector documentation.
            pub fn included_reference<F: Element>(&self, flag: &PlainVector<F>) -> Self {
                self.view(|s| s.included_reference(flag))
            }

            /// Explicit mapping override from a public index vector.
            pub fn mapping_reference<M: Element>(&self, map: &PlainVector<M>) -> Result<Self> {
                Ok(Self {
                    shares: self.shares.try_project(|s| s.mapping_reference(map))?,
                    ctx: self.ctx.clone(),
                })
            }

            // ----- Mutation -----

            /// Elementwise copy of `other` into this vector's views.
            pub fn assign(&self, other: &Self) {
                self.shares.assign(&other.shares);
            }

            /// Deep copy into fresh storage.
            pub fn deepcopy(&self) -> Self {
                Self {
                    shares: self.shares.materialize(),
                    ctx: self.ctx.clone(),
                }
            }

            pub fn materialize_inplace(&mut self) {
                self.shares.materialize_inplace();
            }

            pub fn reverse(&self) {
                self.shares.for_each(|s| s.reverse());
            }

            pub fn zero(&self) {
                self.shares.for_each(|s| s.zero());
            }

            pub fn resize(&mut self, n: usize) {
                self.shares.for_each_mut(|s| s.resize(n));
            }

            pub fn tail(&mut self, n: usize) {
                self.shares.for_each_mut(|s| s.tail(n));
            }

            /// Obliviously shuffle in place, drawing one sharded
            /// permutation from the pool.
            pub fn shuffle(&mut self) -> Result<()> {
                crate::operators::shuffle::shuffle_shares(
                    &mut self.shares,
                    $encoding,
                    &self.ctx,
                )
            }
        }
    };
}

impl_shared_vector_common!(ASharedVector, Encoding::Arithmetic);
impl_shared_vector_common!(BSharedVector, Encoding::Boolean);

// Local std-ops on references, macro-fabricated.
macro_rules! impl_local_binary_op {
    ($name:ident, $trait:ident, $method:ident, $proto_fn:ident) => {
        impl<'a, T: Element> std::ops::$trait<&'a $name<T>> for &'a $name<T> {
            type Output = $name<T>;
            fn $method(self, rhs: &'a $name<T>) -> $name<T> {
                let out = self.zeroed_like();
                self.proto().$proto_fn(&self.shares, &rhs.shares, &out.shares);
                out
            }
        }

        paste! {
            impl<T: Element> std::ops::[<$trait Assign>]<&$name<T>> for $name<T> {
                fn [<$method _assign>](&mut self, rhs: &$name<T>) {
                    self.proto().$proto_fn(&self.shares, &rhs.shares, &self.shares);
                }
            }
        }
    };
}

impl_local_binary_op!(ASharedVector, Add, add, add_a);
impl_local_binary_op!(ASharedVector, Sub, sub, sub_a);
impl_local_binary_op!(BSharedVector, BitXor, bitxor, xor_b);

impl<T: Element> std::ops::Neg for &ASharedVector<T> {
    type Output = ASharedVector<T>;
    fn neg(self) -> ASharedVector<T> {
        let out = self.zeroed_like();
        self.proto().neg_a(&self.shares, &out.shares);
        out
    }
}

impl<T: Element> std::ops::Not for &BSharedVector<T> {
    type Output = BSharedVector<T>;
    /// Bitwise complement (local).
    fn not(self) -> BSharedVector<T> {
        let out = self.zeroed_like();
        self.proto().not_b(&self.shares, &out.shares);
        out
    }
}

impl<T: Element> std::ops::Shl<u32> for &BSharedVector<T> {
    type Output = BSharedVector<T>;
    fn shl(self, n: u32) -> BSharedVector<T> {
        BSharedVector {
            shares: self.shares.project(|s| s.bit_left_shift(n)),
            ctx: self.ctx.clone(),
        }
    }
}

impl<T: Element> std::ops::Shr<u32> for &BSharedVector<T> {
    type Output = BSharedVector<T>;
    /// Arithmetic right shift (sign-preserving).
    fn shr(self, n: u32) -> BSharedVector<T> {
        BSharedVector {
            shares: self.shares.project(|s| s.bit_arithmetic_right_shift(n)),
            ctx: self.ctx.clone(),
        }
    }
}

impl<T: Element> std::ops::ShlAssign<u32> for BSharedVector<T> {
    fn shl_assign(&mut self, n: u32) {
        let shifted = &*self << n;
        self.assign(&shifted);
    }
}

impl<T: Element> std::ops::ShrAssign<u32> for BSharedVector<T> {
    fn shr_assign(&mut self, n: u32) {
        let shifted = &*self >> n;
        self.assign(&shifted);
    }
}

impl<T: Element> ASharedVector<T> {
    /// Secret-share `v` with `owner` as the data owner.
    pub fn secret(ctx: &Ctx, v: &PlainVector<T>, owner: usize) -> Self {
        Self {
            shares: T::protocol(&**ctx).secret_share_a(v, owner),
            ctx: ctx.clone(),
        }
    }

    /// Share a public vector.
    pub fn public(ctx: &Ctx, v: &PlainVector<T>) -> Self {
        Self {
            shares: T::protocol(&**ctx).public_share_a(v),
            ctx: ctx.clone(),
        }
    }

    /// Share `value` repeated `size` times.
    pub fn public_repeated(ctx: &Ctx, value: T, size: usize) -> Self {
        Self::public(ctx, &PlainVector::filled(size, value))
    }

    /// Combine shares and reveal.
    pub fn open(&self) -> Result<PlainVector<T>> {
        self.proto().open_a(&self.shares)
    }

    /// Elementwise secure multiplication. One protocol round.
    pub fn mul(&self, other: &Self) -> Result<Self> {
        let out = self.zeroed_like();
        self.proto()
            .multiply_a(&self.shares, &other.shares, &out.shares)?;
        Ok(out)
    }

    pub fn mul_assign(&self, other: &Self) -> Result<()> {
        self.proto()
            .multiply_a(&self.shares, &other.shares, &self.shares)
    }

    /// Add a public constant.
    pub fn add_public(&self, c: T) -> Self {
        let out = self.zeroed_like();
        self.proto().add_const_a(&self.shares, c, &out.shares);
        out
    }

    pub fn add_public_assign(&self, c: T) {
        self.proto().add_const_a(&self.shares, c, &self.shares);
    }

    /// Multiply by a public scalar (local).
    pub fn mul_public(&self, c: T) -> Self {
        let out = self.zeroed_like();
        self.proto().mul_const_a(&self.shares, c, &out.shares);
        out
    }

    /// Division by a public constant with error-correction pass.
    pub fn div_public(&self, c: T) -> Result<Self> {
        let (quotient, error) = self.proto().div_const_a(&self.shares, c)?;
        let quotient = Self::from_shares(&self.ctx, quotient);
        let error = Self::from_shares(&self.ctx, error);
        // correction := (error >= 0), added onto the raw quotient
        let correction = error.a2b()?.ltz().not_lsb().b2a_bit()?;
        Ok(&quotient + &correction)
    }

    /// Chunked dot product; one A-shared output per `chunk` input pairs.
    pub fn dot_product(&self, other: &Self, chunk: usize) -> Result<Self> {
        let out = Self::zeroed(&self.ctx, self.size().div_ceil(chunk));
        self.proto()
            .dot_product_a(&self.shares, &other.shares, &out.shares, chunk)?;
        Ok(out)
    }

    /// In-place inclusive prefix sum (local on additive shares).
    pub fn prefix_sum(&self) {
        self.shares.for_each(|s| s.prefix_sum());
    }

    /// Full-width conversion to a boolean sharing: redistribute the
    /// additive shares as two boolean sharings and add them with the
    /// boolean adder circuit.
    pub fn a2b(&self) -> Result<BSharedVector<T>> {
        let (x, y) = self.proto().redistribute_shares_b(&self.shares)?;
        let x = BSharedVector::from_shares(&self.ctx, x);
        let y = BSharedVector::from_shares(&self.ctx, y);
        circuits::add_boolean(&x, &y, false)
    }
}

impl<T: Element> BSharedVector<T> {
    /// Secret-share `v` with `owner` as the data owner.
    pub fn secret(ctx: &Ctx, v: &PlainVector<T>, owner: usize) -> Self {
        Self {
            shares: T::protocol(&**ctx).secret_share_b(v, owner),
            ctx: ctx.clone(),
        }
    }

    /// Share a public vector.
    pub fn public(ctx: &Ctx, v: &PlainVector<T>) -> Self {
        Self {
            shares: T::protocol(&**ctx).public_share_b(v),
            ctx: ctx.clone(),
        }
    }

    /// Share `value` repeated `size` times.
    pub fn public_repeated(ctx: &Ctx, value: T, size: usize) -> Self {
        Self::public(ctx, &PlainVector::filled(size, value))
    }

    /// Combine shares and reveal.
    pub fn open(&self) -> Result<PlainVector<T>> {
        self.proto().open_b(&self.shares)
    }

    /// Elementwise secure AND. One protocol round.
    pub fn and(&self, other: &Self) -> Result<Self> {
        let out = self.zeroed_like();
        self.proto()
            .and_b(&self.shares, &other.shares, &out.shares)?;
        Ok(out)
    }

    pub fn and_assign(&self, other: &Self) -> Result<()> {
        self.proto().and_b(&self.shares, &other.shares, &self.shares)
    }

    /// Elementwise secure OR, via De Morgan over AND.
    pub fn or(&self, other: &Self) -> Result<Self> {
        Ok(!&(!self).and(&!other)?)
    }

    /// In-place OR; inverts around the AND to avoid extra allocation.
    pub fn or_assign(&self, other: &Self) -> Result<()> {
        self.invert_inplace();
        self.and_assign(&!other)?;
        self.invert_inplace();
        Ok(())
    }

    /// Complement in place (local).
    pub fn invert_inplace(&self) {
        self.proto().not_b(&self.shares, &self.shares);
    }

    /// LSB-only boolean negation (local).
    pub fn not_lsb(&self) -> Self {
        let out = self.zeroed_like();
        self.proto().not_b_1(&self.shares, &out.shares);
        out
    }

    /// XOR with a public constant.
    pub fn xor_public(&self, c: T) -> Self {
        let out = self.zeroed_like();
        self.proto().xor_const_b(&self.shares, c, &out.shares);
        out
    }

    /// Mask every element with the public constant `n` (local: AND with a
    /// public mask commutes with XOR sharing).
    pub fn mask(&self, n: T) {
        self.shares.for_each(|s| s.mask(n));
    }

    /// Set all bits of each element to its LSB (local).
    pub fn extend_lsb(&self) -> Self {
        Self {
            shares: self.shares.project(|s| s.extend_lsb()),
            ctx: self.ctx.clone(),
        }
    }

    /// Less-than-zero: the sign bit, moved to the LSB (local).
    pub fn ltz(&self) -> Self {
        Self {
            shares: self.shares.project(|s| s.ltz()),
            ctx: self.ctx.clone(),
        }
    }

    /// Per-element parity, in the LSB (local).
    pub fn bit_xor_reduce(&self) -> Self {
        Self {
            shares: self.shares.project(|s| s.bit_xor()),
            ctx: self.ctx.clone(),
        }
    }

    /// Pack bit `position` of each element of `source` into this
    /// (compressed) vector (local, share-wise).
    pub fn pack_from(&self, source: &Self, position: u32) {
        for r in 0..self.shares.replication() {
            self.shares.share(r).pack_from(source.shares.share(r), position);
        }
    }

    /// Unpack bits of the compressed `source` into bit `position` of this
    /// vector's elements (local, share-wise).
    pub fn unpack_from(&self, source: &Self, position: u32) {
        for r in 0..self.shares.replication() {
            self.shares
                .share(r)
                .unpack_from(source.shares.share(r), position);
        }
    }

    /// Share-wise truncating/sign-extending cast. Valid for XOR sharings:
    /// both truncation and sign extension commute with XOR.
    pub fn cast<U: Element>(&self) -> BSharedVector<U> {
        let out = BSharedVector::<U>::zeroed(&self.ctx, self.size());
        out.shares.assign_cast(&self.shares);
        out
    }

    // ----- Adder-backed arithmetic -----

    /// Boolean addition with the configured adder circuit.
    pub fn add(&self, other: &Self) -> Result<Self> {
        circuits::add_boolean(self, other, false)
    }

    /// Boolean subtraction: `self + !other + 1` via the adder's carry-in.
    pub fn sub(&self, other: &Self) -> Result<Self> {
        circuits::add_boolean(self, &!other, true)
    }

    /// Boolean negation: `0 - self`.
    pub fn neg(&self) -> Result<Self> {
        self.zeroed_like().sub(self)
    }

    /// Private division (non-restoring circuit over the widened type).
    pub fn div(&self, other: &Self) -> Result<Self> {
        circuits::divide_boolean(self, other)
    }

    // ----- Comparisons -----

    /// Fused equality and greater-than; sorting consumes both and they
    /// share the same-prefix circuit.
    pub fn compare(&self, other: &Self) -> Result<(Self, Self)> {
        circuits::compare_eq_gt(self, other)
    }

    /// Elementwise equality.
    pub fn eq(&self, other: &Self) -> Result<Self> {
        let same = circuits::bit_same(self, other)?;
        same.mask(T::ONE);
        Ok(same)
    }

    /// Elementwise inequality.
    pub fn neq(&self, other: &Self) -> Result<Self> {
        Ok(self.eq(other)?.not_lsb())
    }

    /// Elementwise greater-than.
    pub fn gt(&self, other: &Self) -> Result<Self> {
        Ok(self.compare(other)?.1)
    }

    /// Elementwise less-than.
    pub fn lt(&self, other: &Self) -> Result<Self> {
        other.gt(self)
    }

    /// Elementwise greater-or-equal.
    pub fn ge(&self, other: &Self) -> Result<Self> {
        Ok(self.lt(other)?.not_lsb())
    }

    /// Elementwise less-or-equal.
    pub fn le(&self, other: &Self) -> Result<Self> {
        Ok(self.gt(other)?.not_lsb())
    }

    // ----- Conversions -----

    /// Convert the LSB to an arithmetic sharing. Much cheaper than a
    /// full-width conversion; preferred wherever a single bit suffices.
    pub fn b2a_bit(&self) -> Result<ASharedVector<T>> {
        let out = ASharedVector::zeroed(&self.ctx, self.size());
        self.proto().b2a_bit(&self.shares, &out.shares)?;
        Ok(out)
    }

    /// Full-width conversion to an arithmetic sharing: convert each bit
    /// with `b2a_bit` and sum the scaled results.
    pub fn b2a(&self) -> Result<ASharedVector<T>> {
        let res = ASharedVector::zeroed(&self.ctx, self.size());
        for i in 0..T::BITS {
            let bit = Self {
                shares: self.shares.project(|s| s.bit_logical_right_shift(i)),
                ctx: self.ctx.clone(),
            };
            bit.mask(T::ONE);
            let arith = bit.b2a_bit()?;
            let scaled = if i > 0 {
                arith.mul_public(T::ONE.shl(i))
            } else {
                arith
            };
            let sum = &res + &scaled;
            res.assign(&sum);
        }
        Ok(res)
    }
}

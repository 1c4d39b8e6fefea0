//! Oblivious shuffle.
//!
//! Shuffling a single vector applies one sharded permutation from the
//! pool. Shuffling a column set derives a single shared elementwise
//! permutation from one sharded permutation and applies it to every
//! column, so all columns move under the same row order.
//!
//! Pool budget: one permutation for a vector shuffle; one permutation
//! plus one pair per column for a column-set shuffle. Callers reserve.

use crate::element::Element;
use crate::encoded::{ASharedVector, BSharedVector};
use crate::error::Result;
use crate::permutation::{
    ElementwisePermutation, apply_perm_to_arithmetic, apply_perm_to_boolean,
    oblivious_apply_sharded_perm,
};
use crate::protocol::Ctx;
use crate::share::{Encoding, ReplicatedShares};

/// Obliviously shuffle a shared vector in place.
pub fn shuffle_shares<T: Element>(
    x: &mut ReplicatedShares<T>,
    encoding: Encoding,
    ctx: &Ctx,
) -> Result<()> {
    let perm = ctx.permutations().next(x.size(), encoding)?;
    oblivious_apply_sharded_perm(x, encoding, &perm, ctx)
}

/// Obliviously shuffle a set of columns under one common permutation.
pub fn shuffle_columns<T: Element>(
    data_a: &mut [ASharedVector<T>],
    data_b: &mut [BSharedVector<T>],
    size: usize,
    ctx: &Ctx,
) -> Result<()> {
    let perm = ElementwisePermutation::random(ctx, size, Encoding::Boolean)?;

    for column in data_a.iter_mut() {
        apply_perm_to_arithmetic(column, &perm)?;
    }
    for column in data_b.iter_mut() {
        apply_perm_to_boolean(column, &perm)?;
    }
    Ok(())
}

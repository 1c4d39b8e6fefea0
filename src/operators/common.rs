//! Conditional selection and oblivious row swaps.

use crate::element::Element;
use crate::encoded::{ASharedVector, BSharedVector};
use crate::error::Result;

/// Oblivious selection on boolean shares: `a` where the selector's LSB is
/// 0, `b` where it is 1. One AND round.
pub fn multiplex_b<T: Element>(
    sel: &BSharedVector<T>,
    a: &BSharedVector<T>,
    b: &BSharedVector<T>,
) -> Result<BSharedVector<T>> {
    let ext = sel.extend_lsb();
    Ok(a ^ &ext.and(&(b ^ a))?)
}

/// Oblivious selection on arithmetic shares: `a + sel * (b - a)`. One
/// multiplication round.
pub fn multiplex_a<T: Element>(
    sel: &ASharedVector<T>,
    a: &ASharedVector<T>,
    b: &ASharedVector<T>,
) -> Result<ASharedVector<T>> {
    Ok(a + &sel.mul(&(b - a))?)
}

/// Swap rows of two column sets in place where `bits` is 1. The columns
/// are views; writes land in the backing storage.
pub fn swap_b<T: Element>(
    x: &[BSharedVector<T>],
    y: &[BSharedVector<T>],
    bits: &BSharedVector<T>,
) -> Result<()> {
    debug_assert!(!x.is_empty() && x.len() == y.len(), "swap column mismatch");
    for (xc, yc) in x.iter().zip(y.iter()) {
        debug_assert_eq!(xc.size(), yc.size());
        debug_assert_eq!(bits.size(), xc.size());
        let tmp = multiplex_b(bits, xc, yc)?;
        let new_y = multiplex_b(bits, yc, xc)?;
        yc.assign(&new_y);
        xc.assign(&tmp);
    }
    Ok(())
}

/// Arithmetic-share counterpart of [`swap_b`].
pub fn swap_a<T: Element>(
    x: &[ASharedVector<T>],
    y: &[ASharedVector<T>],
    bits: &ASharedVector<T>,
) -> Result<()> {
    debug_assert!(!x.is_empty() && x.len() == y.len(), "swap column mismatch");
    for (xc, yc) in x.iter().zip(y.iter()) {
        debug_assert_eq!(xc.size(), yc.size());
        debug_assert_eq!(bits.size(), xc.size());
        let tmp = multiplex_a(bits, xc, yc)?;
        let new_y = multiplex_a(bits, yc, xc)?;
        yc.assign(&new_y);
        xc.assign(&tmp);
    }
    Ok(())
}

/// Single-column swap; masks the selector to its LSB first.
pub fn swap_single<T: Element>(
    x: &BSharedVector<T>,
    y: &BSharedVector<T>,
    bits: &BSharedVector<T>,
) -> Result<()> {
    bits.mask(T::ONE);
    swap_b(std::slice::from_ref(x), std::slice::from_ref(y), bits)
}

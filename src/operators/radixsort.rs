//! Oblivious radix sort (AHI+22).
//!
//! LSB-to-MSB passes. Each pass converts the current key bit to an
//! arithmetic sharing, prefix-sums the zero- and one-destination streams
//! into a per-bit destination permutation, and obliviously applies it.
//! Every pass is a stable partition, so the final order is a stable sort;
//! the total permutation falls out of the padded index bits, so per-bit
//! permutations never need composing.
//!
//! The sign bit of a full-width key sorts inverted (negative values come
//! first).

use crate::element::Element;
use crate::encoded::{ASharedVector, BSharedVector};
use crate::error::Result;
use crate::operators::sorting::{SortOrder, pad_input, remove_padding};
use crate::permutation::{ElementwisePermutation, PermIndex, apply_perm_to_boolean};
use crate::protocol::Ctx;

fn radix_sort_body<P: Element>(
    v: &mut BSharedVector<P>,
    bits: u32,
    full_width: bool,
    ctx: &Ctx,
) -> Result<()> {
    let n = v.size();

    // one permutation for the padding extraction (2PC converts directly),
    // one pair per bit plus one for the inversion
    let mut num_permutations = 1;
    if ctx.num_parties() == 2 {
        num_permutations -= 1;
    }
    ctx.permutations().reserve(n, num_permutations, (bits + 1) as usize);

    let one = ASharedVector::<PermIndex>::public_repeated(ctx, 1, n);

    // destination streams: s0 for zero bits, s1 for one bits
    let s = ASharedVector::<PermIndex>::zeroed(ctx, 2 * n);
    let s0 = s.slice_range(0, n);
    let s1 = s.slice_from(n);

    for i in 0..bits {
        // the shift runs over the padded type, past the 32 index bits
        let v_shift = &*v >> (32 + i);
        if full_width && i == bits - 1 {
            // sorting the MSB: flip the sign bit
            v_shift.invert_inplace();
        }

        let vprime: BSharedVector<PermIndex> = v_shift.cast();
        let f1 = vprime.b2a_bit()?;

        // f0 := 1 - f1, written into s0's storage
        s0.assign(&one);
        let f0 = &s0 - &f1;
        s0.assign(&f0);
        s1.assign(&f1);

        // destinations := prefix_sum(f0 || f1) - 1; decrementing the first
        // element propagates the -1 through the whole scan
        s.slice_range(0, 1).add_public_assign(-1);
        s.prefix_sum();

        // select each element's destination:
        //   perm = s0 + f1 * (s1 - s0)
        // (a multiplex, using f0 = 1 - f1 to save a multiplication)
        let diff = &s1 - &s0;
        s1.assign(&diff);
        f1.mul_assign(&s1)?;
        let dest = &s0 + &f1;
        s0.assign(&dest);

        let bit_perm = ElementwisePermutation::from_arithmetic(s0.clone());
        apply_perm_to_boolean(v, &bit_perm)?;
    }
    Ok(())
}

/// Sort `v` in place on its low `bits` bits and return the applied
/// permutation. `bits` equal to the full width gets signed ordering.
pub fn radix_sort<T: Element>(
    v: &mut BSharedVector<T>,
    order: SortOrder,
    bits: u32,
) -> Result<ElementwisePermutation> {
    let ctx = v.context().clone();
    let reversed = order == SortOrder::Desc;
    let full_width = bits == T::BITS;

    let mut padded = pad_input(v, reversed)?;

    radix_sort_body(&mut padded, bits, full_width, &ctx)?;

    if reversed {
        padded.reverse();
    }

    let mut permutation = remove_padding(v, &mut padded, reversed)?;
    permutation.invert()?;
    Ok(permutation)
}

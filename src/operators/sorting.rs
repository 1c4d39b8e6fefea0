//! Sorting (L6): row comparison, bitonic sort, padded-index keys, and
//! multi-key table sort.
//!
//! Sorts operate in place over boolean-shared *sort keys* plus disjoint
//! carried columns (either encoding) and return the permutation they
//! applied, so callers can move further columns the same way.
//!
//! Stability on duplicate keys comes from the padded-index trick: each
//! key is widened, the value shifted into the high bits, and the original
//! row index (negated for descending order) placed in the low 32 bits.
//! Sorting the padded value is then a sort on unique keys; the low bits of
//! the sorted output *are* the applied permutation.

use crate::element::Element;
use crate::encoded::{ASharedVector, BSharedVector};
use crate::error::{Error, Result};
use crate::operators::common::{swap_a, swap_b};
use crate::operators::quicksort::quicksort;
use crate::operators::radixsort::radix_sort;
use crate::permutation::{
    ElementwisePermutation, PermIndex, apply_perm_to_arithmetic, apply_perm_to_boolean,
    compose_permutations,
};
use crate::protocol::Ctx;
use crate::vector::PlainVector;
use serde::{Deserialize, Serialize};

/// Per-key sort direction.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Available sorting protocols. `Default` resolves through the runtime
/// configuration.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortingProtocol {
    BitonicSort,
    Quicksort,
    Radixsort,
    BitonicMerge,
    Default,
}

/// Lexicographic row comparison over `N` key columns: row `l > r` iff the
/// first differing key compares greater under its direction. Returns the
/// greater-than bits.
pub fn compare_rows<T: Element>(
    x: &[BSharedVector<T>],
    y: &[BSharedVector<T>],
    order: &[SortOrder],
) -> Result<BSharedVector<T>> {
    debug_assert!(
        !x.is_empty() && x.len() == y.len() && order.len() == x.len(),
        "compare_rows shape mismatch"
    );
    let (t, o) = match order[0] {
        SortOrder::Desc => (&y[0], &x[0]),
        SortOrder::Asc => (&x[0], &y[0]),
    };
    let (mut eq, mut gt) = t.compare(o)?;

    for k in 1..x.len() {
        let (t, o) = match order[k] {
            SortOrder::Desc => (&y[k], &x[k]),
            SortOrder::Asc => (&x[k], &y[k]),
        };
        let (new_eq, new_gt) = t.compare(o)?;
        // fold: greater already, or equal so far and greater now
        gt ^= &new_gt.and(&eq)?;
        eq = eq.and(&new_eq)?;
    }
    gt.mask(T::ONE);
    Ok(gt)
}

/// In-place bitonic sort over power-of-two-sized columns. `log^2 n`
/// compare/swap passes built from alternating-subset views; carried
/// columns swap under the same comparison bits.
pub fn bitonic_sort<T: Element>(
    keys: &[BSharedVector<T>],
    data_a: &[ASharedVector<T>],
    data_b: &[BSharedVector<T>],
    order: &[SortOrder],
) -> Result<()> {
    debug_assert!(!keys.is_empty());
    let n = keys[0].size();
    if !n.is_power_of_two() {
        return Err(Error::precondition(format!(
            "bitonic sort size {n} is not a power of two"
        )));
    }

    let rounds = n.ilog2();
    for i in 0..rounds {
        for j in 0..=i {
            let half_box = 1usize << (i - j);
            // the first pass of each round compares into reversed boxes
            let reversed_box = j == 0;

            let left =
                |c: &BSharedVector<T>| c.alternating_subset_reference(half_box, half_box);
            let right = |c: &BSharedVector<T>| {
                let tail = c.slice_from(half_box);
                if reversed_box {
                    tail.reversed_alternating_subset_reference(half_box, half_box)
                } else {
                    tail.alternating_subset_reference(half_box, half_box)
                }
            };
            let left_a =
                |c: &ASharedVector<T>| c.alternating_subset_reference(half_box, half_box);
            let right_a = |c: &ASharedVector<T>| {
                let tail = c.slice_from(half_box);
                if reversed_box {
                    tail.reversed_alternating_subset_reference(half_box, half_box)
                } else {
                    tail.alternating_subset_reference(half_box, half_box)
                }
            };

            let x: Vec<_> = keys.iter().map(&left).collect();
            let y: Vec<_> = keys.iter().map(&right).collect();

            let bits = compare_rows(&x, &y, order)?;
            swap_b(&x, &y, &bits)?;

            if !data_b.is_empty() {
                let xb: Vec<_> = data_b.iter().map(&left).collect();
                let yb: Vec<_> = data_b.iter().map(&right).collect();
                swap_b(&xb, &yb, &bits)?;
            }
            if !data_a.is_empty() {
                let bits_a = bits.b2a_bit()?;
                let xa: Vec<_> = data_a.iter().map(&left_a).collect();
                let ya: Vec<_> = data_a.iter().map(&right_a).collect();
                swap_a(&xa, &ya, &bits_a)?;
            }
        }
    }
    Ok(())
}

/// Single-vector bitonic sort.
pub fn bitonic_sort_single<T: Element>(v: &BSharedVector<T>, order: SortOrder) -> Result<()> {
    bitonic_sort(std::slice::from_ref(v), &[], &[], &[order])
}

// ===== Padded-index keys ====================================================

/// Widen a key into its padded type: original bits in the high half, the
/// row index (or its negation for descending sorts) in the low 32 bits.
pub fn pad_input<T: Element>(
    v: &BSharedVector<T>,
    reverse_order: bool,
) -> Result<BSharedVector<T::Padded>> {
    if !T::SUPPORTS_PAD {
        return Err(Error::precondition(
            "no padded type at this width; cannot index-pad the sort key",
        ));
    }
    let n = v.size();
    let ctx = v.context().clone();

    let idx: PlainVector<PermIndex> = (0..n)
        .map(|i| {
            if reverse_order {
                -1 - i as PermIndex
            } else {
                i as PermIndex
            }
        })
        .collect();
    let k = <PermIndex as Element>::protocol(&*ctx).public_share_b(&idx);

    let mut padded: BSharedVector<T::Padded> = v.cast();
    padded <<= 32;

    // OR the 32 index bits into the zeroed low half, share-wise; the bit
    // ranges are disjoint, so the sharing relation is preserved.
    let shares = padded.shares();
    for r in 0..shares.replication() {
        let dst = shares.share(r);
        let src = k.share(r);
        for i in 0..n {
            let low = <T::Padded as Element>::from_i128(src.get(i).to_i128() & 0xFFFF_FFFF);
            dst.set(i, dst.get(i) | low);
        }
    }

    if reverse_order {
        padded.reverse();
    }
    Ok(padded)
}

/// Strip the padding after sorting: restore the original-width key into
/// `v` and extract the low 32 bits as the applied permutation
/// (arithmetic-encoded, un-negated for descending sorts).
pub fn remove_padding<T: Element>(
    v: &BSharedVector<T>,
    padded: &mut BSharedVector<T::Padded>,
    reverse_order: bool,
) -> Result<ElementwisePermutation> {
    // the truncating cast keeps exactly the 32 index bits
    let perm_bits: BSharedVector<PermIndex> = padded.cast();
    let mut permutation = ElementwisePermutation::from_boolean(perm_bits);

    *padded >>= 32;
    v.shares().assign_cast(padded.shares());

    permutation.b2a()?;
    if reverse_order {
        permutation.negate()?;
    }
    Ok(permutation)
}

// ===== Multi-key table sort =================================================

/// Sort keys plus carried columns, composing one permutation across all
/// sort keys. Iterates keys from last to first so the first key ends up
/// primary; every per-key sort is stable thanks to the padded index, so
/// the composite is a stable lexicographic sort.
///
/// `single_bit` marks keys holding one-bit values (validity, table-id);
/// those sort with a 1-bit radix pass regardless of protocol.
pub fn table_sort<T: Element>(
    keys: &mut [BSharedVector<T>],
    data_a: &mut [ASharedVector<T>],
    data_b: &mut [BSharedVector<T>],
    order: &[SortOrder],
    single_bit: &[bool],
    protocol: SortingProtocol,
    ctx: &Ctx,
) -> Result<()> {
    debug_assert!(!keys.is_empty());
    debug_assert_eq!(keys.len(), order.len());
    debug_assert_eq!(keys.len(), single_bit.len());
    let size = keys[0].size();

    let ns = single_bit.iter().filter(|b| **b).count();
    let nk = keys.len() - ns;
    let nc = data_a.len() + data_b.len();
    let width = T::BITS as usize;

    // Pool budget: quicksort adds per-key shuffle permutations, multibit
    // radix one pair per bit, and non-2PC protocols pay a permutation per
    // key for the boolean-to-arithmetic conversion of the extracted
    // permutation.
    let mut perms_required = nk + ns - 1;
    let mut pairs_required = 4 * ns + 3 * nk + nc - 1;
    match protocol {
        SortingProtocol::Quicksort => perms_required += nk,
        SortingProtocol::Radixsort => pairs_required += nk * width,
        _ => {}
    }
    if ctx.num_parties() != 2 {
        perms_required += nk + ns;
    }
    tracing::debug!(
        size,
        keys = keys.len(),
        carried = nc,
        ?protocol,
        perms_required,
        pairs_required,
        "table sort"
    );
    ctx.permutations().reserve(size, perms_required, pairs_required);

    let sort_key = |key: &mut BSharedVector<T>, col: usize| -> Result<ElementwisePermutation> {
        if single_bit[col] {
            // only one significant bit to sort
            radix_sort(key, order[col], 1)
        } else {
            match protocol {
                SortingProtocol::Quicksort => quicksort(key, order[col]),
                SortingProtocol::Radixsort => radix_sort(key, order[col], T::BITS),
                other => Err(Error::UnsupportedProtocol(format!(
                    "{other:?} is not a table sort protocol"
                ))),
            }
        }
    };

    // Sort the last key first; revert it and keep only the permutation.
    let mut col = keys.len() - 1;
    let orig = keys[col].deepcopy();
    let mut sort_permutation = sort_key(&mut keys[col], col)?;
    keys[col].assign(&orig);

    // Remaining keys, second-to-last down to first: pre-apply the running
    // permutation, sort, revert, compose.
    while col > 0 {
        col -= 1;
        let orig = keys[col].deepcopy();
        apply_perm_to_boolean(&mut keys[col], &sort_permutation)?;
        let next_permutation = sort_key(&mut keys[col], col)?;
        keys[col].assign(&orig);
        sort_permutation = compose_permutations(sort_permutation, next_permutation)?;
    }

    // Apply the composite to every key and every carried column.
    for key in keys.iter_mut() {
        apply_perm_to_boolean(key, &sort_permutation)?;
    }
    for column in data_a.iter_mut() {
        apply_perm_to_arithmetic(column, &sort_permutation)?;
    }
    for column in data_b.iter_mut() {
        apply_perm_to_boolean(column, &sort_permutation)?;
    }

    Ok(())
}

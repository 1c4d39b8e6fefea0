//! Bitonic merge.
//!
//! Merges columns whose two halves are each already sorted in the same
//! direction: reverse the second half to form a bitonic sequence, then run
//! `log n` compare/swap passes. `O(n log n)` work over `O(log n)` rounds —
//! the cheap path when inputs arrive pre-sorted (for example, a
//! concatenation of two sorted tables).

use crate::element::Element;
use crate::encoded::{ASharedVector, BSharedVector};
use crate::error::{Error, Result};
use crate::operators::common::{swap_a, swap_b};
use crate::operators::sorting::{SortOrder, compare_rows};

fn reverse_second_half<T: Element>(
    keys: &[BSharedVector<T>],
    data_a: &[ASharedVector<T>],
    data_b: &[BSharedVector<T>],
) {
    let rows = keys[0].size();
    let half = rows / 2;
    for c in keys {
        c.slice_range(half, rows).reverse();
    }
    for c in data_b {
        c.slice_range(half, rows).reverse();
    }
    for c in data_a {
        c.slice_range(half, rows).reverse();
    }
}

/// Merge sorted halves in place. Keys and carried columns must be
/// power-of-two sized; each key's halves must already be sorted in the
/// direction given by `order`.
pub fn bitonic_merge<T: Element>(
    keys: &[BSharedVector<T>],
    data_a: &[ASharedVector<T>],
    data_b: &[BSharedVector<T>],
    order: &[SortOrder],
) -> Result<()> {
    debug_assert!(!keys.is_empty());
    let rows = keys[0].size();
    if !rows.is_power_of_two() {
        return Err(Error::precondition(format!(
            "bitonic merge size {rows} is not a power of two"
        )));
    }

    // Both halves arrive in the same direction; the merge wants the
    // second one reversed.
    reverse_second_half(keys, data_a, data_b);

    let rounds = rows.ilog2();
    let mut distance = rows;
    for _ in 0..rounds {
        distance /= 2;

        let left = |c: &BSharedVector<T>| c.alternating_subset_reference(distance, distance);
        let right = |c: &BSharedVector<T>| {
            c.slice_range(distance, rows)
                .alternating_subset_reference(distance, distance)
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
            let xa: Vec<_> = data_a
                .iter()
                .map(|c| c.alternating_subset_reference(distance, distance))
                .collect();
            let ya: Vec<_> = data_a
                .iter()
                .map(|c| {
                    c.slice_range(distance, rows)
                        .alternating_subset_reference(distance, distance)
                })
                .collect();
            swap_a(&xa, &ya, &bits_a)?;
        }
    }
    Ok(())
}

/// Single-vector merge of two sorted halves.
pub fn bitonic_merge_single<T: Element>(v: &BSharedVector<T>, order: SortOrder) -> Result<()> {
    bitonic_merge(std::slice::from_ref(v), &[], &[], &[order])
}

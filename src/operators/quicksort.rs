//! Oblivious quicksort.
//!
//! Shuffle first, then run quicksort where every element is compared
//! against its segment's frozen pivot and the comparison bits are
//! *opened*. Because the input was freshly shuffled and the padded index
//! makes keys unique, each opened bit is the comparison of a random
//! element against a random pivot — a controlled disclosure that reveals
//! nothing about the data itself. Partitioning then happens in plaintext
//! index space, one new pivot per partition, until every position is a
//! pivot. Expected `O(n log n)` comparisons.

use crate::element::Element;
use crate::encoded::BSharedVector;
use crate::error::Result;
use crate::operators::sorting::{SortOrder, pad_input, remove_padding};
use crate::permutation::ElementwisePermutation;
use crate::vector::PlainVector;

/// Lomuto partition over one plaintext segment `[start, end]` (inclusive),
/// swapping share storage directly; elements whose opened comparison bit
/// is 0 move before the new pivot. Freezes one pivot (and primes the
/// position after it).
fn partition<P: Element>(
    v: &BSharedVector<P>,
    comparisons: &PlainVector<i64>,
    start: usize,
    end: usize,
    pivots: &PlainVector<i64>,
) {
    let replication = v.shares().replication();
    let mut i = start;
    for j in (start + 1)..=end {
        if comparisons.get(j) == 0 {
            i += 1;
            for r in 0..replication {
                let s = v.shares().share(r);
                let (a, b) = (s.get(j), s.get(i));
                s.set(j, b);
                s.set(i, a);
            }
        }
    }

    for r in 0..replication {
        let s = v.shares().share(r);
        let (a, b) = (s.get(start), s.get(i));
        s.set(start, b);
        s.set(i, a);
    }

    pivots.set(i, i as i64);
    if i + 1 <= end {
        pivots.set(i + 1, (i + 1) as i64);
    }
}

fn quicksort_body<P: Element>(v: &mut BSharedVector<P>) -> Result<()> {
    v.shuffle()?;
    v.materialize_inplace();

    let n = v.size();

    // -1 marks a live (non-pivot) element; frozen pivots hold their index.
    let pivots = PlainVector::<i64>::filled(n, -1);
    pivots.set(0, 0);

    let exp_cmp: PlainVector<i64> = PlainVector::zeroed(n);

    loop {
        // Select the live elements and, via a running max over the frozen
        // pivot indices, each live element's governing pivot.
        let non_pivots: PlainVector<i64> =
            pivots.iter().map(|p| i64::from(p < 0)).collect();

        let pivot_temp = pivots.materialize();
        pivot_temp.prefix_sum_with(std::cmp::max);

        let pivot_vec = v.mapping_reference(&pivot_temp.included_reference(&non_pivots))?;
        let reduced_vec = v.included_reference(&non_pivots);

        // reduced > pivot: 1 means already on the correct side
        let (_eq, comparisons) = reduced_vec.compare(&pivot_vec)?;
        let cmp_plaintext = comparisons.open()?;

        let cmp_cast: PlainVector<i64> = cmp_plaintext.iter().map(|c| c.to_i128() as i64).collect();
        exp_cmp.included_reference(&non_pivots).assign(&cmp_cast);

        // Partition every segment between consecutive pivots.
        let mut index: i64 = -1;
        for p in 0..n {
            if pivots.get(p) < 0 {
                continue;
            }
            if p as i64 - index == 1 {
                // adjacent pivots, nothing between them
                index = p as i64;
                continue;
            }
            partition(v, &exp_cmp, index as usize, p - 1, &pivots);
            index = p as i64;
        }
        // leftover segment after the last pivot
        partition(v, &exp_cmp, index as usize, n - 1, &pivots);

        let num_pivots = pivots.iter().filter(|p| *p >= 0).count();
        if num_pivots >= n {
            return Ok(());
        }
    }
}

/// Sort `v` in place and return the applied permutation.
///
/// Pool budget (reserved here): one permutation for the shuffle, one for
/// the permutation's boolean-to-arithmetic conversion (saved by two-party
/// backends, which convert directly), and one pair for the inversion.
pub fn quicksort<T: Element>(
    v: &mut BSharedVector<T>,
    order: SortOrder,
) -> Result<ElementwisePermutation> {
    let ctx = v.context().clone();
    let mut num_permutations = 2;
    if ctx.num_parties() == 2 {
        num_permutations -= 1;
    }
    ctx.permutations().reserve(v.size(), num_permutations, 1);

    let reversed = order == SortOrder::Desc;

    // pad with the row index to make keys unique
    let mut padded = pad_input(v, reversed)?;

    quicksort_body(&mut padded)?;

    if reversed {
        padded.reverse();
    }

    let mut permutation = remove_padding(v, &mut padded, reversed)?;
    permutation.invert()?;
    Ok(permutation)
}

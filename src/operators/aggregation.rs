//! Log-depth odd-even aggregation (L7).
//!
//! Group-by aggregation over an already-grouped, power-of-two-sized table:
//! `log n` layers, each comparing every row against the row `d` positions
//! away, AND-folding per-key equality into *group bits*, and folding each
//! aggregator under those bits. Forward aggregation leaves the result in
//! the first row of each group, reverse in the last.
//!
//! An optional selector column (the table-id column during joins)
//! restricts which rows contribute to non-copy aggregations, so outer
//! joins aggregate only one side's rows.

use crate::element::Element;
use crate::encoded::{ASharedVector, BSharedVector};
use crate::error::{Error, Result};
use crate::operators::common::{multiplex_a, multiplex_b};
use crate::protocol::Ctx;

/// Direction of an aggregation pass.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Reverse,
}

/// Aggregators over boolean-shared columns.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BoolAggregator {
    Max,
    Min,
    BitOr,
    /// Carry a value across a group unchanged; used to propagate one
    /// table's attributes through a join.
    Copy,
    /// Validity fold: the accumulator stays valid only while both rows
    /// are valid. Internal to join validity updates.
    Valid,
}

impl BoolAggregator {
    pub fn is_copy(self) -> bool {
        matches!(self, BoolAggregator::Copy)
    }

    /// Fold `input` into `acc` under the group bits. `acc` is a view;
    /// the update writes through.
    pub fn apply<T: Element>(
        self,
        group: &BSharedVector<T>,
        acc: &BSharedVector<T>,
        input: &BSharedVector<T>,
    ) -> Result<()> {
        match self {
            BoolAggregator::Max => min_max(group, acc, input, false),
            BoolAggregator::Min => min_max(group, acc, input, true),
            BoolAggregator::BitOr => {
                let ext = group.extend_lsb();
                let res = acc.or(&ext.and(input)?)?;
                acc.assign(&res);
                Ok(())
            }
            BoolAggregator::Copy => {
                let res = multiplex_b(group, acc, input)?;
                acc.assign(&res);
                Ok(())
            }
            BoolAggregator::Valid => {
                let folded = acc.and(input)?;
                let res = multiplex_b(group, acc, &folded)?;
                acc.assign(&res);
                Ok(())
            }
        }
    }
}

fn min_max<T: Element>(
    group: &BSharedVector<T>,
    acc: &BSharedVector<T>,
    input: &BSharedVector<T>,
    minimum: bool,
) -> Result<()> {
    let mut input_greater = input.gt(acc)?;
    if minimum {
        // now technically acc-less-than-or-equal
        input_greater = input_greater.not_lsb();
    }
    let picked = multiplex_b(&input_greater, acc, input)?;
    let res = multiplex_b(group, acc, &picked)?;
    acc.assign(&res);
    Ok(())
}

/// Aggregators over arithmetic-shared columns.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ArithAggregator {
    Sum,
    /// Sum with the output preseeded to ones (or to the selector bit
    /// inside joins).
    Count,
    Copy,
}

impl ArithAggregator {
    pub fn is_copy(self) -> bool {
        matches!(self, ArithAggregator::Copy)
    }

    pub fn apply<T: Element>(
        self,
        group: &ASharedVector<T>,
        acc: &ASharedVector<T>,
        input: &ASharedVector<T>,
    ) -> Result<()> {
        match self {
            ArithAggregator::Sum | ArithAggregator::Count => {
                let res = acc + &group.mul(input)?;
                acc.assign(&res);
                Ok(())
            }
            ArithAggregator::Copy => {
                let res = multiplex_a(group, acc, input)?;
                acc.assign(&res);
                Ok(())
            }
        }
    }
}

/// One boolean aggregation: `(input, output, aggregator)`.
pub type BAggSpec<T> = (BSharedVector<T>, BSharedVector<T>, BoolAggregator);
/// One arithmetic aggregation: `(input, output, aggregator)`.
pub type AAggSpec<T> = (ASharedVector<T>, ASharedVector<T>, ArithAggregator);

/// Sorting-network-style aggregation over grouped rows.
///
/// All vectors must share one power-of-two size. With no keys, every row
/// belongs to one group. The selector, when present, excludes rows whose
/// selector bit differs from their partner's from non-copy aggregations.
pub fn aggregate<T: Element>(
    keys: &[BSharedVector<T>],
    spec_b: &[BAggSpec<T>],
    spec_a: &[AAggSpec<T>],
    dir: Direction,
    sel_b: Option<&BSharedVector<T>>,
    ctx: &Ctx,
) -> Result<()> {
    let total_size = if let Some(k) = keys.first() {
        k.size()
    } else if let Some((input, _, _)) = spec_b.first() {
        input.size()
    } else if let Some((input, _, _)) = spec_a.first() {
        input.size()
    } else {
        return Err(Error::precondition("empty aggregation"));
    };
    if !total_size.is_power_of_two() {
        return Err(Error::precondition(format!(
            "aggregation size {total_size} is not a power of two"
        )));
    }

    let a_any_copy = spec_a.iter().any(|(_, _, f)| f.is_copy());
    let a_any_noncopy = spec_a.iter().any(|(_, _, f)| !f.is_copy());
    let b_any_noncopy = spec_b.iter().any(|(_, _, f)| !f.is_copy());

    // Preprocessing: seed counts with ones (or the selector bit, so join
    // partners on the other side do not count); copy inputs to outputs.
    for (input, output, f) in spec_a {
        if *f == ArithAggregator::Count {
            match sel_b {
                Some(sel) => output.assign(&sel.b2a_bit()?),
                None => output.assign(&ASharedVector::public_repeated(ctx, T::ONE, total_size)),
            }
        } else {
            output.assign(input);
        }
    }
    for (input, output, _) in spec_b {
        output.assign(input);
    }

    let log_size = total_size.ilog2();

    for i in 1..=log_size {
        let d = match dir {
            Direction::Forward => total_size >> i,
            Direction::Reverse => total_size >> (log_size - i + 1),
        };
        let d_rest = total_size - d;

        // Group bits: all keys equal between partner rows.
        let group_bits_b = match keys.first() {
            None => BSharedVector::public_repeated(ctx, T::ONE, d_rest),
            Some(first) => {
                let bits = first.slice_range(0, d_rest).eq(&first.slice_from(d))?;
                for key in &keys[1..] {
                    bits.and_assign(&key.slice_range(0, d_rest).eq(&key.slice_from(d))?)?;
                }
                bits
            }
        };

        // Copy aggregations group on the keys alone; non-copy
        // aggregations additionally require matching selector bits.
        let join_group_bits_b = group_bits_b.deepcopy();
        if let Some(sel) = sel_b {
            if a_any_noncopy || b_any_noncopy {
                let same_side = !&(&sel.slice_from(d) ^ &sel.slice_range(0, d_rest));
                group_bits_b.and_assign(&same_side)?;
            }
        }
        group_bits_b.mask(T::ONE);

        for (_, output, f) in spec_b {
            let head = output.slice_range(0, d_rest);
            let tail = output.slice_from(d);
            let g = if f.is_copy() {
                &join_group_bits_b
            } else {
                &group_bits_b
            };
            match dir {
                Direction::Forward => f.apply(g, &head, &tail)?,
                Direction::Reverse => f.apply(g, &tail, &head)?,
            }
        }

        if !spec_a.is_empty() {
            // Batched conversion of the group bits, one per needed variant.
            let (group_bits_a, join_group_bits_a) = if keys.is_empty() {
                let ones = ASharedVector::public_repeated(ctx, T::ONE, d_rest);
                (Some(ones.clone()), Some(ones))
            } else {
                let g = if a_any_noncopy {
                    Some(group_bits_b.b2a_bit()?)
                } else {
                    None
                };
                let j = if a_any_copy {
                    Some(join_group_bits_b.b2a_bit()?)
                } else {
                    None
                };
                (g, j)
            };

            for (_, output, f) in spec_a {
                let head = output.slice_range(0, d_rest);
                let tail = output.slice_from(d);
                let g = if f.is_copy() {
                    join_group_bits_a.as_ref().expect("copy group bits present")
                } else {
                    group_bits_a.as_ref().expect("group bits present")
                };
                match dir {
                    Direction::Forward => f.apply(g, &head, &tail)?,
                    Direction::Reverse => f.apply(g, &tail, &head)?,
                }
            }
        }
    }

    Ok(())
}

/// Log-depth prefix sum over an arithmetic vector: the degenerate
/// aggregation where every row is one group. Entirely local on additive
/// shares. `reverse` computes a suffix sum.
pub fn tree_prefix_sum<T: Element>(v: &ASharedVector<T>, reverse: bool) -> Result<()> {
    let size = v.size();
    if !size.is_power_of_two() {
        return Err(Error::precondition(format!(
            "prefix sum size {size} is not a power of two"
        )));
    }
    let y = if reverse {
        v.directed_subset_reference(-1)
    } else {
        v.clone()
    };

    let log_size = size.ilog2();
    for i in 1..=log_size {
        let d = size >> i;
        let d_rest = size - d;
        let a = y.slice_range(0, d_rest);
        let b = y.slice_from(d);
        // not a compound assignment: b aliases a through the storage
        let sum = &b + &a;
        b.assign(&sum);
    }
    Ok(())
}

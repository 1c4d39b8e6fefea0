//! Stream-window operators (L8).
//!
//! All three operate on already-sorted inputs and never rewrite
//! invalidated rows. Window assignment for the session variants runs a
//! reverse `max` aggregation within key groups, so every row inherits the
//! timestamp of the most recent session start.

use crate::element::Element;
use crate::encoded::{ASharedVector, BSharedVector};
use crate::error::Result;
use crate::operators::aggregation::{BoolAggregator, Direction, aggregate};
use crate::operators::common::multiplex_b;

/// Tumbling windows: `window := key / window_size` for a public window
/// size.
pub fn tumbling_window<T: Element>(
    key: &ASharedVector<T>,
    window_size: T,
    res: &ASharedVector<T>,
) -> Result<()> {
    res.assign(&key.div_public(window_size)?);
    Ok(())
}

/// Mark gap-session starts: a session begins where the gap to the
/// previous timestamp exceeds `gap`; the first row always starts one.
pub fn mark_gap_session<T: Element>(
    timestamp: &ASharedVector<T>,
    session_start: &BSharedVector<T>,
    gap: T,
) -> Result<()> {
    let ctx = timestamp.context();
    let n = timestamp.size();

    session_start
        .slice_range(0, 1)
        .assign(&BSharedVector::public_repeated(ctx, T::ONE, 1));

    // start <=> ts[i-1] + gap - ts[i] < 0
    let gap_extended = ASharedVector::public_repeated(ctx, gap, n - 1);
    let pair_wise_gap = &(&timestamp.slice_range(0, n - 1) + &gap_extended) - &timestamp.slice_from(1);

    let pair_wise_gap_b = pair_wise_gap.a2b()?;
    session_start.slice_from(1).assign(&pair_wise_gap_b.ltz());
    Ok(())
}

/// Gap-session windows: mark starts, stamp non-start rows with a
/// sentinel, then spread each start's timestamp over its session with a
/// reverse max aggregation within the key group.
pub fn gap_session_window<T: Element>(
    keys: &[BSharedVector<T>],
    timestamp_a: &ASharedVector<T>,
    timestamp_b: &BSharedVector<T>,
    window_id: &BSharedVector<T>,
    gap: T,
) -> Result<()> {
    let ctx = timestamp_a.context();
    mark_gap_session(timestamp_a, window_id, gap)?;

    let sentinel =
        BSharedVector::public_repeated(ctx, T::ZERO.wrapping_sub(T::ONE), window_id.size());
    let marked = multiplex_b(window_id, &sentinel, timestamp_b)?;
    window_id.assign(&marked);

    aggregate(
        keys,
        &[(window_id.clone(), window_id.clone(), BoolAggregator::Max)],
        &[],
        Direction::Reverse,
        None,
        ctx,
    )
}

/// Mark threshold-session starts: the function value crosses above
/// `threshold` where the previous row's did not. Also returns each row's
/// above-threshold bit in `potential_window`.
pub fn mark_threshold_session<T: Element>(
    function_res: &BSharedVector<T>,
    session_start: &BSharedVector<T>,
    potential_window: &BSharedVector<T>,
    threshold: T,
) -> Result<()> {
    let ctx = function_res.context();
    let n = function_res.size();

    let shared_threshold = BSharedVector::public_repeated(ctx, threshold, n);
    potential_window.assign(&function_res.gt(&shared_threshold)?);

    let tail = potential_window.slice_from(1);
    let head = potential_window.slice_range(0, n - 1);
    session_start
        .slice_from(1)
        .assign(&tail.and(&(&tail ^ &head))?);
    Ok(())
}

/// Threshold-session windows: rows below the threshold never inherit a
/// window, enforced by passing the above-threshold bits as the
/// aggregation selector.
pub fn threshold_session_window<T: Element>(
    keys: &[BSharedVector<T>],
    function_res: &BSharedVector<T>,
    timestamp_b: &BSharedVector<T>,
    window_id: &BSharedVector<T>,
    threshold: T,
) -> Result<()> {
    let ctx = function_res.context();
    let potential_window = BSharedVector::zeroed(ctx, window_id.size());

    mark_threshold_session(function_res, window_id, &potential_window, threshold)?;

    let sentinel =
        BSharedVector::public_repeated(ctx, T::ZERO.wrapping_sub(T::ONE), window_id.size());
    let marked = multiplex_b(window_id, &sentinel, timestamp_b)?;
    window_id.assign(&marked);

    aggregate(
        keys,
        &[(window_id.clone(), window_id.clone(), BoolAggregator::Max)],
        &[],
        Direction::Reverse,
        Some(&potential_window),
        ctx,
    )
}

// tests/windows.rs
//
// Stream-window operators over pre-sorted, power-of-two-sized tables.

use shroud::prelude::*;
use anyhow::Result;
use shroud::relational::EncodedTable;
use shroud::testing::plain_ctx;

#[test]
fn tumbling_window_divides_timestamps() -> Result<()> {
    let ctx = plain_ctx();
    let times: PlainVector<i64> = vec![0, 5, 9, 10, 19, 20, 23, 31].into();
    let zero: PlainVector<i64> = PlainVector::zeroed(8);

    let t = EncodedTable::secret_share(
        &ctx,
        "events",
        &[times, zero],
        &["time", "window"],
        0,
    )?;
    t.tumbling_window("time", 10, "window")?;

    let opened = EncodedTable::get_column(&t.open_with_schema(true)?, "window")?;
    assert!(opened.same_as(&vec![0i64, 0, 0, 1, 1, 2, 2, 3].into()));
    Ok(())
}

#[test]
fn gap_session_window_assigns_start_times() -> Result<()> {
    let ctx = plain_ctx();
    let times: PlainVector<i64> = vec![1, 2, 3, 10, 11, 12, 30, 31].into();
    let key: PlainVector<i64> = PlainVector::filled(8, 7);
    let zero: PlainVector<i64> = PlainVector::zeroed(8);

    let mut t = EncodedTable::secret_share(
        &ctx,
        "sessions",
        &[times.clone(), times, key, zero],
        &["time", "[time]", "[key]", "[window]"],
        0,
    )?;
    // sessions break when consecutive timestamps are more than 5 apart
    t.gap_session_window(&["[key]"], "time", "[time]", "[window]", 5, true)?;

    let opened = EncodedTable::get_column(&t.open_with_schema(true)?, "[window]")?;
    assert!(opened.same_as(&vec![1i64, 1, 1, 10, 10, 10, 30, 30].into()));
    Ok(())
}

#[test]
fn threshold_session_window_gates_on_value() -> Result<()> {
    let ctx = plain_ctx();
    let times: PlainVector<i64> = vec![1, 2, 3, 4, 5, 6, 7, 8].into();
    let values: PlainVector<i64> = vec![0, 9, 9, 0, 9, 9, 9, 0].into();
    let key: PlainVector<i64> = PlainVector::filled(8, 1);
    let zero: PlainVector<i64> = PlainVector::zeroed(8);

    let mut t = EncodedTable::secret_share(
        &ctx,
        "sensor",
        &[times, values, key, zero],
        &["[time]", "[value]", "[key]", "[window]"],
        0,
    )?;
    t.threshold_session_window(&["[key]"], "[value]", "[time]", "[window]", 5, false, true)?;

    // below-threshold rows are filtered; survivors carry their session's
    // start time
    let (data, names) = t.open_with_schema(true)?;
    let opened = EncodedTable::get_column(&(data, names), "[window]")?;
    assert!(opened.same_as(&vec![2i64, 2, 5, 5, 5].into()));
    Ok(())
}

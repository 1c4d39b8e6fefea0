// tests/joins.rs
//
// The join family: inner with aggregation, outer variants, semi/anti,
// and the unique-key fast path.

use shroud::relational::EncodedTable;
use shroud::prelude::*;
use shroud::testing::{plain_ctx, same_rows};

type Table = EncodedTable<i64>;

fn open_columns(t: &Table, names: &[&str]) -> Result<Vec<PlainVector<i64>>> {
    let opened = t.open_with_schema(true)?;
    names
        .iter()
        .map(|n| EncodedTable::get_column(&opened, n))
        .collect()
}

#[test]
fn inner_join_with_count() -> Result<()> {
    let ctx = plain_ctx();

    let left = Table::secret_share(
        &ctx,
        "left",
        &[
            vec![1i64, 1, 2, 3, 4].into(),
            vec![1i64, 2, 4, 6, 7].into(),
            PlainVector::zeroed(5),
        ],
        &["[k1]", "[k2]", "d"],
        0,
    )?;
    let right = Table::secret_share(
        &ctx,
        "right",
        &[
            vec![1i64, 1, 1, 3, 4, 4, 1, 1, 4, 5].into(),
            vec![2i64, 1, 1, 6, 7, 7, 1, 2, 7, 8].into(),
            vec![9i64, 8, 7, 6, 5, 4, 3, 2, 1, 0].into(),
            PlainVector::zeroed(10),
        ],
        &["[k1]", "[k2]", "d2", "c"],
        0,
    )?;

    let joined = left.inner_join(
        &right,
        &["[k1]", "[k2]"],
        &[("c", "c", Aggregation::Count)],
        JoinOptions::default(),
    )?;

    let cols = open_columns(&joined, &["[k1]", "[k2]", "c"])?;
    let expected = [
        vec![1i64, 1, 3, 4].into(),
        vec![1i64, 2, 6, 7].into(),
        vec![3i64, 2, 1, 3].into(),
    ];
    assert!(same_rows(&cols, &expected));
    Ok(())
}

#[test]
fn inner_join_output_bounded_by_right() -> Result<()> {
    let ctx = plain_ctx();
    let left = Table::secret_share(&ctx, "l", &[vec![1i64, 2, 3, 4].into()], &["[k]"], 0)?;
    let right = Table::secret_share(&ctx, "r", &[vec![2i64, 2, 9].into()], &["[k]"], 0)?;

    let joined = left.inner_join(&right, &["[k]"], &[], JoinOptions::default())?;
    // trimmed to at most |R| rows
    assert!(joined.size() <= 3);

    let cols = open_columns(&joined, &["[k]"])?;
    assert!(same_rows(&cols, &[vec![2i64, 2].into()]));
    Ok(())
}

#[test]
fn left_outer_join_keeps_unmatched_left_rows() -> Result<()> {
    let ctx = plain_ctx();
    let left = Table::secret_share(
        &ctx,
        "l",
        &[vec![1i64, 2, 3].into(), vec![10i64, 20, 30].into()],
        &["[k]", "a"],
        0,
    )?;
    let right = Table::secret_share(
        &ctx,
        "r",
        &[vec![1i64, 1, 3].into(), vec![5i64, 6, 7].into()],
        &["[k]", "b"],
        0,
    )?;

    let joined = left.left_outer_join(
        &right,
        &["[k]"],
        &[("a", "a", Aggregation::CopyA)],
        JoinOptions::default(),
    )?;

    let cols = open_columns(&joined, &["[k]", "a", "b"])?;
    // key 1 matches twice, key 3 once, key 2 survives unmatched with no
    // right attributes
    let expected = [
        vec![1i64, 1, 2, 3].into(),
        vec![10i64, 10, 20, 30].into(),
        vec![5i64, 6, 0, 7].into(),
    ];
    assert!(same_rows(&cols, &expected));
    Ok(())
}

#[test]
fn full_outer_join_keeps_everything() -> Result<()> {
    let ctx = plain_ctx();
    let left = Table::secret_share(&ctx, "l", &[vec![1i64, 2].into()], &["[k]"], 0)?;
    let right = Table::secret_share(&ctx, "r", &[vec![2i64, 3].into()], &["[k]"], 0)?;

    let joined = left.full_outer_join(&right, &["[k]"], &[], JoinOptions::default())?;
    let cols = open_columns(&joined, &["[k]"])?;
    assert!(same_rows(&cols, &[vec![1i64, 2, 2, 3].into()]));
    Ok(())
}

#[test]
fn semi_join_projects_left_matches() -> Result<()> {
    let ctx = plain_ctx();
    let left = Table::secret_share(
        &ctx,
        "l",
        &[vec![1i64, 2, 3, 4].into(), vec![10i64, 20, 30, 40].into()],
        &["[k]", "a"],
        0,
    )?;
    let right = Table::secret_share(&ctx, "r", &[vec![2i64, 4, 9].into()], &["[k]"], 0)?;

    let joined = left.semi_join(&right, &["[k]"])?;
    let cols = open_columns(&joined, &["[k]", "a"])?;
    assert!(same_rows(
        &cols,
        &[vec![2i64, 4].into(), vec![20i64, 40].into()]
    ));
    Ok(())
}

#[test]
fn anti_join_projects_left_non_matches() -> Result<()> {
    let ctx = plain_ctx();
    let left = Table::secret_share(
        &ctx,
        "l",
        &[vec![1i64, 2, 3, 4].into(), vec![10i64, 20, 30, 40].into()],
        &["[k]", "a"],
        0,
    )?;
    let right = Table::secret_share(&ctx, "r", &[vec![2i64, 4, 9].into()], &["[k]"], 0)?;

    let joined = left.anti_join(&right, &["[k]"])?;
    let cols = open_columns(&joined, &["[k]", "a"])?;
    assert!(same_rows(
        &cols,
        &[vec![1i64, 3].into(), vec![10i64, 30].into()]
    ));
    Ok(())
}

#[test]
fn unique_key_join_compound_keys() -> Result<()> {
    let ctx = plain_ctx();
    let left = Table::secret_share(
        &ctx,
        "left",
        &[
            vec![0i64, 0, 0, 1, 1, 2, 2, 2, 2, 3, 4, 5, 5].into(),
            vec![0i64, 1, 2, 0, 1, 0, 1, 2, 3, 3, 4, 5, 6].into(),
            vec![9i64, 8, 7, 6, 5, 4, 3, 2, 1, 0, -1, -2, -3].into(),
        ],
        &["[k1]", "[k2]", "a"],
        0,
    )?;
    let right = Table::secret_share(
        &ctx,
        "right",
        &[
            vec![0i64, 1, 1, 1, 1, 2, 2, 3, 4, 4, 4, 4, 5].into(),
            vec![1i64, 5, 4, 3, 2, 0, 2, 4, 1, 2, 3, 4, 5].into(),
            vec![99i64, 88, 77, 66, 55, 44, 33, 22, 11, 0, -11, -22, -33].into(),
        ],
        &["[k1]", "[k2]", "b"],
        0,
    )?;

    let joined = left.uu_join(
        &right,
        &["[k1]", "[k2]"],
        &[("a", "a", Aggregation::CopyA)],
        JoinOptions::default(),
        SortingProtocol::Quicksort,
    )?;

    let cols = open_columns(&joined, &["[k1]", "[k2]", "a", "b"])?;
    let expected = [
        vec![0i64, 2, 2, 4, 5].into(),
        vec![1i64, 0, 2, 4, 5].into(),
        vec![8i64, 4, 2, -1, -2].into(),
        vec![99i64, 44, 33, -22, -33].into(),
    ];
    assert!(same_rows(&cols, &expected));
    Ok(())
}

#[test]
fn unique_key_join_rejects_aggregations() -> Result<()> {
    let ctx = plain_ctx();
    let left = Table::secret_share(
        &ctx,
        "l",
        &[vec![1i64, 2].into(), vec![1i64, 2].into()],
        &["[k]", "a"],
        0,
    )?;
    let right = Table::secret_share(&ctx, "r", &[vec![1i64, 3].into()], &["[k]"], 0)?;

    let result = left.uu_join(
        &right,
        &["[k]"],
        &[("a", "a", Aggregation::Sum)],
        JoinOptions::default(),
        SortingProtocol::Quicksort,
    );
    assert!(matches!(
        result,
        Err(shroud::Error::AggregationNotSupportedHere)
    ));
    Ok(())
}

#[test]
fn join_size_bounds() -> Result<()> {
    let ctx = plain_ctx();
    let left = Table::secret_share(&ctx, "l", &[vec![1i64, 2, 3].into()], &["[k]"], 0)?;
    let right =
        Table::secret_share(&ctx, "r", &[vec![1i64, 1, 2, 2, 2].into()], &["[k]"], 0)?;

    // |L inner_join R| <= |R| with unique left keys
    let inner = left.inner_join(&right, &["[k]"], &[], JoinOptions::default())?;
    let (data, _) = inner.open_with_schema(true)?;
    assert!(data[0].size() <= 5);

    // |L left_outer_join R| <= |L| + |R|
    let outer = left.left_outer_join(&right, &["[k]"], &[], JoinOptions::default())?;
    assert!(outer.size() <= 8);
    Ok(())
}

// tests/table_ops.rs
//
// Relational table bookkeeping: schema, validity, sorting, aggregation,
// distinct, concatenation, and finalization.

use shroud::relational::{EncodedTable, TABLE_ID_COL, UNIQ_COL, VALID_COL};
use shroud::prelude::*;
use anyhow::Result;
use shroud::testing::{plain_ctx, same_rows};

fn people(ctx: &Ctx) -> Result<EncodedTable<i64>> {
    let ids: PlainVector<i64> = vec![1, 2, 3, 4, 5, 6].into();
    let ages: PlainVector<i64> = vec![30, 41, 17, 65, 17, 50].into();
    Ok(EncodedTable::secret_share(ctx, "people", &[ids, ages], &["[id]", "age"], 0)?)
}

#[test]
fn schema_bookkeeping() -> Result<()> {
    let ctx = plain_ctx();
    let mut t = people(&ctx)?;
    assert_eq!(t.size(), 6);
    assert!(t.column_names().contains(&VALID_COL.to_string()));

    t.add_column("[flag]")?;
    assert!(t.b_column("[flag]").is_ok());
    // arithmetic accessor on a boolean column is an encoding error
    assert!(matches!(
        t.a_column("[flag]"),
        Err(shroud::Error::WrongEncoding(_))
    ));

    t.rename_column("[flag]", "[marker]")?;
    assert!(t.b_column("[flag]").is_err());
    assert!(t.rename_column("[marker]", "age").is_err());

    // projection keeps the reserved columns
    t.project(&["age"]);
    assert!(t.b_column(VALID_COL).is_ok());
    assert!(t.a_column("age").is_ok());
    assert!(t.b_column("[id]").is_err());

    // reserved names cannot be user-created
    assert!(t.add_column(VALID_COL).is_err());
    assert!(t.add_column(UNIQ_COL).is_err());
    assert!(t.add_column(TABLE_ID_COL).is_err());
    Ok(())
}

#[test]
fn filter_is_monotonic() -> Result<()> {
    let ctx = plain_ctx();
    let t = people(&ctx)?;

    let adults = t.a_column("age")?.a2b()?.gt(&BSharedVector::public_repeated(&ctx, 18, 6))?;
    t.filter(&adults)?;
    let valid = t.valid_column().open()?;
    assert!(valid.same_as(&vec![1i64, 1, 0, 1, 0, 1].into()));

    // filtering with an all-ones predicate never revalidates
    let ones = BSharedVector::public_repeated(&ctx, 1, 6);
    t.filter(&ones)?;
    assert!(t.valid_column().open()?.same_as(&valid));
    Ok(())
}

#[test]
fn table_sort_moves_rows() -> Result<()> {
    let ctx = plain_ctx();
    let keys: PlainVector<i64> = vec![5, 1, 4, 2, 6, 3].into();
    let vals: PlainVector<i64> = vec![50, 10, 40, 20, 60, 30].into();
    let mut t =
        EncodedTable::secret_share(&ctx, "t", &[keys, vals], &["[k]", "v"], 0)?;

    t.sort(&[("[k]", SortOrder::Asc)])?;

    let (data, names) = t.open_with_schema(true)?;
    let k = EncodedTable::get_column(&(data.clone(), names.clone()), "[k]")?;
    let v = EncodedTable::get_column(&(data, names), "v")?;
    assert!(k.same_as(&vec![1i64, 2, 3, 4, 5, 6].into()));
    assert!(v.same_as(&vec![10i64, 20, 30, 40, 50, 60].into()));
    Ok(())
}

#[test]
fn bitonic_table_sort_pads_and_unpads() -> Result<()> {
    let ctx = plain_ctx();
    let keys: PlainVector<i64> = vec![3, 1, 2, 5, 4].into();
    let mut t = EncodedTable::secret_share(&ctx, "t", &[keys], &["[k]"], 0)?;

    t.sort_with(
        &[(VALID_COL, SortOrder::Asc), ("[k]", SortOrder::Asc)],
        SortingProtocol::BitonicSort,
    )?;

    // padding was trimmed back to the original size
    assert_eq!(t.size(), 5);
    let (data, names) = t.open_with_schema(true)?;
    let k = EncodedTable::get_column(&(data, names), "[k]")?;
    assert!(k.same_as(&vec![1i64, 2, 3, 4, 5].into()));
    Ok(())
}

#[test]
fn aggregate_group_by_sums() -> Result<()> {
    let ctx = plain_ctx();
    let city: PlainVector<i64> = vec![1, 2, 1, 2, 1, 3].into();
    let pay: PlainVector<i64> = vec![10, 20, 30, 40, 50, 60].into();
    let mut t =
        EncodedTable::secret_share(&ctx, "salaries", &[city, pay], &["[city]", "pay"], 0)?;

    t.aggregate(
        &["[city]"],
        &[("pay", "pay", Aggregation::Sum)],
        Default::default(),
    )?;

    let (data, names) = t.open_with_schema(true)?;
    let city = EncodedTable::get_column(&(data.clone(), names.clone()), "[city]")?;
    let pay = EncodedTable::get_column(&(data, names), "pay")?;

    let expected_city: PlainVector<i64> = vec![1, 2, 3].into();
    let expected_pay: PlainVector<i64> = vec![90, 60, 60].into();
    assert!(same_rows(&[city, pay], &[expected_city, expected_pay]));
    Ok(())
}

#[test]
fn distinct_keeps_one_row_per_key() -> Result<()> {
    let ctx = plain_ctx();
    let k: PlainVector<i64> = vec![4, 2, 4, 2, 4, 9, 9, 1].into();
    let mut t = EncodedTable::secret_share(&ctx, "dup", &[k], &["[k]"], 0)?;

    t.distinct(&["[k]"])?;

    let (data, names) = t.open_with_schema(true)?;
    let k = EncodedTable::get_column(&(data, names), "[k]")?;
    assert_eq!(k.size(), 4);
    assert!(shroud::testing::same_elements(&k, &vec![1i64, 2, 4, 9].into()));
    Ok(())
}

#[test]
fn concatenate_stacks_and_marks_sides() -> Result<()> {
    let ctx = plain_ctx();
    let left = EncodedTable::secret_share(
        &ctx,
        "l",
        &[vec![1i64, 2].into()],
        &["[k]"],
        0,
    )?;
    let right = EncodedTable::secret_share(
        &ctx,
        "r",
        &[vec![3i64, 4, 5].into(), vec![30i64, 40, 50].into()],
        &["[k]", "extra"],
        0,
    )?;

    let concat = left.concatenate(&right, false)?;
    assert_eq!(concat.size(), 5);
    assert!(concat.b_column(TABLE_ID_COL).is_ok());

    let tid = concat.b_column(TABLE_ID_COL)?.open()?;
    assert!(tid.same_as(&vec![0i64, 0, 1, 1, 1].into()));
    let k = concat.b_column("[k]")?.open()?;
    assert!(k.same_as(&vec![1i64, 2, 3, 4, 5].into()));
    // left rows carry zero in the right-only column
    let extra = concat.a_column("extra")?.open()?;
    assert!(extra.same_as(&vec![0i64, 0, 30, 40, 50].into()));

    // power-of-two padding invalidates the padded rows
    let padded = left.concatenate(&right, true)?;
    assert_eq!(padded.size(), 8);
    let valid = padded.valid_column().open()?;
    assert!(valid.same_as(&vec![1i64, 1, 1, 1, 1, 0, 0, 0].into()));
    Ok(())
}

#[test]
fn head_tail_resize_pad() -> Result<()> {
    let ctx = plain_ctx();
    let mut t = people(&ctx)?;

    t.resize(7);
    assert_eq!(t.size(), 7);
    // grown rows are invalid
    assert_eq!(t.valid_column().open()?.get(6), 0);

    t.head(4);
    assert_eq!(t.size(), 4);
    assert!(t.b_column("[id]")?.open()?.same_as(&vec![1i64, 2, 3, 4].into()));

    t.tail(2);
    assert!(t.b_column("[id]")?.open()?.same_as(&vec![3i64, 4].into()));

    t.pad_power_of_two(0);
    assert_eq!(t.size(), 2);
    t.resize(3);
    t.pad_power_of_two(0);
    assert_eq!(t.size(), 4);
    Ok(())
}

#[test]
fn finalize_masks_invalid_rows() -> Result<()> {
    let ctx = plain_ctx();
    let k: PlainVector<i64> = vec![1, 2, 3, 4].into();
    let mut t = EncodedTable::secret_share(&ctx, "m", &[k], &["[k]"], 0)?;

    let keep = BSharedVector::secret(&ctx, &vec![1i64, 0, 1, 0].into(), 0);
    t.filter(&keep)?;
    // skip the shuffle so row order stays observable
    t.finalize(false)?;

    let k = t.b_column("[k]")?.open()?;
    assert!(k.same_as(&vec![1i64, i64::MAX, 3, i64::MAX].into()));
    Ok(())
}

#[test]
fn shuffled_table_preserves_row_multiset() -> Result<()> {
    let ctx = plain_ctx();
    let mut t = people(&ctx)?;
    t.shuffle()?;

    let (data, names) = t.open_with_schema(true)?;
    let id = EncodedTable::get_column(&(data.clone(), names.clone()), "[id]")?;
    let age = EncodedTable::get_column(&(data, names), "age")?;
    assert!(same_rows(
        &[id, age],
        &[
            vec![1i64, 2, 3, 4, 5, 6].into(),
            vec![30i64, 41, 17, 65, 17, 50].into()
        ]
    ));
    Ok(())
}

#[test]
fn conversions_between_encodings() -> Result<()> {
    let ctx = plain_ctx();
    let vals: PlainVector<i64> = vec![5, -3, 0, 9].into();
    let bits: PlainVector<i64> = vec![1, 0, 1, 1].into();
    let zero: PlainVector<i64> = PlainVector::zeroed(4);
    let t = EncodedTable::secret_share(
        &ctx,
        "conv",
        &[vals.clone(), bits, zero.clone(), zero],
        &["v", "[bit]", "count", "[vb]"],
        0,
    )?;

    t.convert_a2b("v", "[vb]")?;
    assert!(t.b_column("[vb]")?.open()?.same_as(&vals));

    t.convert_b2a_bit("[bit]", "count")?;
    assert!(t.a_column("count")?.open()?.same_as(&vec![1i64, 0, 1, 1].into()));
    Ok(())
}

#[test]
fn prefix_sum_and_extend_lsb() -> Result<()> {
    let ctx = plain_ctx();
    let v: PlainVector<i64> = vec![1, 2, 3, 4].into();
    let b: PlainVector<i64> = vec![1, 0, 3, 2].into();
    let t = EncodedTable::secret_share(&ctx, "scan", &[v, b], &["v", "[b]"], 0)?;

    t.prefix_sum("v")?;
    assert!(t.a_column("v")?.open()?.same_as(&vec![1i64, 3, 6, 10].into()));

    t.extend_lsb("[b]")?;
    assert!(t.b_column("[b]")?.open()?.same_as(&vec![-1i64, 0, -1, 0].into()));
    Ok(())
}

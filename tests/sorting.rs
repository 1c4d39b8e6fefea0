// tests/sorting.rs
//
// Oblivious swaps, bitonic sort/merge, quicksort, radix sort, and the
// multi-key table sort.

use shroud::operators::common::swap_single;
use shroud::operators::merge::bitonic_merge_single;
use shroud::operators::quicksort::quicksort;
use shroud::operators::radixsort::radix_sort;
use shroud::operators::sorting::{bitonic_sort_single, table_sort};
use shroud::permutation::apply_perm_to_arithmetic;
use shroud::prelude::*;
use anyhow::Result;
use shroud::protocol::PartyRuntime;
use shroud::testing::{plain_ctx, random_range_vector};

fn share_b(ctx: &Ctx, data: Vec<i64>) -> BSharedVector<i64> {
    BSharedVector::secret(ctx, &data.into(), 0)
}

fn is_sorted(v: &PlainVector<i64>, order: SortOrder) -> bool {
    (1..v.size()).all(|i| match order {
        SortOrder::Asc => v.get(i - 1) <= v.get(i),
        SortOrder::Desc => v.get(i - 1) >= v.get(i),
    })
}

#[test]
fn swap_by_bit_vector() -> Result<()> {
    let ctx = plain_ctx();
    let a = share_b(&ctx, vec![111, -14, 0, -156, i64::MAX, 18]);
    let b = share_b(&ctx, vec![98, -4, 0, 2847, i64::MIN, -4491]);
    let bits = share_b(&ctx, vec![0, 1, 1, 1, 1, 0]);

    swap_single(&a, &b, &bits)?;

    assert!(a.open()?.same_as(&vec![111i64, -4, 0, 2847, i64::MIN, 18].into()));
    assert!(b.open()?.same_as(&vec![98i64, -14, 0, -156, i64::MAX, -4491].into()));
    Ok(())
}

#[test]
fn bitonic_sort_ascending() -> Result<()> {
    let ctx = plain_ctx();
    let v = share_b(&ctx, vec![0, 5, 4, 7, -1, -2, 8, 1]);
    bitonic_sort_single(&v, SortOrder::Asc)?;
    assert!(v.open()?.same_as(&vec![-2i64, -1, 0, 1, 4, 5, 7, 8].into()));
    Ok(())
}

#[test]
fn bitonic_sort_descending() -> Result<()> {
    let ctx = plain_ctx();
    let v = share_b(&ctx, vec![3, -3, 12, 7, 0, 5, -9, 3]);
    bitonic_sort_single(&v, SortOrder::Desc)?;
    assert!(v.open()?.same_as(&vec![12i64, 7, 5, 3, 3, 0, -3, -9].into()));
    Ok(())
}

#[test]
fn bitonic_merge_sorted_halves() -> Result<()> {
    let ctx = plain_ctx();
    // both halves ascending
    let v = share_b(&ctx, vec![1, 4, 6, 9, -2, 3, 5, 11]);
    bitonic_merge_single(&v, SortOrder::Asc)?;
    assert!(v.open()?.same_as(&vec![-2i64, 1, 3, 4, 5, 6, 9, 11].into()));
    Ok(())
}

#[test]
fn quicksort_sorts_and_returns_permutation() -> Result<()> {
    let ctx = plain_ctx();
    let data = random_range_vector::<i64>(24, -1000, 1000);
    let mut v = BSharedVector::secret(&ctx, &data, 0);

    let perm = quicksort(&mut v, SortOrder::Asc)?;
    let sorted = v.open()?;
    assert!(is_sorted(&sorted, SortOrder::Asc));
    assert!(shroud::testing::same_elements(&sorted, &data));

    // the returned permutation moves any other column the same way
    ctx.permutations().reserve(24, 0, 1);
    let mut carried = ASharedVector::secret(&ctx, &data, 0);
    apply_perm_to_arithmetic(&mut carried, &perm)?;
    assert!(carried.open()?.same_as(&sorted));
    Ok(())
}

#[test]
fn quicksort_descending() -> Result<()> {
    let ctx = plain_ctx();
    let data = random_range_vector::<i64>(16, -50, 50);
    let mut v = BSharedVector::secret(&ctx, &data, 0);
    quicksort(&mut v, SortOrder::Desc)?;
    assert!(is_sorted(&v.open()?, SortOrder::Desc));
    Ok(())
}

#[test]
fn radix_sort_full_width() -> Result<()> {
    let ctx = plain_ctx();
    let data = random_range_vector::<i64>(20, -1000, 1000);
    let mut v = BSharedVector::secret(&ctx, &data, 0);

    let perm = radix_sort(&mut v, SortOrder::Asc, 64)?;
    let sorted = v.open()?;
    assert!(is_sorted(&sorted, SortOrder::Asc));
    assert!(shroud::testing::same_elements(&sorted, &data));

    ctx.permutations().reserve(20, 0, 1);
    let mut carried = ASharedVector::secret(&ctx, &data, 0);
    apply_perm_to_arithmetic(&mut carried, &perm)?;
    assert!(carried.open()?.same_as(&sorted));
    Ok(())
}

#[test]
fn radix_sort_descending_and_single_bit() -> Result<()> {
    let ctx = plain_ctx();
    let data = random_range_vector::<i64>(12, -100, 100);
    let mut v = BSharedVector::secret(&ctx, &data, 0);
    radix_sort(&mut v, SortOrder::Desc, 64)?;
    assert!(is_sorted(&v.open()?, SortOrder::Desc));

    // a single-bit sort partitions by the LSB, stably
    let bits: PlainVector<i64> = vec![1, 0, 1, 0, 1, 0].into();
    let mut b = BSharedVector::secret(&ctx, &bits, 0);
    radix_sort(&mut b, SortOrder::Asc, 1)?;
    assert!(b.open()?.same_as(&vec![0i64, 0, 0, 1, 1, 1].into()));
    Ok(())
}

#[test]
fn table_sort_multi_key_directions() -> Result<()> {
    let ctx = plain_ctx();
    let c0 = share_b(&ctx, vec![111, 111, 0, 111, i64::MAX, 5, 5, 5]);
    let c1 = share_b(&ctx, vec![-14, -4, 0, -14, i64::MIN, 13, 13, 13]);
    let c2 = share_b(&ctx, vec![i64::MIN, 0, 6423, -11233, i64::MIN, 7, 7, 7]);

    let mut keys = vec![c0, c1, c2];
    table_sort::<i64>(
        &mut keys,
        &mut [],
        &mut [],
        &[SortOrder::Desc, SortOrder::Asc, SortOrder::Desc],
        &[false, false, false],
        SortingProtocol::Quicksort,
        &ctx,
    )?;

    let c0 = keys[0].open()?;
    let c1 = keys[1].open()?;
    let c2 = keys[2].open()?;
    let expected: [(i64, i64, i64); 8] = [
        (i64::MAX, i64::MIN, i64::MIN),
        (111, -14, -11233),
        (111, -14, i64::MIN),
        (111, -4, 0),
        (5, 13, 7),
        (5, 13, 7),
        (5, 13, 7),
        (0, 0, 6423),
    ];
    for (i, (e0, e1, e2)) in expected.iter().enumerate() {
        assert_eq!((c0.get(i), c1.get(i), c2.get(i)), (*e0, *e1, *e2), "row {i}");
    }
    Ok(())
}

#[test]
fn table_sort_carries_data_columns() -> Result<()> {
    let ctx = plain_ctx();
    let keys_data: PlainVector<i64> = vec![4, 1, 3, 2].into();
    let payload: PlainVector<i64> = vec![40, 10, 30, 20].into();

    let mut keys = vec![BSharedVector::secret(&ctx, &keys_data, 0)];
    let mut data_a = vec![ASharedVector::secret(&ctx, &payload, 0)];
    let mut data_b = vec![BSharedVector::secret(&ctx, &payload, 0)];

    table_sort::<i64>(
        &mut keys,
        &mut data_a,
        &mut data_b,
        &[SortOrder::Asc],
        &[false],
        SortingProtocol::Radixsort,
        &ctx,
    )?;

    assert!(keys[0].open()?.same_as(&vec![1i64, 2, 3, 4].into()));
    assert!(data_a[0].open()?.same_as(&vec![10i64, 20, 30, 40].into()));
    assert!(data_b[0].open()?.same_as(&vec![10i64, 20, 30, 40].into()));
    Ok(())
}

#[test]
fn sorts_are_stable_on_duplicate_keys() -> Result<()> {
    for protocol in [SortingProtocol::Quicksort, SortingProtocol::Radixsort] {
        let ctx = plain_ctx();
        let keys_data: PlainVector<i64> = vec![2, 1, 2, 1, 2, 1, 2, 1].into();
        let index: PlainVector<i64> = (0..8).collect();

        let mut keys = vec![BSharedVector::secret(&ctx, &keys_data, 0)];
        let mut data_a = vec![ASharedVector::secret(&ctx, &index, 0)];

        table_sort::<i64>(
            &mut keys,
            &mut data_a,
            &mut [],
            &[SortOrder::Asc],
            &[false],
            protocol,
            &ctx,
        )?;

        // equal keys keep their original relative order
        assert!(data_a[0].open()?.same_as(&vec![1i64, 3, 5, 7, 0, 2, 4, 6].into()));
    }
    Ok(())
}

// tests/circuits.rs
//
// Boolean adders, comparisons, and division.

use shroud::circuits::{
    compare_eq_gt, parallel_prefix_adder, rca_compare, ripple_carry_adder,
};
use shroud::prelude::*;
use anyhow::Result;
use shroud::testing::{plain_ctx, random_range_vector};

fn share_b(ctx: &Ctx, data: &PlainVector<i64>) -> BSharedVector<i64> {
    BSharedVector::secret(ctx, data, 0)
}

#[test]
fn adders_agree_with_plain_addition() -> Result<()> {
    let ctx = plain_ctx();
    let xs = random_range_vector::<i64>(50, -1_000_000, 1_000_000);
    let ys = random_range_vector::<i64>(50, -1_000_000, 1_000_000);
    let x = share_b(&ctx, &xs);
    let y = share_b(&ctx, &ys);

    let rca = ripple_carry_adder(&x, &y, false)?.open()?;
    let ppa = parallel_prefix_adder(&x, &y, false)?.open()?;
    for i in 0..50 {
        let expected = xs.get(i).wrapping_add(ys.get(i));
        assert_eq!(rca.get(i), expected);
        assert_eq!(ppa.get(i), expected);
    }
    Ok(())
}

#[test]
fn adders_with_carry_in_subtract() -> Result<()> {
    let ctx = plain_ctx();
    let xs: PlainVector<i64> = vec![10, -10, 0, i64::MAX, 1].into();
    let ys: PlainVector<i64> = vec![3, 7, 5, 1, 1].into();
    let x = share_b(&ctx, &xs);
    let y = share_b(&ctx, &ys);

    // a - b == a + !b + 1, via carry-in
    let not_y = !&y;
    let rca = ripple_carry_adder(&x, &not_y, true)?.open()?;
    let ppa = parallel_prefix_adder(&x, &not_y, true)?.open()?;
    for i in 0..5 {
        let expected = xs.get(i).wrapping_sub(ys.get(i));
        assert_eq!(rca.get(i), expected);
        assert_eq!(ppa.get(i), expected);
    }

    // and through the vector-level operators
    let diff = x.sub(&y)?.open()?;
    let sum = x.add(&y)?.open()?;
    let neg = y.neg()?.open()?;
    for i in 0..5 {
        assert_eq!(diff.get(i), xs.get(i).wrapping_sub(ys.get(i)));
        assert_eq!(sum.get(i), xs.get(i).wrapping_add(ys.get(i)));
        assert_eq!(neg.get(i), ys.get(i).wrapping_neg());
    }
    Ok(())
}

#[test]
fn comparisons_signed() -> Result<()> {
    let ctx = plain_ctx();
    let xs: PlainVector<i64> = vec![5, -5, 5, -5, 0, i64::MAX, i64::MIN, -1].into();
    let ys: PlainVector<i64> = vec![3, 3, -3, -3, 0, i64::MIN, i64::MAX, -1].into();
    let x = share_b(&ctx, &xs);
    let y = share_b(&ctx, &ys);

    let (eq, gt) = compare_eq_gt(&x, &y)?;
    let eq = eq.open()?;
    let gt = gt.open()?;
    for i in 0..8 {
        assert_eq!(eq.get(i), i64::from(xs.get(i) == ys.get(i)), "eq at {i}");
        assert_eq!(gt.get(i), i64::from(xs.get(i) > ys.get(i)), "gt at {i}");
    }

    let lt = x.lt(&y)?.open()?;
    let ge = x.ge(&y)?.open()?;
    let le = x.le(&y)?.open()?;
    let ne = x.neq(&y)?.open()?;
    for i in 0..8 {
        assert_eq!(lt.get(i), i64::from(xs.get(i) < ys.get(i)));
        assert_eq!(ge.get(i), i64::from(xs.get(i) >= ys.get(i)));
        assert_eq!(le.get(i), i64::from(xs.get(i) <= ys.get(i)));
        assert_eq!(ne.get(i), i64::from(xs.get(i) != ys.get(i)));
    }
    Ok(())
}

#[test]
fn comparisons_random_sweep() -> Result<()> {
    let ctx = plain_ctx();
    let xs = random_range_vector::<i32>(128, i32::MIN as i128, i32::MAX as i128);
    let ys = random_range_vector::<i32>(128, i32::MIN as i128, i32::MAX as i128);
    let x = BSharedVector::secret(&ctx, &xs, 0);
    let y = BSharedVector::secret(&ctx, &ys, 0);

    let gt = x.gt(&y)?.open()?;
    let eq = x.eq(&y)?.open()?;
    for i in 0..128 {
        assert_eq!(gt.get(i), i32::from(xs.get(i) > ys.get(i)));
        assert_eq!(eq.get(i), i32::from(xs.get(i) == ys.get(i)));
    }
    Ok(())
}

#[test]
fn rca_compare_is_less_than() -> Result<()> {
    let ctx = plain_ctx();
    let xs: PlainVector<i64> = vec![1, 9, -4, 7, 7].into();
    let ys: PlainVector<i64> = vec![2, 3, -5, 7, -7].into();
    let x = share_b(&ctx, &xs);
    let y = share_b(&ctx, &ys);

    let lt = rca_compare(&x, &y)?.open()?;
    for i in 0..5 {
        assert_eq!(lt.get(i), i64::from(xs.get(i) < ys.get(i)));
    }
    Ok(())
}

#[test]
fn less_than_zero_is_local() -> Result<()> {
    let ctx = plain_ctx();
    let xs: PlainVector<i64> = vec![-1, 0, 1, i64::MIN, i64::MAX].into();
    let ltz = share_b(&ctx, &xs).ltz().open()?;
    assert!(ltz.same_as(&vec![1i64, 0, 0, 1, 0].into()));
    Ok(())
}

#[test]
fn private_division() -> Result<()> {
    let ctx = plain_ctx();
    let xs: PlainVector<i32> = vec![100, 55, 81, 7, 1024].into();
    let ys: PlainVector<i32> = vec![7, 5, 9, 7, 2].into();
    let x = BSharedVector::secret(&ctx, &xs, 0);
    let y = BSharedVector::secret(&ctx, &ys, 0);

    let q = x.div(&y)?.open()?;
    assert!(q.same_as(&vec![14i32, 11, 9, 1, 512].into()));
    Ok(())
}

#[test]
fn division_without_a_wider_type_fails() {
    let ctx = plain_ctx();
    let x = BSharedVector::<i128>::public_repeated(&ctx, 10, 4);
    let y = BSharedVector::<i128>::public_repeated(&ctx, 2, 4);
    assert!(matches!(
        x.div(&y),
        Err(shroud::Error::PreconditionViolated(_))
    ));
}

#[test]
fn division_via_arithmetic_conversion() -> Result<()> {
    let ctx = plain_ctx();
    let xs: PlainVector<i32> = vec![60, 90].into();
    let ys: PlainVector<i32> = vec![6, 15].into();
    let x = ASharedVector::secret(&ctx, &xs, 0);
    let y = ASharedVector::secret(&ctx, &ys, 0);

    let q = x.a2b()?.div(&y.a2b()?)?.open()?;
    assert!(q.same_as(&vec![10i32, 6].into()));
    Ok(())
}

#[test]
fn kogge_stone_configured_as_default() -> Result<()> {
    let config = RuntimeConfig {
        adder: shroud::AdderTopology::KoggeStone,
        ..RuntimeConfig::default()
    };
    let ctx = shroud::testing::plain_ctx_with(config);
    let xs: PlainVector<i64> = vec![40, -2].into();
    let ys: PlainVector<i64> = vec![2, 3].into();
    let sum = BSharedVector::secret(&ctx, &xs, 0)
        .add(&BSharedVector::secret(&ctx, &ys, 0))?
        .open()?;
    assert!(sum.same_as(&vec![42i64, 1].into()));
    Ok(())
}

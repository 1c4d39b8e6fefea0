// tests/shuffle_perm.rs
//
// Oblivious shuffle, elementwise permutations, composition, and the
// permutation pool contract.

use shroud::permutation::{
    ElementwisePermutation, apply_perm_to_arithmetic, apply_perm_to_boolean,
    compose_permutations, local_apply_inverse_perm, local_apply_perm,
    oblivious_apply_inverse_sharded_perm, oblivious_apply_sharded_perm,
};
use shroud::prelude::*;
use shroud::protocol::PartyRuntime;
use shroud::random::permutations::DmShardedPermutation;
use shroud::random::gen_perm;
use shroud::testing::{plain_ctx, random_range_vector, same_elements};

#[test]
fn local_perm_scatter_and_inverse() {
    let x: PlainVector<i64> = vec![10, 20, 30, 40].into();
    let perm = vec![2usize, 0, 3, 1];

    local_apply_perm(&x, &perm);
    assert!(x.same_as(&vec![20i64, 40, 10, 30].into()));

    local_apply_inverse_perm(&x, &perm);
    assert!(x.same_as(&vec![10i64, 20, 30, 40].into()));
}

#[test]
fn gen_perm_is_a_permutation() {
    let mut rng = rand::thread_rng();
    let perm = gen_perm(100, &mut rng);
    let mut seen = vec![false; 100];
    for p in perm {
        assert!(!seen[p]);
        seen[p] = true;
    }
}

#[test]
fn shuffle_preserves_multiset_and_inverts() -> Result<()> {
    let ctx = plain_ctx();
    let data = random_range_vector::<i64>(64, -500, 500);
    let mut v = BSharedVector::secret(&ctx, &data, 0);

    ctx.permutations().reserve(64, 2, 0);
    let perm = ctx.permutations().next(64, Encoding::Boolean)?;

    oblivious_apply_sharded_perm(v.shares_mut(), Encoding::Boolean, &perm, &ctx)?;
    let shuffled = v.open()?;
    assert!(same_elements(&shuffled, &data));

    oblivious_apply_inverse_sharded_perm(v.shares_mut(), Encoding::Boolean, &perm, &ctx)?;
    assert!(v.open()?.same_as(&data));

    // vector-level shuffle draws from the pool too
    let mut w = BSharedVector::secret(&ctx, &data, 0);
    w.shuffle()?;
    assert!(same_elements(&w.open()?, &data));
    Ok(())
}

#[test]
fn pool_is_strict_about_reservation() {
    let ctx = plain_ctx();
    // nothing reserved: drawing is a caller bug
    assert!(matches!(
        ctx.permutations().next(16, Encoding::Boolean),
        Err(shroud::Error::ShardedPermutationUnavailable)
    ));

    // reserved entries are matched by size
    ctx.permutations().reserve(8, 1, 0);
    assert!(matches!(
        ctx.permutations().next(16, Encoding::Boolean),
        Err(shroud::Error::ShardedPermutationUnavailable)
    ));
    assert!(ctx.permutations().next(8, Encoding::Boolean).is_ok());
}

#[test]
fn elementwise_perm_applies_to_both_encodings() -> Result<()> {
    let ctx = plain_ctx();
    let n = 32;
    let data = random_range_vector::<i64>(n, -100, 100);

    // derive a random shared permutation by shuffling the identity
    ctx.permutations().reserve(n, 1, 2);
    let perm = ElementwisePermutation::random(&ctx, n, Encoding::Boolean)?;
    let pi = perm.open()?;

    let mut a = ASharedVector::secret(&ctx, &data, 0);
    apply_perm_to_arithmetic(&mut a, &perm)?;
    let a_open = a.open()?;

    let mut b = BSharedVector::secret(&ctx, &data, 0);
    apply_perm_to_boolean(&mut b, &perm)?;
    let b_open = b.open()?;

    // scatter semantics: result[pi[i]] = data[i]
    for i in 0..n {
        assert_eq!(a_open.get(pi[i]), data.get(i));
        assert_eq!(b_open.get(pi[i]), data.get(i));
    }
    Ok(())
}

#[test]
fn composition_matches_sequential_application() -> Result<()> {
    let ctx = plain_ctx();
    let n = 16;
    let data = random_range_vector::<i64>(n, -100, 100);

    // two random shared permutations
    ctx.permutations().reserve(n, 3, 4);
    let sigma = ElementwisePermutation::random(&ctx, n, Encoding::Boolean)?;
    let rho = ElementwisePermutation::random(&ctx, n, Encoding::Boolean)?;

    // sequential: apply sigma, then rho
    let mut sequential = ASharedVector::secret(&ctx, &data, 0);
    apply_perm_to_arithmetic(&mut sequential, &sigma)?;
    apply_perm_to_arithmetic(&mut sequential, &rho)?;
    let sequential = sequential.open()?;

    // composed: one application of rho . sigma
    let composed = compose_permutations(sigma, rho)?;
    let mut once = ASharedVector::secret(&ctx, &data, 0);
    apply_perm_to_arithmetic(&mut once, &composed)?;
    assert!(once.open()?.same_as(&sequential));
    Ok(())
}

#[test]
fn invert_roundtrips() -> Result<()> {
    let ctx = plain_ctx();
    let n = 16;
    let data = random_range_vector::<i64>(n, -100, 100);

    ctx.permutations().reserve(n, 1, 3);
    let perm = ElementwisePermutation::random(&ctx, n, Encoding::Boolean)?;
    let pi = perm.open()?;
    let mut inverse = perm.clone();
    inverse.invert()?;
    let pi_inv = inverse.open()?;
    for i in 0..n {
        assert_eq!(pi_inv[pi[i]], i);
    }
    Ok(())
}

#[test]
fn dm_correlation_invariant() {
    // dealer tuples satisfy b = pi(a) ^ c (boolean) / b = pi(a) - c
    let mut rng = rand::thread_rng();
    let boolean = DmShardedPermutation::<i64>::deal(32, Encoding::Boolean, &mut rng);
    for i in 0..32 {
        assert_eq!(
            boolean.b.get(boolean.pi[i]),
            boolean.a.get(i) ^ boolean.c.get(boolean.pi[i])
        );
    }

    let arith = DmShardedPermutation::<i64>::deal(32, Encoding::Arithmetic, &mut rng);
    for i in 0..32 {
        assert_eq!(
            arith.b.get(arith.pi[i]),
            arith.a.get(i).wrapping_sub(arith.c.get(arith.pi[i]))
        );
    }
}

#[test]
fn dm_apply_requires_two_parties() {
    struct NullComm;
    impl shroud::protocol::Communicator for NullComm {
        fn send_bytes(&self, _to: usize, _payload: &[u8]) -> Result<()> {
            Ok(())
        }
        fn receive_bytes(&self, _from: usize) -> Result<Vec<u8>> {
            Ok(Vec::new())
        }
    }

    let ctx = plain_ctx();
    let mut rng = rand::thread_rng();
    let corr = DmShardedPermutation::<i64>::deal(8, Encoding::Boolean, &mut rng);
    let mut v = BSharedVector::<i64>::zeroed(&ctx, 8);

    let result = shroud::permutation::permute_and_share(
        v.shares_mut(),
        &corr,
        0,
        &ctx,
        &NullComm,
    );
    assert!(matches!(result, Err(shroud::Error::UnsupportedProtocol(_))));
}

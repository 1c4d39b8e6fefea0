//! Single-party plaintext backend (R = 1).
//!
//! The testing and development backend: one party, one share per value,
//! every primitive computed directly. "Opening" is a copy, resharing is a
//! no-op, and sharded permutations are degenerate single-party
//! honest-majority correlations carrying real pseudorandom permutations —
//! so shuffles, sorts, and permutation composition run for real.
//!
//! All elementwise primitives fan out through the parallel executors,
//! exercising the same batching path a networked backend would use.

use crate::config::RuntimeConfig;
use crate::element::Element;
use crate::error::Result;
use crate::protocol::check::CommitOpenCheck;
use crate::protocol::{PartyRuntime, Protocol};
use crate::random::permutations::{
    HmShardedPermutation, ShardedPermutation, ShardedPermutationSource, gen_perm,
};
use crate::random::{LocalPrg, PermutationManager};
use crate::runtime::execute_parallel;
use crate::share::ReplicatedShares;
use crate::vector::PlainVector;
use std::sync::Arc;

/// The single-party plaintext protocol.
pub struct PlainProtocol {
    pool: PermutationManager,
    check: CommitOpenCheck,
    pub config: RuntimeConfig,
}

struct PlainPermSource {
    prg: LocalPrg,
}

impl ShardedPermutationSource for PlainPermSource {
    fn generate(&self, size: usize) -> ShardedPermutation {
        let mut rng = self.prg.fork_rng();
        let perm = Arc::new(gen_perm(size, &mut rng));
        ShardedPermutation::HonestMajority(HmShardedPermutation::new(
            size,
            vec![(vec![0], Some(perm))],
        ))
    }

    fn generate_pair(&self, size: usize) -> (ShardedPermutation, ShardedPermutation) {
        let mut rng = self.prg.fork_rng();
        let perm = Arc::new(gen_perm(size, &mut rng));
        let make = || {
            ShardedPermutation::HonestMajority(HmShardedPermutation::new(
                size,
                vec![(vec![0], Some(Arc::clone(&perm)))],
            ))
        };
        (make(), make())
    }
}

impl PlainProtocol {
    pub fn new(config: RuntimeConfig) -> Self {
        crate::runtime::configure_threads(config.threads);
        Self {
            pool: PermutationManager::new(Box::new(PlainPermSource {
                prg: LocalPrg::from_entropy(),
            })),
            check: CommitOpenCheck::new(),
            config,
        }
    }

    /// Deterministic permutation stream, for reproducible tests.
    pub fn with_seed(config: RuntimeConfig, seed: u64) -> Self {
        crate::runtime::configure_threads(config.threads);
        Self {
            pool: PermutationManager::new(Box::new(PlainPermSource {
                prg: LocalPrg::from_seed(seed),
            })),
            check: CommitOpenCheck::new(),
            config,
        }
    }

    pub fn commit_open_check(&self) -> &CommitOpenCheck {
        &self.check
    }
}

impl PartyRuntime for PlainProtocol {
    fn party_id(&self) -> usize {
        0
    }

    fn num_parties(&self) -> usize {
        1
    }

    fn replication(&self) -> usize {
        1
    }

    fn groups(&self) -> Vec<Vec<usize>> {
        vec![vec![0]]
    }

    fn permutations(&self) -> &PermutationManager {
        &self.pool
    }

    fn adder(&self) -> crate::config::AdderTopology {
        self.config.adder
    }

    fn default_sort_protocol(&self) -> crate::operators::sorting::SortingProtocol {
        self.config.sort_protocol
    }
}

// Elementwise dispatch helpers. Each fans a per-index body across the
// executor; bodies only touch their own batch.

fn unary<T: Element>(
    x: &ReplicatedShares<T>,
    out: &ReplicatedShares<T>,
    f: impl Fn(T) -> T + Send + Sync,
) {
    debug_assert_eq!(x.size(), out.size(), "unary op size mismatch");
    let (x, out) = (x.share(0), out.share(0));
    execute_parallel(x.size(), |start, end| {
        for i in start..end {
            out.set(i, f(x.get(i)));
        }
    });
}

fn binary<T: Element>(
    x: &ReplicatedShares<T>,
    y: &ReplicatedShares<T>,
    out: &ReplicatedShares<T>,
    f: impl Fn(T, T) -> T + Send + Sync,
) {
    debug_assert_eq!(x.size(), y.size(), "binary op size mismatch");
    debug_assert_eq!(x.size(), out.size(), "binary op size mismatch");
    let (x, y, out) = (x.share(0), y.share(0), out.share(0));
    execute_parallel(x.size(), |start, end| {
        for i in start..end {
            out.set(i, f(x.get(i), y.get(i)));
        }
    });
}

impl<T: Element> Protocol<T> for PlainProtocol {
    fn secret_share_a(&self, v: &PlainVector<T>, _owner: usize) -> ReplicatedShares<T> {
        ReplicatedShares::from_vectors(vec![v.materialize()])
    }

    fn secret_share_b(&self, v: &PlainVector<T>, _owner: usize) -> ReplicatedShares<T> {
        ReplicatedShares::from_vectors(vec![v.materialize()])
    }

    fn public_share_a(&self, v: &PlainVector<T>) -> ReplicatedShares<T> {
        ReplicatedShares::from_vectors(vec![v.materialize()])
    }

    fn public_share_b(&self, v: &PlainVector<T>) -> ReplicatedShares<T> {
        ReplicatedShares::from_vectors(vec![v.materialize()])
    }

    fn open_a(&self, s: &ReplicatedShares<T>) -> Result<PlainVector<T>> {
        let opened = s.share(0).materialize();
        self.check.record(&opened);
        Ok(opened)
    }

    fn open_b(&self, s: &ReplicatedShares<T>) -> Result<PlainVector<T>> {
        let opened = s.share(0).materialize();
        self.check.record(&opened);
        Ok(opened)
    }

    fn reshare(&self, _s: &mut ReplicatedShares<T>, _group: &[usize], _binary: bool) -> Result<()> {
        Ok(())
    }

    fn add_a(&self, x: &ReplicatedShares<T>, y: &ReplicatedShares<T>, out: &ReplicatedShares<T>) {
        binary(x, y, out, |a, b| a.wrapping_add(b));
    }

    fn sub_a(&self, x: &ReplicatedShares<T>, y: &ReplicatedShares<T>, out: &ReplicatedShares<T>) {
        binary(x, y, out, |a, b| a.wrapping_sub(b));
    }

    fn neg_a(&self, x: &ReplicatedShares<T>, out: &ReplicatedShares<T>) {
        unary(x, out, |a| a.wrapping_neg());
    }

    fn add_const_a(&self, x: &ReplicatedShares<T>, c: T, out: &ReplicatedShares<T>) {
        unary(x, out, move |a| a.wrapping_add(c));
    }

    fn mul_const_a(&self, x: &ReplicatedShares<T>, c: T, out: &ReplicatedShares<T>) {
        unary(x, out, move |a| a.wrapping_mul(c));
    }

    fn xor_b(&self, x: &ReplicatedShares<T>, y: &ReplicatedShares<T>, out: &ReplicatedShares<T>) {
        binary(x, y, out, |a, b| a ^ b);
    }

    fn not_b(&self, x: &ReplicatedShares<T>, out: &ReplicatedShares<T>) {
        unary(x, out, |a| !a);
    }

    fn not_b_1(&self, x: &ReplicatedShares<T>, out: &ReplicatedShares<T>) {
        unary(x, out, |a| a ^ T::ONE);
    }

    fn xor_const_b(&self, x: &ReplicatedShares<T>, c: T, out: &ReplicatedShares<T>) {
        unary(x, out, move |a| a ^ c);
    }

    fn multiply_a(
        &self,
        x: &ReplicatedShares<T>,
        y: &ReplicatedShares<T>,
        out: &ReplicatedShares<T>,
    ) -> Result<()> {
        binary(x, y, out, |a, b| a.wrapping_mul(b));
        Ok(())
    }

    fn and_b(
        &self,
        x: &ReplicatedShares<T>,
        y: &ReplicatedShares<T>,
        out: &ReplicatedShares<T>,
    ) -> Result<()> {
        binary(x, y, out, |a, b| a & b);
        Ok(())
    }

    fn or_b(
        &self,
        x: &ReplicatedShares<T>,
        y: &ReplicatedShares<T>,
        out: &ReplicatedShares<T>,
    ) -> Result<()> {
        binary(x, y, out, |a, b| a | b);
        Ok(())
    }

    fn b2a_bit(&self, x: &ReplicatedShares<T>, out: &ReplicatedShares<T>) -> Result<()> {
        unary(x, out, |a| a & T::ONE);
        Ok(())
    }

    fn redistribute_shares_b(
        &self,
        x: &ReplicatedShares<T>,
    ) -> Result<(ReplicatedShares<T>, ReplicatedShares<T>)> {
        let first = ReplicatedShares::from_vectors(vec![x.share(0).materialize()]);
        let second = ReplicatedShares::zeroed(1, x.size());
        Ok((first, second))
    }

    fn div_const_a(
        &self,
        x: &ReplicatedShares<T>,
        c: T,
    ) -> Result<(ReplicatedShares<T>, ReplicatedShares<T>)> {
        let q = ReplicatedShares::zeroed(1, x.size());
        unary(x, &q, move |a| a.wrapping_div(c));
        // Exact quotient: a negative error term makes the generic
        // correction pass a no-op.
        let err = ReplicatedShares::from_vectors(vec![PlainVector::filled(
            x.size(),
            T::ZERO.wrapping_sub(T::ONE),
        )]);
        Ok((q, err))
    }

    fn dot_product_a(
        &self,
        x: &ReplicatedShares<T>,
        y: &ReplicatedShares<T>,
        out: &ReplicatedShares<T>,
        chunk: usize,
    ) -> Result<()> {
        let products = x.share(0).dot_product(y.share(0), chunk);
        out.share(0).assign(&products);
        Ok(())
    }
}

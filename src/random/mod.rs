//! Randomness sources.
//!
//! Three capabilities, per the external-collaborator contract:
//!
//! - [`LocalPrg`] — a per-party pseudorandom generator.
//! - [`CommonPrg`] / [`CommonPrgManager`] — seeded generators shared by a
//!   designated group of parties; every member produces the identical
//!   stream.
//! - [`ZeroSharingGenerator`] — pseudorandom sharings of zero (arithmetic
//!   sums or XORs), used by resharing.
//!
//! Sharded permutation correlations and the preallocation pool live in
//! [`permutations`].

pub mod permutations;

pub use permutations::{
    DmShardedPermutation, HmShardedPermutation, PermutationManager, ShardedPermutation,
    gen_perm,
};

use crate::element::Element;
use crate::vector::PlainVector;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::sync::Mutex;

/// A party-local PRG.
pub struct LocalPrg {
    rng: Mutex<StdRng>,
}

impl LocalPrg {
    /// Seed from the OS entropy source.
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic seed, for tests.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Fill `out` with pseudorandom elements.
    pub fn get_next<T: Element>(&self, out: &PlainVector<T>) {
        let mut rng = self.rng.lock().expect("prg lock");
        for i in 0..out.size() {
            out.set(i, T::random(&mut *rng));
        }
    }

    /// One pseudorandom value in `[0, bound)`.
    pub fn next_index(&self, bound: usize) -> usize {
        let mut rng = self.rng.lock().expect("prg lock");
        rng.gen_range(0..bound)
    }

    pub(crate) fn fork_rng(&self) -> StdRng {
        let mut rng = self.rng.lock().expect("prg lock");
        StdRng::seed_from_u64(rng.r#gen())
    }
}

/// A PRG whose stream is common to all members of one party group.
pub struct CommonPrg {
    rng: Mutex<StdRng>,
}

impl CommonPrg {
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            rng: Mutex::new(StdRng::from_seed(seed)),
        }
    }

    pub fn get_next<T: Element>(&self, out: &PlainVector<T>) {
        let mut rng = self.rng.lock().expect("prg lock");
        for i in 0..out.size() {
            out.set(i, T::random(&mut *rng));
        }
    }
}

/// Holds the common PRGs a party shares with each group it belongs to,
/// keyed by the (sorted) group membership. Relative aliases `-1`/`+1`
/// address the pairwise groups with the previous and next party in ring
/// order, as the zero-sharing generator consumes them.
#[derive(Default)]
pub struct CommonPrgManager {
    groups: HashMap<Vec<usize>, CommonPrg>,
}

impl CommonPrgManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the common PRG for a group. The group key is sorted.
    pub fn register(&mut self, mut group: Vec<usize>, prg: CommonPrg) {
        group.sort_unstable();
        self.groups.insert(group, prg);
    }

    pub fn get(&self, group: &[usize]) -> Option<&CommonPrg> {
        let mut key = group.to_vec();
        key.sort_unstable();
        self.groups.get(&key)
    }

    /// The pairwise group `{rank, rank + offset mod n}`.
    pub fn get_relative(&self, rank: usize, num_parties: usize, offset: i64) -> Option<&CommonPrg> {
        let peer = (rank as i64 + offset).rem_euclid(num_parties as i64) as usize;
        self.get(&[rank, peer])
    }
}

/// Produces pseudorandom sharings of zero across a party ring.
///
/// Each party's output is `next - prev` (arithmetic) or `next ^ prev`
/// (boolean), where `prev`/`next` are the pairwise common streams with the
/// ring neighbors; summed (XORed) over all parties, the outputs cancel.
/// Two-party arithmetic sharing has a single pairwise stream, so rank 0
/// negates its output instead. A single party returns plaintext zeros.
pub struct ZeroSharingGenerator {
    num_parties: usize,
    rank: usize,
}

impl ZeroSharingGenerator {
    pub fn new(num_parties: usize, rank: usize) -> Self {
        Self { num_parties, rank }
    }

    fn arithmetic_flip(&self) -> bool {
        self.num_parties == 2 && self.rank == 0
    }

    /// Fill `out` with this party's arithmetic zero-sharing contribution.
    pub fn get_next_arithmetic<T: Element>(
        &self,
        prgs: &CommonPrgManager,
        out: &PlainVector<T>,
    ) {
        if self.num_parties == 1 {
            out.zero();
            return;
        }
        let prev = prgs
            .get_relative(self.rank, self.num_parties, -1)
            .expect("missing prev-neighbor common PRG");
        let next = prgs
            .get_relative(self.rank, self.num_parties, 1)
            .expect("missing next-neighbor common PRG");
        let p: PlainVector<T> = PlainVector::zeroed(out.size());
        let n: PlainVector<T> = PlainVector::zeroed(out.size());
        prev.get_next(&p);
        next.get_next(&n);
        for i in 0..out.size() {
            let mut v = n.get(i).wrapping_sub(p.get(i));
            if self.arithmetic_flip() {
                v = v.wrapping_neg();
            }
            out.set(i, v);
        }
    }

    /// Fill `out` with this party's boolean zero-sharing contribution.
    pub fn get_next_binary<T: Element>(&self, prgs: &CommonPrgManager, out: &PlainVector<T>) {
        if self.num_parties == 1 {
            out.zero();
            return;
        }
        let prev = prgs
            .get_relative(self.rank, self.num_parties, -1)
            .expect("missing prev-neighbor common PRG");
        let next = prgs
            .get_relative(self.rank, self.num_parties, 1)
            .expect("missing next-neighbor common PRG");
        let p: PlainVector<T> = PlainVector::zeroed(out.size());
        let n: PlainVector<T> = PlainVector::zeroed(out.size());
        prev.get_next(&p);
        next.get_next(&n);
        for i in 0..out.size() {
            out.set(i, n.get(i) ^ p.get(i));
        }
    }
}

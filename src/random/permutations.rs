//! Sharded permutation correlations and the preallocation pool.
//!
//! A *sharded permutation* is the correlated-randomness object behind
//! oblivious shuffling. Two variants exist:
//!
//! - **Honest-majority** ([`HmShardedPermutation`]): for every resharing
//!   group the protocol defines, each member holds a local plaintext
//!   permutation; the full shuffle is the composition over groups.
//! - **Dishonest-majority** ([`DmShardedPermutation`]): a two-party
//!   `(pi, A, B, C)` tuple satisfying `B = pi(A) ^ C` (boolean) or
//!   `B = pi(A) - C` (arithmetic), consumed by `permute_and_share`.
//!
//! Consumers never generate correlations ad hoc: they declare their budget
//! up front with [`PermutationManager::reserve`] and then draw FIFO with
//! [`PermutationManager::next`] / [`PermutationManager::next_pair`]. An
//! empty pool is a caller bug and reports `ShardedPermutationUnavailable`.

use crate::element::Element;
use crate::error::{Error, Result};
use crate::share::Encoding;
use crate::vector::PlainVector;
use rand::Rng;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Generate a pseudorandom permutation of `0..size` (Fisher-Yates).
///
/// Deterministic in the generator stream, so group members driving
/// identical common-PRG states derive identical permutations.
pub fn gen_perm<R: Rng>(size: usize, rng: &mut R) -> Vec<usize> {
    let mut perm: Vec<usize> = (0..size).collect();
    for i in (1..size).rev() {
        let j = rng.gen_range(0..=i);
        perm.swap(i, j);
    }
    perm
}

/// Honest-majority sharded permutation: this party's local permutations,
/// one per resharing group it belongs to (groups it is outside of carry
/// `None`; the party only participates in the reshare step there).
#[derive(Clone)]
pub struct HmShardedPermutation {
    size: usize,
    /// `(group members, local permutation if this party is a member)`, in
    /// application order.
    pub groups: Vec<(Vec<usize>, Option<Arc<Vec<usize>>>)>,
}

impl HmShardedPermutation {
    pub fn new(size: usize, groups: Vec<(Vec<usize>, Option<Arc<Vec<usize>>>)>) -> Self {
        Self { size, groups }
    }

    pub fn size(&self) -> usize {
        self.size
    }
}

/// Dishonest-majority (2PC) permutation correlation.
pub struct DmShardedPermutation<T> {
    pub pi: Arc<Vec<usize>>,
    pub a: PlainVector<T>,
    pub b: PlainVector<T>,
    pub c: PlainVector<T>,
    pub encoding: Encoding,
}

impl<T: Element> DmShardedPermutation<T> {
    pub fn size(&self) -> usize {
        self.a.size()
    }

    /// Dealer-style generation: sample `pi`, `A`, `C` and derive `B` so the
    /// tuple satisfies the permute-and-share correlation. The dealer hands
    /// `(pi, A?, ...)` pieces to the two parties; in-process tests hold the
    /// whole tuple.
    pub fn deal<R: Rng>(size: usize, encoding: Encoding, rng: &mut R) -> Self {
        let pi = Arc::new(gen_perm(size, rng));
        let a = PlainVector::zeroed(size);
        let c = PlainVector::zeroed(size);
        for i in 0..size {
            a.set(i, T::random(rng));
            c.set(i, T::random(rng));
        }
        let b = PlainVector::zeroed(size);
        // b[pi[i]] corresponds to pi(a)[pi[i]] = a[i] under scatter
        // application, matching local_apply_perm.
        for i in 0..size {
            let pa = a.get(i);
            match encoding {
                Encoding::Boolean => b.set(pi[i], pa ^ c.get(pi[i])),
                Encoding::Arithmetic => b.set(pi[i], pa.wrapping_sub(c.get(pi[i]))),
            }
        }
        Self {
            pi,
            a,
            b,
            c,
            encoding,
        }
    }
}

/// A type-erased sharded permutation, as stored in the pool.
#[derive(Clone)]
pub enum ShardedPermutation {
    HonestMajority(HmShardedPermutation),
}

impl ShardedPermutation {
    pub fn size(&self) -> usize {
        match self {
            ShardedPermutation::HonestMajority(p) => p.size(),
        }
    }
}

/// Source of fresh sharded permutations, supplied by the protocol backend.
pub trait ShardedPermutationSource: Send + Sync {
    fn generate(&self, size: usize) -> ShardedPermutation;

    /// Two sharded permutations with the same underlying plaintext
    /// permutation, to be applied to a data vector and an index vector of
    /// different encodings.
    fn generate_pair(&self, size: usize) -> (ShardedPermutation, ShardedPermutation);
}

/// FIFO pool of preallocated sharded permutations and pairs.
///
/// `reserve` is the only producer-side call; consumption order must match
/// reservation order. Entries are matched by size so that conservative
/// budgets (the sort budget formula intentionally over-reserves) cannot
/// poison later draws of a different size.
pub struct PermutationManager {
    source: Box<dyn ShardedPermutationSource>,
    perms: Mutex<VecDeque<ShardedPermutation>>,
    pairs: Mutex<VecDeque<(ShardedPermutation, ShardedPermutation)>>,
}

impl PermutationManager {
    pub fn new(source: Box<dyn ShardedPermutationSource>) -> Self {
        Self {
            source,
            perms: Mutex::new(VecDeque::new()),
            pairs: Mutex::new(VecDeque::new()),
        }
    }

    /// Preallocate `num_perms` sharded permutations and `num_pairs` pairs
    /// of `size` elements each.
    pub fn reserve(&self, size: usize, num_perms: usize, num_pairs: usize) {
        tracing::trace!(size, num_perms, num_pairs, "permutation pool reserve");
        {
            let mut perms = self.perms.lock().expect("pool lock");
            for _ in 0..num_perms {
                perms.push_back(self.source.generate(size));
            }
        }
        let mut pairs = self.pairs.lock().expect("pool lock");
        for _ in 0..num_pairs {
            pairs.push_back(self.source.generate_pair(size));
        }
    }

    /// Draw the next sharded permutation of `size` elements. The
    /// `_encoding` the consumer will apply it under does not affect the
    /// honest-majority correlation; it is part of the draw contract for
    /// backends whose correlations are encoding-specific.
    pub fn next(&self, size: usize, _encoding: Encoding) -> Result<ShardedPermutation> {
        let mut perms = self.perms.lock().expect("pool lock");
        match perms.iter().position(|p| p.size() == size) {
            Some(i) => Ok(perms.remove(i).expect("position in range")),
            None => Err(Error::ShardedPermutationUnavailable),
        }
    }

    /// Draw the next pair of same-permutation correlations of `size`
    /// elements, for a data vector of `_e1` and an index vector of `_e2`.
    pub fn next_pair(
        &self,
        size: usize,
        _e1: Encoding,
        _e2: Encoding,
    ) -> Result<(ShardedPermutation, ShardedPermutation)> {
        let mut pairs = self.pairs.lock().expect("pool lock");
        match pairs.iter().position(|(p, _)| p.size() == size) {
            Some(i) => Ok(pairs.remove(i).expect("position in range")),
            None => Err(Error::ShardedPermutationUnavailable),
        }
    }
}

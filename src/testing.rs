//! Test utilities.
//!
//! Helpers for driving the core against the single-party plaintext
//! backend: context constructors, random data, and multiset comparison
//! for order-insensitive assertions. Used by the integration tests and
//! available to downstream crates testing against shroud.

use crate::config::RuntimeConfig;
use crate::element::Element;
use crate::protocol::{Ctx, PlainProtocol};
use crate::vector::PlainVector;
use rand::Rng;
use std::sync::Arc;

/// A plaintext (1PC) context with default configuration.
pub fn plain_ctx() -> Ctx {
    Arc::new(PlainProtocol::new(RuntimeConfig::default()))
}

/// A plaintext context with an explicit configuration.
pub fn plain_ctx_with(config: RuntimeConfig) -> Ctx {
    Arc::new(PlainProtocol::new(config))
}

/// A plaintext context whose permutation stream is deterministic.
pub fn seeded_ctx(seed: u64) -> Ctx {
    Arc::new(PlainProtocol::with_seed(RuntimeConfig::default(), seed))
}

/// A vector of `n` uniformly random elements.
pub fn random_vector<T: Element>(n: usize) -> PlainVector<T> {
    let mut rng = rand::thread_rng();
    (0..n).map(|_| T::random(&mut rng)).collect()
}

/// A vector of `n` random values in `[lo, hi)` (over the interchange
/// representation, so it works at every width).
pub fn random_range_vector<T: Element>(n: usize, lo: i128, hi: i128) -> PlainVector<T> {
    let mut rng = rand::thread_rng();
    (0..n)
        .map(|_| T::from_i128(rng.gen_range(lo..hi)))
        .collect()
}

/// Multiset equality: both vectors hold the same elements, in any order.
pub fn same_elements<T: Element>(x: &PlainVector<T>, y: &PlainVector<T>) -> bool {
    let mut a = x.to_vec();
    let mut b = y.to_vec();
    a.sort_unstable();
    b.sort_unstable();
    a == b
}

/// Rows of a multi-column opened table, zipped for order-insensitive
/// comparison.
pub fn rows_of<T: Element>(columns: &[PlainVector<T>]) -> Vec<Vec<T>> {
    let n = columns.first().map_or(0, |c| c.size());
    (0..n)
        .map(|i| columns.iter().map(|c| c.get(i)).collect())
        .collect()
}

/// Multiset equality over rows of opened tables.
pub fn same_rows<T: Element>(x: &[PlainVector<T>], y: &[PlainVector<T>]) -> bool {
    let mut a = rows_of(x);
    let mut b = rows_of(y);
    a.sort_unstable();
    b.sort_unstable();
    a == b
}

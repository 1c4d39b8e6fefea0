//! Parallel executors.
//!
//! The protocol backends dispatch pointwise primitives over equal-length
//! inputs by splitting the index space into contiguous batches and fanning
//! them out across a rayon pool. The primitive must be independent per
//! index; batches never overlap, which is what makes the lock-free aliased
//! storage of [`crate::storage`] sound.

use rayon::prelude::*;

/// Minimum batch size before fanning out is worth it.
const MIN_BATCH: usize = 4096;

/// Split `[0, size)` into contiguous batches and run `body(start, end)` on
/// each, in parallel. `body` must be thread-safe and must only touch
/// indices inside its batch.
pub fn execute_parallel(size: usize, body: impl Fn(usize, usize) + Send + Sync) {
    if size <= MIN_BATCH {
        body(0, size);
        return;
    }
    let workers = rayon::current_num_threads().max(1);
    let batch = size.div_ceil(workers).max(MIN_BATCH);
    let n_batches = size.div_ceil(batch);
    (0..n_batches).into_par_iter().for_each(|b| {
        let start = b * batch;
        let end = (start + batch).min(size);
        body(start, end);
    });
}

/// Configure the global pool size once, before first use. Later calls are
/// ignored by rayon; that is fine for a process-wide runtime.
pub fn configure_threads(threads: usize) {
    let _ = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global();
}

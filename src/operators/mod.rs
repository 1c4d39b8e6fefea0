//! The oblivious operator library (L5–L8, L10).
//!
//! Everything here composes the encoded-vector algebra into data-oblivious
//! building blocks: conditional selection and swaps, shuffling, sorting
//! networks and permutation-based sorts, log-depth aggregation, adjacent
//! distinct, and streaming windows. The relational table layer drives
//! these; they can equally be used directly on shared vectors.

pub mod aggregation;
pub mod common;
pub mod distinct;
pub mod merge;
pub mod quicksort;
pub mod radixsort;
pub mod selector;
pub mod shuffle;
pub mod sorting;
pub mod streaming;

pub use aggregation::{ArithAggregator, BoolAggregator, Direction, aggregate, tree_prefix_sum};
pub use common::{multiplex_a, multiplex_b, swap_a, swap_b};
pub use distinct::distinct;
pub use selector::Aggregation;
pub use sorting::{SortOrder, SortingProtocol};

//! Runtime configuration.
//!
//! A [`RuntimeConfig`] carries the knobs that are fixed for the lifetime of
//! a party's runtime: worker thread count, the default sorting protocol,
//! and the adder circuit used for boolean addition. Configurations can be
//! loaded from a JSON file or built in code; tests use the defaults.

use crate::operators::sorting::SortingProtocol;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Which adder circuit implements boolean `+` by default.
///
/// The ripple-carry adder uses `W - 1` AND rounds but asymptotically
/// optimal bandwidth via bit packing; the Kogge-Stone adder uses
/// `ceil(log2 W)` rounds at full-width bandwidth. We are rarely
/// round-bound, so ripple-carry is the default.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AdderTopology {
    #[default]
    RippleCarry,
    KoggeStone,
}

/// Fixed per-runtime configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Number of worker threads for the parallel executors.
    pub threads: usize,
    /// Sorting protocol selected by `SortingProtocol::Default`.
    pub sort_protocol: SortingProtocol,
    /// Adder circuit used by boolean `+` / `-`.
    pub adder: AdderTopology,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            threads: num_cpus::get(),
            sort_protocol: SortingProtocol::Quicksort,
            adder: AdderTopology::RippleCarry,
        }
    }
}

impl RuntimeConfig {
    /// Load a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> crate::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text)
            .map_err(|e| crate::Error::precondition(format!("bad runtime config: {e}")))
    }
}

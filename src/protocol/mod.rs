//! The protocol contract (L3).
//!
//! The cryptographic protocol is an external collaborator: this module
//! specifies what a backend must provide — secret sharing and opening,
//! elementwise ring and boolean primitives, share conversions, resharing —
//! and nothing about how it provides them. The operator library is written
//! entirely against these traits.
//!
//! A backend implements [`Protocol<T>`] for every element width, plus the
//! width-independent [`PartyRuntime`]. [`ProtocolSuite`] bundles the five
//! widths into one object-safe trait; a [`Ctx`] (an `Arc<dyn
//! ProtocolSuite>`) is the handle every shared vector carries.
//!
//! Operations that may touch the network are `Result`-returning; linear
//! local operations are infallible. Every elementwise primitive must be
//! independent per index, so the runtime may batch it across workers.

pub mod check;
pub mod plain;

pub use plain::PlainProtocol;

use crate::element::Element;
use crate::error::Result;
use crate::random::PermutationManager;
use crate::share::ReplicatedShares;
use crate::vector::PlainVector;
use std::sync::Arc;

/// Authenticated point-to-point transport between parties. Payloads are
/// element buffers in little-endian interchange encoding (see
/// [`encode_elements`]); receive-side matching is the transport's job.
pub trait Communicator: Send + Sync {
    fn send_bytes(&self, to: usize, payload: &[u8]) -> Result<()>;
    fn receive_bytes(&self, from: usize) -> Result<Vec<u8>>;
}

/// Serialize a plain vector for the transport. The vector must be
/// materialized: the transport contract assumes contiguous storage.
pub fn encode_elements<T: Element>(v: &PlainVector<T>) -> Vec<u8> {
    let mut out = Vec::with_capacity(v.size() * 16);
    for i in 0..v.size() {
        out.extend_from_slice(&v.get(i).to_i128().to_le_bytes());
    }
    out
}

/// Deserialize a transport payload into a plain vector.
pub fn decode_elements<T: Element>(bytes: &[u8]) -> Result<PlainVector<T>> {
    if bytes.len() % 16 != 0 {
        return Err(crate::Error::Transport(format!(
            "payload of {} bytes is not element-aligned",
            bytes.len()
        )));
    }
    let out = PlainVector::zeroed(bytes.len() / 16);
    for (i, chunk) in bytes.chunks_exact(16).enumerate() {
        let mut raw = [0u8; 16];
        raw.copy_from_slice(chunk);
        out.set(i, T::from_i128(i128::from_le_bytes(raw)));
    }
    Ok(out)
}

/// Width-independent per-party state.
pub trait PartyRuntime: Send + Sync {
    fn party_id(&self) -> usize;
    fn num_parties(&self) -> usize;
    /// Per-party share count `R`.
    fn replication(&self) -> usize;
    /// Resharing groups in shuffle application order.
    fn groups(&self) -> Vec<Vec<usize>>;
    /// The process-wide sharded permutation pool.
    fn permutations(&self) -> &PermutationManager;
    /// Primary communicator, when the backend has one.
    fn comm0(&self) -> Option<&dyn Communicator> {
        None
    }
    /// Optional commit-open verification hook; a no-op for semi-honest
    /// backends.
    fn malicious_check(&self) -> Result<()> {
        Ok(())
    }
    /// Adder circuit implementing boolean `+`.
    fn adder(&self) -> crate::config::AdderTopology {
        crate::config::AdderTopology::RippleCarry
    }
    /// Sorting protocol selected by `SortingProtocol::Default`.
    fn default_sort_protocol(&self) -> crate::operators::sorting::SortingProtocol {
        crate::operators::sorting::SortingProtocol::Quicksort
    }
}

/// The per-element-width protocol primitives.
///
/// `out` parameters are written through shared storage (the containers are
/// interior-mutable views); inputs and outputs must have equal sizes.
pub trait Protocol<T: Element>: PartyRuntime {
    // ----- Sharing and opening -----

    /// The `owner` party secret-shares `v`; the other parties receive
    /// consistent shares for their share indices.
    fn secret_share_a(&self, v: &PlainVector<T>, owner: usize) -> ReplicatedShares<T>;
    fn secret_share_b(&self, v: &PlainVector<T>, owner: usize) -> ReplicatedShares<T>;
    /// Sharing of a public value, identical at every party.
    fn public_share_a(&self, v: &PlainVector<T>) -> ReplicatedShares<T>;
    fn public_share_b(&self, v: &PlainVector<T>) -> ReplicatedShares<T>;
    /// Combine shares and reveal to all parties.
    fn open_a(&self, s: &ReplicatedShares<T>) -> Result<PlainVector<T>>;
    fn open_b(&self, s: &ReplicatedShares<T>) -> Result<PlainVector<T>>;
    /// Resample the sharing within `group` without changing the value.
    fn reshare(&self, s: &mut ReplicatedShares<T>, group: &[usize], binary: bool) -> Result<()>;

    // ----- Linear local operations -----

    fn add_a(&self, x: &ReplicatedShares<T>, y: &ReplicatedShares<T>, out: &ReplicatedShares<T>);
    fn sub_a(&self, x: &ReplicatedShares<T>, y: &ReplicatedShares<T>, out: &ReplicatedShares<T>);
    fn neg_a(&self, x: &ReplicatedShares<T>, out: &ReplicatedShares<T>);
    fn add_const_a(&self, x: &ReplicatedShares<T>, c: T, out: &ReplicatedShares<T>);
    fn mul_const_a(&self, x: &ReplicatedShares<T>, c: T, out: &ReplicatedShares<T>);
    fn xor_b(&self, x: &ReplicatedShares<T>, y: &ReplicatedShares<T>, out: &ReplicatedShares<T>);
    fn not_b(&self, x: &ReplicatedShares<T>, out: &ReplicatedShares<T>);
    /// LSB-only boolean negation.
    fn not_b_1(&self, x: &ReplicatedShares<T>, out: &ReplicatedShares<T>);
    fn xor_const_b(&self, x: &ReplicatedShares<T>, c: T, out: &ReplicatedShares<T>);

    // ----- Operations that may require a round -----

    fn multiply_a(
        &self,
        x: &ReplicatedShares<T>,
        y: &ReplicatedShares<T>,
        out: &ReplicatedShares<T>,
    ) -> Result<()>;
    fn and_b(
        &self,
        x: &ReplicatedShares<T>,
        y: &ReplicatedShares<T>,
        out: &ReplicatedShares<T>,
    ) -> Result<()>;
    fn or_b(
        &self,
        x: &ReplicatedShares<T>,
        y: &ReplicatedShares<T>,
        out: &ReplicatedShares<T>,
    ) -> Result<()>;

    // ----- Share conversions -----

    /// Convert the LSB of a boolean sharing to an arithmetic sharing.
    fn b2a_bit(&self, x: &ReplicatedShares<T>, out: &ReplicatedShares<T>) -> Result<()>;
    /// Split an arithmetic sharing into two boolean sharings whose boolean
    /// sum is the value; the caller feeds them through an adder circuit to
    /// complete a2b.
    fn redistribute_shares_b(
        &self,
        x: &ReplicatedShares<T>,
    ) -> Result<(ReplicatedShares<T>, ReplicatedShares<T>)>;

    // ----- Derived arithmetic -----

    /// Division by a public constant, returning `(quotient, error)`. The
    /// error term is negative when the quotient is exact; callers add
    /// `(error >= 0)` as a correction.
    fn div_const_a(
        &self,
        x: &ReplicatedShares<T>,
        c: T,
    ) -> Result<(ReplicatedShares<T>, ReplicatedShares<T>)>;

    /// Chunked dot product: every `chunk` consecutive index pairs reduce
    /// to one output element.
    fn dot_product_a(
        &self,
        x: &ReplicatedShares<T>,
        y: &ReplicatedShares<T>,
        out: &ReplicatedShares<T>,
        chunk: usize,
    ) -> Result<()>;
}

/// A protocol backend for all supported element widths.
pub trait ProtocolSuite:
    Protocol<i8> + Protocol<i16> + Protocol<i32> + Protocol<i64> + Protocol<i128>
{
}

impl<P> ProtocolSuite for P where
    P: Protocol<i8> + Protocol<i16> + Protocol<i32> + Protocol<i64> + Protocol<i128>
{
}

/// The protocol handle carried by every shared vector and table.
pub type Ctx = Arc<dyn ProtocolSuite>;

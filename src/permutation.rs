//! Permutations (L5): elementwise shared permutations, sharded
//! correlation application, and composition.
//!
//! An [`ElementwisePermutation`] is a shared vector of indices whose
//! plaintext is a permutation of `0..n`; opening it reveals the
//! permutation. Application is *scatter*: applying `pi` moves the element
//! at position `i` to position `pi[i]`.
//!
//! Sharded permutations (the correlated-randomness objects from the pool)
//! are applied here: group-local permute + reshare for the
//! honest-majority variant, and the two-message `permute_and_share`
//! protocol for the dishonest-majority (2PC) variant.
//!
//! Permutations are shared over `i32`: the padded-index sorts reserve 32
//! index bits, bounding tables at 2^31 rows.

use crate::element::Element;
use crate::encoded::{ASharedVector, BSharedVector};
use crate::error::{Error, Result};
use crate::protocol::{Communicator, Ctx, decode_elements, encode_elements};
use crate::random::permutations::{DmShardedPermutation, ShardedPermutation};
use crate::runtime::execute_parallel;
use crate::share::{Encoding, ReplicatedShares};
use crate::vector::PlainVector;

/// Index type of elementwise permutations.
pub type PermIndex = i32;

// ===== Local (plaintext) permutation application ============================

/// Scatter-apply a plaintext permutation to a plain vector in place:
/// `x'[perm[i]] = x[i]`.
pub fn local_apply_perm<T: Element>(x: &PlainVector<T>, perm: &[usize]) {
    let n = x.size();
    debug_assert_eq!(n, perm.len(), "permutation length mismatch");
    let scratch = PlainVector::<T>::zeroed(n);
    // perm is a bijection, so writes are disjoint per index
    execute_parallel(n, |start, end| {
        for i in start..end {
            scratch.set(perm[i], x.get(i));
        }
    });
    execute_parallel(n, |start, end| {
        for i in start..end {
            x.set(i, scratch.get(i));
        }
    });
}

/// Gather-apply the inverse of a plaintext permutation: `x'[i] = x[perm[i]]`.
pub fn local_apply_inverse_perm<T: Element>(x: &PlainVector<T>, perm: &[usize]) {
    let n = x.size();
    debug_assert_eq!(n, perm.len(), "permutation length mismatch");
    let scratch = PlainVector::<T>::zeroed(n);
    execute_parallel(n, |start, end| {
        for i in start..end {
            scratch.set(i, x.get(perm[i]));
        }
    });
    execute_parallel(n, |start, end| {
        for i in start..end {
            x.set(i, scratch.get(i));
        }
    });
}

/// Apply a plaintext permutation to every replicated share.
pub fn local_apply_perm_shares<T: Element>(x: &ReplicatedShares<T>, perm: &[usize]) {
    x.for_each(|s| local_apply_perm(s, perm));
}

/// Apply the inverse of a plaintext permutation to every replicated share.
pub fn local_apply_inverse_perm_shares<T: Element>(x: &ReplicatedShares<T>, perm: &[usize]) {
    x.for_each(|s| local_apply_inverse_perm(s, perm));
}

// ===== Sharded permutation application ======================================

/// Obliviously apply a sharded permutation to a shared vector.
///
/// Honest-majority: for each group in application order, members locally
/// permute their shares under the group permutation, then the whole group
/// reshares. Vectors are materialized before resharing (the transport
/// assumes contiguous storage).
pub fn oblivious_apply_sharded_perm<T: Element>(
    x: &mut ReplicatedShares<T>,
    encoding: Encoding,
    perm: &ShardedPermutation,
    ctx: &Ctx,
) -> Result<()> {
    if perm.size() != x.size() {
        return Err(Error::precondition(format!(
            "sharded permutation of {} applied to vector of {}",
            perm.size(),
            x.size()
        )));
    }
    match perm {
        ShardedPermutation::HonestMajority(hm) => {
            let proto = T::protocol(&**ctx);
            for (group, local) in &hm.groups {
                if let Some(p) = local {
                    local_apply_perm_shares(x, p);
                }
                x.materialize_inplace();
                proto.reshare(x, group, encoding == Encoding::Boolean)?;
            }
            Ok(())
        }
    }
}

/// Obliviously apply the inverse of a sharded permutation: inverse group
/// permutations, in reverse group order.
pub fn oblivious_apply_inverse_sharded_perm<T: Element>(
    x: &mut ReplicatedShares<T>,
    encoding: Encoding,
    perm: &ShardedPermutation,
    ctx: &Ctx,
) -> Result<()> {
    if perm.size() != x.size() {
        return Err(Error::precondition(format!(
            "sharded permutation of {} applied to vector of {}",
            perm.size(),
            x.size()
        )));
    }
    match perm {
        ShardedPermutation::HonestMajority(hm) => {
            let proto = T::protocol(&**ctx);
            for (group, local) in hm.groups.iter().rev() {
                if let Some(p) = local {
                    local_apply_inverse_perm_shares(x, p);
                }
                x.materialize_inplace();
                proto.reshare(x, group, encoding == Encoding::Boolean)?;
            }
            Ok(())
        }
    }
}

/// One step of the dishonest-majority (2PC) shuffle: apply a permutation
/// correlation with `send_party` as sender. After both parties have acted
/// as sender once, the vector holds a fresh sharing of the permuted value.
pub fn permute_and_share<T: Element>(
    x: &mut ReplicatedShares<T>,
    perm: &DmShardedPermutation<T>,
    send_party: usize,
    ctx: &Ctx,
    comm: &dyn Communicator,
) -> Result<()> {
    if ctx.num_parties() != 2 {
        return Err(Error::UnsupportedProtocol(
            "dishonest-majority permutation correlations require two parties".into(),
        ));
    }
    let rank = ctx.party_id();
    let boolean = perm.encoding == Encoding::Boolean;
    let n = x.size();

    if rank != send_party {
        // receiver blinds their share: delta = [x]_r - A
        let share = x.share(0);
        for i in 0..n {
            let v = if boolean {
                share.get(i) ^ perm.a.get(i)
            } else {
                share.get(i).wrapping_sub(perm.a.get(i))
            };
            share.set(i, v);
        }

        x.materialize_inplace();
        comm.send_bytes(send_party, &encode_elements(x.share(0)))?;

        // receiver's fresh share is B
        x.share(0).assign(&perm.b);
    } else {
        // sender permutes delta under pi and folds in C
        let peer = 1 - send_party;
        let delta: PlainVector<T> = decode_elements(&comm.receive_bytes(peer)?)?;
        local_apply_perm(&delta, &perm.pi);
        for i in 0..n {
            let v = if boolean {
                delta.get(i) ^ perm.c.get(i)
            } else {
                delta.get(i).wrapping_add(perm.c.get(i))
            };
            delta.set(i, v);
        }

        // [x]_s = pi([x]_s) + C'
        local_apply_perm_shares(x, &perm.pi);
        let share = x.share(0);
        for i in 0..n {
            let v = if boolean {
                share.get(i) ^ delta.get(i)
            } else {
                share.get(i).wrapping_add(delta.get(i))
            };
            share.set(i, v);
        }
    }
    Ok(())
}

/// Inverse counterpart of [`permute_and_share`]: symmetric steps under
/// `pi^{-1}`.
pub fn permute_and_share_inverse<T: Element>(
    x: &mut ReplicatedShares<T>,
    perm: &DmShardedPermutation<T>,
    send_party: usize,
    ctx: &Ctx,
    comm: &dyn Communicator,
) -> Result<()> {
    if ctx.num_parties() != 2 {
        return Err(Error::UnsupportedProtocol(
            "dishonest-majority permutation correlations require two parties".into(),
        ));
    }
    let rank = ctx.party_id();
    let boolean = perm.encoding == Encoding::Boolean;
    let n = x.size();

    if rank != send_party {
        // delta = [x]_r - B
        let share = x.share(0);
        for i in 0..n {
            let v = if boolean {
                share.get(i) ^ perm.b.get(i)
            } else {
                share.get(i).wrapping_sub(perm.b.get(i))
            };
            share.set(i, v);
        }

        x.materialize_inplace();
        comm.send_bytes(send_party, &encode_elements(x.share(0)))?;

        x.share(0).assign(&perm.a);
    } else {
        let peer = 1 - send_party;
        let delta: PlainVector<T> = decode_elements(&comm.receive_bytes(peer)?)?;
        // delta' = delta - C, then permute under pi^{-1}
        for i in 0..n {
            let v = if boolean {
                delta.get(i) ^ perm.c.get(i)
            } else {
                delta.get(i).wrapping_sub(perm.c.get(i))
            };
            delta.set(i, v);
        }
        local_apply_inverse_perm(&delta, &perm.pi);

        local_apply_inverse_perm_shares(x, &perm.pi);
        let share = x.share(0);
        for i in 0..n {
            let v = if boolean {
                share.get(i) ^ delta.get(i)
            } else {
                share.get(i).wrapping_add(delta.get(i))
            };
            share.set(i, v);
        }
    }
    Ok(())
}

// ===== Elementwise shared permutations ======================================

/// A secret-shared permutation of `0..n`, in either encoding.
pub struct ElementwisePermutation {
    pub(crate) shares: ReplicatedShares<PermIndex>,
    encoding: Encoding,
    ctx: Ctx,
}

impl Clone for ElementwisePermutation {
    fn clone(&self) -> Self {
        Self {
            shares: self.shares.clone(),
            encoding: self.encoding,
            ctx: self.ctx.clone(),
        }
    }
}

impl ElementwisePermutation {
    /// The identity permutation, shared publicly in `encoding`.
    pub fn identity(ctx: &Ctx, n: usize, encoding: Encoding) -> Self {
        let idx: PlainVector<PermIndex> = (0..n as PermIndex).collect();
        let proto = <PermIndex as Element>::protocol(&**ctx);
        let shares = match encoding {
            Encoding::Arithmetic => proto.public_share_a(&idx),
            Encoding::Boolean => proto.public_share_b(&idx),
        };
        Self {
            shares,
            encoding,
            ctx: ctx.clone(),
        }
    }

    /// Wrap an A-shared index vector as a permutation.
    pub fn from_arithmetic(v: ASharedVector<PermIndex>) -> Self {
        let ctx = v.context().clone();
        Self {
            shares: v.shares().clone(),
            encoding: Encoding::Arithmetic,
            ctx,
        }
    }

    /// Wrap a B-shared index vector as a permutation.
    pub fn from_boolean(v: BSharedVector<PermIndex>) -> Self {
        let ctx = v.context().clone();
        Self {
            shares: v.shares().clone(),
            encoding: Encoding::Boolean,
            ctx,
        }
    }

    /// A fresh uniformly random shared permutation: shuffle the identity
    /// under one sharded permutation from the pool.
    pub fn random(ctx: &Ctx, n: usize, encoding: Encoding) -> Result<Self> {
        let sharded = ctx.permutations().next(n, encoding)?;
        let mut perm = Self::identity(ctx, n, encoding);
        oblivious_apply_sharded_perm(&mut perm.shares, encoding, &sharded, ctx)?;
        Ok(perm)
    }

    pub fn size(&self) -> usize {
        self.shares.size()
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn shares(&self) -> &ReplicatedShares<PermIndex> {
        &self.shares
    }

    pub fn shares_mut(&mut self) -> &mut ReplicatedShares<PermIndex> {
        &mut self.shares
    }

    pub fn deepcopy(&self) -> Self {
        Self {
            shares: self.shares.materialize(),
            encoding: self.encoding,
            ctx: self.ctx.clone(),
        }
    }

    /// Open to the plaintext permutation.
    pub fn open(&self) -> Result<Vec<usize>> {
        let proto = <PermIndex as Element>::protocol(&*self.ctx);
        let opened = match self.encoding {
            Encoding::Arithmetic => proto.open_a(&self.shares)?,
            Encoding::Boolean => proto.open_b(&self.shares)?,
        };
        Ok(opened.iter().map(|v| v as usize).collect())
    }

    /// Convert a boolean-encoded permutation to arithmetic encoding.
    ///
    /// Two-party backends convert directly; otherwise shuffle with a fresh
    /// sharded permutation, open the (masked) permutation, re-share it
    /// publicly as arithmetic, and unshuffle. One pool permutation.
    pub fn b2a(&mut self) -> Result<()> {
        if self.encoding == Encoding::Arithmetic {
            return Ok(());
        }
        if self.ctx.num_parties() == 2 {
            let b = BSharedVector::from_shares(&self.ctx, self.shares.clone());
            self.shares = b.b2a()?.shares().clone();
        } else {
            let pi = self
                .ctx
                .permutations()
                .next(self.size(), Encoding::Boolean)?;
            oblivious_apply_sharded_perm(
                &mut self.shares,
                Encoding::Boolean,
                &pi,
                &self.ctx,
            )?;
            let proto = <PermIndex as Element>::protocol(&*self.ctx);
            let opened = proto.open_b(&self.shares)?;
            self.shares = proto.public_share_a(&opened);
            oblivious_apply_inverse_sharded_perm(
                &mut self.shares,
                Encoding::Arithmetic,
                &pi,
                &self.ctx,
            )?;
        }
        self.encoding = Encoding::Arithmetic;
        Ok(())
    }

    /// Map every entry `x` to `-x - 1`. Descending sorts pad with negated
    /// indices; this recovers them.
    pub fn negate(&self) -> Result<()> {
        if self.encoding != Encoding::Arithmetic {
            return Err(Error::WrongEncoding(
                "negate is defined on arithmetic-encoded permutations".into(),
            ));
        }
        let proto = <PermIndex as Element>::protocol(&*self.ctx);
        proto.neg_a(&self.shares, &self.shares);
        proto.add_const_a(&self.shares, -1, &self.shares);
        Ok(())
    }

    /// Invert in place by scatter-applying `self` to the identity
    /// permutation. One pool pair.
    pub fn invert(&mut self) -> Result<()> {
        let mut id = Self::identity(&self.ctx, self.size(), Encoding::Arithmetic);
        oblivious_apply_elementwise_perm(
            &mut id.shares,
            Encoding::Arithmetic,
            self,
            &self.ctx,
        )?;
        self.shares = id.shares;
        self.encoding = Encoding::Arithmetic;
        Ok(())
    }
}

/// Obliviously scatter-apply an elementwise shared permutation to a
/// shared vector: draw a pair of sharded permutations over the same
/// underlying `pi`, shuffle both the data and a copy of the permutation,
/// open the shuffled permutation (a uniformly random permutation, so the
/// disclosure is harmless), and permute locally. One pool pair.
pub fn oblivious_apply_elementwise_perm<T: Element>(
    x: &mut ReplicatedShares<T>,
    x_encoding: Encoding,
    perm: &ElementwisePermutation,
    ctx: &Ctx,
) -> Result<()> {
    let mut shuffled = perm.deepcopy();

    let (pi_1, pi_2) = ctx
        .permutations()
        .next_pair(x.size(), x_encoding, perm.encoding())?;

    oblivious_apply_sharded_perm(x, x_encoding, &pi_1, ctx)?;
    oblivious_apply_sharded_perm(&mut shuffled.shares, shuffled.encoding, &pi_2, ctx)?;

    let opened = shuffled.open()?;
    local_apply_perm_shares(x, &opened);
    Ok(())
}

/// Compose two elementwise shared permutations into `rho . sigma` (apply
/// `sigma` first). One pool permutation.
pub fn compose_permutations(
    mut sigma: ElementwisePermutation,
    rho: ElementwisePermutation,
) -> Result<ElementwisePermutation> {
    if sigma.encoding() != rho.encoding() {
        return Err(Error::WrongEncoding(
            "composed permutations must share an encoding".into(),
        ));
    }
    let ctx = sigma.ctx.clone();
    let pi = ctx.permutations().next(sigma.size(), sigma.encoding())?;

    // sigma' := pi(sigma) = sigma . pi^{-1}
    oblivious_apply_sharded_perm(&mut sigma.shares, sigma.encoding, &pi, &ctx)?;
    let pi_sigma = sigma.open()?;

    // rho' := inverse(pi(sigma))(rho) = rho . sigma . pi^{-1}
    local_apply_inverse_perm_shares(&rho.shares, &pi_sigma);

    // rho'' := pi^{-1}(rho') = rho . sigma
    let mut rho = rho;
    oblivious_apply_inverse_sharded_perm(&mut rho.shares, rho.encoding, &pi, &ctx)?;
    Ok(rho)
}

/// Scatter-apply an elementwise permutation to an A-shared vector.
pub fn apply_perm_to_arithmetic<T: Element>(
    v: &mut ASharedVector<T>,
    perm: &ElementwisePermutation,
) -> Result<()> {
    let ctx = v.context().clone();
    oblivious_apply_elementwise_perm(v.shares_mut(), Encoding::Arithmetic, perm, &ctx)
}

/// Scatter-apply an elementwise permutation to a B-shared vector.
pub fn apply_perm_to_boolean<T: Element>(
    v: &mut BSharedVector<T>,
    perm: &ElementwisePermutation,
) -> Result<()> {
    let ctx = v.context().clone();
    oblivious_apply_elementwise_perm(v.shares_mut(), Encoding::Boolean, perm, &ctx)
}

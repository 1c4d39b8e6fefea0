//! Replicated share containers (L1).
//!
//! A [`ReplicatedShares`] holds exactly `R` plain vectors — the `R` shares
//! of a secret-shared vector that one party stores, where `R` is the
//! protocol's per-party replication number (1 for plaintext/2PC, 2 for
//! three-party replicated sharing, and so on). All `R` vectors obey the
//! same length invariants; access-pattern construction and local
//! transformations apply uniformly to every share.

use crate::element::Element;
use crate::error::Result;
use crate::vector::PlainVector;

/// The encoding of a shared vector: arithmetic (additive) or boolean (XOR).
#[derive(Copy, Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Encoding {
    Arithmetic,
    Boolean,
}

/// The `R` share vectors one party holds for a secret-shared vector.
pub struct ReplicatedShares<T> {
    shares: Vec<PlainVector<T>>,
}

impl<T: Element> Clone for ReplicatedShares<T> {
    /// Shallow copy: every share still aliases its storage.
    fn clone(&self) -> Self {
        Self {
            shares: self.shares.clone(),
        }
    }
}

impl<T: Element> ReplicatedShares<T> {
    /// Zero-initialized shares: `replication` vectors of `size` elements.
    pub fn zeroed(replication: usize, size: usize) -> Self {
        Self {
            shares: (0..replication).map(|_| PlainVector::zeroed(size)).collect(),
        }
    }

    /// Wrap existing share vectors. All must have the same length.
    pub fn from_vectors(shares: Vec<PlainVector<T>>) -> Self {
        assert!(!shares.is_empty(), "replication number must be positive");
        let n = shares[0].size();
        assert!(
            shares.iter().all(|s| s.size() == n),
            "replicated shares must share one length"
        );
        Self { shares }
    }

    /// Per-party share count `R`.
    #[inline]
    pub fn replication(&self) -> usize {
        self.shares.len()
    }

    /// Element count (batch span) common to all shares.
    #[inline]
    pub fn size(&self) -> usize {
        self.shares[0].size()
    }

    /// Logical length common to all shares.
    #[inline]
    pub fn total_size(&self) -> usize {
        self.shares[0].total_size()
    }

    /// The `r`-th share vector.
    #[inline]
    pub fn share(&self, r: usize) -> &PlainVector<T> {
        &self.shares[r]
    }

    pub fn share_mut(&mut self, r: usize) -> &mut PlainVector<T> {
        &mut self.shares[r]
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlainVector<T>> {
        self.shares.iter()
    }

    /// Apply the same view constructor to every share.
    pub fn project(&self, f: impl Fn(&PlainVector<T>) -> PlainVector<T>) -> Self {
        Self {
            shares: self.shares.iter().map(f).collect(),
        }
    }

    /// Fallible version of [`Self::project`].
    pub fn try_project(
        &self,
        f: impl Fn(&PlainVector<T>) -> Result<PlainVector<T>>,
    ) -> Result<Self> {
        let mut shares = Vec::with_capacity(self.shares.len());
        for s in &self.shares {
            shares.push(f(s)?);
        }
        Ok(Self { shares })
    }

    /// Run `f` on every share in place.
    pub fn for_each(&self, f: impl Fn(&PlainVector<T>)) {
        for s in &self.shares {
            f(s);
        }
    }

    pub fn for_each_mut(&mut self, f: impl Fn(&mut PlainVector<T>)) {
        for s in &mut self.shares {
            f(s);
        }
    }

    /// Elementwise copy `other`'s shares into this container's views.
    pub fn assign(&self, other: &Self) {
        assert_eq!(self.replication(), other.replication());
        for (a, b) in self.shares.iter().zip(other.shares.iter()) {
            a.assign(b);
        }
    }

    /// Share-wise truncating/extending cast from another element width.
    pub fn assign_cast<S: Element>(&self, other: &ReplicatedShares<S>) {
        assert_eq!(self.replication(), other.replication());
        for (a, b) in self.shares.iter().zip(other.shares.iter()) {
            a.assign_cast(b);
        }
    }

    /// Collapse any mapping on every share into fresh storage.
    pub fn materialize_inplace(&mut self) {
        for s in &mut self.shares {
            s.materialize_inplace();
        }
    }

    /// Deep copy into fresh storage.
    pub fn materialize(&self) -> Self {
        Self {
            shares: self.shares.iter().map(|s| s.materialize()).collect(),
        }
    }
}

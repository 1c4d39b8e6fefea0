//! Commit-open verification hook.
//!
//! The single malicious-adversary hook the core exposes: parties keep a
//! running digest of every buffer they open, and at the end of a query
//! exchange digests and compare. A mismatch means some party opened
//! inconsistent values; the query aborts with `CheckFailed`. Semi-honest
//! backends leave the hook unwired.

use crate::element::Element;
use crate::error::{Error, Result};
use crate::vector::PlainVector;
use sha2::{Digest, Sha256};
use std::sync::Mutex;

/// Running transcript digest of opened values.
pub struct CommitOpenCheck {
    hasher: Mutex<Sha256>,
}

impl Default for CommitOpenCheck {
    fn default() -> Self {
        Self::new()
    }
}

impl CommitOpenCheck {
    pub fn new() -> Self {
        Self {
            hasher: Mutex::new(Sha256::new()),
        }
    }

    /// Absorb an opened buffer into the transcript.
    pub fn record<T: Element>(&self, opened: &PlainVector<T>) {
        let mut h = self.hasher.lock().expect("check lock");
        for i in 0..opened.size() {
            h.update(opened.get(i).to_i128().to_le_bytes());
        }
    }

    /// Finalize the transcript digest (resets the running state).
    pub fn digest(&self) -> [u8; 32] {
        let mut h = self.hasher.lock().expect("check lock");
        let d = std::mem::take(&mut *h).finalize();
        d.into()
    }

    /// Compare this party's digest against a peer's.
    pub fn verify_against(&self, peer_digest: &[u8; 32]) -> Result<()> {
        if &self.digest() == peer_digest {
            Ok(())
        } else {
            Err(Error::CheckFailed)
        }
    }
}

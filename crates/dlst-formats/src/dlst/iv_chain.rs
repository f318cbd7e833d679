//! Per-entry chunk IV chains
//!
//! Chunk `k` of an entry is decrypted with IV(k), where IV(0) is the archive
//! base IV re-encrypted once and IV(k) is IV(k-1) re-encrypted once. The
//! chain can only be walked forward, so each entry keeps every value it has
//! derived and later reads pick up where the longest earlier read stopped.

use dlst_crypto::{CtCipher, Iv};
use parking_lot::Mutex;
use tracing::trace;

use super::entry::DlstEntry;
use super::error::{DlstError, DlstResult};

/// Lazily extended IV chain for one entry
#[derive(Debug, Default)]
pub struct IvChain {
    ivs: Mutex<Vec<Iv>>,
}

impl IvChain {
    /// Create an empty chain
    pub fn new() -> Self {
        Self::default()
    }

    /// IV for chunk `index`, deriving any missing predecessors
    ///
    /// Extension happens under the chain lock, so concurrent callers never
    /// derive the same index twice and never see a value change.
    pub fn iv_for_chunk(&self, cipher: &CtCipher, base_iv: &Iv, index: usize) -> Iv {
        let mut ivs = self.ivs.lock();
        if ivs.len() <= index {
            trace!(from = ivs.len(), to = index, "extending chunk IV chain");
            let missing = index + 1 - ivs.len();
            ivs.reserve(missing);
            while ivs.len() <= index {
                let next = cipher.derive_next_iv(ivs.last().unwrap_or(base_iv));
                ivs.push(next);
            }
        }
        ivs[index]
    }

    /// Number of IVs derived so far
    pub fn len(&self) -> usize {
        self.ivs.lock().len()
    }

    /// Whether no IV has been derived yet
    pub fn is_empty(&self) -> bool {
        self.ivs.lock().is_empty()
    }
}

/// IV chains for every entry of an archive, indexed by directory position
#[derive(Debug)]
pub struct ChainCache {
    base_iv: Iv,
    chains: Vec<IvChain>,
}

impl ChainCache {
    /// Create empty chains for `entry_count` entries
    pub fn new(base_iv: Iv, entry_count: usize) -> Self {
        Self {
            base_iv,
            chains: (0..entry_count).map(|_| IvChain::new()).collect(),
        }
    }

    /// Archive base IV
    pub fn base_iv(&self) -> &Iv {
        &self.base_iv
    }

    /// IV needed to decrypt the chunk holding `offset` in `entry`
    pub fn iv_for_offset(&self, cipher: &CtCipher, entry: &DlstEntry, offset: u64) -> DlstResult<Iv> {
        if offset >= entry.data_size {
            return Err(DlstError::OffsetOutOfRange {
                offset,
                size: entry.data_size,
            });
        }

        let index = usize::try_from(entry.chunk_index(offset)).map_err(|_| {
            DlstError::OffsetOutOfRange {
                offset,
                size: entry.data_size,
            }
        })?;
        let chain = self
            .chains
            .get(entry.index)
            .ok_or_else(|| DlstError::EntryNotFound(entry.name.clone()))?;
        Ok(chain.iv_for_chunk(cipher, &self.base_iv, index))
    }

    /// Chain for the entry at directory position `index`
    pub fn chain(&self, index: usize) -> Option<&IvChain> {
        self.chains.get(index)
    }
}

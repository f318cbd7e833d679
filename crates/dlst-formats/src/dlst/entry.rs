//! Archive entry descriptors

use std::ops::Range;

/// One named payload inside a DLST archive
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DlstEntry {
    /// Position in the directory
    pub index: usize,
    /// Logical path inside the archive
    pub name: String,
    /// Absolute offset of the entry ciphertext
    pub offset: u64,
    /// Size of the entry data (ciphertext and plaintext sizes match)
    pub data_size: u64,
    /// Chunk size for the IV chain, 0 for a single chunk
    pub chunk_size: u32,
}

impl DlstEntry {
    /// Chunk length actually used to split the data
    pub fn effective_chunk_size(&self) -> u64 {
        if self.chunk_size == 0 {
            self.data_size
        } else {
            u64::from(self.chunk_size)
        }
    }

    /// Chunk containing `offset`, without bounds checking
    pub fn chunk_index(&self, offset: u64) -> u64 {
        if self.chunk_size == 0 {
            0
        } else {
            offset / u64::from(self.chunk_size)
        }
    }

    /// Number of chunks; an empty entry has none
    pub fn chunk_count(&self) -> u64 {
        if self.data_size == 0 {
            0
        } else {
            self.data_size.div_ceil(self.effective_chunk_size())
        }
    }

    /// Byte range of chunk `index` relative to the entry start
    pub fn chunk_range(&self, index: u64) -> Option<Range<u64>> {
        if index >= self.chunk_count() {
            return None;
        }
        let chunk_size = self.effective_chunk_size();
        let start = index * chunk_size;
        let end = (start + chunk_size).min(self.data_size);
        Some(start..end)
    }

    /// Absolute file range of the ciphertext
    pub fn file_range(&self) -> Range<u64> {
        self.offset..self.offset + self.data_size
    }
}

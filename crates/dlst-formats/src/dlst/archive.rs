//! DLST archive reader
//!
//! [`DlstArchive`] parses the container once at open time and then serves
//! decrypted entry data on demand. It is `Send + Sync`; reads from several
//! threads share the per-entry IV chains.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Read, Seek};
use std::path::Path;

use dlst_crypto::{AesKey, CtCipher, Iv};
use parking_lot::RwLock;
use tracing::{debug, info, trace};

use super::entry::DlstEntry;
use super::error::{DlstError, DlstResult, Section};
use super::iv_chain::ChainCache;
use super::parser::parse_entries;
use super::source::{ByteSource, MmapSource, SeekSource};

/// How a file opened by path is accessed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AccessMode {
    /// Seek-and-read on the file handle, serialized by a lock
    #[default]
    Buffered,
    /// Read-only memory map, no locking on reads
    Mmap,
}

/// Options for opening an archive
#[derive(Debug, Clone, Default)]
pub struct DlstOptions {
    /// AES key; entries can be listed without it but not read
    pub key: Option<AesKey>,
    /// Archive base IV, all-zero when unset
    pub iv: Option<Iv>,
    /// Access mode for path-based opening
    pub access: AccessMode,
}

impl DlstOptions {
    /// Options with no key, zero IV and buffered access
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the AES key
    pub fn with_key(mut self, key: AesKey) -> Self {
        self.key = Some(key);
        self
    }

    /// Set the archive base IV
    pub fn with_iv(mut self, iv: Iv) -> Self {
        self.iv = Some(iv);
        self
    }

    /// Load the AES key from a raw or hex key file
    pub fn with_key_file<P: AsRef<Path>>(self, path: P) -> DlstResult<Self> {
        Ok(self.with_key(AesKey::from_file(path)?))
    }

    /// Set the access mode
    pub fn with_access(mut self, access: AccessMode) -> Self {
        self.access = access;
        self
    }
}

/// An open DLST archive
///
/// The lifetime ties the archive to a borrowed reader when one is supplied;
/// archives opened from a path are `DlstArchive<'static>`.
pub struct DlstArchive<'a> {
    source: RwLock<Option<Box<dyn ByteSource + 'a>>>,
    entries: Vec<DlstEntry>,
    names: HashMap<String, usize>,
    cipher: Option<CtCipher>,
    chains: ChainCache,
}

impl DlstArchive<'static> {
    /// Open the archive file at `path`
    pub fn open<P: AsRef<Path>>(path: P, options: DlstOptions) -> DlstResult<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), access = ?options.access, "opening DLST archive");

        let source: Box<dyn ByteSource> = match options.access {
            AccessMode::Buffered => Box::new(SeekSource::new(File::open(path)?)?),
            AccessMode::Mmap => Box::new(MmapSource::open(path)?),
        };
        Self::from_source(source, options)
    }
}

impl<'a> DlstArchive<'a> {
    /// Open an archive from a caller-supplied reader
    ///
    /// `options.access` is ignored; reads seek on `reader` under a lock. Pass
    /// `&File` or `&mut R` to keep ownership of the reader.
    pub fn open_reader<R>(reader: R, options: DlstOptions) -> DlstResult<Self>
    where
        R: Read + Seek + Send + 'a,
    {
        let source = Box::new(SeekSource::new(reader)?);
        Self::from_source(source, options)
    }

    /// Open an archive from any byte source
    ///
    /// Closing the archive drops `source`.
    pub fn from_source(source: Box<dyn ByteSource + 'a>, options: DlstOptions) -> DlstResult<Self> {
        let entries = parse_entries(source.as_ref())?;
        let names = entries
            .iter()
            .map(|entry| (entry.name.clone(), entry.index))
            .collect();
        debug!(entries = entries.len(), "opened DLST archive");

        Ok(Self {
            source: RwLock::new(Some(source)),
            chains: ChainCache::new(options.iv.unwrap_or_default(), entries.len()),
            entries,
            names,
            cipher: options.key.map(CtCipher::new),
        })
    }

    /// Entries in directory order
    pub fn list_entries(&self) -> DlstResult<&[DlstEntry]> {
        self.ensure_open()?;
        Ok(&self.entries)
    }

    /// Entry names, sorted
    pub fn namelist(&self) -> DlstResult<Vec<&str>> {
        self.ensure_open()?;
        let mut names: Vec<&str> = self.names.keys().map(String::as_str).collect();
        names.sort_unstable();
        Ok(names)
    }

    /// Number of entries in the directory
    pub fn len(&self) -> DlstResult<usize> {
        self.ensure_open()?;
        Ok(self.entries.len())
    }

    /// Whether the directory is empty
    pub fn is_empty(&self) -> DlstResult<bool> {
        self.ensure_open()?;
        Ok(self.entries.is_empty())
    }

    /// Look up an entry by name
    pub fn get_entry(&self, name: &str) -> DlstResult<&DlstEntry> {
        self.ensure_open()?;
        self.names
            .get(name)
            .map(|&index| &self.entries[index])
            .ok_or_else(|| DlstError::EntryNotFound(name.to_string()))
    }

    /// Read and decrypt the entry named `name`
    pub fn read(&self, name: &str) -> DlstResult<Vec<u8>> {
        self.cipher()?;
        let entry = self.get_entry(name)?;
        self.read_entry(entry)
    }

    /// Read and decrypt a whole entry
    pub fn read_entry(&self, entry: &DlstEntry) -> DlstResult<Vec<u8>> {
        let cipher = self.cipher()?;
        let entry = self.own_entry(entry)?;

        let len = usize::try_from(entry.data_size).map_err(|_| {
            DlstError::layout(
                Section::EntryData,
                format!("{}: size {} too large", entry.name, entry.data_size),
            )
        })?;
        let ciphertext = self.read_raw(entry.offset, len)?;

        let mut plaintext = Vec::with_capacity(len);
        for index in 0..entry.chunk_count() {
            let Some(range) = entry.chunk_range(index) else {
                break;
            };
            let iv = self.chains.iv_for_offset(cipher, entry, range.start)?;
            let chunk = &ciphertext[range.start as usize..range.end as usize];
            plaintext.extend_from_slice(&cipher.decrypt_chunk(chunk, &iv));
        }

        trace!(
            entry = %entry.name,
            bytes = plaintext.len(),
            chunks = entry.chunk_count(),
            "decrypted entry"
        );
        Ok(plaintext)
    }

    /// Read and decrypt chunk `index` of `entry` without touching other chunks'
    /// ciphertext
    pub fn read_chunk(&self, entry: &DlstEntry, index: u64) -> DlstResult<Vec<u8>> {
        let cipher = self.cipher()?;
        let entry = self.own_entry(entry)?;
        let range = entry
            .chunk_range(index)
            .ok_or_else(|| DlstError::ChunkOutOfRange {
                index,
                count: entry.chunk_count(),
            })?;

        let ciphertext =
            self.read_raw(entry.offset + range.start, (range.end - range.start) as usize)?;
        let iv = self.chains.iv_for_offset(cipher, entry, range.start)?;
        Ok(cipher.decrypt_chunk(&ciphertext, &iv))
    }

    /// IV used for the chunk holding `offset` in `entry`
    pub fn iv_for_offset(&self, entry: &DlstEntry, offset: u64) -> DlstResult<Iv> {
        let cipher = self.cipher()?;
        let entry = self.own_entry(entry)?;
        self.chains.iv_for_offset(cipher, entry, offset)
    }

    /// Streaming reader over a decrypted entry
    pub fn entry_reader(&self, entry: &DlstEntry) -> DlstResult<EntryReader<'_, 'a>> {
        self.cipher()?;
        let entry = self.own_entry(entry)?;
        Ok(EntryReader {
            archive: self,
            entry,
            next_chunk: 0,
            buffer: Vec::new(),
            position: 0,
        })
    }

    /// Number of chunk IVs derived so far for `entry`
    pub fn cached_ivs(&self, entry: &DlstEntry) -> usize {
        self.chains.chain(entry.index).map_or(0, |chain| chain.len())
    }

    /// Release the underlying source
    ///
    /// Files opened by path are closed. A supplied reader is only dropped,
    /// so a borrowed reader stays usable by its owner. Every later operation
    /// fails with [`DlstError::Closed`].
    pub fn close(&self) {
        if self.source.write().take().is_some() {
            info!(entries = self.entries.len(), "closed DLST archive");
        }
    }

    /// Whether `close` has been called
    pub fn is_closed(&self) -> bool {
        self.source.read().is_none()
    }

    fn ensure_open(&self) -> DlstResult<()> {
        if self.is_closed() {
            Err(DlstError::Closed)
        } else {
            Ok(())
        }
    }

    fn cipher(&self) -> DlstResult<&CtCipher> {
        self.cipher.as_ref().ok_or(DlstError::MissingKey)
    }

    /// Map a caller-provided descriptor onto this archive's own entry
    fn own_entry(&self, entry: &DlstEntry) -> DlstResult<&DlstEntry> {
        self.ensure_open()?;
        self.entries
            .get(entry.index)
            .filter(|own| *own == entry)
            .ok_or_else(|| DlstError::EntryNotFound(entry.name.clone()))
    }

    fn read_raw(&self, offset: u64, len: usize) -> DlstResult<Vec<u8>> {
        let source = self.source.read();
        let source = source.as_ref().ok_or(DlstError::Closed)?;
        Ok(source.read_at(offset, len)?)
    }
}

impl std::fmt::Debug for DlstArchive<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DlstArchive")
            .field("entries", &self.entries.len())
            .field("has_key", &self.cipher.is_some())
            .field("base_iv", self.chains.base_iv())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

/// Decrypting reader over one entry, one chunk at a time
pub struct EntryReader<'r, 'a> {
    archive: &'r DlstArchive<'a>,
    entry: &'r DlstEntry,
    next_chunk: u64,
    buffer: Vec<u8>,
    position: usize,
}

impl EntryReader<'_, '_> {
    /// Entry being read
    pub fn entry(&self) -> &DlstEntry {
        self.entry
    }

    /// Whether every chunk has been decrypted
    pub fn has_more_chunks(&self) -> bool {
        self.next_chunk < self.entry.chunk_count()
    }
}

impl Read for EntryReader<'_, '_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        while self.position >= self.buffer.len() && self.has_more_chunks() {
            self.buffer = self
                .archive
                .read_chunk(self.entry, self.next_chunk)
                .map_err(io::Error::other)?;
            self.position = 0;
            self.next_chunk += 1;
        }

        let available = &self.buffer[self.position.min(self.buffer.len())..];
        let to_copy = buf.len().min(available.len());
        buf[..to_copy].copy_from_slice(&available[..to_copy]);
        self.position += to_copy;
        Ok(to_copy)
    }
}

impl Drop for DlstArchive<'_> {
    fn drop(&mut self) {
        self.close();
    }
}

//! Positioned byte sources backing an archive
//!
//! The archive never holds a shared cursor. Every read names its own offset,
//! so a seekable reader only has to serialize the seek-then-read pair and a
//! memory map can be read from any number of threads at once.

use memmap2::{Mmap, MmapOptions};
use parking_lot::Mutex;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

/// Random-access, read-only view of archive bytes
pub trait ByteSource: Send + Sync {
    /// Total size in bytes
    fn len(&self) -> u64;

    /// Read exactly `len` bytes starting at `offset`
    fn read_at(&self, offset: u64, len: usize) -> io::Result<Vec<u8>>;

    /// Whether the source holds no bytes
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Seekable reader guarded by a lock
pub struct SeekSource<R> {
    inner: Mutex<R>,
    len: u64,
}

impl<R: Read + Seek + Send> SeekSource<R> {
    /// Wrap `reader`, measuring its length by seeking to the end
    pub fn new(mut reader: R) -> io::Result<Self> {
        let len = reader.seek(SeekFrom::End(0))?;
        Ok(Self {
            inner: Mutex::new(reader),
            len,
        })
    }

    /// Recover the wrapped reader
    pub fn into_inner(self) -> R {
        self.inner.into_inner()
    }
}

impl<R: Read + Seek + Send> ByteSource for SeekSource<R> {
    fn len(&self) -> u64 {
        self.len
    }

    fn read_at(&self, offset: u64, len: usize) -> io::Result<Vec<u8>> {
        let mut data = vec![0u8; len];
        let mut reader = self.inner.lock();
        reader.seek(SeekFrom::Start(offset))?;
        reader.read_exact(&mut data)?;
        drop(reader);
        Ok(data)
    }
}

/// Read-only memory map of an archive file
pub struct MmapSource {
    mmap: Mmap,
}

impl MmapSource {
    /// Map the file at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = File::open(path)?;
        Self::from_file(&file)
    }

    /// Map an already opened file
    pub fn from_file(file: &File) -> io::Result<Self> {
        #[allow(unsafe_code)]
        let mmap = unsafe { MmapOptions::new().map(file)? };
        Ok(Self { mmap })
    }
}

impl ByteSource for MmapSource {
    fn len(&self) -> u64 {
        self.mmap.len() as u64
    }

    fn read_at(&self, offset: u64, len: usize) -> io::Result<Vec<u8>> {
        let range = usize::try_from(offset)
            .ok()
            .and_then(|start| Some(start..start.checked_add(len)?))
            .filter(|range| range.end <= self.mmap.len())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!(
                        "read of {len} bytes at {offset} past end of {} byte map",
                        self.mmap.len()
                    ),
                )
            })?;
        Ok(self.mmap[range].to_vec())
    }
}

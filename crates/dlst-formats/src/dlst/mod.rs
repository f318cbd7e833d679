//! DLST encrypted archive containers
//!
//! A DLST file holds a directory of named entries whose data is encrypted
//! with AES-128-CBC. Each entry is split into fixed-size chunks, and chunk
//! `k` uses the `k`-th value of an IV chain seeded from the archive base IV.
//! That lets any chunk be decrypted without touching the ciphertext of the
//! chunks before it.
//!
//! # Layout
//!
//! | Section | Offset | Contents |
//! |---|---|---|
//! | Pointer | 0 | u64 data section offset |
//! | Data section | pointer | `DNBE`, u64 end offset |
//! | Trailer size | end - 4 | u32 trailer size |
//! | Trailer | end - trailer size | `DNBF`, 12 reserved bytes, u32 page count, u32 directory offset |
//! | Directory | directory offset | `DNBS`, u32 flags, u32 entry count, 556-byte records |
//! | Entry header | record header offset | `DNBA` ... ciphertext after the embedded name |
//!
//! # Reading an archive
//!
//! ```rust,no_run
//! use dlst_crypto::AesKey;
//! use dlst_formats::dlst::{AccessMode, DlstArchive, DlstOptions};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let options = DlstOptions::new()
//!     .with_key(AesKey::from_file("work.key")?)
//!     .with_access(AccessMode::Mmap);
//! let archive = DlstArchive::open("work.dlst", options)?;
//!
//! for entry in archive.list_entries()? {
//!     println!("{} ({} bytes)", entry.name, entry.data_size);
//! }
//!
//! let data = archive.read("images/cover.jpg")?;
//! # let _ = data;
//! archive.close();
//! # Ok(())
//! # }
//! ```

mod archive;
mod entry;
mod error;
mod header;
mod iv_chain;
mod parser;
mod source;

pub use archive::{AccessMode, DlstArchive, DlstOptions, EntryReader};
pub use entry::DlstEntry;
pub use error::{DlstError, DlstResult, Section};
pub use header::{
    DATA_SECTION_MAGIC, DIRECTORY_MAGIC, DIRECTORY_RECORD_SIZE, DataSectionHeader,
    DirectoryHeader, DirectoryRecord, ENTRY_HEADER_SIZE, ENTRY_MAGIC, EntryHeader, TRAILER_MAGIC,
    Trailer,
};
pub use iv_chain::{ChainCache, IvChain};
pub use parser::parse_entries;
pub use source::{ByteSource, MmapSource, SeekSource};

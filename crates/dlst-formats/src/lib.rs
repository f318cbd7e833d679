//! Reader for DLST encrypted archive containers
//!
#![allow(clippy::cast_possible_truncation)] // Intentional for binary format parsing
#![allow(clippy::cast_lossless)] // Sometimes clearer than From
#![allow(clippy::uninlined_format_args)] // Backwards compatibility
#![allow(clippy::doc_markdown)] // Format-specific terms don't need backticks
#![allow(clippy::module_name_repetitions)] // Clear naming is preferred
#![allow(clippy::return_self_not_must_use)] // Builder patterns
//! This crate parses the DLST container layout (file section, trailer,
//! directory and per-entry headers) and decrypts entry data using the
//! per-entry chunk IV chain.
//!
//! # Supported Formats
//!
//! - **DLST**: Directory of AES-128-CBC encrypted entries, chunked for
//!   random access
//!
//! # Design Principles
//!
//! - **Parse Once**: The whole layout is validated when an archive is opened;
//!   a corrupt file never yields a partially usable archive
//! - **Positioned Reads**: Sources are read by offset, never through a shared
//!   cursor
//! - **Derive Once**: Chunk IVs are cached per entry and never recomputed

#![warn(missing_docs)]

/// DLST archive containers
///
/// Key features:
/// - **Eager Parsing**: Directory and entry headers validated at open time
/// - **Random Access**: Any chunk of any entry can be decrypted on its own
/// - **IV Chain Cache**: Per-entry, append-only, safe under concurrent reads
/// - **Memory Mapping**: Optional lock-free reads for path-based archives
///
/// See the [`dlst`] module for the layout and usage examples.
pub mod dlst;

pub use dlst::{DlstArchive, DlstEntry, DlstError, DlstOptions, DlstResult};

//! Error types for DLST archive operations

use std::fmt;

use thiserror::Error;

/// DLST operation result type
pub type DlstResult<T> = Result<T, DlstError>;

/// Section of the container layout, used to locate format errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    /// Data-section pointer at file offset 0
    Pointer,
    /// `DNBE` data section
    DataSection,
    /// `DNBF` trailer and its size field
    Trailer,
    /// `DNBS` directory and its records
    Directory,
    /// `DNBA` per-entry header
    EntryHeader,
    /// Entry ciphertext
    EntryData,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pointer => "file section pointer",
            Self::DataSection => "file section",
            Self::Trailer => "file trailer",
            Self::Directory => "archive directory",
            Self::EntryHeader => "archive entry",
            Self::EntryData => "entry data",
        };
        f.write_str(name)
    }
}

/// Error types for DLST archive operations
#[derive(Debug, Error)]
pub enum DlstError {
    /// A section did not start with its magic tag
    #[error("unsupported {section}: expected magic {:?}, got {:?}", MagicStr(.expected), MagicStr(.actual))]
    InvalidMagic {
        /// Section being parsed
        section: Section,
        /// Magic required at that position
        expected: [u8; 4],
        /// Bytes actually found
        actual: [u8; 4],
    },

    /// Offsets or sizes that do not fit the file
    #[error("invalid {section}: {reason}")]
    InvalidLayout {
        /// Section being parsed
        section: Section,
        /// Detailed description of the problem
        reason: String,
    },

    /// Entry header and directory disagree on the data size
    #[error("expected data size mismatch for {name}: directory says {directory}, entry header says {header}")]
    SizeMismatch {
        /// Entry name from the directory record
        name: String,
        /// Size from the directory record
        directory: u64,
        /// Size from the entry header
        header: u64,
    },

    /// No entry with the given name
    #[error("entry not found: {0}")]
    EntryNotFound(String),

    /// Decryption requested without a key
    #[error("cannot read encrypted files without AES key")]
    MissingKey,

    /// Offset outside the entry data
    #[error("offset {offset} out of range for entry of {size} bytes")]
    OffsetOutOfRange {
        /// Requested offset
        offset: u64,
        /// Entry data size
        size: u64,
    },

    /// Chunk index past the last chunk of an entry
    #[error("chunk {index} out of range for entry with {count} chunks")]
    ChunkOutOfRange {
        /// Requested chunk index
        index: u64,
        /// Number of chunks in the entry
        count: u64,
    },

    /// Archive used after `close`
    #[error("archive is closed")]
    Closed,

    /// Key material error
    #[error("crypto error: {0}")]
    Crypto(#[from] dlst_crypto::CryptoError),

    /// Binary parsing error
    #[error("binary parsing error: {0}")]
    BinRw(#[from] binrw::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DlstError {
    /// Check if this error means the container itself is corrupt or unsupported
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidMagic { .. }
                | Self::InvalidLayout { .. }
                | Self::SizeMismatch { .. }
                | Self::BinRw(_)
        )
    }

    /// Check if the caller can fix this error and retry
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::EntryNotFound(_) | Self::MissingKey)
    }

    pub(crate) fn layout(section: Section, reason: impl Into<String>) -> Self {
        Self::InvalidLayout {
            section,
            reason: reason.into(),
        }
    }
}

struct MagicStr<'a>(&'a [u8; 4]);

impl fmt::Debug for MagicStr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "b\"{}\"", self.0.escape_ascii())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_magic_message() {
        let err = DlstError::InvalidMagic {
            section: Section::Directory,
            expected: *b"DNBS",
            actual: *b"XX\0\x01",
        };
        assert_eq!(
            err.to_string(),
            r#"unsupported archive directory: expected magic b"DNBS", got b"XX\x00\x01""#
        );
        assert!(err.is_format_error());
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_error_classification() {
        assert!(DlstError::MissingKey.is_recoverable());
        assert!(DlstError::EntryNotFound("a".to_string()).is_recoverable());
        assert!(!DlstError::Closed.is_recoverable());
        assert!(
            DlstError::SizeMismatch {
                name: "a".to_string(),
                directory: 1,
                header: 2,
            }
            .is_format_error()
        );
        assert!(!DlstError::OffsetOutOfRange { offset: 4, size: 4 }.is_format_error());
    }
}

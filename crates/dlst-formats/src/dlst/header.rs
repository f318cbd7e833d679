//! DLST on-disk structures
//!
//! All integers are little-endian. Only the fields the reader needs are
//! named; the rest of each structure is skipped with padding.

use binrw::BinRead;

use super::error::{DlstError, DlstResult, Section};

/// Magic at the start of the data section
pub const DATA_SECTION_MAGIC: [u8; 4] = *b"DNBE";
/// Magic at the start of the trailer
pub const TRAILER_MAGIC: [u8; 4] = *b"DNBF";
/// Magic at the start of the directory
pub const DIRECTORY_MAGIC: [u8; 4] = *b"DNBS";
/// Magic at the start of every entry header
pub const ENTRY_MAGIC: [u8; 4] = *b"DNBA";

/// Size of the data-section header (magic + end offset)
pub const DATA_SECTION_SIZE: usize = 12;
/// Size of the trailer fields read by the parser
pub const TRAILER_SIZE: usize = 24;
/// Size of the directory header (magic + flags + count)
pub const DIRECTORY_HEADER_SIZE: usize = 12;
/// Size of one directory record
pub const DIRECTORY_RECORD_SIZE: usize = 556;
/// Size of a fixed entry header, before the embedded UTF-16 name
pub const ENTRY_HEADER_SIZE: usize = 36;
/// UTF-16 code units in a directory record name field
pub const RECORD_NAME_UNITS: usize = (DIRECTORY_RECORD_SIZE - 36) / 2;

fn check_magic(section: Section, expected: [u8; 4], actual: [u8; 4]) -> DlstResult<()> {
    if actual == expected {
        Ok(())
    } else {
        Err(DlstError::InvalidMagic {
            section,
            expected,
            actual,
        })
    }
}

/// Data section header: `DNBE` followed by the end offset
#[derive(Debug, Clone, PartialEq, Eq, BinRead)]
#[br(little)]
pub struct DataSectionHeader {
    /// Magic bytes: "DNBE"
    pub magic: [u8; 4],
    /// Offset just past the trailer
    pub end_offset: u64,
}

impl DataSectionHeader {
    /// Validate the magic tag
    pub fn validate(&self) -> DlstResult<()> {
        check_magic(Section::DataSection, DATA_SECTION_MAGIC, self.magic)
    }
}

/// File trailer
#[derive(Debug, Clone, PartialEq, Eq, BinRead)]
#[br(little)]
pub struct Trailer {
    /// Magic bytes: "DNBF"
    pub magic: [u8; 4],
    /// Page count, not used by the reader
    #[br(pad_before = 12)]
    pub page_count: u32,
    /// Offset of the directory
    pub directory_offset: u32,
}

impl Trailer {
    /// Validate the magic tag
    pub fn validate(&self) -> DlstResult<()> {
        check_magic(Section::Trailer, TRAILER_MAGIC, self.magic)
    }
}

/// Directory header, followed by `entry_count` records
#[derive(Debug, Clone, PartialEq, Eq, BinRead)]
#[br(little)]
pub struct DirectoryHeader {
    /// Magic bytes: "DNBS"
    pub magic: [u8; 4],
    /// Flags, not used by the reader
    pub flags: u32,
    /// Number of directory records
    pub entry_count: u32,
}

impl DirectoryHeader {
    /// Validate the magic tag
    pub fn validate(&self) -> DlstResult<()> {
        check_magic(Section::Directory, DIRECTORY_MAGIC, self.magic)
    }
}

/// Fixed-size directory record
#[derive(Debug, Clone, PartialEq, Eq, BinRead)]
#[br(little)]
pub struct DirectoryRecord {
    /// Entry data size
    #[br(pad_before = 12)]
    pub data_size: u64,
    /// Offset of the entry's `DNBA` header
    pub header_offset: u64,
    /// NUL-padded UTF-16 name
    #[br(pad_before = 8, count = RECORD_NAME_UNITS)]
    pub name: Vec<u16>,
}

impl DirectoryRecord {
    /// Decode the record name, dropping NUL padding
    ///
    /// Names are UTF-16LE unless they start with a byte-order mark; a
    /// swapped mark (`0xFFFE`) switches the rest of the name to big-endian.
    pub fn decode_name(&self) -> DlstResult<String> {
        let mut units = self.name.as_slice();
        while let [rest @ .., 0] = units {
            units = rest;
        }

        let decoded = match units {
            [0xFEFF, rest @ ..] => String::from_utf16(rest),
            [0xFFFE, rest @ ..] => {
                let swapped: Vec<u16> = rest.iter().map(|unit| unit.swap_bytes()).collect();
                String::from_utf16(&swapped)
            }
            _ => String::from_utf16(units),
        };
        decoded
            .map_err(|e| DlstError::layout(Section::Directory, format!("invalid entry name: {e}")))
    }
}

/// Entry header preceding each entry's ciphertext
#[derive(Debug, Clone, PartialEq, Eq, BinRead)]
#[br(little)]
pub struct EntryHeader {
    /// Magic bytes: "DNBA"
    pub magic: [u8; 4],
    /// Chunk size used for the IV chain (0 means a single chunk)
    #[br(pad_before = 4)]
    pub chunk_size: u32,
    /// Data size, must match the directory record
    #[br(pad_before = 12)]
    pub data_size: u32,
    /// Length of the embedded name in UTF-16 code units
    #[br(pad_before = 4)]
    pub name_length: u32,
}

impl EntryHeader {
    /// Validate the magic tag
    pub fn validate(&self) -> DlstResult<()> {
        check_magic(Section::EntryHeader, ENTRY_MAGIC, self.magic)
    }

    /// Offset of the ciphertext relative to the header start
    pub fn data_offset(&self) -> u64 {
        ENTRY_HEADER_SIZE as u64 + u64::from(self.name_length) * 2
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use binrw::io::Cursor;

    fn record_bytes(name: &str, data_size: u64, header_offset: u64) -> Vec<u8> {
        let mut bytes = vec![0u8; DIRECTORY_RECORD_SIZE];
        bytes[12..20].copy_from_slice(&data_size.to_le_bytes());
        bytes[20..28].copy_from_slice(&header_offset.to_le_bytes());
        for (i, unit) in name.encode_utf16().enumerate() {
            bytes[36 + i * 2..38 + i * 2].copy_from_slice(&unit.to_le_bytes());
        }
        bytes
    }

    #[test]
    fn test_data_section_header() {
        let mut bytes = b"DNBE".to_vec();
        bytes.extend_from_slice(&0x1234u64.to_le_bytes());

        let header = DataSectionHeader::read(&mut Cursor::new(&bytes)).unwrap();
        assert_eq!(header.end_offset, 0x1234);
        assert!(header.validate().is_ok());
    }

    #[test]
    fn test_trailer_skips_reserved_bytes() {
        let mut bytes = b"DNBF".to_vec();
        bytes.extend_from_slice(&[0xFF; 12]);
        bytes.extend_from_slice(&7u32.to_le_bytes());
        bytes.extend_from_slice(&0x400u32.to_le_bytes());
        assert_eq!(bytes.len(), TRAILER_SIZE);

        let trailer = Trailer::read(&mut Cursor::new(&bytes)).unwrap();
        assert_eq!(trailer.page_count, 7);
        assert_eq!(trailer.directory_offset, 0x400);
        assert!(trailer.validate().is_ok());
    }

    #[test]
    fn test_invalid_magic_reports_section() {
        let header = DirectoryHeader {
            magic: *b"DNBX",
            flags: 0,
            entry_count: 0,
        };
        match header.validate() {
            Err(DlstError::InvalidMagic {
                section, actual, ..
            }) => {
                assert_eq!(section, Section::Directory);
                assert_eq!(&actual, b"DNBX");
            }
            other => panic!("expected InvalidMagic, got {other:?}"),
        }
    }

    #[test]
    fn test_directory_record() {
        let bytes = record_bytes("audio/track 01.mp3", 4096, 0x80);
        let record = DirectoryRecord::read(&mut Cursor::new(&bytes)).unwrap();

        assert_eq!(record.data_size, 4096);
        assert_eq!(record.header_offset, 0x80);
        assert_eq!(record.name.len(), RECORD_NAME_UNITS);
        assert_eq!(record.decode_name().unwrap(), "audio/track 01.mp3");
    }

    #[test]
    fn test_record_name_non_ascii() {
        let bytes = record_bytes("音声/トラック.wav", 1, 0);
        let record = DirectoryRecord::read(&mut Cursor::new(&bytes)).unwrap();
        assert_eq!(record.decode_name().unwrap(), "音声/トラック.wav");
    }

    #[test]
    fn test_record_name_strips_bom() {
        let bytes = record_bytes("\u{FEFF}a.txt", 1, 0);
        let record = DirectoryRecord::read(&mut Cursor::new(&bytes)).unwrap();
        assert_eq!(record.decode_name().unwrap(), "a.txt");
    }

    #[test]
    fn test_record_name_big_endian_bom() {
        let mut bytes = record_bytes("", 1, 0);
        let units = std::iter::once(0xFEFF).chain("bé/名.txt".encode_utf16());
        for (i, unit) in units.enumerate() {
            bytes[36 + i * 2..38 + i * 2].copy_from_slice(&unit.to_be_bytes());
        }

        let record = DirectoryRecord::read(&mut Cursor::new(&bytes)).unwrap();
        assert_eq!(record.name[0], 0xFFFE);
        assert_eq!(record.decode_name().unwrap(), "bé/名.txt");
    }

    #[test]
    fn test_record_name_invalid_utf16() {
        let mut bytes = record_bytes("", 1, 0);
        bytes[36..38].copy_from_slice(&0xD800u16.to_le_bytes());
        bytes[38..40].copy_from_slice(&0x0041u16.to_le_bytes());

        let record = DirectoryRecord::read(&mut Cursor::new(&bytes)).unwrap();
        assert!(matches!(
            record.decode_name(),
            Err(DlstError::InvalidLayout {
                section: Section::Directory,
                ..
            })
        ));
    }

    #[test]
    fn test_entry_header() {
        let mut bytes = vec![0u8; ENTRY_HEADER_SIZE];
        bytes[..4].copy_from_slice(b"DNBA");
        bytes[8..12].copy_from_slice(&0x1000u32.to_le_bytes());
        bytes[24..28].copy_from_slice(&0x2345u32.to_le_bytes());
        bytes[32..36].copy_from_slice(&5u32.to_le_bytes());

        let header = EntryHeader::read(&mut Cursor::new(&bytes)).unwrap();
        assert!(header.validate().is_ok());
        assert_eq!(header.chunk_size, 0x1000);
        assert_eq!(header.data_size, 0x2345);
        assert_eq!(header.name_length, 5);
        assert_eq!(header.data_offset(), 36 + 10);
    }
}

//! Container layout parsing
//!
//! ```text
//! 0                 u64 data section offset
//! data section      "DNBE" u64 end_offset
//! end_offset - 4    u32 trailer_size
//! end - trailer     "DNBF" [12] u32 page_count u32 directory_offset
//! directory         "DNBS" u32 flags u32 entry_count, entry_count x 556-byte records
//! header_offset     "DNBA" ... ciphertext at header_offset + 36 + name_length * 2
//! ```

use binrw::BinRead;
use binrw::io::Cursor;
use tracing::debug;

use super::entry::DlstEntry;
use super::error::{DlstError, DlstResult, Section};
use super::header::{
    DATA_SECTION_SIZE, DIRECTORY_HEADER_SIZE, DIRECTORY_RECORD_SIZE, DataSectionHeader,
    DirectoryHeader, DirectoryRecord, ENTRY_HEADER_SIZE, EntryHeader, TRAILER_SIZE, Trailer,
};
use super::source::ByteSource;

/// Parse every section of the container into entry descriptors
///
/// Entries are returned in directory order. Nothing is returned unless the
/// whole layout is valid.
pub fn parse_entries(source: &dyn ByteSource) -> DlstResult<Vec<DlstEntry>> {
    let pointer = read_section(source, Section::Pointer, 0, 8)?;
    let data_offset = u64::read_le(&mut Cursor::new(&pointer))?;

    let data_section = DataSectionHeader::read(&mut Cursor::new(read_section(
        source,
        Section::DataSection,
        data_offset,
        DATA_SECTION_SIZE,
    )?))?;
    data_section.validate()?;
    let end_offset = data_section.end_offset;

    let directory_offset = parse_trailer(source, end_offset)?;
    debug!(
        data_offset,
        end_offset, directory_offset, "parsed DLST file section and trailer"
    );

    parse_directory(source, u64::from(directory_offset))
}

fn parse_trailer(source: &dyn ByteSource, end_offset: u64) -> DlstResult<u32> {
    let size_offset = end_offset.checked_sub(4).ok_or_else(|| {
        DlstError::layout(Section::Trailer, format!("end offset {end_offset} too small"))
    })?;
    let size_field = read_section(source, Section::Trailer, size_offset, 4)?;
    let trailer_size = u32::read_le(&mut Cursor::new(&size_field))?;

    let trailer_offset = end_offset
        .checked_sub(u64::from(trailer_size))
        .ok_or_else(|| {
            DlstError::layout(
                Section::Trailer,
                format!("trailer size {trailer_size} exceeds end offset {end_offset}"),
            )
        })?;

    let trailer = Trailer::read(&mut Cursor::new(read_section(
        source,
        Section::Trailer,
        trailer_offset,
        TRAILER_SIZE,
    )?))?;
    trailer.validate()?;
    Ok(trailer.directory_offset)
}

fn parse_directory(source: &dyn ByteSource, offset: u64) -> DlstResult<Vec<DlstEntry>> {
    let header = DirectoryHeader::read(&mut Cursor::new(read_section(
        source,
        Section::Directory,
        offset,
        DIRECTORY_HEADER_SIZE,
    )?))?;
    header.validate()?;

    let records_len = usize::try_from(header.entry_count)
        .ok()
        .and_then(|count| count.checked_mul(DIRECTORY_RECORD_SIZE))
        .ok_or_else(|| {
            DlstError::layout(
                Section::Directory,
                format!("entry count {} too large", header.entry_count),
            )
        })?;
    let records = read_section(
        source,
        Section::Directory,
        offset + DIRECTORY_HEADER_SIZE as u64,
        records_len,
    )?;

    let mut cursor = Cursor::new(records);
    let mut entries = Vec::with_capacity(header.entry_count as usize);
    for index in 0..header.entry_count as usize {
        let record = DirectoryRecord::read(&mut cursor)?;
        entries.push(parse_entry(source, index, &record)?);
    }

    debug!(
        entries = entries.len(),
        flags = header.flags,
        "parsed DLST directory"
    );
    Ok(entries)
}

fn parse_entry(
    source: &dyn ByteSource,
    index: usize,
    record: &DirectoryRecord,
) -> DlstResult<DlstEntry> {
    let name = record.decode_name()?;
    let header = EntryHeader::read(&mut Cursor::new(read_section(
        source,
        Section::EntryHeader,
        record.header_offset,
        ENTRY_HEADER_SIZE,
    )?))?;
    header.validate()?;

    if u64::from(header.data_size) != record.data_size {
        return Err(DlstError::SizeMismatch {
            name,
            directory: record.data_size,
            header: u64::from(header.data_size),
        });
    }

    let offset = record
        .header_offset
        .checked_add(header.data_offset())
        .filter(|start| {
            start
                .checked_add(record.data_size)
                .is_some_and(|end| end <= source.len())
        })
        .ok_or_else(|| {
            DlstError::layout(
                Section::EntryData,
                format!(
                    "{name}: {} bytes at header offset {} past end of file",
                    record.data_size, record.header_offset
                ),
            )
        })?;

    Ok(DlstEntry {
        index,
        name,
        offset,
        data_size: record.data_size,
        chunk_size: header.chunk_size,
    })
}

/// Read `len` bytes of `section`, failing with a layout error when the range
/// does not fit inside the source
fn read_section(
    source: &dyn ByteSource,
    section: Section,
    offset: u64,
    len: usize,
) -> DlstResult<Vec<u8>> {
    let fits = offset
        .checked_add(len as u64)
        .is_some_and(|end| end <= source.len());
    if !fits {
        return Err(DlstError::layout(
            section,
            format!(
                "{len} bytes at offset {offset} past end of {} byte file",
                source.len()
            ),
        ));
    }
    Ok(source.read_at(offset, len)?)
}

//! Synthetic DLST archive writer for integration tests

#![allow(dead_code)]

use dlst_crypto::{AesKey, CtCipher, Iv};

pub const KEY_HEX: &str = "06a9214036b8a15b512e03d534120006";
pub const IV_HEX: &str = "3dafba429d9eb430b422da802c9fac41";

pub fn test_key() -> AesKey {
    AesKey::from_hex(KEY_HEX).unwrap()
}

pub fn test_iv() -> Iv {
    Iv::from_hex(IV_HEX).unwrap()
}

/// Deterministic, non-repeating plaintext
pub fn pattern(len: usize, seed: u8) -> Vec<u8> {
    (0..len)
        .map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed) ^ (i >> 8) as u8)
        .collect()
}

#[derive(Debug, Clone)]
pub struct TestEntry {
    pub name: String,
    pub plaintext: Vec<u8>,
    pub chunk_size: u32,
}

impl TestEntry {
    pub fn new(name: &str, plaintext: Vec<u8>, chunk_size: u32) -> Self {
        Self {
            name: name.to_string(),
            plaintext,
            chunk_size,
        }
    }
}

/// Archive bytes plus the offsets tests need to corrupt specific sections
#[derive(Debug, Clone)]
pub struct BuiltArchive {
    pub bytes: Vec<u8>,
    pub data_section_offset: u64,
    pub end_offset: u64,
    pub trailer_offset: u64,
    pub directory_offset: u64,
    pub header_offsets: Vec<u64>,
}

impl BuiltArchive {
    pub fn corrupt(mut self, offset: u64, bytes: &[u8]) -> Self {
        let start = offset as usize;
        self.bytes[start..start + bytes.len()].copy_from_slice(bytes);
        self
    }
}

/// Encrypt `plaintext` chunk by chunk the way archive producers do
pub fn encrypt_entry(cipher: &CtCipher, base_iv: &Iv, plaintext: &[u8], chunk_size: u32) -> Vec<u8> {
    if plaintext.is_empty() {
        return Vec::new();
    }
    let step = if chunk_size == 0 {
        plaintext.len()
    } else {
        chunk_size as usize
    };

    let mut iv = *base_iv;
    let mut ciphertext = Vec::with_capacity(plaintext.len());
    for chunk in plaintext.chunks(step) {
        iv = cipher.derive_next_iv(&iv);
        ciphertext.extend_from_slice(&cipher.encrypt(chunk, Some(&iv)));
    }
    ciphertext
}

fn push_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn push_u64(out: &mut Vec<u8>, value: u64) {
    out.extend_from_slice(&value.to_le_bytes());
}

/// Write a complete archive holding `entries`
pub fn build_archive(key: &AesKey, base_iv: &Iv, entries: &[TestEntry]) -> BuiltArchive {
    let cipher = CtCipher::new(*key);
    let mut out = Vec::new();

    // Pointer, then the data section at 16
    let data_section_offset = 16u64;
    push_u64(&mut out, data_section_offset);
    out.resize(16, 0);
    out.extend_from_slice(b"DNBE");
    let end_offset_pos = out.len();
    push_u64(&mut out, 0);
    out.resize(32, 0);

    // Entry headers, embedded names and ciphertext
    let mut header_offsets = Vec::with_capacity(entries.len());
    for entry in entries {
        header_offsets.push(out.len() as u64);
        let name: Vec<u16> = entry.name.encode_utf16().collect();

        out.extend_from_slice(b"DNBA");
        push_u32(&mut out, 0);
        push_u32(&mut out, entry.chunk_size);
        out.extend_from_slice(&[0u8; 12]);
        push_u32(&mut out, entry.plaintext.len() as u32);
        push_u32(&mut out, 0);
        push_u32(&mut out, name.len() as u32);
        for unit in &name {
            out.extend_from_slice(&unit.to_le_bytes());
        }
        out.extend_from_slice(&encrypt_entry(
            &cipher,
            base_iv,
            &entry.plaintext,
            entry.chunk_size,
        ));
    }

    // Directory
    let directory_offset = out.len() as u64;
    out.extend_from_slice(b"DNBS");
    push_u32(&mut out, 0x1);
    push_u32(&mut out, entries.len() as u32);
    for (entry, header_offset) in entries.iter().zip(&header_offsets) {
        let mut record = vec![0u8; 556];
        record[12..20].copy_from_slice(&(entry.plaintext.len() as u64).to_le_bytes());
        record[20..28].copy_from_slice(&header_offset.to_le_bytes());
        for (i, unit) in entry.name.encode_utf16().enumerate() {
            record[36 + i * 2..38 + i * 2].copy_from_slice(&unit.to_le_bytes());
        }
        out.extend_from_slice(&record);
    }

    // Trailer, ending with its own size
    let trailer_offset = out.len() as u64;
    out.extend_from_slice(b"DNBF");
    out.extend_from_slice(&[0xEE; 12]);
    push_u32(&mut out, 1);
    push_u32(&mut out, directory_offset as u32);
    let trailer_size = (out.len() as u64 - trailer_offset + 4) as u32;
    push_u32(&mut out, trailer_size);

    let end_offset = out.len() as u64;
    out[end_offset_pos..end_offset_pos + 8].copy_from_slice(&end_offset.to_le_bytes());

    BuiltArchive {
        bytes: out,
        data_section_offset,
        end_offset,
        trailer_offset,
        directory_offset,
        header_offsets,
    }
}

/// The entry set most tests use
pub fn sample_entries() -> Vec<TestEntry> {
    vec![
        TestEntry::new("images/001.jpg", pattern(1000, 1), 128),
        TestEntry::new("audio/track.mp3", pattern(130, 2), 48),
        TestEntry::new("readme.txt", pattern(77, 3), 0),
        TestEntry::new("empty.bin", Vec::new(), 64),
        TestEntry::new("作品/表紙.png", pattern(256, 4), 64),
    ]
}

pub fn sample_archive() -> BuiltArchive {
    build_archive(&test_key(), &test_iv(), &sample_entries())
}

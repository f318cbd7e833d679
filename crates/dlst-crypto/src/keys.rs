//! AES key and IV material
//!
//! DLST archives are keyed with a single AES-128 key and an archive-wide base
//! IV. Both are 16 bytes and usually travel as hex strings or small key files.

use std::fmt;
use std::path::Path;

use crate::error::CryptoError;

/// AES-128 key and block size in bytes
pub const KEY_SIZE: usize = 16;

/// CBC initialization vector size in bytes
pub const IV_SIZE: usize = 16;

/// A 128-bit AES key
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct AesKey([u8; KEY_SIZE]);

impl AesKey {
    /// Create a key from raw bytes
    pub const fn new(key: [u8; KEY_SIZE]) -> Self {
        Self(key)
    }

    /// Create a key from a slice, which must be exactly 16 bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let key: [u8; KEY_SIZE] = bytes.try_into().map_err(|_| CryptoError::InvalidKeySize {
            expected: KEY_SIZE,
            actual: bytes.len(),
        })?;
        Ok(Self(key))
    }

    /// Parse key from hex string
    pub fn from_hex(hex: &str) -> Result<Self, CryptoError> {
        let bytes = decode_hex(hex)?;
        Self::from_slice(&bytes)
    }

    /// Load a key file
    ///
    /// A file of exactly 16 bytes is taken as the raw key. Anything else is
    /// read as text holding the key in hex; surrounding whitespace and inner
    /// spaces are ignored.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CryptoError> {
        let contents = std::fs::read(path.as_ref())?;
        if contents.len() == KEY_SIZE {
            return Self::from_slice(&contents);
        }

        let text = std::str::from_utf8(&contents)
            .map_err(|e| CryptoError::InvalidKeyFormat(format!("key file is not text: {e}")))?;
        Self::from_hex(text)
    }

    /// Raw key bytes
    pub const fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl fmt::Debug for AesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AesKey(<redacted>)")
    }
}

impl From<[u8; KEY_SIZE]> for AesKey {
    fn from(key: [u8; KEY_SIZE]) -> Self {
        Self(key)
    }
}

/// A 128-bit CBC initialization vector
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Iv([u8; IV_SIZE]);

impl Iv {
    /// The all-zero IV used when none is supplied
    pub const ZERO: Self = Self([0; IV_SIZE]);

    /// Create an IV from raw bytes
    pub const fn new(iv: [u8; IV_SIZE]) -> Self {
        Self(iv)
    }

    /// Create an IV from a slice, which must be exactly 16 bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let iv: [u8; IV_SIZE] = bytes.try_into().map_err(|_| CryptoError::InvalidIvSize {
            expected: IV_SIZE,
            actual: bytes.len(),
        })?;
        Ok(Self(iv))
    }

    /// Parse IV from hex string
    pub fn from_hex(hex: &str) -> Result<Self, CryptoError> {
        let bytes = decode_hex(hex)?;
        Self::from_slice(&bytes)
    }

    /// Raw IV bytes
    pub const fn as_bytes(&self) -> &[u8; IV_SIZE] {
        &self.0
    }
}

impl fmt::Display for Iv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl From<[u8; IV_SIZE]> for Iv {
    fn from(iv: [u8; IV_SIZE]) -> Self {
        Self(iv)
    }
}

fn decode_hex(hex: &str) -> Result<Vec<u8>, CryptoError> {
    let compact: String = hex.split_whitespace().collect();
    let compact = compact
        .strip_prefix("0x")
        .or_else(|| compact.strip_prefix("0X"))
        .unwrap_or(compact.as_str());
    hex::decode(compact).map_err(|e| CryptoError::InvalidKeyFormat(format!("invalid hex: {e}")))
}

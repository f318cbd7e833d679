//! Cryptographic operations for DLST archives
//!
//! DLST payloads are encrypted with AES-128 in CBC mode. Each entry is split
//! into chunks, and every chunk has its own IV taken from a chain that starts
//! at the archive base IV and re-encrypts the previous value once per chunk.
//!
//! # Components
//!
//! - [`CtCipher`]: AES-128-CBC over arbitrary-length data, plus the
//!   single-block chain step ([`CtCipher::derive_next_iv`])
//! - [`AesKey`] / [`Iv`]: 16-byte key material, parsed from hex or key files
//!
//! # Examples
//!
//! ```
//! use dlst_crypto::{AesKey, CtCipher, Iv};
//!
//! let key = AesKey::from_hex("06a9214036b8a15b512e03d534120006")?;
//! let iv = Iv::from_hex("3dafba429d9eb430b422da802c9fac41")?;
//! let cipher = CtCipher::new(key);
//!
//! let ciphertext = cipher.encrypt(b"Single block msg", Some(&iv));
//! assert_eq!(cipher.decrypt(&ciphertext, Some(&iv)), b"Single block msg");
//!
//! // Chain IVs for chunk 0 and chunk 1 of an entry
//! let first = cipher.derive_next_iv(&Iv::ZERO);
//! let second = cipher.derive_next_iv(&first);
//! assert_ne!(first, second);
//! # Ok::<(), dlst_crypto::CryptoError>(())
//! ```

#![warn(missing_docs)]

pub mod ctcrypt;
pub mod error;
pub mod keys;

pub use error::CryptoError;

// Re-export commonly used types
pub use ctcrypt::{BLOCK_SIZE, CtCipher};
pub use keys::{AesKey, IV_SIZE, Iv, KEY_SIZE};

//! AES-128-CBC cipher used by DLST archives
//!
//! Every full 16-byte block is processed with plain CBC. A trailing partial
//! block is masked with the encryption of the last ciphertext block (or the
//! IV when the input is shorter than one block), so output length always
//! equals input length and `decrypt(encrypt(x)) == x` for any input.
//!
//! Block-aligned inputs, which includes every chain IV and the payload chunks
//! written by the archive producer, are plain CBC with no extra block.
//!
//! The partial-block tail is not compatible with readers that PKCS7-pad,
//! run CBC and truncate: those produce different bytes for the last
//! `len % 16` bytes of a chunk. Only chunk tails shorter than a block are
//! affected; every full block decrypts identically.

use aes::Aes128;
use cipher::generic_array::GenericArray;
use cipher::{BlockDecryptMut, BlockEncrypt, BlockEncryptMut, KeyInit, KeyIvInit};
use std::fmt;

use crate::keys::{AesKey, IV_SIZE, Iv};

type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;

/// AES block size in bytes
pub const BLOCK_SIZE: usize = 16;

/// AES-128-CBC cipher bound to one key
#[derive(Clone)]
pub struct CtCipher {
    key: AesKey,
    block: Aes128,
}

impl CtCipher {
    /// Create a cipher for `key`
    pub fn new(key: AesKey) -> Self {
        let block = Aes128::new(key.as_bytes().into());
        Self { key, block }
    }

    /// CBC encrypt `data`, using the all-zero IV when `iv` is `None`
    pub fn encrypt(&self, data: &[u8], iv: Option<&Iv>) -> Vec<u8> {
        let iv = iv.copied().unwrap_or_default();
        let mut output = data.to_vec();
        let aligned = aligned_len(output.len());

        let (body, tail) = output.split_at_mut(aligned);
        let mut encryptor = Aes128CbcEnc::new(self.key.as_bytes().into(), iv.as_bytes().into());
        for block in body.chunks_exact_mut(BLOCK_SIZE) {
            encryptor.encrypt_block_mut(GenericArray::from_mut_slice(block));
        }

        let chain = last_block(body, &iv);
        self.mask_tail(&chain, tail);
        output
    }

    /// CBC decrypt `data`, using the all-zero IV when `iv` is `None`
    pub fn decrypt(&self, data: &[u8], iv: Option<&Iv>) -> Vec<u8> {
        let iv = iv.copied().unwrap_or_default();
        let aligned = aligned_len(data.len());
        // The tail mask comes from the last ciphertext block, so capture it
        // before the body is decrypted in place.
        let chain = last_block(&data[..aligned], &iv);

        let mut output = data.to_vec();
        let (body, tail) = output.split_at_mut(aligned);
        let mut decryptor = Aes128CbcDec::new(self.key.as_bytes().into(), iv.as_bytes().into());
        for block in body.chunks_exact_mut(BLOCK_SIZE) {
            decryptor.decrypt_block_mut(GenericArray::from_mut_slice(block));
        }

        self.mask_tail(&chain, tail);
        output
    }

    /// Decrypt one payload chunk with its chain IV
    pub fn decrypt_chunk(&self, ciphertext: &[u8], iv: &Iv) -> Vec<u8> {
        self.decrypt(ciphertext, Some(iv))
    }

    /// Derive the chain IV that follows `iv`
    ///
    /// This is a one-block encryption of `iv` under the all-zero IV, which
    /// reduces to AES-ECB of `iv`. The zero IV matches what archive
    /// producers use and must not be replaced with the archive IV.
    pub fn derive_next_iv(&self, iv: &Iv) -> Iv {
        let encrypted = self.encrypt(iv.as_bytes(), None);
        let mut next = [0u8; IV_SIZE];
        next.copy_from_slice(&encrypted[..IV_SIZE]);
        Iv::new(next)
    }

    fn mask_tail(&self, chain: &[u8; BLOCK_SIZE], tail: &mut [u8]) {
        if tail.is_empty() {
            return;
        }

        let mut keystream = GenericArray::clone_from_slice(chain);
        self.block.encrypt_block(&mut keystream);
        for (byte, mask) in tail.iter_mut().zip(keystream.iter()) {
            *byte ^= mask;
        }
    }
}

impl fmt::Debug for CtCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CtCipher").field("key", &self.key).finish()
    }
}

const fn aligned_len(len: usize) -> usize {
    len - len % BLOCK_SIZE
}

fn last_block(body: &[u8], iv: &Iv) -> [u8; BLOCK_SIZE] {
    let mut block = *iv.as_bytes();
    if body.len() >= BLOCK_SIZE {
        block.copy_from_slice(&body[body.len() - BLOCK_SIZE..]);
    }
    block
}

// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Legacy CBC + HMAC record sessions (MAC-then-encrypt).
//!
//! Unlike the AEAD contexts, a CBC session is stateful and direction-locked:
//! the IV for each record is the last ciphertext block of the previous one,
//! so records must be processed in order and a session is either a
//! [`CbcHmacSealer`] or a [`CbcHmacOpener`], never both. Concurrent use of
//! one session is not supported; use one session per direction.
//!
//! Open strips padding and extracts the MAC with the constant-time helpers
//! from [`crate::record`]. The MAC recomputation itself hashes only the
//! unpadded bytes; transports that need the full Lucky13 defense recompute
//! via [`crate::record::record_digest`] instead.


use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use aes::{Aes128, Aes256};
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::Sha256;
use zeroize::Zeroize;

use crate::ctutil::ct_bytes_eq;
use crate::error::AeadError;
use crate::record::{extract_mac, remove_padding};

pub use crate::record::RecordDigestAlg;

const BLOCK_SIZE: usize = 16;
const MAX_MAC: usize = 32;

/// Block cipher underlying a CBC session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CbcCipher {
    Aes128,
    Aes256,
}

impl CbcCipher {
    pub const fn key_size(self) -> usize {
        match self {
            CbcCipher::Aes128 => 16,
            CbcCipher::Aes256 => 32,
        }
    }
}

enum CipherState {
    Aes128(Aes128),
    Aes256(Aes256),
}

impl CipherState {
    fn init(cipher: CbcCipher, key: &[u8]) -> Result<Self, AeadError> {
        match cipher {
            CbcCipher::Aes128 => Aes128::new_from_slice(key)
                .map(CipherState::Aes128)
                .map_err(|_| AeadError::InvalidKeySize),
            CbcCipher::Aes256 => Aes256::new_from_slice(key)
                .map(CipherState::Aes256)
                .map_err(|_| AeadError::InvalidKeySize),
        }
    }

    fn encrypt_block(&self, block: &mut [u8]) {
        let block = GenericArray::from_mut_slice(block);
        match self {
            CipherState::Aes128(cipher) => cipher.encrypt_block(block),
            CipherState::Aes256(cipher) => cipher.encrypt_block(block),
        }
    }

    fn decrypt_block(&self, block: &mut [u8]) {
        let block = GenericArray::from_mut_slice(block);
        match self {
            CipherState::Aes128(cipher) => cipher.decrypt_block(block),
            CipherState::Aes256(cipher) => cipher.decrypt_block(block),
        }
    }
}

enum RecordMac {
    Sha1(Hmac<Sha1>),
    Sha256(Hmac<Sha256>),
}

impl RecordMac {
    fn init(alg: RecordDigestAlg, mac_key: &[u8]) -> Self {
        // Qualified: `KeyInit` is in scope for the block ciphers and also
        // offers a `new_from_slice`.
        match alg {
            RecordDigestAlg::Sha1 => RecordMac::Sha1(
                <Hmac<Sha1> as Mac>::new_from_slice(mac_key)
                    .expect("infallible: HMAC accepts any key length"),
            ),
            RecordDigestAlg::Sha256 => RecordMac::Sha256(
                <Hmac<Sha256> as Mac>::new_from_slice(mac_key)
                    .expect("infallible: HMAC accepts any key length"),
            ),
        }
    }

    fn mac_len(&self) -> usize {
        match self {
            RecordMac::Sha1(_) => 20,
            RecordMac::Sha256(_) => 32,
        }
    }

    fn compute(&self, aad: &[u8], data: &[u8]) -> ([u8; MAX_MAC], usize) {
        let mut out = [0u8; MAX_MAC];
        let len = match self {
            RecordMac::Sha1(mac) => {
                let mut mac = mac.clone();
                mac.update(aad);
                mac.update(data);
                let tag = mac.finalize().into_bytes();
                out[..tag.len()].copy_from_slice(&tag);
                tag.len()
            }
            RecordMac::Sha256(mac) => {
                let mut mac = mac.clone();
                mac.update(aad);
                mac.update(data);
                let tag = mac.finalize().into_bytes();
                out[..tag.len()].copy_from_slice(&tag);
                tag.len()
            }
        };
        (out, len)
    }
}

struct CbcHmacCore {
    cipher: CipherState,
    mac: RecordMac,
    iv: [u8; BLOCK_SIZE],
}

impl CbcHmacCore {
    fn init(
        cipher: CbcCipher,
        digest: RecordDigestAlg,
        key: &[u8],
        mac_key: &[u8],
        iv: &[u8; BLOCK_SIZE],
    ) -> Result<Self, AeadError> {
        Ok(Self {
            cipher: CipherState::init(cipher, key)?,
            mac: RecordMac::init(digest, mac_key),
            iv: *iv,
        })
    }

    /// Encrypt in place, chaining the running IV; the last ciphertext block
    /// becomes the IV for the next record.
    fn cbc_encrypt(&mut self, data: &mut [u8]) {
        debug_assert_eq!(data.len() % BLOCK_SIZE, 0);
        for block in data.chunks_exact_mut(BLOCK_SIZE) {
            for (b, v) in block.iter_mut().zip(self.iv.iter()) {
                *b ^= v;
            }
            self.cipher.encrypt_block(block);
            self.iv.copy_from_slice(block);
        }
    }

    fn cbc_decrypt(&mut self, data: &mut [u8]) {
        debug_assert_eq!(data.len() % BLOCK_SIZE, 0);
        let mut prev = self.iv;
        for block in data.chunks_exact_mut(BLOCK_SIZE) {
            let mut saved = [0u8; BLOCK_SIZE];
            saved.copy_from_slice(block);
            self.cipher.decrypt_block(block);
            for (b, v) in block.iter_mut().zip(prev.iter()) {
                *b ^= v;
            }
            prev = saved;
        }
        self.iv = prev;
        prev.zeroize();
    }

    fn seal(&mut self, aad: &[u8], record: &mut Vec<u8>) -> Result<(), AeadError> {
        let (mac, mac_len) = self.mac.compute(aad, record);
        record.extend_from_slice(&mac[..mac_len]);

        // TLS padding: pad_total bytes, each holding pad_total - 1.
        let pad_total = BLOCK_SIZE - record.len() % BLOCK_SIZE;
        record.extend(core::iter::repeat_n((pad_total - 1) as u8, pad_total));

        self.cbc_encrypt(record);
        Ok(())
    }

    fn open(&mut self, aad: &[u8], record: &mut [u8]) -> Result<usize, AeadError> {
        let mac_len = self.mac.mac_len();
        if record.is_empty() || record.len() % BLOCK_SIZE != 0 || record.len() < mac_len + 1 {
            return Err(AeadError::InvalidRecordLength);
        }

        self.cbc_decrypt(record);

        let (pad_ok, data_plus_mac_len) = remove_padding(record, BLOCK_SIZE, mac_len);
        let plaintext_len = data_plus_mac_len - mac_len;

        let mut received = [0u8; MAX_MAC];
        extract_mac(&mut received[..mac_len], record, data_plus_mac_len);

        let (mut expected, _) = self.mac.compute(aad, &record[..plaintext_len]);
        let ok = bool::from(pad_ok) & ct_bytes_eq(&expected[..mac_len], &received[..mac_len]);
        expected.zeroize();
        received.zeroize();

        if !ok {
            record.zeroize();
            return Err(AeadError::AuthenticationFailed);
        }

        Ok(plaintext_len)
    }
}

impl Drop for CbcHmacCore {
    fn drop(&mut self) {
        self.iv.zeroize();
    }
}

/// Seal-only CBC + HMAC session.
pub struct CbcHmacSealer {
    core: CbcHmacCore,
}

impl CbcHmacSealer {
    pub fn init(
        cipher: CbcCipher,
        digest: RecordDigestAlg,
        key: &[u8],
        mac_key: &[u8],
        iv: &[u8; BLOCK_SIZE],
    ) -> Result<Self, AeadError> {
        Ok(Self {
            core: CbcHmacCore::init(cipher, digest, key, mac_key, iv)?,
        })
    }

    /// MAC, pad and encrypt `record` in place; on return it holds the full
    /// ciphertext. Records sealed on one session must be opened in the same
    /// order.
    pub fn seal(&mut self, aad: &[u8], record: &mut Vec<u8>) -> Result<(), AeadError> {
        self.core.seal(aad, record)
    }

    /// Worst-case growth of a sealed record: MAC plus a full padding block.
    pub fn max_overhead(&self) -> usize {
        self.core.mac.mac_len() + BLOCK_SIZE
    }
}

/// Open-only CBC + HMAC session.
pub struct CbcHmacOpener {
    core: CbcHmacCore,
}

impl CbcHmacOpener {
    pub fn init(
        cipher: CbcCipher,
        digest: RecordDigestAlg,
        key: &[u8],
        mac_key: &[u8],
        iv: &[u8; BLOCK_SIZE],
    ) -> Result<Self, AeadError> {
        Ok(Self {
            core: CbcHmacCore::init(cipher, digest, key, mac_key, iv)?,
        })
    }

    /// Decrypt and verify a record in place, returning the plaintext length;
    /// `record[..len]` is the plaintext. On authentication failure the whole
    /// buffer is zeroized.
    pub fn open(&mut self, aad: &[u8], record: &mut [u8]) -> Result<usize, AeadError> {
        self.core.open(aad, record)
    }
}

impl core::fmt::Debug for CbcHmacSealer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "CbcHmacSealer {{ [protected] }}")
    }
}

impl core::fmt::Debug for CbcHmacOpener {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "CbcHmacOpener {{ [protected] }}")
    }
}

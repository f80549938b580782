// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! ChaCha20-Poly1305 AEAD (RFC 8439).
//!
//! The Poly1305 one-time key is the first 32 bytes of the keystream at block
//! counter 0; the message keystream starts at counter 1. The optional trailer
//! is a short opaque suffix encrypted by continuing the keystream where the
//! main ciphertext ended and folded into the MAC input together with the
//! ciphertext, as if the two were one stream.


use chacha20::ChaCha20;
use chacha20::cipher::{KeyIvInit, StreamCipher, StreamCipherSeek};
use poly1305::{
    Block as Poly1305Block, Key as Poly1305Key, Poly1305,
    universal_hash::{KeyInit, UniversalHash},
};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::ctutil::ct_bytes_eq;
use crate::error::AeadError;

pub(crate) const KEY_SIZE: usize = 32;
pub(crate) const NONCE_SIZE: usize = 12;
pub(crate) const TAG_SIZE: usize = 16;

const MAC_BLOCK: usize = 16;
const KEYSTREAM_BLOCK: u64 = 64;

/// The 32-bit block counter covers 2^32 blocks; counter 0 feeds Poly1305.
const MAX_MESSAGE_LEN: u64 = (1 << 38) - 64;
const MAX_AAD_LEN: u64 = 1 << 61;

pub(crate) struct ChaCha20Poly1305 {
    key: [u8; KEY_SIZE],
}

impl Zeroize for ChaCha20Poly1305 {
    fn zeroize(&mut self) {
        self.key.zeroize();
    }
}

impl ZeroizeOnDrop for ChaCha20Poly1305 {}

impl Drop for ChaCha20Poly1305 {
    fn drop(&mut self) {
        self.zeroize();
    }
}

/// Feed `first || second` to the MAC as one contiguous stream, zero-padded to
/// the MAC block size only after the final byte of `second`.
fn update_chained(mac: &mut Poly1305, first: &[u8], second: &[u8]) {
    let mut block = [0u8; MAC_BLOCK];
    let mut filled = 0;

    for &byte in first.iter().chain(second.iter()) {
        block[filled] = byte;
        filled += 1;
        if filled == MAC_BLOCK {
            mac.update(core::slice::from_ref(Poly1305Block::from_slice(&block)));
            filled = 0;
        }
    }

    if filled != 0 {
        block[filled..].fill(0);
        mac.update(core::slice::from_ref(Poly1305Block::from_slice(&block)));
    }

    block.zeroize();
}

impl ChaCha20Poly1305 {
    pub fn init(key: &[u8]) -> Result<Self, AeadError> {
        let key: [u8; KEY_SIZE] = key.try_into().map_err(|_| AeadError::InvalidKeySize)?;
        Ok(Self { key })
    }

    fn check_limits(&self, aad: &[u8], data: &[u8], trailer: &[u8]) -> Result<(), AeadError> {
        let total = data.len() as u64 + trailer.len() as u64;
        if total > MAX_MESSAGE_LEN || aad.len() as u64 > MAX_AAD_LEN {
            return Err(AeadError::InputTooLarge);
        }
        Ok(())
    }

    fn keystream(&self, nonce: &[u8; NONCE_SIZE]) -> ChaCha20 {
        ChaCha20::new(&self.key.into(), nonce.into())
    }

    /// Poly1305 key is the keystream at counter 0 applied to 32 zero bytes.
    fn poly_key(&self, nonce: &[u8; NONCE_SIZE]) -> [u8; 32] {
        let mut key = [0u8; 32];
        self.keystream(nonce).apply_keystream(&mut key);
        key
    }

    /// RFC 8439 section 2.8 MAC, with the trailer ciphertext spliced onto the
    /// main ciphertext before padding and counted in the length block.
    fn compute_tag(
        &self,
        nonce: &[u8; NONCE_SIZE],
        aad: &[u8],
        ciphertext: &[u8],
        trailer: &[u8],
    ) -> [u8; TAG_SIZE] {
        let mut poly_key = self.poly_key(nonce);
        let mut mac = Poly1305::new(Poly1305Key::from_slice(&poly_key));
        poly_key.zeroize();

        mac.update_padded(aad);
        update_chained(&mut mac, ciphertext, trailer);

        let mut len_block = [0u8; MAC_BLOCK];
        len_block[0..8].copy_from_slice(&(aad.len() as u64).to_le_bytes());
        len_block[8..16]
            .copy_from_slice(&((ciphertext.len() + trailer.len()) as u64).to_le_bytes());
        mac.update(core::slice::from_ref(Poly1305Block::from_slice(&len_block)));

        let mut tag = [0u8; TAG_SIZE];
        tag.copy_from_slice(&mac.finalize());
        tag
    }

    pub fn seal(
        &self,
        nonce: &[u8; NONCE_SIZE],
        aad: &[u8],
        data: &mut [u8],
        tag: &mut [u8],
    ) -> Result<(), AeadError> {
        self.seal_with_trailer(nonce, aad, data, &mut [], tag)
    }

    pub fn open(
        &self,
        nonce: &[u8; NONCE_SIZE],
        aad: &[u8],
        data: &mut [u8],
        tag: &[u8],
    ) -> Result<(), AeadError> {
        self.open_with_trailer(nonce, aad, data, &mut [], tag)
    }

    pub fn seal_with_trailer(
        &self,
        nonce: &[u8; NONCE_SIZE],
        aad: &[u8],
        data: &mut [u8],
        trailer: &mut [u8],
        tag: &mut [u8],
    ) -> Result<(), AeadError> {
        self.check_limits(aad, data, trailer)?;
        debug_assert!(!tag.is_empty() && tag.len() <= TAG_SIZE);

        let mut cipher = self.keystream(nonce);
        cipher.seek(KEYSTREAM_BLOCK);
        cipher.apply_keystream(data);

        if !trailer.is_empty() {
            // Continue the keystream byte-exact from the end of the message.
            let mut cipher = self.keystream(nonce);
            cipher.seek(KEYSTREAM_BLOCK + data.len() as u64);
            cipher.apply_keystream(trailer);
        }

        let mut full_tag = self.compute_tag(nonce, aad, data, trailer);
        tag.copy_from_slice(&full_tag[..tag.len()]);
        full_tag.zeroize();

        Ok(())
    }

    pub fn open_with_trailer(
        &self,
        nonce: &[u8; NONCE_SIZE],
        aad: &[u8],
        data: &mut [u8],
        trailer: &mut [u8],
        tag: &[u8],
    ) -> Result<(), AeadError> {
        self.check_limits(aad, data, trailer)?;
        debug_assert!(!tag.is_empty() && tag.len() <= TAG_SIZE);

        // Verify over the received ciphertext before any keystream touches it.
        let mut expected = self.compute_tag(nonce, aad, data, trailer);
        let ok = ct_bytes_eq(&expected[..tag.len()], tag);
        expected.zeroize();

        if !ok {
            return Err(AeadError::AuthenticationFailed);
        }

        let mut cipher = self.keystream(nonce);
        cipher.seek(KEYSTREAM_BLOCK);
        cipher.apply_keystream(data);

        if !trailer.is_empty() {
            let mut cipher = self.keystream(nonce);
            cipher.seek(KEYSTREAM_BLOCK + data.len() as u64);
            cipher.apply_keystream(trailer);
        }

        Ok(())
    }
}

impl core::fmt::Debug for ChaCha20Poly1305 {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "ChaCha20Poly1305 {{ [protected] }}")
    }
}

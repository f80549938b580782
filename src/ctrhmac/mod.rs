// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! AES-CTR with HMAC-SHA256 authentication.
//!
//! The caller's key is the AES key followed by a 32-byte MAC key. The HMAC
//! instance is built once at init, which runs the key-dependent first
//! compression of the inner and outer states; each seal/open clones that
//! state instead of re-deriving it.
//!
//! Tag input layout: len(AAD) LE64, len(ciphertext) LE64, nonce, AAD, zero
//! padding to the next SHA-256 block boundary, ciphertext. The padding keeps
//! the ciphertext block-aligned so the AAD length cannot shift its framing.


use aes::cipher::typenum::{U16, Unsigned};
use aes::cipher::{BlockCipher, BlockEncrypt, KeyInit, KeySizeUser};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use zeroize::Zeroize;

use crate::ctr::{BLOCK_SIZE, ctr128_be_xor};
use crate::ctutil::ct_bytes_eq;
use crate::error::AeadError;

pub(crate) const NONCE_SIZE: usize = 12;
pub(crate) const TAG_SIZE: usize = 32;

const SHA256_BLOCK: usize = 64;
const MAC_KEY_SIZE: usize = 32;

/// The low 32 counter bits sit inside the block; past 2^36 bytes the carry
/// would run into the nonce bytes.
const MAX_MESSAGE_LEN: u64 = 1 << 36;
const MAX_AAD_LEN: u64 = 1 << 61;

pub(crate) struct CtrHmac<C>
where
    C: BlockCipher<BlockSize = U16> + BlockEncrypt + KeyInit,
{
    cipher: C,
    hmac: Hmac<Sha256>,
    tag_len: usize,
}

impl<C> CtrHmac<C>
where
    C: BlockCipher<BlockSize = U16> + BlockEncrypt + KeyInit,
{
    pub fn init(key: &[u8], tag_len: usize) -> Result<Self, AeadError> {
        let aes_key_len = <C as KeySizeUser>::KeySize::USIZE;
        if key.len() != aes_key_len + MAC_KEY_SIZE {
            return Err(AeadError::InvalidKeySize);
        }
        if tag_len < 8 || tag_len > TAG_SIZE {
            return Err(AeadError::InvalidTagSize);
        }

        let (aes_key, mac_key) = key.split_at(aes_key_len);
        let cipher = C::new_from_slice(aes_key)
            .expect("infallible: key length checked against the cipher's key size");
        // Qualified: `KeyInit` is in scope for the block cipher and also
        // offers a `new_from_slice`.
        let hmac = <Hmac<Sha256> as Mac>::new_from_slice(mac_key)
            .expect("infallible: HMAC accepts any key length");

        Ok(Self {
            cipher,
            hmac,
            tag_len,
        })
    }

    pub fn tag_len(&self) -> usize {
        self.tag_len
    }

    fn check_limits(&self, aad: &[u8], data: &[u8]) -> Result<(), AeadError> {
        if data.len() as u64 > MAX_MESSAGE_LEN || aad.len() as u64 > MAX_AAD_LEN {
            return Err(AeadError::InputTooLarge);
        }
        Ok(())
    }

    fn compute_tag(
        &self,
        nonce: &[u8; NONCE_SIZE],
        aad: &[u8],
        ciphertext: &[u8],
    ) -> [u8; TAG_SIZE] {
        let mut mac = self.hmac.clone();

        mac.update(&(aad.len() as u64).to_le_bytes());
        mac.update(&(ciphertext.len() as u64).to_le_bytes());
        mac.update(nonce);
        mac.update(aad);

        let prefix_len = 8 + 8 + NONCE_SIZE + aad.len();
        let padding = (SHA256_BLOCK - prefix_len % SHA256_BLOCK) % SHA256_BLOCK;
        mac.update(&[0u8; SHA256_BLOCK][..padding]);

        mac.update(ciphertext);

        let mut tag = [0u8; TAG_SIZE];
        tag.copy_from_slice(&mac.finalize().into_bytes());
        tag
    }

    fn counter(nonce: &[u8; NONCE_SIZE]) -> [u8; BLOCK_SIZE] {
        let mut counter = [0u8; BLOCK_SIZE];
        counter[..NONCE_SIZE].copy_from_slice(nonce);
        counter
    }

    pub fn seal(
        &self,
        nonce: &[u8; NONCE_SIZE],
        aad: &[u8],
        data: &mut [u8],
        tag: &mut [u8],
    ) -> Result<(), AeadError> {
        self.check_limits(aad, data)?;
        debug_assert_eq!(tag.len(), self.tag_len);

        ctr128_be_xor(&self.cipher, &Self::counter(nonce), data);

        let mut full_tag = self.compute_tag(nonce, aad, data);
        tag.copy_from_slice(&full_tag[..self.tag_len]);
        full_tag.zeroize();

        Ok(())
    }

    pub fn open(
        &self,
        nonce: &[u8; NONCE_SIZE],
        aad: &[u8],
        data: &mut [u8],
        tag: &[u8],
    ) -> Result<(), AeadError> {
        self.check_limits(aad, data)?;
        debug_assert_eq!(tag.len(), self.tag_len);

        let mut expected = self.compute_tag(nonce, aad, data);
        let ok = ct_bytes_eq(&expected[..self.tag_len], tag);
        expected.zeroize();

        if !ok {
            return Err(AeadError::AuthenticationFailed);
        }

        ctr128_be_xor(&self.cipher, &Self::counter(nonce), data);

        Ok(())
    }
}

impl<C> core::fmt::Debug for CtrHmac<C>
where
    C: BlockCipher<BlockSize = U16> + BlockEncrypt + KeyInit,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "CtrHmac {{ [protected] }}")
    }
}

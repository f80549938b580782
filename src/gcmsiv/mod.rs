// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! AES-GCM-SIV (RFC 8452), nonce-misuse-resistant AEAD.
//!
//! Every message derives fresh authentication and encryption keys from the
//! nonce under the root key, so reusing a nonce only ever leaks equality of
//! ciphertexts. Decryption necessarily runs before the tag can be recomputed
//! (the keystream is seeded from the received tag); the recovered plaintext
//! is zeroized before `AuthenticationFailed` is returned.

#[cfg(test)]
mod tests;

mod polyval;

pub use polyval::PolyvalStrategy;

use aes::cipher::typenum::{U16, Unsigned};
use aes::cipher::{BlockCipher, BlockEncrypt, KeyInit, KeySizeUser, generic_array::GenericArray};
use zeroize::Zeroize;

use crate::ctr::{BLOCK_SIZE, ctr32_le_xor};
use crate::ctutil::ct_bytes_eq;
use crate::error::AeadError;

use polyval::Polyval;

pub(crate) const NONCE_SIZE: usize = 12;
pub(crate) const TAG_SIZE: usize = 16;

/// RFC 8452 caps both plaintext and AAD at 2^36 bytes.
const MAX_MESSAGE_LEN: u64 = 1 << 36;
const MAX_AAD_LEN: u64 = 1 << 36;

/// GCM-SIV context holding the root key schedule.
///
/// Immutable after construction; per-message key material lives on the stack
/// of each call and is zeroized before return.
pub(crate) struct GcmSiv<C>
where
    C: BlockCipher<BlockSize = U16> + BlockEncrypt + KeyInit,
{
    root: C,
    strategy: PolyvalStrategy,
}

impl<C> GcmSiv<C>
where
    C: BlockCipher<BlockSize = U16> + BlockEncrypt + KeyInit,
{
    pub fn init(key: &[u8], strategy: PolyvalStrategy) -> Result<Self, AeadError> {
        let root = C::new_from_slice(key).map_err(|_| AeadError::InvalidKeySize)?;
        Ok(Self { root, strategy })
    }

    /// Per-message KDF: encrypt little-endian counter || nonce blocks under
    /// the root key and keep the low 8 bytes of each (RFC 8452 section 4).
    fn derive_keys(&self, nonce: &[u8; NONCE_SIZE]) -> ([u8; BLOCK_SIZE], C) {
        let key_len = <C as KeySizeUser>::KeySize::USIZE;
        let derive_blocks = 2 + key_len / 8;

        let mut material = [0u8; 48];
        let mut block = [0u8; BLOCK_SIZE];
        for i in 0..derive_blocks {
            block[0..4].copy_from_slice(&(i as u32).to_le_bytes());
            block[4..16].copy_from_slice(nonce);
            self.root
                .encrypt_block(GenericArray::from_mut_slice(&mut block));
            material[i * 8..i * 8 + 8].copy_from_slice(&block[..8]);
        }
        block.zeroize();

        let mut auth_key = [0u8; BLOCK_SIZE];
        auth_key.copy_from_slice(&material[..BLOCK_SIZE]);
        let message_cipher = C::new_from_slice(&material[BLOCK_SIZE..BLOCK_SIZE + key_len])
            .expect("infallible: derived key has the cipher's key size");
        material.zeroize();

        (auth_key, message_cipher)
    }

    fn check_limits(&self, aad: &[u8], data: &[u8]) -> Result<(), AeadError> {
        if data.len() as u64 > MAX_MESSAGE_LEN || aad.len() as u64 > MAX_AAD_LEN {
            return Err(AeadError::InputTooLarge);
        }
        Ok(())
    }

    /// POLYVAL over aad and message, nonce-XOR, top bit cleared, encrypted.
    fn compute_tag(
        &self,
        auth_key: &[u8; BLOCK_SIZE],
        message_cipher: &C,
        nonce: &[u8; NONCE_SIZE],
        aad: &[u8],
        message: &[u8],
    ) -> [u8; TAG_SIZE] {
        let mut polyval = Polyval::new(auth_key, self.strategy);
        polyval.update_padded(aad);
        polyval.update_padded(message);

        let mut length_block = [0u8; BLOCK_SIZE];
        length_block[0..8].copy_from_slice(&(aad.len() as u64 * 8).to_le_bytes());
        length_block[8..16].copy_from_slice(&(message.len() as u64 * 8).to_le_bytes());
        polyval.update_block(&length_block);

        let mut tag = polyval.finalize();
        for (t, n) in tag.iter_mut().zip(nonce.iter()) {
            *t ^= n;
        }
        tag[TAG_SIZE - 1] &= 0x7f;
        message_cipher.encrypt_block(GenericArray::from_mut_slice(&mut tag));

        tag
    }

    pub fn seal(
        &self,
        nonce: &[u8; NONCE_SIZE],
        aad: &[u8],
        data: &mut [u8],
        tag: &mut [u8],
    ) -> Result<(), AeadError> {
        self.check_limits(aad, data)?;
        debug_assert_eq!(tag.len(), TAG_SIZE);

        let (mut auth_key, message_cipher) = self.derive_keys(nonce);

        // SIV: authenticate the plaintext, then key the CTR from the tag.
        let full_tag = self.compute_tag(&auth_key, &message_cipher, nonce, aad, data);
        tag.copy_from_slice(&full_tag);

        let mut counter = full_tag;
        counter[BLOCK_SIZE - 1] |= 0x80;
        ctr32_le_xor(&message_cipher, &counter, data);

        auth_key.zeroize();
        counter.zeroize();

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
        debug_assert_eq!(tag.len(), TAG_SIZE);

        let (mut auth_key, message_cipher) = self.derive_keys(nonce);

        // The keystream is seeded from the received, unverified tag; the
        // decrypted bytes are not plaintext until the comparison passes.
        let mut counter = [0u8; BLOCK_SIZE];
        counter.copy_from_slice(tag);
        counter[BLOCK_SIZE - 1] |= 0x80;
        ctr32_le_xor(&message_cipher, &counter, data);
        counter.zeroize();

        let mut expected = self.compute_tag(&auth_key, &message_cipher, nonce, aad, data);
        let ok = ct_bytes_eq(&expected, tag);

        auth_key.zeroize();
        expected.zeroize();

        if !ok {
            data.zeroize();
            return Err(AeadError::AuthenticationFailed);
        }

        Ok(())
    }
}

impl<C> core::fmt::Debug for GcmSiv<C>
where
    C: BlockCipher<BlockSize = U16> + BlockEncrypt + KeyInit,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "GcmSiv {{ [protected] }}")
    }
}

// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! EAX mode (Bellare, Rogaway, Wagner) over a 128-bit block cipher.
//!
//! Setup derives the OMAC masks B and P by GF(2^128) doubling of E_K(0).
//! Seal is OMAC0(nonce) / OMAC1(aad) / CTR / OMAC2(ciphertext); the tag is
//! the XOR of the three OMACs. Open recomputes the tag from the received
//! ciphertext and only decrypts after the constant-time comparison passes.


use aes::cipher::{BlockCipher, BlockEncrypt, KeyInit, generic_array::GenericArray};
use aes::cipher::typenum::U16;
use subtle::Choice;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::ctr::{BLOCK_SIZE, ctr128_be_xor};
use crate::ctutil::{ct_bytes_eq, mask8};
use crate::error::AeadError;

pub(crate) const NONCE_SIZE: usize = 16;
pub(crate) const TAG_SIZE: usize = 16;

/// CTR counter-width ceiling; also keeps OMAC length encodings overflow-free.
const MAX_MESSAGE_LEN: u64 = 1 << 36;
const MAX_AAD_LEN: u64 = 1 << 61;

/// EAX context: expanded key schedule plus the doubled OMAC masks.
///
/// Immutable after construction; safe to share across threads.
#[derive(Zeroize, ZeroizeOnDrop)]
pub(crate) struct Eax<C>
where
    C: BlockCipher<BlockSize = U16> + BlockEncrypt + KeyInit,
{
    #[zeroize(skip)]
    cipher: C,
    /// double(E_K(0)): mask for complete final OMAC blocks.
    b: [u8; BLOCK_SIZE],
    /// double(B): mask for padded final OMAC blocks.
    p: [u8; BLOCK_SIZE],
    #[zeroize(skip)]
    tag_len: usize,
}

/// Multiply by X in GF(2^128) with the CMAC reduction constant, constant-time.
fn double(block: &[u8; BLOCK_SIZE]) -> [u8; BLOCK_SIZE] {
    let mut out = [0u8; BLOCK_SIZE];
    let carry = block[0] >> 7;

    for i in 0..BLOCK_SIZE - 1 {
        out[i] = (block[i] << 1) | (block[i + 1] >> 7);
    }
    out[BLOCK_SIZE - 1] = block[BLOCK_SIZE - 1] << 1;
    out[BLOCK_SIZE - 1] ^= 0x87 & mask8(Choice::from(carry));

    out
}

impl<C> Eax<C>
where
    C: BlockCipher<BlockSize = U16> + BlockEncrypt + KeyInit,
{
    pub fn init(key: &[u8], tag_len: usize) -> Result<Self, AeadError> {
        let cipher = C::new_from_slice(key).map_err(|_| AeadError::InvalidKeySize)?;

        let mut l = [0u8; BLOCK_SIZE];
        cipher.encrypt_block(GenericArray::from_mut_slice(&mut l));
        let b = double(&l);
        let p = double(&b);
        l.zeroize();

        Ok(Self {
            cipher,
            b,
            p,
            tag_len,
        })
    }

    /// OMAC with the tweak byte prepended as a full first block.
    fn omac(&self, tweak: u8, data: &[u8]) -> [u8; BLOCK_SIZE] {
        let mut state = [0u8; BLOCK_SIZE];
        state[BLOCK_SIZE - 1] = tweak;

        if data.is_empty() {
            // The tweak block itself is the final (complete) block.
            for (s, m) in state.iter_mut().zip(self.b.iter()) {
                *s ^= m;
            }
            self.cipher
                .encrypt_block(GenericArray::from_mut_slice(&mut state));
            return state;
        }

        self.cipher
            .encrypt_block(GenericArray::from_mut_slice(&mut state));

        let mut chunks = data.chunks(BLOCK_SIZE).peekable();
        while let Some(chunk) = chunks.next() {
            if chunks.peek().is_some() {
                for (s, byte) in state.iter_mut().zip(chunk.iter()) {
                    *s ^= byte;
                }
            } else if chunk.len() == BLOCK_SIZE {
                for i in 0..BLOCK_SIZE {
                    state[i] ^= chunk[i] ^ self.b[i];
                }
            } else {
                let mut padded = [0u8; BLOCK_SIZE];
                padded[..chunk.len()].copy_from_slice(chunk);
                padded[chunk.len()] = 0x80;
                for i in 0..BLOCK_SIZE {
                    state[i] ^= padded[i] ^ self.p[i];
                }
                padded.zeroize();
            }
            self.cipher
                .encrypt_block(GenericArray::from_mut_slice(&mut state));
        }

        state
    }

    fn check_limits(&self, aad: &[u8], data: &[u8]) -> Result<(), AeadError> {
        if data.len() as u64 > MAX_MESSAGE_LEN || aad.len() as u64 > MAX_AAD_LEN {
            return Err(AeadError::InputTooLarge);
        }
        Ok(())
    }

    fn tag_from_parts(
        &self,
        n: &[u8; BLOCK_SIZE],
        h: &[u8; BLOCK_SIZE],
        c: &[u8; BLOCK_SIZE],
    ) -> [u8; TAG_SIZE] {
        let mut tag = [0u8; TAG_SIZE];
        for i in 0..TAG_SIZE {
            tag[i] = n[i] ^ h[i] ^ c[i];
        }
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
        debug_assert_eq!(tag.len(), self.tag_len);

        let mut n = self.omac(0, nonce);
        let mut h = self.omac(1, aad);

        ctr128_be_xor(&self.cipher, &n, data);

        let mut c = self.omac(2, data);
        let mut full_tag = self.tag_from_parts(&n, &h, &c);
        tag.copy_from_slice(&full_tag[..self.tag_len]);

        n.zeroize();
        h.zeroize();
        c.zeroize();
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

        // Recompute the tag from the ciphertext; no plaintext exists until
        // the comparison has passed.
        let mut n = self.omac(0, nonce);
        let mut h = self.omac(1, aad);
        let mut c = self.omac(2, data);
        let mut full_tag = self.tag_from_parts(&n, &h, &c);

        let ok = ct_bytes_eq(&full_tag[..self.tag_len], tag);

        h.zeroize();
        c.zeroize();
        full_tag.zeroize();

        if !ok {
            n.zeroize();
            return Err(AeadError::AuthenticationFailed);
        }

        ctr128_be_xor(&self.cipher, &n, data);
        n.zeroize();

        Ok(())
    }
}

impl<C> core::fmt::Debug for Eax<C>
where
    C: BlockCipher<BlockSize = U16> + BlockEncrypt + KeyInit,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Eax {{ [protected] }}")
    }
}

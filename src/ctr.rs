// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! CTR keystream helpers over a single-block cipher.
//!
//! Two counter flavors are needed here: EAX and CTR-HMAC increment the whole
//! 16-byte block as a big-endian integer; GCM-SIV increments only the first
//! four bytes as a little-endian counter (RFC 8452 section 4).

use aes::cipher::{BlockEncrypt, generic_array::GenericArray};
use zeroize::Zeroize;

pub(crate) const BLOCK_SIZE: usize = 16;

/// XOR the CTR keystream into `data` in-place, big-endian 128-bit increment.
pub(crate) fn ctr128_be_xor<C: BlockEncrypt>(cipher: &C, counter: &[u8; BLOCK_SIZE], data: &mut [u8]) {
    let mut block = *counter;
    let mut keystream = [0u8; BLOCK_SIZE];

    for chunk in data.chunks_mut(BLOCK_SIZE) {
        keystream.copy_from_slice(&block);
        cipher.encrypt_block(GenericArray::from_mut_slice(&mut keystream));

        for (byte, ks_byte) in chunk.iter_mut().zip(keystream.iter()) {
            *byte ^= ks_byte;
        }

        // Big-endian increment with carry across the whole block.
        for b in block.iter_mut().rev() {
            let (next, carry) = b.overflowing_add(1);
            *b = next;
            if !carry {
                break;
            }
        }
    }

    keystream.zeroize();
    block.zeroize();
}

/// XOR the CTR keystream into `data` in-place, 32-bit little-endian counter
/// in the first four bytes of the block (GCM-SIV flavor).
pub(crate) fn ctr32_le_xor<C: BlockEncrypt>(cipher: &C, counter: &[u8; BLOCK_SIZE], data: &mut [u8]) {
    let mut block = *counter;
    let mut keystream = [0u8; BLOCK_SIZE];

    for chunk in data.chunks_mut(BLOCK_SIZE) {
        keystream.copy_from_slice(&block);
        cipher.encrypt_block(GenericArray::from_mut_slice(&mut keystream));

        for (byte, ks_byte) in chunk.iter_mut().zip(keystream.iter()) {
            *byte ^= ks_byte;
        }

        let ctr = u32::from_le_bytes([block[0], block[1], block[2], block[3]]).wrapping_add(1);
        block[0..4].copy_from_slice(&ctr.to_le_bytes());
    }

    keystream.zeroize();
    block.zeroize();
}

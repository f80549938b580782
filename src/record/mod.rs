// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Constant-time CBC record helpers (Lucky13 defenses).
//!
//! A CBC record decrypts to plaintext, MAC and padding in one buffer, and
//! the pad length byte is secret. These helpers recover the plaintext length
//! and the MAC with memory access and branch patterns that depend only on
//! public quantities (total length, block size, digest size); every
//! secret-dependent decision is a bitwise mask.
//!
//! [`remove_padding`] and [`extract_mac`] follow the TLS CBC record layout.
//! [`record_digest`] computes an HMAC "as if over the unpadded message"
//! without revealing where the message ends, for MAC recomputation paths
//! that would otherwise leak the plaintext length through hashing time.

#[cfg(test)]
mod tests;

use sha2::digest::generic_array::GenericArray;
use subtle::{Choice, ConditionallySelectable};
use zeroize::Zeroize;

use crate::ctutil::{ct_eq, ct_ge, ct_lt, mask8, mask64};
use crate::error::AeadError;

/// Digest underlying a record MAC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordDigestAlg {
    Sha1,
    Sha256,
}

impl RecordDigestAlg {
    pub const fn digest_size(self) -> usize {
        match self {
            RecordDigestAlg::Sha1 => 20,
            RecordDigestAlg::Sha256 => 32,
        }
    }
}

const MD_BLOCK: usize = 64;
const MD_LENGTH_SIZE: usize = 8;
const MAX_PAD: usize = 256;
const MAX_DIGEST: usize = 32;

/// Strip TLS-style padding from a decrypted record.
///
/// The final byte is the pad length `L`; a valid record ends in `L + 1`
/// bytes all equal to `L`, preceded by the MAC. Returns a validity mask and
/// the record length with padding removed (MAC still included). On an
/// invalid pad the returned length is `data.len()` unchanged.
///
/// A fixed `min(256, len)` window is scanned regardless of `L`, so timing
/// depends only on `data.len()`, `block_size` and `mac_size`.
pub fn remove_padding(data: &[u8], block_size: usize, mac_size: usize) -> (Choice, usize) {
    // Public-shape rejects; a forger learns nothing from these.
    if data.is_empty() || data.len() % block_size != 0 || data.len() < mac_size + 1 {
        return (Choice::from(0), data.len());
    }

    let len = data.len() as u64;
    let pad = data[data.len() - 1] as u64;
    let mut good = ct_ge(len, pad + 1 + mac_size as u64);

    let to_check = core::cmp::min(MAX_PAD, data.len());
    for i in 0..to_check {
        let in_pad = ct_ge(pad, i as u64);
        let byte = data[data.len() - 1 - i] as u64;
        good &= !in_pad | ct_eq(byte, pad);
    }

    let removed = (pad + 1) & mask64(good);
    (good, data.len() - removed as usize)
}

/// Copy the MAC out of a decrypted record without revealing its offset.
///
/// `data` is the full decrypted record (padding still in the buffer) and
/// `data_plus_mac_len` the length [`remove_padding`] reported; the MAC is
/// the final `out.len()` bytes before that point, at a secret offset. Every
/// byte of a fixed tail window is visited and accumulated into a rotation
/// of the output, which is then un-rotated by constant-time conditional
/// rotations.
pub fn extract_mac(out: &mut [u8], data: &[u8], data_plus_mac_len: usize) {
    let md_size = out.len();
    debug_assert!(md_size > 0 && md_size <= MAX_DIGEST);
    debug_assert!(data_plus_mac_len >= md_size);
    debug_assert!(data.len() >= data_plus_mac_len);
    debug_assert!(data.len() <= data_plus_mac_len + MAX_PAD);

    let mac_start = (data_plus_mac_len - md_size) as u64;
    let mac_end = data_plus_mac_len as u64;
    let scan_start = data.len().saturating_sub(md_size + MAX_PAD);

    let mut rotated = [0u8; MAX_DIGEST];
    let mut rotate_offset = 0u64;
    let mut j = 0usize;

    for (i, &byte) in data.iter().enumerate().skip(scan_start) {
        let in_mac = ct_ge(i as u64, mac_start) & ct_lt(i as u64, mac_end);
        rotated[j] |= byte & mask8(in_mac);
        rotate_offset |= (j as u64) & mask64(ct_eq(i as u64, mac_start));
        j += 1;
        if j == md_size {
            j = 0;
        }
    }

    // Un-rotate left by rotate_offset, one power of two at a time.
    let mut offset = 1;
    while offset < md_size {
        let rotate = Choice::from(((rotate_offset as usize & offset) != 0) as u8);
        let mut shifted = [0u8; MAX_DIGEST];
        for i in 0..md_size {
            shifted[i] =
                u8::conditional_select(&rotated[i], &rotated[(i + offset) % md_size], rotate);
        }
        rotated[..md_size].copy_from_slice(&shifted[..md_size]);
        shifted.zeroize();
        offset <<= 1;
    }

    out.copy_from_slice(&rotated[..md_size]);
    rotated.zeroize();
}

/// Running Merkle-Damgard state for the digest families a record MAC uses.
enum MdState {
    Sha1([u32; 5]),
    Sha256([u32; 8]),
}

impl MdState {
    fn new(alg: RecordDigestAlg) -> Self {
        match alg {
            RecordDigestAlg::Sha1 => MdState::Sha1([
                0x6745_2301,
                0xefcd_ab89,
                0x98ba_dcfe,
                0x1032_5476,
                0xc3d2_e1f0,
            ]),
            RecordDigestAlg::Sha256 => MdState::Sha256([
                0x6a09_e667,
                0xbb67_ae85,
                0x3c6e_f372,
                0xa54f_f53a,
                0x510e_527f,
                0x9b05_688c,
                0x1f83_d9ab,
                0x5be0_cd19,
            ]),
        }
    }

    fn compress(&mut self, block: &[u8; MD_BLOCK]) {
        match self {
            MdState::Sha1(state) => {
                sha1::compress(state, core::slice::from_ref(GenericArray::from_slice(block)));
            }
            MdState::Sha256(state) => {
                sha2::compress256(state, core::slice::from_ref(GenericArray::from_slice(block)));
            }
        }
    }

    /// Big-endian serialization of the chaining words.
    fn output(&self, out: &mut [u8]) {
        let words: &[u32] = match self {
            MdState::Sha1(state) => state,
            MdState::Sha256(state) => state,
        };
        for (chunk, word) in out.chunks_exact_mut(4).zip(words.iter()) {
            chunk.copy_from_slice(&word.to_be_bytes());
        }
    }

    /// As [`Self::output`], but each byte is ANDed with `mask` and ORed in.
    fn accumulate(&self, out: &mut [u8], mask: u8) {
        let words: &[u32] = match self {
            MdState::Sha1(state) => state,
            MdState::Sha256(state) => state,
        };
        for (chunk, word) in out.chunks_exact_mut(4).zip(words.iter()) {
            for (dst, src) in chunk.iter_mut().zip(word.to_be_bytes()) {
                *dst |= src & mask;
            }
        }
    }

    fn zeroize(&mut self) {
        match self {
            MdState::Sha1(state) => state.zeroize(),
            MdState::Sha256(state) => state.zeroize(),
        }
    }
}

/// HMAC over `header || data[..data_len]` without leaking `data_len`.
///
/// `data` holds message, MAC and padding; `data_len` is the secret message
/// length within it (at most `data.len()`, at least `data.len()` minus the
/// maximum pad plus digest overhead). The inner hash runs every block that
/// could possibly be the final one, placing the 0x80 terminator and the
/// bit-length suffix by masking, and harvests the chaining value of the
/// genuine final block by masked accumulation. The number of compressions
/// depends only on `header.len()` and `data.len()`.
///
/// Writes `alg.digest_size()` bytes into `out` and returns that count.
pub fn record_digest(
    alg: RecordDigestAlg,
    mac_key: &[u8],
    header: &[u8],
    data: &[u8],
    data_len: usize,
    out: &mut [u8],
) -> Result<usize, AeadError> {
    let md_size = alg.digest_size();
    if mac_key.len() > MD_BLOCK {
        return Err(AeadError::InvalidKeySize);
    }
    if out.len() < md_size {
        return Err(AeadError::BufferTooSmall);
    }
    if data_len > data.len() {
        return Err(AeadError::InvalidRecordLength);
    }
    debug_assert!(data_len + MAX_PAD + md_size >= data.len());

    let mut key_pad = [0u8; MD_BLOCK];
    key_pad[..mac_key.len()].copy_from_slice(mac_key);

    let mut inner = MdState::new(alg);
    for byte in key_pad.iter_mut() {
        *byte ^= 0x36;
    }
    inner.compress(&key_pad);

    let mut outer = MdState::new(alg);
    for byte in key_pad.iter_mut() {
        // Undo the ipad XOR and apply the opad one.
        *byte ^= 0x36 ^ 0x5c;
    }
    outer.compress(&key_pad);
    key_pad.zeroize();

    // Secret end of the MACed bytes, relative to the start of header.
    let msg_len = (header.len() + data_len) as u64;
    // Block whose trailing 8 bytes carry the bit-length suffix. When the
    // terminator byte lands within the last 8 bytes of its block, the suffix
    // spills into the following block; the +8 accounts for that.
    let index_b = (msg_len + MD_LENGTH_SIZE as u64) >> 6;
    // Bit length includes the ipad block that precedes the message.
    let bit_len = ((MD_BLOCK as u64 + msg_len) * 8).to_be_bytes();

    let total = header.len() + data.len();
    let min_msg_len = header.len() + data.len().saturating_sub(MAX_PAD + md_size);
    let num_starting_blocks = min_msg_len / MD_BLOCK;
    let last_block = (total + MD_LENGTH_SIZE) / MD_BLOCK;

    let read_byte = |p: usize| -> u8 {
        if p < header.len() {
            header[p]
        } else if p < total {
            data[p - header.len()]
        } else {
            0
        }
    };

    // Blocks that cannot contain the message end are hashed as-is.
    let mut block = [0u8; MD_BLOCK];
    for i in 0..num_starting_blocks {
        for (j, slot) in block.iter_mut().enumerate() {
            *slot = read_byte(i * MD_BLOCK + j);
        }
        inner.compress(&block);
    }

    // Variance blocks: any of these could be the final padded block. After
    // each compression the chaining value is harvested under a mask that is
    // non-zero only for the genuine final block.
    let mut digest = [0u8; MAX_DIGEST];
    for i in num_starting_blocks..=last_block {
        let is_block_b = ct_eq(i as u64, index_b);
        for (j, slot) in block.iter_mut().enumerate() {
            let p = (i * MD_BLOCK + j) as u64;
            let mut byte = read_byte(p as usize) & mask8(ct_lt(p, msg_len));
            byte |= 0x80 & mask8(ct_eq(p, msg_len));
            if j >= MD_BLOCK - MD_LENGTH_SIZE {
                byte |= bit_len[j - (MD_BLOCK - MD_LENGTH_SIZE)] & mask8(is_block_b);
            }
            *slot = byte;
        }
        inner.compress(&block);
        inner.accumulate(&mut digest[..md_size], mask8(is_block_b));
    }
    block.zeroize();
    inner.zeroize();

    // Outer hash over a public-length input; nothing to mask here.
    let mut final_block = [0u8; MD_BLOCK];
    final_block[..md_size].copy_from_slice(&digest[..md_size]);
    final_block[md_size] = 0x80;
    let outer_bits = ((MD_BLOCK + md_size) as u64 * 8).to_be_bytes();
    final_block[MD_BLOCK - MD_LENGTH_SIZE..].copy_from_slice(&outer_bits);
    outer.compress(&final_block);
    final_block.zeroize();
    digest.zeroize();

    outer.output(&mut out[..md_size]);
    outer.zeroize();

    Ok(md_size)
}

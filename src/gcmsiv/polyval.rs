// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! POLYVAL universal hash (RFC 8452).
//!
//! POLYVAL works in GF(2^128) with little-endian bit order and the reduction
//! polynomial x^128 + x^127 + x^126 + x^121 + 1; its per-block operation is
//! dot(a, b) = a * b * x^-128. The x^-128 factor is folded into the
//! authentication key once at init, so each block costs one plain modular
//! multiplication.
//!
//! Two execution paths produce identical results: `Generic` multiplies one
//! block at a time; `Wide` precomputes a table of key powers and folds four
//! blocks per multiplication round. Both are branch-free on secret data.

use zeroize::Zeroize;

use crate::ctr::BLOCK_SIZE;

/// x^128 reduced: bits 127, 126, 121 (the "x^128 = ..." fold constant).
const POLY_HI: u64 = 0xc200_0000_0000_0000;
/// (p ^ 1) >> 1: bits 127, 126, 125, 120 (the "divide by x" fold constant).
const INV_X_HI: u64 = 0xe100_0000_0000_0000;

const WIDE_BLOCKS: usize = 4;

/// How the POLYVAL accumulator is advanced.
///
/// Chosen once when a GCM-SIV context is created, never per call; both paths
/// are portable and functionally identical, so selection is an explicit
/// caller decision rather than hidden process-wide state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PolyvalStrategy {
    /// One block per field multiplication.
    Generic,
    /// Precomputed key powers, four blocks folded per round.
    #[default]
    Wide,
}

/// Field element as two little-endian 64-bit limbs.
#[derive(Clone, Copy, Default, Zeroize)]
struct Gf128 {
    lo: u64,
    hi: u64,
}

impl Gf128 {
    fn from_bytes(block: &[u8; BLOCK_SIZE]) -> Self {
        Self {
            lo: u64::from_le_bytes(block[0..8].try_into().expect("infallible: 8 bytes")),
            hi: u64::from_le_bytes(block[8..16].try_into().expect("infallible: 8 bytes")),
        }
    }

    fn to_bytes(self) -> [u8; BLOCK_SIZE] {
        let mut out = [0u8; BLOCK_SIZE];
        out[0..8].copy_from_slice(&self.lo.to_le_bytes());
        out[8..16].copy_from_slice(&self.hi.to_le_bytes());
        out
    }

    fn xor(self, other: Self) -> Self {
        Self {
            lo: self.lo ^ other.lo,
            hi: self.hi ^ other.hi,
        }
    }

    /// Divide by x modulo p.
    fn mul_x_inv(self) -> Self {
        let carry = self.lo & 1;
        let mask = 0u64.wrapping_sub(carry);
        Self {
            lo: (self.lo >> 1) | (self.hi << 63),
            hi: (self.hi >> 1) ^ (INV_X_HI & mask),
        }
    }
}

/// a * b mod p, data-independent: 128 shift/mask rounds, no table lookups.
fn gf_mul(a: Gf128, b: Gf128) -> Gf128 {
    let mut v = a;
    let mut r = Gf128::default();

    for limb in [b.lo, b.hi] {
        for i in 0..64 {
            let mask = 0u64.wrapping_sub((limb >> i) & 1);
            r.lo ^= v.lo & mask;
            r.hi ^= v.hi & mask;

            // v = v * x with reduction of the overflow bit.
            let carry = v.hi >> 63;
            let cmask = 0u64.wrapping_sub(carry);
            v.hi = (v.hi << 1) | (v.lo >> 63);
            v.lo <<= 1;
            v.lo ^= 1 & cmask;
            v.hi ^= POLY_HI & cmask;
        }
    }

    r
}

/// Incremental POLYVAL evaluator.
pub(crate) struct Polyval {
    strategy: PolyvalStrategy,
    /// Key powers in Montgomery-folded form; `powers[k]` is H_m^(k+1).
    powers: [Gf128; WIDE_BLOCKS],
    acc: Gf128,
}

impl Polyval {
    pub fn new(auth_key: &[u8; BLOCK_SIZE], strategy: PolyvalStrategy) -> Self {
        // Fold x^-128 into the key: dot(a, H) == (a * H_m) mod p.
        let mut h = Gf128::from_bytes(auth_key);
        for _ in 0..128 {
            h = h.mul_x_inv();
        }

        let h2 = gf_mul(h, h);
        let h3 = gf_mul(h2, h);
        let h4 = gf_mul(h2, h2);

        Self {
            strategy,
            powers: [h, h2, h3, h4],
            acc: Gf128::default(),
        }
    }

    fn absorb(&mut self, block: Gf128) {
        self.acc = gf_mul(self.acc.xor(block), self.powers[0]);
    }

    /// Fold four consecutive blocks with one round of independent multiplies.
    fn absorb_wide(&mut self, blocks: &[Gf128; WIDE_BLOCKS]) {
        self.acc = gf_mul(self.acc.xor(blocks[0]), self.powers[3])
            .xor(gf_mul(blocks[1], self.powers[2]))
            .xor(gf_mul(blocks[2], self.powers[1]))
            .xor(gf_mul(blocks[3], self.powers[0]));
    }

    pub fn update_block(&mut self, block: &[u8; BLOCK_SIZE]) {
        self.absorb(Gf128::from_bytes(block));
    }

    /// Absorb `data`, zero-padded to the block size.
    pub fn update_padded(&mut self, data: &[u8]) {
        let mut chunks = data.chunks_exact(BLOCK_SIZE);

        if self.strategy == PolyvalStrategy::Wide {
            while chunks.len() >= WIDE_BLOCKS {
                let mut batch = [Gf128::default(); WIDE_BLOCKS];
                for slot in batch.iter_mut() {
                    let chunk = chunks.next().expect("infallible: len checked");
                    *slot = Gf128::from_bytes(chunk.try_into().expect("infallible: 16 bytes"));
                }
                self.absorb_wide(&batch);
            }
        }

        for chunk in chunks.by_ref() {
            self.absorb(Gf128::from_bytes(
                chunk.try_into().expect("infallible: 16 bytes"),
            ));
        }

        let tail = chunks.remainder();
        if !tail.is_empty() {
            let mut block = [0u8; BLOCK_SIZE];
            block[..tail.len()].copy_from_slice(tail);
            self.absorb(Gf128::from_bytes(&block));
            block.zeroize();
        }
    }

    pub fn finalize(&self) -> [u8; BLOCK_SIZE] {
        self.acc.to_bytes()
    }
}

impl Drop for Polyval {
    fn drop(&mut self) {
        self.powers.zeroize();
        self.acc.zeroize();
    }
}

impl core::fmt::Debug for Polyval {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Polyval {{ [protected] }}")
    }
}

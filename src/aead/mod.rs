// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Uniform AEAD front-end.
//!
//! One [`Aead`] wraps whichever suite the caller picked; every length in a
//! call is checked against the algorithm descriptor before any cryptographic
//! work runs. Contexts are immutable after init and safe for concurrent
//! seal/open. The legacy CBC sessions are stateful and live in
//! [`crate::cbchmac`] instead of behind this front-end.

#[cfg(test)]
mod tests;

use aes::{Aes128, Aes256};

use crate::algorithm::AeadAlgorithm;
use crate::chacha20poly1305::ChaCha20Poly1305;
use crate::ctrhmac::CtrHmac;
use crate::eax::Eax;
use crate::error::AeadError;
use crate::gcmsiv::{GcmSiv, PolyvalStrategy};

enum Backend {
    EaxAes128(Eax<Aes128>),
    EaxAes256(Eax<Aes256>),
    Aes128GcmSiv(GcmSiv<Aes128>),
    Aes256GcmSiv(GcmSiv<Aes256>),
    ChaCha20Poly1305(ChaCha20Poly1305),
    Aes128CtrHmac(CtrHmac<Aes128>),
    Aes256CtrHmac(CtrHmac<Aes256>),
}

/// Fixed-width view of a nonce whose length was already validated.
fn nonce_array<const N: usize>(nonce: &[u8]) -> &[u8; N] {
    nonce.try_into().expect("infallible: length checked")
}

/// An initialized AEAD context for one algorithm and key.
pub struct Aead {
    algorithm: AeadAlgorithm,
    tag_len: usize,
    backend: Backend,
}

impl Aead {
    /// Initialize with the algorithm's default tag length.
    pub fn init(algorithm: AeadAlgorithm, key: &[u8]) -> Result<Self, AeadError> {
        Self::build(algorithm, key, algorithm.tag_size(), PolyvalStrategy::default())
    }

    /// Initialize with a truncated tag, within the descriptor's bounds.
    pub fn init_with_tag_len(
        algorithm: AeadAlgorithm,
        key: &[u8],
        tag_len: usize,
    ) -> Result<Self, AeadError> {
        Self::build(algorithm, key, tag_len, PolyvalStrategy::default())
    }

    /// Initialize with an explicit POLYVAL execution path.
    ///
    /// Only meaningful for the GCM-SIV suites; the other algorithms accept
    /// and ignore the strategy. Both paths are functionally identical, so
    /// this is a startup-time tuning and testing knob, not a semantic one.
    pub fn init_with_strategy(
        algorithm: AeadAlgorithm,
        key: &[u8],
        strategy: PolyvalStrategy,
    ) -> Result<Self, AeadError> {
        Self::build(algorithm, key, algorithm.tag_size(), strategy)
    }

    fn build(
        algorithm: AeadAlgorithm,
        key: &[u8],
        tag_len: usize,
        strategy: PolyvalStrategy,
    ) -> Result<Self, AeadError> {
        if key.len() != algorithm.key_size() {
            return Err(AeadError::InvalidKeySize);
        }
        if tag_len < algorithm.min_tag_size() || tag_len > algorithm.max_tag_size() {
            return Err(AeadError::InvalidTagSize);
        }

        let backend = match algorithm {
            AeadAlgorithm::EaxAes128 => Backend::EaxAes128(Eax::init(key, tag_len)?),
            AeadAlgorithm::EaxAes256 => Backend::EaxAes256(Eax::init(key, tag_len)?),
            AeadAlgorithm::Aes128GcmSiv => Backend::Aes128GcmSiv(GcmSiv::init(key, strategy)?),
            AeadAlgorithm::Aes256GcmSiv => Backend::Aes256GcmSiv(GcmSiv::init(key, strategy)?),
            AeadAlgorithm::ChaCha20Poly1305 => {
                Backend::ChaCha20Poly1305(ChaCha20Poly1305::init(key)?)
            }
            AeadAlgorithm::Aes128CtrHmacSha256 => {
                Backend::Aes128CtrHmac(CtrHmac::init(key, tag_len)?)
            }
            AeadAlgorithm::Aes256CtrHmacSha256 => {
                Backend::Aes256CtrHmac(CtrHmac::init(key, tag_len)?)
            }
        };

        Ok(Self {
            algorithm,
            tag_len,
            backend,
        })
    }

    pub fn algorithm(&self) -> AeadAlgorithm {
        self.algorithm
    }

    /// Tag length this context produces and expects.
    pub fn tag_size(&self) -> usize {
        self.tag_len
    }

    pub fn nonce_size(&self) -> usize {
        self.algorithm.nonce_size()
    }

    fn check_lengths(&self, nonce: &[u8], tag: &[u8]) -> Result<(), AeadError> {
        if nonce.len() != self.algorithm.nonce_size() {
            return Err(AeadError::InvalidNonceSize);
        }
        if tag.len() != self.tag_len {
            return Err(AeadError::InvalidTagSize);
        }
        Ok(())
    }

    /// Encrypt `data` in place and write the tag.
    pub fn seal(
        &self,
        nonce: &[u8],
        aad: &[u8],
        data: &mut [u8],
        tag: &mut [u8],
    ) -> Result<(), AeadError> {
        self.check_lengths(nonce, tag)?;

        match &self.backend {
            Backend::EaxAes128(ctx) => ctx.seal(nonce_array(nonce), aad, data, tag),
            Backend::EaxAes256(ctx) => ctx.seal(nonce_array(nonce), aad, data, tag),
            Backend::Aes128GcmSiv(ctx) => ctx.seal(nonce_array(nonce), aad, data, tag),
            Backend::Aes256GcmSiv(ctx) => ctx.seal(nonce_array(nonce), aad, data, tag),
            Backend::ChaCha20Poly1305(ctx) => ctx.seal(nonce_array(nonce), aad, data, tag),
            Backend::Aes128CtrHmac(ctx) => ctx.seal(nonce_array(nonce), aad, data, tag),
            Backend::Aes256CtrHmac(ctx) => ctx.seal(nonce_array(nonce), aad, data, tag),
        }
    }

    /// Verify the tag and decrypt `data` in place.
    ///
    /// On `AuthenticationFailed` no plaintext is exposed: suites that verify
    /// before decrypting leave the buffer as ciphertext, and GCM-SIV (which
    /// must decrypt first) zeroizes it.
    pub fn open(
        &self,
        nonce: &[u8],
        aad: &[u8],
        data: &mut [u8],
        tag: &[u8],
    ) -> Result<(), AeadError> {
        self.check_lengths(nonce, tag)?;

        match &self.backend {
            Backend::EaxAes128(ctx) => ctx.open(nonce_array(nonce), aad, data, tag),
            Backend::EaxAes256(ctx) => ctx.open(nonce_array(nonce), aad, data, tag),
            Backend::Aes128GcmSiv(ctx) => ctx.open(nonce_array(nonce), aad, data, tag),
            Backend::Aes256GcmSiv(ctx) => ctx.open(nonce_array(nonce), aad, data, tag),
            Backend::ChaCha20Poly1305(ctx) => ctx.open(nonce_array(nonce), aad, data, tag),
            Backend::Aes128CtrHmac(ctx) => ctx.open(nonce_array(nonce), aad, data, tag),
            Backend::Aes256CtrHmac(ctx) => ctx.open(nonce_array(nonce), aad, data, tag),
        }
    }

    /// As [`Aead::seal`], additionally encrypting a short opaque trailer
    /// with continued keystream; the trailer is authenticated together with
    /// the main ciphertext. Only available when the descriptor's trailer
    /// capability is set.
    pub fn seal_with_trailer(
        &self,
        nonce: &[u8],
        aad: &[u8],
        data: &mut [u8],
        trailer: &mut [u8],
        tag: &mut [u8],
    ) -> Result<(), AeadError> {
        self.check_lengths(nonce, tag)?;

        match &self.backend {
            Backend::ChaCha20Poly1305(ctx) => {
                ctx.seal_with_trailer(nonce_array(nonce), aad, data, trailer, tag)
            }
            _ => Err(AeadError::TrailerUnsupported),
        }
    }

    /// Counterpart of [`Aead::seal_with_trailer`].
    pub fn open_with_trailer(
        &self,
        nonce: &[u8],
        aad: &[u8],
        data: &mut [u8],
        trailer: &mut [u8],
        tag: &[u8],
    ) -> Result<(), AeadError> {
        self.check_lengths(nonce, tag)?;

        match &self.backend {
            Backend::ChaCha20Poly1305(ctx) => {
                ctx.open_with_trailer(nonce_array(nonce), aad, data, trailer, tag)
            }
            _ => Err(AeadError::TrailerUnsupported),
        }
    }
}

impl core::fmt::Debug for Aead {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Aead {{ {}, [protected] }}", self.algorithm.name())
    }
}

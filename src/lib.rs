// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Multi-suite AEAD engine.
//!
//! Five authenticated-encryption families behind one seal/open contract:
//! EAX, AES-GCM-SIV, ChaCha20-Poly1305, AES-CTR-HMAC-SHA256, and a legacy
//! CBC+HMAC record session, plus the constant-time padding/MAC-extraction
//! helpers that defeat the Lucky13 attack class.
//!
//! Verification ordering is load-bearing: within any open, the tag is
//! recomputed and compared in constant time before any decrypted byte is
//! surfaced. GCM-SIV, which must decrypt before it can recompute its tag,
//! zeroizes the recovered plaintext on mismatch.


mod aead;
mod algorithm;
pub mod cbchmac;
mod chacha20poly1305;
mod ctr;
mod ctrhmac;
mod ctutil;
mod eax;
mod error;
mod gcmsiv;
pub mod record;

pub use aead::Aead;
pub use algorithm::AeadAlgorithm;
pub use cbchmac::{CbcCipher, CbcHmacOpener, CbcHmacSealer, RecordDigestAlg};
pub use error::AeadError;
pub use gcmsiv::PolyvalStrategy;

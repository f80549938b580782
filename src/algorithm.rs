// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Algorithm descriptors.
//!
//! One immutable descriptor per suite: key/nonce/tag geometry plus capability
//! flags. The dispatch layer validates every caller-supplied length against
//! the descriptor before any cryptographic work runs.

/// Identifies an AEAD suite and carries its immutable parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AeadAlgorithm {
    /// EAX mode over AES-128 (EAX paper, Bellare-Rogaway-Wagner).
    EaxAes128,
    /// EAX mode over AES-256.
    EaxAes256,
    /// AES-128-GCM-SIV (RFC 8452), nonce-misuse-resistant.
    Aes128GcmSiv,
    /// AES-256-GCM-SIV (RFC 8452), nonce-misuse-resistant.
    Aes256GcmSiv,
    /// ChaCha20-Poly1305 (RFC 8439), with sealed-trailer support.
    ChaCha20Poly1305,
    /// AES-128-CTR with HMAC-SHA256 authentication.
    Aes128CtrHmacSha256,
    /// AES-256-CTR with HMAC-SHA256 authentication.
    Aes256CtrHmacSha256,
}

impl AeadAlgorithm {
    /// Every supported suite, in declaration order.
    pub const ALL: [AeadAlgorithm; 7] = [
        AeadAlgorithm::EaxAes128,
        AeadAlgorithm::EaxAes256,
        AeadAlgorithm::Aes128GcmSiv,
        AeadAlgorithm::Aes256GcmSiv,
        AeadAlgorithm::ChaCha20Poly1305,
        AeadAlgorithm::Aes128CtrHmacSha256,
        AeadAlgorithm::Aes256CtrHmacSha256,
    ];

    /// Raw key length in bytes.
    pub fn key_size(self) -> usize {
        match self {
            AeadAlgorithm::EaxAes128 => 16,
            AeadAlgorithm::EaxAes256 => 32,
            AeadAlgorithm::Aes128GcmSiv => 16,
            AeadAlgorithm::Aes256GcmSiv => 32,
            AeadAlgorithm::ChaCha20Poly1305 => 32,
            // AES key followed by a 32-byte MAC key.
            AeadAlgorithm::Aes128CtrHmacSha256 => 16 + 32,
            AeadAlgorithm::Aes256CtrHmacSha256 => 32 + 32,
        }
    }

    /// Nonce length in bytes. Exact match is required.
    pub fn nonce_size(self) -> usize {
        match self {
            AeadAlgorithm::EaxAes128 | AeadAlgorithm::EaxAes256 => 16,
            AeadAlgorithm::Aes128GcmSiv | AeadAlgorithm::Aes256GcmSiv => 12,
            AeadAlgorithm::ChaCha20Poly1305 => 12,
            AeadAlgorithm::Aes128CtrHmacSha256 | AeadAlgorithm::Aes256CtrHmacSha256 => 12,
        }
    }

    /// Default tag length in bytes.
    pub fn tag_size(self) -> usize {
        match self {
            AeadAlgorithm::Aes128CtrHmacSha256 | AeadAlgorithm::Aes256CtrHmacSha256 => 32,
            _ => 16,
        }
    }

    /// Largest tag length accepted by `init_with_tag_len`.
    pub fn max_tag_size(self) -> usize {
        self.tag_size()
    }

    /// Smallest tag length accepted by `init_with_tag_len`.
    ///
    /// GCM-SIV tags are not truncatable (RFC 8452 forbids it); the other
    /// suites accept down to 8 bytes.
    pub fn min_tag_size(self) -> usize {
        match self {
            AeadAlgorithm::Aes128GcmSiv | AeadAlgorithm::Aes256GcmSiv => 16,
            _ => 8,
        }
    }

    /// Whether `seal_with_trailer` / `open_with_trailer` are available.
    pub fn supports_trailer(self) -> bool {
        matches!(self, AeadAlgorithm::ChaCha20Poly1305)
    }

    /// Whether nonce reuse degrades gracefully instead of catastrophically.
    pub fn nonce_misuse_resistant(self) -> bool {
        matches!(
            self,
            AeadAlgorithm::Aes128GcmSiv | AeadAlgorithm::Aes256GcmSiv
        )
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            AeadAlgorithm::EaxAes128 => "EAX-AES-128",
            AeadAlgorithm::EaxAes256 => "EAX-AES-256",
            AeadAlgorithm::Aes128GcmSiv => "AES-128-GCM-SIV",
            AeadAlgorithm::Aes256GcmSiv => "AES-256-GCM-SIV",
            AeadAlgorithm::ChaCha20Poly1305 => "ChaCha20-Poly1305",
            AeadAlgorithm::Aes128CtrHmacSha256 => "AES-128-CTR-HMAC-SHA256",
            AeadAlgorithm::Aes256CtrHmacSha256 => "AES-256-CTR-HMAC-SHA256",
        }
    }
}

// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

use crate::aead::Aead;
use crate::algorithm::AeadAlgorithm;
use crate::error::AeadError;
use crate::gcmsiv::PolyvalStrategy;

fn key_for(alg: AeadAlgorithm) -> Vec<u8> {
    (0..alg.key_size()).map(|i| i as u8).collect()
}

#[test]
fn test_init_rejects_wrong_key_size() {
    for alg in AeadAlgorithm::ALL {
        let mut key = key_for(alg);
        key.push(0);
        assert_eq!(
            Aead::init(alg, &key).err(),
            Some(AeadError::InvalidKeySize),
            "{alg:?}"
        );
    }
}

#[test]
fn test_init_enforces_tag_bounds() {
    for alg in AeadAlgorithm::ALL {
        let key = key_for(alg);
        assert!(Aead::init_with_tag_len(alg, &key, alg.min_tag_size()).is_ok());
        assert!(Aead::init_with_tag_len(alg, &key, alg.max_tag_size()).is_ok());
        assert_eq!(
            Aead::init_with_tag_len(alg, &key, alg.max_tag_size() + 1).err(),
            Some(AeadError::InvalidTagSize)
        );
        if alg.min_tag_size() > 0 {
            assert_eq!(
                Aead::init_with_tag_len(alg, &key, alg.min_tag_size() - 1).err(),
                Some(AeadError::InvalidTagSize)
            );
        }
    }
}

#[test]
fn test_gcm_siv_tag_is_not_truncatable() {
    let key = key_for(AeadAlgorithm::Aes128GcmSiv);
    assert_eq!(
        Aead::init_with_tag_len(AeadAlgorithm::Aes128GcmSiv, &key, 12).err(),
        Some(AeadError::InvalidTagSize)
    );
}

#[test]
fn test_seal_rejects_wrong_nonce_and_tag_lengths() {
    for alg in AeadAlgorithm::ALL {
        let aead = Aead::init(alg, &key_for(alg)).expect("Failed to init");
        let mut data = [0u8; 8];

        let bad_nonce = vec![0u8; alg.nonce_size() + 1];
        let mut tag = vec![0u8; aead.tag_size()];
        assert_eq!(
            aead.seal(&bad_nonce, b"", &mut data, &mut tag).err(),
            Some(AeadError::InvalidNonceSize)
        );

        let nonce = vec![0u8; alg.nonce_size()];
        let mut bad_tag = vec![0u8; aead.tag_size() + 1];
        assert_eq!(
            aead.seal(&nonce, b"", &mut data, &mut bad_tag).err(),
            Some(AeadError::InvalidTagSize)
        );
        assert_eq!(
            aead.open(&nonce, b"", &mut data, &bad_tag).err(),
            Some(AeadError::InvalidTagSize)
        );
    }
}

#[test]
fn test_trailer_requires_capability() {
    for alg in AeadAlgorithm::ALL {
        let aead = Aead::init(alg, &key_for(alg)).expect("Failed to init");
        let nonce = vec![0u8; alg.nonce_size()];
        let mut data = [0u8; 4];
        let mut trailer = [0u8; 4];
        let mut tag = vec![0u8; aead.tag_size()];

        let result = aead.seal_with_trailer(&nonce, b"", &mut data, &mut trailer, &mut tag);
        if alg.supports_trailer() {
            assert!(result.is_ok(), "{alg:?}");
        } else {
            assert_eq!(result.err(), Some(AeadError::TrailerUnsupported), "{alg:?}");
        }
    }
}

/// Both POLYVAL execution paths must produce interoperable contexts.
#[test]
fn test_strategy_contexts_interoperate() {
    let alg = AeadAlgorithm::Aes256GcmSiv;
    let key = key_for(alg);
    let wide = Aead::init_with_strategy(alg, &key, PolyvalStrategy::Wide).expect("Failed to init");
    let generic =
        Aead::init_with_strategy(alg, &key, PolyvalStrategy::Generic).expect("Failed to init");

    let nonce = [7u8; 12];
    let mut data = b"cross-strategy message".to_vec();
    let mut tag = [0u8; 16];
    wide.seal(&nonce, b"aad", &mut data, &mut tag)
        .expect("Failed to seal");
    generic
        .open(&nonce, b"aad", &mut data, &tag)
        .expect("Failed to open");
    assert_eq!(data, b"cross-strategy message");
}

#[test]
fn test_debug_never_prints_key_material() {
    let alg = AeadAlgorithm::ChaCha20Poly1305;
    let aead = Aead::init(alg, &key_for(alg)).expect("Failed to init");
    let rendered = format!("{aead:?}");
    assert!(rendered.contains("[protected]"));
    assert!(!rendered.contains("00"));
}

#[test]
fn test_descriptor_accessors() {
    for alg in AeadAlgorithm::ALL {
        let aead = Aead::init(alg, &key_for(alg)).expect("Failed to init");
        assert_eq!(aead.algorithm(), alg);
        assert_eq!(aead.tag_size(), alg.tag_size());
        assert_eq!(aead.nonce_size(), alg.nonce_size());
    }
}

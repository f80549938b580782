// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! RFC 8452 known-answer vectors plus nonce-misuse behavior.

use aes::{Aes128, Aes256};

use crate::gcmsiv::polyval::{Polyval, PolyvalStrategy};
use crate::gcmsiv::GcmSiv;
use crate::support::unhex;

/// RFC 8452 appendix A worked POLYVAL example.
#[test]
fn test_polyval_rfc8452_example() {
    let h: [u8; 16] = unhex("25629347589242761d31f826ba4b757b")
        .try_into()
        .unwrap();
    let x1: [u8; 16] = unhex("4f4f95668c83dfb6401762bb2d01a262")
        .try_into()
        .unwrap();
    let x2: [u8; 16] = unhex("d1a24ddd772be4abb6a7824f7ebb2f36")
        .try_into()
        .unwrap();
    // RFC 8452 publishes the one-block result; the two-block value extends
    // the same accumulator one step further.
    let expected_one = unhex("cedac64537ff50989c16011551086d77");
    let expected_two = unhex("2889843841bc3760ad4c63e4f0dac459");

    for strategy in [PolyvalStrategy::Generic, PolyvalStrategy::Wide] {
        let mut polyval = Polyval::new(&h, strategy);
        polyval.update_block(&x1);
        assert_eq!(polyval.finalize().as_slice(), expected_one.as_slice());
        polyval.update_block(&x2);
        assert_eq!(polyval.finalize().as_slice(), expected_two.as_slice());
    }
}

/// Both execution paths must agree for every block count around the batch
/// width, including the padded tail.
#[test]
fn test_polyval_paths_agree() {
    let h: [u8; 16] = unhex("25629347589242761d31f826ba4b757b")
        .try_into()
        .unwrap();
    let data: Vec<u8> = (0..160u8).collect();

    for len in 0..data.len() {
        let mut generic = Polyval::new(&h, PolyvalStrategy::Generic);
        let mut wide = Polyval::new(&h, PolyvalStrategy::Wide);
        generic.update_padded(&data[..len]);
        wide.update_padded(&data[..len]);
        assert_eq!(generic.finalize(), wide.finalize(), "len = {len}");
    }
}

struct Vector {
    key: &'static str,
    nonce: &'static str,
    aad: &'static str,
    msg: &'static str,
    ct: &'static str,
    tag: &'static str,
}

// RFC 8452 appendix C.1 (AES-128-GCM-SIV).
const VECTORS_128: &[Vector] = &[
    Vector {
        key: "01000000000000000000000000000000",
        nonce: "030000000000000000000000",
        aad: "",
        msg: "",
        ct: "",
        tag: "dc20e2d83f25705bb49e439eca56de25",
    },
    Vector {
        key: "01000000000000000000000000000000",
        nonce: "030000000000000000000000",
        aad: "",
        msg: "0100000000000000",
        ct: "b5d839330ac7b786",
        tag: "578782fff6013b815b287c22493a364c",
    },
];

// RFC 8452 appendix C.2 (AES-256-GCM-SIV).
const VECTORS_256: &[Vector] = &[
    Vector {
        key: "0100000000000000000000000000000000000000000000000000000000000000",
        nonce: "030000000000000000000000",
        aad: "",
        msg: "",
        ct: "",
        tag: "07f5f4169bbf55a8400cd47ea6fd400f",
    },
    Vector {
        key: "0100000000000000000000000000000000000000000000000000000000000000",
        nonce: "030000000000000000000000",
        aad: "",
        msg: "0100000000000000",
        ct: "c2ef328e5c71c83b",
        tag: "843122130f7364b761e0b97427e3df28",
    },
];

fn run_vectors<F>(vectors: &[Vector], seal_open: F)
where
    F: Fn(&[u8], &[u8; 12], &[u8], &mut Vec<u8>, &mut [u8; 16]) -> (Vec<u8>, bool),
{
    for v in vectors {
        let key = unhex(v.key);
        let nonce: [u8; 12] = unhex(v.nonce).try_into().unwrap();
        let aad = unhex(v.aad);
        let mut data = unhex(v.msg);
        let mut tag = [0u8; 16];

        let (opened, ok) = seal_open(&key, &nonce, &aad, &mut data, &mut tag);
        assert_eq!(data, unhex(v.ct), "ciphertext mismatch");
        assert_eq!(tag.as_slice(), unhex(v.tag).as_slice(), "tag mismatch");
        assert!(ok, "round-trip failed");
        assert_eq!(opened, unhex(v.msg), "plaintext mismatch");
    }
}

#[test]
fn test_rfc8452_aes128_vectors() {
    run_vectors(VECTORS_128, |key, nonce, aad, data, tag| {
        let siv =
            GcmSiv::<Aes128>::init(key, PolyvalStrategy::Wide).expect("Failed to init GCM-SIV");
        siv.seal(nonce, aad, data, tag).expect("Failed to seal");

        let mut opened = data.clone();
        let ok = siv.open(nonce, aad, &mut opened, tag).is_ok();
        (opened, ok)
    });
}

#[test]
fn test_rfc8452_aes256_vectors() {
    run_vectors(VECTORS_256, |key, nonce, aad, data, tag| {
        let siv =
            GcmSiv::<Aes256>::init(key, PolyvalStrategy::Generic).expect("Failed to init GCM-SIV");
        siv.seal(nonce, aad, data, tag).expect("Failed to seal");

        let mut opened = data.clone();
        let ok = siv.open(nonce, aad, &mut opened, tag).is_ok();
        (opened, ok)
    });
}

/// Nonce reuse must degrade gracefully: both messages still round-trip and
/// only ciphertext equality could leak.
#[test]
fn test_nonce_reuse_round_trips() {
    let key = [0x11u8; 16];
    let nonce = [0x22u8; 12];
    let siv = GcmSiv::<Aes128>::init(&key, PolyvalStrategy::Wide).expect("Failed to init GCM-SIV");

    let mut first = b"first message under this nonce".to_vec();
    let mut second = b"second message, same nonce!!!!".to_vec();
    let mut tag_first = [0u8; 16];
    let mut tag_second = [0u8; 16];

    siv.seal(&nonce, b"", &mut first, &mut tag_first)
        .expect("Failed to seal");
    siv.seal(&nonce, b"", &mut second, &mut tag_second)
        .expect("Failed to seal");

    assert_ne!(tag_first, tag_second);

    siv.open(&nonce, b"", &mut first, &tag_first)
        .expect("Failed to open");
    siv.open(&nonce, b"", &mut second, &tag_second)
        .expect("Failed to open");

    assert_eq!(first, b"first message under this nonce");
    assert_eq!(second, b"second message, same nonce!!!!");
}

/// Same (key, nonce, plaintext) must produce identical output; SIV is
/// deterministic by design.
#[test]
fn test_deterministic_under_identical_inputs() {
    let key = [9u8; 16];
    let nonce = [1u8; 12];
    let siv = GcmSiv::<Aes128>::init(&key, PolyvalStrategy::Wide).expect("Failed to init GCM-SIV");

    let mut a = b"identical plaintext".to_vec();
    let mut b = b"identical plaintext".to_vec();
    let mut tag_a = [0u8; 16];
    let mut tag_b = [0u8; 16];

    siv.seal(&nonce, b"", &mut a, &mut tag_a).unwrap();
    siv.seal(&nonce, b"", &mut b, &mut tag_b).unwrap();

    assert_eq!(a, b);
    assert_eq!(tag_a, tag_b);
}

#[test]
fn test_failed_open_zeroizes_buffer() {
    let key = [3u8; 16];
    let nonce = [4u8; 12];
    let siv = GcmSiv::<Aes128>::init(&key, PolyvalStrategy::Wide).expect("Failed to init GCM-SIV");

    let mut data = b"some secret plaintext bytes".to_vec();
    let mut tag = [0u8; 16];
    siv.seal(&nonce, b"", &mut data, &mut tag).unwrap();

    tag[0] ^= 1;
    let result = siv.open(&nonce, b"", &mut data, &tag);
    assert!(result.is_err());
    assert!(data.iter().all(|&b| b == 0), "plaintext leaked on failure");
}

// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

use hmac::{Hmac, Mac};
use proptest::prelude::*;
use sha1::Sha1;
use sha2::Sha256;

use crate::record::{RecordDigestAlg, extract_mac, record_digest, remove_padding};

const BLOCK: usize = 16;
const MAC: usize = 20;

/// plaintext || mac || TLS padding (pad_len + 1 bytes, each pad_len), padded
/// up to a block multiple.
fn build_record(plaintext_len: usize, pad_len: u8) -> Vec<u8> {
    let mut record: Vec<u8> = (0..plaintext_len + MAC).map(|i| i as u8).collect();
    record.extend(core::iter::repeat_n(pad_len, pad_len as usize + 1));
    assert_eq!(record.len() % BLOCK, 0, "test record must be block-aligned");
    record
}

#[test]
fn test_remove_padding_valid() {
    for (plaintext_len, pad_len) in [(11, 0u8), (10, 1), (0, 11), (12, 15), (7, 36)] {
        let record = build_record(plaintext_len, pad_len);
        let (good, len) = remove_padding(&record, BLOCK, MAC);
        assert_eq!(good.unwrap_u8(), 1, "pt={plaintext_len} pad={pad_len}");
        assert_eq!(len, plaintext_len + MAC);
    }
}

#[test]
fn test_remove_padding_rejects_corrupt_pad_byte() {
    let mut record = build_record(10, 17);
    // One byte inside the run disagrees with the pad length byte.
    let corrupt_at = record.len() - 5;
    record[corrupt_at] ^= 1;

    let (good, len) = remove_padding(&record, BLOCK, MAC);
    assert_eq!(good.unwrap_u8(), 0);
    assert_eq!(len, record.len());
}

#[test]
fn test_remove_padding_rejects_pad_longer_than_record() {
    let mut record = build_record(11, 0);
    let last = record.len() - 1;
    record[last] = 0xff;

    let (good, len) = remove_padding(&record, BLOCK, MAC);
    assert_eq!(good.unwrap_u8(), 0);
    assert_eq!(len, record.len());
}

#[test]
fn test_remove_padding_rejects_public_shape() {
    // Not a block multiple.
    let (good, _) = remove_padding(&[0u8; 17], BLOCK, MAC);
    assert_eq!(good.unwrap_u8(), 0);
    // Too short to hold MAC plus one pad byte.
    let (good, _) = remove_padding(&[0u8; 16], BLOCK, MAC);
    assert_eq!(good.unwrap_u8(), 0);
    let (good, _) = remove_padding(&[], BLOCK, MAC);
    assert_eq!(good.unwrap_u8(), 0);
}

#[test]
fn test_extract_mac_recovers_mac() {
    for (plaintext_len, pad_len) in [(0usize, 11u8), (10, 1), (11, 0), (100, 255), (3, 64)] {
        let mut record: Vec<u8> = (0..plaintext_len).map(|i| i as u8).collect();
        let mac: Vec<u8> = (0..MAC).map(|i| 0xa0 ^ i as u8).collect();
        record.extend_from_slice(&mac);
        record.extend(core::iter::repeat_n(pad_len, pad_len as usize + 1));

        let mut out = [0u8; MAC];
        extract_mac(&mut out, &record, plaintext_len + MAC);
        assert_eq!(out.as_slice(), mac.as_slice(), "pt={plaintext_len} pad={pad_len}");
    }
}

fn reference_hmac(alg: RecordDigestAlg, key: &[u8], msg: &[u8]) -> Vec<u8> {
    match alg {
        RecordDigestAlg::Sha1 => {
            let mut mac = Hmac::<Sha1>::new_from_slice(key).unwrap();
            mac.update(msg);
            mac.finalize().into_bytes().to_vec()
        }
        RecordDigestAlg::Sha256 => {
            let mut mac = Hmac::<Sha256>::new_from_slice(key).unwrap();
            mac.update(msg);
            mac.finalize().into_bytes().to_vec()
        }
    }
}

/// The masked-placement digest must agree with a straight HMAC over
/// header || data[..data_len] for message lengths on both sides of every
/// compression block boundary.
#[test]
fn test_record_digest_matches_hmac() {
    let key: Vec<u8> = (0..32u8).collect();
    let header: Vec<u8> = (0..13u8).map(|i| 0x40 | i).collect();

    for alg in [RecordDigestAlg::Sha1, RecordDigestAlg::Sha256] {
        let md = alg.digest_size();
        for data_len in [0usize, 1, 50, 51, 52, 114, 115, 116, 128, 200, 256] {
            for pad_len in [0usize, 1, 255] {
                let mut data: Vec<u8> = (0..data_len).map(|i| i as u8).collect();
                data.extend(core::iter::repeat_n(0xee, md));
                data.extend(core::iter::repeat_n(pad_len as u8, pad_len + 1));

                let mut out = [0u8; 32];
                let written = record_digest(alg, &key, &header, &data, data_len, &mut out)
                    .expect("Failed to compute record digest");
                assert_eq!(written, md);

                let mut msg = header.clone();
                msg.extend_from_slice(&data[..data_len]);
                let expected = reference_hmac(alg, &key, &msg);
                assert_eq!(&out[..md], expected.as_slice(), "alg={alg:?} len={data_len} pad={pad_len}");
            }
        }
    }
}

#[test]
fn test_record_digest_rejects_bad_arguments() {
    let mut out = [0u8; 32];
    let data = [0u8; 64];

    // Key longer than the compression block.
    assert!(record_digest(RecordDigestAlg::Sha256, &[0u8; 65], b"", &data, 0, &mut out).is_err());
    // Output buffer smaller than the digest.
    assert!(
        record_digest(RecordDigestAlg::Sha256, &[0u8; 32], b"", &data, 0, &mut out[..31]).is_err()
    );
    // Claimed message length beyond the buffer.
    assert!(record_digest(RecordDigestAlg::Sha256, &[0u8; 32], b"", &data, 65, &mut out).is_err());
}

proptest! {
    #[test]
    fn remove_padding_matches_naive(
        plaintext_len in 0..200usize,
        extra_pad_blocks in 0..=14usize,
        corrupt in proptest::option::of(0..256usize)
    ) {
        // Smallest pad that block-aligns the record, plus whole extra blocks.
        let min_pad = (BLOCK - (plaintext_len + MAC + 1) % BLOCK) % BLOCK;
        let pad_len = (min_pad + BLOCK * extra_pad_blocks) as u8;
        let mut record = build_record(plaintext_len, pad_len);
        if let Some(offset) = corrupt {
            let at = record.len() - 1 - (offset % record.len().min(256)).min(record.len() - 1);
            record[at] ^= 0x01;
        }

        // Naive branching reference.
        let pad = *record.last().unwrap() as usize;
        let valid = record.len() >= pad + 1 + MAC
            && record[record.len() - 1 - pad..].iter().all(|&b| b == pad as u8);

        let (good, len) = remove_padding(&record, BLOCK, MAC);
        prop_assert_eq!(bool::from(good), valid);
        if valid {
            prop_assert_eq!(len, record.len() - pad - 1);
        } else {
            prop_assert_eq!(len, record.len());
        }
    }

    #[test]
    fn extract_mac_matches_slice_copy(
        plaintext_len in 0..300usize,
        pad_len in 0..=255u8
    ) {
        // No alignment requirement here; extract_mac only sees lengths.
        let mut record: Vec<u8> = (0..plaintext_len).map(|i| (i * 7) as u8).collect();
        let mac: Vec<u8> = (0..MAC).map(|i| (0x90 + i) as u8).collect();
        record.extend_from_slice(&mac);
        record.extend(core::iter::repeat_n(pad_len, pad_len as usize + 1));

        let mut out = [0u8; MAC];
        extract_mac(&mut out, &record, plaintext_len + MAC);
        prop_assert_eq!(out.as_slice(), mac.as_slice());
    }
}

// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Constant-time word helpers on top of `subtle`.
//!
//! Every secret-dependent decision in this crate goes through these wrappers
//! (or through `subtle` directly); plain `if` on secret bytes is forbidden.

use subtle::{Choice, ConstantTimeEq, ConstantTimeGreater};

/// `a < b`, constant-time.
#[inline]
pub(crate) fn ct_lt(a: u64, b: u64) -> Choice {
    b.ct_gt(&a)
}

/// `a >= b`, constant-time.
#[inline]
pub(crate) fn ct_ge(a: u64, b: u64) -> Choice {
    !b.ct_gt(&a)
}

/// `a == b`, constant-time.
#[inline]
pub(crate) fn ct_eq(a: u64, b: u64) -> Choice {
    a.ct_eq(&b)
}

/// All-ones byte mask for a set `Choice`, all-zeroes otherwise.
#[inline]
pub(crate) fn mask8(c: Choice) -> u8 {
    0u8.wrapping_sub(c.unwrap_u8())
}

/// All-ones word mask for a set `Choice`, all-zeroes otherwise.
#[inline]
pub(crate) fn mask64(c: Choice) -> u64 {
    0u64.wrapping_sub(u64::from(c.unwrap_u8()))
}

/// Constant-time slice equality.
#[inline]
pub(crate) fn ct_bytes_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    bool::from(a.ct_eq(b))
}
